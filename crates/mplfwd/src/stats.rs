// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Forwarding counters
//!
//! Plain saturating-by-construction u64 counters, snapshotted via
//! [`Forwarder::stats`](crate::Forwarder::stats). Packets the engine refuses
//! never surface as errors on the receive path, so these counters are the
//! only record of why traffic was dropped.

/// Cumulative forwarding statistics.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct MplStats {
    /// Novel messages admitted and handed up the stack.
    pub delivered: u64,
    /// Duplicates absorbed into Trickle suppression.
    pub duplicates: u64,
    /// Packets older than a seed's tracked window.
    pub stale: u64,
    /// Packets without a parseable MPL hop-by-hop option.
    pub malformed: u64,
    /// Inbound packets carrying one of our own source addresses.
    pub looped: u64,
    /// Domain creations refused by address derivation.
    pub derivation_failures: u64,
    /// Domain or message admissions refused by timer allocation.
    pub timer_failures: u64,
    /// Novel messages dropped because no pool slot could be found or freed.
    pub pool_drops: u64,
    /// Buffer slots recycled from the longest seed under pool pressure.
    pub reclaims: u64,
    /// Data-plane transmissions handed to the packet service.
    pub data_tx: u64,
    /// Control-plane transmissions handed to the packet service.
    pub control_tx: u64,
    /// Seed entries removed by the lifetime reaper.
    pub reaped_seeds: u64,
}
