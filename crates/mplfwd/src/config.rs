// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Engine configuration - single source of truth
//!
//! All tunables live here, fixed at [`Forwarder`](crate::Forwarder)
//! construction time. The defaults follow the RFC 7731 Sec.5.4 spirit,
//! profiled for class-2 constrained meshes: an aggressive data-plane Trickle
//! (small Imin, no doublings) and a slow control-plane Trickle backing off
//! across nine doublings.

use std::time::Duration;

use crate::seed_id::{SeedId, SeedIdLength};

// =======================================================================
// Data-plane Trickle defaults (RFC 7731 Sec.5.4, DATA_MESSAGE_* knobs)
// =======================================================================

/// Data-message Trickle minimum interval (milliseconds)
///
/// mplfwd default: 125 ms
/// Small enough to flood a novel message across a few hops within a second.
pub const DEFAULT_DATA_IMIN_MS: u64 = 125;

/// Data-message Trickle interval doublings
///
/// mplfwd default: 0 (Imax == Imin)
/// Data floods stay fast for their whole short life.
pub const DEFAULT_DATA_IMAX_DOUBLINGS: u8 = 0;

/// Data-message Trickle redundancy constant
///
/// mplfwd default: 1
/// One overheard consistent copy per interval suppresses our transmission.
pub const DEFAULT_DATA_K: u16 = 1;

/// Data-message Trickle expirations before the timer stops for good
///
/// mplfwd default: 3
/// The message stays buffered for duplicate detection afterwards.
pub const DEFAULT_DATA_EXPIRATIONS: u8 = 3;

// =======================================================================
// Control-plane Trickle defaults (RFC 7731 Sec.5.4, CONTROL_MESSAGE_* knobs)
// =======================================================================

/// Control-message Trickle minimum interval (milliseconds)
///
/// mplfwd default: 500 ms
pub const DEFAULT_CONTROL_IMIN_MS: u64 = 500;

/// Control-message Trickle interval doublings
///
/// mplfwd default: 9 (Imax = 500 ms * 2^9 = 256 s)
/// Quiet domains advertise rarely.
pub const DEFAULT_CONTROL_IMAX_DOUBLINGS: u8 = 9;

/// Control-message Trickle redundancy constant
///
/// mplfwd default: 1
pub const DEFAULT_CONTROL_K: u16 = 1;

/// Control-timer expirations before a domain goes quiet until its next reset
///
/// mplfwd default: 10
pub const DEFAULT_CONTROL_EXPIRATIONS: u8 = 10;

// =======================================================================
// Lifecycle & Pool Capacities
// =======================================================================

/// Seed entry lifetime (seconds)
///
/// mplfwd default: 30 minutes
/// An idle seed and its buffered messages are reaped after this long
/// without traffic.
pub const DEFAULT_SEED_LIFETIME_SECS: u64 = 30 * 60;

/// Buffered-message pool capacity (slots, shared across all seeds)
///
/// mplfwd default: 8
pub const DEFAULT_MESSAGE_CAPACITY: usize = 8;

/// Seed set capacity (slots)
///
/// mplfwd default: 4
pub const DEFAULT_SEED_CAPACITY: usize = 4;

/// Domain set capacity (slots)
///
/// mplfwd default: 2
pub const DEFAULT_DOMAIN_CAPACITY: usize = 2;

// =======================================================================
// Parameter Types
// =======================================================================

/// Trickle timer parameters handed to the host timer service per RFC 6206.
///
/// The engine never evaluates these itself; they parameterize the timers the
/// host creates on its behalf. Imax is expressed as a doubling count over
/// `imin`, matching the timer service contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrickleParams {
    /// Minimum interval.
    pub imin: Duration,
    /// Doublings before the interval pins at `imin * 2^imax_doublings`.
    pub imax_doublings: u8,
    /// Redundancy constant; a transmission is suppressed once this many
    /// consistent signals arrive within one interval.
    pub k: u16,
}

/// Seed identity for locally originated traffic.
///
/// Must be configured before the first
/// [`Forwarder::send_originated`](crate::Forwarder::send_originated) call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LocalSeedId {
    pub(crate) length: SeedIdLength,
    pub(crate) value: u128,
}

impl LocalSeedId {
    /// Identify local traffic by its IPv6 source address (wire form S=0,
    /// zero option overhead). The seed value binds to the source address of
    /// the first originated packet.
    #[must_use]
    pub fn source_address() -> Self {
        LocalSeedId {
            length: SeedIdLength::SourceAddress,
            value: 0,
        }
    }

    /// Explicit 16-bit seed identifier (wire form S=1).
    #[must_use]
    pub fn bits16(value: u16) -> Self {
        LocalSeedId {
            length: SeedIdLength::Bits16,
            value: u128::from(value),
        }
    }

    /// Explicit 64-bit seed identifier (wire form S=2).
    #[must_use]
    pub fn bits64(value: u64) -> Self {
        LocalSeedId {
            length: SeedIdLength::Bits64,
            value: u128::from(value),
        }
    }

    /// Explicit 128-bit seed identifier (wire form S=3).
    #[must_use]
    pub fn bits128(value: u128) -> Self {
        LocalSeedId {
            length: SeedIdLength::Bits128,
            value,
        }
    }

    pub(crate) fn resolve(&self, source_value: u128) -> SeedId {
        let value = match self.length {
            SeedIdLength::SourceAddress => source_value,
            _ => self.value,
        };
        SeedId {
            length: self.length,
            value,
        }
    }
}

/// Static configuration for a [`Forwarder`](crate::Forwarder).
#[derive(Debug, Clone)]
pub struct MplConfig {
    /// Trickle parameters for data-message retransmission timers.
    pub data_trickle: TrickleParams,
    /// Trickle parameters for per-domain control timers.
    pub control_trickle: TrickleParams,
    /// Trickle expirations granted to a data message before its timer is
    /// stopped for good.
    pub data_expirations: u8,
    /// Trickle expirations granted to a domain's control timer before it
    /// goes quiet until the next reset.
    pub control_expirations: u8,
    /// How long a seed entry survives without traffic before
    /// [`Forwarder::reap_seeds`](crate::Forwarder::reap_seeds) drops it.
    pub seed_lifetime: Duration,
    /// Slots in the buffered-message pool, shared across all seeds.
    pub message_capacity: usize,
    /// Slots in the seed set.
    pub seed_capacity: usize,
    /// Slots in the domain set.
    pub domain_capacity: usize,
    /// When true, novel messages arm their Trickle timer immediately on
    /// admission; when false they are buffered for reactive (control-driven)
    /// forwarding only.
    pub proactive_forwarding: bool,
    /// Seed identity for locally originated traffic. Leaving this unset
    /// makes `send_originated` fail with
    /// [`Error::SeedIdUnknown`](crate::Error::SeedIdUnknown).
    pub local_seed: Option<LocalSeedId>,
}

impl Default for MplConfig {
    fn default() -> Self {
        MplConfig {
            data_trickle: TrickleParams {
                imin: Duration::from_millis(DEFAULT_DATA_IMIN_MS),
                imax_doublings: DEFAULT_DATA_IMAX_DOUBLINGS,
                k: DEFAULT_DATA_K,
            },
            control_trickle: TrickleParams {
                imin: Duration::from_millis(DEFAULT_CONTROL_IMIN_MS),
                imax_doublings: DEFAULT_CONTROL_IMAX_DOUBLINGS,
                k: DEFAULT_CONTROL_K,
            },
            data_expirations: DEFAULT_DATA_EXPIRATIONS,
            control_expirations: DEFAULT_CONTROL_EXPIRATIONS,
            seed_lifetime: Duration::from_secs(DEFAULT_SEED_LIFETIME_SECS),
            message_capacity: DEFAULT_MESSAGE_CAPACITY,
            seed_capacity: DEFAULT_SEED_CAPACITY,
            domain_capacity: DEFAULT_DOMAIN_CAPACITY,
            proactive_forwarding: true,
            local_seed: None,
        }
    }
}

// =======================================================================
// Tests
// =======================================================================
