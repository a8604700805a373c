// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Host collaborator traits
//!
//! The engine owns admission, buffering and retransmission policy; everything
//! with a platform dependency stays on the host side behind two traits. The
//! host hands both as `&mut dyn` on every call into the engine, so neither
//! side holds a long-lived borrow of the other.
//!
//! [`TrickleTimers`] wraps the host's RFC 6206 Trickle implementation. The
//! engine treats timers as opaque ids: it creates them once, binds them to an
//! engine object at start, and reacts to fire events the host routes back via
//! [`Forwarder::trickle_expired`](crate::Forwarder::trickle_expired).
//!
//! [`PacketService`] wraps address ownership checks, multicast group
//! membership and raw transmission. Sends are fire and forget; the engine
//! never rolls back bookkeeping on a failed transmission, the next Trickle
//! interval retries naturally.

use std::net::Ipv6Addr;

use crate::config::TrickleParams;
use crate::domain::DomainHandle;
use crate::message::MessageHandle;
use crate::seed_id::SeedId;

/// Opaque host timer identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerId(pub u32);

/// Opaque host network interface identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct IfaceId(pub u32);

/// What a running Trickle timer is armed for.
///
/// The host stores the binding alongside the timer and passes it back
/// verbatim in [`Forwarder::trickle_expired`](crate::Forwarder::trickle_expired)
/// when the timer fires. Handles are generation-checked on the way back in,
/// so a fire event that races an eviction is discarded instead of acting on a
/// recycled slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerBinding {
    /// Per-domain control timer; fires schedule control-plane summaries.
    DomainControl(DomainHandle),
    /// Per-message data timer; fires schedule data retransmissions.
    DataMessage(MessageHandle),
}

/// One seed's reachability summary, as carried in a control-plane message.
///
/// `buffered` holds the buffered sequence numbers in ascending mod-256 order
/// starting at `min_sequence`; the host encodes them into its control wire
/// format (bit vector or list) as it sees fit.
#[derive(Debug, Clone, PartialEq)]
pub struct SeedAdvert {
    pub seed_id: SeedId,
    pub min_sequence: u8,
    pub buffered: Vec<u8>,
}

/// Trickle timer service provided by the host.
pub trait TrickleTimers {
    /// Allocate a timer with the given parameters. Returns `None` when the
    /// host is out of timer resources; the engine surfaces that as
    /// [`Error::TimerCreationFailed`](crate::Error::TimerCreationFailed) and
    /// drops the triggering packet.
    fn create(&mut self, params: TrickleParams) -> Option<TimerId>;

    /// Start (or restart from Imin) a timer and bind it to an engine object.
    /// The binding replaces any previous one.
    fn start(&mut self, timer: TimerId, binding: TimerBinding);

    /// Stop a timer. The binding is retained so a later
    /// [`signal_inconsistent`](TrickleTimers::signal_inconsistent) can revive
    /// the timer without a fresh `start`.
    fn stop(&mut self, timer: TimerId);

    /// Whether the timer is currently running.
    fn is_running(&self, timer: TimerId) -> bool;

    /// Record a consistent event on a running timer, feeding its suppression
    /// counter.
    fn signal_consistent(&mut self, timer: TimerId);

    /// Record an inconsistent event: reset the interval to Imin. A stopped
    /// timer that still has a binding starts running again.
    fn signal_inconsistent(&mut self, timer: TimerId);
}

/// IPv6 plumbing provided by the host.
pub trait PacketService {
    /// Whether `addr` is assigned to this node on any interface. Drives the
    /// self-origin check on forwarded traffic.
    fn is_own_address(&self, addr: &Ipv6Addr) -> bool;

    /// Whether the interface has joined the multicast group.
    fn is_group_joined(&self, iface: IfaceId, group: &Ipv6Addr) -> bool;

    /// Join a multicast group on an interface.
    fn join_group(&mut self, iface: IfaceId, group: &Ipv6Addr);

    /// Accept traffic for a group without announcing membership (MLD stays
    /// quiet). Used for control-plane addresses.
    fn monitor_group(&mut self, iface: IfaceId, group: &Ipv6Addr);

    /// Transmit a data-plane packet: `option` is the encoded MPL option for
    /// the hop-by-hop header, `payload` the unmodified upper-layer bytes.
    fn send_data(&mut self, iface: IfaceId, dst: Ipv6Addr, option: &[u8], payload: &[u8]);

    /// Transmit a control-plane summary for the given seeds.
    fn send_control(&mut self, iface: IfaceId, dst: Ipv6Addr, adverts: &[SeedAdvert]);
}
