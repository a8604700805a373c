// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! # mplfwd - MPL multicast forwarding engine
//!
//! A pure Rust implementation of the MPL (Multicast Protocol for Low-power
//! and Lossy Networks, RFC 7731) forwarding engine: Trickle-throttled
//! flooding with duplicate suppression, bounded buffering and seed/domain
//! lifecycle tracking, for mesh networks where classical multicast routing
//! does not fit.
//!
//! The crate is platform-free by construction. Everything with an OS or
//! stack dependency (Trickle timers, group membership, transmission) stays
//! on the host side behind two traits; the engine is the policy in between.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use mplfwd::{Forwarder, IfaceId, MplConfig, RxPacket, Verdict};
//! # use std::net::Ipv6Addr;
//! # use mplfwd::{PacketService, SeedAdvert, TimerBinding, TimerId, TrickleParams, TrickleTimers};
//! # struct Timers(u32);
//! # impl TrickleTimers for Timers {
//! #     fn create(&mut self, _p: TrickleParams) -> Option<TimerId> {
//! #         self.0 += 1;
//! #         Some(TimerId(self.0))
//! #     }
//! #     fn start(&mut self, _t: TimerId, _b: TimerBinding) {}
//! #     fn stop(&mut self, _t: TimerId) {}
//! #     fn is_running(&self, _t: TimerId) -> bool { false }
//! #     fn signal_consistent(&mut self, _t: TimerId) {}
//! #     fn signal_inconsistent(&mut self, _t: TimerId) {}
//! # }
//! # struct Net;
//! # impl PacketService for Net {
//! #     fn is_own_address(&self, _a: &Ipv6Addr) -> bool { false }
//! #     fn is_group_joined(&self, _i: IfaceId, _g: &Ipv6Addr) -> bool { false }
//! #     fn join_group(&mut self, _i: IfaceId, _g: &Ipv6Addr) {}
//! #     fn monitor_group(&mut self, _i: IfaceId, _g: &Ipv6Addr) {}
//! #     fn send_data(&mut self, _i: IfaceId, _d: Ipv6Addr, _o: &[u8], _p: &[u8]) {}
//! #     fn send_control(&mut self, _i: IfaceId, _d: Ipv6Addr, _a: &[SeedAdvert]) {}
//! # }
//! # fn main() {
//! let mut engine = Forwarder::new(MplConfig::default());
//! let mut timers = Timers(0);
//! let mut net = Net;
//!
//! let packet = RxPacket {
//!     src: "fe80::1".parse().unwrap(),
//!     dst: "ff03::fc".parse().unwrap(),
//!     iface: IfaceId(1),
//!     hbh_options: Some(&[0x6D, 0x02, 0x00, 0x05]),
//!     payload: b"hello",
//! };
//! match engine.receive(&mut timers, &mut net, &packet) {
//!     Verdict::Deliver => { /* novel: continue up the stack */ }
//!     Verdict::Drop => { /* duplicate, stale or noise */ }
//! }
//! # }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! +----------------------------------------------------------------+
//! |                        Host IP stack                           |
//! |    receive() | send_originated() | trickle_expired() | tick    |
//! +----------------------------------------------------------------+
//! |                      Admission engine                          |
//! |  option scan -> domain/seed resolve -> dedup -> buffer -> arm  |
//! +----------------------------------------------------------------+
//! |            Bounded pools: domains | seeds | messages           |
//! +----------------------------------------------------------------+
//! |      TrickleTimers trait        |       PacketService trait    |
//! |      (host RFC 6206 timers)     |       (host IPv6 plumbing)   |
//! +----------------------------------------------------------------+
//! ```
//!
//! ## Key Types
//!
//! | Type | Description |
//! |------|-------------|
//! | [`Forwarder`] | The engine: admission, buffering, expiration callbacks |
//! | [`MplConfig`] | Trickle parameters, pool capacities, local seed identity |
//! | [`RxPacket`] / [`Verdict`] | Inbound packet view and the deliver/drop decision |
//! | [`TrickleTimers`] | Host-provided Trickle timer service |
//! | [`PacketService`] | Host-provided address checks, membership and transmission |
//!
//! ## Modules Overview
//!
//! - [`forwarder`] - Admission engine and state machine (start here)
//! - [`wire`] - MPL Hop-by-Hop option scanner and encoder
//! - [`domain`] / [`seed`] / [`message`] - Tracked protocol entities
//! - [`services`] - The two host collaborator traits
//!
//! ## See Also
//!
//! - [RFC 7731 - MPL](https://www.rfc-editor.org/rfc/rfc7731)
//! - [RFC 6206 - The Trickle Algorithm](https://www.rfc-editor.org/rfc/rfc6206)

/// Engine configuration: Trickle defaults, capacities, local seed identity.
pub mod config;
/// MPL domains: data/control address pairing and sibling derivation.
pub mod domain;
/// Admission engine and forwarding state machine.
pub mod forwarder;
/// Buffered data messages.
pub mod message;
mod outbound;
/// Fixed-capacity generational pools.
pub mod pool;
/// Seed tracking: per-originator ordered message lists.
pub mod seed;
/// Seed identifier length classes and codec.
pub mod seed_id;
/// Mod-256 sequence-number comparison (RFC 1982 style, 8-bit).
pub mod seq;
/// Host collaborator traits: Trickle timers and IPv6 plumbing.
pub mod services;
/// Forwarding counters.
pub mod stats;
/// MPL Hop-by-Hop option wire format.
pub mod wire;

pub use config::{LocalSeedId, MplConfig, TrickleParams};
pub use domain::{Domain, DomainHandle, ALL_MPL_FORWARDERS_LINK_LOCAL};
pub use forwarder::{Forwarder, RxPacket, Verdict};
pub use message::{BufferedMessage, MessageHandle};
pub use pool::{Handle, Pool};
pub use seed::SeedState;
pub use seed_id::{SeedId, SeedIdLength};
pub use services::{IfaceId, PacketService, SeedAdvert, TimerBinding, TimerId, TrickleTimers};
pub use stats::MplStats;

/// Errors produced by the forwarding engine.
///
/// Only [`Error::SeedIdUnknown`] ever reaches a caller: the inbound path
/// converts every failure into a counter and a log line, because no
/// synchronous caller awaits a per-packet result there and the protocol's
/// own retransmission is the recovery mechanism.
#[derive(Debug)]
pub enum Error {
    /// Packet without a usable MPL option: missing Hop-by-Hop area, no
    /// option of type 0x6D, truncated encoding, reserved bit set, or a
    /// seed-id length that contradicts the option length.
    MalformedPacket(&'static str),
    /// No data/control sibling address could be derived for a destination
    /// group (wrong scope, or no joined sibling found for a link-local
    /// control input).
    AddressDerivationFailed,
    /// The host timer service ran out of Trickle timers.
    TimerCreationFailed,
    /// A bounded pool is full and nothing could be reclaimed.
    PoolExhausted(&'static str),
    /// `send_originated` was called before a local seed id was configured.
    SeedIdUnknown,
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::MalformedPacket(what) => write!(f, "Malformed packet: {}", what),
            Error::AddressDerivationFailed => {
                write!(f, "MPL data/control address derivation failed")
            }
            Error::TimerCreationFailed => write!(f, "Trickle timer creation failed"),
            Error::PoolExhausted(which) => write!(f, "Pool exhausted: {}", which),
            Error::SeedIdUnknown => write!(f, "Local seed id not configured"),
        }
    }
}

impl std::error::Error for Error {}

/// Convenient alias for API results using the public `Error` type.
pub type Result<T> = core::result::Result<T, Error>;
