// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Buffered data messages
//!
//! Every admitted data message is held here until its seed is reaped or the
//! slot is reclaimed under pool pressure. The buffer serves two masters:
//! Trickle retransmission (while the timer runs) and duplicate detection
//! (for as long as the entry lives, long after the timer went quiet).

use std::net::Ipv6Addr;

use crate::pool::Handle;
use crate::seed::SeedHandle;
use crate::services::{IfaceId, TimerId};

pub type MessageHandle = Handle<BufferedMessage>;

/// One buffered multicast data message, identified by
/// (seed, sequence) within its domain.
#[derive(Debug)]
pub struct BufferedMessage {
    /// Owning seed.
    pub(crate) seed: SeedHandle,
    /// IPv6 source address of the admitted packet.
    pub(crate) source: Ipv6Addr,
    /// Interface the packet arrived on; retransmissions leave through it.
    pub(crate) iface: IfaceId,
    /// MPL sequence number.
    pub(crate) sequence: u8,
    /// Data Trickle timer driving retransmission.
    pub(crate) timer: TimerId,
    /// Trickle expirations consumed so far.
    pub(crate) expirations: u8,
    /// Upper-layer payload, retransmitted byte for byte.
    pub(crate) payload: Vec<u8>,
}

impl BufferedMessage {
    /// MPL sequence number of this message.
    #[inline]
    #[must_use]
    pub fn sequence(&self) -> u8 {
        self.sequence
    }

    /// Source address the message was originally admitted with.
    #[inline]
    #[must_use]
    pub fn source(&self) -> Ipv6Addr {
        self.source
    }
}
