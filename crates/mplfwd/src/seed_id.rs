// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Seed identifier codec
//!
//! An MPL seed id names the node that originated a multicast message stream,
//! independent of which forwarder currently relays it. On the wire it appears in
//! one of four forms selected by the option's 2-bit S field; internally every
//! form widens to a single 128-bit value so lookups never branch on length.

use std::fmt;
use std::net::Ipv6Addr;

/// Wire length class of a seed identifier (the MPL option's S field).
///
/// The discriminants are the raw 2-bit field values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum SeedIdLength {
    /// S=0: no explicit bytes; the id derives from the packet's source address.
    SourceAddress = 0,
    /// S=1: 16-bit id, 2 wire bytes.
    Bits16 = 1,
    /// S=2: 64-bit id, 8 wire bytes.
    Bits64 = 2,
    /// S=3: 128-bit id, 16 wire bytes.
    Bits128 = 3,
}

impl SeedIdLength {
    /// Number of seed-id bytes this class carries on the wire.
    #[inline]
    #[must_use]
    pub fn seed_bytes(self) -> usize {
        match self {
            SeedIdLength::SourceAddress => 0,
            SeedIdLength::Bits16 => 2,
            SeedIdLength::Bits64 => 8,
            SeedIdLength::Bits128 => 16,
        }
    }

    /// Decode the class from a 2-bit field. Total on two bits, so every input
    /// maps to a class and no validation path exists.
    #[inline]
    #[must_use]
    pub fn from_bits(bits: u8) -> SeedIdLength {
        match bits & 0b11 {
            0 => SeedIdLength::SourceAddress,
            1 => SeedIdLength::Bits16,
            2 => SeedIdLength::Bits64,
            _ => SeedIdLength::Bits128,
        }
    }
}

/// Internal seed identifier: a 128-bit value plus the wire class it arrived
/// with.
///
/// Equality is value-based only: two ids with the same 128-bit value match
/// even if they were carried at different wire widths. The class is retained
/// so re-broadcasts reproduce the original encoding byte for byte.
#[derive(Debug, Clone, Copy)]
pub struct SeedId {
    /// Wire class used when this id was decoded (or configured).
    pub length: SeedIdLength,
    /// Widened 128-bit value, network byte order interpretation.
    pub value: u128,
}

impl PartialEq for SeedId {
    fn eq(&self, other: &Self) -> bool {
        self.value == other.value
    }
}

impl Eq for SeedId {}

impl SeedId {
    /// Decode a seed id from its wire form.
    ///
    /// For `SourceAddress` the id is the 128-bit network-byte-order value of
    /// the packet's source address; `wire` is ignored. For the explicit forms
    /// the given bytes widen into the low-order end of the value with the
    /// remainder zero-filled.
    ///
    /// `wire` must hold exactly [`SeedIdLength::seed_bytes`] bytes for the
    /// explicit classes; the option parser guarantees this.
    #[must_use]
    pub fn decode(length: SeedIdLength, wire: &[u8], source: &Ipv6Addr) -> SeedId {
        let value = match length {
            SeedIdLength::SourceAddress => u128::from_be_bytes(source.octets()),
            SeedIdLength::Bits16 => {
                let mut b = [0u8; 2];
                b.copy_from_slice(&wire[..2]);
                u128::from(u16::from_be_bytes(b))
            }
            SeedIdLength::Bits64 => {
                let mut b = [0u8; 8];
                b.copy_from_slice(&wire[..8]);
                u128::from(u64::from_be_bytes(b))
            }
            SeedIdLength::Bits128 => {
                let mut b = [0u8; 16];
                b.copy_from_slice(&wire[..16]);
                u128::from_be_bytes(b)
            }
        };
        SeedId { length, value }
    }

    /// Re-encode the explicit wire bytes for this id into `out`.
    ///
    /// Writes [`SeedIdLength::seed_bytes`] bytes (nothing for
    /// `SourceAddress`, whose identity travels in the IPv6 source field).
    pub fn encode_into(&self, out: &mut Vec<u8>) {
        match self.length {
            SeedIdLength::SourceAddress => {}
            SeedIdLength::Bits16 => out.extend_from_slice(&(self.value as u16).to_be_bytes()),
            SeedIdLength::Bits64 => out.extend_from_slice(&(self.value as u64).to_be_bytes()),
            SeedIdLength::Bits128 => out.extend_from_slice(&self.value.to_be_bytes()),
        }
    }
}

impl fmt::Display for SeedId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.length {
            SeedIdLength::Bits16 => write!(f, "{:04x}", self.value),
            SeedIdLength::Bits64 => write!(f, "{:016x}", self.value),
            SeedIdLength::SourceAddress | SeedIdLength::Bits128 => {
                write!(f, "{:032x}", self.value)
            }
        }
    }
}
