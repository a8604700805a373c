// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! MPL Hop-by-Hop option codec
//!
//! Every MPL data packet carries option type `0x6D` inside the IPv6 Hop-by-Hop
//! Options header. Wire layout (RFC 7731 §4):
//!
//! ```text
//!  0                   1                   2                   3
//!  0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! |     0x6D      |  Opt Data Len | S |M|V|  rsv  |   sequence    |
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! |                      seed-id (0/2/8/16 bytes)                 |
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! ```
//!
//! `Opt Data Len` counts the flags byte, the sequence byte and the seed-id
//! bytes. It excludes the two-byte type/length prefix per the RFC 2460 §4.2
//! option convention, so the legal values are 2, 4, 10 and 18.
//!
//! The scanner below walks a Hop-by-Hop options area (the bytes after the
//! header's next-header/length prefix), skipping Pad1, PadN and unknown
//! options until it finds the MPL option. Alignment padding around the option
//! is the packet service's concern; the encoder emits the bare option bytes.

use crate::seed_id::{SeedId, SeedIdLength};
use crate::{Error, Result};

/// IPv6 option type assigned to MPL (RFC 7731).
pub const MPL_OPTION_TYPE: u8 = 0x6D;

/// Pad1 option type: a single zero byte, no length field.
const OPT_PAD1: u8 = 0x00;

/// M flag: the carried sequence is the largest this forwarder has buffered for
/// the seed.
pub const FLAG_M: u8 = 0x20;

/// V flag: reserved, must be zero on receipt.
pub const FLAG_V: u8 = 0x10;

/// Bit position of the 2-bit S field inside the flags byte.
const FLAG_S_SHIFT: u8 = 6;

/// A decoded MPL option, borrowing the seed-id bytes from the packet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MplOption<'a> {
    /// Seed-id length class from the S field.
    pub seed_length: SeedIdLength,
    /// M flag: more messages follow in this seed's sequence.
    pub more: bool,
    /// 8-bit MPL sequence number.
    pub sequence: u8,
    /// Raw seed-id bytes (empty for the address-derived class).
    pub seed_bytes: &'a [u8],
}

/// Scan a Hop-by-Hop options area for the MPL option and decode it.
///
/// # Errors
///
/// `MalformedPacket` when the area is truncated, carries no MPL option, has
/// the reserved V bit set, or declares an option length that disagrees with
/// its S class.
pub fn find_mpl_option(options: &[u8]) -> Result<MplOption<'_>> {
    let mut i = 0;
    while i < options.len() {
        let opt_type = options[i];
        if opt_type == OPT_PAD1 {
            i += 1;
            continue;
        }
        if i + 1 >= options.len() {
            return Err(Error::MalformedPacket("truncated option header"));
        }
        let data_len = options[i + 1] as usize;
        let start = i + 2;
        let end = start + data_len;
        if end > options.len() {
            return Err(Error::MalformedPacket("option data exceeds header"));
        }
        if opt_type == MPL_OPTION_TYPE {
            return decode_mpl(&options[start..end]);
        }
        // PadN and any non-MPL option: skip over.
        i = end;
    }
    Err(Error::MalformedPacket("no MPL option"))
}

fn decode_mpl(data: &[u8]) -> Result<MplOption<'_>> {
    if data.len() < 2 {
        return Err(Error::MalformedPacket("MPL option shorter than flags+seq"));
    }
    let flags = data[0];
    if flags & FLAG_V != 0 {
        return Err(Error::MalformedPacket("reserved V flag set"));
    }
    let seed_length = SeedIdLength::from_bits(flags >> FLAG_S_SHIFT);
    let seed_bytes = &data[2..];
    if seed_bytes.len() != seed_length.seed_bytes() {
        return Err(Error::MalformedPacket("seed-id length mismatch"));
    }
    Ok(MplOption {
        seed_length,
        more: flags & FLAG_M != 0,
        sequence: data[1],
        seed_bytes,
    })
}

/// Encode a complete MPL option (type and length bytes included).
///
/// The seed id is re-emitted at the wire width it was decoded or configured
/// with, so a re-broadcast reproduces the original encoding byte for byte.
#[must_use]
pub fn encode_mpl_option(seed: &SeedId, sequence: u8, more: bool) -> Vec<u8> {
    let seed_len = seed.length.seed_bytes();
    let mut buf = Vec::with_capacity(4 + seed_len);
    buf.push(MPL_OPTION_TYPE);
    buf.push((2 + seed_len) as u8);
    let mut flags = (seed.length as u8) << FLAG_S_SHIFT;
    if more {
        flags |= FLAG_M;
    }
    buf.push(flags);
    buf.push(sequence);
    seed.encode_into(&mut buf);
    buf
}
