// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Serial-number arithmetic for MPL sequence numbers
//!
//! MPL sequence numbers are 8 bits and wrap, so the engine never compares them
//! with `<`/`>` directly. RFC 7731 defines the ordering: `b` is greater than `a`
//! when the forward distance from `a` to `b` is less than 128, otherwise `a` is
//! greater. For any pair exactly one of equal / less-than / greater-than holds.

/// True if `a` precedes `b` in mod-256 serial-number order.
///
/// # Performance
///
/// Branch-free wrapping subtraction; suitable for the per-message linear scans
/// in the admission path.
///
/// # Example
///
/// ```
/// use mplfwd::seq::seq_less_than;
///
/// assert!(seq_less_than(5, 10));
/// assert!(seq_less_than(250, 3)); // wrapped
/// assert!(!seq_less_than(7, 7));
/// ```
#[inline]
#[must_use]
pub fn seq_less_than(a: u8, b: u8) -> bool {
    a != b && b.wrapping_sub(a) < 128
}

/// True if `a` follows `b` in mod-256 serial-number order.
///
/// At a forward distance of exactly 128 neither value precedes the other by the
/// RFC rule, so `a` is considered greater.
#[inline]
#[must_use]
pub fn seq_greater_than(a: u8, b: u8) -> bool {
    a != b && b.wrapping_sub(a) >= 128
}

/// Advance a sequence number by `n`, wrapping mod 256.
#[inline]
#[must_use]
pub fn seq_add(a: u8, n: u8) -> u8 {
    a.wrapping_add(n)
}
