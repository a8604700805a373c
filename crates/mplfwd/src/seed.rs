// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Seed tracking
//!
//! A seed is one originator's stream of multicast data messages within one
//! domain. The engine keeps per-seed state to answer the only question that
//! matters for flooding: have we seen this (seed, sequence) before, and if
//! not, where does it sit in the stream?
//!
//! The message list is kept sorted in mod-256 sequence order; its head is the
//! oldest tracked message and `min_sequence` mirrors the head's sequence so
//! the staleness check needs no list walk.

use std::collections::VecDeque;
use std::time::Duration;

use crate::domain::DomainHandle;
use crate::message::MessageHandle;
use crate::pool::{Handle, Pool};
use crate::seed_id::SeedId;
use crate::seq::seq_greater_than;
use crate::{Error, Result};

pub type SeedHandle = Handle<Seed>;

/// Snapshot of one seed's buffering state, for hosts and tests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeedState {
    /// Oldest sequence number still tracked.
    pub min_sequence: u8,
    /// Number of buffered messages.
    pub message_count: usize,
    /// Buffered sequence numbers in ascending mod-256 order.
    pub buffered: Vec<u8>,
}

/// One (seed id, domain) pair and its ordered buffer of tracked messages.
#[derive(Debug)]
pub struct Seed {
    pub(crate) id: SeedId,
    pub(crate) domain: DomainHandle,
    /// Sequence of the list head; messages older than this are stale.
    pub(crate) min_sequence: u8,
    /// Remaining lifetime; refreshed by traffic, drained by the reaper.
    pub(crate) lifetime: Duration,
    /// Buffered messages in ascending mod-256 sequence order.
    pub(crate) messages: VecDeque<MessageHandle>,
}

impl Seed {
    /// A seed enters the set fully formed; there is no half-initialized
    /// window between allocation and use.
    pub(crate) fn new(id: SeedId, domain: DomainHandle, lifetime: Duration) -> Self {
        Seed {
            id,
            domain,
            min_sequence: 0,
            lifetime,
            messages: VecDeque::new(),
        }
    }

    /// Position of the buffered message with `sequence`, if any.
    pub(crate) fn find_buffered<F>(&self, sequence: u8, seq_of: F) -> Option<usize>
    where
        F: Fn(MessageHandle) -> u8,
    {
        self.messages.iter().position(|&h| seq_of(h) == sequence)
    }

    /// Insert a message preserving ascending mod-256 order: before the first
    /// entry greater than it, at the tail if none is.
    ///
    /// Returns true when the message became the new head, in which case
    /// `min_sequence` has been moved down to its sequence. This matters after
    /// a reclaim raised `min_sequence` past sequences still in flight.
    pub(crate) fn insert_ordered<F>(
        &mut self,
        handle: MessageHandle,
        sequence: u8,
        seq_of: F,
    ) -> bool
    where
        F: Fn(MessageHandle) -> u8,
    {
        let at = self
            .messages
            .iter()
            .position(|&h| seq_greater_than(seq_of(h), sequence))
            .unwrap_or(self.messages.len());
        self.messages.insert(at, handle);
        if at == 0 {
            self.min_sequence = sequence;
            return true;
        }
        false
    }

    /// Drop the oldest message from the list and advance `min_sequence` to
    /// the new head. The caller frees the message itself.
    pub(crate) fn evict_oldest<F>(&mut self, seq_of: F) -> Option<MessageHandle>
    where
        F: Fn(MessageHandle) -> u8,
    {
        let victim = self.messages.pop_front()?;
        if let Some(&head) = self.messages.front() {
            self.min_sequence = seq_of(head);
        }
        Some(victim)
    }
}

/// Bounded set of tracked seeds.
pub(crate) struct SeedSet {
    pool: Pool<Seed>,
}

impl SeedSet {
    pub(crate) fn new(capacity: usize) -> Self {
        SeedSet {
            pool: Pool::new(capacity),
        }
    }

    /// Find the seed for an (id, domain) pair. Id comparison is value-based,
    /// so the same originator matches across wire length classes.
    pub(crate) fn lookup(&self, id: &SeedId, domain: DomainHandle) -> Option<SeedHandle> {
        self.pool
            .iter()
            .find(|(_, s)| s.id == *id && s.domain == domain)
            .map(|(h, _)| h)
    }

    /// Commit a fully formed seed to the set.
    ///
    /// # Errors
    ///
    /// `PoolExhausted` when the set is full. Seeds are only freed by the
    /// lifetime reaper, never evicted under pressure.
    pub(crate) fn create(&mut self, seed: Seed) -> Result<SeedHandle> {
        self.pool
            .insert(seed)
            .map_err(|_| Error::PoolExhausted("seed set"))
    }

    #[inline]
    pub(crate) fn get(&self, handle: SeedHandle) -> Option<&Seed> {
        self.pool.get(handle)
    }

    #[inline]
    pub(crate) fn get_mut(&mut self, handle: SeedHandle) -> Option<&mut Seed> {
        self.pool.get_mut(handle)
    }

    pub(crate) fn remove(&mut self, handle: SeedHandle) -> Option<Seed> {
        self.pool.remove(handle)
    }

    #[inline]
    pub(crate) fn len(&self) -> usize {
        self.pool.len()
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = (SeedHandle, &Seed)> {
        self.pool.iter()
    }

    pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = (SeedHandle, &mut Seed)> {
        self.pool.iter_mut()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::BufferedMessage;
    use crate::seed_id::SeedIdLength;
    use crate::services::{IfaceId, TimerId};
    use std::net::Ipv6Addr;

    fn fixture() -> (Pool<BufferedMessage>, Seed) {
        let seed = Seed::new(
            SeedId {
                length: SeedIdLength::Bits16,
                value: 0xBEEF,
            },
            DomainHandle::dangling(),
            Duration::from_secs(60),
        );
        (Pool::new(8), seed)
    }

    fn buffer(pool: &mut Pool<BufferedMessage>, seed: &mut Seed, sequence: u8) -> MessageHandle {
        let handle = pool
            .insert(BufferedMessage {
                seed: SeedHandle::dangling(),
                source: Ipv6Addr::UNSPECIFIED,
                iface: IfaceId(0),
                sequence,
                timer: TimerId(0),
                expirations: 0,
                payload: Vec::new(),
            })
            .unwrap();
        seed.insert_ordered(handle, sequence, |h| {
            pool.get(h).map_or(0, |m| m.sequence)
        });
        handle
    }

    fn sequences(seed: &Seed, pool: &Pool<BufferedMessage>) -> Vec<u8> {
        seed.messages
            .iter()
            .map(|&h| pool.get(h).map_or(0, |m| m.sequence))
            .collect()
    }

    #[test]
    fn test_seed_insert_keeps_mod256_order() {
        let (mut pool, mut seed) = fixture();
        for sequence in [5u8, 3, 9, 7] {
            buffer(&mut pool, &mut seed, sequence);
        }
        assert_eq!(sequences(&seed, &pool), vec![3, 5, 7, 9]);
        assert_eq!(seed.min_sequence, 3);
    }

    #[test]
    fn test_seed_insert_orders_across_wraparound() {
        let (mut pool, mut seed) = fixture();
        for sequence in [254u8, 1, 255, 0] {
            buffer(&mut pool, &mut seed, sequence);
        }
        assert_eq!(sequences(&seed, &pool), vec![254, 255, 0, 1]);
        assert_eq!(seed.min_sequence, 254);
    }

    #[test]
    fn test_seed_head_insert_lowers_min_sequence() {
        let (mut pool, mut seed) = fixture();
        buffer(&mut pool, &mut seed, 7);
        assert_eq!(seed.min_sequence, 7);
        buffer(&mut pool, &mut seed, 5);
        assert_eq!(seed.min_sequence, 5, "head insertion must pull min down");
    }

    #[test]
    fn test_seed_evict_oldest_advances_min_sequence() {
        let (mut pool, mut seed) = fixture();
        for sequence in [3u8, 7, 9] {
            buffer(&mut pool, &mut seed, sequence);
        }
        let victim = seed
            .evict_oldest(|h| pool.get(h).map_or(0, |m| m.sequence))
            .expect("non-empty list");
        assert_eq!(pool.get(victim).map(|m| m.sequence), Some(3));
        assert_eq!(seed.min_sequence, 7);
    }

    #[test]
    fn test_seed_evict_last_keeps_min_sequence() {
        let (mut pool, mut seed) = fixture();
        buffer(&mut pool, &mut seed, 42);
        seed.evict_oldest(|h| pool.get(h).map_or(0, |m| m.sequence))
            .expect("one entry");
        assert!(seed.messages.is_empty());
        assert_eq!(seed.min_sequence, 42, "empty list leaves min untouched");
    }

    #[test]
    fn test_seed_find_buffered_by_sequence() {
        let (mut pool, mut seed) = fixture();
        for sequence in [10u8, 20, 30] {
            buffer(&mut pool, &mut seed, sequence);
        }
        let seq_of = |h| pool.get(h).map_or(0, |m: &BufferedMessage| m.sequence);
        assert_eq!(seed.find_buffered(20, seq_of), Some(1));
        assert_eq!(seed.find_buffered(25, seq_of), None);
    }

    #[test]
    fn test_seed_set_lookup_is_value_keyed() {
        let dh = DomainHandle::dangling();
        let mut set = SeedSet::new(4);
        let wide = SeedId {
            length: SeedIdLength::Bits64,
            value: 0xABCD,
        };
        let handle = set
            .create(Seed::new(wide, dh, Duration::from_secs(1)))
            .expect("space");
        let narrow = SeedId {
            length: SeedIdLength::Bits16,
            value: 0xABCD,
        };
        assert_eq!(set.lookup(&narrow, dh), Some(handle));
    }

    #[test]
    fn test_seed_set_full_reports_exhaustion() {
        let dh = DomainHandle::dangling();
        let mut set = SeedSet::new(1);
        let id = |value| SeedId {
            length: SeedIdLength::Bits16,
            value,
        };
        set.create(Seed::new(id(1), dh, Duration::from_secs(1)))
            .expect("space");
        let err = set
            .create(Seed::new(id(2), dh, Duration::from_secs(1)))
            .unwrap_err();
        assert!(matches!(err, Error::PoolExhausted("seed set")));
    }
}
