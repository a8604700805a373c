// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Local origination state
//!
//! A node that originates multicast traffic is itself a seed. This module
//! holds the process-wide originator state: the configured seed identity,
//! its lazily resolved wire form, and the mod-256 sequence counter stamped
//! onto every originated message.

use std::net::Ipv6Addr;

use crate::config::LocalSeedId;
use crate::seed_id::SeedId;
use crate::{Error, Result};

pub(crate) struct LocalOrigin {
    config: Option<LocalSeedId>,
    /// Cached resolution; computed once, on the first originated packet.
    resolved: Option<SeedId>,
    last_sequence: u8,
}

impl LocalOrigin {
    pub(crate) fn new(config: Option<LocalSeedId>) -> Self {
        LocalOrigin {
            config,
            resolved: None,
            last_sequence: 0,
        }
    }

    /// Install or replace the local seed identity. Clears the cached
    /// resolution so the next originated packet resolves afresh.
    pub(crate) fn set_seed(&mut self, seed: LocalSeedId) {
        self.config = Some(seed);
        self.resolved = None;
    }

    /// The seed id stamped on originated traffic.
    ///
    /// For the source-address class the value binds to the source of the
    /// first originated packet and stays bound there.
    ///
    /// # Errors
    ///
    /// `SeedIdUnknown` when no identity was configured. A startup-ordering
    /// problem on the caller's side, not a transient condition.
    pub(crate) fn resolve(&mut self, source: &Ipv6Addr) -> Result<SeedId> {
        if let Some(seed) = self.resolved {
            return Ok(seed);
        }
        let config = self.config.ok_or(Error::SeedIdUnknown)?;
        let seed = config.resolve(u128::from_be_bytes(source.octets()));
        self.resolved = Some(seed);
        Ok(seed)
    }

    /// Next sequence number, advancing the counter. Wraps mod 256.
    pub(crate) fn next_sequence(&mut self) -> u8 {
        self.last_sequence = self.last_sequence.wrapping_add(1);
        self.last_sequence
    }
}
