// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! MPL domains
//!
//! A domain pairs the data-plane multicast address packets flood over with
//! the control-plane address reachability summaries go to, plus the control
//! Trickle timer for that pairing. Domains come into existence lazily, on the
//! first packet addressed to a group no existing domain covers, and live for
//! the life of the engine.

use std::net::Ipv6Addr;

use crate::config::TrickleParams;
use crate::pool::{Handle, Pool};
use crate::services::{IfaceId, PacketService, TimerId, TrickleTimers};
use crate::{Error, Result};

pub type DomainHandle = Handle<Domain>;

/// ALL_MPL_FORWARDERS well-known group at link-local scope.
pub const ALL_MPL_FORWARDERS_LINK_LOCAL: Ipv6Addr =
    Ipv6Addr::new(0xff02, 0, 0, 0, 0, 0, 0, 0xfc);

const SCOPE_LINK_LOCAL: u8 = 0x02;
const SCOPE_REALM_LOCAL: u8 = 0x03;
const SCOPE_SITE_LOCAL: u8 = 0x05;

/// RFC 3306 flags nibble for unicast-prefix-based multicast groups.
const FLAGS_UNICAST_PREFIX: u8 = 0x3;

/// One MPL domain: the (data address, control address) pair and its
/// control-plane Trickle state.
#[derive(Debug)]
pub struct Domain {
    pub(crate) data_address: Ipv6Addr,
    pub(crate) control_address: Ipv6Addr,
    pub(crate) iface: IfaceId,
    pub(crate) timer: TimerId,
    /// Control timer expirations since the domain last changed.
    pub(crate) expirations: u8,
}

impl Domain {
    /// Data-plane multicast address packets of this domain flood over.
    #[inline]
    #[must_use]
    pub fn data_address(&self) -> Ipv6Addr {
        self.data_address
    }

    /// Control-plane multicast address summaries of this domain go to.
    #[inline]
    #[must_use]
    pub fn control_address(&self) -> Ipv6Addr {
        self.control_address
    }

    /// Interface the domain was established on.
    #[inline]
    #[must_use]
    pub fn iface(&self) -> IfaceId {
        self.iface
    }
}

/// Derive the missing half of a domain's address pair from the supplied
/// multicast address.
///
/// Three rules, checked in order:
/// - unicast-prefix-based group (RFC 3306 flags nibble `0x3`): the supplied
///   address is the data address; control is [`ALL_MPL_FORWARDERS_LINK_LOCAL`].
/// - well-known group at link-local scope: the supplied address is the
///   control address; the data sibling is the same group id rewritten upward
///   through realm, admin and site scope, taking the first scope whose group
///   `is_joined` reports as already subscribed.
/// - well-known group at realm, admin or site scope: the supplied address is
///   the data address; control is the same group at link-local scope.
///
/// Returns `(data, control)`.
///
/// # Errors
///
/// `AddressDerivationFailed` for non-multicast input, interface-local or
/// greater-than-site scope, and for a link-local input whose sibling search
/// finds no joined group.
fn derive_pair<F>(supplied: &Ipv6Addr, is_joined: F) -> Result<(Ipv6Addr, Ipv6Addr)>
where
    F: Fn(&Ipv6Addr) -> bool,
{
    let octets = supplied.octets();
    if octets[0] != 0xFF {
        return Err(Error::AddressDerivationFailed);
    }
    let flags = octets[1] >> 4;
    let scope = octets[1] & 0x0F;

    if flags == FLAGS_UNICAST_PREFIX {
        return Ok((*supplied, ALL_MPL_FORWARDERS_LINK_LOCAL));
    }

    match scope {
        SCOPE_LINK_LOCAL => {
            let mut candidate = octets;
            for probe in SCOPE_REALM_LOCAL..=SCOPE_SITE_LOCAL {
                candidate[1] = (octets[1] & 0xF0) | probe;
                let data = Ipv6Addr::from(candidate);
                if is_joined(&data) {
                    return Ok((data, *supplied));
                }
            }
            Err(Error::AddressDerivationFailed)
        }
        SCOPE_REALM_LOCAL..=SCOPE_SITE_LOCAL => {
            let mut control = octets;
            control[1] = (octets[1] & 0xF0) | SCOPE_LINK_LOCAL;
            Ok((*supplied, Ipv6Addr::from(control)))
        }
        _ => Err(Error::AddressDerivationFailed),
    }
}

/// Bounded set of active domains.
pub(crate) struct DomainSet {
    pool: Pool<Domain>,
}

impl DomainSet {
    pub(crate) fn new(capacity: usize) -> Self {
        DomainSet {
            pool: Pool::new(capacity),
        }
    }

    /// Find the domain covering `addr`, matching the data and control
    /// addresses alike.
    pub(crate) fn lookup(&self, addr: &Ipv6Addr) -> Option<DomainHandle> {
        self.pool
            .iter()
            .find(|(_, d)| d.data_address == *addr || d.control_address == *addr)
            .map(|(h, _)| h)
    }

    /// Establish a new domain from a packet's destination address.
    ///
    /// Side effects on success: the node joins the control-plane group on
    /// `iface` and starts monitoring it for membership changes, and a control
    /// Trickle timer is allocated from the host.
    ///
    /// # Errors
    ///
    /// `PoolExhausted` when the domain set is full, `AddressDerivationFailed`
    /// per [`derive_pair`], `TimerCreationFailed` when the host is out of
    /// timers. Failures leave no slot committed.
    pub(crate) fn create(
        &mut self,
        timers: &mut dyn TrickleTimers,
        net: &mut dyn PacketService,
        iface: IfaceId,
        supplied: &Ipv6Addr,
        params: TrickleParams,
    ) -> Result<DomainHandle> {
        if self.pool.is_full() {
            return Err(Error::PoolExhausted("domain set"));
        }
        let (data, control) = derive_pair(supplied, |g| net.is_group_joined(iface, g))?;

        net.join_group(iface, &control);
        net.monitor_group(iface, &control);

        let timer = timers
            .create(params)
            .ok_or(Error::TimerCreationFailed)?;

        let domain = Domain {
            data_address: data,
            control_address: control,
            iface,
            timer,
            expirations: 0,
        };
        let handle = self
            .pool
            .insert(domain)
            .map_err(|_| Error::PoolExhausted("domain set"))?;
        log::debug!(
            "[DomainSet::create] data={} control={} iface={}",
            data,
            control,
            iface.0
        );
        Ok(handle)
    }

    #[inline]
    pub(crate) fn get(&self, handle: DomainHandle) -> Option<&Domain> {
        self.pool.get(handle)
    }

    #[inline]
    pub(crate) fn get_mut(&mut self, handle: DomainHandle) -> Option<&mut Domain> {
        self.pool.get_mut(handle)
    }

    #[inline]
    pub(crate) fn len(&self) -> usize {
        self.pool.len()
    }
}
