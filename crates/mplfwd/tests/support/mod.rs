// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Shared fake collaborators for the integration tests.
//!
//! [`FakeTrickle`] and [`FakeNet`] record every timer operation and
//! transmission so tests can assert on the engine's observable behavior
//! without a real timer wheel or network stack. Timers restart from their
//! minimum interval on an inconsistent signal when they still hold a
//! binding, matching the timer service contract.

#![allow(dead_code)]

use std::collections::BTreeMap;
use std::net::Ipv6Addr;

use mplfwd::{
    IfaceId, PacketService, SeedAdvert, TimerBinding, TimerId, TrickleParams, TrickleTimers,
};

/// One fake timer's observable history.
#[derive(Debug, Clone)]
pub struct FakeTimer {
    pub params: TrickleParams,
    pub running: bool,
    pub binding: Option<TimerBinding>,
    pub consistent: u32,
    pub inconsistent: u32,
    pub stops: u32,
}

/// Recording Trickle timer service.
pub struct FakeTrickle {
    next: u32,
    /// Keyed by raw timer id; BTreeMap keeps iteration in creation order.
    pub timers: BTreeMap<u32, FakeTimer>,
    /// Remaining successful `create` calls; `None` means unlimited.
    pub create_budget: Option<u32>,
}

impl FakeTrickle {
    pub fn new() -> Self {
        FakeTrickle {
            next: 0,
            timers: BTreeMap::new(),
            create_budget: None,
        }
    }

    /// A service that refuses creation after `budget` timers.
    pub fn with_create_budget(budget: u32) -> Self {
        let mut fake = FakeTrickle::new();
        fake.create_budget = Some(budget);
        fake
    }

    pub fn timer(&self, id: TimerId) -> &FakeTimer {
        &self.timers[&id.0]
    }

    pub fn running_count(&self) -> usize {
        self.timers.values().filter(|t| t.running).count()
    }

    /// Bindings of running data-message timers, in creation order.
    pub fn running_data_bindings(&self) -> Vec<TimerBinding> {
        self.timers
            .values()
            .filter(|t| t.running)
            .filter_map(|t| t.binding)
            .filter(|b| matches!(b, TimerBinding::DataMessage(_)))
            .collect()
    }

    /// Bindings of every data-message timer ever started, in creation order,
    /// stopped ones included.
    pub fn data_bindings(&self) -> Vec<TimerBinding> {
        self.timers
            .values()
            .filter_map(|t| t.binding)
            .filter(|b| matches!(b, TimerBinding::DataMessage(_)))
            .collect()
    }

    /// Data-message timers in creation order, for signal assertions.
    pub fn data_timers(&self) -> Vec<&FakeTimer> {
        self.timers
            .values()
            .filter(|t| matches!(t.binding, Some(TimerBinding::DataMessage(_))))
            .collect()
    }

    /// Domain-control timers in creation order.
    pub fn control_timers(&self) -> Vec<&FakeTimer> {
        self.timers
            .values()
            .filter(|t| matches!(t.binding, Some(TimerBinding::DomainControl(_))))
            .collect()
    }

    /// The timer that was started with this binding.
    pub fn timer_of(&self, binding: TimerBinding) -> Option<&FakeTimer> {
        self.timers.values().find(|t| t.binding == Some(binding))
    }

    /// Binding of the first running control timer, if any.
    pub fn running_control_binding(&self) -> Option<TimerBinding> {
        self.timers
            .values()
            .filter(|t| t.running)
            .filter_map(|t| t.binding)
            .find(|b| matches!(b, TimerBinding::DomainControl(_)))
    }
}

impl Default for FakeTrickle {
    fn default() -> Self {
        FakeTrickle::new()
    }
}

impl TrickleTimers for FakeTrickle {
    fn create(&mut self, params: TrickleParams) -> Option<TimerId> {
        if let Some(budget) = &mut self.create_budget {
            if *budget == 0 {
                return None;
            }
            *budget -= 1;
        }
        let id = self.next;
        self.next += 1;
        self.timers.insert(
            id,
            FakeTimer {
                params,
                running: false,
                binding: None,
                consistent: 0,
                inconsistent: 0,
                stops: 0,
            },
        );
        Some(TimerId(id))
    }

    fn start(&mut self, timer: TimerId, binding: TimerBinding) {
        if let Some(t) = self.timers.get_mut(&timer.0) {
            t.running = true;
            t.binding = Some(binding);
        }
    }

    fn stop(&mut self, timer: TimerId) {
        if let Some(t) = self.timers.get_mut(&timer.0) {
            t.running = false;
            t.stops += 1;
        }
    }

    fn is_running(&self, timer: TimerId) -> bool {
        self.timers.get(&timer.0).map_or(false, |t| t.running)
    }

    fn signal_consistent(&mut self, timer: TimerId) {
        if let Some(t) = self.timers.get_mut(&timer.0) {
            t.consistent += 1;
        }
    }

    fn signal_inconsistent(&mut self, timer: TimerId) {
        if let Some(t) = self.timers.get_mut(&timer.0) {
            t.inconsistent += 1;
            if t.binding.is_some() {
                t.running = true;
            }
        }
    }
}

/// One recorded data-plane transmission.
#[derive(Debug, Clone, PartialEq)]
pub struct SentData {
    pub iface: IfaceId,
    pub dst: Ipv6Addr,
    pub option: Vec<u8>,
    pub payload: Vec<u8>,
}

/// One recorded control-plane transmission.
#[derive(Debug, Clone, PartialEq)]
pub struct SentControl {
    pub iface: IfaceId,
    pub dst: Ipv6Addr,
    pub adverts: Vec<SeedAdvert>,
}

/// Recording IPv6 plumbing.
pub struct FakeNet {
    pub own: Vec<Ipv6Addr>,
    pub joined: Vec<(IfaceId, Ipv6Addr)>,
    pub monitored: Vec<(IfaceId, Ipv6Addr)>,
    pub data_sent: Vec<SentData>,
    pub control_sent: Vec<SentControl>,
}

impl FakeNet {
    pub fn new() -> Self {
        FakeNet {
            own: Vec::new(),
            joined: Vec::new(),
            monitored: Vec::new(),
            data_sent: Vec::new(),
            control_sent: Vec::new(),
        }
    }

    /// Mark an address as one of the node's own.
    pub fn with_own_address(mut self, addr: Ipv6Addr) -> Self {
        self.own.push(addr);
        self
    }

    /// Pre-join a group, as an application join would have.
    pub fn with_joined(mut self, iface: IfaceId, group: Ipv6Addr) -> Self {
        self.joined.push((iface, group));
        self
    }
}

impl Default for FakeNet {
    fn default() -> Self {
        FakeNet::new()
    }
}

impl PacketService for FakeNet {
    fn is_own_address(&self, addr: &Ipv6Addr) -> bool {
        self.own.contains(addr)
    }

    fn is_group_joined(&self, iface: IfaceId, group: &Ipv6Addr) -> bool {
        self.joined.contains(&(iface, *group))
    }

    fn join_group(&mut self, iface: IfaceId, group: &Ipv6Addr) {
        if !self.is_group_joined(iface, group) {
            self.joined.push((iface, *group));
        }
    }

    fn monitor_group(&mut self, iface: IfaceId, group: &Ipv6Addr) {
        self.monitored.push((iface, *group));
    }

    fn send_data(&mut self, iface: IfaceId, dst: Ipv6Addr, option: &[u8], payload: &[u8]) {
        self.data_sent.push(SentData {
            iface,
            dst,
            option: option.to_vec(),
            payload: payload.to_vec(),
        });
    }

    fn send_control(&mut self, iface: IfaceId, dst: Ipv6Addr, adverts: &[SeedAdvert]) {
        self.control_sent.push(SentControl {
            iface,
            dst,
            adverts: adverts.to_vec(),
        });
    }
}

/// Raw MPL option bytes for hand-built packets: `s` is the 2-bit seed length
/// class, `seed` the explicit seed-id bytes (empty for S=0).
pub fn mpl_option(s: u8, seed: &[u8], sequence: u8, more: bool) -> Vec<u8> {
    let mut flags = s << 6;
    if more {
        flags |= 0x20;
    }
    let mut out = vec![0x6D, (2 + seed.len()) as u8, flags, sequence];
    out.extend_from_slice(seed);
    out
}

/// IPv6 address shorthand for test fixtures.
pub fn addr(s: &str) -> Ipv6Addr {
    s.parse().expect("test address literal must parse")
}
