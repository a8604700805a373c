// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Admission engine and forwarding state machine
//!
//! [`Forwarder`] owns the three pools and every piece of forwarding policy:
//! duplicate suppression, staleness, buffering, reclamation and the Trickle
//! expiration callbacks. The host feeds it inbound packets, timer fire
//! events and a periodic reaper tick; everything platform-shaped stays
//! behind the [`TrickleTimers`] and [`PacketService`] traits.
//!
//! # Architecture
//!
//! A message is conceptually `Unseen -> Buffered -> Expired`. Delivery up
//! the stack happens exactly once, synchronously, when a packet transitions
//! `Unseen -> Buffered`: that is the [`Verdict::Deliver`] return from
//! [`Forwarder::receive`]. Trickle expirations only govern re-broadcast
//! scheduling, never delivery.
//!
//! All entry points take `&mut self`, so the single-threaded cooperative
//! model is a compile-time property: the host must serialize packet
//! admission and timer callbacks onto one execution context.

use std::net::Ipv6Addr;
use std::time::Duration;

use crate::config::{LocalSeedId, MplConfig};
use crate::domain::{DomainHandle, DomainSet};
use crate::message::{BufferedMessage, MessageHandle};
use crate::outbound::LocalOrigin;
use crate::pool::Pool;
use crate::seed::{Seed, SeedHandle, SeedSet, SeedState};
use crate::seed_id::SeedId;
use crate::seq::seq_less_than;
use crate::services::{IfaceId, PacketService, SeedAdvert, TimerBinding, TrickleTimers};
use crate::stats::MplStats;
use crate::wire::{encode_mpl_option, find_mpl_option};
use crate::{Error, Result};

/// One inbound packet, as handed in by the host IP stack.
#[derive(Debug)]
pub struct RxPacket<'a> {
    /// IPv6 source address.
    pub src: Ipv6Addr,
    /// IPv6 destination address (a multicast group).
    pub dst: Ipv6Addr,
    /// Interface the packet arrived on.
    pub iface: IfaceId,
    /// Option data of the Hop-by-Hop extension header, without the 2-byte
    /// next-header/length prefix. `None` when the packet carries no
    /// Hop-by-Hop header at all.
    pub hbh_options: Option<&'a [u8]>,
    /// Upper-layer payload, buffered and retransmitted byte for byte.
    pub payload: &'a [u8],
}

/// What the host IP stack should do with the packet it just handed in.
#[must_use]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// Novel message: continue processing the packet up the stack.
    Deliver,
    /// Duplicate, stale, looped or unusable: drop it.
    Drop,
}

/// Outcome of running one packet through the admission algorithm.
enum Admitted {
    Fresh(MessageHandle),
    Duplicate,
    Stale,
    SelfSource,
}

/// The MPL forwarding engine.
pub struct Forwarder {
    cfg: MplConfig,
    domains: DomainSet,
    seeds: SeedSet,
    messages: Pool<BufferedMessage>,
    local: LocalOrigin,
    stats: MplStats,
}

impl Forwarder {
    /// Build an engine with the given configuration. Pool capacities are
    /// fixed here for the engine's lifetime.
    #[must_use]
    pub fn new(cfg: MplConfig) -> Self {
        let domains = DomainSet::new(cfg.domain_capacity);
        let seeds = SeedSet::new(cfg.seed_capacity);
        let messages = Pool::new(cfg.message_capacity);
        let local = LocalOrigin::new(cfg.local_seed);
        Forwarder {
            cfg,
            domains,
            seeds,
            messages,
            local,
            stats: MplStats::default(),
        }
    }

    /// Install or replace the seed identity for locally originated traffic.
    /// Must happen before the first [`send_originated`](Self::send_originated).
    pub fn set_local_seed_id(&mut self, seed: LocalSeedId) {
        self.local.set_seed(seed);
    }

    // ===================================================================
    // Inbound path
    // ===================================================================

    /// Run one inbound multicast packet through admission.
    ///
    /// Returns [`Verdict::Deliver`] exactly when the packet is novel and was
    /// buffered; every drop reason (duplicate, stale, malformed, resource
    /// exhaustion) comes back as [`Verdict::Drop`] with the cause recorded
    /// in [`stats`](Self::stats). No error is surfaced on this path: a
    /// refused packet is expected network noise, and the protocol's own
    /// retransmission is the recovery mechanism.
    pub fn receive(
        &mut self,
        timers: &mut dyn TrickleTimers,
        net: &mut dyn PacketService,
        pkt: &RxPacket<'_>,
    ) -> Verdict {
        match self.admit(timers, net, pkt, true) {
            Ok(Admitted::Fresh(_)) => {
                self.stats.delivered += 1;
                Verdict::Deliver
            }
            Ok(_) => Verdict::Drop,
            Err(err) => {
                self.note_drop(&err);
                Verdict::Drop
            }
        }
    }

    // ===================================================================
    // Outbound path
    // ===================================================================

    /// Originate a multicast data message from this node.
    ///
    /// The payload is wrapped with an MPL option carrying the configured
    /// local seed id and the next local sequence number, then admitted
    /// exactly like a received packet, so local traffic gets the same
    /// buffering, retry and suppression treatment as relayed traffic. On
    /// successful admission the wrapped packet is also transmitted once,
    /// immediately; Trickle schedules the re-broadcasts thereafter.
    ///
    /// # Errors
    ///
    /// `SeedIdUnknown` when no local seed identity is configured yet; retry
    /// after [`set_local_seed_id`](Self::set_local_seed_id). Internal
    /// admission failures (pool pressure, timer exhaustion) are counted in
    /// [`stats`](Self::stats) and not surfaced, matching the inbound path.
    pub fn send_originated(
        &mut self,
        timers: &mut dyn TrickleTimers,
        net: &mut dyn PacketService,
        iface: IfaceId,
        source: Ipv6Addr,
        destination: Ipv6Addr,
        payload: &[u8],
    ) -> Result<()> {
        let seed_id = self.local.resolve(&source)?;
        let sequence = self.local.next_sequence();
        let option = encode_mpl_option(&seed_id, sequence, false);
        let pkt = RxPacket {
            src: source,
            dst: destination,
            iface,
            hbh_options: Some(&option),
            payload,
        };
        match self.admit(timers, net, &pkt, false) {
            Ok(Admitted::Fresh(handle)) => {
                self.transmit_data(net, handle);
                Ok(())
            }
            Ok(_) => {
                log::debug!(
                    "[Forwarder::send_originated] seq={} already tracked, not re-sent",
                    sequence
                );
                Ok(())
            }
            Err(err) => {
                self.note_drop(&err);
                Ok(())
            }
        }
    }

    // ===================================================================
    // Trickle expiration callbacks
    // ===================================================================

    /// Entry point for Trickle fire events, invoked by the host once per
    /// interval with the binding given to the most recent `start` and the
    /// timer's suppression decision for this interval.
    pub fn trickle_expired(
        &mut self,
        timers: &mut dyn TrickleTimers,
        net: &mut dyn PacketService,
        binding: TimerBinding,
        suppress: bool,
    ) {
        match binding {
            TimerBinding::DataMessage(handle) => {
                self.data_expired(timers, net, handle, suppress);
            }
            TimerBinding::DomainControl(handle) => {
                self.control_expired(timers, net, handle, suppress);
            }
        }
    }

    fn data_expired(
        &mut self,
        timers: &mut dyn TrickleTimers,
        net: &mut dyn PacketService,
        handle: MessageHandle,
        suppress: bool,
    ) {
        let Some(message) = self.messages.get(handle) else {
            // Fire event raced a reclaim; the slot is gone.
            log::debug!("[Forwarder::data_expired] dead message binding, ignored");
            return;
        };
        let timer = message.timer;
        if message.expirations >= self.cfg.data_expirations {
            // Fully propagated. The entry stays buffered for dedup.
            timers.stop(timer);
            return;
        }
        if !suppress {
            self.transmit_data(net, handle);
        }
        if let Some(message) = self.messages.get_mut(handle) {
            message.expirations += 1;
        }
    }

    fn control_expired(
        &mut self,
        timers: &mut dyn TrickleTimers,
        net: &mut dyn PacketService,
        handle: DomainHandle,
        suppress: bool,
    ) {
        let Some(domain) = self.domains.get(handle) else {
            log::debug!("[Forwarder::control_expired] dead domain binding, ignored");
            return;
        };
        let timer = domain.timer;
        if domain.expirations >= self.cfg.control_expirations {
            timers.stop(timer);
            return;
        }
        if !suppress {
            let adverts: Vec<SeedAdvert> = self
                .seeds
                .iter()
                .filter(|(_, s)| s.domain == handle)
                .map(|(_, s)| SeedAdvert {
                    seed_id: s.id,
                    min_sequence: s.min_sequence,
                    buffered: s
                        .messages
                        .iter()
                        .map(|&m| self.messages.get(m).map_or(0, |b| b.sequence))
                        .collect(),
                })
                .collect();
            net.send_control(domain.iface, domain.control_address, &adverts);
            self.stats.control_tx += 1;
            log::debug!(
                "[Forwarder::control_expired] advertised {} seed(s) to {}",
                adverts.len(),
                domain.control_address
            );
        }
        if let Some(domain) = self.domains.get_mut(handle) {
            domain.expirations += 1;
        }
    }

    // ===================================================================
    // Maintenance
    // ===================================================================

    /// Age every seed by `elapsed` and free the ones whose lifetime ran
    /// out, along with all of their buffered messages. Driven by the host's
    /// periodic tick; admission refreshes lifetimes, so only idle seeds go.
    pub fn reap_seeds(&mut self, timers: &mut dyn TrickleTimers, elapsed: Duration) {
        let expired: Vec<SeedHandle> = self
            .seeds
            .iter_mut()
            .filter_map(|(handle, seed)| {
                seed.lifetime = seed.lifetime.saturating_sub(elapsed);
                seed.lifetime.is_zero().then_some(handle)
            })
            .collect();
        for handle in expired {
            self.free_seed(timers, handle);
        }
    }

    fn free_seed(&mut self, timers: &mut dyn TrickleTimers, handle: SeedHandle) {
        let Some(seed) = self.seeds.remove(handle) else {
            return;
        };
        for message in seed.messages {
            if let Some(entry) = self.messages.remove(message) {
                timers.stop(entry.timer);
            }
        }
        self.stats.reaped_seeds += 1;
        log::debug!("[Forwarder::reap_seeds] seed={} expired, freed", seed.id);
    }

    // ===================================================================
    // Introspection
    // ===================================================================

    /// Number of active domains.
    #[must_use]
    pub fn domain_count(&self) -> usize {
        self.domains.len()
    }

    /// Number of tracked seeds.
    #[must_use]
    pub fn seed_count(&self) -> usize {
        self.seeds.len()
    }

    /// Number of buffered messages across all seeds.
    #[must_use]
    pub fn buffered_count(&self) -> usize {
        self.messages.len()
    }

    /// Buffering snapshot for the seed with this id, in any domain.
    #[must_use]
    pub fn seed_state(&self, id: &SeedId) -> Option<SeedState> {
        let (_, seed) = self.seeds.iter().find(|(_, s)| s.id == *id)?;
        Some(SeedState {
            min_sequence: seed.min_sequence,
            message_count: seed.messages.len(),
            buffered: seed
                .messages
                .iter()
                .map(|&m| self.messages.get(m).map_or(0, |b| b.sequence))
                .collect(),
        })
    }

    /// Snapshot of the forwarding counters.
    #[must_use]
    pub fn stats(&self) -> MplStats {
        self.stats
    }

    // ===================================================================
    // Admission (core state machine)
    // ===================================================================

    /// The admission algorithm. Duplicate detection runs strictly before
    /// any buffering decision, so a retransmitted duplicate can never be
    /// admitted twice.
    fn admit(
        &mut self,
        timers: &mut dyn TrickleTimers,
        net: &mut dyn PacketService,
        pkt: &RxPacket<'_>,
        is_input: bool,
    ) -> Result<Admitted> {
        // 1. Loop prevention, on genuine receives only. Self-submitted
        //    outbound packets bypass this via is_input=false.
        if is_input && net.is_own_address(&pkt.src) {
            self.stats.looped += 1;
            log::debug!("[Forwarder::admit] own source {}, loop dropped", pkt.src);
            return Ok(Admitted::SelfSource);
        }

        // 2-4. MPL option and seed identity. The V-bit and truncation
        //      checks live in the option scanner.
        let options = pkt
            .hbh_options
            .ok_or(Error::MalformedPacket("missing hop-by-hop options"))?;
        let option = find_mpl_option(options)?;
        let seed_id = SeedId::decode(option.seed_length, option.seed_bytes, &pkt.src);

        // 5. Domain, keyed on the destination group.
        let domain = match self.domains.lookup(&pkt.dst) {
            Some(handle) => handle,
            None => self.domains.create(
                timers,
                net,
                pkt.iface,
                &pkt.dst,
                self.cfg.control_trickle,
            )?,
        };

        // 6. Seed, keyed on (id, domain).
        let (seed, known_seed) = match self.seeds.lookup(&seed_id, domain) {
            Some(handle) => (handle, true),
            None => {
                let fresh = Seed::new(seed_id, domain, self.cfg.seed_lifetime);
                (self.seeds.create(fresh)?, false)
            }
        };

        // 7-8. Staleness and duplicate detection against the live entry.
        {
            let messages = &self.messages;
            let Some(entry) = self.seeds.get(seed) else {
                unreachable!("seed handle was resolved two statements ago")
            };

            if known_seed && seq_less_than(option.sequence, entry.min_sequence) {
                self.stats.stale += 1;
                log::debug!(
                    "[Forwarder::admit] stale seq={} min={}, dropped",
                    option.sequence,
                    entry.min_sequence
                );
                return Ok(Admitted::Stale);
            }

            let found =
                entry.find_buffered(option.sequence, |h| {
                    messages.get(h).map_or(0, |m| m.sequence)
                });
            if let Some(position) = found {
                self.stats.duplicates += 1;
                let last = position + 1 == entry.messages.len();
                let dup = entry.messages[position];
                let dup_timer = messages.get(dup).map(|m| m.timer);
                if option.more && !last {
                    // The sender has newer traffic and so do we; prod this
                    // entry back to fast retransmission for the laggards.
                    if let Some(tracked) = self.messages.get_mut(dup) {
                        tracked.expirations = 0;
                    }
                    if let Some(timer) = dup_timer {
                        timers.signal_inconsistent(timer);
                    }
                } else if let Some(timer) = dup_timer {
                    timers.signal_consistent(timer);
                }
                log::debug!(
                    "[Forwarder::admit] duplicate seq={} suppressed",
                    option.sequence
                );
                return Ok(Admitted::Duplicate);
            }
        }

        // 9. Novel: timer first, then a buffer slot with reclaim fallback.
        let timer = timers
            .create(self.cfg.data_trickle)
            .ok_or(Error::TimerCreationFailed)?;
        let message = BufferedMessage {
            seed,
            source: pkt.src,
            iface: pkt.iface,
            sequence: option.sequence,
            timer,
            expirations: 0,
            payload: pkt.payload.to_vec(),
        };
        let handle = match self.messages.insert(message) {
            Ok(handle) => handle,
            Err(back) => {
                if !self.reclaim(timers) {
                    timers.stop(timer);
                    return Err(Error::PoolExhausted("message pool"));
                }
                match self.messages.insert(back) {
                    Ok(handle) => handle,
                    Err(_) => {
                        timers.stop(timer);
                        return Err(Error::PoolExhausted("message pool"));
                    }
                }
            }
        };

        // Ordered insert; becoming the head pulls min_sequence down.
        let messages = &self.messages;
        let Some(entry) = self.seeds.get_mut(seed) else {
            unreachable!("reclaim frees messages, never seeds")
        };
        entry.insert_ordered(handle, option.sequence, |h| {
            messages.get(h).map_or(0, |m| m.sequence)
        });
        let is_last = entry.messages.back() == Some(&handle);

        // 10. Proactive forwarding arms the timer right away; a known
        //     laggard situation starts at the fast-retransmit interval.
        if self.cfg.proactive_forwarding {
            timers.start(timer, TimerBinding::DataMessage(handle));
            if option.more && !is_last {
                timers.signal_inconsistent(timer);
            }
        }

        // 11. Traffic keeps the seed alive.
        entry.lifetime = self.cfg.seed_lifetime;

        // 12. Domain state changed; reset its control-plane schedule.
        self.poke_control_timer(timers, domain);

        log::debug!(
            "[Forwarder::admit] buffered seed={} seq={}",
            seed_id,
            option.sequence
        );
        Ok(Admitted::Fresh(handle))
    }

    /// Free the oldest message of the seed buffering the most, biasing loss
    /// toward the stream that can best absorb it. First seed wins a tie.
    /// Returns whether a slot was released.
    fn reclaim(&mut self, timers: &mut dyn TrickleTimers) -> bool {
        let mut victim: Option<(SeedHandle, usize, DomainHandle, SeedId)> = None;
        for (handle, seed) in self.seeds.iter() {
            let count = seed.messages.len();
            if count > victim.map_or(0, |(_, c, _, _)| c) {
                victim = Some((handle, count, seed.domain, seed.id));
            }
        }
        let Some((victim_seed, _, victim_domain, victim_id)) = victim else {
            return false;
        };

        let messages = &self.messages;
        let evicted = self
            .seeds
            .get_mut(victim_seed)
            .and_then(|s| s.evict_oldest(|h| messages.get(h).map_or(0, |m| m.sequence)));
        let Some(evicted) = evicted else {
            return false;
        };
        let sequence = match self.messages.remove(evicted) {
            Some(entry) => {
                timers.stop(entry.timer);
                entry.sequence
            }
            None => return false,
        };

        // The domain's buffered set changed; let its next control summary
        // go out on the fast schedule.
        if let Some(domain) = self.domains.get_mut(victim_domain) {
            domain.expirations = 0;
        }
        self.stats.reclaims += 1;
        log::debug!(
            "[Forwarder::reclaim] evicted seed={} seq={}",
            victim_id,
            sequence
        );
        true
    }

    /// Reset a domain's control schedule after its state changed: zero the
    /// expiration budget and either start the timer or, if it is already
    /// running, push it back to its minimum interval.
    fn poke_control_timer(&mut self, timers: &mut dyn TrickleTimers, handle: DomainHandle) {
        let Some(domain) = self.domains.get_mut(handle) else {
            return;
        };
        domain.expirations = 0;
        let timer = domain.timer;
        if timers.is_running(timer) {
            timers.signal_inconsistent(timer);
        } else {
            timers.start(timer, TimerBinding::DomainControl(handle));
        }
    }

    /// Re-encode a buffered message's MPL option and hand it to the packet
    /// service, addressed to its domain's data group on its own interface.
    /// Bookkeeping is never rolled back on a failed send; the next Trickle
    /// interval retries naturally.
    fn transmit_data(&mut self, net: &mut dyn PacketService, handle: MessageHandle) {
        let Some(message) = self.messages.get(handle) else {
            return;
        };
        let Some(seed) = self.seeds.get(message.seed) else {
            return;
        };
        let Some(domain) = self.domains.get(seed.domain) else {
            return;
        };
        let is_last = seed.messages.back() == Some(&handle);
        let option = encode_mpl_option(&seed.id, message.sequence, is_last);
        net.send_data(message.iface, domain.data_address, &option, &message.payload);
        self.stats.data_tx += 1;
        log::debug!(
            "[Forwarder::transmit_data] seed={} seq={} dst={}",
            seed.id,
            message.sequence,
            domain.data_address
        );
    }

    /// Convert an admission error into its counter and log line. Inbound
    /// errors are terminal at the point of detection; nothing retries.
    fn note_drop(&mut self, err: &Error) {
        match err {
            Error::MalformedPacket(what) => {
                self.stats.malformed += 1;
                log::debug!("[Forwarder::admit] malformed packet dropped: {}", what);
            }
            Error::AddressDerivationFailed => {
                self.stats.derivation_failures += 1;
                log::warn!("[Forwarder::admit] domain derivation failed, packet dropped");
            }
            Error::TimerCreationFailed => {
                self.stats.timer_failures += 1;
                log::warn!("[Forwarder::admit] no trickle timer available, packet dropped");
            }
            Error::PoolExhausted(which) => {
                self.stats.pool_drops += 1;
                log::warn!("[Forwarder::admit] {} full, packet dropped", which);
            }
            Error::SeedIdUnknown => {
                log::debug!("[Forwarder::admit] unexpected error: {}", err);
            }
        }
    }
}
