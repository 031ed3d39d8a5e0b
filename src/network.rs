// Copyright 2026 Hypermesh Foundation. All rights reserved.
// Quartermaster Resource Balancing Suite - Terminal Network Core

use crate::classify::classify;
use crate::colony::{calc_transaction_cost, Colony, MIN_COLONY_SPACE};
use crate::market::{can_buy, MarketAdapter, SellOptions};
use crate::partners::{best_receiver, best_sender, max_send};
use crate::resources::{Resource, ResourceMap, RESOURCE_EXCHANGE_ORDER};
use crate::stats::NetworkStats;
use crate::thresholds::{self, Thresholds, DONT_WANT};
use crate::types::{
    ColonyId, NetworkError, ProvideOptions, RequestOptions, TickSummary, Tier,
};
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, error, warn};

// ─── Constants ──────────────────────────────────────────────────────────────

/// Colonies below this level cannot hold a working terminal.
pub const MIN_TERMINAL_LEVEL: u8 = 6;

/// Unfulfilled request/provide notifications fire at most once per this
/// many ticks.
pub const NOTIFY_INTERVAL: u64 = 5;

/// How many partners a divvied request may draw from.
const DIVVY_PARTNERS: usize = 3;

// ─── Tier buckets ───────────────────────────────────────────────────────────

/// Per-resource colony lists for each demand tier, rebuilt every tick.
#[derive(Debug, Default)]
struct TierBuckets {
    active_providers: ResourceMap<Vec<ColonyId>>,
    passive_providers: ResourceMap<Vec<ColonyId>>,
    equilibrium: ResourceMap<Vec<ColonyId>>,
    passive_requestors: ResourceMap<Vec<ColonyId>>,
    active_requestors: ResourceMap<Vec<ColonyId>>,
}

impl TierBuckets {
    fn bucket_mut(&mut self, tier: Tier) -> Option<&mut ResourceMap<Vec<ColonyId>>> {
        match tier {
            Tier::ActiveProvider => Some(&mut self.active_providers),
            Tier::PassiveProvider => Some(&mut self.passive_providers),
            Tier::Equilibrium => Some(&mut self.equilibrium),
            Tier::PassiveRequestor => Some(&mut self.passive_requestors),
            Tier::ActiveRequestor => Some(&mut self.active_requestors),
            Tier::Error => None,
        }
    }
}

// ─── TerminalNetwork ────────────────────────────────────────────────────────

/// The resource-balancing core. One value per host; per-tick state is
/// rebuilt between `refresh()` and `run()`, persistent state lives in
/// [`NetworkStats`] and is injected/extracted by the host.
pub struct TerminalNetwork {
    tick: u64,
    rng: ChaCha8Rng,
    members: Vec<ColonyId>,

    // per-tick state, discarded in refresh()
    colony_thresholds: BTreeMap<ColonyId, ResourceMap<Option<Thresholds>>>,
    colony_states: BTreeMap<ColonyId, ResourceMap<Option<Tier>>>,
    buckets: TierBuckets,
    assets: ResourceMap<u64>,
    energy_cache: Option<Thresholds>,
    terminal_overload: BTreeSet<ColonyId>,
    notifications: Vec<String>,
    transfers_this_tick: u32,
    units_sent_this_tick: u64,
    market_orders_this_tick: u32,

    // persistent
    stats: NetworkStats,
}

impl TerminalNetwork {
    pub fn new(seed: u64) -> Self {
        Self::with_stats(seed, NetworkStats::default())
    }

    /// Resume with persisted stats from the host's store.
    pub fn with_stats(seed: u64, stats: NetworkStats) -> Self {
        Self {
            tick: 0,
            rng: ChaCha8Rng::seed_from_u64(seed),
            members: Vec::new(),
            colony_thresholds: BTreeMap::new(),
            colony_states: BTreeMap::new(),
            buckets: TierBuckets::default(),
            assets: ResourceMap::new(),
            energy_cache: None,
            terminal_overload: BTreeSet::new(),
            notifications: Vec::new(),
            transfers_this_tick: 0,
            units_sent_this_tick: 0,
            market_orders_this_tick: 0,
            stats,
        }
    }

    pub fn tick(&self) -> u64 {
        self.tick
    }

    pub fn stats(&self) -> &NetworkStats {
        &self.stats
    }

    /// Hand the persisted stats back to the host store.
    pub fn into_stats(self) -> NetworkStats {
        self.stats
    }

    pub fn members(&self) -> &[ColonyId] {
        &self.members
    }

    pub fn notifications(&self) -> &[String] {
        &self.notifications
    }

    // ─── Per-tick lifecycle ─────────────────────────────────────────────

    /// Drop all per-tick state. Safe to call any number of times between
    /// runs; two consecutive calls leave identical state.
    pub fn refresh(&mut self) {
        self.members.clear();
        self.colony_thresholds.clear();
        self.colony_states.clear();
        self.buckets = TierBuckets::default();
        self.assets = ResourceMap::new();
        self.energy_cache = None;
        self.terminal_overload.clear();
        self.notifications.clear();
        self.transfers_this_tick = 0;
        self.units_sent_this_tick = 0;
        self.market_orders_this_tick = 0;
    }

    /// Register a colony for this tick. Membership requires an owned
    /// terminal and a sufficient level.
    pub fn add_colony(&mut self, id: ColonyId, colony: &Colony) -> Result<(), NetworkError> {
        let owned_terminal = colony.terminal.as_ref().map_or(false, |t| t.my);
        if !owned_terminal {
            let err = NetworkError::NoTerminal(colony.name.clone());
            error!(colony = %colony.name, "terminal network registration rejected: {err}");
            return Err(err);
        }
        if colony.level < MIN_TERMINAL_LEVEL {
            let err = NetworkError::BelowMinLevel(colony.name.clone(), colony.level);
            error!(colony = %colony.name, "terminal network registration rejected: {err}");
            return Err(err);
        }
        if !self.members.contains(&id) {
            self.members.push(id);
        }
        Ok(())
    }

    /// Snapshot network-wide assets. Runs after registration, before any
    /// overrides.
    pub fn init(&mut self, colonies: &[Colony]) {
        let mut assets: ResourceMap<u64> = ResourceMap::new();
        for &id in &self.members {
            let Some(colony) = colonies.get(id.0) else {
                warn!(%id, "member id out of range at init");
                continue;
            };
            for r in RESOURCE_EXCHANGE_ORDER {
                assets[r] += colony.assets[r] as u64;
            }
        }
        self.assets = assets;
    }

    /// Network-wide holdings of one resource, as of `init`.
    pub fn network_assets(&self, resource: Resource) -> u64 {
        self.assets[resource]
    }

    // ─── Overrides ──────────────────────────────────────────────────────

    /// Demand `amount` of `resource` at `colony`, overriding classification
    /// with `ActiveRequestor`. Must be issued between `init` and `run`.
    pub fn request_resource(
        &mut self,
        colonies: &[Colony],
        id: ColonyId,
        resource: Resource,
        amount: u32,
        tolerance: u32,
    ) {
        let Some(colony) = colonies.get(id.0) else {
            warn!(%id, "request_resource for unknown colony id");
            return;
        };
        if !self.members.contains(&id) {
            warn!(colony = %colony.name, "request_resource for a colony outside the network");
            return;
        }
        if colony.assets[resource] >= amount {
            error!(
                colony = %colony.name,
                resource = %resource,
                amount,
                held = colony.assets[resource],
                "request dropped: colony already holds the requested amount"
            );
            return;
        }
        let overrides = self.colony_thresholds.entry(id).or_default();
        if overrides[resource].is_some() {
            warn!(
                colony = %colony.name,
                resource = %resource,
                "request overrides a previously set threshold"
            );
        }
        overrides[resource] = Some(Thresholds::new(amount, None, tolerance));
        self.colony_states.entry(id).or_default()[resource] = Some(Tier::ActiveRequestor);
    }

    /// Mark `resource` at `colony` for export by overriding its thresholds
    /// (default: hold nothing). Classification still decides the tier.
    pub fn export_resource(
        &mut self,
        colonies: &[Colony],
        id: ColonyId,
        resource: Resource,
        override_thresholds: Option<Thresholds>,
    ) {
        let Some(colony) = colonies.get(id.0) else {
            warn!(%id, "export_resource for unknown colony id");
            return;
        };
        if !self.members.contains(&id) {
            warn!(colony = %colony.name, "export_resource for a colony outside the network");
            return;
        }
        let overrides = self.colony_thresholds.entry(id).or_default();
        if overrides[resource].is_some() {
            warn!(
                colony = %colony.name,
                resource = %resource,
                "export overrides a previously set threshold"
            );
        }
        overrides[resource] = Some(override_thresholds.unwrap_or(DONT_WANT));
    }

    /// Effective thresholds for a (colony, resource) pair: colony override,
    /// else the per-tick energy derivation, else the static default.
    pub fn thresholds(&self, colonies: &[Colony], id: ColonyId, resource: Resource) -> Thresholds {
        if let Some(th) = self
            .colony_thresholds
            .get(&id)
            .and_then(|m| m[resource])
        {
            return th;
        }
        if resource.is_energy() {
            return self
                .energy_cache
                .unwrap_or_else(|| self.derive_energy_thresholds(colonies));
        }
        thresholds::default_thresholds(resource)
    }

    /// Mean member energy over colonies with a storage and no energy
    /// override; falls back to the static stand-in when nobody qualifies.
    fn derive_energy_thresholds(&self, colonies: &[Colony]) -> Thresholds {
        let mut sum: u64 = 0;
        let mut count: u64 = 0;
        for &id in &self.members {
            let Some(colony) = colonies.get(id.0) else {
                continue;
            };
            if colony.storage.is_none() {
                continue;
            }
            let overridden = self
                .colony_thresholds
                .get(&id)
                .map_or(false, |m| m[Resource::Energy].is_some());
            if overridden {
                continue;
            }
            sum += colony.assets[Resource::Energy] as u64;
            count += 1;
        }
        if count == 0 {
            return thresholds::default_thresholds(Resource::Energy);
        }
        thresholds::energy_thresholds((sum / count) as u32)
    }

    // ─── Run pipeline ───────────────────────────────────────────────────

    /// Execute one tick: classify, match, transfer, record.
    pub fn run(&mut self, colonies: &mut [Colony], market: &mut dyn MarketAdapter) -> TickSummary {
        self.tick += 1;
        if self.energy_cache.is_none() {
            self.energy_cache = Some(self.derive_energy_thresholds(colonies));
        }

        self.assign_colony_states(colonies);
        let buckets = std::mem::take(&mut self.buckets);

        // Urgent requests may pull from anyone holding stock, divvy across
        // partners, and fall through to the market.
        self.handle_requestors(
            colonies,
            market,
            &buckets.active_requestors,
            &[
                &buckets.active_providers,
                &buckets.passive_providers,
                &buckets.equilibrium,
                &buckets.passive_requestors,
            ],
            RequestOptions::default(),
        );

        // Colonies drowning in stock push it toward anyone short.
        self.handle_providers(
            colonies,
            market,
            &buckets.active_providers,
            &[&buckets.active_requestors, &buckets.passive_requestors],
            ProvideOptions::default(),
        );

        // Passive requestors only top up from willing providers; no divvy,
        // no market.
        self.handle_requestors(
            colonies,
            market,
            &buckets.passive_requestors,
            &[&buckets.active_providers, &buckets.passive_providers],
            RequestOptions {
                allow_divvying: false,
                allow_market_buy: false,
                ..RequestOptions::default()
            },
        );

        self.record_stats(colonies);

        TickSummary {
            tick: self.tick,
            transfers: self.transfers_this_tick,
            units_sent: self.units_sent_this_tick,
            market_orders: self.market_orders_this_tick,
            overloaded_terminals: self.terminal_overload.len() as u32,
            notifications: self.notifications.clone(),
        }
    }

    /// Assign each member (colony, resource) pair its demand tier and
    /// bucket it. Buckets are shuffled per resource so late registrants are
    /// not systematically starved.
    fn assign_colony_states(&mut self, colonies: &[Colony]) {
        let members = self.members.clone();
        for id in members {
            let Some(colony) = colonies.get(id.0) else {
                continue;
            };
            let space = colony.remaining_space(false);
            for r in RESOURCE_EXCHANGE_ORDER {
                let preset = self
                    .colony_states
                    .get(&id)
                    .and_then(|m| m[r]);
                let tier = match preset {
                    Some(t) => t,
                    None => {
                        let th = self.thresholds(colonies, id, r);
                        let tier = classify(colony.assets[r], &th, space);
                        if tier == Tier::Error {
                            error!(
                                colony = %colony.name,
                                resource = %r,
                                "classifier produced inconsistent thresholds; pair excluded"
                            );
                            continue;
                        }
                        self.colony_states.entry(id).or_default()[r] = Some(tier);
                        tier
                    }
                };
                if let Some(bucket) = self.buckets.bucket_mut(tier) {
                    bucket[r].push(id);
                }
            }
        }
        for tier in [
            Tier::ActiveProvider,
            Tier::PassiveProvider,
            Tier::Equilibrium,
            Tier::PassiveRequestor,
            Tier::ActiveRequestor,
        ] {
            // borrow dance: bucket_mut borrows self.buckets, shuffle needs rng
            let rng = &mut self.rng;
            if let Some(map) = self.buckets.bucket_mut(tier) {
                for r in RESOURCE_EXCHANGE_ORDER {
                    map[r].shuffle(rng);
                }
            }
        }
    }

    // ─── Request handling ───────────────────────────────────────────────

    fn handle_requestors(
        &mut self,
        colonies: &mut [Colony],
        market: &mut dyn MarketAdapter,
        requestors: &ResourceMap<Vec<ColonyId>>,
        partner_sets: &[&ResourceMap<Vec<ColonyId>>],
        opts: RequestOptions,
    ) {
        for r in RESOURCE_EXCHANGE_ORDER {
            let queue = requestors[r].clone();
            for id in queue {
                self.handle_one_request(colonies, market, id, r, partner_sets, opts);
            }
        }
    }

    fn handle_one_request(
        &mut self,
        colonies: &mut [Colony],
        market: &mut dyn MarketAdapter,
        id: ColonyId,
        resource: Resource,
        partner_sets: &[&ResourceMap<Vec<ColonyId>>],
        opts: RequestOptions,
    ) {
        let (th, need) = {
            let view: &[Colony] = colonies;
            let Some(colony) = view.get(id.0) else {
                return;
            };
            let Some(terminal) = colony.terminal.as_ref() else {
                debug!(colony = %colony.name, "requestor without terminal skipped");
                return;
            };
            if opts.receive_only_once_per_tick && terminal.has_received {
                return;
            }
            let th = self.thresholds(view, id, resource);
            let wanted = if opts.send_target_plus_tolerance {
                th.target.saturating_add(th.tolerance)
            } else {
                th.target
            };
            (th, wanted.saturating_sub(colony.assets[resource]))
        };
        if need == 0 {
            return;
        }

        // Tiered partner search: strict candidates keep their own target
        // after the send; the relaxed pass lets them dip below it by the
        // *requestor's* tolerance.
        for set in partner_sets {
            let decision = {
                let view: &[Colony] = colonies;
                let mut strict = Vec::new();
                let mut relaxed = Vec::new();
                for &p in set[resource].iter() {
                    if p == id || view[p.0].terminal.is_none() {
                        continue;
                    }
                    let pth = self.thresholds(view, p, resource);
                    let assets = view[p.0].assets[resource] as u64;
                    let floor = pth.target as u64 + need as u64;
                    if assets >= floor {
                        strict.push(p);
                    } else if assets + th.tolerance as u64 >= floor {
                        relaxed.push(p);
                    }
                }
                let candidates = if strict.is_empty() { relaxed } else { strict };
                let dest_room = view[id.0].room;
                best_sender(&candidates, view, &self.stats, &dest_room, need).map(|sender| {
                    let terminal = view[sender.0].terminal.as_ref();
                    let store_amt = terminal.map_or(0, |t| t.store.amount(resource));
                    let ready = terminal.map_or(false, |t| t.is_ready());
                    (sender, ready, need.min(store_amt).min(max_send(resource)))
                })
            };
            let Some((sender, ready, send_amt)) = decision else {
                continue;
            };
            if ready {
                // execute_transfer sorts out the failure modes: a zero or
                // short send warns, only tired/empty flags overload
                self.execute_transfer(colonies, sender, id, resource, send_amt, "request");
            } else {
                self.terminal_overload.insert(sender);
            }
            // Picking a sender settles the request for this tick, whether
            // or not the send went through.
            return;
        }

        if opts.allow_divvying && self.divvy(colonies, id, resource, need, partner_sets) {
            return;
        }

        if opts.allow_market_buy && can_buy(resource, market.credits()) {
            let bought = market.buy(&mut colonies[id.0], resource, need);
            if bought >= 0 {
                self.market_orders_this_tick += 1;
                return;
            }
        }

        if self.tick % NOTIFY_INTERVAL == 0 {
            let name = colonies[id.0].name.clone();
            self.notify(format!(
                "{name} could not obtain {need} {resource} from the network"
            ));
        }
    }

    /// Split a request across up to [`DIVVY_PARTNERS`] partners holding more
    /// than their target. A single successful partial send counts as
    /// success, even when most of the need stays unmet.
    fn divvy(
        &mut self,
        colonies: &mut [Colony],
        id: ColonyId,
        resource: Resource,
        need: u32,
        partner_sets: &[&ResourceMap<Vec<ColonyId>>],
    ) -> bool {
        let mut donors: Vec<(ColonyId, u32)> = {
            let view: &[Colony] = colonies;
            let mut seen = BTreeSet::new();
            let mut donors = Vec::new();
            for set in partner_sets {
                for &p in set[resource].iter() {
                    if p == id || !seen.insert(p) || view[p.0].terminal.is_none() {
                        continue;
                    }
                    let pth = self.thresholds(view, p, resource);
                    let excess = view[p.0].assets[resource].saturating_sub(pth.target);
                    if excess > 0 {
                        donors.push((p, excess));
                    }
                }
            }
            donors
        };
        donors.sort_by(|a, b| b.1.cmp(&a.1));
        donors.truncate(DIVVY_PARTNERS);

        let mut remaining = need;
        let mut any_sent = false;
        for (donor, excess) in donors {
            if remaining == 0 {
                break;
            }
            let draw = excess.min(remaining).min(max_send(resource));
            if draw == 0 {
                continue;
            }
            let send_amt = {
                let terminal = match colonies[donor.0].terminal.as_ref() {
                    Some(t) => t,
                    None => continue,
                };
                if !terminal.is_ready() {
                    self.terminal_overload.insert(donor);
                    continue;
                }
                draw.min(terminal.store.amount(resource))
            };
            if self.execute_transfer(colonies, donor, id, resource, send_amt, "divvy") {
                any_sent = true;
                remaining = remaining.saturating_sub(send_amt);
            }
        }
        any_sent
    }

    // ─── Provide handling ───────────────────────────────────────────────

    fn handle_providers(
        &mut self,
        colonies: &mut [Colony],
        market: &mut dyn MarketAdapter,
        providers: &ResourceMap<Vec<ColonyId>>,
        partner_sets: &[&ResourceMap<Vec<ColonyId>>],
        opts: ProvideOptions,
    ) {
        for r in RESOURCE_EXCHANGE_ORDER {
            let queue = providers[r].clone();
            for id in queue {
                self.handle_one_provide(colonies, market, id, r, partner_sets, opts);
            }
        }
    }

    fn handle_one_provide(
        &mut self,
        colonies: &mut [Colony],
        market: &mut dyn MarketAdapter,
        id: ColonyId,
        resource: Resource,
        partner_sets: &[&ResourceMap<Vec<ColonyId>>],
        opts: ProvideOptions,
    ) {
        let excess = {
            let view: &[Colony] = colonies;
            let Some(colony) = view.get(id.0) else {
                return;
            };
            let Some(terminal) = colony.terminal.as_ref() else {
                return;
            };
            if !terminal.is_ready() {
                return;
            }
            let th = self.thresholds(view, id, resource);
            colony.assets[resource].saturating_sub(th.target)
        };
        if excess == 0 {
            return;
        }

        if opts.allow_push_to_other_rooms {
            for set in partner_sets {
                let decision = {
                    let view: &[Colony] = colonies;
                    // Preferred receivers stay at or under target after
                    // receipt; relaxed allows the band ceiling; loose takes
                    // anyone with space that would not become an active
                    // provider.
                    let mut preferred = Vec::new();
                    let mut relaxed = Vec::new();
                    let mut loose = Vec::new();
                    for &p in set[resource].iter() {
                        if p == id || view[p.0].terminal.is_none() {
                            continue;
                        }
                        let has_space = view[p.0].remaining_space(false) as u64
                            >= excess as u64 + MIN_COLONY_SPACE as u64;
                        if !has_space {
                            continue;
                        }
                        let pth = self.thresholds(view, p, resource);
                        let after = view[p.0].assets[resource] as u64 + excess as u64;
                        if after <= pth.target as u64 {
                            preferred.push(p);
                        } else if after <= pth.target as u64 + pth.tolerance as u64 {
                            relaxed.push(p);
                        } else {
                            let stays_put = match pth.surplus {
                                Some(surplus) => after < surplus as u64,
                                None => after <= pth.target as u64 + pth.tolerance as u64,
                            };
                            if stays_put {
                                loose.push(p);
                            }
                        }
                    }
                    let candidates = if !preferred.is_empty() {
                        preferred
                    } else if !relaxed.is_empty() {
                        relaxed
                    } else {
                        loose
                    };
                    let origin_room = view[id.0].room;
                    best_receiver(&candidates, view, &origin_room, excess).map(|receiver| {
                        // send bound is recomputed from the per-call excess,
                        // not a running remainder
                        let store_amt = view[id.0]
                            .terminal
                            .as_ref()
                            .map_or(0, |t| t.store.amount(resource));
                        (receiver, excess.min(store_amt).min(max_send(resource)))
                    })
                };
                let Some((receiver, send_amt)) = decision else {
                    continue;
                };
                // readiness was checked on entry; execute_transfer warns on
                // a zero send and flags overload only for tired/empty
                self.execute_transfer(colonies, id, receiver, resource, send_amt, "provide");
                return;
            }
        }

        if opts.allow_market_sell {
            let prefer_direct = (resource.is_energy() || resource.is_base_mineral())
                && colonies[id.0].remaining_space(true) < MIN_COLONY_SPACE;
            let sold = market.sell(
                &mut colonies[id.0],
                resource,
                excess,
                SellOptions { prefer_direct },
            );
            if sold >= 0 {
                self.market_orders_this_tick += 1;
                return;
            }
        }

        if self.tick % NOTIFY_INTERVAL == 0 {
            let name = colonies[id.0].name.clone();
            self.notify(format!(
                "{name} could not offload {excess} {resource} to the network"
            ));
        }
    }

    // ─── Transfer execution ─────────────────────────────────────────────

    /// Issue one terminal send and do the bookkeeping. Returns true when
    /// the send went through.
    fn execute_transfer(
        &mut self,
        colonies: &mut [Colony],
        from: ColonyId,
        to: ColonyId,
        resource: Resource,
        amount: u32,
        description: &str,
    ) -> bool {
        let (from_name, from_room) = {
            let c = &colonies[from.0];
            (c.name.clone(), c.room)
        };
        let (to_name, to_room) = {
            let c = &colonies[to.0];
            (c.name.clone(), c.room)
        };
        let cost = calc_transaction_cost(amount, &from_room, &to_room);

        let Some(terminal) = colonies[from.0].terminal.as_mut() else {
            warn!(colony = %from_name, "transfer from colony without terminal");
            return false;
        };
        let code = terminal.send(resource, amount, cost);
        match code {
            crate::types::ReturnCode::Ok => {
                if let Some(receiver) = colonies[to.0].terminal.as_mut() {
                    receiver.store.add(resource, amount);
                    receiver.has_received = true;
                }
                self.stats
                    .record_transfer(resource, &from_name, &to_name, amount, cost);
                self.transfers_this_tick += 1;
                self.units_sent_this_tick += amount as u64;
                self.notify(format!(
                    "{from_name} → {amount} {resource} → {to_name} ({description})"
                ));
                true
            }
            crate::types::ReturnCode::ErrTired
            | crate::types::ReturnCode::ErrNotEnoughResources => {
                self.terminal_overload.insert(from);
                false
            }
            other => {
                warn!(
                    from = %from_name,
                    to = %to_name,
                    resource = %resource,
                    amount,
                    ?other,
                    "terminal send failed"
                );
                false
            }
        }
    }

    fn notify(&mut self, message: String) {
        self.notifications.push(format!("• {message}"));
    }

    // ─── Stats & summary ────────────────────────────────────────────────

    fn record_stats(&mut self, colonies: &[Colony]) {
        for &id in &self.members {
            let Some(colony) = colonies.get(id.0) else {
                continue;
            };
            let cooldown = colony.terminal.as_ref().map_or(0, |t| t.cooldown);
            let overloaded = self.terminal_overload.contains(&id);
            self.stats
                .update_terminal_emas(&colony.name, cooldown, overloaded);
        }

        self.stats.states.clear();
        for (&id, states) in &self.colony_states {
            let Some(colony) = colonies.get(id.0) else {
                continue;
            };
            for tier in [
                Tier::ActiveProvider,
                Tier::PassiveProvider,
                Tier::Equilibrium,
                Tier::PassiveRequestor,
                Tier::ActiveRequestor,
            ] {
                let resources: Vec<Resource> = RESOURCE_EXCHANGE_ORDER
                    .iter()
                    .copied()
                    .filter(|&r| states[r] == Some(tier))
                    .collect();
                self.stats.snapshot_state(tier, &colony.name, resources);
            }
        }
    }

    /// Console dump of the tier snapshot plus this tick's notifications.
    pub fn summarize(&self) -> String {
        let mut out = format!("Terminal network, tick {}\n", self.tick);
        let sections = [
            ("Active Providers", &self.stats.states.active_providers),
            ("Passive Providers", &self.stats.states.passive_providers),
            ("Equilibrium", &self.stats.states.equilibrium_nodes),
            ("Passive Requestors", &self.stats.states.passive_requestors),
            ("Active Requestors", &self.stats.states.active_requestors),
        ];
        for (heading, bucket) in sections {
            if bucket.is_empty() {
                continue;
            }
            out.push_str(&format!("== {heading} ==\n"));
            for (colony, resources) in bucket {
                out.push_str(&format!("  {colony}: {}\n", resources.join(", ")));
            }
        }
        for note in &self.notifications {
            out.push_str(note);
            out.push('\n');
        }
        out
    }

    /// Tier assigned to a pair this tick, if any.
    pub fn state_of(&self, id: ColonyId, resource: Resource) -> Option<Tier> {
        self.colony_states.get(&id).and_then(|m| m[resource])
    }

    /// Whether a terminal tried and failed to send this tick.
    pub fn is_overloaded(&self, id: ColonyId) -> bool {
        self.terminal_overload.contains(&id)
    }
}

// ─── Tests ──────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::colony::{Store, Terminal, STORAGE_CAP};
    use crate::market::NoMarket;

    fn member(name: &str, room: &str, energy: u32) -> Colony {
        let mut c = Colony::new(name, 8, room.parse().unwrap());
        let mut t = Terminal::new();
        t.store.add(Resource::Energy, 50_000);
        c.terminal = Some(t);
        let mut s = Store::new(STORAGE_CAP);
        s.add(Resource::Energy, energy.saturating_sub(50_000));
        c.storage = Some(s);
        c.recompute_assets();
        c
    }

    fn register(net: &mut TerminalNetwork, colonies: &[Colony]) {
        for (i, c) in colonies.iter().enumerate() {
            net.add_colony(ColonyId(i), c).unwrap();
        }
        net.init(colonies);
    }

    #[test]
    fn registration_requires_terminal_and_level() {
        let mut net = TerminalNetwork::new(1);
        let room = "W1N1".parse().unwrap();
        let bare = Colony::new("bare", 8, room);
        assert_eq!(
            net.add_colony(ColonyId(0), &bare),
            Err(NetworkError::NoTerminal("bare".into()))
        );

        let mut low = Colony::new("low", 5, room);
        low.terminal = Some(Terminal::new());
        assert_eq!(
            net.add_colony(ColonyId(1), &low),
            Err(NetworkError::BelowMinLevel("low".into(), 5))
        );

        let mut foreign = Colony::new("foreign", 8, room);
        let mut t = Terminal::new();
        t.my = false;
        foreign.terminal = Some(t);
        assert!(net.add_colony(ColonyId(2), &foreign).is_err());
        assert!(net.members().is_empty());
    }

    #[test]
    fn refresh_is_idempotent() {
        let colonies = vec![member("a", "W1N1", 100_000), member("b", "W2N1", 100_000)];
        let mut net = TerminalNetwork::new(7);
        register(&mut net, &colonies);
        net.request_resource(&colonies, ColonyId(0), Resource::Xuh2o, 1_000, 0);

        net.refresh();
        let snap_members = net.members().to_vec();
        let snap_states = net.state_of(ColonyId(0), Resource::Xuh2o);
        net.refresh();
        assert_eq!(net.members(), snap_members.as_slice());
        assert_eq!(net.state_of(ColonyId(0), Resource::Xuh2o), snap_states);
        assert_eq!(net.network_assets(Resource::Energy), 0);
        assert!(net.notifications().is_empty());
    }

    #[test]
    fn request_override_sets_active_requestor() {
        let colonies = vec![member("a", "W1N1", 100_000)];
        let mut net = TerminalNetwork::new(7);
        register(&mut net, &colonies);
        net.request_resource(&colonies, ColonyId(0), Resource::Xuh2o, 2_000, 0);
        assert_eq!(
            net.state_of(ColonyId(0), Resource::Xuh2o),
            Some(Tier::ActiveRequestor)
        );
        let th = net.thresholds(&colonies, ColonyId(0), Resource::Xuh2o);
        assert_eq!(th, Thresholds::new(2_000, None, 0));
    }

    #[test]
    fn request_for_held_amount_is_dropped() {
        let mut colonies = vec![member("a", "W1N1", 100_000)];
        colonies[0]
            .terminal
            .as_mut()
            .unwrap()
            .store
            .add(Resource::Xuh2o, 5_000);
        colonies[0].recompute_assets();
        let mut net = TerminalNetwork::new(7);
        register(&mut net, &colonies);
        net.request_resource(&colonies, ColonyId(0), Resource::Xuh2o, 2_000, 0);
        assert_eq!(net.state_of(ColonyId(0), Resource::Xuh2o), None);
    }

    #[test]
    fn export_resource_defaults_to_dont_want() {
        let colonies = vec![member("a", "W1N1", 100_000)];
        let mut net = TerminalNetwork::new(7);
        register(&mut net, &colonies);
        net.export_resource(&colonies, ColonyId(0), Resource::Utrium, None);
        assert_eq!(
            net.thresholds(&colonies, ColonyId(0), Resource::Utrium),
            DONT_WANT
        );
    }

    #[test]
    fn energy_thresholds_follow_network_mean() {
        let colonies = vec![
            member("a", "W1N1", 100_000),
            member("b", "W2N1", 200_000),
            member("c", "W3N1", 300_000),
        ];
        let mut net = TerminalNetwork::new(7);
        register(&mut net, &colonies);
        let th = net.thresholds(&colonies, ColonyId(0), Resource::Energy);
        assert_eq!(th.target, 200_000);
        assert_eq!(th.surplus, Some(500_000));
        assert_eq!(th.tolerance, 40_000);
    }

    #[test]
    fn one_send_per_terminal_per_tick() {
        // Donor well above surplus on two resources; both requested by two
        // different colonies. Only one send can leave the donor terminal.
        let mut colonies = vec![
            member("donor", "W1N1", 200_000),
            member("a", "W2N1", 200_000),
            member("b", "W3N1", 200_000),
        ];
        {
            let t = colonies[0].terminal.as_mut().unwrap();
            t.store.add(Resource::Utrium, 60_000);
            t.store.add(Resource::Keanium, 60_000);
        }
        colonies[0].recompute_assets();
        let mut net = TerminalNetwork::new(7);
        register(&mut net, &colonies);
        net.request_resource(&colonies, ColonyId(1), Resource::Utrium, 3_000, 0);
        net.request_resource(&colonies, ColonyId(2), Resource::Keanium, 3_000, 0);
        let summary = net.run(&mut colonies, &mut NoMarket);
        assert_eq!(summary.transfers, 1);
        assert!(net.is_overloaded(ColonyId(0)));
    }
}
