// Copyright 2026 Hypermesh Foundation. All rights reserved.
// Quartermaster Resource Balancing Suite - Transfer Ledger and Terminal Stats

use crate::resources::Resource;
use crate::types::Tier;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// ─── EMA windows ────────────────────────────────────────────────────────────

/// Window of the per-terminal cooldown moving average.
pub const AVG_COOLDOWN_WINDOW: f64 = 1_000.0;

/// Window of the binary overload moving average (one creep lifetime).
pub const CREEP_LIFE_TIME: f64 = 1_500.0;

/// Exponential moving average step: `(value + (window - 1) * prev) / window`.
/// Repeated identical inputs converge on the input, so the average is
/// idempotent at the fixed point.
pub fn ema(prev: f64, value: f64, window: f64) -> f64 {
    (value + (window - 1.0) * prev) / window
}

// ─── Persisted layout ───────────────────────────────────────────────────────

/// Cumulative per-terminal signals.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TerminalStats {
    /// Cooldown EMA per colony, window `AVG_COOLDOWN_WINDOW`.
    pub avg_cooldown: BTreeMap<String, f64>,
    /// Overload EMA per colony, window `CREEP_LIFE_TIME`.
    pub overload: BTreeMap<String, f64>,
}

/// Last-recorded tier membership per colony, resources listed in exchange
/// order. This is the UI snapshot, not an input to any decision.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TierSnapshot {
    pub active_providers: BTreeMap<String, Vec<String>>,
    pub passive_providers: BTreeMap<String, Vec<String>>,
    pub equilibrium_nodes: BTreeMap<String, Vec<String>>,
    pub passive_requestors: BTreeMap<String, Vec<String>>,
    pub active_requestors: BTreeMap<String, Vec<String>>,
}

impl TierSnapshot {
    pub fn clear(&mut self) {
        self.active_providers.clear();
        self.passive_providers.clear();
        self.equilibrium_nodes.clear();
        self.passive_requestors.clear();
        self.active_requestors.clear();
    }

    pub fn bucket_mut(&mut self, tier: Tier) -> Option<&mut BTreeMap<String, Vec<String>>> {
        match tier {
            Tier::ActiveProvider => Some(&mut self.active_providers),
            Tier::PassiveProvider => Some(&mut self.passive_providers),
            Tier::Equilibrium => Some(&mut self.equilibrium_nodes),
            Tier::PassiveRequestor => Some(&mut self.passive_requestors),
            Tier::ActiveRequestor => Some(&mut self.active_requestors),
            Tier::Error => None,
        }
    }
}

/// Everything the network persists across ticks, laid out the way the host
/// stats store expects it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NetworkStats {
    /// `transfers[resource][origin][dest]` -> cumulative units sent.
    pub transfers: BTreeMap<String, BTreeMap<String, BTreeMap<String, u64>>>,
    /// `costs[origin][dest]` -> cumulative transaction energy.
    pub costs: BTreeMap<String, BTreeMap<String, u64>>,
    pub terminals: TerminalStats,
    pub states: TierSnapshot,
}

impl NetworkStats {
    /// Record one executed transfer in the ledger.
    pub fn record_transfer(
        &mut self,
        resource: Resource,
        origin: &str,
        dest: &str,
        amount: u32,
        cost: u32,
    ) {
        *self
            .transfers
            .entry(resource.symbol().to_string())
            .or_default()
            .entry(origin.to_string())
            .or_default()
            .entry(dest.to_string())
            .or_default() += amount as u64;
        *self
            .costs
            .entry(origin.to_string())
            .or_default()
            .entry(dest.to_string())
            .or_default() += cost as u64;
    }

    pub fn transferred(&self, resource: Resource, origin: &str, dest: &str) -> u64 {
        self.transfers
            .get(resource.symbol())
            .and_then(|m| m.get(origin))
            .and_then(|m| m.get(dest))
            .copied()
            .unwrap_or(0)
    }

    pub fn cost_paid(&self, origin: &str, dest: &str) -> u64 {
        self.costs
            .get(origin)
            .and_then(|m| m.get(dest))
            .copied()
            .unwrap_or(0)
    }

    /// Fold this tick's cooldown and overload signals into the EMAs.
    pub fn update_terminal_emas(&mut self, colony: &str, cooldown: u32, overloaded: bool) {
        let avg = self
            .terminals
            .avg_cooldown
            .entry(colony.to_string())
            .or_insert(0.0);
        *avg = ema(*avg, cooldown as f64, AVG_COOLDOWN_WINDOW);
        let over = self
            .terminals
            .overload
            .entry(colony.to_string())
            .or_insert(0.0);
        *over = ema(*over, if overloaded { 1.0 } else { 0.0 }, CREEP_LIFE_TIME);
    }

    pub fn avg_cooldown(&self, colony: &str) -> f64 {
        self.terminals
            .avg_cooldown
            .get(colony)
            .copied()
            .unwrap_or(0.0)
    }

    pub fn overload(&self, colony: &str) -> f64 {
        self.terminals.overload.get(colony).copied().unwrap_or(0.0)
    }

    /// Replace the tier snapshot for one colony/tier with the given
    /// resources (already in exchange order).
    pub fn snapshot_state(&mut self, tier: Tier, colony: &str, resources: Vec<Resource>) {
        if resources.is_empty() {
            return;
        }
        if let Some(bucket) = self.states.bucket_mut(tier) {
            bucket.insert(
                colony.to_string(),
                resources.iter().map(|r| r.symbol().to_string()).collect(),
            );
        }
    }
}

// ─── Tests ──────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ema_converges_to_constant_input() {
        let mut v = 0.0;
        for _ in 0..200_000 {
            v = ema(v, 5.0, AVG_COOLDOWN_WINDOW);
        }
        assert!((v - 5.0).abs() < 1e-3, "ema {v} did not converge");
        // fixed point is exactly idempotent
        let fixed = ema(5.0, 5.0, AVG_COOLDOWN_WINDOW);
        assert!((fixed - 5.0).abs() < 1e-12);
    }

    #[test]
    fn ema_stays_in_signal_range() {
        let mut v = 0.0;
        for i in 0..10_000 {
            let signal = if i % 2 == 0 { 1.0 } else { 0.0 };
            v = ema(v, signal, CREEP_LIFE_TIME);
            assert!((0.0..=1.0).contains(&v));
        }
    }

    #[test]
    fn ledger_accumulates() {
        let mut stats = NetworkStats::default();
        stats.record_transfer(Resource::Utrium, "alpha", "beta", 4_000, 750);
        stats.record_transfer(Resource::Utrium, "alpha", "beta", 1_000, 200);
        stats.record_transfer(Resource::Energy, "alpha", "beta", 25_000, 9_000);
        assert_eq!(stats.transferred(Resource::Utrium, "alpha", "beta"), 5_000);
        assert_eq!(stats.transferred(Resource::Energy, "alpha", "beta"), 25_000);
        assert_eq!(stats.transferred(Resource::Energy, "beta", "alpha"), 0);
        assert_eq!(stats.cost_paid("alpha", "beta"), 9_950);
    }

    #[test]
    fn overload_ema_rises_after_overload() {
        let mut stats = NetworkStats::default();
        stats.update_terminal_emas("alpha", 0, true);
        assert!(stats.overload("alpha") > 0.0);
        let before = stats.overload("alpha");
        stats.update_terminal_emas("alpha", 0, false);
        assert!(stats.overload("alpha") < before);
    }

    #[test]
    fn snapshot_skips_empty_and_error() {
        let mut stats = NetworkStats::default();
        stats.snapshot_state(Tier::ActiveProvider, "alpha", vec![]);
        assert!(stats.states.active_providers.is_empty());
        stats.snapshot_state(Tier::Error, "alpha", vec![Resource::Energy]);
        stats.snapshot_state(
            Tier::PassiveRequestor,
            "alpha",
            vec![Resource::Xuh2o, Resource::Energy],
        );
        assert_eq!(
            stats.states.passive_requestors["alpha"],
            vec!["XUH2O".to_string(), "energy".to_string()]
        );
    }

    #[test]
    fn persisted_layout_round_trips() {
        let mut stats = NetworkStats::default();
        stats.record_transfer(Resource::Xuh2o, "alpha", "beta", 3_000, 400);
        stats.update_terminal_emas("alpha", 7, true);
        stats.snapshot_state(Tier::Equilibrium, "beta", vec![Resource::Energy]);
        let json = serde_json::to_string(&stats).unwrap();
        let back: NetworkStats = serde_json::from_str(&json).unwrap();
        assert_eq!(back, stats);
    }
}
