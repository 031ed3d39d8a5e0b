// Copyright 2026 Hypermesh Foundation. All rights reserved.
// Quartermaster Resource Balancing Suite - Partner Selection

use crate::colony::{calc_transaction_cost, Colony, RoomName};
use crate::resources::Resource;
use crate::stats::NetworkStats;
use crate::types::ColonyId;

// Sender scoring weights
const SCORE_BASE: f64 = 2.0;
const BIG_COST: f64 = 2_000.0;

/// Score a sender candidate for a request of `amount` units headed to
/// `dest`. Higher is better (scores are negative; zero-cost would be best).
///
/// `-cost * (SCORE_BASE + cost / BIG_COST + avg_cooldown)`: cheap senders
/// dominate, a high cooldown EMA penalizes through the multiplier, and the
/// quadratic cost term makes distance matter disproportionately for large
/// requests.
pub fn sender_score(cost: f64, avg_cooldown: f64) -> f64 {
    -cost * (SCORE_BASE + cost / BIG_COST + avg_cooldown)
}

/// Pick the sender with the best score among `candidates`. Ties keep the
/// earlier candidate, so the caller's (shuffled) order is the tie-break.
pub fn best_sender(
    candidates: &[ColonyId],
    colonies: &[Colony],
    stats: &NetworkStats,
    dest: &RoomName,
    amount: u32,
) -> Option<ColonyId> {
    let mut best: Option<ColonyId> = None;
    let mut best_score = f64::NEG_INFINITY;
    for &id in candidates {
        let colony = &colonies[id.0];
        let cost = calc_transaction_cost(amount, &colony.room, dest) as f64;
        let score = sender_score(cost, stats.avg_cooldown(&colony.name));
        if score > best_score {
            best_score = score;
            best = Some(id);
        }
    }
    best
}

/// Pick the receiver that is cheapest to reach from `origin`.
pub fn best_receiver(
    candidates: &[ColonyId],
    colonies: &[Colony],
    origin: &RoomName,
    amount: u32,
) -> Option<ColonyId> {
    let mut best: Option<ColonyId> = None;
    let mut best_cost = u32::MAX;
    for &id in candidates {
        let colony = &colonies[id.0];
        let cost = calc_transaction_cost(amount, origin, &colony.room);
        if cost < best_cost {
            best_cost = cost;
            best = Some(id);
        }
    }
    best
}

/// Per-send size cap: energy moves in bigger bundles than everything else.
pub fn max_send(resource: Resource) -> u32 {
    if resource.is_energy() {
        25_000
    } else {
        3_000
    }
}

// ─── Tests ──────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::colony::Terminal;

    fn colony_at(name: &str, room: &str) -> Colony {
        let mut c = Colony::new(name, 8, room.parse().unwrap());
        c.terminal = Some(Terminal::new());
        c
    }

    #[test]
    fn closer_sender_wins() {
        let colonies = vec![
            colony_at("far", "W40N0"),
            colony_at("near", "W2N0"),
            colony_at("mid", "W10N0"),
        ];
        let stats = NetworkStats::default();
        let dest: RoomName = "W0N0".parse().unwrap();
        let ids = [ColonyId(0), ColonyId(1), ColonyId(2)];
        let best = best_sender(&ids, &colonies, &stats, &dest, 3_000).unwrap();
        assert_eq!(best, ColonyId(1));
    }

    #[test]
    fn high_cooldown_ema_penalizes_sender() {
        let colonies = vec![colony_at("a", "W5N0"), colony_at("b", "W5N1")];
        let mut stats = NetworkStats::default();
        // equal distance; push a's cooldown EMA way up
        for _ in 0..50 {
            stats.update_terminal_emas("a", 10, false);
            stats.update_terminal_emas("b", 0, false);
        }
        let dest: RoomName = "W0N0".parse().unwrap();
        let best = best_sender(
            &[ColonyId(0), ColonyId(1)],
            &colonies,
            &stats,
            &dest,
            3_000,
        )
        .unwrap();
        assert_eq!(best, ColonyId(1));
    }

    #[test]
    fn best_receiver_minimizes_cost() {
        let colonies = vec![colony_at("far", "W30N0"), colony_at("near", "W3N0")];
        let origin: RoomName = "W0N0".parse().unwrap();
        let best = best_receiver(&[ColonyId(0), ColonyId(1)], &colonies, &origin, 3_000).unwrap();
        assert_eq!(best, ColonyId(1));
    }

    #[test]
    fn empty_candidate_set_yields_none() {
        let colonies: Vec<Colony> = Vec::new();
        let stats = NetworkStats::default();
        let dest: RoomName = "W0N0".parse().unwrap();
        assert_eq!(best_sender(&[], &colonies, &stats, &dest, 100), None);
        assert_eq!(best_receiver(&[], &colonies, &dest, 100), None);
    }

    #[test]
    fn max_send_caps() {
        assert_eq!(max_send(Resource::Energy), 25_000);
        assert_eq!(max_send(Resource::Xuh2o), 3_000);
    }
}
