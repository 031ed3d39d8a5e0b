// Copyright 2026 Hypermesh Foundation. All rights reserved.
// Quartermaster Resource Balancing Suite - Demand State Classifier

use crate::colony::MIN_COLONY_SPACE;
use crate::thresholds::Thresholds;
use crate::types::Tier;

/// Classify one (colony, resource) pair into its demand tier.
///
/// The cascade, in order:
/// 1. Above the surplus line -> ActiveProvider.
/// 2. Above the band ceiling while the colony is out of space -> ActiveProvider.
/// 3. Above the band ceiling otherwise -> PassiveProvider.
/// 4. Inside the band (floor clamped at zero) -> Equilibrium.
/// 5. Below the band floor -> PassiveRequestor.
///
/// `ActiveRequestor` is never produced here; only an explicit
/// `request_resource` override assigns it. A band whose tolerance exceeds
/// its target is nonsensical and yields `Tier::Error`, which the caller
/// logs and drops. A surplus line below the band ceiling is tolerated (the
/// dynamic energy band does this on rich networks); the surplus check wins.
pub fn classify(amount: u32, th: &Thresholds, remaining_space: u32) -> Tier {
    if th.tolerance > th.target {
        return Tier::Error;
    }
    let ceiling = th.target.saturating_add(th.tolerance);
    let floor = th.target.saturating_sub(th.tolerance);
    if let Some(surplus) = th.surplus {
        if amount > surplus {
            return Tier::ActiveProvider;
        }
    }
    if amount > ceiling {
        if remaining_space < MIN_COLONY_SPACE {
            return Tier::ActiveProvider;
        }
        return Tier::PassiveProvider;
    }
    if amount >= floor {
        return Tier::Equilibrium;
    }
    Tier::PassiveRequestor
}

// ─── Tests ──────────────────────────────────────────────────────────────────
