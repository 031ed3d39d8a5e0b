// Copyright 2026 Hypermesh Foundation. All rights reserved.
// Quartermaster Resource Balancing Suite - Threshold Tables

use crate::resources::Resource;
use serde::{Deserialize, Serialize};

// ─── Constants ──────────────────────────────────────────────────────────────

/// Lab mineral capacity; the default band is derived from it.
pub const LAB_CAP: u32 = 3_000;

/// Default desired stock of any lab-relevant resource.
pub const DEFAULT_TARGET: u32 = 2 * LAB_CAP + 1_000;
/// Above this a colony actively dumps the resource.
pub const DEFAULT_SURPLUS: u32 = 15 * LAB_CAP;
/// Dead band around the target.
pub const DEFAULT_TOLERANCE: u32 = LAB_CAP / 3;

/// Heal compounds are kept at 1.5x the default target.
pub const HEAL_TARGET: u32 = DEFAULT_TARGET + DEFAULT_TARGET / 2;

/// Power and ops: keep a small stock, never buy actively, never force-export.
pub const POWER_LIKE_TARGET: u32 = 2_500;

/// Dynamic energy surplus; the target itself is a per-tick network mean.
pub const ENERGY_SURPLUS: u32 = 500_000;

// ─── Thresholds ─────────────────────────────────────────────────────────────

/// Desired inventory band for one (colony, resource) pair.
///
/// Invariants: `tolerance <= target`, and when `surplus` is present,
/// `surplus >= target + tolerance`. A `None` surplus means unbounded surplus
/// is allowed and the colony never force-exports the resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Thresholds {
    pub target: u32,
    pub surplus: Option<u32>,
    pub tolerance: u32,
}

/// The `export_resource` default: hold nothing, dump everything.
pub const DONT_WANT: Thresholds = Thresholds {
    target: 0,
    surplus: Some(0),
    tolerance: 0,
};

impl Thresholds {
    pub fn new(target: u32, surplus: Option<u32>, tolerance: u32) -> Self {
        Self {
            target,
            surplus,
            tolerance,
        }
    }

    /// Whether the band invariants hold.
    pub fn is_consistent(&self) -> bool {
        self.tolerance <= self.target
            && self
                .surplus
                .map_or(true, |s| s >= self.target + self.tolerance)
    }
}

// ─── ThresholdPolicy ────────────────────────────────────────────────────────

/// Which band rule governs a resource. The classifier and lookup code match
/// on this exhaustively instead of threading raw triples around.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ThresholdPolicy {
    /// Base minerals, intermediates and non-heal boosts.
    Default,
    /// The LO heal line: larger target, same band otherwise.
    Heal,
    /// Power and ops: tolerance equals target, so the band floor is zero and
    /// the colony never becomes an active buyer.
    PowerLike,
    /// Deposits and commodities: don't-care, pass-through only.
    DontCare,
    /// Energy: target derived from the network mean each tick.
    EnergyDynamic,
}

impl ThresholdPolicy {
    pub fn for_resource(resource: Resource) -> Self {
        if resource.is_energy() {
            Self::EnergyDynamic
        } else if resource.is_heal_boost() {
            Self::Heal
        } else if matches!(resource, Resource::Power | Resource::Ops) {
            Self::PowerLike
        } else if resource.is_deposit_or_commodity() {
            Self::DontCare
        } else {
            Self::Default
        }
    }

    /// Static thresholds for this policy. `EnergyDynamic` has no static
    /// value; callers must supply the per-tick derivation (see
    /// `energy_thresholds`).
    pub fn static_thresholds(self) -> Option<Thresholds> {
        match self {
            Self::Default => Some(Thresholds::new(
                DEFAULT_TARGET,
                Some(DEFAULT_SURPLUS),
                DEFAULT_TOLERANCE,
            )),
            Self::Heal => Some(Thresholds::new(
                HEAL_TARGET,
                Some(DEFAULT_SURPLUS),
                DEFAULT_TOLERANCE,
            )),
            Self::PowerLike => Some(Thresholds::new(
                POWER_LIKE_TARGET,
                None,
                POWER_LIKE_TARGET,
            )),
            Self::DontCare => Some(Thresholds::new(0, None, 0)),
            Self::EnergyDynamic => None,
        }
    }
}

/// Static default thresholds for every non-energy resource.
pub fn default_thresholds(resource: Resource) -> Thresholds {
    ThresholdPolicy::for_resource(resource)
        .static_thresholds()
        // EnergyDynamic is the only policy without a static value; give a
        // sane stand-in so a pre-derivation query still answers.
        .unwrap_or(Thresholds::new(100_000, Some(ENERGY_SURPLUS), 20_000))
}

/// Per-tick energy thresholds from the network mean energy holding.
/// `mean_energy` averages over member colonies that have a storage and no
/// energy override.
pub fn energy_thresholds(mean_energy: u32) -> Thresholds {
    Thresholds {
        target: mean_energy,
        surplus: Some(ENERGY_SURPLUS),
        tolerance: mean_energy / 5,
    }
}

// ─── Tests ──────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_band_values() {
        let th = default_thresholds(Resource::Utrium);
        assert_eq!(th.target, 7_000);
        assert_eq!(th.surplus, Some(45_000));
        assert_eq!(th.tolerance, 1_000);
        assert!(th.is_consistent());
    }

    #[test]
    fn heal_boosts_carry_larger_target() {
        let heal = default_thresholds(Resource::Xlho2);
        let plain = default_thresholds(Resource::Xuh2o);
        assert_eq!(heal.target, 10_500);
        assert_eq!(heal.surplus, plain.surplus);
        assert_eq!(heal.tolerance, plain.tolerance);
    }

    #[test]
    fn power_like_never_buys_actively() {
        for r in [Resource::Power, Resource::Ops] {
            let th = default_thresholds(r);
            assert_eq!(th.target, 2_500);
            assert_eq!(th.surplus, None);
            // tolerance == target: the band floor is zero
            assert_eq!(th.target - th.tolerance, 0);
        }
    }

    #[test]
    fn deposits_are_dont_care() {
        let th = default_thresholds(Resource::Biomass);
        assert_eq!(th, Thresholds::new(0, None, 0));
    }

    #[test]
    fn dont_want_forces_export() {
        assert_eq!(DONT_WANT.surplus, Some(0));
        assert!(DONT_WANT.is_consistent());
    }

    #[test]
    fn energy_derivation() {
        // S6: colonies at 100k/200k/300k -> mean 200k, tolerance 40k
        let th = energy_thresholds(200_000);
        assert_eq!(th.target, 200_000);
        assert_eq!(th.surplus, Some(500_000));
        assert_eq!(th.tolerance, 40_000);
        assert!(th.is_consistent());
    }

    #[test]
    fn policy_selection() {
        assert_eq!(
            ThresholdPolicy::for_resource(Resource::Energy),
            ThresholdPolicy::EnergyDynamic
        );
        assert_eq!(
            ThresholdPolicy::for_resource(Resource::Lho2),
            ThresholdPolicy::Heal
        );
        assert_eq!(
            ThresholdPolicy::for_resource(Resource::Ops),
            ThresholdPolicy::PowerLike
        );
        assert_eq!(
            ThresholdPolicy::for_resource(Resource::Wire),
            ThresholdPolicy::DontCare
        );
        assert_eq!(
            ThresholdPolicy::for_resource(Resource::ZynthiumKeanite),
            ThresholdPolicy::Default
        );
    }

    #[test]
    fn inconsistent_band_detected() {
        let th = Thresholds::new(100, None, 500);
        assert!(!th.is_consistent());
        let th = Thresholds::new(1_000, Some(1_200), 500);
        assert!(!th.is_consistent());
    }
}
