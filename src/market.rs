// Copyright 2026 Hypermesh Foundation. All rights reserved.
// Quartermaster Resource Balancing Suite - Market Adapter Seam

use crate::colony::Colony;
use crate::resources::Resource;

// ─── Credit gates ───────────────────────────────────────────────────────────

/// Minimum credit balance before the network buys anything at all.
pub const CAN_BUY_ABOVE: u64 = 10_000;
/// Energy purchases need a deeper reserve.
pub const CAN_BUY_ENERGY_ABOVE: u64 = 100_000;
/// Boost purchases sit in between.
pub const CAN_BUY_BOOSTS_ABOVE: u64 = 25_000;

/// Whether the credit balance clears the gate for buying `resource`.
pub fn can_buy(resource: Resource, credits: u64) -> bool {
    if resource.is_energy() {
        credits >= CAN_BUY_ENERGY_ABOVE
    } else if resource.is_boost() {
        credits >= CAN_BUY_BOOSTS_ABOVE
    } else {
        credits >= CAN_BUY_ABOVE
    }
}

// ─── Adapter ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Default)]
pub struct SellOptions {
    /// Ask the adapter to prefer filling existing buy orders over listing;
    /// set when the seller is nearly out of space and needs the units gone
    /// this tick.
    pub prefer_direct: bool,
}

/// External buy/sell collaborator. A non-negative return is the number of
/// units the adapter committed to move; any negative value is a failure and
/// the network falls through to its notification path.
pub trait MarketAdapter {
    fn credits(&self) -> u64;

    fn buy(&mut self, colony: &mut Colony, resource: Resource, amount: u32) -> i32;

    fn sell(
        &mut self,
        colony: &mut Colony,
        resource: Resource,
        amount: u32,
        opts: SellOptions,
    ) -> i32;
}

/// Adapter for hosts without market access; every order fails.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoMarket;

impl MarketAdapter for NoMarket {
    fn credits(&self) -> u64 {
        0
    }

    fn buy(&mut self, _colony: &mut Colony, _resource: Resource, _amount: u32) -> i32 {
        -1
    }

    fn sell(
        &mut self,
        _colony: &mut Colony,
        _resource: Resource,
        _amount: u32,
        _opts: SellOptions,
    ) -> i32 {
        -1
    }
}

// ─── Tests ──────────────────────────────────────────────────────────────────
