// Copyright 2026 Hypermesh Foundation. All rights reserved.
// Quartermaster Resource Balancing Suite

//! Quartermaster equalizes inventories of many resource types across a set
//! of colonies, each holding one bounded-throughput terminal. Every tick the
//! network classifies each (colony, resource) pair into one of five demand
//! tiers and executes a bounded batch of terminal-to-terminal transfers --
//! and, when permitted, market orders -- that drive the network toward
//! per-resource equilibrium.
//!
//! The host owns the colonies and drives the loop:
//!
//! ```text
//! refresh() -> add_colony()* -> init() -> [overrides] -> run() -> summarize()
//! ```

pub mod classify;
pub mod colony;
pub mod market;
pub mod network;
pub mod partners;
pub mod resources;
pub mod stats;
pub mod thresholds;
pub mod types;

pub use colony::{Colony, RoomName, Store, Terminal};
pub use market::{MarketAdapter, NoMarket, SellOptions};
pub use network::TerminalNetwork;
pub use resources::{Resource, ResourceMap, RESOURCE_EXCHANGE_ORDER};
pub use stats::NetworkStats;
pub use thresholds::Thresholds;
pub use types::{ColonyId, NetworkError, TickSummary, Tier};
