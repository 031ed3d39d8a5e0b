// Copyright 2026 Hypermesh Foundation. All rights reserved.
// Quartermaster Resource Balancing Suite - Type Definitions

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

// ─── ColonyId ────────────────────────────────────────────────────────────────

/// Arena index of a colony in the host's slice. Cheap to copy and order;
/// the network never stores colony references, only ids.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
pub struct ColonyId(pub usize);

impl fmt::Display for ColonyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

// ─── Tier ────────────────────────────────────────────────────────────────────

/// Demand state of a (colony, resource) pair, ordered by urgency.
/// `ActiveRequestor` is never produced by classification; only an explicit
/// `request_resource` override sets it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Tier {
    ActiveProvider = 0,
    PassiveProvider = 1,
    Equilibrium = 2,
    PassiveRequestor = 3,
    ActiveRequestor = 4,
    /// Classifier sentinel for inconsistent thresholds. Logged and excluded
    /// from every bucket; it must never reach a handler.
    Error = 5,
}

impl Tier {
    pub fn label(&self) -> &'static str {
        match self {
            Self::ActiveProvider => "Active Providers",
            Self::PassiveProvider => "Passive Providers",
            Self::Equilibrium => "Equilibrium",
            Self::PassiveRequestor => "Passive Requestors",
            Self::ActiveRequestor => "Active Requestors",
            Self::Error => "Error",
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// ─── ReturnCode ──────────────────────────────────────────────────────────────

/// Result of a terminal send, mirroring the host simulator's codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReturnCode {
    Ok = 0,
    ErrNotEnoughResources = -6,
    ErrFull = -8,
    ErrInvalidArgs = -10,
    ErrTired = -11,
}

impl ReturnCode {
    pub fn is_ok(&self) -> bool {
        matches!(self, Self::Ok)
    }
}

// ─── Handler options ─────────────────────────────────────────────────────────

/// Knobs for one `handle_requestors` pass. The defaults are what the urgent
/// pass runs with; the passive pass switches divvying and the market
/// fallback off.
#[derive(Debug, Clone, Copy)]
pub struct RequestOptions {
    /// Fall back to splitting the request across up to three partners.
    pub allow_divvying: bool,
    /// Request up to `target + tolerance` instead of just `target`.
    pub send_target_plus_tolerance: bool,
    /// Fall back to a market buy when no partner can help.
    pub allow_market_buy: bool,
    /// Skip requestors whose terminal already received this tick.
    pub receive_only_once_per_tick: bool,
}

impl Default for RequestOptions {
    fn default() -> Self {
        Self {
            allow_divvying: true,
            send_target_plus_tolerance: false,
            allow_market_buy: true,
            receive_only_once_per_tick: true,
        }
    }
}

/// Knobs for one `handle_providers` pass.
#[derive(Debug, Clone, Copy)]
pub struct ProvideOptions {
    pub allow_push_to_other_rooms: bool,
    pub allow_market_sell: bool,
}

impl Default for ProvideOptions {
    fn default() -> Self {
        Self {
            allow_push_to_other_rooms: true,
            allow_market_sell: true,
        }
    }
}

// ─── TickSummary ─────────────────────────────────────────────────────────────

/// What one `run()` did, for the host's log line.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TickSummary {
    pub tick: u64,
    /// Successful terminal sends this tick.
    pub transfers: u32,
    /// Units moved across all successful sends.
    pub units_sent: u64,
    /// Market buys and sells the adapter accepted.
    pub market_orders: u32,
    /// Terminals that wanted to send but could not.
    pub overloaded_terminals: u32,
    pub notifications: Vec<String>,
}

// ─── Errors ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum NetworkError {
    #[error("colony {0} has no owned terminal")]
    NoTerminal(String),
    #[error("colony {0} is level {1}, below the terminal network minimum")]
    BelowMinLevel(String, u8),
    #[error("colony id {0} is out of range")]
    UnknownColony(ColonyId),
}
