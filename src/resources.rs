// Copyright 2026 Hypermesh Foundation. All rights reserved.
// Quartermaster Resource Balancing Suite - Resource Definitions

use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Number of distinct tradeable resources.
pub const RESOURCE_COUNT: usize = 52;

// ─── Resource ────────────────────────────────────────────────────────────────

/// Every resource a terminal can hold or send.
///
/// Declaration order IS the exchange order: tier-3 boosts first, then ops,
/// tier-2 boosts, tier-1 boosts, intermediates, base minerals, power, energy,
/// and finally deposit-derived resources and commodities. The order is stable
/// and doubles as the universal tie-break.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(usize)]
pub enum Resource {
    // Tier-3 boosts
    Xuh2o,
    Xuho2,
    Xkh2o,
    Xkho2,
    Xlh2o,
    Xlho2,
    Xzh2o,
    Xzho2,
    Xgh2o,
    Xgho2,
    // Ops
    Ops,
    // Tier-2 boosts
    Uh2o,
    Uho2,
    Kh2o,
    Kho2,
    Lh2o,
    Lho2,
    Zh2o,
    Zho2,
    Gh2o,
    Gho2,
    // Tier-1 boosts
    Uh,
    Uo,
    Kh,
    Ko,
    Lh,
    Lo,
    Zh,
    Zo,
    Gh,
    Go,
    // Intermediates
    Hydroxide,
    ZynthiumKeanite,
    UtriumLemergite,
    // Base minerals
    Hydrogen,
    Oxygen,
    Utrium,
    Lemergium,
    Keanium,
    Zynthium,
    Catalyst,
    Ghodium,
    // Power
    Power,
    // Energy
    Energy,
    // Deposit-derived
    Mist,
    Biomass,
    Metal,
    Silicon,
    // Commodities
    Wire,
    Cell,
    Alloy,
    Condensate,
}

/// All resources in exchange order. `assign_colony_states` and both handler
/// pipelines walk this slice front to back.
pub const RESOURCE_EXCHANGE_ORDER: [Resource; RESOURCE_COUNT] = [
    Resource::Xuh2o,
    Resource::Xuho2,
    Resource::Xkh2o,
    Resource::Xkho2,
    Resource::Xlh2o,
    Resource::Xlho2,
    Resource::Xzh2o,
    Resource::Xzho2,
    Resource::Xgh2o,
    Resource::Xgho2,
    Resource::Ops,
    Resource::Uh2o,
    Resource::Uho2,
    Resource::Kh2o,
    Resource::Kho2,
    Resource::Lh2o,
    Resource::Lho2,
    Resource::Zh2o,
    Resource::Zho2,
    Resource::Gh2o,
    Resource::Gho2,
    Resource::Uh,
    Resource::Uo,
    Resource::Kh,
    Resource::Ko,
    Resource::Lh,
    Resource::Lo,
    Resource::Zh,
    Resource::Zo,
    Resource::Gh,
    Resource::Go,
    Resource::Hydroxide,
    Resource::ZynthiumKeanite,
    Resource::UtriumLemergite,
    Resource::Hydrogen,
    Resource::Oxygen,
    Resource::Utrium,
    Resource::Lemergium,
    Resource::Keanium,
    Resource::Zynthium,
    Resource::Catalyst,
    Resource::Ghodium,
    Resource::Power,
    Resource::Energy,
    Resource::Mist,
    Resource::Biomass,
    Resource::Metal,
    Resource::Silicon,
    Resource::Wire,
    Resource::Cell,
    Resource::Alloy,
    Resource::Condensate,
];

impl Resource {
    /// Position in the exchange order.
    pub const fn index(self) -> usize {
        self as usize
    }

    pub fn from_index(idx: usize) -> Option<Self> {
        RESOURCE_EXCHANGE_ORDER.get(idx).copied()
    }

    /// Wire/market symbol for this resource.
    pub fn symbol(self) -> &'static str {
        match self {
            Self::Xuh2o => "XUH2O",
            Self::Xuho2 => "XUHO2",
            Self::Xkh2o => "XKH2O",
            Self::Xkho2 => "XKHO2",
            Self::Xlh2o => "XLH2O",
            Self::Xlho2 => "XLHO2",
            Self::Xzh2o => "XZH2O",
            Self::Xzho2 => "XZHO2",
            Self::Xgh2o => "XGH2O",
            Self::Xgho2 => "XGHO2",
            Self::Ops => "ops",
            Self::Uh2o => "UH2O",
            Self::Uho2 => "UHO2",
            Self::Kh2o => "KH2O",
            Self::Kho2 => "KHO2",
            Self::Lh2o => "LH2O",
            Self::Lho2 => "LHO2",
            Self::Zh2o => "ZH2O",
            Self::Zho2 => "ZHO2",
            Self::Gh2o => "GH2O",
            Self::Gho2 => "GHO2",
            Self::Uh => "UH",
            Self::Uo => "UO",
            Self::Kh => "KH",
            Self::Ko => "KO",
            Self::Lh => "LH",
            Self::Lo => "LO",
            Self::Zh => "ZH",
            Self::Zo => "ZO",
            Self::Gh => "GH",
            Self::Go => "GO",
            Self::Hydroxide => "OH",
            Self::ZynthiumKeanite => "ZK",
            Self::UtriumLemergite => "UL",
            Self::Hydrogen => "H",
            Self::Oxygen => "O",
            Self::Utrium => "U",
            Self::Lemergium => "L",
            Self::Keanium => "K",
            Self::Zynthium => "Z",
            Self::Catalyst => "X",
            Self::Ghodium => "G",
            Self::Power => "power",
            Self::Energy => "energy",
            Self::Mist => "mist",
            Self::Biomass => "biomass",
            Self::Metal => "metal",
            Self::Silicon => "silicon",
            Self::Wire => "wire",
            Self::Cell => "cell",
            Self::Alloy => "alloy",
            Self::Condensate => "condensate",
        }
    }

    pub fn from_symbol(sym: &str) -> Option<Self> {
        RESOURCE_EXCHANGE_ORDER
            .iter()
            .copied()
            .find(|r| r.symbol() == sym)
    }

    pub fn is_energy(self) -> bool {
        self == Self::Energy
    }

    /// Boost tier (1-3) for lab compounds used to boost creep parts.
    pub fn boost_tier(self) -> Option<u8> {
        match self {
            Self::Xuh2o
            | Self::Xuho2
            | Self::Xkh2o
            | Self::Xkho2
            | Self::Xlh2o
            | Self::Xlho2
            | Self::Xzh2o
            | Self::Xzho2
            | Self::Xgh2o
            | Self::Xgho2 => Some(3),
            Self::Uh2o
            | Self::Uho2
            | Self::Kh2o
            | Self::Kho2
            | Self::Lh2o
            | Self::Lho2
            | Self::Zh2o
            | Self::Zho2
            | Self::Gh2o
            | Self::Gho2 => Some(2),
            Self::Uh
            | Self::Uo
            | Self::Kh
            | Self::Ko
            | Self::Lh
            | Self::Lo
            | Self::Zh
            | Self::Zo
            | Self::Gh
            | Self::Go => Some(1),
            _ => None,
        }
    }

    pub fn is_boost(self) -> bool {
        self.boost_tier().is_some()
    }

    /// The LO line (tier 1-3 heal compounds).
    pub fn is_heal_boost(self) -> bool {
        matches!(self, Self::Lo | Self::Lho2 | Self::Xlho2)
    }

    pub fn is_base_mineral(self) -> bool {
        matches!(
            self,
            Self::Hydrogen
                | Self::Oxygen
                | Self::Utrium
                | Self::Lemergium
                | Self::Keanium
                | Self::Zynthium
                | Self::Catalyst
                | Self::Ghodium
        )
    }

    pub fn is_intermediate(self) -> bool {
        matches!(
            self,
            Self::Hydroxide | Self::ZynthiumKeanite | Self::UtriumLemergite
        )
    }

    /// Deposit harvests and factory commodities; the network never hoards
    /// these, it only passes them along.
    pub fn is_deposit_or_commodity(self) -> bool {
        matches!(
            self,
            Self::Mist
                | Self::Biomass
                | Self::Metal
                | Self::Silicon
                | Self::Wire
                | Self::Cell
                | Self::Alloy
                | Self::Condensate
        )
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

impl Serialize for Resource {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.symbol())
    }
}

impl<'de> Deserialize<'de> for Resource {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct SymbolVisitor;
        impl<'de> Visitor<'de> for SymbolVisitor {
            type Value = Resource;
            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a resource symbol")
            }
            fn visit_str<E: de::Error>(self, v: &str) -> Result<Resource, E> {
                Resource::from_symbol(v)
                    .ok_or_else(|| E::custom(format!("unknown resource symbol: {v}")))
            }
        }
        deserializer.deserialize_str(SymbolVisitor)
    }
}

// ─── ResourceMap ─────────────────────────────────────────────────────────────

/// Fixed-size container keyed by `Resource`. Replaces the string-keyed maps
/// a dynamic host would use; lookups are a single array index.
#[derive(Debug, Clone, PartialEq)]
pub struct ResourceMap<T>([T; RESOURCE_COUNT]);

impl<T: Default> Default for ResourceMap<T> {
    fn default() -> Self {
        Self(std::array::from_fn(|_| T::default()))
    }
}

impl<T> ResourceMap<T> {
    pub fn get(&self, r: Resource) -> &T {
        &self.0[r.index()]
    }

    pub fn get_mut(&mut self, r: Resource) -> &mut T {
        &mut self.0[r.index()]
    }

    pub fn set(&mut self, r: Resource, value: T) {
        self.0[r.index()] = value;
    }

    /// Iterate entries in exchange order.
    pub fn iter(&self) -> impl Iterator<Item = (Resource, &T)> {
        RESOURCE_EXCHANGE_ORDER
            .iter()
            .copied()
            .map(move |r| (r, &self.0[r.index()]))
    }
}

impl<T: Default> ResourceMap<T> {
    pub fn new() -> Self {
        Self::default()
    }
}

impl<T> std::ops::Index<Resource> for ResourceMap<T> {
    type Output = T;
    fn index(&self, r: Resource) -> &T {
        self.get(r)
    }
}

impl<T> std::ops::IndexMut<Resource> for ResourceMap<T> {
    fn index_mut(&mut self, r: Resource) -> &mut T {
        self.get_mut(r)
    }
}

impl<T> Serialize for ResourceMap<T>
where
    T: Serialize + Default + PartialEq,
{
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        use serde::ser::SerializeMap;
        let zero = T::default();
        let mut map = serializer.serialize_map(None)?;
        for (r, v) in self.iter() {
            if *v != zero {
                map.serialize_entry(r.symbol(), v)?;
            }
        }
        map.end()
    }
}

impl<'de, T> Deserialize<'de> for ResourceMap<T>
where
    T: Deserialize<'de> + Default,
{
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct MapVisitor<T>(std::marker::PhantomData<T>);
        impl<'de, T> Visitor<'de> for MapVisitor<T>
        where
            T: Deserialize<'de> + Default,
        {
            type Value = ResourceMap<T>;
            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a map of resource symbols to values")
            }
            fn visit_map<A: de::MapAccess<'de>>(
                self,
                mut access: A,
            ) -> Result<Self::Value, A::Error> {
                let mut out = ResourceMap::<T>::default();
                while let Some((key, value)) = access.next_entry::<Resource, T>()? {
                    out.set(key, value);
                }
                Ok(out)
            }
        }
        deserializer.deserialize_map(MapVisitor(std::marker::PhantomData))
    }
}

// ─── Tests ──────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exchange_order_is_complete_and_unique() {
        assert_eq!(RESOURCE_EXCHANGE_ORDER.len(), RESOURCE_COUNT);
        for (i, r) in RESOURCE_EXCHANGE_ORDER.iter().enumerate() {
            assert_eq!(r.index(), i, "{r} out of place in exchange order");
        }
    }

    #[test]
    fn order_priorities() {
        // T3 boosts before ops, ops before T2, intermediates before bases,
        // power before energy, energy before deposits.
        assert!(Resource::Xuh2o.index() < Resource::Ops.index());
        assert!(Resource::Ops.index() < Resource::Uh2o.index());
        assert!(Resource::Uh2o.index() < Resource::Uh.index());
        assert!(Resource::Hydroxide.index() < Resource::Hydrogen.index());
        assert!(Resource::Ghodium.index() < Resource::Power.index());
        assert!(Resource::Power.index() < Resource::Energy.index());
        assert!(Resource::Energy.index() < Resource::Mist.index());
    }

    #[test]
    fn symbol_round_trip() {
        for r in RESOURCE_EXCHANGE_ORDER {
            assert_eq!(Resource::from_symbol(r.symbol()), Some(r));
        }
        assert_eq!(Resource::from_symbol("bogus"), None);
    }

    #[test]
    fn class_predicates() {
        assert!(Resource::Xlho2.is_heal_boost());
        assert!(Resource::Lo.is_heal_boost());
        assert!(!Resource::Xuh2o.is_heal_boost());
        assert_eq!(Resource::Xuh2o.boost_tier(), Some(3));
        assert_eq!(Resource::Uh2o.boost_tier(), Some(2));
        assert_eq!(Resource::Uh.boost_tier(), Some(1));
        assert_eq!(Resource::Energy.boost_tier(), None);
        assert!(Resource::Catalyst.is_base_mineral());
        assert!(Resource::Hydroxide.is_intermediate());
        assert!(Resource::Condensate.is_deposit_or_commodity());
        assert!(!Resource::Power.is_deposit_or_commodity());
    }

    #[test]
    fn resource_map_indexing() {
        let mut map: ResourceMap<u32> = ResourceMap::new();
        map[Resource::Energy] = 10_000;
        map[Resource::Utrium] += 5;
        assert_eq!(map[Resource::Energy], 10_000);
        assert_eq!(map[Resource::Utrium], 5);
        assert_eq!(map[Resource::Power], 0);
    }

    #[test]
    fn resource_map_serde_skips_zeroes() {
        let mut map: ResourceMap<u32> = ResourceMap::new();
        map[Resource::Energy] = 42;
        let json = serde_json::to_string(&map).unwrap();
        assert_eq!(json, r#"{"energy":42}"#);
        let back: ResourceMap<u32> = serde_json::from_str(&json).unwrap();
        assert_eq!(back, map);
    }
}
