use std::fmt;
use std::ops::Add;

use serde::{Deserialize, Serialize};

/// Wire code for "a resource of unknown kind".
pub const UNKNOWN_RESOURCE_CODE: u8 = 6;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    Clay,
    Ore,
    Sheep,
    Wheat,
    Wood,
}

impl ResourceKind {
    pub const ALL: [ResourceKind; 5] = [
        ResourceKind::Clay,
        ResourceKind::Ore,
        ResourceKind::Sheep,
        ResourceKind::Wheat,
        ResourceKind::Wood,
    ];

    pub const fn code(self) -> u8 {
        match self {
            ResourceKind::Clay => 1,
            ResourceKind::Ore => 2,
            ResourceKind::Sheep => 3,
            ResourceKind::Wheat => 4,
            ResourceKind::Wood => 5,
        }
    }

    pub fn from_code(code: u8) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.code() == code)
    }

    pub const fn name(self) -> &'static str {
        match self {
            ResourceKind::Clay => "clay",
            ResourceKind::Ore => "ore",
            ResourceKind::Sheep => "sheep",
            ResourceKind::Wheat => "wheat",
            ResourceKind::Wood => "wood",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Typed resource amounts plus an `unknown` bucket for amounts whose kind is hidden from the
/// observer holding this value.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ResourceSet {
    pub clay: u32,
    pub ore: u32,
    pub sheep: u32,
    pub wheat: u32,
    pub wood: u32,
    #[serde(default)]
    pub unknown: u32,
}

impl ResourceSet {
    pub const fn new(clay: u32, ore: u32, sheep: u32, wheat: u32, wood: u32) -> Self {
        Self {
            clay,
            ore,
            sheep,
            wheat,
            wood,
            unknown: 0,
        }
    }

    pub fn of(kind: ResourceKind, amount: u32) -> Self {
        let mut set = Self::default();
        set.set(kind, amount);
        set
    }

    pub const fn unknown(amount: u32) -> Self {
        Self {
            clay: 0,
            ore: 0,
            sheep: 0,
            wheat: 0,
            wood: 0,
            unknown: amount,
        }
    }

    pub const fn get(&self, kind: ResourceKind) -> u32 {
        match kind {
            ResourceKind::Clay => self.clay,
            ResourceKind::Ore => self.ore,
            ResourceKind::Sheep => self.sheep,
            ResourceKind::Wheat => self.wheat,
            ResourceKind::Wood => self.wood,
        }
    }

    fn slot(&mut self, kind: ResourceKind) -> &mut u32 {
        match kind {
            ResourceKind::Clay => &mut self.clay,
            ResourceKind::Ore => &mut self.ore,
            ResourceKind::Sheep => &mut self.sheep,
            ResourceKind::Wheat => &mut self.wheat,
            ResourceKind::Wood => &mut self.wood,
        }
    }

    pub fn set(&mut self, kind: ResourceKind, amount: u32) {
        *self.slot(kind) = amount;
    }

    pub fn add(&mut self, kind: ResourceKind, amount: u32) {
        *self.slot(kind) += amount;
    }

    pub fn add_set(&mut self, other: &ResourceSet) {
        for kind in ResourceKind::ALL {
            self.add(kind, other.get(kind));
        }
        self.unknown += other.unknown;
    }

    /// Typed amounts only; the unknown bucket never satisfies a typed requirement.
    pub fn contains(&self, other: &ResourceSet) -> bool {
        ResourceKind::ALL
            .into_iter()
            .all(|kind| self.get(kind) >= other.get(kind))
            && self.unknown >= other.unknown
    }

    /// Subtract `other`, or `None` if any amount would go negative.
    pub fn checked_sub(&self, other: &ResourceSet) -> Option<ResourceSet> {
        if !self.contains(other) {
            return None;
        }
        let mut out = *self;
        for kind in ResourceKind::ALL {
            out.set(kind, self.get(kind) - other.get(kind));
        }
        out.unknown -= other.unknown;
        Some(out)
    }

    pub fn known_total(&self) -> u32 {
        ResourceKind::ALL.into_iter().map(|k| self.get(k)).sum()
    }

    pub fn total(&self) -> u32 {
        self.known_total() + self.unknown
    }

    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }

    /// The same total with every typed amount moved into the unknown bucket.
    pub fn redacted(&self) -> ResourceSet {
        ResourceSet::unknown(self.total())
    }

    /// Non-zero typed amounts in code order.
    pub fn iter(&self) -> impl Iterator<Item = (ResourceKind, u32)> + '_ {
        ResourceKind::ALL
            .into_iter()
            .map(|k| (k, self.get(k)))
            .filter(|(_, n)| *n > 0)
    }

    /// Expand into one entry per resource card, in code order.
    pub fn cards(&self) -> Vec<ResourceKind> {
        self.iter()
            .flat_map(|(kind, n)| std::iter::repeat(kind).take(n as usize))
            .collect()
    }
}

impl Add for ResourceSet {
    type Output = ResourceSet;

    fn add(mut self, rhs: ResourceSet) -> ResourceSet {
        self.add_set(&rhs);
        self
    }
}

impl fmt::Display for ResourceSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "clay={}|ore={}|sheep={}|wheat={}|wood={}|unknown={}",
            self.clay, self.ore, self.sheep, self.wheat, self.wood, self.unknown
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_follow_wire_order() {
        let codes: Vec<u8> = ResourceKind::ALL.iter().map(|k| k.code()).collect();
        assert_eq!(codes, vec![1, 2, 3, 4, 5]);
        assert_eq!(ResourceKind::from_code(3), Some(ResourceKind::Sheep));
        assert_eq!(ResourceKind::from_code(UNKNOWN_RESOURCE_CODE), None);
    }

    #[test]
    fn checked_sub_is_all_or_nothing() {
        let hand = ResourceSet::new(3, 3, 3, 4, 4);
        let settlement = ResourceSet::new(1, 0, 1, 1, 1);
        assert_eq!(hand.checked_sub(&settlement), Some(ResourceSet::new(2, 3, 2, 3, 3)));

        let city = ResourceSet::new(0, 4, 0, 2, 0);
        assert_eq!(hand.checked_sub(&city), None);
    }

    #[test]
    fn redaction_conserves_total() {
        let set = ResourceSet::new(1, 0, 2, 0, 3);
        let redacted = set.redacted();
        assert_eq!(redacted.total(), set.total());
        assert_eq!(redacted.known_total(), 0);
        assert_eq!(redacted.unknown, 6);
    }

    #[test]
    fn cards_expand_in_code_order() {
        let set = ResourceSet::new(0, 1, 2, 0, 0);
        assert_eq!(
            set.cards(),
            vec![ResourceKind::Ore, ResourceKind::Sheep, ResourceKind::Sheep]
        );
    }
}
