//! Data models for Monster Rancher 3 game data.

use crate::error::{Mr3Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Monster derivations (types), 1-based in game order.
pub const DERIVATION_NAMES: [&str; 30] = [
    "Baku",
    "Beaklon",
    "Colorpandora",
    "Dragon",
    "Dakkung",
    "Durahan",
    "Gitan",
    "Golem",
    "Hare",
    "Henger",
    "Jell",
    "Joker",
    "Lesione",
    "Mew",
    "Mocchi",
    "Mogi",
    "Momo",
    "Naga",
    "Octopee",
    "Ogyo",
    "Pancho",
    "Pixie",
    "Plant",
    "Psiroller",
    "Raiden",
    "Suezo",
    "Suzurin",
    "Tiger",
    "Zan",
    "Zoom",
];

/// Regions (sub-types), 1-based. Each derivation's block on the wiki starts with Brillia.
pub const REGION_NAMES: [&str; 6] = ["Brillia", "Goat", "Takrama", "Kalaragi", "Morx", "Special"];

/// Region that opens every derivation block on the encyclopedia page.
pub const FIRST_REGION: &str = "Brillia";

fn lookup(table: &[&'static str], kind: &'static str, id: u32) -> Result<&'static str> {
    (id as usize)
        .checked_sub(1)
        .and_then(|idx| table.get(idx))
        .copied()
        .ok_or(Mr3Error::UnknownOrdinal { kind, id })
}

/// Resolve a 1-based derivation id to its name.
pub fn derivation_name(id: u32) -> Result<&'static str> {
    lookup(&DERIVATION_NAMES, "derivation", id)
}

/// Resolve a 1-based region id to its name.
pub fn region_name(id: u32) -> Result<&'static str> {
    lookup(&REGION_NAMES, "region", id)
}

/// Resolve a region name to its 1-based id.
pub fn region_id(name: &str) -> Result<u32> {
    REGION_NAMES
        .iter()
        .position(|r| *r == name)
        .map(|idx| idx as u32 + 1)
        .ok_or_else(|| Mr3Error::UnknownRegion(name.to_string()))
}

/// Attack parsed from the attack text dump
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attack {
    pub derivation_id: u32,
    pub name: String,
    pub stat_used: String,
    pub attack_type: String,
    pub item_required: String,
    pub guts_used: i32,
    pub damage: i32,
    pub guts_down: i32,
    pub critical_chance: i32,
    pub hit_chance: i32,
    pub max_level: i32,
    pub range: String,
    pub growth: String,
    pub effect: String,
}

/// Default for absent textual attack fields.
pub const UNKNOWN: &str = "Unknown";
/// Default for an absent attack effect.
pub const NO_EFFECT: &str = "None";

/// Characteristic (trait) parsed from the characteristic dump
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Characteristic {
    pub name: String,
    pub description: String,
}

/// Monster scraped from the wiki
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Monster {
    pub species: String,
    pub derivation_id: u32,
    pub region_id: u32,
    pub description: String,
}

impl Monster {
    /// Human-readable summary, `species | derivation | region | description`.
    ///
    /// Fails when either id is outside its table.
    pub fn summary(&self) -> Result<String> {
        Ok(format!(
            "{} | {} | {} | {}",
            self.species,
            derivation_name(self.derivation_id)?,
            region_name(self.region_id)?,
            self.description
        ))
    }
}

impl fmt::Display for Characteristic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.name, self.description)
    }
}
