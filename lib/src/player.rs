//! Player records and their per-map statistics.
//!
//! On the wire a player is a flat JSON object: `id`, `name`, and one
//! `kills_map{i}` / `rank_map{i}` pair per active map. In memory the pairs
//! live in an ordered map keyed by map index.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::de::{self, Deserializer, IgnoredAny, MapAccess, Visitor};
use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::ClashError;

/// Server-assigned player identifier. `0` means "not saved yet".
pub type PlayerId = u64;

const KILLS_PREFIX: &str = "kills_map";
const RANK_PREFIX: &str = "rank_map";

// ---------------------------------------------------------------------------
// MapStats
// ---------------------------------------------------------------------------

/// Kill count and placement rank for one map.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct MapStats {
    pub kills: f64,
    pub rank: f64,
}

impl MapStats {
    pub fn new(kills: f64, rank: f64) -> Self {
        Self { kills, rank }
    }

    /// Both values entered (strictly positive).
    pub fn is_filled(&self) -> bool {
        self.kills > 0.0 && self.rank > 0.0
    }
}

// ---------------------------------------------------------------------------
// Player
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Player {
    pub id: PlayerId,
    pub name: String,
    pub maps: BTreeMap<u32, MapStats>,
}

impl Player {
    pub fn new(id: PlayerId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            maps: BTreeMap::new(),
        }
    }

    /// Stats for `map`, zero when the map has no entry.
    pub fn stats(&self, map: u32) -> MapStats {
        self.maps.get(&map).copied().unwrap_or_default()
    }

    /// Replace all per-map entries with zeroed entries for maps `1..=map_count`.
    pub fn with_zeroed_maps(mut self, map_count: u32) -> Self {
        self.maps = (1..=map_count).map(|i| (i, MapStats::default())).collect();
        self
    }

    /// Write a numeric field. `Field::Name` is ignored here, use `name`.
    pub fn set_stat(&mut self, field: Field, value: f64) {
        match field {
            Field::Name => {}
            Field::Kills(map) => self.maps.entry(map).or_default().kills = value,
            Field::Rank(map) => self.maps.entry(map).or_default().rank = value,
        }
    }
}

impl Serialize for Player {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(2 + self.maps.len() * 2))?;
        map.serialize_entry("id", &self.id)?;
        map.serialize_entry("name", &self.name)?;
        for (index, stats) in &self.maps {
            map.serialize_entry(&format!("{KILLS_PREFIX}{index}"), &Number(stats.kills))?;
            map.serialize_entry(&format!("{RANK_PREFIX}{index}"), &Number(stats.rank))?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for Player {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_map(PlayerVisitor)
    }
}

struct PlayerVisitor;

impl<'de> Visitor<'de> for PlayerVisitor {
    type Value = Player;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a player object")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Player, A::Error> {
        let mut player = Player::default();
        while let Some(key) = access.next_key::<String>()? {
            match key.parse::<Field>() {
                Ok(Field::Name) => {
                    player.name = match access.next_value::<Value>()? {
                        Value::String(s) => s,
                        Value::Null => String::new(),
                        other => other.to_string(),
                    };
                }
                Ok(field) => {
                    let value = coerce_value(&access.next_value::<Value>()?);
                    player.set_stat(field, value);
                }
                Err(_) if key == "id" => {
                    let raw = access.next_value::<Value>()?;
                    player.id = coerce_id(&raw)
                        .ok_or_else(|| de::Error::custom(format!("invalid player id {raw}")))?;
                }
                Err(_) => {
                    access.next_value::<IgnoredAny>()?;
                }
            }
        }
        Ok(player)
    }
}

/// Serializes whole numbers without a fractional part (`10`, not `10.0`).
struct Number(f64);

impl Serialize for Number {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let v = self.0;
        if v.fract() == 0.0 && v.abs() < 9_007_199_254_740_992.0 {
            serializer.serialize_i64(v as i64)
        } else {
            serializer.serialize_f64(v)
        }
    }
}

// ---------------------------------------------------------------------------
// Field
// ---------------------------------------------------------------------------

/// An editable competitor field: the display name or one per-map stat.
///
/// `Display` / `FromStr` use the wire keys: `name`, `kills_map3`, `rank_map3`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    Name,
    Kills(u32),
    Rank(u32),
}

impl Field {
    pub fn map_index(&self) -> Option<u32> {
        match self {
            Field::Name => None,
            Field::Kills(i) | Field::Rank(i) => Some(*i),
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Field::Name => f.write_str("name"),
            Field::Kills(i) => write!(f, "{KILLS_PREFIX}{i}"),
            Field::Rank(i) => write!(f, "{RANK_PREFIX}{i}"),
        }
    }
}

impl FromStr for Field {
    type Err = ClashError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == "name" {
            return Ok(Field::Name);
        }
        let index = |suffix: &str| {
            suffix
                .parse::<u32>()
                .ok()
                .filter(|i| *i > 0)
                .ok_or_else(|| ClashError::UnknownField(s.to_string()))
        };
        if let Some(suffix) = s.strip_prefix(KILLS_PREFIX) {
            Ok(Field::Kills(index(suffix)?))
        } else if let Some(suffix) = s.strip_prefix(RANK_PREFIX) {
            Ok(Field::Rank(index(suffix)?))
        } else {
            Err(ClashError::UnknownField(s.to_string()))
        }
    }
}

// ---------------------------------------------------------------------------
// Lenient numeric coercion
// ---------------------------------------------------------------------------

/// Coerce raw text input to a number. Blank, non-numeric and non-finite
/// input becomes `0`.
pub fn coerce_number(raw: &str) -> f64 {
    raw.trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .unwrap_or(0.0)
}

/// Coerce a JSON value to a number with the same rules as `coerce_number`.
pub fn coerce_value(value: &Value) -> f64 {
    match value {
        Value::Number(n) => n.as_f64().filter(|v| v.is_finite()).unwrap_or(0.0),
        Value::String(s) => coerce_number(s),
        Value::Bool(true) => 1.0,
        _ => 0.0,
    }
}

/// Accept ids sent as numbers or numeric strings.
pub(crate) fn coerce_id(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().parse().ok(),
        Value::Null => Some(0),
        _ => None,
    }
}
