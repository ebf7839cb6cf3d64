use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::ids::FlagKey;

/// Loosely typed flag value. Scenes mostly store booleans, but counters
/// (`espresso_count`) and the odd string also live in the same table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FlagValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Null,
}

impl FlagValue {
    /// Truthiness used by every story predicate: `false`, `0`, `0.0`, `NaN`,
    /// `""` and `null` all read as "not set".
    pub fn is_truthy(&self) -> bool {
        match self {
            FlagValue::Bool(value) => *value,
            FlagValue::Int(value) => *value != 0,
            FlagValue::Float(value) => *value != 0.0 && !value.is_nan(),
            FlagValue::Text(value) => !value.is_empty(),
            FlagValue::Null => false,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            FlagValue::Int(value) => Some(*value),
            FlagValue::Float(value) => Some(*value as i64),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            FlagValue::Text(value) => Some(value.as_str()),
            _ => None,
        }
    }

    /// Parses a command-line literal: `true`/`false`, integers, floats,
    /// `null`, anything else as text.
    pub fn parse_literal(raw: &str) -> Self {
        let trimmed = raw.trim();
        match trimmed {
            "true" => return FlagValue::Bool(true),
            "false" => return FlagValue::Bool(false),
            "null" => return FlagValue::Null,
            _ => {}
        }
        if let Ok(value) = trimmed.parse::<i64>() {
            return FlagValue::Int(value);
        }
        if let Ok(value) = trimmed.parse::<f64>() {
            return FlagValue::Float(value);
        }
        FlagValue::Text(trimmed.to_string())
    }
}

impl fmt::Display for FlagValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FlagValue::Bool(value) => write!(f, "{value}"),
            FlagValue::Int(value) => write!(f, "{value}"),
            FlagValue::Float(value) => write!(f, "{value}"),
            FlagValue::Text(value) => write!(f, "{value:?}"),
            FlagValue::Null => f.write_str("null"),
        }
    }
}

impl From<bool> for FlagValue {
    fn from(value: bool) -> Self {
        FlagValue::Bool(value)
    }
}

impl From<i64> for FlagValue {
    fn from(value: i64) -> Self {
        FlagValue::Int(value)
    }
}

impl From<i32> for FlagValue {
    fn from(value: i32) -> Self {
        FlagValue::Int(value.into())
    }
}

impl From<u32> for FlagValue {
    fn from(value: u32) -> Self {
        FlagValue::Int(value.into())
    }
}

impl From<f64> for FlagValue {
    fn from(value: f64) -> Self {
        FlagValue::Float(value)
    }
}

impl From<&str> for FlagValue {
    fn from(value: &str) -> Self {
        FlagValue::Text(value.to_string())
    }
}

impl From<String> for FlagValue {
    fn from(value: String) -> Self {
        FlagValue::Text(value)
    }
}

/// Session-wide story flags keyed by name.
///
/// Scenes only ever move flags forward in practice, but the store accepts any
/// write. An unset key and a falsy value are indistinguishable through
/// [`FlagStore::is_set`].
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FlagStore {
    values: BTreeMap<FlagKey, FlagValue>,
}

impl FlagStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&FlagValue> {
        self.values.get(key)
    }

    pub fn is_set(&self, key: &str) -> bool {
        self.values
            .get(key)
            .map(FlagValue::is_truthy)
            .unwrap_or(false)
    }

    /// Integer view of a counter flag; unset or non-numeric reads as zero.
    pub fn int(&self, key: &str) -> i64 {
        self.values
            .get(key)
            .and_then(FlagValue::as_int)
            .unwrap_or(0)
    }

    /// Writes a flag and reports whether the stored value changed.
    pub fn set(&mut self, key: impl Into<FlagKey>, value: impl Into<FlagValue>) -> bool {
        let key = key.into();
        let value = value.into();
        let needs_write = match self.values.get(&key) {
            Some(existing) => existing != &value,
            None => true,
        };
        if needs_write {
            self.values.insert(key, value);
        }
        needs_write
    }

    /// Bumps a counter flag and returns the new count.
    pub fn increment(&mut self, key: impl Into<FlagKey>) -> i64 {
        let key = key.into();
        let next = self.int(key.as_str()).saturating_add(1);
        self.values.insert(key, FlagValue::Int(next));
        next
    }

    pub fn remove(&mut self, key: &str) -> bool {
        self.values.remove(key).is_some()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&FlagKey, &FlagValue)> {
        self.values.iter()
    }

    /// Keys whose value is currently truthy, in key order.
    pub fn set_keys(&self) -> impl Iterator<Item = &FlagKey> {
        self.values
            .iter()
            .filter(|(_, value)| value.is_truthy())
            .map(|(key, _)| key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn setting_same_value_twice_is_idempotent() {
        let mut once = FlagStore::new();
        once.set("schematics_verified", true);

        let mut twice = FlagStore::new();
        assert!(twice.set("schematics_verified", true));
        assert!(!twice.set("schematics_verified", true));

        assert_eq!(once, twice);
        assert_eq!(twice.len(), 1);
    }

    #[test]
    fn unset_and_false_collapse_to_not_set() {
        let mut flags = FlagStore::new();
        assert!(!flags.is_set("visited_astron"));
        assert!(flags.get("visited_astron").is_none());

        flags.set("visited_astron", false);
        flags.set("dog_interactions", 0);
        flags.set("nickname", "");
        flags.set("obsolete", FlagValue::Null);
        flags.set("nan_counter", f64::NAN);

        for key in [
            "visited_astron",
            "dog_interactions",
            "nickname",
            "obsolete",
            "nan_counter",
        ] {
            assert!(!flags.is_set(key), "{key} should read as unset");
        }
    }

    #[test]
    fn counters_increment_from_zero() {
        let mut flags = FlagStore::new();
        assert_eq!(flags.increment("espresso_count"), 1);
        assert_eq!(flags.increment("espresso_count"), 2);
        assert_eq!(flags.int("espresso_count"), 2);
        assert!(flags.is_set("espresso_count"));
    }

    #[test]
    fn browser_flag_table_parses_mixed_values() {
        let raw = r#"{"game_started":true,"espresso_count":3,"ratio":1.5,"contact":"eva","gone":null}"#;
        let flags: FlagStore = serde_json::from_str(raw).expect("parse flag table");

        assert_eq!(flags.get("game_started"), Some(&FlagValue::Bool(true)));
        assert_eq!(flags.int("espresso_count"), 3);
        assert_eq!(flags.get("ratio"), Some(&FlagValue::Float(1.5)));
        assert_eq!(flags.get("contact").and_then(FlagValue::as_str), Some("eva"));
        assert_eq!(flags.get("gone"), Some(&FlagValue::Null));

        let set: Vec<&str> = flags.set_keys().map(FlagKey::as_str).collect();
        assert_eq!(set, vec!["contact", "espresso_count", "game_started", "ratio"]);
    }

    #[test]
    fn literals_parse_to_expected_variants() {
        assert_eq!(FlagValue::parse_literal("true"), FlagValue::Bool(true));
        assert_eq!(FlagValue::parse_literal(" 42 "), FlagValue::Int(42));
        assert_eq!(FlagValue::parse_literal("0.25"), FlagValue::Float(0.25));
        assert_eq!(FlagValue::parse_literal("null"), FlagValue::Null);
        assert_eq!(
            FlagValue::parse_literal("Volkov"),
            FlagValue::Text("Volkov".to_string())
        );
    }
}
