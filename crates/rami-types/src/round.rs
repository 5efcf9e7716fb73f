use std::collections::btree_map::Entry;
use std::collections::BTreeMap;
use std::fmt;

use serde::de::{self, MapAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize};

use crate::player::PlayerName;

/// Signed score change per player for a single round.
///
/// Serialized as a plain JSON object (`{"A": 50, "B": -50}`). A delta whose
/// entries sum to zero is a "null round" and is still a real round.
///
/// Deserializing rejects a player named twice, including names that only
/// differ in surrounding whitespace.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct RoundDelta(BTreeMap<PlayerName, i64>);

impl RoundDelta {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the delta for `player`, returning the previous value if any.
    pub fn insert(&mut self, player: PlayerName, amount: i64) -> Option<i64> {
        self.0.insert(player, amount)
    }

    /// Builder-style [`insert`](Self::insert).
    pub fn with(mut self, player: PlayerName, amount: i64) -> Self {
        self.0.insert(player, amount);
        self
    }

    pub fn get(&self, player: &str) -> Option<i64> {
        self.0.get(player).copied()
    }

    pub fn contains(&self, player: &str) -> bool {
        self.0.contains_key(player)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn players(&self) -> impl Iterator<Item = &PlayerName> {
        self.0.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&PlayerName, i64)> {
        self.0.iter().map(|(name, amount)| (name, *amount))
    }

    /// Sum of all entries, widened so it cannot overflow.
    pub fn total(&self) -> i128 {
        self.0.values().map(|v| i128::from(*v)).sum()
    }

    /// `true` when the entries sum to zero.
    pub fn is_null(&self) -> bool {
        self.total() == 0
    }
}

impl FromIterator<(PlayerName, i64)> for RoundDelta {
    fn from_iter<T: IntoIterator<Item = (PlayerName, i64)>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl From<BTreeMap<PlayerName, i64>> for RoundDelta {
    fn from(map: BTreeMap<PlayerName, i64>) -> Self {
        Self(map)
    }
}

impl From<RoundDelta> for BTreeMap<PlayerName, i64> {
    fn from(delta: RoundDelta) -> Self {
        delta.0
    }
}

impl<'de> Deserialize<'de> for RoundDelta {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct DeltaVisitor;

        impl<'de> Visitor<'de> for DeltaVisitor {
            type Value = RoundDelta;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map of player names to score changes")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
                let mut deltas = BTreeMap::new();
                while let Some((name, amount)) = access.next_entry::<PlayerName, i64>()? {
                    match deltas.entry(name) {
                        Entry::Vacant(slot) => {
                            slot.insert(amount);
                        }
                        Entry::Occupied(slot) => {
                            return Err(de::Error::custom(format!(
                                "player {} appears more than once in the round",
                                slot.key()
                            )))
                        }
                    }
                }
                Ok(RoundDelta(deltas))
            }
        }

        deserializer.deserialize_map(DeltaVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn name(s: &str) -> PlayerName {
        PlayerName::new(s).unwrap()
    }

    #[test]
    fn null_round_detection() {
        let zero_sum = RoundDelta::new().with(name("A"), 50).with(name("B"), -50);
        assert!(zero_sum.is_null());

        let all_zero = RoundDelta::new().with(name("A"), 0).with(name("B"), 0);
        assert!(all_zero.is_null());

        let scoring = RoundDelta::new().with(name("A"), 100).with(name("B"), -20);
        assert!(!scoring.is_null());
        assert_eq!(scoring.total(), 80);
    }

    #[test]
    fn total_does_not_overflow() {
        let delta = RoundDelta::new()
            .with(name("A"), i64::MAX)
            .with(name("B"), i64::MAX);
        assert_eq!(delta.total(), 2 * i128::from(i64::MAX));
    }

    #[test]
    fn serializes_as_plain_object() {
        let delta = RoundDelta::new().with(name("B"), -50).with(name("A"), 50);
        let json = serde_json::to_string(&delta).unwrap();
        assert_eq!(json, r#"{"A":50,"B":-50}"#);

        let parsed: RoundDelta = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.get("A"), Some(50));
        assert_eq!(parsed.get("B"), Some(-50));
    }

    #[test]
    fn rejects_repeated_players() {
        let err = serde_json::from_str::<RoundDelta>(r#"{"A": 10, "A": 20, "B": 0}"#).unwrap_err();
        assert!(err.to_string().contains("more than once"));
        assert!(serde_json::from_str::<RoundDelta>(r#"{"A": 10, " A ": 5, "B": 0}"#).is_err());
    }

    #[test]
    fn rejects_blank_keys() {
        assert!(serde_json::from_str::<RoundDelta>(r#"{" ": 1}"#).is_err());
    }
}
