use std::fmt;

use rami_types::{PlayerName, RoundDelta};
use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::LedgerError;

/// Persisted form of a [`ScoreLedger`](crate::ScoreLedger).
///
/// On disk this is a JSON object with exactly two fields:
///
/// ```json
/// {
///   "players": { "A": [50, 0], "B": [-50, 0] },
///   "roundHistory": [ { "A": 50, "B": -50 }, { "A": -50, "B": 50 } ]
/// }
/// ```
///
/// `round_history` is accepted on read for files written by older versions.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerRecord {
    pub players: PlayerHistories,
    #[serde(rename = "roundHistory", alias = "round_history")]
    pub round_history: Vec<RoundDelta>,
}

impl LedgerRecord {
    pub fn to_json(&self) -> Result<String, LedgerError> {
        serde_json::to_string(self).map_err(|e| LedgerError::Serialization(e.to_string()))
    }

    pub fn to_json_pretty(&self) -> Result<String, LedgerError> {
        serde_json::to_string_pretty(self).map_err(|e| LedgerError::Serialization(e.to_string()))
    }

    /// Parse a record. Malformed JSON or missing fields are `CorruptState`.
    pub fn from_json(json: &str) -> Result<Self, LedgerError> {
        serde_json::from_str(json).map_err(|e| LedgerError::CorruptState(e.to_string()))
    }
}

/// Player name → cumulative score history, in seat order.
///
/// Serialized as a JSON object whose key order is the seat order. Repeated
/// keys are kept on read so that the ledger can reject them.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PlayerHistories(Vec<(PlayerName, Vec<i64>)>);

impl PlayerHistories {
    pub fn get(&self, player: &str) -> Option<&[i64]> {
        self.0
            .iter()
            .find(|(name, _)| name.as_str() == player)
            .map(|(_, history)| history.as_slice())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&PlayerName, &[i64])> {
        self.0.iter().map(|(name, history)| (name, history.as_slice()))
    }

    pub fn into_entries(self) -> Vec<(PlayerName, Vec<i64>)> {
        self.0
    }
}

impl FromIterator<(PlayerName, Vec<i64>)> for PlayerHistories {
    fn from_iter<T: IntoIterator<Item = (PlayerName, Vec<i64>)>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl Serialize for PlayerHistories {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (name, history) in &self.0 {
            map.serialize_entry(name, history)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for PlayerHistories {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct HistoriesVisitor;

        impl<'de> Visitor<'de> for HistoriesVisitor {
            type Value = PlayerHistories;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map of player names to score histories")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
                let mut entries = Vec::with_capacity(access.size_hint().unwrap_or(0));
                while let Some((name, history)) = access.next_entry::<PlayerName, Vec<i64>>()? {
                    entries.push((name, history));
                }
                Ok(PlayerHistories(entries))
            }
        }

        deserializer.deserialize_map(HistoriesVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_format_matches_saved_games() {
        let json = r#"{"players":{"A":[50,0],"B":[-50,0]},"roundHistory":[{"A":50,"B":-50},{"A":-50,"B":50}]}"#;
        let record = LedgerRecord::from_json(json).unwrap();
        assert_eq!(record.players.get("A"), Some(&[50, 0][..]));
        assert_eq!(record.round_history.len(), 2);
        assert_eq!(record.to_json().unwrap(), json);
    }

    #[test]
    fn accepts_snake_case_round_history() {
        let json = r#"{"players":{"A":[3]},"round_history":[{"A":3}]}"#;
        let record = LedgerRecord::from_json(json).unwrap();
        assert_eq!(record.round_history[0].get("A"), Some(3));
    }

    #[test]
    fn players_keep_document_order() {
        let json = r#"{"players":{"Zed":[],"Amy":[]},"roundHistory":[]}"#;
        let record = LedgerRecord::from_json(json).unwrap();
        let names: Vec<&str> = record.players.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, ["Zed", "Amy"]);
        assert!(record.to_json().unwrap().starts_with(r#"{"players":{"Zed":[],"Amy":[]}"#));
    }

    #[test]
    fn repeated_player_keys_survive_parsing() {
        let json = r#"{"players":{"A":[],"A":[]},"roundHistory":[]}"#;
        let record = LedgerRecord::from_json(json).unwrap();
        assert_eq!(record.players.len(), 2);
    }

    #[test]
    fn wrong_types_are_corrupt() {
        let err = LedgerRecord::from_json(r#"{"players":{"A":"x"},"roundHistory":[]}"#).unwrap_err();
        assert!(matches!(err, LedgerError::CorruptState(_)));
    }
}
