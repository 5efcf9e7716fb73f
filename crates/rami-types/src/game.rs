use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// Longest accepted game id.
pub const MAX_GAME_ID_LEN: usize = 64;

/// Explicit key under which a game is saved and loaded.
///
/// Ids are restricted to ASCII letters, digits, `-` and `_` so that they can
/// be used verbatim as file stems and URL path segments.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct GameId(String);

impl GameId {
    pub fn new(id: impl Into<String>) -> Result<Self, TypeError> {
        let id = id.into();
        if id.is_empty() {
            return Err(TypeError::InvalidGameId {
                id,
                reason: "must not be empty",
            });
        }
        if id.len() > MAX_GAME_ID_LEN {
            return Err(TypeError::InvalidGameId {
                id,
                reason: "longer than 64 characters",
            });
        }
        if !id
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_')
        {
            return Err(TypeError::InvalidGameId {
                id,
                reason: "only letters, digits, '-' and '_' are allowed",
            });
        }
        Ok(Self(id))
    }

    /// Generate a fresh, time-ordered id (UUID v7).
    pub fn generate() -> Self {
        Self(uuid::Uuid::now_v7().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for GameId {
    fn default() -> Self {
        Self("default".into())
    }
}

impl FromStr for GameId {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for GameId {
    type Error = TypeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<GameId> for String {
    fn from(id: GameId) -> Self {
        id.0
    }
}

impl fmt::Debug for GameId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "GameId({})", self.0)
    }
}

impl fmt::Display for GameId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_file_safe_ids() {
        assert!(GameId::new("friday-night_2").is_ok());
        assert_eq!(GameId::default().as_str(), "default");
    }

    #[test]
    fn rejects_path_like_ids() {
        assert!(GameId::new("../etc/passwd").is_err());
        assert!(GameId::new("a b").is_err());
        assert!(GameId::new("").is_err());
        assert!(GameId::new("x".repeat(65)).is_err());
    }

    #[test]
    fn generated_ids_are_unique_and_valid() {
        let a = GameId::generate();
        let b = GameId::generate();
        assert_ne!(a, b);
        assert!(GameId::new(a.as_str()).is_ok());
    }

    #[test]
    fn parse_and_serde() {
        let id: GameId = "table-1".parse().unwrap();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"table-1\"");
        assert!(serde_json::from_str::<GameId>("\"no/slash\"").is_err());
    }

    mod props {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn file_safe_ids_are_accepted(id in "[A-Za-z0-9_-]{1,64}") {
                let parsed = GameId::new(id.clone()).unwrap();
                prop_assert_eq!(parsed.as_str(), id.as_str());
            }

            #[test]
            fn ids_with_other_characters_are_rejected(
                prefix in "[a-z]{0,8}",
                bad in "[./ :*?]",
            ) {
                let id = prefix.clone() + &bad;
                prop_assert!(GameId::new(id).is_err());
            }
        }
    }
}
