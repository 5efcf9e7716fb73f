use std::borrow::Borrow;
use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// Identity of a player within one game.
///
/// Names are trimmed on construction and must not be blank. Two names that
/// differ only in surrounding whitespace are the same player.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PlayerName(String);

impl PlayerName {
    pub fn new(name: impl Into<String>) -> Result<Self, TypeError> {
        let name = name.into();
        let trimmed = name.trim();
        if trimmed.is_empty() {
            return Err(TypeError::BlankPlayerName);
        }
        if trimmed.len() == name.len() {
            Ok(Self(name))
        } else {
            Ok(Self(trimmed.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl TryFrom<String> for PlayerName {
    type Error = TypeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl TryFrom<&str> for PlayerName {
    type Error = TypeError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<PlayerName> for String {
    fn from(name: PlayerName) -> Self {
        name.0
    }
}

impl Borrow<str> for PlayerName {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for PlayerName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl PartialEq<str> for PlayerName {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for PlayerName {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

impl fmt::Debug for PlayerName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PlayerName({:?})", self.0)
    }
}

impl fmt::Display for PlayerName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Ordered, non-empty set of unique players.
///
/// Order is seat order: it is kept for display and for tie-breaking in the
/// leaderboard. A roster is the only way to hand a player set to the ledger,
/// so anything holding one already satisfies the uniqueness invariant.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<String>", into = "Vec<String>")]
pub struct PlayerRoster {
    players: Vec<PlayerName>,
}

impl PlayerRoster {
    /// Build a roster from raw names, rejecting blank or repeated names.
    pub fn new<I, S>(names: I) -> Result<Self, TypeError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let players = names
            .into_iter()
            .map(PlayerName::new)
            .collect::<Result<Vec<_>, _>>()?;
        Self::from_names(players)
    }

    /// Build a roster from already-validated names.
    pub fn from_names(players: Vec<PlayerName>) -> Result<Self, TypeError> {
        if players.is_empty() {
            return Err(TypeError::EmptyRoster);
        }
        let mut seen = HashSet::with_capacity(players.len());
        for player in &players {
            if !seen.insert(player.as_str()) {
                return Err(TypeError::DuplicatePlayer(player.to_string()));
            }
        }
        Ok(Self { players })
    }

    pub fn len(&self) -> usize {
        self.players.len()
    }

    /// Always `false`; a roster holds at least one player.
    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    /// Seat index of `name`, if present.
    pub fn position(&self, name: &str) -> Option<usize> {
        self.players.iter().position(|p| p.as_str() == name)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, PlayerName> {
        self.players.iter()
    }

    pub fn as_slice(&self) -> &[PlayerName] {
        &self.players
    }
}

impl TryFrom<Vec<String>> for PlayerRoster {
    type Error = TypeError;

    fn try_from(names: Vec<String>) -> Result<Self, Self::Error> {
        Self::new(names)
    }
}

impl From<PlayerRoster> for Vec<String> {
    fn from(roster: PlayerRoster) -> Self {
        roster.players.into_iter().map(String::from).collect()
    }
}

impl<'a> IntoIterator for &'a PlayerRoster {
    type Item = &'a PlayerName;
    type IntoIter = std::slice::Iter<'a, PlayerName>;

    fn into_iter(self) -> Self::IntoIter {
        self.players.iter()
    }
}
