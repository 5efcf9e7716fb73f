use std::net::{Ipv4Addr, SocketAddr};
use std::path::{Path, PathBuf};
use std::time::Duration;

use rami_types::PlayerRoster;
use serde::{Deserialize, Serialize};

use crate::error::{ServerError, ServerResult};

/// Server settings, read from a TOML file. Missing keys take their defaults.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind_addr: SocketAddr,
    /// Directory holding one `<game-id>.json` file per game.
    pub data_dir: PathBuf,
    /// Seconds between autosaves. `0` disables the autosave task.
    pub autosave_secs: u64,
    /// Roster used when a game is created without an explicit player list.
    pub default_players: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from((Ipv4Addr::LOCALHOST, 8642)),
            data_dir: PathBuf::from("games"),
            autosave_secs: 60,
            default_players: ["Saleh", "Khalil", "Achref", "Morta"]
                .map(String::from)
                .to_vec(),
        }
    }
}

impl ServerConfig {
    pub fn from_toml_str(text: &str) -> ServerResult<Self> {
        let config: Self = toml::from_str(text).map_err(|e| ServerError::Config(e.to_string()))?;
        config.default_roster()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> ServerResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        let config = Self::from_toml_str(&text)?;
        tracing::debug!(path = %path.display(), "server config loaded");
        Ok(config)
    }

    pub fn autosave_interval(&self) -> Option<Duration> {
        (self.autosave_secs > 0).then(|| Duration::from_secs(self.autosave_secs))
    }

    pub fn default_roster(&self) -> ServerResult<PlayerRoster> {
        PlayerRoster::new(&self.default_players)
            .map_err(|e| ServerError::Config(format!("default_players: {e}")))
    }
}
