//! Service configuration loaded from TOML
//!
//! Every section is optional; missing keys take the defaults below.

use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::models::DEFAULT_KEY_LENGTH;
use crate::room::{RoomRules, DEFAULT_MAX_ARGUMENT_CHARS, DEFAULT_ROUNDS};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AgoraConfig {
    pub server: ServerConfig,
    pub debate: DebateConfig,
    pub oracle: OracleConfig,
    pub storage: StorageConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 7420,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DebateConfig {
    /// Rounds per participant when a room does not ask for a count
    pub rounds: u32,
    /// Upper bound on a requested round count
    pub max_rounds: u32,
    pub room_key_length: usize,
    pub max_argument_chars: usize,
    /// Only registered players may create or join rooms
    pub require_registered_players: bool,
}

impl Default for DebateConfig {
    fn default() -> Self {
        Self {
            rounds: DEFAULT_ROUNDS,
            max_rounds: 20,
            room_key_length: DEFAULT_KEY_LENGTH,
            max_argument_chars: DEFAULT_MAX_ARGUMENT_CHARS,
            require_registered_players: true,
        }
    }
}

impl DebateConfig {
    /// Rules for a new room, validating a requested round count
    pub fn rules(&self, rounds: Option<u32>) -> Result<RoomRules> {
        let rounds_target = rounds.unwrap_or(self.rounds);
        if rounds_target == 0 || rounds_target > self.max_rounds {
            return Err(Error::Validation(format!(
                "rounds must be between 1 and {}, got {}",
                self.max_rounds, rounds_target
            )));
        }
        Ok(RoomRules {
            rounds_target,
            max_argument_chars: self.max_argument_chars,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OracleConfig {
    pub api_url: String,
    pub model: String,
    /// Environment variable holding the API key
    pub api_key_env: String,
    pub temperature: f32,
    pub timeout_secs: u64,
}

impl Default for OracleConfig {
    fn default() -> Self {
        Self {
            api_url: "https://openrouter.ai/api/v1/chat/completions".to_string(),
            model: "openai/gpt-4o-mini".to_string(),
            api_key_env: "OPENROUTER_API_KEY".to_string(),
            temperature: 0.7,
            timeout_secs: 30,
        }
    }
}

impl OracleConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub data_dir: Option<PathBuf>,
    pub archive_dir: Option<PathBuf>,
}

impl StorageConfig {
    /// Configured data directory, else the platform data directory
    pub fn data_dir(&self) -> Result<PathBuf> {
        if let Some(dir) = &self.data_dir {
            return Ok(dir.clone());
        }
        let dirs = ProjectDirs::from("dev", "agora", "agora")
            .ok_or_else(|| Error::Config("could not determine data directory".into()))?;
        Ok(dirs.data_dir().to_path_buf())
    }

    pub fn database_path(&self) -> Result<PathBuf> {
        Ok(self.data_dir()?.join("agora.db"))
    }

    pub fn archive_dir(&self) -> Result<PathBuf> {
        match &self.archive_dir {
            Some(dir) => Ok(dir.clone()),
            None => Ok(self.data_dir()?.join("debates")),
        }
    }
}

impl AgoraConfig {
    /// Read and validate a config file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let config: AgoraConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        let debate = &self.debate;
        if debate.max_rounds == 0 {
            return Err(Error::Config("debate.max_rounds must be positive".into()));
        }
        if debate.rounds == 0 || debate.rounds > debate.max_rounds {
            return Err(Error::Config(format!(
                "debate.rounds must be between 1 and {}",
                debate.max_rounds
            )));
        }
        if debate.room_key_length == 0 {
            return Err(Error::Config("debate.room_key_length must be positive".into()));
        }
        if debate.max_argument_chars == 0 {
            return Err(Error::Config("debate.max_argument_chars must be positive".into()));
        }
        if self.oracle.timeout_secs == 0 {
            return Err(Error::Config("oracle.timeout_secs must be positive".into()));
        }
        Ok(())
    }
}
