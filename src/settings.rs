// Mimic — Host settings
//
// A TOML file with four optional tables:
//
//   [bot]     name = "mimic", alias = "parrot"
//   [store]   path = "/var/lib/mimic/brain.db"   (or in_memory = true)
//   [irc]     enabled, server, port, tls, nick, password, channels
//   [engine]  mode, min_words, init_timeout_ms, case_sensitive, …
//
// MIMIC_* environment variables override the [engine] table.

use crate::bridges::irc::IrcConfig;
use log::info;
use mimic_core::{EngineConfig, EngineError, EngineResult};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BotSettings {
    pub name: String,
    pub alias: Option<String>,
}

impl Default for BotSettings {
    fn default() -> Self {
        BotSettings { name: "mimic".into(), alias: None }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreSettings {
    pub path: Option<PathBuf>,
    /// Keep the brain in memory only; nothing survives a restart.
    pub in_memory: bool,
}

impl StoreSettings {
    pub fn resolved_path(&self) -> PathBuf {
        self.path.clone().unwrap_or_else(default_brain_path)
    }
}

/// `<data dir>/mimic/brain.db`
pub fn default_brain_path() -> PathBuf {
    dirs::data_dir().unwrap_or_default().join("mimic").join("brain.db")
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub bot: BotSettings,
    pub store: StoreSettings,
    pub irc: IrcConfig,
    pub engine: EngineConfig,
}

impl Settings {
    pub fn from_toml_str(raw: &str) -> EngineResult<Self> {
        toml::from_str(raw).map_err(|e| EngineError::Config(format!("settings: {}", e)))
    }

    /// Load the file (if any), then apply environment overrides.
    pub fn load(path: Option<&Path>) -> EngineResult<Self> {
        let mut settings = match path {
            Some(path) => {
                info!("[settings] Loading {:?}", path);
                let raw = std::fs::read_to_string(path)
                    .map_err(|e| EngineError::Config(format!("cannot read {:?}: {}", path, e)))?;
                Self::from_toml_str(&raw)?
            }
            None => Settings::default(),
        };
        settings.engine = settings.engine.with_overrides(|key| std::env::var(key).ok());
        Ok(settings)
    }
}
