// Mimic Engine — Configuration
//
// Read once at startup and immutable afterwards. Values come from a TOML
// `[engine]` table (host settings) and/or MIMIC_* environment variables.
// Bad values never abort startup: each falls back to its default with a warning.

use crate::atoms::constants::{DEFAULT_INIT_TIMEOUT, MAX_RESPONSE_WORDS, RESPONSE_DELAY_PER_WORD};
use crate::atoms::types::Mode;
use crate::engine::markov::ChainOptions;
use log::warn;
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const ENV_MODE: &str = "MIMIC_MODE";
pub const ENV_MIN_WORDS: &str = "MIMIC_MIN_WORDS";
pub const ENV_INIT_TIMEOUT_MS: &str = "MIMIC_INIT_TIMEOUT_MS";
pub const ENV_CASE_SENSITIVE: &str = "MIMIC_CASE_SENSITIVE";
pub const ENV_STRIP_PUNCTUATION: &str = "MIMIC_STRIP_PUNCTUATION";
pub const ENV_RESPONSE_PROBABILITY: &str = "MIMIC_RESPONSE_PROBABILITY";
pub const ENV_DELAY_PER_WORD_MS: &str = "MIMIC_DELAY_PER_WORD_MS";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub mode: Mode,
    /// Messages with fewer words are ignored entirely.
    pub min_words: usize,
    /// Max wait for store readiness before activating anyway.
    pub init_timeout_ms: u64,
    pub case_sensitive: bool,
    pub strip_punctuation: bool,
    /// When set, replaces the default draw-pair gate with a fixed probability.
    pub response_probability: Option<f64>,
    pub delay_per_word_ms: u64,
    pub max_response_words: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            mode: Mode::Train,
            min_words: 1,
            init_timeout_ms: DEFAULT_INIT_TIMEOUT.as_millis() as u64,
            case_sensitive: false,
            strip_punctuation: false,
            response_probability: None,
            delay_per_word_ms: RESPONSE_DELAY_PER_WORD.as_millis() as u64,
            max_response_words: MAX_RESPONSE_WORDS,
        }
    }
}

impl EngineConfig {
    /// Defaults overridden by the process environment.
    pub fn from_env() -> Self {
        Self::default().with_overrides(|key| std::env::var(key).ok())
    }

    /// Apply MIMIC_* overrides from an arbitrary lookup (env, a map in tests…).
    pub fn with_overrides<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(raw) = lookup(ENV_MODE) {
            self.mode = match Mode::parse(&raw) {
                Some(mode) => mode,
                None => {
                    warn!("[config] Unknown {} '{}', falling back to '{}'", ENV_MODE, raw, Mode::default());
                    Mode::default()
                }
            };
        }
        if let Some(raw) = lookup(ENV_MIN_WORDS) {
            self.min_words = parse_or(ENV_MIN_WORDS, &raw, self.min_words);
        }
        if let Some(raw) = lookup(ENV_INIT_TIMEOUT_MS) {
            self.init_timeout_ms = parse_or(ENV_INIT_TIMEOUT_MS, &raw, self.init_timeout_ms);
        }
        if let Some(raw) = lookup(ENV_CASE_SENSITIVE) {
            self.case_sensitive = parse_flag(ENV_CASE_SENSITIVE, &raw, self.case_sensitive);
        }
        if let Some(raw) = lookup(ENV_STRIP_PUNCTUATION) {
            self.strip_punctuation = parse_flag(ENV_STRIP_PUNCTUATION, &raw, self.strip_punctuation);
        }
        if let Some(raw) = lookup(ENV_RESPONSE_PROBABILITY) {
            match raw.trim().parse::<f64>() {
                Ok(p) if (0.0..=1.0).contains(&p) => self.response_probability = Some(p),
                _ => warn!("[config] Ignoring {}='{}' (expected 0.0–1.0)", ENV_RESPONSE_PROBABILITY, raw),
            }
        }
        if let Some(raw) = lookup(ENV_DELAY_PER_WORD_MS) {
            self.delay_per_word_ms = parse_or(ENV_DELAY_PER_WORD_MS, &raw, self.delay_per_word_ms);
        }
        self
    }

    pub fn init_timeout(&self) -> Duration {
        Duration::from_millis(self.init_timeout_ms)
    }

    pub fn delay_per_word(&self) -> Duration {
        Duration::from_millis(self.delay_per_word_ms)
    }

    /// Tokenization and generation options handed to every chain.
    pub fn chain_options(&self) -> ChainOptions {
        ChainOptions {
            min_words: self.min_words,
            case_sensitive: self.case_sensitive,
            strip_punctuation: self.strip_punctuation,
            max_response_words: self.max_response_words.max(1),
        }
    }
}

fn parse_or<T: std::str::FromStr + Copy + std::fmt::Display>(key: &str, raw: &str, default: T) -> T {
    match raw.trim().parse::<T>() {
        Ok(v) => v,
        Err(_) => {
            warn!("[config] Invalid {}='{}', keeping {}", key, raw, default);
            default
        }
    }
}

/// Boolean-like strings: 1/true/yes/on and 0/false/no/off.
fn parse_flag(key: &str, raw: &str, default: bool) -> bool {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => true,
        "0" | "false" | "no" | "off" | "" => false,
        _ => {
            warn!("[config] Invalid {}='{}', keeping {}", key, raw, default);
            default
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> =
            pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |k| map.get(k).cloned()
    }

    #[test]
    fn test_defaults() {
        let cfg = EngineConfig::default();
        assert_eq!(cfg.mode, Mode::Train);
        assert_eq!(cfg.min_words, 1);
        assert_eq!(cfg.init_timeout(), Duration::from_secs(10));
        assert!(!cfg.case_sensitive);
        assert!(cfg.response_probability.is_none());
    }

    #[test]
    fn test_overrides_applied() {
        let cfg = EngineConfig::default().with_overrides(lookup(&[
            (ENV_MODE, "train_respond"),
            (ENV_MIN_WORDS, "3"),
            (ENV_INIT_TIMEOUT_MS, "250"),
            (ENV_CASE_SENSITIVE, "yes"),
            (ENV_STRIP_PUNCTUATION, "1"),
            (ENV_RESPONSE_PROBABILITY, "0.3"),
        ]));
        assert_eq!(cfg.mode, Mode::TrainRespond);
        assert_eq!(cfg.min_words, 3);
        assert_eq!(cfg.init_timeout_ms, 250);
        assert!(cfg.case_sensitive);
        assert!(cfg.strip_punctuation);
        assert_eq!(cfg.response_probability, Some(0.3));
    }

    #[test]
    fn test_unknown_mode_falls_back_to_train() {
        let cfg = EngineConfig { mode: Mode::Respond, ..Default::default() }
            .with_overrides(lookup(&[(ENV_MODE, "yell")]));
        assert_eq!(cfg.mode, Mode::Train);
    }

    #[test]
    fn test_garbage_numbers_keep_defaults() {
        let cfg = EngineConfig::default().with_overrides(lookup(&[
            (ENV_MIN_WORDS, "-2"),
            (ENV_CASE_SENSITIVE, "maybe"),
            (ENV_RESPONSE_PROBABILITY, "7"),
        ]));
        assert_eq!(cfg.min_words, 1);
        assert!(!cfg.case_sensitive);
        assert!(cfg.response_probability.is_none());
    }

    #[test]
    fn test_partial_table_uses_defaults() {
        let cfg: EngineConfig = serde_json::from_str(r#"{"mode":"respond","min_words":2}"#).unwrap();
        assert_eq!(cfg.mode, Mode::Respond);
        assert_eq!(cfg.min_words, 2);
        assert_eq!(cfg.delay_per_word_ms, 500);
    }
}
