// ── Mimic Atoms: Shared Types ──────────────────────────────────────────────

use serde::{Deserialize, Serialize};
use std::fmt;

/// Stable, opaque participant identifier (IRC nick, chat user id, …).
/// The engine only ever uses it as a cache and storage key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParticipantId(pub String);

impl ParticipantId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ParticipantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ParticipantId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// A chat community member as known to the user directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participant {
    pub id: ParticipantId,
    pub name: String,
}

impl Participant {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self { id: ParticipantId::new(id), name: name.into() }
    }
}

/// Operating mode: which of the train / respond paths are active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    #[default]
    Train,
    Respond,
    TrainRespond,
}

impl Mode {
    pub fn trains(self) -> bool {
        matches!(self, Mode::Train | Mode::TrainRespond)
    }

    pub fn responds(self) -> bool {
        matches!(self, Mode::Respond | Mode::TrainRespond)
    }

    /// Parse a mode string. Unknown values yield `None`; callers decide the fallback.
    pub fn parse(s: &str) -> Option<Mode> {
        match s.trim().to_ascii_lowercase().as_str() {
            "train" => Some(Mode::Train),
            "respond" => Some(Mode::Respond),
            "train_respond" => Some(Mode::TrainRespond),
            _ => None,
        }
    }
}

/// Unknown mode strings deserialize to the default mode instead of failing.
impl<'de> Deserialize<'de> for Mode {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(Mode::parse(&raw).unwrap_or_default())
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Mode::Train => "train",
            Mode::Respond => "respond",
            Mode::TrainRespond => "train_respond",
        })
    }
}

/// One inbound chat message as delivered by a bridge.
#[derive(Debug, Clone)]
pub struct InboundMessage {
    /// Where replies go (channel name, DM target, "console", …).
    pub room: String,
    pub sender: Participant,
    pub text: String,
}

impl InboundMessage {
    pub fn new(room: impl Into<String>, sender: Participant, text: impl Into<String>) -> Self {
        Self { room: room.into(), sender, text: text.into() }
    }
}

/// Count whitespace-separated words.
pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

/// First `max` characters of `text`, with an ellipsis when cut. For logs.
pub fn truncate(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_gates() {
        assert!(Mode::Train.trains());
        assert!(!Mode::Train.responds());
        assert!(!Mode::Respond.trains());
        assert!(Mode::Respond.responds());
        assert!(Mode::TrainRespond.trains() && Mode::TrainRespond.responds());
    }

    #[test]
    fn test_mode_parse() {
        assert_eq!(Mode::parse("TRAIN_respond"), Some(Mode::TrainRespond));
        assert_eq!(Mode::parse(" respond "), Some(Mode::Respond));
        assert_eq!(Mode::parse("shout"), None);
        assert_eq!(Mode::TrainRespond.to_string(), "train_respond");
    }

    #[test]
    fn test_mode_deserialize_is_lenient() {
        let mode: Mode = serde_json::from_str(r#""respond""#).unwrap();
        assert_eq!(mode, Mode::Respond);
        let mode: Mode = serde_json::from_str(r#""bogus""#).unwrap();
        assert_eq!(mode, Mode::Train);
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 50), "short");
        assert_eq!(truncate("abcdef", 3), "abc...");
        assert_eq!(truncate("ééééé", 2), "éé...");
    }

    #[test]
    fn test_word_count() {
        assert_eq!(word_count("the quick  brown\tfox"), 4);
        assert_eq!(word_count("   "), 0);
    }
}
