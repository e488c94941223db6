// Mimic Engine — Addressed messages & commands
//
// A message is "addressed" when it opens with a mention of the bot:
//   ^@?(name|alias)[:,]?\s     (case-insensitive)
// Addressed messages are commands. They are never trained on and never seed
// a response. The remainder after the mention is parsed into a `Command`,
// which must open the remainder: "mimic: never impersonate bob" is chatter
// aimed at the bot, not a command.

use crate::atoms::error::{EngineError, EngineResult};
use regex::Regex;
use std::sync::OnceLock;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// `impersonate <name>`. The name may be empty ("impersonate " alone).
    Impersonate(String),
    /// `stop impersonating`
    StopImpersonating,
}

pub struct MentionFilter {
    pattern: Regex,
}

impl MentionFilter {
    pub fn new(bot_name: &str, alias: Option<&str>) -> EngineResult<Self> {
        if bot_name.trim().is_empty() {
            return Err(EngineError::Config("bot name must not be empty".into()));
        }
        let mut names = regex::escape(bot_name.trim());
        if let Some(alias) = alias.map(str::trim).filter(|a| !a.is_empty()) {
            names = format!("{}|{}", names, regex::escape(alias));
        }
        let pattern = Regex::new(&format!(r"(?i)^@?(?:{})[:,]?\s", names))
            .map_err(|e| EngineError::Config(format!("mention pattern: {}", e)))?;
        Ok(MentionFilter { pattern })
    }

    pub fn is_addressed(&self, text: &str) -> bool {
        self.pattern.is_match(text)
    }

    /// Text after the mention, or None when not addressed.
    pub fn strip<'a>(&self, text: &'a str) -> Option<&'a str> {
        self.pattern.find(text).map(|m| text[m.end()..].trim())
    }
}

fn stop_pattern() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)^stop impersonating").ok()).as_ref()
}

fn impersonate_pattern() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)^impersonate (\w*)").ok()).as_ref()
}

impl Command {
    /// Parse the body of an addressed message. Unrecognised text → None.
    pub fn parse(body: &str) -> Option<Command> {
        if stop_pattern().is_some_and(|re| re.is_match(body)) {
            return Some(Command::StopImpersonating);
        }
        impersonate_pattern()?
            .captures(body)
            .map(|caps| Command::Impersonate(caps[1].to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filter() -> MentionFilter {
        MentionFilter::new("mimic", Some("bot")).unwrap()
    }

    #[test]
    fn test_addressed_forms() {
        let f = filter();
        assert!(f.is_addressed("mimic impersonate bob"));
        assert!(f.is_addressed("@Mimic: hi"));
        assert!(f.is_addressed("MIMIC, stop impersonating"));
        assert!(f.is_addressed("bot: hello"));
    }

    #[test]
    fn test_not_addressed() {
        let f = filter();
        assert!(!f.is_addressed("mimicry is flattery"));
        assert!(!f.is_addressed("hey mimic what's up"));
        assert!(!f.is_addressed("mimic"));
        assert!(!f.is_addressed("robot: hi"));
    }

    #[test]
    fn test_names_are_escaped() {
        let f = MentionFilter::new("a.b", None).unwrap();
        assert!(f.is_addressed("a.b: hi"));
        assert!(!f.is_addressed("axb: hi"));
        assert!(MentionFilter::new("  ", None).is_err());
    }

    #[test]
    fn test_strip_and_parse() {
        let f = filter();
        let body = f.strip("mimic: impersonate Alice please").unwrap();
        assert_eq!(Command::parse(body), Some(Command::Impersonate("Alice".into())));
        assert_eq!(Command::parse("Stop Impersonating"), Some(Command::StopImpersonating));
        assert_eq!(Command::parse("what time is it"), None);
        assert!(f.strip("plain chatter").is_none());
    }

    #[test]
    fn test_commands_must_lead_the_body() {
        let f = filter();
        let body = f.strip("mimic: don't stop impersonating").unwrap();
        assert_eq!(Command::parse(body), None);
        let body = f.strip("mimic: never impersonate bob").unwrap();
        assert_eq!(Command::parse(body), None);
        let body = f.strip("@mimic, stop impersonating now").unwrap();
        assert_eq!(Command::parse(body), Some(Command::StopImpersonating));
    }
}
