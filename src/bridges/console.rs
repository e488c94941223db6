// Mimic — Console Bridge
//
// Reads chat lines from stdin and prints everything the bot says to stdout.
// Line format: `nick> message`. Lines without a `nick>` prefix are spoken by
// "you". Handy for trying modes and commands without a chat server.

use mimic_core::atoms::types::truncate;
use async_trait::async_trait;
use log::{debug, error, info};
use mimic_core::engine::directory::MemoryDirectory;
use mimic_core::{EngineResult, InboundMessage, MessageSink, MimicEngine, Participant};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

pub const ROOM: &str = "console";
const DEFAULT_NICK: &str = "you";

pub struct ConsoleSink {
    bot_name: String,
}

impl ConsoleSink {
    pub fn new(bot_name: impl Into<String>) -> Self {
        ConsoleSink { bot_name: bot_name.into() }
    }
}

#[async_trait]
impl MessageSink for ConsoleSink {
    async fn send(&self, _room: &str, text: &str) -> EngineResult<()> {
        let mut out = tokio::io::stdout();
        out.write_all(format!("{}> {}\n", self.bot_name, text).as_bytes()).await?;
        out.flush().await?;
        Ok(())
    }
}

/// Split a console line into (nick, text).
pub fn parse_line(line: &str) -> (String, String) {
    match line.split_once("> ") {
        Some((nick, text)) if !nick.trim().is_empty() && !nick.contains(char::is_whitespace) => {
            (nick.trim().to_string(), text.trim().to_string())
        }
        _ => (DEFAULT_NICK.to_string(), line.trim().to_string()),
    }
}

/// Run until stdin closes.
pub async fn run(engine: Arc<MimicEngine>, directory: Arc<MemoryDirectory>) -> EngineResult<()> {
    info!("[console] Reading `nick> message` lines from stdin");
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }
        let (nick, text) = parse_line(&line);
        if text.is_empty() {
            continue;
        }

        let sender = Participant::new(nick.clone(), nick.clone());
        directory.observe(&sender);
        debug!("[console] {}: {}", nick, truncate(&text, 50));

        let msg = InboundMessage::new(ROOM, sender, text);
        match engine.handle(&msg).await {
            Ok(handled) => debug!("[console] {:?}", handled),
            Err(e) => error!("[console] Failed to handle message from {}: {}", nick, e),
        }
    }

    info!("[console] stdin closed");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_line_with_nick() {
        assert_eq!(parse_line("alice> hello there"), ("alice".into(), "hello there".into()));
    }

    #[test]
    fn test_parse_line_without_nick() {
        assert_eq!(parse_line("mimic: impersonate alice"), ("you".into(), "mimic: impersonate alice".into()));
        assert_eq!(parse_line("two words> x"), ("you".into(), "two words> x".into()));
    }
}
