// Mimic — IRC Bridge
//
// Connects to any IRC server via outbound TCP/TLS, joins the configured
// channels and feeds every PRIVMSG into the engine. The sender's nick is the
// participant id, so each nick gets its own chain.
//
// Outbound text (command replies, delayed impersonated responses) is queued
// on an unbounded channel by `IrcSink` and written by the connection loop.

use super::split_message;
use mimic_core::atoms::types::truncate;
use crate::settings::BotSettings;
use async_trait::async_trait;
use log::{debug, error, info, warn};
use mimic_core::{EngineError, EngineResult, InboundMessage, MemoryDirectory, MessageSink, MimicEngine, Participant};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tracing::Instrument;

/// IRC allows 512 bytes per line including the command; leave headroom.
const MAX_LINE_CHARS: usize = 400;

// ── IRC Config ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IrcConfig {
    pub enabled: bool,
    pub server: String,
    pub port: u16,
    pub tls: bool,
    /// Also the name the bot answers to.
    pub nick: String,
    pub password: Option<String>,
    /// Channels to join (e.g. ["#mimic", "#general"])
    pub channels: Vec<String>,
}

impl Default for IrcConfig {
    fn default() -> Self {
        IrcConfig {
            enabled: false,
            server: "irc.libera.chat".into(),
            port: 6697,
            tls: true,
            nick: "mimic".into(),
            password: None,
            channels: vec![],
        }
    }
}

impl IrcConfig {
    pub fn validate(&self) -> EngineResult<()> {
        if self.server.trim().is_empty() || self.nick.trim().is_empty() {
            return Err(EngineError::Config("IRC server and nick are required".into()));
        }
        Ok(())
    }

    /// Bot identity for mention matching: the nick, plus any configured alias.
    pub fn bot_identity(&self, bot: &BotSettings) -> BotSettings {
        BotSettings { name: self.nick.clone(), alias: bot.alias.clone().or_else(|| Some(bot.name.clone())) }
    }
}

// ── Outbound ───────────────────────────────────────────────────────────

pub struct IrcSink {
    tx: mpsc::UnboundedSender<String>,
}

impl IrcSink {
    /// A sink plus the queue the connection loop drains.
    pub fn channel() -> (IrcSink, mpsc::UnboundedReceiver<String>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (IrcSink { tx }, rx)
    }
}

#[async_trait]
impl MessageSink for IrcSink {
    async fn send(&self, room: &str, text: &str) -> EngineResult<()> {
        for line in privmsg_lines(room, text) {
            self.tx
                .send(line)
                .map_err(|_| EngineError::channel("irc", "connection closed"))?;
        }
        Ok(())
    }
}

/// Raw PRIVMSG lines for `text`, split for IRC's line limit.
pub fn privmsg_lines(target: &str, text: &str) -> Vec<String> {
    split_message(text, MAX_LINE_CHARS)
        .iter()
        .flat_map(|chunk| chunk.lines().map(str::to_string).collect::<Vec<_>>())
        .filter(|line| !line.trim().is_empty())
        .map(|line| format!("PRIVMSG {} :{}\r\n", target, line))
        .collect()
}

// ── Connection Loop ────────────────────────────────────────────────────

/// Trait alias for TLS or plain TCP streams.
trait IrcStream: AsyncRead + AsyncWrite + Unpin + Send {}
impl<T: AsyncRead + AsyncWrite + Unpin + Send> IrcStream for T {}

pub async fn run(
    config: IrcConfig,
    engine: Arc<MimicEngine>,
    directory: Arc<MemoryDirectory>,
    outbox: mpsc::UnboundedReceiver<String>,
) -> EngineResult<()> {
    config.validate()?;
    let addr = format!("{}:{}", config.server, config.port);
    let span = tracing::info_span!("irc", server = %addr, nick = %config.nick);
    run_irc_loop(config, engine, directory, outbox).instrument(span).await
}

async fn connect(config: &IrcConfig, addr: &str) -> EngineResult<Box<dyn IrcStream>> {
    let tcp = TcpStream::connect(addr)
        .await
        .map_err(|e| EngineError::channel("irc", format!("TCP connect to {} failed: {}", addr, e)))?;

    if !config.tls {
        warn!("[irc] Connecting WITHOUT TLS to {}; credentials will be sent in plaintext!", addr);
        return Ok(Box::new(tcp));
    }

    info!("[irc] Upgrading to TLS for {}", addr);
    let mut root_store = rustls::RootCertStore::empty();
    root_store.extend(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());

    let tls_config = rustls::ClientConfig::builder()
        .with_root_certificates(root_store)
        .with_no_client_auth();
    let connector = tokio_rustls::TlsConnector::from(Arc::new(tls_config));

    let server_name = rustls::pki_types::ServerName::try_from(config.server.clone())
        .map_err(|e| EngineError::channel("irc", format!("Invalid server name: {}", e)))?;

    let tls_stream = connector
        .connect(server_name, tcp)
        .await
        .map_err(|e| EngineError::channel("irc", format!("TLS handshake with {} failed: {}", addr, e)))?;

    info!("[irc] TLS handshake complete for {}", addr);
    Ok(Box::new(tls_stream))
}

async fn run_irc_loop(
    config: IrcConfig,
    engine: Arc<MimicEngine>,
    directory: Arc<MemoryDirectory>,
    mut outbox: mpsc::UnboundedReceiver<String>,
) -> EngineResult<()> {
    let addr = format!("{}:{}", config.server, config.port);
    let stream = connect(&config, &addr).await?;

    let (reader, mut writer) = tokio::io::split(stream);
    let mut lines = BufReader::new(reader).lines();

    if let Some(ref pass) = config.password {
        writer.write_all(format!("PASS {}\r\n", pass).as_bytes()).await?;
    }
    writer.write_all(format!("NICK {}\r\n", config.nick).as_bytes()).await?;
    writer.write_all(format!("USER {} 0 * :Mimic\r\n", config.nick).as_bytes()).await?;
    info!("[irc] Sent NICK/USER to {}", addr);

    let mut registered = false;

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                let line = line.trim_end();
                if line.is_empty() {
                    continue;
                }

                if let Some(rest) = line.strip_prefix("PING") {
                    writer.write_all(format!("PONG{}\r\n", rest).as_bytes()).await?;
                    continue;
                }

                let parsed = parse_irc_line(line);

                // RPL_WELCOME
                if parsed.command == "001" && !registered {
                    registered = true;
                    info!("[irc] Registered as {}", config.nick);
                    for ch in &config.channels {
                        writer.write_all(format!("JOIN {}\r\n", ch).as_bytes()).await?;
                        info!("[irc] Joining {}", ch);
                    }
                    continue;
                }

                if parsed.command == "PRIVMSG" {
                    if let Some(msg) = inbound_from(&parsed, &config.nick) {
                        directory.observe(&msg.sender);
                        debug!("[irc] {} in {}: {}", msg.sender.name, msg.room, truncate(&msg.text, 50));
                        match engine.handle(&msg).await {
                            Ok(handled) => debug!("[irc] {:?}", handled),
                            Err(e) => error!("[irc] Failed to handle message from {}: {}", msg.sender.id, e),
                        }
                    }
                }
            }
            Some(out) = outbox.recv() => {
                writer.write_all(out.as_bytes()).await?;
            }
        }
    }

    info!("[irc] Disconnected from {}", addr);
    Ok(())
}

/// Turn a parsed PRIVMSG into an engine message. Own messages and empty
/// texts are dropped. DMs reply to the sender, channel messages to the channel.
fn inbound_from(parsed: &IrcParsed, own_nick: &str) -> Option<InboundMessage> {
    let sender_nick = parsed.prefix_nick()?;
    if sender_nick.eq_ignore_ascii_case(own_nick) {
        return None;
    }
    let target = parsed.params.first()?;
    let text = parsed.trailing.clone().unwrap_or_default();
    if text.trim().is_empty() {
        return None;
    }
    let is_channel = target.starts_with('#') || target.starts_with('&');
    let room = if is_channel { target.clone() } else { sender_nick.clone() };
    Some(InboundMessage::new(room, Participant::new(sender_nick.clone(), sender_nick), text))
}

// ── IRC Message Parser ─────────────────────────────────────────────────

#[derive(Debug)]
struct IrcParsed {
    prefix: Option<String>,
    command: String,
    params: Vec<String>,
    trailing: Option<String>,
}

impl IrcParsed {
    fn prefix_nick(&self) -> Option<String> {
        self.prefix.as_ref().map(|p| p.split('!').next().unwrap_or(p).to_string())
    }
}

fn parse_irc_line(line: &str) -> IrcParsed {
    let mut remaining = line;
    let prefix = if let Some(stripped) = remaining.strip_prefix(':') {
        let end = stripped.find(' ').unwrap_or(stripped.len());
        let p = stripped[..end].to_string();
        remaining = stripped[end..].trim_start();
        Some(p)
    } else {
        None
    };

    // Split trailing (after ' :')
    let (main, trailing) = match remaining.find(" :") {
        Some(idx) => (&remaining[..idx], Some(remaining[idx + 2..].to_string())),
        None => (remaining, None),
    };

    let mut parts = main.split_whitespace();
    let command = parts.next().unwrap_or("").to_string();
    let params = parts.map(str::to_string).collect();

    IrcParsed { prefix, command, params, trailing }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_privmsg() {
        let p = parse_irc_line(":alice!a@host PRIVMSG #chat :hello there");
        assert_eq!(p.prefix_nick().as_deref(), Some("alice"));
        assert_eq!(p.command, "PRIVMSG");
        assert_eq!(p.params, vec!["#chat"]);
        assert_eq!(p.trailing.as_deref(), Some("hello there"));
    }

    #[test]
    fn test_parse_numeric_without_prefix_nick() {
        let p = parse_irc_line(":irc.example.net 001 mimic :Welcome");
        assert_eq!(p.command, "001");
        assert_eq!(p.params, vec!["mimic"]);
    }

    #[test]
    fn test_inbound_routing() {
        let channel = parse_irc_line(":bob!b@h PRIVMSG #chat :hi all");
        let msg = inbound_from(&channel, "mimic").unwrap();
        assert_eq!(msg.room, "#chat");
        assert_eq!(msg.sender.id.as_str(), "bob");

        let dm = parse_irc_line(":bob!b@h PRIVMSG mimic :psst");
        assert_eq!(inbound_from(&dm, "mimic").unwrap().room, "bob");

        let own = parse_irc_line(":Mimic!m@h PRIVMSG #chat :echo");
        assert!(inbound_from(&own, "mimic").is_none());
    }

    #[test]
    fn test_privmsg_lines_split_newlines() {
        let lines = privmsg_lines("#chat", "one\ntwo\n\n");
        assert_eq!(lines, vec!["PRIVMSG #chat :one\r\n", "PRIVMSG #chat :two\r\n"]);
    }

    #[tokio::test]
    async fn test_sink_queues_lines() {
        let (sink, mut rx) = IrcSink::channel();
        sink.send("#chat", "hello").await.unwrap();
        assert_eq!(rx.recv().await.as_deref(), Some("PRIVMSG #chat :hello\r\n"));
        drop(rx);
        assert!(sink.send("#chat", "gone").await.is_err());
    }
}
