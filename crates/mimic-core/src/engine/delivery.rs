// Mimic Engine — Outbound delivery
//
// Everything the engine says (command replies and impersonated responses)
// goes out through a `MessageSink` provided by the bridge.

use crate::atoms::error::EngineResult;
use async_trait::async_trait;
use parking_lot::Mutex;

#[async_trait]
pub trait MessageSink: Send + Sync {
    async fn send(&self, room: &str, text: &str) -> EngineResult<()>;
}

/// Sink that keeps every delivery in memory, in delivery order.
#[derive(Default)]
pub struct RecordingSink {
    sent: Mutex<Vec<(String, String)>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// (room, text) pairs delivered so far.
    pub fn sent(&self) -> Vec<(String, String)> {
        self.sent.lock().clone()
    }

    pub fn texts(&self) -> Vec<String> {
        self.sent.lock().iter().map(|(_, text)| text.clone()).collect()
    }
}

#[async_trait]
impl MessageSink for RecordingSink {
    async fn send(&self, room: &str, text: &str) -> EngineResult<()> {
        self.sent.lock().push((room.to_string(), text.to_string()));
        Ok(())
    }
}
