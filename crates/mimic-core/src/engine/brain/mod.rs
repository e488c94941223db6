// Mimic Engine — Brain (persistent key/value store)
//
// The engine sees the store only through `BrainStore`: byte values under
// string keys, synchronous get/set. Implementations:
//   memory  — `MemoryBrain`, a HashMap behind a mutex (tests, ephemeral runs)
//   sqlite  — `SqliteBrain`, a single-table SQLite file loaded in the background
//
// Readiness is reported separately through a `ReadySignal` so the startup
// gate can wait on it.

mod sqlite;

pub use sqlite::SqliteBrain;

use crate::atoms::error::EngineResult;
use parking_lot::Mutex;
use std::collections::HashMap;
use tokio::sync::watch;

pub trait BrainStore: Send + Sync {
    /// `Ok(None)` when the key has never been written.
    fn get(&self, key: &str) -> EngineResult<Option<Vec<u8>>>;
    fn set(&self, key: &str, value: &[u8]) -> EngineResult<()>;
    /// Keys starting with `prefix`, sorted.
    fn keys_with_prefix(&self, prefix: &str) -> EngineResult<Vec<String>>;
}

// ── Readiness ──────────────────────────────────────────────────────────

/// One-way "store is loaded" flag.
#[derive(Clone)]
pub struct ReadySignal {
    rx: watch::Receiver<bool>,
}

impl ReadySignal {
    /// A signal paired with the handle that raises it.
    pub fn pair() -> (watch::Sender<bool>, ReadySignal) {
        let (tx, rx) = watch::channel(false);
        (tx, ReadySignal { rx })
    }

    /// A signal that is already raised.
    pub fn ready() -> ReadySignal {
        let (_tx, rx) = watch::channel(true);
        ReadySignal { rx }
    }

    pub fn is_ready(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolves once the store is ready. Never resolves if the store's loader
    /// went away without signalling; the startup timeout covers that case.
    pub async fn wait(mut self) {
        if self.rx.wait_for(|ready| *ready).await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}

// ── In-memory brain ────────────────────────────────────────────────────

#[derive(Default)]
pub struct MemoryBrain {
    data: Mutex<HashMap<String, Vec<u8>>>,
}

impl MemoryBrain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.data.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.lock().is_empty()
    }
}

impl BrainStore for MemoryBrain {
    fn get(&self, key: &str) -> EngineResult<Option<Vec<u8>>> {
        Ok(self.data.lock().get(key).cloned())
    }

    fn set(&self, key: &str, value: &[u8]) -> EngineResult<()> {
        self.data.lock().insert(key.to_string(), value.to_vec());
        Ok(())
    }

    fn keys_with_prefix(&self, prefix: &str) -> EngineResult<Vec<String>> {
        let mut keys: Vec<String> =
            self.data.lock().keys().filter(|k| k.starts_with(prefix)).cloned().collect();
        keys.sort();
        Ok(keys)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_brain_get_set() {
        let brain = MemoryBrain::new();
        assert!(brain.get("k").unwrap().is_none());
        brain.set("k", b"v").unwrap();
        assert_eq!(brain.get("k").unwrap().as_deref(), Some(&b"v"[..]));
        assert_eq!(brain.len(), 1);
    }

    #[test]
    fn test_keys_with_prefix_sorted() {
        let brain = MemoryBrain::new();
        brain.set("impersonateMarkov-b", b"1").unwrap();
        brain.set("other", b"2").unwrap();
        brain.set("impersonateMarkov-a", b"3").unwrap();
        assert_eq!(
            brain.keys_with_prefix("impersonateMarkov-").unwrap(),
            vec!["impersonateMarkov-a", "impersonateMarkov-b"]
        );
    }

    #[tokio::test]
    async fn test_ready_signal() {
        assert!(ReadySignal::ready().is_ready());
        ReadySignal::ready().wait().await;

        let (tx, signal) = ReadySignal::pair();
        assert!(!signal.is_ready());
        let waiter = tokio::spawn(signal.clone().wait());
        tx.send(true).unwrap();
        waiter.await.unwrap();
        assert!(signal.is_ready());
    }
}
