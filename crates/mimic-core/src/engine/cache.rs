// Mimic Engine — Model Cache
//
// participant id → live chain, populated lazily from the brain on first access
// and kept for the rest of the process (no eviction: the key space is one chat
// community's active members).
//
//   get(id)        hit  → the cached chain, no store read, no decode
//                  miss → store read → codec::decode → insert → return
//   put(id, chain) encode + write-through; the cache already holds the chain
//
// Store errors are returned to the caller untouched. Nothing here retries.

use crate::atoms::constants::model_key;
use crate::atoms::error::EngineResult;
use crate::atoms::types::ParticipantId;
use crate::engine::brain::BrainStore;
use crate::engine::codec;
use crate::engine::markov::{ChainOptions, MarkovChain};
use log::debug;
use parking_lot::Mutex;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// A cached chain. The cache and its callers share the same instance.
pub type SharedChain = Arc<Mutex<MarkovChain>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub entries: usize,
    pub hits: u64,
    pub loads: u64,
    pub writes: u64,
}

pub struct ModelCache {
    store: Arc<dyn BrainStore>,
    options: ChainOptions,
    models: Mutex<HashMap<ParticipantId, SharedChain>>,
    hits: AtomicU64,
    loads: AtomicU64,
    writes: AtomicU64,
}

impl ModelCache {
    pub fn new(store: Arc<dyn BrainStore>, options: ChainOptions) -> Self {
        ModelCache {
            store,
            options,
            models: Mutex::new(HashMap::new()),
            hits: AtomicU64::new(0),
            loads: AtomicU64::new(0),
            writes: AtomicU64::new(0),
        }
    }

    pub fn store(&self) -> &Arc<dyn BrainStore> {
        &self.store
    }

    pub fn get(&self, id: &ParticipantId) -> EngineResult<SharedChain> {
        if let Some(chain) = self.models.lock().get(id) {
            self.hits.fetch_add(1, Ordering::Relaxed);
            return Ok(Arc::clone(chain));
        }

        let key = model_key(id.as_str());
        let bytes = self.store.get(&key)?;
        let chain = codec::decode(bytes.as_deref(), self.options);
        self.loads.fetch_add(1, Ordering::Relaxed);
        debug!(
            "[cache] Loaded model for {} ({} stored bytes, {} messages)",
            id,
            bytes.as_ref().map(|b| b.len()).unwrap_or(0),
            chain.stats().messages
        );

        let mut models = self.models.lock();
        let entry = models.entry(id.clone()).or_insert_with(|| Arc::new(Mutex::new(chain)));
        Ok(Arc::clone(entry))
    }

    /// Encode `chain` and write it to the participant's record.
    pub fn put(&self, id: &ParticipantId, chain: &MarkovChain) -> EngineResult<()> {
        let payload = codec::encode(chain)?;
        self.store.set(&model_key(id.as_str()), &payload)?;
        self.writes.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    pub fn is_cached(&self, id: &ParticipantId) -> bool {
        self.models.lock().contains_key(id)
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            entries: self.models.lock().len(),
            hits: self.hits.load(Ordering::Relaxed),
            loads: self.loads.load(Ordering::Relaxed),
            writes: self.writes.load(Ordering::Relaxed),
        }
    }
}
