// SQLite-backed brain. One table, blob values:
//   brain(key TEXT PRIMARY KEY, value BLOB NOT NULL, updated_at TEXT NOT NULL)
//
// The connection is opened lazily (`load`, or `spawn_load` on the blocking
// pool). Until then every operation fails with a store error: a cold read
// must never look like "no record", or the cache would hold an empty chain
// and later write it over the stored one.

use super::{BrainStore, ReadySignal};
use crate::atoms::error::{EngineError, EngineResult};
use log::{error, info};
use parking_lot::Mutex;
use rusqlite::{params, Connection};
use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};

pub struct SqliteBrain {
    path: Option<PathBuf>,
    conn: OnceLock<Mutex<Connection>>,
}

impl SqliteBrain {
    /// A brain for `path` that has not been loaded yet.
    pub fn pending(path: impl AsRef<Path>) -> Self {
        SqliteBrain { path: Some(path.as_ref().to_path_buf()), conn: OnceLock::new() }
    }

    /// Open (or create) the database synchronously.
    pub fn open(path: impl AsRef<Path>) -> EngineResult<Self> {
        let brain = Self::pending(path);
        brain.load()?;
        Ok(brain)
    }

    /// A loaded, private in-memory database.
    pub fn open_in_memory() -> EngineResult<Self> {
        let brain = SqliteBrain { path: None, conn: OnceLock::new() };
        brain.load()?;
        Ok(brain)
    }

    pub fn is_loaded(&self) -> bool {
        self.conn.get().is_some()
    }

    /// Open the connection and create the schema. Idempotent.
    pub fn load(&self) -> EngineResult<()> {
        if self.is_loaded() {
            return Ok(());
        }

        let conn = match &self.path {
            Some(path) => {
                info!("[brain] Opening brain at {:?}", path);
                if let Some(parent) = path.parent() {
                    if !parent.as_os_str().is_empty() {
                        std::fs::create_dir_all(parent)?;
                    }
                }
                let conn = Connection::open(path)?;
                conn.execute_batch("PRAGMA journal_mode=WAL;").ok();
                conn
            }
            None => Connection::open_in_memory()?,
        };

        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS brain (
                key TEXT PRIMARY KEY,
                value BLOB NOT NULL,
                updated_at TEXT NOT NULL
            );",
        )?;

        // A concurrent loader may have won; its connection is equivalent.
        let _ = self.conn.set(Mutex::new(conn));
        Ok(())
    }

    /// Load on the blocking pool and raise the returned signal when done.
    /// On failure the signal is never raised; the startup timeout takes over.
    pub fn spawn_load(self: &Arc<Self>) -> ReadySignal {
        let (tx, signal) = ReadySignal::pair();
        let brain = Arc::clone(self);
        tokio::task::spawn_blocking(move || match brain.load() {
            Ok(()) => {
                let _ = tx.send(true);
            }
            Err(e) => error!("[brain] Failed to load brain: {}", e),
        });
        signal
    }

    fn conn(&self, key: &str) -> EngineResult<&Mutex<Connection>> {
        self.conn.get().ok_or_else(|| EngineError::store(key, "brain not loaded"))
    }
}

impl BrainStore for SqliteBrain {
    fn get(&self, key: &str) -> EngineResult<Option<Vec<u8>>> {
        let conn = self.conn(key)?.lock();
        let result = conn.query_row(
            "SELECT value FROM brain WHERE key = ?1",
            params![key],
            |row| row.get::<_, Vec<u8>>(0),
        );
        match result {
            Ok(value) => Ok(Some(value)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(EngineError::store(key, format!("read failed: {}", e))),
        }
    }

    fn set(&self, key: &str, value: &[u8]) -> EngineResult<()> {
        let conn = self.conn(key)?.lock();
        conn.execute(
            "INSERT OR REPLACE INTO brain (key, value, updated_at) VALUES (?1, ?2, ?3)",
            params![key, value, chrono::Utc::now().to_rfc3339()],
        )
        .map_err(|e| EngineError::store(key, format!("write failed: {}", e)))?;
        Ok(())
    }

    fn keys_with_prefix(&self, prefix: &str) -> EngineResult<Vec<String>> {
        let conn = self.conn(prefix)?.lock();
        let mut stmt = conn.prepare("SELECT key FROM brain WHERE substr(key, 1, ?2) = ?1 ORDER BY key")?;
        let keys = stmt
            .query_map(params![prefix, prefix.chars().count() as i64], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(keys)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_in_memory_round_trip() {
        let brain = SqliteBrain::open_in_memory().unwrap();
        assert!(brain.get("impersonateMarkov-1").unwrap().is_none());
        brain.set("impersonateMarkov-1", b"payload").unwrap();
        brain.set("impersonateMarkov-1", b"updated").unwrap();
        assert_eq!(brain.get("impersonateMarkov-1").unwrap().as_deref(), Some(&b"updated"[..]));
    }

    #[test]
    fn test_unloaded_brain_refuses_everything() {
        let brain = SqliteBrain::pending(std::env::temp_dir().join("mimic-never-opened.db"));
        assert!(!brain.is_loaded());
        assert!(matches!(brain.get("k").unwrap_err(), EngineError::Store { .. }));
        assert!(matches!(brain.keys_with_prefix("").unwrap_err(), EngineError::Store { .. }));
        assert!(matches!(brain.set("k", b"v").unwrap_err(), EngineError::Store { .. }));
    }

    #[test]
    fn test_prefix_listing() {
        let brain = SqliteBrain::open_in_memory().unwrap();
        brain.set("impersonateMarkov-zed", b"1").unwrap();
        brain.set("impersonateMarkov-amy", b"2").unwrap();
        brain.set("unrelated", b"3").unwrap();
        assert_eq!(
            brain.keys_with_prefix("impersonateMarkov-").unwrap(),
            vec!["impersonateMarkov-amy", "impersonateMarkov-zed"]
        );
    }

    #[test]
    fn test_file_brain_persists_across_opens() {
        let path = std::env::temp_dir().join(format!("mimic-brain-{}.db", std::process::id()));
        let _ = std::fs::remove_file(&path);
        {
            let brain = SqliteBrain::open(&path).unwrap();
            brain.set("impersonateMarkov-7", b"kept").unwrap();
        }
        let brain = SqliteBrain::open(&path).unwrap();
        assert_eq!(brain.get("impersonateMarkov-7").unwrap().as_deref(), Some(&b"kept"[..]));
        let _ = std::fs::remove_file(&path);
    }

    #[tokio::test]
    async fn test_spawn_load_raises_signal() {
        let path = std::env::temp_dir().join(format!("mimic-brain-spawn-{}.db", std::process::id()));
        let _ = std::fs::remove_file(&path);
        let brain = Arc::new(SqliteBrain::pending(&path));
        brain.spawn_load().wait().await;
        assert!(brain.is_loaded());
        let _ = std::fs::remove_file(&path);
    }
}
