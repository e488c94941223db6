//! Mimic — a chat bot that learns how everyone talks and can impersonate them.
//!
//! This crate hosts the chat-side plumbing (settings, IRC and console
//! bridges, runtime wiring). The model lifecycle engine lives in
//! `mimic-core`.

pub mod bridges;
pub mod runtime;
pub mod settings;

pub use mimic_core;
pub use settings::Settings;

use tracing_subscriber::EnvFilter;

/// Install a `tracing` fmt subscriber (RUST_LOG-style filter, default
/// `info`). Its `log` bridge picks up the engine's `log` records too.
/// Safe to call more than once.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).with_target(false).try_init();
}
