//! Core engine library for Mimic.
//!
//! Learns one Markov chain per chat participant from what they say, keeps the
//! chains in a persistent brain, and can impersonate a chosen participant by
//! answering in their statistical style at a human-ish typing pace.

pub mod atoms;
pub mod engine;

pub use atoms::error::{EngineError, EngineResult};
pub use atoms::types::{InboundMessage, Mode, Participant, ParticipantId};
pub use engine::brain::{BrainStore, MemoryBrain, ReadySignal, SqliteBrain};
pub use engine::config::EngineConfig;
pub use engine::delivery::{MessageSink, RecordingSink};
pub use engine::directory::{MemoryDirectory, UserDirectory};
pub use engine::mimic::{EngineDeps, Handled, MimicEngine};
