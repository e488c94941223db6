// Mimic Engine — per-participant Markov models and the impersonation runtime.
//
// Module layout:
//   markov         — the chain itself (train / respond / stats)
//   codec          — chain ⇄ stored bytes, permissive decode
//   brain          — BrainStore trait, memory + SQLite stores, readiness signal
//   cache          — participant → live chain, lazy load, write-through
//   training       — the only path that mutates a chain
//   addressing     — "addressed to the bot" filter + command parsing
//   directory      — participant lookup (fuzzy name, id)
//   impersonation  — Inactive / Active(id) state machine
//   scheduler      — response gate, generation, typing-delay pacing
//   delivery       — MessageSink trait for outbound text
//   gate           — one-shot startup gate (store ready or timeout)
//   config         — EngineConfig (TOML table + MIMIC_* env)
//   mimic          — MimicEngine facade tying it together

pub mod addressing;
pub mod brain;
pub mod cache;
pub mod codec;
pub mod config;
pub mod delivery;
pub mod directory;
pub mod gate;
pub mod impersonation;
pub mod markov;
pub mod mimic;
pub mod scheduler;
pub mod training;
