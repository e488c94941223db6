// ── Mimic Atoms: Constants ─────────────────────────────────────────────────
// All named constants for the engine live here.

use std::time::Duration;

// ── Persistent store keys ──────────────────────────────────────────────────
// Stored model payloads are keyed on this prefix followed by the participant
// id. Existing brains become unreachable if it changes. Treat as stable.
pub const MODEL_KEY_PREFIX: &str = "impersonateMarkov-";

/// Build the store key for a participant's model.
pub fn model_key(participant_id: &str) -> String {
    format!("{}{}", MODEL_KEY_PREFIX, participant_id)
}

// ── Response pacing ────────────────────────────────────────────────────────
/// Simulated typing time per generated word.
pub const RESPONSE_DELAY_PER_WORD: Duration = Duration::from_millis(500);
/// Lower jitter bound as a fraction of the base delay.
pub const DELAY_JITTER_LOW: f64 = 0.75;
/// Upper jitter bound as a fraction of the base delay (inclusive).
pub const DELAY_JITTER_HIGH: f64 = 1.25;

// ── Response gate ──────────────────────────────────────────────────────────
/// Exclusive upper bound of the two uniform draws compared by the default gate.
pub const GATE_DRAW_RANGE: u32 = 100;

// ── Generation ─────────────────────────────────────────────────────────────
/// Hard cap on words per generated response.
pub const MAX_RESPONSE_WORDS: usize = 30;
/// Seed used when the triggering message has no usable text.
pub const FALLBACK_SEED: &str = "hello";

// ── Startup ────────────────────────────────────────────────────────────────
pub const DEFAULT_INIT_TIMEOUT: Duration = Duration::from_millis(10_000);

// ── Codec ──────────────────────────────────────────────────────────────────
/// Payload format version written by `codec::encode`.
pub const CODEC_VERSION: u32 = 1;
