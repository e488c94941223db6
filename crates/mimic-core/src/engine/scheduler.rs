// Mimic Engine — Response scheduler
//
// For each eligible inbound message while impersonating:
//   1. gate      — decide whether to speak at all (GatePolicy)
//   2. compose   — generate from the target's chain, seeded by the message
//   3. pace      — delay = per-word × words, jittered uniformly in
//                  [0.75 × base, 1.25 × base]
//   4. dispatch  — independent tokio task: sleep, then send
//
// Dispatched deliveries are not cancelled by later state changes: stopping
// impersonation does not recall a response that is already "being typed".

use crate::atoms::constants::{DELAY_JITTER_HIGH, DELAY_JITTER_LOW, FALLBACK_SEED, GATE_DRAW_RANGE};
use crate::atoms::types::{word_count, ParticipantId};
use crate::engine::config::EngineConfig;
use crate::engine::delivery::MessageSink;
use crate::engine::markov::MarkovChain;
use log::{debug, warn};
use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

/// Whether a given message gets a response.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GatePolicy {
    /// Two uniform draws from `0..range`; speak iff the first is larger.
    /// Ties lose, so the pass rate is (range − 1) / (2 × range), just under ½.
    DrawPair { range: u32 },
    /// Speak with a fixed probability.
    Probability(f64),
    Always,
    Never,
}

impl Default for GatePolicy {
    fn default() -> Self {
        GatePolicy::DrawPair { range: GATE_DRAW_RANGE }
    }
}

impl GatePolicy {
    pub fn from_config(config: &EngineConfig) -> Self {
        match config.response_probability {
            Some(p) => GatePolicy::Probability(p),
            None => GatePolicy::default(),
        }
    }

    pub fn passes<R: Rng + ?Sized>(&self, rng: &mut R) -> bool {
        match *self {
            GatePolicy::DrawPair { range } => {
                let range = range.max(1);
                let first = rng.random_range(0..range);
                let second = rng.random_range(0..range);
                first > second
            }
            GatePolicy::Probability(p) => rng.random_bool(p.clamp(0.0, 1.0)),
            GatePolicy::Always => true,
            GatePolicy::Never => false,
        }
    }
}

/// Inclusive bounds of `compute_delay` for a response of `words` words.
pub fn delay_bounds(per_word: Duration, words: usize) -> (Duration, Duration) {
    let base = base_delay(per_word, words);
    (base.mul_f64(DELAY_JITTER_LOW), base.mul_f64(DELAY_JITTER_HIGH))
}

/// Typing delay for a response of `words` words.
pub fn compute_delay<R: Rng + ?Sized>(per_word: Duration, words: usize, rng: &mut R) -> Duration {
    let base = base_delay(per_word, words);
    if base.is_zero() {
        return Duration::ZERO;
    }
    base.mul_f64(rng.random_range(DELAY_JITTER_LOW..=DELAY_JITTER_HIGH))
}

fn base_delay(per_word: Duration, words: usize) -> Duration {
    per_word.saturating_mul(u32::try_from(words).unwrap_or(u32::MAX))
}

/// A generated response waiting for its delay to elapse.
#[derive(Debug, Clone, PartialEq)]
pub struct ScheduledResponse {
    pub room: String,
    /// Whose chain produced the text.
    pub participant: ParticipantId,
    pub text: String,
    pub delay: Duration,
}

impl ScheduledResponse {
    pub fn word_count(&self) -> usize {
        word_count(&self.text)
    }
}

pub struct ResponseScheduler {
    policy: GatePolicy,
    per_word: Duration,
    rng: Mutex<StdRng>,
}

impl ResponseScheduler {
    pub fn new(policy: GatePolicy, per_word: Duration, rng: StdRng) -> Self {
        ResponseScheduler { policy, per_word, rng: Mutex::new(rng) }
    }

    pub fn from_config(config: &EngineConfig) -> Self {
        Self::new(GatePolicy::from_config(config), config.delay_per_word(), StdRng::from_os_rng())
    }

    pub fn policy(&self) -> GatePolicy {
        self.policy
    }

    pub fn per_word(&self) -> Duration {
        self.per_word
    }

    pub fn roll_gate(&self) -> bool {
        self.policy.passes(&mut *self.rng.lock())
    }

    /// Generate and pace a response. None when the chain has nothing to say.
    pub fn compose(
        &self,
        chain: &MarkovChain,
        seed_text: &str,
        participant: &ParticipantId,
        room: &str,
    ) -> Option<ScheduledResponse> {
        let seed = if seed_text.trim().is_empty() { FALLBACK_SEED } else { seed_text };
        let mut rng = self.rng.lock();
        let text = chain.respond(seed, &mut *rng);
        if text.trim().is_empty() {
            debug!("[scheduler] Model for {} has nothing to say yet", participant);
            return None;
        }
        let delay = compute_delay(self.per_word, word_count(&text), &mut *rng);
        Some(ScheduledResponse {
            room: room.to_string(),
            participant: participant.clone(),
            text,
            delay,
        })
    }

    /// Deliver `response` after its delay on an independent task.
    pub fn dispatch(response: ScheduledResponse, sink: Arc<dyn MessageSink>) -> JoinHandle<()> {
        tokio::spawn(async move {
            tokio::time::sleep(response.delay).await;
            if let Err(e) = sink.send(&response.room, &response.text).await {
                warn!("[scheduler] Delivery to {} failed: {}", response.room, e);
            }
        })
    }
}
