// Mimic Engine — Markov Chain
//
// Word-level, bidirectional first-order chain. Each trained message adds:
//   - one start count for its first word and one end count for its last word
//   - forward (word → next) and backward (word → previous) transition counts
//
// Responses grow outward from a pivot word taken from the seed text: backward
// until a start is chosen, forward until an end is chosen. All maps are
// ordered so that generation with a seeded RNG is reproducible, including
// after an encode/decode round-trip.

use crate::atoms::constants::MAX_RESPONSE_WORDS;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

type Counts = BTreeMap<String, u64>;
type Links = BTreeMap<String, Counts>;

/// Tokenization and generation policy. Comes from process configuration,
/// never from the persisted payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChainOptions {
    pub min_words: usize,
    pub case_sensitive: bool,
    pub strip_punctuation: bool,
    pub max_response_words: usize,
}

impl Default for ChainOptions {
    fn default() -> Self {
        ChainOptions {
            min_words: 1,
            case_sensitive: false,
            strip_punctuation: false,
            max_response_words: MAX_RESPONSE_WORDS,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ChainStats {
    pub vocabulary: usize,
    pub transitions: usize,
    pub messages: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MarkovChain {
    #[serde(skip)]
    options: ChainOptions,
    #[serde(default)]
    starts: Counts,
    #[serde(default)]
    ends: Counts,
    #[serde(default)]
    forward: Links,
    #[serde(default)]
    backward: Links,
    #[serde(default)]
    messages: u64,
}

impl MarkovChain {
    pub fn new(options: ChainOptions) -> Self {
        MarkovChain { options, ..Default::default() }
    }

    /// Re-attach process options to a chain decoded from storage.
    pub fn with_options(mut self, options: ChainOptions) -> Self {
        self.options = options;
        self
    }

    pub fn options(&self) -> ChainOptions {
        self.options
    }

    pub fn is_empty(&self) -> bool {
        self.ends.is_empty()
    }

    pub fn stats(&self) -> ChainStats {
        let mut vocabulary: Vec<&String> = self.forward.keys().chain(self.ends.keys()).collect();
        vocabulary.sort();
        vocabulary.dedup();
        ChainStats {
            vocabulary: vocabulary.len(),
            transitions: self.forward.values().map(|next| next.len()).sum(),
            messages: self.messages,
        }
    }

    /// Split text into normalized tokens according to the chain options.
    pub fn tokenize(&self, text: &str) -> Vec<String> {
        text.split_whitespace()
            .filter_map(|raw| {
                let word = if self.options.strip_punctuation {
                    raw.trim_matches(|c: char| c.is_ascii_punctuation())
                } else {
                    raw
                };
                if word.is_empty() {
                    return None;
                }
                Some(if self.options.case_sensitive { word.to_string() } else { word.to_lowercase() })
            })
            .collect()
    }

    /// Learn from one message. Returns false when the message is below min_words.
    pub fn train(&mut self, text: &str) -> bool {
        let tokens = self.tokenize(text);
        if tokens.is_empty() || tokens.len() < self.options.min_words {
            return false;
        }

        bump(&mut self.starts, &tokens[0]);
        bump(&mut self.ends, &tokens[tokens.len() - 1]);
        for pair in tokens.windows(2) {
            bump(self.forward.entry(pair[0].clone()).or_default(), &pair[1]);
            bump(self.backward.entry(pair[1].clone()).or_default(), &pair[0]);
        }
        self.messages += 1;
        true
    }

    /// Generate a response seeded by `seed`. Empty chain → empty string.
    pub fn respond<R: Rng + ?Sized>(&self, seed: &str, rng: &mut R) -> String {
        if self.is_empty() {
            return String::new();
        }

        let known: Vec<String> = self.tokenize(seed).into_iter().filter(|t| self.knows(t)).collect();
        let pivot = if known.is_empty() {
            pick_weighted(&self.starts, rng)
        } else {
            Some(known[rng.random_range(0..known.len())].clone())
        };
        let Some(pivot) = pivot else {
            return String::new();
        };

        let max = self.options.max_response_words.max(1);

        let mut words = Vec::new();
        let mut cur = pivot.clone();
        while words.len() + 1 < max {
            match step(&self.backward, &self.starts, &cur, rng) {
                Some(prev) => {
                    words.push(prev.clone());
                    cur = prev;
                }
                None => break,
            }
        }
        words.reverse();
        words.push(pivot.clone());

        let mut cur = pivot;
        while words.len() < max {
            match step(&self.forward, &self.ends, &cur, rng) {
                Some(next) => {
                    words.push(next.clone());
                    cur = next;
                }
                None => break,
            }
        }

        words.join(" ")
    }

    fn knows(&self, word: &str) -> bool {
        self.forward.contains_key(word) || self.ends.contains_key(word)
    }
}

fn bump(counts: &mut Counts, word: &str) {
    let slot = counts.entry(word.to_string()).or_insert(0);
    *slot = slot.saturating_add(1);
}

fn pick_weighted<R: Rng + ?Sized>(counts: &Counts, rng: &mut R) -> Option<String> {
    let total: u64 = counts.values().sum();
    if total == 0 {
        return None;
    }
    let mut roll = rng.random_range(0..total);
    for (word, &count) in counts {
        if roll < count {
            return Some(word.clone());
        }
        roll -= count;
    }
    None
}

/// Next word out of `word`, or None when the terminal (start/end) weight wins.
fn step<R: Rng + ?Sized>(links: &Links, terminals: &Counts, word: &str, rng: &mut R) -> Option<String> {
    let stop = terminals.get(word).copied().unwrap_or(0);
    let next = links.get(word);
    let total = stop + next.map(|n| n.values().sum::<u64>()).unwrap_or(0);
    if total == 0 {
        return None;
    }
    let mut roll = rng.random_range(0..total);
    if roll < stop {
        return None;
    }
    roll -= stop;
    for (candidate, &count) in next? {
        if roll < count {
            return Some(candidate.clone());
        }
        roll -= count;
    }
    None
}
