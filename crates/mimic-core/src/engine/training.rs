// Mimic Engine — Training pipeline
//
// The only code path that changes what a chain has learned:
//   sender's chain (cache) → train(text) → put back (codec + brain)
// The chain lock is held across train + write-back, so two messages from the
// same participant are applied in arrival order.

use crate::atoms::error::EngineResult;
use crate::atoms::types::ParticipantId;
use crate::engine::addressing::MentionFilter;
use crate::engine::cache::ModelCache;
use log::debug;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrainOutcome {
    Trained,
    /// The operating mode does not train.
    Disabled,
    /// Addressed to the bot: a command, not corpus.
    Addressed,
    /// Rejected by the chain's min_words policy.
    TooShort,
}

pub struct TrainingPipeline {
    enabled: bool,
    cache: Arc<ModelCache>,
    filter: Arc<MentionFilter>,
}

impl TrainingPipeline {
    pub fn new(enabled: bool, cache: Arc<ModelCache>, filter: Arc<MentionFilter>) -> Self {
        TrainingPipeline { enabled, cache, filter }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn on_message(&self, id: &ParticipantId, text: &str) -> EngineResult<TrainOutcome> {
        if !self.enabled {
            return Ok(TrainOutcome::Disabled);
        }
        if self.filter.is_addressed(text) {
            return Ok(TrainOutcome::Addressed);
        }

        let shared = self.cache.get(id)?;
        let mut chain = shared.lock();
        if !chain.train(text) {
            return Ok(TrainOutcome::TooShort);
        }
        self.cache.put(id, &chain)?;
        debug!("[train] Trained {} ({} messages)", id, chain.stats().messages);
        Ok(TrainOutcome::Trained)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::atoms::constants::model_key;
    use crate::engine::brain::{BrainStore, MemoryBrain};
    use crate::engine::markov::ChainOptions;

    fn pipeline(enabled: bool, min_words: usize) -> (TrainingPipeline, Arc<MemoryBrain>) {
        let brain = Arc::new(MemoryBrain::new());
        let cache = Arc::new(ModelCache::new(brain.clone(), ChainOptions { min_words, ..Default::default() }));
        let filter = Arc::new(MentionFilter::new("mimic", None).unwrap());
        (TrainingPipeline::new(enabled, cache, filter), brain)
    }

    #[test]
    fn test_trains_and_writes_back() {
        let (p, brain) = pipeline(true, 1);
        let id = ParticipantId::from("u");
        assert_eq!(p.on_message(&id, "the quick brown fox").unwrap(), TrainOutcome::Trained);
        assert!(brain.get(&model_key("u")).unwrap().is_some());
    }

    #[test]
    fn test_disabled_touches_nothing() {
        let (p, brain) = pipeline(false, 1);
        assert_eq!(p.on_message(&ParticipantId::from("u"), "hello there").unwrap(), TrainOutcome::Disabled);
        assert!(brain.is_empty());
    }

    #[test]
    fn test_addressed_is_not_corpus() {
        let (p, brain) = pipeline(true, 1);
        let outcome = p.on_message(&ParticipantId::from("u"), "mimic: impersonate bob").unwrap();
        assert_eq!(outcome, TrainOutcome::Addressed);
        assert!(brain.is_empty());
    }

    #[test]
    fn test_too_short_is_not_written() {
        let (p, brain) = pipeline(true, 3);
        assert_eq!(p.on_message(&ParticipantId::from("u"), "hi there").unwrap(), TrainOutcome::TooShort);
        assert!(brain.is_empty());
    }
}
