// Offline brain commands: speak, train, inspect.
// These open the SQLite brain directly; run them while the bot is stopped.

use log::info;
use mimic::Settings;
use mimic_core::atoms::constants::{model_key, FALLBACK_SEED, MODEL_KEY_PREFIX};
use mimic_core::engine::addressing::MentionFilter;
use mimic_core::engine::cache::ModelCache;
use mimic_core::engine::codec;
use mimic_core::engine::training::{TrainOutcome, TrainingPipeline};
use mimic_core::{BrainStore, EngineError, EngineResult, ParticipantId, SqliteBrain};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::path::Path;
use std::sync::Arc;

fn open_brain(settings: &Settings) -> EngineResult<Arc<dyn BrainStore>> {
    if settings.store.in_memory {
        return Err(EngineError::Config("offline commands need an on-disk brain (store.in_memory is set)".into()));
    }
    Ok(Arc::new(SqliteBrain::open(settings.store.resolved_path())?))
}

pub fn speak(settings: &Settings, participant: &str, seed_text: &str, seed: Option<u64>) -> EngineResult<()> {
    let cache = ModelCache::new(open_brain(settings)?, settings.engine.chain_options());
    let shared = cache.get(&ParticipantId::from(participant))?;
    let chain = shared.lock();
    if chain.is_empty() {
        return Err(EngineError::Other(format!("no model for {}", participant)));
    }

    let mut rng = match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    };
    let seed_text = if seed_text.trim().is_empty() { FALLBACK_SEED } else { seed_text };
    println!("{}", chain.respond(seed_text, &mut rng));
    Ok(())
}

pub fn train(settings: &Settings, participant: &str, file: &Path) -> EngineResult<()> {
    let text = std::fs::read_to_string(file)?;
    let cache = Arc::new(ModelCache::new(open_brain(settings)?, settings.engine.chain_options()));
    let filter = Arc::new(MentionFilter::new(&settings.bot.name, settings.bot.alias.as_deref())?);
    let pipeline = TrainingPipeline::new(true, cache, filter);
    let id = ParticipantId::from(participant);

    let (mut trained, mut skipped) = (0usize, 0usize);
    for line in text.lines().map(str::trim).filter(|l| !l.is_empty()) {
        match pipeline.on_message(&id, line)? {
            TrainOutcome::Trained => trained += 1,
            _ => skipped += 1,
        }
    }

    info!("[train] {}: {} lines trained, {} skipped", participant, trained, skipped);
    println!("trained {} on {} lines ({} skipped)", participant, trained, skipped);
    Ok(())
}

pub fn inspect(settings: &Settings, participant: Option<&str>) -> EngineResult<()> {
    let brain = open_brain(settings)?;
    let options = settings.engine.chain_options();

    let keys = match participant {
        Some(p) => vec![model_key(p)],
        None => brain.keys_with_prefix(MODEL_KEY_PREFIX)?,
    };
    if keys.is_empty() {
        println!("no stored models");
        return Ok(());
    }

    for key in keys {
        let id = key.strip_prefix(MODEL_KEY_PREFIX).unwrap_or(&key);
        let bytes = brain.get(&key)?;
        let stats = codec::decode(bytes.as_deref(), options).stats();
        let line = serde_json::json!({
            "participant": id,
            "bytes": bytes.as_ref().map(|b| b.len()).unwrap_or(0),
            "stats": stats,
        });
        println!("{}", serde_json::to_string(&line)?);
    }
    Ok(())
}
