// Mimic — Runtime wiring
//
// brain (memory | SQLite, loaded in the background)
//   → engine (config + mention filter + directory + bridge sink)
//   → startup gate waits for the brain in the background
//   → bridge loop until disconnect, stdin EOF or Ctrl-C

use crate::bridges::console::{self, ConsoleSink};
use crate::bridges::irc::{self, IrcSink};
use crate::settings::{BotSettings, Settings, StoreSettings};
use log::info;
use mimic_core::engine::addressing::MentionFilter;
use mimic_core::{
    BrainStore, EngineDeps, EngineResult, MemoryBrain, MemoryDirectory, MessageSink, MimicEngine, ReadySignal,
    SqliteBrain,
};
use std::sync::Arc;

/// Open the configured brain. SQLite brains load on the blocking pool and
/// raise the returned signal when ready, so this needs a tokio runtime.
pub fn open_brain(store: &StoreSettings) -> (Arc<dyn BrainStore>, ReadySignal) {
    if store.in_memory {
        info!("[mimic] Using an in-memory brain; models will not survive a restart");
        return (Arc::new(MemoryBrain::new()), ReadySignal::ready());
    }
    let brain = Arc::new(SqliteBrain::pending(store.resolved_path()));
    let ready = brain.spawn_load();
    (brain, ready)
}

pub fn build_engine(
    settings: &Settings,
    bot: &BotSettings,
    store: Arc<dyn BrainStore>,
    directory: Arc<MemoryDirectory>,
    sink: Arc<dyn MessageSink>,
) -> EngineResult<MimicEngine> {
    let filter = MentionFilter::new(&bot.name, bot.alias.as_deref())?;
    Ok(MimicEngine::new(settings.engine.clone(), filter, EngineDeps { store, directory, sink }))
}

/// Open the gate in the background once the brain is ready (or timed out).
pub fn spawn_start(engine: &Arc<MimicEngine>, ready: ReadySignal) {
    let engine = Arc::clone(engine);
    tokio::spawn(async move {
        engine.start(ready).await;
    });
}

/// Run the bot on IRC (when enabled and not forced to console) or the console.
pub async fn run(settings: Settings, force_console: bool) -> EngineResult<()> {
    let (store, ready) = open_brain(&settings.store);
    let directory = Arc::new(MemoryDirectory::new());
    let use_irc = settings.irc.enabled && !force_console;

    info!(
        "[mimic] Starting in '{}' mode on {}",
        settings.engine.mode,
        if use_irc { "IRC" } else { "the console" }
    );

    if use_irc {
        let bot = settings.irc.bot_identity(&settings.bot);
        let (sink, outbox) = IrcSink::channel();
        let engine = Arc::new(build_engine(&settings, &bot, store, directory.clone(), Arc::new(sink))?);
        spawn_start(&engine, ready);
        tokio::select! {
            result = irc::run(settings.irc.clone(), engine, directory, outbox) => result,
            _ = tokio::signal::ctrl_c() => {
                info!("[mimic] Interrupted, shutting down");
                Ok(())
            }
        }
    } else {
        let sink = Arc::new(ConsoleSink::new(settings.bot.name.clone()));
        let engine = Arc::new(build_engine(&settings, &settings.bot, store, directory.clone(), sink)?);
        spawn_start(&engine, ready);
        tokio::select! {
            result = console::run(engine, directory) => result,
            _ = tokio::signal::ctrl_c() => {
                info!("[mimic] Interrupted, shutting down");
                Ok(())
            }
        }
    }
}
