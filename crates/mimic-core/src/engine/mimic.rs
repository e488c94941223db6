// Mimic Engine — Facade
//
// Per inbound message:
//   gate closed?                  → Dormant
//   addressed to the bot?         → command (impersonate / stop), reply via sink
//   fewer than min_words words?   → TooShort (no training, no response)
//   otherwise                     → train sender (if mode trains), then maybe
//                                   schedule a response from the target's chain
//
// Messages are expected one at a time from a bridge; cache, codec and
// training work happen inline. Only response delivery is deferred.

use crate::atoms::error::EngineResult;
use crate::atoms::types::{truncate, word_count, InboundMessage};
use crate::engine::addressing::{Command, MentionFilter};
use crate::engine::brain::{BrainStore, ReadySignal};
use crate::engine::cache::ModelCache;
use crate::engine::config::EngineConfig;
use crate::engine::delivery::MessageSink;
use crate::engine::directory::UserDirectory;
use crate::engine::gate::{Activation, StartupGate};
use crate::engine::impersonation::{ImpersonationController, ImpersonationState};
use crate::engine::scheduler::{ResponseScheduler, ScheduledResponse};
use crate::engine::training::{TrainOutcome, TrainingPipeline};
use log::debug;
use parking_lot::Mutex;
use std::sync::Arc;

/// External collaborators supplied by the host.
pub struct EngineDeps {
    pub store: Arc<dyn BrainStore>,
    pub directory: Arc<dyn UserDirectory>,
    pub sink: Arc<dyn MessageSink>,
}

/// What the engine did with one message.
#[derive(Debug, Clone, PartialEq)]
pub enum Handled {
    /// Startup gate still closed; the message was dropped.
    Dormant,
    Command { command: Command, reply: Option<String> },
    /// Addressed to the bot but not a command we know.
    UnknownCommand,
    TooShort,
    Chatter { trained: bool, response: Option<ScheduledResponse> },
}

pub struct MimicEngine {
    config: EngineConfig,
    gate: Arc<StartupGate>,
    filter: Arc<MentionFilter>,
    cache: Arc<ModelCache>,
    training: TrainingPipeline,
    controller: Mutex<ImpersonationController>,
    scheduler: ResponseScheduler,
    directory: Arc<dyn UserDirectory>,
    sink: Arc<dyn MessageSink>,
}

impl MimicEngine {
    pub fn new(config: EngineConfig, filter: MentionFilter, deps: EngineDeps) -> Self {
        let filter = Arc::new(filter);
        let cache = Arc::new(ModelCache::new(deps.store, config.chain_options()));
        let training = TrainingPipeline::new(config.mode.trains(), cache.clone(), filter.clone());
        MimicEngine {
            controller: Mutex::new(ImpersonationController::new(config.mode)),
            scheduler: ResponseScheduler::from_config(&config),
            gate: Arc::new(StartupGate::new()),
            directory: deps.directory,
            sink: deps.sink,
            config,
            filter,
            cache,
            training,
        }
    }

    /// Replace the scheduler (fixed gate policy or seeded RNG).
    pub fn with_scheduler(mut self, scheduler: ResponseScheduler) -> Self {
        self.scheduler = scheduler;
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn gate(&self) -> &Arc<StartupGate> {
        &self.gate
    }

    pub fn cache(&self) -> &ModelCache {
        &self.cache
    }

    pub fn scheduler(&self) -> &ResponseScheduler {
        &self.scheduler
    }

    pub fn state(&self) -> ImpersonationState {
        self.controller.lock().state().clone()
    }

    /// Wait for the brain (bounded by init_timeout) and open the gate.
    pub async fn start(&self, ready: ReadySignal) -> Activation {
        self.gate.run(ready, self.config.init_timeout()).await
    }

    pub async fn handle(&self, msg: &InboundMessage) -> EngineResult<Handled> {
        if !self.gate.is_active() {
            debug!("[engine] Dropping message from {}: not active yet", msg.sender.id);
            return Ok(Handled::Dormant);
        }

        if let Some(body) = self.filter.strip(&msg.text) {
            return self.handle_command(msg, body).await;
        }

        if word_count(&msg.text) < self.config.min_words {
            return Ok(Handled::TooShort);
        }

        let trained = self.training.on_message(&msg.sender.id, &msg.text)? == TrainOutcome::Trained;

        let target = {
            let controller = self.controller.lock();
            if controller.should_respond() {
                controller.target().cloned()
            } else {
                None
            }
        };

        let response = match target {
            Some(target) if self.scheduler.roll_gate() => {
                let chain = self.cache.get(&target)?;
                let planned = self.scheduler.compose(&chain.lock(), &msg.text, &target, &msg.room);
                if let Some(response) = &planned {
                    debug!(
                        "[engine] Responding as {} in {:?}: {}",
                        target,
                        response.delay,
                        truncate(&response.text, 50)
                    );
                    ResponseScheduler::dispatch(response.clone(), self.sink.clone());
                }
                planned
            }
            _ => None,
        };

        Ok(Handled::Chatter { trained, response })
    }

    async fn handle_command(&self, msg: &InboundMessage, body: &str) -> EngineResult<Handled> {
        let Some(command) = Command::parse(body) else {
            debug!("[engine] Unrecognised command from {}: {}", msg.sender.id, truncate(body, 50));
            return Ok(Handled::UnknownCommand);
        };

        let reply = {
            let mut controller = self.controller.lock();
            match &command {
                Command::Impersonate(name) => controller.impersonate(name, self.directory.as_ref()),
                Command::StopImpersonating => Some(controller.stop(self.directory.as_ref())),
            }
        };

        if let Some(text) = &reply {
            self.sink.send(&msg.room, text).await?;
        }
        Ok(Handled::Command { command, reply })
    }
}
