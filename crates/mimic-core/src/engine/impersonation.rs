// Mimic Engine — Impersonation controller
//
//   Inactive ──impersonate <name>──▶ Active(id)      (mode must respond,
//      ▲                                │              name must resolve)
//      └────────stop impersonating──────┘
//
// Only the two commands move the state. Nothing expires, and the state lives
// for the process only (it is never written to the brain).

use crate::atoms::types::{Mode, ParticipantId};
use crate::engine::directory::UserDirectory;
use log::{debug, info};

pub const REFUSAL: &str = "Wat.";

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ImpersonationState {
    #[default]
    Inactive,
    Active(ParticipantId),
}

#[derive(Debug)]
pub struct ImpersonationController {
    mode: Mode,
    state: ImpersonationState,
}

impl ImpersonationController {
    pub fn new(mode: Mode) -> Self {
        ImpersonationController { mode, state: ImpersonationState::Inactive }
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn state(&self) -> &ImpersonationState {
        &self.state
    }

    pub fn target(&self) -> Option<&ParticipantId> {
        match &self.state {
            ImpersonationState::Active(id) => Some(id),
            ImpersonationState::Inactive => None,
        }
    }

    pub fn should_train(&self) -> bool {
        self.mode.trains()
    }

    pub fn should_respond(&self) -> bool {
        self.mode.responds() && self.target().is_some()
    }

    /// Handle `impersonate <name>`. Returns the reply, or None when the mode
    /// does not respond at all (the command is ignored silently).
    /// While already active, a successful lookup switches the target.
    pub fn impersonate(&mut self, name: &str, directory: &dyn UserDirectory) -> Option<String> {
        if !self.mode.responds() {
            debug!("[impersonate] Ignoring impersonate command in '{}' mode", self.mode);
            return None;
        }

        match directory.users_for_fuzzy_name(name).into_iter().next() {
            Some(user) => {
                info!("[impersonate] Now impersonating {} ({})", user.name, user.id);
                self.state = ImpersonationState::Active(user.id);
                Some(format!("impersonating {}", user.name))
            }
            None => Some(format!("I don't know any {}.", name)),
        }
    }

    /// Handle `stop impersonating`. Refuses unless currently responding.
    pub fn stop(&mut self, directory: &dyn UserDirectory) -> String {
        if !self.should_respond() {
            return REFUSAL.to_string();
        }

        let previous = std::mem::take(&mut self.state);
        let ImpersonationState::Active(id) = previous else {
            return REFUSAL.to_string();
        };
        info!("[impersonate] Stopped impersonating {}", id);
        match directory.user_for_id(&id) {
            Some(user) => format!("stopped impersonating {}", user.name),
            None => "stopped".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::atoms::types::Participant;
    use crate::engine::directory::MemoryDirectory;

    fn directory() -> MemoryDirectory {
        let dir = MemoryDirectory::new();
        dir.observe(&Participant::new("u1", "Alice"));
        dir.observe(&Participant::new("u2", "Alfred"));
        dir
    }

    #[test]
    fn test_impersonate_picks_first_match() {
        let mut c = ImpersonationController::new(Mode::Respond);
        let reply = c.impersonate("al", &directory());
        assert_eq!(reply.as_deref(), Some("impersonating Alice"));
        assert_eq!(c.state(), &ImpersonationState::Active(ParticipantId::from("u1")));
        assert!(c.should_respond());
    }

    #[test]
    fn test_unknown_name_keeps_state() {
        let mut c = ImpersonationController::new(Mode::TrainRespond);
        let reply = c.impersonate("zoe", &directory());
        assert_eq!(reply.as_deref(), Some("I don't know any zoe."));
        assert_eq!(c.state(), &ImpersonationState::Inactive);
    }

    #[test]
    fn test_train_mode_ignores_impersonate() {
        let mut c = ImpersonationController::new(Mode::Train);
        assert_eq!(c.impersonate("alice", &directory()), None);
        assert_eq!(c.state(), &ImpersonationState::Inactive);
        assert!(!c.should_respond());
        assert!(c.should_train());
    }

    #[test]
    fn test_stop_when_inactive_is_refused() {
        let mut c = ImpersonationController::new(Mode::Respond);
        assert_eq!(c.stop(&directory()), REFUSAL);
        assert_eq!(c.state(), &ImpersonationState::Inactive);
    }

    #[test]
    fn test_stop_in_train_mode_is_refused() {
        let mut c = ImpersonationController::new(Mode::Train);
        assert_eq!(c.stop(&directory()), REFUSAL);
    }

    #[test]
    fn test_stop_names_the_target() {
        let dir = directory();
        let mut c = ImpersonationController::new(Mode::Respond);
        c.impersonate("alfred", &dir);
        assert_eq!(c.stop(&dir), "stopped impersonating Alfred");
        assert_eq!(c.state(), &ImpersonationState::Inactive);
    }

    #[test]
    fn test_stop_with_unknown_target_id() {
        let dir = directory();
        let mut c = ImpersonationController::new(Mode::Respond);
        c.impersonate("alice", &dir);
        assert_eq!(c.stop(&MemoryDirectory::new()), "stopped");
    }

    #[test]
    fn test_impersonate_switches_target() {
        let dir = directory();
        let mut c = ImpersonationController::new(Mode::Respond);
        c.impersonate("alice", &dir);
        c.impersonate("alfred", &dir);
        assert_eq!(c.target(), Some(&ParticipantId::from("u2")));
    }
}
