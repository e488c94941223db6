// Mimic Engine — Participant directory
//
// The chat host owns the user list; the engine only needs fuzzy lookup by
// name (for `impersonate <name>`) and lookup by id (for confirmations).
// `MemoryDirectory` is the in-process implementation bridges fill as they
// see people talk.

use crate::atoms::types::{Participant, ParticipantId};
use parking_lot::Mutex;

pub trait UserDirectory: Send + Sync {
    /// Candidates for `name`, best first. Empty when nobody matches.
    fn users_for_fuzzy_name(&self, name: &str) -> Vec<Participant>;
    fn user_for_id(&self, id: &ParticipantId) -> Option<Participant>;
}

#[derive(Default)]
pub struct MemoryDirectory {
    users: Mutex<Vec<Participant>>,
}

impl MemoryDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a participant, or refresh the display name of a known id.
    pub fn observe(&self, participant: &Participant) {
        let mut users = self.users.lock();
        match users.iter_mut().find(|u| u.id == participant.id) {
            Some(known) => {
                if known.name != participant.name {
                    known.name = participant.name.clone();
                }
            }
            None => users.push(participant.clone()),
        }
    }

    pub fn len(&self) -> usize {
        self.users.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.lock().is_empty()
    }
}

impl UserDirectory for MemoryDirectory {
    /// Case-insensitive prefix match in registration order. An exact name
    /// match wins outright. A blank name matches nobody.
    fn users_for_fuzzy_name(&self, name: &str) -> Vec<Participant> {
        let wanted = name.trim().to_lowercase();
        if wanted.is_empty() {
            return Vec::new();
        }
        let users = self.users.lock();
        let matched: Vec<Participant> =
            users.iter().filter(|u| u.name.to_lowercase().starts_with(&wanted)).cloned().collect();
        if let Some(exact) = matched.iter().find(|u| u.name.to_lowercase() == wanted) {
            return vec![exact.clone()];
        }
        matched
    }

    fn user_for_id(&self, id: &ParticipantId) -> Option<Participant> {
        self.users.lock().iter().find(|u| &u.id == id).cloned()
    }
}
