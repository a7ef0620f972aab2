//! Shared state handed to every request handler.

use std::path::PathBuf;

use crate::auth::{Role, SessionManager};
use crate::config::ServerConfig;
use crate::store::UserStore;

pub struct ServerState {
    pub config: ServerConfig,
    pub store: UserStore,
    pub sessions: SessionManager,
}

impl ServerState {
    pub fn new(config: ServerConfig, store: UserStore) -> Self {
        let sessions = SessionManager::new(config.session_timeout_seconds);
        Self {
            config,
            store,
            sessions,
        }
    }

    /// Admin is whoever holds the designated admin username; every other
    /// account is a plain participant.
    pub fn role_for(&self, username: &str) -> Role {
        if username == self.config.admin_username {
            Role::Admin
        } else {
            Role::Participant
        }
    }

    /// Where a participant's exported artifact lives.
    pub fn artifact_path(&self, participant_id: &str) -> PathBuf {
        self.config
            .processed_dir
            .join(format!("{participant_id}.json"))
    }
}
