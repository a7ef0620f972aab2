//! In-memory session manager: opaque random tokens resolving to a
//! participant identity and role.

use chrono::{DateTime, Duration, Utc};
use parking_lot::RwLock;
use rand::RngCore;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;

/// Generate a secure random session token (64 hex characters).
pub fn generate_session_token() -> String {
    let mut bytes = [0u8; 32];
    rand::rngs::OsRng.fill_bytes(&mut bytes);
    hex::encode(bytes)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Participant,
}

/// What a valid token resolves to.
#[derive(Debug, Clone)]
pub struct Session {
    pub username: String,
    pub participant_id: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

/// Active sessions indexed by token, with a fixed timeout.
pub struct SessionManager {
    sessions: Arc<RwLock<HashMap<String, Session>>>,
    timeout_seconds: u64,
}

impl SessionManager {
    pub fn new(timeout_seconds: u64) -> Self {
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
            timeout_seconds,
        }
    }

    /// Creates a session and returns its token.
    pub fn create_session(&self, username: &str, participant_id: &str, role: Role) -> String {
        let token = generate_session_token();
        let now = Utc::now();
        let session = Session {
            username: username.to_string(),
            participant_id: participant_id.to_string(),
            role,
            created_at: now,
            expires_at: now + Duration::seconds(self.timeout_seconds as i64),
        };
        self.sessions.write().insert(token.clone(), session);
        token
    }

    /// Resolves a token to its session if it exists and has not expired.
    pub fn validate(&self, token: &str) -> Option<Session> {
        let sessions = self.sessions.read();
        sessions
            .get(token)
            .filter(|session| Utc::now() < session.expires_at)
            .cloned()
    }

    pub fn revoke(&self, token: &str) {
        self.sessions.write().remove(token);
    }

    /// Drops expired sessions, returning how many were removed.
    pub fn cleanup_expired(&self) -> usize {
        let now = Utc::now();
        let mut sessions = self.sessions.write();
        let before = sessions.len();
        sessions.retain(|_, session| session.expires_at > now);
        before - sessions.len()
    }

    pub fn timeout_seconds(&self) -> u64 {
        self.timeout_seconds
    }
}

impl Clone for SessionManager {
    fn clone(&self) -> Self {
        Self {
            sessions: Arc::clone(&self.sessions),
            timeout_seconds: self.timeout_seconds,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_format() {
        let token = generate_session_token();
        assert_eq!(token.len(), 64);
        assert!(token.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_create_validate_revoke() {
        let manager = SessionManager::new(3600);
        let token = manager.create_session("alice", "participant-1", Role::Participant);

        let session = manager.validate(&token).unwrap();
        assert_eq!(session.username, "alice");
        assert_eq!(session.participant_id, "participant-1");
        assert_eq!(session.role, Role::Participant);

        assert!(manager.validate("not-a-token").is_none());

        manager.revoke(&token);
        assert!(manager.validate(&token).is_none());
    }

    #[test]
    fn test_expired_sessions_fail_validation_and_clean_up() {
        let manager = SessionManager::new(0);
        let token = manager.create_session("bob", "participant-2", Role::Admin);

        assert!(manager.validate(&token).is_none());
        assert_eq!(manager.cleanup_expired(), 1);
    }
}
