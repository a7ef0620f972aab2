//! Authenticated HTTP API over the exported participant artifacts.

pub mod handlers;
pub mod state;

use anyhow::Result;
use axum::routing::{delete, get, post};
use axum::Router;
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{debug, info};

use crate::auth::SessionManager;
use crate::config::ServerConfig;
use crate::store::UserStore;
use state::ServerState;

const SESSION_CLEANUP_PERIOD: Duration = Duration::from_secs(300);

pub fn build_router(state: Arc<ServerState>) -> Router {
    Router::new()
        .route("/", get(handlers::root))
        .route("/health", get(handlers::health))
        .route("/login", post(handlers::login))
        .route("/logout", post(handlers::logout))
        .route("/signup", post(handlers::signup))
        .route("/api/my-data", get(handlers::my_data))
        .route("/api/my-summary", get(handlers::my_summary))
        .route("/api/admin/users", get(handlers::list_users))
        .route(
            "/api/admin/users/{username}/reset-password",
            post(handlers::reset_password),
        )
        .route("/api/admin/users/{username}", delete(handlers::delete_user))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Evicts expired sessions on a fixed period for as long as the server runs.
/// `validate` only filters expired entries; without this task the session map
/// grows for the life of the process.
pub fn spawn_session_cleanup(
    sessions: SessionManager,
    period: Duration,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(period);
        loop {
            interval.tick().await;
            let removed = sessions.cleanup_expired();
            if removed > 0 {
                debug!(removed, "Evicted expired sessions");
            }
        }
    })
}

/// Connects the account store, builds the router, and serves until shutdown.
pub async fn serve(config: ServerConfig) -> Result<()> {
    let store = UserStore::connect(&config.database_path).await?;
    let bind_address = config.bind_address();
    let state = Arc::new(ServerState::new(config, store));

    spawn_session_cleanup(state.sessions.clone(), SESSION_CLEANUP_PERIOD);
    let app = build_router(state);
    let listener = tokio::net::TcpListener::bind(&bind_address).await?;
    info!(address = %bind_address, "Health data API listening");
    axum::serve(listener, app).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::Role;

    #[tokio::test]
    async fn test_cleanup_task_evicts_expired_sessions() {
        let sessions = SessionManager::new(0);
        for i in 0..10 {
            sessions.create_session(
                &format!("user-{i}"),
                &format!("participant-{i}"),
                Role::Participant,
            );
        }

        let task = spawn_session_cleanup(sessions.clone(), Duration::from_millis(5));
        tokio::time::sleep(Duration::from_millis(50)).await;
        task.abort();

        // the background task already swept them; nothing left to evict
        assert_eq!(sessions.cleanup_expired(), 0);
    }
}
