//! SQLite-backed account store: username/password-hash/participant mapping.

use chrono::NaiveDateTime;
use serde::Serialize;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool};
use sqlx::FromRow;
use std::path::Path;

/// Storage errors
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("username `{0}` is already taken")]
    DuplicateUsername(String),
    #[error("user `{0}` not found")]
    UserNotFound(String),
    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

/// One account row. The password hash never serializes into API responses.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct UserRecord {
    pub id: i64,
    pub username: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub participant_id: String,
    pub created_at: NaiveDateTime,
}

#[derive(Clone)]
pub struct UserStore {
    pool: SqlitePool,
}

impl UserStore {
    /// Opens (creating if needed) the database file and ensures the schema.
    pub async fn connect(path: &Path) -> Result<Self, StoreError> {
        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true);
        let pool = SqlitePool::connect_with(options).await?;
        let store = Self { pool };
        store.init().await?;
        Ok(store)
    }

    /// In-memory store, used by tests.
    pub async fn in_memory() -> Result<Self, StoreError> {
        let pool = SqlitePool::connect("sqlite::memory:").await?;
        let store = Self { pool };
        store.init().await?;
        Ok(store)
    }

    async fn init(&self) -> Result<(), StoreError> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS users (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                username TEXT UNIQUE NOT NULL,
                password_hash TEXT NOT NULL,
                participant_id TEXT NOT NULL,
                created_at DATETIME DEFAULT CURRENT_TIMESTAMP
            )",
        )
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn create_user(
        &self,
        username: &str,
        password_hash: &str,
        participant_id: &str,
    ) -> Result<(), StoreError> {
        let result = sqlx::query(
            "INSERT INTO users (username, password_hash, participant_id) VALUES (?, ?, ?)",
        )
        .bind(username)
        .bind(password_hash)
        .bind(participant_id)
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(()),
            Err(sqlx::Error::Database(db)) if db.is_unique_violation() => {
                Err(StoreError::DuplicateUsername(username.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    pub async fn get_by_username(&self, username: &str) -> Result<UserRecord, StoreError> {
        sqlx::query_as::<_, UserRecord>(
            "SELECT id, username, password_hash, participant_id, created_at
             FROM users WHERE username = ?",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| StoreError::UserNotFound(username.to_string()))
    }

    pub async fn list_users(&self) -> Result<Vec<UserRecord>, StoreError> {
        Ok(sqlx::query_as::<_, UserRecord>(
            "SELECT id, username, password_hash, participant_id, created_at
             FROM users ORDER BY id ASC",
        )
        .fetch_all(&self.pool)
        .await?)
    }

    pub async fn update_password_hash(
        &self,
        username: &str,
        new_password_hash: &str,
    ) -> Result<(), StoreError> {
        let result = sqlx::query("UPDATE users SET password_hash = ? WHERE username = ?")
            .bind(new_password_hash)
            .bind(username)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::UserNotFound(username.to_string()));
        }
        Ok(())
    }

    pub async fn delete_user(&self, username: &str) -> Result<(), StoreError> {
        let result = sqlx::query("DELETE FROM users WHERE username = ?")
            .bind(username)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::UserNotFound(username.to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_create_and_fetch_user() {
        let store = UserStore::in_memory().await.unwrap();
        store
            .create_user("alice", "hash-a", "participant-1")
            .await
            .unwrap();

        let user = store.get_by_username("alice").await.unwrap();
        assert_eq!(user.participant_id, "participant-1");
        assert_eq!(user.password_hash, "hash-a");
    }

    #[tokio::test]
    async fn test_duplicate_username_is_typed_error() {
        let store = UserStore::in_memory().await.unwrap();
        store
            .create_user("alice", "hash-a", "participant-1")
            .await
            .unwrap();

        let second = store.create_user("alice", "hash-b", "participant-2").await;
        assert!(matches!(second, Err(StoreError::DuplicateUsername(_))));
    }

    #[tokio::test]
    async fn test_unknown_user_is_not_found() {
        let store = UserStore::in_memory().await.unwrap();
        assert!(matches!(
            store.get_by_username("nobody").await,
            Err(StoreError::UserNotFound(_))
        ));
        assert!(matches!(
            store.update_password_hash("nobody", "hash").await,
            Err(StoreError::UserNotFound(_))
        ));
        assert!(matches!(
            store.delete_user("nobody").await,
            Err(StoreError::UserNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_list_excludes_hash_from_serialization() {
        let store = UserStore::in_memory().await.unwrap();
        store
            .create_user("alice", "secret-hash", "participant-1")
            .await
            .unwrap();

        let users = store.list_users().await.unwrap();
        let json = serde_json::to_value(&users).unwrap();
        assert_eq!(json[0]["username"], "alice");
        assert!(json[0].get("password_hash").is_none());
    }

    #[tokio::test]
    async fn test_update_and_delete() {
        let store = UserStore::in_memory().await.unwrap();
        store
            .create_user("bob", "old-hash", "participant-2")
            .await
            .unwrap();

        store.update_password_hash("bob", "new-hash").await.unwrap();
        assert_eq!(
            store.get_by_username("bob").await.unwrap().password_hash,
            "new-hash"
        );

        store.delete_user("bob").await.unwrap();
        assert!(store.get_by_username("bob").await.is_err());
    }
}
