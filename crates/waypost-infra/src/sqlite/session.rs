//! SQLite session repository implementation.
//!
//! Implements `SessionRepository` from `waypost-core` using sqlx with
//! split read/write pools: raw queries, a private Row struct for
//! SQLite-to-domain mapping, reads on the reader pool, writes on the
//! writer pool.

use chrono::{DateTime, Utc};
use sqlx::Row;

use waypost_core::session::repository::SessionRepository;
use waypost_types::error::RepositoryError;
use waypost_types::session::UserSession;

use super::pool::DatabasePool;

/// SQLite-backed implementation of `SessionRepository`.
pub struct SqliteSessionRepository {
    pool: DatabasePool,
}

impl SqliteSessionRepository {
    /// Create a new repository backed by the given database pool.
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }
}

/// Internal row type for mapping SQLite rows to domain UserSession.
struct UserSessionRow {
    identity: String,
    access_token: Option<String>,
    conversation_id: Option<String>,
    token_refreshed_at: Option<String>,
    created_at: String,
    updated_at: String,
}

impl UserSessionRow {
    fn from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            identity: row.try_get("identity")?,
            access_token: row.try_get("access_token")?,
            conversation_id: row.try_get("conversation_id")?,
            token_refreshed_at: row.try_get("token_refreshed_at")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }

    fn into_session(self) -> Result<UserSession, RepositoryError> {
        let token_refreshed_at = self
            .token_refreshed_at
            .as_deref()
            .map(parse_datetime)
            .transpose()?;

        Ok(UserSession {
            identity: self.identity,
            access_token: self.access_token,
            conversation_id: self.conversation_id,
            token_refreshed_at,
            created_at: parse_datetime(&self.created_at)?,
            updated_at: parse_datetime(&self.updated_at)?,
        })
    }
}

fn parse_datetime(s: &str) -> Result<DateTime<Utc>, RepositoryError> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| RepositoryError::Query(format!("invalid datetime: {e}")))
}

fn format_datetime(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339()
}

impl SessionRepository for SqliteSessionRepository {
    async fn find_by_identity(
        &self,
        identity: &str,
    ) -> Result<Option<UserSession>, RepositoryError> {
        let row = sqlx::query("SELECT * FROM user_sessions WHERE identity = ?")
            .bind(identity)
            .fetch_optional(&self.pool.reader)
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        match row {
            Some(row) => {
                let session_row = UserSessionRow::from_row(&row)
                    .map_err(|e| RepositoryError::Query(e.to_string()))?;
                Ok(Some(session_row.into_session()?))
            }
            None => Ok(None),
        }
    }

    async fn upsert(&self, session: &UserSession) -> Result<(), RepositoryError> {
        sqlx::query(
            r#"INSERT INTO user_sessions (identity, access_token, conversation_id, token_refreshed_at, created_at, updated_at)
               VALUES (?, ?, ?, ?, ?, ?)
               ON CONFLICT(identity) DO UPDATE SET
                   access_token = excluded.access_token,
                   conversation_id = excluded.conversation_id,
                   token_refreshed_at = excluded.token_refreshed_at,
                   updated_at = excluded.updated_at"#,
        )
        .bind(&session.identity)
        .bind(&session.access_token)
        .bind(&session.conversation_id)
        .bind(session.token_refreshed_at.as_ref().map(format_datetime))
        .bind(format_datetime(&session.created_at))
        .bind(format_datetime(&session.updated_at))
        .execute(&self.pool.writer)
        .await
        .map_err(|e| RepositoryError::Query(e.to_string()))?;

        Ok(())
    }

    async fn list(&self, limit: Option<i64>) -> Result<Vec<UserSession>, RepositoryError> {
        let mut sql = String::from("SELECT * FROM user_sessions ORDER BY updated_at DESC");
        if let Some(limit) = limit {
            sql.push_str(&format!(" LIMIT {limit}"));
        }

        let rows = sqlx::query(&sql)
            .fetch_all(&self.pool.reader)
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        let mut sessions = Vec::with_capacity(rows.len());
        for row in &rows {
            let session_row = UserSessionRow::from_row(row)
                .map_err(|e| RepositoryError::Query(e.to_string()))?;
            sessions.push(session_row.into_session()?);
        }

        Ok(sessions)
    }

    async fn delete_by_identity(&self, identity: &str) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM user_sessions WHERE identity = ?")
            .bind(identity)
            .execute(&self.pool.writer)
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }

    async fn count(&self) -> Result<u64, RepositoryError> {
        let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM user_sessions")
            .fetch_one(&self.pool.reader)
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        Ok(row.0 as u64)
    }
}
