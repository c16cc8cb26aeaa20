use sqlx::{Executor, Sqlite};

use crate::db::models::{GroupColor, MicGroup};
use crate::error::{AppError, AppResult};

// ============================================================================
// Mic Group Repository
// ============================================================================

pub struct MicGroupRepository;

impl MicGroupRepository {
    pub async fn list_by_session<'e, E>(exec: E, session_id: i64) -> AppResult<Vec<MicGroup>>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        sqlx::query_as::<_, MicGroup>(
            r#"
            SELECT id, session_id, name, color, created_at
            FROM mic_groups
            WHERE session_id = ?
            ORDER BY id
            "#,
        )
        .bind(session_id)
        .fetch_all(exec)
        .await
        .map_err(AppError::Database)
    }

    pub async fn find_by_id<'e, E>(exec: E, id: i64) -> AppResult<Option<MicGroup>>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        sqlx::query_as::<_, MicGroup>(
            "SELECT id, session_id, name, color, created_at FROM mic_groups WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(exec)
        .await
        .map_err(AppError::Database)
    }

    pub async fn create<'e, E>(
        exec: E,
        session_id: i64,
        name: &str,
        color: GroupColor,
    ) -> AppResult<MicGroup>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        sqlx::query_as::<_, MicGroup>(
            r#"
            INSERT INTO mic_groups (session_id, name, color, created_at)
            VALUES (?, ?, ?, ?)
            RETURNING id, session_id, name, color, created_at
            "#,
        )
        .bind(session_id)
        .bind(name.trim())
        .bind(color.as_str())
        .bind(chrono::Utc::now().naive_utc())
        .fetch_one(exec)
        .await
        .map_err(AppError::Database)
    }

    pub async fn delete<'e, E>(exec: E, id: i64) -> AppResult<bool>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let res = sqlx::query("DELETE FROM mic_groups WHERE id = ?")
            .bind(id)
            .execute(exec)
            .await
            .map_err(AppError::Database)?;

        Ok(res.rows_affected() > 0)
    }
}
