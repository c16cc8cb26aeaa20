use sqlx::{Executor, Sqlite};

use crate::db::models::{CreateMicSession, MicSession, SessionStats};
use crate::error::{AppError, AppResult};

// ============================================================================
// Mic Session Repository
// ============================================================================

pub struct SessionRepository;

impl SessionRepository {
    /// Insert a session at the end of its day's ordering.
    pub async fn create<'e, E>(exec: E, session: &CreateMicSession) -> AppResult<MicSession>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let now = chrono::Utc::now().naive_utc();

        sqlx::query_as::<_, MicSession>(
            r#"
            INSERT INTO mic_sessions (day_id, name, location, num_mics, sort_order, created_at, updated_at)
            VALUES (
                ?1, ?2, ?3, ?4,
                (SELECT COALESCE(MAX(sort_order), -1) + 1 FROM mic_sessions WHERE day_id = ?1),
                ?5, ?5
            )
            RETURNING id, day_id, name, location, num_mics, sort_order, created_at, updated_at
            "#,
        )
        .bind(session.day_id)
        .bind(session.name.trim())
        .bind(session.location.trim())
        .bind(session.num_mics)
        .bind(now)
        .fetch_one(exec)
        .await
        .map_err(AppError::Database)
    }

    pub async fn find_by_id<'e, E>(exec: E, id: i64) -> AppResult<Option<MicSession>>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        sqlx::query_as::<_, MicSession>(
            r#"
            SELECT id, day_id, name, location, num_mics, sort_order, created_at, updated_at
            FROM mic_sessions
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(exec)
        .await
        .map_err(AppError::Database)
    }

    pub async fn list_by_day<'e, E>(exec: E, day_id: i64) -> AppResult<Vec<MicSession>>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        sqlx::query_as::<_, MicSession>(
            r#"
            SELECT id, day_id, name, location, num_mics, sort_order, created_at, updated_at
            FROM mic_sessions
            WHERE day_id = ?
            ORDER BY sort_order, id
            "#,
        )
        .bind(day_id)
        .fetch_all(exec)
        .await
        .map_err(AppError::Database)
    }

    /// Delete a session; assignments, slots and groups cascade.
    pub async fn delete<'e, E>(exec: E, id: i64) -> AppResult<bool>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let res = sqlx::query("DELETE FROM mic_sessions WHERE id = ?")
            .bind(id)
            .execute(exec)
            .await
            .map_err(AppError::Database)?;

        Ok(res.rows_affected() > 0)
    }

    pub async fn touch<'e, E>(exec: E, id: i64) -> AppResult<()>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        sqlx::query("UPDATE mic_sessions SET updated_at = ? WHERE id = ?")
            .bind(chrono::Utc::now().naive_utc())
            .bind(id)
            .execute(exec)
            .await
            .map_err(AppError::Database)?;

        Ok(())
    }

    pub async fn stats<'e, E>(exec: E, id: i64) -> AppResult<SessionStats>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        sqlx::query_as::<_, SessionStats>(
            r#"
            SELECT
                COALESCE(SUM(CASE WHEN is_micd THEN 1 ELSE 0 END), 0) AS micd,
                COUNT(*) AS total,
                COALESCE(SUM(CASE WHEN shared_presenters != '[]' THEN 1 ELSE 0 END), 0) AS shared
            FROM mic_assignments
            WHERE session_id = ?
            "#,
        )
        .bind(id)
        .fetch_one(exec)
        .await
        .map_err(AppError::Database)
    }
}
