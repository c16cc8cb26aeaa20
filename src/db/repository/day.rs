use sqlx::{Executor, Sqlite};

use crate::db::models::{CreateDay, Day, DayStats};
use crate::error::{AppError, AppResult};

// ============================================================================
// Day Repository
// ============================================================================

pub struct DayRepository;

impl DayRepository {
    pub async fn create<'e, E>(exec: E, day: &CreateDay) -> AppResult<Day>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let now = chrono::Utc::now().naive_utc();

        sqlx::query_as::<_, Day>(
            r#"
            INSERT INTO days (date, name, is_collapsed, created_at, updated_at)
            VALUES (?, ?, 0, ?, ?)
            RETURNING id, date, name, is_collapsed, created_at, updated_at
            "#,
        )
        .bind(day.date)
        .bind(day.name.trim())
        .bind(now)
        .bind(now)
        .fetch_one(exec)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db) if db.is_unique_violation() => {
                AppError::Conflict(format!("A day for {} already exists", day.date))
            }
            other => AppError::Database(other),
        })
    }

    pub async fn find_by_id<'e, E>(exec: E, id: i64) -> AppResult<Option<Day>>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        sqlx::query_as::<_, Day>(
            "SELECT id, date, name, is_collapsed, created_at, updated_at FROM days WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(exec)
        .await
        .map_err(AppError::Database)
    }

    pub async fn list_all<'e, E>(exec: E) -> AppResult<Vec<Day>>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        sqlx::query_as::<_, Day>(
            "SELECT id, date, name, is_collapsed, created_at, updated_at FROM days ORDER BY date",
        )
        .fetch_all(exec)
        .await
        .map_err(AppError::Database)
    }

    /// Store `target`, or flip the persisted collapse state when it is `None`.
    /// Returns the new value.
    pub async fn update_collapsed<'e, E>(
        exec: E,
        id: i64,
        target: Option<bool>,
    ) -> AppResult<Option<bool>>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let row: Option<(bool,)> = sqlx::query_as(
            r#"
            UPDATE days
            SET is_collapsed = COALESCE(?, NOT is_collapsed), updated_at = ?
            WHERE id = ?
            RETURNING is_collapsed
            "#,
        )
        .bind(target)
        .bind(chrono::Utc::now().naive_utc())
        .bind(id)
        .fetch_optional(exec)
        .await
        .map_err(AppError::Database)?;

        Ok(row.map(|(collapsed,)| collapsed))
    }

    pub async fn rename<'e, E>(exec: E, id: i64, name: &str) -> AppResult<bool>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let res = sqlx::query("UPDATE days SET name = ?, updated_at = ? WHERE id = ?")
            .bind(name.trim())
            .bind(chrono::Utc::now().naive_utc())
            .bind(id)
            .execute(exec)
            .await
            .map_err(AppError::Database)?;

        Ok(res.rows_affected() > 0)
    }

    /// Delete a day; sessions, assignments, slots and groups cascade.
    pub async fn delete<'e, E>(exec: E, id: i64) -> AppResult<bool>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let res = sqlx::query("DELETE FROM days WHERE id = ?")
            .bind(id)
            .execute(exec)
            .await
            .map_err(AppError::Database)?;

        Ok(res.rows_affected() > 0)
    }

    pub async fn stats<'e, E>(exec: E, id: i64) -> AppResult<DayStats>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        sqlx::query_as::<_, DayStats>(
            r#"
            SELECT
                (SELECT COUNT(*) FROM mic_sessions WHERE day_id = ?1) AS sessions,
                COUNT(a.id) AS total,
                COALESCE(SUM(CASE WHEN a.is_micd THEN 1 ELSE 0 END), 0) AS micd,
                COALESCE(SUM(CASE WHEN a.shared_presenters != '[]' THEN 1 ELSE 0 END), 0) AS shared
            FROM mic_assignments a
            JOIN mic_sessions s ON s.id = a.session_id
            WHERE s.day_id = ?1
            "#,
        )
        .bind(id)
        .fetch_one(exec)
        .await
        .map_err(AppError::Database)
    }
}
