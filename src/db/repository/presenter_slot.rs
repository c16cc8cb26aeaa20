use sqlx::{Executor, Sqlite, SqliteConnection};

use crate::db::models::{PresenterSlot, PRIMARY_SLOT};
use crate::error::{AppError, AppResult};

// ============================================================================
// Presenter Slot Repository
// ============================================================================

pub struct PresenterSlotRepository;

impl PresenterSlotRepository {
    pub async fn list_by_assignment<'e, E>(exec: E, assignment_id: i64) -> AppResult<Vec<PresenterSlot>>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        sqlx::query_as::<_, PresenterSlot>(
            r#"
            SELECT id, assignment_id, position, presenter_name, photo_path, created_at, updated_at
            FROM presenter_slots
            WHERE assignment_id = ?
            ORDER BY position
            "#,
        )
        .bind(assignment_id)
        .fetch_all(exec)
        .await
        .map_err(AppError::Database)
    }

    pub async fn find_by_id<'e, E>(exec: E, id: i64) -> AppResult<Option<PresenterSlot>>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        sqlx::query_as::<_, PresenterSlot>(
            r#"
            SELECT id, assignment_id, position, presenter_name, photo_path, created_at, updated_at
            FROM presenter_slots
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(exec)
        .await
        .map_err(AppError::Database)
    }

    /// Set the primary presenter's name, creating the slot if it is missing.
    pub async fn set_primary_name<'e, E>(exec: E, assignment_id: i64, name: &str) -> AppResult<()>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let now = chrono::Utc::now().naive_utc();

        sqlx::query(
            r#"
            INSERT INTO presenter_slots (assignment_id, position, presenter_name, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?4)
            ON CONFLICT (assignment_id, position)
            DO UPDATE SET presenter_name = excluded.presenter_name, updated_at = excluded.updated_at
            "#,
        )
        .bind(assignment_id)
        .bind(PRIMARY_SLOT)
        .bind(name)
        .bind(now)
        .execute(exec)
        .await
        .map_err(AppError::Database)?;

        Ok(())
    }

    /// Reconcile the shared slots (positions 1..) with `names` in order.
    ///
    /// A slot whose presenter survives keeps its id and photo and only moves;
    /// removed presenters lose their slot and new names get a fresh one.
    pub async fn sync_shared(
        conn: &mut SqliteConnection,
        assignment_id: i64,
        names: &[String],
    ) -> AppResult<()> {
        let mut survivors: Vec<PresenterSlot> = Vec::new();
        for slot in Self::list_by_assignment(&mut *conn, assignment_id)
            .await?
            .into_iter()
            .filter(|s| !s.is_primary())
        {
            let wanted = names.contains(&slot.presenter_name)
                && !survivors.iter().any(|k| k.presenter_name == slot.presenter_name);
            if wanted {
                survivors.push(slot);
            } else {
                sqlx::query("DELETE FROM presenter_slots WHERE id = ?")
                    .bind(slot.id)
                    .execute(&mut *conn)
                    .await
                    .map_err(AppError::Database)?;
            }
        }

        // Park survivors on negative positions so the reorder below never
        // collides on (assignment_id, position).
        sqlx::query(
            "UPDATE presenter_slots SET position = -position WHERE assignment_id = ? AND position > ?",
        )
        .bind(assignment_id)
        .bind(PRIMARY_SLOT)
        .execute(&mut *conn)
        .await
        .map_err(AppError::Database)?;

        let now = chrono::Utc::now().naive_utc();
        for (idx, name) in names.iter().enumerate() {
            let position = idx as i64 + 1;
            match survivors.iter().find(|s| s.presenter_name == *name) {
                Some(slot) => {
                    sqlx::query("UPDATE presenter_slots SET position = ?, updated_at = ? WHERE id = ?")
                        .bind(position)
                        .bind(now)
                        .bind(slot.id)
                        .execute(&mut *conn)
                        .await
                        .map_err(AppError::Database)?;
                }
                None => {
                    sqlx::query(
                        r#"
                        INSERT INTO presenter_slots (assignment_id, position, presenter_name, created_at, updated_at)
                        VALUES (?1, ?2, ?3, ?4, ?4)
                        "#,
                    )
                    .bind(assignment_id)
                    .bind(position)
                    .bind(name)
                    .bind(now)
                    .execute(&mut *conn)
                    .await
                    .map_err(AppError::Database)?;
                }
            }
        }

        Ok(())
    }

    pub async fn set_photo<'e, E>(exec: E, id: i64, photo_path: &str) -> AppResult<()>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        sqlx::query("UPDATE presenter_slots SET photo_path = ?, updated_at = ? WHERE id = ?")
            .bind(photo_path)
            .bind(chrono::Utc::now().naive_utc())
            .bind(id)
            .execute(exec)
            .await
            .map_err(AppError::Database)?;

        Ok(())
    }

    /// Drop every shared slot of a session's assignments and blank the primaries.
    pub async fn clear_session(conn: &mut SqliteConnection, session_id: i64) -> AppResult<()> {
        sqlx::query(
            r#"
            DELETE FROM presenter_slots
            WHERE position > ?
              AND assignment_id IN (SELECT id FROM mic_assignments WHERE session_id = ?)
            "#,
        )
        .bind(PRIMARY_SLOT)
        .bind(session_id)
        .execute(&mut *conn)
        .await
        .map_err(AppError::Database)?;

        sqlx::query(
            r#"
            UPDATE presenter_slots
            SET presenter_name = '', photo_path = NULL, updated_at = ?
            WHERE assignment_id IN (SELECT id FROM mic_assignments WHERE session_id = ?)
            "#,
        )
        .bind(chrono::Utc::now().naive_utc())
        .bind(session_id)
        .execute(&mut *conn)
        .await
        .map_err(AppError::Database)?;

        Ok(())
    }

    /// Distinct presenter names across every slot, sorted case-insensitively.
    pub async fn distinct_names<'e, E>(exec: E) -> AppResult<Vec<String>>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let rows: Vec<(String,)> = sqlx::query_as(
            r#"
            SELECT DISTINCT presenter_name
            FROM presenter_slots
            WHERE TRIM(presenter_name) != ''
            ORDER BY presenter_name COLLATE NOCASE
            "#,
        )
        .fetch_all(exec)
        .await
        .map_err(AppError::Database)?;

        Ok(rows.into_iter().map(|(name,)| name).collect())
    }
}
