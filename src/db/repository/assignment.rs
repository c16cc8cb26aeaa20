use sqlx::types::Json;
use sqlx::{Executor, Sqlite, SqliteConnection};

use crate::db::models::{MicAssignment, MicType, PRIMARY_SLOT};
use crate::error::{AppError, AppResult};

// ============================================================================
// Mic Assignment Repository
// ============================================================================

const SELECT_ASSIGNMENT: &str = r#"
    SELECT id, session_id, rf_number, mic_type, is_d_mic, is_micd, group_id,
           shared_presenters, active_slot, notes, created_at, updated_at
    FROM mic_assignments
"#;

pub struct AssignmentRepository;

impl AssignmentRepository {
    /// Create assignments `RF01..RFnn` for a new session, each with an empty primary slot.
    pub async fn create_for_session(
        conn: &mut SqliteConnection,
        session_id: i64,
        num_mics: i64,
    ) -> AppResult<Vec<MicAssignment>> {
        let now = chrono::Utc::now().naive_utc();
        let mut out = Vec::with_capacity(num_mics.max(0) as usize);

        for rf_number in 1..=num_mics {
            let assignment = sqlx::query_as::<_, MicAssignment>(
                r#"
                INSERT INTO mic_assignments (session_id, rf_number, created_at, updated_at)
                VALUES (?, ?, ?, ?)
                RETURNING id, session_id, rf_number, mic_type, is_d_mic, is_micd, group_id,
                          shared_presenters, active_slot, notes, created_at, updated_at
                "#,
            )
            .bind(session_id)
            .bind(rf_number)
            .bind(now)
            .bind(now)
            .fetch_one(&mut *conn)
            .await
            .map_err(AppError::Database)?;

            sqlx::query(
                r#"
                INSERT INTO presenter_slots (assignment_id, position, presenter_name, created_at, updated_at)
                VALUES (?, ?, '', ?, ?)
                "#,
            )
            .bind(assignment.id)
            .bind(PRIMARY_SLOT)
            .bind(now)
            .bind(now)
            .execute(&mut *conn)
            .await
            .map_err(AppError::Database)?;

            out.push(assignment);
        }

        Ok(out)
    }

    pub async fn find_by_id<'e, E>(exec: E, id: i64) -> AppResult<Option<MicAssignment>>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let sql = format!("{SELECT_ASSIGNMENT} WHERE id = ?");
        sqlx::query_as::<_, MicAssignment>(&sql)
            .bind(id)
            .fetch_optional(exec)
            .await
            .map_err(AppError::Database)
    }

    pub async fn list_by_session<'e, E>(exec: E, session_id: i64) -> AppResult<Vec<MicAssignment>>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let sql = format!("{SELECT_ASSIGNMENT} WHERE session_id = ? ORDER BY rf_number");
        sqlx::query_as::<_, MicAssignment>(&sql)
            .bind(session_id)
            .fetch_all(exec)
            .await
            .map_err(AppError::Database)
    }

    /// Write both status flags at once so the pair is always consistent.
    pub async fn set_flags<'e, E>(exec: E, id: i64, is_d_mic: bool, is_micd: bool) -> AppResult<()>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        if is_d_mic && is_micd {
            return Err(AppError::Validation(
                "D-MIC and MIC'D cannot both be set".to_string(),
            ));
        }

        sqlx::query(
            "UPDATE mic_assignments SET is_d_mic = ?, is_micd = ?, updated_at = ? WHERE id = ?",
        )
        .bind(is_d_mic)
        .bind(is_micd)
        .bind(chrono::Utc::now().naive_utc())
        .bind(id)
        .execute(exec)
        .await
        .map_err(AppError::Database)?;

        Ok(())
    }

    pub async fn touch<'e, E>(exec: E, id: i64) -> AppResult<()>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        sqlx::query("UPDATE mic_assignments SET updated_at = ? WHERE id = ?")
            .bind(chrono::Utc::now().naive_utc())
            .bind(id)
            .execute(exec)
            .await
            .map_err(AppError::Database)?;

        Ok(())
    }

    pub async fn set_mic_type<'e, E>(exec: E, id: i64, mic_type: MicType) -> AppResult<()>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        sqlx::query("UPDATE mic_assignments SET mic_type = ?, updated_at = ? WHERE id = ?")
            .bind(mic_type.as_str())
            .bind(chrono::Utc::now().naive_utc())
            .bind(id)
            .execute(exec)
            .await
            .map_err(AppError::Database)?;

        Ok(())
    }

    pub async fn set_notes<'e, E>(exec: E, id: i64, notes: &str) -> AppResult<()>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        sqlx::query("UPDATE mic_assignments SET notes = ?, updated_at = ? WHERE id = ?")
            .bind(notes)
            .bind(chrono::Utc::now().naive_utc())
            .bind(id)
            .execute(exec)
            .await
            .map_err(AppError::Database)?;

        Ok(())
    }

    pub async fn set_shared_presenters<'e, E>(exec: E, id: i64, names: &[String]) -> AppResult<()>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        sqlx::query("UPDATE mic_assignments SET shared_presenters = ?, updated_at = ? WHERE id = ?")
            .bind(Json(names.to_vec()))
            .bind(chrono::Utc::now().naive_utc())
            .bind(id)
            .execute(exec)
            .await
            .map_err(AppError::Database)?;

        Ok(())
    }

    pub async fn set_active_slot<'e, E>(exec: E, id: i64, position: i64) -> AppResult<()>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        sqlx::query("UPDATE mic_assignments SET active_slot = ?, updated_at = ? WHERE id = ?")
            .bind(position)
            .bind(chrono::Utc::now().naive_utc())
            .bind(id)
            .execute(exec)
            .await
            .map_err(AppError::Database)?;

        Ok(())
    }

    pub async fn set_group<'e, E>(exec: E, id: i64, group_id: Option<i64>) -> AppResult<()>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        sqlx::query("UPDATE mic_assignments SET group_id = ?, updated_at = ? WHERE id = ?")
            .bind(group_id)
            .bind(chrono::Utc::now().naive_utc())
            .bind(id)
            .execute(exec)
            .await
            .map_err(AppError::Database)?;

        Ok(())
    }

    /// Detach a group from every assignment referencing it. Returns the number of rows touched.
    pub async fn clear_group<'e, E>(exec: E, group_id: i64) -> AppResult<u64>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let res = sqlx::query(
            "UPDATE mic_assignments SET group_id = NULL, updated_at = ? WHERE group_id = ?",
        )
        .bind(chrono::Utc::now().naive_utc())
        .bind(group_id)
        .execute(exec)
        .await
        .map_err(AppError::Database)?;

        Ok(res.rows_affected())
    }

    /// Reset every assignment of a session to an empty, unflagged mic.
    pub async fn clear_session<'e, E>(exec: E, session_id: i64) -> AppResult<u64>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let res = sqlx::query(
            r#"
            UPDATE mic_assignments
            SET is_d_mic = 0, is_micd = 0, group_id = NULL, shared_presenters = '[]',
                active_slot = 0, notes = '', updated_at = ?
            WHERE session_id = ?
            "#,
        )
        .bind(chrono::Utc::now().naive_utc())
        .bind(session_id)
        .execute(exec)
        .await
        .map_err(AppError::Database)?;

        Ok(res.rows_affected())
    }

    /// Set MIC'D on every assignment of a session; D-MIC is cleared alongside.
    pub async fn set_session_micd<'e, E>(exec: E, session_id: i64, is_micd: bool) -> AppResult<u64>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let res = sqlx::query(
            r#"
            UPDATE mic_assignments
            SET is_micd = ?1,
                is_d_mic = CASE WHEN ?1 THEN 0 ELSE is_d_mic END,
                updated_at = ?2
            WHERE session_id = ?3
            "#,
        )
        .bind(is_micd)
        .bind(chrono::Utc::now().naive_utc())
        .bind(session_id)
        .execute(exec)
        .await
        .map_err(AppError::Database)?;

        Ok(res.rows_affected())
    }

    pub async fn reset_session_rotations<'e, E>(exec: E, session_id: i64) -> AppResult<u64>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let res = sqlx::query(
            r#"
            UPDATE mic_assignments
            SET is_d_mic = 0, active_slot = 0, updated_at = ?
            WHERE session_id = ?
            "#,
        )
        .bind(chrono::Utc::now().naive_utc())
        .bind(session_id)
        .execute(exec)
        .await
        .map_err(AppError::Database)?;

        Ok(res.rows_affected())
    }
}
