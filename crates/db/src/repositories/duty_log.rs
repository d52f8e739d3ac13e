use crate::models::{DbDutyLog, NewDutyLog};
use eyre::Result;
use sqlx::{Pool, Postgres};
use uuid::Uuid;

/// Appends one audit record. The table is append-only; there is no update
/// or delete path.
pub async fn append_log(pool: &Pool<Postgres>, log: &NewDutyLog) -> Result<DbDutyLog> {
    let id = Uuid::new_v4();

    let created = sqlx::query_as::<_, DbDutyLog>(
        r#"
        INSERT INTO duty_logs (id, schedule_student_id, schedule_id, action,
                               performed_by, target_user, notes, created_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, NOW())
        RETURNING *
        "#,
    )
    .bind(id)
    .bind(log.schedule_student_id)
    .bind(log.schedule_id)
    .bind(&log.action)
    .bind(log.performed_by)
    .bind(log.target_user)
    .bind(&log.notes)
    .fetch_one(pool)
    .await?;

    Ok(created)
}

pub async fn list_recent_logs(pool: &Pool<Postgres>, limit: i64) -> Result<Vec<DbDutyLog>> {
    let logs = sqlx::query_as::<_, DbDutyLog>(
        r#"
        SELECT *
        FROM duty_logs
        ORDER BY created_at DESC
        LIMIT $1
        "#,
    )
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(logs)
}
