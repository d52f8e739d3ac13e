//! # Audit Trail Handlers
//!
//! Read-only access to the append-only duty log, for the admin activity
//! feed.

use axum::extract::{Query, State};
use axum::Json;
use dutyroster_core::{errors::DutyError, models::duty_log::DutyLog};
use dutyroster_db::models::DbDutyLog;
use serde::Deserialize;
use std::sync::Arc;

use crate::middleware::{auth::CurrentUser, error_handling::AppError};
use crate::ApiState;

const DEFAULT_LIMIT: i64 = 100;

fn log_from_db(db: DbDutyLog) -> DutyLog {
    DutyLog {
        id: db.id,
        booking_id: db.schedule_student_id,
        schedule_id: db.schedule_id,
        action: db.action,
        performed_by: db.performed_by,
        target_user: db.target_user,
        notes: db.notes,
        created_at: db.created_at,
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct ListLogsQuery {
    pub limit: Option<i64>,
}

#[axum::debug_handler]
pub async fn list_recent_logs(
    State(state): State<Arc<ApiState>>,
    Query(query): Query<ListLogsQuery>,
    user: CurrentUser,
) -> Result<Json<Vec<DutyLog>>, AppError> {
    user.require_admin()?;

    let limit = query.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, 500);

    let logs = dutyroster_db::repositories::duty_log::list_recent_logs(&state.db_pool, limit)
        .await
        .map_err(DutyError::Database)?;

    Ok(Json(logs.into_iter().map(log_from_db).collect()))
}
