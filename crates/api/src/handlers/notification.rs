//! # Notification Handlers
//!
//! Read side of the notification sink. Listing and marking read are always
//! scoped to the requesting user.

use axum::extract::{Path, Query, State};
use axum::Json;
use dutyroster_core::{errors::DutyError, models::notification::Notification};
use dutyroster_db::models::DbNotification;
use serde::Deserialize;
use std::sync::Arc;
use uuid::Uuid;

use crate::middleware::{auth::CurrentUser, error_handling::AppError};
use crate::ApiState;

const DEFAULT_LIMIT: i64 = 50;

fn notification_from_db(db: DbNotification) -> Result<Notification, AppError> {
    Ok(Notification {
        id: db.id,
        user_id: db.user_id,
        title: db.title,
        message: db.message,
        kind: super::parse_status(&db.kind)?,
        read: db.read,
        read_at: db.read_at,
        created_at: db.created_at,
    })
}

#[derive(Debug, Default, Deserialize)]
pub struct ListNotificationsQuery {
    pub limit: Option<i64>,
}

#[axum::debug_handler]
pub async fn list_notifications(
    State(state): State<Arc<ApiState>>,
    Query(query): Query<ListNotificationsQuery>,
    user: CurrentUser,
) -> Result<Json<Vec<Notification>>, AppError> {
    let limit = query.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, 200);

    let notifications = dutyroster_db::repositories::notification::list_notifications_for_user(
        &state.db_pool,
        user.id,
        limit,
    )
    .await
    .map_err(DutyError::Database)?;

    notifications
        .into_iter()
        .map(notification_from_db)
        .collect::<Result<Vec<_>, _>>()
        .map(Json)
}

#[axum::debug_handler]
pub async fn mark_notification_read(
    State(state): State<Arc<ApiState>>,
    Path(id): Path<Uuid>,
    user: CurrentUser,
) -> Result<Json<Notification>, AppError> {
    let updated = dutyroster_db::repositories::notification::mark_notification_read(
        &state.db_pool,
        id,
        user.id,
    )
    .await
    .map_err(DutyError::Database)?
    .ok_or_else(|| DutyError::NotFound(format!("Notification with ID {id} not found")))?;

    Ok(Json(notification_from_db(updated)?))
}
