//! # Audit/Notification Sink
//!
//! Every mutation appends an audit record and may enqueue user-facing
//! notifications. Both are at-most-once, fire-and-forget: a failure here is
//! logged to the diagnostic channel and never fails or rolls back the
//! primary state transition.

use dutyroster_core::models::notification::NotificationKind;
use dutyroster_db::models::{NewDutyLog, NewNotification};
use sqlx::PgPool;
use uuid::Uuid;

/// Appends an audit record, swallowing any failure.
pub async fn record(pool: &PgPool, log: NewDutyLog) {
    if let Err(e) = dutyroster_db::repositories::duty_log::append_log(pool, &log).await {
        tracing::warn!(action = %log.action, error = %e, "failed to append audit log");
    }
}

/// Sends one notification, swallowing any failure.
pub async fn notify(pool: &PgPool, user_id: Uuid, title: &str, message: &str, kind: NotificationKind) {
    let notification = NewNotification {
        user_id,
        title: title.to_string(),
        message: message.to_string(),
        kind: kind.as_str().to_string(),
    };

    if let Err(e) =
        dutyroster_db::repositories::notification::create_notification(pool, &notification).await
    {
        tracing::warn!(user_id = %user_id, error = %e, "failed to create notification");
    }
}

/// Sends the same notification to several users, swallowing any failure.
pub async fn notify_many(
    pool: &PgPool,
    user_ids: &[Uuid],
    title: &str,
    message: &str,
    kind: NotificationKind,
) {
    let notifications: Vec<NewNotification> = user_ids
        .iter()
        .map(|user_id| NewNotification {
            user_id: *user_id,
            title: title.to_string(),
            message: message.to_string(),
            kind: kind.as_str().to_string(),
        })
        .collect();

    if let Err(e) =
        dutyroster_db::repositories::notification::create_notifications(pool, &notifications).await
    {
        tracing::warn!(count = user_ids.len(), error = %e, "failed to create notifications");
    }
}

/// Notifies every admin account, swallowing any failure.
pub async fn notify_admins(pool: &PgPool, title: &str, message: &str) {
    match dutyroster_db::repositories::profile::list_admin_ids(pool).await {
        Ok(admins) if !admins.is_empty() => {
            notify_many(pool, &admins, title, message, NotificationKind::Info).await;
        }
        Ok(_) => {}
        Err(e) => {
            tracing::warn!(error = %e, "failed to fetch admins for notification");
        }
    }
}
