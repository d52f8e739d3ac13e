use crate::models::{DbNotification, NewNotification};
use eyre::Result;
use sqlx::{Pool, Postgres};
use uuid::Uuid;

pub async fn create_notification(
    pool: &Pool<Postgres>,
    notification: &NewNotification,
) -> Result<DbNotification> {
    let id = Uuid::new_v4();

    let created = sqlx::query_as::<_, DbNotification>(
        r#"
        INSERT INTO notifications (id, user_id, title, message, type, read, created_at)
        VALUES ($1, $2, $3, $4, $5, FALSE, NOW())
        RETURNING *
        "#,
    )
    .bind(id)
    .bind(notification.user_id)
    .bind(&notification.title)
    .bind(&notification.message)
    .bind(&notification.kind)
    .fetch_one(pool)
    .await?;

    Ok(created)
}

pub async fn create_notifications(
    pool: &Pool<Postgres>,
    notifications: &[NewNotification],
) -> Result<u64> {
    let mut created = 0;
    for notification in notifications {
        create_notification(pool, notification).await?;
        created += 1;
    }
    Ok(created)
}

pub async fn list_notifications_for_user(
    pool: &Pool<Postgres>,
    user_id: Uuid,
    limit: i64,
) -> Result<Vec<DbNotification>> {
    let notifications = sqlx::query_as::<_, DbNotification>(
        r#"
        SELECT *
        FROM notifications
        WHERE user_id = $1
        ORDER BY created_at DESC
        LIMIT $2
        "#,
    )
    .bind(user_id)
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(notifications)
}

/// Marks one notification read; scoped to the owning user so one user
/// cannot touch another's notifications.
pub async fn mark_notification_read(
    pool: &Pool<Postgres>,
    id: Uuid,
    user_id: Uuid,
) -> Result<Option<DbNotification>> {
    let updated = sqlx::query_as::<_, DbNotification>(
        r#"
        UPDATE notifications
        SET read = TRUE, read_at = NOW()
        WHERE id = $1 AND user_id = $2
        RETURNING *
        "#,
    )
    .bind(id)
    .bind(user_id)
    .fetch_optional(pool)
    .await?;

    Ok(updated)
}
