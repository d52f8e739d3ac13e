use crate::models::{DbSchedule, DbScheduleBookingInfo, DbScheduleWithCount, NewSchedule};
use chrono::NaiveDate;
use eyre::Result;
use sqlx::{Pool, Postgres};
use uuid::Uuid;

pub async fn create_schedule(pool: &Pool<Postgres>, schedule: &NewSchedule) -> Result<DbSchedule> {
    let id = Uuid::new_v4();

    tracing::debug!(
        "Creating schedule: id={}, date={}, location={}, max_students={}",
        id,
        schedule.date,
        schedule.location,
        schedule.max_students
    );

    let created = sqlx::query_as::<_, DbSchedule>(
        r#"
        INSERT INTO schedules (id, date, description, location, shift_start, shift_end,
                               max_students, status, created_by, created_at, updated_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, 'pending', $8, NOW(), NOW())
        RETURNING *
        "#,
    )
    .bind(id)
    .bind(schedule.date)
    .bind(&schedule.description)
    .bind(&schedule.location)
    .bind(schedule.shift_start)
    .bind(schedule.shift_end)
    .bind(schedule.max_students)
    .bind(schedule.created_by)
    .fetch_one(pool)
    .await?;

    Ok(created)
}

pub async fn create_schedules_bulk(
    pool: &Pool<Postgres>,
    schedules: &[NewSchedule],
) -> Result<u64> {
    let mut created = 0;
    for schedule in schedules {
        create_schedule(pool, schedule).await?;
        created += 1;
    }
    Ok(created)
}

pub async fn get_schedule_by_id(pool: &Pool<Postgres>, id: Uuid) -> Result<Option<DbSchedule>> {
    let schedule = sqlx::query_as::<_, DbSchedule>(
        r#"
        SELECT *
        FROM schedules
        WHERE id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(schedule)
}

/// All schedules (optionally from a date onward) with their active booking
/// counts, ordered by date.
pub async fn list_schedules(
    pool: &Pool<Postgres>,
    from: Option<NaiveDate>,
) -> Result<Vec<DbScheduleWithCount>> {
    let schedules = sqlx::query_as::<_, DbScheduleWithCount>(
        r#"
        SELECT s.*,
               COUNT(ss.id) FILTER (WHERE ss.status IN ('booked', 'approved')) AS active_bookings
        FROM schedules s
        LEFT JOIN schedule_students ss ON ss.schedule_id = s.id
        WHERE ($1::date IS NULL OR s.date >= $1)
        GROUP BY s.id
        ORDER BY s.date ASC
        "#,
    )
    .bind(from)
    .fetch_all(pool)
    .await?;

    Ok(schedules)
}

pub async fn update_schedule_status(
    pool: &Pool<Postgres>,
    id: Uuid,
    status: &str,
    approver: Option<Uuid>,
) -> Result<DbSchedule> {
    tracing::debug!("Updating schedule status: id={}, status={}", id, status);

    // The approver stamp is only written on approval; other transitions
    // leave any previous stamp in place.
    let updated = sqlx::query_as::<_, DbSchedule>(
        r#"
        UPDATE schedules
        SET status = $2,
            approved_by = CASE WHEN $2 = 'approved' THEN $3 ELSE approved_by END,
            approved_at = CASE WHEN $2 = 'approved' THEN NOW() ELSE approved_at END,
            updated_at = NOW()
        WHERE id = $1
        RETURNING *
        "#,
    )
    .bind(id)
    .bind(status)
    .bind(approver)
    .fetch_one(pool)
    .await?;

    Ok(updated)
}

pub async fn delete_schedule(pool: &Pool<Postgres>, id: Uuid) -> Result<()> {
    sqlx::query(
        r#"
        DELETE FROM schedules
        WHERE id = $1
        "#,
    )
    .bind(id)
    .execute(pool)
    .await?;

    Ok(())
}

/// Capacity snapshot used by the booking fast path. Mirrors what the
/// storage-level constraint will enforce at insert time.
pub async fn get_schedule_booking_info(
    pool: &Pool<Postgres>,
    id: Uuid,
) -> Result<Option<DbScheduleBookingInfo>> {
    let info = sqlx::query_as::<_, DbScheduleBookingInfo>(
        r#"
        SELECT s.date AS schedule_date,
               s.location,
               s.max_students,
               COUNT(ss.id) FILTER (WHERE ss.status IN ('booked', 'approved')) AS current_bookings,
               COUNT(ss.id) FILTER (WHERE ss.status IN ('booked', 'approved')) >= s.max_students AS is_full
        FROM schedules s
        LEFT JOIN schedule_students ss ON ss.schedule_id = s.id
        WHERE s.id = $1
        GROUP BY s.id
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(info)
}
