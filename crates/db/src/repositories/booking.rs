use crate::models::{DbBooking, DbBookingDetail, DbBookingStatusCount, DbStudentDutyStat};
use chrono::{NaiveDate, Utc};
use eyre::{eyre, Result};
use sqlx::{Pool, Postgres};
use uuid::Uuid;

/// Postgres unique_violation, raised by the partial unique index on
/// (schedule_id, student_id) over non-cancelled rows.
const UNIQUE_VIOLATION: &str = "23505";

/// Outcome of a booking insert. Every variant other than `Created` is an
/// expected, recoverable result of two racing attempts, not a transport
/// error: the insert transaction re-checked committed state under lock and
/// found the handler's snapshot stale.
#[derive(Debug)]
pub enum BookingInsert {
    Created(DbBooking),
    /// The student already holds a non-cancelled booking on this schedule.
    Duplicate,
    /// Active bookings reached max_students before this insert committed.
    Full,
    /// The student holds an active booking elsewhere on the same date.
    DateTaken,
}

/// Inserts a booking inside one transaction that is the authoritative guard
/// against races. The schedule row and the student's profile row are locked
/// `FOR UPDATE`, so concurrent attempts for the same slot (any students) or
/// by the same student (any schedules) serialize here, and the capacity and
/// one-duty-per-day re-checks below see committed state. The partial unique
/// index still backstops the duplicate case.
pub async fn create_booking(
    pool: &Pool<Postgres>,
    schedule_id: Uuid,
    student_id: Uuid,
) -> Result<BookingInsert> {
    let id = Uuid::new_v4();
    let now = Utc::now();

    tracing::debug!(
        "Creating booking: id={}, schedule_id={}, student_id={}",
        id,
        schedule_id,
        student_id
    );

    let mut tx = pool.begin().await?;

    // Lock order is schedule then profile everywhere this pair is taken.
    let schedule = sqlx::query_as::<_, (NaiveDate, i32)>(
        r#"
        SELECT date, max_students
        FROM schedules
        WHERE id = $1
        FOR UPDATE
        "#,
    )
    .bind(schedule_id)
    .fetch_optional(&mut *tx)
    .await?
    .ok_or_else(|| eyre!("Schedule not found: {schedule_id}"))?;
    let (schedule_date, max_students) = schedule;

    sqlx::query(
        r#"
        SELECT 1
        FROM profiles
        WHERE id = $1
        FOR UPDATE
        "#,
    )
    .bind(student_id)
    .execute(&mut *tx)
    .await?;

    let active = sqlx::query_scalar::<_, i64>(
        r#"
        SELECT COUNT(*)
        FROM schedule_students
        WHERE schedule_id = $1 AND status IN ('booked', 'approved')
        "#,
    )
    .bind(schedule_id)
    .fetch_one(&mut *tx)
    .await?;

    if active >= max_students as i64 {
        tracing::debug!(
            "Capacity reached before insert committed: schedule_id={}, active={}",
            schedule_id,
            active
        );
        return Ok(BookingInsert::Full);
    }

    let date_taken = sqlx::query_scalar::<_, bool>(
        r#"
        SELECT EXISTS (
            SELECT 1
            FROM schedule_students ss
            JOIN schedules s ON s.id = ss.schedule_id
            WHERE ss.student_id = $1 AND s.date = $2
              AND ss.status IN ('booked', 'approved')
        )
        "#,
    )
    .bind(student_id)
    .bind(schedule_date)
    .fetch_one(&mut *tx)
    .await?;

    if date_taken {
        tracing::debug!(
            "Same-date booking committed before insert: student_id={}, date={}",
            student_id,
            schedule_date
        );
        return Ok(BookingInsert::DateTaken);
    }

    let result = sqlx::query_as::<_, DbBooking>(
        r#"
        INSERT INTO schedule_students (id, schedule_id, student_id, booking_time, status, updated_at)
        VALUES ($1, $2, $3, $4, 'booked', $4)
        RETURNING *
        "#,
    )
    .bind(id)
    .bind(schedule_id)
    .bind(student_id)
    .bind(now)
    .fetch_one(&mut *tx)
    .await;

    match result {
        Ok(booking) => {
            tx.commit().await?;
            Ok(BookingInsert::Created(booking))
        }
        Err(sqlx::Error::Database(e)) if e.code().as_deref() == Some(UNIQUE_VIOLATION) => {
            tracing::debug!(
                "Duplicate booking detected by unique index: schedule_id={}, student_id={}",
                schedule_id,
                student_id
            );
            Ok(BookingInsert::Duplicate)
        }
        Err(e) => Err(e.into()),
    }
}

pub async fn get_booking_by_id(pool: &Pool<Postgres>, id: Uuid) -> Result<Option<DbBooking>> {
    let booking = sqlx::query_as::<_, DbBooking>(
        r#"
        SELECT *
        FROM schedule_students
        WHERE id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(booking)
}

/// Whether the student holds an active booking on this schedule.
pub async fn has_active_booking(
    pool: &Pool<Postgres>,
    schedule_id: Uuid,
    student_id: Uuid,
) -> Result<bool> {
    let exists = sqlx::query_scalar::<_, bool>(
        r#"
        SELECT EXISTS (
            SELECT 1
            FROM schedule_students
            WHERE schedule_id = $1 AND student_id = $2
              AND status IN ('booked', 'approved')
        )
        "#,
    )
    .bind(schedule_id)
    .bind(student_id)
    .fetch_one(pool)
    .await?;

    Ok(exists)
}

/// Whether the student holds an active booking on any schedule for the date.
pub async fn has_active_booking_on_date(
    pool: &Pool<Postgres>,
    student_id: Uuid,
    date: NaiveDate,
) -> Result<bool> {
    let exists = sqlx::query_scalar::<_, bool>(
        r#"
        SELECT EXISTS (
            SELECT 1
            FROM schedule_students ss
            JOIN schedules s ON s.id = ss.schedule_id
            WHERE ss.student_id = $1 AND s.date = $2
              AND ss.status IN ('booked', 'approved')
        )
        "#,
    )
    .bind(student_id)
    .bind(date)
    .fetch_one(pool)
    .await?;

    Ok(exists)
}

/// Whether the student cancelled a booking for this duty date on the given
/// calendar day. Drives the same-day rebooking lockout.
pub async fn has_same_day_cancellation(
    pool: &Pool<Postgres>,
    student_id: Uuid,
    date: NaiveDate,
    today: NaiveDate,
) -> Result<bool> {
    let exists = sqlx::query_scalar::<_, bool>(
        r#"
        SELECT EXISTS (
            SELECT 1
            FROM schedule_students ss
            JOIN schedules s ON s.id = ss.schedule_id
            WHERE ss.student_id = $1 AND s.date = $2
              AND ss.status = 'cancelled'
              AND (ss.cancelled_at AT TIME ZONE 'UTC')::date = $3
        )
        "#,
    )
    .bind(student_id)
    .bind(date)
    .bind(today)
    .fetch_one(pool)
    .await?;

    Ok(exists)
}

pub async fn count_booked_for_schedule(pool: &Pool<Postgres>, schedule_id: Uuid) -> Result<i64> {
    let count = sqlx::query_scalar::<_, i64>(
        r#"
        SELECT COUNT(*)
        FROM schedule_students
        WHERE schedule_id = $1 AND status = 'booked'
        "#,
    )
    .bind(schedule_id)
    .fetch_one(pool)
    .await?;

    Ok(count)
}

pub async fn approve_booking(pool: &Pool<Postgres>, id: Uuid) -> Result<DbBooking> {
    let updated = sqlx::query_as::<_, DbBooking>(
        r#"
        UPDATE schedule_students
        SET status = 'approved', updated_at = NOW()
        WHERE id = $1
        RETURNING *
        "#,
    )
    .bind(id)
    .fetch_one(pool)
    .await?;

    Ok(updated)
}

pub async fn cancel_booking(pool: &Pool<Postgres>, id: Uuid, reason: &str) -> Result<DbBooking> {
    let updated = sqlx::query_as::<_, DbBooking>(
        r#"
        UPDATE schedule_students
        SET status = 'cancelled', cancelled_at = NOW(),
            cancellation_reason = $2, updated_at = NOW()
        WHERE id = $1
        RETURNING *
        "#,
    )
    .bind(id)
    .bind(reason)
    .fetch_one(pool)
    .await?;

    Ok(updated)
}

pub async fn complete_booking(pool: &Pool<Postgres>, id: Uuid) -> Result<DbBooking> {
    let updated = sqlx::query_as::<_, DbBooking>(
        r#"
        UPDATE schedule_students
        SET status = 'completed', completed_at = NOW(), updated_at = NOW()
        WHERE id = $1
        RETURNING *
        "#,
    )
    .bind(id)
    .fetch_one(pool)
    .await?;

    Ok(updated)
}

/// Flips every pending booking on the schedule to approved in one pass.
pub async fn approve_all_for_schedule(
    pool: &Pool<Postgres>,
    schedule_id: Uuid,
) -> Result<Vec<DbBooking>> {
    let updated = sqlx::query_as::<_, DbBooking>(
        r#"
        UPDATE schedule_students
        SET status = 'approved', updated_at = NOW()
        WHERE schedule_id = $1 AND status = 'booked'
        RETURNING *
        "#,
    )
    .bind(schedule_id)
    .fetch_all(pool)
    .await?;

    Ok(updated)
}

/// Cancels every pending booking on the schedule in one pass.
pub async fn cancel_all_for_schedule(
    pool: &Pool<Postgres>,
    schedule_id: Uuid,
    reason: &str,
) -> Result<Vec<DbBooking>> {
    let updated = sqlx::query_as::<_, DbBooking>(
        r#"
        UPDATE schedule_students
        SET status = 'cancelled', cancelled_at = NOW(),
            cancellation_reason = $2, updated_at = NOW()
        WHERE schedule_id = $1 AND status = 'booked'
        RETURNING *
        "#,
    )
    .bind(schedule_id)
    .bind(reason)
    .fetch_all(pool)
    .await?;

    Ok(updated)
}

/// Cancels a student's active bookings for duties on or after the given
/// date. Used when an admin deactivates the account.
pub async fn cancel_active_bookings_for_student(
    pool: &Pool<Postgres>,
    student_id: Uuid,
    from: NaiveDate,
    reason: &str,
) -> Result<u64> {
    let result = sqlx::query(
        r#"
        UPDATE schedule_students ss
        SET status = 'cancelled', cancelled_at = NOW(),
            cancellation_reason = $3, updated_at = NOW()
        FROM schedules s
        WHERE s.id = ss.schedule_id
          AND ss.student_id = $1
          AND s.date >= $2
          AND ss.status IN ('booked', 'approved')
        "#,
    )
    .bind(student_id)
    .bind(from)
    .bind(reason)
    .execute(pool)
    .await?;

    Ok(result.rows_affected())
}

const BOOKING_DETAIL_SELECT: &str = r#"
    SELECT ss.id, ss.schedule_id, ss.student_id, ss.booking_time, ss.status,
           ss.cancelled_at, ss.cancellation_reason, ss.completed_at,
           s.date, s.location, s.shift_start, s.shift_end,
           p.full_name, p.email
    FROM schedule_students ss
    JOIN schedules s ON s.id = ss.schedule_id
    JOIN profiles p ON p.id = ss.student_id
"#;

/// Pending bookings across all schedules, newest first, for the admin
/// approval queue.
pub async fn list_pending_bookings(pool: &Pool<Postgres>) -> Result<Vec<DbBookingDetail>> {
    let query = format!(
        "{BOOKING_DETAIL_SELECT} WHERE ss.status = 'booked' ORDER BY ss.booking_time DESC"
    );

    let bookings = sqlx::query_as::<_, DbBookingDetail>(&query)
        .fetch_all(pool)
        .await?;

    Ok(bookings)
}

pub async fn list_bookings_for_schedule(
    pool: &Pool<Postgres>,
    schedule_id: Uuid,
) -> Result<Vec<DbBookingDetail>> {
    let query = format!(
        "{BOOKING_DETAIL_SELECT} WHERE ss.schedule_id = $1 ORDER BY ss.booking_time ASC"
    );

    let bookings = sqlx::query_as::<_, DbBookingDetail>(&query)
        .bind(schedule_id)
        .fetch_all(pool)
        .await?;

    Ok(bookings)
}

/// A student's full duty history, newest booking first.
pub async fn list_student_duties(
    pool: &Pool<Postgres>,
    student_id: Uuid,
) -> Result<Vec<DbBookingDetail>> {
    let query = format!(
        "{BOOKING_DETAIL_SELECT} WHERE ss.student_id = $1 ORDER BY ss.booking_time DESC"
    );

    let duties = sqlx::query_as::<_, DbBookingDetail>(&query)
        .bind(student_id)
        .fetch_all(pool)
        .await?;

    Ok(duties)
}

/// Booking counts grouped by status.
pub async fn booking_stats(pool: &Pool<Postgres>) -> Result<Vec<DbBookingStatusCount>> {
    let counts = sqlx::query_as::<_, DbBookingStatusCount>(
        r#"
        SELECT status, COUNT(*) AS count
        FROM schedule_students
        GROUP BY status
        "#,
    )
    .fetch_all(pool)
    .await?;

    Ok(counts)
}

/// Per-student duty numbers over a reporting window.
pub async fn student_duty_stats(
    pool: &Pool<Postgres>,
    start: NaiveDate,
    end: NaiveDate,
) -> Result<Vec<DbStudentDutyStat>> {
    let stats = sqlx::query_as::<_, DbStudentDutyStat>(
        r#"
        SELECT p.id AS student_id,
               p.full_name,
               COUNT(ss.id) AS total,
               COUNT(ss.id) FILTER (WHERE ss.status = 'completed') AS completed,
               COUNT(ss.id) FILTER (WHERE ss.status = 'cancelled') AS cancelled
        FROM schedule_students ss
        JOIN schedules s ON s.id = ss.schedule_id
        JOIN profiles p ON p.id = ss.student_id
        WHERE s.date BETWEEN $1 AND $2
        GROUP BY p.id, p.full_name
        ORDER BY p.full_name ASC
        "#,
    )
    .bind(start)
    .bind(end)
    .fetch_all(pool)
    .await?;

    Ok(stats)
}
