use chrono::NaiveDate;
use dutyroster_api::middleware::error_handling::AppError;
use dutyroster_core::{
    errors::DutyError,
    models::{booking::BookingStatus, schedule::ScheduleStatus},
    rules,
};
use dutyroster_db::models::DbBooking;
use dutyroster_db::repositories::booking::BookingInsert;
use mockall::predicate;
use pretty_assertions::assert_eq;
use uuid::Uuid;

use crate::test_utils::{
    sample_booking, sample_booking_info, test_date, TestContext,
};

// Test wrappers that run the handler logic against mocked repositories.

/// Mirrors the book_duty flow: assemble the validation snapshot from the
/// repositories, run the booking rules, then insert.
async fn book_duty_wrapper(
    ctx: &mut TestContext,
    schedule_id: Uuid,
    student_id: Uuid,
    today: NaiveDate,
) -> Result<DbBooking, AppError> {
    let info = ctx
        .schedule_repo
        .get_schedule_booking_info(schedule_id)
        .await?
        .ok_or_else(|| {
            AppError(DutyError::NotFound(format!(
                "Schedule with ID {schedule_id} not found"
            )))
        })?;

    let already_booked = ctx
        .booking_repo
        .has_active_booking(schedule_id, student_id)
        .await?;
    let has_duty_on_date = ctx
        .booking_repo
        .has_active_booking_on_date(student_id, info.schedule_date)
        .await?;
    let cancelled_same_day = ctx
        .booking_repo
        .has_same_day_cancellation(student_id, info.schedule_date, today)
        .await?;

    let snapshot = rules::BookingContext {
        schedule_date: info.schedule_date,
        max_students: info.max_students,
        active_bookings: info.current_bookings,
        already_booked,
        has_duty_on_date,
        cancelled_same_day,
    };
    rules::validate_booking(&snapshot, today)?;

    match ctx.booking_repo.create_booking(schedule_id, student_id).await? {
        BookingInsert::Created(booking) => Ok(booking),
        BookingInsert::Duplicate => Err(AppError(DutyError::Conflict(
            "You have already booked this duty".to_string(),
        ))),
        BookingInsert::Full => Err(AppError(DutyError::Conflict(
            "This duty is fully booked".to_string(),
        ))),
        BookingInsert::DateTaken => Err(AppError(DutyError::Conflict(
            "You already have a duty scheduled for this date. Students can only have one duty per day"
                .to_string(),
        ))),
    }
}

/// Mirrors approve_booking: flip the booking, then cascade the schedule
/// status once no pending bookings remain. Returns the cascaded status.
async fn approve_booking_wrapper(
    ctx: &mut TestContext,
    booking_id: Uuid,
    admin_id: Uuid,
) -> Result<Option<ScheduleStatus>, AppError> {
    let booking = ctx
        .booking_repo
        .get_booking_by_id(booking_id)
        .await?
        .ok_or_else(|| {
            AppError(DutyError::NotFound(format!(
                "Booking with ID {booking_id} not found"
            )))
        })?;

    let status: BookingStatus = booking.status.parse().map_err(DutyError::Validation)?;
    rules::validate_approval(status)?;

    ctx.booking_repo.approve_booking(booking_id).await?;

    let remaining = ctx
        .booking_repo
        .count_booked_for_schedule(booking.schedule_id)
        .await?;
    let cascade = rules::schedule_status_after_approval(remaining);
    if let Some(next) = cascade {
        ctx.schedule_repo
            .update_schedule_status(booking.schedule_id, next.as_str().to_string(), Some(admin_id))
            .await?;
    }

    Ok(cascade)
}

/// Mirrors reject_booking: cancel the booking, then revert the schedule to
/// pending when the last pending booking is gone.
async fn reject_booking_wrapper(
    ctx: &mut TestContext,
    booking_id: Uuid,
    reason: String,
) -> Result<Option<ScheduleStatus>, AppError> {
    let booking = ctx
        .booking_repo
        .get_booking_by_id(booking_id)
        .await?
        .ok_or_else(|| {
            AppError(DutyError::NotFound(format!(
                "Booking with ID {booking_id} not found"
            )))
        })?;

    let status: BookingStatus = booking.status.parse().map_err(DutyError::Validation)?;
    rules::validate_rejection(status)?;

    ctx.booking_repo.cancel_booking(booking_id, reason).await?;

    let remaining = ctx
        .booking_repo
        .count_booked_for_schedule(booking.schedule_id)
        .await?;
    let cascade = rules::schedule_status_after_rejection(remaining);
    if let Some(next) = cascade {
        ctx.schedule_repo
            .update_schedule_status(booking.schedule_id, next.as_str().to_string(), None)
            .await?;
    }

    Ok(cascade)
}

/// Mirrors approve_all_bookings: flip every pending booking in one pass and
/// mark the schedule approved unconditionally.
async fn approve_all_wrapper(
    ctx: &mut TestContext,
    schedule_id: Uuid,
    admin_id: Uuid,
) -> Result<usize, AppError> {
    let approved = ctx
        .booking_repo
        .approve_all_for_schedule(schedule_id)
        .await?;

    ctx.schedule_repo
        .update_schedule_status(
            schedule_id,
            ScheduleStatus::Approved.as_str().to_string(),
            Some(admin_id),
        )
        .await?;

    Ok(approved.len())
}

/// Mirrors reject_all_bookings: cancel every pending booking and withdraw
/// the schedule outright.
async fn reject_all_wrapper(
    ctx: &mut TestContext,
    schedule_id: Uuid,
    reason: String,
) -> Result<usize, AppError> {
    let cancelled = ctx
        .booking_repo
        .cancel_all_for_schedule(schedule_id, reason)
        .await?;

    ctx.schedule_repo
        .update_schedule_status(
            schedule_id,
            ScheduleStatus::Cancelled.as_str().to_string(),
            None,
        )
        .await?;

    Ok(cancelled.len())
}

#[tokio::test]
async fn test_book_duty_success() {
    let mut ctx = TestContext::new();
    let schedule_id = Uuid::new_v4();
    let student_id = Uuid::new_v4();
    let today = test_date(2025, 3, 10);
    let duty_date = test_date(2025, 3, 12);

    ctx.schedule_repo
        .expect_get_schedule_booking_info()
        .with(predicate::eq(schedule_id))
        .returning(move |_| Ok(Some(sample_booking_info(duty_date, 2, 0))));
    ctx.booking_repo
        .expect_has_active_booking()
        .returning(|_, _| Ok(false));
    ctx.booking_repo
        .expect_has_active_booking_on_date()
        .returning(|_, _| Ok(false));
    ctx.booking_repo
        .expect_has_same_day_cancellation()
        .returning(|_, _, _| Ok(false));
    ctx.booking_repo
        .expect_create_booking()
        .with(predicate::eq(schedule_id), predicate::eq(student_id))
        .returning(move |s, st| Ok(BookingInsert::Created(sample_booking(Uuid::new_v4(), s, st, "booked"))));

    let booking = book_duty_wrapper(&mut ctx, schedule_id, student_id, today)
        .await
        .expect("booking should succeed");

    assert_eq!(booking.schedule_id, schedule_id);
    assert_eq!(booking.student_id, student_id);
    assert_eq!(booking.status, "booked");
}

#[tokio::test]
async fn test_book_duty_rejected_when_full() {
    let mut ctx = TestContext::new();
    let schedule_id = Uuid::new_v4();
    let student_id = Uuid::new_v4();
    let today = test_date(2025, 3, 10);
    let duty_date = test_date(2025, 3, 12);

    ctx.schedule_repo
        .expect_get_schedule_booking_info()
        .returning(move |_| Ok(Some(sample_booking_info(duty_date, 2, 2))));
    ctx.booking_repo
        .expect_has_active_booking()
        .returning(|_, _| Ok(false));
    ctx.booking_repo
        .expect_has_active_booking_on_date()
        .returning(|_, _| Ok(false));
    ctx.booking_repo
        .expect_has_same_day_cancellation()
        .returning(|_, _, _| Ok(false));

    let result = book_duty_wrapper(&mut ctx, schedule_id, student_id, today).await;

    match result {
        Err(AppError(DutyError::Validation(msg))) => {
            assert_eq!(msg, "This duty is fully booked (2/2 students assigned)");
        }
        other => panic!("expected validation error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_book_duty_duplicate_insert_is_conflict() {
    // The validator saw a stale snapshot; the unique index caught the race
    // and the caller gets a conflict, not an internal error.
    let mut ctx = TestContext::new();
    let schedule_id = Uuid::new_v4();
    let student_id = Uuid::new_v4();
    let today = test_date(2025, 3, 10);
    let duty_date = test_date(2025, 3, 12);

    ctx.schedule_repo
        .expect_get_schedule_booking_info()
        .returning(move |_| Ok(Some(sample_booking_info(duty_date, 2, 0))));
    ctx.booking_repo
        .expect_has_active_booking()
        .returning(|_, _| Ok(false));
    ctx.booking_repo
        .expect_has_active_booking_on_date()
        .returning(|_, _| Ok(false));
    ctx.booking_repo
        .expect_has_same_day_cancellation()
        .returning(|_, _, _| Ok(false));
    ctx.booking_repo
        .expect_create_booking()
        .returning(|_, _| Ok(BookingInsert::Duplicate));

    let result = book_duty_wrapper(&mut ctx, schedule_id, student_id, today).await;

    assert!(matches!(result, Err(AppError(DutyError::Conflict(_)))));
}

#[tokio::test]
async fn test_book_duty_capacity_race_is_conflict() {
    // Two students raced for the last slot; this one's snapshot still showed
    // it open, but the insert transaction found the schedule full.
    let mut ctx = TestContext::new();
    let schedule_id = Uuid::new_v4();
    let student_id = Uuid::new_v4();
    let today = test_date(2025, 3, 10);
    let duty_date = test_date(2025, 3, 12);

    ctx.schedule_repo
        .expect_get_schedule_booking_info()
        .returning(move |_| Ok(Some(sample_booking_info(duty_date, 2, 1))));
    ctx.booking_repo
        .expect_has_active_booking()
        .returning(|_, _| Ok(false));
    ctx.booking_repo
        .expect_has_active_booking_on_date()
        .returning(|_, _| Ok(false));
    ctx.booking_repo
        .expect_has_same_day_cancellation()
        .returning(|_, _, _| Ok(false));
    ctx.booking_repo
        .expect_create_booking()
        .returning(|_, _| Ok(BookingInsert::Full));

    let result = book_duty_wrapper(&mut ctx, schedule_id, student_id, today).await;

    match result {
        Err(AppError(DutyError::Conflict(msg))) => {
            assert_eq!(msg, "This duty is fully booked");
        }
        other => panic!("expected conflict error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_book_duty_same_date_race_is_conflict() {
    // The student's booking on another schedule for the same date committed
    // between the snapshot and the insert.
    let mut ctx = TestContext::new();
    let schedule_id = Uuid::new_v4();
    let student_id = Uuid::new_v4();
    let today = test_date(2025, 3, 10);
    let duty_date = test_date(2025, 3, 12);

    ctx.schedule_repo
        .expect_get_schedule_booking_info()
        .returning(move |_| Ok(Some(sample_booking_info(duty_date, 2, 0))));
    ctx.booking_repo
        .expect_has_active_booking()
        .returning(|_, _| Ok(false));
    ctx.booking_repo
        .expect_has_active_booking_on_date()
        .returning(|_, _| Ok(false));
    ctx.booking_repo
        .expect_has_same_day_cancellation()
        .returning(|_, _, _| Ok(false));
    ctx.booking_repo
        .expect_create_booking()
        .returning(|_, _| Ok(BookingInsert::DateTaken));

    let result = book_duty_wrapper(&mut ctx, schedule_id, student_id, today).await;

    assert!(matches!(result, Err(AppError(DutyError::Conflict(_)))));
}

#[tokio::test]
async fn test_book_duty_unknown_schedule_is_not_found() {
    let mut ctx = TestContext::new();
    ctx.schedule_repo
        .expect_get_schedule_booking_info()
        .returning(|_| Ok(None));

    let result = book_duty_wrapper(
        &mut ctx,
        Uuid::new_v4(),
        Uuid::new_v4(),
        test_date(2025, 3, 10),
    )
    .await;

    assert!(matches!(result, Err(AppError(DutyError::NotFound(_)))));
}

#[tokio::test]
async fn test_approving_last_booking_approves_schedule() {
    let mut ctx = TestContext::new();
    let booking_id = Uuid::new_v4();
    let schedule_id = Uuid::new_v4();
    let admin_id = Uuid::new_v4();

    ctx.booking_repo
        .expect_get_booking_by_id()
        .returning(move |id| Ok(Some(sample_booking(id, schedule_id, Uuid::new_v4(), "booked"))));
    ctx.booking_repo
        .expect_approve_booking()
        .with(predicate::eq(booking_id))
        .returning(move |id| Ok(sample_booking(id, schedule_id, Uuid::new_v4(), "approved")));
    ctx.booking_repo
        .expect_count_booked_for_schedule()
        .returning(|_| Ok(0));
    ctx.schedule_repo
        .expect_update_schedule_status()
        .with(
            predicate::eq(schedule_id),
            predicate::eq("approved".to_string()),
            predicate::eq(Some(admin_id)),
        )
        .times(1)
        .returning(move |id, _, _| Ok(crate::test_utils::sample_schedule(id, test_date(2025, 3, 12), 2)));

    let cascade = approve_booking_wrapper(&mut ctx, booking_id, admin_id)
        .await
        .expect("approval should succeed");

    assert_eq!(cascade, Some(ScheduleStatus::Approved));
}

#[tokio::test]
async fn test_approval_with_pending_remaining_leaves_schedule() {
    let mut ctx = TestContext::new();
    let booking_id = Uuid::new_v4();
    let schedule_id = Uuid::new_v4();

    ctx.booking_repo
        .expect_get_booking_by_id()
        .returning(move |id| Ok(Some(sample_booking(id, schedule_id, Uuid::new_v4(), "booked"))));
    ctx.booking_repo
        .expect_approve_booking()
        .returning(move |id| Ok(sample_booking(id, schedule_id, Uuid::new_v4(), "approved")));
    ctx.booking_repo
        .expect_count_booked_for_schedule()
        .returning(|_| Ok(1));
    // No update_schedule_status expectation: calling it would panic.

    let cascade = approve_booking_wrapper(&mut ctx, booking_id, Uuid::new_v4())
        .await
        .expect("approval should succeed");

    assert_eq!(cascade, None);
}

#[tokio::test]
async fn test_approving_cancelled_booking_fails() {
    let mut ctx = TestContext::new();
    let schedule_id = Uuid::new_v4();

    ctx.booking_repo
        .expect_get_booking_by_id()
        .returning(move |id| {
            Ok(Some(sample_booking(id, schedule_id, Uuid::new_v4(), "cancelled")))
        });

    let result = approve_booking_wrapper(&mut ctx, Uuid::new_v4(), Uuid::new_v4()).await;

    assert!(matches!(result, Err(AppError(DutyError::Validation(_)))));
}

#[tokio::test]
async fn test_rejecting_last_booking_reverts_schedule_to_pending() {
    let mut ctx = TestContext::new();
    let booking_id = Uuid::new_v4();
    let schedule_id = Uuid::new_v4();

    ctx.booking_repo
        .expect_get_booking_by_id()
        .returning(move |id| Ok(Some(sample_booking(id, schedule_id, Uuid::new_v4(), "booked"))));
    ctx.booking_repo
        .expect_cancel_booking()
        .returning(move |id, _| Ok(sample_booking(id, schedule_id, Uuid::new_v4(), "cancelled")));
    ctx.booking_repo
        .expect_count_booked_for_schedule()
        .returning(|_| Ok(0));
    ctx.schedule_repo
        .expect_update_schedule_status()
        .with(
            predicate::eq(schedule_id),
            predicate::eq("pending".to_string()),
            predicate::eq(None),
        )
        .times(1)
        .returning(move |id, _, _| Ok(crate::test_utils::sample_schedule(id, test_date(2025, 3, 12), 2)));

    let cascade = reject_booking_wrapper(&mut ctx, booking_id, "Rejected by admin".to_string())
        .await
        .expect("rejection should succeed");

    assert_eq!(cascade, Some(ScheduleStatus::Pending));
}

#[tokio::test]
async fn test_approve_all_flips_bookings_and_schedule() {
    let mut ctx = TestContext::new();
    let schedule_id = Uuid::new_v4();
    let admin_id = Uuid::new_v4();

    ctx.booking_repo
        .expect_approve_all_for_schedule()
        .with(predicate::eq(schedule_id))
        .returning(move |sid| {
            Ok(vec![
                sample_booking(Uuid::new_v4(), sid, Uuid::new_v4(), "approved"),
                sample_booking(Uuid::new_v4(), sid, Uuid::new_v4(), "approved"),
            ])
        });
    ctx.schedule_repo
        .expect_update_schedule_status()
        .with(
            predicate::eq(schedule_id),
            predicate::eq("approved".to_string()),
            predicate::eq(Some(admin_id)),
        )
        .times(1)
        .returning(move |id, _, _| Ok(crate::test_utils::sample_schedule(id, test_date(2025, 3, 12), 2)));

    let approved = approve_all_wrapper(&mut ctx, schedule_id, admin_id)
        .await
        .expect("bulk approval should succeed");

    assert_eq!(approved, 2);
}

#[tokio::test]
async fn test_approve_all_with_no_pending_still_approves_schedule() {
    // The schedule status flip is unconditional: it happens even when the
    // pass touched no bookings.
    let mut ctx = TestContext::new();
    let schedule_id = Uuid::new_v4();
    let admin_id = Uuid::new_v4();

    ctx.booking_repo
        .expect_approve_all_for_schedule()
        .returning(|_| Ok(vec![]));
    ctx.schedule_repo
        .expect_update_schedule_status()
        .with(
            predicate::eq(schedule_id),
            predicate::eq("approved".to_string()),
            predicate::eq(Some(admin_id)),
        )
        .times(1)
        .returning(move |id, _, _| Ok(crate::test_utils::sample_schedule(id, test_date(2025, 3, 12), 2)));

    let approved = approve_all_wrapper(&mut ctx, schedule_id, admin_id)
        .await
        .expect("bulk approval should succeed");

    assert_eq!(approved, 0);
}

#[tokio::test]
async fn test_reject_all_withdraws_schedule() {
    let mut ctx = TestContext::new();
    let schedule_id = Uuid::new_v4();

    ctx.booking_repo
        .expect_cancel_all_for_schedule()
        .returning(move |sid, _| {
            Ok(vec![
                sample_booking(Uuid::new_v4(), sid, Uuid::new_v4(), "cancelled"),
                sample_booking(Uuid::new_v4(), sid, Uuid::new_v4(), "cancelled"),
            ])
        });
    ctx.schedule_repo
        .expect_update_schedule_status()
        .with(
            predicate::eq(schedule_id),
            predicate::eq("cancelled".to_string()),
            predicate::eq(None),
        )
        .times(1)
        .returning(move |id, _, _| Ok(crate::test_utils::sample_schedule(id, test_date(2025, 3, 12), 2)));

    let rejected = reject_all_wrapper(&mut ctx, schedule_id, "Schedule rejected by admin".to_string())
        .await
        .expect("bulk rejection should succeed");

    assert_eq!(rejected, 2);
}
