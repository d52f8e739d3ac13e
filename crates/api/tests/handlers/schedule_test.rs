use chrono::NaiveDate;
use dutyroster_api::middleware::error_handling::AppError;
use dutyroster_core::{
    errors::DutyError,
    models::schedule::{capacity_for_location, location_for_date},
    rules,
};
use dutyroster_db::models::{DbSchedule, NewSchedule};
use mockall::predicate;
use pretty_assertions::assert_eq;
use uuid::Uuid;

use crate::test_utils::{sample_booking_detail, sample_schedule, test_date, TestContext};

/// Mirrors create_schedule: date and capacity checks, capacity defaulted
/// from the location roster.
async fn create_schedule_wrapper(
    ctx: &mut TestContext,
    date: NaiveDate,
    location: String,
    max_students: Option<i32>,
    today: NaiveDate,
) -> Result<DbSchedule, AppError> {
    rules::validate_schedule_date(date, today)?;

    let max_students = max_students.unwrap_or_else(|| capacity_for_location(&location));
    rules::validate_capacity(max_students)?;

    let schedule = ctx
        .schedule_repo
        .create_schedule(NewSchedule {
            date,
            description: None,
            location,
            shift_start: chrono::NaiveTime::from_hms_opt(8, 0, 0).unwrap(),
            shift_end: chrono::NaiveTime::from_hms_opt(20, 0, 0).unwrap(),
            max_students,
            created_by: None,
        })
        .await?;

    Ok(schedule)
}

/// Mirrors get_schedule: join the schedule with its bookings.
async fn get_schedule_wrapper(
    ctx: &mut TestContext,
    id: Uuid,
) -> Result<(DbSchedule, usize), AppError> {
    let schedule = ctx
        .schedule_repo
        .get_schedule_by_id(id)
        .await?
        .ok_or_else(|| AppError(DutyError::NotFound(format!("Schedule with ID {id} not found"))))?;

    let bookings = ctx.booking_repo.list_bookings_for_schedule(id).await?;

    Ok((schedule, bookings.len()))
}

#[tokio::test]
async fn test_create_schedule_defaults_capacity_from_roster() {
    let mut ctx = TestContext::new();
    let today = test_date(2025, 3, 10);
    let date = test_date(2025, 3, 12);

    ctx.schedule_repo
        .expect_create_schedule()
        .withf(|s| s.location == "ISPH - Gab. Silang" && s.max_students == 2)
        .returning(|s| {
            let mut created = sample_schedule(Uuid::new_v4(), s.date, s.max_students);
            created.location = s.location;
            Ok(created)
        });

    let schedule = create_schedule_wrapper(
        &mut ctx,
        date,
        "ISPH - Gab. Silang".to_string(),
        None,
        today,
    )
    .await
    .expect("creation should succeed");

    assert_eq!(schedule.max_students, 2);
}

#[tokio::test]
async fn test_create_schedule_rejects_past_date() {
    let mut ctx = TestContext::new();
    let today = test_date(2025, 3, 10);

    let result = create_schedule_wrapper(
        &mut ctx,
        test_date(2025, 3, 9),
        "RHU - Bantay".to_string(),
        Some(4),
        today,
    )
    .await;

    match result {
        Err(AppError(DutyError::Validation(msg))) => {
            assert_eq!(msg, "Cannot create schedule for past dates");
        }
        other => panic!("expected validation error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_create_schedule_rejects_zero_capacity() {
    let mut ctx = TestContext::new();
    let today = test_date(2025, 3, 10);

    let result = create_schedule_wrapper(
        &mut ctx,
        test_date(2025, 3, 12),
        "RHU - Bantay".to_string(),
        Some(0),
        today,
    )
    .await;

    assert!(matches!(result, Err(AppError(DutyError::Validation(_)))));
}

#[tokio::test]
async fn test_get_schedule_with_bookings() {
    let mut ctx = TestContext::new();
    let schedule_id = Uuid::new_v4();
    let date = test_date(2025, 3, 12);

    ctx.schedule_repo
        .expect_get_schedule_by_id()
        .with(predicate::eq(schedule_id))
        .returning(move |id| Ok(Some(sample_schedule(id, date, 4))));
    ctx.booking_repo
        .expect_list_bookings_for_schedule()
        .returning(move |sid| {
            Ok(vec![
                sample_booking_detail(sid, Uuid::new_v4(), date, "booked"),
                sample_booking_detail(sid, Uuid::new_v4(), date, "approved"),
            ])
        });

    let (schedule, booking_count) = get_schedule_wrapper(&mut ctx, schedule_id)
        .await
        .expect("lookup should succeed");

    assert_eq!(schedule.id, schedule_id);
    assert_eq!(booking_count, 2);
}

#[tokio::test]
async fn test_get_schedule_not_found() {
    let mut ctx = TestContext::new();

    ctx.schedule_repo
        .expect_get_schedule_by_id()
        .returning(|_| Ok(None));

    let result = get_schedule_wrapper(&mut ctx, Uuid::new_v4()).await;

    assert!(matches!(result, Err(AppError(DutyError::NotFound(_)))));
}

#[tokio::test]
async fn test_bulk_generation_plan_counts_and_sites() {
    // The bulk handler expands the range, then assigns the month's roster
    // site to every date. Two full March weeks of weekdays is ten duties.
    let start = test_date(2025, 3, 10);
    let end = test_date(2025, 3, 21);

    let dates = rules::expand_date_range(start, end, rules::DEFAULT_DUTY_DAYS);
    assert_eq!(dates.len(), 10);

    let site = location_for_date(start);
    assert!(dates.iter().all(|d| location_for_date(*d).name == site.name));
}
