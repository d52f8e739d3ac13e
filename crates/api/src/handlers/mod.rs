/// Booking workflow: reservation, approval, rejection, cancellation,
/// completion, and booking queries
pub mod booking;
/// Audit trail queries
pub mod duty_log;
/// Notification queries
pub mod notification;
/// Profile lifecycle
pub mod profile;
/// Schedule management
pub mod schedule;

use std::str::FromStr;

use dutyroster_core::errors::DutyError;

use crate::middleware::error_handling::AppError;

/// Parses a stored status string back into its enum. Rows only ever hold
/// values the CHECK constraints admit, so a failure here is an internal
/// error, not a client one.
pub(crate) fn parse_status<T>(value: &str) -> Result<T, AppError>
where
    T: FromStr<Err = String>,
{
    T::from_str(value).map_err(|e| AppError(DutyError::Internal(e.into())))
}
