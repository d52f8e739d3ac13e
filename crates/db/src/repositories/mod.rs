pub mod booking;
pub mod duty_log;
pub mod notification;
pub mod profile;
pub mod schedule;
