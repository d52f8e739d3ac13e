
#[path = "handlers/booking_test.rs"]
mod booking_test;
#[path = "handlers/middleware_test.rs"]
mod middleware_test;
#[path = "handlers/schedule_test.rs"]
mod schedule_test;
