use chrono::NaiveDate;
use mockall::mock;
use uuid::Uuid;

use crate::models::{
    DbBooking, DbBookingDetail, DbBookingStatusCount, DbDutyLog, DbNotification, DbProfile,
    DbSchedule, DbScheduleBookingInfo, DbScheduleWithCount, DbStudentDutyStat, NewDutyLog,
    NewNotification, NewProfile, NewSchedule,
};
use crate::repositories::booking::BookingInsert;

// Mock repositories for testing
mock! {
    pub ProfileRepo {
        pub async fn create_profile(&self, profile: NewProfile) -> eyre::Result<DbProfile>;

        pub async fn get_profile_by_id(&self, id: Uuid) -> eyre::Result<Option<DbProfile>>;

        pub async fn list_admin_ids(&self) -> eyre::Result<Vec<Uuid>>;

        pub async fn deactivate_profile(&self, id: Uuid) -> eyre::Result<DbProfile>;

        pub async fn get_linked_student(&self, parent_id: Uuid) -> eyre::Result<Option<Uuid>>;
    }
}

mock! {
    pub ScheduleRepo {
        pub async fn create_schedule(&self, schedule: NewSchedule) -> eyre::Result<DbSchedule>;

        pub async fn get_schedule_by_id(&self, id: Uuid) -> eyre::Result<Option<DbSchedule>>;

        pub async fn list_schedules(
            &self,
            from: Option<NaiveDate>,
        ) -> eyre::Result<Vec<DbScheduleWithCount>>;

        pub async fn update_schedule_status(
            &self,
            id: Uuid,
            status: String,
            approver: Option<Uuid>,
        ) -> eyre::Result<DbSchedule>;

        pub async fn delete_schedule(&self, id: Uuid) -> eyre::Result<()>;

        pub async fn get_schedule_booking_info(
            &self,
            id: Uuid,
        ) -> eyre::Result<Option<DbScheduleBookingInfo>>;
    }
}

mock! {
    pub BookingRepo {
        pub async fn create_booking(
            &self,
            schedule_id: Uuid,
            student_id: Uuid,
        ) -> eyre::Result<BookingInsert>;

        pub async fn get_booking_by_id(&self, id: Uuid) -> eyre::Result<Option<DbBooking>>;

        pub async fn has_active_booking(
            &self,
            schedule_id: Uuid,
            student_id: Uuid,
        ) -> eyre::Result<bool>;

        pub async fn has_active_booking_on_date(
            &self,
            student_id: Uuid,
            date: NaiveDate,
        ) -> eyre::Result<bool>;

        pub async fn has_same_day_cancellation(
            &self,
            student_id: Uuid,
            date: NaiveDate,
            today: NaiveDate,
        ) -> eyre::Result<bool>;

        pub async fn count_booked_for_schedule(&self, schedule_id: Uuid) -> eyre::Result<i64>;

        pub async fn approve_booking(&self, id: Uuid) -> eyre::Result<DbBooking>;

        pub async fn cancel_booking(&self, id: Uuid, reason: String) -> eyre::Result<DbBooking>;

        pub async fn complete_booking(&self, id: Uuid) -> eyre::Result<DbBooking>;

        pub async fn approve_all_for_schedule(
            &self,
            schedule_id: Uuid,
        ) -> eyre::Result<Vec<DbBooking>>;

        pub async fn cancel_all_for_schedule(
            &self,
            schedule_id: Uuid,
            reason: String,
        ) -> eyre::Result<Vec<DbBooking>>;

        pub async fn list_pending_bookings(&self) -> eyre::Result<Vec<DbBookingDetail>>;

        pub async fn list_bookings_for_schedule(
            &self,
            schedule_id: Uuid,
        ) -> eyre::Result<Vec<DbBookingDetail>>;

        pub async fn list_student_duties(
            &self,
            student_id: Uuid,
        ) -> eyre::Result<Vec<DbBookingDetail>>;

        pub async fn booking_stats(&self) -> eyre::Result<Vec<DbBookingStatusCount>>;

        pub async fn student_duty_stats(
            &self,
            start: NaiveDate,
            end: NaiveDate,
        ) -> eyre::Result<Vec<DbStudentDutyStat>>;
    }
}

mock! {
    pub NotificationRepo {
        pub async fn create_notification(
            &self,
            notification: NewNotification,
        ) -> eyre::Result<DbNotification>;

        pub async fn create_notifications(
            &self,
            notifications: Vec<NewNotification>,
        ) -> eyre::Result<u64>;

        pub async fn list_notifications_for_user(
            &self,
            user_id: Uuid,
            limit: i64,
        ) -> eyre::Result<Vec<DbNotification>>;

        pub async fn mark_notification_read(
            &self,
            id: Uuid,
            user_id: Uuid,
        ) -> eyre::Result<Option<DbNotification>>;
    }
}

mock! {
    pub DutyLogRepo {
        pub async fn append_log(&self, log: NewDutyLog) -> eyre::Result<DbDutyLog>;

        pub async fn list_recent_logs(&self, limit: i64) -> eyre::Result<Vec<DbDutyLog>>;
    }
}
