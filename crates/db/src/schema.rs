use eyre::Result;
use sqlx::{Pool, Postgres};
use tracing::info;

pub async fn initialize_database(pool: &Pool<Postgres>) -> Result<()> {
    info!("Initializing database schema...");

    // Create profiles table
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS profiles (
            id UUID PRIMARY KEY,
            email VARCHAR(255) NOT NULL UNIQUE,
            full_name VARCHAR(255) NOT NULL,
            role VARCHAR(20) NOT NULL CHECK (role IN ('student', 'parent', 'admin')),
            student_number VARCHAR(50) NULL,
            year_level VARCHAR(50) NULL,
            phone_number VARCHAR(50) NULL,
            student_id UUID NULL REFERENCES profiles(id),
            is_active BOOLEAN NOT NULL DEFAULT TRUE,
            avatar_url TEXT NULL,
            created_at TIMESTAMP WITH TIME ZONE NOT NULL DEFAULT NOW(),
            updated_at TIMESTAMP WITH TIME ZONE NOT NULL DEFAULT NOW()
        );
        "#,
    )
    .execute(pool)
    .await?;

    // Create schedules table
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS schedules (
            id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
            date DATE NOT NULL,
            description VARCHAR(255) NULL,
            location VARCHAR(255) NOT NULL,
            shift_start TIME NOT NULL,
            shift_end TIME NOT NULL,
            max_students INTEGER NOT NULL DEFAULT 2,
            status VARCHAR(20) NOT NULL DEFAULT 'pending'
                CHECK (status IN ('pending', 'approved', 'cancelled')),
            approved_by UUID NULL REFERENCES profiles(id),
            approved_at TIMESTAMP WITH TIME ZONE NULL,
            created_by UUID NULL REFERENCES profiles(id),
            created_at TIMESTAMP WITH TIME ZONE NOT NULL DEFAULT NOW(),
            updated_at TIMESTAMP WITH TIME ZONE NOT NULL DEFAULT NOW(),
            CONSTRAINT positive_capacity CHECK (max_students > 0)
        );
        "#,
    )
    .execute(pool)
    .await?;

    // Create schedule_students (bookings) table
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS schedule_students (
            id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
            schedule_id UUID NOT NULL REFERENCES schedules(id) ON DELETE CASCADE,
            student_id UUID NOT NULL REFERENCES profiles(id),
            booking_time TIMESTAMP WITH TIME ZONE NOT NULL DEFAULT NOW(),
            status VARCHAR(20) NOT NULL DEFAULT 'booked'
                CHECK (status IN ('booked', 'approved', 'cancelled', 'completed')),
            cancelled_at TIMESTAMP WITH TIME ZONE NULL,
            cancellation_reason TEXT NULL,
            completed_at TIMESTAMP WITH TIME ZONE NULL,
            updated_at TIMESTAMP WITH TIME ZONE NOT NULL DEFAULT NOW()
        );
        "#,
    )
    .execute(pool)
    .await?;

    // One non-cancelled row per (schedule, student). Backstops the
    // duplicate check inside the booking insert transaction; client-side
    // checks are a fast path only.
    sqlx::query(
        r#"
        CREATE UNIQUE INDEX IF NOT EXISTS uniq_active_booking_per_schedule
        ON schedule_students(schedule_id, student_id)
        WHERE status <> 'cancelled';
        "#,
    )
    .execute(pool)
    .await?;

    // Create notifications table
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS notifications (
            id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
            user_id UUID NOT NULL REFERENCES profiles(id),
            title VARCHAR(255) NOT NULL,
            message TEXT NOT NULL,
            type VARCHAR(20) NOT NULL DEFAULT 'info'
                CHECK (type IN ('info', 'success', 'warning', 'error')),
            read BOOLEAN NOT NULL DEFAULT FALSE,
            read_at TIMESTAMP WITH TIME ZONE NULL,
            created_at TIMESTAMP WITH TIME ZONE NOT NULL DEFAULT NOW()
        );
        "#,
    )
    .execute(pool)
    .await?;

    // Create duty_logs table (append-only audit trail)
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS duty_logs (
            id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
            schedule_student_id UUID NULL,
            schedule_id UUID NULL,
            action VARCHAR(50) NOT NULL,
            performed_by UUID NULL,
            target_user UUID NULL,
            notes TEXT NULL,
            created_at TIMESTAMP WITH TIME ZONE NOT NULL DEFAULT NOW()
        );
        "#,
    )
    .execute(pool)
    .await?;

    // Create indexes
    sqlx::query(
        r#"
        CREATE INDEX IF NOT EXISTS idx_schedules_date ON schedules(date);
        CREATE INDEX IF NOT EXISTS idx_schedules_status ON schedules(status);
        CREATE INDEX IF NOT EXISTS idx_schedule_students_schedule_id ON schedule_students(schedule_id);
        CREATE INDEX IF NOT EXISTS idx_schedule_students_student_id ON schedule_students(student_id);
        CREATE INDEX IF NOT EXISTS idx_schedule_students_status ON schedule_students(status);
        CREATE INDEX IF NOT EXISTS idx_notifications_user_id ON notifications(user_id);
        CREATE INDEX IF NOT EXISTS idx_duty_logs_schedule_id ON duty_logs(schedule_id);
        CREATE INDEX IF NOT EXISTS idx_duty_logs_performed_by ON duty_logs(performed_by);
        "#,
    )
    .execute(pool)
    .await?;

    info!("Database schema initialized successfully.");
    Ok(())
}
