use crate::models::{DbProfile, NewProfile};
use eyre::{eyre, Result};
use sqlx::{Pool, Postgres};
use uuid::Uuid;

pub async fn create_profile(pool: &Pool<Postgres>, profile: &NewProfile) -> Result<DbProfile> {
    tracing::debug!(
        "Creating profile: id={}, email={}, role={}",
        profile.id,
        profile.email,
        profile.role
    );

    let created = sqlx::query_as::<_, DbProfile>(
        r#"
        INSERT INTO profiles (id, email, full_name, role, student_number, year_level,
                              phone_number, student_id, is_active, created_at, updated_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, TRUE, NOW(), NOW())
        RETURNING *
        "#,
    )
    .bind(profile.id)
    .bind(&profile.email)
    .bind(&profile.full_name)
    .bind(&profile.role)
    .bind(&profile.student_number)
    .bind(&profile.year_level)
    .bind(&profile.phone_number)
    .bind(profile.student_id)
    .fetch_one(pool)
    .await?;

    Ok(created)
}

pub async fn get_profile_by_id(pool: &Pool<Postgres>, id: Uuid) -> Result<Option<DbProfile>> {
    let profile = sqlx::query_as::<_, DbProfile>(
        r#"
        SELECT *
        FROM profiles
        WHERE id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(profile)
}

/// Ids of every admin account, for booking notifications.
pub async fn list_admin_ids(pool: &Pool<Postgres>) -> Result<Vec<Uuid>> {
    let ids = sqlx::query_scalar::<_, Uuid>(
        r#"
        SELECT id
        FROM profiles
        WHERE role = 'admin' AND is_active
        "#,
    )
    .fetch_all(pool)
    .await?;

    Ok(ids)
}

pub async fn update_profile(
    pool: &Pool<Postgres>,
    id: Uuid,
    full_name: Option<&str>,
    student_number: Option<&str>,
    year_level: Option<&str>,
    phone_number: Option<&str>,
    avatar_url: Option<&str>,
) -> Result<DbProfile> {
    let profile = get_profile_by_id(pool, id)
        .await?
        .ok_or_else(|| eyre!("Profile not found"))?;

    let full_name = full_name.unwrap_or(&profile.full_name);
    let student_number = student_number.or(profile.student_number.as_deref());
    let year_level = year_level.or(profile.year_level.as_deref());
    let phone_number = phone_number.or(profile.phone_number.as_deref());
    let avatar_url = avatar_url.or(profile.avatar_url.as_deref());

    let updated = sqlx::query_as::<_, DbProfile>(
        r#"
        UPDATE profiles
        SET full_name = $2, student_number = $3, year_level = $4,
            phone_number = $5, avatar_url = $6, updated_at = NOW()
        WHERE id = $1
        RETURNING *
        "#,
    )
    .bind(id)
    .bind(full_name)
    .bind(student_number)
    .bind(year_level)
    .bind(phone_number)
    .bind(avatar_url)
    .fetch_one(pool)
    .await?;

    Ok(updated)
}

/// Soft delete. Profiles are never removed; the booking cascade is handled
/// by the caller so it can be audited.
pub async fn deactivate_profile(pool: &Pool<Postgres>, id: Uuid) -> Result<DbProfile> {
    tracing::debug!("Deactivating profile: id={}", id);

    let updated = sqlx::query_as::<_, DbProfile>(
        r#"
        UPDATE profiles
        SET is_active = FALSE, updated_at = NOW()
        WHERE id = $1
        RETURNING *
        "#,
    )
    .bind(id)
    .fetch_one(pool)
    .await?;

    Ok(updated)
}

/// The student linked to a parent account, if any.
pub async fn get_linked_student(pool: &Pool<Postgres>, parent_id: Uuid) -> Result<Option<Uuid>> {
    let student_id = sqlx::query_scalar::<_, Option<Uuid>>(
        r#"
        SELECT student_id
        FROM profiles
        WHERE id = $1 AND role = 'parent'
        "#,
    )
    .bind(parent_id)
    .fetch_optional(pool)
    .await?;

    Ok(student_id.flatten())
}
