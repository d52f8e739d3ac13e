//! # Profile Handlers
//!
//! Profile records mirror accounts owned by the external auth service; the
//! id on creation comes from that service, not from us. Deactivation is a
//! soft delete that also withdraws the student's upcoming bookings.

use axum::extract::{Path, State};
use axum::Json;
use chrono::Utc;
use dutyroster_core::{
    errors::DutyError,
    models::{
        duty_log::DutyAction,
        profile::{
            CreateProfileRequest, DeactivateProfileResponse, Profile, Role, UpdateProfileRequest,
        },
    },
};
use dutyroster_db::models::{DbProfile, NewDutyLog, NewProfile};
use std::sync::Arc;
use uuid::Uuid;

use crate::middleware::{auth::CurrentUser, error_handling::AppError};
use crate::{sink, ApiState};

pub(crate) fn profile_from_db(db: DbProfile) -> Result<Profile, AppError> {
    Ok(Profile {
        id: db.id,
        email: db.email,
        full_name: db.full_name,
        role: super::parse_status(&db.role)?,
        student_number: db.student_number,
        year_level: db.year_level,
        phone_number: db.phone_number,
        student_id: db.student_id,
        is_active: db.is_active,
        avatar_url: db.avatar_url,
        created_at: db.created_at,
    })
}

/// Registers a profile for an account the auth service has already created.
/// Admin-only; self-service sign-up flows call this through a trusted
/// backend, not directly.
#[axum::debug_handler]
pub async fn create_profile(
    State(state): State<Arc<ApiState>>,
    user: CurrentUser,
    Json(payload): Json<CreateProfileRequest>,
) -> Result<Json<Profile>, AppError> {
    user.require_admin()?;

    if payload.role == Role::Parent && payload.student_id.is_none() {
        return Err(AppError(DutyError::Validation(
            "Parent accounts must be linked to a student".to_string(),
        )));
    }

    let new_profile = NewProfile {
        id: payload.id,
        email: payload.email,
        full_name: payload.full_name,
        role: payload.role.as_str().to_string(),
        student_number: payload.student_number,
        year_level: payload.year_level,
        phone_number: payload.phone_number,
        student_id: payload.student_id,
    };

    let created = dutyroster_db::repositories::profile::create_profile(&state.db_pool, &new_profile)
        .await
        .map_err(DutyError::Database)?;

    Ok(Json(profile_from_db(created)?))
}

/// Fetches one profile. Users may read their own; admins may read any;
/// parents may read their linked student's.
#[axum::debug_handler]
pub async fn get_profile(
    State(state): State<Arc<ApiState>>,
    Path(id): Path<Uuid>,
    user: CurrentUser,
) -> Result<Json<Profile>, AppError> {
    let allowed = user.id == id
        || user.role == Role::Admin
        || (user.role == Role::Parent && user.student_id == Some(id));
    if !allowed {
        return Err(AppError(DutyError::Authorization(
            "You can only view your own profile".to_string(),
        )));
    }

    let profile = dutyroster_db::repositories::profile::get_profile_by_id(&state.db_pool, id)
        .await
        .map_err(DutyError::Database)?
        .ok_or_else(|| DutyError::NotFound(format!("Profile with ID {id} not found")))?;

    Ok(Json(profile_from_db(profile)?))
}

/// Updates contact and enrolment details. Role and email are immutable here;
/// they belong to the auth service.
#[axum::debug_handler]
pub async fn update_profile(
    State(state): State<Arc<ApiState>>,
    Path(id): Path<Uuid>,
    user: CurrentUser,
    Json(payload): Json<UpdateProfileRequest>,
) -> Result<Json<Profile>, AppError> {
    if user.id != id && user.role != Role::Admin {
        return Err(AppError(DutyError::Authorization(
            "You can only update your own profile".to_string(),
        )));
    }

    dutyroster_db::repositories::profile::get_profile_by_id(&state.db_pool, id)
        .await
        .map_err(DutyError::Database)?
        .ok_or_else(|| DutyError::NotFound(format!("Profile with ID {id} not found")))?;

    let updated = dutyroster_db::repositories::profile::update_profile(
        &state.db_pool,
        id,
        payload.full_name.as_deref(),
        payload.student_number.as_deref(),
        payload.year_level.as_deref(),
        payload.phone_number.as_deref(),
        payload.avatar_url.as_deref(),
    )
    .await
    .map_err(DutyError::Database)?;

    Ok(Json(profile_from_db(updated)?))
}

/// Soft-deletes a profile and cancels the student's upcoming active
/// bookings so slots reopen for others.
#[axum::debug_handler]
pub async fn deactivate_profile(
    State(state): State<Arc<ApiState>>,
    Path(id): Path<Uuid>,
    user: CurrentUser,
) -> Result<Json<DeactivateProfileResponse>, AppError> {
    user.require_admin()?;

    let profile = dutyroster_db::repositories::profile::get_profile_by_id(&state.db_pool, id)
        .await
        .map_err(DutyError::Database)?
        .ok_or_else(|| DutyError::NotFound(format!("Profile with ID {id} not found")))?;

    dutyroster_db::repositories::profile::deactivate_profile(&state.db_pool, id)
        .await
        .map_err(DutyError::Database)?;

    let today = Utc::now().date_naive();
    let cancelled_bookings = if profile.role == "student" {
        dutyroster_db::repositories::booking::cancel_active_bookings_for_student(
            &state.db_pool,
            id,
            today,
            "Account deactivated",
        )
        .await
        .map_err(DutyError::Database)?
    } else {
        0
    };

    sink::record(
        &state.db_pool,
        NewDutyLog {
            schedule_student_id: None,
            schedule_id: None,
            action: DutyAction::ProfileDeactivated.as_str().to_string(),
            performed_by: Some(user.id),
            target_user: Some(id),
            notes: Some(format!(
                "Profile deactivated, {cancelled_bookings} active bookings cancelled"
            )),
        },
    )
    .await;

    Ok(Json(DeactivateProfileResponse {
        id,
        cancelled_bookings,
    }))
}
