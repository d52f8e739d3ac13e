//! # Caller Identity
//!
//! Authentication itself lives in an external collaborator (email/password
//! sign-in, sessions). Requests reach this API with the authenticated user's
//! id in the `X-User-Id` header; this module resolves that id to a profile
//! and exposes it to handlers as the [`CurrentUser`] extractor.

use std::str::FromStr;
use std::sync::Arc;

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use dutyroster_core::errors::DutyError;
use dutyroster_core::models::profile::Role;
use uuid::Uuid;

use crate::middleware::error_handling::AppError;
use crate::ApiState;

/// Header carrying the authenticated user's id, set by the auth collaborator.
pub const USER_ID_HEADER: &str = "x-user-id";

/// The resolved caller, available to any handler as an extractor.
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub id: Uuid,
    pub role: Role,
    pub full_name: String,
    /// For parent accounts: the linked student's id.
    pub student_id: Option<Uuid>,
}

impl CurrentUser {
    /// Authorization check for admin-only operations.
    pub fn require_admin(&self) -> Result<(), AppError> {
        if self.role != Role::Admin {
            return Err(AppError(DutyError::Authorization(
                "This action requires an admin account".to_string(),
            )));
        }
        Ok(())
    }
}

#[axum::async_trait]
impl FromRequestParts<Arc<ApiState>> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<ApiState>,
    ) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(USER_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| {
                AppError(DutyError::Authentication(
                    "Missing X-User-Id header".to_string(),
                ))
            })?;

        let id = Uuid::parse_str(header).map_err(|_| {
            AppError(DutyError::Authentication(
                "Invalid X-User-Id header".to_string(),
            ))
        })?;

        let profile = dutyroster_db::repositories::profile::get_profile_by_id(&state.db_pool, id)
            .await
            .map_err(DutyError::Database)?
            .ok_or_else(|| {
                AppError(DutyError::Authentication(format!(
                    "No profile found for user {id}"
                )))
            })?;

        if !profile.is_active {
            return Err(AppError(DutyError::Authorization(
                "This account has been deactivated".to_string(),
            )));
        }

        let role = Role::from_str(&profile.role)
            .map_err(|e| AppError(DutyError::Internal(e.into())))?;

        Ok(CurrentUser {
            id: profile.id,
            role,
            full_name: profile.full_name,
            student_id: profile.student_id,
        })
    }
}
