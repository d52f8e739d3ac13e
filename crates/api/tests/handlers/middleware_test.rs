use axum::http::StatusCode;
use axum::response::IntoResponse;
use dutyroster_api::middleware::auth::CurrentUser;
use dutyroster_api::middleware::error_handling::AppError;
use dutyroster_core::errors::DutyError;
use dutyroster_core::models::profile::Role;
use rstest::rstest;
use uuid::Uuid;

#[rstest]
#[case(DutyError::NotFound("Resource not found".to_string()), StatusCode::NOT_FOUND)]
#[case(DutyError::Validation("Invalid input".to_string()), StatusCode::BAD_REQUEST)]
#[case(DutyError::Authentication("Missing header".to_string()), StatusCode::UNAUTHORIZED)]
#[case(DutyError::Authorization("Admins only".to_string()), StatusCode::FORBIDDEN)]
#[case(DutyError::Conflict("Already booked".to_string()), StatusCode::CONFLICT)]
#[case(DutyError::Database(eyre::eyre!("connection refused")), StatusCode::INTERNAL_SERVER_ERROR)]
#[tokio::test]
async fn test_error_status_mapping(#[case] error: DutyError, #[case] expected: StatusCode) {
    let response = AppError(error).into_response();
    assert_eq!(response.status(), expected);
}

#[tokio::test]
async fn test_error_body_is_json() {
    let response = AppError(DutyError::Validation("Invalid input".to_string())).into_response();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let value: serde_json::Value = serde_json::from_slice(&body).unwrap();

    assert_eq!(value["error"], "Validation error: Invalid input");
}

fn user_with_role(role: Role) -> CurrentUser {
    CurrentUser {
        id: Uuid::new_v4(),
        role,
        full_name: "Maria Santos".to_string(),
        student_id: None,
    }
}

#[test]
fn test_require_admin() {
    assert!(user_with_role(Role::Admin).require_admin().is_ok());
    assert!(user_with_role(Role::Student).require_admin().is_err());
    assert!(user_with_role(Role::Parent).require_admin().is_err());
}
