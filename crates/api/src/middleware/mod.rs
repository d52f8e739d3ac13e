/// Caller identity extraction and role checks
pub mod auth;
/// Error-to-HTTP-status mapping
pub mod error_handling;
