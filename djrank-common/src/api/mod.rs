//! Shared HTTP API functionality
//!
//! This module contains ONLY:
//! - Pure functions (no HTTP framework dependencies)
//! - Shared request/response types
//!
//! The server wraps these with axum middleware and handlers; the HTTP
//! gateway uses the same header names and error bodies.

pub mod auth;
pub mod types;

pub use auth::{
    client_address, verify_admin_token, AdminAuthError, FailedAttemptLimiter, ADMIN_TOKEN_HEADER,
};
pub use types::{ErrorResponse, HealthResponse, ScoreResponse, SuccessResponse};
