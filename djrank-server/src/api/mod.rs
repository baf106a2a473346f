//! HTTP API handlers for djrank-server

pub mod auth;
pub mod error;
pub mod health;
pub mod performers;
pub mod sse;

pub use auth::admin_middleware;
pub use error::ApiError;
pub use health::health_routes;
pub use performers::{
    create_performer, delete_performer, get_board, get_performer, get_performer_score,
    list_performers, update_performer,
};
pub use sse::event_stream;
