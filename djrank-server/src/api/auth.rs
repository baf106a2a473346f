//! Admin authentication middleware
//!
//! Mutating routes require `X-Admin-Token` to match the server secret.
//! Failures are counted per client address; a locked-out client is refused
//! before its credential is looked at.

use std::net::SocketAddr;

use axum::{
    extract::{ConnectInfo, Request, State},
    http::{HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use djrank_common::api::{client_address, AdminAuthError, ErrorResponse, ADMIN_TOKEN_HEADER};
use tracing::{debug, warn};

use crate::AppState;

fn header<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|value| value.to_str().ok())
}

/// Rate-limit key for a request
///
/// The socket peer is only known when the server runs with connect info;
/// router tests driven through `oneshot` fall back to the proxy headers.
pub fn request_client(request: &Request) -> String {
    let headers = request.headers();
    let peer = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string());

    client_address(
        header(headers, "x-forwarded-for"),
        header(headers, "x-real-ip"),
        peer.as_deref(),
    )
}

/// Admin middleware
///
/// **Note:** Applied to POST/PUT/DELETE routes only. Reads, `/health` and
/// `/api/events` stay public.
pub async fn admin_middleware(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, AuthRejection> {
    let client = request_client(&request);
    let provided = header(request.headers(), ADMIN_TOKEN_HEADER);

    state
        .limiter
        .authorize(&client, provided, state.admin_secret.as_deref())
        .map_err(|e| {
            warn!(
                "Admin request {} {} from {} rejected: {}",
                request.method(),
                request.uri().path(),
                client,
                e
            );
            AuthRejection(e)
        })?;

    debug!("Admin request authorized for {}", client);
    Ok(next.run(request).await)
}

/// HTTP form of an [`AdminAuthError`]
#[derive(Debug)]
pub struct AuthRejection(pub AdminAuthError);

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        let status = match self.0 {
            AdminAuthError::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
            AdminAuthError::Unauthorized => StatusCode::FORBIDDEN,
        };

        (status, Json(ErrorResponse::new(self.0.to_string()))).into_response()
    }
}
