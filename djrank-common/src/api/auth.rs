//! Admin credential checks and failed-attempt rate limiting
//!
//! # Flow
//!
//! For every mutating request:
//! 1. Resolve the client address (`X-Forwarded-For`, `X-Real-IP`, peer)
//! 2. Refuse immediately if the address is locked out
//! 3. Compare the `X-Admin-Token` header with the server secret in constant time
//! 4. On failure count the attempt; on success clear the counter
//!
//! # Pure Functions
//!
//! No HTTP framework dependencies here; the server wraps these in axum
//! middleware.

use std::collections::HashMap;
use std::fmt;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use subtle::ConstantTimeEq;

/// Header carrying the admin credential
pub const ADMIN_TOKEN_HEADER: &str = "X-Admin-Token";

/// Failed attempts allowed per window before lockout
pub const DEFAULT_MAX_FAILED_ATTEMPTS: u32 = 5;

/// Rolling window for failed attempts
pub const DEFAULT_LOCKOUT_WINDOW: Duration = Duration::from_secs(60 * 60);

// ========================================
// Error Types
// ========================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdminAuthError {
    /// Too many failures from this client in the current window
    RateLimited { retry_after_minutes: u64 },

    /// Missing or wrong credential, or no secret configured
    Unauthorized,
}

impl fmt::Display for AdminAuthError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AdminAuthError::RateLimited {
                retry_after_minutes,
            } => write!(
                f,
                "Too many failed attempts. Try again in {} minutes.",
                retry_after_minutes
            ),
            AdminAuthError::Unauthorized => f.write_str("Unauthorized"),
        }
    }
}

impl std::error::Error for AdminAuthError {}

// ========================================
// Credential Check
// ========================================

/// Compare a provided token with the configured secret
///
/// Rejects when either side is missing or empty. Equal-length inputs are
/// compared in constant time.
pub fn verify_admin_token(provided: Option<&str>, secret: Option<&str>) -> bool {
    let (Some(provided), Some(secret)) = (provided, secret) else {
        return false;
    };
    if provided.is_empty() || secret.is_empty() {
        return false;
    }
    if provided.len() != secret.len() {
        return false;
    }
    provided.as_bytes().ct_eq(secret.as_bytes()).into()
}

/// Resolve the client address used as the rate-limit key
///
/// First entry of `X-Forwarded-For`, else `X-Real-IP`, else the socket peer,
/// else `"unknown"`.
pub fn client_address(
    forwarded_for: Option<&str>,
    real_ip: Option<&str>,
    peer: Option<&str>,
) -> String {
    let forwarded = forwarded_for
        .and_then(|value| value.split(',').next())
        .map(str::trim)
        .filter(|s| !s.is_empty());

    forwarded
        .or_else(|| real_ip.map(str::trim).filter(|s| !s.is_empty()))
        .or(peer)
        .unwrap_or("unknown")
        .to_string()
}

// ========================================
// Rate Limiting
// ========================================

#[derive(Debug, Clone, Copy)]
struct AttemptRecord {
    count: u32,
    first_attempt: Instant,
}

/// Process-wide failed-attempt counter keyed by client address
#[derive(Debug)]
pub struct FailedAttemptLimiter {
    max_attempts: u32,
    window: Duration,
    attempts: Mutex<HashMap<String, AttemptRecord>>,
}

impl Default for FailedAttemptLimiter {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_FAILED_ATTEMPTS, DEFAULT_LOCKOUT_WINDOW)
    }
}

impl FailedAttemptLimiter {
    pub fn new(max_attempts: u32, window: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            window,
            attempts: Mutex::new(HashMap::new()),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, AttemptRecord>> {
        // A panic while holding the lock cannot leave the map inconsistent
        self.attempts.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Refuse a client that already used up its attempts
    pub fn check_at(&self, client: &str, now: Instant) -> Result<(), AdminAuthError> {
        let mut attempts = self.lock();
        let Some(record) = attempts.get(client).copied() else {
            return Ok(());
        };

        let elapsed = now.saturating_duration_since(record.first_attempt);
        if elapsed >= self.window {
            attempts.remove(client);
            return Ok(());
        }

        if record.count >= self.max_attempts {
            let remaining = (self.window - elapsed).as_secs();
            return Err(AdminAuthError::RateLimited {
                retry_after_minutes: remaining.div_ceil(60).max(1),
            });
        }

        Ok(())
    }

    pub fn record_failure_at(&self, client: &str, now: Instant) {
        let mut attempts = self.lock();
        let window = self.window;
        attempts
            .entry(client.to_string())
            .and_modify(|record| {
                if now.saturating_duration_since(record.first_attempt) >= window {
                    *record = AttemptRecord {
                        count: 1,
                        first_attempt: now,
                    };
                } else {
                    record.count += 1;
                }
            })
            .or_insert(AttemptRecord {
                count: 1,
                first_attempt: now,
            });
    }

    pub fn reset(&self, client: &str) {
        self.lock().remove(client);
    }

    /// Drop records whose window has passed; returns how many were removed
    pub fn prune_expired_at(&self, now: Instant) -> usize {
        let mut attempts = self.lock();
        let before = attempts.len();
        attempts.retain(|_, record| now.saturating_duration_since(record.first_attempt) < self.window);
        before - attempts.len()
    }

    pub fn tracked_clients(&self) -> usize {
        self.lock().len()
    }

    /// Full admin gate: lockout check, credential check, bookkeeping
    pub fn authorize_at(
        &self,
        client: &str,
        provided: Option<&str>,
        secret: Option<&str>,
        now: Instant,
    ) -> Result<(), AdminAuthError> {
        self.check_at(client, now)?;

        if verify_admin_token(provided, secret) {
            self.reset(client);
            Ok(())
        } else {
            self.record_failure_at(client, now);
            Err(AdminAuthError::Unauthorized)
        }
    }

    pub fn authorize(
        &self,
        client: &str,
        provided: Option<&str>,
        secret: Option<&str>,
    ) -> Result<(), AdminAuthError> {
        self.authorize_at(client, provided, secret, Instant::now())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verify_admin_token() {
        assert!(verify_admin_token(Some("s3cret"), Some("s3cret")));
        assert!(!verify_admin_token(Some("s3creT"), Some("s3cret")));
        assert!(!verify_admin_token(Some("s3cret-longer"), Some("s3cret")));
        assert!(!verify_admin_token(None, Some("s3cret")));
        assert!(!verify_admin_token(Some(""), Some("")));
        assert!(!verify_admin_token(Some("anything"), None));
    }

    #[test]
    fn test_client_address_precedence() {
        assert_eq!(
            client_address(Some("203.0.113.7, 10.0.0.1"), Some("10.0.0.2"), Some("127.0.0.1")),
            "203.0.113.7"
        );
        assert_eq!(client_address(None, Some("10.0.0.2"), Some("127.0.0.1")), "10.0.0.2");
        assert_eq!(client_address(Some(" "), None, Some("127.0.0.1")), "127.0.0.1");
        assert_eq!(client_address(None, None, None), "unknown");
    }

    #[test]
    fn test_lockout_after_max_failures() {
        let limiter = FailedAttemptLimiter::default();
        let start = Instant::now();

        for _ in 0..DEFAULT_MAX_FAILED_ATTEMPTS {
            assert_eq!(
                limiter.authorize_at("1.2.3.4", Some("bad"), Some("good"), start),
                Err(AdminAuthError::Unauthorized)
            );
        }

        // Even the right token is refused while locked out
        let err = limiter
            .authorize_at("1.2.3.4", Some("good"), Some("good"), start)
            .unwrap_err();
        assert_eq!(err, AdminAuthError::RateLimited { retry_after_minutes: 60 });
        assert_eq!(err.to_string(), "Too many failed attempts. Try again in 60 minutes.");

        // Other clients are unaffected
        assert!(limiter.authorize_at("5.6.7.8", Some("good"), Some("good"), start).is_ok());
    }

    #[test]
    fn test_retry_minutes_round_up() {
        let limiter = FailedAttemptLimiter::new(1, Duration::from_secs(3600));
        let start = Instant::now();
        limiter.record_failure_at("c", start);

        let later = start + Duration::from_secs(3600 - 61);
        assert_eq!(
            limiter.check_at("c", later),
            Err(AdminAuthError::RateLimited { retry_after_minutes: 2 })
        );
    }

    #[test]
    fn test_window_expiry_unlocks() {
        let limiter = FailedAttemptLimiter::new(2, Duration::from_secs(60));
        let start = Instant::now();
        limiter.record_failure_at("c", start);
        limiter.record_failure_at("c", start);
        assert!(limiter.check_at("c", start).is_err());

        let later = start + Duration::from_secs(61);
        assert!(limiter.check_at("c", later).is_ok());
        assert_eq!(limiter.tracked_clients(), 0);
    }

    #[test]
    fn test_success_resets_counter() {
        let limiter = FailedAttemptLimiter::new(2, Duration::from_secs(60));
        let now = Instant::now();
        limiter.record_failure_at("c", now);
        assert!(limiter.authorize_at("c", Some("ok"), Some("ok"), now).is_ok());
        assert_eq!(limiter.tracked_clients(), 0);
    }

    #[test]
    fn test_prune_expired() {
        let limiter = FailedAttemptLimiter::new(5, Duration::from_secs(60));
        let start = Instant::now();
        limiter.record_failure_at("old", start);
        limiter.record_failure_at("new", start + Duration::from_secs(50));

        assert_eq!(limiter.prune_expired_at(start + Duration::from_secs(70)), 1);
        assert_eq!(limiter.tracked_clients(), 1);
    }
}
