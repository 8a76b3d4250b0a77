//! CSRF (Cross-Site Request Forgery) tokens for the upload form
//!
//! Tokens are stateless and bound to the session: the HMAC covers the session
//! id, so a token lifted from one session is useless in another. The web crate
//! embeds a token as a hidden form field and checks it when the form is posted.
//!
//! Token format: `<hmac>.<timestamp>.<nonce>`

use chrono::Utc;
use uuid::Uuid;

use crate::middleware::SessionId;
use crate::signing::Signer;

/// CSRF token expiration time (1 hour)
const CSRF_TOKEN_EXPIRATION_SECS: i64 = 3600;

/// Allowed clock skew for tokens stamped in the future
const CSRF_CLOCK_SKEW_SECS: i64 = 60;

fn token_message(session_id: &SessionId, timestamp: i64, nonce: &str) -> String {
    format!("{}.{}.{}", session_id, timestamp, nonce)
}

/// Generate a CSRF token for the given session
pub fn generate_csrf_token(signer: &Signer, session_id: &SessionId) -> String {
    let timestamp = Utc::now().timestamp();
    let nonce = Uuid::new_v4().simple().to_string();
    let hmac = signer.sign(&token_message(session_id, timestamp, &nonce));
    format!("{}.{}.{}", hmac, timestamp, nonce)
}

/// Verify a CSRF token.
///
/// Checks the format, the expiry window and the signature over the session id.
pub fn verify_csrf_token(signer: &Signer, token: &str, session_id: &SessionId) -> bool {
    let parts: Vec<&str> = token.trim().split('.').collect();
    if parts.len() != 3 {
        return false;
    }

    let hmac_part = parts[0];
    let nonce = parts[2];

    let timestamp = match parts[1].parse::<i64>() {
        Ok(ts) => ts,
        Err(_) => return false,
    };

    let now = Utc::now().timestamp();
    if timestamp.saturating_add(CSRF_TOKEN_EXPIRATION_SECS) < now {
        tracing::debug!(session_id = %session_id, "CSRF token expired");
        return false;
    }
    if timestamp > now.saturating_add(CSRF_CLOCK_SKEW_SECS) {
        tracing::debug!(session_id = %session_id, "CSRF token issued in the future");
        return false;
    }

    signer.verify(&token_message(session_id, timestamp, nonce), hmac_part)
}
