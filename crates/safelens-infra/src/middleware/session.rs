//! Anonymous signed sessions
//!
//! Every browser gets a random session id carried in the
//! `safelens_session=<uuid>.<hmac>` cookie. The id only keys per-session data
//! held by the web crate; the cookie itself stores nothing else. A missing or
//! tampered cookie silently yields a fresh session.

use axum::http::{header, request::Parts, HeaderMap, HeaderValue, StatusCode};
use axum::{
    extract::{FromRequestParts, Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

use crate::signing::Signer;

pub const SESSION_COOKIE_NAME: &str = "safelens_session";

/// Session identifier, available to handlers as an extractor
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SessionId(pub Uuid);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Cookie signing and attributes
#[derive(Clone, Debug)]
pub struct SessionSettings {
    signer: Signer,
    secure: bool,
    max_age: Duration,
}

impl SessionSettings {
    pub fn new(signer: Signer, secure: bool, max_age: Duration) -> Self {
        Self {
            signer,
            secure,
            max_age,
        }
    }

    pub fn signer(&self) -> &Signer {
        &self.signer
    }

    /// Cookie value for a session: `<uuid>.<hmac>`
    pub fn encode(&self, session_id: &SessionId) -> String {
        let id = session_id.to_string();
        format!("{}.{}", id, self.signer.sign(&id))
    }

    /// Parse and verify a cookie value
    pub fn decode(&self, value: &str) -> Option<SessionId> {
        let (id, signature) = value.split_once('.')?;
        if !self.signer.verify(id, signature) {
            return None;
        }
        Uuid::parse_str(id).ok().map(SessionId)
    }

    /// Full `Set-Cookie` value for a session
    pub fn set_cookie_value(&self, session_id: &SessionId) -> String {
        let secure_flag = if self.secure { "; Secure" } else { "" };
        format!(
            "{}={}; Path=/; Max-Age={}; HttpOnly; SameSite=Lax{}",
            SESSION_COOKIE_NAME,
            self.encode(session_id),
            self.max_age.as_secs(),
            secure_flag
        )
    }

    fn session_from_headers(&self, headers: &HeaderMap) -> Option<SessionId> {
        headers
            .get_all(header::COOKIE)
            .iter()
            .filter_map(|h| h.to_str().ok())
            .flat_map(|cookies| cookies.split(';'))
            .filter_map(|part| part.trim().split_once('='))
            .filter(|(name, _)| *name == SESSION_COOKIE_NAME)
            .find_map(|(_, value)| self.decode(value.trim()))
    }
}

/// Session middleware
///
/// Resolves the session from the cookie (or mints a new one), stores the
/// [`SessionId`] in the request extensions and sets the cookie on responses
/// for new sessions.
pub async fn session_middleware(
    State(settings): State<Arc<SessionSettings>>,
    mut request: Request,
    next: Next,
) -> Response {
    let (session_id, is_new) = match settings.session_from_headers(request.headers()) {
        Some(id) => (id, false),
        None => (SessionId::new(), true),
    };

    request.extensions_mut().insert(session_id);

    let mut response = next.run(request).await;

    if is_new {
        tracing::debug!(session_id = %session_id, "New session issued");
        match HeaderValue::from_str(&settings.set_cookie_value(&session_id)) {
            Ok(value) => {
                response.headers_mut().append(header::SET_COOKIE, value);
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to build session cookie");
            }
        }
    }

    response
}

/// Rejection when a handler asks for a session outside the session middleware
#[derive(Debug)]
pub struct MissingSession;

impl IntoResponse for MissingSession {
    fn into_response(self) -> Response {
        tracing::error!("Session extractor used on a route without session middleware");
        (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error").into_response()
    }
}

impl<S> FromRequestParts<S> for SessionId
where
    S: Send + Sync,
{
    type Rejection = MissingSession;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<SessionId>()
            .copied()
            .ok_or(MissingSession)
    }
}
