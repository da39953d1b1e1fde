//! Credentials and session token state

use std::fmt;

use chrono::{DateTime, NaiveDateTime, Utc};
use reqwest::header::HeaderValue;
use serde_json::Value;
use zeroize::Zeroizing;

use crate::error::{AlliantError, SessionError};

/// Header that carries the session token
pub const SESSION_HEADER: &str = "X-AlliantSession";

/// Login credentials and layer selection
///
/// The password is zeroized when the credentials are dropped.
#[derive(Clone)]
pub struct Credentials {
    pub user_id: String,
    pub password: Zeroizing<String>,
    /// Usually `default`; see [`crate::get_system_layers`]
    pub system_layer_key: String,
    /// See [`crate::get_application_layers`]
    pub application_layer: String,
}

impl Credentials {
    pub fn new(
        user_id: impl Into<String>,
        password: impl Into<String>,
        system_layer_key: impl Into<String>,
        application_layer: impl Into<String>,
    ) -> Self {
        Self {
            user_id: user_id.into(),
            password: Zeroizing::new(password.into()),
            system_layer_key: system_layer_key.into(),
            application_layer: application_layer.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("user_id", &self.user_id)
            .field("password", &"<redacted>")
            .field("system_layer_key", &self.system_layer_key)
            .field("application_layer", &self.application_layer)
            .finish()
    }
}

/// Token issued at login
pub(crate) struct SessionToken {
    token: Zeroizing<String>,
    expires: Option<DateTime<Utc>>,
}

impl SessionToken {
    /// Read the token from a login response body
    ///
    /// Looks in `result` first and falls back to the top level.
    pub(crate) fn from_login_body(body: &Value) -> Option<Self> {
        let source = match body.get("result") {
            Some(result) if result.get("token").is_some() => result,
            _ => body,
        };
        let token = source.get("token")?.as_str()?;
        if token.is_empty() {
            return None;
        }
        let expires = match source.get("expires") {
            Some(Value::String(raw)) => {
                let parsed = parse_expiry(raw);
                if parsed.is_none() {
                    tracing::warn!(expires = %raw, "could not parse token expiry");
                }
                parsed
            }
            _ => None,
        };
        Some(Self {
            token: Zeroizing::new(token.to_string()),
            expires,
        })
    }

    pub(crate) fn token(&self) -> &str {
        &self.token
    }

    pub(crate) fn expires(&self) -> Option<DateTime<Utc>> {
        self.expires
    }

    /// Header value for the token, marked sensitive so it is not logged
    pub(crate) fn header_value(&self) -> Result<HeaderValue, AlliantError> {
        let mut value = HeaderValue::from_str(&self.token)
            .map_err(|_| AlliantError::ClientInit("Invalid session token format".to_string()))?;
        value.set_sensitive(true);
        Ok(value)
    }
}

/// Parse an expiry timestamp; naive timestamps are read as UTC
pub(crate) fn parse_expiry(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| naive.and_utc())
}

/// Lifecycle of the client's server-side session
pub(crate) enum SessionState {
    /// Never logged in, or the last login failed
    Inactive,
    Active(SessionToken),
    /// Logged out; the session is not reused
    Closed,
}

impl SessionState {
    /// The token to attach to a request at `now`
    pub(crate) fn current(&self, now: DateTime<Utc>) -> Result<&SessionToken, SessionError> {
        match self {
            Self::Inactive => Err(SessionError::NotLoggedIn),
            Self::Closed => Err(SessionError::Closed),
            Self::Active(token) => match token.expires {
                Some(expired_at) if expired_at <= now => Err(SessionError::Expired { expired_at }),
                _ => Ok(token),
            },
        }
    }
}
