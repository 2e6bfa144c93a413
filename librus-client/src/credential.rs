//! Session credential and its portable string form

use crate::error::FormatError;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use std::fmt;
use std::str::FromStr;
use zeroize::Zeroizing;

/// Cookie-based portal identity plus the CSRF token bound to it
///
/// Created once a login completes and never mutated afterwards, so a single
/// credential can sign any number of independent requests. A credential whose
/// cookie or token is empty stands for "not logged in".
///
/// The portable form is `base64(cookie + ":" + csrf_token)`; the device
/// cookie is not part of it.
#[derive(Clone, PartialEq, Eq)]
pub struct SessionCredential {
    session_cookie: Zeroizing<String>,
    csrf_token: Zeroizing<String>,
    device_cookie: Option<Zeroizing<String>>,
}

impl SessionCredential {
    /// Bundle the values collected by a finished login
    pub fn new(
        session_cookie: impl Into<String>,
        csrf_token: impl Into<String>,
        device_cookie: Option<String>,
    ) -> Self {
        Self {
            session_cookie: Zeroizing::new(session_cookie.into()),
            csrf_token: Zeroizing::new(csrf_token.into()),
            device_cookie: device_cookie.map(Zeroizing::new),
        }
    }

    /// A credential that carries no identity
    pub fn unauthenticated() -> Self {
        Self::new(String::new(), String::new(), None)
    }

    /// Both the session cookie and the CSRF token are present
    pub fn is_authenticated(&self) -> bool {
        !self.session_cookie.is_empty() && !self.csrf_token.is_empty()
    }

    pub fn session_cookie(&self) -> &str {
        &self.session_cookie
    }

    pub fn csrf_token(&self) -> &str {
        &self.csrf_token
    }

    pub fn device_cookie(&self) -> Option<&str> {
        self.device_cookie.as_deref().map(String::as_str)
    }

    /// Serialize to the portable token string
    pub fn encode(&self) -> String {
        let plain = Zeroizing::new(format!("{}:{}", *self.session_cookie, *self.csrf_token));
        STANDARD.encode(plain.as_bytes())
    }

    /// Parse a token string produced by [`SessionCredential::encode`]
    pub fn decode(token: &str) -> Result<Self, FormatError> {
        let bytes = Zeroizing::new(STANDARD.decode(token.trim())?);
        let plain = std::str::from_utf8(&bytes).map_err(|_| FormatError::Utf8)?;

        let fields: Vec<&str> = plain.split(':').collect();
        let [cookie, csrf] = fields.as_slice() else {
            return Err(FormatError::FieldCount(fields.len()));
        };
        if cookie.is_empty() || csrf.is_empty() {
            return Err(FormatError::EmptyField);
        }

        Ok(Self::new(*cookie, *csrf, None))
    }
}

impl FromStr for SessionCredential {
    type Err = FormatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::decode(s)
    }
}

impl fmt::Debug for SessionCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionCredential")
            .field("authenticated", &self.is_authenticated())
            .field("device_cookie", &self.device_cookie.is_some())
            .finish_non_exhaustive()
    }
}
