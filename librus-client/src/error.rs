//! Error types for the Librus client

use thiserror::Error;

/// Errors that can occur when using the Librus client
#[derive(Error, Debug)]
pub enum LibrusError {
    /// The portal refused the login or the session is no longer valid
    #[error("Authorization failed: {0}")]
    Authorization(#[from] AuthorizationError),

    /// Requested message page lies beyond the last page reported by the portal
    #[error("Page {requested} doesn't exist, max page: {max_page}")]
    OutOfBounds {
        /// The page index that was requested (0-based)
        requested: usize,
        /// The last valid page index (0-based)
        max_page: usize,
    },

    /// Serialized credential string is corrupt
    #[error("Malformed credential: {0}")]
    Format(#[from] FormatError),

    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// Invalid HTTP status code received
    #[error("Invalid HTTP status: {status}")]
    InvalidStatus {
        /// The status code that was received
        status: reqwest::StatusCode,
    },

    /// Failed to decode response as UTF-8
    #[error("Failed to decode response as UTF-8")]
    Encoding,

    /// A required element was missing or malformed in the HTML response
    #[error("Failed to parse HTML response: {0}")]
    HtmlParse(String),

    /// Client initialization failed
    #[error("Client initialization failed: {0}")]
    ClientInit(String),
}

impl LibrusError {
    /// Whether the caller should obtain a fresh credential before retrying
    pub fn requires_reauthentication(&self) -> bool {
        matches!(self, LibrusError::Authorization(_))
    }
}

/// The step of the login handshake (or later session check) that failed
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthorizationError {
    /// Handshake endpoint answered with a non-success status
    #[error("handshake failed with status {0}")]
    Handshake(reqwest::StatusCode),

    /// Captcha pre-check answered with a non-success status
    #[error("captcha check failed with status {0}")]
    Captcha(reqwest::StatusCode),

    /// The portal rejected the credentials
    #[error("{0}")]
    Rejected(String),

    /// The authorization response was not JSON
    #[error("Invalid username and/or password")]
    InvalidResponse,

    /// The authorization response carried a status other than "ok"
    #[error("unexpected authorization status: {0:?}")]
    UnexpectedStatus(Option<String>),

    /// The authorization response did not name a redirect target
    #[error("goTo not provided")]
    MissingRedirect,

    /// Following the redirect target failed
    #[error("redirect failed with status {0}")]
    Redirect(reqwest::StatusCode),

    /// The index page could not be loaded after login
    #[error("auth failed at last step: status {0}")]
    IndexUnavailable(reqwest::StatusCode),

    /// The portal never set the expected cookie
    #[error("cookie {0} was not set")]
    MissingCookie(&'static str),

    /// The index page did not embed a CSRF token
    #[error("CSRF token not found")]
    CsrfTokenNotFound,

    /// A signed request was bounced to the login page or refused outright
    #[error("session expired: status {0}")]
    SessionExpired(reqwest::StatusCode),

    /// The portal answered with its "access denied" page
    #[error("Token invalid or expired")]
    AccessDenied,

    /// A signed request was attempted with an empty credential
    #[error("credential is not authenticated")]
    Unauthenticated,
}

/// Reasons a serialized credential string cannot be decoded
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FormatError {
    /// The token is not valid base64
    #[error("invalid base64: {0}")]
    Base64(#[from] base64::DecodeError),

    /// The decoded token is not valid UTF-8
    #[error("decoded token is not valid UTF-8")]
    Utf8,

    /// The decoded token does not split into exactly two fields
    #[error("expected 2 fields separated by ':', found {0}")]
    FieldCount(usize),

    /// One of the two fields is empty
    #[error("empty field in token")]
    EmptyField,
}

/// Reasons a string does not name a week
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WeekParseError {
    /// One of the dates is not `YYYY-MM-DD`
    #[error("invalid date: {0}")]
    Date(#[from] chrono::ParseError),

    /// The range is not Monday through Sunday of a single week
    #[error("{0:?} is not a Monday to Sunday range")]
    NotAWeek(String),
}
