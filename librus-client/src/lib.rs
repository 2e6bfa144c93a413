//! Librus Synergia Client Library
//!
//! This library logs into the Librus Synergia school portal and scrapes the
//! received-messages listing and the weekly timetable into typed records.
//!
//! # Features
//!
//! - Multi-step login yielding a portable [`SessionCredential`]
//! - Credentials serialize to a single token string for caching
//! - Message listing by page, with bounds checking and lazy row parsing
//! - Weekly timetable with substitution and cancellation markers
//! - Secure TLS using rustls (no OpenSSL dependencies)
//! - Blocking synchronous API
//! - Well-typed errors using thiserror
//!
//! # Example
//!
//! ```no_run
//! use librus_client::{LibrusClient, SessionCredential, Week};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let client = LibrusClient::new()?;
//!
//! // Log in once, keep the token around for later runs
//! let credential = client.authenticate("1234567u", "password")?;
//! let token = credential.encode();
//!
//! let credential: SessionCredential = token.parse()?;
//! if !client.verify_session(&credential)? {
//!     println!("Session expired");
//! }
//!
//! for brief in client.message_pages(&credential).collect_messages()? {
//!     println!("{} {} {}", brief.sent, brief.sender, brief.title);
//! }
//!
//! let mut lessons = client.lesson_units(&credential, Week::current())?;
//! lessons.sort();
//! for lesson in lessons {
//!     println!("{} {} ({})", lesson.start, lesson.name, lesson.teacher);
//! }
//! # Ok(())
//! # }
//! ```

mod auth;
mod client;
mod config;
mod credential;
mod error;
mod listing;
mod model;
mod parser;
mod signer;

pub use auth::{
    authenticate, AuthenticationFlow, CredentialsSubmitted, HandshakeDone, RedirectFollowed,
    Unauthenticated,
};
pub use client::{LibrusClient, LibrusClientBuilder};
pub use config::{Endpoints, CSRF_FIELD, DEVICE_COOKIE, SESSION_COOKIE, USER_AGENT};
pub use credential::SessionCredential;
pub use error::{AuthorizationError, FormatError, LibrusError, WeekParseError};
pub use listing::PagedListing;
pub use model::{LessonUnit, MessageBrief, PageInfo, Week};
pub use parser::{sanitize, MessagePage, MessageParser, TimetableParser};
pub use signer::{RequestBody, RequestSigner, SignedRequest};
