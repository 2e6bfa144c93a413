//! Multi-step login handshake
//!
//! Each step depends on cookies the portal set during the previous one, so
//! the flow is a chain of typed states. A step consumes its state and returns
//! either the next state or an [`AuthorizationError`]:
//!
//! ```text
//! Unauthenticated -> HandshakeDone -> CredentialsSubmitted -> RedirectFollowed -> SessionCredential
//! ```
//!
//! The cookie jar travels with the flow from state to state and is dropped
//! once the [`SessionCredential`] has been read out of it.

use crate::config::{DEVICE_COOKIE, Endpoints, SESSION_COOKIE, USER_AGENT};
use crate::credential::SessionCredential;
use crate::error::{AuthorizationError, LibrusError};
use regex::Regex;
use reqwest::Url;
use reqwest::cookie::{CookieStore, Jar};
use serde::Deserialize;
use std::sync::{Arc, LazyLock};

static CSRF_TOKEN_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"csrfTokenValue\s*=\s*"([^"]+)""#).unwrap());

/// Initial state: empty cookie jar
#[derive(Debug)]
pub struct Unauthenticated;

/// The handshake seeded the anonymous session cookies
#[derive(Debug)]
pub struct HandshakeDone;

/// The portal accepted the credentials and named a redirect target
#[derive(Debug)]
pub struct CredentialsSubmitted {
    go_to: String,
}

/// The redirect target was visited and the session cookie should be set
#[derive(Debug)]
pub struct RedirectFollowed;

/// Login handshake in state `S`
#[derive(Debug)]
pub struct AuthenticationFlow<S> {
    client: reqwest::blocking::Client,
    jar: Arc<Jar>,
    endpoints: Endpoints,
    state: S,
}

/// JSON answer of the authorization endpoint
#[derive(Debug, Deserialize)]
struct AuthorizationResponse {
    status: Option<String>,
    errors: Option<Vec<AuthorizationMessage>>,
    #[serde(rename = "goTo")]
    go_to: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AuthorizationMessage {
    message: Option<String>,
}

impl AuthorizationResponse {
    /// Turn the response into the redirect target or the reason there is none
    fn into_redirect(self) -> Result<String, AuthorizationError> {
        match self.status.as_deref() {
            Some("ok") => {}
            Some("error") => {
                let messages: Vec<String> = self
                    .errors
                    .into_iter()
                    .flatten()
                    .filter_map(|e| e.message)
                    .collect();
                return Err(AuthorizationError::Rejected(messages.join("\n")));
            }
            _ => return Err(AuthorizationError::UnexpectedStatus(self.status)),
        }

        self.go_to
            .filter(|go_to| !go_to.is_empty())
            .ok_or(AuthorizationError::MissingRedirect)
    }
}

/// Run the whole handshake against the given endpoints
pub fn authenticate(
    endpoints: Endpoints,
    login: &str,
    password: &str,
) -> Result<SessionCredential, LibrusError> {
    AuthenticationFlow::new(endpoints)?
        .handshake()?
        .submit_credentials(login, password)?
        .follow_redirect()?
        .finish()
}

impl<S> AuthenticationFlow<S> {
    fn transition<T>(self, state: T) -> AuthenticationFlow<T> {
        AuthenticationFlow {
            client: self.client,
            jar: self.jar,
            endpoints: self.endpoints,
            state,
        }
    }
}

impl AuthenticationFlow<Unauthenticated> {
    /// Start a flow with a fresh cookie jar
    pub fn new(endpoints: Endpoints) -> Result<Self, LibrusError> {
        let jar = Arc::new(Jar::default());
        let client = reqwest::blocking::Client::builder()
            .use_rustls_tls()
            .user_agent(USER_AGENT)
            .cookie_provider(Arc::clone(&jar))
            .build()
            .map_err(|e| LibrusError::ClientInit(e.to_string()))?;

        Ok(Self {
            client,
            jar,
            endpoints,
            state: Unauthenticated,
        })
    }

    /// Seed the anonymous session
    pub fn handshake(self) -> Result<AuthenticationFlow<HandshakeDone>, LibrusError> {
        let url = self.endpoints.handshake()?;
        tracing::debug!(%url, "Starting login handshake");

        let response = self.client.get(url).send()?;
        if !response.status().is_success() {
            return Err(AuthorizationError::Handshake(response.status()).into());
        }

        Ok(self.transition(HandshakeDone))
    }
}

impl AuthenticationFlow<HandshakeDone> {
    /// Pass the captcha pre-check and post the login form
    pub fn submit_credentials(
        self,
        login: &str,
        password: &str,
    ) -> Result<AuthenticationFlow<CredentialsSubmitted>, LibrusError> {
        let captcha = self.endpoints.captcha()?;
        tracing::debug!(url = %captcha, "Passing captcha pre-check");

        let response = self
            .client
            .post(captcha)
            .form(&[("username", login), ("is_needed", "1")])
            .send()?;
        if !response.status().is_success() {
            return Err(AuthorizationError::Captcha(response.status()).into());
        }

        let authorization = self.endpoints.authorization()?;
        tracing::debug!(url = %authorization, "Submitting credentials");

        // Rejections come back as JSON with a 4xx status, so the body is
        // read regardless of the status code
        let body = self
            .client
            .post(authorization)
            .form(&[("action", "login"), ("login", login), ("pass", password)])
            .send()?
            .text()
            .map_err(|_| LibrusError::Encoding)?;

        let parsed: AuthorizationResponse =
            serde_json::from_str(&body).map_err(|_| AuthorizationError::InvalidResponse)?;
        let go_to = parsed.into_redirect().inspect_err(|e| {
            tracing::warn!(error = %e, "Portal rejected the login");
        })?;

        Ok(self.transition(CredentialsSubmitted { go_to }))
    }
}

impl AuthenticationFlow<CredentialsSubmitted> {
    /// The redirect target returned by the authorization endpoint
    pub fn go_to(&self) -> &str {
        &self.state.go_to
    }

    /// Visit the redirect target, which makes the portal set its session cookie
    pub fn follow_redirect(self) -> Result<AuthenticationFlow<RedirectFollowed>, LibrusError> {
        let url = self.endpoints.redirect(&self.state.go_to)?;
        tracing::debug!(%url, "Following login redirect");

        let response = self.client.get(url).send()?;
        if !response.status().is_success() {
            return Err(AuthorizationError::Redirect(response.status()).into());
        }

        Ok(self.transition(RedirectFollowed))
    }
}

impl AuthenticationFlow<RedirectFollowed> {
    /// Load the index page and assemble the credential from cookies and CSRF token
    pub fn finish(self) -> Result<SessionCredential, LibrusError> {
        let index = self.endpoints.index()?;
        tracing::debug!(url = %index, "Loading index page");

        let response = self.client.get(index.clone()).send()?;
        if !response.status().is_success() {
            return Err(AuthorizationError::IndexUnavailable(response.status()).into());
        }
        let html = response.text().map_err(|_| LibrusError::Encoding)?;

        let session_cookie = self
            .cookie(&index, SESSION_COOKIE)
            .ok_or(AuthorizationError::MissingCookie(SESSION_COOKIE))?;
        let device_cookie = self.cookie(&index, DEVICE_COOKIE);
        let csrf_token = extract_csrf_token(&html).ok_or(AuthorizationError::CsrfTokenNotFound)?;

        tracing::info!("Logged in to the portal");
        Ok(SessionCredential::new(
            session_cookie,
            csrf_token,
            device_cookie,
        ))
    }

    fn cookie(&self, url: &Url, name: &str) -> Option<String> {
        let header = self.jar.cookies(url)?;
        let cookies = header.to_str().ok()?;
        find_cookie(cookies, name)
    }
}

/// Find a cookie value in a `name=value; name=value` header
fn find_cookie(header: &str, name: &str) -> Option<String> {
    header
        .split(';')
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, value)| *key == name && !value.is_empty())
        .map(|(_, value)| value.to_string())
}

/// Find `csrfTokenValue = "<value>"` in a page
fn extract_csrf_token(html: &str) -> Option<String> {
    CSRF_TOKEN_REGEX
        .captures(html)
        .and_then(|captures| captures.get(1))
        .map(|value| value.as_str().to_string())
}
