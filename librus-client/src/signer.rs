//! Construction of requests authenticated with a [`SessionCredential`]

use crate::config::{CSRF_FIELD, DEVICE_COOKIE, SESSION_COOKIE, USER_AGENT};
use crate::credential::SessionCredential;
use crate::error::{AuthorizationError, LibrusError};
use reqwest::header::{self, HeaderMap, HeaderValue};
use reqwest::{Method, Url};
use zeroize::Zeroize;

/// Body of a signed request
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RequestBody {
    /// No body (GET)
    Empty,
    /// `application/x-www-form-urlencoded` fields
    Form(Vec<(String, String)>),
    /// `multipart/form-data` text fields, sent without file names
    Multipart(Vec<(String, String)>),
}

/// A fully described request, ready to be handed to the HTTP transport
#[derive(Clone, Debug)]
pub struct SignedRequest {
    pub method: Method,
    pub url: Url,
    pub headers: HeaderMap,
    pub body: RequestBody,
}

impl SignedRequest {
    /// Value of a body field, if the body carries fields
    pub fn field(&self, name: &str) -> Option<&str> {
        let fields = match &self.body {
            RequestBody::Empty => return None,
            RequestBody::Form(fields) | RequestBody::Multipart(fields) => fields,
        };
        fields
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// Turn the descriptor into a request on the given blocking client
    pub(crate) fn into_builder(
        self,
        client: &reqwest::blocking::Client,
    ) -> reqwest::blocking::RequestBuilder {
        let builder = client.request(self.method, self.url).headers(self.headers);
        match self.body {
            RequestBody::Empty => builder,
            RequestBody::Form(fields) => builder.form(&fields),
            RequestBody::Multipart(fields) => {
                let form = fields
                    .into_iter()
                    .fold(reqwest::blocking::multipart::Form::new(), |form, (name, value)| {
                        form.text(name, value)
                    });
                builder.multipart(form)
            }
        }
    }
}

/// Builds [`SignedRequest`]s for one credential
///
/// Every request gets the session cookie and the browser `User-Agent`. POST
/// bodies additionally get the CSRF token in the `requestkey` field; GET
/// requests never carry it.
#[derive(Clone, Copy, Debug)]
pub struct RequestSigner<'a> {
    credential: &'a SessionCredential,
}

impl<'a> RequestSigner<'a> {
    pub fn new(credential: &'a SessionCredential) -> Self {
        Self { credential }
    }

    /// Sign a GET request
    pub fn get(&self, url: Url) -> Result<SignedRequest, LibrusError> {
        self.sign(Method::GET, url, RequestBody::Empty)
    }

    /// Sign a url-encoded form POST
    pub fn post_form(
        &self,
        url: Url,
        fields: Vec<(String, String)>,
    ) -> Result<SignedRequest, LibrusError> {
        let fields = self.with_csrf(fields);
        self.sign(Method::POST, url, RequestBody::Form(fields))
    }

    /// Sign a multipart POST
    pub fn post_multipart(
        &self,
        url: Url,
        fields: Vec<(String, String)>,
    ) -> Result<SignedRequest, LibrusError> {
        let fields = self.with_csrf(fields);
        self.sign(Method::POST, url, RequestBody::Multipart(fields))
    }

    fn with_csrf(&self, mut fields: Vec<(String, String)>) -> Vec<(String, String)> {
        fields.retain(|(name, _)| name != CSRF_FIELD);
        fields.push((
            CSRF_FIELD.to_string(),
            self.credential.csrf_token().to_string(),
        ));
        fields
    }

    fn sign(
        &self,
        method: Method,
        url: Url,
        body: RequestBody,
    ) -> Result<SignedRequest, LibrusError> {
        if !self.credential.is_authenticated() {
            return Err(AuthorizationError::Unauthenticated.into());
        }

        let mut headers = HeaderMap::new();
        headers.insert(header::USER_AGENT, HeaderValue::from_static(USER_AGENT));
        headers.insert(header::COOKIE, self.cookie_header()?);

        tracing::debug!(%method, %url, "Signed request");

        Ok(SignedRequest {
            method,
            url,
            headers,
            body,
        })
    }

    /// Create a sensitive cookie header and zeroize the temporary string
    fn cookie_header(&self) -> Result<HeaderValue, LibrusError> {
        let mut cookie_string = format!("{}={}", SESSION_COOKIE, self.credential.session_cookie());
        if let Some(device) = self.credential.device_cookie() {
            cookie_string.push_str(&format!("; {}={}", DEVICE_COOKIE, device));
        }

        let header_value = HeaderValue::from_bytes(cookie_string.as_bytes())
            .map_err(|_| LibrusError::ClientInit("Invalid session cookie format".to_string()));
        cookie_string.zeroize();

        let mut sensitive_header = header_value?;
        sensitive_header.set_sensitive(true);
        Ok(sensitive_header)
    }
}
