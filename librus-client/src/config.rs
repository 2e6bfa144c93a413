//! Fixed portal endpoints, cookie names and headers

use crate::error::LibrusError;
use reqwest::Url;

/// Browser-like identifier; the portal rejects default client identifiers
pub const USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:128.0) Gecko/20100101 Firefox/128.0";

/// Cookie identifying an authenticated portal session
pub const SESSION_COOKIE: &str = "DZIENNIKSID";

/// Cookie identifying the browser/device to the portal
pub const DEVICE_COOKIE: &str = "SDZIENNIKSID";

/// Form field carrying the CSRF token on POST requests
pub const CSRF_FIELD: &str = "requestkey";

const DEFAULT_API_BASE: &str = "https://api.librus.pl/";
const DEFAULT_PORTAL_BASE: &str = "https://synergia.librus.pl/";

const HANDSHAKE_PATH: &str = "OAuth/Authorization?client_id=46&response_type=code&scope=mydata";
const CAPTCHA_PATH: &str = "OAuth/Captcha";
const AUTHORIZATION_PATH: &str = "OAuth/Authorization?client_id=46";
const INDEX_PATH: &str = "uczen/index";
const MESSAGES_PATH: &str = "wiadomosci";
const TIMETABLE_PATH: &str = "przegladaj_plan_lekcji";

/// Endpoint set for one portal deployment
///
/// The OAuth handshake lives under the API base, everything that needs the
/// session cookie lives under the portal base.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Endpoints {
    api_base: Url,
    portal_base: Url,
}

impl Endpoints {
    /// Create an endpoint set from two base URLs
    pub fn new(api_base: Url, portal_base: Url) -> Self {
        Self {
            api_base,
            portal_base,
        }
    }

    /// Base URL of the OAuth API
    pub fn api_base(&self) -> &Url {
        &self.api_base
    }

    /// Base URL of the portal
    pub fn portal_base(&self) -> &Url {
        &self.portal_base
    }

    pub fn handshake(&self) -> Result<Url, LibrusError> {
        join(&self.api_base, HANDSHAKE_PATH)
    }

    pub fn captcha(&self) -> Result<Url, LibrusError> {
        join(&self.api_base, CAPTCHA_PATH)
    }

    pub fn authorization(&self) -> Result<Url, LibrusError> {
        join(&self.api_base, AUTHORIZATION_PATH)
    }

    /// Resolve a `goTo` target from the authorization response
    pub fn redirect(&self, go_to: &str) -> Result<Url, LibrusError> {
        join(&self.api_base, go_to)
    }

    pub fn index(&self) -> Result<Url, LibrusError> {
        join(&self.portal_base, INDEX_PATH)
    }

    pub fn messages(&self) -> Result<Url, LibrusError> {
        join(&self.portal_base, MESSAGES_PATH)
    }

    pub fn timetable(&self) -> Result<Url, LibrusError> {
        join(&self.portal_base, TIMETABLE_PATH)
    }
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            api_base: Url::parse(DEFAULT_API_BASE).expect("Default API URL should always be valid"),
            portal_base: Url::parse(DEFAULT_PORTAL_BASE)
                .expect("Default portal URL should always be valid"),
        }
    }
}

fn join(base: &Url, path: &str) -> Result<Url, LibrusError> {
    base.join(path)
        .map_err(|e| LibrusError::ClientInit(format!("Cannot build URL from {path}: {e}")))
}
