//! Librus HTTP client implementation

use crate::auth;
use crate::config::Endpoints;
use crate::credential::SessionCredential;
use crate::error::{AuthorizationError, LibrusError};
use crate::listing::PagedListing;
use crate::model::{LessonUnit, Week};
use crate::parser::{MessagePage, MessageParser, TimetableParser};
use crate::signer::{RequestSigner, SignedRequest};
use reqwest::StatusCode;

/// Container id of the received-messages folder
const INBOX_CONTAINER: &str = "105";

/// The main Librus HTTP client
///
/// Logs in, then fetches and parses message listings and timetables for a
/// [`SessionCredential`]. The client itself holds no session state: the same
/// client can serve any number of credentials.
///
/// # Example
///
/// ```no_run
/// use librus_client::{LibrusClient, Week};
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let client = LibrusClient::new()?;
/// let credential = client.authenticate("1234567u", "password")?;
///
/// let page = client.message_page(&credential, 0)?;
/// for brief in page.messages()? {
///     println!("{}", brief?.title);
/// }
///
/// for lesson in client.lesson_units(&credential, Week::current())? {
///     println!("{} {}", lesson.start, lesson.name);
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Debug)]
pub struct LibrusClient {
    client: reqwest::blocking::Client,
    endpoints: Endpoints,
    messages: MessageParser,
    timetable: TimetableParser,
}

impl LibrusClient {
    /// Create a new client for the public portal with no redirect policy
    ///
    /// # Errors
    ///
    /// Returns `LibrusError::ClientInit` if the HTTP client cannot be initialized.
    pub fn new() -> Result<Self, LibrusError> {
        Self::builder().build()
    }

    /// Create a builder for configuring the client
    ///
    /// # Example
    ///
    /// ```no_run
    /// use librus_client::LibrusClient;
    ///
    /// # fn main() -> Result<(), Box<dyn std::error::Error>> {
    /// let client = LibrusClient::builder()
    ///     .api_base("http://localhost:1234")?
    ///     .portal_base("http://localhost:1234")?
    ///     .build()?;
    /// # Ok(())
    /// # }
    /// ```
    pub fn builder() -> LibrusClientBuilder {
        LibrusClientBuilder::new()
    }

    pub fn endpoints(&self) -> &Endpoints {
        &self.endpoints
    }

    /// Log in and return a fresh credential
    ///
    /// Runs the full handshake with its own cookie jar; nothing from the
    /// login is kept in the client.
    ///
    /// # Errors
    ///
    /// * `LibrusError::Authorization` - any step of the handshake failed
    /// * `LibrusError::Request` - network error
    pub fn authenticate(
        &self,
        login: &str,
        password: &str,
    ) -> Result<SessionCredential, LibrusError> {
        auth::authenticate(self.endpoints.clone(), login, password)
    }

    /// Check whether a credential still opens the index page
    ///
    /// * `Ok(true)` - 2xx, the session is valid
    /// * `Ok(false)` - redirect or error status, the session is not valid
    /// * `Err` - network error or the credential cannot be signed
    pub fn verify_session(&self, credential: &SessionCredential) -> Result<bool, LibrusError> {
        let request = RequestSigner::new(credential).get(self.endpoints.index()?)?;
        let response = request.into_builder(&self.client).send()?;
        Ok(response.status().is_success())
    }

    /// Fetch and parse one page (0-based) of the received-messages listing
    ///
    /// # Errors
    ///
    /// * `LibrusError::OutOfBounds` - the page lies past the last page
    /// * `LibrusError::Authorization` - the session expired
    /// * `LibrusError::InvalidStatus` - HTTP error
    /// * `LibrusError::HtmlParse` - the page lacks its pagination element
    pub fn message_page(
        &self,
        credential: &SessionCredential,
        page: usize,
    ) -> Result<MessagePage<'_>, LibrusError> {
        let request =
            RequestSigner::new(credential).post_multipart(self.endpoints.messages()?, listing_fields(page))?;
        let html = self.send(request)?;
        self.messages.extract_page(&html, page)
    }

    /// Walk the message listing page by page
    pub fn message_pages<'a>(&'a self, credential: &'a SessionCredential) -> PagedListing<'a> {
        PagedListing::new(self, credential)
    }

    /// Fetch every lesson of a week, in no particular order
    ///
    /// # Errors
    ///
    /// * `LibrusError::Authorization` - the session expired or the portal answered
    ///   with its access denied page
    /// * `LibrusError::InvalidStatus` - HTTP error
    /// * `LibrusError::HtmlParse` - a lesson cell is malformed
    pub fn lesson_units(
        &self,
        credential: &SessionCredential,
        week: Week,
    ) -> Result<Vec<LessonUnit>, LibrusError> {
        let fields = vec![("tydzien".to_string(), week.to_string())];
        let request = RequestSigner::new(credential).post_form(self.endpoints.timetable()?, fields)?;
        let html = self.send(request)?;
        self.timetable.extract_week(&html)
    }

    fn send(&self, request: SignedRequest) -> Result<String, LibrusError> {
        let response = request.into_builder(&self.client).send()?;
        let status = response.status();

        // Redirects are never followed, so one here is the portal sending an
        // invalid session back to its login page
        if status.is_redirection()
            || status == StatusCode::UNAUTHORIZED
            || status == StatusCode::FORBIDDEN
        {
            tracing::warn!(%status, "Portal rejected the session");
            return Err(AuthorizationError::SessionExpired(status).into());
        }

        if !status.is_success() {
            return Err(LibrusError::InvalidStatus { status });
        }

        response.text().map_err(|_| LibrusError::Encoding)
    }
}

/// Form fields of the received-messages listing, sorted by date descending
fn listing_fields(page: usize) -> Vec<(String, String)> {
    let page = page.to_string();
    [
        ("filtrUzytkownikow", "0"),
        ("idPojemnika", INBOX_CONTAINER),
        ("opcja_zaznaczone_g", "0"),
        ("filtr_uzytkownikow", "-"),
        ("sortujTabele[tabeleKolumna]", "3"),
        ("sortujTabele[tabeleKierunek]", "1"),
        ("sortujTabele[tabelePojemnik]", INBOX_CONTAINER),
        ("sortowanie[105][0]", ""),
        ("sortowanie[105][1]", ""),
        ("sortowanie[105][2]", ""),
        ("opcja_zaznaczone_d", "0"),
        ("numer_strony105", page.as_str()),
        ("porcjowanie_pojemnik105", INBOX_CONTAINER),
        ("poprzednia", "5"),
    ]
    .into_iter()
    .map(|(name, value)| (name.to_string(), value.to_string()))
    .collect()
}

/// Builder for configuring a Librus client
///
/// Both base URLs can be replaced, which is how tests point the client at a
/// mock server. The redirect policy of the signed-request client is always
/// `Policy::none()`, so an expired session shows up as a redirect status
/// instead of a login page parsed as data.
#[derive(Debug)]
pub struct LibrusClientBuilder {
    api_base: Option<reqwest::Url>,
    portal_base: Option<reqwest::Url>,
    client_builder: Option<reqwest::blocking::ClientBuilder>,
}

impl LibrusClientBuilder {
    /// Create a new builder with default settings
    pub fn new() -> Self {
        Self {
            api_base: None,
            portal_base: None,
            client_builder: None,
        }
    }

    /// Set a custom base URL for the OAuth API
    ///
    /// # Errors
    ///
    /// Returns an error if the URL cannot be parsed.
    pub fn api_base(mut self, url: impl reqwest::IntoUrl) -> Result<Self, LibrusError> {
        self.api_base = Some(url.into_url()?);
        Ok(self)
    }

    /// Set a custom base URL for the portal pages
    ///
    /// # Errors
    ///
    /// Returns an error if the URL cannot be parsed.
    pub fn portal_base(mut self, url: impl reqwest::IntoUrl) -> Result<Self, LibrusError> {
        self.portal_base = Some(url.into_url()?);
        Ok(self)
    }

    /// Set a custom HTTP client builder (timeouts, proxies, etc.)
    ///
    /// The redirect policy will always be overridden to `Policy::none()`.
    pub fn client_builder(mut self, builder: reqwest::blocking::ClientBuilder) -> Self {
        self.client_builder = Some(builder);
        self
    }

    /// Build the client with the configured settings
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be initialized.
    pub fn build(self) -> Result<LibrusClient, LibrusError> {
        let defaults = Endpoints::default();
        let endpoints = Endpoints::new(
            self.api_base.unwrap_or_else(|| defaults.api_base().clone()),
            self.portal_base
                .unwrap_or_else(|| defaults.portal_base().clone()),
        );

        let builder = self
            .client_builder
            .unwrap_or_else(|| reqwest::blocking::Client::builder().use_rustls_tls());

        let client = builder
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .map_err(|e| LibrusError::ClientInit(e.to_string()))?;

        Ok(LibrusClient {
            client,
            endpoints,
            messages: MessageParser::new(),
            timetable: TimetableParser::new(),
        })
    }
}

impl Default for LibrusClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::{Matcher, Server, ServerGuard};
    use proptest::prelude::*;

    fn client(server: &ServerGuard) -> LibrusClient {
        LibrusClient::builder()
            .api_base(server.url())
            .unwrap()
            .portal_base(server.url())
            .unwrap()
            .build()
            .unwrap()
    }

    fn credential() -> SessionCredential {
        SessionCredential::new("session99", "f00dcafe", None)
    }

    fn listing_html(current: usize, total: usize) -> String {
        format!(
            r#"<html><body>
<div class="pagination"><span>Strona {current} z {total}</span></div>
<table class="decorated stretch"><tbody>
<tr>
  <td><input type="checkbox" value="{current}00"/></td>
  <td></td>
  <td style="font-weight: bold;"><a>admin (John Doe)</a></td>
  <td><a>Page {current}</a></td>
  <td class="medium center">2021-01-11 08:00:00</td>
</tr>
</tbody></table>
</body></html>"#
        )
    }

    /// Multipart part `name` with text `value`
    fn multipart_field(name: &str, value: &str) -> Matcher {
        Matcher::Regex(format!("name=\"{}\"\r\n\r\n{}\r\n", regex::escape(name), value))
    }

    #[test]
    fn test_default_endpoints() {
        let client = LibrusClient::new().unwrap();

        assert_eq!(client.endpoints().api_base().as_str(), "https://api.librus.pl/");
        assert_eq!(
            client.endpoints().portal_base().as_str(),
            "https://synergia.librus.pl/"
        );
    }

    #[test]
    fn test_invalid_base_url() {
        let result = LibrusClient::builder().portal_base("not a valid url");

        assert!(result.is_err());
    }

    #[test]
    fn test_message_page_request_is_signed() {
        let mut server = Server::new();
        let mock = server
            .mock("POST", "/wiadomosci")
            .match_header("cookie", "DZIENNIKSID=session99")
            .match_header("user-agent", Matcher::Regex("^Mozilla/5.0".into()))
            .match_header("content-type", Matcher::Regex("^multipart/form-data".into()))
            .match_body(Matcher::AllOf(vec![
                multipart_field("requestkey", "f00dcafe"),
                multipart_field("numer_strony105", "0"),
                multipart_field("idPojemnika", "105"),
            ]))
            .with_status(200)
            .with_body(listing_html(1, 2))
            .expect(1)
            .create();

        let client = client(&server);
        let credential = credential();
        let page = client.message_page(&credential, 0).unwrap();

        assert_eq!(page.info().current, 0);
        assert_eq!(page.info().max_page, 1);
        let briefs: Vec<_> = page.messages().unwrap().collect::<Result<_, _>>().unwrap();
        assert_eq!(briefs.len(), 1);
        assert_eq!(briefs[0].title, "Page 1");
        assert!(!briefs[0].is_read);

        mock.assert();
    }

    #[test]
    fn test_message_page_out_of_bounds() {
        let mut server = Server::new();
        let _mock = server
            .mock("POST", "/wiadomosci")
            .with_status(200)
            .with_body(listing_html(2, 2))
            .create();

        let client = client(&server);
        let credential = credential();
        let result = client.message_page(&credential, 5);

        assert!(matches!(
            result,
            Err(LibrusError::OutOfBounds { requested: 5, max_page: 1 })
        ));
    }

    #[test]
    fn test_expired_session_redirect_not_followed() {
        let mut server = Server::new();
        let login_page = server.mock("GET", "/").expect(0).create();
        let _mock = server
            .mock("POST", "/wiadomosci")
            .with_status(302)
            .with_header("location", "/")
            .create();

        let client = client(&server);
        let credential = credential();
        let err = client.message_page(&credential, 0).map(|p| p.info()).unwrap_err();

        assert!(err.requires_reauthentication());
        match err {
            LibrusError::Authorization(AuthorizationError::SessionExpired(status)) => {
                assert_eq!(status.as_u16(), 302)
            }
            other => panic!("Expected SessionExpired, got {:?}", other),
        }
        login_page.assert();
    }

    #[test]
    fn test_forbidden_is_expired_session() {
        let mut server = Server::new();
        let _mock = server
            .mock("POST", "/przegladaj_plan_lekcji")
            .with_status(403)
            .create();

        let client = client(&server);
        let result = client.lesson_units(&credential(), Week::current());

        assert!(matches!(
            result,
            Err(LibrusError::Authorization(AuthorizationError::SessionExpired(status)))
                if status == StatusCode::FORBIDDEN
        ));
    }

    #[test]
    fn test_server_error_is_transport_error() {
        let mut server = Server::new();
        let _mock = server.mock("POST", "/wiadomosci").with_status(500).create();

        let client = client(&server);
        let credential = credential();
        let err = client.message_page(&credential, 0).map(|p| p.info()).unwrap_err();

        assert!(!err.requires_reauthentication());
        assert!(matches!(err, LibrusError::InvalidStatus { status } if status.as_u16() == 500));
    }

    #[test]
    fn test_lesson_units_posts_week() {
        let mut server = Server::new();
        let mock = server
            .mock("POST", "/przegladaj_plan_lekcji")
            .match_header("cookie", "DZIENNIKSID=session99")
            .match_body(Matcher::AllOf(vec![
                Matcher::UrlEncoded("tydzien".into(), "2020-08-31_2020-09-06".into()),
                Matcher::UrlEncoded("requestkey".into(), "f00dcafe".into()),
            ]))
            .with_status(200)
            .with_body(
                r#"<html><body><table><tr>
<td id="timetableEntryBox" data-date="2020-09-01" data-time_from="08:00" data-time_to="08:45">
  <div class="text"><b>Matematyka</b><br/>&nbsp;-&nbsp;Jan Kowalski s. 24</div>
</td></tr></table></body></html>"#,
            )
            .expect(1)
            .create();

        let client = client(&server);
        let week: Week = "2020-09-03".parse().unwrap();
        let lessons = client.lesson_units(&credential(), week).unwrap();

        assert_eq!(lessons.len(), 1);
        assert_eq!(lessons[0].name, "Matematyka");
        assert_eq!(lessons[0].week(), week);
        mock.assert();
    }

    #[test]
    fn test_lesson_units_access_denied() {
        let mut server = Server::new();
        let _mock = server
            .mock("POST", "/przegladaj_plan_lekcji")
            .with_status(200)
            .with_body("<html><body><h2>Brak dostępu</h2></body></html>")
            .create();

        let client = client(&server);
        let result = client.lesson_units(&credential(), Week::current());

        let err = result.unwrap_err();
        assert!(err.requires_reauthentication());
        assert!(matches!(
            err,
            LibrusError::Authorization(AuthorizationError::AccessDenied)
        ));
    }

    #[test]
    fn test_unauthenticated_credential_never_sent() {
        let mut server = Server::new();
        let mock = server.mock("POST", "/wiadomosci").expect(0).create();

        let client = client(&server);
        let credential = SessionCredential::unauthenticated();
        let result = client.message_page(&credential, 0);

        assert!(matches!(
            result.map(|p| p.info()),
            Err(LibrusError::Authorization(AuthorizationError::Unauthenticated))
        ));
        mock.assert();
    }

    #[test]
    fn test_verify_session() {
        let mut server = Server::new();
        let _valid = server
            .mock("GET", "/uczen/index")
            .match_header("cookie", "DZIENNIKSID=session99")
            .with_status(200)
            .create();
        let _expired = server
            .mock("GET", "/uczen/index")
            .match_header("cookie", "DZIENNIKSID=stale")
            .with_status(302)
            .with_header("location", "/")
            .create();

        let client = client(&server);

        assert!(client.verify_session(&credential()).unwrap());
        let stale = SessionCredential::new("stale", "f00dcafe", None);
        assert!(!client.verify_session(&stale).unwrap());
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(5))]

        #[test]
        fn prop_requested_page_is_reported_page(max_page in 0usize..6, seed in 0usize..100) {
            let page = seed % (max_page + 1);
            let mut server = Server::new();
            let _mock = server
                .mock("POST", "/wiadomosci")
                .match_body(multipart_field("numer_strony105", &page.to_string()))
                .with_status(200)
                .with_body(listing_html(page + 1, max_page + 1))
                .create();

            let client = client(&server);
            let credential = credential();
            let fetched = client.message_page(&credential, page).unwrap();

            prop_assert_eq!(fetched.info().current, page);
            prop_assert_eq!(fetched.info().max_page, max_page);
        }
    }
}
