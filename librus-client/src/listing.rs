//! Page-by-page traversal of the message listing

use crate::client::LibrusClient;
use crate::credential::SessionCredential;
use crate::error::LibrusError;
use crate::model::MessageBrief;
use crate::parser::MessagePage;

/// Iterator over the pages of the received-messages listing
///
/// Starts at page 0 and learns the last page index from the first response.
/// Yields each page once and stops after the last page or after the first
/// error.
///
/// # Example
///
/// ```no_run
/// use librus_client::LibrusClient;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let client = LibrusClient::new()?;
/// let credential = client.authenticate("1234567u", "password")?;
///
/// for page in client.message_pages(&credential) {
///     let page = page?;
///     println!("page {} of {}", page.info().current + 1, page.info().page_count());
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct PagedListing<'a> {
    client: &'a LibrusClient,
    credential: &'a SessionCredential,
    next: usize,
    max_page: Option<usize>,
    done: bool,
}

impl<'a> PagedListing<'a> {
    pub(crate) fn new(client: &'a LibrusClient, credential: &'a SessionCredential) -> Self {
        Self {
            client,
            credential,
            next: 0,
            max_page: None,
            done: false,
        }
    }

    /// Last page index, known once the first page was fetched
    pub fn max_page(&self) -> Option<usize> {
        self.max_page
    }

    /// Fetch an arbitrary page without moving the iterator
    pub fn page(&self, index: usize) -> Result<MessagePage<'a>, LibrusError> {
        self.client.message_page(self.credential, index)
    }

    /// Fetch every remaining page and collect all of their messages
    pub fn collect_messages(self) -> Result<Vec<MessageBrief>, LibrusError> {
        let mut briefs = Vec::new();
        for page in self {
            for brief in page?.messages()? {
                briefs.push(brief?);
            }
        }
        Ok(briefs)
    }
}

impl<'a> Iterator for PagedListing<'a> {
    type Item = Result<MessagePage<'a>, LibrusError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done || self.max_page.is_some_and(|max| self.next > max) {
            return None;
        }

        let result = self.page(self.next);
        match &result {
            Ok(page) => {
                let info = page.info();
                self.max_page = Some(info.max_page);
                self.next += 1;
                tracing::debug!(page = info.current, max_page = info.max_page, "Fetched message page");
            }
            Err(e) => {
                tracing::debug!(page = self.next, error = %e, "Stopping message listing");
                self.done = true;
            }
        }
        Some(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::{Matcher, Mock, Server, ServerGuard};

    fn client(server: &ServerGuard) -> LibrusClient {
        LibrusClient::builder()
            .portal_base(server.url())
            .unwrap()
            .build()
            .unwrap()
    }

    fn credential() -> SessionCredential {
        SessionCredential::new("session99", "f00dcafe", None)
    }

    fn row(id: usize) -> String {
        format!(
            r#"<tr>
  <td><input type="checkbox" value="{id}"/></td>
  <td></td>
  <td><a>Anna Nowak</a></td>
  <td><a>Message {id}</a></td>
  <td class="medium center">2021-01-11 08:00:00</td>
</tr>"#
        )
    }

    fn serve_page(server: &mut ServerGuard, reported: usize, total: usize, requested: usize) -> Mock {
        let rows: String = (0..2).map(|i| row(reported * 10 + i)).collect();
        server
            .mock("POST", "/wiadomosci")
            .match_body(Matcher::Regex(format!(
                "name=\"numer_strony105\"\r\n\r\n{requested}\r\n"
            )))
            .with_status(200)
            .with_body(format!(
                r#"<html><body>
<div class="pagination"><span>Strona {} z {total}</span></div>
<table class="decorated stretch"><tbody>{rows}</tbody></table>
</body></html>"#,
                reported + 1
            ))
            .expect(1)
            .create()
    }

    #[test]
    fn test_walks_all_pages_once() {
        let mut server = Server::new();
        let mocks: Vec<_> = (0..3).map(|p| serve_page(&mut server, p, 3, p)).collect();
        let beyond = server
            .mock("POST", "/wiadomosci")
            .match_body(Matcher::Regex("name=\"numer_strony105\"\r\n\r\n3\r\n".into()))
            .expect(0)
            .create();

        let client = client(&server);
        let credential = credential();
        let mut listing = client.message_pages(&credential);
        assert_eq!(listing.max_page(), None);

        let mut seen = Vec::new();
        for page in listing.by_ref() {
            seen.push(page.unwrap().info().current);
        }

        assert_eq!(seen, vec![0, 1, 2]);
        assert_eq!(listing.max_page(), Some(2));
        for mock in mocks {
            mock.assert();
        }
        beyond.assert();
    }

    #[test]
    fn test_collect_messages() {
        let mut server = Server::new();
        let _mocks: Vec<_> = (0..2).map(|p| serve_page(&mut server, p, 2, p)).collect();

        let client = client(&server);
        let credential = credential();
        let briefs = client.message_pages(&credential).collect_messages().unwrap();

        let ids: Vec<_> = briefs.iter().map(|b| b.id.as_str()).collect();
        assert_eq!(ids, vec!["0", "1", "10", "11"]);
    }

    #[test]
    fn test_stops_after_first_error() {
        let mut server = Server::new();
        let _first = serve_page(&mut server, 0, 3, 0);
        let _failing = server
            .mock("POST", "/wiadomosci")
            .match_body(Matcher::Regex("name=\"numer_strony105\"\r\n\r\n1\r\n".into()))
            .with_status(500)
            .expect(1)
            .create();

        let client = client(&server);
        let credential = credential();
        let mut listing = client.message_pages(&credential);

        assert!(listing.next().unwrap().is_ok());
        assert!(matches!(
            listing.next(),
            Some(Err(LibrusError::InvalidStatus { .. }))
        ));
        assert!(listing.next().is_none());
    }

    #[test]
    fn test_random_access_page() {
        let mut server = Server::new();
        let _mock = serve_page(&mut server, 1, 3, 1);

        let client = client(&server);
        let credential = credential();
        let listing = client.message_pages(&credential);
        let page = listing.page(1).unwrap();

        assert_eq!(page.info().current, 1);
        assert_eq!(listing.max_page(), None);
    }
}
