//! Obtaining a working session: environment token, cached token or fresh login

use crate::cache::TokenCache;
use crate::config::Login;
use crate::error::CliError;
use librus_client::{LibrusClient, SessionCredential};
use zeroize::Zeroizing;

/// Hands out verified credentials and keeps the token cache current
pub struct SessionManager<'a> {
    client: &'a LibrusClient,
    cache: TokenCache,
}

impl<'a> SessionManager<'a> {
    pub fn new(client: &'a LibrusClient, cache: TokenCache) -> Self {
        Self { client, cache }
    }

    /// Authenticate with login and password, cache the token and return it
    pub fn login(&self, login: &Login) -> Result<(SessionCredential, Zeroizing<String>), CliError> {
        let credential = self.client.authenticate(&login.login, &login.password)?;
        let token = Zeroizing::new(credential.encode());
        self.cache.put(&token)?;
        tracing::debug!(path = %self.cache.path().display(), "Cached session token");
        Ok((credential, token))
    }

    /// Return a credential the portal currently accepts
    ///
    /// Tries the environment token, then the cached token. A token the portal
    /// no longer accepts is replaced by a fresh login.
    pub fn credential(&self, env_token: Option<&str>) -> Result<SessionCredential, CliError> {
        let token = match env_token {
            Some(token) => Some(Zeroizing::new(token.to_string())),
            None => self.cache.get()?,
        };

        if let Some(token) = token {
            let credential: SessionCredential = token.parse()?;
            if self.client.verify_session(&credential)? {
                return Ok(credential);
            }
            tracing::info!("Session token expired, logging in again");
        }

        let (credential, _) = self.login(&Login::resolve()?)?;
        Ok(credential)
    }

    /// Forget the cached token
    pub fn logout(&self) -> Result<bool, CliError> {
        Ok(self.cache.remove()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn offline_client() -> LibrusClient {
        LibrusClient::builder()
            .api_base("http://127.0.0.1:9")
            .unwrap()
            .portal_base("http://127.0.0.1:9")
            .unwrap()
            .build()
            .unwrap()
    }

    #[test]
    fn test_malformed_token_rejected_before_network() {
        let temp = TempDir::new().unwrap();
        let client = offline_client();
        let manager = SessionManager::new(&client, TokenCache::new(temp.path()));

        let result = manager.credential(Some("not base64!"));

        assert!(matches!(result, Err(CliError::Token(_))));
    }

    #[test]
    fn test_malformed_cached_token_rejected() {
        let temp = TempDir::new().unwrap();
        let cache = TokenCache::new(temp.path());
        cache.put("bm9zZXBhcmF0b3I=").unwrap();

        let client = offline_client();
        let manager = SessionManager::new(&client, cache);

        assert!(matches!(manager.credential(None), Err(CliError::Token(_))));
    }

    #[test]
    fn test_valid_cached_token_reused() {
        let mut server = mockito::Server::new();
        let index = server
            .mock("GET", "/uczen/index")
            .match_header("cookie", "DZIENNIKSID=session99")
            .with_status(200)
            .expect(1)
            .create();

        let temp = TempDir::new().unwrap();
        let cache = TokenCache::new(temp.path());
        let token = SessionCredential::new("session99", "f00dcafe", None).encode();
        cache.put(&token).unwrap();

        let client = LibrusClient::builder()
            .api_base(server.url())
            .unwrap()
            .portal_base(server.url())
            .unwrap()
            .build()
            .unwrap();
        let manager = SessionManager::new(&client, cache);
        let credential = manager.credential(None).unwrap();

        assert_eq!(credential.session_cookie(), "session99");
        assert_eq!(credential.csrf_token(), "f00dcafe");
        index.assert();
    }

    #[test]
    fn test_logout() {
        let temp = TempDir::new().unwrap();
        let cache = TokenCache::new(temp.path());
        cache.put("token").unwrap();

        let client = offline_client();
        let manager = SessionManager::new(&client, cache);

        assert!(manager.logout().unwrap());
        assert!(!manager.logout().unwrap());
    }
}
