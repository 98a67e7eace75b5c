//! Login, credential caching and token refresh.

use log::debug;
use reqwest::{Client, StatusCode};
use std::time::{Duration, Instant};

use crate::api::types::{AuthResponse, RefreshResponse};
use crate::error::{Error, Result, classify_transport};

/// Treat a token as expired this long before the server would, so an
/// in-flight request does not race the server-side expiry.
const EXPIRY_MARGIN: Duration = Duration::from_secs(60);

/// Resolved credentials held after a successful login.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub user_uuid: String,
    pub public_user_uuid: String,
    pub access_token: String,
    pub refresh_token: String,
    expires_at: Instant,
}

impl Credentials {
    pub(crate) fn new(
        user_uuid: String,
        public_user_uuid: String,
        access_token: String,
        refresh_token: String,
        expires_at: Instant,
    ) -> Self {
        Self {
            user_uuid,
            public_user_uuid,
            access_token,
            refresh_token,
            expires_at,
        }
    }

    fn from_login(auth: AuthResponse) -> Self {
        Self::new(
            auth.uuid,
            auth.public_uuid,
            auth.access_token,
            auth.refresh_token,
            expiry(auth.expires_in),
        )
    }

    fn renew(&mut self, refreshed: RefreshResponse) {
        self.access_token = refreshed.access_token;
        self.expires_at = expiry(refreshed.expires_in);
    }

    /// Whether the access token is past (or within the safety margin of)
    /// its expiry.
    pub fn is_expired(&self) -> bool {
        Instant::now() >= self.expires_at
    }
}

fn expiry(expires_in: u64) -> Instant {
    Instant::now() + Duration::from_secs(expires_in).saturating_sub(EXPIRY_MARGIN)
}

/// Performs login against the auth endpoints and keeps the resulting
/// credentials fresh. Credentials are refreshed in place; one `Session`
/// serves one account.
pub struct Session {
    email: String,
    password: String,
    credentials: Option<Credentials>,
}

impl Session {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
            credentials: None,
        }
    }

    /// Cached credentials, if a login has happened.
    pub fn credentials(&self) -> Option<&Credentials> {
        self.credentials.as_ref()
    }

    /// Logs in with the stored email and password, replacing any cached
    /// credentials.
    #[tracing::instrument(skip(self, http, base_url))]
    pub async fn login(&mut self, http: &Client, base_url: &str) -> Result<&Credentials> {
        let url = format!("{}/bringauth", base_url);
        debug!("Logging in at {}...", url);

        let response = http
            .post(&url)
            .form(&[
                ("email", self.email.as_str()),
                ("password", self.password.as_str()),
            ])
            .send()
            .await
            .map_err(classify_transport)?;

        let status = response.status();
        debug!("Response from {}: {}", url, status);

        if status == StatusCode::UNAUTHORIZED {
            return Err(Error::Auth(
                "login rejected, check your email and password".to_string(),
            ));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Request {
                status: Some(status),
                body,
            });
        }

        let body = response.text().await.map_err(classify_transport)?;
        let value: serde_json::Value = serde_json::from_str(&body)
            .map_err(|e| Error::Parse(format!("cannot parse login response: {}", e)))?;
        // A well-formed 2xx payload without the credential fields means the
        // account itself is not usable, not that the response is garbage.
        let auth: AuthResponse = serde_json::from_value(value).map_err(|e| {
            Error::Auth(format!(
                "login response is missing credential data ({}), check your email and password",
                e
            ))
        })?;

        debug!("Logged in as user {}", auth.uuid);
        Ok(self.credentials.insert(Credentials::from_login(auth)))
    }

    /// Exchanges the refresh token for a new access token, updating the
    /// cached credentials in place.
    #[tracing::instrument(skip(self, http, base_url))]
    pub async fn refresh(&mut self, http: &Client, base_url: &str) -> Result<&Credentials> {
        let Some(credentials) = self.credentials.as_mut() else {
            return Err(Error::Auth(
                "cannot refresh a session that never logged in".to_string(),
            ));
        };

        let url = format!("{}/bringauth/token", base_url);
        debug!("Refreshing access token at {}...", url);

        let response = http
            .post(&url)
            .form(&[
                ("grant_type", "refresh_token"),
                ("refresh_token", credentials.refresh_token.as_str()),
            ])
            .send()
            .await
            .map_err(classify_transport)?;

        let status = response.status();
        debug!("Response from {}: {}", url, status);

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Auth(format!(
                "token refresh rejected (HTTP {}): {}",
                status.as_u16(),
                body
            )));
        }

        let refreshed: RefreshResponse = response.json().await.map_err(|e| {
            Error::Auth(format!("token refresh produced an unusable response: {}", e))
        })?;

        credentials.renew(refreshed);
        Ok(credentials)
    }

    /// Returns non-expired credentials, logging in or refreshing first when
    /// needed. Cached valid credentials are returned untouched.
    #[tracing::instrument(skip(self, http, base_url))]
    pub async fn ensure_valid(&mut self, http: &Client, base_url: &str) -> Result<Credentials> {
        match &self.credentials {
            Some(credentials) if !credentials.is_expired() => Ok(credentials.clone()),
            Some(_) => {
                debug!("Access token expired, refreshing...");
                self.refresh(http, base_url).await.map(|c| c.clone())
            }
            None => self.login(http, base_url).await.map(|c| c.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::auth_body;
    use mockito::Matcher;

    fn session() -> Session {
        Session::new("user@example.com", "secret")
    }

    #[test_log::test(tokio::test)]
    async fn test_login_yields_future_expiry() {
        let mut server = mockito::Server::new_async().await;
        let url = server.url();

        let mock = server
            .mock("POST", "/bringauth")
            .match_body(Matcher::AllOf(vec![
                Matcher::UrlEncoded("email".into(), "user@example.com".into()),
                Matcher::UrlEncoded("password".into(), "secret".into()),
            ]))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(auth_body("token-1", 3600))
            .create_async()
            .await;

        let mut session = session();
        let client = Client::new();
        let credentials = session.login(&client, &url).await.unwrap();

        assert_eq!(credentials.user_uuid, "user-uuid-1");
        assert_eq!(credentials.access_token, "token-1");
        assert!(!credentials.is_expired());
        mock.assert_async().await;
    }

    #[test_log::test(tokio::test)]
    async fn test_login_rejected_is_auth_error() {
        let mut server = mockito::Server::new_async().await;
        let url = server.url();

        let mock = server
            .mock("POST", "/bringauth")
            .with_status(401)
            .create_async()
            .await;

        let mut session = session();
        let result = session.login(&Client::new(), &url).await;

        mock.assert_async().await;
        assert!(matches!(result, Err(Error::Auth(_))));
        assert!(session.credentials().is_none());
    }

    #[test_log::test(tokio::test)]
    async fn test_login_server_error_is_request_error() {
        let mut server = mockito::Server::new_async().await;
        let url = server.url();

        let _m = server
            .mock("POST", "/bringauth")
            .with_status(500)
            .with_body("boom")
            .create_async()
            .await;

        let mut session = session();
        let result = session.login(&Client::new(), &url).await;

        match result {
            Err(Error::Request { status, body }) => {
                assert_eq!(status.map(|s| s.as_u16()), Some(500));
                assert_eq!(body, "boom");
            }
            other => panic!("expected Request error, got {:?}", other.err()),
        }
    }

    #[test_log::test(tokio::test)]
    async fn test_login_invalid_json_is_parse_error() {
        let mut server = mockito::Server::new_async().await;
        let url = server.url();

        let _m = server
            .mock("POST", "/bringauth")
            .with_status(200)
            .with_body("<html>maintenance</html>")
            .create_async()
            .await;

        let mut session = session();
        let result = session.login(&Client::new(), &url).await;
        assert!(matches!(result, Err(Error::Parse(_))));
    }

    #[test_log::test(tokio::test)]
    async fn test_login_without_refresh_token_succeeds() {
        let mut server = mockito::Server::new_async().await;
        let url = server.url();

        let _m = server
            .mock("POST", "/bringauth")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"uuid": "user-1", "access_token": "token-1", "expires_in": 3600}"#)
            .create_async()
            .await;

        let mut session = session();
        let credentials = session.login(&Client::new(), &url).await.unwrap();

        assert_eq!(credentials.access_token, "token-1");
        assert_eq!(credentials.refresh_token, "");
        assert!(!credentials.is_expired());
    }

    #[test_log::test(tokio::test)]
    async fn test_login_missing_token_fields_is_auth_error() {
        let mut server = mockito::Server::new_async().await;
        let url = server.url();

        let _m = server
            .mock("POST", "/bringauth")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"message": "welcome"}"#)
            .create_async()
            .await;

        let mut session = session();
        let result = session.login(&Client::new(), &url).await;
        assert!(matches!(result, Err(Error::Auth(_))));
    }

    #[test_log::test(tokio::test)]
    async fn test_refresh_updates_token_in_place() {
        let mut server = mockito::Server::new_async().await;
        let url = server.url();

        let _login = server
            .mock("POST", "/bringauth")
            .with_status(200)
            .with_body(auth_body("token-1", 3600))
            .create_async()
            .await;
        let refresh = server
            .mock("POST", "/bringauth/token")
            .match_body(Matcher::AllOf(vec![
                Matcher::UrlEncoded("grant_type".into(), "refresh_token".into()),
                Matcher::UrlEncoded("refresh_token".into(), "refresh-1".into()),
            ]))
            .with_status(200)
            .with_body(r#"{"access_token": "token-2", "expires_in": 3600, "token_type": "Bearer"}"#)
            .create_async()
            .await;

        let mut session = session();
        let client = Client::new();
        session.login(&client, &url).await.unwrap();
        let credentials = session.refresh(&client, &url).await.unwrap();

        assert_eq!(credentials.access_token, "token-2");
        assert_eq!(credentials.user_uuid, "user-uuid-1");
        refresh.assert_async().await;
    }

    #[test_log::test(tokio::test)]
    async fn test_refresh_rejected_is_auth_error() {
        let mut server = mockito::Server::new_async().await;
        let url = server.url();

        let _login = server
            .mock("POST", "/bringauth")
            .with_status(200)
            .with_body(auth_body("token-1", 3600))
            .create_async()
            .await;
        let _refresh = server
            .mock("POST", "/bringauth/token")
            .with_status(401)
            .create_async()
            .await;

        let mut session = session();
        let client = Client::new();
        session.login(&client, &url).await.unwrap();
        let result = session.refresh(&client, &url).await;

        assert!(matches!(result, Err(Error::Auth(_))));
    }

    #[test_log::test(tokio::test)]
    async fn test_refresh_without_login_is_auth_error() {
        let mut session = session();
        let result = session
            .refresh(&Client::new(), "http://127.0.0.1:1")
            .await;
        assert!(matches!(result, Err(Error::Auth(_))));
    }

    #[test_log::test(tokio::test)]
    async fn test_ensure_valid_logs_in_once() {
        let mut server = mockito::Server::new_async().await;
        let url = server.url();

        let login = server
            .mock("POST", "/bringauth")
            .with_status(200)
            .with_body(auth_body("token-1", 3600))
            .expect(1)
            .create_async()
            .await;

        let mut session = session();
        let client = Client::new();
        let first = session.ensure_valid(&client, &url).await.unwrap();
        let second = session.ensure_valid(&client, &url).await.unwrap();

        assert_eq!(first.access_token, "token-1");
        assert_eq!(second.access_token, "token-1");
        login.assert_async().await;
    }

    #[test_log::test(tokio::test)]
    async fn test_ensure_valid_refreshes_expired_token() {
        let mut server = mockito::Server::new_async().await;
        let url = server.url();

        // expires_in of zero is already inside the safety margin.
        let _login = server
            .mock("POST", "/bringauth")
            .with_status(200)
            .with_body(auth_body("token-1", 0))
            .create_async()
            .await;
        let refresh = server
            .mock("POST", "/bringauth/token")
            .with_status(200)
            .with_body(r#"{"access_token": "token-2", "expires_in": 3600}"#)
            .expect(1)
            .create_async()
            .await;

        let mut session = session();
        let client = Client::new();
        session.login(&client, &url).await.unwrap();
        assert!(session.credentials().unwrap().is_expired());

        let credentials = session.ensure_valid(&client, &url).await.unwrap();

        assert_eq!(credentials.access_token, "token-2");
        assert!(!credentials.is_expired());
        refresh.assert_async().await;
    }
}
