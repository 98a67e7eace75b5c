pub mod api;
pub mod auth;
pub mod blocking;
pub mod error;
pub mod http;

pub use api::{Bring, ShoppingApi};
pub use error::{Error, Result};

/// Shared fixtures for the mock-server tests.
#[cfg(test)]
pub mod test_utils {
    use crate::auth::Credentials;
    use std::time::{Duration, Instant};

    /// JSON body the login endpoint answers with, for the test account
    /// `user-uuid-1` / `public-uuid-1`.
    pub fn auth_body(access_token: &str, expires_in: u64) -> String {
        format!(
            r#"{{
                "uuid": "user-uuid-1",
                "publicUuid": "public-uuid-1",
                "email": "user@example.com",
                "name": "Test User",
                "access_token": "{}",
                "refresh_token": "refresh-1",
                "token_type": "Bearer",
                "expires_in": {}
            }}"#,
            access_token, expires_in
        )
    }

    /// Credentials as they look right after a successful login of the
    /// [`auth_body`] test account, valid for an hour.
    pub fn test_credentials(access_token: &str) -> Credentials {
        Credentials::new(
            "user-uuid-1".to_string(),
            "public-uuid-1".to_string(),
            access_token.to_string(),
            "refresh-1".to_string(),
            Instant::now() + Duration::from_secs(3600),
        )
    }
}
