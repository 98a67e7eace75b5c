//! Authenticated request execution against the Bring endpoints.

use log::debug;
use reqwest::{Client, Method, Response};

use crate::auth::Credentials;
use crate::error::{Result, classify_status, classify_transport};

/// Production endpoint.
pub const DEFAULT_BASE_URL: &str = "https://api.getbring.com/rest/v2";

/// API key the web client ships with; expected on every authenticated call.
const API_KEY: &str = "cof4Nc6D8saplXjE3h3HXqHH8m7VU2i1Gs0g85Sp";

/// Request body variants the Bring endpoints accept. Item mutations go over
/// URL-encoded forms, notifications over JSON.
#[derive(Debug, Clone)]
pub enum Payload {
    None,
    Form(Vec<(String, String)>),
    Json(serde_json::Value),
}

/// Issues HTTP calls with the fixed Bring header set and the current
/// credentials. One request per call; the single retry on a rejected
/// session lives in the client.
#[derive(Clone)]
pub struct Executor {
    http: Client,
    base_url: String,
}

impl Executor {
    /// Wraps the given transport. The transport may be supplied externally
    /// and is reused across sequential calls.
    pub fn new(http: Client, base_url: Option<String>) -> Self {
        let base_url = base_url.unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        Self { http, base_url }
    }

    /// Returns a reference to the underlying transport.
    pub fn client(&self) -> &Client {
        &self.http
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Sends one authenticated request and checks the status code. 2xx
    /// passes the response through; 401 maps to [`crate::Error::Auth`] so
    /// the caller can re-authenticate; any other status maps to
    /// [`crate::Error::Request`] carrying status and body.
    #[tracing::instrument(skip(self, payload, credentials))]
    pub async fn send(
        &self,
        method: Method,
        path: &str,
        payload: &Payload,
        credentials: &Credentials,
    ) -> Result<Response> {
        let url = format!("{}/{}", self.base_url, path);
        debug!("{} {}...", method, url);

        let mut request = self
            .http
            .request(method, &url)
            .header(
                "Authorization",
                format!("Bearer {}", credentials.access_token),
            )
            .header("X-BRING-API-KEY", API_KEY)
            .header("X-BRING-CLIENT-SOURCE", "webApp")
            .header("X-BRING-CLIENT", "webApp")
            .header("X-BRING-COUNTRY", "DE")
            .header("X-BRING-USER-UUID", &credentials.user_uuid);

        request = match payload {
            Payload::None => request,
            Payload::Form(fields) => request.form(fields),
            Payload::Json(body) => request.json(body),
        };

        let response = request.send().await.map_err(classify_transport)?;
        let status = response.status();
        debug!("Response from {}: {}", url, status);

        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        Err(classify_status(status, body))
    }
}
