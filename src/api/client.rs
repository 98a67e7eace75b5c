use async_trait::async_trait;
use log::debug;
use reqwest::{Client, Method};
use serde::de::DeserializeOwned;

use crate::auth::{Credentials, Session};
use crate::error::{Error, Result, classify_transport};
use crate::http::{Executor, Payload};

use super::types::{
    ItemDetail, ListItems, ListsResponse, Notification, NotificationRequest, ShoppingList,
};

/// The operations a Bring account supports. [`Bring`] is the live
/// implementation; tests substitute a mock.
///
/// Operations take `&mut self` because a call may refresh the cached
/// credentials in place. One client instance therefore never runs two
/// logins at the same time.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ShoppingApi: Send + Sync {
    /// All shopping lists of the account.
    async fn load_lists(&mut self) -> Result<Vec<ShoppingList>>;

    /// Current content of a list: items to buy and recently bought ones.
    async fn get_items(&mut self, list_uuid: &str) -> Result<ListItems>;

    /// Per-item metadata rows of a list.
    async fn get_item_details(&mut self, list_uuid: &str) -> Result<Vec<ItemDetail>>;

    /// Puts an item on the list, optionally annotated with a specification.
    async fn save_item(
        &mut self,
        list_uuid: &str,
        name: &str,
        specification: Option<String>,
    ) -> Result<()>;

    /// Changes the specification of an item already on the list.
    async fn update_item(
        &mut self,
        list_uuid: &str,
        name: &str,
        specification: Option<String>,
    ) -> Result<()>;

    /// Moves an item to the recently-bought section.
    async fn complete_item(&mut self, list_uuid: &str, name: &str) -> Result<()>;

    /// Takes an item off the list entirely.
    async fn remove_item(&mut self, list_uuid: &str, name: &str) -> Result<()>;

    /// Sends a push notification to the other members of the list.
    async fn notify(&mut self, list_uuid: &str, notification: Notification) -> Result<()>;
}

/// Client for one Bring account.
///
/// Logs in lazily on the first operation and keeps the credentials fresh
/// across calls. The underlying transport may be supplied externally and is
/// reused for every request.
pub struct Bring {
    session: Session,
    executor: Executor,
}

impl Bring {
    /// Client against the production endpoint with its own transport.
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self::with_client(email, password, Client::new(), None)
    }

    /// Client against a different endpoint (tests, self-hosted proxies).
    pub fn with_base_url(
        email: impl Into<String>,
        password: impl Into<String>,
        base_url: impl Into<String>,
    ) -> Self {
        Self::with_client(email, password, Client::new(), Some(base_url.into()))
    }

    /// Client reusing an externally supplied transport.
    pub fn with_client(
        email: impl Into<String>,
        password: impl Into<String>,
        http: Client,
        base_url: Option<String>,
    ) -> Self {
        Self {
            session: Session::new(email, password),
            executor: Executor::new(http, base_url),
        }
    }

    /// Credentials currently cached by the client, if a login has happened.
    pub fn credentials(&self) -> Option<&Credentials> {
        self.session.credentials()
    }

    /// Non-expired credentials, logging in or refreshing first when needed.
    async fn valid_credentials(&mut self) -> Result<Credentials> {
        self.session
            .ensure_valid(self.executor.client(), self.executor.base_url())
            .await
    }

    /// Sends one authenticated request. A rejected session triggers exactly
    /// one re-login and one retried call; a second rejection propagates.
    async fn request(
        &mut self,
        method: Method,
        path: &str,
        payload: Payload,
    ) -> Result<reqwest::Response> {
        let credentials = self.valid_credentials().await?;

        match self
            .executor
            .send(method.clone(), path, &payload, &credentials)
            .await
        {
            Err(Error::Auth(reason)) => {
                debug!("Session rejected ({}), logging in again...", reason);
                let credentials = self
                    .session
                    .login(self.executor.client(), self.executor.base_url())
                    .await?
                    .clone();
                self.executor.send(method, path, &payload, &credentials).await
            }
            result => result,
        }
    }

    /// Like [`Bring::request`], decoding the response body as JSON.
    async fn request_json<T: DeserializeOwned>(
        &mut self,
        method: Method,
        path: &str,
        payload: Payload,
    ) -> Result<T> {
        let response = self.request(method, path, payload).await?;
        let body = response.text().await.map_err(classify_transport)?;
        serde_json::from_str(&body)
            .map_err(|e| Error::Parse(format!("unexpected response body: {}", e)))
    }
}

#[async_trait]
impl ShoppingApi for Bring {
    #[tracing::instrument(skip(self))]
    async fn load_lists(&mut self) -> Result<Vec<ShoppingList>> {
        let user_uuid = self.valid_credentials().await?.user_uuid;
        let path = format!("bringusers/{}/lists", user_uuid);
        let response: ListsResponse = self.request_json(Method::GET, &path, Payload::None).await?;
        Ok(response.lists)
    }

    #[tracing::instrument(skip(self))]
    async fn get_items(&mut self, list_uuid: &str) -> Result<ListItems> {
        let path = format!("bringlists/{}", list_uuid);
        self.request_json(Method::GET, &path, Payload::None).await
    }

    #[tracing::instrument(skip(self))]
    async fn get_item_details(&mut self, list_uuid: &str) -> Result<Vec<ItemDetail>> {
        let path = format!("bringlists/{}/details", list_uuid);
        self.request_json(Method::GET, &path, Payload::None).await
    }

    #[tracing::instrument(skip(self))]
    async fn save_item(
        &mut self,
        list_uuid: &str,
        name: &str,
        specification: Option<String>,
    ) -> Result<()> {
        debug!("Saving {:?} to list {}...", name, list_uuid);

        let mut fields = vec![("purchase".to_string(), name.to_string())];
        if let Some(specification) = specification {
            fields.push(("specification".to_string(), specification));
        }

        let path = format!("bringlists/{}", list_uuid);
        self.request(Method::PUT, &path, Payload::Form(fields)).await?;
        Ok(())
    }

    #[tracing::instrument(skip(self))]
    async fn update_item(
        &mut self,
        list_uuid: &str,
        name: &str,
        specification: Option<String>,
    ) -> Result<()> {
        debug!("Updating {:?} on list {}...", name, list_uuid);

        let mut fields = vec![
            ("uuid".to_string(), list_uuid.to_string()),
            ("purchase".to_string(), name.to_string()),
        ];
        if let Some(specification) = specification {
            fields.push(("specification".to_string(), specification));
        }

        let path = format!("bringlists/{}", list_uuid);
        self.request(Method::PUT, &path, Payload::Form(fields)).await?;
        Ok(())
    }

    #[tracing::instrument(skip(self))]
    async fn complete_item(&mut self, list_uuid: &str, name: &str) -> Result<()> {
        debug!("Completing {:?} on list {}...", name, list_uuid);

        let fields = vec![
            ("uuid".to_string(), list_uuid.to_string()),
            ("recently".to_string(), name.to_string()),
        ];

        let path = format!("bringlists/{}", list_uuid);
        self.request(Method::PUT, &path, Payload::Form(fields)).await?;
        Ok(())
    }

    #[tracing::instrument(skip(self))]
    async fn remove_item(&mut self, list_uuid: &str, name: &str) -> Result<()> {
        debug!("Removing {:?} from list {}...", name, list_uuid);

        let fields = vec![("remove".to_string(), name.to_string())];

        let path = format!("bringlists/{}", list_uuid);
        self.request(Method::PUT, &path, Payload::Form(fields)).await?;
        Ok(())
    }

    #[tracing::instrument(skip(self))]
    async fn notify(&mut self, list_uuid: &str, notification: Notification) -> Result<()> {
        let sender = self.valid_credentials().await?.public_user_uuid;

        let request = NotificationRequest {
            arguments: notification.arguments(),
            list_notification_type: notification.kind().to_string(),
            sender_public_user_uuid: sender,
        };
        let body = serde_json::to_value(&request).map_err(|e| Error::Parse(e.to_string()))?;

        let path = format!("bringnotifications/lists/{}", list_uuid);
        self.request(Method::POST, &path, Payload::Json(body)).await?;
        Ok(())
    }
}

/// Resolves a list selector (display name or UUID) against the account's
/// lists. Name matches are case-insensitive.
pub async fn resolve_list(
    api: &mut impl ShoppingApi,
    selector: &str,
) -> Result<Option<ShoppingList>> {
    let lists = api.load_lists().await?;
    Ok(lists
        .into_iter()
        .find(|list| list.uuid == selector || list.name.eq_ignore_ascii_case(selector)))
}
