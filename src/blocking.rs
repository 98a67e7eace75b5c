//! Blocking mirror of the client for callers without an async runtime.

use tokio::runtime::Runtime;

use crate::api::types::{ItemDetail, ListItems, Notification, ShoppingList};
use crate::api::{self, ShoppingApi};
use crate::error::{Error, Result};

/// Synchronous Bring client.
///
/// Each call suspends the calling thread until the response arrives,
/// driving [`api::Bring`] on an internally owned single-threaded runtime.
pub struct Bring {
    inner: api::Bring,
    runtime: Runtime,
}

impl Bring {
    /// Blocking client against the production endpoint.
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Result<Self> {
        Self::build(api::Bring::new(email, password))
    }

    /// Blocking client against a different endpoint.
    pub fn with_base_url(
        email: impl Into<String>,
        password: impl Into<String>,
        base_url: impl Into<String>,
    ) -> Result<Self> {
        Self::build(api::Bring::with_base_url(email, password, base_url))
    }

    fn build(inner: api::Bring) -> Result<Self> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| Error::Request {
                status: None,
                body: format!("cannot start the blocking runtime: {}", e),
            })?;
        Ok(Self { inner, runtime })
    }

    pub fn load_lists(&mut self) -> Result<Vec<ShoppingList>> {
        self.runtime.block_on(self.inner.load_lists())
    }

    pub fn get_items(&mut self, list_uuid: &str) -> Result<ListItems> {
        self.runtime.block_on(self.inner.get_items(list_uuid))
    }

    pub fn get_item_details(&mut self, list_uuid: &str) -> Result<Vec<ItemDetail>> {
        self.runtime.block_on(self.inner.get_item_details(list_uuid))
    }

    pub fn save_item(
        &mut self,
        list_uuid: &str,
        name: &str,
        specification: Option<String>,
    ) -> Result<()> {
        self.runtime
            .block_on(self.inner.save_item(list_uuid, name, specification))
    }

    pub fn update_item(
        &mut self,
        list_uuid: &str,
        name: &str,
        specification: Option<String>,
    ) -> Result<()> {
        self.runtime
            .block_on(self.inner.update_item(list_uuid, name, specification))
    }

    pub fn complete_item(&mut self, list_uuid: &str, name: &str) -> Result<()> {
        self.runtime
            .block_on(self.inner.complete_item(list_uuid, name))
    }

    pub fn remove_item(&mut self, list_uuid: &str, name: &str) -> Result<()> {
        self.runtime
            .block_on(self.inner.remove_item(list_uuid, name))
    }

    pub fn notify(&mut self, list_uuid: &str, notification: Notification) -> Result<()> {
        self.runtime
            .block_on(self.inner.notify(list_uuid, notification))
    }
}
