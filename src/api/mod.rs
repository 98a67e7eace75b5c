//! Typed operation surface of the Bring API.

mod client;
pub mod types;

pub use client::{Bring, ShoppingApi, resolve_list};
pub use types::{Item, ItemDetail, ListItems, Notification, ShoppingList};
