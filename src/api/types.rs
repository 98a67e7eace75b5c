use serde::{Deserialize, Serialize};

/// Payload returned by the login endpoint.
#[derive(Deserialize, Debug, Clone)]
pub struct AuthResponse {
    pub uuid: String,
    #[serde(rename = "publicUuid", default)]
    pub public_uuid: String,
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: String,
    #[serde(default)]
    pub token_type: Option<String>,
    pub expires_in: u64,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(rename = "photoPath", default)]
    pub photo_path: Option<String>,
    #[serde(rename = "bringListUUID", default)]
    pub default_list_uuid: Option<String>,
}

/// Payload returned by the refresh-token grant.
#[derive(Deserialize, Debug, Clone)]
pub struct RefreshResponse {
    pub access_token: String,
    pub expires_in: u64,
    #[serde(default)]
    pub token_type: Option<String>,
}

/// A shopping list as returned by the lists endpoint.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct ShoppingList {
    #[serde(rename = "listUuid")]
    pub uuid: String,
    pub name: String,
    #[serde(default)]
    pub theme: String,
}

#[derive(Deserialize, Debug, Clone)]
pub struct ListsResponse {
    pub lists: Vec<ShoppingList>,
}

/// An entry on a list. An empty specification means none was set.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct Item {
    pub name: String,
    #[serde(default)]
    pub specification: String,
}

/// Current content of a list: items still to buy and recently bought ones.
#[derive(Deserialize, Debug, Clone)]
pub struct ListItems {
    pub uuid: String,
    pub status: String,
    pub purchase: Vec<Item>,
    #[serde(default)]
    pub recently: Vec<Item>,
}

/// Per-item metadata row from the details endpoint. This is not the set of
/// items currently marked to buy; see [`ListItems`] for that.
#[derive(Deserialize, Debug, Clone)]
pub struct ItemDetail {
    pub uuid: String,
    #[serde(rename = "itemId")]
    pub item_id: String,
    #[serde(rename = "listUuid")]
    pub list_uuid: String,
    #[serde(rename = "userIconItemId", default)]
    pub user_icon_item_id: Option<String>,
    #[serde(rename = "userSectionId", default)]
    pub user_section_id: Option<String>,
    #[serde(rename = "assignedTo", default)]
    pub assigned_to: Option<String>,
    #[serde(rename = "imageUrl", default)]
    pub image_url: Option<String>,
}

/// Push notification sent to the other members of a shared list.
///
/// An urgent message carries the item it is about; the service rejects the
/// notification without one, so the name lives in the variant.
#[derive(Debug, Clone, PartialEq)]
pub enum Notification {
    GoingShopping,
    ChangedList,
    ShoppingDone,
    UrgentMessage { item: String },
}

impl Notification {
    pub(crate) fn kind(&self) -> &'static str {
        match self {
            Notification::GoingShopping => "GOING_SHOPPING",
            Notification::ChangedList => "CHANGED_LIST",
            Notification::ShoppingDone => "SHOPPING_DONE",
            Notification::UrgentMessage { .. } => "URGENT_MESSAGE",
        }
    }

    pub(crate) fn arguments(&self) -> Vec<String> {
        match self {
            Notification::UrgentMessage { item } => vec![item.clone()],
            _ => Vec::new(),
        }
    }
}

/// Wire shape of the notification endpoint's request body.
#[derive(Serialize, Debug)]
pub(crate) struct NotificationRequest {
    pub arguments: Vec<String>,
    #[serde(rename = "listNotificationType")]
    pub list_notification_type: String,
    #[serde(rename = "senderPublicUserUuid")]
    pub sender_public_user_uuid: String,
}
