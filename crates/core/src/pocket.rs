//! Request builders and response shaping for the Pocket v3 API

use std::fmt;
use std::str::FromStr;

use crate::error::{ApiError, ErrorContext, Provider};

pub const API_ROOT: &str = "https://getpocket.com/v3";
pub const AUTHORIZE_URL: &str = "https://getpocket.com/auth/authorize";

/// Pocket refuses larger pages.
pub const MAX_COUNT: u32 = 30;

/// Status Pocket reports for items that were deleted.
const DELETED_STATUS: &str = "2";

fn errors() -> ErrorContext {
    ErrorContext::new(Provider::Pocket)
}

macro_rules! wire_enum {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => $wire:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq)]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub fn as_wire(self) -> &'static str {
                match self {
                    $($name::$variant => $wire),+
                }
            }
        }

        impl FromStr for $name {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($wire => Ok($name::$variant),)+
                    other => Err(format!(
                        "Unknown {} '{}' (expected one of: {})",
                        stringify!($name),
                        other,
                        [$($wire),+].join(", ")
                    )),
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_wire())
            }
        }
    };
}

wire_enum!(
    /// Which items to return. `all_and_deleted` keeps items Pocket marks as deleted.
    ItemState {
        Unread => "unread",
        Archive => "archive",
        All => "all",
        AllAndDeleted => "all_and_deleted",
    }
);

wire_enum!(
    ItemSort {
        Newest => "newest",
        Oldest => "oldest",
        Title => "title",
        Site => "site",
    }
);

wire_enum!(
    ItemContentType {
        Article => "article",
        Video => "video",
        Image => "image",
    }
);

wire_enum!(
    DetailType {
        Simple => "simple",
        Complete => "complete",
    }
);

impl ItemState {
    /// Value sent in the `state` field.
    pub fn request_value(self) -> &'static str {
        match self {
            ItemState::AllAndDeleted => ItemState::All.as_wire(),
            other => other.as_wire(),
        }
    }
}

/// Parameters of `POST /get`
#[derive(Debug, Clone, PartialEq)]
pub struct GetItemsQuery {
    pub state: ItemState,
    pub favorite: Option<bool>,
    /// A tag name, or `_untagged_` for items without tags.
    pub tag: Option<String>,
    pub content_type: Option<ItemContentType>,
    pub sort: ItemSort,
    pub detail_type: DetailType,
    pub search: Option<String>,
    pub domain: Option<String>,
    pub since: Option<i64>,
    pub count: u32,
    pub offset: u32,
}

impl Default for GetItemsQuery {
    fn default() -> Self {
        Self {
            state: ItemState::All,
            favorite: None,
            tag: None,
            content_type: None,
            sort: ItemSort::Newest,
            detail_type: DetailType::Simple,
            search: None,
            domain: None,
            since: None,
            count: MAX_COUNT,
            offset: 0,
        }
    }
}

/// Build the body of `POST /get`, without credentials.
pub fn build_get_items_body(query: &GetItemsQuery) -> Result<serde_json::Value, ApiError> {
    if query.count > MAX_COUNT {
        return Err(errors().precondition(format!(
            "The maximum number of items to retrieve is {MAX_COUNT}."
        )));
    }

    let mut body = serde_json::Map::new();
    body.insert("state".into(), query.state.request_value().into());
    body.insert("sort".into(), query.sort.as_wire().into());
    body.insert("detailType".into(), query.detail_type.as_wire().into());
    body.insert("count".into(), query.count.into());
    body.insert("offset".into(), query.offset.into());
    if let Some(favorite) = query.favorite {
        body.insert("favorite".into(), if favorite { "1" } else { "0" }.into());
    }
    if let Some(tag) = query.tag.as_deref().filter(|t| !t.is_empty()) {
        body.insert("tag".into(), tag.into());
    }
    if let Some(content_type) = query.content_type {
        body.insert("contentType".into(), content_type.as_wire().into());
    }
    if let Some(search) = query.search.as_deref().filter(|s| !s.is_empty()) {
        body.insert("search".into(), search.into());
    }
    if let Some(domain) = query.domain.as_deref().filter(|d| !d.is_empty()) {
        body.insert("domain".into(), domain.into());
    }
    if let Some(since) = query.since {
        body.insert("since".into(), since.into());
    }
    Ok(serde_json::Value::Object(body))
}

/// Drop deleted entries from a `/get` response when the caller asked for `all`.
///
/// Pocket sends `list` as an object keyed by item id, or as an empty array
/// when nothing matched; the array form is returned unchanged.
pub fn filter_deleted(state: ItemState, mut response: serde_json::Value) -> serde_json::Value {
    if state != ItemState::All {
        return response;
    }
    if let Some(list) = response.get_mut("list").and_then(|l| l.as_object_mut()) {
        list.retain(|_, item| item.get("status").and_then(|s| s.as_str()) != Some(DELETED_STATUS));
    }
    response
}

/// Build the body of `POST /add`, without credentials.
pub fn build_add_item_body(url: &str, title: Option<&str>, tags: &[String]) -> serde_json::Value {
    let mut body = serde_json::Map::new();
    body.insert("url".into(), url.into());
    if let Some(title) = title.filter(|t| !t.is_empty()) {
        body.insert("title".into(), title.into());
    }
    if !tags.is_empty() {
        body.insert("tags".into(), tags.join(",").into());
    }
    serde_json::Value::Object(body)
}

/// Changes to apply to one saved item through `POST /send`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ItemModification {
    pub item_id: i64,
    /// `Some(true)` archives, `Some(false)` re-adds.
    pub archive: Option<bool>,
    /// `Some(true)` favorites, `Some(false)` unfavorites.
    pub favorite: Option<bool>,
    pub delete: bool,
    pub clear_tags: bool,
    pub remove_tags: Vec<String>,
    pub replace_tags: Vec<String>,
    pub add_tags: Vec<String>,
}

fn action(name: &str, item_id: i64, tags: Option<&[String]>) -> serde_json::Value {
    let mut action = serde_json::json!({ "action": name, "item_id": item_id });
    if let Some(tags) = tags {
        action["tags"] = tags.join(",").into();
    }
    action
}

/// Actions for a modification, in the order Pocket applies them.
pub fn build_actions(modification: &ItemModification) -> Vec<serde_json::Value> {
    let id = modification.item_id;
    let mut actions = Vec::new();

    if let Some(archive) = modification.archive {
        actions.push(action(if archive { "archive" } else { "readd" }, id, None));
    }
    if let Some(favorite) = modification.favorite {
        actions.push(action(if favorite { "favorite" } else { "unfavorite" }, id, None));
    }
    if modification.delete {
        actions.push(action("delete", id, None));
    }
    if modification.clear_tags {
        actions.push(action("tags_clear", id, None));
    }
    if !modification.remove_tags.is_empty() {
        actions.push(action("tags_remove", id, Some(&modification.remove_tags)));
    }
    if !modification.replace_tags.is_empty() {
        actions.push(action("tags_replace", id, Some(&modification.replace_tags)));
    }
    if !modification.add_tags.is_empty() {
        actions.push(action("tags_add", id, Some(&modification.add_tags)));
    }

    actions
}

/// Build the body of `POST /send`, without credentials.
pub fn build_modify_body(modification: &ItemModification) -> Result<serde_json::Value, ApiError> {
    let actions = build_actions(modification);
    if actions.is_empty() {
        return Err(errors().precondition(format!(
            "No modification requested for item {}",
            modification.item_id
        )));
    }
    Ok(serde_json::json!({ "actions": actions, "item_id": modification.item_id }))
}

/// Add the credentials Pocket expects in every body.
pub fn with_auth(mut body: serde_json::Value, consumer_key: &str, access_token: &str) -> serde_json::Value {
    if let Some(map) = body.as_object_mut() {
        map.insert("consumer_key".into(), consumer_key.into());
        map.insert("access_token".into(), access_token.into());
    }
    body
}

/// Pull `field` out of a form-encoded OAuth response (`code=...&state=...`).
pub fn parse_form_field(body: &str, field: &str) -> Result<String, ApiError> {
    url::form_urlencoded::parse(body.trim().as_bytes())
        .find(|(key, _)| key == field)
        .map(|(_, value)| value.into_owned())
        .ok_or_else(|| errors().decode(&format!("read {field}"), format!("no {field} in '{body}'")))
}

/// URL the user opens to grant access to a request token.
pub fn authorize_url(request_token: &str, redirect_uri: &str) -> Result<String, ApiError> {
    url::Url::parse_with_params(
        AUTHORIZE_URL,
        &[("request_token", request_token), ("redirect_uri", redirect_uri)],
    )
    .map(|url| url.to_string())
    .map_err(|e| errors().precondition(format!("Invalid authorize URL: {e}")))
}
