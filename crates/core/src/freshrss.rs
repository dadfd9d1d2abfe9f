//! Transformation functions for the FreshRSS Fever API
//!
//! The Fever API never embeds category membership in feed or group records.
//! Instead every `feeds` and `groups` response carries a flat `feeds_groups`
//! list where each record owns a comma-joined string of feed ids. The
//! resolvers in this module rebuild the feed -> category and
//! category -> feeds relations from those records.

use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};

use crate::error::{ApiError, ErrorContext, Provider};

/// Path appended to the FreshRSS base URL to reach the Fever endpoint.
pub const FEVER_ENDPOINT: &str = "/api/fever.php?api";

fn errors() -> ErrorContext {
    ErrorContext::new(Provider::FreshRss)
}

// =============================================================================
// API Response Types (Deserialization)
// =============================================================================

/// Feed record as returned by `?api&feeds`
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct FeverFeed {
    pub id: i64,
    #[serde(default)]
    pub favicon_id: Option<i64>,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub site_url: Option<String>,
    #[serde(default)]
    pub is_spark: Option<i64>,
    #[serde(default)]
    pub last_updated_on_time: Option<i64>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Group (category) record as returned by `?api&groups`
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct FeverGroup {
    pub id: i64,
    #[serde(default)]
    pub title: String,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// One flat membership record: a group and the comma-joined ids of its feeds
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct FeverFeedsGroup {
    pub group_id: i64,
    #[serde(default)]
    pub feed_ids: String,
}

/// Item (entry) record as returned by `?api&items`
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct FeverItem {
    /// FreshRSS sends 64-bit entry ids as strings, other servers as numbers.
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    #[serde(default)]
    pub feed_id: Option<i64>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub html: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub is_saved: i64,
    #[serde(default)]
    pub is_read: i64,
    #[serde(default)]
    pub created_on_time: Option<i64>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Response of `?api&feeds`
#[derive(Debug, Deserialize, Clone)]
pub struct FeverFeedsResponse {
    #[serde(default)]
    pub auth: Option<i64>,
    #[serde(default)]
    pub feeds: Vec<FeverFeed>,
    #[serde(default)]
    pub feeds_groups: Vec<FeverFeedsGroup>,
}

/// Response of `?api&groups`
#[derive(Debug, Deserialize, Clone)]
pub struct FeverGroupsResponse {
    #[serde(default)]
    pub auth: Option<i64>,
    #[serde(default)]
    pub groups: Vec<FeverGroup>,
    #[serde(default)]
    pub feeds_groups: Vec<FeverFeedsGroup>,
}

/// Response of `?api&items`
#[derive(Debug, Deserialize, Clone)]
pub struct FeverItemsResponse {
    #[serde(default)]
    pub auth: Option<i64>,
    #[serde(default)]
    pub items: Vec<FeverItem>,
    #[serde(default)]
    pub total_items: Option<i64>,
}

/// Response of `?api&saved_item_ids`
#[derive(Debug, Deserialize, Clone)]
pub struct FeverSavedItemIdsResponse {
    #[serde(default)]
    pub auth: Option<i64>,
    #[serde(default)]
    pub saved_item_ids: String,
}

fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::String(s) => Ok(s),
        serde_json::Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "expected a string or number id, got {other}"
        ))),
    }
}

// =============================================================================
// Output Types (Serialization)
// =============================================================================

/// Feed with its resolved owning category
#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct FeedOutput {
    #[serde(flatten)]
    pub feed: FeverFeed,
    pub category_id: i64,
}

/// Category with its resolved member feed ids
#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct CategoryOutput {
    #[serde(flatten)]
    pub group: FeverGroup,
    pub feed_ids: Vec<i64>,
}

// =============================================================================
// Request Helpers
// =============================================================================

/// One id or a list of ids, rendered as the comma-joined form Fever expects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum IdList {
    One(i64),
    Many(Vec<i64>),
}

impl IdList {
    /// Comma-joined ids, or `None` when the list is empty.
    pub fn render(&self) -> Option<String> {
        match self {
            IdList::One(id) => Some(id.to_string()),
            IdList::Many(ids) if ids.is_empty() => None,
            IdList::Many(ids) => Some(
                ids.iter()
                    .map(|id| id.to_string())
                    .collect::<Vec<_>>()
                    .join(","),
            ),
        }
    }
}

impl From<i64> for IdList {
    fn from(id: i64) -> Self {
        IdList::One(id)
    }
}

impl From<Vec<i64>> for IdList {
    fn from(ids: Vec<i64>) -> Self {
        IdList::Many(ids)
    }
}

impl FromStr for IdList {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let ids = s
            .split(',')
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .map(|part| {
                part.parse::<i64>()
                    .map_err(|_| format!("'{part}' is not a numeric id"))
            })
            .collect::<Result<Vec<_>, _>>()?;

        match ids.as_slice() {
            [id] => Ok(IdList::One(*id)),
            _ => Ok(IdList::Many(ids)),
        }
    }
}

impl fmt::Display for IdList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render().unwrap_or_default())
    }
}

/// Marking actions supported by `?api&mark=item`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkAs {
    Read,
    Unread,
    Saved,
    Unsaved,
}

impl MarkAs {
    pub fn as_wire(self) -> &'static str {
        match self {
            MarkAs::Read => "read",
            MarkAs::Unread => "unread",
            MarkAs::Saved => "saved",
            MarkAs::Unsaved => "unsaved",
        }
    }

    /// Human readable verb used in error contexts
    pub fn describe(self) -> &'static str {
        match self {
            MarkAs::Read => "mark item as read",
            MarkAs::Unread => "mark item as unread",
            MarkAs::Saved => "mark item as starred",
            MarkAs::Unsaved => "mark item as unstarred",
        }
    }
}

impl FromStr for MarkAs {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "read" => Ok(MarkAs::Read),
            "unread" => Ok(MarkAs::Unread),
            "saved" | "starred" => Ok(MarkAs::Saved),
            "unsaved" | "unstarred" => Ok(MarkAs::Unsaved),
            other => Err(format!(
                "Unknown mark '{other}' (expected read, unread, saved or unsaved)"
            )),
        }
    }
}

/// Normalize a user supplied base URL to the Fever endpoint.
///
/// Accepts both the bare FreshRSS URL and one that already points at the
/// Fever endpoint.
pub fn fever_endpoint(base_url: &str) -> String {
    let base = base_url.trim();
    let base = base.strip_suffix(FEVER_ENDPOINT).unwrap_or(base);
    format!("{}{}", base.trim_end_matches('/'), FEVER_ENDPOINT)
}

/// Fever API key: hex MD5 of `username:password`.
pub fn api_key(username: &str, password: &str) -> String {
    format!("{:x}", md5::compute(format!("{username}:{password}")))
}

/// Fever answers `auth: 0` with a 200 status when the key is wrong.
pub fn ensure_authenticated(auth: Option<i64>) -> Result<(), ApiError> {
    match auth {
        Some(0) => Err(errors().precondition(
            "The Fever API rejected the credentials (auth=0). Check the username and API password.",
        )),
        _ => Ok(()),
    }
}

// =============================================================================
// Resolution
// =============================================================================

/// Parse a comma-joined id string. Empty segments are skipped.
pub fn parse_feed_ids(raw: &str) -> Result<Vec<i64>, ApiError> {
    raw.split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(|part| {
            part.parse::<i64>().map_err(|_| {
                errors().resolution(format!("Invalid feed id '{part}' in feeds_groups"))
            })
        })
        .collect()
}

/// Split a comma-joined list of item ids, dropping empty segments.
pub fn parse_item_ids(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(str::to_string)
        .collect()
}

fn parse_memberships(groups: &[FeverFeedsGroup]) -> Result<Vec<(i64, HashSet<i64>)>, ApiError> {
    groups
        .iter()
        .map(|group| {
            let ids = parse_feed_ids(&group.feed_ids)?;
            Ok((group.group_id, ids.into_iter().collect()))
        })
        .collect()
}

/// Attach the owning category to every feed.
///
/// Each feed gets the first membership record (in wire order) that lists its
/// id. The server is expected to put every feed in exactly one group; a feed no
/// record claims fails the whole call.
pub fn resolve_feed_categories(
    groups: &[FeverFeedsGroup],
    feeds: Vec<FeverFeed>,
) -> Result<Vec<FeedOutput>, ApiError> {
    let memberships = parse_memberships(groups)?;

    feeds
        .into_iter()
        .map(|feed| {
            let category_id = memberships
                .iter()
                .find(|(_, ids)| ids.contains(&feed.id))
                .map(|(group_id, _)| *group_id)
                .ok_or_else(|| {
                    errors().resolution(format!(
                        "Feed {} ('{}') does not belong to any category",
                        feed.id, feed.title
                    ))
                })?;

            Ok(FeedOutput { feed, category_id })
        })
        .collect()
}

/// Attach the member feed ids to every category.
///
/// Several membership records may name the same group; their ids are merged
/// into one list in order of first appearance. A category without records has
/// no feeds.
pub fn resolve_category_members(
    groups: &[FeverFeedsGroup],
    categories: Vec<FeverGroup>,
) -> Result<Vec<CategoryOutput>, ApiError> {
    let parsed = groups
        .iter()
        .map(|group| Ok((group.group_id, parse_feed_ids(&group.feed_ids)?)))
        .collect::<Result<Vec<_>, ApiError>>()?;

    Ok(categories
        .into_iter()
        .map(|group| {
            let mut seen = HashSet::new();
            let feed_ids = parsed
                .iter()
                .filter(|(group_id, _)| *group_id == group.id)
                .flat_map(|(_, ids)| ids.iter().copied())
                .filter(|id| seen.insert(*id))
                .collect();

            CategoryOutput { group, feed_ids }
        })
        .collect())
}

// =============================================================================
// Item Filtering
// =============================================================================

/// Client-side read/starred filter. `None` means "don't care".
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ItemFilter {
    pub read: Option<bool>,
    pub starred: Option<bool>,
}

impl ItemFilter {
    pub fn matches(&self, item: &FeverItem) -> bool {
        let read_ok = self.read.map_or(true, |read| (item.is_read == 1) == read);
        let starred_ok = self
            .starred
            .map_or(true, |starred| (item.is_saved == 1) == starred);
        read_ok && starred_ok
    }

    pub fn apply(&self, items: Vec<FeverItem>) -> Vec<FeverItem> {
        items.into_iter().filter(|item| self.matches(item)).collect()
    }
}

/// Ids of the given items, in order.
pub fn item_ids(items: &[FeverItem]) -> Vec<String> {
    items.iter().map(|item| item.id.clone()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn feed(id: i64, title: &str) -> FeverFeed {
        FeverFeed {
            id,
            favicon_id: None,
            title: title.to_string(),
            url: format!("https://example.com/{id}.xml"),
            site_url: None,
            is_spark: None,
            last_updated_on_time: None,
            extra: Default::default(),
        }
    }

    fn group(id: i64, title: &str) -> FeverGroup {
        FeverGroup {
            id,
            title: title.to_string(),
            extra: Default::default(),
        }
    }

    fn membership(group_id: i64, feed_ids: &str) -> FeverFeedsGroup {
        FeverFeedsGroup {
            group_id,
            feed_ids: feed_ids.to_string(),
        }
    }

    fn item(id: &str, is_read: i64, is_saved: i64) -> FeverItem {
        FeverItem {
            id: id.to_string(),
            feed_id: Some(1),
            title: Some(format!("Item {id}")),
            author: None,
            html: None,
            url: None,
            is_saved,
            is_read,
            created_on_time: None,
            extra: Default::default(),
        }
    }

    #[test]
    fn test_resolve_feed_categories_assigns_owner() {
        let groups = vec![membership(1, "10,11"), membership(2, "12")];
        let feeds = vec![feed(10, "a"), feed(11, "b"), feed(12, "c")];

        let output = resolve_feed_categories(&groups, feeds).unwrap();

        let owners: Vec<(i64, i64)> = output.iter().map(|f| (f.feed.id, f.category_id)).collect();
        assert_eq!(owners, vec![(10, 1), (11, 1), (12, 2)]);
    }

    #[test]
    fn test_resolve_feed_categories_first_match_wins() {
        let groups = vec![membership(3, "7"), membership(4, "7")];

        let output = resolve_feed_categories(&groups, vec![feed(7, "dup")]).unwrap();

        assert_eq!(output[0].category_id, 3);
    }

    #[test]
    fn test_resolve_feed_categories_orphan_feed_fails() {
        let groups = vec![membership(1, "1")];

        let err = resolve_feed_categories(&groups, vec![feed(1, "ok"), feed(2, "orphan")])
            .unwrap_err();

        assert!(matches!(err, ApiError::Resolution { .. }));
        assert!(err.to_string().contains("Feed 2 ('orphan')"));
    }

    #[test]
    fn test_resolve_feed_categories_preserves_order_and_fields() {
        let mut f = feed(5, "keep");
        f.extra
            .insert("custom".to_string(), serde_json::json!("value"));
        let output = resolve_feed_categories(&[membership(9, "5")], vec![f.clone()]).unwrap();

        assert_eq!(output[0].feed, f);
        let json = serde_json::to_value(&output[0]).unwrap();
        assert_eq!(json["category_id"], 9);
        assert_eq!(json["custom"], "value");
        assert_eq!(json["id"], 5);
    }

    #[test]
    fn test_resolve_category_members_reconstructs_feed_ids() {
        let groups = vec![membership(1, "10,11"), membership(2, "12")];
        let categories = vec![group(1, "Tech"), group(2, "News")];

        let output = resolve_category_members(&groups, categories).unwrap();

        assert_eq!(output[0].feed_ids, vec![10, 11]);
        assert_eq!(output[1].feed_ids, vec![12]);
    }

    #[test]
    fn test_resolve_category_members_empty_category() {
        let groups = vec![membership(1, "10")];
        let categories = vec![group(1, "Tech"), group(2, "Empty")];

        let output = resolve_category_members(&groups, categories).unwrap();

        assert!(output[1].feed_ids.is_empty());
    }

    #[test]
    fn test_resolve_category_members_flattens_duplicate_records() {
        // Two records for the same group are merged, not nested.
        let groups = vec![membership(1, "10,11"), membership(1, "11,12")];

        let output = resolve_category_members(&groups, vec![group(1, "Tech")]).unwrap();

        assert_eq!(output[0].feed_ids, vec![10, 11, 12]);
    }

    #[test]
    fn test_resolvers_are_inverse_for_single_membership() {
        let groups = vec![membership(1, "1,2"), membership(2, "3"), membership(3, "")];
        let feeds = vec![feed(1, "a"), feed(2, "b"), feed(3, "c")];
        let categories = vec![group(1, "x"), group(2, "y"), group(3, "z")];

        let feeds_out = resolve_feed_categories(&groups, feeds).unwrap();
        let categories_out = resolve_category_members(&groups, categories).unwrap();

        for category in &categories_out {
            let expected: Vec<i64> = feeds_out
                .iter()
                .filter(|f| f.category_id == category.group.id)
                .map(|f| f.feed.id)
                .collect();
            assert_eq!(category.feed_ids, expected);
        }
    }

    #[test]
    fn test_parse_feed_ids() {
        assert_eq!(parse_feed_ids("1,2, 3").unwrap(), vec![1, 2, 3]);
        assert!(parse_feed_ids("").unwrap().is_empty());
        assert!(matches!(
            parse_feed_ids("1,x"),
            Err(ApiError::Resolution { .. })
        ));
    }

    #[test]
    fn test_parse_item_ids() {
        assert_eq!(parse_item_ids("5,6,7"), vec!["5", "6", "7"]);
        assert!(parse_item_ids("").is_empty());
    }

    #[test]
    fn test_fever_endpoint_normalization() {
        assert_eq!(
            fever_endpoint("https://rss.example.com"),
            "https://rss.example.com/api/fever.php?api"
        );
        assert_eq!(
            fever_endpoint("https://rss.example.com/api/fever.php?api"),
            "https://rss.example.com/api/fever.php?api"
        );
        assert_eq!(
            fever_endpoint("https://rss.example.com/"),
            "https://rss.example.com/api/fever.php?api"
        );
    }

    #[test]
    fn test_api_key() {
        assert_eq!(api_key("user", "pass"), "21a39285884a268d6458e3fdeb08beac");
        assert_ne!(api_key("user", "pass"), api_key("user", "other"));
    }

    #[test]
    fn test_mark_as_from_str() {
        assert_eq!("starred".parse::<MarkAs>().unwrap(), MarkAs::Saved);
        assert_eq!("Unread".parse::<MarkAs>().unwrap().as_wire(), "unread");
        assert!("archived".parse::<MarkAs>().is_err());
    }

    #[test]
    fn test_id_list_render() {
        assert_eq!(IdList::One(4).render(), Some("4".to_string()));
        assert_eq!(IdList::Many(vec![1, 2, 3]).render(), Some("1,2,3".to_string()));
        assert_eq!(IdList::Many(vec![]).render(), None);
    }

    #[test]
    fn test_id_list_from_str() {
        assert_eq!("7".parse::<IdList>().unwrap(), IdList::One(7));
        assert_eq!("1, 2".parse::<IdList>().unwrap(), IdList::Many(vec![1, 2]));
        assert!("1,a".parse::<IdList>().is_err());
    }

    #[test]
    fn test_id_list_deserializes_number_or_array() {
        let one: IdList = serde_json::from_value(serde_json::json!(3)).unwrap();
        let many: IdList = serde_json::from_value(serde_json::json!([1, 2])).unwrap();
        assert_eq!(one, IdList::One(3));
        assert_eq!(many, IdList::Many(vec![1, 2]));
    }

    #[test]
    fn test_item_filter() {
        let items = vec![item("1", 0, 0), item("2", 1, 0), item("3", 1, 1)];

        let unread = ItemFilter {
            read: Some(false),
            starred: None,
        };
        assert_eq!(item_ids(&unread.apply(items.clone())), vec!["1"]);

        let read_starred = ItemFilter {
            read: Some(true),
            starred: Some(true),
        };
        assert_eq!(item_ids(&read_starred.apply(items.clone())), vec!["3"]);

        let unstarred = ItemFilter {
            read: None,
            starred: Some(false),
        };
        assert_eq!(item_ids(&unstarred.apply(items.clone())), vec!["1", "2"]);

        assert_eq!(ItemFilter::default().apply(items).len(), 3);
    }

    #[test]
    fn test_item_id_accepts_string_or_number() {
        let json = serde_json::json!({
            "items": [
                {"id": "1700000000000001", "feed_id": 2, "is_read": 1, "is_saved": 0},
                {"id": 42, "feed_id": 2, "is_read": 0, "is_saved": 1}
            ],
            "total_items": 2
        });

        let response: FeverItemsResponse = serde_json::from_value(json).unwrap();

        assert_eq!(item_ids(&response.items), vec!["1700000000000001", "42"]);
        assert_eq!(response.total_items, Some(2));
    }

    #[test]
    fn test_ensure_authenticated() {
        assert!(ensure_authenticated(Some(1)).is_ok());
        assert!(ensure_authenticated(None).is_ok());
        assert!(matches!(
            ensure_authenticated(Some(0)),
            Err(ApiError::Precondition { .. })
        ));
    }
}
