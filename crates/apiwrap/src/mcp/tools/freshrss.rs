use apiwrap_core::freshrss::{item_ids, IdList, ItemFilter};
use serde::Deserialize;

use super::{execution_error, parse_arguments, text_result, JsonRpcError};
use crate::freshrss::FreshRss;
use crate::prelude::eprintln;

fn client() -> Result<FreshRss, JsonRpcError> {
    FreshRss::from_env().map_err(execution_error)
}

pub async fn handle_feeds(global: &crate::Global) -> Result<serde_json::Value, JsonRpcError> {
    if global.verbose {
        eprintln!("Calling freshrss_feeds");
    }

    let feeds = client()?.get_feeds().await.map_err(execution_error)?;
    text_result(&feeds)
}

pub async fn handle_categories(global: &crate::Global) -> Result<serde_json::Value, JsonRpcError> {
    if global.verbose {
        eprintln!("Calling freshrss_categories");
    }

    let categories = client()?.get_categories().await.map_err(execution_error)?;
    text_result(&categories)
}

pub async fn handle_items(
    arguments: Option<serde_json::Value>,
    global: &crate::Global,
) -> Result<serde_json::Value, JsonRpcError> {
    #[derive(Deserialize)]
    struct ItemsArgs {
        feed_ids: Option<IdList>,
        category_ids: Option<IdList>,
        read: Option<bool>,
        starred: Option<bool>,
        #[serde(default)]
        id_only: bool,
    }

    let args: ItemsArgs = parse_arguments(arguments)?;

    if global.verbose {
        eprintln!(
            "Calling freshrss_items: feed_ids={:?}, category_ids={:?}, read={:?}, starred={:?}",
            args.feed_ids, args.category_ids, args.read, args.starred
        );
    }

    let filter = ItemFilter {
        read: args.read,
        starred: args.starred,
    };
    let items = client()?
        .get_items(args.feed_ids.as_ref(), args.category_ids.as_ref(), filter)
        .await
        .map_err(execution_error)?;

    if args.id_only {
        text_result(&item_ids(&items))
    } else {
        text_result(&items)
    }
}
