use apiwrap_core::error::Provider;
use apiwrap_core::freshrss::{
    api_key, ensure_authenticated, fever_endpoint, item_ids, parse_item_ids,
    resolve_category_members, resolve_feed_categories, CategoryOutput, FeedOutput,
    FeverFeedsResponse, FeverGroupsResponse, FeverItem, FeverItemsResponse,
    FeverSavedItemIdsResponse, IdList, ItemFilter, MarkAs,
};
use apiwrap_core::time::format_timestamp;
use colored::Colorize;
use serde::de::DeserializeOwned;

use crate::error::require_env;
use crate::http::Transport;
use crate::prelude::{eprintln, println, *};

/// FreshRSS module app - root command
#[derive(Debug, clap::Parser)]
#[command(name = "freshrss")]
#[command(about = "FreshRSS operations through the Fever API")]
pub struct App {
    #[command(subcommand)]
    pub command: Commands,

    /// FreshRSS base URL (overrides FRESHRSS_BASE_URL)
    #[arg(long, global = true)]
    pub base_url: Option<String>,
}

#[derive(Debug, clap::Subcommand)]
pub enum Commands {
    /// List feeds with their category
    #[clap(name = "feeds")]
    Feeds(OutputOptions),

    /// List categories with their feed ids
    #[clap(name = "categories")]
    Categories(OutputOptions),

    /// List items, optionally restricted to feeds or categories
    #[clap(name = "items")]
    Items(ItemsOptions),

    /// Get one item by id
    #[clap(name = "item")]
    Item(ItemOptions),

    /// List the ids of starred items
    #[clap(name = "starred")]
    Starred(OutputOptions),

    /// Mark an item as read, unread, saved or unsaved
    #[clap(name = "mark")]
    Mark(MarkOptions),
}

#[derive(Debug, clap::Args, Clone)]
pub struct OutputOptions {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, clap::Args, Clone)]
pub struct ItemsOptions {
    /// Comma separated feed ids
    #[arg(long)]
    pub feed_ids: Option<IdList>,

    /// Comma separated category ids
    #[arg(long)]
    pub category_ids: Option<IdList>,

    /// Only read (true) or unread (false) items
    #[arg(long)]
    pub read: Option<bool>,

    /// Only starred (true) or unstarred (false) items
    #[arg(long)]
    pub starred: Option<bool>,

    /// Print item ids only
    #[arg(long)]
    pub id_only: bool,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, clap::Args, Clone)]
pub struct ItemOptions {
    /// Item id(s), comma separated; the first match is shown
    pub ids: IdList,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, clap::Args, Clone)]
pub struct MarkOptions {
    /// Item id
    pub id: String,

    /// read, unread, saved or unsaved
    pub mark: MarkAs,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

/// FreshRSS configuration from environment variables
#[derive(Debug, Clone)]
pub struct FreshRssConfig {
    pub base_url: String,
    pub username: String,
    pub password: String,
}

impl FreshRssConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            base_url: require_env("FRESHRSS_BASE_URL")?,
            username: require_env("FRESHRSS_USERNAME")?,
            password: require_env("FRESHRSS_PASSWORD")?,
        })
    }

    /// Apply CLI overrides to the configuration
    pub fn with_overrides(mut self, base_url: Option<String>) -> Self {
        if let Some(url) = base_url {
            self.base_url = url;
        }
        self
    }
}

/// Adapter for the Fever endpoint of one FreshRSS instance
#[derive(Debug, Clone)]
pub struct FreshRss {
    transport: Transport,
    endpoint: String,
    api_key: String,
}

impl FreshRss {
    pub fn new(config: &FreshRssConfig) -> Result<Self> {
        Ok(Self {
            transport: Transport::plain(Provider::FreshRss)?,
            endpoint: fever_endpoint(&config.base_url),
            api_key: api_key(&config.username, &config.password),
        })
    }

    pub fn from_env() -> Result<Self> {
        Self::new(&FreshRssConfig::from_env()?)
    }

    /// POST `{endpoint}&{query}` with the API key as form body.
    async fn call<T: DeserializeOwned>(&self, query: &str, context: &str) -> Result<T, ApiError> {
        let url = format!("{}&{}", self.endpoint, query);
        let request = self
            .transport
            .post(&url)
            .form(&[("api_key", self.api_key.as_str())]);
        self.transport.json(request, context).await
    }

    pub async fn get_starred_item_ids(&self) -> Result<Vec<String>, ApiError> {
        let response: FeverSavedItemIdsResponse =
            self.call("saved_item_ids", "get starred item ids").await?;
        ensure_authenticated(response.auth)?;
        Ok(parse_item_ids(&response.saved_item_ids))
    }

    pub async fn get_feeds(&self) -> Result<Vec<FeedOutput>, ApiError> {
        let response: FeverFeedsResponse = self.call("feeds", "get feeds").await?;
        ensure_authenticated(response.auth)?;
        resolve_feed_categories(&response.feeds_groups, response.feeds)
    }

    pub async fn get_categories(&self) -> Result<Vec<CategoryOutput>, ApiError> {
        let response: FeverGroupsResponse = self.call("groups", "get categories").await?;
        ensure_authenticated(response.auth)?;
        resolve_category_members(&response.feeds_groups, response.groups)
    }

    pub async fn get_items(
        &self,
        feed_ids: Option<&IdList>,
        category_ids: Option<&IdList>,
        filter: ItemFilter,
    ) -> Result<Vec<FeverItem>, ApiError> {
        let mut query = String::from("items");
        if let Some(ids) = feed_ids.and_then(IdList::render) {
            query.push_str(&format!("&feed_ids={ids}"));
        }
        if let Some(ids) = category_ids.and_then(IdList::render) {
            query.push_str(&format!("&group_ids={ids}"));
        }

        let response: FeverItemsResponse = self.call(&query, "get items").await?;
        ensure_authenticated(response.auth)?;
        Ok(filter.apply(response.items))
    }

    pub async fn get_item(&self, ids: &IdList) -> Result<Option<FeverItem>, ApiError> {
        let Some(rendered) = ids.render() else {
            return Ok(None);
        };
        let response: FeverItemsResponse = self
            .call(&format!("items&with_ids={rendered}"), "get item")
            .await?;
        ensure_authenticated(response.auth)?;
        Ok(response.items.into_iter().next())
    }

    pub async fn mark_item(&self, id: &str, mark: MarkAs) -> Result<serde_json::Value, ApiError> {
        let query = format!(
            "mark=item&as={}&id={}",
            mark.as_wire(),
            urlencoding::encode(id)
        );
        let response: serde_json::Value = self.call(&query, mark.describe()).await?;
        ensure_authenticated(response.get("auth").and_then(|a| a.as_i64()))?;
        Ok(response)
    }
}

/// Module entry point
pub async fn run(app: App, global: crate::Global) -> Result<()> {
    if global.verbose {
        eprintln!("Running FreshRSS module...");
    }

    let config = FreshRssConfig::from_env()?.with_overrides(app.base_url);
    let client = FreshRss::new(&config)?;

    match app.command {
        Commands::Feeds(options) => feeds_handler(&client, options).await,
        Commands::Categories(options) => categories_handler(&client, options).await,
        Commands::Items(options) => items_handler(&client, options).await,
        Commands::Item(options) => item_handler(&client, options).await,
        Commands::Starred(options) => starred_handler(&client, options).await,
        Commands::Mark(options) => mark_handler(&client, options).await,
    }
}

async fn feeds_handler(client: &FreshRss, options: OutputOptions) -> Result<()> {
    let feeds = client.get_feeds().await?;

    if options.json {
        return print_json(&feeds);
    }

    let mut table = new_table();
    table.add_row(prettytable::row![
        "ID".bold().cyan(),
        "Title".bold().cyan(),
        "Category".bold().cyan(),
        "Updated".bold().cyan(),
    ]);
    for feed in &feeds {
        table.add_row(prettytable::row![
            feed.feed.id.to_string().bright_black(),
            feed.feed.title.bright_white(),
            feed.category_id.to_string().green(),
            format_timestamp(feed.feed.last_updated_on_time)
                .unwrap_or_default()
                .bright_black(),
        ]);
    }
    table.printstd();

    Ok(())
}

async fn categories_handler(client: &FreshRss, options: OutputOptions) -> Result<()> {
    let categories = client.get_categories().await?;

    if options.json {
        return print_json(&categories);
    }

    let mut table = new_table();
    table.add_row(prettytable::row![
        "ID".bold().cyan(),
        "Title".bold().cyan(),
        "Feeds".bold().cyan(),
    ]);
    for category in &categories {
        let feeds = category
            .feed_ids
            .iter()
            .map(|id| id.to_string())
            .collect::<Vec<_>>()
            .join(", ");
        table.add_row(prettytable::row![
            category.group.id.to_string().bright_black(),
            category.group.title.bright_white(),
            feeds.green(),
        ]);
    }
    table.printstd();

    Ok(())
}

async fn items_handler(client: &FreshRss, options: ItemsOptions) -> Result<()> {
    let filter = ItemFilter {
        read: options.read,
        starred: options.starred,
    };
    let items = client
        .get_items(options.feed_ids.as_ref(), options.category_ids.as_ref(), filter)
        .await?;

    if options.id_only {
        let ids = item_ids(&items);
        if options.json {
            return print_json(&ids);
        }
        for id in ids {
            println!("{id}");
        }
        return Ok(());
    }

    if options.json {
        return print_json(&items);
    }

    let mut table = new_table();
    table.add_row(prettytable::row![
        "ID".bold().cyan(),
        "Title".bold().cyan(),
        "Feed".bold().cyan(),
        "Read".bold().cyan(),
        "Starred".bold().cyan(),
        "Created".bold().cyan(),
    ]);
    for item in &items {
        table.add_row(prettytable::row![
            item.id.bright_black(),
            item.title.as_deref().unwrap_or("(untitled)").bright_white(),
            item.feed_id.map(|id| id.to_string()).unwrap_or_default(),
            flag(item.is_read == 1),
            flag(item.is_saved == 1),
            format_timestamp(item.created_on_time)
                .unwrap_or_default()
                .bright_black(),
        ]);
    }
    table.printstd();

    Ok(())
}

async fn item_handler(client: &FreshRss, options: ItemOptions) -> Result<()> {
    let item = client.get_item(&options.ids).await?;

    if options.json {
        return print_json(&item);
    }

    let Some(item) = item else {
        println!("{}", "No item found".yellow());
        return Ok(());
    };

    println!(
        "\n{} - {}\n",
        item.id.bold().cyan(),
        item.title.as_deref().unwrap_or("(untitled)").bright_white()
    );
    let mut table = new_table();
    if let Some(author) = item.author.as_deref().filter(|a| !a.is_empty()) {
        table.add_row(prettytable::row!["Author".bold().cyan(), author.bright_magenta()]);
    }
    if let Some(url) = &item.url {
        table.add_row(prettytable::row!["URL".bold().cyan(), url.bright_blue()]);
    }
    table.add_row(prettytable::row!["Read".bold().cyan(), flag(item.is_read == 1)]);
    table.add_row(prettytable::row!["Starred".bold().cyan(), flag(item.is_saved == 1)]);
    if let Some(created) = format_timestamp(item.created_on_time) {
        table.add_row(prettytable::row!["Created".bold().cyan(), created.bright_black()]);
    }
    table.printstd();

    if let Some(html) = &item.html {
        println!("\n{}", html);
    }

    Ok(())
}

async fn starred_handler(client: &FreshRss, options: OutputOptions) -> Result<()> {
    let ids = client.get_starred_item_ids().await?;

    if options.json {
        return print_json(&ids);
    }

    for id in ids {
        println!("{id}");
    }
    Ok(())
}

async fn mark_handler(client: &FreshRss, options: MarkOptions) -> Result<()> {
    let response = client.mark_item(&options.id, options.mark).await?;

    if options.json {
        return print_json(&response);
    }

    println!(
        "{} {} as {}",
        "Marked".green(),
        options.id.bold(),
        options.mark.as_wire()
    );
    Ok(())
}

fn flag(value: bool) -> colored::ColoredString {
    if value {
        "yes".green()
    } else {
        "no".bright_black()
    }
}
