use apiwrap_core::error::{ErrorContext, Provider};
use apiwrap_core::pocket::{
    authorize_url, build_add_item_body, build_get_items_body, build_modify_body, filter_deleted,
    parse_form_field, with_auth, DetailType, GetItemsQuery, ItemContentType, ItemModification,
    ItemSort, ItemState, API_ROOT, MAX_COUNT,
};
use apiwrap_core::time::format_timestamp_str;
use colored::Colorize;

use crate::error::require_env;
use crate::http::Transport;
use crate::prelude::{eprintln, println, *};

/// Flow that produces a Pocket access token
pub const AUTH_FLOW: &str = "apiwrap pocket auth";

/// Pocket module app - root command
#[derive(Debug, clap::Parser)]
#[command(name = "pocket")]
#[command(about = "Pocket (read-it-later) operations")]
pub struct App {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, clap::Subcommand)]
pub enum Commands {
    /// Obtain an access token
    #[command(subcommand)]
    Auth(AuthCommands),

    /// List saved items
    #[clap(name = "items")]
    Items(ItemsOptions),

    /// Save a URL
    #[clap(name = "add")]
    Add(AddOptions),

    /// Archive, favorite, delete or retag an item
    #[clap(name = "modify")]
    Modify(ModifyOptions),
}

#[derive(Debug, clap::Subcommand)]
pub enum AuthCommands {
    /// Request a token and print the URL that authorizes it
    #[clap(name = "url")]
    Url,

    /// Exchange an authorized request token for an access token
    #[clap(name = "token")]
    Token(TokenOptions),
}

#[derive(Debug, clap::Args, Clone)]
pub struct TokenOptions {
    /// Request token printed by `pocket auth url`
    pub code: String,
}

#[derive(Debug, clap::Args, Clone)]
pub struct ItemsOptions {
    /// unread, archive, all or all_and_deleted
    #[arg(long, default_value = "all")]
    pub state: ItemState,

    /// Only favorited (true) or unfavorited (false) items
    #[arg(long)]
    pub favorite: Option<bool>,

    /// Tag name, or _untagged_
    #[arg(long)]
    pub tag: Option<String>,

    /// article, video or image
    #[arg(long)]
    pub content_type: Option<ItemContentType>,

    /// newest, oldest, title or site
    #[arg(long, default_value = "newest")]
    pub sort: ItemSort,

    /// simple or complete
    #[arg(long, default_value = "simple")]
    pub detail_type: DetailType,

    #[arg(long)]
    pub search: Option<String>,

    #[arg(long)]
    pub domain: Option<String>,

    /// Only items modified since this Unix timestamp
    #[arg(long)]
    pub since: Option<i64>,

    #[arg(long, default_value_t = MAX_COUNT)]
    pub count: u32,

    #[arg(long, default_value_t = 0)]
    pub offset: u32,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, clap::Args, Clone)]
pub struct AddOptions {
    pub url: String,

    #[arg(long)]
    pub title: Option<String>,

    /// Comma separated tags
    #[arg(long, value_delimiter = ',')]
    pub tags: Vec<String>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, clap::Args, Clone)]
pub struct ModifyOptions {
    pub item_id: i64,

    /// Archive (true) or re-add (false)
    #[arg(long)]
    pub archive: Option<bool>,

    /// Favorite (true) or unfavorite (false)
    #[arg(long)]
    pub favorite: Option<bool>,

    #[arg(long)]
    pub delete: bool,

    /// Remove every tag
    #[arg(long)]
    pub clear_tags: bool,

    #[arg(long, value_delimiter = ',')]
    pub remove_tags: Vec<String>,

    /// Replace all tags with these
    #[arg(long, value_delimiter = ',')]
    pub set_tags: Vec<String>,

    #[arg(long, value_delimiter = ',')]
    pub add_tags: Vec<String>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

/// Pocket configuration from environment variables
#[derive(Debug, Clone)]
pub struct PocketConfig {
    pub consumer_key: String,
    pub access_token: String,
}

impl PocketConfig {
    pub fn from_env() -> Result<Self> {
        let consumer_key = require_env("POCKET_CONSUMER_KEY")?;
        let access_token = require_env("POCKET_ACCESS_TOKEN")
            .map_err(|_| ErrorContext::new(Provider::Pocket).missing_access_token(AUTH_FLOW))?;
        Ok(Self {
            consumer_key,
            access_token,
        })
    }
}

/// Adapter for one Pocket account
#[derive(Debug, Clone)]
pub struct Pocket {
    transport: Transport,
    config: PocketConfig,
}

impl Pocket {
    pub fn new(config: PocketConfig) -> Result<Self> {
        Ok(Self {
            transport: Transport::new(Provider::Pocket, None)?,
            config,
        })
    }

    async fn post(
        &self,
        path: &str,
        body: serde_json::Value,
        context: &str,
    ) -> Result<serde_json::Value, ApiError> {
        let body = with_auth(body, &self.config.consumer_key, &self.config.access_token);
        let request = self
            .transport
            .post(&format!("{API_ROOT}{path}"))
            .json(&body);
        self.transport.json(request, context).await
    }

    pub async fn get_items(&self, query: &GetItemsQuery) -> Result<serde_json::Value, ApiError> {
        let body = build_get_items_body(query)?;
        let response = self.post("/get", body, "get items").await?;
        Ok(filter_deleted(query.state, response))
    }

    pub async fn add_item(
        &self,
        url: &str,
        title: Option<&str>,
        tags: &[String],
    ) -> Result<serde_json::Value, ApiError> {
        self.post("/add", build_add_item_body(url, title, tags), "add item")
            .await
    }

    pub async fn modify_item(
        &self,
        modification: &ItemModification,
    ) -> Result<serde_json::Value, ApiError> {
        let body = build_modify_body(modification)?;
        self.post("/send", body, "modify item").await
    }
}

/// OAuth helper; the consumer key alone identifies the application.
#[derive(Debug, Clone)]
pub struct PocketAuth {
    transport: Transport,
    consumer_key: String,
    redirect_uri: String,
}

impl PocketAuth {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            transport: Transport::new(Provider::Pocket, None)?,
            consumer_key: require_env("POCKET_CONSUMER_KEY")?,
            redirect_uri: require_env("POCKET_REDIRECT_URI")?,
        })
    }

    pub async fn request_token(&self) -> Result<String, ApiError> {
        let body = serde_json::json!({
            "consumer_key": self.consumer_key,
            "redirect_uri": self.redirect_uri,
        });
        let request = self
            .transport
            .post(&format!("{API_ROOT}/oauth/request"))
            .json(&body);
        let text = self.transport.text(request, "get request token").await?;
        parse_form_field(&text, "code")
    }

    pub fn authorize_url(&self, request_token: &str) -> Result<String, ApiError> {
        authorize_url(request_token, &self.redirect_uri)
    }

    pub async fn access_token(&self, code: &str) -> Result<String, ApiError> {
        let body = serde_json::json!({
            "consumer_key": self.consumer_key,
            "code": code,
        });
        let request = self
            .transport
            .post(&format!("{API_ROOT}/oauth/authorize"))
            .json(&body);
        let text = self.transport.text(request, "get access token").await?;
        parse_form_field(&text, "access_token")
    }
}

/// Module entry point
pub async fn run(app: App, global: crate::Global) -> Result<()> {
    if global.verbose {
        eprintln!("Running Pocket module...");
    }

    match app.command {
        Commands::Auth(cmd) => auth_handler(cmd).await,
        Commands::Items(options) => items_handler(options).await,
        Commands::Add(options) => {
            let pocket = Pocket::new(PocketConfig::from_env()?)?;
            let response = pocket
                .add_item(&options.url, options.title.as_deref(), &options.tags)
                .await?;
            if options.json {
                return print_json(&response);
            }
            println!("{} {}", "Saved".green(), options.url.bold());
            Ok(())
        }
        Commands::Modify(options) => {
            let pocket = Pocket::new(PocketConfig::from_env()?)?;
            let json = options.json;
            let item_id = options.item_id;
            let response = pocket.modify_item(&modification(options)).await?;
            if json {
                return print_json(&response);
            }
            println!("{} {}", "Modified item".green(), item_id.to_string().bold());
            Ok(())
        }
    }
}

fn modification(options: ModifyOptions) -> ItemModification {
    ItemModification {
        item_id: options.item_id,
        archive: options.archive,
        favorite: options.favorite,
        delete: options.delete,
        clear_tags: options.clear_tags,
        remove_tags: options.remove_tags,
        replace_tags: options.set_tags,
        add_tags: options.add_tags,
    }
}

async fn auth_handler(cmd: AuthCommands) -> Result<()> {
    let auth = PocketAuth::from_env()?;

    match cmd {
        AuthCommands::Url => {
            let code = auth.request_token().await?;
            println!("{}", auth.authorize_url(&code)?);
            println!(
                "\nAfter authorizing, run: {}",
                format!("apiwrap pocket auth token {code}").bold()
            );
        }
        AuthCommands::Token(options) => {
            let token = auth.access_token(&options.code).await?;
            println!("{token}");
        }
    }

    Ok(())
}

async fn items_handler(options: ItemsOptions) -> Result<()> {
    let pocket = Pocket::new(PocketConfig::from_env()?)?;
    let query = GetItemsQuery {
        state: options.state,
        favorite: options.favorite,
        tag: options.tag,
        content_type: options.content_type,
        sort: options.sort,
        detail_type: options.detail_type,
        search: options.search,
        domain: options.domain,
        since: options.since,
        count: options.count,
        offset: options.offset,
    };

    let response = pocket.get_items(&query).await?;

    if options.json {
        return print_json(&response);
    }

    let Some(list) = response.get("list").and_then(|l| l.as_object()) else {
        println!("No items found.");
        return Ok(());
    };

    let mut table = new_table();
    table.add_row(prettytable::row![
        "ID".bold().cyan(),
        "Title".bold().cyan(),
        "URL".bold().cyan(),
        "Added".bold().cyan(),
    ]);
    for (id, item) in list {
        let field = |name: &str| item.get(name).and_then(|v| v.as_str()).unwrap_or("");
        let title = Some(field("resolved_title"))
            .filter(|t| !t.is_empty())
            .unwrap_or(field("given_title"));
        let url = Some(field("resolved_url"))
            .filter(|u| !u.is_empty())
            .unwrap_or(field("given_url"));
        table.add_row(prettytable::row![
            id.bright_black(),
            title.bright_white(),
            url.bright_blue(),
            format_timestamp_str(Some(field("time_added")))
                .unwrap_or_default()
                .bright_black(),
        ]);
    }
    table.printstd();

    Ok(())
}
