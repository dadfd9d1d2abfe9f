//! OAuth2 authorization-code flow for TickTick

use apiwrap_core::error::Provider;
use apiwrap_core::ticktick::{authorize_url, extract_access_token, token_request_form, TOKEN_URL};
use colored::Colorize;

use crate::error::require_env;
use crate::http::Transport;
use crate::prelude::{println, *};

#[derive(Debug, clap::Subcommand)]
pub enum AuthCommands {
    /// Print the URL that authorizes this application
    #[clap(name = "url")]
    Url(UrlOptions),

    /// Exchange an authorization code for an access token
    #[clap(name = "token")]
    Token(TokenOptions),
}

#[derive(Debug, clap::Args, Clone)]
pub struct UrlOptions {
    /// Requested scopes
    #[arg(long, value_delimiter = ',', default_value = "read,write")]
    pub scopes: Vec<String>,
}

#[derive(Debug, clap::Args, Clone)]
pub struct TokenOptions {
    /// Code from the redirect after authorizing
    pub code: String,

    /// Scopes requested with the authorize URL
    #[arg(long, value_delimiter = ',', default_value = "read,write")]
    pub scopes: Vec<String>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

/// OAuth client registration from environment variables
#[derive(Debug, Clone)]
pub struct TickTickAuthConfig {
    pub client_id: String,
    pub client_secret: String,
    pub redirect_uri: String,
}

impl TickTickAuthConfig {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            client_id: require_env("TICKTICK_CLIENT_ID")?,
            client_secret: require_env("TICKTICK_CLIENT_SECRET")?,
            redirect_uri: require_env("TICKTICK_REDIRECT_URI")?,
        })
    }
}

pub async fn exchange_code(
    config: &TickTickAuthConfig,
    code: &str,
    scopes: &[String],
) -> Result<String> {
    let transport = Transport::plain(Provider::TickTick)?;
    let form = token_request_form(
        &config.client_id,
        &config.client_secret,
        code,
        &config.redirect_uri,
        scopes,
    );
    let response: serde_json::Value = transport
        .json(transport.post(TOKEN_URL).form(&form), "get access token")
        .await?;
    Ok(extract_access_token(&response)?)
}

pub async fn handler(cmd: AuthCommands) -> Result<()> {
    let config = TickTickAuthConfig::from_env()?;

    match cmd {
        AuthCommands::Url(options) => {
            let url = authorize_url(&config.client_id, &config.redirect_uri, &options.scopes)?;
            println!("{url}");
        }
        AuthCommands::Token(options) => {
            let token = exchange_code(&config, &options.code, &options.scopes).await?;
            if options.json {
                print_json(&serde_json::json!({ "access_token": token }))?;
            } else {
                println!("{}", "Access token:".bold().cyan());
                println!("{token}");
                println!(
                    "\nExport it as {} to use the other commands.",
                    "TICKTICK_ACCESS_TOKEN".bold()
                );
            }
        }
    }

    Ok(())
}
