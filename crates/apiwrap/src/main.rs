use crate::prelude::*;
use clap::Parser;

mod error;
mod freshrss;
mod groq;
mod hass;
mod http;
mod mcp;
mod pocket;
mod prelude;
mod ticktick;

#[derive(Debug, clap::Parser)]
#[command(
    author,
    version,
    about,
    long_about = "One command line for FreshRSS, TickTick, Pocket, Home Assistant and Groq"
)]
pub struct App {
    #[command(subcommand)]
    pub command: SubCommands,

    #[clap(flatten)]
    global: Global,
}

#[derive(Debug, Clone, clap::Args)]
pub struct Global {
    /// Whether to display additional information.
    #[clap(long, env = "APIWRAP_VERBOSE", global = true, default_value = "false")]
    verbose: bool,
}

#[derive(Debug, clap::Parser)]
pub enum SubCommands {
    /// FreshRSS feeds, categories and items
    #[command(name = "freshrss")]
    FreshRss(crate::freshrss::App),

    /// TickTick projects, tasks and checklists
    #[command(name = "ticktick")]
    TickTick(crate::ticktick::App),

    /// Pocket saved items
    Pocket(crate::pocket::App),

    /// Home Assistant states, services, scripts and scenes
    Hass(crate::hass::App),

    /// Groq models and chat completions
    Groq(crate::groq::App),

    /// Model Context Protocol server
    MCP(crate::mcp::App),
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();
    color_eyre::install()?;

    let app = App::parse();

    match app.command {
        SubCommands::FreshRss(sub_app) => crate::freshrss::run(sub_app, app.global).await,
        SubCommands::TickTick(sub_app) => crate::ticktick::run(sub_app, app.global).await,
        SubCommands::Pocket(sub_app) => crate::pocket::run(sub_app, app.global).await,
        SubCommands::Hass(sub_app) => crate::hass::run(sub_app, app.global).await,
        SubCommands::Groq(sub_app) => crate::groq::run(sub_app, app.global).await,
        SubCommands::MCP(sub_app) => crate::mcp::run(sub_app, app.global).await,
    }
    .map_err(|err: color_eyre::eyre::Report| eyre!(err))
}
