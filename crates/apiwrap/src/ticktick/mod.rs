pub mod auth;
pub mod checklist;
pub mod client;
pub mod project;
pub mod task;

pub use client::TickTick;

use crate::prelude::{eprintln, *};

/// TickTick module app - root command
#[derive(Debug, clap::Parser)]
#[command(name = "ticktick")]
#[command(about = "TickTick projects, tasks and checklists")]
pub struct App {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, clap::Subcommand)]
pub enum Commands {
    /// Obtain an access token
    #[command(subcommand)]
    Auth(auth::AuthCommands),

    /// Manage projects
    #[command(subcommand)]
    Projects(project::ProjectCommands),

    /// Manage tasks
    #[command(subcommand)]
    Tasks(task::TaskCommands),

    /// Manage the checklist of a task
    #[command(subcommand)]
    Checklist(checklist::ChecklistCommands),
}

/// Module entry point
pub async fn run(app: App, global: crate::Global) -> Result<()> {
    if global.verbose {
        eprintln!("Running TickTick module...");
    }

    match app.command {
        Commands::Auth(cmd) => auth::handler(cmd).await,
        Commands::Projects(cmd) => project::handler(cmd).await,
        Commands::Tasks(cmd) => task::handler(cmd).await,
        Commands::Checklist(cmd) => checklist::handler(cmd).await,
    }
}
