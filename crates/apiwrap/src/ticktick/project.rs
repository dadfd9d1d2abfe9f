use apiwrap_core::ticktick::{NewProject, Project, ProjectKind, ProjectUpdate, ViewMode};
use colored::Colorize;

use super::client::TickTick;
use crate::prelude::{println, *};

#[derive(Debug, clap::Subcommand)]
pub enum ProjectCommands {
    /// List projects
    #[clap(name = "list")]
    List(ListOptions),

    /// Show a project with its tasks
    #[clap(name = "get")]
    Get(GetOptions),

    /// Create a project
    #[clap(name = "create")]
    Create(CreateOptions),

    /// Update a project
    #[clap(name = "update")]
    Update(UpdateOptions),

    /// Delete a project
    #[clap(name = "delete")]
    Delete(DeleteOptions),
}

#[derive(Debug, clap::Args, Clone)]
pub struct ListOptions {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, clap::Args, Clone)]
pub struct GetOptions {
    pub project_id: String,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, clap::Args, Clone)]
pub struct CreateOptions {
    pub name: String,

    /// Hex color, e.g. "#F18181"
    #[arg(long)]
    pub color: Option<String>,

    /// task or note
    #[arg(long, default_value = "task")]
    pub kind: ProjectKind,

    /// list, kanban or timeline
    #[arg(long, default_value = "list")]
    pub view_mode: ViewMode,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, clap::Args, Clone)]
pub struct UpdateOptions {
    pub project_id: String,

    #[arg(long)]
    pub name: Option<String>,

    #[arg(long)]
    pub color: Option<String>,

    /// task or note
    #[arg(long)]
    pub kind: Option<ProjectKind>,

    /// list, kanban or timeline
    #[arg(long)]
    pub view_mode: Option<ViewMode>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, clap::Args, Clone)]
pub struct DeleteOptions {
    pub project_id: String,
}

pub async fn handler(cmd: ProjectCommands) -> Result<()> {
    let client = TickTick::from_env()?;

    match cmd {
        ProjectCommands::List(options) => {
            let projects = client.get_projects().await?;
            if options.json {
                return print_json(&projects);
            }
            display_projects(&projects);
        }
        ProjectCommands::Get(options) => {
            let data = client.get_project_data(&options.project_id).await?;
            if options.json {
                return print_json(&data);
            }
            if let Some(project) = &data.project {
                display_projects(std::slice::from_ref(project));
            }
            super::task::display_tasks(&data.tasks);
        }
        ProjectCommands::Create(options) => {
            let project = client
                .create_project(&NewProject {
                    name: options.name,
                    color: options.color,
                    kind: options.kind,
                    view_mode: options.view_mode,
                })
                .await?;
            if options.json {
                return print_json(&project);
            }
            println!("{} {}", "Created project".green(), project.id.bold());
        }
        ProjectCommands::Update(options) => {
            let update = ProjectUpdate {
                name: options.name,
                color: options.color,
                kind: options.kind,
                view_mode: options.view_mode,
            };
            if update.is_empty() {
                return Err(eyre!(
                    "At least one field must be provided for update (--name, --color, --kind or --view-mode)"
                ));
            }
            let project = client.update_project(&options.project_id, &update).await?;
            if options.json {
                return print_json(&project);
            }
            println!("{} {}", "Updated project".green(), project.id.bold());
        }
        ProjectCommands::Delete(options) => {
            client.delete_project(&options.project_id).await?;
            println!("{} {}", "Deleted project".green(), options.project_id.bold());
        }
    }

    Ok(())
}

fn display_projects(projects: &[Project]) {
    if projects.is_empty() {
        println!("No projects found.");
        return;
    }

    let mut table = new_table();
    table.add_row(prettytable::row![
        "ID".bold().cyan(),
        "Name".bold().cyan(),
        "Kind".bold().cyan(),
        "View".bold().cyan(),
    ]);
    for project in projects {
        table.add_row(prettytable::row![
            project.id.bright_black(),
            project.name.bright_white(),
            project.kind.as_deref().unwrap_or("TASK"),
            project.view_mode.as_deref().unwrap_or("list"),
        ]);
    }
    table.printstd();
}
