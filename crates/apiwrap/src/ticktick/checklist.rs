use std::collections::HashSet;

use apiwrap_core::ticktick::ChecklistItem;
use colored::Colorize;

use super::client::TickTick;
use crate::prelude::{println, *};

#[derive(Debug, clap::Subcommand)]
pub enum ChecklistCommands {
    /// List the checklist items of a task
    #[clap(name = "list")]
    List(ListOptions),

    /// Append checklist items
    #[clap(name = "add")]
    Add(AddOptions),

    /// Complete checklist items (all of them without --id)
    #[clap(name = "complete")]
    Complete(CompleteOptions),

    /// Delete a checklist item (all of them without --id)
    #[clap(name = "delete")]
    Delete(DeleteOptions),
}

#[derive(Debug, clap::Args, Clone)]
pub struct ListOptions {
    pub project_id: String,
    pub task_id: String,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, clap::Args, Clone)]
pub struct AddOptions {
    pub project_id: String,
    pub task_id: String,

    /// Titles of the new items
    #[arg(required = true)]
    pub titles: Vec<String>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, clap::Args, Clone)]
pub struct CompleteOptions {
    pub project_id: String,
    pub task_id: String,

    /// Item ids to complete, comma separated
    #[arg(long = "id", value_delimiter = ',')]
    pub ids: Vec<String>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, clap::Args, Clone)]
pub struct DeleteOptions {
    pub project_id: String,
    pub task_id: String,

    /// Item id to delete
    #[arg(long)]
    pub id: Option<String>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

pub async fn handler(cmd: ChecklistCommands) -> Result<()> {
    let client = TickTick::from_env()?;

    let (task, json) = match cmd {
        ChecklistCommands::List(options) => {
            let items = client
                .get_checklist_items(&options.project_id, &options.task_id)
                .await?;
            if options.json {
                return print_json(&items);
            }
            display_items(&items);
            return Ok(());
        }
        ChecklistCommands::Add(options) => {
            let task = client
                .add_checklist_items(&options.project_id, &options.task_id, options.titles)
                .await?;
            (task, options.json)
        }
        ChecklistCommands::Complete(options) => {
            let ids = (!options.ids.is_empty())
                .then(|| options.ids.into_iter().collect::<HashSet<_>>());
            let task = client
                .complete_checklist_items(&options.project_id, &options.task_id, ids)
                .await?;
            (task, options.json)
        }
        ChecklistCommands::Delete(options) => {
            let task = client
                .delete_checklist_items(&options.project_id, &options.task_id, options.id)
                .await?;
            (task, options.json)
        }
    };

    if json {
        return print_json(&task);
    }
    display_items(&task.items);
    Ok(())
}

pub(crate) fn display_items(items: &[ChecklistItem]) {
    if items.is_empty() {
        println!("No checklist items.");
        return;
    }

    let mut table = new_table();
    for item in items {
        let mark = if item.is_completed() {
            "[x]".green()
        } else {
            "[ ]".bright_black()
        };
        table.add_row(prettytable::row![
            mark,
            item.title.bright_white(),
            item.id.as_deref().unwrap_or("").bright_black(),
        ]);
    }
    table.printstd();
}
