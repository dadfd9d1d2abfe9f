use apiwrap_core::ticktick::{priority_label, status_label, NewTask, Task, TaskUpdate};
use colored::Colorize;

use super::client::TickTick;
use crate::prelude::{println, *};

#[derive(Debug, clap::Subcommand)]
pub enum TaskCommands {
    /// List the tasks of a project
    #[clap(name = "list")]
    List(ProjectOptions),

    /// Show one task
    #[clap(name = "get")]
    Get(TaskOptions),

    /// List the direct subtasks of a task
    #[clap(name = "children")]
    Children(TaskOptions),

    /// Create a task
    #[clap(name = "create")]
    Create(CreateOptions),

    /// Update a task
    #[clap(name = "update")]
    Update(UpdateOptions),

    /// Delete a task
    #[clap(name = "delete")]
    Delete(TaskOptions),

    /// Complete a task
    #[clap(name = "complete")]
    Complete(TaskOptions),

    /// Mark a task and its open subtasks as "won't do"
    #[clap(name = "wont-do")]
    WontDo(TaskOptions),
}

#[derive(Debug, clap::Args, Clone)]
pub struct ProjectOptions {
    pub project_id: String,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, clap::Args, Clone)]
pub struct TaskOptions {
    pub project_id: String,
    pub task_id: String,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, clap::Args, Clone)]
pub struct CreateOptions {
    pub title: String,

    /// Project to create the task in (defaults to the inbox)
    #[arg(long)]
    pub project_id: Option<String>,

    /// none, low, medium, high, or a raw wire value
    #[arg(long, default_value = "none")]
    pub priority: String,

    #[arg(long)]
    pub content: Option<String>,

    /// Checklist description
    #[arg(long)]
    pub desc: Option<String>,

    #[arg(long)]
    pub all_day: bool,

    /// e.g. 2024-01-31T09:00:00+0000
    #[arg(long)]
    pub start_date: Option<String>,

    #[arg(long)]
    pub due_date: Option<String>,

    #[arg(long)]
    pub time_zone: Option<String>,

    /// Reminder triggers, e.g. TRIGGER:P0DT9H0M0S
    #[arg(long = "reminder")]
    pub reminders: Vec<String>,

    /// Recurrence rule, e.g. RRULE:FREQ=DAILY;INTERVAL=1
    #[arg(long)]
    pub repeat_flag: Option<String>,

    #[arg(long)]
    pub sort_order: Option<i64>,

    /// Create as a subtask of this task
    #[arg(long)]
    pub parent_id: Option<String>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, clap::Args, Clone)]
pub struct UpdateOptions {
    pub project_id: String,
    pub task_id: String,

    #[arg(long)]
    pub title: Option<String>,

    #[arg(long)]
    pub content: Option<String>,

    #[arg(long)]
    pub desc: Option<String>,

    #[arg(long)]
    pub all_day: Option<bool>,

    #[arg(long)]
    pub start_date: Option<String>,

    #[arg(long)]
    pub due_date: Option<String>,

    #[arg(long)]
    pub time_zone: Option<String>,

    /// wont_do, normal, completed, or a raw wire value
    #[arg(long)]
    pub status: Option<String>,

    /// none, low, medium, high, or a raw wire value
    #[arg(long)]
    pub priority: Option<String>,

    #[arg(long = "reminder")]
    pub reminders: Option<Vec<String>>,

    #[arg(long)]
    pub repeat_flag: Option<String>,

    #[arg(long)]
    pub sort_order: Option<i64>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

pub async fn handler(cmd: TaskCommands) -> Result<()> {
    let client = TickTick::from_env()?;

    match cmd {
        TaskCommands::List(options) => {
            let tasks = client.get_tasks(&options.project_id).await?;
            if options.json {
                return print_json(&tasks);
            }
            display_tasks(&tasks);
        }
        TaskCommands::Get(options) => {
            let task = client.get_task(&options.project_id, &options.task_id).await?;
            if options.json {
                return print_json(&task);
            }
            display_task(&task);
        }
        TaskCommands::Children(options) => {
            let tasks = client
                .get_child_tasks(&options.project_id, &options.task_id)
                .await?;
            if options.json {
                return print_json(&tasks);
            }
            display_tasks(&tasks);
        }
        TaskCommands::Create(options) => {
            let json = options.json;
            let task = client.create_task(&new_task(options)).await?;
            if json {
                return print_json(&task);
            }
            display_task(&task);
        }
        TaskCommands::Update(options) => {
            let json = options.json;
            let task = client.update_task(&task_update(options)).await?;
            if json {
                return print_json(&task);
            }
            display_task(&task);
        }
        TaskCommands::Delete(options) => {
            let response = client
                .delete_task(&options.project_id, &options.task_id)
                .await?;
            if options.json {
                return print_json(&response);
            }
            println!("{} {}", "Deleted task".green(), options.task_id.bold());
        }
        TaskCommands::Complete(options) => {
            let response = client
                .complete_task(&options.project_id, &options.task_id)
                .await?;
            if options.json {
                return print_json(&response);
            }
            println!("{} {}", "Completed task".green(), options.task_id.bold());
        }
        TaskCommands::WontDo(options) => {
            let task = client
                .wont_do_task(&options.project_id, &options.task_id)
                .await?;
            if options.json {
                return print_json(&task);
            }
            display_task(&task);
        }
    }

    Ok(())
}

fn new_task(options: CreateOptions) -> NewTask {
    NewTask {
        title: options.title,
        priority: options.priority,
        project_id: options.project_id,
        content: options.content,
        desc: options.desc,
        is_all_day: options.all_day,
        start_date: options.start_date,
        due_date: options.due_date,
        time_zone: options.time_zone,
        reminders: options.reminders,
        sort_order: options.sort_order,
        repeat_flag: options.repeat_flag,
        parent_id: options.parent_id,
    }
}

fn task_update(options: UpdateOptions) -> TaskUpdate {
    TaskUpdate {
        title: options.title,
        content: options.content,
        desc: options.desc,
        is_all_day: options.all_day,
        start_date: options.start_date,
        due_date: options.due_date,
        time_zone: options.time_zone,
        status: options.status,
        reminders: options.reminders,
        repeat_flag: options.repeat_flag,
        sort_order: options.sort_order,
        priority: options.priority,
        ..TaskUpdate::new(options.project_id, options.task_id)
    }
}

pub(crate) fn display_tasks(tasks: &[Task]) {
    if tasks.is_empty() {
        println!("No tasks found.");
        return;
    }

    let mut table = new_table();
    table.add_row(prettytable::row![
        "ID".bold().cyan(),
        "Title".bold().cyan(),
        "Priority".bold().cyan(),
        "Status".bold().cyan(),
        "Parent".bold().cyan(),
        "Due".bold().cyan(),
    ]);
    for task in tasks {
        table.add_row(prettytable::row![
            task.id.as_deref().unwrap_or("-").bright_black(),
            task.title.bright_white(),
            priority_label(task.priority).yellow(),
            status_label(task.status).green(),
            task.parent_id.as_deref().unwrap_or("").bright_black(),
            task.due_date.as_deref().unwrap_or(""),
        ]);
    }
    table.printstd();
}

pub(crate) fn display_task(task: &Task) {
    println!(
        "\n{} - {}\n",
        task.id.as_deref().unwrap_or("-").bold().cyan(),
        task.title.bright_white()
    );

    let mut table = new_table();
    table.add_row(prettytable::row![
        "Status".bold().cyan(),
        status_label(task.status).green().to_string()
    ]);
    table.add_row(prettytable::row![
        "Priority".bold().cyan(),
        priority_label(task.priority).bright_yellow().to_string()
    ]);
    if let Some(project_id) = &task.project_id {
        table.add_row(prettytable::row!["Project".bold().cyan(), project_id]);
    }
    if let Some(parent_id) = &task.parent_id {
        table.add_row(prettytable::row!["Parent".bold().cyan(), parent_id]);
    }
    if let Some(due_date) = &task.due_date {
        table.add_row(prettytable::row![
            "Due Date".bold().cyan(),
            due_date.yellow().to_string()
        ]);
    }
    table.printstd();

    if let Some(content) = task.content.as_deref().filter(|c| !c.is_empty()) {
        println!("\n{}:", "Content".bold().cyan());
        println!("{}", content);
    }

    if !task.items.is_empty() {
        println!("\n{}", "Checklist:".bold().cyan());
        super::checklist::display_items(&task.items);
    }
}
