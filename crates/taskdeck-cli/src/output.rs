//! Output renderers and formatting helpers for CLI commands.

use std::fmt::Write as _;

use anyhow::anyhow;
use serde::Serialize;
use taskdeck_client::Task;
use taskdeck_state::User;

use crate::cli::OutputFormat;
use crate::client::{CliError, CliResult};

pub(crate) fn render_tasks(tasks: &[Task], format: OutputFormat) -> CliResult<()> {
    match format {
        OutputFormat::Json => print_json(tasks),
        OutputFormat::Table => {
            print!("{}", format_task_table(tasks));
            Ok(())
        }
    }
}

pub(crate) fn render_task(task: &Task, format: OutputFormat) -> CliResult<()> {
    match format {
        OutputFormat::Json => print_json(task),
        OutputFormat::Table => {
            println!("id: {}", task.id);
            println!("description: {}", task.description);
            println!("completed: {}", task.completed);
            Ok(())
        }
    }
}

pub(crate) fn render_user(user: &User, format: OutputFormat) -> CliResult<()> {
    match format {
        OutputFormat::Json => print_json(user),
        OutputFormat::Table => {
            print!("{}", format_user(user));
            Ok(())
        }
    }
}

pub(crate) fn format_task_table(tasks: &[Task]) -> String {
    if tasks.is_empty() {
        return "no tasks\n".to_string();
    }
    let mut text = format!("{:<24} {:<4} DESCRIPTION\n", "ID", "DONE");
    for task in tasks {
        let done = if task.completed { "[x]" } else { "[ ]" };
        let _ = writeln!(text, "{:<24} {:<4} {}", task.id, done, task.description);
    }
    text
}

pub(crate) fn format_user(user: &User) -> String {
    let mut text = String::new();
    if let Some(id) = &user.id {
        let _ = writeln!(text, "id: {id}");
    }
    let _ = writeln!(
        text,
        "username: {}",
        user.username.as_deref().unwrap_or("<unknown>")
    );
    let mut keys: Vec<_> = user.attributes.keys().collect();
    keys.sort();
    for key in keys {
        let value = &user.attributes[key];
        match value.as_str() {
            Some(text_value) => {
                let _ = writeln!(text, "{key}: {text_value}");
            }
            None => {
                let _ = writeln!(text, "{key}: {value}");
            }
        }
    }
    text
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> CliResult<()> {
    let text = serde_json::to_string_pretty(value)
        .map_err(|err| CliError::failure(anyhow!("failed to format JSON: {err}")))?;
    println!("{text}");
    Ok(())
}
