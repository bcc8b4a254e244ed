//! Argument parsing and command dispatch.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use taskdeck_client::config::{DEFAULT_TIMEOUT_SECS, parse_base_url};
use taskdeck_client::{ConfigError, SortOrder};
use taskdeck_telemetry::{LoggingConfig, command_span, init_logging, log_format_from_env};
use tracing::Instrument;
use url::Url;

use crate::client::{CliContext, CliResult};
use crate::commands::auth::{handle_login, handle_logout, handle_me, handle_register};
use crate::commands::tasks::{
    handle_task_add, handle_task_list, handle_task_remove, handle_task_set_completed,
};

/// Parses CLI arguments, executes the requested command, and reports the
/// outcome. Returns the process exit code.
pub async fn run() -> i32 {
    let cli = Cli::parse();
    let logging = LoggingConfig {
        format: log_format_from_env(|key| std::env::var(key).ok()),
        build_sha: option_env!("TASKDECK_BUILD_SHA").unwrap_or("dev"),
        ..LoggingConfig::default()
    };
    if let Err(err) = init_logging(&logging) {
        eprintln!("warning: {err}");
    }

    let span = command_span(cli.command.label());
    match execute(cli).instrument(span).await {
        Ok(()) => 0,
        Err(err) => {
            eprintln!("error: {}", err.display_message());
            err.exit_code()
        }
    }
}

async fn execute(cli: Cli) -> CliResult<()> {
    let ctx = CliContext::from_cli(&cli)?;
    dispatch(&ctx, cli.command).await
}

pub(crate) async fn dispatch(ctx: &CliContext, command: Command) -> CliResult<()> {
    match command {
        Command::Register(args) => handle_register(ctx, args).await,
        Command::Login(args) => handle_login(ctx, args).await,
        Command::Logout => handle_logout(ctx).await,
        Command::Me => handle_me(ctx).await,
        Command::Tasks(tasks) => match tasks {
            TasksCommand::List(args) => handle_task_list(ctx, args).await,
            TasksCommand::Add(args) => handle_task_add(ctx, args).await,
            TasksCommand::Done(args) => handle_task_set_completed(ctx, args, true).await,
            TasksCommand::Undo(args) => handle_task_set_completed(ctx, args, false).await,
            TasksCommand::Rm(args) => handle_task_remove(ctx, args).await,
        },
    }
}

#[derive(Parser)]
#[command(name = "taskdeck", about = "Command-line client for the Taskdeck task tracker")]
pub(crate) struct Cli {
    #[arg(long, global = true, env = "TASKDECK_API_BASE_URL", value_parser = parse_url)]
    pub(crate) api_url: Url,
    #[arg(
        long,
        global = true,
        env = "TASKDECK_HTTP_TIMEOUT_SECS",
        default_value_t = DEFAULT_TIMEOUT_SECS,
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    pub(crate) timeout: u64,
    #[arg(
        long,
        global = true,
        env = "TASKDECK_SESSION_FILE",
        help = "Where credentials are kept between invocations"
    )]
    pub(crate) session_file: Option<PathBuf>,
    #[arg(
        long = "output",
        alias = "format",
        global = true,
        value_enum,
        default_value_t = OutputFormat::Table,
        help = "Select output format for commands that render structured data"
    )]
    pub(crate) output: OutputFormat,
    #[command(subcommand)]
    pub(crate) command: Command,
}

#[derive(Subcommand)]
pub(crate) enum Command {
    /// Create an account.
    Register(CredentialsArgs),
    /// Sign in and store the session.
    Login(CredentialsArgs),
    /// Sign out and forget the stored session.
    Logout,
    /// Show the signed-in user.
    Me,
    /// Manage tasks.
    #[command(subcommand)]
    Tasks(TasksCommand),
}

impl Command {
    pub(crate) const fn label(&self) -> &'static str {
        match self {
            Self::Register(_) => "register",
            Self::Login(_) => "login",
            Self::Logout => "logout",
            Self::Me => "me",
            Self::Tasks(TasksCommand::List(_)) => "tasks list",
            Self::Tasks(TasksCommand::Add(_)) => "tasks add",
            Self::Tasks(TasksCommand::Done(_)) => "tasks done",
            Self::Tasks(TasksCommand::Undo(_)) => "tasks undo",
            Self::Tasks(TasksCommand::Rm(_)) => "tasks rm",
        }
    }
}

#[derive(Subcommand)]
pub(crate) enum TasksCommand {
    /// List pending or completed tasks.
    List(TaskListArgs),
    /// Create a task.
    Add(TaskAddArgs),
    /// Mark a task as completed.
    Done(TaskIdArgs),
    /// Mark a task as pending again.
    Undo(TaskIdArgs),
    /// Delete a task.
    Rm(TaskIdArgs),
}

#[derive(Args)]
pub(crate) struct CredentialsArgs {
    #[arg(long, short)]
    pub(crate) username: String,
    #[arg(
        long,
        env = "TASKDECK_PASSWORD",
        hide_env_values = true,
        help = "Password (prompted when omitted)"
    )]
    pub(crate) password: Option<String>,
}

#[derive(Args)]
pub(crate) struct TaskListArgs {
    #[arg(long, help = "Show completed tasks instead of pending ones")]
    pub(crate) completed: bool,
    #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u32).range(1..))]
    pub(crate) page: u32,
    #[arg(long, default_value_t = 10, value_parser = clap::value_parser!(u32).range(1..))]
    pub(crate) limit: u32,
    #[arg(long, value_enum, default_value_t = SortArg::Desc, help = "Order by last update")]
    pub(crate) sort: SortArg,
}

#[derive(Args)]
pub(crate) struct TaskAddArgs {
    #[arg(required = true, num_args = 1.., help = "Task description")]
    pub(crate) description: Vec<String>,
}

#[derive(Args)]
pub(crate) struct TaskIdArgs {
    #[arg(help = "Task identifier")]
    pub(crate) id: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub(crate) enum SortArg {
    Asc,
    Desc,
}

impl From<SortArg> for SortOrder {
    fn from(value: SortArg) -> Self {
        match value {
            SortArg::Asc => Self::Asc,
            SortArg::Desc => Self::Desc,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub(crate) enum OutputFormat {
    Table,
    Json,
}

fn parse_url(input: &str) -> Result<Url, String> {
    parse_base_url(input).map_err(|err| match err {
        ConfigError::Invalid { reason, .. } => format!("invalid API URL '{input}': {reason}"),
        other => format!("invalid API URL '{input}': {other}"),
    })
}
