use taskdeck_client::{CancellationToken, TaskFilter, TaskPayload, TaskQuery};
use taskdeck_state::Toast;

use crate::cli::{TaskAddArgs, TaskIdArgs, TaskListArgs};
use crate::client::{CliContext, CliError, CliResult};
use crate::output::{render_task, render_tasks};

pub(crate) async fn handle_task_list(ctx: &CliContext, args: TaskListArgs) -> CliResult<()> {
    let filter = if args.completed {
        TaskFilter::Completed
    } else {
        TaskFilter::Pending
    };
    let query = TaskQuery::for_filter(filter)
        .page(args.page, args.limit)
        .sorted(args.sort.into());

    let cancel = CancellationToken::new();
    let interrupt = cancel.clone();
    let watcher = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            interrupt.cancel();
        }
    });
    let fetched = ctx.client().fetch_tasks(&query, Some(&cancel)).await;
    watcher.abort();

    render_tasks(&fetched?, ctx.output)
}

pub(crate) async fn handle_task_add(ctx: &CliContext, args: TaskAddArgs) -> CliResult<()> {
    let description = args.description.join(" ").trim().to_string();
    if description.is_empty() {
        return Err(CliError::validation("description must not be empty"));
    }

    let task = ctx.client().add_task(&TaskPayload { description }).await?;
    ctx.state().notify(Toast::success("Task added"));
    task.map_or(Ok(()), |task| render_task(&task, ctx.output))
}

pub(crate) async fn handle_task_set_completed(
    ctx: &CliContext,
    args: TaskIdArgs,
    completed: bool,
) -> CliResult<()> {
    let id = require_id(&args.id)?;
    let task = ctx.client().edit_task(id, completed).await?;
    let message = if completed {
        "Task completed"
    } else {
        "Task moved back to pending"
    };
    ctx.state().notify(Toast::success(message));
    task.map_or(Ok(()), |task| render_task(&task, ctx.output))
}

pub(crate) async fn handle_task_remove(ctx: &CliContext, args: TaskIdArgs) -> CliResult<()> {
    let id = require_id(&args.id)?;
    ctx.client().remove_task(id).await?;
    ctx.state().notify(Toast::success("Task removed"));
    Ok(())
}

fn require_id(raw: &str) -> CliResult<&str> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(CliError::validation("task id must not be empty"));
    }
    Ok(trimmed)
}
