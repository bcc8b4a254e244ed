use taskdeck_client::{LoginPayload, RegisterPayload};
use taskdeck_state::Toast;

use crate::cli::CredentialsArgs;
use crate::client::{CliContext, CliError, CliResult};
use crate::output::render_user;

pub(crate) async fn handle_register(ctx: &CliContext, args: CredentialsArgs) -> CliResult<()> {
    let username = require_username(&args.username)?;
    let password = resolve_password(args.password)?;

    let user = ctx
        .client()
        .register_user(&RegisterPayload {
            username: username.clone(),
            password,
        })
        .await?;
    ctx.state().notify(Toast::success(format!(
        "Account created for {username}; run `taskdeck login` to sign in"
    )));
    user.map_or(Ok(()), |user| render_user(&user, ctx.output))
}

pub(crate) async fn handle_login(ctx: &CliContext, args: CredentialsArgs) -> CliResult<()> {
    let username = require_username(&args.username)?;
    let password = resolve_password(args.password)?;

    let user = ctx
        .session
        .login(&LoginPayload { username, password })
        .await?;
    render_user(&user, ctx.output)
}

pub(crate) async fn handle_logout(ctx: &CliContext) -> CliResult<()> {
    ctx.session.logout().await?;
    ctx.state().notify(Toast::success("Signed out"));
    Ok(())
}

pub(crate) async fn handle_me(ctx: &CliContext) -> CliResult<()> {
    let user = ctx
        .session
        .restore()
        .await?
        .ok_or_else(|| CliError::validation("not signed in; run `taskdeck login` first"))?;
    render_user(&user, ctx.output)
}

fn require_username(raw: &str) -> CliResult<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(CliError::validation("username must not be empty"));
    }
    Ok(trimmed.to_string())
}

fn resolve_password(provided: Option<String>) -> CliResult<String> {
    let password = match provided {
        Some(password) => password,
        None => rpassword::prompt_password("Password: ")
            .map_err(|err| CliError::failure(anyhow::anyhow!("failed to read password: {err}")))?,
    };
    if password.is_empty() {
        return Err(CliError::validation("password must not be empty"));
    }
    Ok(password)
}
