//! Session wiring, error types, and terminal collaborators for the CLI.

use std::fmt::{self, Display, Formatter};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::anyhow;
use serde_json::Value;
use taskdeck_client::storage::ACCESS_TOKEN_KEY;
use taskdeck_client::{
    ApiClient, ApiError, AuthContext, AuthStrategy, ClientConfig, FileStore, KeyValueStore,
    LOGIN_ROUTE, NavigateOptions, Navigator, Session,
};
use taskdeck_state::{AppState, Subscription};

use crate::cli::{Cli, OutputFormat};

pub(crate) const SESSION_DIR_NAME: &str = ".taskdeck";
pub(crate) const SESSION_FILE_NAME: &str = "session.json";

/// CLI-level error type to distinguish validation from operational failures.
#[derive(Debug)]
pub(crate) enum CliError {
    Validation(String),
    Failure(anyhow::Error),
}

/// Convenience alias for functions returning a `CliError`.
pub(crate) type CliResult<T> = Result<T, CliError>;

impl CliError {
    pub(crate) fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub(crate) fn failure(error: impl Into<anyhow::Error>) -> Self {
        Self::Failure(error.into())
    }

    pub(crate) const fn exit_code(&self) -> i32 {
        match self {
            Self::Validation(_) => 2,
            Self::Failure(_) => 3,
        }
    }

    pub(crate) fn display_message(&self) -> String {
        match self {
            Self::Validation(message) => message.clone(),
            Self::Failure(error) => format!("{error:#}"),
        }
    }
}

impl Display for CliError {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        formatter.write_str("cli error")
    }
}

impl std::error::Error for CliError {}

impl From<ApiError> for CliError {
    fn from(err: ApiError) -> Self {
        classify_api_error(err)
    }
}

/// Everything a command handler needs.
pub(crate) struct CliContext {
    pub(crate) session: Session,
    pub(crate) output: OutputFormat,
    _toasts: Subscription,
}

impl CliContext {
    pub(crate) fn from_cli(cli: &Cli) -> CliResult<Self> {
        let path = cli
            .session_file
            .clone()
            .unwrap_or_else(default_session_file);
        let config = ClientConfig::new(cli.api_url.clone())
            .with_timeout(Duration::from_secs(cli.timeout));
        Self::open(config, &path, cli.output)
    }

    /// Wire the session against the credential file at `session_file`.
    pub(crate) fn open(
        config: ClientConfig,
        session_file: &Path,
        output: OutputFormat,
    ) -> CliResult<Self> {
        let store = FileStore::open(session_file).map_err(|err| {
            CliError::failure(anyhow::Error::new(err).context(format!(
                "failed to open session file '{}'",
                session_file.display()
            )))
        })?;
        let store: Arc<dyn KeyValueStore> = Arc::new(store);

        let state = AppState::new(store.get(ACCESS_TOKEN_KEY));
        let toasts = state.toast.subscribe(|toast| {
            if let Some(toast) = toast {
                eprintln!("[{}] {}", toast.severity.as_str(), toast.message);
            }
        });

        let context = AuthContext::new(store, state, Arc::new(TerminalNavigator));
        let client = ApiClient::builder(config)
            .authenticate(context.clone(), AuthStrategy::Refreshing)
            .build()
            .map_err(|err| {
                CliError::failure(anyhow::Error::new(err).context("failed to build HTTP client"))
            })?;

        Ok(Self {
            session: Session::new(client, context),
            output,
            _toasts: toasts,
        })
    }

    pub(crate) const fn client(&self) -> &ApiClient {
        self.session.client()
    }

    pub(crate) const fn state(&self) -> &AppState {
        self.session.state()
    }
}

/// Turns the login redirect into a terminal hint.
#[derive(Clone, Copy, Debug, Default)]
pub(crate) struct TerminalNavigator;

impl Navigator for TerminalNavigator {
    fn navigate(&self, route: &str, _options: NavigateOptions) {
        if route == LOGIN_ROUTE {
            eprintln!("session expired; run `taskdeck login` to sign in again");
        } else {
            tracing::debug!(route, "ignoring navigation request");
        }
    }
}

fn default_session_file() -> PathBuf {
    std::env::var_os("HOME")
        .map_or_else(
            || PathBuf::from(SESSION_DIR_NAME),
            |home| PathBuf::from(home).join(SESSION_DIR_NAME),
        )
        .join(SESSION_FILE_NAME)
}

/// Classify an API failure into a CLI error.
pub(crate) fn classify_api_error(err: ApiError) -> CliError {
    if let ApiError::Status { status, body, .. } = &err {
        let status = *status;
        let message = server_message(body);
        if status.is_client_error() && !err.is_auth_failure() {
            return CliError::validation(
                message.unwrap_or_else(|| format!("request rejected with status {status}")),
            );
        }
        let detail = message.map_or_else(
            || format!("request failed with status {status}"),
            |message| format!("{message} (status {status})"),
        );
        return CliError::failure(anyhow!(detail));
    }
    CliError::failure(err)
}

fn server_message(body: &str) -> Option<String> {
    let parsed = serde_json::from_str::<Value>(body).ok();
    let field = parsed.as_ref().and_then(|value| {
        ["message", "error"]
            .iter()
            .find_map(|key| value.get(*key).and_then(Value::as_str))
            .map(str::to_string)
    });
    field.or_else(|| {
        let trimmed = body.trim();
        (!trimmed.is_empty() && parsed.is_none()).then(|| trimmed.to_string())
    })
}
