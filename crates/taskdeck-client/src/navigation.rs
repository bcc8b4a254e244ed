//! Navigation collaborator invoked when the session ends.

/// Route of the login view.
pub const LOGIN_ROUTE: &str = "/login";

/// Options for a navigation request.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct NavigateOptions {
    /// Replace the current history entry instead of pushing a new one.
    pub replace: bool,
}

impl NavigateOptions {
    /// History-replacing navigation.
    #[must_use]
    pub const fn replace() -> Self {
        Self { replace: true }
    }
}

/// Router owned by the view layer.
pub trait Navigator: Send + Sync {
    /// Move to `route`.
    fn navigate(&self, route: &str, options: NavigateOptions);
}

/// Navigator that only records the request in the log.
#[derive(Clone, Copy, Debug, Default)]
pub struct LogNavigator;

impl Navigator for LogNavigator {
    fn navigate(&self, route: &str, options: NavigateOptions) {
        tracing::info!(route, replace = options.replace, "navigation requested");
    }
}
