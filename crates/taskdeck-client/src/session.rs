//! Session lifecycle built on the auth service calls.

use taskdeck_state::{AppState, Toast, User};
use tracing::info;

use crate::auth::AuthContext;
use crate::client::ApiClient;
use crate::error::ApiResult;
use crate::models::LoginPayload;
use crate::storage::{ACCESS_TOKEN_KEY, persist_tokens};

/// Couples an [`ApiClient`] with the state it signs in and out.
#[derive(Clone, Debug)]
pub struct Session {
    client: ApiClient,
    context: AuthContext,
}

impl Session {
    /// `client` should be built with the same `context`.
    #[must_use]
    pub const fn new(client: ApiClient, context: AuthContext) -> Self {
        Self { client, context }
    }

    /// Underlying client, for resource calls.
    #[must_use]
    pub const fn client(&self) -> &ApiClient {
        &self.client
    }

    /// Shared state containers.
    #[must_use]
    pub const fn state(&self) -> &AppState {
        self.context.state()
    }

    /// Log in, persist the token triple, and load the profile into `user`.
    ///
    /// # Errors
    ///
    /// Propagates login, storage, and profile failures. Tokens stay persisted
    /// when only the profile fetch fails.
    pub async fn login(&self, payload: &LoginPayload) -> ApiResult<User> {
        let tokens = self.client.login_user(payload).await?;
        persist_tokens(self.context.store(), &tokens)?;
        self.state().token.set(Some(tokens.token));

        let user = self.client.get_user().await?;
        self.state().user.set(Some(user.clone()));
        info!(username = ?user.username, "signed in");
        self.state().notify(Toast::success(format!(
            "Welcome, {}",
            user.username.as_deref().unwrap_or(&payload.username)
        )));
        Ok(user)
    }

    /// Log out on the server, then clear storage and reset `user` and `token`.
    ///
    /// Local state is left untouched when the server call fails.
    ///
    /// # Errors
    ///
    /// Propagates logout and storage failures.
    pub async fn logout(&self) -> ApiResult<()> {
        self.client.logout_user().await?;
        self.context.store().clear()?;
        self.state().sign_out();
        info!("signed out");
        Ok(())
    }

    /// Reload the profile when an access token is stored.
    ///
    /// Returns `None` without a network call when nothing is stored.
    ///
    /// # Errors
    ///
    /// Propagates profile failures; a 401/403 also tears the session down.
    pub async fn restore(&self) -> ApiResult<Option<User>> {
        let Some(token) = self
            .context
            .store()
            .get(ACCESS_TOKEN_KEY)
            .filter(|token| !token.is_empty())
        else {
            return Ok(None);
        };
        self.state().token.set(Some(token));

        let user = self.client.get_user().await?;
        self.state().user.set(Some(user.clone()));
        Ok(Some(user))
    }
}
