//! Authentication middlewares: bearer injection, token regeneration, and
//! session teardown on auth failures.
//!
//! # Design
//! - [`AuthContext`] owns the single teardown path (clear storage, reset state, go to login).
//! - Token regeneration is single-flight: concurrent requests that observe an
//!   expired token wait on one regeneration call and reuse its result.
//! - A failed regeneration tears the session down and fails the original request.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use reqwest::{Method, StatusCode};
use taskdeck_state::AppState;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::client::read_response;
use crate::config::ClientConfig;
use crate::error::{ApiError, ApiResult};
use crate::middleware::Middleware;
use crate::models::AuthTokens;
use crate::navigation::{LOGIN_ROUTE, NavigateOptions, Navigator};
use crate::request::{ApiRequest, ApiResponse};
use crate::services::{LOGIN_PATH, REGENERATE_TOKEN_PATH};
use crate::storage::{ACCESS_TOKEN_KEY, KeyValueStore, StoredTokens, persist_tokens};

/// Collaborators touched when a session starts or ends.
#[derive(Clone)]
pub struct AuthContext {
    store: Arc<dyn KeyValueStore>,
    state: AppState,
    navigator: Arc<dyn Navigator>,
}

impl AuthContext {
    /// Bundle the credential store, shared state, and navigator.
    pub fn new(
        store: Arc<dyn KeyValueStore>,
        state: AppState,
        navigator: Arc<dyn Navigator>,
    ) -> Self {
        Self {
            store,
            state,
            navigator,
        }
    }

    /// Credential store.
    #[must_use]
    pub fn store(&self) -> &dyn KeyValueStore {
        self.store.as_ref()
    }

    pub(crate) fn store_handle(&self) -> Arc<dyn KeyValueStore> {
        Arc::clone(&self.store)
    }

    /// Shared state containers.
    #[must_use]
    pub const fn state(&self) -> &AppState {
        &self.state
    }

    /// End the session: clear storage, reset `user` and `token`, and replace
    /// the current view with the login route.
    pub fn invalidate(&self, reason: &str) {
        warn!(reason, "invalidating session");
        if let Err(err) = self.store.clear() {
            warn!(error = %err, "failed to clear credential storage");
        }
        self.state.sign_out();
        self.navigator
            .navigate(LOGIN_ROUTE, NavigateOptions::replace());
    }
}

impl fmt::Debug for AuthContext {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("AuthContext")
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

/// Attaches the stored access token without ever regenerating it.
#[derive(Clone)]
pub struct StoredBearerAuth {
    store: Arc<dyn KeyValueStore>,
}

impl StoredBearerAuth {
    /// Read tokens from `store`.
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl Middleware for StoredBearerAuth {
    async fn on_request(&self, request: &mut ApiRequest) -> ApiResult<()> {
        match self
            .store
            .get(ACCESS_TOKEN_KEY)
            .filter(|token| !token.is_empty())
        {
            Some(token) => request.set_bearer(&token),
            None => Ok(()),
        }
    }
}

/// Attaches the access token, regenerating it first when it has expired.
pub struct RefreshingBearerAuth {
    context: AuthContext,
    http: reqwest::Client,
    config: ClientConfig,
    gate: Mutex<()>,
}

impl RefreshingBearerAuth {
    /// Regenerate through `http` against the base URL in `config`.
    #[must_use]
    pub fn new(context: AuthContext, http: reqwest::Client, config: ClientConfig) -> Self {
        Self {
            context,
            http,
            config,
            gate: Mutex::new(()),
        }
    }

    async fn refresh(&self) -> ApiResult<String> {
        let _gate = self.gate.lock().await;

        let current = StoredTokens::load(self.context.store());
        let Some(access) = current.access_token.clone() else {
            return Err(ApiError::SessionExpired);
        };
        if !current.needs_refresh(epoch_now()) {
            debug!("access token was regenerated by a concurrent request");
            return Ok(access);
        }

        let outcome = match self.regenerate(&current).await {
            Ok(fresh) => self.store_fresh(fresh),
            Err(err) => Err(err),
        };
        match outcome {
            Ok(Some(token)) => {
                info!("access token regenerated");
                Ok(token)
            }
            Ok(None) => {
                warn!("token regeneration answered without new credentials");
                Ok(access)
            }
            Err(err) => {
                warn!(error = %err, "token regeneration failed");
                self.context.invalidate("access token refresh failed");
                Err(ApiError::TokenRefresh {
                    source: Box::new(err),
                })
            }
        }
    }

    async fn regenerate(&self, current: &StoredTokens) -> ApiResult<Option<AuthTokens>> {
        let (Some(access), Some(refresh)) = (
            current.access_token.as_deref(),
            current.refresh_token.as_deref(),
        ) else {
            return Err(ApiError::SessionExpired);
        };
        let query = vec![
            ("refreshToken".to_string(), refresh.to_string()),
            ("token".to_string(), access.to_string()),
        ];
        let url = self
            .config
            .endpoint(REGENERATE_TOKEN_PATH, &query)
            .map_err(|err| ApiError::InvalidRequest {
                reason: err.to_string(),
            })?;

        let raw = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|source| ApiError::Transport {
                path: REGENERATE_TOKEN_PATH.to_string(),
                source,
            })?;
        let response = read_response(&Method::GET, REGENERATE_TOKEN_PATH, raw).await?;
        if response.status == StatusCode::OK {
            response.json().map(Some)
        } else {
            Ok(None)
        }
    }

    fn store_fresh(&self, fresh: Option<AuthTokens>) -> ApiResult<Option<String>> {
        let Some(tokens) = fresh else {
            return Ok(None);
        };
        persist_tokens(self.context.store(), &tokens)?;
        self.context.state().token.set(Some(tokens.token.clone()));
        Ok(Some(tokens.token))
    }
}

#[async_trait]
impl Middleware for RefreshingBearerAuth {
    async fn on_request(&self, request: &mut ApiRequest) -> ApiResult<()> {
        let tokens = StoredTokens::load(self.context.store());
        let Some(stored) = tokens.access_token.clone().filter(|_| tokens.has_session()) else {
            return Ok(());
        };
        let access = if tokens.needs_refresh(epoch_now()) {
            self.refresh().await?
        } else {
            stored
        };
        request.set_bearer(&access)
    }
}

impl fmt::Debug for RefreshingBearerAuth {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("RefreshingBearerAuth")
            .field("base_url", &self.config.base_url.as_str())
            .finish_non_exhaustive()
    }
}

/// Tears the session down when the server rejects credentials outside the login call.
#[derive(Clone, Debug)]
pub struct AuthFailureGuard {
    context: AuthContext,
}

impl AuthFailureGuard {
    /// Guard acting on `context`.
    #[must_use]
    pub const fn new(context: AuthContext) -> Self {
        Self { context }
    }
}

#[async_trait]
impl Middleware for AuthFailureGuard {
    async fn on_response(&self, request: &ApiRequest, outcome: Result<&ApiResponse, &ApiError>) {
        let Err(error) = outcome else {
            return;
        };
        if error.is_auth_failure() && request.path != LOGIN_PATH {
            self.context.invalidate("server rejected credentials");
        }
    }
}

fn epoch_now() -> i64 {
    Utc::now().timestamp()
}
