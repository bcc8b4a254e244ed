//! HTTP client that runs every call through the middleware chain.

use std::fmt;
use std::sync::Arc;

use reqwest::Method;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::auth::{AuthContext, AuthFailureGuard, RefreshingBearerAuth, StoredBearerAuth};
use crate::config::ClientConfig;
use crate::error::{ApiError, ApiResult, ConfigError, ConfigResult};
use crate::middleware::{Middleware, RequestId};
use crate::request::{ApiRequest, ApiResponse};

/// How the bearer token is obtained for outgoing requests.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum AuthStrategy {
    /// Regenerate an expired access token before sending.
    #[default]
    Refreshing,
    /// Attach whatever access token is stored.
    StoredToken,
}

/// Cheap-to-clone handle on a configured API client.
#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<Inner>,
}

struct Inner {
    http: reqwest::Client,
    config: ClientConfig,
    middleware: Vec<Arc<dyn Middleware>>,
}

impl ApiClient {
    /// Start building a client for `config`.
    #[must_use]
    pub fn builder(config: ClientConfig) -> ApiClientBuilder {
        ApiClientBuilder {
            config,
            http: None,
            middleware: Vec::new(),
            auth: None,
        }
    }

    /// Configuration the client was built with.
    #[must_use]
    pub fn config(&self) -> &ClientConfig {
        &self.inner.config
    }

    /// Send `request` through the middleware chain.
    ///
    /// # Errors
    ///
    /// Returns the first request-hook failure, a transport failure, or
    /// [`ApiError::Status`] for non-success responses.
    pub async fn send(&self, request: ApiRequest) -> ApiResult<ApiResponse> {
        self.send_cancellable(request, None).await
    }

    /// Send `request`, aborting with [`ApiError::Cancelled`] once `cancel` fires.
    ///
    /// # Errors
    ///
    /// As [`ApiClient::send`], plus [`ApiError::Cancelled`].
    pub async fn send_cancellable(
        &self,
        mut request: ApiRequest,
        cancel: Option<&CancellationToken>,
    ) -> ApiResult<ApiResponse> {
        for middleware in &self.inner.middleware {
            middleware.on_request(&mut request).await?;
        }

        let outcome = match cancel {
            Some(token) => {
                tokio::select! {
                    biased;
                    () = token.cancelled() => Err(ApiError::Cancelled {
                        path: request.path.clone(),
                    }),
                    result = self.dispatch(&request) => result,
                }
            }
            None => self.dispatch(&request).await,
        };

        for middleware in self.inner.middleware.iter().rev() {
            middleware.on_response(&request, outcome.as_ref()).await;
        }
        outcome
    }

    async fn dispatch(&self, request: &ApiRequest) -> ApiResult<ApiResponse> {
        let url = self
            .inner
            .config
            .endpoint(&request.path, &request.query)
            .map_err(|err| ApiError::InvalidRequest {
                reason: format!("cannot build URL for {}: {err}", request.path),
            })?;

        let mut builder = self
            .inner
            .http
            .request(request.method.clone(), url)
            .headers(request.headers.clone());
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        debug!(method = %request.method, path = %request.path, "dispatching request");
        let raw = builder
            .send()
            .await
            .map_err(|source| ApiError::Transport {
                path: request.path.clone(),
                source,
            })?;
        read_response(&request.method, &request.path, raw).await
    }
}

impl fmt::Debug for ApiClient {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("ApiClient")
            .field("base_url", &self.inner.config.base_url.as_str())
            .field("middleware", &self.inner.middleware.len())
            .finish()
    }
}

/// Builder for [`ApiClient`].
pub struct ApiClientBuilder {
    config: ClientConfig,
    http: Option<reqwest::Client>,
    middleware: Vec<Arc<dyn Middleware>>,
    auth: Option<(AuthContext, AuthStrategy)>,
}

impl ApiClientBuilder {
    /// Use a preconfigured `reqwest` client instead of building one.
    #[must_use]
    pub fn http_client(mut self, http: reqwest::Client) -> Self {
        self.http = Some(http);
        self
    }

    /// Register a middleware. Request hooks run in registration order.
    #[must_use]
    pub fn middleware<M>(mut self, middleware: M) -> Self
    where
        M: Middleware + 'static,
    {
        self.middleware.push(Arc::new(middleware));
        self
    }

    /// Attach bearer tokens from `context` and tear the session down on 401/403.
    #[must_use]
    pub fn authenticate(mut self, context: AuthContext, strategy: AuthStrategy) -> Self {
        self.auth = Some((context, strategy));
        self
    }

    /// Finish the client.
    ///
    /// The chain is: request id, auth failure guard, registered middlewares,
    /// bearer injection. Bearer injection therefore runs last on the way out
    /// and the guard observes failures last on the way back.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::HttpClient`] when the HTTP client cannot be built.
    pub fn build(self) -> ConfigResult<ApiClient> {
        let http = match self.http {
            Some(http) => http,
            None => reqwest::Client::builder()
                .timeout(self.config.timeout)
                .build()
                .map_err(|source| ConfigError::HttpClient { source })?,
        };

        let mut chain: Vec<Arc<dyn Middleware>> = vec![Arc::new(RequestId)];
        let bearer: Option<Arc<dyn Middleware>> = self.auth.map(|(context, strategy)| {
            chain.push(Arc::new(AuthFailureGuard::new(context.clone())));
            match strategy {
                AuthStrategy::Refreshing => Arc::new(RefreshingBearerAuth::new(
                    context,
                    http.clone(),
                    self.config.clone(),
                )) as Arc<dyn Middleware>,
                AuthStrategy::StoredToken => Arc::new(StoredBearerAuth::new(context.store_handle())),
            }
        });
        chain.extend(self.middleware);
        chain.extend(bearer);

        Ok(ApiClient {
            inner: Arc::new(Inner {
                http,
                config: self.config,
                middleware: chain,
            }),
        })
    }
}

impl fmt::Debug for ApiClientBuilder {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("ApiClientBuilder")
            .field("base_url", &self.config.base_url.as_str())
            .field("middleware", &self.middleware.len())
            .field("auth", &self.auth.as_ref().map(|(_, strategy)| *strategy))
            .finish_non_exhaustive()
    }
}

/// Read the full body and map non-success statuses to [`ApiError::Status`].
pub(crate) async fn read_response(
    method: &Method,
    path: &str,
    response: reqwest::Response,
) -> ApiResult<ApiResponse> {
    let status = response.status();
    let headers = response.headers().clone();
    let body = response
        .bytes()
        .await
        .map_err(|source| ApiError::Transport {
            path: path.to_string(),
            source,
        })?
        .to_vec();
    debug!(%method, path, status = status.as_u16(), "response received");

    if !status.is_success() {
        return Err(ApiError::Status {
            method: method.clone(),
            path: path.to_string(),
            status,
            body: String::from_utf8_lossy(&body).into_owned(),
        });
    }
    Ok(ApiResponse {
        path: path.to_string(),
        status,
        headers,
        body,
    })
}
