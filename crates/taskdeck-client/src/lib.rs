#![forbid(unsafe_code)]
#![deny(
    unused_must_use,
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    rustdoc::broken_intra_doc_links,
    rustdoc::bare_urls,
    missing_docs
)]
#![allow(clippy::module_name_repetitions)]
//! HTTP client for the Taskdeck task-tracking API.
//!
//! Layout: `config.rs` (base URL and timeout), `storage.rs` (credential
//! key-value stores), `request.rs` + `middleware.rs` (request values and the
//! hook chain), `auth.rs` (bearer injection, token regeneration, 401/403
//! teardown), `client.rs` (`ApiClient` and its builder), `services/`
//! (per-resource calls), `session.rs` (login/logout/restore).

pub mod auth;
pub mod client;
pub mod config;
pub mod error;
pub mod middleware;
pub mod models;
pub mod navigation;
pub mod request;
pub mod services;
pub mod session;
pub mod storage;

pub use auth::{AuthContext, AuthFailureGuard, RefreshingBearerAuth, StoredBearerAuth};
pub use client::{ApiClient, ApiClientBuilder, AuthStrategy};
pub use config::ClientConfig;
pub use error::{
    ApiError, ApiResult, ConfigError, ConfigResult, ErrorKind, StorageError, StorageResult,
};
pub use middleware::{HEADER_REQUEST_ID, Middleware, RequestId};
pub use models::{
    AuthTokens, LoginPayload, Pagination, RegisterPayload, SortOrder, Task, TaskFilter, TaskPatch,
    TaskPayload, TaskQuery,
};
pub use navigation::{LOGIN_ROUTE, LogNavigator, NavigateOptions, Navigator};
pub use request::{ApiRequest, ApiResponse};
pub use session::Session;
pub use storage::{FileStore, KeyValueStore, MemoryStore, StoredTokens};
pub use tokio_util::sync::CancellationToken;
