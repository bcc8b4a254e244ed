//! Middleware chain wrapped around every API call.
//!
//! # Design
//! - Request hooks run outer-to-inner, in registration order, before dispatch.
//! - Response hooks run inner-to-outer after dispatch, for successes and failures alike.
//! - A request hook that fails aborts the call; response hooks never see it.
//! - Response hooks observe the outcome; they cannot replace it.

use async_trait::async_trait;
use reqwest::header::HeaderValue;
use uuid::Uuid;

use crate::error::{ApiError, ApiResult};
use crate::request::{ApiRequest, ApiResponse};

/// Header carrying the per-request correlation identifier.
pub const HEADER_REQUEST_ID: &str = "x-request-id";

/// Cross-cutting hook around API calls.
#[async_trait]
pub trait Middleware: Send + Sync {
    /// Inspect or modify the request before it is sent.
    ///
    /// # Errors
    ///
    /// Returning an error aborts the call with that error.
    async fn on_request(&self, _request: &mut ApiRequest) -> ApiResult<()> {
        Ok(())
    }

    /// Observe the outcome of a dispatched request.
    async fn on_response(&self, _request: &ApiRequest, _outcome: Result<&ApiResponse, &ApiError>) {}
}

/// Stamps a fresh `x-request-id` on requests that lack one.
#[derive(Clone, Copy, Debug, Default)]
pub struct RequestId;

#[async_trait]
impl Middleware for RequestId {
    async fn on_request(&self, request: &mut ApiRequest) -> ApiResult<()> {
        if !request.headers.contains_key(HEADER_REQUEST_ID) {
            let id = Uuid::new_v4().to_string();
            let value = HeaderValue::from_str(&id).map_err(|_| ApiError::InvalidRequest {
                reason: "request identifier is not a valid header value".to_string(),
            })?;
            request.headers.insert(HEADER_REQUEST_ID, value);
        }
        Ok(())
    }
}
