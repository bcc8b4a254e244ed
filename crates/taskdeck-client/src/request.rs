//! Request and response values that flow through the middleware chain.

use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use reqwest::{Method, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::{ApiError, ApiResult};

/// Outgoing request, relative to the client's base URL.
#[derive(Clone, Debug)]
pub struct ApiRequest {
    /// HTTP method.
    pub method: Method,
    /// Path appended to the base URL, without query string.
    pub path: String,
    /// Query pairs in wire order.
    pub query: Vec<(String, String)>,
    /// Request headers.
    pub headers: HeaderMap,
    /// JSON body.
    pub body: Option<Value>,
}

impl ApiRequest {
    /// Request with no query, headers, or body.
    #[must_use]
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            headers: HeaderMap::new(),
            body: None,
        }
    }

    /// `GET` request.
    #[must_use]
    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    /// `POST` request.
    #[must_use]
    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    /// `PATCH` request.
    #[must_use]
    pub fn patch(path: impl Into<String>) -> Self {
        Self::new(Method::PATCH, path)
    }

    /// `DELETE` request.
    #[must_use]
    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    /// Append query pairs.
    #[must_use]
    pub fn with_query(mut self, pairs: Vec<(String, String)>) -> Self {
        self.query.extend(pairs);
        self
    }

    /// Attach a JSON body.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Encode`] when `body` cannot be serialised.
    pub fn with_json<T: Serialize>(mut self, body: &T) -> ApiResult<Self> {
        self.body = Some(serde_json::to_value(body).map_err(|source| ApiError::Encode { source })?);
        Ok(self)
    }

    /// Set `Authorization: Bearer <token>`, replacing any existing value.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::InvalidRequest`] when the token is not a valid header value.
    pub fn set_bearer(&mut self, token: &str) -> ApiResult<()> {
        let mut value =
            HeaderValue::from_str(&format!("Bearer {token}")).map_err(|_| ApiError::InvalidRequest {
                reason: "access token contains characters not allowed in a header".to_string(),
            })?;
        value.set_sensitive(true);
        self.headers.insert(AUTHORIZATION, value);
        Ok(())
    }

    /// Bearer token currently attached, if any.
    #[must_use]
    pub fn bearer(&self) -> Option<&str> {
        self.headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
    }
}

/// Successful response with its body fully read.
#[derive(Clone, Debug)]
pub struct ApiResponse {
    /// Path of the request that produced this response.
    pub path: String,
    /// Response status.
    pub status: StatusCode,
    /// Response headers.
    pub headers: HeaderMap,
    /// Raw body bytes.
    pub body: Vec<u8>,
}

impl ApiResponse {
    /// Decode the body as JSON.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Decode`] when the body does not match `T`.
    pub fn json<T: DeserializeOwned>(&self) -> ApiResult<T> {
        serde_json::from_slice(&self.body).map_err(|source| ApiError::Decode {
            path: self.path.clone(),
            source,
        })
    }

    /// Decode the body as JSON, or `None` when the server sent no body.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Decode`] when a non-empty body does not match `T`.
    pub fn json_optional<T: DeserializeOwned>(&self) -> ApiResult<Option<T>> {
        if self.body.iter().all(u8::is_ascii_whitespace) {
            return Ok(None);
        }
        self.json().map(Some)
    }

    /// Body as lossily decoded text.
    #[must_use]
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn bearer_is_inserted_and_replaced() {
        let mut request = ApiRequest::get("/user/me");
        assert_eq!(request.bearer(), None);

        request.set_bearer("first").expect("header");
        request.set_bearer("second").expect("header");

        assert_eq!(request.bearer(), Some("second"));
        assert_eq!(request.headers.get_all(AUTHORIZATION).iter().count(), 1);
    }

    #[test]
    fn bearer_rejects_control_characters() {
        let mut request = ApiRequest::get("/user/me");
        let err = request.set_bearer("bad\ntoken").expect_err("invalid header");
        assert!(matches!(err, ApiError::InvalidRequest { .. }));
    }

    #[test]
    fn json_body_is_captured() {
        let request = ApiRequest::patch("/task/1")
            .with_json(&json!({"completed": true}))
            .expect("encode");
        assert_eq!(request.body, Some(json!({"completed": true})));
    }

    #[test]
    fn empty_bodies_decode_to_none() {
        let response = |body: &[u8]| ApiResponse {
            path: "/task".to_string(),
            status: StatusCode::CREATED,
            headers: HeaderMap::new(),
            body: body.to_vec(),
        };

        assert_eq!(response(b"").json_optional::<Value>().expect("empty"), None);
        assert_eq!(response(b" \n").json_optional::<Value>().expect("blank"), None);
        assert_eq!(
            response(b"{\"ok\":true}").json_optional::<Value>().expect("json"),
            Some(json!({"ok": true}))
        );
    }

    #[test]
    fn response_decode_errors_name_the_path() {
        let response = ApiResponse {
            path: "/tasks".to_string(),
            status: StatusCode::OK,
            headers: HeaderMap::new(),
            body: b"{".to_vec(),
        };
        let err = response.json::<Value>().expect_err("invalid json");
        assert_eq!(err.to_string(), "failed to decode response from /tasks");
    }
}
