//! Values held by the shared state containers.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Authenticated principal as returned by the profile endpoint.
///
/// The API treats the record as opaque; only the identifier and username are
/// surfaced as typed fields, everything else is preserved verbatim.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct User {
    /// Server-side identifier.
    #[serde(rename = "_id", alias = "id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Login name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    /// Remaining profile attributes.
    #[serde(flatten)]
    pub attributes: Map<String, Value>,
}

impl User {
    /// Construct a user carrying only a username.
    #[must_use]
    pub fn named(username: impl Into<String>) -> Self {
        Self {
            id: None,
            username: Some(username.into()),
            attributes: Map::new(),
        }
    }
}

/// Severity of a toast notification.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Operation succeeded.
    Success,
    /// Something needs attention.
    Warning,
    /// Operation failed.
    Error,
}

impl Severity {
    /// Lowercase label used by display collaborators.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Warning => "warning",
            Self::Error => "error",
        }
    }
}

/// Transient notification shown by the display collaborator.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Toast {
    /// Message text.
    pub message: String,
    /// Severity classification.
    pub severity: Severity,
    /// Display duration in milliseconds; the display default applies when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<u64>,
}

impl Toast {
    /// Build a toast with the given severity and no explicit duration.
    #[must_use]
    pub fn new(message: impl Into<String>, severity: Severity) -> Self {
        Self {
            message: message.into(),
            severity,
            duration: None,
        }
    }

    /// Success toast.
    #[must_use]
    pub fn success(message: impl Into<String>) -> Self {
        Self::new(message, Severity::Success)
    }

    /// Warning toast.
    #[must_use]
    pub fn warning(message: impl Into<String>) -> Self {
        Self::new(message, Severity::Warning)
    }

    /// Error toast.
    #[must_use]
    pub fn error(message: impl Into<String>) -> Self {
        Self::new(message, Severity::Error)
    }

    /// Override the display duration.
    #[must_use]
    pub const fn with_duration(mut self, millis: u64) -> Self {
        self.duration = Some(millis);
        self
    }
}
