//! Request and response payloads for the task-tracking API.

use serde::{Deserialize, Deserializer, Serialize};

/// Body of `POST /user`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisterPayload {
    /// Desired login name.
    pub username: String,
    /// Plain-text password; sent over TLS, never persisted.
    pub password: String,
}

/// Body of `POST /user/login`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginPayload {
    /// Login name.
    pub username: String,
    /// Plain-text password; sent over TLS, never persisted.
    pub password: String,
}

/// Token triple returned by login and token regeneration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthTokens {
    /// Access token.
    pub token: String,
    /// Refresh token.
    pub refresh_token: String,
    /// Access token expiry in epoch seconds, kept in its stored string form.
    #[serde(deserialize_with = "epoch_seconds")]
    pub expires_in: String,
}

fn epoch_seconds<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Integer(i64),
        Float(f64),
    }

    Ok(match Raw::deserialize(deserializer)? {
        Raw::Text(text) => text,
        Raw::Integer(value) => value.to_string(),
        Raw::Float(value) => value.to_string(),
    })
}

/// A task as stored by the server.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    /// Server-side identifier.
    #[serde(rename = "_id", alias = "id")]
    pub id: String,
    /// Free-form description.
    pub description: String,
    /// Completion flag.
    pub completed: bool,
}

/// Body of `POST /task`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskPayload {
    /// Description of the new task.
    pub description: String,
}

/// Body of `PATCH /task/:id`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskPatch {
    /// New completion flag.
    pub completed: bool,
}

/// Which tab of tasks to display.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskFilter {
    /// Finished tasks.
    Completed,
    /// Open tasks.
    Pending,
}

impl TaskFilter {
    /// Value of the `completed` query flag for this filter.
    #[must_use]
    pub const fn completed(self) -> bool {
        matches!(self, Self::Completed)
    }
}

/// Sort direction applied to the `updatedAt` field.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SortOrder {
    /// Oldest first.
    Asc,
    /// Newest first.
    Desc,
}

impl SortOrder {
    /// Wire label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        }
    }
}

/// One-based page selection.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Pagination {
    /// Page number, starting at 1.
    pub page: u32,
    /// Page size.
    pub limit: u32,
}

impl Pagination {
    /// Number of records to skip before this page.
    #[must_use]
    pub fn skip(self) -> u64 {
        u64::from(self.page.saturating_sub(1)) * u64::from(self.limit)
    }
}

/// Query parameters for `GET /tasks`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TaskQuery {
    /// Completion filter.
    pub completed: bool,
    /// Optional page selection.
    pub pagination: Option<Pagination>,
    /// Optional sort direction on `updatedAt`.
    pub sort: Option<SortOrder>,
}

impl TaskQuery {
    /// Query filtering on completion only.
    #[must_use]
    pub const fn new(completed: bool) -> Self {
        Self {
            completed,
            pagination: None,
            sort: None,
        }
    }

    /// Query for a display tab.
    #[must_use]
    pub const fn for_filter(filter: TaskFilter) -> Self {
        Self::new(filter.completed())
    }

    /// Select a one-based page of `limit` records.
    #[must_use]
    pub const fn page(mut self, page: u32, limit: u32) -> Self {
        self.pagination = Some(Pagination { page, limit });
        self
    }

    /// Sort on `updatedAt`.
    #[must_use]
    pub const fn sorted(mut self, order: SortOrder) -> Self {
        self.sort = Some(order);
        self
    }

    /// Query pairs in wire order.
    #[must_use]
    pub fn to_pairs(&self) -> Vec<(String, String)> {
        let mut pairs = vec![("completed".to_string(), self.completed.to_string())];
        if let Some(pagination) = self.pagination {
            pairs.push(("skip".to_string(), pagination.skip().to_string()));
            pairs.push(("limit".to_string(), pagination.limit.to_string()));
        }
        if let Some(order) = self.sort {
            pairs.push(("sortBy".to_string(), format!("updatedAt_{}", order.as_str())));
        }
        pairs
    }
}
