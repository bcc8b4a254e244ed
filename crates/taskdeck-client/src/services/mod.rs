//! Per-resource wrappers that call the API with fixed paths and verbs.

mod auth;
mod tasks;

/// Registration endpoint.
pub const USER_PATH: &str = "/user";
/// Login endpoint; auth failures here never invalidate the session.
pub const LOGIN_PATH: &str = "/user/login";
/// Current user profile.
pub const PROFILE_PATH: &str = "/user/me";
/// Logout endpoint.
pub const LOGOUT_PATH: &str = "/user/logout";
/// Access token regeneration endpoint.
pub const REGENERATE_TOKEN_PATH: &str = "/user/regenerate-access-token";
/// Task collection.
pub const TASKS_PATH: &str = "/tasks";
/// Single-task prefix; the id is appended as a path segment.
pub const TASK_PATH: &str = "/task";

pub(crate) fn task_path(id: &str) -> String {
    format!("{TASK_PATH}/{}", urlencoding::encode(id))
}
