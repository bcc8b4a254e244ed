//! Command handlers grouped by resource.

pub(crate) mod auth;
pub(crate) mod tasks;
