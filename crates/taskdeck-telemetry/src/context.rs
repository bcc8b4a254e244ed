//! Spans wrapping top-level command execution.

use tracing::Span;

use crate::init::build_sha;

/// Span carrying the command name and build identifier.
#[must_use]
pub fn command_span(command: &str) -> Span {
    tracing::info_span!("command", command, build_sha = %build_sha())
}
