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
//! Shared state containers for the Taskdeck client.
//!
//! Layout: `cell.rs` (observable value cells), `models.rs` (user and toast
//! values), `store.rs` (`AppState` handle), `click_outside.rs` (dismiss
//! behaviour for popovers).

pub mod cell;
pub mod click_outside;
pub mod models;
pub mod store;

pub use cell::{Observable, Subscription};
pub use click_outside::{ClickOutcome, ClickOutside, Rect, Region};
pub use models::{Severity, Toast, User};
pub use store::AppState;
