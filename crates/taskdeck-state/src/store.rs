//! App-wide state containers.
//!
//! # Design
//! - One handle groups the containers so it can be threaded through construction.
//! - Each container is an independent [`Observable`]; there is no cross-container transaction.

use crate::cell::Observable;
use crate::models::{Toast, User};

/// Shared state handle passed to the HTTP client and display collaborators.
#[derive(Clone, Debug, Default)]
pub struct AppState {
    /// Authenticated principal, `None` when signed out.
    pub user: Observable<Option<User>>,
    /// Most recent notification, `None` once consumed.
    pub toast: Observable<Option<Toast>>,
    /// Current access token mirrored from durable storage.
    pub token: Observable<Option<String>>,
}

impl AppState {
    /// Create the containers, seeding `token` from durable storage.
    #[must_use]
    pub fn new(stored_token: Option<String>) -> Self {
        Self {
            user: Observable::new(None),
            toast: Observable::new(None),
            token: Observable::new(stored_token),
        }
    }

    /// Publish a notification, replacing any pending one.
    pub fn notify(&self, toast: Toast) {
        self.toast.set(Some(toast));
    }

    /// Take the pending notification, clearing the container.
    #[must_use]
    pub fn take_toast(&self) -> Option<Toast> {
        let pending = self.toast.get();
        if pending.is_some() {
            self.toast.set(None);
        }
        pending
    }

    /// Reset authentication-related containers after logout or auth failure.
    pub fn sign_out(&self) {
        self.user.set(None);
        self.token.set(None);
    }

    /// Whether a principal is currently loaded.
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.user.get().is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Severity;
    use std::sync::{Arc, Mutex};

    #[test]
    fn new_toast_replaces_previous_for_every_subscriber() {
        let state = AppState::default();
        let seen_a = Arc::new(Mutex::new(Vec::new()));
        let seen_b = Arc::new(Mutex::new(Vec::new()));
        let sink_a = Arc::clone(&seen_a);
        let sink_b = Arc::clone(&seen_b);
        let _a = state
            .toast
            .subscribe(move |toast| sink_a.lock().unwrap().push(toast.clone()));
        let _b = state
            .toast
            .subscribe(move |toast| sink_b.lock().unwrap().push(toast.clone()));

        state.notify(Toast::error("first").with_duration(5_000));
        state.notify(Toast::success("second"));

        let expected = Some(Toast {
            message: "second".to_string(),
            severity: Severity::Success,
            duration: None,
        });
        assert_eq!(seen_a.lock().unwrap().last(), Some(&expected));
        assert_eq!(seen_b.lock().unwrap().last(), Some(&expected));
        assert_eq!(state.toast.get(), expected);
    }

    #[test]
    fn take_toast_clears_container() {
        let state = AppState::default();
        state.notify(Toast::warning("heads up"));
        assert_eq!(state.take_toast(), Some(Toast::warning("heads up")));
        assert_eq!(state.take_toast(), None);
    }

    #[test]
    fn sign_out_resets_user_and_token() {
        let state = AppState::new(Some("abc".to_string()));
        state.user.set(Some(User::named("ada")));
        assert!(state.is_authenticated());

        state.sign_out();

        assert!(!state.is_authenticated());
        assert_eq!(state.token.get(), None);
    }
}
