#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use httpmock::MockServer;
use taskdeck_client::{
    ApiClient, AuthContext, AuthStrategy, ClientConfig, KeyValueStore, MemoryStore,
    NavigateOptions, Navigator,
};
use taskdeck_state::AppState;

/// Expiry far enough in the future that no test triggers a refresh.
pub const FAR_FUTURE: &str = "4102444800";
/// Expiry that is always in the past.
pub const LONG_AGO: &str = "1000";

#[derive(Default)]
pub struct RecordingNavigator {
    visits: Mutex<Vec<(String, bool)>>,
}

impl RecordingNavigator {
    pub fn visits(&self) -> Vec<(String, bool)> {
        self.visits.lock().unwrap().clone()
    }
}

impl Navigator for RecordingNavigator {
    fn navigate(&self, route: &str, options: NavigateOptions) {
        self.visits
            .lock()
            .unwrap()
            .push((route.to_string(), options.replace));
    }
}

pub struct Harness {
    pub client: ApiClient,
    pub context: AuthContext,
    pub store: Arc<MemoryStore>,
    pub state: AppState,
    pub navigator: Arc<RecordingNavigator>,
}

impl Harness {
    pub fn new(server: &MockServer, entries: &[(&str, &str)]) -> Self {
        Self::with_strategy(server, entries, AuthStrategy::Refreshing)
    }

    pub fn with_strategy(
        server: &MockServer,
        entries: &[(&str, &str)],
        strategy: AuthStrategy,
    ) -> Self {
        let store = Arc::new(MemoryStore::with_entries(entries));
        let navigator = Arc::new(RecordingNavigator::default());
        let state = AppState::new(store.get("token"));
        let context = AuthContext::new(store.clone(), state.clone(), navigator.clone());
        let config = ClientConfig::new(server.base_url().parse().unwrap());
        let client = ApiClient::builder(config)
            .authenticate(context.clone(), strategy)
            .build()
            .unwrap();
        Self {
            client,
            context,
            store,
            state,
            navigator,
        }
    }
}

pub fn session_entries<'a>(access: &'a str, expires_in: &'a str) -> [(&'a str, &'a str); 3] {
    [
        ("token", access),
        ("refreshToken", "refresh-1"),
        ("expiresIn", expires_in),
    ]
}
