use std::collections::HashSet;
use std::sync::Mutex;

use crate::config::Config;

/// Application state shared between connections
pub struct AppState {
    pub config: Config,
    /// Ids of the connected sessions
    pub sessions: Mutex<HashSet<String>>,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        AppState { config, sessions: Mutex::new(HashSet::new()) }
    }

    /// Returns the number of sessions after registering `id`
    pub fn register(&self, id: &str) -> usize {
        match self.sessions.lock() {
            Ok(mut sessions) => {
                sessions.insert(id.to_string());
                sessions.len()
            }
            Err(_) => 0,
        }
    }

    pub fn unregister(&self, id: &str) -> usize {
        match self.sessions.lock() {
            Ok(mut sessions) => {
                sessions.remove(id);
                sessions.len()
            }
            Err(_) => 0,
        }
    }

    pub fn session_count(&self) -> usize {
        self.sessions.lock().map(|sessions| sessions.len()).unwrap_or(0)
    }
}
