//! Navigation hooks used when the API forces the user back to login.

use std::sync::Mutex;

pub const LOGIN_PATH: &str = "/login";

/// Target after the API rejected the session with a 401.
pub const UNAUTHORIZED_REDIRECT: &str = "/login?error=UNAUTHORIZED";

/// Target after a failed social login callback.
pub const OAUTH_FAILED_REDIRECT: &str = "/login?error=OAUTH_FAILED";

/// Whatever owns the user's current location (a browser window, a CLI
/// prompt loop, a test).
pub trait Navigator: Send + Sync {
    fn current_path(&self) -> String;

    /// Hard navigation to `target`.
    fn navigate(&self, target: &str);

    fn is_on_login(&self) -> bool {
        self.current_path().contains(LOGIN_PATH)
    }
}

/// Navigator that only remembers where it was sent.
#[derive(Debug)]
pub struct HistoryNavigator {
    current: Mutex<String>,
    history: Mutex<Vec<String>>,
}

impl HistoryNavigator {
    pub fn new(start: &str) -> Self {
        Self {
            current: Mutex::new(start.to_string()),
            history: Mutex::new(Vec::new()),
        }
    }

    /// Every target passed to `navigate`, oldest first.
    pub fn history(&self) -> Vec<String> {
        self.history.lock().map(|h| h.clone()).unwrap_or_default()
    }

    pub fn last(&self) -> Option<String> {
        self.history.lock().ok()?.last().cloned()
    }
}

impl Default for HistoryNavigator {
    fn default() -> Self {
        Self::new("/")
    }
}

impl Navigator for HistoryNavigator {
    fn current_path(&self) -> String {
        self.current.lock().map(|c| c.clone()).unwrap_or_default()
    }

    fn navigate(&self, target: &str) {
        if let Ok(mut current) = self.current.lock() {
            *current = target.to_string();
        }
        if let Ok(mut history) = self.history.lock() {
            history.push(target.to_string());
        }
    }
}
