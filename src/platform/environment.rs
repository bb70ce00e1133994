use std::collections::HashMap;
use std::sync::Mutex;

/// Read access to environment variables
pub trait Environment: Send + Sync {
    /// Value of `name`, or `None` when unset or empty
    fn get_env(&self, name: &str) -> Option<String>;
}

/// Reads the real process environment
#[derive(Debug, Default, Clone, Copy)]
pub struct OsEnvironment;

impl OsEnvironment {
    pub fn new() -> Self {
        Self
    }
}

impl Environment for OsEnvironment {
    fn get_env(&self, name: &str) -> Option<String> {
        std::env::var(name).ok().filter(|value| !value.is_empty())
    }
}

/// In-memory environment for tests
#[derive(Debug, Default)]
pub struct MockEnvironment {
    vars: Mutex<HashMap<String, String>>,
}

impl MockEnvironment {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_env(&self, name: &str, value: &str) {
        self.vars
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .insert(name.to_string(), value.to_string());
    }
}

impl Environment for MockEnvironment {
    fn get_env(&self, name: &str) -> Option<String> {
        self.vars
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .get(name)
            .filter(|value| !value.is_empty())
            .cloned()
    }
}
