//! Collaborator hooks
//!
//! Audit logging, notifications and similar side effects hang off named hooks
//! fired by the moderation service. Handlers run synchronously in priority
//! order and receive the event payload as JSON. They observe; they cannot
//! veto a transition. `trigger` hands the final payload back to the caller,
//! which the moderation service only logs.

use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use tracing::debug;

/// Hook callback type
///
/// A handler may mutate the payload in place or return a replacement, which
/// later handlers then see.
pub type HookCallback = Arc<dyn Fn(&mut Value) -> Option<Value> + Send + Sync>;

/// Hook priority (lower = earlier)
pub const PRIORITY_EARLY: i32 = -100;
pub const PRIORITY_DEFAULT: i32 = 0;
pub const PRIORITY_LATE: i32 = 100;

struct HookHandler {
    callback: HookCallback,
    priority: i32,
}

/// Registry of hook handlers, keyed by hook name
pub struct HookManager {
    hooks: RwLock<HashMap<String, Vec<HookHandler>>>,
}

impl Default for HookManager {
    fn default() -> Self {
        Self::new()
    }
}

impl HookManager {
    pub fn new() -> Self {
        Self {
            hooks: RwLock::new(HashMap::new()),
        }
    }

    /// Register a hook handler
    pub fn register<F>(&self, name: &str, callback: F, priority: i32)
    where
        F: Fn(&mut Value) -> Option<Value> + Send + Sync + 'static,
    {
        let mut hooks = self.hooks.write().unwrap_or_else(|e| e.into_inner());
        let handlers = hooks.entry(name.to_string()).or_default();

        handlers.push(HookHandler {
            callback: Arc::new(callback),
            priority,
        });

        // Stable sort keeps registration order within a priority
        handlers.sort_by_key(|h| h.priority);

        debug!("Registered hook handler for '{}' with priority {}", name, priority);
    }

    /// Trigger a hook and return the (possibly modified) payload
    pub fn trigger(&self, name: &str, mut data: Value) -> Value {
        // Clone handlers out so a callback can register hooks without deadlocking
        let handlers: Vec<HookCallback> = {
            let hooks = self.hooks.read().unwrap_or_else(|e| e.into_inner());
            match hooks.get(name) {
                Some(handlers) => handlers.iter().map(|h| h.callback.clone()).collect(),
                None => return data,
            }
        };

        for callback in handlers {
            if let Some(result) = callback(&mut data) {
                data = result;
            }
        }

        data
    }

    /// Check if a hook has any handlers
    pub fn has_handlers(&self, name: &str) -> bool {
        let hooks = self.hooks.read().unwrap_or_else(|e| e.into_inner());
        hooks.get(name).is_some_and(|h| !h.is_empty())
    }
}

/// Hook names fired by `services::moderation`
pub mod hook_names {
    pub const CONTENT_BEFORE_TRANSITION: &str = "content_before_transition";
    pub const CONTENT_AFTER_TRANSITION: &str = "content_after_transition";
    pub const CONTENT_TRANSITION_REJECTED: &str = "content_transition_rejected";
    pub const CONTENT_AFTER_CREATE: &str = "content_after_create";
    pub const CONTENT_AFTER_UPDATE: &str = "content_after_update";
}
