//! Mock container runtime for testing
//!
//! Records every call and returns configurable results without touching a
//! real container backend.

use super::{ContainerRuntime, ContainerSpec};
use crate::error::ProvisionError;
use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::{Arc, Mutex};

/// One recorded runtime call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallRecord {
    /// Operation name: "ensure_image", "create", "start" or "remove"
    pub operation: &'static str,

    /// Image, container name or id the call targeted
    pub target: String,
}

/// Mock container runtime
///
/// Clones share state, so a test can keep one handle for assertions while
/// the provisioner owns another.
#[derive(Clone)]
pub struct MockRuntime {
    /// Monotonic counter used to mint container ids
    next_id: Arc<Mutex<usize>>,

    /// Whether every operation should fail
    should_fail: Arc<Mutex<bool>>,

    /// Whether remove calls alone should fail
    fail_removals: Arc<Mutex<bool>>,

    /// Fail create calls once this many have succeeded
    fail_after: Arc<Mutex<Option<usize>>>,

    /// Message carried by injected failures
    error_message: Arc<Mutex<String>>,

    /// Every call in arrival order
    calls: Arc<Mutex<Vec<CallRecord>>>,

    /// Ids of containers created and not yet removed
    active: Arc<Mutex<HashSet<String>>>,

    /// Ids of removed containers, in removal order
    removed: Arc<Mutex<Vec<String>>>,

    /// Number of successful create calls
    created: Arc<Mutex<usize>>,
}

impl MockRuntime {
    pub fn new() -> Self {
        Self {
            next_id: Arc::new(Mutex::new(0)),
            should_fail: Arc::new(Mutex::new(false)),
            fail_removals: Arc::new(Mutex::new(false)),
            fail_after: Arc::new(Mutex::new(None)),
            error_message: Arc::new(Mutex::new("injected failure".to_string())),
            calls: Arc::new(Mutex::new(Vec::new())),
            active: Arc::new(Mutex::new(HashSet::new())),
            removed: Arc::new(Mutex::new(Vec::new())),
            created: Arc::new(Mutex::new(0)),
        }
    }

    /// Make every subsequent call fail
    pub fn set_should_fail(&self, fail: bool) {
        *self.should_fail.lock().unwrap() = fail;
    }

    /// Make remove calls fail while everything else keeps working
    pub fn set_fail_removals(&self, fail: bool) {
        *self.fail_removals.lock().unwrap() = fail;
    }

    /// Let this many create calls succeed, then fail the rest
    pub fn set_fail_after(&self, successes: usize) {
        *self.fail_after.lock().unwrap() = Some(successes);
    }

    /// Set the message carried by injected failures
    pub fn set_error_message(&self, message: impl Into<String>) {
        *self.error_message.lock().unwrap() = message.into();
    }

    /// Number of create calls that succeeded
    pub fn created_count(&self) -> usize {
        *self.created.lock().unwrap()
    }

    /// Ids removed so far, in removal order
    pub fn removed_ids(&self) -> Vec<String> {
        self.removed.lock().unwrap().clone()
    }

    /// Ids created and not yet removed, sorted
    pub fn active_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.active.lock().unwrap().iter().cloned().collect();
        ids.sort();
        ids
    }

    /// Every recorded call in arrival order
    pub fn calls(&self) -> Vec<CallRecord> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, operation: &'static str, target: impl Into<String>) {
        self.calls.lock().unwrap().push(CallRecord {
            operation,
            target: target.into(),
        });
    }

    fn injected_failure(&self, operation: &'static str, target: &str) -> ProvisionError {
        ProvisionError::Container {
            operation,
            name: target.to_string(),
            message: self.error_message.lock().unwrap().clone(),
        }
    }
}

impl Default for MockRuntime {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ContainerRuntime for MockRuntime {
    async fn ensure_image(&self, image: &str) -> Result<(), ProvisionError> {
        self.record("ensure_image", image);
        if *self.should_fail.lock().unwrap() {
            return Err(self.injected_failure("ensure_image", image));
        }
        Ok(())
    }

    async fn create_instance(&self, spec: &ContainerSpec) -> Result<String, ProvisionError> {
        self.record("create", &spec.name);
        if *self.should_fail.lock().unwrap() {
            return Err(self.injected_failure("create", &spec.name));
        }
        if let Some(limit) = *self.fail_after.lock().unwrap() {
            if *self.created.lock().unwrap() >= limit {
                return Err(self.injected_failure("create", &spec.name));
            }
        }

        let id = {
            let mut next = self.next_id.lock().unwrap();
            *next += 1;
            format!("mock-{}", *next)
        };
        *self.created.lock().unwrap() += 1;
        self.active.lock().unwrap().insert(id.clone());
        Ok(id)
    }

    async fn start_instance(&self, id: &str) -> Result<(), ProvisionError> {
        self.record("start", id);
        if *self.should_fail.lock().unwrap() {
            return Err(self.injected_failure("start", id));
        }
        if !self.active.lock().unwrap().contains(id) {
            return Err(ProvisionError::Container {
                operation: "start",
                name: id.to_string(),
                message: "no such container".to_string(),
            });
        }
        Ok(())
    }

    async fn remove_instance(&self, id: &str) -> Result<(), ProvisionError> {
        self.record("remove", id);
        if *self.should_fail.lock().unwrap() || *self.fail_removals.lock().unwrap() {
            return Err(self.injected_failure("remove", id));
        }
        if !self.active.lock().unwrap().remove(id) {
            return Err(ProvisionError::Container {
                operation: "remove",
                name: id.to_string(),
                message: "no such container".to_string(),
            });
        }
        self.removed.lock().unwrap().push(id.to_string());
        Ok(())
    }
}
