use dashmap::DashMap;

use microfed_api::{RemoteDescriptor, RemoteState, RemoteStatus, now_unix_ms};

/// Bookkeeping of declared remotes and their lifecycle status, independent of
/// how or whether they are ever loaded.
///
/// Purely synchronous; the only side effect of any operation is table
/// mutation. Constructed once at process start and shared via `Arc`. The
/// module cache lives in the loader, never here.
#[derive(Default)]
pub struct RemoteRegistry {
    configs: DashMap<String, RemoteDescriptor>,
    states: DashMap<String, RemoteState>,
}

impl RemoteRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Upsert by name. Re-registering resets the lifecycle state to idle.
    pub fn register(&self, descriptor: RemoteDescriptor) {
        let name = descriptor.name.clone();
        self.configs.insert(name.clone(), descriptor);
        self.states.insert(name, RemoteState::default());
    }

    pub fn register_many(&self, descriptors: impl IntoIterator<Item = RemoteDescriptor>) {
        for descriptor in descriptors {
            self.register(descriptor);
        }
    }

    /// Absence is a normal outcome the caller must check.
    pub fn get(&self, name: &str) -> Option<RemoteDescriptor> {
        self.configs.get(name).map(|entry| entry.value().clone())
    }

    pub fn list(&self) -> Vec<RemoteDescriptor> {
        self.configs
            .iter()
            .map(|entry| entry.value().clone())
            .collect()
    }

    pub fn has(&self, name: &str) -> bool {
        self.configs.contains_key(name)
    }

    /// Removes descriptor and state; returns whether anything was removed.
    pub fn unregister(&self, name: &str) -> bool {
        self.states.remove(name);
        self.configs.remove(name).is_some()
    }

    pub fn clear(&self) {
        self.configs.clear();
        self.states.clear();
    }

    /// No-op if `name` is unknown: callers may report state for a remote that
    /// was never explicitly registered. A transition to `Loaded` stamps
    /// `loaded_at`; every other transition leaves a prior stamp untouched.
    pub fn set_status(&self, name: &str, status: RemoteStatus, error: Option<String>) {
        if let Some(mut state) = self.states.get_mut(name) {
            state.status = status;
            state.error = error;
            if status == RemoteStatus::Loaded {
                state.loaded_at = Some(now_unix_ms());
            }
        }
    }

    pub fn get_state(&self, name: &str) -> Option<RemoteState> {
        self.states.get(name).map(|entry| entry.value().clone())
    }

    pub fn list_by_status(&self, status: RemoteStatus) -> Vec<RemoteDescriptor> {
        self.configs
            .iter()
            .filter(|entry| {
                self.states
                    .get(entry.key())
                    .is_some_and(|state| state.status == status)
            })
            .map(|entry| entry.value().clone())
            .collect()
    }
}
