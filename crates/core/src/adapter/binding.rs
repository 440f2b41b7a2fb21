use std::sync::{Arc, RwLock};

use microfed_api::RuntimeAdapter;

/// Late-binding slot for the runtime adapter.
///
/// The loader is constructed against this slot before the host has decided
/// which federation runtime is active; the host binds the concrete adapter
/// once at startup. Loads through an unbound slot fail fast with a
/// "not initialized" result instead of a null dereference.
#[derive(Default)]
pub struct AdapterBinding {
    slot: RwLock<Option<Arc<dyn RuntimeAdapter>>>,
}

impl AdapterBinding {
    pub fn new() -> Self {
        Self::default()
    }

    /// Slot that is already bound, for hosts that know their runtime up
    /// front.
    pub fn bound(adapter: Arc<dyn RuntimeAdapter>) -> Self {
        let binding = Self::new();
        binding.bind(adapter);
        binding
    }

    /// Bind or replace the active adapter.
    pub fn bind(&self, adapter: Arc<dyn RuntimeAdapter>) {
        let mut slot = self.slot.write().expect("adapter slot poisoned");
        *slot = Some(adapter);
    }

    pub fn is_bound(&self) -> bool {
        self.slot.read().expect("adapter slot poisoned").is_some()
    }

    pub fn get(&self) -> Option<Arc<dyn RuntimeAdapter>> {
        self.slot.read().expect("adapter slot poisoned").clone()
    }
}
