use std::sync::Arc;

use microfed_api::{EntryFetcher, RuntimeAdapter, VirtualRuntime};
use microfed_core::{
    AdapterBinding, GlobalContainerAdapter, MicroAppMount, RemoteLoader, RemoteRegistry,
    VirtualModuleAdapter,
};

/// Handle to an assembled remote-loading host: one registry, one loader, one
/// adapter slot, threaded through the embedding application.
#[derive(Clone)]
pub struct RemoteHost {
    registry: Arc<RemoteRegistry>,
    binding: Arc<AdapterBinding>,
    loader: Arc<RemoteLoader>,
}

impl RemoteHost {
    pub fn registry(&self) -> &Arc<RemoteRegistry> {
        &self.registry
    }

    pub fn loader(&self) -> &Arc<RemoteLoader> {
        &self.loader
    }

    /// Bind the federation runtime adapter. Loads attempted before this call
    /// fail with a "not initialized" result.
    pub fn bind_adapter(&self, adapter: Arc<dyn RuntimeAdapter>) {
        self.binding.bind(adapter);
    }

    pub fn is_initialized(&self) -> bool {
        self.binding.is_bound()
    }

    /// Fresh consumer-facing state machine driving this host's loader.
    pub fn new_mount(&self) -> MicroAppMount {
        MicroAppMount::new(Arc::clone(&self.loader))
    }
}

/// Bootstrap a host with a late-bound adapter slot; the embedding application
/// calls [`RemoteHost::bind_adapter`] once its federation runtime is up.
pub fn build_host() -> RemoteHost {
    let registry = Arc::new(RemoteRegistry::new());
    let binding = Arc::new(AdapterBinding::new());
    let loader = Arc::new(RemoteLoader::new(
        Arc::clone(&registry),
        Arc::clone(&binding),
    ));
    RemoteHost {
        registry,
        binding,
        loader,
    }
}

/// Host wired for global-container remotes, importing entry artifacts through
/// the supplied fetcher.
pub fn build_global_container_host(fetcher: Arc<dyn EntryFetcher>) -> RemoteHost {
    let host = build_host();
    host.bind_adapter(Arc::new(GlobalContainerAdapter::new(fetcher)));
    host
}

/// Host wired for a virtual-module federation runtime.
pub fn build_virtual_module_host(runtime: Arc<dyn VirtualRuntime>) -> RemoteHost {
    let host = build_host();
    host.bind_adapter(Arc::new(VirtualModuleAdapter::new(runtime)));
    host
}

/// Initializes the logging system for a specific component.
/// This delegates to the core logging module.
pub fn init_logging(component: &str) -> Option<impl Drop> {
    Some(microfed_core::logging::init_logging(component, false))
}
