use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use microfed_api::{
    AdapterError, Bundler, LoadError, LoadOptions, LoadResult, ModuleHandle, RemoteAppRecord,
    RemoteDescriptor, RemoteStatus, RuntimeAdapter,
};

use crate::adapter::AdapterBinding;
use crate::registry::RemoteRegistry;

/// Turns a load request into a resolved module value, handling caching,
/// timeout and retry.
///
/// The loader exclusively owns the module cache and the runtime registration
/// table; the registry never reads either. Every public operation resolves to
/// a `Result` — no failure path panics or escapes unclassified.
pub struct RemoteLoader {
    registry: Arc<RemoteRegistry>,
    binding: Arc<AdapterBinding>,
    /// `scope:module` -> resolved module, kept for the process lifetime
    /// unless explicitly cleared.
    module_cache: DashMap<String, ModuleHandle>,
    /// scope -> entry URL last registered with the runtime adapter.
    registered_entries: DashMap<String, String>,
}

impl RemoteLoader {
    pub fn new(registry: Arc<RemoteRegistry>, binding: Arc<AdapterBinding>) -> Self {
        Self {
            registry,
            binding,
            module_cache: DashMap::new(),
            registered_entries: DashMap::new(),
        }
    }

    pub fn registry(&self) -> &Arc<RemoteRegistry> {
        &self.registry
    }

    pub fn binding(&self) -> &Arc<AdapterBinding> {
        &self.binding
    }

    /// Load a remote registered under `name`. Fails with
    /// [`LoadError::NotRegistered`] when the name is unknown, without
    /// touching the registry's state table.
    pub async fn load_by_name(&self, name: &str, options: LoadOptions) -> LoadResult<ModuleHandle> {
        let Some(descriptor) = self.registry.get(name) else {
            return Err(LoadError::NotRegistered(name.to_string()));
        };
        self.load_by_config(&descriptor, options).await
    }

    /// Load a remote directly by URL, without prior registration, under a
    /// synthesized descriptor name.
    pub async fn load_by_url(
        &self,
        url: &str,
        scope: &str,
        module: &str,
        options: LoadOptions,
        bundler: Bundler,
    ) -> LoadResult<ModuleHandle> {
        let descriptor = RemoteDescriptor::ephemeral(url, scope, module, bundler);
        self.load_by_config(&descriptor, options).await
    }

    /// Load a remote from a descriptor record returned by the admin API.
    pub async fn load_by_record(
        &self,
        record: &RemoteAppRecord,
        options: LoadOptions,
    ) -> LoadResult<ModuleHandle> {
        let descriptor = record.to_descriptor();
        self.load_by_config(&descriptor, options).await
    }

    /// Core load algorithm: cache fast path, status bookkeeping, then the
    /// retry loop around timed adapter resolutions.
    pub async fn load_by_config(
        &self,
        descriptor: &RemoteDescriptor,
        options: LoadOptions,
    ) -> LoadResult<ModuleHandle> {
        self.load_by_config_cancellable(descriptor, options, &CancellationToken::new())
            .await
    }

    /// [`load_by_config`](Self::load_by_config) with a caller-supplied
    /// cancellation token, checked cooperatively between attempts and handed
    /// down to the adapter's suspension points.
    pub async fn load_by_config_cancellable(
        &self,
        descriptor: &RemoteDescriptor,
        options: LoadOptions,
        cancel: &CancellationToken,
    ) -> LoadResult<ModuleHandle> {
        let cache_key = descriptor.cache_key();

        // Fast path: a resolved module is immutable and reused as-is, with no
        // status update and no revalidation of network reachability.
        if let Some(cached) = self.module_cache.get(&cache_key) {
            return Ok(cached.value().clone());
        }

        let registered = self.registry.has(&descriptor.name);
        if registered {
            self.registry
                .set_status(&descriptor.name, RemoteStatus::Loading, None);
        }

        let Some(adapter) = self.binding.get() else {
            return Err(LoadError::NotInitialized);
        };

        let mut last_error = LoadError::Adapter(AdapterError::Runtime("unknown error".into()));

        for attempt in 0..=options.retries {
            match self
                .attempt(adapter.as_ref(), descriptor, &options, cancel)
                .await
            {
                Ok(module) => {
                    self.module_cache.insert(cache_key, module.clone());
                    if registered {
                        self.registry
                            .set_status(&descriptor.name, RemoteStatus::Loaded, None);
                    }
                    debug!(
                        target: "microfed_core::loader",
                        module_id = %descriptor.module_id(),
                        attempt,
                        "remote module loaded"
                    );
                    return Ok(module);
                }
                Err(error) => {
                    warn!(
                        target: "microfed_core::loader",
                        module_id = %descriptor.module_id(),
                        attempt,
                        %error,
                        "remote load attempt failed"
                    );
                    last_error = error;
                    if cancel.is_cancelled() {
                        break;
                    }
                    if attempt < options.retries {
                        tokio::time::sleep(Duration::from_millis(options.retry_delay_ms)).await;
                    }
                }
            }
        }

        if registered {
            self.registry.set_status(
                &descriptor.name,
                RemoteStatus::Error,
                Some(last_error.to_string()),
            );
        }
        Err(last_error)
    }

    /// One resolution attempt: idempotent runtime registration, then the
    /// adapter's resolution raced against the per-attempt timeout. On expiry
    /// the token is cancelled so the adapter can stop at its next suspension
    /// point; the underlying network activity is not aborted.
    async fn attempt(
        &self,
        adapter: &dyn RuntimeAdapter,
        descriptor: &RemoteDescriptor,
        options: &LoadOptions,
        cancel: &CancellationToken,
    ) -> LoadResult<ModuleHandle> {
        self.ensure_remote_registered(adapter, descriptor)?;

        let attempt_token = cancel.child_token();
        let resolution =
            adapter.resolve_module(&descriptor.scope, &descriptor.module, attempt_token.clone());

        match tokio::time::timeout(Duration::from_millis(options.timeout_ms), resolution).await {
            Err(_elapsed) => {
                attempt_token.cancel();
                Err(LoadError::Timeout {
                    timeout_ms: options.timeout_ms,
                })
            }
            Ok(Err(error)) => Err(LoadError::Adapter(error)),
            Ok(Ok(None)) => Err(LoadError::NullModule {
                module_id: descriptor.module_id(),
            }),
            Ok(Ok(Some(module))) => Ok(module),
        }
    }

    /// Register the remote with the runtime adapter unless this scope is
    /// already registered under the same entry URL.
    fn ensure_remote_registered(
        &self,
        adapter: &dyn RuntimeAdapter,
        descriptor: &RemoteDescriptor,
    ) -> LoadResult<()> {
        let entry_url = descriptor.entry_url();
        if self
            .registered_entries
            .get(&descriptor.scope)
            .is_some_and(|registered| *registered == entry_url)
        {
            return Ok(());
        }

        adapter.register_if_needed(&descriptor.scope, &entry_url, descriptor.bundler)?;
        self.registered_entries
            .insert(descriptor.scope.clone(), entry_url);
        Ok(())
    }

    /// Fire-and-forget warmup of a registered remote. The detached task's
    /// failure is logged and never surfaces to the caller.
    pub fn preload(self: &Arc<Self>, name: &str, options: LoadOptions) {
        let loader = Arc::clone(self);
        let name = name.to_string();
        tokio::spawn(async move {
            if let Err(error) = loader.load_by_name(&name, options).await {
                warn!(
                    target: "microfed_core::loader",
                    remote = %name,
                    %error,
                    "preload failed"
                );
            }
        });
    }

    /// Drop cached modules and registration-table entries for one scope, or
    /// everything when no scope is given.
    pub fn clear_cache(&self, scope: Option<&str>) {
        match scope {
            Some(scope) => {
                let prefix = format!("{scope}:");
                self.module_cache.retain(|key, _| !key.starts_with(&prefix));
                self.registered_entries.remove(scope);
            }
            None => {
                self.module_cache.clear();
                self.registered_entries.clear();
            }
        }
    }

    /// Remove a remote from the registry, dropping any cached module keyed to
    /// its scope. Returns whether a registration was removed.
    pub fn unregister(&self, name: &str) -> bool {
        if let Some(descriptor) = self.registry.get(name) {
            self.clear_cache(Some(&descriptor.scope));
        }
        self.registry.unregister(name)
    }

    pub fn cached(&self, scope: &str, module: &str) -> Option<ModuleHandle> {
        self.module_cache
            .get(&format!("{scope}:{module}"))
            .map(|entry| entry.value().clone())
    }
}
