use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use microfed_api::{
    AdapterError, AdapterResult, Bundler, ModuleHandle, RemoteFormat, RuntimeAdapter,
    VirtualRemoteConfig, VirtualRuntime,
};

/// Adapter for virtual-module federation runtimes: the host supplies the
/// `set_remote` / `ensure` / `get_remote` / `unwrap_default` primitives and
/// this adapter sequences them.
pub struct VirtualModuleAdapter {
    runtime: Arc<dyn VirtualRuntime>,
    /// scope -> entry URL last declared to the runtime.
    declared: DashMap<String, String>,
}

impl VirtualModuleAdapter {
    pub fn new(runtime: Arc<dyn VirtualRuntime>) -> Self {
        Self {
            runtime,
            declared: DashMap::new(),
        }
    }
}

#[async_trait]
impl RuntimeAdapter for VirtualModuleAdapter {
    fn register_if_needed(
        &self,
        scope: &str,
        entry_url: &str,
        bundler: Bundler,
    ) -> AdapterResult<()> {
        if self
            .declared
            .get(scope)
            .is_some_and(|declared| *declared == entry_url)
        {
            return Ok(());
        }

        debug!(
            target: "microfed_core::adapter",
            scope,
            entry_url,
            ?bundler,
            "declaring remote to virtual runtime"
        );
        self.runtime.set_remote(
            scope,
            VirtualRemoteConfig {
                url: entry_url.to_string(),
                format: RemoteFormat::for_bundler(bundler),
            },
        )?;
        self.declared
            .insert(scope.to_string(), entry_url.to_string());
        Ok(())
    }

    async fn resolve_module(
        &self,
        scope: &str,
        module_path: &str,
        cancel: CancellationToken,
    ) -> AdapterResult<Option<ModuleHandle>> {
        if !self.declared.contains_key(scope) {
            return Err(AdapterError::UnknownScope {
                scope: scope.to_string(),
            });
        }

        self.runtime.ensure(scope).await?;
        if cancel.is_cancelled() {
            return Err(AdapterError::Cancelled);
        }

        let Some(raw) = self.runtime.get_remote(scope, module_path).await? else {
            return Ok(None);
        };
        if cancel.is_cancelled() {
            return Err(AdapterError::Cancelled);
        }
        self.runtime.unwrap_default(raw)
    }
}
