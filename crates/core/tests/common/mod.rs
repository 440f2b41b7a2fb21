#![allow(dead_code)]

use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use serde_json::{Value, json};
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;

use microfed_api::{
    AdapterError, AdapterResult, Bundler, InitProps, JsonModule, ModuleHandle, ModuleInitError,
    RemoteModule, RouteConfig, RuntimeAdapter,
};
use microfed_core::{AdapterBinding, RemoteLoader, RemoteRegistry};

/// Export map of a well-formed remote with a single root route.
pub fn routes_export() -> Value {
    json!({
        "routeConfig": {
            "routes": [{ "path": "/", "component": "Home" }]
        }
    })
}

pub fn routes_module() -> ModuleHandle {
    JsonModule::new(routes_export()).into_handle()
}

pub enum ResolveBehavior {
    /// Resolve to a fresh module built from this export map.
    Module(Value),
    /// Resolve to the given handle.
    Handle(ModuleHandle),
    /// Resolve successfully to nothing.
    Null,
    /// Fail with a runtime error.
    Fail(String),
    /// Never settle.
    Pending,
    /// Block until a permit is released, then resolve to this export map.
    Gated(Arc<Semaphore>, Value),
}

/// Adapter double that records registrations and resolution attempts.
pub struct ScriptedAdapter {
    behavior: ResolveBehavior,
    registrations: Mutex<Vec<(String, String, Bundler)>>,
    resolve_calls: AtomicUsize,
}

impl ScriptedAdapter {
    pub fn with_behavior(behavior: ResolveBehavior) -> Arc<Self> {
        Arc::new(Self {
            behavior,
            registrations: Mutex::new(Vec::new()),
            resolve_calls: AtomicUsize::new(0),
        })
    }

    pub fn succeeding() -> Arc<Self> {
        Self::with_behavior(ResolveBehavior::Module(routes_export()))
    }

    pub fn null() -> Arc<Self> {
        Self::with_behavior(ResolveBehavior::Null)
    }

    pub fn failing(message: &str) -> Arc<Self> {
        Self::with_behavior(ResolveBehavior::Fail(message.to_string()))
    }

    pub fn pending() -> Arc<Self> {
        Self::with_behavior(ResolveBehavior::Pending)
    }

    pub fn gated(gate: Arc<Semaphore>) -> Arc<Self> {
        Self::with_behavior(ResolveBehavior::Gated(gate, routes_export()))
    }

    pub fn registrations(&self) -> Vec<(String, String, Bundler)> {
        self.registrations.lock().unwrap().clone()
    }

    pub fn resolve_count(&self) -> usize {
        self.resolve_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RuntimeAdapter for ScriptedAdapter {
    fn register_if_needed(
        &self,
        scope: &str,
        entry_url: &str,
        bundler: Bundler,
    ) -> AdapterResult<()> {
        self.registrations
            .lock()
            .unwrap()
            .push((scope.to_string(), entry_url.to_string(), bundler));
        Ok(())
    }

    async fn resolve_module(
        &self,
        _scope: &str,
        _module_path: &str,
        _cancel: CancellationToken,
    ) -> AdapterResult<Option<ModuleHandle>> {
        self.resolve_calls.fetch_add(1, Ordering::SeqCst);
        match &self.behavior {
            ResolveBehavior::Module(exports) => {
                Ok(Some(JsonModule::new(exports.clone()).into_handle()))
            }
            ResolveBehavior::Handle(handle) => Ok(Some(handle.clone())),
            ResolveBehavior::Null => Ok(None),
            ResolveBehavior::Fail(message) => Err(AdapterError::Runtime(message.clone())),
            ResolveBehavior::Pending => {
                std::future::pending::<()>().await;
                unreachable!()
            }
            ResolveBehavior::Gated(gate, exports) => {
                gate.acquire().await.expect("gate closed").forget();
                Ok(Some(JsonModule::new(exports.clone()).into_handle()))
            }
        }
    }
}

/// Loader wired to the given adapter with a fresh registry.
pub fn loader_with(adapter: Arc<ScriptedAdapter>) -> (Arc<RemoteLoader>, Arc<RemoteRegistry>) {
    let registry = Arc::new(RemoteRegistry::new());
    let binding = Arc::new(AdapterBinding::bound(adapter));
    let loader = Arc::new(RemoteLoader::new(Arc::clone(&registry), binding));
    (loader, registry)
}

/// Module whose init hook records the props it was invoked with.
#[derive(Debug)]
pub struct RecordingInitModule {
    pub seen_props: Mutex<Vec<InitProps>>,
}

impl RecordingInitModule {
    pub fn handle() -> Arc<Self> {
        Arc::new(Self {
            seen_props: Mutex::new(Vec::new()),
        })
    }
}

#[async_trait]
impl RemoteModule for RecordingInitModule {
    fn route_config(&self) -> Option<RouteConfig> {
        JsonModule::new(routes_export()).route_config()
    }

    async fn init(&self, props: InitProps) -> Result<(), ModuleInitError> {
        self.seen_props.lock().unwrap().push(props);
        Ok(())
    }
}

/// Module with a valid shape but a failing init hook.
#[derive(Debug)]
pub struct FailingInitModule;

#[async_trait]
impl RemoteModule for FailingInitModule {
    fn route_config(&self) -> Option<RouteConfig> {
        JsonModule::new(routes_export()).route_config()
    }

    async fn init(&self, _props: InitProps) -> Result<(), ModuleInitError> {
        Err(ModuleInitError("backend unreachable".to_string()))
    }
}
