use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use microfed_api::{
    Bundler, DEFAULT_MODULE, InitProps, LoadOptions, ModuleHandle, MountError, RemoteDescriptor,
    RouteConfig,
};

use crate::loader::RemoteLoader;

/// Identity of one mount. Any change of these inputs restarts the state
/// machine from scratch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MountRequest {
    /// App name, used for the routing base path.
    pub name: String,
    pub url: String,
    pub scope: String,
    pub module: String,
    pub bundler: Bundler,
}

impl MountRequest {
    pub fn new(name: impl Into<String>, url: impl Into<String>, scope: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
            scope: scope.into(),
            module: DEFAULT_MODULE.to_string(),
            bundler: Bundler::default(),
        }
    }

    pub fn with_module(mut self, module: impl Into<String>) -> Self {
        self.module = module.into();
        self
    }

    pub fn with_bundler(mut self, bundler: Bundler) -> Self {
        self.bundler = bundler;
        self
    }

    /// Base path the app is mounted under.
    pub fn base_path(&self) -> String {
        format!("/apps/{}", self.name)
    }
}

/// A successfully mounted remote, ready for the host's renderer.
#[derive(Clone)]
pub struct MountedApp {
    pub request: MountRequest,
    pub route_config: RouteConfig,
    pub module: ModuleHandle,
}

/// Failure context for the error panel: which remote, where from, and why.
/// A failed remote never silently renders as empty.
#[derive(Debug, Clone)]
pub struct MountFailure {
    pub scope: String,
    pub url: String,
    pub error: MountError,
}

impl MountFailure {
    fn new(request: &MountRequest, error: MountError) -> Self {
        Self {
            scope: request.scope.clone(),
            url: request.url.clone(),
            error,
        }
    }
}

/// Render states exposed to the UI layer.
#[derive(Clone, Default)]
pub enum MountState {
    /// No mount has been requested, or the app was unmounted.
    #[default]
    Idle,
    Loading,
    Loaded(MountedApp),
    Error(MountFailure),
}

/// Consumer-facing loading state machine: drives one load per request
/// identity and publishes `Loading -> Loaded | Error` on a watch channel.
///
/// Cancellation is "ignore the stale result": a remount or unmount bumps the
/// generation so an in-flight load's outcome is discarded, and cancels the
/// previous token so adapters can stop at their next suspension point. There
/// is no automatic retry at this layer; retries belong to the loader.
pub struct MicroAppMount {
    loader: Arc<RemoteLoader>,
    options: LoadOptions,
    tx: Arc<watch::Sender<MountState>>,
    generation: Arc<AtomicU64>,
    cancel: Mutex<CancellationToken>,
}

impl MicroAppMount {
    pub fn new(loader: Arc<RemoteLoader>) -> Self {
        Self::with_options(loader, LoadOptions::default())
    }

    pub fn with_options(loader: Arc<RemoteLoader>, options: LoadOptions) -> Self {
        let (tx, _rx) = watch::channel(MountState::Idle);
        Self {
            loader,
            options,
            tx: Arc::new(tx),
            generation: Arc::new(AtomicU64::new(0)),
            cancel: Mutex::new(CancellationToken::new()),
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<MountState> {
        self.tx.subscribe()
    }

    pub fn state(&self) -> MountState {
        self.tx.borrow().clone()
    }

    /// Start (or restart, on identity change) the machine: enter `Loading`
    /// immediately and drive the load on a detached task.
    pub fn mount(&self, request: MountRequest) {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let token = CancellationToken::new();
        {
            let mut current = self.cancel.lock().expect("mount token poisoned");
            current.cancel();
            *current = token.clone();
        }
        self.tx.send_replace(MountState::Loading);

        let loader = Arc::clone(&self.loader);
        let options = self.options;
        let tx = Arc::clone(&self.tx);
        let live_generation = Arc::clone(&self.generation);
        tokio::spawn(async move {
            let outcome = drive(loader, &request, options, token).await;
            if live_generation.load(Ordering::SeqCst) != generation {
                debug!(
                    target: "microfed_core::mount",
                    scope = %request.scope,
                    "discarding stale mount result"
                );
                return;
            }
            tx.send_replace(outcome);
        });
    }

    /// Drop back to `Idle`. The in-flight load, if any, becomes stale and its
    /// result is discarded.
    pub fn unmount(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
        self.cancel.lock().expect("mount token poisoned").cancel();
        self.tx.send_replace(MountState::Idle);
    }
}

async fn drive(
    loader: Arc<RemoteLoader>,
    request: &MountRequest,
    options: LoadOptions,
    cancel: CancellationToken,
) -> MountState {
    let descriptor = RemoteDescriptor::ephemeral(
        &request.url,
        &request.scope,
        &request.module,
        request.bundler,
    );

    let module = match loader
        .load_by_config_cancellable(&descriptor, options, &cancel)
        .await
    {
        Ok(module) => module,
        Err(error) => {
            return MountState::Error(MountFailure::new(request, MountError::Load(error)));
        }
    };

    // The loader reported success; the shape contract is still ours to check.
    let Some(route_config) = module.route_config() else {
        return MountState::Error(MountFailure::new(
            request,
            MountError::InvalidShape {
                scope: request.scope.clone(),
            },
        ));
    };

    let props = InitProps {
        base_path: request.base_path(),
    };
    if let Err(failure) = module.init(props).await {
        return MountState::Error(MountFailure::new(
            request,
            MountError::Init {
                scope: request.scope.clone(),
                message: failure.0,
            },
        ));
    }

    MountState::Loaded(MountedApp {
        request: request.clone(),
        route_config,
        module,
    })
}
