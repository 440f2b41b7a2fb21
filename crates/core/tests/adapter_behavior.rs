mod common;

use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use common::{routes_export, routes_module};
use microfed_api::{
    AdapterError, AdapterResult, Bundler, EntryFetcher, JsonModule, ModuleFactory, ModuleHandle,
    RawExport, RemoteContainer, RemoteFormat, RuntimeAdapter, VirtualRemoteConfig, VirtualRuntime,
};
use microfed_core::{GlobalContainerAdapter, VirtualModuleAdapter};

struct MockContainer {
    init_calls: AtomicUsize,
    get_calls: Mutex<Vec<String>>,
    fail_init: bool,
    missing_export: bool,
}

impl MockContainer {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            init_calls: AtomicUsize::new(0),
            get_calls: Mutex::new(Vec::new()),
            fail_init: false,
            missing_export: false,
        })
    }

    fn failing_init() -> Arc<Self> {
        Arc::new(Self {
            fail_init: true,
            ..Self::base()
        })
    }

    fn without_export() -> Arc<Self> {
        Arc::new(Self {
            missing_export: true,
            ..Self::base()
        })
    }

    fn base() -> Self {
        Self {
            init_calls: AtomicUsize::new(0),
            get_calls: Mutex::new(Vec::new()),
            fail_init: false,
            missing_export: false,
        }
    }
}

#[async_trait]
impl RemoteContainer for MockContainer {
    async fn init(&self, share_scope: &str) -> AdapterResult<()> {
        assert_eq!(share_scope, "default");
        self.init_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_init {
            return Err(AdapterError::ContainerInit {
                scope: "demoApp".into(),
                message: "share scope mismatch".into(),
            });
        }
        Ok(())
    }

    async fn get(&self, module_path: &str) -> AdapterResult<Option<ModuleFactory>> {
        self.get_calls.lock().unwrap().push(module_path.to_string());
        if self.missing_export {
            return Ok(None);
        }
        let module: ModuleHandle = routes_module();
        Ok(Some(Box::new(move || module)))
    }
}

struct MockFetcher {
    fetched: Mutex<Vec<String>>,
    container: Arc<MockContainer>,
}

impl MockFetcher {
    fn new(container: Arc<MockContainer>) -> Arc<Self> {
        Arc::new(Self {
            fetched: Mutex::new(Vec::new()),
            container,
        })
    }

    fn fetched(&self) -> Vec<String> {
        self.fetched.lock().unwrap().clone()
    }
}

#[async_trait]
impl EntryFetcher for MockFetcher {
    async fn fetch(
        &self,
        entry_url: &str,
        _cancel: &CancellationToken,
    ) -> AdapterResult<Arc<dyn RemoteContainer>> {
        self.fetched.lock().unwrap().push(entry_url.to_string());
        Ok(self.container.clone())
    }
}

#[tokio::test]
async fn container_is_fetched_and_initialized_once_per_scope() {
    let container = MockContainer::new();
    let fetcher = MockFetcher::new(Arc::clone(&container));
    let adapter = GlobalContainerAdapter::new(fetcher.clone());

    adapter
        .register_if_needed(
            "demoApp",
            "http://localhost:3004/assets/remoteEntry.js",
            Bundler::Webpack,
        )
        .unwrap();

    for _ in 0..2 {
        let module = adapter
            .resolve_module("demoApp", "./routes", CancellationToken::new())
            .await
            .unwrap()
            .expect("module resolves");
        assert!(module.route_config().is_some());
    }

    assert_eq!(
        fetcher.fetched(),
        vec!["http://localhost:3004/assets/remoteEntry.js".to_string()]
    );
    assert_eq!(container.init_calls.load(Ordering::SeqCst), 1);
    assert_eq!(
        *container.get_calls.lock().unwrap(),
        vec!["./routes".to_string(), "./routes".to_string()]
    );
}

#[tokio::test]
async fn unregistered_scope_is_an_adapter_error() {
    let adapter = GlobalContainerAdapter::new(MockFetcher::new(MockContainer::new()));

    let error = adapter
        .resolve_module("ghostApp", "./routes", CancellationToken::new())
        .await
        .unwrap_err();
    assert_eq!(
        error,
        AdapterError::UnknownScope {
            scope: "ghostApp".into()
        }
    );
}

#[tokio::test]
async fn reregistering_a_new_entry_url_drops_the_cached_container() {
    let container = MockContainer::new();
    let fetcher = MockFetcher::new(Arc::clone(&container));
    let adapter = GlobalContainerAdapter::new(fetcher.clone());

    adapter
        .register_if_needed("demoApp", "http://a/remoteEntry.js", Bundler::Vite)
        .unwrap();
    adapter
        .resolve_module("demoApp", "./routes", CancellationToken::new())
        .await
        .unwrap();

    // Same URL again: container kept.
    adapter
        .register_if_needed("demoApp", "http://a/remoteEntry.js", Bundler::Vite)
        .unwrap();
    adapter
        .resolve_module("demoApp", "./routes", CancellationToken::new())
        .await
        .unwrap();
    assert_eq!(fetcher.fetched().len(), 1);

    // Moved remote: next resolve re-imports the entry artifact.
    adapter
        .register_if_needed("demoApp", "http://b/remoteEntry.js", Bundler::Vite)
        .unwrap();
    adapter
        .resolve_module("demoApp", "./routes", CancellationToken::new())
        .await
        .unwrap();
    assert_eq!(
        fetcher.fetched(),
        vec![
            "http://a/remoteEntry.js".to_string(),
            "http://b/remoteEntry.js".to_string()
        ]
    );
}

#[tokio::test]
async fn missing_export_resolves_to_none() {
    let adapter =
        GlobalContainerAdapter::new(MockFetcher::new(MockContainer::without_export()));
    adapter
        .register_if_needed("demoApp", "http://a/remoteEntry.js", Bundler::Vite)
        .unwrap();

    let resolved = adapter
        .resolve_module("demoApp", "./missing", CancellationToken::new())
        .await
        .unwrap();
    assert!(resolved.is_none());
}

#[tokio::test]
async fn failed_container_init_is_not_cached() {
    let container = MockContainer::failing_init();
    let fetcher = MockFetcher::new(Arc::clone(&container));
    let adapter = GlobalContainerAdapter::new(fetcher.clone());
    adapter
        .register_if_needed("demoApp", "http://a/remoteEntry.js", Bundler::Vite)
        .unwrap();

    for _ in 0..2 {
        let error = adapter
            .resolve_module("demoApp", "./routes", CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(error, AdapterError::ContainerInit { .. }));
    }
    // Each attempt re-imports, since no initialized container was kept.
    assert_eq!(fetcher.fetched().len(), 2);
}

#[derive(Default)]
struct MockVirtualRuntime {
    set_remote_calls: Mutex<Vec<(String, VirtualRemoteConfig)>>,
    ensure_calls: Mutex<Vec<String>>,
    get_calls: Mutex<Vec<(String, String)>>,
    missing_export: bool,
}

impl MockVirtualRuntime {
    fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    fn without_export() -> Arc<Self> {
        Arc::new(Self {
            missing_export: true,
            ..Self::default()
        })
    }
}

#[async_trait]
impl VirtualRuntime for MockVirtualRuntime {
    fn set_remote(&self, name: &str, config: VirtualRemoteConfig) -> AdapterResult<()> {
        self.set_remote_calls
            .lock()
            .unwrap()
            .push((name.to_string(), config));
        Ok(())
    }

    async fn ensure(&self, name: &str) -> AdapterResult<()> {
        self.ensure_calls.lock().unwrap().push(name.to_string());
        Ok(())
    }

    async fn get_remote(
        &self,
        scope: &str,
        module_path: &str,
    ) -> AdapterResult<Option<RawExport>> {
        self.get_calls
            .lock()
            .unwrap()
            .push((scope.to_string(), module_path.to_string()));
        if self.missing_export {
            return Ok(None);
        }
        Ok(Some(Box::new(JsonModule::new(routes_export()))))
    }

    fn unwrap_default(&self, raw: RawExport) -> AdapterResult<Option<ModuleHandle>> {
        let module = raw
            .downcast::<JsonModule>()
            .map_err(|_| AdapterError::Runtime("unexpected export shape".into()))?;
        Ok(Some(Arc::new(*module)))
    }
}

#[tokio::test]
async fn remote_declaration_is_idempotent_per_scope_and_url() {
    let runtime = MockVirtualRuntime::new();
    let adapter = VirtualModuleAdapter::new(runtime.clone());

    adapter
        .register_if_needed("demoApp", "http://a/remoteEntry.js", Bundler::Vite)
        .unwrap();
    adapter
        .register_if_needed("demoApp", "http://a/remoteEntry.js", Bundler::Vite)
        .unwrap();
    adapter
        .register_if_needed("demoApp", "http://b/assets/remoteEntry.js", Bundler::Webpack)
        .unwrap();

    let calls = runtime.set_remote_calls.lock().unwrap().clone();
    assert_eq!(calls.len(), 2);
    assert_eq!(
        calls[0].1,
        VirtualRemoteConfig {
            url: "http://a/remoteEntry.js".into(),
            format: RemoteFormat::Esm,
        }
    );
    assert_eq!(
        calls[1].1,
        VirtualRemoteConfig {
            url: "http://b/assets/remoteEntry.js".into(),
            format: RemoteFormat::Var,
        }
    );
}

#[tokio::test]
async fn resolution_sequences_ensure_get_unwrap() {
    let runtime = MockVirtualRuntime::new();
    let adapter = VirtualModuleAdapter::new(runtime.clone());
    adapter
        .register_if_needed("demoApp", "http://a/remoteEntry.js", Bundler::Vite)
        .unwrap();

    let module = adapter
        .resolve_module("demoApp", "./routes", CancellationToken::new())
        .await
        .unwrap()
        .expect("module resolves");

    assert!(module.route_config().is_some());
    assert_eq!(*runtime.ensure_calls.lock().unwrap(), vec!["demoApp"]);
    assert_eq!(
        *runtime.get_calls.lock().unwrap(),
        vec![("demoApp".to_string(), "./routes".to_string())]
    );
}

#[tokio::test]
async fn undeclared_scope_is_an_adapter_error() {
    let adapter = VirtualModuleAdapter::new(MockVirtualRuntime::new());

    let error = adapter
        .resolve_module("ghostApp", "./routes", CancellationToken::new())
        .await
        .unwrap_err();
    assert_eq!(
        error,
        AdapterError::UnknownScope {
            scope: "ghostApp".into()
        }
    );
}

#[tokio::test]
async fn missing_virtual_export_resolves_to_none() {
    let runtime = MockVirtualRuntime::without_export();
    let adapter = VirtualModuleAdapter::new(runtime);
    adapter
        .register_if_needed("demoApp", "http://a/remoteEntry.js", Bundler::Vite)
        .unwrap();

    let resolved = adapter
        .resolve_module("demoApp", "./missing", CancellationToken::new())
        .await
        .unwrap();
    assert!(resolved.is_none());
}
