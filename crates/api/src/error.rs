use thiserror::Error;

/// Errors surfaced by a federation runtime adapter.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AdapterError {
    #[error("remote scope \"{scope}\" has not been registered with the runtime")]
    UnknownScope { scope: String },
    #[error("failed to fetch remote entry {url}: {message}")]
    Entry { url: String, message: String },
    #[error("remote container \"{scope}\" failed to initialize: {message}")]
    ContainerInit { scope: String, message: String },
    #[error("federation runtime error: {0}")]
    Runtime(String),
    #[error("resolution cancelled")]
    Cancelled,
}

pub type AdapterResult<T> = std::result::Result<T, AdapterError>;

/// Failure variants of the loader's discriminated result. Every public load
/// operation resolves to one of these instead of panicking or escaping an
/// adapter error unclassified.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LoadError {
    #[error("remote \"{0}\" is not registered")]
    NotRegistered(String),
    #[error("federation runtime not initialized; bind an adapter before loading")]
    NotInitialized,
    #[error("remote loading timed out after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },
    #[error("failed to load module \"{module_id}\": module returned null")]
    NullModule { module_id: String },
    #[error(transparent)]
    Adapter(#[from] AdapterError),
}

pub type LoadResult<T> = std::result::Result<T, LoadError>;

/// Failure reported by a resolved module's post-load init hook.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct ModuleInitError(pub String);

/// Errors of the consumer-facing mount state machine. A structurally invalid
/// module or a failing init hook is an error outcome even when the loader
/// itself reported success.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MountError {
    #[error(transparent)]
    Load(#[from] LoadError),
    #[error(
        "remote \"{scope}\" does not export a valid routeConfig; \
         expected {{ routeConfig: {{ routes: [...] }} }}"
    )]
    InvalidShape { scope: String },
    #[error("remote \"{scope}\" init hook failed: {message}")]
    Init { scope: String, message: String },
}
