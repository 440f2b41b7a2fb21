pub mod adapter;
pub mod error;
pub mod models;
pub mod module;

// Re-export commonly used types
pub use adapter::{
    DEFAULT_SHARE_SCOPE, EntryFetcher, ModuleFactory, RawExport, RemoteContainer, RemoteFormat,
    RuntimeAdapter, VirtualRemoteConfig, VirtualRuntime,
};
pub use error::{AdapterError, AdapterResult, LoadError, LoadResult, ModuleInitError, MountError};
pub use models::{
    Bundler, DEFAULT_MODULE, LoadOptions, RemoteAppRecord, RemoteDescriptor, RemoteState,
    RemoteStatus, module_id, now_unix_ms,
};
pub use module::{InitProps, JsonModule, ModuleHandle, RemoteModule, RouteConfig, RouteEntry};
