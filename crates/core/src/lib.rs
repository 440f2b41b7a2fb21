//! Remote module loading machinery for the microfed host.
//!
//! The pieces layer bottom-up:
//!
//! - **Registry**: synchronous bookkeeping of declared remotes and their
//!   lifecycle status.
//! - **Adapters**: the two concrete federation protocols behind one
//!   [`microfed_api::RuntimeAdapter`] call site, plus the late-bound slot the
//!   host fills at startup.
//! - **Loader**: cache-or-fetch with per-attempt timeout and uniform retry.
//! - **Mount**: the consumer-facing loading state machine.

pub mod adapter;
pub mod loader;
pub mod logging;
pub mod mount;
pub mod registry;

pub use adapter::{AdapterBinding, GlobalContainerAdapter, VirtualModuleAdapter};
pub use loader::RemoteLoader;
pub use mount::{MicroAppMount, MountFailure, MountRequest, MountState, MountedApp};
pub use registry::RemoteRegistry;
