//! Concrete federation runtime adapters and the late-bound slot the host
//! fills at startup. Which adapter serves a load is decided by explicit
//! dispatch on the descriptor's bundler tag at registration time, upstream of
//! this module; both variants satisfy [`microfed_api::RuntimeAdapter`].

pub mod binding;
pub mod global;
pub mod virtual_module;

pub use binding::AdapterBinding;
pub use global::GlobalContainerAdapter;
pub use virtual_module::VirtualModuleAdapter;
