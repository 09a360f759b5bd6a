//! catalog-core: transport-agnostic service container for the catalog backend.
//!
//! Services implement [`CatalogService`], get registered on a [`CatalogApp`],
//! and are called through a [`ServiceHandle`] which runs the hook pipeline
//! (around → before → service → after, error hooks on failure).

pub mod app;
pub mod config;
pub mod context;
pub mod errors;
pub mod hooks;
pub mod service;
pub mod validation;

pub use app::{CatalogApp, ServiceHandle};
pub use config::{CatalogConfig, ConfigSnapshot};
pub use context::RequestContext;
pub use errors::{CatalogError, ErrorKind};
pub use hooks::{
    AfterHook, AroundHook, BeforeHook, ErrorHook, HookContext, HookFut, HookResult, Next,
    ServiceHooks,
};
pub use service::{CatalogService, ServiceCapabilities, ServiceMethodKind};
pub use validation::FieldErrors;
