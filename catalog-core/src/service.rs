use anyhow::Result;
use async_trait::async_trait;

use crate::context::RequestContext;
use crate::errors::CatalogError;

/// The service methods a catalog service can expose.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ServiceMethodKind {
    Find,
    Get,
    Create,
    Patch,
    Remove,
}

impl ServiceMethodKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ServiceMethodKind::Find => "find",
            ServiceMethodKind::Get => "get",
            ServiceMethodKind::Create => "create",
            ServiceMethodKind::Patch => "patch",
            ServiceMethodKind::Remove => "remove",
        }
    }
}

impl std::fmt::Display for ServiceMethodKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which methods a service wants reachable from a transport.
///
/// The REST adapter mounts routes only for the methods listed here.
#[derive(Debug, Clone)]
pub struct ServiceCapabilities {
    pub allowed_methods: Vec<ServiceMethodKind>,
}

impl ServiceCapabilities {
    /// find, get, create, patch, remove.
    pub fn standard_crud() -> Self {
        use ServiceMethodKind::*;
        Self {
            allowed_methods: vec![Find, Get, Create, Patch, Remove],
        }
    }

    pub fn from_methods(methods: Vec<ServiceMethodKind>) -> Self {
        Self {
            allowed_methods: methods,
        }
    }

    pub fn allows(&self, method: ServiceMethodKind) -> bool {
        self.allowed_methods.contains(&method)
    }
}

fn not_implemented(method: ServiceMethodKind) -> anyhow::Error {
    CatalogError::not_implemented(format!("Method not implemented: {method}")).into_anyhow()
}

/// Core service trait.
///
/// - `R` is the record returned to callers
/// - `D` is the inbound payload for `create` and `patch`
/// - `P` is the per-call params type
///
/// Every method defaults to a `NotImplemented` error, so a service only
/// overrides what it supports.
#[async_trait]
pub trait CatalogService<R, D = R, P = ()>: Send + Sync
where
    R: Send + 'static,
    D: Send + 'static,
    P: Send + 'static,
{
    fn capabilities(&self) -> ServiceCapabilities {
        ServiceCapabilities::standard_crud()
    }

    async fn find(&self, _ctx: &RequestContext, _params: P) -> Result<Vec<R>> {
        Err(not_implemented(ServiceMethodKind::Find))
    }

    async fn get(&self, _ctx: &RequestContext, _id: &str, _params: P) -> Result<R> {
        Err(not_implemented(ServiceMethodKind::Get))
    }

    async fn create(&self, _ctx: &RequestContext, _data: D, _params: P) -> Result<R> {
        Err(not_implemented(ServiceMethodKind::Create))
    }

    /// Partial update. Fields absent from `data` stay as they are.
    async fn patch(&self, _ctx: &RequestContext, _id: &str, _data: D, _params: P) -> Result<R> {
        Err(not_implemented(ServiceMethodKind::Patch))
    }

    async fn remove(&self, _ctx: &RequestContext, _id: &str, _params: P) -> Result<R> {
        Err(not_implemented(ServiceMethodKind::Remove))
    }
}
