use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;

use crate::config::ConfigSnapshot;
use crate::context::RequestContext;
use crate::service::ServiceMethodKind;

/// What a service call produced.
#[derive(Debug, Clone)]
pub enum HookResult<R> {
    One(R),
    Many(Vec<R>),
}

/// Everything a hook can see (and change) about one service call.
///
/// Setting `result` in a before hook skips the service call. Clearing
/// `error` in an error hook turns the call into a success, as long as a
/// result is set too.
#[derive(Debug)]
pub struct HookContext<R, D, P> {
    pub request: RequestContext,
    pub service: String,
    pub method: ServiceMethodKind,
    pub id: Option<String>,
    pub params: P,
    pub data: Option<D>,
    pub result: Option<HookResult<R>>,
    pub error: Option<anyhow::Error>,
    pub config: ConfigSnapshot,
}

impl<R, D, P> HookContext<R, D, P> {
    pub fn new(
        request: RequestContext,
        service: impl Into<String>,
        method: ServiceMethodKind,
        params: P,
        config: ConfigSnapshot,
    ) -> Self {
        Self {
            request,
            service: service.into(),
            method,
            id: None,
            params,
            data: None,
            result: None,
            error: None,
            config,
        }
    }
}

pub type HookFut<'a> = Pin<Box<dyn Future<Output = Result<()>> + Send + 'a>>;

type NextFn<R, D, P> =
    Box<dyn for<'a> FnOnce(&'a mut HookContext<R, D, P>) -> HookFut<'a> + Send>;

/// The rest of the pipeline, handed to an around hook.
pub struct Next<R, D, P> {
    call: NextFn<R, D, P>,
}

impl<R, D, P> Next<R, D, P> {
    pub fn new<F>(call: F) -> Self
    where
        F: for<'a> FnOnce(&'a mut HookContext<R, D, P>) -> HookFut<'a> + Send + 'static,
    {
        Self {
            call: Box::new(call),
        }
    }

    pub async fn run(self, ctx: &mut HookContext<R, D, P>) -> Result<()> {
        (self.call)(ctx).await
    }
}

#[async_trait]
pub trait BeforeHook<R, D, P>: Send + Sync
where
    R: Send + 'static,
    D: Send + 'static,
    P: Send + 'static,
{
    async fn run(&self, ctx: &mut HookContext<R, D, P>) -> Result<()>;
}

#[async_trait]
pub trait AfterHook<R, D, P>: Send + Sync
where
    R: Send + 'static,
    D: Send + 'static,
    P: Send + 'static,
{
    async fn run(&self, ctx: &mut HookContext<R, D, P>) -> Result<()>;
}

/// Runs once the call has failed; `ctx.error` is set.
#[async_trait]
pub trait ErrorHook<R, D, P>: Send + Sync
where
    R: Send + 'static,
    D: Send + 'static,
    P: Send + 'static,
{
    async fn run(&self, ctx: &mut HookContext<R, D, P>) -> Result<()>;
}

/// Wraps everything inside it. Must call `next.run(ctx)` to continue.
#[async_trait]
pub trait AroundHook<R, D, P>: Send + Sync
where
    R: Send + 'static,
    D: Send + 'static,
    P: Send + 'static,
{
    async fn run(&self, ctx: &mut HookContext<R, D, P>, next: Next<R, D, P>) -> Result<()>;
}

type ByMethod<H> = HashMap<ServiceMethodKind, Vec<Arc<H>>>;

/// Hook registrations, either app-wide or for one service.
pub struct ServiceHooks<R, D, P>
where
    R: Send + 'static,
    D: Send + 'static,
    P: Send + 'static,
{
    pub around_all: Vec<Arc<dyn AroundHook<R, D, P>>>,
    pub before_all: Vec<Arc<dyn BeforeHook<R, D, P>>>,
    pub after_all: Vec<Arc<dyn AfterHook<R, D, P>>>,
    pub error_all: Vec<Arc<dyn ErrorHook<R, D, P>>>,

    pub around_by_method: ByMethod<dyn AroundHook<R, D, P>>,
    pub before_by_method: ByMethod<dyn BeforeHook<R, D, P>>,
    pub after_by_method: ByMethod<dyn AfterHook<R, D, P>>,
    pub error_by_method: ByMethod<dyn ErrorHook<R, D, P>>,
}

impl<R, D, P> Default for ServiceHooks<R, D, P>
where
    R: Send + 'static,
    D: Send + 'static,
    P: Send + 'static,
{
    fn default() -> Self {
        Self {
            around_all: Vec::new(),
            before_all: Vec::new(),
            after_all: Vec::new(),
            error_all: Vec::new(),
            around_by_method: HashMap::new(),
            before_by_method: HashMap::new(),
            after_by_method: HashMap::new(),
            error_by_method: HashMap::new(),
        }
    }
}

impl<R, D, P> ServiceHooks<R, D, P>
where
    R: Send + 'static,
    D: Send + 'static,
    P: Send + 'static,
{
    pub fn new() -> Self {
        Self::default()
    }

    pub fn around_all(&mut self, hook: Arc<dyn AroundHook<R, D, P>>) -> &mut Self {
        self.around_all.push(hook);
        self
    }

    pub fn before_all(&mut self, hook: Arc<dyn BeforeHook<R, D, P>>) -> &mut Self {
        self.before_all.push(hook);
        self
    }

    pub fn after_all(&mut self, hook: Arc<dyn AfterHook<R, D, P>>) -> &mut Self {
        self.after_all.push(hook);
        self
    }

    pub fn error_all(&mut self, hook: Arc<dyn ErrorHook<R, D, P>>) -> &mut Self {
        self.error_all.push(hook);
        self
    }

    pub fn around(
        &mut self,
        method: ServiceMethodKind,
        hook: Arc<dyn AroundHook<R, D, P>>,
    ) -> &mut Self {
        self.around_by_method.entry(method).or_default().push(hook);
        self
    }

    pub fn before(
        &mut self,
        method: ServiceMethodKind,
        hook: Arc<dyn BeforeHook<R, D, P>>,
    ) -> &mut Self {
        self.before_by_method.entry(method).or_default().push(hook);
        self
    }

    pub fn after(
        &mut self,
        method: ServiceMethodKind,
        hook: Arc<dyn AfterHook<R, D, P>>,
    ) -> &mut Self {
        self.after_by_method.entry(method).or_default().push(hook);
        self
    }

    pub fn error(
        &mut self,
        method: ServiceMethodKind,
        hook: Arc<dyn ErrorHook<R, D, P>>,
    ) -> &mut Self {
        self.error_by_method.entry(method).or_default().push(hook);
        self
    }

    pub fn before_create(&mut self, hook: Arc<dyn BeforeHook<R, D, P>>) -> &mut Self {
        self.before(ServiceMethodKind::Create, hook)
    }

    pub fn before_patch(&mut self, hook: Arc<dyn BeforeHook<R, D, P>>) -> &mut Self {
        self.before(ServiceMethodKind::Patch, hook)
    }
}

/// `*_all` hooks first, then the ones registered for `method`.
pub(crate) fn collect_method_hooks<H: ?Sized>(
    all: &[Arc<H>],
    by_method: &HashMap<ServiceMethodKind, Vec<Arc<H>>>,
    method: ServiceMethodKind,
) -> Vec<Arc<H>> {
    let mut out: Vec<Arc<H>> = all.to_vec();
    if let Some(v) = by_method.get(&method) {
        out.extend(v.iter().cloned());
    }
    out
}
