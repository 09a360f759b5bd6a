use std::collections::HashMap;
use std::sync::Arc;

use anyhow::{anyhow, Result};
use parking_lot::RwLock;

use crate::config::{CatalogConfig, ConfigSnapshot};
use crate::context::RequestContext;
use crate::errors::CatalogError;
use crate::hooks::{
    collect_method_hooks, AfterHook, AroundHook, BeforeHook, ErrorHook, HookContext, HookFut,
    HookResult, Next, ServiceHooks,
};
use crate::service::{CatalogService, ServiceCapabilities, ServiceMethodKind};

struct CatalogAppInner<R, D, P>
where
    R: Send + 'static,
    D: Send + 'static,
    P: Send + Clone + 'static,
{
    services: RwLock<HashMap<String, Arc<dyn CatalogService<R, D, P>>>>,
    global_hooks: RwLock<ServiceHooks<R, D, P>>,
    service_hooks: RwLock<HashMap<String, ServiceHooks<R, D, P>>>,
    config: RwLock<CatalogConfig>,
}

/// Central container: registered services, app hooks, per-service hooks
/// and configuration. Cheap to clone.
pub struct CatalogApp<R, D = R, P = ()>
where
    R: Send + 'static,
    D: Send + 'static,
    P: Send + Clone + 'static,
{
    inner: Arc<CatalogAppInner<R, D, P>>,
}

type HooksForMethod<R, D, P> = (
    Vec<Arc<dyn AroundHook<R, D, P>>>,
    Vec<Arc<dyn BeforeHook<R, D, P>>>,
    Vec<Arc<dyn AfterHook<R, D, P>>>,
    Vec<Arc<dyn ErrorHook<R, D, P>>>,
);

type ServiceCall<R, D, P> = Box<
    dyn for<'a> FnOnce(Arc<dyn CatalogService<R, D, P>>, &'a mut HookContext<R, D, P>) -> HookFut<'a>
        + Send,
>;

impl<R, D, P> Default for CatalogApp<R, D, P>
where
    R: Send + 'static,
    D: Send + 'static,
    P: Send + Clone + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<R, D, P> Clone for CatalogApp<R, D, P>
where
    R: Send + 'static,
    D: Send + 'static,
    P: Send + Clone + 'static,
{
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<R, D, P> CatalogApp<R, D, P>
where
    R: Send + 'static,
    D: Send + 'static,
    P: Send + Clone + 'static,
{
    pub fn new() -> Self {
        Self {
            inner: Arc::new(CatalogAppInner {
                services: RwLock::new(HashMap::new()),
                global_hooks: RwLock::new(ServiceHooks::new()),
                service_hooks: RwLock::new(HashMap::new()),
                config: RwLock::new(CatalogConfig::new()),
            }),
        }
    }

    pub fn register_service<S>(&self, name: S, service: Arc<dyn CatalogService<R, D, P>>)
    where
        S: Into<String>,
    {
        self.inner.services.write().insert(name.into(), service);
    }

    /// App-wide hooks, run before any per-service hooks.
    pub fn hooks<F>(&self, f: F)
    where
        F: FnOnce(&mut ServiceHooks<R, D, P>),
    {
        let mut g = self.inner.global_hooks.write();
        f(&mut g);
    }

    fn configure_service_hooks<F>(&self, service_name: &str, f: F)
    where
        F: FnOnce(&mut ServiceHooks<R, D, P>),
    {
        let mut map = self.inner.service_hooks.write();
        let hooks = map.entry(service_name.to_string()).or_default();
        f(hooks);
    }

    pub fn service(&self, name: &str) -> Result<ServiceHandle<R, D, P>> {
        let svc = self
            .inner
            .services
            .read()
            .get(name)
            .cloned()
            .ok_or_else(|| {
                CatalogError::not_found(format!("Service not found: {name}")).into_anyhow()
            })?;

        Ok(ServiceHandle {
            app: self.clone(),
            name: name.to_string(),
            service: svc,
        })
    }

    pub fn service_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.inner.services.read().keys().cloned().collect();
        names.sort();
        names
    }

    pub fn set<K, V>(&self, key: K, value: V)
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.inner.config.write().set(key, value);
    }

    pub fn get(&self, key: &str) -> Option<String> {
        self.inner.config.read().get(key).map(|v| v.to_string())
    }

    /// Set `key` only when nothing has set it yet.
    pub fn set_default<K, V>(&self, key: K, value: V)
    where
        K: Into<String>,
        V: Into<String>,
    {
        let key = key.into();
        let mut cfg = self.inner.config.write();
        if !cfg.has(&key) {
            cfg.set(key, value);
        }
    }

    /// `PREFIX__SECTION__KEY=value` from the process environment.
    pub fn load_env(&self, prefix: &str) -> usize {
        self.inner.config.write().apply_env(prefix, std::env::vars())
    }

    pub fn config_snapshot(&self) -> ConfigSnapshot {
        self.inner.config.read().snapshot()
    }
}

/// A named service plus the app it lives in. Every call goes through the
/// hook pipeline.
pub struct ServiceHandle<R, D, P>
where
    R: Send + 'static,
    D: Send + 'static,
    P: Send + Clone + 'static,
{
    app: CatalogApp<R, D, P>,
    name: String,
    service: Arc<dyn CatalogService<R, D, P>>,
}

impl<R, D, P> Clone for ServiceHandle<R, D, P>
where
    R: Send + 'static,
    D: Send + 'static,
    P: Send + Clone + 'static,
{
    fn clone(&self) -> Self {
        Self {
            app: self.app.clone(),
            name: self.name.clone(),
            service: Arc::clone(&self.service),
        }
    }
}

impl<R, D, P> ServiceHandle<R, D, P>
where
    R: Send + 'static,
    D: Send + 'static,
    P: Send + Clone + 'static,
{
    pub fn hooks<F>(self, f: F) -> Self
    where
        F: FnOnce(&mut ServiceHooks<R, D, P>),
    {
        self.app.configure_service_hooks(&self.name, f);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn capabilities(&self) -> ServiceCapabilities {
        self.service.capabilities()
    }

    fn service_call<F>(f: F) -> ServiceCall<R, D, P>
    where
        F: for<'a> FnOnce(
                Arc<dyn CatalogService<R, D, P>>,
                &'a mut HookContext<R, D, P>,
            ) -> HookFut<'a>
            + Send
            + 'static,
    {
        Box::new(f)
    }

    /// Global hooks first, then this service's.
    fn collect_hooks(&self, method: ServiceMethodKind) -> HooksForMethod<R, D, P> {
        let g = self.app.inner.global_hooks.read();
        let map = self.app.inner.service_hooks.read();

        let mut around = collect_method_hooks(&g.around_all, &g.around_by_method, method);
        let mut before = collect_method_hooks(&g.before_all, &g.before_by_method, method);
        let mut after = collect_method_hooks(&g.after_all, &g.after_by_method, method);
        let mut error = collect_method_hooks(&g.error_all, &g.error_by_method, method);

        if let Some(h) = map.get(&self.name) {
            around.extend(collect_method_hooks(&h.around_all, &h.around_by_method, method));
            before.extend(collect_method_hooks(&h.before_all, &h.before_by_method, method));
            after.extend(collect_method_hooks(&h.after_all, &h.after_by_method, method));
            error.extend(collect_method_hooks(&h.error_all, &h.error_by_method, method));
        }

        (around, before, after, error)
    }

    fn context(&self, request: RequestContext, method: ServiceMethodKind, params: P) -> HookContext<R, D, P> {
        HookContext::new(
            request,
            self.name.clone(),
            method,
            params,
            self.app.config_snapshot(),
        )
    }

    /// around → before → service call → after, then error hooks on failure.
    async fn run_pipeline(
        &self,
        mut ctx: HookContext<R, D, P>,
        call: ServiceCall<R, D, P>,
    ) -> Result<HookContext<R, D, P>> {
        let (around, before, after, error) = self.collect_hooks(ctx.method);
        let svc = Arc::clone(&self.service);

        let mut next: Next<R, D, P> = Next::new(move |ctx| {
            Box::pin(async move {
                for h in &before {
                    h.run(ctx).await?;
                }

                // a before hook may have answered already
                if ctx.result.is_none() {
                    call(svc, ctx).await?;
                }

                for h in &after {
                    h.run(ctx).await?;
                }
                Ok(())
            })
        });

        // first registered around hook ends up outermost
        for hook in around.into_iter().rev() {
            let prev = next;
            next = Next::new(move |ctx| Box::pin(async move { hook.run(ctx, prev).await }));
        }

        if let Err(e) = next.run(&mut ctx).await {
            ctx.error = Some(e);

            for h in &error {
                if let Err(hook_err) = h.run(&mut ctx).await {
                    ctx.error = Some(hook_err);
                }
            }

            if let Some(err) = ctx.error.take() {
                return Err(err);
            }
        }

        Ok(ctx)
    }

    pub async fn find(&self, request: RequestContext, params: P) -> Result<Vec<R>> {
        let ctx = self.context(request, ServiceMethodKind::Find, params);

        let ctx = self
            .run_pipeline(
                ctx,
                Self::service_call(|svc, ctx| {
                    Box::pin(async move {
                        let records = svc.find(&ctx.request, ctx.params.clone()).await?;
                        ctx.result = Some(HookResult::Many(records));
                        Ok(())
                    })
                }),
            )
            .await?;

        match ctx.result {
            Some(HookResult::Many(v)) => Ok(v),
            Some(HookResult::One(v)) => Ok(vec![v]),
            None => Ok(vec![]),
        }
    }

    pub async fn get(&self, request: RequestContext, id: &str, params: P) -> Result<R> {
        let mut ctx = self.context(request, ServiceMethodKind::Get, params);
        ctx.id = Some(id.to_string());

        let ctx = self
            .run_pipeline(
                ctx,
                Self::service_call(|svc, ctx| {
                    Box::pin(async move {
                        let id = ctx.id.clone().ok_or_else(|| anyhow!("get() requires an id"))?;
                        let record = svc.get(&ctx.request, &id, ctx.params.clone()).await?;
                        ctx.result = Some(HookResult::One(record));
                        Ok(())
                    })
                }),
            )
            .await?;

        single(ctx.result, ServiceMethodKind::Get)
    }

    pub async fn create(&self, request: RequestContext, data: D, params: P) -> Result<R> {
        let mut ctx = self.context(request, ServiceMethodKind::Create, params);
        ctx.data = Some(data);

        let ctx = self
            .run_pipeline(
                ctx,
                Self::service_call(|svc, ctx| {
                    Box::pin(async move {
                        let data = ctx
                            .data
                            .take()
                            .ok_or_else(|| anyhow!("create() requires ctx.data"))?;
                        let created = svc.create(&ctx.request, data, ctx.params.clone()).await?;
                        ctx.result = Some(HookResult::One(created));
                        Ok(())
                    })
                }),
            )
            .await?;

        single(ctx.result, ServiceMethodKind::Create)
    }

    pub async fn patch(&self, request: RequestContext, id: &str, data: D, params: P) -> Result<R> {
        let mut ctx = self.context(request, ServiceMethodKind::Patch, params);
        ctx.id = Some(id.to_string());
        ctx.data = Some(data);

        let ctx = self
            .run_pipeline(
                ctx,
                Self::service_call(|svc, ctx| {
                    Box::pin(async move {
                        let id = ctx.id.clone().ok_or_else(|| anyhow!("patch() requires an id"))?;
                        let data = ctx
                            .data
                            .take()
                            .ok_or_else(|| anyhow!("patch() requires ctx.data"))?;
                        let patched = svc
                            .patch(&ctx.request, &id, data, ctx.params.clone())
                            .await?;
                        ctx.result = Some(HookResult::One(patched));
                        Ok(())
                    })
                }),
            )
            .await?;

        single(ctx.result, ServiceMethodKind::Patch)
    }

    pub async fn remove(&self, request: RequestContext, id: &str, params: P) -> Result<R> {
        let mut ctx = self.context(request, ServiceMethodKind::Remove, params);
        ctx.id = Some(id.to_string());

        let ctx = self
            .run_pipeline(
                ctx,
                Self::service_call(|svc, ctx| {
                    Box::pin(async move {
                        let id = ctx.id.clone().ok_or_else(|| anyhow!("remove() requires an id"))?;
                        let removed = svc.remove(&ctx.request, &id, ctx.params.clone()).await?;
                        ctx.result = Some(HookResult::One(removed));
                        Ok(())
                    })
                }),
            )
            .await?;

        single(ctx.result, ServiceMethodKind::Remove)
    }
}

fn single<R>(result: Option<HookResult<R>>, method: ServiceMethodKind) -> Result<R> {
    match result {
        Some(HookResult::One(v)) => Ok(v),
        Some(HookResult::Many(_)) => Err(anyhow!("{method}() produced many results")),
        None => Err(anyhow!("{method}() produced no result")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ErrorKind;
    use async_trait::async_trait;
    use parking_lot::Mutex;

    type Log = Arc<Mutex<Vec<String>>>;

    struct Shelf {
        log: Log,
    }

    #[async_trait]
    impl CatalogService<String, String, ()> for Shelf {
        fn capabilities(&self) -> ServiceCapabilities {
            ServiceCapabilities::from_methods(vec![ServiceMethodKind::Get, ServiceMethodKind::Create])
        }

        async fn get(&self, _ctx: &RequestContext, id: &str, _params: ()) -> Result<String> {
            self.log.lock().push("service".into());
            if id == "missing" {
                return Err(CatalogError::not_found(format!("No record {id}")).into_anyhow());
            }
            Ok(format!("item-{id}"))
        }

        async fn create(&self, _ctx: &RequestContext, data: String, _params: ()) -> Result<String> {
            self.log.lock().push("service".into());
            Ok(data)
        }
    }

    struct Tag(&'static str, Log);

    #[async_trait]
    impl BeforeHook<String, String, ()> for Tag {
        async fn run(&self, _ctx: &mut HookContext<String, String, ()>) -> Result<()> {
            self.1.lock().push(self.0.to_string());
            Ok(())
        }
    }

    #[async_trait]
    impl AfterHook<String, String, ()> for Tag {
        async fn run(&self, ctx: &mut HookContext<String, String, ()>) -> Result<()> {
            self.1.lock().push(self.0.to_string());
            if let Some(HookResult::One(r)) = ctx.result.as_mut() {
                r.push('!');
            }
            Ok(())
        }
    }

    #[async_trait]
    impl AroundHook<String, String, ()> for Tag {
        async fn run(
            &self,
            ctx: &mut HookContext<String, String, ()>,
            next: Next<String, String, ()>,
        ) -> Result<()> {
            self.1.lock().push(format!("{}:in", self.0));
            let res = next.run(ctx).await;
            self.1.lock().push(format!("{}:out", self.0));
            res
        }
    }

    struct Cached;

    #[async_trait]
    impl BeforeHook<String, String, ()> for Cached {
        async fn run(&self, ctx: &mut HookContext<String, String, ()>) -> Result<()> {
            ctx.result = Some(HookResult::One("cached".into()));
            Ok(())
        }
    }

    struct Recover;

    #[async_trait]
    impl ErrorHook<String, String, ()> for Recover {
        async fn run(&self, ctx: &mut HookContext<String, String, ()>) -> Result<()> {
            let not_found = ctx
                .error
                .as_ref()
                .and_then(CatalogError::find)
                .is_some_and(|e| e.kind == ErrorKind::NotFound);
            if not_found {
                ctx.error = None;
                ctx.result = Some(HookResult::One("placeholder".into()));
            }
            Ok(())
        }
    }

    struct ReadFolder(Log);

    #[async_trait]
    impl BeforeHook<String, String, ()> for ReadFolder {
        async fn run(&self, ctx: &mut HookContext<String, String, ()>) -> Result<()> {
            let folder = ctx.config.get_string("media.folder").unwrap_or_default();
            self.0.lock().push(folder);
            Ok(())
        }
    }

    fn app_with_shelf() -> (CatalogApp<String, String, ()>, Log) {
        let log: Log = Arc::new(Mutex::new(Vec::new()));
        let app = CatalogApp::new();
        app.register_service("shelf", Arc::new(Shelf { log: log.clone() }));
        (app, log)
    }

    #[tokio::test]
    async fn pipeline_runs_in_order() {
        let (app, log) = app_with_shelf();

        app.hooks(|h| {
            h.around_all(Arc::new(Tag("outer", log.clone())));
            h.before_all(Arc::new(Tag("global-before", log.clone())));
        });

        let shelf = app.service("shelf").unwrap().hooks(|h| {
            h.around(ServiceMethodKind::Get, Arc::new(Tag("inner", log.clone())));
            h.before(ServiceMethodKind::Get, Arc::new(Tag("before", log.clone())));
            h.after(ServiceMethodKind::Get, Arc::new(Tag("after", log.clone())));
        });

        let out = shelf.get(RequestContext::internal(), "7", ()).await.unwrap();
        assert_eq!(out, "item-7!");
        assert_eq!(
            *log.lock(),
            vec![
                "outer:in",
                "inner:in",
                "global-before",
                "before",
                "service",
                "after",
                "inner:out",
                "outer:out",
            ]
        );
    }

    #[tokio::test]
    async fn before_hook_can_answer_without_the_service() {
        let (app, log) = app_with_shelf();
        let shelf = app
            .service("shelf")
            .unwrap()
            .hooks(|h| {
                h.before(ServiceMethodKind::Get, Arc::new(Cached));
            });

        let out = shelf.get(RequestContext::internal(), "1", ()).await.unwrap();
        assert_eq!(out, "cached");
        assert!(log.lock().is_empty());
    }

    #[tokio::test]
    async fn error_hook_can_recover() {
        let (app, _log) = app_with_shelf();
        let shelf = app.service("shelf").unwrap();

        let err = shelf
            .get(RequestContext::internal(), "missing", ())
            .await
            .unwrap_err();
        assert_eq!(CatalogError::find(&err).unwrap().code(), 404);

        let shelf = shelf.hooks(|h| {
            h.error_all(Arc::new(Recover));
        });
        let out = shelf.get(RequestContext::internal(), "missing", ()).await.unwrap();
        assert_eq!(out, "placeholder");
    }

    #[tokio::test]
    async fn unimplemented_methods_report_not_implemented() {
        let (app, _log) = app_with_shelf();
        let shelf = app.service("shelf").unwrap();

        assert!(!shelf.capabilities().allows(ServiceMethodKind::Remove));
        let err = shelf
            .remove(RequestContext::internal(), "1", ())
            .await
            .unwrap_err();
        assert_eq!(
            CatalogError::find(&err).unwrap().kind,
            ErrorKind::NotImplemented
        );
    }

    #[tokio::test]
    async fn hooks_see_config_and_unknown_services_are_not_found() {
        let (app, log) = app_with_shelf();
        app.set("media.folder", "products");
        app.set_default("media.folder", "ignored");

        let shelf = app.service("shelf").unwrap().hooks(|h| {
            h.before_create(Arc::new(ReadFolder(log.clone())));
        });
        let out = shelf
            .create(RequestContext::internal(), "lamp".into(), ())
            .await
            .unwrap();

        assert_eq!(out, "lamp");
        assert_eq!(*log.lock(), vec!["products", "service"]);

        let missing = app.service("nope").err().unwrap();
        assert_eq!(CatalogError::find(&missing).unwrap().code(), 404);
        assert_eq!(app.service_names(), vec!["shelf".to_string()]);
    }
}
