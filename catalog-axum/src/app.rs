use std::sync::Arc;

use axum::body::Body;
use axum::extract::DefaultBodyLimit;
use axum::handler::Handler;
use axum::http::{HeaderName, Method, Request};
use axum::routing::get;
use axum::Router;
use catalog_core::{CatalogApp, CatalogService};
use serde::Serialize;
use tokio::net::{TcpListener, ToSocketAddrs};
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;

use crate::middlewares::multipart::MultipartConfig;
use crate::params::{FromRestParams, REQUEST_ID_HEADER};
use crate::payload::FromRestPayload;
use crate::rest;
use crate::RestState;

pub const DEFAULT_BODY_LIMIT: usize = 10 * 1024 * 1024;

pub struct AxumApp<R, D, P>
where
    R: Send + Sync + 'static,
    D: Send + Sync + 'static,
    P: Send + Sync + Clone + 'static,
{
    pub app: CatalogApp<R, D, P>,
    pub router: Router<()>,
    body_limit: usize,
}

impl<R, D, P> Clone for AxumApp<R, D, P>
where
    R: Send + Sync + 'static,
    D: Send + Sync + 'static,
    P: Send + Sync + Clone + 'static,
{
    fn clone(&self) -> Self {
        Self {
            app: self.app.clone(),
            router: self.router.clone(),
            body_limit: self.body_limit,
        }
    }
}

impl<R, D, P> AxumApp<R, D, P>
where
    R: Serialize + Send + Sync + 'static,
    D: FromRestPayload + Send + Sync + 'static,
    P: FromRestParams + Send + Sync + Clone + 'static,
{
    pub fn new(app: CatalogApp<R, D, P>) -> Self {
        Self {
            app,
            router: Router::new(),
            body_limit: DEFAULT_BODY_LIMIT,
        }
    }

    /// Default cap for body extractors, applied in [`AxumApp::into_router`].
    /// REST payloads are also capped by their [`MultipartConfig`].
    pub fn body_limit(mut self, bytes: usize) -> Self {
        self.body_limit = bytes;
        self
    }

    pub fn use_router(mut self, path: &str, router: Router<()>) -> Self {
        self.router = if path.is_empty() || path == "/" {
            self.router.merge(router)
        } else {
            self.router.nest(path, router)
        };
        self
    }

    pub fn use_get<H, T>(self, path: &str, handler: H) -> Self
    where
        H: Handler<T, ()> + Clone + Send + Sync + 'static,
        T: 'static,
    {
        let router = Router::new().route(path, get(handler));
        self.use_router("", router)
    }

    pub fn use_service(
        self,
        path: &str,
        service: Arc<dyn CatalogService<R, D, P>>,
    ) -> anyhow::Result<Self> {
        self.use_service_with(path, service, MultipartConfig::default())
    }

    /// Register `service` under the last segment of `path` and mount its
    /// REST routes at `path`.
    pub fn use_service_with(
        mut self,
        path: &str,
        service: Arc<dyn CatalogService<R, D, P>>,
        multipart: MultipartConfig,
    ) -> anyhow::Result<Self> {
        let path = format!("/{}", path.trim_matches('/'));
        let name = path.rsplit('/').next().unwrap_or_default().to_string();
        anyhow::ensure!(!name.is_empty(), "service path must not be empty");
        self.app.register_service(name.clone(), service);

        let state = RestState {
            app: self.app.clone(),
            service: Arc::new(name),
            multipart: Arc::new(multipart),
        };
        let router = rest::service_router(state)?;

        self.router = self.router.nest(&path, router);
        Ok(self)
    }

    /// Final router with request ids, tracing, CORS and the body cap.
    pub fn into_router(self) -> Router<()> {
        let request_id = HeaderName::from_static(REQUEST_ID_HEADER);

        let cors = CorsLayer::new()
            .allow_origin(Any)
            .allow_methods([
                Method::GET,
                Method::HEAD,
                Method::PUT,
                Method::PATCH,
                Method::POST,
                Method::DELETE,
            ])
            .allow_headers(Any);

        let trace = TraceLayer::new_for_http().make_span_with(|req: &Request<Body>| {
            let id = req
                .headers()
                .get(REQUEST_ID_HEADER)
                .and_then(|v| v.to_str().ok())
                .unwrap_or("-");
            tracing::info_span!("http", method = %req.method(), uri = %req.uri(), request_id = %id)
        });

        self.router
            .fallback(rest::route_not_found)
            .layer(DefaultBodyLimit::max(self.body_limit))
            .layer(
                ServiceBuilder::new()
                    .layer(SetRequestIdLayer::new(request_id.clone(), MakeRequestUuid))
                    .layer(trace)
                    .layer(PropagateRequestIdLayer::new(request_id))
                    .layer(cors),
            )
    }

    pub async fn listen<A>(self, addr: A) -> anyhow::Result<()>
    where
        A: ToSocketAddrs,
    {
        let listener = TcpListener::bind(addr).await?;
        tracing::info!(addr = %listener.local_addr()?, "listening");
        axum::serve(listener, self.into_router()).await?;
        Ok(())
    }
}

pub fn axum<R, D, P>(app: CatalogApp<R, D, P>) -> AxumApp<R, D, P>
where
    R: Serialize + Send + Sync + 'static,
    D: FromRestPayload + Send + Sync + 'static,
    P: FromRestParams + Send + Sync + Clone + 'static,
{
    AxumApp::new(app)
}
