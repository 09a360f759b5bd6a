use std::collections::HashMap;

use axum::{
    extract::{OriginalUri, Path, Query, Request, State},
    http::{HeaderMap, StatusCode},
    routing::MethodRouter,
    Json, Router,
};
use catalog_core::{CatalogError, ServiceMethodKind};
use serde::Serialize;

use crate::{
    params::{request_context, FromRestParams, RestParams},
    payload::{read_payload, FromRestPayload},
    CatalogAxumError, RestState,
};

type Rest<T> = Result<T, CatalogAxumError>;

fn params<P: FromRestParams>(
    headers: &HeaderMap,
    query: HashMap<String, String>,
    method: &str,
    uri: &axum::http::Uri,
) -> P {
    P::from_rest_params(RestParams::from_parts("rest", headers, query, method, uri))
}

async fn find<R, D, P>(
    State(state): State<RestState<R, D, P>>,
    headers: HeaderMap,
    Query(query): Query<HashMap<String, String>>,
    OriginalUri(uri): OriginalUri,
) -> Rest<Json<Vec<R>>>
where
    R: Serialize + Send + Sync + 'static,
    D: FromRestPayload + Send + Sync + 'static,
    P: FromRestParams + Send + Sync + Clone + 'static,
{
    let ctx = request_context(&headers);
    let params = params::<P>(&headers, query, "GET", &uri);

    let svc = state.app.service(&state.service)?;
    let res = svc.find(ctx, params).await?;
    Ok(Json(res))
}

async fn get<R, D, P>(
    State(state): State<RestState<R, D, P>>,
    headers: HeaderMap,
    Query(query): Query<HashMap<String, String>>,
    OriginalUri(uri): OriginalUri,
    Path(id): Path<String>,
) -> Rest<Json<R>>
where
    R: Serialize + Send + Sync + 'static,
    D: FromRestPayload + Send + Sync + 'static,
    P: FromRestParams + Send + Sync + Clone + 'static,
{
    let ctx = request_context(&headers);
    let params = params::<P>(&headers, query, "GET", &uri);

    let svc = state.app.service(&state.service)?;
    let res = svc.get(ctx, &id, params).await?;
    Ok(Json(res))
}

async fn create<R, D, P>(
    State(state): State<RestState<R, D, P>>,
    headers: HeaderMap,
    Query(query): Query<HashMap<String, String>>,
    OriginalUri(uri): OriginalUri,
    req: Request,
) -> Rest<(StatusCode, Json<R>)>
where
    R: Serialize + Send + Sync + 'static,
    D: FromRestPayload + Send + Sync + 'static,
    P: FromRestParams + Send + Sync + Clone + 'static,
{
    let ctx = request_context(&headers);
    let params = params::<P>(&headers, query, "POST", &uri);
    let data: D = read_payload(req, &state.multipart).await?;

    let svc = state.app.service(&state.service)?;
    let res = svc.create(ctx, data, params).await?;
    Ok((StatusCode::CREATED, Json(res)))
}

async fn patch<R, D, P>(
    State(state): State<RestState<R, D, P>>,
    headers: HeaderMap,
    Query(query): Query<HashMap<String, String>>,
    OriginalUri(uri): OriginalUri,
    Path(id): Path<String>,
    req: Request,
) -> Rest<Json<R>>
where
    R: Serialize + Send + Sync + 'static,
    D: FromRestPayload + Send + Sync + 'static,
    P: FromRestParams + Send + Sync + Clone + 'static,
{
    let ctx = request_context(&headers);
    let params = params::<P>(&headers, query, "PATCH", &uri);
    let data: D = read_payload(req, &state.multipart).await?;

    let svc = state.app.service(&state.service)?;
    let res = svc.patch(ctx, &id, data, params).await?;
    Ok(Json(res))
}

async fn remove<R, D, P>(
    State(state): State<RestState<R, D, P>>,
    headers: HeaderMap,
    Query(query): Query<HashMap<String, String>>,
    OriginalUri(uri): OriginalUri,
    Path(id): Path<String>,
) -> Rest<Json<R>>
where
    R: Serialize + Send + Sync + 'static,
    D: FromRestPayload + Send + Sync + 'static,
    P: FromRestParams + Send + Sync + Clone + 'static,
{
    let ctx = request_context(&headers);
    let params = params::<P>(&headers, query, "DELETE", &uri);

    let svc = state.app.service(&state.service)?;
    let res = svc.remove(ctx, &id, params).await?;
    Ok(Json(res))
}

pub async fn method_not_allowed(req: Request) -> CatalogAxumError {
    CatalogError::method_not_allowed(format!(
        "Method {} is not allowed on {}",
        req.method(),
        req.uri().path()
    ))
    .into()
}

pub async fn route_not_found(req: Request) -> CatalogAxumError {
    CatalogError::not_found(format!("Page not found: {}", req.uri().path())).into()
}

/// Routes for one service, limited to the methods it advertises.
///
/// `/` carries find (GET) and create (POST), `/{id}` carries get (GET),
/// patch (PATCH) and remove (DELETE). Anything else answers 405.
pub fn service_router<R, D, P>(state: RestState<R, D, P>) -> anyhow::Result<Router<()>>
where
    R: Serialize + Send + Sync + 'static,
    D: FromRestPayload + Send + Sync + 'static,
    P: FromRestParams + Send + Sync + Clone + 'static,
{
    let caps = state.app.service(&state.service)?.capabilities();

    let mut root: MethodRouter<RestState<R, D, P>> = MethodRouter::new();
    if caps.allows(ServiceMethodKind::Find) {
        root = root.get(find::<R, D, P>);
    }
    if caps.allows(ServiceMethodKind::Create) {
        root = root.post(create::<R, D, P>);
    }

    let mut by_id: MethodRouter<RestState<R, D, P>> = MethodRouter::new();
    if caps.allows(ServiceMethodKind::Get) {
        by_id = by_id.get(get::<R, D, P>);
    }
    if caps.allows(ServiceMethodKind::Patch) {
        by_id = by_id.patch(patch::<R, D, P>);
    }
    if caps.allows(ServiceMethodKind::Remove) {
        by_id = by_id.delete(remove::<R, D, P>);
    }

    Ok(Router::new()
        .route("/", root.fallback(method_not_allowed))
        .route("/{id}", by_id.fallback(method_not_allowed))
        .with_state(state))
}
