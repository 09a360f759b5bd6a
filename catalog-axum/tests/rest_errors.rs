use std::sync::Arc;

use axum::body::Body;
use axum::http::{HeaderValue, Request};
use catalog_axum::{axum, MultipartConfig};
use catalog_core::{
    CatalogApp, CatalogError, CatalogService, RequestContext, ServiceCapabilities,
    ServiceMethodKind,
};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

struct UnprocessableOnCreate;

#[async_trait::async_trait]
impl CatalogService<Value, Value, ()> for UnprocessableOnCreate {
    fn capabilities(&self) -> ServiceCapabilities {
        ServiceCapabilities::from_methods(vec![ServiceMethodKind::Create])
    }

    async fn create(&self, _ctx: &RequestContext, _data: Value, _params: ()) -> anyhow::Result<Value> {
        Err(CatalogError::unprocessable("Invalid")
            .with_errors(json!({"name": ["required"]}))
            .into_anyhow())
    }
}

struct BoomOnCreate;

#[async_trait::async_trait]
impl CatalogService<Value, Value, ()> for BoomOnCreate {
    fn capabilities(&self) -> ServiceCapabilities {
        ServiceCapabilities::from_methods(vec![ServiceMethodKind::Create])
    }

    async fn create(&self, _ctx: &RequestContext, _data: Value, _params: ()) -> anyhow::Result<Value> {
        Err(anyhow::anyhow!("boom"))
    }
}

/// Echoes the payload back, along with the request id it saw.
struct Echo;

#[async_trait::async_trait]
impl CatalogService<Value, Value, ()> for Echo {
    fn capabilities(&self) -> ServiceCapabilities {
        ServiceCapabilities::from_methods(vec![ServiceMethodKind::Create, ServiceMethodKind::Get])
    }

    async fn get(&self, ctx: &RequestContext, id: &str, _params: ()) -> anyhow::Result<Value> {
        Ok(json!({"id": id, "requestId": ctx.request_id, "provider": ctx.provider}))
    }

    async fn create(&self, _ctx: &RequestContext, data: Value, _params: ()) -> anyhow::Result<Value> {
        Ok(data)
    }
}

fn router_with(service: Arc<dyn CatalogService<Value, Value, ()>>) -> axum::Router {
    let app: CatalogApp<Value, Value, ()> = CatalogApp::new();
    axum(app)
        .use_service_with(
            "/items",
            service,
            MultipartConfig::new()
                .max_file_size(16)
                .file_field("image")
                .allow_content_types(["image/png", "image/jpeg"]),
        )
        .unwrap()
        .into_router()
}

fn post_json(body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/items")
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn post_multipart(parts: &[(&str, Option<(&str, &str)>, &[u8])]) -> Request<Body> {
    let boundary = "catalog-test-boundary";
    let mut body = Vec::new();
    for (name, file, data) in parts {
        body.extend_from_slice(format!("--{boundary}\r\n").as_bytes());
        match file {
            Some((filename, ct)) => body.extend_from_slice(
                format!(
                    "Content-Disposition: form-data; name=\"{name}\"; filename=\"{filename}\"\r\nContent-Type: {ct}\r\n\r\n"
                )
                .as_bytes(),
            ),
            None => body.extend_from_slice(
                format!("Content-Disposition: form-data; name=\"{name}\"\r\n\r\n").as_bytes(),
            ),
        }
        body.extend_from_slice(data);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{boundary}--\r\n").as_bytes());

    Request::builder()
        .method("POST")
        .uri("/items")
        .header("content-type", format!("multipart/form-data; boundary={boundary}"))
        .body(Body::from(body))
        .unwrap()
}

async fn json_body(res: axum::response::Response) -> Value {
    let bytes = res.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn malformed_json_returns_bad_request() {
    let res = router_with(Arc::new(BoomOnCreate))
        .oneshot(post_json("{\"name\":\"x\""))
        .await
        .unwrap();

    assert_eq!(res.status().as_u16(), 400);
    assert!(res.headers().get("x-request-id").is_some());
    let body = json_body(res).await;
    assert_eq!(body["name"], "BadRequest");
    assert_eq!(body["code"], 400);
    assert_eq!(body["className"], "bad-request");
    assert!(body["errors"]["_schema"].is_array());
}

#[tokio::test]
async fn request_id_is_preserved_and_reaches_the_service() {
    let provided = HeaderValue::from_static("req-test-123");
    let res = router_with(Arc::new(Echo))
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/items/42")
                .header("x-request-id", provided.clone())
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(res.status().as_u16(), 200);
    assert_eq!(res.headers().get("x-request-id").unwrap(), &provided);
    let body = json_body(res).await;
    assert_eq!(body, json!({"id": "42", "requestId": "req-test-123", "provider": "rest"}));
}

#[tokio::test]
async fn create_answers_201() {
    let res = router_with(Arc::new(Echo))
        .oneshot(post_json("{\"name\":\"lamp\"}"))
        .await
        .unwrap();

    assert_eq!(res.status().as_u16(), 201);
    assert_eq!(json_body(res).await, json!({"name": "lamp"}));
}

#[tokio::test]
async fn unprocessable_preserves_422_and_shape() {
    let res = router_with(Arc::new(UnprocessableOnCreate))
        .oneshot(post_json("{\"name\":\"ok\"}"))
        .await
        .unwrap();

    assert_eq!(res.status().as_u16(), 422);
    let body = json_body(res).await;
    assert_eq!(body["name"], "Unprocessable");
    assert_eq!(body["className"], "unprocessable");
    assert_eq!(body["errors"], json!({"name": ["required"]}));
}

#[tokio::test]
async fn foreign_errors_map_to_general_error() {
    let res = router_with(Arc::new(BoomOnCreate))
        .oneshot(post_json("{\"name\":\"ok\"}"))
        .await
        .unwrap();

    assert_eq!(res.status().as_u16(), 500);
    let body = json_body(res).await;
    assert_eq!(body["name"], "GeneralError");
    assert_eq!(body["className"], "general-error");
    assert!(body["message"].as_str().unwrap().contains("boom"));
}

#[tokio::test]
async fn unmounted_methods_answer_405() {
    let res = router_with(Arc::new(BoomOnCreate))
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri("/items/1")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(res.status().as_u16(), 405);
    let body = json_body(res).await;
    assert_eq!(body["name"], "MethodNotAllowed");
}

#[tokio::test]
async fn unknown_routes_answer_404_json() {
    let res = router_with(Arc::new(Echo))
        .oneshot(Request::builder().uri("/nowhere").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(res.status().as_u16(), 404);
    assert_eq!(json_body(res).await["className"], "not-found");
}

#[tokio::test]
async fn multipart_fields_and_files_reach_the_payload() {
    let res = router_with(Arc::new(Echo))
        .oneshot(post_multipart(&[
            ("name", None, &b"lamp"[..]),
            ("image", Some(("lamp.png", "image/png")), &b"\x89PNG"[..]),
        ]))
        .await
        .unwrap();

    assert_eq!(res.status().as_u16(), 201);
    let body = json_body(res).await;
    assert_eq!(body["name"], "lamp");
    assert_eq!(body["image"]["filename"], "lamp.png");
    assert_eq!(body["image"]["contentType"], "image/png");
    assert_eq!(body["image"]["size"], 4);
}

#[tokio::test]
async fn oversized_files_answer_413() {
    let res = router_with(Arc::new(Echo))
        .oneshot(post_multipart(&[(
            "image",
            Some(("big.png", "image/png")),
            &[0u8; 64][..],
        )]))
        .await
        .unwrap();

    assert_eq!(res.status().as_u16(), 413);
    assert_eq!(json_body(res).await["name"], "PayloadTooLarge");
}

#[tokio::test]
async fn disallowed_file_types_answer_400() {
    let res = router_with(Arc::new(Echo))
        .oneshot(post_multipart(&[(
            "image",
            Some(("notes.txt", "text/plain")),
            &b"hello"[..],
        )]))
        .await
        .unwrap();

    assert_eq!(res.status().as_u16(), 400);
    let body = json_body(res).await;
    assert_eq!(body["message"], "Only image files are allowed!");
    assert!(body["errors"]["image"].is_array());
}
