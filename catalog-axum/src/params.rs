use std::collections::HashMap;

use axum::http::{HeaderMap, Uri};
use catalog_core::RequestContext;

pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// What the REST layer knows about a call, handed to services as params.
#[derive(Debug, Clone, Default)]
pub struct RestParams {
    pub provider: String,
    pub request_id: Option<String>,
    pub headers: HashMap<String, String>,
    pub query: HashMap<String, String>,
    pub method: String,
    pub path: String,
}

impl RestParams {
    pub fn from_parts(
        provider: &str,
        headers: &HeaderMap,
        query: HashMap<String, String>,
        method: &str,
        uri: &Uri,
    ) -> Self {
        let mut out = Self {
            provider: provider.to_string(),
            request_id: request_id(headers),
            headers: HashMap::new(),
            query,
            method: method.to_string(),
            path: uri.path().to_string(),
        };

        for (k, v) in headers.iter() {
            if let Ok(s) = v.to_str() {
                out.headers.insert(k.to_string(), s.to_string());
            }
        }

        out
    }
}

pub fn request_id(headers: &HeaderMap) -> Option<String> {
    headers
        .get(REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

/// Request context for a REST call; the id comes from `x-request-id`.
pub fn request_context(headers: &HeaderMap) -> RequestContext {
    RequestContext::new(request_id(headers).unwrap_or_else(|| "unknown".to_string()))
        .with_provider("rest")
}

pub trait FromRestParams: Sized {
    fn from_rest_params(params: RestParams) -> Self;
}

impl FromRestParams for RestParams {
    fn from_rest_params(params: RestParams) -> Self {
        params
    }
}

impl FromRestParams for () {
    fn from_rest_params(_params: RestParams) -> Self {}
}
