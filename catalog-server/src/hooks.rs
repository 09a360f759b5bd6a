use std::sync::Arc;
use std::time::Instant;

use anyhow::Result;
use async_trait::async_trait;
use catalog_core::hooks::{AroundHook, ErrorHook, HookContext, Next};
use catalog_core::{CatalogApp, CatalogError};
use tracing::{error, info, warn};

use crate::services::{CatalogParams, Product, ProductPayload};

type Ctx = HookContext<Product, ProductPayload, CatalogParams>;

/// Times every service call.
pub struct LogAround;

#[async_trait]
impl AroundHook<Product, ProductPayload, CatalogParams> for LogAround {
    async fn run(&self, ctx: &mut Ctx, next: Next<Product, ProductPayload, CatalogParams>) -> Result<()> {
        let started = Instant::now();
        let res = next.run(ctx).await;
        let elapsed_ms = started.elapsed().as_millis() as u64;

        info!(
            service = %ctx.service,
            method = %ctx.method,
            id = ctx.id.as_deref().unwrap_or("-"),
            request_id = %ctx.request.request_id,
            elapsed_ms,
            ok = res.is_ok(),
            "service call"
        );
        res
    }
}

pub struct LogError;

#[async_trait]
impl ErrorHook<Product, ProductPayload, CatalogParams> for LogError {
    async fn run(&self, ctx: &mut Ctx) -> Result<()> {
        let Some(err) = ctx.error.as_ref() else {
            return Ok(());
        };

        match CatalogError::find(err) {
            Some(e) if e.kind.is_client_error() => warn!(
                service = %ctx.service,
                method = %ctx.method,
                request_id = %ctx.request.request_id,
                code = e.code(),
                "{}",
                e.message
            ),
            _ => error!(
                service = %ctx.service,
                method = %ctx.method,
                request_id = %ctx.request.request_id,
                "{err:#}"
            ),
        }
        Ok(())
    }
}

pub fn global_hooks(app: &CatalogApp<Product, ProductPayload, CatalogParams>) {
    app.hooks(|h| {
        h.around_all(Arc::new(LogAround));
        h.error_all(Arc::new(LogError));
    });
}
