use anyhow::Result;
use async_trait::async_trait;
use catalog_core::hooks::{BeforeHook, HookContext};
use catalog_core::CatalogError;

use crate::services::types::{CatalogParams, Product, ProductPayload};

use super::products_schema;

type ProductContext = HookContext<Product, ProductPayload, CatalogParams>;

fn payload(ctx: &mut ProductContext) -> Result<&mut ProductPayload> {
    ctx.data
        .as_mut()
        .ok_or_else(|| CatalogError::bad_request("Missing product data").into_anyhow())
}

pub struct ValidateCreate;

#[async_trait]
impl BeforeHook<Product, ProductPayload, CatalogParams> for ValidateCreate {
    async fn run(&self, ctx: &mut ProductContext) -> Result<()> {
        let data = payload(ctx)?;
        products_schema::check_create(data)?;
        products_schema::normalize(data);
        Ok(())
    }
}

pub struct ValidatePatch;

#[async_trait]
impl BeforeHook<Product, ProductPayload, CatalogParams> for ValidatePatch {
    async fn run(&self, ctx: &mut ProductContext) -> Result<()> {
        let data = payload(ctx)?;
        products_schema::check_patch(data)?;
        products_schema::normalize(data);
        Ok(())
    }
}
