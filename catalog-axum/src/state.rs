use std::sync::Arc;

use catalog_core::CatalogApp;

use crate::middlewares::multipart::MultipartConfig;

/// Shared by the REST handlers of one mounted service.
pub struct RestState<R, D, P>
where
    R: Send + Sync + 'static,
    D: Send + Sync + 'static,
    P: Send + Sync + Clone + 'static,
{
    pub app: CatalogApp<R, D, P>,
    pub service: Arc<String>,
    pub multipart: Arc<MultipartConfig>,
}

impl<R, D, P> Clone for RestState<R, D, P>
where
    R: Send + Sync + 'static,
    D: Send + Sync + 'static,
    P: Send + Sync + Clone + 'static,
{
    fn clone(&self) -> Self {
        Self {
            app: self.app.clone(),
            service: Arc::clone(&self.service),
            multipart: Arc::clone(&self.multipart),
        }
    }
}
