use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::RwLock;
use uuid::Uuid;

use crate::error::{MediaError, MediaResult};
use crate::store::{DeleteOutcome, MediaStore, MediaUpload, StoredAsset};

pub const DEFAULT_BASE_URL: &str = "http://media.localhost/catalog";

/// In-process media store.
///
/// Issues delivery-shaped URLs (`{base}/image/upload/v<n>/<folder>/<id>.<ext>`)
/// so the public id extraction behaves exactly as it does against the
/// hosted store.
pub struct MemoryMediaStore {
    base_url: String,
    state: RwLock<MemoryState>,
}

#[derive(Default)]
struct MemoryState {
    version: u64,
    assets: HashMap<String, StoredAsset>,
}

impl Default for MemoryMediaStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryMediaStore {
    pub fn new() -> Self {
        Self::with_base_url(DEFAULT_BASE_URL)
    }

    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            state: RwLock::new(MemoryState::default()),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn contains(&self, public_id: &str) -> bool {
        self.state.read().assets.contains_key(public_id)
    }

    pub fn len(&self) -> usize {
        self.state.read().assets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn asset(&self, public_id: &str) -> Option<StoredAsset> {
        self.state.read().assets.get(public_id).cloned()
    }
}

#[async_trait]
impl MediaStore for MemoryMediaStore {
    async fn upload(&self, upload: MediaUpload, folder: &str) -> MediaResult<StoredAsset> {
        if upload.is_empty() {
            return Err(MediaError::upload_failed("empty file"));
        }

        let folder = folder.trim_matches('/');
        let id = Uuid::new_v4().simple().to_string();
        let public_id = if folder.is_empty() {
            id
        } else {
            format!("{folder}/{id}")
        };
        let format = upload.extension();

        let mut state = self.state.write();
        state.version += 1;
        let url = match &format {
            Some(ext) => format!("{}/image/upload/v{}/{public_id}.{ext}", self.base_url, state.version),
            None => format!("{}/image/upload/v{}/{public_id}", self.base_url, state.version),
        };

        let asset = StoredAsset {
            url,
            public_id: public_id.clone(),
            bytes: upload.len() as u64,
            format,
        };
        state.assets.insert(public_id, asset.clone());
        Ok(asset)
    }

    async fn delete(&self, public_id: &str) -> MediaResult<DeleteOutcome> {
        match self.state.write().assets.remove(public_id) {
            Some(_) => Ok(DeleteOutcome::Deleted),
            None => Ok(DeleteOutcome::NotFound),
        }
    }

    fn owns_url(&self, url: &str) -> bool {
        url.strip_prefix(self.base_url.as_str())
            .is_some_and(|rest| rest.starts_with('/'))
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}
