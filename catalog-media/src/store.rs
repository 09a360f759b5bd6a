use async_trait::async_trait;
use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::error::MediaResult;

/// A file on its way to the media store.
#[derive(Debug, Clone)]
pub struct MediaUpload {
    pub data: Bytes,
    pub filename: Option<String>,
    pub content_type: Option<String>,
}

impl MediaUpload {
    pub fn new(data: impl Into<Bytes>) -> Self {
        Self {
            data: data.into(),
            filename: None,
            content_type: None,
        }
    }

    pub fn with_filename(mut self, filename: impl Into<String>) -> Self {
        self.filename = Some(filename.into());
        self
    }

    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Extension from the filename, else from the content type.
    pub fn extension(&self) -> Option<String> {
        let from_name = self
            .filename
            .as_deref()
            .and_then(|n| n.rsplit_once('.'))
            .map(|(_, ext)| ext.to_ascii_lowercase())
            .filter(|ext| !ext.is_empty());

        from_name.or_else(|| {
            let subtype = self.content_type.as_deref()?.split_once('/')?.1;
            let subtype = subtype.split(';').next()?.trim();
            match subtype {
                "jpeg" => Some("jpg".to_string()),
                "" => None,
                other => Some(other.to_ascii_lowercase()),
            }
        })
    }
}

/// What the store kept: the canonical delivery URL and its identifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredAsset {
    pub url: String,
    pub public_id: String,
    pub bytes: u64,
    pub format: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    Deleted,
    /// The store had nothing under that id.
    NotFound,
}

#[async_trait]
pub trait MediaStore: Send + Sync {
    /// Upload into `folder` and return the canonical URL.
    async fn upload(&self, upload: MediaUpload, folder: &str) -> MediaResult<StoredAsset>;

    async fn delete(&self, public_id: &str) -> MediaResult<DeleteOutcome>;

    /// True when `url` is a delivery URL of this account.
    fn owns_url(&self, url: &str) -> bool;

    fn backend_name(&self) -> &'static str;
}
