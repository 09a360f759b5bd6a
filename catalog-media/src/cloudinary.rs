//! Cloudinary upload API client.
//!
//! Uploads go to `POST {api_base}/{cloud}/auto/upload` as multipart, deletes
//! to `POST {api_base}/{cloud}/image/destroy` as a form. Both are signed with
//! the account secret, SHA-1 unless the config asks for SHA-256.

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use serde::Deserialize;
use sha1::Sha1;
use sha2::{Digest, Sha256};
use tracing::debug;

use crate::config::{MediaConfig, SignatureAlgorithm};
use crate::error::{MediaError, MediaResult};
use crate::store::{DeleteOutcome, MediaStore, MediaUpload, StoredAsset};

pub struct CloudinaryStore {
    client: Client,
    config: MediaConfig,
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    public_id: String,
    secure_url: Option<String>,
    url: Option<String>,
    bytes: Option<u64>,
    format: Option<String>,
}

#[derive(Debug, Deserialize)]
struct DestroyResponse {
    result: String,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

/// Hex digest of `k1=v1&k2=v2...` (keys sorted, empty values skipped)
/// followed by the secret.
pub fn sign(params: &[(&str, String)], api_secret: &str, algorithm: SignatureAlgorithm) -> String {
    let mut pairs: Vec<&(&str, String)> = params.iter().filter(|(_, v)| !v.is_empty()).collect();
    pairs.sort_by(|a, b| a.0.cmp(b.0));

    let to_sign = pairs
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join("&");

    match algorithm {
        SignatureAlgorithm::Sha1 => digest::<Sha1>(&to_sign, api_secret),
        SignatureAlgorithm::Sha256 => digest::<Sha256>(&to_sign, api_secret),
    }
}

fn digest<D: Digest>(to_sign: &str, api_secret: &str) -> String {
    let mut hasher = D::new();
    hasher.update(to_sign.as_bytes());
    hasher.update(api_secret.as_bytes());
    hex::encode(hasher.finalize())
}

/// Reason text from a non-2xx response.
async fn failure_reason(response: reqwest::Response) -> String {
    let status = response.status();
    match response.json::<ErrorEnvelope>().await {
        Ok(env) => env.error.message,
        Err(_) => format!("media API responded with {status}"),
    }
}

impl CloudinaryStore {
    pub fn new(config: MediaConfig) -> Self {
        Self::with_client(config, Client::new())
    }

    pub fn with_client(config: MediaConfig, client: Client) -> Self {
        Self { client, config }
    }

    pub fn config(&self) -> &MediaConfig {
        &self.config
    }

    fn endpoint(&self, cloud_name: &str, action: &str) -> String {
        format!("{}/{}/{}", self.config.api_base_url, cloud_name, action)
    }

    fn signature(&self, params: &[(&str, String)], api_secret: &str) -> String {
        sign(params, api_secret, self.config.signature_algorithm)
    }

    fn timestamp() -> String {
        chrono::Utc::now().timestamp().to_string()
    }
}

#[async_trait]
impl MediaStore for CloudinaryStore {
    async fn upload(&self, upload: MediaUpload, folder: &str) -> MediaResult<StoredAsset> {
        let creds = self.config.credentials()?;
        let folder = folder.trim_matches('/');
        let timestamp = Self::timestamp();

        let signature = self.signature(
            &[("folder", folder.to_string()), ("timestamp", timestamp.clone())],
            creds.api_secret,
        );

        let filename = upload.filename.clone().unwrap_or_else(|| "upload".to_string());
        let mut part = Part::bytes(upload.data.to_vec()).file_name(filename);
        if let Some(ct) = upload.content_type.as_deref() {
            part = part.mime_str(ct).map_err(MediaError::backend)?;
        }

        let mut form = Form::new()
            .part("file", part)
            .text("timestamp", timestamp)
            .text("api_key", creds.api_key.to_string())
            .text("signature", signature);
        if let Some(algorithm) = self.config.signature_algorithm.param() {
            form = form.text("signature_algorithm", algorithm);
        }
        if !folder.is_empty() {
            form = form.text("folder", folder.to_string());
        }

        let url = self.endpoint(creds.cloud_name, "auto/upload");
        debug!(%url, bytes = upload.len(), folder, "uploading media");

        let response = self
            .client
            .post(&url)
            .multipart(form)
            .send()
            .await
            .map_err(|e| MediaError::upload_failed(e.to_string()))?;

        if !response.status().is_success() {
            return Err(MediaError::upload_failed(failure_reason(response).await));
        }

        let body: UploadResponse = response.json().await.map_err(MediaError::backend)?;
        let url = body
            .secure_url
            .or(body.url)
            .ok_or_else(|| MediaError::upload_failed("response carried no URL"))?;

        Ok(StoredAsset {
            url,
            public_id: body.public_id,
            bytes: body.bytes.unwrap_or(upload.len() as u64),
            format: body.format,
        })
    }

    async fn delete(&self, public_id: &str) -> MediaResult<DeleteOutcome> {
        let creds = self.config.credentials()?;
        let timestamp = Self::timestamp();
        let signature = self.signature(
            &[("public_id", public_id.to_string()), ("timestamp", timestamp.clone())],
            creds.api_secret,
        );

        let mut params = vec![
            ("public_id", public_id),
            ("timestamp", timestamp.as_str()),
            ("api_key", creds.api_key),
            ("signature", signature.as_str()),
        ];
        if let Some(algorithm) = self.config.signature_algorithm.param() {
            params.push(("signature_algorithm", algorithm));
        }

        let url = self.endpoint(creds.cloud_name, "image/destroy");
        debug!(%url, public_id, "deleting media");

        let response = self
            .client
            .post(&url)
            .form(&params)
            .send()
            .await
            .map_err(|e| MediaError::delete_failed(public_id, e.to_string()))?;

        if !response.status().is_success() {
            return Err(MediaError::delete_failed(public_id, failure_reason(response).await));
        }

        let body: DestroyResponse = response.json().await.map_err(MediaError::backend)?;
        match body.result.as_str() {
            "ok" => Ok(DeleteOutcome::Deleted),
            "not found" => Ok(DeleteOutcome::NotFound),
            other => Err(MediaError::delete_failed(public_id, other)),
        }
    }

    /// `https://res.<delivery_host>/<cloud_name>/...`
    fn owns_url(&self, url: &str) -> bool {
        let Some(cloud_name) = self.config.cloud_name.as_deref() else {
            return false;
        };
        let Some((_, rest)) = url.split_once("://") else {
            return false;
        };
        let (host, path) = rest.split_once('/').unwrap_or((rest, ""));
        let host = host.to_ascii_lowercase();
        let delivery = self.config.delivery_host.to_ascii_lowercase();

        let host_ok = host == delivery || host.ends_with(&format!(".{delivery}"));
        host_ok && path.split('/').next() == Some(cloud_name)
    }

    fn backend_name(&self) -> &'static str {
        "cloudinary"
    }
}
