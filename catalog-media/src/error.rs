use thiserror::Error;

/// Result type for media operations
pub type MediaResult<T> = Result<T, MediaError>;

/// Errors that can occur while talking to a media store
#[derive(Error, Debug)]
pub enum MediaError {
    #[error("Media store is not configured: missing {missing}")]
    NotConfigured { missing: &'static str },

    #[error("Invalid media configuration: {message}")]
    InvalidConfig { message: String },

    #[error("upload rejected: {reason}")]
    UploadFailed { reason: String },

    #[error("delete of '{public_id}' failed: {reason}")]
    DeleteFailed { public_id: String, reason: String },

    #[error("Not a recognisable media URL: {url}")]
    InvalidUrl { url: String },

    #[error("Media backend error: {source}")]
    Backend {
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("Serialization error: {source}")]
    Serialization {
        #[from]
        source: serde_json::Error,
    },
}

impl MediaError {
    pub fn backend<E>(error: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Backend {
            source: Box::new(error),
        }
    }

    pub fn upload_failed<S: Into<String>>(reason: S) -> Self {
        Self::UploadFailed {
            reason: reason.into(),
        }
    }

    pub fn delete_failed<S: Into<String>, R: Into<String>>(public_id: S, reason: R) -> Self {
        Self::DeleteFailed {
            public_id: public_id.into(),
            reason: reason.into(),
        }
    }

    pub fn invalid_config<S: Into<String>>(message: S) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }

    pub fn invalid_url<S: Into<String>>(url: S) -> Self {
        Self::InvalidUrl { url: url.into() }
    }
}
