//! Per-call context carried into services and hooks.

/// Who is calling and how to correlate the call in logs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestContext {
    pub request_id: String,
    /// Transport that issued the call ("rest"), `None` for internal calls.
    pub provider: Option<String>,
}

impl RequestContext {
    pub fn new<S: Into<String>>(request_id: S) -> Self {
        Self {
            request_id: request_id.into(),
            provider: None,
        }
    }

    pub fn with_provider<S: Into<String>>(mut self, provider: S) -> Self {
        self.provider = Some(provider.into());
        self
    }

    /// Context for calls made from inside the process (jobs, tests, startup).
    pub fn internal() -> Self {
        Self::new("internal")
    }
}
