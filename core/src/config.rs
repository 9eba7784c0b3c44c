use std::time::Duration;

/// Production Graph API endpoint. Paths are appended to it verbatim.
pub const DEFAULT_BASE_URL: &str = "https://graph.facebook.com/";

/// Client configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Prefix for every request path. A trailing `/` is added if missing.
    pub base_url: String,
    /// Whole-request timeout applied by `UreqTransport`. `None` waits
    /// indefinitely.
    pub timeout: Option<Duration>,
}

impl ClientConfig {
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    /// `base_url` with exactly one trailing slash.
    pub(crate) fn normalized_base_url(&self) -> String {
        format!("{}/", self.base_url.trim_end_matches('/'))
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: None,
        }
    }
}
