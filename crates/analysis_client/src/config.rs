use std::time::Duration;

use anyhow::{bail, Context, Result};
use url::Url;

pub const DEFAULT_BASE_URL: &str = "http://localhost:5000";
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    base_url: Url,
    request_timeout: Duration,
}

impl ClientConfig {
    pub fn parse(base_url: &str, request_timeout: Duration) -> Result<Self> {
        let raw = base_url.trim();
        let mut base_url =
            Url::parse(raw).with_context(|| format!("invalid analysis service url '{raw}'"))?;
        if !matches!(base_url.scheme(), "http" | "https") {
            bail!(
                "analysis service url '{raw}' must use http or https, got '{}'",
                base_url.scheme()
            );
        }
        if request_timeout.is_zero() {
            bail!("request timeout must be greater than zero");
        }

        // Url::join drops the last segment unless the path ends with '/'.
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }
        base_url.set_query(None);
        base_url.set_fragment(None);

        Ok(Self {
            base_url,
            request_timeout,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn request_timeout(&self) -> Duration {
        self.request_timeout
    }
}
