//! npm registry API implementation

use std::time::Duration;

use crate::config::RegistryConfig;
use crate::version::error::RegistryError;
use crate::version::registry::Registry;
use crate::version::types::DistTags;
use serde::Deserialize;
use tracing::{debug, warn};

/// Default base URL for npm registry
pub const DEFAULT_BASE_URL: &str = "https://registry.npmjs.org";

/// Abbreviated package metadata, which still carries `dist-tags`
const ABBREVIATED_METADATA: &str = "application/vnd.npm.install-v1+json";

/// Response from npm registry API
#[derive(Debug, Deserialize)]
struct NpmPackageResponse {
    #[serde(rename = "dist-tags")]
    dist_tags: Option<DistTags>,
}

/// Registry implementation for npm registry API
#[derive(Clone)]
pub struct NpmRegistry {
    client: reqwest::Client,
    base_url: String,
}

impl NpmRegistry {
    /// Creates a new NpmRegistry with a custom base URL and request timeout
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, RegistryError> {
        let client = reqwest::Client::builder()
            .user_agent(env!("CARGO_PKG_NAME"))
            .timeout(timeout)
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn from_config(config: &RegistryConfig) -> Result<Self, RegistryError> {
        Self::new(&config.url, Duration::from_millis(config.timeout_ms))
    }

    /// Encode package name for URL (handles scoped packages)
    fn encode_package_name(package_name: &str) -> String {
        if package_name.starts_with('@') {
            // Scoped package: @scope/name -> @scope%2Fname
            package_name.replace('/', "%2F")
        } else {
            package_name.to_string()
        }
    }
}

#[async_trait::async_trait]
impl Registry for NpmRegistry {
    async fn fetch_dist_tags(&self, package_name: &str) -> Result<DistTags, RegistryError> {
        let encoded_name = Self::encode_package_name(package_name);
        let url = format!("{}/{}", self.base_url, encoded_name);

        debug!("Fetching dist-tags from {}", url);
        let response = self
            .client
            .get(&url)
            .header(reqwest::header::ACCEPT, ABBREVIATED_METADATA)
            .send()
            .await?;

        let status = response.status();

        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(RegistryError::NotFound(package_name.to_string()));
        }

        if !status.is_success() {
            warn!("npm registry returned status {}: {}", status, url);
            return Err(RegistryError::InvalidResponse(format!(
                "Unexpected status: {}",
                status
            )));
        }

        let package_info: NpmPackageResponse = response.json().await.map_err(|e| {
            warn!("Failed to parse npm registry response: {}", e);
            RegistryError::InvalidResponse(e.to_string())
        })?;

        package_info.dist_tags.ok_or_else(|| {
            RegistryError::InvalidResponse(format!("No dist-tags for {}", package_name))
        })
    }
}
