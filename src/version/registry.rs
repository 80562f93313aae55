//! Registry trait for fetching distribution tags from a remote source

#[cfg(test)]
use mockall::automock;

use crate::version::error::RegistryError;
use crate::version::types::DistTags;

/// Trait for looking up a package's published channels
#[cfg_attr(test, automock)]
#[async_trait::async_trait]
pub trait Registry: Send + Sync {
    /// Fetches the dist-tags for a package
    ///
    /// Performs exactly one lookup: no batching, caching or retry.
    ///
    /// # Returns
    /// * `Ok(DistTags)` - The channels published for the package
    /// * `Err(RegistryError)` - If the fetch fails, times out or the response is malformed
    async fn fetch_dist_tags(&self, package_name: &str) -> Result<DistTags, RegistryError>;
}
