//! Registry test utilities

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use async_trait::async_trait;

use npm_outdated::version::error::RegistryError;
use npm_outdated::version::registry::Registry;
use npm_outdated::version::types::DistTags;

/// Map-backed registry that records every lookup
#[derive(Default)]
pub struct MapRegistry {
    tags: HashMap<String, DistTags>,
    failing: HashSet<String>,
    requests: Mutex<Vec<String>>,
}

impl MapRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tags(mut self, package: &str, latest: Option<&str>, beta: Option<&str>) -> Self {
        self.tags
            .insert(package.to_string(), DistTags::new(latest, beta));
        self
    }

    /// Lookups for `package` fail as if the response were garbage
    pub fn with_failure(mut self, package: &str) -> Self {
        self.failing.insert(package.to_string());
        self
    }

    /// Package names looked up so far, sorted
    pub fn requests(&self) -> Vec<String> {
        let mut requests = self.requests.lock().unwrap().clone();
        requests.sort();
        requests
    }
}

#[async_trait]
impl Registry for MapRegistry {
    async fn fetch_dist_tags(&self, package_name: &str) -> Result<DistTags, RegistryError> {
        self.requests
            .lock()
            .unwrap()
            .push(package_name.to_string());

        if self.failing.contains(package_name) {
            return Err(RegistryError::InvalidResponse(format!(
                "simulated failure for {package_name}"
            )));
        }

        self.tags
            .get(package_name)
            .cloned()
            .ok_or_else(|| RegistryError::NotFound(package_name.to_string()))
    }
}
