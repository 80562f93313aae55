//! Common types shared by the registry client and the reconciliation engine

use std::collections::BTreeMap;

use serde::Deserialize;

/// Distribution tags published for a package (`dist-tags` in the npm API)
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct DistTags {
    #[serde(default)]
    pub latest: Option<String>,
    #[serde(default)]
    pub beta: Option<String>,
    /// Any other channel (`next`, `canary`, ...), kept for diagnostics
    #[serde(flatten)]
    pub other: BTreeMap<String, String>,
}

impl DistTags {
    pub fn new(latest: Option<&str>, beta: Option<&str>) -> Self {
        Self {
            latest: latest.map(str::to_string),
            beta: beta.map(str::to_string),
            other: BTreeMap::new(),
        }
    }
}
