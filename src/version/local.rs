//! Installed package lookup under `node_modules`

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

const PACKAGE_MANIFEST: &str = "package.json";

/// Reads the exact installed version of dependencies from an install root
#[derive(Debug, Clone)]
pub struct LocalResolver {
    install_root: PathBuf,
}

impl LocalResolver {
    pub fn new(install_root: impl Into<PathBuf>) -> Self {
        Self {
            install_root: install_root.into(),
        }
    }

    /// Install root for a project manifest: `<manifest dir>/node_modules`
    pub fn for_manifest(manifest_path: &Path) -> Self {
        let project_root = manifest_path.parent().unwrap_or_else(|| Path::new("."));
        Self::new(project_root.join("node_modules"))
    }

    pub fn install_root(&self) -> &Path {
        &self.install_root
    }

    /// Returns the installed version, or `None` if the package is not
    /// installed or its manifest is unreadable.
    pub async fn resolve(&self, package_name: &str) -> Option<String> {
        // Scoped names map onto nested directories: @scope/name -> @scope/name/
        let path = package_name
            .split('/')
            .fold(self.install_root.clone(), |path, segment| path.join(segment))
            .join(PACKAGE_MANIFEST);

        let content = match tokio::fs::read_to_string(&path).await {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("{} is not installed ({:?} missing)", package_name, path);
                return None;
            }
            Err(e) => {
                warn!("Failed to read {:?}: {}", path, e);
                return None;
            }
        };

        let manifest: serde_json::Value = serde_json::from_str(&content)
            .inspect_err(|e| warn!("Failed to parse {:?}: {}", path, e))
            .ok()?;

        match manifest.get("version") {
            Some(serde_json::Value::String(version)) => Some(version.clone()),
            Some(other) => {
                warn!("Ignoring non-string version {} in {:?}", other, path);
                None
            }
            None => {
                warn!("No version field in {:?}", path);
                None
            }
        }
    }
}
