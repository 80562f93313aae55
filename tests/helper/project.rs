//! Throwaway project directories

use std::path::{Path, PathBuf};

use tempfile::TempDir;

/// A project root with a `package.json` and a `node_modules` tree
pub struct TestProject {
    dir: TempDir,
}

impl TestProject {
    pub fn new(manifest: &str) -> Self {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("package.json"), manifest).unwrap();
        Self { dir }
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    pub fn manifest_path(&self) -> PathBuf {
        self.root().join("package.json")
    }

    pub fn write_manifest(&self, manifest: &str) {
        std::fs::write(self.manifest_path(), manifest).unwrap();
    }

    /// Install `name` at `version`
    pub fn install(&self, name: &str, version: &str) -> &Self {
        self.install_raw(name, &format!(r#"{{"name": "{name}", "version": "{version}"}}"#))
    }

    /// Install `name` with an arbitrary manifest body
    pub fn install_raw(&self, name: &str, content: &str) -> &Self {
        let package_dir = self.root().join("node_modules").join(name);
        std::fs::create_dir_all(&package_dir).unwrap();
        std::fs::write(package_dir.join("package.json"), content).unwrap();
        self
    }
}
