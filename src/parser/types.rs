//! Common types for parsers

/// Which dependency map a declaration came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DependencyKind {
    /// `dependencies`
    Production,
    /// `devDependencies`
    Development,
}

impl DependencyKind {
    /// Returns the manifest field name for this kind
    pub fn as_str(&self) -> &'static str {
        match self {
            DependencyKind::Production => "dependencies",
            DependencyKind::Development => "devDependencies",
        }
    }
}

/// One dependency declared in a manifest
///
/// A name declared in both maps yields two declarations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DependencyDeclaration {
    /// Package name (e.g., "lodash", "@types/node")
    pub name: String,
    /// Declared range (e.g., "^4.0.0")
    pub version_range: String,
    pub kind: DependencyKind,
}

impl DependencyDeclaration {
    pub fn new(name: &str, version_range: &str, kind: DependencyKind) -> Self {
        Self {
            name: name.to_string(),
            version_range: version_range.to_string(),
            kind,
        }
    }

    pub fn is_dev(&self) -> bool {
        self.kind == DependencyKind::Development
    }
}
