//! package.json parser

use indexmap::IndexMap;
use serde::Deserialize;
use serde_json::error::Category;
use tracing::warn;

use crate::parser::traits::{ParseError, Parser};
use crate::parser::types::{DependencyDeclaration, DependencyKind};

/// The parts of package.json this parser reads. `IndexMap` keeps the
/// declaration order of each map.
#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct PackageJson {
    dependencies: IndexMap<String, serde_json::Value>,
    dev_dependencies: IndexMap<String, serde_json::Value>,
}

/// Parser for package.json files
pub struct PackageJsonParser;

impl PackageJsonParser {
    pub fn new() -> Self {
        Self
    }

    fn collect(
        map: IndexMap<String, serde_json::Value>,
        kind: DependencyKind,
        results: &mut Vec<DependencyDeclaration>,
    ) {
        for (name, value) in map {
            match value {
                serde_json::Value::String(range) => results.push(DependencyDeclaration {
                    name,
                    version_range: range,
                    kind,
                }),
                other => warn!(
                    "Skipping {} in {}: range is not a string ({})",
                    name,
                    kind.as_str(),
                    other
                ),
            }
        }
    }
}

impl Default for PackageJsonParser {
    fn default() -> Self {
        Self::new()
    }
}

impl Parser for PackageJsonParser {
    fn parse(&self, content: &str) -> Result<Vec<DependencyDeclaration>, ParseError> {
        let manifest: PackageJson = serde_json::from_str(content).map_err(|e| match e.classify() {
            Category::Data => ParseError::ParseFailed(e.to_string()),
            _ => ParseError::InvalidSyntax(e),
        })?;

        let mut results = Vec::with_capacity(
            manifest.dependencies.len() + manifest.dev_dependencies.len(),
        );
        Self::collect(manifest.dependencies, DependencyKind::Production, &mut results);
        Self::collect(
            manifest.dev_dependencies,
            DependencyKind::Development,
            &mut results,
        );

        Ok(results)
    }
}
