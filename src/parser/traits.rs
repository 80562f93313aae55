//! Parser trait definition

#[cfg(test)]
use mockall::automock;

use crate::parser::types::DependencyDeclaration;

/// Trait for parsing project manifests
#[cfg_attr(test, automock)]
pub trait Parser: Send + Sync {
    /// Parse the content and extract dependency declarations in document order
    fn parse(&self, content: &str) -> Result<Vec<DependencyDeclaration>, ParseError>;
}

/// Error type for parsing operations
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    /// The document is not valid JSON
    #[error("Invalid syntax: {0}")]
    InvalidSyntax(#[from] serde_json::Error),

    /// The document is valid JSON but not a manifest
    #[error("Failed to parse file: {0}")]
    ParseFailed(String),
}
