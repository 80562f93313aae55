//! Version lookup and comparison layer
//!
//! This module provides the leaves of the reconciliation pipeline: reading
//! what is installed locally, asking the registry what is published, and
//! comparing the two against a declared range.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │    Local    │     │  Registry   │     │   Semver    │
//! │(node_modules│     │ (dist-tags) │     │  (compare)  │
//! └─────────────┘     └─────────────┘     └─────────────┘
//!                            │
//!                            ▼
//!                     ┌─────────────┐
//!                     │ Registries  │
//!                     │    (npm)    │
//!                     └─────────────┘
//! ```
//!
//! # Modules
//!
//! - [`local`]: Installed version lookup under `node_modules`
//! - [`registry`]: Registry trait for fetching dist-tags
//! - [`registries`]: Concrete registry implementations (npm)
//! - [`semver`]: npm range semantics (`satisfies`, `greater_than_range`, `greater_than`)
//! - [`error`]: Error types for version parsing and registry operations
//! - [`types`]: Common types like `DistTags`

pub mod error;
pub mod local;
pub mod registries;
pub mod registry;
pub mod semver;
pub mod types;
