#![allow(dead_code)]

mod project;
mod registry;

pub use project::TestProject;
pub use registry::MapRegistry;
