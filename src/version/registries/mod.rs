//! Registry implementations for fetching dist-tags

pub mod npm;

pub use npm::NpmRegistry;
