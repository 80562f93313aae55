pub mod config;
pub mod engine;
pub mod logging;
pub mod parser;
pub mod version;
