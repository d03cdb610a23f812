//! terrachem command line inspector
//!
//! Loads material directories into a registry and reports on the result.

pub mod config;
pub mod report;

pub use config::ToolConfig;
