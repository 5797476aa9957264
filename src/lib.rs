//! Converts an OpenStreetMap XML extract into five CSV tables (nodes, node
//! tags, ways, way node order, way tags) ready to load into a relational
//! store, cleaning tag keys and values on the way through.
//!
//! The file is streamed one element at a time: each node or way is shaped,
//! optionally validated against the table schemas, and written before the
//! next one is read.

pub mod clean;
pub mod config;
pub mod data;
pub mod errors;
pub mod etl;

pub use config::{load_user_config, UserConfig};
pub use errors::{Error, Result};
pub use etl::audit::{audit, audit_element, AuditEtl, AuditSummary};
pub use etl::process_map::{ProcessMapEtl, RunStats};
pub use etl::Etl;

/// Runs the whole conversion described by `config`.
pub fn process_map(config: &UserConfig) -> Result<RunStats> {
    let mut etl = ProcessMapEtl::new(config)?;
    etl.process()?;
    Ok(etl.stats())
}
