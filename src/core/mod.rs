/*!
 * Core Module
 * Shared types, identifiers, errors, limits and configuration
 */

pub mod config;
pub mod errors;
pub mod id;
pub mod limits;
pub mod types;

pub use config::MonitorConfig;
pub use errors::MonitorError;
pub use id::{NodeId, NodeIdGenerator};
pub use types::{bytes_to_mb, now_ms, Megabytes, MonitorResult, Timestamp};
