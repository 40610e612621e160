//! Pack configuration registry.
//!
//! Static, per-topic configuration: required fields, priority order,
//! raw-key mapping, probe budget and probe templates.

mod pack_config;
mod registry;

pub use pack_config::{PackConfig, PackDefinition, PackError, MAX_PROBES_CEILING};
pub use registry::{pack_ids, PackRegistry};
