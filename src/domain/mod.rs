//! Domain layer containing probing logic and domain types.
//!
//! # Module Organization
//!
//! - `foundation` - Shared domain primitives (errors, state machine, text folding)
//! - `packs` - Topic pack configuration and the read-only registry
//! - `anchors` - Pack- and field-scoped anchor extraction and merging
//! - `probing` - Gap analysis, probe stage machine and per-turn decision
//! - `questions` - Question rendering, tone and guardrail rules

pub mod anchors;
pub mod foundation;
pub mod packs;
pub mod probing;
pub mod questions;
