//! Probe Engine - adaptive follow-up probing for background questionnaires
//!
//! After each candidate answer this crate extracts factual anchors, works
//! out which required facts are still missing or ambiguous, and decides
//! whether to ask one more clarifying question (and which), within a
//! per-topic probe budget.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
