// ABOUTME: Library root for rollout - health-gated deployment operations.
// ABOUTME: Planners build operations; this crate executes, reports, and fails them.

pub mod client;
pub mod config;
pub mod error;
pub mod operation;
pub mod spec;
pub mod types;
