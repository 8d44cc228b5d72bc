//! Configuration management for the ticketry issue tracker.
//!
//! This crate discovers `.ticketry/` directories in the filesystem, loads
//! `.ticketry/config.yaml` (layered with `TICKETRY_*` environment variables)
//! and reads the project workflow from `.ticketry/workflow.yaml`.

pub mod config;
pub mod ticketry_dir;
pub mod workflow;
