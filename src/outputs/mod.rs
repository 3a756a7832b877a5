//! File outputs.
//!
//! # Submodules
//!
//! - [`json`]: writes a resolution record as JSON, for scripts and cron jobs
//!   that run `nomo_viewer resolve --json-output <file>`

pub mod json;
