// src/lib.rs
// Library interface for ct-compliance
pub mod analyzer;
pub mod cli;
pub mod clock;
pub mod config;
pub mod ct_log;
pub mod output;
pub mod progress;
pub mod stats;
pub mod types;
