//! File formats, command-line handling and process-wide settings

/// Command-line parsing and the per-subcommand runners
pub mod cli;
/// Compiled-in defaults and numeric constants
pub mod configuration;
/// Error types
pub mod error;
/// Diagnostic output setup
pub mod logging;
/// NIfTI image volumes
pub mod nifti;
/// Progress display across parcellations
pub mod progress;
/// Named-column numeric tables
pub mod table;
