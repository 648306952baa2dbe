//! fMRI preprocessing and functional connectivity transforms
//!
//! Each transform reads files, computes, and writes files: confound
//! construction and denoising, regional time series and connectivity
//! matrices, label catalogs, and high-variance component extraction.

#![deny(unsafe_code)]

/// Label manifests for connectivity matrices
pub mod catalog;
/// High-variance component regressors
pub mod compcor;
/// Nuisance design matrices from confound tables
pub mod confounds;
/// Region series extraction and connectivity matrices
pub mod connectivity;
/// Confound regression and band-pass filtering of images
pub mod denoise;
/// Input/output operations and error handling
pub mod io;
/// Numerical signal and image operations
pub mod signal;

pub use io::error::{PipelineError, Result};
