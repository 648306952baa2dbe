//! Data-driven nuisance regressors from high-variance voxels

/// Percentile thresholding and component extraction
pub mod high_variance;

pub use high_variance::{CompCorOptions, high_variance_confounds};
