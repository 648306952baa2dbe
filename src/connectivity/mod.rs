//! Regional time series and region-to-region connectivity matrices

/// Per-parcellation orchestration and output naming
pub mod builder;
/// Mean series per label after resampling and masking
pub mod extract;
/// Validated symmetric matrices and their CSV forms
pub mod matrix;

pub use builder::{Connectivity, ConnectivityOptions, OutputPaths, build_connectivity};
pub use extract::{ExtractOptions, RegionExtraction, RegionSignals, ResamplingTarget, extract_regions};
pub use matrix::ConnectivityMatrix;
