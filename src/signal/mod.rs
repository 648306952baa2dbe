//! Numerical signal and image operations shared by the pipeline stages
//!
//! This layer owns everything the transforms delegate: band-pass filtering,
//! confound projection, standardization, smoothing, resampling onto other
//! grids, and covariance-based association measures.

/// Signal cleaning (detrend, confound projection, z-scoring)
pub mod clean;
/// Association measures computed from region time series
pub mod covariance;
/// Zero-phase Butterworth band-pass filtering
pub mod filters;
/// Conversion between images and time-by-voxel matrices
pub mod masking;
/// Grid-to-grid resampling of label and intensity images
pub mod resample;
/// Gaussian smoothing of image volumes
pub mod smoothing;

pub use clean::{CleanOptions, clean};
pub use filters::BandPass;
