//! Nuisance regression and band-pass filtering of a 4-D functional image
//!
//! With a brain mask, the image is smoothed, in-mask voxel series are cleaned
//! and written back into an otherwise empty volume. Without one, every voxel
//! series is cleaned directly and no smoothing is applied. Either way the
//! leading stabilization volumes are discarded afterwards.

/// The cleaning stage
pub mod denoiser;
/// Filter cutoffs and sampling time
pub mod settings;

pub use denoiser::{DenoiseOptions, DenoiseOutput, Denoiser};
pub use settings::{FilterSettings, HighPass, resolve_repetition_time};
