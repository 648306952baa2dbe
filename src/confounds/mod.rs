//! Nuisance regressor construction from confound tables
//!
//! A confounds table holds one row per volume and one column per candidate
//! signal (motion parameters, tissue signals, CompCor components, framewise
//! displacement, cosine basis). A [`Strategy`] picks and expands a subset of
//! those columns into the design matrix used for denoising.

/// Design matrix assembly
pub mod builder;
/// CompCor column selection and the confounds JSON sidecar
pub mod components;
/// Legacy and current column naming schemes
pub mod schema;
/// Framewise displacement spike regressors
pub mod spikes;
/// Closed set of confound strategies
pub mod strategy;

pub use builder::{ConfoundModel, ConfoundOptions, build_confounds};
pub use schema::ConfoundSchema;
pub use spikes::{OutlierSummary, SpikeRegressors, spike_regressors};
pub use strategy::{CompCorModel, MotionModel, Strategy};
