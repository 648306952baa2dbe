//! Packaging a labelled connectivity matrix with anatomical region names

/// Key file location from flags or a JSON config
pub mod config;
/// Key file parsing
pub mod lookup;
/// Manifest construction and matrix trimming
pub mod manifest;
/// Compiled-in aseg structure list
pub mod subcortical;

pub use config::{CatalogConfig, resolve_key};
pub use lookup::{LabelEntry, LabelMap};
pub use manifest::{
    Catalog, CatalogOptions, CatalogPaths, ManifestEntry, MatrixCsv, MissingLabelPolicy,
    catalog_matrix,
};
