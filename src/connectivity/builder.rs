//! Per-parcellation connectivity: extraction, association and outputs

use crate::connectivity::extract::{ExtractOptions, RegionSignals, extract_regions};
use crate::connectivity::matrix::ConnectivityMatrix;
use crate::io::error::Result;
use crate::io::nifti::Volume;
use crate::signal::covariance::Measure;
use std::path::{Path, PathBuf};
use tracing::info;

/// Everything that controls one parcellation's connectivity run
#[derive(Clone, Debug)]
pub struct ConnectivityOptions {
    /// Resampling target and series post-processing
    pub extract: ExtractOptions,
    /// Association measure
    pub measure: Measure,
    /// Skip the matrix entirely
    pub skip_matrix: bool,
    /// Keep region series for output
    pub keep_series: bool,
    /// Region identifiers replacing the label codes
    pub region_names: Option<Vec<String>>,
}

impl Default for ConnectivityOptions {
    fn default() -> Self {
        Self {
            extract: ExtractOptions::default(),
            measure: Measure::Correlation,
            skip_matrix: false,
            keep_series: false,
            region_names: None,
        }
    }
}

/// Matrix and series derived from one parcellation
#[derive(Clone, Debug)]
pub struct Connectivity {
    /// Region identifiers, in matrix and series order
    pub names: Vec<String>,
    /// Association matrix, unless suppressed
    pub matrix: Option<ConnectivityMatrix>,
    /// Region series, if requested
    pub signals: RegionSignals,
}

/// File names written for one parcellation
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OutputPaths {
    /// Labelled matrix
    pub labelled: PathBuf,
    /// Bare matrix
    pub raw: PathBuf,
    /// Compressed series table
    pub series: PathBuf,
}

impl OutputPaths {
    /// `<base>_<parc>_connMatdf.csv` and siblings, where `<parc>` is the
    /// parcellation file name up to its `.nii` extension
    pub fn new(base: &str, parcellation: &Path) -> Self {
        let stem = parcellation_stem(parcellation);
        Self {
            labelled: PathBuf::from(format!("{base}_{stem}_connMatdf.csv")),
            raw: PathBuf::from(format!("{base}_{stem}_connMat.csv")),
            series: PathBuf::from(format!("{base}_{stem}_timeseries.csv.gz")),
        }
    }
}

/// Parcellation file name with everything from the last `.nii` removed
pub fn parcellation_stem(path: &Path) -> String {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    match name.rfind(".nii") {
        Some(end) => name.get(..end).unwrap_or(&name).to_owned(),
        None => name,
    }
}

/// Extract region series and compute the association matrix
///
/// # Errors
///
/// Returns an error if extraction fails, the region names do not match,
/// or the matrix is not symmetric
pub fn build_connectivity(
    image: &Volume,
    mask: Option<&Volume>,
    labels: &Volume,
    options: &ConnectivityOptions,
) -> Result<Connectivity> {
    let extraction = extract_regions(image, mask, labels, &options.extract)?;
    let names = extraction.region_names(options.region_names.as_deref())?;
    info!(
        "extracted {} region series of length {}",
        names.len(),
        extraction.series.nrows()
    );

    let matrix = if options.skip_matrix {
        None
    } else {
        info!("computing {} matrix", options.measure);
        Some(ConnectivityMatrix::compute(
            &extraction.series,
            options.measure,
            names.clone(),
        )?)
    };
    let signals = extraction.into_signals(names.clone(), options.keep_series)?;

    Ok(Connectivity {
        names,
        matrix,
        signals,
    })
}

impl Connectivity {
    /// Write the matrix files and, if kept, the series table
    ///
    /// # Errors
    ///
    /// Returns an error if any file cannot be written
    pub fn write(&self, paths: &OutputPaths) -> Result<()> {
        if let Some(matrix) = &self.matrix {
            matrix.write_labelled(&paths.labelled)?;
            matrix.write_raw(&paths.raw)?;
            info!("wrote {}", paths.labelled.display());
        }
        if self.signals.write_gz(&paths.series)? {
            info!("wrote {}", paths.series.display());
        }
        Ok(())
    }
}
