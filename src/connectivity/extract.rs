//! Mean time series per parcellation region
//!
//! Before averaging, the functional image, mask and parcellation are brought
//! onto one grid. Label and mask images are only ever resampled with
//! nearest-neighbour interpolation.

use crate::io::configuration::MISSING_REGION_MARGIN;
use crate::io::error::{PipelineError, Result, WithPath, invalid_data, invalid_parameter};
use crate::io::nifti::Volume;
use crate::io::table::Table;
use crate::signal::clean::{CleanOptions, clean};
use crate::signal::resample::{Interpolation, resample_like};
use flate2::Compression;
use flate2::write::GzEncoder;
use ndarray::{Array2, ArrayView3};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::fs::File;
use std::path::Path;
use std::str::FromStr;
use tracing::{debug, warn};

/// Grid on which region signals are computed
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ResamplingTarget {
    /// Functional image and mask are moved onto the parcellation grid
    #[default]
    Labels,
    /// Parcellation and mask are moved onto the functional grid
    Data,
}

impl ResamplingTarget {
    /// Name accepted on the command line
    pub const fn name(self) -> &'static str {
        match self {
            Self::Labels => "labels",
            Self::Data => "data",
        }
    }
}

impl fmt::Display for ResamplingTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ResamplingTarget {
    type Err = PipelineError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "labels" => Ok(Self::Labels),
            "data" => Ok(Self::Data),
            other => Err(invalid_parameter("space", &other, &"expected labels or data")),
        }
    }
}

/// Options for [`extract_regions`]
#[derive(Clone, Copy, Debug, Default)]
pub struct ExtractOptions {
    /// Grid the computation happens on
    pub space: ResamplingTarget,
    /// Linear-detrend each region series
    pub detrend: bool,
    /// Z-score each region series
    pub standardize: bool,
}

/// Region series found in one parcellation
#[derive(Clone, Debug)]
pub struct RegionExtraction {
    /// Codes of the regions that kept at least one in-mask voxel, ascending
    pub codes: Vec<i64>,
    /// Every non-zero code of the parcellation before masking
    pub expected: Vec<i64>,
    /// Mean series, `T x R` in the order of `codes`
    pub series: Array2<f64>,
}

impl RegionExtraction {
    /// Codes of regions that were lost to masking or resampling
    pub fn missing(&self) -> Vec<i64> {
        let present: BTreeSet<_> = self.codes.iter().collect();
        self.expected
            .iter()
            .filter(|code| !present.contains(code))
            .copied()
            .collect()
    }

    /// Region identifiers: explicit names, or the codes themselves
    ///
    /// # Errors
    ///
    /// Returns an error if the number of names differs from the region count
    pub fn region_names(&self, names: Option<&[String]>) -> Result<Vec<String>> {
        match names {
            Some(names) if names.len() == self.codes.len() => Ok(names.to_vec()),
            Some(names) => Err(invalid_data(&format!(
                "{} region names given for {} regions",
                names.len(),
                self.codes.len()
            ))),
            None => Ok(self.codes.iter().map(ToString::to_string).collect()),
        }
    }

    /// Keep the series as a table, or drop them
    ///
    /// # Errors
    ///
    /// Returns an error if the names do not match the series columns
    pub fn into_signals(self, names: Vec<String>, keep: bool) -> Result<RegionSignals> {
        if keep {
            Ok(RegionSignals::Kept(Table::new(names, self.series)?))
        } else {
            Ok(RegionSignals::Dropped)
        }
    }
}

/// Region series after the connectivity step
#[derive(Clone, Debug, PartialEq)]
pub enum RegionSignals {
    /// Series were not requested and have been released
    Dropped,
    /// Series table with one named column per region
    Kept(Table),
}

impl RegionSignals {
    /// Series table, if kept
    pub const fn table(&self) -> Option<&Table> {
        match self {
            Self::Kept(table) => Some(table),
            Self::Dropped => None,
        }
    }

    /// Write kept series as a gzip-compressed CSV; returns whether anything was written
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written
    pub fn write_gz(&self, path: &Path) -> Result<bool> {
        let Some(table) = self.table() else {
            return Ok(false);
        };
        let file = File::create(path).with_path(path)?;
        let mut encoder = GzEncoder::new(file, Compression::default());
        table.to_writer(&mut encoder, true).with_path(path)?;
        encoder.finish().with_path(path)?;
        Ok(true)
    }
}

/// Single-column file of region names, one per line
///
/// # Errors
///
/// Returns an error if the file cannot be read
pub fn read_region_names(path: &Path) -> Result<Vec<String>> {
    let text = std::fs::read_to_string(path).with_path(path)?;
    Ok(text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_owned)
        .collect())
}

/// Average the functional series within each parcellation region
///
/// Label 0 is background. Regions with no voxel inside the mask after
/// resampling are dropped with a warning.
///
/// # Errors
///
/// Returns an error if resampling fails, the image is not 4-D, or no region
/// survives masking
pub fn extract_regions(
    image: &Volume,
    mask: Option<&Volume>,
    labels: &Volume,
    options: &ExtractOptions,
) -> Result<RegionExtraction> {
    let expected = label_codes(labels.as_3d()?);

    let (image, mask, labels) = match options.space {
        ResamplingTarget::Labels => (
            resample_like(image, labels, Interpolation::Linear)?,
            mask.map(|m| resample_like(m, labels, Interpolation::Nearest))
                .transpose()?,
            labels.clone(),
        ),
        ResamplingTarget::Data => (
            image.clone(),
            mask.map(|m| resample_like(m, image, Interpolation::Nearest))
                .transpose()?,
            resample_like(labels, image, Interpolation::Nearest)?,
        ),
    };
    debug!("region signals computed on the {} grid", options.space);

    let data = image.as_4d()?;
    let label_grid = labels.as_3d()?;
    let mask_grid = mask.as_ref().map(Volume::as_3d).transpose()?;
    let frames = image.n_timepoints();

    let mut sums: BTreeMap<i64, (usize, Vec<f64>)> = BTreeMap::new();
    for ((x, y, z), &value) in label_grid.indexed_iter() {
        let code = to_code(value);
        if code == 0 {
            continue;
        }
        let inside = mask_grid
            .as_ref()
            .is_none_or(|m| m.get((x, y, z)).is_some_and(|&v| v != 0.0 && !v.is_nan()));
        if !inside {
            continue;
        }
        let entry = sums.entry(code).or_insert_with(|| (0, vec![0.0; frames]));
        entry.0 += 1;
        for (t, acc) in entry.1.iter_mut().enumerate() {
            *acc += data.get((x, y, z, t)).copied().unwrap_or(0.0);
        }
    }

    if sums.is_empty() {
        return Err(invalid_data(&"no parcellation region overlaps the mask"));
    }

    let codes: Vec<i64> = sums.keys().copied().collect();
    let mut series = Array2::zeros((frames, codes.len()));
    for (mut column, (count, total)) in series.columns_mut().into_iter().zip(sums.values()) {
        let count = *count as f64;
        for (cell, sum) in column.iter_mut().zip(total) {
            *cell = sum / count;
        }
    }

    if options.detrend || options.standardize {
        let clean_options = CleanOptions {
            detrend: options.detrend,
            standardize: options.standardize,
            ..CleanOptions::default()
        };
        clean(&mut series, None, &clean_options)?;
    }

    let extraction = RegionExtraction {
        codes,
        expected,
        series,
    };
    report_missing(&extraction);
    Ok(extraction)
}

fn report_missing(extraction: &RegionExtraction) {
    let missing = extraction.missing();
    if missing.is_empty() {
        return;
    }
    warn!(
        "parcellation has {} regions but only {} survived masking; missing: {missing:?}",
        extraction.expected.len(),
        extraction.codes.len()
    );
    if missing.len() > MISSING_REGION_MARGIN {
        warn!(
            "{} regions missing, the image and parcellation are probably not aligned",
            missing.len()
        );
    }
}

fn label_codes(labels: ArrayView3<'_, f64>) -> Vec<i64> {
    labels
        .iter()
        .map(|&v| to_code(v))
        .filter(|&code| code != 0)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

fn to_code(value: f64) -> i64 {
    if value.is_finite() {
        value.round() as i64
    } else {
        0
    }
}
