//! Principal components of the highest-variance voxels
//!
//! Voxels whose variance falls in the top percentile usually sit in vessels,
//! ventricles or at the brain edge, so their dominant temporal components make
//! good nuisance regressors without a tissue segmentation.

use crate::io::configuration::{
    COMPCOR_COLUMN_PREFIX, DEFAULT_COMPCOR_COMPONENTS, DEFAULT_COMPCOR_PERCENTILE,
};
use crate::io::error::{Result, computation_error, invalid_parameter};
use crate::io::nifti::Volume;
use crate::io::table::Table;
use crate::signal::clean::{detrend, to_dmatrix};
use crate::signal::masking::{binarize, extract_series};
use nalgebra::SymmetricEigen;
use ndarray::{Array2, Axis};
use tracing::{debug, info};

/// Parameters of the high-variance component extraction
#[derive(Clone, Debug, PartialEq)]
pub struct CompCorOptions {
    /// Percentage of voxels with the highest variance that are kept
    pub percentile: f64,
    /// Number of components returned
    pub components: usize,
    /// Remove mean and linear trend before measuring variance
    pub detrend: bool,
    /// Inserted into the column names after the standard prefix
    pub tag: Option<String>,
}

impl Default for CompCorOptions {
    fn default() -> Self {
        Self {
            percentile: DEFAULT_COMPCOR_PERCENTILE,
            components: DEFAULT_COMPCOR_COMPONENTS,
            detrend: true,
            tag: None,
        }
    }
}

impl CompCorOptions {
    /// `a_comp_cor_[<tag>_]1..n`
    pub fn column_names(&self) -> Vec<String> {
        let base = match &self.tag {
            Some(tag) => format!("{COMPCOR_COLUMN_PREFIX}{tag}_"),
            None => COMPCOR_COLUMN_PREFIX.to_owned(),
        };
        (1..=self.components).map(|n| format!("{base}{n}")).collect()
    }
}

/// Extract high-variance components of `image` within `mask`
///
/// # Errors
///
/// Returns an error if the options are out of range, the mask grid differs,
/// or no voxel passes the variance threshold
pub fn high_variance_confounds(
    image: &Volume,
    mask: Option<&Volume>,
    options: &CompCorOptions,
) -> Result<Table> {
    if !(options.percentile > 0.0 && options.percentile <= 100.0) {
        return Err(invalid_parameter(
            "prcnt",
            &options.percentile,
            &"must be in (0, 100]",
        ));
    }
    let inside = mask.map(|m| m.as_3d().map(binarize)).transpose()?;
    let mut series = extract_series(image.as_4d()?, inside.as_ref())?;
    let frames = series.nrows();
    if options.components == 0 || options.components > frames {
        return Err(invalid_parameter(
            "ncomponents",
            &options.components,
            &format!("must be between 1 and the {frames} volumes"),
        ));
    }
    if options.detrend {
        detrend(&mut series);
    }

    let variance = series.mapv(|v| v * v).mean_axis(Axis(0)).unwrap_or_default();
    let threshold = percentile(variance.as_slice().unwrap_or_default(), 100.0 - options.percentile)
        .ok_or_else(|| computation_error("compcor", &"no voxels to threshold"))?;
    let selected: Vec<usize> = variance
        .iter()
        .enumerate()
        .filter(|&(_, &v)| v > threshold)
        .map(|(i, _)| i)
        .collect();
    if selected.is_empty() {
        return Err(computation_error(
            "compcor",
            &"no voxel exceeds the variance threshold",
        ));
    }
    debug!("{} voxels above variance {threshold}", selected.len());
    let high = series.select(Axis(1), &selected);

    let components = leading_components(&high, options.components)?;
    info!(
        "extracted {} components from {} high-variance voxels",
        options.components,
        selected.len()
    );
    Table::new(options.column_names(), components)
}

// Leading left singular vectors of `series`, from the eigenvectors of its
// time-by-time Gram matrix in descending eigenvalue order
fn leading_components(series: &Array2<f64>, count: usize) -> Result<Array2<f64>> {
    let gram = series.dot(&series.t());
    let eigen = SymmetricEigen::try_new(to_dmatrix(&gram), f64::EPSILON, 0)
        .ok_or_else(|| computation_error("compcor", &"eigen decomposition did not converge"))?;
    let mut order: Vec<usize> = (0..eigen.eigenvalues.len()).collect();
    order.sort_by(|&a, &b| {
        let va = eigen.eigenvalues.get(a).copied().unwrap_or(0.0);
        let vb = eigen.eigenvalues.get(b).copied().unwrap_or(0.0);
        vb.total_cmp(&va)
    });
    let frames = series.nrows();
    Ok(Array2::from_shape_fn((frames, count), |(t, c)| {
        order
            .get(c)
            .and_then(|&k| eigen.eigenvectors.get((t, k)))
            .copied()
            .unwrap_or(0.0)
    }))
}

/// Linearly interpolated percentile of the finite values, `q` in `[0, 100]`
pub fn percentile(values: &[f64], q: f64) -> Option<f64> {
    let mut finite: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
    if finite.is_empty() {
        return None;
    }
    finite.sort_by(f64::total_cmp);
    let position = (q.clamp(0.0, 100.0) / 100.0) * (finite.len() - 1) as f64;
    let lower = position.floor() as usize;
    let upper = position.ceil() as usize;
    let low = finite.get(lower).copied()?;
    let high = finite.get(upper).copied()?;
    Some((high - low).mul_add(position - lower as f64, low))
}
