//! Signal cleaning: detrending, confound projection and standardization
//!
//! Series are stored time-by-series (`T x V`): each column is one voxel or
//! region.

use crate::io::error::{Result, computation_error, invalid_data};
use crate::signal::filters::BandPass;
use nalgebra::DMatrix;
use ndarray::{Array1, Array2, Axis};

// Singular values below this fraction of the largest are treated as rank loss
const RANK_TOLERANCE: f64 = 1e-10;

/// Standard deviations below this are treated as constant series
pub const STD_EPSILON: f64 = f64::EPSILON * 10.0;

/// Options for [`clean`]
#[derive(Clone, Debug, Default)]
pub struct CleanOptions {
    /// Remove a linear trend (and the mean) before anything else
    pub detrend: bool,
    /// Z-score every series at the end
    pub standardize: bool,
    /// Band-pass applied to both series and confounds
    pub band_pass: BandPass,
}

/// Clean series in place: detrend, filter, regress out confounds, standardize
///
/// Confounds are filtered with the same band-pass as the series before the
/// projection, so the regression does not reintroduce filtered frequencies.
///
/// # Errors
///
/// Returns an error if the confound rows differ from the series length, the
/// confounds contain non-finite values, or the projection fails
pub fn clean(
    series: &mut Array2<f64>,
    confounds: Option<&Array2<f64>>,
    options: &CleanOptions,
) -> Result<()> {
    if options.detrend {
        detrend(series);
    }
    options.band_pass.apply_columns(series);

    if let Some(confounds) = confounds.filter(|c| c.ncols() > 0) {
        if confounds.nrows() != series.nrows() {
            return Err(invalid_data(&format!(
                "confounds have {} rows but the signal has {} time points",
                confounds.nrows(),
                series.nrows()
            )));
        }
        if confounds.iter().any(|v| !v.is_finite()) {
            return Err(invalid_data(&"confounds contain missing or non-finite values"));
        }
        let mut design = confounds.clone();
        options.band_pass.apply_columns(&mut design);
        if options.detrend {
            detrend(&mut design);
        }
        standardize(&mut design);
        regress_out(series, &design)?;
    }

    if options.standardize {
        standardize(series);
    }
    Ok(())
}

/// Remove each column's mean and least-squares linear trend
pub fn detrend(series: &mut Array2<f64>) {
    let n = series.nrows();
    if n == 0 {
        return;
    }
    center(series);

    let mean_t = (n as f64 - 1.0) / 2.0;
    let mut trend = Array1::from_shape_fn(n, |t| t as f64 - mean_t);
    let norm = trend.dot(&trend).sqrt();
    if norm <= 0.0 {
        return;
    }
    trend /= norm;
    for mut column in series.axis_iter_mut(Axis(1)) {
        let weight = trend.dot(&column);
        column.scaled_add(-weight, &trend);
    }
}

/// Subtract each column's mean
pub fn center(series: &mut Array2<f64>) {
    if let Some(means) = series.mean_axis(Axis(0)) {
        *series -= &means;
    }
}

/// Z-score every column using the population standard deviation
///
/// Constant columns are centered but left unscaled.
pub fn standardize(series: &mut Array2<f64>) {
    center(series);
    let stds = series.std_axis(Axis(0), 0.0);
    for (mut column, std) in series.axis_iter_mut(Axis(1)).zip(stds) {
        if std > STD_EPSILON {
            column /= std;
        }
    }
}

/// Project the column space of `design` out of every series
///
/// # Errors
///
/// Returns an error if the singular value decomposition fails
pub fn regress_out(series: &mut Array2<f64>, design: &Array2<f64>) -> Result<()> {
    let basis = orthonormal_basis(design)?;
    if basis.ncols() == 0 {
        return Ok(());
    }
    let weights = basis.t().dot(series);
    *series -= &basis.dot(&weights);
    Ok(())
}

/// Orthonormal basis (`T x r`) of the column space of a design matrix
///
/// # Errors
///
/// Returns an error if the singular value decomposition fails
pub fn orthonormal_basis(design: &Array2<f64>) -> Result<Array2<f64>> {
    let (rows, cols) = design.dim();
    let matrix = to_dmatrix(design);
    let svd = matrix.svd(true, false);
    let u = svd
        .u
        .ok_or_else(|| computation_error("confound projection", &"SVD returned no basis"))?;

    let largest = svd.singular_values.iter().copied().fold(0.0_f64, f64::max);
    let keep: Vec<usize> = svd
        .singular_values
        .iter()
        .enumerate()
        .filter(|&(_, &s)| s > largest * RANK_TOLERANCE * rows.max(cols) as f64)
        .map(|(i, _)| i)
        .collect();

    Ok(Array2::from_shape_fn((rows, keep.len()), |(t, j)| {
        keep.get(j)
            .and_then(|&k| u.get((t, k)))
            .copied()
            .unwrap_or(0.0)
    }))
}

/// Copy an ndarray matrix into nalgebra storage
pub fn to_dmatrix(array: &Array2<f64>) -> DMatrix<f64> {
    let (rows, cols) = array.dim();
    DMatrix::from_fn(rows, cols, |i, j| array.get((i, j)).copied().unwrap_or(0.0))
}

/// Copy an nalgebra matrix into ndarray storage
pub fn from_dmatrix(matrix: &DMatrix<f64>) -> Array2<f64> {
    Array2::from_shape_fn(matrix.shape(), |(i, j)| {
        matrix.get((i, j)).copied().unwrap_or(0.0)
    })
}
