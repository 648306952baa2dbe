//! Association measures between region time series
//!
//! Every measure starts from a Ledoit-Wolf shrunk covariance of the centered
//! series, which stays well conditioned when regions outnumber time points.

use crate::io::error::{PipelineError, Result, computation_error};
use crate::signal::clean::{center, from_dmatrix, to_dmatrix};
use nalgebra::{DMatrix, SymmetricEigen};
use ndarray::Array2;
use std::fmt;
use std::str::FromStr;

/// Pairwise association measure between region series
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Measure {
    /// Pearson correlation of the shrunk covariance
    Correlation,
    /// Correlation conditioned on all other regions
    PartialCorrelation,
    /// Shrunk covariance itself
    Covariance,
    /// Inverse of the shrunk covariance
    Precision,
    /// Matrix logarithm of the whitened covariance
    Tangent,
}

impl Measure {
    /// Every supported measure, in the order listed by the CLI
    pub const ALL: [Self; 5] = [
        Self::Correlation,
        Self::PartialCorrelation,
        Self::Tangent,
        Self::Covariance,
        Self::Precision,
    ];

    /// Name accepted on the command line and used in output file names
    pub const fn name(self) -> &'static str {
        match self {
            Self::Correlation => "correlation",
            Self::PartialCorrelation => "partial correlation",
            Self::Covariance => "covariance",
            Self::Precision => "precision",
            Self::Tangent => "tangent",
        }
    }
}

impl fmt::Display for Measure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Measure {
    type Err = PipelineError;

    fn from_str(s: &str) -> Result<Self> {
        let normalized = s.trim().replace(['_', '-'], " ");
        Self::ALL
            .into_iter()
            .find(|m| m.name() == normalized)
            .ok_or_else(|| {
                crate::io::error::invalid_parameter(
                    "type",
                    &s,
                    &"expected one of correlation, partial correlation, tangent, covariance, precision",
                )
            })
    }
}

/// Ledoit-Wolf shrinkage estimate of the covariance of `series` (`T x R`)
///
/// # Errors
///
/// Returns an error if there are no time points
pub fn ledoit_wolf(series: &Array2<f64>) -> Result<Array2<f64>> {
    let (n, p) = series.dim();
    if n == 0 || p == 0 {
        return Err(computation_error(
            "covariance",
            &format!("cannot estimate covariance of a {n} x {p} series"),
        ));
    }
    let mut x = series.clone();
    center(&mut x);
    let n_f = n as f64;
    let p_f = p as f64;

    let gram = x.t().dot(&x);
    let empirical = &gram / n_f;
    let squares = x.mapv(|v| v * v);
    let trace_terms: f64 = squares.sum() / n_f;
    let mu = trace_terms / p_f;

    let beta_raw = squares.t().dot(&squares).sum();
    let delta_raw = gram.mapv(|v| v * v).sum() / (n_f * n_f);
    let beta = (beta_raw / n_f - delta_raw) / (p_f * n_f);
    let delta = (2.0 * mu).mul_add(-trace_terms, delta_raw) + p_f * mu * mu;
    let delta = delta / p_f;
    let beta = beta.min(delta);
    let shrinkage = if beta <= 0.0 || delta <= 0.0 {
        0.0
    } else {
        beta / delta
    };

    let mut shrunk = empirical * (1.0 - shrinkage);
    for i in 0..p {
        if let Some(v) = shrunk.get_mut((i, i)) {
            *v += shrinkage * mu;
        }
    }
    Ok(shrunk)
}

/// Compute the association matrix of `series` (`T x R`) for a measure
///
/// # Errors
///
/// Returns an error if the covariance is empty or singular where an inverse is needed
pub fn association(series: &Array2<f64>, measure: Measure) -> Result<Array2<f64>> {
    let covariance = ledoit_wolf(series)?;
    match measure {
        Measure::Covariance => Ok(covariance),
        Measure::Correlation => Ok(covariance_to_correlation(&covariance)),
        Measure::Precision => invert(&covariance),
        Measure::PartialCorrelation => {
            let precision = invert(&covariance)?;
            let mut partial = covariance_to_correlation(&precision).mapv(|v| -v);
            partial.diag_mut().fill(1.0);
            Ok(partial)
        }
        Measure::Tangent => tangent(&covariance, &covariance),
    }
}

/// Scale a covariance to unit diagonal
pub fn covariance_to_correlation(covariance: &Array2<f64>) -> Array2<f64> {
    let scale = covariance.diag().mapv(f64::sqrt);
    Array2::from_shape_fn(covariance.dim(), |(i, j)| {
        let value = covariance.get((i, j)).copied().unwrap_or(0.0);
        let denom = scale.get(i).copied().unwrap_or(0.0) * scale.get(j).copied().unwrap_or(0.0);
        value / denom
    })
}

fn invert(matrix: &Array2<f64>) -> Result<Array2<f64>> {
    to_dmatrix(matrix)
        .try_inverse()
        .map(|inverse| from_dmatrix(&inverse))
        .ok_or_else(|| computation_error("precision", &"covariance matrix is singular"))
}

/// Tangent-space projection of `covariance` at the reference point `mean`
///
/// # Errors
///
/// Returns an error if the reference is not positive definite
pub fn tangent(covariance: &Array2<f64>, mean: &Array2<f64>) -> Result<Array2<f64>> {
    let whitening = symmetric_function(&to_dmatrix(mean), |v| (v > 0.0).then(|| v.sqrt().recip()))?;
    let whitened = &whitening * to_dmatrix(covariance) * &whitening;
    let symmetric = (&whitened + whitened.transpose()) * 0.5;
    let logarithm = symmetric_function(&symmetric, |v| (v > 0.0).then(|| v.ln()))?;
    Ok(from_dmatrix(&logarithm))
}

// Applies a scalar function to the eigenvalues of a symmetric matrix
fn symmetric_function(
    matrix: &DMatrix<f64>,
    f: impl Fn(f64) -> Option<f64>,
) -> Result<DMatrix<f64>> {
    let eigen = SymmetricEigen::new(matrix.clone());
    let mut values = eigen.eigenvalues.clone();
    for v in values.iter_mut() {
        *v = f(*v).ok_or_else(|| {
            computation_error("tangent", &"matrix is not positive definite")
        })?;
    }
    let vectors = &eigen.eigenvectors;
    Ok(vectors * DMatrix::from_diagonal(&values) * vectors.transpose())
}
