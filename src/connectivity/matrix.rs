//! Symmetric region-by-region connectivity matrices and their CSV forms

use crate::io::configuration::{MATRIX_SIGNIFICANT_DIGITS, SYMMETRY_ATOL, SYMMETRY_RTOL};
use crate::io::error::{PipelineError, Result, WithPath, invalid_data};
use crate::signal::covariance::{Measure, association};
use csv::WriterBuilder;
use ndarray::{Array2, Axis};
use std::path::Path;

/// Connectivity between named regions
///
/// Always square, symmetric within tolerance and zero on the diagonal.
#[derive(Clone, Debug, PartialEq)]
pub struct ConnectivityMatrix {
    names: Vec<String>,
    values: Array2<f64>,
}

impl ConnectivityMatrix {
    /// Validate a raw association matrix and zero its diagonal
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::NotSymmetric`] for the first entry whose
    /// transpose differs by more than `1e-8 + 1e-5 * |transpose|`, or an
    /// error if the matrix is not square or the names do not match its size
    pub fn from_raw(mut values: Array2<f64>, names: Vec<String>) -> Result<Self> {
        let (rows, cols) = values.dim();
        if rows != cols {
            return Err(invalid_data(&format!(
                "connectivity matrix is {rows}x{cols}, expected square"
            )));
        }
        if names.len() != rows {
            return Err(invalid_data(&format!(
                "{} region names for a {rows}x{rows} matrix",
                names.len()
            )));
        }
        check_symmetric(&values)?;
        values.diag_mut().fill(0.0);
        Ok(Self { names, values })
    }

    /// Compute `measure` over `T x R` region series
    ///
    /// # Errors
    ///
    /// Returns an error if the measure cannot be computed or is not symmetric
    pub fn compute(series: &Array2<f64>, measure: Measure, names: Vec<String>) -> Result<Self> {
        Self::from_raw(association(series, measure)?, names)
    }

    /// Region identifiers, in row order
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Matrix values
    pub const fn values(&self) -> &Array2<f64> {
        &self.values
    }

    /// Number of regions
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Whether the matrix has no regions
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Write the matrix with region names as header row and first column
    ///
    /// Values keep six significant digits.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written
    pub fn write_labelled(&self, path: &Path) -> Result<()> {
        let mut writer = WriterBuilder::new().from_path(path).with_path(path)?;
        let header: Vec<&str> = std::iter::once("")
            .chain(self.names.iter().map(String::as_str))
            .collect();
        writer.write_record(&header).with_path(path)?;
        for (name, row) in self.names.iter().zip(self.values.axis_iter(Axis(0))) {
            let record: Vec<String> = std::iter::once(name.clone())
                .chain(
                    row.iter()
                        .map(|&v| format_significant(v, MATRIX_SIGNIFICANT_DIGITS)),
                )
                .collect();
            writer.write_record(&record).with_path(path)?;
        }
        writer.flush().with_path(path)?;
        Ok(())
    }

    /// Write the bare matrix without names or header at full precision
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written
    pub fn write_raw(&self, path: &Path) -> Result<()> {
        let mut writer = WriterBuilder::new()
            .has_headers(false)
            .from_path(path)
            .with_path(path)?;
        for row in self.values.axis_iter(Axis(0)) {
            let record: Vec<String> = row.iter().map(ToString::to_string).collect();
            writer.write_record(&record).with_path(path)?;
        }
        writer.flush().with_path(path)?;
        Ok(())
    }
}

fn check_symmetric(values: &Array2<f64>) -> Result<()> {
    for ((row, col), &a) in values.indexed_iter() {
        let b = values.get((col, row)).copied().unwrap_or(f64::NAN);
        let difference = (a - b).abs();
        let within = difference <= SYMMETRY_ATOL + SYMMETRY_RTOL * b.abs();
        if !within {
            return Err(PipelineError::NotSymmetric {
                row,
                col,
                difference,
            });
        }
    }
    Ok(())
}

/// Format like C's `%g` with the given number of significant digits
pub fn format_significant(value: f64, digits: usize) -> String {
    if value.is_nan() {
        return "nan".to_owned();
    }
    if value.is_infinite() {
        return if value > 0.0 { "inf" } else { "-inf" }.to_owned();
    }
    if value == 0.0 {
        return "0".to_owned();
    }
    let digits = digits.max(1);
    let precision = digits - 1;
    let scientific = format!("{value:.precision$e}");
    let (mantissa, exponent) = scientific.split_once('e').unwrap_or((&scientific, "0"));
    let exponent: i32 = exponent.parse().unwrap_or(0);

    if exponent < -4 || exponent >= digits as i32 {
        let sign = if exponent < 0 { '-' } else { '+' };
        format!("{}e{sign}{:02}", trim_zeros(mantissa), exponent.abs())
    } else {
        let decimals = (digits as i32 - 1 - exponent).max(0) as usize;
        trim_zeros(&format!("{value:.decimals$}")).to_owned()
    }
}

fn trim_zeros(number: &str) -> &str {
    if number.contains('.') {
        number.trim_end_matches('0').trim_end_matches('.')
    } else {
        number
    }
}
