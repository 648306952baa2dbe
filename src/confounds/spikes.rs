//! Spike regressors for high-motion volumes
//!
//! Framewise displacement is compared against a threshold. Volumes above it
//! are outliers; each contiguous run of outliers gets its own indicator
//! column so the run is censored from the regression as a block.

use crate::io::configuration::OUTLIER_PREFIX;
use crate::io::error::{Result, WithPath, invalid_data};
use crate::io::table::Table;
use csv::{ReaderBuilder, WriterBuilder};
use ndarray::Array2;
use std::path::Path;

/// Count of volumes below and above the motion threshold
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct OutlierSummary {
    /// Volumes at or below the threshold
    pub retained: usize,
    /// Volumes above the threshold
    pub outliers: usize,
}

impl OutlierSummary {
    /// Rows of the summary table as `(is_outlier, count)`, skipping empty groups
    pub fn groups(&self) -> Vec<(bool, usize)> {
        [(false, self.retained), (true, self.outliers)]
            .into_iter()
            .filter(|&(_, count)| count > 0)
            .collect()
    }

    /// Write the summary as an indexed `outlier,n_tr` CSV
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written
    pub fn write_csv(&self, path: &Path) -> Result<()> {
        let mut writer = WriterBuilder::new().from_path(path).with_path(path)?;
        writer.write_record(["", "outlier", "n_tr"]).with_path(path)?;
        for (index, (flag, count)) in self.groups().into_iter().enumerate() {
            let flag = if flag { "True" } else { "False" };
            writer
                .write_record([index.to_string(), flag.to_string(), count.to_string()])
                .with_path(path)?;
        }
        writer.flush().with_path(path)?;
        Ok(())
    }

    /// Read a summary written by [`OutlierSummary::write_csv`]
    ///
    /// # Errors
    ///
    /// Returns an error if the file is unreadable or malformed
    pub fn read_csv(path: &Path) -> Result<Self> {
        let mut reader = ReaderBuilder::new().from_path(path).with_path(path)?;
        let mut summary = Self::default();
        for record in reader.records() {
            let record = record.with_path(path)?;
            let flag = record.get(1).unwrap_or_default();
            let count: usize = record
                .get(2)
                .unwrap_or_default()
                .parse()
                .map_err(|e| invalid_data(&format!("bad n_tr in '{}': {e}", path.display())))?;
            match flag {
                "True" => summary.outliers = count,
                "False" => summary.retained = count,
                other => {
                    return Err(invalid_data(&format!("bad outlier flag '{other}'")));
                }
            }
        }
        Ok(summary)
    }
}

/// Outlier flags, per-run indicator columns and their summary
#[derive(Clone, Debug, PartialEq)]
pub struct SpikeRegressors {
    /// Per-volume outlier flag
    pub flags: Vec<bool>,
    /// One indicator column per contiguous outlier run
    pub regressors: Table,
    /// Counts of retained and outlier volumes
    pub summary: OutlierSummary,
}

/// Flag volumes whose motion exceeds `threshold` and build run indicators
///
/// Missing motion values (the first framewise displacement is undefined)
/// count as zero motion.
pub fn spike_regressors(motion: &[f64], threshold: f64) -> SpikeRegressors {
    let flags: Vec<bool> = motion
        .iter()
        .map(|&m| (if m.is_nan() { 0.0 } else { m }) > threshold)
        .collect();

    let mut runs: Vec<(usize, usize)> = Vec::new();
    for (t, &flag) in flags.iter().enumerate() {
        if !flag {
            continue;
        }
        match runs.last_mut() {
            Some((_, end)) if *end == t => *end = t + 1,
            _ => runs.push((t, t + 1)),
        }
    }

    let n = flags.len();
    let data = Array2::from_shape_fn((n, runs.len()), |(t, run)| {
        runs.get(run)
            .map_or(0.0, |&(start, end)| f64::from(u8::from((start..end).contains(&t))))
    });
    let columns = (1..=runs.len())
        .map(|i| format!("{OUTLIER_PREFIX}_{i}"))
        .collect();
    let regressors = Table::new(columns, data).unwrap_or_else(|_| Table::empty(n));

    let outliers = flags.iter().filter(|&&f| f).count();
    SpikeRegressors {
        summary: OutlierSummary {
            retained: n - outliers,
            outliers,
        },
        flags,
        regressors,
    }
}
