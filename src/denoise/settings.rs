//! Band-pass and sampling-time settings of the denoising stage

use crate::io::configuration::{BUTTERWORTH_ORDER, COSINE_SENTINEL};
use crate::io::error::{PipelineError, Result, invalid_parameter};
use crate::io::nifti::Volume;
use crate::signal::BandPass;
use std::str::FromStr;
use tracing::info;

/// High-pass stage configuration
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum HighPass {
    /// No high-pass filtering
    Disabled,
    /// Butterworth high-pass at this cutoff (Hz)
    Cutoff(f64),
    /// Drift is removed by regressing the confound table's cosine basis
    Cosine,
}

impl HighPass {
    /// Numeric cutoff, if filtering is done in the frequency domain
    pub const fn cutoff(self) -> Option<f64> {
        match self {
            Self::Cutoff(c) => Some(c),
            Self::Disabled | Self::Cosine => None,
        }
    }
}

impl FromStr for HighPass {
    type Err = PipelineError;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        if s == COSINE_SENTINEL {
            return Ok(Self::Cosine);
        }
        let cutoff: f64 = s
            .parse()
            .map_err(|_| invalid_parameter("highpass", &s, &"expected a frequency or 'cosine'"))?;
        if !cutoff.is_finite() || cutoff < 0.0 {
            return Err(invalid_parameter(
                "highpass",
                &s,
                &"must be a non-negative frequency",
            ));
        }
        Ok(if cutoff == 0.0 {
            Self::Disabled
        } else {
            Self::Cutoff(cutoff)
        })
    }
}

/// Validated high-pass and low-pass pair
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FilterSettings {
    high_pass: HighPass,
    low_pass: Option<f64>,
}

impl FilterSettings {
    /// Validate a high-pass setting against a low-pass cutoff
    ///
    /// A zero low-pass disables low-pass filtering.
    ///
    /// # Errors
    ///
    /// Returns an error if the low-pass is negative or a numeric high-pass is
    /// not below the low-pass, since the two stages would cancel out
    pub fn new(high_pass: HighPass, low_pass: f64) -> Result<Self> {
        if !low_pass.is_finite() || low_pass < 0.0 {
            return Err(invalid_parameter(
                "lowpass",
                &low_pass,
                &"must be a non-negative frequency",
            ));
        }
        if high_pass == HighPass::Cosine {
            info!("using cosine basis for high pass");
        }
        let low_pass = if low_pass == 0.0 {
            info!("detected lowpass 0, disabling low-pass filtering");
            None
        } else {
            Some(low_pass)
        };
        if let (Some(high), Some(low)) = (high_pass.cutoff(), low_pass)
            && high >= low
        {
            return Err(invalid_parameter(
                "highpass",
                &high,
                &format!("high and low pass values don't make sense: {high} >= lowpass {low}"),
            ));
        }
        Ok(Self {
            high_pass,
            low_pass,
        })
    }

    /// High-pass configuration
    pub const fn high_pass(&self) -> HighPass {
        self.high_pass
    }

    /// Low-pass cutoff, if enabled
    pub const fn low_pass(&self) -> Option<f64> {
        self.low_pass
    }

    /// Whether the confound table's cosine columns must be regressed
    pub fn uses_cosine_basis(&self) -> bool {
        self.high_pass == HighPass::Cosine
    }

    /// Filter for the given repetition time
    pub fn band_pass(&self, repetition_time: f64) -> BandPass {
        BandPass::new(
            BUTTERWORTH_ORDER,
            repetition_time,
            self.high_pass.cutoff(),
            self.low_pass,
        )
    }
}

/// Repetition time from an explicit override or the image header
///
/// # Errors
///
/// Returns an error if neither source provides a positive value
pub fn resolve_repetition_time(explicit: Option<f64>, image: &Volume) -> Result<f64> {
    if let Some(tr) = explicit.filter(|&tr| tr != 0.0) {
        if tr > 0.0 && tr.is_finite() {
            return Ok(tr);
        }
        return Err(invalid_parameter("tr", &tr, &"must be positive"));
    }
    let tr = image.repetition_time().ok_or_else(|| {
        invalid_parameter(
            "tr",
            &0,
            &"image header has no usable sampling time; pass --tr",
        )
    })?;
    info!("found that tr is: {tr}");
    Ok(tr)
}
