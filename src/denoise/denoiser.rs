//! Smoothing, confound regression and volume trimming of one image

use crate::confounds::{ConfoundModel, OutlierSummary};
use crate::denoise::settings::{FilterSettings, resolve_repetition_time};
use crate::io::error::{Result, invalid_data};
use crate::io::nifti::Volume;
use crate::io::table::Table;
use crate::signal::clean::{CleanOptions, clean};
use crate::signal::masking::{binarize, extract_series, restore_series};
use crate::signal::smoothing::smooth_image;
use tracing::info;

/// Parameters of a denoising run
#[derive(Clone, Debug)]
pub struct DenoiseOptions {
    /// Validated band-pass settings
    pub filter: FilterSettings,
    /// Sampling time override in seconds
    pub repetition_time: Option<f64>,
    /// Smoothing kernel FWHM in millimetres (masked cleaning only)
    pub smoothing_fwhm: f64,
    /// Leading volumes dropped after cleaning
    pub discard_volumes: usize,
}

/// Cleaned image and the regressors it was cleaned with
#[derive(Clone, Debug)]
pub struct DenoiseOutput {
    /// Cleaned image with the discarded volumes removed
    pub image: Volume,
    /// Design matrix regressed from the data
    pub confounds: Table,
    /// Retained versus outlier volume counts
    pub summary: OutlierSummary,
}

/// Runs the cleaning stage for one image
#[derive(Clone, Debug)]
pub struct Denoiser {
    options: DenoiseOptions,
}

impl Denoiser {
    /// Create a denoiser with validated options
    pub const fn new(options: DenoiseOptions) -> Self {
        Self { options }
    }

    /// Options in use
    pub const fn options(&self) -> &DenoiseOptions {
        &self.options
    }

    /// Clean `image` with the regressors in `model`
    ///
    /// # Errors
    ///
    /// Returns an error if the sampling time is unknown, the confounds do not
    /// match the image length, the mask grid differs from the image grid, or
    /// the discard count removes every volume
    pub fn run(
        &self,
        image: &Volume,
        mask: Option<&Volume>,
        model: ConfoundModel,
    ) -> Result<DenoiseOutput> {
        let tr = resolve_repetition_time(self.options.repetition_time, image)?;
        let data = image.as_4d()?;
        let frames = data.shape().get(3).copied().unwrap_or(0);
        if model.design.n_rows() != frames {
            return Err(invalid_data(&format!(
                "confounds table has {} rows but the image has {frames} volumes",
                model.design.n_rows()
            )));
        }

        let clean_options = CleanOptions {
            detrend: false,
            standardize: true,
            band_pass: self.options.filter.band_pass(tr),
        };
        let shape = image.spatial_shape();

        let cleaned = match mask {
            Some(mask) => {
                info!("cleaning image with masker");
                let inside = binarize(mask.as_3d()?);
                let mut smoothed = image.data().clone();
                smooth_image(&mut smoothed, self.options.smoothing_fwhm, image.voxel_sizes());
                let smoothed = image.with_data(smoothed);
                let mut series = extract_series(smoothed.as_4d()?, Some(&inside))?;
                clean(&mut series, Some(model.design.data()), &clean_options)?;
                restore_series(&series, Some(&inside), shape)?
            }
            None => {
                info!("cleaning image with no mask");
                let mut series = extract_series(data, None)?;
                clean(&mut series, Some(model.design.data()), &clean_options)?;
                restore_series(&series, None, shape)?
            }
        };

        let cleaned = image.with_data(cleaned.into_dyn());
        let trimmed = cleaned.drop_leading_volumes(self.options.discard_volumes)?;
        info!(
            "cleaned image has {} volumes after discarding {}",
            trimmed.n_timepoints(),
            self.options.discard_volumes
        );

        Ok(DenoiseOutput {
            image: trimmed,
            confounds: model.design,
            summary: model.summary,
        })
    }
}
