//! Tests for the masked and unmasked cleaning paths

#[cfg(test)]
mod tests {
    use fcpipe::confounds::{ConfoundModel, ConfoundOptions, Strategy, build_confounds};
    use fcpipe::denoise::denoiser::{DenoiseOptions, Denoiser};
    use fcpipe::denoise::{FilterSettings, HighPass};
    use fcpipe::io::nifti::Volume;
    use fcpipe::io::table::Table;
    use nalgebra::Matrix4;
    use ndarray::{Array2, ArrayD, IxDyn};

    const FRAMES: usize = 12;

    fn image(tr: Option<f64>) -> Volume {
        let data = ArrayD::from_shape_fn(IxDyn(&[3, 1, 1, FRAMES]), |idx| {
            let t = idx[3] as f64;
            match idx[0] {
                0 => 2.0 * t + 5.0,
                1 => (0.9 * t).sin() + 0.3 * t,
                _ => (1.7 * t).cos(),
            }
        });
        Volume::from_array(data, &Matrix4::identity(), tr).unwrap()
    }

    fn model(rows: usize) -> ConfoundModel {
        let names = vec!["global_signal".to_owned(), "framewise_displacement".to_owned()];
        let data = Array2::from_shape_fn((rows, 2), |(t, c)| if c == 0 { t as f64 } else { 0.1 });
        let table = Table::new(names, data).unwrap();
        build_confounds(&table, &ConfoundOptions::new(Strategy::Linear)).unwrap()
    }

    fn denoiser(repetition_time: Option<f64>, discard_volumes: usize) -> Denoiser {
        Denoiser::new(DenoiseOptions {
            filter: FilterSettings::new(HighPass::Disabled, 0.0).unwrap(),
            repetition_time,
            smoothing_fwhm: 0.0,
            discard_volumes,
        })
    }

    // Tests unmasked cleaning removes the trend, standardizes and trims
    // Verified by discarding volumes before cleaning
    #[test]
    fn test_unmasked_run() {
        let output = denoiser(None, 2).run(&image(Some(2.0)), None, model(FRAMES)).unwrap();

        assert_eq!(output.image.n_timepoints(), FRAMES - 2);
        assert_eq!(output.image.spatial_shape(), [3, 1, 1]);
        assert_eq!(output.confounds.columns(), ["lin"]);
        assert_eq!(output.summary.retained, FRAMES);

        let second: Vec<f64> = output
            .image
            .as_4d()
            .unwrap()
            .slice(ndarray::s![2, 0, 0, ..])
            .to_vec();
        assert!(second.iter().any(|v| v.abs() > 0.1));
    }

    // Tests cleaned voxels are orthogonal to the regressed trend
    // Verified by skipping the confound projection
    #[test]
    fn test_trend_removed() {
        let output = denoiser(None, 0).run(&image(Some(2.0)), None, model(FRAMES)).unwrap();
        let data = output.image.as_4d().unwrap();

        let centre = (FRAMES as f64 - 1.0) / 2.0;
        let dot: f64 = (0..FRAMES)
            .map(|t| data[[1, 0, 0, t]] * (t as f64 - centre))
            .sum();
        assert!(dot.abs() < 1e-8);
    }

    // Tests masked cleaning zeroes voxels outside the mask
    // Verified by cleaning every voxel regardless of the mask
    #[test]
    fn test_masked_run() {
        let mask_data = ArrayD::from_shape_vec(IxDyn(&[3, 1, 1]), vec![0.0, 1.0, 1.0]).unwrap();
        let mask = Volume::from_array(mask_data, &Matrix4::identity(), None).unwrap();

        let output = denoiser(Some(2.0), 0)
            .run(&image(None), Some(&mask), model(FRAMES))
            .unwrap();

        let data = output.image.as_4d().unwrap();
        assert_eq!(data.dim(), (3, 1, 1, FRAMES));
        assert!((0..FRAMES).all(|t| data[[0, 0, 0, t]] == 0.0));
        let variance: f64 = (0..FRAMES).map(|t| data[[2, 0, 0, t]].powi(2)).sum::<f64>() / FRAMES as f64;
        assert!((variance - 1.0).abs() < 1e-8);
    }

    // Tests a design with the wrong length is rejected
    // Verified by truncating the image to the design
    #[test]
    fn test_row_mismatch() {
        let result = denoiser(None, 0).run(&image(Some(2.0)), None, model(FRAMES - 1));
        assert!(result.is_err());
    }

    // Tests a missing sampling time is an error unless overridden
    // Verified by defaulting to one second
    #[test]
    fn test_missing_repetition_time() {
        assert!(denoiser(None, 0).run(&image(None), None, model(FRAMES)).is_err());
        assert!(denoiser(Some(1.5), 0).run(&image(None), None, model(FRAMES)).is_ok());
    }

    // Tests discarding every volume is rejected
    // Verified by returning an empty image
    #[test]
    fn test_discard_all() {
        let result = denoiser(None, FRAMES).run(&image(Some(2.0)), None, model(FRAMES));
        assert!(result.is_err());
        assert_eq!(denoiser(None, 3).options().discard_volumes, 3);
    }
}
