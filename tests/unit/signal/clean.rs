//! Tests for detrending, confound projection and standardization

#[cfg(test)]
mod tests {
    use fcpipe::signal::clean::{
        CleanOptions, clean, detrend, orthonormal_basis, regress_out, standardize,
    };
    use ndarray::{Array2, Axis, array};

    // Tests detrending removes mean and slope
    // Verified by removing only the mean
    #[test]
    fn test_detrend_linear() {
        let mut series = Array2::from_shape_fn((10, 2), |(t, c)| 3.0 + (c as f64 + 1.0) * t as f64);
        detrend(&mut series);
        assert!(series.iter().all(|v| v.abs() < 1e-10));
    }

    // Tests standardization yields zero mean and unit population variance
    // Verified by using the sample standard deviation
    #[test]
    fn test_standardize() {
        let mut series = array![[1.0, 5.0], [2.0, 5.0], [3.0, 5.0], [6.0, 5.0]];
        standardize(&mut series);

        let column = series.column(0);
        let mean = column.mean().unwrap();
        let variance = column.mapv(|v| (v - mean).powi(2)).mean().unwrap();
        assert!(mean.abs() < 1e-12);
        assert!((variance - 1.0).abs() < 1e-12);
        assert!(series.column(1).iter().all(|v| v.abs() < 1e-12));
    }

    // Tests regressing out a confound leaves the orthogonal part
    // Verified by skipping the projection
    #[test]
    fn test_regress_out() {
        let confound = array![[1.0], [-1.0], [1.0], [-1.0]];
        let mut series = array![[3.0], [-1.0], [3.0], [-1.0]];

        regress_out(&mut series, &confound).unwrap();

        let expected = [1.0, 1.0, 1.0, 1.0];
        for (value, want) in series.iter().zip(expected) {
            assert!((value - want).abs() < 1e-10);
        }
    }

    // Tests rank-deficient designs produce a reduced basis
    // Verified by keeping every singular vector
    #[test]
    fn test_basis_drops_collinear_columns() {
        let design = array![[1.0, 2.0], [2.0, 4.0], [3.0, 6.0], [0.0, 0.0]];
        let basis = orthonormal_basis(&design).unwrap();

        assert_eq!(basis.ncols(), 1);
        let norm: f64 = basis.column(0).mapv(|v| v * v).sum();
        assert!((norm - 1.0).abs() < 1e-10);
    }

    // Tests full cleaning leaves standardized series orthogonal to confounds
    // Verified by standardizing before the projection
    #[test]
    fn test_clean_with_confounds() {
        let n = 40;
        let drift = Array2::from_shape_fn((n, 1), |(t, _)| t as f64);
        let mut series =
            Array2::from_shape_fn((n, 1), |(t, _)| 2.0 * t as f64 + ((t * 7) % 5) as f64);
        let options = CleanOptions {
            standardize: true,
            ..CleanOptions::default()
        };

        clean(&mut series, Some(&drift), &options).unwrap();

        let mut centered = drift.clone();
        centered -= &drift.mean_axis(Axis(0)).unwrap();
        let dot: f64 = series.column(0).dot(&centered.column(0));
        assert!(dot.abs() < 1e-8);
        let variance = series.column(0).mapv(|v| v * v).mean().unwrap();
        assert!((variance - 1.0).abs() < 1e-10);
    }

    // Tests confound validation
    // Verified by ignoring missing confound values
    #[test]
    fn test_clean_rejects_bad_confounds() {
        let mut series = Array2::zeros((4, 1));
        let short = Array2::zeros((3, 1));
        let with_nan = array![[1.0], [f64::NAN], [0.0], [1.0]];

        assert!(clean(&mut series, Some(&short), &CleanOptions::default()).is_err());
        assert!(clean(&mut series, Some(&with_nan), &CleanOptions::default()).is_err());
        assert!(clean(&mut series, None, &CleanOptions::default()).is_ok());
    }
}
