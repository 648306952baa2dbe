//! Tests for shrunk covariance and the derived association measures

#[cfg(test)]
mod tests {
    use fcpipe::signal::covariance::{
        Measure, association, covariance_to_correlation, ledoit_wolf, tangent,
    };
    use ndarray::{Array2, array};

    fn regions(t: usize) -> Array2<f64> {
        Array2::from_shape_fn((t, 3), |(i, r)| {
            let x = i as f64;
            match r {
                0 => (0.3 * x).sin(),
                1 => (0.3 * x).sin() + 0.5 * (1.7 * x).cos(),
                _ => (0.9 * x + 1.0).sin(),
            }
        })
    }

    fn is_symmetric(matrix: &Array2<f64>) -> bool {
        let n = matrix.nrows();
        (0..n).all(|i| (0..n).all(|j| (matrix[[i, j]] - matrix[[j, i]]).abs() < 1e-10))
    }

    // Tests measure names parse with spaces, underscores or dashes
    // Verified by matching names exactly
    #[test]
    fn test_measure_names() {
        assert_eq!("correlation".parse::<Measure>().unwrap(), Measure::Correlation);
        assert_eq!(
            "partial_correlation".parse::<Measure>().unwrap(),
            Measure::PartialCorrelation
        );
        assert_eq!(
            "partial correlation".parse::<Measure>().unwrap(),
            Measure::PartialCorrelation
        );
        assert_eq!("tangent".parse::<Measure>().unwrap(), Measure::Tangent);
        assert!("pearson".parse::<Measure>().is_err());
        assert_eq!(Measure::Precision.to_string(), "precision");
    }

    // Tests a single series gets its population variance without shrinkage
    // Verified by dividing by T - 1
    #[test]
    fn test_single_series_variance() {
        let series = array![[1.0], [2.0], [3.0], [4.0]];
        let covariance = ledoit_wolf(&series).unwrap();
        assert!((covariance[[0, 0]] - 1.25).abs() < 1e-12);
    }

    // Tests empty input is rejected
    // Verified by returning an empty matrix
    #[test]
    fn test_empty_series() {
        assert!(ledoit_wolf(&Array2::zeros((0, 3))).is_err());
        assert!(ledoit_wolf(&Array2::zeros((5, 0))).is_err());
    }

    // Tests correlation scaling of a known covariance
    // Verified by scaling with variances instead of deviations
    #[test]
    fn test_covariance_to_correlation() {
        let correlation = covariance_to_correlation(&array![[4.0, 2.0], [2.0, 9.0]]);
        assert!((correlation[[0, 0]] - 1.0).abs() < 1e-12);
        assert!((correlation[[0, 1]] - 1.0 / 3.0).abs() < 1e-12);
        assert!((correlation[[1, 0]] - 1.0 / 3.0).abs() < 1e-12);
    }

    // Tests correlation is symmetric with unit diagonal and sign of coupling
    // Verified by skipping the centering step
    #[test]
    fn test_correlation_properties() {
        let series = regions(120);
        let correlation = association(&series, Measure::Correlation).unwrap();

        assert!(is_symmetric(&correlation));
        for i in 0..3 {
            assert!((correlation[[i, i]] - 1.0).abs() < 1e-10);
        }
        assert!(correlation[[0, 1]] > 0.5);
        assert!(correlation.iter().all(|v| v.abs() <= 1.0 + 1e-12));

        let mut opposed = series.clone();
        opposed.column_mut(1).assign(&series.column(0).mapv(|v| -v));
        let correlation = association(&opposed, Measure::Correlation).unwrap();
        assert!(correlation[[0, 1]] < -0.5);
    }

    // Tests precision inverts the shrunk covariance
    // Verified by returning the covariance
    #[test]
    fn test_precision_inverts_covariance() {
        let series = regions(80);
        let covariance = association(&series, Measure::Covariance).unwrap();
        let precision = association(&series, Measure::Precision).unwrap();

        let product = covariance.dot(&precision);
        for i in 0..3 {
            for j in 0..3 {
                let expected = if i == j { 1.0 } else { 0.0 };
                assert!((product[[i, j]] - expected).abs() < 1e-8);
            }
        }
    }

    // Tests partial correlation has unit diagonal and stays symmetric
    // Verified by leaving the diagonal negated
    #[test]
    fn test_partial_correlation() {
        let partial = association(&regions(100), Measure::PartialCorrelation).unwrap();
        assert!(is_symmetric(&partial));
        for i in 0..3 {
            assert!((partial[[i, i]] - 1.0).abs() < 1e-12);
        }
        assert!(partial[[0, 1]] > 0.0);
    }

    // Tests a covariance projected at itself is the zero matrix
    // Verified by omitting the whitening
    #[test]
    fn test_tangent_at_self() {
        let covariance = array![[2.0, 0.5], [0.5, 1.0]];
        let projected = tangent(&covariance, &covariance).unwrap();
        assert!(projected.iter().all(|v| v.abs() < 1e-10));

        let single = association(&regions(60), Measure::Tangent).unwrap();
        assert!(single.iter().all(|v| v.abs() < 1e-8));
    }

    // Tests tangent of a scaled identity is a diagonal log
    // Verified by taking the square root instead of the log
    #[test]
    fn test_tangent_scaled_identity() {
        let reference = array![[1.0, 0.0], [0.0, 1.0]];
        let covariance = array![[std::f64::consts::E, 0.0], [0.0, 1.0]];
        let projected = tangent(&covariance, &reference).unwrap();
        assert!((projected[[0, 0]] - 1.0).abs() < 1e-10);
        assert!(projected[[1, 1]].abs() < 1e-10);
        assert!(projected[[0, 1]].abs() < 1e-10);
    }

    // Tests a non positive definite reference is rejected
    // Verified by clamping negative eigenvalues
    #[test]
    fn test_tangent_rejects_indefinite() {
        let reference = array![[1.0, 0.0], [0.0, -1.0]];
        assert!(tangent(&reference, &reference).is_err());
    }
}
