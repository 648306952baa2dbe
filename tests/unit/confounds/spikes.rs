//! Tests for framewise displacement spike regressors and outlier summaries

#[cfg(test)]
mod tests {
    use fcpipe::confounds::spikes::{OutlierSummary, spike_regressors};

    // Tests flagged rows and summary for a simple motion trace
    // Verified by using >= instead of > for the threshold
    #[test]
    fn test_flags_and_summary() {
        let spikes = spike_regressors(&[0.1, 0.7, 0.2, 0.6, 0.3], 0.5);

        assert_eq!(spikes.flags, vec![false, true, false, true, false]);
        assert_eq!(
            spikes.summary,
            OutlierSummary {
                retained: 3,
                outliers: 2
            }
        );
    }

    // Tests each contiguous run gets one indicator column
    // Verified by emitting one column per flagged volume
    #[test]
    fn test_one_column_per_run() {
        let spikes = spike_regressors(&[0.0, 0.9, 0.8, 0.1, 0.7], 0.5);

        assert_eq!(spikes.regressors.columns(), ["outlier_1", "outlier_2"]);
        let first: Vec<f64> = spikes.regressors.column("outlier_1").unwrap().to_vec();
        let second: Vec<f64> = spikes.regressors.column("outlier_2").unwrap().to_vec();
        assert_eq!(first, vec![0.0, 1.0, 1.0, 0.0, 0.0]);
        assert_eq!(second, vec![0.0, 0.0, 0.0, 0.0, 1.0]);
    }

    // Tests missing motion values count as no motion
    // Verified by treating NaN as above threshold
    #[test]
    fn test_nan_counts_as_still() {
        let spikes = spike_regressors(&[f64::NAN, 0.2, 0.9], 0.5);

        assert_eq!(spikes.flags, vec![false, false, true]);
        assert_eq!(spikes.summary.retained, 2);
    }

    // Tests a clean trace yields no columns and a single summary group
    // Verified by emitting an empty outlier group
    #[test]
    fn test_no_outliers() {
        let spikes = spike_regressors(&[0.1, 0.2], 0.5);

        assert_eq!(spikes.regressors.n_cols(), 0);
        assert_eq!(spikes.regressors.n_rows(), 2);
        assert_eq!(spikes.summary.groups(), vec![(false, 2)]);
    }

    // Tests summary CSV layout and re-reading
    // Verified by writing counts in reverse order
    #[test]
    fn test_summary_csv_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out_outlierstat.csv");
        let summary = OutlierSummary {
            retained: 3,
            outliers: 2,
        };

        summary.write_csv(&path).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(text, ",outlier,n_tr\n0,False,3\n1,True,2\n");
        assert_eq!(OutlierSummary::read_csv(&path).unwrap(), summary);
    }
}
