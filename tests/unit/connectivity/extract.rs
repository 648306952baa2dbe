//! Tests for region averaging, masking and series output

#[cfg(test)]
mod tests {
    use fcpipe::connectivity::extract::{
        ExtractOptions, RegionSignals, ResamplingTarget, extract_regions, read_region_names,
    };
    use fcpipe::io::nifti::Volume;
    use flate2::read::GzDecoder;
    use nalgebra::Matrix4;
    use ndarray::{ArrayD, IxDyn};
    use std::io::Read;

    const FRAMES: usize = 6;

    fn image() -> Volume {
        let data = ArrayD::from_shape_fn(IxDyn(&[4, 1, 1, FRAMES]), |idx| {
            (10 * idx[0] + idx[3]) as f64
        });
        Volume::from_array(data, &Matrix4::identity(), Some(2.0)).unwrap()
    }

    fn grid(values: &[f64]) -> Volume {
        let data = ArrayD::from_shape_vec(IxDyn(&[4, 1, 1]), values.to_vec()).unwrap();
        Volume::from_array(data, &Matrix4::identity(), None).unwrap()
    }

    // Tests region series are voxel means in ascending code order
    // Verified by summing instead of averaging
    #[test]
    fn test_region_means() {
        let labels = grid(&[0.0, 2.0, 2.0, 1.0]);
        let extraction =
            extract_regions(&image(), None, &labels, &ExtractOptions::default()).unwrap();

        assert_eq!(extraction.codes, vec![1, 2]);
        assert_eq!(extraction.series.dim(), (FRAMES, 2));
        assert!((extraction.series[[0, 0]] - 30.0).abs() < 1e-12);
        assert!((extraction.series[[3, 1]] - 18.0).abs() < 1e-12);
        assert!(extraction.missing().is_empty());
    }

    // Tests masking drops regions and reports them as missing
    // Verified by ignoring the mask
    #[test]
    fn test_mask_drops_regions() {
        let labels = grid(&[0.0, 2.0, 2.0, 1.0]);
        let mask = grid(&[1.0, 1.0, 0.0, 0.0]);
        let extraction =
            extract_regions(&image(), Some(&mask), &labels, &ExtractOptions::default()).unwrap();

        assert_eq!(extraction.codes, vec![2]);
        assert_eq!(extraction.expected, vec![1, 2]);
        assert_eq!(extraction.missing(), vec![1]);
        assert!((extraction.series[[0, 0]] - 10.0).abs() < 1e-12);

        let empty = grid(&[0.0; 4]);
        assert!(extract_regions(&image(), Some(&empty), &labels, &ExtractOptions::default()).is_err());
    }

    // Tests label values are rounded to integer codes
    // Verified by truncating label values
    #[test]
    fn test_codes_rounded() {
        let labels = grid(&[0.2, 0.9999, 2.0001, 1.0]);
        let extraction =
            extract_regions(&image(), None, &labels, &ExtractOptions::default()).unwrap();
        assert_eq!(extraction.codes, vec![1, 2]);
        assert!((extraction.series[[0, 0]] - 20.0).abs() < 1e-12);
    }

    // Tests both resampling targets agree when grids already match
    // Verified by resampling labels with linear weights
    #[test]
    fn test_spaces_agree_on_shared_grid() {
        let labels = grid(&[1.0, 1.0, 2.0, 3.0]);
        let on_labels = extract_regions(&image(), None, &labels, &ExtractOptions::default()).unwrap();
        let data_options = ExtractOptions {
            space: ResamplingTarget::Data,
            ..ExtractOptions::default()
        };
        let on_data = extract_regions(&image(), None, &labels, &data_options).unwrap();

        assert_eq!(on_labels.codes, on_data.codes);
        assert_eq!(on_labels.series, on_data.series);
    }

    // Tests optional standardization of region series
    // Verified by standardizing only the first region
    #[test]
    fn test_standardized_series() {
        let labels = grid(&[1.0, 1.0, 2.0, 3.0]);
        let options = ExtractOptions {
            standardize: true,
            ..ExtractOptions::default()
        };
        let extraction = extract_regions(&image(), None, &labels, &options).unwrap();

        for column in extraction.series.columns() {
            let mean = column.mean().unwrap();
            let variance = column.mapv(|v| v * v).mean().unwrap();
            assert!(mean.abs() < 1e-12);
            assert!((variance - 1.0).abs() < 1e-10);
        }
    }

    // Tests explicit names must match the region count
    // Verified by padding missing names with codes
    #[test]
    fn test_region_names() {
        let labels = grid(&[0.0, 4.0, 4.0, 9.0]);
        let extraction =
            extract_regions(&image(), None, &labels, &ExtractOptions::default()).unwrap();

        assert_eq!(extraction.region_names(None).unwrap(), vec!["4", "9"]);
        let given = vec!["V1".to_owned(), "V2".to_owned()];
        assert_eq!(extraction.region_names(Some(given.as_slice())).unwrap(), given);
        assert!(extraction.region_names(Some(&given[..1])).is_err());
    }

    // Tests kept series are written as gzip CSV and dropped ones are not
    // Verified by writing plain text
    #[test]
    fn test_series_output() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("series.csv.gz");
        let labels = grid(&[0.0, 0.0, 1.0, 1.0]);
        let extraction =
            extract_regions(&image(), None, &labels, &ExtractOptions::default()).unwrap();
        let names = extraction.region_names(None).unwrap();

        let kept = extraction.clone().into_signals(names.clone(), true).unwrap();
        assert!(kept.write_gz(&path).unwrap());
        let mut text = String::new();
        GzDecoder::new(std::fs::File::open(&path).unwrap())
            .read_to_string(&mut text)
            .unwrap();
        assert!(text.starts_with(",1\n0,25\n1,26\n"));

        let dropped = extraction.into_signals(names, false).unwrap();
        assert_eq!(dropped, RegionSignals::Dropped);
        assert!(!dropped.write_gz(&dir.path().join("none.csv.gz")).unwrap());
        assert!(!dir.path().join("none.csv.gz").exists());
    }

    // Tests region name files skip blank lines
    // Verified by keeping empty names
    #[test]
    fn test_read_region_names() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("names.txt");
        std::fs::write(&path, "V1\n\n  V2  \nV3\n").unwrap();

        assert_eq!(read_region_names(&path).unwrap(), vec!["V1", "V2", "V3"]);
        assert!(read_region_names(&dir.path().join("absent.txt")).is_err());
    }

    // Tests resampling target names
    // Verified by accepting any string as labels
    #[test]
    fn test_target_names() {
        assert_eq!("data".parse::<ResamplingTarget>().unwrap(), ResamplingTarget::Data);
        assert_eq!(ResamplingTarget::default().to_string(), "labels");
        assert!("mni".parse::<ResamplingTarget>().is_err());
    }
}
