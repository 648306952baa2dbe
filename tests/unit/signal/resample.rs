//! Tests for nearest-neighbour and trilinear resampling between grids

#[cfg(test)]
mod tests {
    use fcpipe::io::nifti::Volume;
    use fcpipe::signal::resample::{Interpolation, resample_like};
    use nalgebra::{Matrix4, Vector3};
    use ndarray::{ArrayD, IxDyn};

    fn line(values: &[f64], affine: &Matrix4<f64>) -> Volume {
        let data = ArrayD::from_shape_vec(IxDyn(&[values.len(), 1, 1]), values.to_vec()).unwrap();
        Volume::from_array(data, affine, None).unwrap()
    }

    fn reference(len: usize, affine: &Matrix4<f64>) -> Volume {
        line(&vec![0.0; len], affine)
    }

    fn scaled(x: f64) -> Matrix4<f64> {
        Matrix4::new_nonuniform_scaling(&Vector3::new(x, 1.0, 1.0))
    }

    // Tests volumes already on the target grid are returned unchanged
    // Verified by always interpolating
    #[test]
    fn test_same_grid_passthrough() {
        let source = line(&[1.0, 2.0, 3.0], &Matrix4::identity());
        let target = reference(3, &Matrix4::identity());

        let resampled = resample_like(&source, &target, Interpolation::Linear).unwrap();
        assert_eq!(resampled.data(), source.data());
    }

    // Tests downsampling onto a coarser grid picks exact voxels
    // Verified by mapping target indices without the affine
    #[test]
    fn test_nearest_downsample() {
        let source = line(&[5.0, 6.0, 7.0, 8.0], &Matrix4::identity());
        let target = reference(2, &scaled(2.0));

        let resampled = resample_like(&source, &target, Interpolation::Nearest).unwrap();
        assert_eq!(resampled.spatial_shape(), [2, 1, 1]);
        let values: Vec<f64> = resampled.data().iter().copied().collect();
        assert_eq!(values, vec![5.0, 7.0]);
    }

    // Tests trilinear weights average neighbours at half-voxel offsets
    // Verified by rounding positions
    #[test]
    fn test_linear_half_voxel() {
        let source = line(&[0.0, 10.0, 20.0, 30.0], &Matrix4::identity());
        let mut shifted = Matrix4::identity();
        shifted[(0, 3)] = 0.5;
        let target = reference(3, &shifted);

        let linear = resample_like(&source, &target, Interpolation::Linear).unwrap();
        let values: Vec<f64> = linear.data().iter().copied().collect();
        for (value, expected) in values.iter().zip([5.0, 15.0, 25.0]) {
            assert!((value - expected).abs() < 1e-9);
        }

        let nearest = resample_like(&source, &target, Interpolation::Nearest).unwrap();
        let codes: Vec<f64> = nearest.data().iter().copied().collect();
        assert!(codes.iter().all(|c| [0.0, 10.0, 20.0, 30.0].contains(c)));
    }

    // Tests positions outside the source are zero filled
    // Verified by clamping to the border voxel
    #[test]
    fn test_outside_field_of_view() {
        let source = line(&[4.0, 4.0], &Matrix4::identity());
        let target = reference(3, &Matrix4::identity());

        let resampled = resample_like(&source, &target, Interpolation::Nearest).unwrap();
        let values: Vec<f64> = resampled.data().iter().copied().collect();
        assert_eq!(values, vec![4.0, 4.0, 0.0]);
    }

    // Tests 4-D sources keep their time axis
    // Verified by resampling only the first frame
    #[test]
    fn test_series_frames_kept() {
        let data = ArrayD::from_shape_fn(IxDyn(&[4, 1, 1, 3]), |idx| (10 * idx[0] + idx[3]) as f64);
        let source = Volume::from_array(data, &Matrix4::identity(), Some(2.0)).unwrap();
        let target = reference(2, &scaled(2.0));

        let resampled = resample_like(&source, &target, Interpolation::Nearest).unwrap();
        let frames = resampled.as_4d().unwrap();
        assert_eq!(frames.dim(), (2, 1, 1, 3));
        assert!((frames[[1, 0, 0, 2]] - 22.0).abs() < 1e-12);
    }
}
