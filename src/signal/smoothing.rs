//! Separable Gaussian smoothing of image volumes

use crate::io::configuration::GAUSSIAN_TRUNCATE;
use ndarray::{ArrayD, Axis};

/// Ratio between a Gaussian's FWHM and its standard deviation
const FWHM_PER_SIGMA: f64 = 2.354_820_045_030_949;

/// Normalized 1-D Gaussian kernel for a standard deviation in voxels
pub fn gaussian_kernel(sigma: f64) -> Vec<f64> {
    if sigma <= 0.0 {
        return vec![1.0];
    }
    let radius = (GAUSSIAN_TRUNCATE * sigma + 0.5) as usize;
    let weights: Vec<f64> = (0..=2 * radius)
        .map(|i| {
            let x = i as f64 - radius as f64;
            (-0.5 * (x / sigma).powi(2)).exp()
        })
        .collect();
    let total: f64 = weights.iter().sum();
    weights.into_iter().map(|w| w / total).collect()
}

/// Smooth the three spatial axes of a 3-D or 4-D image in place
///
/// `fwhm` is in millimetres and converted per axis using the voxel sizes.
/// Edges are handled by half-sample symmetric reflection.
pub fn smooth_image(data: &mut ArrayD<f64>, fwhm: f64, voxel_sizes: [f64; 3]) {
    if fwhm <= 0.0 {
        return;
    }
    for (axis, size) in voxel_sizes.iter().enumerate() {
        if axis >= data.ndim() || *size <= 0.0 {
            continue;
        }
        let kernel = gaussian_kernel(fwhm / FWHM_PER_SIGMA / size);
        if kernel.len() < 2 {
            continue;
        }
        let mut buffer = Vec::new();
        for mut lane in data.lanes_mut(Axis(axis)) {
            buffer.clear();
            buffer.extend(lane.iter().copied());
            for (i, value) in lane.iter_mut().enumerate() {
                *value = convolve_at(&buffer, &kernel, i);
            }
        }
    }
}

fn convolve_at(samples: &[f64], kernel: &[f64], index: usize) -> f64 {
    let n = samples.len() as isize;
    let radius = (kernel.len() / 2) as isize;
    kernel
        .iter()
        .enumerate()
        .map(|(k, w)| {
            let position = reflect(index as isize + k as isize - radius, n);
            w * samples.get(position).copied().unwrap_or(0.0)
        })
        .sum()
}

// Maps any integer onto 0..n with the pattern d c b a | a b c d | d c b a
fn reflect(position: isize, n: isize) -> usize {
    if n <= 1 {
        return 0;
    }
    let period = 2 * n;
    let p = position.rem_euclid(period);
    (if p < n { p } else { period - 1 - p }) as usize
}
