//! Resampling images onto another image's voxel grid
//!
//! Label images must only ever be resampled with [`Interpolation::Nearest`]:
//! any weighted interpolation would invent label codes at region borders.

use crate::io::error::{Result, computation_error};
use crate::io::nifti::{Volume, shaped};
use nalgebra::{Matrix4, Vector4};

/// How source voxel values are combined at non-integer positions
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Interpolation {
    /// Value of the closest source voxel
    Nearest,
    /// Trilinear weighting of the eight surrounding voxels
    Linear,
}

/// Resample `source` onto the spatial grid of `reference`
///
/// 4-D sources keep their time axis. Positions outside the source field of
/// view are filled with zero. Sources already on the reference grid are
/// returned unchanged.
///
/// # Errors
///
/// Returns an error if the source affine cannot be inverted
pub fn resample_like(
    source: &Volume,
    reference: &Volume,
    interpolation: Interpolation,
) -> Result<Volume> {
    if source.same_grid(reference) {
        return Ok(source.clone());
    }
    let source_inverse = source
        .affine()
        .try_inverse()
        .ok_or_else(|| computation_error("resampling", &"source affine is singular"))?;
    let mapping = source_inverse * reference.affine();

    let target = reference.spatial_shape();
    let dims = source.spatial_shape();
    let frames = source.n_timepoints();
    let samples = sample_points(&mapping, target, dims, interpolation);

    let data = source.data();
    let flat: Vec<f64> = data.iter().copied().collect();
    let frame_of = |x: usize, y: usize, z: usize, t: usize| -> f64 {
        let index = if data.ndim() == 4 {
            ((x * dims[1] + y) * dims[2] + z) * frames + t
        } else {
            (x * dims[1] + y) * dims[2] + z
        };
        flat.get(index).copied().unwrap_or(0.0)
    };

    let mut values = Vec::with_capacity(samples.len() * frames);
    for weights in &samples {
        for t in 0..frames {
            values.push(
                weights
                    .iter()
                    .map(|&([x, y, z], w)| w * frame_of(x, y, z, t))
                    .sum(),
            );
        }
    }

    let mut shape = target.to_vec();
    if data.ndim() == 4 {
        shape.push(frames);
    }
    Ok(reference.with_data(shaped(&shape, values)?))
}

type Weights = Vec<([usize; 3], f64)>;

// Source voxels and weights contributing to every target voxel, in
// (x, y, z) row-major order
fn sample_points(
    mapping: &Matrix4<f64>,
    target: [usize; 3],
    dims: [usize; 3],
    interpolation: Interpolation,
) -> Vec<Weights> {
    let mut samples = Vec::with_capacity(target.iter().product());
    for i in 0..target[0] {
        for j in 0..target[1] {
            for k in 0..target[2] {
                let p = mapping * Vector4::new(i as f64, j as f64, k as f64, 1.0);
                let position = [p.x, p.y, p.z];
                samples.push(match interpolation {
                    Interpolation::Nearest => nearest(position, dims),
                    Interpolation::Linear => trilinear(position, dims),
                });
            }
        }
    }
    samples
}

fn inside(index: f64, len: usize) -> Option<usize> {
    (index >= 0.0 && index < len as f64).then_some(index as usize)
}

fn nearest(position: [f64; 3], dims: [usize; 3]) -> Weights {
    let x = inside(position[0].round(), dims[0]);
    let y = inside(position[1].round(), dims[1]);
    let z = inside(position[2].round(), dims[2]);
    match (x, y, z) {
        (Some(x), Some(y), Some(z)) => vec![([x, y, z], 1.0)],
        _ => Vec::new(),
    }
}

fn trilinear(position: [f64; 3], dims: [usize; 3]) -> Weights {
    let base = position.map(f64::floor);
    let frac = [
        position[0] - base[0],
        position[1] - base[1],
        position[2] - base[2],
    ];
    let mut weights = Vec::with_capacity(8);
    for corner in 0..8_u8 {
        let offset = [corner & 1, (corner >> 1) & 1, (corner >> 2) & 1];
        let mut weight = 1.0;
        let mut index = [0_usize; 3];
        let mut valid = true;
        for axis in 0..3 {
            let step = f64::from(offset[axis]);
            weight *= if offset[axis] == 1 {
                frac[axis]
            } else {
                1.0 - frac[axis]
            };
            match inside(base[axis] + step, dims[axis]) {
                Some(v) => index[axis] = v,
                None => valid = false,
            }
        }
        if valid && weight > 0.0 {
            weights.push((index, weight));
        }
    }
    weights
}
