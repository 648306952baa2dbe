//! Conversion between 4-D images and time-by-voxel matrices

use crate::io::error::{Result, invalid_data};
use ndarray::{Array2, Array3, Array4, ArrayView3, ArrayView4, Axis};

/// Binarize a mask image: every non-zero voxel is inside
pub fn binarize(mask: ArrayView3<'_, f64>) -> Array3<bool> {
    mask.mapv(|v| v != 0.0 && !v.is_nan())
}

/// Collect the series of in-mask voxels (or every voxel) as `T x V`
///
/// Voxels are taken in (x, y, z) row-major order.
///
/// # Errors
///
/// Returns an error if the mask grid differs from the image grid
pub fn extract_series(image: ArrayView4<'_, f64>, mask: Option<&Array3<bool>>) -> Result<Array2<f64>> {
    let (nx, ny, nz, nt) = image.dim();
    if let Some(mask) = mask {
        check_grid(mask, [nx, ny, nz])?;
    }
    let columns: Vec<_> = image
        .lanes(Axis(3))
        .into_iter()
        .zip(0..)
        .filter(|(_, flat)| inside(mask, *flat, [nx, ny, nz]))
        .map(|(lane, _)| lane)
        .collect();

    let mut series = Array2::zeros((nt, columns.len()));
    for (mut column, lane) in series.axis_iter_mut(Axis(1)).zip(&columns) {
        column.assign(lane);
    }
    Ok(series)
}

/// Scatter `T x V` series back into a zero-filled 4-D image
///
/// # Errors
///
/// Returns an error if the number of series differs from the in-mask voxel count
pub fn restore_series(
    series: &Array2<f64>,
    mask: Option<&Array3<bool>>,
    shape: [usize; 3],
) -> Result<Array4<f64>> {
    if let Some(mask) = mask {
        check_grid(mask, shape)?;
    }
    let nt = series.nrows();
    let mut image = Array4::zeros((shape[0], shape[1], shape[2], nt));
    let mut columns = series.axis_iter(Axis(1));
    for (flat, mut lane) in image.lanes_mut(Axis(3)).into_iter().enumerate() {
        if !inside(mask, flat, shape) {
            continue;
        }
        let column = columns
            .next()
            .ok_or_else(|| invalid_data(&"fewer series than in-mask voxels"))?;
        lane.assign(&column);
    }
    if columns.next().is_some() {
        return Err(invalid_data(&"more series than in-mask voxels"));
    }
    Ok(image)
}

fn check_grid(mask: &Array3<bool>, shape: [usize; 3]) -> Result<()> {
    let (mx, my, mz) = mask.dim();
    if [mx, my, mz] == shape {
        Ok(())
    } else {
        Err(invalid_data(&format!(
            "mask grid {mx}x{my}x{mz} does not match image grid {}x{}x{}",
            shape[0], shape[1], shape[2]
        )))
    }
}

fn inside(mask: Option<&Array3<bool>>, flat: usize, shape: [usize; 3]) -> bool {
    mask.is_none_or(|m| {
        let z = flat % shape[2];
        let y = (flat / shape[2]) % shape[1];
        let x = flat / (shape[1] * shape[2]);
        m.get((x, y, z)).copied().unwrap_or(false)
    })
}
