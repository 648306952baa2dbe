//! NIfTI volume loading and saving with voxel-to-world geometry

use crate::io::error::{PipelineError, Result, WithPath, invalid_data};
use nalgebra::{Matrix4, Vector4};
use ndarray::{ArrayD, ArrayView3, ArrayView4, Axis, Ix3, Ix4, IxDyn, Slice};
use nifti::writer::WriterOptions;
use nifti::{IntoNdArray, NiftiHeader, NiftiObject, ReaderOptions};
use std::path::Path;

// xyzt_units time field codes
const UNITS_TIME_MASK: u8 = 0x38;
const UNITS_MSEC: u8 = 16;
const UNITS_USEC: u8 = 24;

/// A 3-D or 4-D image with the header it was read with
#[derive(Debug, Clone)]
pub struct Volume {
    data: ArrayD<f64>,
    header: NiftiHeader,
}

impl Volume {
    /// Load a `.nii` or `.nii.gz` file, applying intensity scaling
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not 3-D/4-D
    pub fn load(path: &Path) -> Result<Self> {
        let object = ReaderOptions::new().read_file(path).with_path(path)?;
        let header = object.header().clone();
        let data = object
            .into_volume()
            .into_ndarray::<f64>()
            .with_path(path)?;
        let volume = Self { data, header };
        volume.check_rank()?;
        Ok(volume)
    }

    /// Build a volume from an array and a voxel-to-world affine
    ///
    /// `repetition_time` is stored in the fourth pixdim when the array is 4-D.
    ///
    /// # Errors
    ///
    /// Returns an error if the array is not 3-D or 4-D
    pub fn from_array(
        data: ArrayD<f64>,
        affine: &Matrix4<f64>,
        repetition_time: Option<f64>,
    ) -> Result<Self> {
        let mut header = NiftiHeader {
            sform_code: 1,
            qform_code: 0,
            ..NiftiHeader::default()
        };
        for (i, row) in [&mut header.srow_x, &mut header.srow_y, &mut header.srow_z]
            .into_iter()
            .enumerate()
        {
            for (j, cell) in row.iter_mut().enumerate() {
                *cell = affine.get((i, j)).copied().unwrap_or(0.0) as f32;
            }
        }
        for axis in 0..3 {
            let column = affine.fixed_view::<3, 1>(0, axis);
            if let Some(p) = header.pixdim.get_mut(axis + 1) {
                *p = column.norm() as f32;
            }
        }
        if let Some(p) = header.pixdim.get_mut(4) {
            *p = repetition_time.unwrap_or(0.0) as f32;
        }
        let volume = Self::with_header(data, header);
        volume.check_rank()?;
        Ok(volume)
    }

    fn with_header(data: ArrayD<f64>, mut header: NiftiHeader) -> Self {
        header.dim = [1; 8];
        header.dim[0] = data.ndim() as u16;
        for (slot, &len) in header.dim.iter_mut().skip(1).zip(data.shape()) {
            *slot = len as u16;
        }
        header.scl_slope = 1.0;
        header.scl_inter = 0.0;
        Self { data, header }
    }

    fn check_rank(&self) -> Result<()> {
        match self.data.ndim() {
            3 | 4 => Ok(()),
            n => Err(invalid_data(&format!(
                "expected a 3-D or 4-D image, found {n}-D"
            ))),
        }
    }

    /// New volume on the same grid and header with different data
    pub fn with_data(&self, data: ArrayD<f64>) -> Self {
        Self::with_header(data, self.header.clone())
    }

    /// Write the volume as 32-bit floats; a `.gz` suffix compresses the output
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written
    pub fn save(&self, path: &Path) -> Result<()> {
        let mut header = self.header.clone();
        header.scl_slope = 1.0;
        header.scl_inter = 0.0;
        let data = self.data.mapv(|v| v as f32);
        WriterOptions::new(path)
            .reference_header(&header)
            .write_nifti(&data)
            .map_err(|source| PipelineError::ImageExport {
                path: path.to_path_buf(),
                source,
            })
    }

    /// Raw image data in (x, y, z[, t]) order
    pub const fn data(&self) -> &ArrayD<f64> {
        &self.data
    }

    /// Consume the volume and return its data
    pub fn into_data(self) -> ArrayD<f64> {
        self.data
    }

    /// Spatial grid dimensions
    pub fn spatial_shape(&self) -> [usize; 3] {
        let shape = self.data.shape();
        [
            shape.first().copied().unwrap_or(1),
            shape.get(1).copied().unwrap_or(1),
            shape.get(2).copied().unwrap_or(1),
        ]
    }

    /// Number of volumes along the time axis (1 for 3-D images)
    pub fn n_timepoints(&self) -> usize {
        self.data.shape().get(3).copied().unwrap_or(1)
    }

    /// View the data as a 4-D array
    ///
    /// # Errors
    ///
    /// Returns an error if the image is not 4-D
    pub fn as_4d(&self) -> Result<ArrayView4<'_, f64>> {
        self.data
            .view()
            .into_dimensionality::<Ix4>()
            .map_err(|_| invalid_data(&"expected a 4-D image"))
    }

    /// View the data as a 3-D array, taking the first volume of 4-D images
    ///
    /// # Errors
    ///
    /// Returns an error if the image has no spatial extent
    pub fn as_3d(&self) -> Result<ArrayView3<'_, f64>> {
        let view = self.data.view();
        let view = if view.ndim() == 4 {
            view.index_axis_move(Axis(3), 0)
        } else {
            view
        };
        view.into_dimensionality::<Ix3>()
            .map_err(|_| invalid_data(&"expected a 3-D image"))
    }

    /// Voxel-to-world transform from the sform, the qform, or the voxel sizes
    pub fn affine(&self) -> Matrix4<f64> {
        let h = &self.header;
        if h.sform_code > 0 {
            let mut affine = Matrix4::identity();
            for (i, row) in [h.srow_x, h.srow_y, h.srow_z].iter().enumerate() {
                affine.set_row(
                    i,
                    &Vector4::new(
                        f64::from(row[0]),
                        f64::from(row[1]),
                        f64::from(row[2]),
                        f64::from(row[3]),
                    )
                    .transpose(),
                );
            }
            affine
        } else if h.qform_code > 0 {
            self.qform_affine()
        } else {
            let [sx, sy, sz] = self.voxel_sizes();
            Matrix4::new_nonuniform_scaling(&nalgebra::Vector3::new(sx, sy, sz))
        }
    }

    fn qform_affine(&self) -> Matrix4<f64> {
        let h = &self.header;
        let (b, c, d) = (
            f64::from(h.quatern_b),
            f64::from(h.quatern_c),
            f64::from(h.quatern_d),
        );
        let a = (1.0 - b.mul_add(b, c.mul_add(c, d * d))).max(0.0).sqrt();
        let qfac = if h.pixdim[0] < 0.0 { -1.0 } else { 1.0 };
        let [sx, sy, sz] = self.voxel_sizes();
        let sz = sz * qfac;
        Matrix4::new(
            (a * a + b * b - c * c - d * d) * sx,
            2.0 * (b * c - a * d) * sy,
            2.0 * (b * d + a * c) * sz,
            f64::from(h.quatern_x),
            2.0 * (b * c + a * d) * sx,
            (a * a + c * c - b * b - d * d) * sy,
            2.0 * (c * d - a * b) * sz,
            f64::from(h.quatern_y),
            2.0 * (b * d - a * c) * sx,
            2.0 * (c * d + a * b) * sy,
            (a * a + d * d - b * b - c * c) * sz,
            f64::from(h.quatern_z),
            0.0,
            0.0,
            0.0,
            1.0,
        )
    }

    /// Voxel edge lengths in millimetres
    pub fn voxel_sizes(&self) -> [f64; 3] {
        let p = &self.header.pixdim;
        [
            f64::from(p[1].abs()),
            f64::from(p[2].abs()),
            f64::from(p[3].abs()),
        ]
    }

    /// Sampling interval along the time axis in seconds, if recorded
    pub fn repetition_time(&self) -> Option<f64> {
        let raw = f64::from(self.header.pixdim[4]);
        let seconds = match self.header.xyzt_units & UNITS_TIME_MASK {
            UNITS_MSEC => raw / 1_000.0,
            UNITS_USEC => raw / 1_000_000.0,
            _ => raw,
        };
        (seconds > 0.0 && seconds.is_finite()).then_some(seconds)
    }

    /// Drop the first `count` volumes of a 4-D image
    ///
    /// # Errors
    ///
    /// Returns an error if the image is not 4-D or `count` removes every volume
    pub fn drop_leading_volumes(&self, count: usize) -> Result<Self> {
        if count == 0 {
            return Ok(self.clone());
        }
        let data = self.as_4d()?;
        let total = data.shape().get(3).copied().unwrap_or(0);
        if count >= total {
            return Err(invalid_data(&format!(
                "cannot discard {count} volumes from an image with {total}"
            )));
        }
        let trimmed = data
            .slice_axis(Axis(3), Slice::from(count..))
            .to_owned()
            .into_dyn();
        Ok(self.with_data(trimmed))
    }

    /// Whether two volumes share the same spatial grid
    pub fn same_grid(&self, other: &Self) -> bool {
        self.spatial_shape() == other.spatial_shape()
            && (self.affine() - other.affine()).abs().max() < 1e-4
    }
}

/// Reshape a flat vector into an image-shaped array
///
/// # Errors
///
/// Returns an error if the element count does not match `shape`
pub fn shaped(shape: &[usize], values: Vec<f64>) -> Result<ArrayD<f64>> {
    ArrayD::from_shape_vec(IxDyn(shape), values).map_err(|e| invalid_data(&e))
}
