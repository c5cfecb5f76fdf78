//! Plumb volume geometry and conversions between voxel indices and space.
//!
//! CIFTI volumes are always plumb: each voxel index axis runs along exactly
//! one of the x, y and z axes, possibly flipped. The geometry is therefore
//! fully described by the orientation of each index axis, the spatial
//! coordinate of voxel `(0, 0, 0)` and the (positive) spacing along each
//! index axis.

use crate::error::{CiftiError, Result};
use crate::typedef::Orientation;
use std::convert::TryFrom;

/// The geometry of the voxel grid a CIFTI file maps into.
#[derive(Debug, Clone, PartialEq)]
pub struct VolumeGeometry {
    dims: [i64; 3],
    orientation: [Orientation; 3],
    origin: [f32; 3],
    spacing: [f32; 3],
    /// spatial axis of each index axis
    axis: [usize; 3],
    voxel_count: usize,
}

impl VolumeGeometry {
    /// Validate and create a geometry.
    ///
    /// `origin` is the spatial coordinate of voxel `(0, 0, 0)`; `spacing`
    /// holds the voxel size along each index axis, and its sign is ignored
    /// since the direction is given by `orientation`.
    ///
    /// # Errors
    ///
    /// - `CiftiError::NonPlumbOrientation` if two index axes run along the
    ///   same spatial axis.
    /// - `CiftiError::DegenerateSpacing` if a spacing is zero or not finite.
    /// - `CiftiError::VolumeTooLarge` if the number of voxels does not fit
    ///   in an `i64` or a `usize`.
    pub fn new(
        dims: [i64; 3],
        orientation: [Orientation; 3],
        origin: [f32; 3],
        spacing: [f32; 3],
    ) -> Result<Self> {
        let axis = [
            orientation[0].spatial_axis(),
            orientation[1].spatial_axis(),
            orientation[2].spatial_axis(),
        ];
        if axis[0] == axis[1] || axis[0] == axis[2] || axis[1] == axis[2] {
            return Err(CiftiError::NonPlumbOrientation);
        }
        if spacing.iter().any(|s| *s == 0. || !s.is_finite()) {
            return Err(CiftiError::DegenerateSpacing);
        }
        // flat indices are computed in i64, so the whole grid must fit there
        let voxel_count = dims
            .iter()
            .try_fold(1i64, |n, d| n.checked_mul((*d).max(0)))
            .and_then(|n| usize::try_from(n).ok())
            .ok_or(CiftiError::VolumeTooLarge(dims))?;
        Ok(VolumeGeometry {
            dims,
            orientation,
            origin,
            spacing: [spacing[0].abs(), spacing[1].abs(), spacing[2].abs()],
            axis,
            voxel_count,
        })
    }

    /// Convenience constructor for the usual left-to-right,
    /// posterior-to-anterior, inferior-to-superior grid.
    pub fn ras(dims: [i64; 3], origin: [f32; 3], spacing: [f32; 3]) -> Result<Self> {
        VolumeGeometry::new(
            dims,
            [
                Orientation::LeftToRight,
                Orientation::PosteriorToAnterior,
                Orientation::InferiorToSuperior,
            ],
            origin,
            spacing,
        )
    }

    /// Number of voxels along each index axis.
    pub fn dims(&self) -> [i64; 3] {
        self.dims
    }

    /// Orientation of each index axis.
    pub fn orientation(&self) -> [Orientation; 3] {
        self.orientation
    }

    /// Coordinate of voxel `(0, 0, 0)`.
    pub fn origin(&self) -> [f32; 3] {
        self.origin
    }

    /// Voxel size along each index axis.
    pub fn spacing(&self) -> [f32; 3] {
        self.spacing
    }

    /// Total number of voxels in the grid.
    pub fn voxel_count(&self) -> usize {
        self.voxel_count
    }

    /// Signed step in space of one index increment along index axis `d`.
    fn step(&self, d: usize) -> f32 {
        self.orientation[d].sign() * self.spacing[d]
    }

    /// Convert (possibly fractional) voxel indices to a spatial coordinate.
    pub fn fractional_index_to_space(&self, ijk: [f32; 3]) -> [f32; 3] {
        let mut xyz = self.origin;
        for d in 0..3 {
            xyz[self.axis[d]] += ijk[d] * self.step(d);
        }
        xyz
    }

    /// Convert voxel indices to the spatial coordinate of the voxel center.
    pub fn index_to_space(&self, ijk: [i64; 3]) -> [f32; 3] {
        self.fractional_index_to_space([ijk[0] as f32, ijk[1] as f32, ijk[2] as f32])
    }

    /// Find the indices of the voxel enclosing the given coordinate.
    ///
    /// The output may lie outside of the grid; check it with
    /// [`index_valid`](#method.index_valid) before using it.
    pub fn enclosing_voxel(&self, xyz: [f32; 3]) -> [i64; 3] {
        let mut ijk = [0i64; 3];
        for d in 0..3 {
            let a = self.axis[d];
            ijk[d] = ((xyz[a] - self.origin[a]) / self.step(d)).round() as i64;
        }
        ijk
    }

    /// Whether all three indices lie within `[0, dim)` of their axis.
    pub fn index_valid(&self, ijk: [i64; 3]) -> bool {
        ijk.iter().zip(&self.dims).all(|(i, d)| *i >= 0 && *i < *d)
    }

    /// Flatten in-range voxel indices into a position of a dense grid,
    /// with `i` varying fastest.
    pub fn flat_index(&self, ijk: [i64; 3]) -> Option<usize> {
        if !self.index_valid(ijk) {
            return None;
        }
        let [di, dj, _] = self.dims;
        Some((ijk[0] + di * (ijk[1] + dj * ijk[2])) as usize)
    }

    /// The box spanned by the centers of the first and last voxels.
    pub fn bounding_box(&self) -> BoundingBox {
        let mut bb = BoundingBox::new();
        if self.dims.iter().all(|d| *d > 0) {
            bb.update(self.index_to_space([0, 0, 0]));
            bb.update(self.index_to_space([self.dims[0] - 1, self.dims[1] - 1, self.dims[2] - 1]));
        }
        bb
    }

    /// The geometry as a 4x4 affine from voxel indices to space.
    #[cfg(feature = "nalgebra_affine")]
    pub fn affine(&self) -> nalgebra::Matrix4<f32> {
        let mut affine = nalgebra::Matrix4::<f32>::identity();
        for d in 0..3 {
            affine[(d, d)] = 0.;
        }
        for d in 0..3 {
            affine[(self.axis[d], d)] = self.step(d);
        }
        for a in 0..3 {
            affine[(a, 3)] = self.origin[a];
        }
        affine
    }
}

/// An axis aligned box in space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    min: [f32; 3],
    max: [f32; 3],
}

impl Default for BoundingBox {
    fn default() -> Self {
        BoundingBox::new()
    }
}

impl BoundingBox {
    /// Create an empty box, ready to be grown with `update`.
    pub fn new() -> Self {
        BoundingBox {
            min: [std::f32::MAX; 3],
            max: [std::f32::MIN; 3],
        }
    }

    /// Grow the box so that it contains `xyz`.
    pub fn update(&mut self, xyz: [f32; 3]) {
        for a in 0..3 {
            self.min[a] = self.min[a].min(xyz[a]);
            self.max[a] = self.max[a].max(xyz[a]);
        }
    }

    /// Whether at least one point was added.
    pub fn is_valid(&self) -> bool {
        (0..3).all(|a| self.min[a] <= self.max[a])
    }

    /// Minimum corner.
    pub fn min(&self) -> [f32; 3] {
        self.min
    }

    /// Maximum corner.
    pub fn max(&self) -> [f32; 3] {
        self.max
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lpi() -> VolumeGeometry {
        VolumeGeometry::new(
            [10, 12, 5],
            [
                Orientation::RightToLeft,
                Orientation::PosteriorToAnterior,
                Orientation::InferiorToSuperior,
            ],
            [90., -126., -72.],
            [2., 2., 3.],
        )
        .unwrap()
    }

    #[test]
    fn index_space_round_trip() {
        let g = lpi();
        for k in 0..5 {
            for j in 0..12 {
                for i in 0..10 {
                    let xyz = g.index_to_space([i, j, k]);
                    assert_eq!(g.enclosing_voxel(xyz), [i, j, k]);
                }
            }
        }
    }

    #[test]
    fn flipped_axis() {
        let g = lpi();
        assert_eq!(g.index_to_space([1, 0, 0]), [88., -126., -72.]);
        assert_eq!(g.enclosing_voxel([88.9, -125.2, -70.9]), [1, 0, 0]);
    }

    #[test]
    fn swapped_axes() {
        let g = VolumeGeometry::new(
            [4, 4, 4],
            [
                Orientation::PosteriorToAnterior,
                Orientation::LeftToRight,
                Orientation::InferiorToSuperior,
            ],
            [0., 0., 0.],
            [1., 2., 1.],
        )
        .unwrap();
        assert_eq!(g.index_to_space([1, 1, 0]), [2., 1., 0.]);
        assert_eq!(g.enclosing_voxel([2., 1., 0.]), [1, 1, 0]);
    }

    #[test]
    fn validity() {
        let g = lpi();
        assert!(g.index_valid([0, 0, 0]));
        assert!(g.index_valid([9, 11, 4]));
        assert!(!g.index_valid([10, 0, 0]));
        assert!(!g.index_valid([0, -1, 0]));
        assert_eq!(g.flat_index([1, 1, 1]), Some(1 + 10 + 120));
        assert_eq!(g.flat_index([0, 12, 0]), None);
    }

    #[test]
    fn rejects_non_plumb() {
        let r = VolumeGeometry::new(
            [1, 1, 1],
            [
                Orientation::LeftToRight,
                Orientation::RightToLeft,
                Orientation::InferiorToSuperior,
            ],
            [0.; 3],
            [1.; 3],
        );
        assert!(matches!(r, Err(CiftiError::NonPlumbOrientation)));
        let r = VolumeGeometry::ras([1, 1, 1], [0.; 3], [1., 0., 1.]);
        assert!(matches!(r, Err(CiftiError::DegenerateSpacing)));
    }

    #[test]
    fn rejects_huge_grid() {
        let r = VolumeGeometry::ras([1 << 22; 3], [0.; 3], [1.; 3]);
        assert!(matches!(r, Err(CiftiError::VolumeTooLarge([d, _, _])) if d == 1 << 22));

        let g = VolumeGeometry::ras([1 << 10, 1 << 10, 1 << 8], [0.; 3], [1.; 3]).unwrap();
        assert_eq!(g.voxel_count(), 1 << 28);
        let last = [(1 << 10) - 1, (1 << 10) - 1, (1 << 8) - 1];
        assert_eq!(g.flat_index(last), Some((1 << 28) - 1));

        let g = VolumeGeometry::ras([0, 5, 5], [0.; 3], [1.; 3]).unwrap();
        assert_eq!(g.voxel_count(), 0);
    }

    #[test]
    fn bounding_box() {
        let g = lpi();
        let bb = g.bounding_box();
        assert!(bb.is_valid());
        assert_eq!(bb.min(), [72., -126., -72.]);
        assert_eq!(bb.max(), [90., -104., -60.]);
        assert!(!BoundingBox::new().is_valid());
    }
}
