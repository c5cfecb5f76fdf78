//! Sparse lookup from voxel indices to offsets into a map's data.
//!
//! Only a fraction of the bounding volume of a CIFTI file is brain tissue,
//! so the file lists the voxels it maps along with the data offset of each.
//! [`SparseVoxelIndexer`] turns that list into a constant time lookup. It is
//! built once when the file is opened and never modified afterwards.
//!
//! Surface nodes get the same treatment through [`SurfaceNodeIndexer`].
//!
//! [`SparseVoxelIndexer`]: ./struct.SparseVoxelIndexer.html
//! [`SurfaceNodeIndexer`]: ./struct.SurfaceNodeIndexer.html

use crate::geometry::VolumeGeometry;
use crate::typedef::Structure;
use std::collections::HashMap;
use tracing::warn;

/// Offset returned for voxels without data.
pub const NOT_MAPPED: i64 = -1;

/// One entry of a file's voxel to brainordinate mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VoxelMapping {
    /// Voxel indices.
    pub ijk: [i64; 3],
    /// Offset of the voxel's value in the data of a map.
    pub offset: i64,
}

impl VoxelMapping {
    /// Create a mapping entry.
    pub fn new(ijk: [i64; 3], offset: i64) -> Self {
        VoxelMapping { ijk, offset }
    }
}

#[derive(Debug, Clone)]
enum Lookup {
    Empty,
    /// one slot per voxel of the grid
    Dense(Vec<i64>),
    /// keyed by flattened voxel index
    Hashed(HashMap<usize, i64>),
}

/// Immutable voxel index to data offset lookup.
///
/// Every offset handed out is either [`NOT_MAPPED`] or smaller than the
/// data count the indexer was built for.
///
/// [`NOT_MAPPED`]: ./constant.NOT_MAPPED.html
#[derive(Debug, Clone)]
pub struct SparseVoxelIndexer {
    geometry: Option<VolumeGeometry>,
    lookup: Lookup,
    mapped_count: usize,
}

impl Default for SparseVoxelIndexer {
    fn default() -> Self {
        SparseVoxelIndexer::empty()
    }
}

impl SparseVoxelIndexer {
    /// An indexer for a file without volume data.
    pub fn empty() -> Self {
        SparseVoxelIndexer {
            geometry: None,
            lookup: Lookup::Empty,
            mapped_count: 0,
        }
    }

    /// Build the lookup from the file's voxel mapping list.
    ///
    /// Entries whose voxel lies outside of `geometry`, or whose offset is not
    /// below `data_count`, are dropped with a warning. A flat table is used
    /// when the grid has at most `dense_limit` voxels, a hash map otherwise.
    pub fn new(
        geometry: Option<VolumeGeometry>,
        mappings: &[VoxelMapping],
        data_count: usize,
        dense_limit: usize,
    ) -> Self {
        let geometry = match geometry {
            Some(g) if !mappings.is_empty() => g,
            g => {
                return SparseVoxelIndexer {
                    geometry: g,
                    lookup: Lookup::Empty,
                    mapped_count: 0,
                }
            }
        };

        let valid_offset = |offset: i64| offset >= 0 && (offset as u64) < data_count as u64;
        let mut dropped = 0usize;
        let mut mapped_count = 0usize;

        let lookup = if geometry.voxel_count() <= dense_limit {
            let mut table = vec![NOT_MAPPED; geometry.voxel_count()];
            for m in mappings {
                match geometry.flat_index(m.ijk) {
                    Some(flat) if valid_offset(m.offset) => {
                        if table[flat] == NOT_MAPPED {
                            mapped_count += 1;
                        }
                        table[flat] = m.offset;
                    }
                    _ => dropped += 1,
                }
            }
            Lookup::Dense(table)
        } else {
            let mut table = HashMap::with_capacity(mappings.len());
            for m in mappings {
                match geometry.flat_index(m.ijk) {
                    Some(flat) if valid_offset(m.offset) => {
                        let _ = table.insert(flat, m.offset);
                    }
                    _ => dropped += 1,
                }
            }
            mapped_count = table.len();
            Lookup::Hashed(table)
        };

        if dropped > 0 {
            warn!(dropped, data_count, "voxel mappings outside of the volume or data were ignored");
        }

        SparseVoxelIndexer {
            geometry: Some(geometry),
            lookup: if mapped_count > 0 { lookup } else { Lookup::Empty },
            mapped_count,
        }
    }

    /// Whether the file maps any voxel at all. Surface-only files are not
    /// valid, and volume queries on them must short-circuit.
    pub fn is_valid(&self) -> bool {
        self.geometry.is_some() && self.mapped_count > 0
    }

    /// The geometry of the voxel grid, if the file declares one.
    pub fn geometry(&self) -> Option<&VolumeGeometry> {
        self.geometry.as_ref()
    }

    /// Number of distinct voxels with data.
    pub fn mapped_voxel_count(&self) -> usize {
        self.mapped_count
    }

    /// Data offset of the voxel, or [`NOT_MAPPED`].
    ///
    /// [`NOT_MAPPED`]: ./constant.NOT_MAPPED.html
    pub fn offset_for_indices(&self, ijk: [i64; 3]) -> i64 {
        let flat = match self.geometry.as_ref().and_then(|g| g.flat_index(ijk)) {
            Some(flat) => flat,
            None => return NOT_MAPPED,
        };
        match &self.lookup {
            Lookup::Empty => NOT_MAPPED,
            Lookup::Dense(table) => table[flat],
            Lookup::Hashed(table) => table.get(&flat).cloned().unwrap_or(NOT_MAPPED),
        }
    }

    /// Data offset of the voxel as an index, or `None` if it has no data.
    pub fn offset(&self, ijk: [i64; 3]) -> Option<usize> {
        let offset = self.offset_for_indices(ijk);
        if offset >= 0 {
            Some(offset as usize)
        } else {
            None
        }
    }
}

/// Immutable surface node to index lookup, one table per structure.
#[derive(Debug, Clone, Default)]
pub struct SurfaceNodeIndexer {
    surfaces: HashMap<Structure, Vec<i64>>,
}

impl SurfaceNodeIndexer {
    /// Build the lookup from the index of every node of each surface, or
    /// [`NOT_MAPPED`]. The number of nodes of a surface is the length of
    /// its table.
    ///
    /// [`NOT_MAPPED`]: ./constant.NOT_MAPPED.html
    pub fn new<I>(surfaces: I) -> Self
    where
        I: IntoIterator<Item = (Structure, Vec<i64>)>,
    {
        SurfaceNodeIndexer {
            surfaces: surfaces.into_iter().collect(),
        }
    }

    /// Number of nodes of the surface of `structure`, if it is mapped.
    pub fn number_of_nodes(&self, structure: Structure) -> Option<usize> {
        self.surfaces.get(&structure).map(Vec::len)
    }

    /// Index of each node of the surface, if it has `number_of_nodes` nodes.
    pub fn data_indices(&self, structure: Structure, number_of_nodes: usize) -> Option<&[i64]> {
        self.surfaces
            .get(&structure)
            .filter(|t| t.len() == number_of_nodes)
            .map(|t| &t[..])
    }

    /// Index of a surface node, if it has one.
    pub fn index(&self, structure: Structure, node: i64) -> Option<usize> {
        if node < 0 {
            return None;
        }
        let index = *self.surfaces.get(&structure)?.get(node as usize)?;
        if index >= 0 {
            Some(index as usize)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn geometry() -> VolumeGeometry {
        VolumeGeometry::ras([10, 10, 5], [0., 0., 0.], [1., 1., 1.]).unwrap()
    }

    fn mappings() -> Vec<VoxelMapping> {
        vec![
            VoxelMapping::new([3, 4, 2], 17),
            VoxelMapping::new([0, 0, 0], 0),
            VoxelMapping::new([9, 9, 4], 1),
            // outside of the grid
            VoxelMapping::new([10, 0, 0], 2),
            // beyond the data
            VoxelMapping::new([1, 1, 1], 40),
        ]
    }

    fn check(indexer: &SparseVoxelIndexer) {
        assert!(indexer.is_valid());
        assert_eq!(indexer.mapped_voxel_count(), 3);
        assert_eq!(indexer.offset_for_indices([3, 4, 2]), 17);
        assert_eq!(indexer.offset_for_indices([0, 0, 0]), 0);
        assert_eq!(indexer.offset_for_indices([9, 9, 4]), 1);
        assert_eq!(indexer.offset_for_indices([1, 1, 1]), NOT_MAPPED);
        assert_eq!(indexer.offset_for_indices([2, 2, 2]), NOT_MAPPED);
        assert_eq!(indexer.offset_for_indices([-1, 0, 0]), NOT_MAPPED);
        assert_eq!(indexer.offset_for_indices([0, 0, 5]), NOT_MAPPED);
        assert_eq!(indexer.offset([3, 4, 2]), Some(17));
    }

    #[test]
    fn dense_lookup() {
        let indexer = SparseVoxelIndexer::new(Some(geometry()), &mappings(), 20, usize::MAX);
        check(&indexer);
    }

    #[test]
    fn hashed_lookup() {
        let indexer = SparseVoxelIndexer::new(Some(geometry()), &mappings(), 20, 0);
        check(&indexer);
    }

    #[test]
    fn offsets_below_data_count() {
        let indexer = SparseVoxelIndexer::new(Some(geometry()), &mappings(), 20, usize::MAX);
        let g = geometry();
        for k in 0..5 {
            for j in 0..10 {
                for i in 0..10 {
                    let o = indexer.offset_for_indices([i, j, k]);
                    assert!(o == NOT_MAPPED || (o >= 0 && o < 20));
                }
            }
        }
        assert_eq!(g.voxel_count(), 500);
    }

    #[test]
    fn surface_only() {
        let indexer = SparseVoxelIndexer::new(Some(geometry()), &[], 20, usize::MAX);
        assert!(!indexer.is_valid());
        assert!(indexer.geometry().is_some());
        assert_eq!(indexer.offset_for_indices([0, 0, 0]), NOT_MAPPED);

        let indexer = SparseVoxelIndexer::empty();
        assert!(!indexer.is_valid());
        assert_eq!(indexer.offset_for_indices([0, 0, 0]), NOT_MAPPED);
    }

    #[test]
    fn node_lookup() {
        let nodes = SurfaceNodeIndexer::new(vec![
            (Structure::CortexLeft, vec![NOT_MAPPED, 0, NOT_MAPPED, 1]),
            (Structure::CortexRight, vec![2, 3]),
        ]);
        assert_eq!(nodes.number_of_nodes(Structure::CortexLeft), Some(4));
        assert_eq!(nodes.number_of_nodes(Structure::Cerebellum), None);
        assert_eq!(nodes.index(Structure::CortexLeft, 1), Some(0));
        assert_eq!(nodes.index(Structure::CortexLeft, 0), None);
        assert_eq!(nodes.index(Structure::CortexLeft, 4), None);
        assert_eq!(nodes.index(Structure::CortexLeft, -1), None);
        assert_eq!(nodes.index(Structure::CortexRight, 1), Some(3));
        assert_eq!(
            nodes.data_indices(Structure::CortexRight, 2),
            Some(&[2, 3][..])
        );
        assert_eq!(nodes.data_indices(Structure::CortexRight, 3), None);
        assert_eq!(SurfaceNodeIndexer::default().index(Structure::CortexLeft, 0), None);
    }
}
