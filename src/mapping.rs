//! The matrix description of a CIFTI file.
//!
//! Each of the two dimensions of the data matrix is described by an
//! [`IndexMap`]. The map along the row describes the columns, and the map
//! along the column describes the rows. Brain model and parcel maps tie
//! indices to brainordinates, while the others name the indices (scalar and
//! label maps), space them in time (series) or simply count them.
//!
//! This model is produced by a [`MatrixFormat`] when a file is opened, and
//! owns the palette color mappings and label tables of the file. Maps refer
//! to those through handles resolved against [`CiftiXml`].
//!
//! [`IndexMap`]: ./enum.IndexMap.html
//! [`CiftiXml`]: ./struct.CiftiXml.html
//! [`MatrixFormat`]: ../file/trait.MatrixFormat.html

use crate::geometry::VolumeGeometry;
use crate::indexer::{SurfaceNodeIndexer, VoxelMapping, NOT_MAPPED};
use crate::label::LabelTable;
use crate::metadata::MetaData;
use crate::palette::PaletteColorMapping;
use crate::typedef::{IndexType, Structure, TimeUnits};

/// Brainordinates of one structure in a brain models map.
#[derive(Debug, Clone, PartialEq)]
pub enum ModelKind {
    /// Nodes of a surface.
    Surface {
        /// Number of nodes in the full surface.
        number_of_nodes: usize,
        /// Nodes with data, in index order.
        node_indices: Vec<i64>,
    },
    /// Voxels of a volume.
    Volume {
        /// Voxels with data, in index order.
        voxels: Vec<[i64; 3]>,
    },
}

/// A contiguous run of indices tied to the brainordinates of one structure.
#[derive(Debug, Clone, PartialEq)]
pub struct BrainModel {
    /// Structure of the brainordinates.
    pub structure: Structure,
    /// Index of the first brainordinate.
    pub offset: usize,
    /// The brainordinates.
    pub kind: ModelKind,
}

impl BrainModel {
    /// A surface model.
    pub fn surface(
        structure: Structure,
        offset: usize,
        number_of_nodes: usize,
        node_indices: Vec<i64>,
    ) -> Self {
        BrainModel {
            structure,
            offset,
            kind: ModelKind::Surface {
                number_of_nodes,
                node_indices,
            },
        }
    }

    /// A volume model.
    pub fn volume(structure: Structure, offset: usize, voxels: Vec<[i64; 3]>) -> Self {
        BrainModel {
            structure,
            offset,
            kind: ModelKind::Volume { voxels },
        }
    }

    /// Number of indices the model covers.
    pub fn count(&self) -> usize {
        match &self.kind {
            ModelKind::Surface { node_indices, .. } => node_indices.len(),
            ModelKind::Volume { voxels } => voxels.len(),
        }
    }
}

/// Indices tied to surface nodes and voxels.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BrainModelsMap {
    /// The models, in any order.
    pub models: Vec<BrainModel>,
    /// Geometry of the voxel grid, if any model is a volume.
    pub volume: Option<VolumeGeometry>,
}

/// A named group of brainordinates.
#[derive(Debug, Clone, PartialEq)]
pub struct Parcel {
    /// Name of the parcel.
    pub name: String,
    /// Surface nodes of the parcel, per structure.
    pub surface_nodes: Vec<(Structure, Vec<i64>)>,
    /// Voxels of the parcel.
    pub voxels: Vec<[i64; 3]>,
}

impl Parcel {
    /// A parcel with no brainordinates yet.
    pub fn new<S: Into<String>>(name: S) -> Self {
        Parcel {
            name: name.into(),
            surface_nodes: Vec::new(),
            voxels: Vec::new(),
        }
    }

    /// Add the nodes of a surface.
    pub fn with_nodes(mut self, structure: Structure, nodes: Vec<i64>) -> Self {
        self.surface_nodes.push((structure, nodes));
        self
    }

    /// Add voxels.
    pub fn with_voxels(mut self, voxels: Vec<[i64; 3]>) -> Self {
        self.voxels.extend(voxels);
        self
    }
}

/// Indices tied to parcels, one index per parcel.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParcelsMap {
    /// The parcels, in index order.
    pub parcels: Vec<Parcel>,
    /// Surfaces the parcels may refer to, with their number of nodes.
    pub surfaces: Vec<(Structure, usize)>,
    /// Geometry of the voxel grid, if any parcel has voxels.
    pub volume: Option<VolumeGeometry>,
}

/// Attributes of one index of a scalar or label map.
#[derive(Debug, Clone, PartialEq)]
pub struct NamedMap {
    /// Name shown for the map.
    pub name: String,
    /// Map metadata.
    pub metadata: MetaData,
    /// Palette settings, for scalar maps.
    pub palette: Option<PaletteColorMapping>,
    /// Label table, for label maps.
    pub label_table: Option<LabelTable>,
}

impl NamedMap {
    /// A scalar map colored with a palette.
    pub fn scalar<S: Into<String>>(name: S, palette: PaletteColorMapping) -> Self {
        NamedMap {
            name: name.into(),
            metadata: MetaData::new(),
            palette: Some(palette),
            label_table: None,
        }
    }

    /// A label map colored with a label table.
    pub fn label<S: Into<String>>(name: S, label_table: LabelTable) -> Self {
        NamedMap {
            name: name.into(),
            metadata: MetaData::new(),
            palette: None,
            label_table: Some(label_table),
        }
    }
}

/// Description of one dimension of the data matrix.
#[derive(Debug, Clone, PartialEq)]
pub enum IndexMap {
    /// Indices are brainordinates.
    BrainModels(BrainModelsMap),
    /// Indices are parcels.
    Parcels(ParcelsMap),
    /// Indices are named scalar maps.
    Scalars(Vec<NamedMap>),
    /// Indices are named label maps.
    Labels(Vec<NamedMap>),
    /// Indices are evenly spaced points of a series.
    Series {
        /// Number of points.
        count: usize,
        /// Value of the first point.
        start: f32,
        /// Distance between points.
        step: f32,
        /// Units of `start` and `step`.
        units: TimeUnits,
    },
    /// Indices are fibers.
    Fibers {
        /// Number of fibers.
        count: usize,
    },
    /// The dimension could not be described.
    Invalid,
}

impl IndexMap {
    /// Type of the indices.
    pub fn index_type(&self) -> IndexType {
        match self {
            IndexMap::BrainModels(_) => IndexType::BrainModels,
            IndexMap::Parcels(_) => IndexType::Parcels,
            IndexMap::Scalars(_) => IndexType::Scalars,
            IndexMap::Labels(_) => IndexType::Labels,
            IndexMap::Series { .. } => IndexType::TimePoints,
            IndexMap::Fibers { .. } => IndexType::Fibers,
            IndexMap::Invalid => IndexType::Invalid,
        }
    }

    /// Number of indices along the dimension.
    pub fn length(&self) -> usize {
        match self {
            IndexMap::BrainModels(m) => m
                .models
                .iter()
                .map(|b| b.offset + b.count())
                .max()
                .unwrap_or(0),
            IndexMap::Parcels(m) => m.parcels.len(),
            IndexMap::Scalars(maps) | IndexMap::Labels(maps) => maps.len(),
            IndexMap::Series { count, .. } | IndexMap::Fibers { count } => *count,
            IndexMap::Invalid => 0,
        }
    }

    /// The named maps, for scalar and label dimensions.
    pub fn named_maps(&self) -> Option<&[NamedMap]> {
        match self {
            IndexMap::Scalars(maps) | IndexMap::Labels(maps) => Some(&maps[..]),
            _ => None,
        }
    }

    /// The named maps, for scalar and label dimensions.
    pub fn named_maps_mut(&mut self) -> Option<&mut Vec<NamedMap>> {
        match self {
            IndexMap::Scalars(maps) | IndexMap::Labels(maps) => Some(maps),
            _ => None,
        }
    }

    /// Geometry of the voxel grid, for brainordinate dimensions.
    pub fn volume(&self) -> Option<&VolumeGeometry> {
        match self {
            IndexMap::BrainModels(m) => m.volume.as_ref(),
            IndexMap::Parcels(m) => m.volume.as_ref(),
            _ => None,
        }
    }

    /// Whether the indices tie to parcels.
    pub fn is_parcels(&self) -> bool {
        matches!(self, IndexMap::Parcels(_))
    }

    /// Whether any index ties to a surface node.
    pub fn has_surface_data(&self) -> bool {
        match self {
            IndexMap::BrainModels(m) => m
                .models
                .iter()
                .any(|b| matches!(b.kind, ModelKind::Surface { .. })),
            IndexMap::Parcels(m) => m
                .parcels
                .iter()
                .any(|p| p.surface_nodes.iter().any(|(_, n)| !n.is_empty())),
            _ => false,
        }
    }

    /// Number of nodes of the surface of `structure`, if the dimension maps
    /// that structure.
    pub fn number_of_nodes(&self, structure: Structure) -> Option<usize> {
        match self {
            IndexMap::BrainModels(m) => m.models.iter().find_map(|b| match &b.kind {
                ModelKind::Surface {
                    number_of_nodes, ..
                } if b.structure == structure => Some(*number_of_nodes),
                _ => None,
            }),
            IndexMap::Parcels(m) => m
                .surfaces
                .iter()
                .find(|(s, _)| *s == structure)
                .map(|(_, n)| *n),
            _ => None,
        }
    }

    /// Index of each node of a surface, or [`NOT_MAPPED`]. The output has
    /// one entry per node, and is entirely unmapped when the surface does
    /// not have `number_of_nodes` nodes.
    ///
    /// [`NOT_MAPPED`]: ../indexer/constant.NOT_MAPPED.html
    pub fn surface_data_indices(&self, structure: Structure, number_of_nodes: usize) -> Vec<i64> {
        let mut indices = vec![NOT_MAPPED; number_of_nodes];
        if self.number_of_nodes(structure) != Some(number_of_nodes) {
            return indices;
        }
        let mut set = |node: i64, index: usize| {
            if node >= 0 && (node as usize) < number_of_nodes {
                indices[node as usize] = index as i64;
            }
        };
        match self {
            IndexMap::BrainModels(m) => {
                for b in m.models.iter().filter(|b| b.structure == structure) {
                    if let ModelKind::Surface { node_indices, .. } = &b.kind {
                        for (i, node) in node_indices.iter().enumerate() {
                            set(*node, b.offset + i);
                        }
                    }
                }
            }
            IndexMap::Parcels(m) => {
                for (p, parcel) in m.parcels.iter().enumerate() {
                    for (s, nodes) in &parcel.surface_nodes {
                        if *s == structure {
                            for node in nodes {
                                set(*node, p);
                            }
                        }
                    }
                }
            }
            _ => {}
        }
        indices
    }

    /// Every mapped surface with its number of nodes.
    pub fn surfaces(&self) -> Vec<(Structure, usize)> {
        let mut surfaces: Vec<(Structure, usize)> = Vec::new();
        match self {
            IndexMap::BrainModels(m) => {
                for b in &m.models {
                    if let ModelKind::Surface {
                        number_of_nodes, ..
                    } = &b.kind
                    {
                        if surfaces.iter().all(|(s, _)| *s != b.structure) {
                            surfaces.push((b.structure, *number_of_nodes));
                        }
                    }
                }
            }
            IndexMap::Parcels(m) => surfaces.extend(m.surfaces.iter().cloned()),
            _ => {}
        }
        surfaces
    }

    /// Node to index lookup over every mapped surface.
    pub fn node_indexer(&self) -> SurfaceNodeIndexer {
        SurfaceNodeIndexer::new(
            self.surfaces()
                .into_iter()
                .map(|(s, n)| (s, self.surface_data_indices(s, n))),
        )
    }

    /// Name of the parcel at `index`, for parcel dimensions.
    pub fn parcel_name(&self, index: usize) -> Option<&str> {
        match self {
            IndexMap::Parcels(m) => m.parcels.get(index).map(|p| p.name.as_str()),
            _ => None,
        }
    }

    /// Every voxel with its index, the input of the sparse voxel indexer.
    pub fn voxel_mappings(&self) -> Vec<VoxelMapping> {
        match self {
            IndexMap::BrainModels(m) => m
                .models
                .iter()
                .flat_map(|b| match &b.kind {
                    ModelKind::Volume { voxels } => voxels
                        .iter()
                        .enumerate()
                        .map(|(i, v)| VoxelMapping::new(*v, (b.offset + i) as i64))
                        .collect(),
                    ModelKind::Surface { .. } => Vec::new(),
                })
                .collect(),
            IndexMap::Parcels(m) => m
                .parcels
                .iter()
                .enumerate()
                .flat_map(|(p, parcel)| {
                    parcel
                        .voxels
                        .iter()
                        .map(move |v| VoxelMapping::new(*v, p as i64))
                })
                .collect(),
            _ => Vec::new(),
        }
    }
}

/// Which palette color mapping colors a map.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaletteHandle {
    /// The palette of the scalar map at this index.
    Map(usize),
    /// The palette shared by the whole file.
    File,
}

/// The description of a CIFTI data matrix.
#[derive(Debug, Clone, PartialEq)]
pub struct CiftiXml {
    /// Describes the columns.
    pub along_row: IndexMap,
    /// Describes the rows.
    pub along_column: IndexMap,
    /// Palette settings of files whose maps have no attributes of their own.
    pub file_palette: Option<PaletteColorMapping>,
    /// File metadata.
    pub file_metadata: MetaData,
}

impl CiftiXml {
    /// A description with no file palette and empty metadata.
    pub fn new(along_row: IndexMap, along_column: IndexMap) -> Self {
        CiftiXml {
            along_row,
            along_column,
            file_palette: None,
            file_metadata: MetaData::new(),
        }
    }

    /// Set the palette shared by the whole file.
    pub fn with_file_palette(mut self, palette: PaletteColorMapping) -> Self {
        self.file_palette = Some(palette);
        self
    }

    /// Number of rows of the matrix.
    pub fn number_of_rows(&self) -> usize {
        self.along_column.length()
    }

    /// Number of columns of the matrix.
    pub fn number_of_columns(&self) -> usize {
        self.along_row.length()
    }

    /// Resolve a palette handle.
    pub fn palette(&self, handle: PaletteHandle) -> Option<&PaletteColorMapping> {
        match handle {
            PaletteHandle::Map(i) => self
                .along_row
                .named_maps()
                .and_then(|maps| maps.get(i))
                .and_then(|m| m.palette.as_ref()),
            PaletteHandle::File => self.file_palette.as_ref(),
        }
    }

    /// Resolve a palette handle for changes.
    pub fn palette_mut(&mut self, handle: PaletteHandle) -> Option<&mut PaletteColorMapping> {
        match handle {
            PaletteHandle::Map(i) => self
                .along_row
                .named_maps_mut()
                .and_then(|maps| maps.get_mut(i))
                .and_then(|m| m.palette.as_mut()),
            PaletteHandle::File => self.file_palette.as_mut(),
        }
    }

    /// Label table of the label map at `index`.
    pub fn label_table(&self, index: usize) -> Option<&LabelTable> {
        self.along_row
            .named_maps()
            .and_then(|maps| maps.get(index))
            .and_then(|m| m.label_table.as_ref())
    }

    /// Label table of the label map at `index`, for changes.
    pub fn label_table_mut(&mut self, index: usize) -> Option<&mut LabelTable> {
        self.along_row
            .named_maps_mut()
            .and_then(|maps| maps.get_mut(index))
            .and_then(|m| m.label_table.as_mut())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dense() -> IndexMap {
        IndexMap::BrainModels(BrainModelsMap {
            models: vec![
                BrainModel::surface(Structure::CortexLeft, 0, 10, vec![1, 3, 5]),
                BrainModel::volume(Structure::ThalamusLeft, 3, vec![[0, 0, 0], [1, 2, 3]]),
            ],
            volume: Some(VolumeGeometry::ras([4, 4, 4], [0.; 3], [1.; 3]).unwrap()),
        })
    }

    #[test]
    fn brain_models() {
        let m = dense();
        assert_eq!(m.index_type(), IndexType::BrainModels);
        assert_eq!(m.length(), 5);
        assert_eq!(m.number_of_nodes(Structure::CortexLeft), Some(10));
        assert_eq!(m.number_of_nodes(Structure::CortexRight), None);
        assert_eq!(m.surfaces(), vec![(Structure::CortexLeft, 10)]);
        let nodes = m.node_indexer();
        assert_eq!(nodes.index(Structure::CortexLeft, 5), Some(2));
        assert_eq!(nodes.index(Structure::CortexLeft, 4), None);
        assert_eq!(nodes.number_of_nodes(Structure::ThalamusLeft), None);
        assert!(m.has_surface_data());
        assert_eq!(
            m.voxel_mappings(),
            vec![
                VoxelMapping::new([0, 0, 0], 3),
                VoxelMapping::new([1, 2, 3], 4)
            ]
        );
        let indices = m.surface_data_indices(Structure::CortexLeft, 10);
        assert_eq!(indices, vec![-1, 0, -1, 1, -1, 2, -1, -1, -1, -1]);
        assert_eq!(
            m.surface_data_indices(Structure::CortexLeft, 9),
            vec![NOT_MAPPED; 9]
        );
    }

    #[test]
    fn parcels() {
        let m = IndexMap::Parcels(ParcelsMap {
            parcels: vec![
                Parcel::new("V1").with_nodes(Structure::CortexLeft, vec![0, 1]),
                Parcel::new("LGN").with_voxels(vec![[2, 2, 2]]),
            ],
            surfaces: vec![(Structure::CortexLeft, 4)],
            volume: None,
        });
        assert_eq!(m.length(), 2);
        assert_eq!(m.node_indexer().index(Structure::CortexLeft, 1), Some(0));
        assert_eq!(m.voxel_mappings(), vec![VoxelMapping::new([2, 2, 2], 1)]);
        assert_eq!(m.parcel_name(1), Some("LGN"));
        assert_eq!(
            m.surface_data_indices(Structure::CortexLeft, 4),
            vec![0, 0, -1, -1]
        );
    }

    #[test]
    fn handles() {
        let mut xml = CiftiXml::new(
            IndexMap::Scalars(vec![NamedMap::scalar("a", PaletteColorMapping::default())]),
            dense(),
        );
        assert_eq!(xml.number_of_rows(), 5);
        assert_eq!(xml.number_of_columns(), 1);
        assert!(xml.palette(PaletteHandle::Map(0)).is_some());
        assert!(xml.palette(PaletteHandle::Map(1)).is_none());
        assert!(xml.palette(PaletteHandle::File).is_none());
        assert!(xml.label_table(0).is_none());
        xml.palette_mut(PaletteHandle::Map(0))
            .unwrap()
            .set_selected_palette_name("Gray_Interp");
        assert!(xml.palette(PaletteHandle::Map(0)).unwrap().is_modified());
    }
}
