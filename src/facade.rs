//! Uniform access to the maps of a CIFTI file.
//!
//! A map is one layer of data over brainordinates. For scalar, label and
//! series files it is a column of the matrix; for connectivity files it is
//! the row most recently loaded for a brainordinate. [`CiftiFacade`] hides
//! that difference, and the storage backend, behind map-oriented queries.
//!
//! [`CiftiFacade`]: ./struct.CiftiFacade.html

use crate::error::{CiftiError, Result};
use crate::indexer::{SparseVoxelIndexer, SurfaceNodeIndexer};
use crate::label::LabelTable;
use crate::mapping::{CiftiXml, IndexMap, PaletteHandle};
use crate::storage::MatrixStorage;
use crate::typedef::{CiftiFileKind, DataAccess, Structure, TimeUnits};

/// Map-oriented view over the matrix description and data of a file.
#[derive(Debug)]
pub struct CiftiFacade {
    kind: CiftiFileKind,
    xml: CiftiXml,
    storage: MatrixStorage,
    loaded_row: Vec<f32>,
    loaded_row_index: Option<usize>,
    /// surface nodes to brainordinate indices
    nodes: SurfaceNodeIndexer,
    /// surface nodes to rows, for connectivity files
    row_nodes: SurfaceNodeIndexer,
    /// voxels to rows, for connectivity files
    row_voxels: SparseVoxelIndexer,
}

impl CiftiFacade {
    /// Combine the parts of an open file and build its surface and row
    /// lookups. `dense_limit` is the largest voxel grid looked up through a
    /// flat table.
    pub fn new(
        kind: CiftiFileKind,
        xml: CiftiXml,
        storage: MatrixStorage,
        dense_limit: usize,
    ) -> Self {
        let nodes = brainordinates(kind, &xml).node_indexer();
        let (row_nodes, row_voxels) = if kind.is_connectivity() {
            let rows = &xml.along_column;
            let voxels = SparseVoxelIndexer::new(
                rows.volume().cloned(),
                &rows.voxel_mappings(),
                storage.rows(),
                dense_limit,
            );
            (rows.node_indexer(), voxels)
        } else {
            (SurfaceNodeIndexer::default(), SparseVoxelIndexer::empty())
        };
        CiftiFacade {
            kind,
            xml,
            storage,
            loaded_row: Vec::new(),
            loaded_row_index: None,
            nodes,
            row_nodes,
            row_voxels,
        }
    }

    /// Kind of file.
    pub fn kind(&self) -> CiftiFileKind {
        self.kind
    }

    /// The matrix description.
    pub fn xml(&self) -> &CiftiXml {
        &self.xml
    }

    /// The matrix description, for changes.
    pub fn xml_mut(&mut self) -> &mut CiftiXml {
        &mut self.xml
    }

    /// The matrix data.
    pub fn storage(&self) -> &MatrixStorage {
        &self.storage
    }

    /// Number of maps: one for connectivity files, one per column otherwise.
    pub fn number_of_maps(&self) -> usize {
        if self.kind.is_connectivity() {
            1
        } else {
            self.storage.columns()
        }
    }

    /// Number of values in each map, which is the number of brainordinates.
    pub fn map_data_count(&self) -> usize {
        match self.kind.brainordinate_access() {
            DataAccess::WithRowMethods => self.storage.columns(),
            DataAccess::WithColumnMethods => self.storage.rows(),
            DataAccess::Invalid => 0,
        }
    }

    /// The dimension whose indices are the brainordinates of a map.
    pub fn brainordinate_mapping(&self) -> &IndexMap {
        brainordinates(self.kind, &self.xml)
    }

    /// Copy the data of a map into `out`.
    ///
    /// The data of a connectivity file is empty until a row is loaded.
    pub fn map_data(&self, map: usize, out: &mut Vec<f32>) -> Result<()> {
        if self.kind.is_connectivity() {
            out.clear();
            out.extend_from_slice(&self.loaded_row);
            Ok(())
        } else {
            self.storage.read_column(map, out)
        }
    }

    /// A single value of a map, or `None` if `index` is not a brainordinate
    /// of the map.
    pub fn map_value(&self, map: usize, index: usize) -> Result<Option<f32>> {
        if self.kind.is_connectivity() {
            Ok(self.loaded_row.get(index).cloned())
        } else {
            self.storage.read_element(index, map)
        }
    }

    /// Replace the data of a map. The map of a connectivity file is the
    /// loaded row, which is replaced in the matrix as well.
    ///
    /// # Errors
    ///
    /// `CiftiError::NotWritableInCurrentState` for a connectivity file
    /// without a loaded row, or when the matrix is read as needed.
    pub fn set_map_data(&mut self, map: usize, data: &[f32]) -> Result<()> {
        if !self.kind.is_connectivity() {
            return self.storage.set_column(map, data);
        }
        let row = self
            .loaded_row_index
            .ok_or(CiftiError::NotWritableInCurrentState("no row is loaded"))?;
        self.storage.set_row(row, data)?;
        self.loaded_row.clear();
        self.loaded_row.extend_from_slice(data);
        Ok(())
    }

    /// Load a row as the data of a connectivity file's map.
    pub fn load_row(&mut self, row: usize) -> Result<()> {
        let mut data = Vec::with_capacity(self.storage.columns());
        self.storage.read_row(row, &mut data)?;
        self.loaded_row = data;
        self.loaded_row_index = Some(row);
        Ok(())
    }

    /// Forget the loaded row.
    pub fn clear_loaded_row(&mut self) {
        self.loaded_row.clear();
        self.loaded_row_index = None;
    }

    /// Index of the loaded row, if any.
    pub fn loaded_row_index(&self) -> Option<usize> {
        self.loaded_row_index
    }

    /// Row of a surface node, through the mapping of the rows.
    pub fn row_for_surface_node(
        &self,
        structure: Structure,
        node: i64,
        number_of_nodes: usize,
    ) -> Option<usize> {
        if self.row_nodes.number_of_nodes(structure) != Some(number_of_nodes) {
            return None;
        }
        self.row_nodes.index(structure, node)
    }

    /// Row of the voxel enclosing a coordinate, through the mapping of the rows.
    pub fn row_for_voxel_at_coordinate(&self, xyz: [f32; 3]) -> Option<usize> {
        let geometry = self.row_voxels.geometry()?;
        self.row_voxels.offset(geometry.enclosing_voxel(xyz))
    }

    /// Index of each node of a surface into the data of a map, or `-1`.
    /// `None` if the surface is not mapped with `number_of_nodes` nodes.
    pub fn surface_data_indices(
        &self,
        structure: Structure,
        number_of_nodes: usize,
    ) -> Option<&[i64]> {
        self.nodes.data_indices(structure, number_of_nodes)
    }

    /// Number of nodes of a surface as declared by the file.
    pub fn surface_number_of_nodes(&self, structure: Structure) -> Option<usize> {
        self.nodes.number_of_nodes(structure)
    }

    /// Index of a surface node into the data of a map.
    pub fn index_for_node(&self, structure: Structure, node: i64) -> Option<usize> {
        self.nodes.index(structure, node)
    }

    /// One value per map for a surface node, which is a row of the matrix.
    /// Only files whose maps are columns have series data.
    pub fn series_data_for_surface_node(
        &self,
        structure: Structure,
        node: i64,
        out: &mut Vec<f32>,
    ) -> Result<bool> {
        out.clear();
        if self.kind.series_access() != DataAccess::WithRowMethods {
            return Ok(false);
        }
        // maps are columns here, so the brainordinates are the rows
        match self.nodes.index(structure, node) {
            Some(row) => {
                self.storage.read_row(row, out)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Which palette mapping colors a map.
    pub fn palette_handle(&self, map: usize) -> PaletteHandle {
        if self.kind.has_map_attributes() && !self.kind.is_colored_with_label_table() {
            PaletteHandle::Map(map)
        } else {
            PaletteHandle::File
        }
    }

    /// Label table of a map, for label files.
    pub fn label_table(&self, map: usize) -> Option<&LabelTable> {
        if self.kind.is_colored_with_label_table() {
            self.xml.label_table(map)
        } else {
            None
        }
    }

    /// Whether the maps are colored with label tables.
    pub fn is_colored_with_label_table(&self) -> bool {
        self.kind.is_colored_with_label_table()
    }

    /// Start, step and units of the maps of series files.
    pub fn map_interval(&self) -> (f32, f32, TimeUnits) {
        match &self.xml.along_row {
            IndexMap::Series {
                start, step, units, ..
            } => (*start, *step, *units),
            _ => (1., 1., TimeUnits::Unknown),
        }
    }
}

fn brainordinates(kind: CiftiFileKind, xml: &CiftiXml) -> &IndexMap {
    match kind.brainordinate_access() {
        DataAccess::WithRowMethods => &xml.along_row,
        DataAccess::WithColumnMethods | DataAccess::Invalid => &xml.along_column,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::VolumeGeometry;
    use crate::mapping::{BrainModel, BrainModelsMap, NamedMap};
    use crate::palette::PaletteColorMapping;
    use crate::storage::InMemMatrix;
    use ndarray::arr2;

    fn brain_models() -> IndexMap {
        IndexMap::BrainModels(BrainModelsMap {
            models: vec![BrainModel::surface(Structure::CortexLeft, 0, 4, vec![0, 2, 3])],
            volume: None,
        })
    }

    fn matrix() -> MatrixStorage {
        MatrixStorage::InMem(InMemMatrix::from_array(arr2(&[
            [1., 2.],
            [3., 4.],
            [5., 6.],
        ])))
    }

    #[test]
    fn scalar_maps_are_columns() {
        let xml = CiftiXml::new(
            IndexMap::Scalars(vec![
                NamedMap::scalar("a", PaletteColorMapping::default()),
                NamedMap::scalar("b", PaletteColorMapping::default()),
            ]),
            brain_models(),
        );
        let facade = CiftiFacade::new(CiftiFileKind::DenseScalar, xml, matrix(), usize::MAX);
        assert_eq!(facade.number_of_maps(), 2);
        assert_eq!(facade.map_data_count(), 3);
        let mut out = Vec::new();
        facade.map_data(1, &mut out).unwrap();
        assert_eq!(out, vec![2., 4., 6.]);
        assert_eq!(facade.map_value(1, 2).unwrap(), Some(6.));
        assert_eq!(facade.map_value(1, 3).unwrap(), None);
        assert_eq!(facade.index_for_node(Structure::CortexLeft, 3), Some(2));
        assert_eq!(facade.surface_number_of_nodes(Structure::CortexLeft), Some(4));
        assert_eq!(
            facade.surface_data_indices(Structure::CortexLeft, 4),
            Some(&[0, -1, 1, 2][..])
        );
        assert_eq!(facade.surface_data_indices(Structure::CortexLeft, 3), None);
        assert_eq!(facade.palette_handle(1), PaletteHandle::Map(1));
        assert!(facade
            .series_data_for_surface_node(Structure::CortexLeft, 2, &mut out)
            .unwrap());
        assert_eq!(out, vec![3., 4.]);
        assert!(!facade
            .series_data_for_surface_node(Structure::CortexLeft, 1, &mut out)
            .unwrap());
        assert_eq!(facade.map_interval(), (1., 1., TimeUnits::Unknown));
    }

    #[test]
    fn connectivity_map_is_loaded_row() {
        let columns = IndexMap::BrainModels(BrainModelsMap {
            models: vec![BrainModel::surface(Structure::CortexRight, 0, 2, vec![0, 1])],
            volume: None,
        });
        let xml = CiftiXml::new(columns, brain_models())
            .with_file_palette(PaletteColorMapping::default());
        let mut facade =
            CiftiFacade::new(CiftiFileKind::DenseConnectivity, xml, matrix(), usize::MAX);
        assert_eq!(facade.number_of_maps(), 1);
        assert_eq!(facade.map_data_count(), 2);
        assert_eq!(facade.palette_handle(0), PaletteHandle::File);

        let mut out = vec![9.];
        facade.map_data(0, &mut out).unwrap();
        assert!(out.is_empty());

        let row = facade.row_for_surface_node(Structure::CortexLeft, 3, 4);
        assert_eq!(row, Some(2));
        assert_eq!(facade.row_for_surface_node(Structure::CortexLeft, 3, 5), None);
        facade.load_row(2).unwrap();
        facade.map_data(0, &mut out).unwrap();
        assert_eq!(out, vec![5., 6.]);
        assert_eq!(facade.loaded_row_index(), Some(2));
        assert_eq!(facade.map_value(0, 1).unwrap(), Some(6.));
        assert_eq!(facade.index_for_node(Structure::CortexRight, 1), Some(1));
        assert_eq!(facade.row_for_voxel_at_coordinate([0., 0., 0.]), None);

        facade.clear_loaded_row();
        facade.map_data(0, &mut out).unwrap();
        assert!(out.is_empty());
    }

    #[test]
    fn connectivity_edit_replaces_row() {
        let xml = CiftiXml::new(brain_models(), brain_models())
            .with_file_palette(PaletteColorMapping::default());
        let storage = MatrixStorage::InMem(InMemMatrix::zeros(3, 3));
        let mut facade =
            CiftiFacade::new(CiftiFileKind::DenseConnectivity, xml, storage, usize::MAX);
        assert!(matches!(
            facade.set_map_data(0, &[1., 2., 3.]),
            Err(CiftiError::NotWritableInCurrentState(_))
        ));

        facade.load_row(1).unwrap();
        facade.set_map_data(0, &[1., 2., 3.]).unwrap();
        facade.clear_loaded_row();
        facade.load_row(1).unwrap();
        let mut out = Vec::new();
        facade.map_data(0, &mut out).unwrap();
        assert_eq!(out, vec![1., 2., 3.]);
        let matrix = facade.storage().in_memory().unwrap().as_array();
        assert_eq!(matrix.row(0).to_vec(), vec![0., 0., 0.]);
        assert_eq!(matrix.row(1).to_vec(), vec![1., 2., 3.]);
    }

    #[test]
    fn voxel_rows() {
        let volume = VolumeGeometry::ras([2, 2, 2], [0.; 3], [1.; 3]).unwrap();
        let rows = IndexMap::BrainModels(BrainModelsMap {
            models: vec![BrainModel::volume(
                Structure::ThalamusLeft,
                0,
                vec![[0, 0, 0], [1, 1, 1], [1, 0, 0]],
            )],
            volume: Some(volume),
        });
        let xml = CiftiXml::new(brain_models(), rows)
            .with_file_palette(PaletteColorMapping::default());
        let facade = CiftiFacade::new(CiftiFileKind::DenseConnectivity, xml, matrix(), 0);
        assert_eq!(facade.row_for_voxel_at_coordinate([1., 1., 1.]), Some(1));
        assert_eq!(facade.row_for_voxel_at_coordinate([0.9, 0.1, -0.2]), Some(2));
        assert_eq!(facade.row_for_voxel_at_coordinate([0., 1., 0.]), None);
        assert_eq!(facade.row_for_voxel_at_coordinate([5., 0., 0.]), None);
    }
}
