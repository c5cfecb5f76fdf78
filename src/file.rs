//! Module for opening CIFTI mappable data files and querying their maps.
//!
//! A [`MappableFile`] is created empty for one [`CiftiFileKind`], then
//! populated by [`read`], which either succeeds as a whole or leaves the
//! file empty. Reading checks the matrix description against the contract
//! of the kind and reports every failed check at once.
//!
//! The byte format of the header and the transfer of files from the network
//! are left to collaborators, behind the [`MatrixFormat`] and
//! [`RemoteFetcher`] traits.
//!
//! [`MappableFile`]: ./struct.MappableFile.html
//! [`CiftiFileKind`]: ../typedef/enum.CiftiFileKind.html
//! [`read`]: ./struct.MappableFile.html#method.read
//! [`MatrixFormat`]: ./trait.MatrixFormat.html
//! [`RemoteFetcher`]: ./trait.RemoteFetcher.html

use std::collections::BTreeSet;
use std::io::Write;
use std::path::{Path, PathBuf};

use rgb::RGBA;
use tracing::{debug, warn};

use crate::coloring::to_rgba8;
use crate::content::{ColorState, ColoringSource, MapContent};
use crate::error::{CiftiError, Result};
use crate::facade::CiftiFacade;
use crate::geometry::{BoundingBox, VolumeGeometry};
use crate::indexer::SparseVoxelIndexer;
use crate::label::LabelTable;
use crate::mapping::{CiftiXml, PaletteHandle};
use crate::metadata::MetaData;
use crate::palette::{PaletteColorMapping, PaletteFile};
use crate::stats::{
    DescriptiveStatistics, FastStatistics, Histogram, RangeFilter, DEFAULT_HISTOGRAM_BUCKETS,
};
use crate::storage::{InMemMatrix, MatrixLayout, MatrixStorage, OnDiskMatrix};
use crate::typedef::{CiftiFileKind, FileReading, IndexType, SlicePlane, Structure, TimeUnits};
use crate::util::{format_numeric, is_remote_name};
use crate::writer::write_cifti;

/// Default largest grid, in voxels, indexed with a flat table.
pub const DEFAULT_DENSE_LOOKUP_LIMIT: usize = 16 * 1024 * 1024;

/// Text of a voxel whose label key is not in the label table.
pub const INVALID_LABEL_TEXT: &str = "Invalid Label Index";

/// Alpha of the color of surface nodes without data.
pub const NO_DATA_ALPHA: f32 = -1.;

/// Reader and writer of the header of a CIFTI file, which carries the
/// matrix description.
pub trait MatrixFormat {
    /// Read the matrix description of the file at `path`, along with where
    /// its matrix data lies.
    fn read_header(&self, path: &Path) -> Result<(CiftiXml, MatrixLayout)>;

    /// Write a header carrying `xml` for a matrix of the given layout.
    /// Returns the number of bytes written, after which the matrix follows.
    fn write_header(&self, dest: &mut dyn Write, xml: &CiftiXml, layout: &MatrixLayout)
        -> Result<u64>;
}

/// Copies files from the network to local storage.
pub trait RemoteFetcher {
    /// Fetch the file at `url`, returning the path of a local copy.
    fn fetch(&self, url: &str) -> Result<PathBuf>;
}

/// Where a file is read from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileSource {
    /// A file on a local disk.
    Local(PathBuf),
    /// A file on the network.
    Remote(String),
}

impl FileSource {
    /// Classify a file name: names starting with a network scheme are remote.
    pub fn from_name(name: &str) -> Self {
        if is_remote_name(name) {
            FileSource::Remote(name.to_string())
        } else {
            FileSource::Local(PathBuf::from(name))
        }
    }

    /// The name of the source.
    pub fn name(&self) -> String {
        match self {
            FileSource::Local(p) => p.to_string_lossy().into_owned(),
            FileSource::Remote(url) => url.clone(),
        }
    }

    /// Whether the source is on the network.
    pub fn is_remote(&self) -> bool {
        matches!(self, FileSource::Remote(_))
    }
}

/// Options and flags which can be used to configure how a CIFTI file is
/// read.
#[derive(Debug, Clone, PartialEq)]
pub struct ReaderOptions {
    histogram_buckets: usize,
    dense_lookup_limit: usize,
    validate_labels: bool,
}

impl Default for ReaderOptions {
    fn default() -> Self {
        ReaderOptions {
            histogram_buckets: DEFAULT_HISTOGRAM_BUCKETS,
            dense_lookup_limit: DEFAULT_DENSE_LOOKUP_LIMIT,
            validate_labels: true,
        }
    }
}

impl ReaderOptions {
    /// Creates a blank new set of options ready for configuration.
    pub fn new() -> Self {
        ReaderOptions::default()
    }

    /// Sets the number of buckets of map histograms.
    pub fn histogram_buckets(&mut self, n: usize) -> &mut Self {
        self.histogram_buckets = n;
        self
    }

    /// Sets the largest voxel grid indexed with a flat table. Larger grids
    /// are indexed with a hash map.
    pub fn dense_lookup_limit(&mut self, voxels: usize) -> &mut Self {
        self.dense_lookup_limit = voxels;
        self
    }

    /// Sets whether label keys are checked against label tables on open.
    pub fn validate_labels(&mut self, validate: bool) -> &mut Self {
        self.validate_labels = validate;
        self
    }

    /// Open a file of the given kind.
    pub fn read_file(
        &self,
        kind: CiftiFileKind,
        source: &FileSource,
        format: &dyn MatrixFormat,
        fetcher: Option<&dyn RemoteFetcher>,
    ) -> Result<MappableFile> {
        let mut file = MappableFile::with_options(kind, self.clone());
        file.read(source, format, fetcher)?;
        Ok(file)
    }
}

/// Value of a voxel, as found by coordinate.
#[derive(Debug, Clone, PartialEq)]
pub struct VoxelValue {
    /// Indices of the voxel enclosing the coordinate.
    pub ijk: [i64; 3],
    /// The data value.
    pub value: f32,
    /// The label name or the formatted value.
    pub text: String,
}

/// Value of a surface node.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeValue {
    /// The data value, when the node maps to data.
    pub value: Option<f32>,
    /// The parcel name, or the formatted value.
    pub text: String,
}

/// Consistency of the data of a label map with its label table.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LabelKeyReport {
    /// Keys found in the data but not in the table.
    pub missing_keys: Vec<i32>,
    /// Keys of the table not found in the data.
    pub unused_keys: Vec<i32>,
}

impl LabelKeyReport {
    /// Whether every key of the data has a label.
    pub fn is_consistent(&self) -> bool {
        self.missing_keys.is_empty()
    }
}

#[derive(Debug)]
struct LoadedFile {
    facade: CiftiFacade,
    contents: Vec<MapContent>,
    indexer: SparseVoxelIndexer,
    remote: bool,
    data_modified: bool,
}

impl LoadedFile {
    fn check_map(&self, map: usize) -> Result<()> {
        let count = self.contents.len();
        if map < count {
            Ok(())
        } else {
            Err(CiftiError::InvalidMapIndex(map, count))
        }
    }

    fn map_data(&self, map: usize) -> Result<Vec<f32>> {
        let mut data = Vec::new();
        self.facade.map_data(map, &mut data)?;
        Ok(data)
    }

    fn label_name(&self, map: usize, value: f32) -> Option<&str> {
        self.facade
            .label_table(map)
            .and_then(|t| t.label(value as i32))
            .map(|l| l.name())
    }
}

/// A CIFTI file whose data is exposed as maps over brainordinates.
#[derive(Debug)]
pub struct MappableFile {
    kind: CiftiFileKind,
    name: String,
    options: ReaderOptions,
    loaded: Option<Box<LoadedFile>>,
}

impl MappableFile {
    /// An empty file of the given kind.
    pub fn new(kind: CiftiFileKind) -> Self {
        MappableFile::with_options(kind, ReaderOptions::default())
    }

    /// An empty file of the given kind, read with the given options.
    pub fn with_options(kind: CiftiFileKind, options: ReaderOptions) -> Self {
        MappableFile {
            kind,
            name: String::new(),
            options,
            loaded: None,
        }
    }

    /// Kind of file.
    pub fn kind(&self) -> CiftiFileKind {
        self.kind
    }

    /// Name of the file last read, empty if none.
    pub fn file_name(&self) -> &str {
        &self.name
    }

    /// Whether no file is loaded.
    pub fn is_empty(&self) -> bool {
        self.loaded.is_none()
    }

    /// Drop all content, leaving the file empty.
    pub fn clear(&mut self) {
        self.loaded = None;
        self.name.clear();
    }

    /// Read a file, replacing any previous content.
    ///
    /// The file starts from a cleared state. The description of the matrix
    /// is checked against the contract of the file kind and every failed
    /// check is reported in a single `CiftiError::Validation`, after which
    /// the file is left empty.
    ///
    /// # Errors
    ///
    /// - `CiftiError::RemoteReadAsNeeded` if the kind must be read as needed
    ///   and the source is on the network. Nothing is fetched.
    /// - `CiftiError::Validation` for any mismatch with the contract.
    /// - Any error of the format, the fetcher or the storage.
    pub fn read(
        &mut self,
        source: &FileSource,
        format: &dyn MatrixFormat,
        fetcher: Option<&dyn RemoteFetcher>,
    ) -> Result<()> {
        self.clear();
        let name = source.name();
        let loaded = self.open(&name, source, format, fetcher)?;
        self.name = name;
        self.loaded = Some(Box::new(loaded));
        self.clear_modified();
        Ok(())
    }

    fn open(
        &self,
        name: &str,
        source: &FileSource,
        format: &dyn MatrixFormat,
        fetcher: Option<&dyn RemoteFetcher>,
    ) -> Result<LoadedFile> {
        let kind = self.kind;
        let path = match source {
            FileSource::Local(path) => path.clone(),
            FileSource::Remote(url) => {
                if kind.file_reading() == FileReading::ReadAsNeeded {
                    return Err(CiftiError::RemoteReadAsNeeded(name.to_string(), kind));
                }
                let fetcher =
                    fetcher.ok_or_else(|| CiftiError::RemoteFetchUnavailable(name.to_string()))?;
                fetcher.fetch(url)?
            }
        };

        let (xml, layout) = format.read_header(&path)?;
        let messages = validate(kind, &xml, &layout);
        if !messages.is_empty() {
            return Err(CiftiError::Validation(name.to_string(), messages));
        }

        let storage = match kind.file_reading() {
            FileReading::ReadAll => MatrixStorage::InMem(InMemMatrix::from_file(&path, &layout)?),
            FileReading::ReadAsNeeded => {
                MatrixStorage::OnDisk(OnDiskMatrix::from_file(&path, layout)?)
            }
        };
        let facade = CiftiFacade::new(kind, xml, storage, self.options.dense_lookup_limit);

        let data_count = facade.map_data_count();
        let mapping = facade.brainordinate_mapping();
        let indexer = SparseVoxelIndexer::new(
            mapping.volume().cloned(),
            &mapping.voxel_mappings(),
            data_count,
            self.options.dense_lookup_limit,
        );

        let contents: Vec<MapContent> = (0..facade.number_of_maps())
            .map(|map| new_map_content(&facade, map, name, self.options.histogram_buckets))
            .collect();

        debug!(
            file = name,
            kind = kind.gui_name(),
            rows = layout.rows,
            columns = layout.columns,
            along_row = facade.xml().along_row.index_type().name(),
            along_column = facade.xml().along_column.index_type().name(),
            surface = mapping.has_surface_data(),
            volume = indexer.is_valid(),
            voxels = indexer.mapped_voxel_count(),
            maps = contents.len(),
            "opened CIFTI file"
        );

        let loaded = LoadedFile {
            facade,
            contents,
            indexer,
            remote: source.is_remote(),
            data_modified: false,
        };

        if self.options.validate_labels && kind.is_colored_with_label_table() {
            for map in 0..loaded.contents.len() {
                let report = label_key_report(&loaded, map)?;
                if !report.is_consistent() {
                    warn!(
                        file = name,
                        map,
                        missing = ?report.missing_keys,
                        "label keys missing from the label table"
                    );
                }
                let table = loaded
                    .facade
                    .label_table(map)
                    .map(|t| t.to_formatted_string("  "))
                    .unwrap_or_default();
                debug!(
                    file = name,
                    map,
                    unused = ?report.unused_keys,
                    "label keys checked against table:\n{}",
                    table
                );
            }
        }

        Ok(loaded)
    }

    fn loaded(&self) -> Result<&LoadedFile> {
        self.loaded
            .as_ref()
            .map(|l| &**l)
            .ok_or(CiftiError::NoFileLoaded)
    }

    fn loaded_mut(&mut self) -> Result<&mut LoadedFile> {
        self.loaded
            .as_mut()
            .map(|l| &mut **l)
            .ok_or(CiftiError::NoFileLoaded)
    }

    /// The matrix description, if a file is loaded.
    pub fn cifti_xml(&self) -> Option<&CiftiXml> {
        self.loaded.as_ref().map(|l| l.facade.xml())
    }

    /// The voxel indexer, if a file is loaded.
    pub fn voxel_indexer(&self) -> Option<&SparseVoxelIndexer> {
        self.loaded.as_ref().map(|l| &l.indexer)
    }

    // Maps

    /// Number of maps; zero when empty.
    pub fn number_of_maps(&self) -> usize {
        self.loaded.as_ref().map(|l| l.contents.len()).unwrap_or(0)
    }

    /// Name of a map.
    pub fn map_name(&self, map: usize) -> Result<&str> {
        let loaded = self.loaded()?;
        loaded.check_map(map)?;
        Ok(loaded.contents[map].name())
    }

    /// Rename a map.
    pub fn set_map_name<S: Into<String>>(&mut self, map: usize, name: S) -> Result<()> {
        let loaded = self.loaded_mut()?;
        loaded.check_map(map)?;
        loaded.contents[map].set_name(name);
        Ok(())
    }

    /// Metadata of a map.
    pub fn map_metadata(&self, map: usize) -> Result<&MetaData> {
        let loaded = self.loaded()?;
        loaded.check_map(map)?;
        Ok(loaded.contents[map].metadata())
    }

    /// Metadata of a map, for changes.
    pub fn map_metadata_mut(&mut self, map: usize) -> Result<&mut MetaData> {
        let loaded = self.loaded_mut()?;
        loaded.check_map(map)?;
        Ok(loaded.contents[map].metadata_mut())
    }

    /// Unique identifier of a map, from its metadata.
    pub fn map_unique_id(&self, map: usize) -> Result<Option<&str>> {
        Ok(self.map_metadata(map)?.unique_id())
    }

    /// Metadata of the file.
    pub fn file_metadata(&self) -> Result<&MetaData> {
        Ok(&self.loaded()?.facade.xml().file_metadata)
    }

    /// Metadata of the file, for changes.
    pub fn file_metadata_mut(&mut self) -> Result<&mut MetaData> {
        Ok(&mut self.loaded_mut()?.facade.xml_mut().file_metadata)
    }

    /// The data of a map. Empty for a connectivity file with no loaded row.
    pub fn map_data(&self, map: usize) -> Result<Vec<f32>> {
        let loaded = self.loaded()?;
        loaded.check_map(map)?;
        loaded.map_data(map)
    }

    /// Replace the data of a map, dropping its summaries and colors.
    pub fn set_map_data(&mut self, map: usize, data: &[f32]) -> Result<()> {
        let loaded = self.loaded_mut()?;
        loaded.check_map(map)?;
        let expected = loaded.contents[map].data_count();
        if data.len() != expected {
            return Err(CiftiError::DataLengthMismatch(expected, data.len()));
        }
        loaded.facade.set_map_data(map, data)?;
        loaded.contents[map].invalidate_data();
        loaded.data_modified = true;
        Ok(())
    }

    /// Exact statistics of a map.
    pub fn map_statistics(&mut self, map: usize) -> Result<&DescriptiveStatistics> {
        self.map_statistics_filtered(map, None)
    }

    /// Exact statistics of the values of a map kept by `filter`.
    pub fn map_statistics_ranged(
        &mut self,
        map: usize,
        filter: &RangeFilter,
    ) -> Result<&DescriptiveStatistics> {
        self.map_statistics_filtered(map, Some(filter))
    }

    fn map_statistics_filtered(
        &mut self,
        map: usize,
        filter: Option<&RangeFilter>,
    ) -> Result<&DescriptiveStatistics> {
        let loaded = self.loaded_mut()?;
        loaded.check_map(map)?;
        let LoadedFile {
            facade, contents, ..
        } = loaded;
        contents[map].statistics(filter, || fetch_map_data(facade, map))
    }

    /// Fast statistics of a map.
    pub fn map_fast_statistics(&mut self, map: usize) -> Result<&FastStatistics> {
        let loaded = self.loaded_mut()?;
        loaded.check_map(map)?;
        let LoadedFile {
            facade, contents, ..
        } = loaded;
        contents[map].fast_statistics(|| fetch_map_data(facade, map))
    }

    /// Histogram of a map.
    pub fn map_histogram(&mut self, map: usize) -> Result<&Histogram> {
        self.map_histogram_filtered(map, None)
    }

    /// Histogram of the values of a map kept by `filter`.
    pub fn map_histogram_ranged(&mut self, map: usize, filter: &RangeFilter) -> Result<&Histogram> {
        self.map_histogram_filtered(map, Some(filter))
    }

    fn map_histogram_filtered(
        &mut self,
        map: usize,
        filter: Option<&RangeFilter>,
    ) -> Result<&Histogram> {
        let loaded = self.loaded_mut()?;
        loaded.check_map(map)?;
        let LoadedFile {
            facade, contents, ..
        } = loaded;
        contents[map].histogram(filter, || fetch_map_data(facade, map))
    }

    /// Whether maps are colored with palettes.
    pub fn is_mapped_with_palette(&self) -> bool {
        !self.kind.is_colored_with_label_table()
    }

    /// Whether maps are colored with label tables.
    pub fn is_mapped_with_label_table(&self) -> bool {
        self.kind.is_colored_with_label_table()
    }

    /// Palette settings of a map. Maps of files without map attributes share
    /// the palette settings of the file.
    pub fn map_palette_color_mapping(&self, map: usize) -> Result<Option<&PaletteColorMapping>> {
        let loaded = self.loaded()?;
        loaded.check_map(map)?;
        Ok(match loaded.contents[map].coloring_source() {
            ColoringSource::Palette(handle) => loaded.facade.xml().palette(handle),
            ColoringSource::LabelTable(_) => None,
        })
    }

    /// Palette settings of a map, for changes. The colors of every map using
    /// these settings become stale.
    pub fn map_palette_color_mapping_mut(
        &mut self,
        map: usize,
    ) -> Result<Option<&mut PaletteColorMapping>> {
        let loaded = self.loaded_mut()?;
        loaded.check_map(map)?;
        let handle = match loaded.contents[map].coloring_source() {
            ColoringSource::Palette(handle) => handle,
            ColoringSource::LabelTable(_) => return Ok(None),
        };
        for content in loaded.contents.iter_mut() {
            if content.coloring_source() == ColoringSource::Palette(handle) {
                content.invalidate_coloring();
            }
        }
        Ok(loaded.facade.xml_mut().palette_mut(handle))
    }

    /// Label table of a map, for label files.
    pub fn map_label_table(&self, map: usize) -> Result<Option<&LabelTable>> {
        let loaded = self.loaded()?;
        loaded.check_map(map)?;
        Ok(loaded.facade.label_table(map))
    }

    /// Label table of a map, for changes. The colors of the map become stale.
    pub fn map_label_table_mut(&mut self, map: usize) -> Result<Option<&mut LabelTable>> {
        let loaded = self.loaded_mut()?;
        loaded.check_map(map)?;
        if !loaded.facade.is_colored_with_label_table() {
            return Ok(None);
        }
        loaded.contents[map].invalidate_coloring();
        Ok(loaded.facade.xml_mut().label_table_mut(map))
    }

    /// Distinct label keys found in the data of a map, in increasing order.
    pub fn unique_label_keys_used_in_map(&self, map: usize) -> Result<Vec<i32>> {
        let loaded = self.loaded()?;
        loaded.check_map(map)?;
        let keys: BTreeSet<i32> = loaded.map_data(map)?.iter().map(|v| *v as i32).collect();
        Ok(keys.into_iter().collect())
    }

    /// Check the data of a label map against its label table.
    pub fn label_key_report(&self, map: usize) -> Result<LabelKeyReport> {
        let loaded = self.loaded()?;
        loaded.check_map(map)?;
        label_key_report(loaded, map)
    }

    /// State of the colors of a map.
    pub fn map_coloring_state(&self, map: usize) -> Result<ColorState> {
        let loaded = self.loaded()?;
        loaded.check_map(map)?;
        Ok(loaded.contents[map].coloring_state())
    }

    /// Colors of the values of a map, as last computed.
    pub fn map_rgba(&self, map: usize) -> Result<&[RGBA<f32>]> {
        let loaded = self.loaded()?;
        loaded.check_map(map)?;
        Ok(loaded.contents[map].rgba())
    }

    /// Recompute the colors of a map if they are stale. Returns whether
    /// they were recomputed.
    pub fn update_scalar_coloring_for_map(
        &mut self,
        map: usize,
        palettes: &PaletteFile,
    ) -> Result<bool> {
        let loaded = self.loaded_mut()?;
        loaded.check_map(map)?;
        if loaded.contents[map].coloring_state() == ColorState::Fresh {
            return Ok(false);
        }
        let data = loaded.map_data(map)?;
        let LoadedFile {
            facade, contents, ..
        } = loaded;
        Ok(contents[map].update_coloring(&data, facade.xml(), Some(palettes)))
    }

    /// Mark the colors of every map stale.
    pub fn invalidate_coloring(&mut self) {
        if let Some(loaded) = self.loaded.as_mut() {
            for content in loaded.contents.iter_mut() {
                content.invalidate_coloring();
            }
        }
    }

    // Volume

    /// Whether any voxel maps to data.
    pub fn is_volume_mappable(&self) -> bool {
        self.loaded
            .as_ref()
            .map(|l| l.indexer.is_valid())
            .unwrap_or(false)
    }

    /// Geometry of the voxel grid.
    pub fn volume_geometry(&self) -> Option<&VolumeGeometry> {
        self.loaded.as_ref().and_then(|l| l.indexer.geometry())
    }

    /// Dimensions of the volume as `(i, j, k, time, components)`, all zero
    /// when the file has no voxel data.
    pub fn dimensions(&self) -> [i64; 5] {
        match self.volume_geometry() {
            Some(g) if self.is_volume_mappable() => {
                let [i, j, k] = g.dims();
                [i, j, k, 1, 1]
            }
            _ => [0; 5],
        }
    }

    /// Spatial coordinate of a voxel.
    pub fn index_to_space(&self, ijk: [i64; 3]) -> Option<[f32; 3]> {
        self.volume_geometry().map(|g| g.index_to_space(ijk))
    }

    /// Indices of the voxel enclosing a coordinate.
    pub fn enclosing_voxel(&self, xyz: [f32; 3]) -> Option<[i64; 3]> {
        self.volume_geometry().map(|g| g.enclosing_voxel(xyz))
    }

    /// Whether the voxel indices lie within the volume.
    pub fn index_valid(&self, ijk: [i64; 3]) -> bool {
        self.volume_geometry()
            .map(|g| g.index_valid(ijk))
            .unwrap_or(false)
    }

    /// Bounding box of the voxel grid, invalid when there is no volume.
    pub fn voxel_space_bounding_box(&self) -> BoundingBox {
        self.volume_geometry()
            .map(|g| g.bounding_box())
            .unwrap_or_default()
    }

    /// Colors of a slice of the volume in a map, as last computed.
    ///
    /// `rgba_out` holds one color per voxel of the slice, the first free axis
    /// varying fastest: `(i, j)` for axial, `(i, k)` for coronal and `(j, k)`
    /// for parasagittal slices. It is cleared first; voxels without data stay
    /// transparent.
    pub fn voxel_colors_for_slice_in_map(
        &self,
        map: usize,
        plane: SlicePlane,
        slice: i64,
        rgba_out: &mut [RGBA<u8>],
    ) {
        for c in rgba_out.iter_mut() {
            *c = RGBA::new(0, 0, 0, 0);
        }
        let loaded = match self.loaded.as_ref() {
            Some(l) if l.indexer.is_valid() => l,
            _ => return,
        };
        if loaded.check_map(map).is_err() {
            return;
        }
        let geometry = match loaded.indexer.geometry() {
            Some(g) => g,
            None => return,
        };
        let [di, dj, dk] = geometry.dims();
        let (slice_dim, width, height) = match plane {
            SlicePlane::Axial => (dk, di, dj),
            SlicePlane::Coronal => (dj, di, dk),
            SlicePlane::Parasagittal => (di, dj, dk),
        };
        if slice < 0 || slice >= slice_dim {
            return;
        }

        let map_rgba = loaded.contents[map].rgba();
        for v in 0..height {
            for u in 0..width {
                let ijk = match plane {
                    SlicePlane::Axial => [u, v, slice],
                    SlicePlane::Coronal => [u, slice, v],
                    SlicePlane::Parasagittal => [slice, u, v],
                };
                let out = match rgba_out.get_mut((v * width + u) as usize) {
                    Some(out) => out,
                    None => return,
                };
                if let Some(offset) = loaded.indexer.offset(ijk) {
                    if let Some(c) = map_rgba.get(offset) {
                        *out = to_rgba8(*c);
                    }
                }
            }
        }
    }

    /// Color of a voxel in a map, transparent when the voxel has no data.
    pub fn voxel_color_in_map(&self, ijk: [i64; 3], map: usize) -> RGBA<u8> {
        let transparent = RGBA::new(0, 0, 0, 0);
        let loaded = match self.loaded.as_ref() {
            Some(l) => l,
            None => return transparent,
        };
        if loaded.check_map(map).is_err() {
            return transparent;
        }
        loaded
            .indexer
            .offset(ijk)
            .and_then(|offset| loaded.contents[map].rgba().get(offset))
            .map(|c| to_rgba8(*c))
            .unwrap_or(transparent)
    }

    /// Value of the voxel enclosing a coordinate in a map, or `None` when
    /// the voxel has no data.
    pub fn map_volume_voxel_value(&self, map: usize, xyz: [f32; 3]) -> Result<Option<VoxelValue>> {
        let loaded = self.loaded()?;
        loaded.check_map(map)?;
        if !loaded.indexer.is_valid() {
            return Ok(None);
        }
        let geometry = match loaded.indexer.geometry() {
            Some(g) => g,
            None => return Ok(None),
        };
        let ijk = geometry.enclosing_voxel(xyz);
        if !geometry.index_valid(ijk) {
            return Ok(None);
        }
        let offset = match loaded.indexer.offset(ijk) {
            Some(o) => o,
            None => return Ok(None),
        };
        let value = match loaded.facade.map_value(map, offset)? {
            Some(v) => v,
            None => return Ok(None),
        };
        let text = if loaded.facade.is_colored_with_label_table() {
            loaded
                .label_name(map, value)
                .unwrap_or(INVALID_LABEL_TEXT)
                .to_string()
        } else {
            format_numeric(value)
        };
        Ok(Some(VoxelValue { ijk, value, text }))
    }

    // Surface

    /// Number of nodes of a surface as declared by the file.
    pub fn surface_number_of_nodes(&self, structure: Structure) -> Option<usize> {
        self.loaded
            .as_ref()
            .and_then(|l| l.facade.surface_number_of_nodes(structure))
    }

    /// Value of a surface node in a map, or `None` when the node has no data
    /// or the surface does not have `number_of_nodes` nodes.
    ///
    /// Nodes of parcel files are described by the name of their parcel.
    pub fn map_surface_node_value(
        &self,
        map: usize,
        structure: Structure,
        node: i64,
        number_of_nodes: usize,
    ) -> Result<Option<NodeValue>> {
        let loaded = self.loaded()?;
        loaded.check_map(map)?;
        let facade = &loaded.facade;
        if facade.surface_number_of_nodes(structure) != Some(number_of_nodes) {
            return Ok(None);
        }
        let index = match facade.index_for_node(structure, node) {
            Some(i) => i,
            None => return Ok(None),
        };
        let value = facade.map_value(map, index)?;
        if let Some(parcel) = facade.brainordinate_mapping().parcel_name(index) {
            return Ok(Some(NodeValue {
                value,
                text: parcel.to_string(),
            }));
        }
        Ok(value.map(|v| NodeValue {
            value: Some(v),
            text: format_numeric(v),
        }))
    }

    /// Colors and values of every node of a surface in a map.
    ///
    /// `rgba_out` and `values_out` hold one entry per node. Nodes without
    /// data get the alpha [`NO_DATA_ALPHA`] and the value zero. Returns
    /// whether any node has data; nothing is written when the surface does
    /// not have `number_of_nodes` nodes or the map has no data.
    ///
    /// [`NO_DATA_ALPHA`]: ./constant.NO_DATA_ALPHA.html
    pub fn map_surface_node_coloring(
        &self,
        map: usize,
        structure: Structure,
        number_of_nodes: usize,
        rgba_out: &mut [RGBA<f32>],
        values_out: &mut [f32],
    ) -> Result<bool> {
        let loaded = self.loaded()?;
        loaded.check_map(map)?;
        let indices = match loaded.facade.surface_data_indices(structure, number_of_nodes) {
            Some(indices) => indices,
            None => return Ok(false),
        };
        let data = loaded.map_data(map)?;
        if data.is_empty() {
            return Ok(false);
        }
        let map_rgba = loaded.contents[map].rgba();
        let mut valid = false;
        for ((index, rgba), value) in indices
            .iter()
            .zip(rgba_out.iter_mut())
            .zip(values_out.iter_mut())
        {
            let found = if *index >= 0 {
                let i = *index as usize;
                map_rgba.get(i).and_then(|c| data.get(i).map(|v| (*c, *v)))
            } else {
                None
            };
            match found {
                Some((c, v)) => {
                    *rgba = c;
                    *value = v;
                    valid = true;
                }
                None => {
                    *rgba = RGBA::new(0., 0., 0., NO_DATA_ALPHA);
                    *value = 0.;
                }
            }
        }
        Ok(valid)
    }

    /// Identification text of a surface node over several maps, or `None`
    /// when no map has a value for the node.
    ///
    /// Connectivity files describe the node in each map. Other files use
    /// the node's series data: label files give the label name of each
    /// value, or `InvalidKey=<value>` for keys without a label.
    pub fn map_surface_node_identification_for_maps(
        &self,
        maps: &[usize],
        structure: Structure,
        node: i64,
        number_of_nodes: usize,
    ) -> Result<Option<String>> {
        let loaded = self.loaded()?;
        let mut parts = Vec::with_capacity(maps.len());
        if self.kind.is_connectivity() {
            for &map in maps {
                if let Some(v) = self.map_surface_node_value(map, structure, node, number_of_nodes)?
                {
                    parts.push(v.text);
                }
            }
        } else {
            let series = match self.series_data_for_surface_node(structure, node)? {
                Some(series) => series,
                None => return Ok(None),
            };
            for &map in maps {
                loaded.check_map(map)?;
                let value = match series.get(map) {
                    Some(v) => *v,
                    None => continue,
                };
                if loaded.facade.is_colored_with_label_table() {
                    parts.push(match loaded.label_name(map, value) {
                        Some(name) => name.to_string(),
                        None => format!("InvalidKey={}", format_numeric(value)),
                    });
                } else {
                    parts.push(format_numeric(value));
                }
            }
        }
        if parts.is_empty() {
            Ok(None)
        } else {
            Ok(Some(parts.join(" ")))
        }
    }

    /// One value per map for a surface node, for files whose maps are
    /// columns.
    pub fn series_data_for_surface_node(
        &self,
        structure: Structure,
        node: i64,
    ) -> Result<Option<Vec<f32>>> {
        let loaded = self.loaded()?;
        let mut data = Vec::new();
        if loaded
            .facade
            .series_data_for_surface_node(structure, node, &mut data)?
        {
            Ok(Some(data))
        } else {
            Ok(None)
        }
    }

    // Connectivity

    /// Load the row of a surface node as the map of a connectivity file.
    /// Returns whether a row was found; if not, the loaded row is cleared.
    pub fn load_row_for_surface_node(
        &mut self,
        structure: Structure,
        node: i64,
        number_of_nodes: usize,
    ) -> Result<bool> {
        let loaded = self.loaded_mut()?;
        let row = loaded
            .facade
            .row_for_surface_node(structure, node, number_of_nodes);
        load_row(loaded, row)
    }

    /// Load the row of the voxel enclosing a coordinate as the map of a
    /// connectivity file. Returns whether a row was found; if not, the
    /// loaded row is cleared.
    pub fn load_row_for_voxel_at_coordinate(&mut self, xyz: [f32; 3]) -> Result<bool> {
        let loaded = self.loaded_mut()?;
        let row = loaded.facade.row_for_voxel_at_coordinate(xyz);
        load_row(loaded, row)
    }

    /// Forget the loaded row of a connectivity file.
    pub fn clear_loaded_row(&mut self) {
        if let Some(loaded) = self.loaded.as_mut() {
            if loaded.facade.kind().is_connectivity() {
                loaded.facade.clear_loaded_row();
                for content in loaded.contents.iter_mut() {
                    content.invalidate_data();
                }
            }
        }
    }

    /// Row of the matrix loaded as the map of a connectivity file.
    pub fn loaded_row_index(&self) -> Option<usize> {
        self.loaded
            .as_ref()
            .and_then(|l| l.facade.loaded_row_index())
    }

    // Series

    /// Value and spacing of the maps of series files, `(1, 1)` otherwise.
    pub fn map_interval_start_and_step(&self) -> (f32, f32) {
        self.loaded
            .as_ref()
            .map(|l| {
                let (start, step, _) = l.facade.map_interval();
                (start, step)
            })
            .unwrap_or((1., 1.))
    }

    /// Units of the map interval.
    pub fn map_interval_units(&self) -> TimeUnits {
        self.loaded
            .as_ref()
            .map(|l| l.facade.map_interval().2)
            .unwrap_or(TimeUnits::Unknown)
    }

    // Status

    /// Whether data, metadata, palette settings, label tables or map names
    /// changed since the file was read or last saved.
    pub fn is_modified(&self) -> bool {
        match self.loaded.as_ref() {
            Some(l) => {
                let xml = l.facade.xml();
                l.data_modified
                    || xml.file_metadata.is_modified()
                    || l.contents.iter().any(|c| c.is_modified_status(xml))
            }
            None => false,
        }
    }

    /// Forget about previous changes.
    pub fn clear_modified(&mut self) {
        if let Some(loaded) = self.loaded.as_mut() {
            let LoadedFile {
                facade,
                contents,
                data_modified,
                ..
            } = &mut **loaded;
            *data_modified = false;
            let xml = facade.xml_mut();
            xml.file_metadata.clear_modified();
            for content in contents.iter_mut() {
                content.clear_modified_status(xml);
            }
        }
    }

    /// Write the file.
    ///
    /// Map names and metadata are stored back into the matrix description
    /// before `format` writes the header.
    ///
    /// # Errors
    ///
    /// - `CiftiError::NotWritableByDesign` for dense connectivity files.
    /// - `CiftiError::NotWritableInCurrentState` when no file is loaded or
    ///   it was read from the network.
    pub fn write_file<P: AsRef<Path>>(&mut self, path: P, format: &dyn MatrixFormat) -> Result<()> {
        if self.kind.file_reading() == FileReading::ReadAsNeeded {
            return Err(CiftiError::NotWritableByDesign(self.kind));
        }
        let loaded = match self.loaded.as_mut() {
            Some(l) => l,
            None => return Err(CiftiError::NotWritableInCurrentState("no file is loaded")),
        };
        if loaded.remote {
            return Err(CiftiError::NotWritableInCurrentState(
                "it was read from the network",
            ));
        }

        let LoadedFile {
            facade, contents, ..
        } = &mut **loaded;
        if let Some(maps) = facade.xml_mut().along_row.named_maps_mut() {
            for (named, content) in maps.iter_mut().zip(contents.iter()) {
                named.name = content.name().to_string();
                named.metadata.replace(content.metadata());
            }
        }
        let matrix = facade.storage().in_memory().ok_or(
            CiftiError::NotWritableInCurrentState("the matrix is read from disk as needed"),
        )?;
        write_cifti(&path, format, facade.xml(), matrix)?;

        self.name = path.as_ref().to_string_lossy().into_owned();
        self.clear_modified();
        Ok(())
    }
}

fn fetch_map_data(facade: &CiftiFacade, map: usize) -> Result<Vec<f32>> {
    let mut data = Vec::new();
    facade.map_data(map, &mut data)?;
    Ok(data)
}

fn new_map_content(facade: &CiftiFacade, map: usize, file_name: &str, buckets: usize) -> MapContent {
    let xml = facade.xml();
    let named = xml.along_row.named_maps().and_then(|maps| maps.get(map));
    let name = match named {
        Some(named) => named.name.clone(),
        None if xml.along_row.index_type() == IndexType::TimePoints => {
            let (start, step, _) = facade.map_interval();
            format_numeric(start + step * map as f32)
        }
        None => file_name.to_string(),
    };
    let metadata = named.map(|n| n.metadata.clone()).unwrap_or_default();
    let source = if facade.is_colored_with_label_table() {
        ColoringSource::LabelTable(map)
    } else {
        ColoringSource::Palette(facade.palette_handle(map))
    };
    MapContent::new(facade.map_data_count(), name, metadata, source, buckets)
}

fn load_row(loaded: &mut LoadedFile, row: Option<usize>) -> Result<bool> {
    if !loaded.facade.kind().is_connectivity() {
        return Ok(false);
    }
    let found = match row {
        Some(row) => {
            loaded.facade.load_row(row)?;
            true
        }
        None => {
            loaded.facade.clear_loaded_row();
            false
        }
    };
    for content in loaded.contents.iter_mut() {
        content.invalidate_data();
    }
    Ok(found)
}

fn label_key_report(loaded: &LoadedFile, map: usize) -> Result<LabelKeyReport> {
    let table = match loaded.facade.label_table(map) {
        Some(t) => t,
        None => return Ok(LabelKeyReport::default()),
    };
    let used: BTreeSet<i32> = loaded.map_data(map)?.iter().map(|v| *v as i32).collect();
    let known: BTreeSet<i32> = table.keys_and_names().map(|(k, _)| k).collect();
    Ok(LabelKeyReport {
        missing_keys: used.difference(&known).cloned().collect(),
        unused_keys: known.difference(&used).cloned().collect(),
    })
}

/// Check a matrix description against the contract of a file kind,
/// returning a message for every failed check.
fn validate(kind: CiftiFileKind, xml: &CiftiXml, layout: &MatrixLayout) -> Vec<String> {
    let mut messages = Vec::new();

    let along_row = xml.along_row.index_type();
    let along_column = xml.along_column.index_type();
    let row_ok = along_row == kind.required_along_row();
    let column_ok = along_column == kind.required_along_column();
    if !row_ok {
        messages.push(format!(
            "Row Index Type should be {} but is {}",
            kind.required_along_row(),
            along_row
        ));
    }
    if !column_ok {
        messages.push(format!(
            "Column Index Type should be {} but is {}",
            kind.required_along_column(),
            along_column
        ));
    }

    if layout.rows != xml.number_of_rows() {
        messages.push(format!(
            "Matrix has {} rows but the column mapping describes {}",
            layout.rows,
            xml.number_of_rows()
        ));
    }
    if layout.columns != xml.number_of_columns() {
        messages.push(format!(
            "Matrix has {} columns but the row mapping describes {}",
            layout.columns,
            xml.number_of_columns()
        ));
    }

    if row_ok {
        if kind.is_colored_with_label_table() {
            for map in 0..xml.number_of_columns() {
                if xml.label_table(map).is_none() {
                    messages.push(format!("Map {} has no label table", map));
                }
            }
        } else if kind.has_map_attributes() {
            for map in 0..xml.number_of_columns() {
                if xml.palette(PaletteHandle::Map(map)).is_none() {
                    messages.push(format!("Map {} has no palette color mapping", map));
                }
            }
        } else if xml.file_palette.is_none() {
            messages.push("File has no palette color mapping".to_string());
        }
    }

    messages
}
