//! Access to the maps of CIFTI mappable data files.
//!
//! A CIFTI file holds a two dimensional matrix of data whose rows and
//! columns are described by index maps, tying indices to surface nodes,
//! voxels and parcels (the brainordinates), or naming them as scalar, label
//! or series maps. This crate opens such files by kind, validates their
//! description, and exposes their data as maps: statistics and histograms
//! computed on request, palette and label coloring, voxel lookups by
//! coordinate and surface node lookups by structure.
//!
//! # Example
//!
//! ```no_run
//! use cifti_mappable::{CiftiFileKind, FileSource, MappableFile, PaletteFile};
//! # use cifti_mappable::{MatrixFormat, Result};
//! # fn run(format: &dyn MatrixFormat) -> Result<()> {
//! let mut file = MappableFile::new(CiftiFileKind::DenseScalar);
//! file.read(&FileSource::from_name("thickness.dscalar.nii"), format, None)?;
//! let stats = file.map_statistics(0)?;
//! println!("mean thickness: {}", stats.mean());
//! let _ = file.update_scalar_coloring_for_map(0, &PaletteFile::with_default_palettes())?;
//! # Ok(())
//! # }
//! ```
//!
//! The byte format of the header is not handled here: a [`MatrixFormat`]
//! provides the description of the matrix and where its data lies, and this
//! crate reads the data itself.
//!
//! [`MatrixFormat`]: ./file/trait.MatrixFormat.html
#![deny(missing_debug_implementations)]
#![warn(missing_docs, unused_extern_crates, trivial_casts, unused_results)]

#[macro_use]
extern crate quick_error;
#[macro_use]
extern crate num_derive;

pub mod coloring;
pub mod content;
pub mod error;
pub mod facade;
pub mod file;
pub mod geometry;
pub mod indexer;
pub mod label;
pub mod mapping;
pub mod metadata;
pub mod palette;
pub mod stats;
pub mod storage;
pub mod typedef;
mod util;
pub mod writer;

pub use crate::content::{ColorState, MapContent};
pub use crate::error::{CiftiError, Result};
pub use crate::file::{
    FileSource, LabelKeyReport, MappableFile, MatrixFormat, NodeValue, ReaderOptions,
    RemoteFetcher, VoxelValue,
};
pub use crate::geometry::{BoundingBox, VolumeGeometry};
pub use crate::indexer::SparseVoxelIndexer;
pub use crate::label::{Label, LabelTable};
pub use crate::mapping::CiftiXml;
pub use crate::metadata::MetaData;
pub use crate::palette::{PaletteColorMapping, PaletteFile, PaletteScaleMode};
pub use crate::stats::{DescriptiveStatistics, FastStatistics, Histogram, RangeFilter};
pub use crate::storage::{InMemMatrix, MatrixLayout};
pub use crate::typedef::{CiftiFileKind, IndexType, SlicePlane, Structure, TimeUnits};
pub use crate::util::format_numeric;
pub use byteordered::Endianness;
