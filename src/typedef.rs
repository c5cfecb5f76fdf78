//! This module contains the closed enumerations used across the crate.
//! Most of them mirror a concept of the CIFTI standard (index types,
//! structures, time units); the rest describe how a particular file kind
//! is accessed. Integer codes can be converted to these types and vice-versa.

use std::fmt;

/// The kind of indexing applied along one dimension of a CIFTI matrix.
#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy, FromPrimitive)]
pub enum IndexType {
    /// No valid indexing.
    Invalid = -1,
    /// Surface vertices and volume voxels.
    BrainModels = 0,
    /// Fiber orientations.
    Fibers = 1,
    /// Parcels, each a named group of brainordinates.
    Parcels = 2,
    /// Series of time points (or any regularly spaced samples).
    TimePoints = 3,
    /// Named scalar maps.
    Scalars = 4,
    /// Named label maps.
    Labels = 5,
}

impl IndexType {
    /// The name used for this index type in diagnostics.
    pub fn name(self) -> &'static str {
        use IndexType::*;
        match self {
            Invalid => "CIFTI_INDEX_TYPE_INVALID",
            BrainModels => "CIFTI_INDEX_TYPE_BRAIN_MODELS",
            Fibers => "CIFTI_INDEX_TYPE_FIBERS",
            Parcels => "CIFTI_INDEX_TYPE_PARCELS",
            TimePoints => "CIFTI_INDEX_TYPE_TIME_POINTS",
            Scalars => "CIFTI_INDEX_TYPE_SCALARS",
            Labels => "CIFTI_INDEX_TYPE_LABELS",
        }
    }
}

impl fmt::Display for IndexType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Which physical access retrieves the data of one map.
#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy)]
pub enum DataAccess {
    /// The data cannot be accessed this way.
    Invalid,
    /// One map is one column of the matrix.
    WithColumnMethods,
    /// One map is one row of the matrix.
    WithRowMethods,
}

/// How much of the matrix is read when the file is opened.
#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy)]
pub enum FileReading {
    /// The whole matrix is loaded into memory.
    ReadAll,
    /// Rows are read from disk when they are needed.
    ReadAsNeeded,
}

/// The closed set of CIFTI file kinds handled by a `MappableFile`.
///
/// Each kind fixes the index types required along both dimensions, the
/// reading policy and the way a map's data is accessed.
#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy)]
pub enum CiftiFileKind {
    /// Dense connectivity (`.dconn.nii`).
    DenseConnectivity,
    /// Parcel to parcel connectivity (`.pconn.nii`).
    ParcelConnectivity,
    /// One row per parcel, dense columns (`.dpconn.nii`).
    DenseParcelConnectivity,
    /// One row per brainordinate, parcel columns (`.pdconn.nii`).
    ParcelDenseConnectivity,
    /// Dense scalar maps (`.dscalar.nii`).
    DenseScalar,
    /// Dense label maps (`.dlabel.nii`).
    DenseLabel,
    /// Dense data series (`.dtseries.nii`).
    DenseTimeSeries,
    /// Parcel scalar maps (`.pscalar.nii`).
    ParcelScalar,
    /// Parcel data series (`.ptseries.nii`).
    ParcelSeries,
}

impl CiftiFileKind {
    /// Index type required along the rows (one entry per column).
    pub fn required_along_row(self) -> IndexType {
        use CiftiFileKind::*;
        match self {
            DenseConnectivity | DenseParcelConnectivity => IndexType::BrainModels,
            ParcelConnectivity | ParcelDenseConnectivity => IndexType::Parcels,
            DenseScalar | ParcelScalar => IndexType::Scalars,
            DenseLabel => IndexType::Labels,
            DenseTimeSeries | ParcelSeries => IndexType::TimePoints,
        }
    }

    /// Index type required along the columns (one entry per row).
    pub fn required_along_column(self) -> IndexType {
        use CiftiFileKind::*;
        match self {
            DenseConnectivity | ParcelDenseConnectivity => IndexType::BrainModels,
            DenseScalar | DenseLabel | DenseTimeSeries => IndexType::BrainModels,
            ParcelConnectivity | DenseParcelConnectivity => IndexType::Parcels,
            ParcelScalar | ParcelSeries => IndexType::Parcels,
        }
    }

    /// The reading policy of this kind.
    pub fn file_reading(self) -> FileReading {
        match self {
            CiftiFileKind::DenseConnectivity => FileReading::ReadAsNeeded,
            _ => FileReading::ReadAll,
        }
    }

    /// How the brainordinate data of one map is accessed.
    pub fn brainordinate_access(self) -> DataAccess {
        if self.is_connectivity() {
            DataAccess::WithRowMethods
        } else {
            DataAccess::WithColumnMethods
        }
    }

    /// How the series (one value per map) of a brainordinate is accessed.
    pub fn series_access(self) -> DataAccess {
        if self.is_connectivity() {
            DataAccess::Invalid
        } else {
            DataAccess::WithRowMethods
        }
    }

    /// Whether the single map of this kind is a row loaded on request.
    pub fn is_connectivity(self) -> bool {
        use CiftiFileKind::*;
        match self {
            DenseConnectivity
            | ParcelConnectivity
            | DenseParcelConnectivity
            | ParcelDenseConnectivity => true,
            DenseScalar | DenseLabel | DenseTimeSeries | ParcelScalar | ParcelSeries => false,
        }
    }

    /// Whether every map carries its own name, metadata and coloring.
    pub fn has_map_attributes(self) -> bool {
        use CiftiFileKind::*;
        match self {
            DenseScalar | DenseLabel | ParcelScalar => true,
            _ => false,
        }
    }

    /// Whether maps are colored by label key instead of by palette.
    pub fn is_colored_with_label_table(self) -> bool {
        self == CiftiFileKind::DenseLabel
    }

    /// A human readable name of the kind.
    pub fn gui_name(self) -> &'static str {
        use CiftiFileKind::*;
        match self {
            DenseConnectivity => "Connectivity - Dense",
            ParcelConnectivity => "Connectivity - Parcel",
            DenseParcelConnectivity => "Connectivity - Dense Parcel",
            ParcelDenseConnectivity => "Connectivity - Parcel Dense",
            DenseScalar => "Connectivity - Dense Scalar",
            DenseLabel => "Connectivity - Dense Label",
            DenseTimeSeries => "Connectivity - Dense Data Series",
            ParcelScalar => "Connectivity - Parcel Scalar",
            ParcelSeries => "Connectivity - Parcel Series",
        }
    }

    /// The conventional file name suffix of the kind.
    pub fn extension(self) -> &'static str {
        use CiftiFileKind::*;
        match self {
            DenseConnectivity => "dconn.nii",
            ParcelConnectivity => "pconn.nii",
            DenseParcelConnectivity => "dpconn.nii",
            ParcelDenseConnectivity => "pdconn.nii",
            DenseScalar => "dscalar.nii",
            DenseLabel => "dlabel.nii",
            DenseTimeSeries => "dtseries.nii",
            ParcelScalar => "pscalar.nii",
            ParcelSeries => "ptseries.nii",
        }
    }
}

/// Anatomical structure of a brain model.
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Clone, Copy, FromPrimitive)]
#[allow(missing_docs)]
pub enum Structure {
    All = 0,
    CortexLeft = 1,
    CortexRight = 2,
    Cerebellum = 3,
    AccumbensLeft = 4,
    AccumbensRight = 5,
    AmygdalaLeft = 6,
    AmygdalaRight = 7,
    BrainStem = 8,
    CaudateLeft = 9,
    CaudateRight = 10,
    CerebellumLeft = 11,
    CerebellumRight = 12,
    DiencephalonVentralLeft = 13,
    DiencephalonVentralRight = 14,
    HippocampusLeft = 15,
    HippocampusRight = 16,
    PallidumLeft = 17,
    PallidumRight = 18,
    PutamenLeft = 19,
    PutamenRight = 20,
    ThalamusLeft = 21,
    ThalamusRight = 22,
    Other = 23,
}

/// Units of the interval between consecutive maps of a series.
#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy, FromPrimitive)]
pub enum TimeUnits {
    /// NIFTI_UNITS_UNKNOWN
    Unknown = 0,
    /// NIFTI_UNITS_SEC
    Seconds = 8,
    /// NIFTI_UNITS_MSEC
    Milliseconds = 16,
    /// NIFTI_UNITS_USEC
    Microseconds = 24,
    /// NIFTI_UNITS_HZ
    Hertz = 32,
}

/// A plane cutting through the volume, named by the axis it is normal to.
#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy)]
pub enum SlicePlane {
    /// Normal to k: the free axes are i and j.
    Axial,
    /// Normal to j: the free axes are i and k.
    Coronal,
    /// Normal to i: the free axes are j and k.
    Parasagittal,
}

/// Direction of a voxel index axis in space.
#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy, FromPrimitive)]
#[allow(missing_docs)]
pub enum Orientation {
    LeftToRight = 1,
    RightToLeft = 2,
    PosteriorToAnterior = 3,
    AnteriorToPosterior = 4,
    InferiorToSuperior = 5,
    SuperiorToInferior = 6,
}

impl Orientation {
    /// The spatial axis (0 = x, 1 = y, 2 = z) this orientation runs along.
    pub fn spatial_axis(self) -> usize {
        use Orientation::*;
        match self {
            LeftToRight | RightToLeft => 0,
            PosteriorToAnterior | AnteriorToPosterior => 1,
            InferiorToSuperior | SuperiorToInferior => 2,
        }
    }

    /// `1.0` if increasing index increases the coordinate, `-1.0` otherwise.
    pub fn sign(self) -> f32 {
        use Orientation::*;
        match self {
            LeftToRight | PosteriorToAnterior | InferiorToSuperior => 1.0,
            RightToLeft | AnteriorToPosterior | SuperiorToInferior => -1.0,
        }
    }
}
