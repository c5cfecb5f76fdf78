//! Types for error handling go here.
use crate::typedef::CiftiFileKind;
use std::io::Error as IOError;

quick_error! {
    /// Error type for all error variants originated by this crate.
    #[derive(Debug)]
    pub enum CiftiError {
        /// The file failed one or more validation checks while being opened.
        /// Every failed check is listed, in the order it was made.
        Validation(file_name: String, messages: Vec<String>) {
            display("{}\n{}", file_name, messages.join("\n"))
        }
        /// The file kind must be read on demand, which is impossible for
        /// files on the network.
        RemoteReadAsNeeded(name: String, kind: CiftiFileKind) {
            display("{} of type {} cannot be read over the network. The file must be \
                     accessed by reading individual rows and/or columns and this cannot \
                     be performed over a network.", name, kind.gui_name())
        }
        /// Files of this kind are never written.
        NotWritableByDesign(kind: CiftiFileKind) {
            display("{} files cannot be written due to their large sizes", kind.gui_name())
        }
        /// The file could be written, but not in its present state.
        NotWritableInCurrentState(reason: &'static str) {
            display("file cannot be written because {}", reason)
        }
        /// The operation requires a loaded file.
        NoFileLoaded {
            display("no file is loaded")
        }
        /// A compressed data source cannot be read on demand.
        RandomAccessCompressed {
            display("compressed matrix data cannot be accessed at random")
        }
        /// The data layout does not describe the declared matrix.
        InconsistentLayout(rows: usize, columns: usize, available: u64) {
            display("layout of {}x{} does not fit in {} bytes of matrix data", rows, columns, available)
        }
        /// The volume geometry does not align its axes with x, y and z.
        NonPlumbOrientation {
            display("volume orientation is not plumb")
        }
        /// A voxel spacing is zero or not finite.
        DegenerateSpacing {
            display("voxel spacing must be finite and non-zero")
        }
        /// The voxel grid has more voxels than can be indexed.
        VolumeTooLarge(dims: [i64; 3]) {
            display("volume of {}x{}x{} voxels is too large to be indexed", dims[0], dims[1], dims[2])
        }
        /// Replacement data does not have as many elements as the map.
        DataLengthMismatch(expected: usize, got: usize) {
            display("expected {} data elements, got {}", expected, got)
        }
        /// A map index beyond the number of maps of the file.
        InvalidMapIndex(index: usize, count: usize) {
            display("map index {} is invalid, the file has {} maps", index, count)
        }
        /// The file is on the network and no way to fetch it was given.
        RemoteFetchUnavailable(name: String) {
            display("{} is on the network but no remote fetcher was provided", name)
        }
        /// I/O Error
        Io(err: IOError) {
            from()
            source(err)
            display("I/O error: {}", err)
        }
    }
}

/// Alias type for results originated from this crate.
pub type Result<T> = ::std::result::Result<T, CiftiError>;

#[cfg(test)]
mod tests {
    use super::CiftiError;

    #[test]
    fn validation_lists_every_message() {
        let err = CiftiError::Validation(
            "a.dscalar.nii".to_string(),
            vec!["first".to_string(), "second".to_string()],
        );
        assert_eq!(err.to_string(), "a.dscalar.nii\nfirst\nsecond");
    }
}
