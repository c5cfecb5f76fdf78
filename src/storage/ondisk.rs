//! Matrix data read from its source on request.

use super::{to_native, MatrixLayout};
use crate::error::{CiftiError, Result};
use crate::util::{is_gz_file, ReadSeek};
use byteordered::ByteOrdered;
use std::cell::RefCell;
use std::fmt;
use std::fs::File;
use std::io::{BufReader, Read, Seek, SeekFrom};
use std::path::Path;

/// A data matrix left in its source, of which rows and columns are read
/// when asked for. Used for files too large to be held in memory.
pub struct OnDiskMatrix {
    source: RefCell<Box<dyn ReadSeek>>,
    layout: MatrixLayout,
}

impl fmt::Debug for OnDiskMatrix {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("OnDiskMatrix")
            .field("layout", &self.layout)
            .finish()
    }
}

impl OnDiskMatrix {
    /// Keep a seekable source of matrix data.
    ///
    /// # Errors
    ///
    /// `CiftiError::InconsistentLayout` if the source is too short to hold
    /// the matrix described by `layout`.
    pub fn from_source<S>(mut source: S, layout: MatrixLayout) -> Result<Self>
    where
        S: ReadSeek + 'static,
    {
        let available = source.seek(SeekFrom::End(0))?;
        layout.check_fits(available)?;
        Ok(OnDiskMatrix {
            source: RefCell::new(Box::new(source)),
            layout,
        })
    }

    /// Open a file of matrix data.
    ///
    /// # Errors
    ///
    /// `CiftiError::RandomAccessCompressed` if the file is Gzip compressed.
    pub fn from_file<P>(path: P, layout: MatrixLayout) -> Result<Self>
    where
        P: AsRef<Path>,
    {
        if is_gz_file(&path) {
            return Err(CiftiError::RandomAccessCompressed);
        }
        let file = BufReader::new(File::open(path)?);
        OnDiskMatrix::from_source(file, layout)
    }

    /// The layout of the matrix in its source.
    pub fn layout(&self) -> &MatrixLayout {
        &self.layout
    }

    pub(crate) fn read_row(&self, row: usize, out: &mut Vec<f32>) -> Result<()> {
        let mut source = self.source.borrow_mut();
        let _ = source.seek(SeekFrom::Start(self.layout.element_offset(row, 0)))?;
        out.clear();
        out.resize(self.layout.columns, 0.);
        source.read_exact(bytemuck::cast_slice_mut(&mut out[..]))?;
        to_native(out, self.layout.endianness);
        Ok(())
    }

    pub(crate) fn read_column(&self, column: usize, out: &mut Vec<f32>) -> Result<()> {
        let mut source = self.source.borrow_mut();
        out.clear();
        out.reserve(self.layout.rows);
        for row in 0..self.layout.rows {
            out.push(read_f32_at(&mut **source, &self.layout, row, column)?);
        }
        Ok(())
    }

    pub(crate) fn read_element(&self, row: usize, column: usize) -> Result<Option<f32>> {
        if row >= self.layout.rows || column >= self.layout.columns {
            return Ok(None);
        }
        let mut source = self.source.borrow_mut();
        read_f32_at(&mut **source, &self.layout, row, column).map(Some)
    }
}

fn read_f32_at(
    source: &mut dyn ReadSeek,
    layout: &MatrixLayout,
    row: usize,
    column: usize,
) -> Result<f32> {
    let _ = source.seek(SeekFrom::Start(layout.element_offset(row, column)))?;
    Ok(ByteOrdered::runtime(source, layout.endianness).read_f32()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use byteordered::Endianness;
    use std::io::Cursor;

    fn source(endianness: Endianness) -> Cursor<Vec<u8>> {
        let mut bytes = vec![0u8; 4];
        {
            let mut w = ByteOrdered::runtime(&mut bytes, endianness);
            for v in 0..6 {
                w.write_f32(v as f32).unwrap();
            }
        }
        Cursor::new(bytes)
    }

    #[test]
    fn rows_and_columns() {
        for &e in &[Endianness::Little, Endianness::Big] {
            let layout = MatrixLayout {
                rows: 3,
                columns: 2,
                data_offset: 4,
                endianness: e,
            };
            let m = OnDiskMatrix::from_source(source(e), layout).unwrap();
            let mut out = Vec::new();
            m.read_row(1, &mut out).unwrap();
            assert_eq!(out, vec![2., 3.]);
            m.read_column(1, &mut out).unwrap();
            assert_eq!(out, vec![1., 3., 5.]);
            assert_eq!(m.read_element(2, 0).unwrap(), Some(4.));
            assert_eq!(m.read_element(3, 0).unwrap(), None);
            assert_eq!(m.read_element(0, 2).unwrap(), None);
        }
    }

    #[test]
    fn too_short() {
        let layout = MatrixLayout {
            rows: 4,
            columns: 2,
            data_offset: 4,
            endianness: Endianness::Little,
        };
        assert!(matches!(
            OnDiskMatrix::from_source(source(Endianness::Little), layout),
            Err(CiftiError::InconsistentLayout(4, 2, 24))
        ));
    }

    #[test]
    fn compressed_rejected() {
        let layout = MatrixLayout::new(1, 1);
        assert!(matches!(
            OnDiskMatrix::from_file("matrix.dconn.nii.gz", layout),
            Err(CiftiError::RandomAccessCompressed)
        ));
    }
}
