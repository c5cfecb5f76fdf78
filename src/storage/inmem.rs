//! Matrix data held entirely in memory.

use super::{to_native, MatrixLayout};
use crate::error::{CiftiError, Result};
use crate::util::is_gz_file;
use flate2::bufread::GzDecoder;
use ndarray::{Array2, ArrayView1, Axis};
use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::Path;

/// A data matrix loaded into memory, one row per index of the column
/// mapping and one column per index of the row mapping.
#[derive(Debug, Clone, PartialEq)]
pub struct InMemMatrix {
    data: Array2<f32>,
}

impl InMemMatrix {
    /// Wrap an existing array.
    pub fn from_array(data: Array2<f32>) -> Self {
        InMemMatrix { data }
    }

    /// A matrix of zeros.
    pub fn zeros(rows: usize, columns: usize) -> Self {
        InMemMatrix {
            data: Array2::zeros((rows, columns)),
        }
    }

    /// Read the matrix from a stream positioned at the start of the file.
    /// The bytes before `layout.data_offset` are skipped.
    pub fn from_stream<R>(mut source: R, layout: &MatrixLayout) -> Result<Self>
    where
        R: Read,
    {
        let skipped = io::copy(&mut (&mut source).take(layout.data_offset), &mut io::sink())?;
        if skipped < layout.data_offset {
            return Err(CiftiError::InconsistentLayout(layout.rows, layout.columns, 0));
        }

        let mut raw = vec![0f32; layout.element_count()];
        source
            .read_exact(bytemuck::cast_slice_mut(&mut raw))
            .map_err(|e| match e.kind() {
                io::ErrorKind::UnexpectedEof => {
                    CiftiError::InconsistentLayout(layout.rows, layout.columns, 0)
                }
                _ => CiftiError::Io(e),
            })?;
        to_native(&mut raw, layout.endianness);

        let data = Array2::from_shape_vec((layout.rows, layout.columns), raw)
            .map_err(|_| CiftiError::InconsistentLayout(layout.rows, layout.columns, 0))?;
        Ok(InMemMatrix { data })
    }

    /// Read the matrix from a file. Files ending in ".gz" are decoded as a
    /// Gzip stream.
    pub fn from_file<P>(path: P, layout: &MatrixLayout) -> Result<Self>
    where
        P: AsRef<Path>,
    {
        let gz = is_gz_file(&path);
        let file = BufReader::new(File::open(path)?);
        if gz {
            InMemMatrix::from_stream(GzDecoder::new(file), layout)
        } else {
            InMemMatrix::from_stream(file, layout)
        }
    }

    /// Number of rows.
    pub fn rows(&self) -> usize {
        self.data.nrows()
    }

    /// Number of columns.
    pub fn columns(&self) -> usize {
        self.data.ncols()
    }

    /// The whole matrix.
    pub fn as_array(&self) -> &Array2<f32> {
        &self.data
    }

    /// The value at `row` and `column`, if both are in range.
    pub fn element(&self, row: usize, column: usize) -> Option<f32> {
        self.data.get((row, column)).cloned()
    }

    pub(crate) fn read_row(&self, row: usize, out: &mut Vec<f32>) {
        out.clear();
        out.extend(self.data.index_axis(Axis(0), row).iter().cloned());
    }

    pub(crate) fn read_column(&self, column: usize, out: &mut Vec<f32>) {
        out.clear();
        out.extend(self.data.index_axis(Axis(1), column).iter().cloned());
    }

    pub(crate) fn set_row(&mut self, row: usize, data: &[f32]) -> Result<()> {
        let mut target = self.data.index_axis_mut(Axis(0), row);
        if target.len() != data.len() {
            return Err(CiftiError::DataLengthMismatch(target.len(), data.len()));
        }
        target.assign(&ArrayView1::from(data));
        Ok(())
    }

    pub(crate) fn set_column(&mut self, column: usize, data: &[f32]) -> Result<()> {
        let mut target = self.data.index_axis_mut(Axis(1), column);
        if target.len() != data.len() {
            return Err(CiftiError::DataLengthMismatch(target.len(), data.len()));
        }
        target.assign(&ArrayView1::from(data));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use byteordered::{ByteOrdered, Endianness};

    fn encoded(values: &[f32], endianness: Endianness, padding: usize) -> Vec<u8> {
        let mut bytes = vec![0xAB; padding];
        {
            let mut w = ByteOrdered::runtime(&mut bytes, endianness);
            for v in values {
                w.write_f32(*v).unwrap();
            }
        }
        bytes
    }

    #[test]
    fn big_endian_with_offset() {
        let values = [1., 2., 3., 4., 5., 6.];
        let bytes = encoded(&values, Endianness::Big, 8);
        let layout = MatrixLayout {
            rows: 2,
            columns: 3,
            data_offset: 8,
            endianness: Endianness::Big,
        };
        let m = InMemMatrix::from_stream(&bytes[..], &layout).unwrap();
        assert_eq!(m.rows(), 2);
        assert_eq!(m.columns(), 3);
        let mut out = Vec::new();
        m.read_row(1, &mut out);
        assert_eq!(out, vec![4., 5., 6.]);
        m.read_column(2, &mut out);
        assert_eq!(out, vec![3., 6.]);
        assert_eq!(m.element(1, 0), Some(4.));
        assert_eq!(m.element(2, 0), None);
    }

    #[test]
    fn short_source() {
        let bytes = encoded(&[1., 2.], Endianness::Little, 0);
        let layout = MatrixLayout {
            rows: 2,
            columns: 2,
            data_offset: 0,
            endianness: Endianness::Little,
        };
        assert!(matches!(
            InMemMatrix::from_stream(&bytes[..], &layout),
            Err(CiftiError::InconsistentLayout(2, 2, _))
        ));
    }

    #[test]
    fn replace_data() {
        let mut m = InMemMatrix::zeros(2, 3);
        m.set_column(1, &[7., 8.]).unwrap();
        m.set_row(0, &[1., 2., 3.]).unwrap();
        assert_eq!(m.as_array()[[0, 1]], 2.);
        assert_eq!(m.as_array()[[1, 1]], 8.);
        assert!(matches!(
            m.set_row(0, &[1.]),
            Err(CiftiError::DataLengthMismatch(3, 1))
        ));
    }
}
