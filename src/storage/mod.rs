//! Storage of the data matrix of a CIFTI file.
//!
//! The matrix is a dense grid of `f32` values, stored row by row. Files
//! read in full keep the whole grid in memory ([`InMemMatrix`]); files
//! read as needed keep a seekable handle to their source and fetch
//! individual rows or columns on request ([`OnDiskMatrix`]).
//!
//! [`InMemMatrix`]: ./inmem/struct.InMemMatrix.html
//! [`OnDiskMatrix`]: ./ondisk/struct.OnDiskMatrix.html

pub mod inmem;
pub mod ondisk;

pub use self::inmem::InMemMatrix;
pub use self::ondisk::OnDiskMatrix;

use crate::error::{CiftiError, Result};
use byteordered::Endianness;
use std::mem;

/// Where and how the matrix data sits in its source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatrixLayout {
    /// Number of rows.
    pub rows: usize,
    /// Number of columns.
    pub columns: usize,
    /// Offset in bytes of the first element from the start of the source.
    pub data_offset: u64,
    /// Byte order of the elements.
    pub endianness: Endianness,
}

impl MatrixLayout {
    /// Layout of a matrix at the start of its source, in native byte order.
    pub fn new(rows: usize, columns: usize) -> Self {
        MatrixLayout {
            rows,
            columns,
            data_offset: 0,
            endianness: Endianness::native(),
        }
    }

    /// Number of elements in the matrix.
    pub fn element_count(&self) -> usize {
        self.rows * self.columns
    }

    /// Number of bytes of element data.
    pub fn data_len(&self) -> u64 {
        (self.element_count() * mem::size_of::<f32>()) as u64
    }

    /// Byte offset of the element at `(row, column)`.
    pub fn element_offset(&self, row: usize, column: usize) -> u64 {
        self.data_offset + ((row * self.columns + column) * mem::size_of::<f32>()) as u64
    }

    /// Check that a source of `available` bytes holds the whole matrix.
    pub fn check_fits(&self, available: u64) -> Result<()> {
        if self.data_offset + self.data_len() > available {
            return Err(CiftiError::InconsistentLayout(
                self.rows,
                self.columns,
                available.saturating_sub(self.data_offset),
            ));
        }
        Ok(())
    }
}

/// Swap the bytes of elements read in a foreign byte order.
pub(crate) fn to_native(data: &mut [f32], endianness: Endianness) {
    if endianness != Endianness::native() {
        for v in data.iter_mut() {
            *v = f32::from_bits(v.to_bits().swap_bytes());
        }
    }
}

/// The data matrix of an open file.
#[derive(Debug)]
pub enum MatrixStorage {
    /// Whole matrix in memory.
    InMem(InMemMatrix),
    /// Matrix read from its source on request.
    OnDisk(OnDiskMatrix),
}

impl MatrixStorage {
    /// Number of rows.
    pub fn rows(&self) -> usize {
        match self {
            MatrixStorage::InMem(m) => m.rows(),
            MatrixStorage::OnDisk(m) => m.layout().rows,
        }
    }

    /// Number of columns.
    pub fn columns(&self) -> usize {
        match self {
            MatrixStorage::InMem(m) => m.columns(),
            MatrixStorage::OnDisk(m) => m.layout().columns,
        }
    }

    /// Read a single value, or `None` if `row` or `column` is out of range.
    pub fn read_element(&self, row: usize, column: usize) -> Result<Option<f32>> {
        match self {
            MatrixStorage::InMem(m) => Ok(m.element(row, column)),
            MatrixStorage::OnDisk(m) => m.read_element(row, column),
        }
    }

    /// Copy a row into `out`, replacing its contents.
    pub fn read_row(&self, row: usize, out: &mut Vec<f32>) -> Result<()> {
        match self {
            MatrixStorage::InMem(m) => {
                m.read_row(row, out);
                Ok(())
            }
            MatrixStorage::OnDisk(m) => m.read_row(row, out),
        }
    }

    /// Copy a column into `out`, replacing its contents.
    pub fn read_column(&self, column: usize, out: &mut Vec<f32>) -> Result<()> {
        match self {
            MatrixStorage::InMem(m) => {
                m.read_column(column, out);
                Ok(())
            }
            MatrixStorage::OnDisk(m) => m.read_column(column, out),
        }
    }

    /// Replace a column. Only matrices held in memory can be changed.
    pub fn set_column(&mut self, column: usize, data: &[f32]) -> Result<()> {
        match self {
            MatrixStorage::InMem(m) => m.set_column(column, data),
            MatrixStorage::OnDisk(_) => Err(CiftiError::NotWritableInCurrentState(
                "the matrix is read from disk as needed",
            )),
        }
    }

    /// Replace a row. Only matrices held in memory can be changed.
    pub fn set_row(&mut self, row: usize, data: &[f32]) -> Result<()> {
        match self {
            MatrixStorage::InMem(m) => m.set_row(row, data),
            MatrixStorage::OnDisk(_) => Err(CiftiError::NotWritableInCurrentState(
                "the matrix is read from disk as needed",
            )),
        }
    }

    /// The in-memory matrix, if the data is held in memory.
    pub fn in_memory(&self) -> Option<&InMemMatrix> {
        match self {
            MatrixStorage::InMem(m) => Some(m),
            MatrixStorage::OnDisk(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layout_offsets() {
        let layout = MatrixLayout {
            rows: 3,
            columns: 4,
            data_offset: 16,
            endianness: Endianness::Little,
        };
        assert_eq!(layout.element_count(), 12);
        assert_eq!(layout.data_len(), 48);
        assert_eq!(layout.element_offset(0, 0), 16);
        assert_eq!(layout.element_offset(2, 1), 16 + 9 * 4);
        assert!(layout.check_fits(64).is_ok());
        assert!(matches!(
            layout.check_fits(60),
            Err(CiftiError::InconsistentLayout(3, 4, 44))
        ));
    }

    #[test]
    fn foreign_byte_order() {
        let mut data = [1.5f32];
        to_native(&mut data, Endianness::native());
        assert_eq!(data[0], 1.5);
        let mut data = [f32::from_bits(1.5f32.to_bits().swap_bytes())];
        to_native(&mut data, Endianness::native().to_opposite());
        assert_eq!(data[0], 1.5);
    }
}
