//! Utility functions to write CIFTI files.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use byteordered::{ByteOrdered, Endianness};
use flate2::write::GzEncoder;
use flate2::Compression;
use ndarray::Axis;

use crate::error::Result;
use crate::file::MatrixFormat;
use crate::mapping::CiftiXml;
use crate::storage::{InMemMatrix, MatrixLayout};
use crate::util::is_gz_file;

/// Write a CIFTI file (.nii or .nii.gz).
///
/// The header, which carries `xml`, is written by `format`. The matrix
/// follows it row by row in little endian byte order.
pub fn write_cifti<P>(
    path: P,
    format: &dyn MatrixFormat,
    xml: &CiftiXml,
    matrix: &InMemMatrix,
) -> Result<()>
where
    P: AsRef<Path>,
{
    let layout = MatrixLayout {
        rows: matrix.rows(),
        columns: matrix.columns(),
        data_offset: 0,
        endianness: Endianness::Little,
    };

    let gz = is_gz_file(&path);
    let f = File::create(path)?;
    let mut writer = BufWriter::new(f);
    if gz {
        let mut e = GzEncoder::new(writer, Compression::default());
        let _ = format.write_header(&mut e, xml, &layout)?;
        write_data(&mut e, matrix)?;
        let _ = e.finish()?;
    } else {
        let _ = format.write_header(&mut writer, xml, &layout)?;
        write_data(&mut writer, matrix)?;
        writer.flush()?;
    }
    Ok(())
}

fn write_data<W>(writer: W, matrix: &InMemMatrix) -> Result<()>
where
    W: Write,
{
    let mut writer = ByteOrdered::le(writer);
    for row in matrix.as_array().axis_iter(Axis(0)) {
        for v in row.iter() {
            writer.write_f32(*v)?;
        }
    }
    Ok(())
}
