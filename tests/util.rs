//! Shared fixtures: a minimal header format, matrix files on disk and
//! matrix descriptions.
#![allow(dead_code)]

use std::cell::Cell;
use std::fs::File;
use std::io::{self, BufWriter, Read, Write};
use std::path::{Path, PathBuf};

use byteordered::ByteOrdered;
use cifti_mappable::mapping::{BrainModel, BrainModelsMap, IndexMap};
use cifti_mappable::{
    CiftiXml, Endianness, MatrixFormat, MatrixLayout, RemoteFetcher, Result, Structure,
};
use ndarray::Array2;

/// Magic code at the start of every test matrix file.
pub const MAGIC: &[u8; 8] = b"CIFTIMX\0";

/// Header format whose header is only a magic code. The matrix
/// description is the one given on construction, and the matrix data
/// follows the magic in little endian.
#[derive(Debug, Clone)]
pub struct FixedFormat {
    pub xml: CiftiXml,
}

impl FixedFormat {
    pub fn new(xml: CiftiXml) -> Self {
        FixedFormat { xml }
    }
}

impl MatrixFormat for FixedFormat {
    fn read_header(&self, path: &Path) -> Result<(CiftiXml, MatrixLayout)> {
        let mut magic = [0u8; 8];
        File::open(path)?.read_exact(&mut magic)?;
        if &magic != MAGIC {
            return Err(io::Error::new(io::ErrorKind::InvalidData, "not a test matrix file").into());
        }
        let mut layout =
            MatrixLayout::new(self.xml.number_of_rows(), self.xml.number_of_columns());
        layout.data_offset = MAGIC.len() as u64;
        layout.endianness = Endianness::Little;
        Ok((self.xml.clone(), layout))
    }

    fn write_header(
        &self,
        dest: &mut dyn Write,
        _xml: &CiftiXml,
        _layout: &MatrixLayout,
    ) -> Result<u64> {
        dest.write_all(MAGIC)?;
        Ok(MAGIC.len() as u64)
    }
}

/// Fetcher resolving every URL to the same local file, counting calls.
#[derive(Debug)]
pub struct LocalFetcher {
    pub path: PathBuf,
    pub calls: Cell<usize>,
}

impl LocalFetcher {
    pub fn new(path: PathBuf) -> Self {
        LocalFetcher {
            path,
            calls: Cell::new(0),
        }
    }
}

impl RemoteFetcher for LocalFetcher {
    fn fetch(&self, _url: &str) -> Result<PathBuf> {
        self.calls.set(self.calls.get() + 1);
        Ok(self.path.clone())
    }
}

/// Write a test matrix file: the magic code, then the matrix row by row.
pub fn write_matrix(path: &Path, data: &Array2<f32>) {
    let mut w = BufWriter::new(File::create(path).unwrap());
    w.write_all(MAGIC).unwrap();
    {
        let mut w = ByteOrdered::le(&mut w);
        for v in data.iter() {
            w.write_f32(*v).unwrap();
        }
    }
    w.flush().unwrap();
}

/// Write `data` to a file named `name` under `dir`.
pub fn matrix_file(dir: &Path, name: &str, data: &Array2<f32>) -> PathBuf {
    let path = dir.join(name);
    write_matrix(&path, data);
    path
}

/// Brain models over every node of a left cortex with `nodes` nodes.
pub fn left_cortex(nodes: usize) -> IndexMap {
    IndexMap::BrainModels(BrainModelsMap {
        models: vec![BrainModel::surface(
            Structure::CortexLeft,
            0,
            nodes,
            (0..nodes as i64).collect(),
        )],
        volume: None,
    })
}
