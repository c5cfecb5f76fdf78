//! Private utility module
use std::io::{Read, Seek};
use std::path::Path;

/// A trait that is both Read and Seek.
pub trait ReadSeek: Read + Seek {}
impl<T: Read + Seek> ReadSeek for T {}

/// Whether the path or URL names a gzip compressed file.
pub fn is_gz_file<P>(path: P) -> bool
where
    P: AsRef<Path>,
{
    path.as_ref()
        .file_name()
        .map(|a| a.to_string_lossy().ends_with(".gz"))
        .unwrap_or(false)
}

/// Whether the name refers to a file on the network.
pub fn is_remote_name(name: &str) -> bool {
    ["http://", "https://", "ftp://"]
        .iter()
        .any(|scheme| name.starts_with(scheme))
}

/// Format a data value for display, with at most six significant digits
/// and no trailing zeros, switching to scientific notation for very small
/// or very large magnitudes.
pub fn format_numeric(value: f32) -> String {
    if value.is_nan() {
        return "nan".to_string();
    }
    if value.is_infinite() {
        return if value > 0. { "inf" } else { "-inf" }.to_string();
    }
    if value == 0. {
        return "0".to_string();
    }
    let exponent = value.abs().log10().floor() as i32;
    if exponent < -4 || exponent >= 6 {
        let text = format!("{:.5e}", value);
        match text.find('e') {
            Some(pos) => {
                let (mantissa, exp) = text.split_at(pos);
                format!("{}{}", trim_fraction(mantissa), exp)
            }
            None => text,
        }
    } else {
        let decimals = (5 - exponent).max(0) as usize;
        trim_fraction(&format!("{:.*}", decimals, value)).to_string()
    }
}

fn trim_fraction(text: &str) -> &str {
    if text.contains('.') {
        text.trim_end_matches('0').trim_end_matches('.')
    } else {
        text
    }
}

#[cfg(test)]
mod tests {
    use super::{format_numeric, is_gz_file, is_remote_name};

    #[test]
    fn filenames() {
        assert!(!is_gz_file("/path/to/something.dscalar.nii"));
        assert!(is_gz_file("/path/to/something.dscalar.nii.gz"));
        assert!(!is_gz_file("volume.gz.nii"));
        assert!(!is_gz_file("/path/to/.gz/file"));
        assert!(is_gz_file("gz.gz"));
    }

    #[test]
    fn remote_names() {
        assert!(is_remote_name("http://example.org/a.dscalar.nii"));
        assert!(is_remote_name("https://example.org/a.dscalar.nii"));
        assert!(is_remote_name("ftp://example.org/a.dscalar.nii"));
        assert!(!is_remote_name("/data/http/a.dscalar.nii"));
    }

    #[test]
    fn numeric_text() {
        assert_eq!(format_numeric(0.75), "0.75");
        assert_eq!(format_numeric(42.), "42");
        assert_eq!(format_numeric(-3.5), "-3.5");
        assert_eq!(format_numeric(0.), "0");
        assert_eq!(format_numeric(123456.), "123456");
        assert_eq!(format_numeric(1.0e-5), "1e-5");
        assert_eq!(format_numeric(2.5e7), "2.5e7");
        assert_eq!(format_numeric(1. / 3.), "0.333333");
    }
}
