//! Plain-text matrix dumps.
//!
//! One row per line, values separated by single spaces and written in
//! scientific notation with 18 fractional digits and a signed two-digit
//! exponent (`1.500000000000000000e+01`), the layout numpy's `savetxt` uses.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use ndarray::{ArrayBase, Data, Ix2};

use crate::container;
use crate::error::Result;
use crate::image::NamedImage;

use super::ensure_dir;

/// Format one value the way the text dump stores it.
#[must_use]
pub fn format_value(value: f64) -> String {
    if value.is_nan() {
        return "nan".to_string();
    }
    if value.is_infinite() {
        return if value > 0.0 { "inf" } else { "-inf" }.to_string();
    }

    let formatted = format!("{value:.18e}");
    let Some((mantissa, exponent)) = formatted.split_once('e') else {
        return formatted;
    };
    // Rust prints `e-5` / `e5`; pad to a signed two-digit exponent.
    let (sign, digits) = match exponent.strip_prefix('-') {
        Some(digits) => ('-', digits),
        None => ('+', exponent),
    };

    format!("{mantissa}e{sign}{digits:0>2}")
}

/// Write `arr` as a whitespace-delimited matrix.
///
/// # Errors
///
/// Returns an error if the writer fails.
pub fn write_array<W, S>(writer: &mut W, arr: &ArrayBase<S, Ix2>) -> Result<()>
where
    W: Write,
    S: Data<Elem = f64>,
{
    for row in arr.rows() {
        let line: Vec<String> = row.iter().map(|&v| format_value(v)).collect();
        writeln!(writer, "{}", line.join(" "))?;
    }
    Ok(())
}

/// Save `image` to `dir/<name>`, creating `dir` when needed.
///
/// # Errors
///
/// Returns [`crate::Error::Io`] if the destination cannot be written.
pub fn save_array<P: AsRef<Path>>(image: &NamedImage, dir: P) -> Result<PathBuf> {
    let dir = dir.as_ref();
    ensure_dir(dir)?;

    let path = dir.join(&image.name);
    let mut writer = BufWriter::new(File::create(&path)?);
    write_array(&mut writer, &image.data)?;
    writer.flush()?;

    tracing::info!("Saved array to {}", path.display());
    Ok(path)
}

/// Load the galaxy at `path` in `file` and save it as text into `dir`.
///
/// # Errors
///
/// Propagates loader and write errors.
pub fn save_galaxy_array<P: AsRef<Path>, Q: AsRef<Path>>(
    file: P,
    path: &str,
    dir: Q,
) -> Result<PathBuf> {
    let galaxy = container::load_galaxy(file, path)?;
    save_array(&galaxy, dir)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::container::fixtures::write_sample_container;
    use crate::Error;
    use ndarray::array;
    use tempfile::TempDir;

    #[test]
    fn test_format_value() {
        assert_eq!(format_value(1.0), "1.000000000000000000e+00");
        assert_eq!(format_value(0.0), "0.000000000000000000e+00");
        assert_eq!(format_value(-15.0), "-1.500000000000000000e+01");
        assert_eq!(format_value(2.5e-7), "2.500000000000000000e-07");
        assert_eq!(format_value(1e123), "1.000000000000000000e+123");
    }

    #[test]
    fn test_format_non_finite() {
        assert_eq!(format_value(f64::NAN), "nan");
        assert_eq!(format_value(f64::INFINITY), "inf");
        assert_eq!(format_value(f64::NEG_INFINITY), "-inf");
    }

    #[test]
    fn test_write_array_layout() {
        let mut out = Vec::new();
        write_array(&mut out, &array![[1.0, 2.0], [3.0, 4.0]]).unwrap();

        let text = String::from_utf8(out).unwrap();
        assert_eq!(
            text,
            "1.000000000000000000e+00 2.000000000000000000e+00\n\
             3.000000000000000000e+00 4.000000000000000000e+00\n"
        );
    }

    #[test]
    fn test_save_array_names_file_after_image() {
        let dir = TempDir::new().unwrap();
        let out_dir = dir.path().join("arrays");
        let image = NamedImage::from_path("/image_data_28/galaxy_5", array![[0.5, -0.5]]);

        let path = save_array(&image, &out_dir).unwrap();

        assert_eq!(path, out_dir.join("galaxy_5"));
        let text = std::fs::read_to_string(path).unwrap();
        let values: Vec<f64> = text.split_whitespace().map(|v| v.parse().unwrap()).collect();
        assert_eq!(values, [0.5, -0.5]);
    }

    #[test]
    fn test_save_array_unwritable_destination() {
        let dir = TempDir::new().unwrap();
        let blocker = dir.path().join("file");
        std::fs::write(&blocker, "x").unwrap();
        let image = NamedImage::from_path("g", array![[1.0]]);

        assert!(matches!(save_array(&image, &blocker), Err(Error::Io(_))));
    }

    #[test]
    fn test_save_galaxy_array() {
        let dir = TempDir::new().unwrap();
        let file = write_sample_container(dir.path(), "sample.hdf5");

        let path = save_galaxy_array(&file, "/image_data_28/galaxy_1_xy", dir.path()).unwrap();

        let text = std::fs::read_to_string(path).unwrap();
        assert_eq!(text.lines().count(), 3);
        assert!(text.lines().all(|line| line.split(' ').count() == 4));
    }
}
