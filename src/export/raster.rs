//! PNG export of single-channel galaxy images.

use std::path::{Path, PathBuf};

use image::{ImageBuffer, Rgb, RgbImage};
use indicatif::{ProgressBar, ProgressStyle};
use ndarray::{ArrayBase, Data, Ix2};

use crate::container;
use crate::error::{Error, Result};
use crate::image::NamedImage;

use super::ensure_dir;

/// How intensities are mapped onto 8-bit channels.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Scaling {
    /// Round each value and clamp it to `[0, 255]`.
    #[default]
    Clip,
    /// Stretch the finite `[min, max]` range of the image onto `[0, 255]`.
    Normalize,
}

/// Convert a single-channel image to RGB by replicating the channel.
///
/// NaN pixels become black.
///
/// # Errors
///
/// Returns [`Error::InvalidParameter`] if either dimension exceeds `u32::MAX`.
#[allow(clippy::cast_possible_truncation)]
pub fn to_rgb<S: Data<Elem = f64>>(arr: &ArrayBase<S, Ix2>, scaling: Scaling) -> Result<RgbImage> {
    let (rows, cols) = arr.dim();
    let width = pixel_dim("width", cols)?;
    let height = pixel_dim("height", rows)?;
    let (offset, gain) = match scaling {
        Scaling::Clip => (0.0, 1.0),
        Scaling::Normalize => stretch(arr),
    };

    let mut img: RgbImage = ImageBuffer::new(width, height);
    for ((y, x), &value) in arr.indexed_iter() {
        let level = to_channel((value - offset) * gain);
        // x < width and y < height, both checked to fit in u32
        img.put_pixel(x as u32, y as u32, Rgb([level, level, level]));
    }

    Ok(img)
}

/// Save `image` as `dir/<name>.png`, creating `dir` when needed.
///
/// # Errors
///
/// Returns an error if the directory cannot be created or the PNG cannot be
/// written.
pub fn save_image<P: AsRef<Path>>(image: &NamedImage, dir: P, scaling: Scaling) -> Result<PathBuf> {
    let dir = dir.as_ref();
    ensure_dir(dir)?;

    let path = dir.join(format!("{}.png", image.name));
    to_rgb(&image.data, scaling)?
        .save(&path)
        .map_err(|source| Error::ImageSave {
            path: path.clone(),
            source,
        })?;

    tracing::info!("Saved image to {}", path.display());
    Ok(path)
}

/// Load the galaxy at `path` in `file` and save it as a PNG into `dir`.
///
/// # Errors
///
/// Propagates loader and write errors.
pub fn save_galaxy_image<P: AsRef<Path>, Q: AsRef<Path>>(
    file: P,
    path: &str,
    dir: Q,
    scaling: Scaling,
) -> Result<PathBuf> {
    let galaxy = container::load_galaxy(file, path)?;
    save_image(&galaxy, dir, scaling)
}

/// Save every galaxy in `group` as `dir/<name>.png`. Returns the count.
///
/// # Errors
///
/// Stops at the first galaxy that cannot be loaded or written.
pub fn save_galaxy_images<P: AsRef<Path>, Q: AsRef<Path>>(
    file: P,
    group: &str,
    dir: Q,
    scaling: Scaling,
) -> Result<usize> {
    let dir = dir.as_ref();
    let galaxies = container::load_galaxies(file, group)?;

    let pb = ProgressBar::new(galaxies.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} Saving [{bar:40.cyan/blue}] {pos}/{len}")
            .expect("valid template")
            .progress_chars("#>-"),
    );

    for galaxy in &galaxies {
        save_image(galaxy, dir, scaling)?;
        pb.inc(1);
    }
    pb.finish_and_clear();

    tracing::info!("Saved {} images to {}", galaxies.len(), dir.display());
    Ok(galaxies.len())
}

fn pixel_dim(name: &str, len: usize) -> Result<u32> {
    u32::try_from(len).map_err(|_| Error::InvalidParameter {
        name: name.to_string(),
        reason: format!("{len} pixels does not fit in a PNG"),
    })
}

/// Offset and gain mapping the finite range of `arr` onto `[0, 255]`.
fn stretch<S: Data<Elem = f64>>(arr: &ArrayBase<S, Ix2>) -> (f64, f64) {
    let (min, max) = arr
        .iter()
        .copied()
        .filter(|v| v.is_finite())
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
            (lo.min(v), hi.max(v))
        });

    if max > min {
        (min, 255.0 / (max - min))
    } else {
        // Flat or empty image
        (min, 0.0)
    }
}

/// Round and clamp a value to an 8-bit channel.
#[inline]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn to_channel(value: f64) -> u8 {
    if value.is_nan() {
        return 0;
    }
    // Safe: clamped to [0, 255] range before casting
    value.round().clamp(0.0, 255.0) as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::container::fixtures::write_sample_container;
    use ndarray::array;
    use tempfile::TempDir;

    #[test]
    fn test_to_channel() {
        assert_eq!(to_channel(-3.0), 0);
        assert_eq!(to_channel(0.4), 0);
        assert_eq!(to_channel(127.6), 128);
        assert_eq!(to_channel(300.0), 255);
        assert_eq!(to_channel(f64::NAN), 0);
    }

    #[test]
    fn test_to_rgb_replicates_channel() {
        let arr = array![[0.0, 10.0, 20.0], [30.0, 400.0, -1.0]];
        let img = to_rgb(&arr, Scaling::Clip).unwrap();

        assert_eq!(img.dimensions(), (3, 2));
        assert_eq!(img.get_pixel(1, 0), &Rgb([10, 10, 10]));
        assert_eq!(img.get_pixel(1, 1), &Rgb([255, 255, 255]));
        assert_eq!(img.get_pixel(2, 1), &Rgb([0, 0, 0]));
    }

    #[test]
    fn test_to_rgb_normalize() {
        let arr = array![[-1.0, 0.0], [1.0, f64::NAN]];
        let img = to_rgb(&arr, Scaling::Normalize).unwrap();

        assert_eq!(img.get_pixel(0, 0)[0], 0);
        assert_eq!(img.get_pixel(1, 0)[0], 128);
        assert_eq!(img.get_pixel(0, 1)[0], 255);
        assert_eq!(img.get_pixel(1, 1)[0], 0);
    }

    #[test]
    fn test_to_rgb_normalize_flat_image() {
        let img = to_rgb(&ndarray::Array2::from_elem((2, 2), 5.0), Scaling::Normalize).unwrap();

        assert!(img.pixels().all(|p| p == &Rgb([0, 0, 0])));
    }

    #[test]
    fn test_to_rgb_rejects_oversized_width() {
        let wide = ndarray::Array2::<f64>::zeros((0, u32::MAX as usize + 1));

        match to_rgb(&wide, Scaling::Clip) {
            Err(Error::InvalidParameter { name, .. }) => assert_eq!(name, "width"),
            other => panic!("expected InvalidParameter, got {other:?}"),
        }
    }

    #[test]
    fn test_save_image_round_trips_pixels() {
        let dir = TempDir::new().unwrap();
        let image = NamedImage::from_path("/g/galaxy_3", array![[12.0, 200.0]]);

        let path = save_image(&image, dir.path().join("images"), Scaling::Clip).unwrap();

        assert!(path.ends_with("images/galaxy_3.png"));
        let decoded = image::open(&path).unwrap().to_rgb8();
        assert_eq!(decoded.get_pixel(0, 0), &Rgb([12, 12, 12]));
        assert_eq!(decoded.get_pixel(1, 0), &Rgb([200, 200, 200]));
    }

    #[test]
    fn test_save_galaxy_images() {
        let dir = TempDir::new().unwrap();
        let file = write_sample_container(dir.path(), "sample.hdf5");
        let out = dir.path().join("images/image_data_30");

        let count = save_galaxy_images(&file, "/image_data_30", &out, Scaling::Clip).unwrap();

        assert_eq!(count, 2);
        assert!(out.join("galaxy_1_xy.png").is_file());
        assert!(out.join("galaxy_2_xy.png").is_file());
    }

    #[test]
    fn test_save_galaxy_image_missing_path() {
        let dir = TempDir::new().unwrap();
        let file = write_sample_container(dir.path(), "sample.hdf5");

        let result = save_galaxy_image(&file, "/image_data_28/nope", dir.path(), Scaling::Clip);

        assert!(matches!(result, Err(Error::NotFound { .. })));
    }
}
