//! Turning galaxy images into files and plots.

mod plot;
mod raster;
mod text;

pub use plot::{plot_galaxy, Colormap, Origin, PlotBackend, PlotConfig, Plotter};
pub use raster::{save_galaxy_image, save_galaxy_images, save_image, to_rgb, Scaling};
pub use text::{format_value, save_array, save_galaxy_array, write_array};

use std::fs;
use std::path::Path;

use crate::error::Result;

/// Create `dir` and its parents if they do not exist yet.
fn ensure_dir(dir: &Path) -> Result<()> {
    if !dir.as_os_str().is_empty() {
        fs::create_dir_all(dir)?;
    }
    Ok(())
}
