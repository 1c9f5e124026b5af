//! # galaxy-tools
//!
//! Utilities for inspecting galaxy brightness images stored in HDF5 containers.
//!
//! The crate loads 2D images out of nested container groups, combines and
//! thresholds them, converts magnitudes into summed light, and writes the
//! results as text matrices, RGB PNGs or plots.
//!
//! ## Example
//!
//! ```no_run
//! use galaxy_tools::container::load_galaxy;
//! use galaxy_tools::export::{PlotBackend, PlotConfig, Plotter};
//! use galaxy_tools::image::subtract;
//! use galaxy_tools::processing::ThresholdFilter;
//!
//! # fn main() -> galaxy_tools::Result<()> {
//! let file = "data/data_0_Mpc_10.0_kpcpix3d_0.25_snap99_rband.hdf5";
//! let near = load_galaxy(file, "/image_data_28/galaxy_562338_xy")?;
//! let far = load_galaxy(file, "/image_data_30/galaxy_562338_xy")?;
//!
//! let diff = subtract(&far.data, &near.data)?;
//! let bright = ThresholdFilter::high_pass(0.0).apply(&diff);
//!
//! let plotter = Plotter::new(PlotConfig {
//!     backend: PlotBackend::Bitmap("plots/diff.png".into()),
//!     ..PlotConfig::default()
//! })?;
//! plotter.contour(&bright, Some("galaxy_562338_xy"))?;
//! # Ok(())
//! # }
//! ```

pub mod container;
pub mod error;
pub mod export;
pub mod image;
pub mod processing;

pub use error::{Error, Result};
