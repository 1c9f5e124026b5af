//! Filled-contour and image plots of galaxy images.
//!
//! The output target is chosen once, when the [`Plotter`] is built, through
//! [`PlotConfig::backend`]. Bitmap and SVG targets are drawn with `plotters`;
//! the terminal target prints a character ramp to standard output.

use std::fmt;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::str::FromStr;

use ndarray::{ArrayBase, ArrayView2, Data, Ix2};
use plotters::coord::Shift;
use plotters::prelude::*;

use crate::container;
use crate::error::{Error, Result};
use crate::image::NamedImage;

use super::ensure_dir;

/// Characters used by the terminal backend, dimmest first.
const TEXT_RAMP: &[u8] = b" .:-=+*#%@";

/// Where a plot is drawn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlotBackend {
    /// PNG file.
    Bitmap(PathBuf),
    /// SVG file.
    Svg(PathBuf),
    /// Character rendering on standard output.
    Terminal,
}

/// Which image row is drawn at the top.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    /// Row 0 at the top, as images are usually displayed.
    Upper,
    /// Row 0 at the bottom, as contour plots place it.
    Lower,
}

/// Color ramp applied to contour bands.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Colormap {
    #[default]
    Viridis,
    Inferno,
    Gray,
}

const VIRIDIS: [(u8, u8, u8); 9] = [
    (68, 1, 84),
    (71, 44, 122),
    (59, 81, 139),
    (44, 113, 142),
    (33, 144, 141),
    (39, 173, 129),
    (92, 200, 99),
    (170, 220, 50),
    (253, 231, 37),
];

const INFERNO: [(u8, u8, u8); 9] = [
    (0, 0, 4),
    (31, 12, 72),
    (85, 15, 109),
    (136, 34, 106),
    (186, 54, 85),
    (227, 89, 51),
    (249, 140, 10),
    (249, 201, 50),
    (252, 255, 164),
];

impl Colormap {
    /// Color at position `t` in `[0, 1]`; out-of-range positions are clamped.
    #[must_use]
    pub fn rgb(self, t: f64) -> (u8, u8, u8) {
        let t = if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) };
        match self {
            Self::Viridis => interpolate(&VIRIDIS, t),
            Self::Inferno => interpolate(&INFERNO, t),
            Self::Gray => {
                let v = lerp(0, 255, t);
                (v, v, v)
            }
        }
    }
}

impl fmt::Display for Colormap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Viridis => f.write_str("viridis"),
            Self::Inferno => f.write_str("inferno"),
            Self::Gray => f.write_str("gray"),
        }
    }
}

impl FromStr for Colormap {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "viridis" => Ok(Self::Viridis),
            "inferno" => Ok(Self::Inferno),
            "gray" | "grey" | "greys" => Ok(Self::Gray),
            _ => Err(Error::InvalidParameter {
                name: "colormap".to_string(),
                reason: format!("unknown colormap `{s}`"),
            }),
        }
    }
}

/// Configuration for a [`Plotter`].
#[derive(Debug, Clone)]
pub struct PlotConfig {
    /// Output target.
    pub backend: PlotBackend,

    /// Color ramp for the bands.
    pub colormap: Colormap,

    /// Number of contour bands between the image minimum and maximum.
    pub levels: usize,

    /// Bitmap/SVG width in pixels.
    pub width: u32,

    /// Bitmap/SVG height in pixels.
    pub height: u32,

    /// Draw axis labels. Needs a usable system font.
    pub show_axes: bool,

    /// Maximum characters per line for the terminal backend.
    pub text_columns: usize,

    /// Maximum lines for the terminal backend.
    pub text_rows: usize,
}

impl Default for PlotConfig {
    fn default() -> Self {
        Self {
            backend: PlotBackend::Terminal,
            colormap: Colormap::Viridis,
            levels: 8,
            width: 800,
            height: 600,
            show_axes: true,
            text_columns: 80,
            text_rows: 40,
        }
    }
}

impl PlotConfig {
    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if any parameter is out of valid range.
    pub fn validate(&self) -> Result<()> {
        if !(1..=256).contains(&self.levels) {
            return Err(Error::InvalidParameter {
                name: "levels".to_string(),
                reason: "must be between 1 and 256".to_string(),
            });
        }

        if self.width == 0 || self.height == 0 {
            return Err(Error::InvalidParameter {
                name: "size".to_string(),
                reason: "width and height must be greater than 0".to_string(),
            });
        }

        if self.text_columns == 0 || self.text_rows == 0 {
            return Err(Error::InvalidParameter {
                name: "text_size".to_string(),
                reason: "terminal columns and rows must be greater than 0".to_string(),
            });
        }

        Ok(())
    }
}

/// Draws images to the backend fixed at construction.
#[derive(Debug, Clone)]
pub struct Plotter {
    config: PlotConfig,
}

impl Plotter {
    /// Create a plotter.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn new(config: PlotConfig) -> Result<Self> {
        config.validate()?;
        tracing::debug!("Plotter configured: {config:?}");
        Ok(Self { config })
    }

    /// The configuration this plotter was built with.
    #[must_use]
    pub fn config(&self) -> &PlotConfig {
        &self.config
    }

    /// Filled-contour plot of `arr` with row 0 at the bottom.
    ///
    /// # Errors
    ///
    /// Returns an error if the image is empty or the backend fails.
    pub fn contour<S: Data<Elem = f64>>(
        &self,
        arr: &ArrayBase<S, Ix2>,
        title: Option<&str>,
    ) -> Result<()> {
        self.render(arr.view(), title, Origin::Lower)
    }

    /// Plot a named image with row 0 at the top, titled with its name.
    ///
    /// # Errors
    ///
    /// Returns an error if the image is empty or the backend fails.
    pub fn image(&self, image: &NamedImage) -> Result<()> {
        self.render(image.data.view(), Some(image.name.as_str()), Origin::Upper)
    }

    /// Write the terminal rendering of `arr` to `writer`.
    ///
    /// The image is sampled down to at most `text_columns` by `text_rows`
    /// cells; each cell shows the band of its nearest pixel.
    ///
    /// # Errors
    ///
    /// Returns an error if the writer fails.
    pub fn write_text<W, S>(
        &self,
        writer: &mut W,
        arr: &ArrayBase<S, Ix2>,
        title: Option<&str>,
        origin: Origin,
    ) -> Result<()>
    where
        W: Write,
        S: Data<Elem = f64>,
    {
        let (rows, cols) = arr.dim();
        let bands = Bands::new(arr.iter().copied(), self.config.levels);
        let out_rows = rows.min(self.config.text_rows);
        let out_cols = cols.min(self.config.text_columns);

        if let Some(title) = title {
            writeln!(writer, "{title}")?;
        }

        for line in 0..out_rows {
            let screen_row = sample(line, out_rows, rows);
            let r = match origin {
                Origin::Upper => screen_row,
                Origin::Lower => rows - 1 - screen_row,
            };
            let text: String = (0..out_cols)
                .map(|col| {
                    let c = sample(col, out_cols, cols);
                    bands
                        .index(arr[[r, c]])
                        .map_or(' ', |band| ramp_char(band, bands.levels))
                })
                .collect();
            writeln!(writer, "{}", text.trim_end())?;
        }

        writeln!(
            writer,
            "{} levels over [{:.4e}, {:.4e}], {rows}x{cols} pixels",
            bands.levels, bands.min, bands.max
        )?;
        Ok(())
    }

    fn render(&self, arr: ArrayView2<'_, f64>, title: Option<&str>, origin: Origin) -> Result<()> {
        if arr.is_empty() {
            return Err(Error::InvalidParameter {
                name: "image".to_string(),
                reason: "cannot plot an empty image".to_string(),
            });
        }

        let size = (self.config.width, self.config.height);
        match &self.config.backend {
            PlotBackend::Bitmap(path) => {
                prepare_output(path)?;
                let root = BitMapBackend::new(path, size).into_drawing_area();
                draw_titled(&root, &arr, title, origin, &self.config)
                    .map_err(|err| plot_error(path, &err))?;
                tracing::info!("Saved plot to {}", path.display());
            }
            PlotBackend::Svg(path) => {
                prepare_output(path)?;
                let root = SVGBackend::new(path, size).into_drawing_area();
                draw_titled(&root, &arr, title, origin, &self.config)
                    .map_err(|err| plot_error(path, &err))?;
                tracing::info!("Saved plot to {}", path.display());
            }
            PlotBackend::Terminal => {
                let stdout = io::stdout();
                let mut lock = stdout.lock();
                self.write_text(&mut lock, &arr, title, origin)?;
                lock.flush()?;
            }
        }

        Ok(())
    }
}

/// Load the galaxy at `path` in `file` and plot it as an image.
///
/// # Errors
///
/// Propagates loader, configuration and backend errors.
pub fn plot_galaxy<P: AsRef<Path>>(file: P, path: &str, config: PlotConfig) -> Result<()> {
    let galaxy = container::load_galaxy(file, path)?;
    Plotter::new(config)?.image(&galaxy)
}

/// Equal-width intensity bands spanning the finite range of an image.
#[derive(Debug, Clone, Copy)]
struct Bands {
    min: f64,
    max: f64,
    levels: usize,
}

impl Bands {
    fn new(values: impl Iterator<Item = f64>, levels: usize) -> Self {
        let (min, max) = values
            .filter(|v| v.is_finite())
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
                (lo.min(v), hi.max(v))
            });

        Self { min, max, levels }
    }

    /// Band of `value`, or `None` when it cannot be placed (NaN).
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::cast_precision_loss)]
    fn index(&self, value: f64) -> Option<usize> {
        if value.is_nan() {
            return None;
        }
        if self.max <= self.min {
            return Some(0);
        }

        let t = ((value - self.min) / (self.max - self.min)).clamp(0.0, 1.0);
        // Safe: t is in [0, 1] so the product is within [0, levels]
        Some(((t * self.levels as f64) as usize).min(self.levels - 1))
    }

    /// Position of `band` along the colormap.
    #[allow(clippy::cast_precision_loss)]
    fn fraction(&self, band: usize) -> f64 {
        if self.levels <= 1 {
            0.0
        } else {
            band as f64 / (self.levels - 1) as f64
        }
    }
}

/// Draw with `title`, falling back to an untitled plot when the caption cannot
/// be rendered (for example, no usable system font).
fn draw_titled<DB: DrawingBackend>(
    root: &DrawingArea<DB, Shift>,
    arr: &ArrayView2<'_, f64>,
    title: Option<&str>,
    origin: Origin,
    config: &PlotConfig,
) -> std::result::Result<(), DrawingAreaErrorKind<DB::ErrorType>> {
    match draw(root, arr, title, origin, config) {
        Err(err) if title.is_some() => {
            tracing::warn!("Cannot draw plot title, drawing without it: {err}");
            draw(root, arr, None, origin, config)
        }
        result => result,
    }
}

fn draw<DB: DrawingBackend>(
    root: &DrawingArea<DB, Shift>,
    arr: &ArrayView2<'_, f64>,
    title: Option<&str>,
    origin: Origin,
    config: &PlotConfig,
) -> std::result::Result<(), DrawingAreaErrorKind<DB::ErrorType>> {
    root.fill(&WHITE)?;

    let (rows, cols) = arr.dim();
    let bands = Bands::new(arr.iter().copied(), config.levels);

    let mut builder = ChartBuilder::on(root);
    builder.margin(10);
    if let Some(title) = title {
        builder.caption(title, ("sans-serif", 20));
    }
    if config.show_axes {
        builder.x_label_area_size(30).y_label_area_size(40);
    }
    let mut chart = builder.build_cartesian_2d(0..cols, 0..rows)?;

    if config.show_axes {
        chart
            .configure_mesh()
            .disable_mesh()
            .x_desc("column")
            .y_desc("row")
            .draw()?;
    }

    chart.draw_series(arr.indexed_iter().filter_map(|((r, c), &value)| {
        let band = bands.index(value)?;
        let y = match origin {
            Origin::Lower => r,
            Origin::Upper => rows - 1 - r,
        };
        let (red, green, blue) = config.colormap.rgb(bands.fraction(band));
        Some(Rectangle::new(
            [(c, y), (c + 1, y + 1)],
            RGBColor(red, green, blue).filled(),
        ))
    }))?;

    root.present()?;
    Ok(())
}

fn prepare_output(path: &Path) -> Result<()> {
    match path.parent() {
        Some(parent) => ensure_dir(parent),
        None => Ok(()),
    }
}

fn plot_error<E: fmt::Display>(path: &Path, err: &E) -> Error {
    Error::Plot {
        path: path.to_path_buf(),
        reason: err.to_string(),
    }
}

/// Nearest source index for output cell `i` of `out` cells over `len` pixels.
fn sample(i: usize, out: usize, len: usize) -> usize {
    ((2 * i + 1) * len / (2 * out)).min(len - 1)
}

fn ramp_char(band: usize, levels: usize) -> char {
    let last = TEXT_RAMP.len() - 1;
    let idx = if levels <= 1 {
        last
    } else {
        band * last / (levels - 1)
    };
    char::from(TEXT_RAMP[idx])
}

fn interpolate(anchors: &[(u8, u8, u8)], t: f64) -> (u8, u8, u8) {
    #[allow(clippy::cast_precision_loss)]
    let scaled = t * (anchors.len() - 1) as f64;
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let lower = (scaled.floor() as usize).min(anchors.len() - 2);
    let frac = scaled - lower as f64;

    let (a, b) = (anchors[lower], anchors[lower + 1]);
    (lerp(a.0, b.0, frac), lerp(a.1, b.1, frac), lerp(a.2, b.2, frac))
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn lerp(a: u8, b: u8, t: f64) -> u8 {
    let v = f64::from(a) + (f64::from(b) - f64::from(a)) * t;
    v.round().clamp(0.0, 255.0) as u8
}
