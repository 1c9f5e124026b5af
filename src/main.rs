//! galaxy-tools CLI - inspect galaxy images stored in HDF5 containers.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use galaxy_tools::container::{self, GalaxyCatalog};
use galaxy_tools::export::{self, Colormap, PlotBackend, PlotConfig, Plotter, Scaling};
use galaxy_tools::image::subtract;
use galaxy_tools::processing::{calculate_light, FilterMode, ThresholdFilter};

/// Load, filter, measure and visualize galaxy images from HDF5 containers.
#[derive(Parser, Debug)]
#[command(name = "galaxy-tools")]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Enable verbose output.
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Plot one galaxy as an image titled with its name.
    Plot {
        /// Container file.
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Dataset path inside the container.
        #[arg(value_name = "PATH")]
        path: String,

        #[command(flatten)]
        plot: PlotArgs,
    },

    /// Contour plot of MINUEND - SUBTRAHEND, optionally thresholded.
    Diff {
        /// Container file.
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Dataset subtracted from.
        #[arg(value_name = "MINUEND")]
        minuend: String,

        /// Dataset subtracted.
        #[arg(value_name = "SUBTRAHEND")]
        subtrahend: String,

        /// Replace values at or below this cutoff.
        #[arg(long, value_name = "FLOAT", conflicts_with = "low_pass", allow_negative_numbers = true)]
        high_pass: Option<f64>,

        /// Replace values at or above this cutoff.
        #[arg(long, value_name = "FLOAT", allow_negative_numbers = true)]
        low_pass: Option<f64>,

        /// Value written over filtered pixels.
        #[arg(long, default_value = "0", value_name = "FLOAT", allow_negative_numbers = true)]
        replace: f64,

        #[command(flatten)]
        plot: PlotArgs,
    },

    /// Save one galaxy as a whitespace-delimited text matrix.
    SaveArray {
        #[arg(value_name = "FILE")]
        file: PathBuf,

        #[arg(value_name = "PATH")]
        path: String,

        /// Output directory.
        #[arg(short, long, default_value = "arrays", value_name = "DIR")]
        dir: PathBuf,
    },

    /// Save one galaxy as an RGB PNG.
    SaveImage {
        #[arg(value_name = "FILE")]
        file: PathBuf,

        #[arg(value_name = "PATH")]
        path: String,

        /// Output directory.
        #[arg(short, long, default_value = "images", value_name = "DIR")]
        dir: PathBuf,

        /// Stretch the image range onto 0-255 instead of clipping.
        #[arg(long)]
        normalize: bool,
    },

    /// Save every galaxy in a group as RGB PNGs.
    SaveImages {
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Group inside the container.
        #[arg(value_name = "GROUP")]
        group: String,

        /// Output directory.
        #[arg(short, long, default_value = "images", value_name = "DIR")]
        dir: PathBuf,

        /// Stretch each image range onto 0-255 instead of clipping.
        #[arg(long)]
        normalize: bool,
    },

    /// Threshold one galaxy and save it as `<name>_<mode>_<cutoff>`.
    Filter {
        #[arg(value_name = "FILE")]
        file: PathBuf,

        #[arg(value_name = "PATH")]
        path: String,

        /// Which side of the cutoff to keep.
        #[arg(short, long, value_parser = parse_mode, value_name = "high|low")]
        mode: FilterMode,

        /// Threshold value.
        #[arg(short, long, value_name = "FLOAT", allow_negative_numbers = true)]
        cutoff: f64,

        /// Value written over filtered pixels.
        #[arg(short, long, default_value = "0", value_name = "FLOAT", allow_negative_numbers = true)]
        replace: f64,

        /// Output directory.
        #[arg(short, long, default_value = "arrays", value_name = "DIR")]
        dir: PathBuf,
    },

    /// Sum the light of a dataset of apparent magnitudes.
    Light {
        #[arg(value_name = "FILE")]
        file: PathBuf,

        #[arg(value_name = "PATH")]
        path: String,

        /// Absolute magnitude reference.
        #[arg(short = 'c', long, default_value = "0", value_name = "FLOAT", allow_negative_numbers = true)]
        absolute_magnitude: f64,
    },

    /// List every galaxy in a directory of containers.
    Scan {
        #[arg(value_name = "DIR")]
        dir: PathBuf,
    },
}

#[derive(Args, Debug)]
struct PlotArgs {
    /// Where to draw the plot.
    #[arg(short, long, value_enum, default_value_t = BackendKind::Terminal)]
    backend: BackendKind,

    /// Output file for the png and svg backends.
    #[arg(short, long, default_value = "plots/galaxy.png", value_name = "FILE")]
    output: PathBuf,

    /// Colormap: viridis, inferno or gray.
    #[arg(long, default_value = "viridis", value_parser = parse_colormap)]
    colormap: Colormap,

    /// Number of contour bands.
    #[arg(long, default_value = "8", value_name = "INT")]
    levels: usize,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum BackendKind {
    Terminal,
    Png,
    Svg,
}

impl PlotArgs {
    fn to_config(&self) -> PlotConfig {
        let backend = match self.backend {
            BackendKind::Terminal => PlotBackend::Terminal,
            BackendKind::Png => PlotBackend::Bitmap(self.output.clone()),
            BackendKind::Svg => PlotBackend::Svg(self.output.with_extension("svg")),
        };

        PlotConfig {
            backend,
            colormap: self.colormap,
            levels: self.levels,
            ..PlotConfig::default()
        }
    }
}

fn parse_mode(s: &str) -> std::result::Result<FilterMode, String> {
    s.parse().map_err(|err: galaxy_tools::Error| err.to_string())
}

fn parse_colormap(s: &str) -> std::result::Result<Colormap, String> {
    s.parse().map_err(|err: galaxy_tools::Error| err.to_string())
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("galaxy_tools={log_level}").into()),
        )
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    if let Err(err) = run(cli.command) {
        tracing::error!("{err:#}");
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}

fn run(command: Command) -> Result<()> {
    match command {
        Command::Plot { file, path, plot } => {
            export::plot_galaxy(&file, &path, plot.to_config())
                .with_context(|| format!("Failed to plot {path}"))?;
        }
        Command::Diff {
            file,
            minuend,
            subtrahend,
            high_pass,
            low_pass,
            replace,
            plot,
        } => {
            let plotter = Plotter::new(plot.to_config()).context("Invalid plot options")?;
            let a = container::load_galaxy(&file, &minuend)
                .with_context(|| format!("Failed to load {minuend}"))?;
            let b = container::load_galaxy(&file, &subtrahend)
                .with_context(|| format!("Failed to load {subtrahend}"))?;

            let mut diff = subtract(&a.data, &b.data).context("Cannot subtract images")?;
            if let Some(cutoff) = high_pass {
                diff = ThresholdFilter::high_pass(cutoff)
                    .with_replacement(replace)
                    .apply(&diff);
            } else if let Some(cutoff) = low_pass {
                diff = ThresholdFilter::low_pass(cutoff)
                    .with_replacement(replace)
                    .apply(&diff);
            }

            let title = format!("{} - {}", a.name, b.name);
            plotter
                .contour(&diff, Some(&title))
                .context("Failed to plot difference")?;
        }
        Command::SaveArray { file, path, dir } => {
            export::save_galaxy_array(&file, &path, &dir)
                .with_context(|| format!("Failed to save {path}"))?;
        }
        Command::SaveImage {
            file,
            path,
            dir,
            normalize,
        } => {
            export::save_galaxy_image(&file, &path, &dir, scaling(normalize))
                .with_context(|| format!("Failed to save {path}"))?;
        }
        Command::SaveImages {
            file,
            group,
            dir,
            normalize,
        } => {
            export::save_galaxy_images(&file, &group, &dir, scaling(normalize))
                .with_context(|| format!("Failed to save images of {group}"))?;
        }
        Command::Filter {
            file,
            path,
            mode,
            cutoff,
            replace,
            dir,
        } => {
            let mut galaxy = container::load_galaxy(&file, &path)
                .with_context(|| format!("Failed to load {path}"))?;
            let filter = ThresholdFilter {
                mode,
                cutoff,
                replace,
            };
            galaxy.data = filter.apply(&galaxy.data);
            galaxy.name = filter.output_name(&galaxy.name);
            export::save_array(&galaxy, &dir).context("Failed to save filtered array")?;
        }
        Command::Light {
            file,
            path,
            absolute_magnitude,
        } => {
            let magnitudes = container::load_array(&file, &path)
                .with_context(|| format!("Failed to load {path}"))?;
            let light = calculate_light(&magnitudes, absolute_magnitude);
            println!("{light}");
        }
        Command::Scan { dir } => {
            let catalog = GalaxyCatalog::open(&dir)
                .with_context(|| format!("Failed to scan {}", dir.display()))?;
            for item in &catalog {
                match item {
                    Ok((id, image)) => {
                        let (rows, cols) = image.dim();
                        println!("{id}\t{rows}x{cols}");
                    }
                    Err(err) => tracing::warn!("{err}"),
                }
            }
        }
    }

    Ok(())
}

const fn scaling(normalize: bool) -> Scaling {
    if normalize {
        Scaling::Normalize
    } else {
        Scaling::Clip
    }
}
