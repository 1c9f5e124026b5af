//! Reading galaxy images out of HDF5 container files.
//!
//! A container holds nested groups (for example `/image_data_28`), each of
//! which holds one 2D dataset per galaxy. Paths are `/`-separated and may start
//! with a leading slash.

mod catalog;

pub use catalog::{GalaxyCatalog, GalaxyIter, CONTAINER_EXTENSIONS};

use std::path::Path;

use hdf5::{Dataset, File, Group, LocationType};
use ndarray::ArrayD;

use crate::error::{Error, Result};
use crate::image::{self, ImageArray, ImageStack, NamedImage};

/// Load one galaxy image from `path` inside the container `file`.
///
/// # Errors
///
/// Returns [`Error::NotFound`] if the file or any segment of `path` is
/// missing, and [`Error::Container`] if the container cannot be read or the
/// dataset is not two-dimensional.
pub fn load_galaxy<P: AsRef<Path>>(file: P, path: &str) -> Result<NamedImage> {
    let file = file.as_ref();
    let container = open_container(file)?;

    let dataset = open_dataset(&container, file, path)?;
    let data = read_image(&dataset, file)?;

    tracing::debug!("Loaded {path} {:?} from {}", data.dim(), file.display());
    Ok(NamedImage::from_path(path, data))
}

/// Load the dataset at `path` as an `f64` array of whatever rank it is stored
/// with. Scalar datasets come back zero-dimensional.
///
/// # Errors
///
/// Returns [`Error::NotFound`] if the file or any segment of `path` is
/// missing, and [`Error::Container`] if the dataset cannot be read as numbers.
pub fn load_array<P: AsRef<Path>>(file: P, path: &str) -> Result<ArrayD<f64>> {
    let file = file.as_ref();
    let container = open_container(file)?;

    let data = open_dataset(&container, file, path)?
        .read_dyn::<f64>()
        .map_err(|source| container_error(file, source))?;

    tracing::debug!("Loaded {path} {:?} from {}", data.shape(), file.display());
    Ok(data)
}

/// Load every dataset that is a direct member of `group`, in name order.
///
/// Nested subgroups are skipped.
///
/// # Errors
///
/// Returns [`Error::NotFound`] if the group is missing and
/// [`Error::Container`] if any member cannot be read.
pub fn load_galaxies<P: AsRef<Path>>(file: P, group: &str) -> Result<Vec<NamedImage>> {
    let file = file.as_ref();
    let container = open_container(file)?;
    let group = open_group(&container, file, group, group)?;

    let mut galaxies = Vec::new();
    for name in dataset_names(&group, file)? {
        let dataset = group.dataset(&name).map_err(|source| container_error(file, source))?;
        let data = read_image(&dataset, file)?;
        galaxies.push(NamedImage { name, data });
    }

    tracing::debug!("Loaded {} galaxies from {}", galaxies.len(), file.display());
    Ok(galaxies)
}

/// Load every dataset of `group` as one batch, `(count, rows, cols)`.
///
/// # Errors
///
/// Same as [`load_galaxies`], plus [`Error::ShapeMismatch`] when the members
/// do not all share one shape.
pub fn load_galaxy_stack<P: AsRef<Path>>(file: P, group: &str) -> Result<ImageStack> {
    let images: Vec<ImageArray> = load_galaxies(file, group)?
        .into_iter()
        .map(|galaxy| galaxy.data)
        .collect();

    image::stack(&images)
}

/// Names of the datasets directly inside `group`, sorted.
///
/// # Errors
///
/// Returns [`Error::NotFound`] if the group is missing.
pub fn list_galaxies<P: AsRef<Path>>(file: P, group: &str) -> Result<Vec<String>> {
    let file = file.as_ref();
    let container = open_container(file)?;
    let group = open_group(&container, file, group, group)?;

    dataset_names(&group, file)
}

/// Open a container read-only.
pub(crate) fn open_container(file: &Path) -> Result<File> {
    if !file.is_file() {
        return Err(Error::NotFound {
            file: file.to_path_buf(),
            path: "/".to_string(),
        });
    }

    File::open(file).map_err(|source| container_error(file, source))
}

/// Read a dataset as a 2D `f64` image, converting the stored numeric type.
pub(crate) fn read_image(dataset: &Dataset, file: &Path) -> Result<ImageArray> {
    dataset
        .read_2d::<f64>()
        .map_err(|source| container_error(file, source))
}

/// Collect the paths of every dataset below `group`, depth-first in name order.
pub(crate) fn collect_datasets(
    group: &Group,
    prefix: &str,
    file: &Path,
    out: &mut Vec<String>,
) -> Result<()> {
    for name in sorted_members(group, file)? {
        let path = format!("{prefix}/{name}");
        match member_type(group, &name, file)? {
            LocationType::Group => {
                let child = group.group(&name).map_err(|source| container_error(file, source))?;
                collect_datasets(&child, &path, file, out)?;
            }
            LocationType::Dataset => out.push(path),
            _ => tracing::debug!("Skipping {path}: not a group or dataset"),
        }
    }

    Ok(())
}

/// Walk `path` from the root group. A missing segment is reported as `requested`.
fn open_group(container: &File, file: &Path, path: &str, requested: &str) -> Result<Group> {
    let mut group = container
        .group("/")
        .map_err(|source| container_error(file, source))?;

    for segment in path.split('/').filter(|s| !s.is_empty()) {
        if !group.link_exists(segment) {
            return Err(not_found(file, requested));
        }
        group = group
            .group(segment)
            .map_err(|source| container_error(file, source))?;
    }

    Ok(group)
}

fn open_dataset(container: &File, file: &Path, path: &str) -> Result<Dataset> {
    let trimmed = path.trim_end_matches('/');
    let (parent, leaf) = trimmed.rsplit_once('/').unwrap_or(("", trimmed));
    if leaf.is_empty() {
        return Err(not_found(file, path));
    }

    let group = open_group(container, file, parent, path)?;
    if !group.link_exists(leaf) {
        return Err(not_found(file, path));
    }

    group
        .dataset(leaf)
        .map_err(|source| container_error(file, source))
}

fn dataset_names(group: &Group, file: &Path) -> Result<Vec<String>> {
    let mut names = Vec::new();
    for name in sorted_members(group, file)? {
        if matches!(member_type(group, &name, file)?, LocationType::Dataset) {
            names.push(name);
        } else {
            tracing::debug!("Skipping non-dataset member {name}");
        }
    }

    Ok(names)
}

fn sorted_members(group: &Group, file: &Path) -> Result<Vec<String>> {
    let mut names = group
        .member_names()
        .map_err(|source| container_error(file, source))?;
    names.sort();
    Ok(names)
}

fn member_type(group: &Group, name: &str, file: &Path) -> Result<LocationType> {
    group
        .loc_type_by_name(name)
        .map_err(|source| container_error(file, source))
}

fn not_found(file: &Path, path: &str) -> Error {
    Error::NotFound {
        file: file.to_path_buf(),
        path: path.to_string(),
    }
}

fn container_error(file: &Path, source: hdf5::Error) -> Error {
    Error::Container {
        path: file.to_path_buf(),
        source,
    }
}
