//! Lazy enumeration of every galaxy in a directory of containers.

use std::fs;
use std::path::{Path, PathBuf};

use hdf5::File;

use crate::error::{Error, Result};
use crate::image::ImageArray;

use super::{collect_datasets, open_container, read_image};

/// File extensions recognised as HDF5 containers.
pub const CONTAINER_EXTENSIONS: [&str; 3] = ["hdf5", "h5", "he5"];

/// The containers found in one directory.
///
/// Only file names are gathered up front. Containers are opened one at a time
/// while iterating, and every call to [`GalaxyCatalog::iter`] starts over from
/// the first container.
#[derive(Debug, Clone)]
pub struct GalaxyCatalog {
    dir: PathBuf,
    containers: Vec<PathBuf>,
}

impl GalaxyCatalog {
    /// Enumerate the containers directly inside `dir`, sorted by file name.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if `dir` is not a directory and
    /// [`Error::Io`] if it cannot be listed.
    pub fn open<P: AsRef<Path>>(dir: P) -> Result<Self> {
        let dir = dir.as_ref();
        if !dir.is_dir() {
            return Err(Error::NotFound {
                file: dir.to_path_buf(),
                path: "/".to_string(),
            });
        }

        let mut containers = Vec::new();
        for entry in fs::read_dir(dir)? {
            let path = entry?.path();
            if path.is_file() && is_container(&path) {
                containers.push(path);
            }
        }
        containers.sort();

        tracing::info!("Found {} containers in {}", containers.len(), dir.display());
        Ok(Self {
            dir: dir.to_path_buf(),
            containers,
        })
    }

    /// Directory the catalog was built from.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Container files, in iteration order.
    #[must_use]
    pub fn containers(&self) -> &[PathBuf] {
        &self.containers
    }

    /// Iterate `(identifier, image)` pairs over all containers.
    ///
    /// Identifiers have the form `<file stem>:<dataset path>`, for example
    /// `data_0:/image_data_28/galaxy_562338_xy`.
    #[must_use]
    pub fn iter(&self) -> GalaxyIter<'_> {
        GalaxyIter {
            containers: &self.containers,
            next_container: 0,
            current: None,
        }
    }
}

impl<'a> IntoIterator for &'a GalaxyCatalog {
    type Item = Result<(String, ImageArray)>;
    type IntoIter = GalaxyIter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Iterator returned by [`GalaxyCatalog::iter`].
///
/// A container that cannot be opened or walked is reported as a single `Err`
/// item; iteration then moves on to the next container.
pub struct GalaxyIter<'a> {
    containers: &'a [PathBuf],
    next_container: usize,
    current: Option<OpenContainer<'a>>,
}

struct OpenContainer<'a> {
    path: &'a Path,
    stem: String,
    file: File,
    datasets: std::vec::IntoIter<String>,
}

impl<'a> GalaxyIter<'a> {
    fn open_next(path: &'a Path) -> Result<OpenContainer<'a>> {
        let file = open_container(path)?;
        let root = file.group("/").map_err(|source| Error::Container {
            path: path.to_path_buf(),
            source,
        })?;

        let mut datasets = Vec::new();
        collect_datasets(&root, "", path, &mut datasets)?;
        tracing::debug!("{}: {} datasets", path.display(), datasets.len());

        let stem = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();

        Ok(OpenContainer {
            path,
            stem,
            file,
            datasets: datasets.into_iter(),
        })
    }
}

impl Iterator for GalaxyIter<'_> {
    type Item = Result<(String, ImageArray)>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(current) = &mut self.current {
                if let Some(dataset_path) = current.datasets.next() {
                    let id = format!("{}:{dataset_path}", current.stem);
                    let image = current
                        .file
                        .dataset(&dataset_path)
                        .map_err(|source| Error::Container {
                            path: current.path.to_path_buf(),
                            source,
                        })
                        .and_then(|dataset| read_image(&dataset, current.path));
                    return Some(image.map(|data| (id, data)));
                }
            }
            self.current = None;

            let containers = self.containers;
            let path = containers.get(self.next_container)?;
            self.next_container += 1;

            match Self::open_next(path) {
                Ok(opened) => self.current = Some(opened),
                Err(err) => return Some(Err(err)),
            }
        }
    }
}

fn is_container(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| {
            CONTAINER_EXTENSIONS
                .iter()
                .any(|known| ext.eq_ignore_ascii_case(known))
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::container::fixtures::write_sample_container;
    use tempfile::TempDir;

    #[test]
    fn test_open_filters_and_sorts() {
        let dir = TempDir::new().unwrap();
        write_sample_container(dir.path(), "b.h5");
        write_sample_container(dir.path(), "a.hdf5");
        fs::write(dir.path().join("notes.txt"), "not a container").unwrap();
        fs::create_dir(dir.path().join("nested.hdf5")).unwrap();

        let catalog = GalaxyCatalog::open(dir.path()).unwrap();
        let names: Vec<_> = catalog
            .containers()
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();

        assert_eq!(names, ["a.hdf5", "b.h5"]);
        assert_eq!(catalog.dir(), dir.path());
    }

    #[test]
    fn test_iter_flattens_all_containers() {
        let dir = TempDir::new().unwrap();
        write_sample_container(dir.path(), "data_0.hdf5");
        write_sample_container(dir.path(), "data_1.hdf5");

        let catalog = GalaxyCatalog::open(dir.path()).unwrap();
        let items: Vec<(String, ImageArray)> = catalog.iter().map(|r| r.unwrap()).collect();

        assert_eq!(items.len(), 10);
        assert_eq!(items[0].0, "data_0:/image_data_28/galaxy_1_xy");
        assert_eq!(items[2].0, "data_0:/image_data_30/extra/galaxy_9_xy");
        assert_eq!(items[2].1.dim(), (2, 2));
        assert_eq!(items[5].0, "data_1:/image_data_28/galaxy_1_xy");
    }

    #[test]
    fn test_iter_is_restartable() {
        let dir = TempDir::new().unwrap();
        write_sample_container(dir.path(), "data_0.hdf5");

        let catalog = GalaxyCatalog::open(dir.path()).unwrap();
        let first: Vec<String> = catalog.iter().map(|r| r.unwrap().0).collect();
        let second: Vec<String> = (&catalog).into_iter().map(|r| r.unwrap().0).collect();

        assert_eq!(first.len(), 5);
        assert_eq!(first, second);
    }

    #[test]
    fn test_broken_container_yields_one_error() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("a_broken.hdf5"), b"garbage").unwrap();
        write_sample_container(dir.path(), "b_good.hdf5");

        let catalog = GalaxyCatalog::open(dir.path()).unwrap();
        let items: Vec<_> = catalog.iter().collect();

        assert_eq!(items.len(), 6);
        assert!(matches!(items[0], Err(Error::Container { .. })));
        assert!(items[1..].iter().all(Result::is_ok));
    }

    #[test]
    fn test_empty_directory() {
        let dir = TempDir::new().unwrap();
        let catalog = GalaxyCatalog::open(dir.path()).unwrap();

        assert_eq!(catalog.iter().count(), 0);
    }

    #[test]
    fn test_missing_directory() {
        let dir = TempDir::new().unwrap();

        assert!(matches!(
            GalaxyCatalog::open(dir.path().join("missing")),
            Err(Error::NotFound { .. })
        ));
    }
}
