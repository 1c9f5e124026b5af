//! In-memory galaxy images and the array combinations applied to them.

use ndarray::{Array, Array2, Array3, ArrayBase, ArrayView2, Axis, Data, Dimension, Zip};

use crate::error::{Error, Result};

/// A dense grid of pixel intensities, `(rows, cols)`.
pub type ImageArray = Array2<f64>;

/// A batch of equally shaped images stacked along axis 0.
pub type ImageStack = Array3<f64>;

/// An image together with the name of the dataset it was read from.
#[derive(Debug, Clone, PartialEq)]
pub struct NamedImage {
    /// Last segment of the storage path.
    pub name: String,
    /// Pixel data.
    pub data: ImageArray,
}

impl NamedImage {
    /// Wrap `data`, naming it after the last segment of `path`.
    #[must_use]
    pub fn from_path(path: &str, data: ImageArray) -> Self {
        Self {
            name: leaf_name(path).to_string(),
            data,
        }
    }

    /// `(rows, cols)` of the underlying array.
    #[must_use]
    pub fn dim(&self) -> (usize, usize) {
        self.data.dim()
    }
}

/// Last non-empty `/`-separated segment of a storage path.
///
/// `"/image_data_28/galaxy_562338_xy"` becomes `"galaxy_562338_xy"`. A path with
/// no segments (such as `"/"`) is returned unchanged.
#[must_use]
pub fn leaf_name(path: &str) -> &str {
    path.rsplit('/').find(|s| !s.is_empty()).unwrap_or(path)
}

/// Elementwise `a - b`.
///
/// # Errors
///
/// Returns [`Error::ShapeMismatch`] when the shapes differ. No broadcasting is
/// attempted.
pub fn subtract<S1, S2, D>(a: &ArrayBase<S1, D>, b: &ArrayBase<S2, D>) -> Result<Array<f64, D>>
where
    S1: Data<Elem = f64>,
    S2: Data<Elem = f64>,
    D: Dimension,
{
    if a.shape() != b.shape() {
        return Err(Error::shape_mismatch(a.shape(), b.shape()));
    }

    Ok(Zip::from(a).and(b).map_collect(|&x, &y| x - y))
}

/// Stack equally shaped images into one batch along a new leading axis.
///
/// An empty slice produces a `(0, 0, 0)` stack.
///
/// # Errors
///
/// Returns [`Error::ShapeMismatch`] if any image differs in shape from the
/// first one.
pub fn stack(images: &[ImageArray]) -> Result<ImageStack> {
    let Some(first) = images.first() else {
        return Ok(ImageStack::zeros((0, 0, 0)));
    };

    if let Some(odd) = images.iter().find(|img| img.shape() != first.shape()) {
        return Err(Error::shape_mismatch(first.shape(), odd.shape()));
    }

    let views: Vec<ArrayView2<'_, f64>> = images.iter().map(ImageArray::view).collect();
    ndarray::stack(Axis(0), &views).map_err(|_| Error::shape_mismatch(first.shape(), &[]))
}
