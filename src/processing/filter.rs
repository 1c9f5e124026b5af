//! Threshold masking (high-pass and low-pass) of pixel intensities.

use std::fmt;
use std::str::FromStr;

use ndarray::{Array, ArrayBase, Data, Dimension};

use crate::error::Error;

/// Which side of the cutoff survives the filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterMode {
    /// Keep values strictly above the cutoff.
    HighPass,
    /// Keep values strictly below the cutoff.
    LowPass,
}

impl fmt::Display for FilterMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::HighPass => f.write_str("high"),
            Self::LowPass => f.write_str("low"),
        }
    }
}

impl FromStr for FilterMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "high" | "high-pass" | "highpass" => Ok(Self::HighPass),
            "low" | "low-pass" | "lowpass" => Ok(Self::LowPass),
            _ => Err(Error::InvalidParameter {
                name: "mode".to_string(),
                reason: format!("unknown filter mode `{s}`, expected `high` or `low`"),
            }),
        }
    }
}

/// A threshold filter with its cutoff and replacement value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ThresholdFilter {
    /// Which side of the cutoff is kept.
    pub mode: FilterMode,
    /// Boundary value. Values equal to it are always replaced.
    pub cutoff: f64,
    /// Value written where the input is rejected.
    pub replace: f64,
}

impl ThresholdFilter {
    /// High-pass filter replacing rejected pixels with zero.
    #[must_use]
    pub const fn high_pass(cutoff: f64) -> Self {
        Self {
            mode: FilterMode::HighPass,
            cutoff,
            replace: 0.0,
        }
    }

    /// Low-pass filter replacing rejected pixels with zero.
    #[must_use]
    pub const fn low_pass(cutoff: f64) -> Self {
        Self {
            mode: FilterMode::LowPass,
            cutoff,
            replace: 0.0,
        }
    }

    /// Use `replace` instead of zero for rejected pixels.
    #[must_use]
    pub const fn with_replacement(mut self, replace: f64) -> Self {
        self.replace = replace;
        self
    }

    /// Name for a filtered copy of `name`, e.g. `galaxy_1_xy_high_2.5`.
    #[must_use]
    pub fn output_name(&self, name: &str) -> String {
        format!("{name}_{}_{}", self.mode, self.cutoff)
    }

    /// Filter `arr` into a new array of the same shape.
    #[must_use]
    pub fn apply<S, D>(&self, arr: &ArrayBase<S, D>) -> Array<f64, D>
    where
        S: Data<Elem = f64>,
        D: Dimension,
    {
        match self.mode {
            FilterMode::HighPass => high_pass_filter(arr, self.cutoff, self.replace),
            FilterMode::LowPass => low_pass_filter(arr, self.cutoff, self.replace),
        }
    }
}

/// Replace every value `<= cutoff` with `replace`; keep the rest.
///
/// The input is left untouched. NaN never compares `<=`, so it passes through.
#[must_use]
pub fn high_pass_filter<S, D>(arr: &ArrayBase<S, D>, cutoff: f64, replace: f64) -> Array<f64, D>
where
    S: Data<Elem = f64>,
    D: Dimension,
{
    arr.mapv(|v| if v <= cutoff { replace } else { v })
}

/// Replace every value `>= cutoff` with `replace`; keep the rest.
///
/// The input is left untouched. NaN never compares `>=`, so it passes through.
#[must_use]
pub fn low_pass_filter<S, D>(arr: &ArrayBase<S, D>, cutoff: f64, replace: f64) -> Array<f64, D>
where
    S: Data<Elem = f64>,
    D: Dimension,
{
    arr.mapv(|v| if v >= cutoff { replace } else { v })
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{array, Array2, Zip};
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn random_image(rng: &mut StdRng, rows: usize, cols: usize) -> Array2<f64> {
        Array2::from_shape_fn((rows, cols), |_| rng.random_range(-50.0..50.0))
    }

    #[test]
    fn test_high_pass_example() {
        let arr = array![[1.0, 2.0], [3.0, 4.0]];

        assert_eq!(high_pass_filter(&arr, 2.0, 0.0), array![[0.0, 0.0], [3.0, 4.0]]);
    }

    #[test]
    fn test_low_pass_example() {
        let arr = array![[1.0, 2.0], [3.0, 4.0]];

        assert_eq!(low_pass_filter(&arr, 3.0, -1.0), array![[1.0, 2.0], [-1.0, -1.0]]);
    }

    #[test]
    fn test_input_is_not_mutated() {
        let arr = array![[1.0, 2.0], [3.0, 4.0]];
        let before = arr.clone();

        let _ = high_pass_filter(&arr, 10.0, 0.0);
        let _ = low_pass_filter(&arr, -10.0, 0.0);

        assert_eq!(arr, before);
    }

    #[test]
    fn test_high_pass_property() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..20 {
            let arr = random_image(&mut rng, 8, 5);
            let cutoff = rng.random_range(-40.0..40.0);
            let replace = rng.random_range(-5.0..5.0);
            let out = high_pass_filter(&arr, cutoff, replace);

            assert_eq!(out.dim(), arr.dim());
            Zip::from(&arr).and(&out).for_each(|&a, &b| {
                if a > cutoff {
                    assert_eq!(b, a);
                } else {
                    assert_eq!(b, replace);
                }
            });
        }
    }

    #[test]
    fn test_low_pass_property() {
        let mut rng = StdRng::seed_from_u64(11);
        for _ in 0..20 {
            let arr = random_image(&mut rng, 6, 9);
            let cutoff = rng.random_range(-40.0..40.0);
            let replace = rng.random_range(-5.0..5.0);
            let out = low_pass_filter(&arr, cutoff, replace);

            Zip::from(&arr).and(&out).for_each(|&a, &b| {
                if a < cutoff {
                    assert_eq!(b, a);
                } else {
                    assert_eq!(b, replace);
                }
            });
        }
    }

    #[test]
    fn test_filters_are_idempotent() {
        let mut rng = StdRng::seed_from_u64(3);
        let arr = random_image(&mut rng, 10, 10);

        for filter in [
            ThresholdFilter::high_pass(5.0),
            ThresholdFilter::high_pass(-3.0).with_replacement(-7.5),
            ThresholdFilter::low_pass(12.0).with_replacement(99.0),
        ] {
            let once = filter.apply(&arr);
            let twice = filter.apply(&once);
            assert_eq!(once, twice, "{filter:?}");
        }
    }

    #[test]
    fn test_nan_passes_through() {
        let arr = array![f64::NAN, 1.0];

        assert!(high_pass_filter(&arr, 0.0, 0.0)[0].is_nan());
        assert!(low_pass_filter(&arr, 0.0, 0.0)[0].is_nan());
    }

    #[test]
    fn test_filter_defaults_to_zero_replacement() {
        assert_eq!(ThresholdFilter::high_pass(1.0).replace, 0.0);
        assert_eq!(ThresholdFilter::low_pass(1.0).replace, 0.0);
    }

    #[test]
    fn test_output_name_is_distinct() {
        let name = "galaxy_1_xy";

        assert_eq!(ThresholdFilter::high_pass(2.0).output_name(name), "galaxy_1_xy_high_2");
        assert_eq!(ThresholdFilter::low_pass(-0.5).output_name(name), "galaxy_1_xy_low_-0.5");
        assert_ne!(ThresholdFilter::high_pass(2.0).output_name(name), name);
    }

    #[test]
    fn test_mode_parsing() {
        assert_eq!("high".parse::<FilterMode>().unwrap(), FilterMode::HighPass);
        assert_eq!("Low-Pass".parse::<FilterMode>().unwrap(), FilterMode::LowPass);
        assert!("band".parse::<FilterMode>().is_err());
    }
}
