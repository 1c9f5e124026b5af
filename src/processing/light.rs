//! Conversion of magnitudes into summed light.

use ndarray::{ArrayBase, Data, Dimension};

/// Absolute magnitude used when no reference is given.
pub const DEFAULT_ABSOLUTE_MAGNITUDE: f64 = 0.0;

/// Flux of one object relative to the reference magnitude `c`.
///
/// `10^((c - m) / 2.5)`: one magnitude brighter is a factor of ~2.512 in flux.
#[must_use]
pub fn flux_ratio(m: f64, c: f64) -> f64 {
    10f64.powf((c - m) / 2.5)
}

/// Total light of a population of apparent magnitudes `m` against the
/// absolute magnitude `c`.
///
/// Works on arrays of any rank; a scalar magnitude can be passed as
/// `ndarray::arr0(m)`. An empty array yields zero.
#[must_use]
pub fn calculate_light<S, D>(m: &ArrayBase<S, D>, c: f64) -> f64
where
    S: Data<Elem = f64>,
    D: Dimension,
{
    m.iter().map(|&mi| flux_ratio(mi, c)).sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::{arr0, array, Array1};

    #[test]
    fn test_light_example() {
        let m = array![0.0, 5.0];

        assert_relative_eq!(calculate_light(&m, 0.0), 1.1, epsilon = 1e-12);
    }

    #[test]
    fn test_light_scalar() {
        assert_relative_eq!(calculate_light(&arr0(2.5), 0.0), 0.1, epsilon = 1e-12);
        assert_relative_eq!(flux_ratio(2.5, 2.5), 1.0);
    }

    #[test]
    fn test_light_with_reference() {
        // m = c contributes exactly one unit each
        let m = array![[4.2, 4.2], [4.2, 4.2]];

        assert_relative_eq!(calculate_light(&m, 4.2), 4.0, epsilon = 1e-12);
    }

    #[test]
    fn test_light_empty() {
        assert_eq!(calculate_light(&Array1::<f64>::zeros(0), DEFAULT_ABSOLUTE_MAGNITUDE), 0.0);
    }

    #[test]
    fn test_light_decreases_with_magnitude() {
        let base = array![1.0, 3.0, 8.0];
        let reference = calculate_light(&base, 0.0);

        for i in 0..base.len() {
            let mut dimmer = base.clone();
            dimmer[i] += 0.5;
            assert!(calculate_light(&dimmer, 0.0) < reference);
        }
    }

    #[test]
    fn test_five_magnitudes_is_factor_hundred() {
        assert_relative_eq!(flux_ratio(0.0, 0.0) / flux_ratio(5.0, 0.0), 100.0, epsilon = 1e-9);
    }
}
