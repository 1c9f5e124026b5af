//! Pure numeric transforms on galaxy images.

mod filter;
mod light;

pub use filter::{high_pass_filter, low_pass_filter, FilterMode, ThresholdFilter};
pub use light::{calculate_light, flux_ratio, DEFAULT_ABSOLUTE_MAGNITUDE};
