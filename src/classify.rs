use crate::error::{PipelineError, Result};
use crate::structs::Baseline;

/// Width of the normal band, in standard deviations either side of the mean.
pub const SIGMA_MULTIPLIER: f64 = 2.0;

/// Applies the two-sigma rule to a temperature.
///
/// A temperature is anomalous when it lies strictly below `mean - 2*std` or
/// strictly above `mean + 2*std`; a value exactly on the band edge is normal.
///
/// # Errors
///
/// Returns `PipelineError::UndefinedBaseline` when the baseline's standard
/// deviation is not finite (a group with fewer than two observations).
pub fn is_anomaly(temperature: f64, baseline: &Baseline) -> Result<bool> {
    let (lower, upper) = baseline
        .bounds()
        .ok_or_else(|| PipelineError::UndefinedBaseline {
            city: baseline.city.clone(),
            season: baseline.season,
        })?;
    Ok(temperature < lower || temperature > upper)
}
