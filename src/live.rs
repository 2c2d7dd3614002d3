use crate::baseline::BaselineMap;
use crate::classify::is_anomaly;
use crate::error::{PipelineError, Result};
use crate::season::{Clock, current_season};
use crate::structs::LiveComparison;
use log::debug;

/// Compares a current temperature for `city` with its historical baseline
/// for the clock's current season.
///
/// # Arguments
///
/// * `city` - City the temperature was measured in
/// * `current_temperature` - Live temperature, in the same unit as the baselines
/// * `baselines` - Baselines from the historical dataset
/// * `clock` - Source of today's date, which picks the season
///
/// # Returns
///
/// Returns a `LiveComparison` carrying the season, the baseline used and the
/// two-sigma verdict.
///
/// # Errors
///
/// * `PipelineError::NotFound` - no baseline exists for (city, current season)
/// * `PipelineError::UndefinedBaseline` - the baseline has fewer than 2 observations
/// * `PipelineError::InvalidMonth` - the clock reported a month outside 1-12
pub fn compare_live(
    city: &str,
    current_temperature: f64,
    baselines: &BaselineMap,
    clock: &dyn Clock,
) -> Result<LiveComparison> {
    let season = current_season(clock)?;
    let baseline = baselines
        .get(&(city.to_string(), season))
        .ok_or_else(|| PipelineError::NotFound {
            city: city.to_string(),
            season,
        })?;

    let anomaly = is_anomaly(current_temperature, baseline)?;
    debug!(
        "Live check {}/{}: {:.2} against mean={:.2} std={:.2} -> anomaly={}",
        city, season, current_temperature, baseline.mean, baseline.std, anomaly
    );

    Ok(LiveComparison {
        city: city.to_string(),
        season,
        temperature: current_temperature,
        is_anomaly: anomaly,
        baseline: baseline.clone(),
    })
}
