use crate::baseline::{BaselineMap, compute_baselines};
use crate::classify::is_anomaly;
use crate::error::{PipelineError, Result};
use crate::structs::{AnnotatedReading, Reading};
use log::{debug, warn};
use std::collections::HashSet;

/// Annotates a historical dataset against its own baselines.
///
/// Baselines are computed from the full input (anomalies included), then
/// every reading is tagged with its group's mean, std and anomaly flag.
///
/// # Arguments
///
/// * `readings` - Full historical dataset
///
/// # Returns
///
/// Returns one `AnnotatedReading` per input reading, in input order. Rows in a
/// group with fewer than two readings have `is_anomaly = None`.
///
/// # Errors
///
/// Returns `PipelineError::Data` only if the baseline join misses, which
/// cannot happen when baselines come from the same readings.
pub fn annotate(readings: &[Reading]) -> Result<Vec<AnnotatedReading>> {
    let baselines = compute_baselines(readings);
    annotate_with(readings, &baselines)
}

/// Joins each reading with its (city, season) baseline and classifies it.
///
/// Output preserves the order and cardinality of `readings`. Readings whose
/// group has an undefined standard deviation get `is_anomaly = None`.
///
/// # Arguments
///
/// * `readings` - Readings to annotate
/// * `baselines` - Baselines covering every (city, season) in `readings`
///
/// # Errors
///
/// Returns `PipelineError::Data` if a reading has no baseline in `baselines`.
pub fn annotate_with(readings: &[Reading], baselines: &BaselineMap) -> Result<Vec<AnnotatedReading>> {
    let mut undetermined = HashSet::new();
    let mut anomalies = 0usize;

    let annotated = readings
        .iter()
        .map(|reading| {
            let key = (reading.city.clone(), reading.season);
            let baseline = baselines.get(&key).ok_or_else(|| {
                PipelineError::Data(format!(
                    "No baseline for {}/{} while annotating",
                    reading.city, reading.season
                ))
            })?;

            let flag = match is_anomaly(reading.temperature, baseline) {
                Ok(flag) => Some(flag),
                Err(PipelineError::UndefinedBaseline { .. }) => {
                    undetermined.insert(key);
                    None
                }
                Err(e) => return Err(e),
            };
            if flag == Some(true) {
                anomalies += 1;
            }

            Ok(AnnotatedReading {
                city: reading.city.clone(),
                season: reading.season,
                timestamp: reading.timestamp,
                temperature: reading.temperature,
                mean: baseline.mean,
                std: baseline.std,
                is_anomaly: flag,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    for (city, season) in &undetermined {
        warn!(
            "Cannot classify readings for {}/{}: fewer than 2 observations",
            city, season
        );
    }
    debug!(
        "Annotated {} readings, {} anomalies, {} undetermined groups",
        annotated.len(),
        anomalies,
        undetermined.len()
    );

    Ok(annotated)
}
