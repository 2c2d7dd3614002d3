use crate::structs::{Baseline, Reading, Season};
use log::debug;
use rayon::prelude::*;
use std::collections::HashMap;

/// Group key for baselines.
pub type BaselineKey = (String, Season);

/// One baseline per (city, season) pair observed in a dataset.
pub type BaselineMap = HashMap<BaselineKey, Baseline>;

/// Computes the per-(city, season) baselines of a historical dataset.
///
/// Readings are grouped by exact city and season equality, and each group is
/// reduced to its arithmetic mean and sample standard deviation (N-1
/// denominator). A group with a single reading gets `std = NaN` rather than
/// zero, so nothing in it can be classified by accident.
///
/// # Arguments
///
/// * `readings` - Full historical dataset
///
/// # Returns
///
/// Returns a `BaselineMap` with exactly one entry per distinct (city, season)
/// pair present in `readings`. An empty input yields an empty map.
pub fn compute_baselines(readings: &[Reading]) -> BaselineMap {
    let mut groups: HashMap<BaselineKey, Vec<f64>> = HashMap::new();
    for reading in readings {
        groups
            .entry((reading.city.clone(), reading.season))
            .or_default()
            .push(reading.temperature);
    }

    debug!(
        "Computing baselines for {} city-season groups from {} readings",
        groups.len(),
        readings.len()
    );

    groups
        .into_par_iter()
        .map(|((city, season), temps)| {
            let baseline = summarize(city.clone(), season, temps);
            ((city, season), baseline)
        })
        .collect()
}

/// Reduces one group's temperatures to a `Baseline`.
///
/// Values are summed in ascending order so the result does not depend on the
/// order rows appeared in the input.
fn summarize(city: String, season: Season, mut temps: Vec<f64>) -> Baseline {
    temps.sort_by(f64::total_cmp);

    let count = temps.len();
    let mean = temps.iter().sum::<f64>() / count as f64;
    let std = if count > 1 {
        let variance =
            temps.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / (count - 1) as f64;
        variance.sqrt()
    } else {
        f64::NAN
    };

    Baseline {
        city,
        season,
        mean,
        std,
        count: count as u32,
    }
}
