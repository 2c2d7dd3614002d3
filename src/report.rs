use crate::baseline::BaselineMap;
use crate::structs::{AnnotatedReading, Baseline};
use std::collections::HashSet;

/// Descriptive statistics of a set of temperatures.
#[derive(Debug, Clone, PartialEq)]
pub struct Summary {
    pub count: usize,
    pub mean: f64,
    /// Sample standard deviation; NaN for a single value.
    pub std: f64,
    pub min: f64,
    pub percentile_25: f64,
    pub median: f64,
    pub percentile_75: f64,
    pub max: f64,
}

/// Calculates count, mean, standard deviation, extremes and quartiles.
///
/// Returns `None` for an empty slice.
///
/// # Statistical Methods
///
/// - **Standard Deviation**: Sample standard deviation (N-1 denominator)
/// - **Percentiles**: Linear interpolation between closest ranks
pub fn describe(values: &[f64]) -> Option<Summary> {
    if values.is_empty() {
        return None;
    }

    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);

    let count = sorted.len();
    let mean = sorted.iter().sum::<f64>() / count as f64;
    let std = if count > 1 {
        let variance = sorted.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / (count - 1) as f64;
        variance.sqrt()
    } else {
        f64::NAN
    };

    Some(Summary {
        count,
        mean,
        std,
        min: sorted[0],
        percentile_25: percentile(&sorted, 25.0),
        median: percentile(&sorted, 50.0),
        percentile_75: percentile(&sorted, 75.0),
        max: sorted[count - 1],
    })
}

/// Percentile of already sorted, non-empty data using linear interpolation.
fn percentile(sorted: &[f64], pct: f64) -> f64 {
    let index = (pct / 100.0) * (sorted.len() - 1) as f64;
    let lower = index.floor() as usize;
    let upper = index.ceil() as usize;

    if lower == upper {
        sorted[lower]
    } else {
        let weight = index - lower as f64;
        sorted[lower] * (1.0 - weight) + sorted[upper] * weight
    }
}

/// Distinct cities in first-seen order.
pub fn cities(rows: &[AnnotatedReading]) -> Vec<&str> {
    let mut seen = HashSet::new();
    rows.iter()
        .map(|r| r.city.as_str())
        .filter(|city| seen.insert(*city))
        .collect()
}

/// Rows for one city in timestamp order.
pub fn city_series<'a>(rows: &'a [AnnotatedReading], city: &str) -> Vec<&'a AnnotatedReading> {
    let mut series: Vec<_> = rows.iter().filter(|r| r.city == city).collect();
    series.sort_by_key(|r| r.timestamp);
    series
}

/// Mean ± std per season for a city, winter first.
pub fn seasonal_profile<'a>(baselines: &'a BaselineMap, city: &str) -> Vec<&'a Baseline> {
    let mut profile: Vec<_> = baselines.values().filter(|b| b.city == city).collect();
    profile.sort_by_key(|b| b.season);
    profile
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotate::annotate;
    use crate::baseline::compute_baselines;
    use crate::structs::{Reading, Season};
    use chrono::NaiveDate;

    fn reading(city: &str, season: Season, month: u32, temperature: f64) -> Reading {
        Reading {
            city: city.to_string(),
            season,
            timestamp: NaiveDate::from_ymd_opt(2019, month, 1)
                .unwrap()
                .and_hms_opt(0, 0, 0)
                .unwrap(),
            temperature,
        }
    }

    #[test]
    fn describe_matches_known_quartiles() {
        let summary = describe(&[4.0, 1.0, 3.0, 2.0, 5.0]).unwrap();
        assert_eq!(summary.count, 5);
        assert_eq!(summary.mean, 3.0);
        assert!((summary.std - 2.5_f64.sqrt()).abs() < 1e-12);
        assert_eq!(summary.min, 1.0);
        assert_eq!(summary.percentile_25, 2.0);
        assert_eq!(summary.median, 3.0);
        assert_eq!(summary.percentile_75, 4.0);
        assert_eq!(summary.max, 5.0);
    }

    #[test]
    fn describe_interpolates_between_ranks() {
        let summary = describe(&[10.0, 20.0, 30.0, 40.0]).unwrap();
        assert_eq!(summary.median, 25.0);
        assert_eq!(summary.percentile_25, 17.5);
        assert_eq!(summary.percentile_75, 32.5);
    }

    #[test]
    fn describe_empty_and_single() {
        assert!(describe(&[]).is_none());
        let single = describe(&[7.0]).unwrap();
        assert!(single.std.is_nan());
        assert_eq!(single.median, 7.0);
    }

    #[test]
    fn cities_keep_first_seen_order() {
        let rows = annotate(&[
            reading("Rome", Season::Winter, 1, 8.0),
            reading("Oslo", Season::Winter, 1, -4.0),
            reading("Rome", Season::Winter, 2, 9.0),
        ])
        .unwrap();
        assert_eq!(cities(&rows), vec!["Rome", "Oslo"]);
    }

    #[test]
    fn city_series_is_time_ordered() {
        let rows = annotate(&[
            reading("Rome", Season::Summer, 8, 30.0),
            reading("Oslo", Season::Summer, 7, 18.0),
            reading("Rome", Season::Summer, 6, 27.0),
        ])
        .unwrap();
        let series = city_series(&rows, "Rome");
        assert_eq!(series.len(), 2);
        assert_eq!(series[0].temperature, 27.0);
        assert_eq!(series[1].temperature, 30.0);
    }

    #[test]
    fn seasonal_profile_in_calendar_order() {
        let readings = vec![
            reading("Rome", Season::Autumn, 10, 18.0),
            reading("Rome", Season::Winter, 1, 8.0),
            reading("Rome", Season::Summer, 7, 30.0),
            reading("Oslo", Season::Spring, 4, 6.0),
            reading("Rome", Season::Winter, 2, 10.0),
        ];
        let baselines = compute_baselines(&readings);
        let profile = seasonal_profile(&baselines, "Rome");
        let seasons: Vec<Season> = profile.iter().map(|b| b.season).collect();
        assert_eq!(seasons, vec![Season::Winter, Season::Summer, Season::Autumn]);
        assert_eq!(profile[0].mean, 9.0);
    }
}
