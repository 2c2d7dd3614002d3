use crate::annotate::annotate_with;
use crate::baseline::{BaselineMap, compute_baselines};
use crate::error::Result;
use crate::load::read_readings;
use crate::structs::{AnalysisConfig, AnnotatedReading, Reading, TemperatureUnit};
use log::debug;
use std::path::Path;

/// Output of the historical pipeline.
#[derive(Debug, Clone)]
pub struct Analysis {
    pub rows: Vec<AnnotatedReading>,
    pub baselines: BaselineMap,
    /// Rows removed by the city filter.
    pub dropped: usize,
}

/// Loads and annotates a historical temperature dataset.
///
/// This function reads the dataset (CSV or Parquet), keeps only the configured
/// cities, converts temperatures to the configured unit, computes
/// per-(city, season) baselines and annotates every kept row with its baseline
/// and anomaly flag.
///
/// # Arguments
///
/// * `file_path` - Path to the historical dataset
/// * `config` - Unit and city filter settings
///
/// # Returns
///
/// Returns an `Analysis` holding the annotated rows in input order and the
/// baselines they were classified against.
///
/// # Errors
///
/// Returns `PipelineError` if:
/// - File cannot be opened or read
/// - The dataset is missing required columns or holds malformed values
/// - A temperature is NaN or infinite
pub fn process_data(file_path: &Path, config: &AnalysisConfig) -> Result<Analysis> {
    let raw = read_readings(file_path)?;
    let total_rows = raw.len();
    println!("Loaded {} rows from {}", total_rows, file_path.display());

    let readings = prepare_readings(raw, config);
    let dropped = total_rows - readings.len();
    println!(
        "{} rows kept after city filtering ({} dropped)",
        readings.len(),
        dropped
    );

    println!("Starting baseline computation");
    let baselines = compute_baselines(&readings);
    debug!("Found {} unique city-season combinations", baselines.len());

    let rows = annotate_with(&readings, &baselines)?;
    debug!("Transform processing completed successfully");

    Ok(Analysis {
        rows,
        baselines,
        dropped,
    })
}

/// Applies the city filter and unit conversion to loaded readings.
///
/// Every reading of a kept city passes through, extreme values included.
pub fn prepare_readings(readings: Vec<Reading>, config: &AnalysisConfig) -> Vec<Reading> {
    readings
        .into_iter()
        .filter(|r| config.cities.is_empty() || config.cities.contains(&r.city))
        .map(|mut r| {
            r.temperature = convert_temp(r.temperature, config.unit);
            r
        })
        .collect()
}

/// Converts temperature from Celsius to the specified unit.
///
/// # Conversion Formulas
///
/// - **Celsius**: No conversion (identity)
/// - **Fahrenheit**: °F = (°C × 9/5) + 32
/// - **Kelvin**: K = °C + 273.15
pub fn convert_temp(temp_celsius: f64, unit: TemperatureUnit) -> f64 {
    match unit {
        TemperatureUnit::Celsius => temp_celsius,
        TemperatureUnit::Fahrenheit => temp_celsius * 9.0 / 5.0 + 32.0,
        TemperatureUnit::Kelvin => temp_celsius + 273.15,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::structs::Season;
    use chrono::NaiveDate;
    use std::io::Write;

    fn reading(city: &str, temperature: f64) -> Reading {
        Reading {
            city: city.to_string(),
            season: Season::Winter,
            timestamp: NaiveDate::from_ymd_opt(2015, 1, 1)
                .unwrap()
                .and_hms_opt(0, 0, 0)
                .unwrap(),
            temperature,
        }
    }

    #[test]
    fn converts_units() {
        assert_eq!(convert_temp(100.0, TemperatureUnit::Fahrenheit), 212.0);
        assert_eq!(convert_temp(-40.0, TemperatureUnit::Fahrenheit), -40.0);
        assert!((convert_temp(0.0, TemperatureUnit::Kelvin) - 273.15).abs() < 1e-12);
        assert_eq!(convert_temp(12.5, TemperatureUnit::Celsius), 12.5);
    }

    #[test]
    fn extreme_values_are_kept() {
        let config = AnalysisConfig::default();
        let prepared = prepare_readings(
            vec![reading("Oslo", -5.0), reading("Oslo", 71.0), reading("Oslo", -120.0)],
            &config,
        );
        let temps: Vec<f64> = prepared.iter().map(|r| r.temperature).collect();
        assert_eq!(temps, vec![-5.0, 71.0, -120.0]);
    }

    #[test]
    fn city_filter_and_conversion() {
        let config = AnalysisConfig {
            unit: TemperatureUnit::Fahrenheit,
            cities: vec!["Rome".to_string()],
        };
        let prepared = prepare_readings(vec![reading("Oslo", 0.0), reading("Rome", 10.0)], &config);
        assert_eq!(prepared.len(), 1);
        assert_eq!(prepared[0].city, "Rome");
        assert_eq!(prepared[0].temperature, 50.0);
    }

    #[test]
    fn process_data_end_to_end() {
        let mut file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
        writeln!(file, "city,season,timestamp,temperature").unwrap();
        for (i, t) in [10.0, 11.0, 9.0, 10.5, 9.5, 10.0, 11.0, 9.0, 10.0, 25.0]
            .iter()
            .enumerate()
        {
            writeln!(file, "Paris,spring,2018-04-{:02},{}", i + 1, t).unwrap();
        }
        writeln!(file, "Lyon,summer,2018-07-01,24.0").unwrap();
        file.flush().unwrap();

        let analysis = process_data(file.path(), &AnalysisConfig::default()).unwrap();
        assert_eq!(analysis.dropped, 0);
        assert_eq!(analysis.rows.len(), 11);
        assert_eq!(analysis.baselines.len(), 2);

        let flagged: Vec<_> = analysis
            .rows
            .iter()
            .filter(|r| r.is_anomaly == Some(true))
            .map(|r| r.temperature)
            .collect();
        assert_eq!(flagged, vec![25.0]);
        assert_eq!(analysis.rows[10].is_anomaly, None);
    }

    #[test]
    fn hot_spike_is_annotated_and_flagged() {
        let mut file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
        writeln!(file, "city,season,timestamp,temperature").unwrap();
        let temps = [60.0, 61.0, 62.0, 60.5, 61.5, 61.0, 60.0, 62.0, 61.0, 75.0];
        for (i, t) in temps.iter().enumerate() {
            writeln!(file, "Furnace Creek,summer,2013-07-{:02},{}", i + 1, t).unwrap();
        }
        file.flush().unwrap();

        let analysis = process_data(file.path(), &AnalysisConfig::default()).unwrap();
        assert_eq!(analysis.dropped, 0);
        assert_eq!(analysis.rows.len(), 10);
        let flagged: Vec<f64> = analysis
            .rows
            .iter()
            .filter(|r| r.is_anomaly == Some(true))
            .map(|r| r.temperature)
            .collect();
        assert_eq!(flagged, vec![75.0]);
        // The spike contributes to its own baseline
        assert!((analysis.rows[9].mean - 62.4).abs() < 1e-9);
    }

    #[test]
    fn city_filter_counts_dropped_rows() {
        let mut file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
        writeln!(file, "city,season,timestamp,temperature").unwrap();
        writeln!(file, "Rome,winter,2018-01-01,8.0").unwrap();
        writeln!(file, "Oslo,winter,2018-01-01,-4.0").unwrap();
        writeln!(file, "Rome,winter,2018-01-02,10.0").unwrap();
        file.flush().unwrap();

        let config = AnalysisConfig {
            cities: vec!["Rome".to_string()],
            ..AnalysisConfig::default()
        };
        let analysis = process_data(file.path(), &config).unwrap();
        assert_eq!(analysis.dropped, 1);
        assert_eq!(analysis.rows.len(), 2);
    }
}
