use crate::error::PipelineError;
use chrono::NaiveDateTime;
use log::{Level, Log, Metadata, Record as LogRecord};
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

/// Simple logger implementation
///
/// Warnings and errors go to stderr so they stay visible when stdout is piped.
pub struct SimpleLogger;

impl Log for SimpleLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &LogRecord) {
        if !self.enabled(record.metadata()) {
            return;
        }
        match record.level() {
            Level::Error | Level::Warn => eprintln!("[{}] {}", record.level(), record.args()),
            _ => println!("[{}] {}", record.level(), record.args()),
        }
    }

    fn flush(&self) {}
}

/// One of the four fixed calendar buckets.
///
/// Variant order is calendar order (winter first), so sorting by season
/// gives the winter, spring, summer, autumn sequence used by the reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Season {
    Winter,
    Spring,
    Summer,
    Autumn,
}

impl Season {
    pub const ALL: [Season; 4] = [
        Season::Winter,
        Season::Spring,
        Season::Summer,
        Season::Autumn,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Season::Winter => "winter",
            Season::Spring => "spring",
            Season::Summer => "summer",
            Season::Autumn => "autumn",
        }
    }
}

impl fmt::Display for Season {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Season {
    type Err = PipelineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim();
        Season::ALL
            .into_iter()
            .find(|season| season.as_str().eq_ignore_ascii_case(name))
            .ok_or_else(|| PipelineError::InvalidInput(format!("Unknown season: {:?}", s)))
    }
}

/// A historical temperature observation for a city.
#[derive(Debug, Clone, PartialEq)]
pub struct Reading {
    pub city: String,
    pub season: Season,
    pub timestamp: NaiveDateTime,
    pub temperature: f64,
}

/// Mean and sample standard deviation of one (city, season) group.
///
/// `std` is NaN for a group with a single observation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Baseline {
    pub city: String,
    pub season: Season,
    pub mean: f64,
    pub std: f64,
    pub count: u32,
}

impl Baseline {
    /// Whether the baseline can be used to classify a temperature.
    pub fn is_defined(&self) -> bool {
        self.std.is_finite()
    }

    /// Lower and upper edges of the normal band, `None` when `std` is undefined.
    pub fn bounds(&self) -> Option<(f64, f64)> {
        self.is_defined().then(|| {
            let width = crate::classify::SIGMA_MULTIPLIER * self.std;
            (self.mean - width, self.mean + width)
        })
    }
}

/// A reading joined with its group's baseline and anomaly flag.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnnotatedReading {
    pub city: String,
    pub season: Season,
    pub timestamp: NaiveDateTime,
    pub temperature: f64,
    pub mean: f64,
    pub std: f64,
    /// `None` when the group's standard deviation is undefined.
    pub is_anomaly: Option<bool>,
}

impl AnnotatedReading {
    /// Returns the anomaly flag, or `UndefinedBaseline` if it could not be computed.
    pub fn classification(&self) -> Result<bool, PipelineError> {
        self.is_anomaly
            .ok_or_else(|| PipelineError::UndefinedBaseline {
                city: self.city.clone(),
                season: self.season,
            })
    }
}

/// Result of checking a live temperature against its seasonal baseline.
#[derive(Debug, Clone, PartialEq)]
pub struct LiveComparison {
    pub city: String,
    pub season: Season,
    pub temperature: f64,
    pub is_anomaly: bool,
    pub baseline: Baseline,
}

/// Configuration for data preparation
#[derive(Debug, Clone)]
pub struct AnalysisConfig {
    pub unit: TemperatureUnit,
    /// Cities to keep; empty keeps every city.
    pub cities: Vec<String>,
}

/// Temperature unit conversion
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum TemperatureUnit {
    Celsius,
    Fahrenheit,
    Kelvin,
}

impl TemperatureUnit {
    pub fn symbol(&self) -> &'static str {
        match self {
            TemperatureUnit::Celsius => "°C",
            TemperatureUnit::Fahrenheit => "°F",
            TemperatureUnit::Kelvin => "K",
        }
    }
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            unit: TemperatureUnit::Celsius,
            cities: Vec::new(),
        }
    }
}
