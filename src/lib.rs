pub mod annotate;
pub mod baseline;
pub mod classify;
pub mod error;
pub mod live;
pub mod load;
pub mod report;
pub mod season;
pub mod structs;
pub mod transform;
pub mod weather;

// Re-export public API
pub use annotate::{annotate, annotate_with};
pub use baseline::{BaselineKey, BaselineMap, compute_baselines};
pub use classify::is_anomaly;
pub use error::{PipelineError, Result};
pub use live::compare_live;
pub use load::{read_readings, write_baselines_json, write_csv, write_json, write_parquet};
pub use season::{Clock, FixedClock, SystemClock, current_season, season_for_month};
pub use structs::{
    AnalysisConfig, AnnotatedReading, Baseline, LiveComparison, Reading, Season, SimpleLogger,
    TemperatureUnit,
};
pub use transform::{Analysis, convert_temp, process_data};
pub use weather::{OpenWeatherMap, TemperatureProvider};
