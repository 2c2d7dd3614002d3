use chrono::NaiveDate;
use clap::Parser;
use lib::report::{cities, city_series, describe, seasonal_profile};
use lib::weather::DEFAULT_TIMEOUT;
use lib::{
    Analysis, AnalysisConfig, Clock, FixedClock, OpenWeatherMap, PipelineError, SimpleLogger,
    SystemClock, TemperatureProvider, TemperatureUnit, compare_live, convert_temp, process_data,
    write_baselines_json, write_csv, write_json, write_parquet,
};
use log::{debug, error, warn};
use std::fs;
use std::path::PathBuf;
use std::time::{Duration, Instant};

static LOGGER: SimpleLogger = SimpleLogger;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Historical dataset (.csv or .parquet) with city, season, timestamp, temperature columns
    #[arg(short, long)]
    input_file: PathBuf,

    /// Output base name (will create dir containing .csv, .json, and .parquet files)
    #[arg(short, long, default_value = "output")]
    output: String,

    /// Cities to keep (e.g., Berlin,Cairo). If not specified, processes all cities.
    #[arg(short, long, value_delimiter = ',')]
    cities: Vec<String>,

    /// Temperature unit for baselines, reports and the live check
    #[arg(long, default_value = "celsius")]
    unit: TemperatureUnit,

    /// City for the live check and per-city reports (defaults to the first city in the data)
    #[arg(long)]
    city: Option<String>,

    /// OpenWeatherMap API key; enables the live temperature check
    #[arg(long, env = "OPENWEATHER_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Timeout in seconds for the weather request
    #[arg(long, default_value_t = DEFAULT_TIMEOUT.as_secs())]
    timeout_secs: u64,

    /// Evaluate the current season as of this date (YYYY-MM-DD) instead of today
    #[arg(long)]
    today: Option<NaiveDate>,

    /// Number of annotated rows to preview
    #[arg(long, default_value_t = 5)]
    preview: usize,

    /// Log level for output
    #[arg(long, default_value = "false")]
    debug: bool,
}

fn main() -> Result<(), PipelineError> {
    let total_start = Instant::now();
    log::set_logger(&LOGGER).map_err(|e| PipelineError::Data(e.to_string()))?;

    let args = Args::parse();
    if args.debug {
        log::set_max_level(log::LevelFilter::Debug);
    } else {
        log::set_max_level(log::LevelFilter::Info);
    }
    let unit_symbol = args.unit.symbol();

    println!("Temperature Analysis and Anomaly Detection");
    debug!(
        "Input file: {} | Cities: {} | Unit: {:?}",
        args.input_file.display(),
        if args.cities.is_empty() {
            "ALL".to_string()
        } else {
            args.cities.join(",")
        },
        args.unit
    );

    let config = AnalysisConfig {
        unit: args.unit,
        cities: args.cities.clone(),
    };

    let processing_start = Instant::now();
    let analysis = process_data(&args.input_file, &config)?;
    let processing_time = processing_start.elapsed();
    println!(
        "Data processing completed in {:.2?} | Annotated {} rows",
        processing_time,
        analysis.rows.len()
    );

    println!("\nPreview:");
    for row in analysis.rows.iter().take(args.preview) {
        println!(
            "  {} {} {} {:.2}{}",
            row.city, row.season, row.timestamp, row.temperature, unit_symbol
        );
    }

    println!("\nDescriptive Statistics");
    let temperatures: Vec<f64> = analysis.rows.iter().map(|r| r.temperature).collect();
    match describe(&temperatures) {
        Some(s) => println!(
            "  count={} mean={:.2} std={:.2} min={:.2} 25%={:.2} 50%={:.2} 75%={:.2} max={:.2}",
            s.count, s.mean, s.std, s.min, s.percentile_25, s.median, s.percentile_75, s.max
        ),
        None => println!("  no rows"),
    }

    let known_cities = cities(&analysis.rows);
    let selected_city = args
        .city
        .clone()
        .or_else(|| known_cities.first().map(|c| c.to_string()));

    match selected_city.as_deref() {
        Some(city) => {
            if !known_cities.contains(&city) {
                warn!("City {} does not appear in the historical data", city);
            }
            if let Some(api_key) = args.api_key.as_deref().filter(|k| !k.is_empty()) {
                let clock: Box<dyn Clock> = match args.today {
                    Some(date) => Box::new(FixedClock(date)),
                    None => Box::new(SystemClock),
                };
                let provider =
                    OpenWeatherMap::new(api_key, Duration::from_secs(args.timeout_secs))?;
                live_check(&provider, city, &analysis, args.unit, clock.as_ref());
            }
            city_reports(&analysis, city, unit_symbol);
        }
        None => warn!("Dataset has no rows after filtering; nothing to report"),
    }

    let output_dir = PathBuf::from(format!("./output/{}", args.output));
    fs::create_dir_all(&output_dir)?;
    let output_name = args
        .output
        .split(['/', '\\'])
        .next_back()
        .unwrap_or(&args.output);
    let csv_path = output_dir.join(format!("{}.csv", output_name));
    let json_path = output_dir.join(format!("{}.json", output_name));
    let parquet_path = output_dir.join(format!("{}.parquet", output_name));
    let baselines_path = output_dir.join(format!("{}_baselines.json", output_name));

    let io_start = Instant::now();
    write_csv(&analysis.rows, &csv_path)?;
    write_json(&analysis.rows, &json_path)?;
    write_parquet(&analysis.rows, &parquet_path)?;
    write_baselines_json(&analysis.baselines, &baselines_path)?;
    println!(
        "\nWrote files to directory: {} in {:.2?}",
        output_dir.display(),
        io_start.elapsed()
    );
    debug!("  - {}", csv_path.display());
    debug!("  - {}", json_path.display());
    debug!("  - {}", parquet_path.display());
    debug!("  - {}", baselines_path.display());

    println!("Pipeline completed successfully in {:.2?}", total_start.elapsed());
    Ok(())
}

/// Fetches the current temperature and reports it against the seasonal baseline.
///
/// Failures are shown to the user and do not stop the historical reports.
fn live_check(
    provider: &dyn TemperatureProvider,
    city: &str,
    analysis: &Analysis,
    unit: TemperatureUnit,
    clock: &dyn Clock,
) {
    let live = provider
        .current_temperature(city)
        .map(|celsius| convert_temp(celsius, unit))
        .and_then(|temp| compare_live(city, temp, &analysis.baselines, clock));

    match live {
        Ok(result) => {
            println!(
                "\nCurrent temperature in {}: {:.2}{}",
                result.city,
                result.temperature,
                unit.symbol()
            );
            println!(
                "Is the current temperature normal? {} ({} baseline mean={:.2} std={:.2})",
                if result.is_anomaly { "Anomalous" } else { "Normal" },
                result.season,
                result.baseline.mean,
                result.baseline.std
            );
        }
        Err(e) => error!("Live check for {} failed: {}", city, e),
    }
}

/// Prints the anomaly time series and seasonal profile of one city.
fn city_reports(analysis: &Analysis, city: &str, unit_symbol: &str) {
    let series = city_series(&analysis.rows, city);
    let anomalies: Vec<_> = series
        .iter()
        .filter(|r| r.is_anomaly == Some(true))
        .collect();
    let undetermined = series.iter().filter(|r| r.is_anomaly.is_none()).count();
    println!(
        "\nTemperature Time Series for {}: {} readings, {} anomalies, {} undetermined",
        city,
        series.len(),
        anomalies.len(),
        undetermined
    );
    for row in &anomalies {
        println!(
            "  {} {:.2}{} (mean {:.2}, std {:.2})",
            row.timestamp, row.temperature, unit_symbol, row.mean, row.std
        );
    }

    println!("\nSeasonal Profile for {}", city);
    for baseline in seasonal_profile(&analysis.baselines, city) {
        println!(
            "  {:<6} mean={:.2} ± {:.2} (n={})",
            baseline.season.as_str(),
            baseline.mean,
            baseline.std,
            baseline.count
        );
    }
}
