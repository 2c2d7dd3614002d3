use crate::baseline::BaselineMap;
use crate::error::{PipelineError, Result};
use crate::structs::{AnnotatedReading, Baseline, Reading, Season};
use arrow_array::{Array, BooleanArray, Float64Array, RecordBatch, StringArray};
use arrow_schema::{DataType, Field, Schema};
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use csv::{ReaderBuilder, Trim, Writer};
use log::debug;
use parquet::arrow::ArrowWriter;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use parquet::file::properties::WriterProperties;
use std::io::Read;
use std::{fs::File, path::Path, sync::Arc};

const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// Reads a historical dataset, choosing the format from the file extension.
///
/// `.parquet` files are read as Parquet; anything else is treated as CSV with
/// a header row. Both formats need `city`, `season`, `timestamp` and
/// `temperature` columns; extra columns are ignored.
///
/// # Errors
///
/// Returns `PipelineError::InvalidInput` naming the column or 1-based data row
/// at fault when the dataset is malformed, or an I/O/format error if the file
/// cannot be read.
pub fn read_readings(path: &Path) -> Result<Vec<Reading>> {
    debug!("Reading historical dataset: {}", path.display());
    let is_parquet = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("parquet"));

    if is_parquet {
        read_parquet(path)
    } else {
        read_csv(File::open(path)?)
    }
}

/// Reads readings from CSV data with a header row.
pub fn read_csv<R: Read>(input: R) -> Result<Vec<Reading>> {
    let mut reader = ReaderBuilder::new().trim(Trim::All).from_reader(input);
    let headers = reader.headers()?.clone();
    let column = |name: &str| {
        headers
            .iter()
            .position(|h| h == name)
            .ok_or_else(|| PipelineError::InvalidInput(format!("Missing required column: {}", name)))
    };
    let city_idx = column("city")?;
    let season_idx = column("season")?;
    let timestamp_idx = column("timestamp")?;
    let temperature_idx = column("temperature")?;

    let mut readings = Vec::new();
    for (i, record) in reader.records().enumerate() {
        let record = record?;
        let row = i + 1;
        let field = |idx: usize| record.get(idx).unwrap_or("");

        let raw_temp = field(temperature_idx);
        let temperature = raw_temp.parse::<f64>().map_err(|_| {
            PipelineError::InvalidInput(format!("Row {}: invalid temperature {:?}", row, raw_temp))
        })?;

        readings.push(parse_row(
            row,
            field(city_idx),
            field(season_idx),
            field(timestamp_idx),
            temperature,
        )?);
    }

    debug!("Read {} rows from CSV", readings.len());
    Ok(readings)
}

/// Reads readings from a Parquet file with Utf8 `city`, `season`,
/// `timestamp` columns and a Float64 `temperature` column.
pub fn read_parquet(path: &Path) -> Result<Vec<Reading>> {
    let file = File::open(path)?;
    let reader = ParquetRecordBatchReaderBuilder::try_new(file)?.build()?;

    let mut readings = Vec::new();
    for batch_result in reader {
        let batch = batch_result.map_err(PipelineError::Arrow)?;
        let city_col = get_column_str(&batch, "city")?;
        let season_col = get_column_str(&batch, "season")?;
        let timestamp_col = get_column_str(&batch, "timestamp")?;
        let temp_col = get_column_f64(&batch, "temperature")?;

        for i in 0..batch.num_rows() {
            let row = readings.len() + 1;
            if city_col.is_null(i)
                || season_col.is_null(i)
                || timestamp_col.is_null(i)
                || temp_col.is_null(i)
            {
                return Err(PipelineError::InvalidInput(format!(
                    "Row {}: missing required value",
                    row
                )));
            }
            readings.push(parse_row(
                row,
                city_col.value(i),
                season_col.value(i),
                timestamp_col.value(i),
                temp_col.value(i),
            )?);
        }
    }

    debug!("Read {} rows from Parquet", readings.len());
    Ok(readings)
}

fn parse_row(
    row: usize,
    city: &str,
    season: &str,
    timestamp: &str,
    temperature: f64,
) -> Result<Reading> {
    if city.trim().is_empty() {
        return Err(PipelineError::InvalidInput(format!("Row {}: empty city", row)));
    }
    if !temperature.is_finite() {
        return Err(PipelineError::InvalidInput(format!(
            "Row {}: non-finite temperature {}",
            row, temperature
        )));
    }
    let season = season.parse::<Season>().map_err(|_| {
        PipelineError::InvalidInput(format!("Row {}: unknown season {:?}", row, season))
    })?;
    let timestamp = parse_timestamp(timestamp).ok_or_else(|| {
        PipelineError::InvalidInput(format!("Row {}: invalid timestamp {:?}", row, timestamp))
    })?;

    Ok(Reading {
        city: city.trim().to_string(),
        season,
        timestamp,
        temperature,
    })
}

/// Parses the ISO-8601 forms found in historical exports.
///
/// Offsets in RFC 3339 values are dropped, keeping the local wall-clock time.
pub fn parse_timestamp(value: &str) -> Option<NaiveDateTime> {
    let value = value.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.naive_local());
    }
    [
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%dT%H:%M",
        "%Y-%m-%d %H:%M",
    ]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(value, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

/// Extracts a Float64 column from an Arrow RecordBatch by name.
///
/// # Errors
///
/// Returns `PipelineError::InvalidInput` if the column is missing or not Float64.
fn get_column_f64<'a>(batch: &'a RecordBatch, name: &str) -> Result<&'a Float64Array> {
    batch
        .column_by_name(name)
        .ok_or_else(|| PipelineError::InvalidInput(format!("Missing required column: {}", name)))?
        .as_any()
        .downcast_ref::<Float64Array>()
        .ok_or_else(|| PipelineError::InvalidInput(format!("Column {} is not Float64", name)))
}

/// Extracts a String column from an Arrow RecordBatch by name.
///
/// # Errors
///
/// Returns `PipelineError::InvalidInput` if the column is missing or not Utf8.
fn get_column_str<'a>(batch: &'a RecordBatch, name: &str) -> Result<&'a StringArray> {
    batch
        .column_by_name(name)
        .ok_or_else(|| PipelineError::InvalidInput(format!("Missing required column: {}", name)))?
        .as_any()
        .downcast_ref::<StringArray>()
        .ok_or_else(|| PipelineError::InvalidInput(format!("Column {} is not Utf8/String", name)))
}

fn fmt_opt_f64(value: f64) -> String {
    if value.is_finite() {
        format!("{:.2}", value)
    } else {
        String::new()
    }
}

fn fmt_flag(flag: Option<bool>) -> String {
    flag.map(|f| f.to_string()).unwrap_or_default()
}

/// Writes annotated readings to a CSV file with formatted numeric values.
///
/// Undefined std values and undetermined anomaly flags are written as empty
/// fields.
///
/// # Errors
/// Returns error if file cannot be created or written to.
pub fn write_csv(rows: &[AnnotatedReading], output_path: &Path) -> Result<()> {
    let file = File::create(output_path)?;
    let mut writer = Writer::from_writer(file);

    writer.write_record([
        "city",
        "season",
        "timestamp",
        "temperature",
        "mean",
        "std",
        "is_anomaly",
    ])?;

    for row in rows {
        writer.write_record(&[
            row.city.clone(),
            row.season.to_string(),
            row.timestamp.format(TIMESTAMP_FORMAT).to_string(),
            format!("{:.2}", row.temperature),
            format!("{:.2}", row.mean),
            fmt_opt_f64(row.std),
            fmt_flag(row.is_anomaly),
        ])?;
    }

    writer.flush()?;
    Ok(())
}

/// Writes annotated readings to a pretty-formatted JSON file.
///
/// # Errors
/// Returns error if file cannot be created or serialization fails.
pub fn write_json(rows: &[AnnotatedReading], output_path: &Path) -> Result<()> {
    let file = File::create(output_path)?;
    serde_json::to_writer_pretty(file, rows)?;
    Ok(())
}

/// Writes baselines to a pretty-formatted JSON file, sorted by city then season.
pub fn write_baselines_json(baselines: &BaselineMap, output_path: &Path) -> Result<()> {
    let file = File::create(output_path)?;
    serde_json::to_writer_pretty(file, &sorted_baselines(baselines))?;
    Ok(())
}

/// Baselines ordered by city, then calendar season.
pub fn sorted_baselines(baselines: &BaselineMap) -> Vec<&Baseline> {
    let mut sorted: Vec<&Baseline> = baselines.values().collect();
    sorted.sort_by(|a, b| a.city.cmp(&b.city).then_with(|| a.season.cmp(&b.season)));
    sorted
}

/// Writes annotated readings to a columnar Parquet file using Arrow format.
///
/// `std` and `is_anomaly` are nullable; an undefined baseline is stored as null.
///
/// # Errors
/// Returns error if file cannot be created, schema is invalid, or Arrow operations fail.
pub fn write_parquet(rows: &[AnnotatedReading], output_path: &Path) -> Result<()> {
    let schema = Arc::new(Schema::new(vec![
        Field::new("city", DataType::Utf8, false),
        Field::new("season", DataType::Utf8, false),
        Field::new("timestamp", DataType::Utf8, false),
        Field::new("temperature", DataType::Float64, false),
        Field::new("mean", DataType::Float64, false),
        Field::new("std", DataType::Float64, true),
        Field::new("is_anomaly", DataType::Boolean, true),
    ]));

    let cities = StringArray::from_iter_values(rows.iter().map(|r| r.city.as_str()));
    let seasons = StringArray::from_iter_values(rows.iter().map(|r| r.season.as_str()));
    let timestamps = StringArray::from_iter_values(
        rows.iter()
            .map(|r| r.timestamp.format(TIMESTAMP_FORMAT).to_string()),
    );
    let temperatures: Float64Array = rows.iter().map(|r| r.temperature).collect();
    let means: Float64Array = rows.iter().map(|r| r.mean).collect();
    let stds: Float64Array = rows
        .iter()
        .map(|r| r.std.is_finite().then_some(r.std))
        .collect();
    let flags: BooleanArray = rows.iter().map(|r| r.is_anomaly).collect();

    let batch = RecordBatch::try_new(
        schema.clone(),
        vec![
            Arc::new(cities),
            Arc::new(seasons),
            Arc::new(timestamps),
            Arc::new(temperatures),
            Arc::new(means),
            Arc::new(stds),
            Arc::new(flags),
        ],
    )?;

    let file = File::create(output_path)?;
    let props = WriterProperties::builder().build();
    let mut writer = ArrowWriter::try_new(file, schema, Some(props))?;
    writer.write(&batch)?;
    writer.close()?;

    Ok(())
}
