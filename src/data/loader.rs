use std::path::Path;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use arrow::array::{
    Array, AsArray, BooleanArray, Float32Array, Float64Array, Int32Array, Int64Array,
    StringArray,
};
use arrow::datatypes::DataType;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use serde_json::Value as JsonValue;

use super::model::{Column, ColumnData, Dataset};

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Load a benchmark table from a file.  Dispatch by extension.
///
/// Supported formats:
/// * `.csv`     – header row, one benchmark run per line
/// * `.json`    – `[{ "Isovalue": 0.1, "FramesPerSecond": 30.0, ... }, ...]`
/// * `.parquet` – flat numeric / string columns
pub fn load_file(path: &Path) -> Result<Dataset> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    let dataset = match ext.as_str() {
        "csv" => load_csv(path),
        "json" => load_json(path),
        "parquet" | "pq" => load_parquet(path),
        other => bail!("Unsupported file extension: .{other}"),
    }
    .with_context(|| format!("loading {}", path.display()))?;

    log::info!(
        "Loaded {} rows with columns {:?} from {}",
        dataset.len(),
        dataset.column_names(),
        path.display()
    );
    Ok(dataset)
}

// ---------------------------------------------------------------------------
// CSV loader
// ---------------------------------------------------------------------------

/// CSV layout: header row with column names, one run per record.
/// Column kinds are inferred from the cells (see [`Column::from_text`]).
fn load_csv(path: &Path) -> Result<Dataset> {
    let reader = csv::Reader::from_path(path).context("opening CSV")?;
    read_csv(reader)
}

pub(crate) fn read_csv<R: std::io::Read>(mut reader: csv::Reader<R>) -> Result<Dataset> {
    let headers: Vec<String> = reader
        .headers()
        .context("reading CSV headers")?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    let mut cells: Vec<Vec<String>> = vec![Vec::new(); headers.len()];

    for (row_no, result) in reader.records().enumerate() {
        let record = result.with_context(|| format!("CSV row {row_no}"))?;
        if record.len() != headers.len() {
            bail!(
                "CSV row {row_no}: {} fields, header has {}",
                record.len(),
                headers.len()
            );
        }
        for (col, value) in record.iter().enumerate() {
            cells[col].push(value.to_string());
        }
    }

    let columns = headers
        .into_iter()
        .zip(cells)
        .map(|(name, values)| Column::from_text(name, values))
        .collect();

    Ok(Dataset::new(columns)?)
}

// ---------------------------------------------------------------------------
// JSON loader
// ---------------------------------------------------------------------------

/// Expected JSON schema (records-oriented, `df.to_json(orient='records')`):
///
/// ```json
/// [
///   { "Isovalue": 0.1, "StepSizeLarge": 1.0, "FramesPerSecond": 31.5 },
///   ...
/// ]
/// ```
///
/// Columns take their names from the first record's keys, in file order.
fn load_json(path: &Path) -> Result<Dataset> {
    let text = std::fs::read_to_string(path).context("reading JSON file")?;
    parse_json(&text)
}

pub(crate) fn parse_json(text: &str) -> Result<Dataset> {
    let root: JsonValue = serde_json::from_str(text).context("parsing JSON")?;

    let records = root.as_array().context("Expected top-level JSON array")?;

    let mut names: Vec<String> = Vec::new();
    if let Some(first) = records.first() {
        let obj = first.as_object().context("Row 0 is not a JSON object")?;
        names.extend(obj.keys().cloned());
    }

    let mut cells: Vec<Vec<&JsonValue>> = vec![Vec::with_capacity(records.len()); names.len()];

    for (i, rec) in records.iter().enumerate() {
        let obj = rec
            .as_object()
            .with_context(|| format!("Row {i} is not a JSON object"))?;
        if obj.len() != names.len() {
            bail!("Row {i}: {} keys, expected {}", obj.len(), names.len());
        }
        for (col, name) in names.iter().enumerate() {
            let value = obj
                .get(name)
                .with_context(|| format!("Row {i}: missing key '{name}'"))?;
            cells[col].push(value);
        }
    }

    let columns = names
        .into_iter()
        .zip(cells)
        .map(|(name, values)| json_column(name, &values))
        .collect();

    Ok(Dataset::new(columns)?)
}

fn json_column(name: String, values: &[&JsonValue]) -> Column {
    let numeric = values
        .iter()
        .all(|v| matches!(v, JsonValue::Number(_) | JsonValue::Null));

    if numeric {
        Column::numeric(
            name,
            values
                .iter()
                .map(|v| v.as_f64().unwrap_or(f64::NAN))
                .collect(),
        )
    } else {
        Column::categorical(
            name,
            values
                .iter()
                .map(|v| match v {
                    JsonValue::String(s) => s.clone(),
                    JsonValue::Null => String::new(),
                    other => other.to_string(),
                })
                .collect(),
        )
    }
}

// ---------------------------------------------------------------------------
// Parquet loader
// ---------------------------------------------------------------------------

/// Load a Parquet file of benchmark runs.
///
/// Float and integer columns become numeric, string and boolean columns
/// categorical. Nulls turn into NaN (numeric) or the empty string.
fn load_parquet(path: &Path) -> Result<Dataset> {
    let file = std::fs::File::open(path).context("opening parquet file")?;
    let builder =
        ParquetRecordBatchReaderBuilder::try_new(file).context("reading parquet metadata")?;

    let names: Vec<String> = builder
        .schema()
        .fields()
        .iter()
        .map(|f| f.name().clone())
        .collect();
    let reader = builder.build().context("building parquet reader")?;

    let mut data: Vec<Option<ColumnData>> = vec![None; names.len()];

    for batch_result in reader {
        let batch = batch_result.context("reading parquet record batch")?;

        for (idx, name) in names.iter().enumerate() {
            let chunk = extract_column(batch.column(idx))
                .with_context(|| format!("column '{name}'"))?;
            data[idx] = Some(match (data[idx].take(), chunk) {
                (None, chunk) => chunk,
                (Some(ColumnData::Numeric(mut acc)), ColumnData::Numeric(more)) => {
                    acc.extend(more);
                    ColumnData::Numeric(acc)
                }
                (Some(ColumnData::Categorical(mut acc)), ColumnData::Categorical(more)) => {
                    acc.extend(more);
                    ColumnData::Categorical(acc)
                }
                _ => bail!("column '{name}' changes type between record batches"),
            });
        }
    }

    let columns = names
        .into_iter()
        .zip(data)
        .map(|(name, data)| match data {
            Some(ColumnData::Categorical(v)) => Column::categorical(name, v),
            Some(ColumnData::Numeric(v)) => Column::numeric(name, v),
            None => Column::numeric(name, Vec::new()),
        })
        .collect();

    Ok(Dataset::new(columns)?)
}

// -- Parquet / Arrow helpers --

/// Convert one Arrow column chunk into typed column data.
fn extract_column(col: &Arc<dyn Array>) -> Result<ColumnData> {
    let n = col.len();
    let data = match col.data_type() {
        DataType::Float64 => {
            let arr = col
                .as_any()
                .downcast_ref::<Float64Array>()
                .context("expected Float64Array")?;
            ColumnData::Numeric(arr.iter().map(|v| v.unwrap_or(f64::NAN)).collect())
        }
        DataType::Float32 => {
            let arr = col
                .as_any()
                .downcast_ref::<Float32Array>()
                .context("expected Float32Array")?;
            ColumnData::Numeric(arr.iter().map(|v| v.map_or(f64::NAN, f64::from)).collect())
        }
        DataType::Int32 => {
            let arr = col
                .as_any()
                .downcast_ref::<Int32Array>()
                .context("expected Int32Array")?;
            ColumnData::Numeric(arr.iter().map(|v| v.map_or(f64::NAN, f64::from)).collect())
        }
        DataType::Int64 => {
            let arr = col
                .as_any()
                .downcast_ref::<Int64Array>()
                .context("expected Int64Array")?;
            ColumnData::Numeric(
                arr.iter()
                    .map(|v| v.map_or(f64::NAN, |i| i as f64))
                    .collect(),
            )
        }
        DataType::Utf8 => {
            let arr = col
                .as_any()
                .downcast_ref::<StringArray>()
                .context("expected StringArray")?;
            ColumnData::Categorical(
                arr.iter()
                    .map(|v| v.unwrap_or_default().to_string())
                    .collect(),
            )
        }
        DataType::LargeUtf8 => {
            let arr = col.as_string::<i64>();
            ColumnData::Categorical(
                arr.iter()
                    .map(|v| v.unwrap_or_default().to_string())
                    .collect(),
            )
        }
        DataType::Boolean => {
            let arr = col
                .as_any()
                .downcast_ref::<BooleanArray>()
                .context("expected BooleanArray")?;
            ColumnData::Categorical(
                arr.iter()
                    .map(|v| v.map(|b| b.to_string()).unwrap_or_default())
                    .collect(),
            )
        }
        other => bail!("unsupported column type {other:?} ({n} values)"),
    };
    Ok(data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::{ColumnKind, Value};

    #[test]
    fn csv_with_mixed_columns() {
        let text = "Isovalue,Variant,FramesPerSecond\n0.1,iso,30\n0.2,ess_d1,\n";
        let ds = read_csv(csv::Reader::from_reader(text.as_bytes())).unwrap();

        assert_eq!(ds.len(), 2);
        assert_eq!(ds.column_names(), vec!["Isovalue", "Variant", "FramesPerSecond"]);
        assert_eq!(ds.column("Variant").unwrap().kind(), ColumnKind::Categorical);

        let fps = ds.require_numeric("FramesPerSecond", "test").unwrap();
        assert_eq!(fps[0], 30.0);
        assert!(fps[1].is_nan());
    }

    #[test]
    fn csv_header_only_gives_empty_dataset() {
        let text = "Isovalue,FramesPerSecond\n";
        let ds = read_csv(csv::Reader::from_reader(text.as_bytes())).unwrap();
        assert!(ds.is_empty());
        assert_eq!(ds.column_names().len(), 2);
    }

    #[test]
    fn json_records() {
        let text = r#"[
            {"Isovalue": 0.1, "Label": "a", "TimePerFrame (ms)": 12},
            {"Isovalue": null, "Label": "b", "TimePerFrame (ms)": 14.5}
        ]"#;
        let ds = parse_json(text).unwrap();

        assert_eq!(ds.len(), 2);
        assert!(ds.require_numeric("Isovalue", "test").unwrap()[1].is_nan());
        assert_eq!(ds.column("Label").unwrap().get(1), Value::from("b"));
        assert_eq!(
            ds.require_numeric("TimePerFrame (ms)", "test").unwrap(),
            &[12.0, 14.5][..]
        );
    }

    #[test]
    fn json_columns_keep_file_order() {
        let text = r#"[{"StepSizeLarge": 1, "Isovalue": 0.1, "FramesPerSecond": 30}]"#;
        let ds = parse_json(text).unwrap();
        assert_eq!(
            ds.column_names(),
            vec!["StepSizeLarge", "Isovalue", "FramesPerSecond"]
        );
    }

    #[test]
    fn json_rejects_non_array() {
        assert!(parse_json(r#"{"Isovalue": 1}"#).is_err());
    }

    #[test]
    fn unknown_extension_is_an_error() {
        let err = load_file(Path::new("runs.xlsx")).unwrap_err();
        assert!(err.to_string().contains(".xlsx"));
    }
}
