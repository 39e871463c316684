use std::collections::BTreeMap;
use std::io::Read;
use std::path::Path;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use arrow::array::{
    Array, AsArray, BooleanArray, Float32Array, Float64Array, Int32Array, Int64Array,
    LargeListArray, ListArray, StringArray,
};
use arrow::datatypes::DataType;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use serde_json::Value as JsonValue;

use super::model::{MetadataValue, SpectralDataset, Spectrum};

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Load a spectral dataset from a file. Dispatch by extension.
///
/// Supported formats:
/// * `.parquet` – Parquet file with `x` and `y` list columns (recommended)
/// * `.json`    – `[{ "x": [...], "y": [...], ...meta }, ...]`
/// * `.csv`     – either the nested layout (`x`/`y` columns holding
///   semicolon-separated floats) or a wide numeric table whose first column
///   is the wavelength axis and every further column one reflectance series
/// * `.txt`     – wide numeric table with a sniffed delimiter
pub fn load_file(path: &Path) -> Result<SpectralDataset> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    match ext.as_str() {
        "parquet" | "pq" => load_parquet(path),
        "json" => {
            let text = std::fs::read_to_string(path).context("reading JSON file")?;
            parse_json(&text)
        }
        "csv" => {
            let file = std::fs::File::open(path).context("opening CSV file")?;
            parse_delimited(file, b',')
        }
        "txt" => {
            let text = std::fs::read_to_string(path).context("reading TXT file")?;
            parse_txt(&text)
        }
        other => bail!("Unsupported file extension: .{other}"),
    }
}

// ---------------------------------------------------------------------------
// JSON loader
// ---------------------------------------------------------------------------

/// Expected JSON schema (records-oriented):
///
/// ```json
/// [
///   {
///     "x": [2100.0, 2101.0, ...],
///     "y": [0.82,   0.84,  ...],
///     "sample": "olivine",
///     "grain_size": 45
///   },
///   ...
/// ]
/// ```
fn parse_json(text: &str) -> Result<SpectralDataset> {
    let root: JsonValue = serde_json::from_str(text).context("parsing JSON")?;

    let records = root.as_array().context("Expected top-level JSON array")?;

    let mut spectra = Vec::with_capacity(records.len());

    for (i, rec) in records.iter().enumerate() {
        let obj = rec
            .as_object()
            .with_context(|| format!("Row {i} is not a JSON object"))?;

        let wavelength = json_array_to_f64(obj.get("x"), i, "x")?;
        let reflectance = json_array_to_f64(obj.get("y"), i, "y")?;

        let mut metadata = BTreeMap::new();
        for (key, val) in obj {
            if key == "x" || key == "y" {
                continue;
            }
            metadata.insert(key.clone(), json_to_metadata(val));
        }

        spectra.push(Spectrum {
            wavelength,
            reflectance,
            metadata,
        });
    }

    Ok(SpectralDataset::from_spectra(spectra))
}

fn json_array_to_f64(val: Option<&JsonValue>, row: usize, col: &str) -> Result<Vec<f64>> {
    let arr = val
        .and_then(|v| v.as_array())
        .with_context(|| format!("Row {row}: missing or invalid '{col}' array"))?;

    arr.iter()
        .enumerate()
        .map(|(j, v)| {
            v.as_f64()
                .with_context(|| format!("Row {row}, {col}[{j}]: not a number"))
        })
        .collect()
}

fn json_to_metadata(val: &JsonValue) -> MetadataValue {
    match val {
        JsonValue::String(s) => MetadataValue::String(s.clone()),
        JsonValue::Number(n) => {
            if let Some(i) = n.as_i64() {
                MetadataValue::Integer(i)
            } else if let Some(f) = n.as_f64() {
                MetadataValue::Float(f)
            } else {
                MetadataValue::String(n.to_string())
            }
        }
        JsonValue::Bool(b) => MetadataValue::Bool(*b),
        JsonValue::Null => MetadataValue::Null,
        other => MetadataValue::String(other.to_string()),
    }
}

// ---------------------------------------------------------------------------
// Delimited-text loader (CSV / TXT)
// ---------------------------------------------------------------------------

/// Parse delimited text, picking the layout from the first row:
///
/// * a row naming both `x` and `y` selects the nested layout, where those
///   columns hold semicolon-separated float lists and every other column is
///   per-spectrum metadata;
/// * anything else selects the wide layout: column 0 is the shared
///   wavelength axis, each further column one reflectance series. A first
///   row that fails to parse as numbers is taken as series names.
fn parse_delimited<R: Read>(reader: R, delimiter: u8) -> Result<SpectralDataset> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .delimiter(delimiter)
        .flexible(true)
        .from_reader(reader);

    let mut rows: Vec<Vec<String>> = Vec::new();
    for (row_no, record) in csv_reader.records().enumerate() {
        let record = record.with_context(|| format!("reading row {row_no}"))?;
        let cells: Vec<String> = record.iter().map(|c| c.trim().to_string()).collect();
        if cells.iter().all(|c| c.is_empty()) {
            continue;
        }
        rows.push(cells);
    }

    if rows.is_empty() {
        bail!("file contains no data rows");
    }

    let header = &rows[0];
    if header.iter().any(|h| h == "x") && header.iter().any(|h| h == "y") {
        parse_nested_rows(&rows)
    } else {
        parse_wide_rows(&rows)
    }
}

/// Nested layout: header row with column names, `x`/`y` cells holding
/// semicolon-separated floats such as `"2100.0;2101.0;2102.0"`.
fn parse_nested_rows(rows: &[Vec<String>]) -> Result<SpectralDataset> {
    let header = &rows[0];
    let x_idx = header.iter().position(|h| h == "x").context("missing 'x' column")?;
    let y_idx = header.iter().position(|h| h == "y").context("missing 'y' column")?;

    let mut spectra = Vec::with_capacity(rows.len() - 1);

    for (row_no, cells) in rows.iter().enumerate().skip(1) {
        let wavelength =
            parse_semicolon_floats(cells.get(x_idx).map(String::as_str).unwrap_or(""), row_no, "x")?;
        let reflectance =
            parse_semicolon_floats(cells.get(y_idx).map(String::as_str).unwrap_or(""), row_no, "y")?;

        let mut metadata = BTreeMap::new();
        for (col_idx, value) in cells.iter().enumerate() {
            if col_idx == x_idx || col_idx == y_idx || col_idx >= header.len() {
                continue;
            }
            metadata.insert(header[col_idx].clone(), guess_metadata_type(value));
        }

        spectra.push(Spectrum {
            wavelength,
            reflectance,
            metadata,
        });
    }

    Ok(SpectralDataset::from_spectra(spectra))
}

/// Wide layout: first column is the wavelength axis, each further column one
/// reflectance series running down the rows.
fn parse_wide_rows(rows: &[Vec<String>]) -> Result<SpectralDataset> {
    let n_cols = rows[0].len();
    if n_cols < 2 {
        bail!("wide table needs a wavelength column and at least one series column");
    }

    // A non-numeric first row names the series; otherwise data starts at row 0.
    let has_header = rows[0].iter().any(|c| c.parse::<f64>().is_err());
    let names: Vec<String> = if has_header {
        rows[0].clone()
    } else {
        (0..n_cols).map(|i| format!("column {}", i + 1)).collect()
    };
    let data = if has_header { &rows[1..] } else { rows };
    if data.is_empty() {
        bail!("wide table has a header but no data rows");
    }

    let mut wavelength = Vec::with_capacity(data.len());
    let mut series: Vec<Vec<f64>> = vec![Vec::with_capacity(data.len()); n_cols - 1];

    for (row_no, cells) in data.iter().enumerate() {
        wavelength.push(parse_cell(cells, 0, row_no)?);
        for (col, values) in series.iter_mut().enumerate() {
            values.push(parse_cell(cells, col + 1, row_no)?);
        }
    }

    let spectra = series
        .into_iter()
        .enumerate()
        .map(|(col, reflectance)| {
            let mut metadata = BTreeMap::new();
            metadata.insert(
                "series".to_string(),
                MetadataValue::String(names[col + 1].clone()),
            );
            Spectrum {
                wavelength: wavelength.clone(),
                reflectance,
                metadata,
            }
        })
        .collect();

    Ok(SpectralDataset::from_spectra(spectra))
}

fn parse_cell(cells: &[String], col: usize, row: usize) -> Result<f64> {
    let cell = cells
        .get(col)
        .with_context(|| format!("Row {row}: missing value in column {col}"))?;
    cell.parse::<f64>()
        .with_context(|| format!("Row {row}, column {col}: '{cell}' is not a number"))
}

fn parse_semicolon_floats(s: &str, row: usize, col: &str) -> Result<Vec<f64>> {
    s.split(';')
        .enumerate()
        .map(|(j, tok)| {
            tok.trim()
                .parse::<f64>()
                .with_context(|| format!("Row {row}, {col}[{j}]: '{tok}' is not a number"))
        })
        .collect()
}

fn guess_metadata_type(s: &str) -> MetadataValue {
    if s.is_empty() {
        return MetadataValue::Null;
    }
    if let Ok(i) = s.parse::<i64>() {
        return MetadataValue::Integer(i);
    }
    if let Ok(f) = s.parse::<f64>() {
        return MetadataValue::Float(f);
    }
    if s == "true" || s == "false" {
        return MetadataValue::Bool(s == "true");
    }
    MetadataValue::String(s.to_string())
}

/// TXT files carry wide tables with whatever delimiter the instrument
/// software wrote. Pick the delimiter that appears most in the first data
/// line; fall back to collapsing whitespace runs into commas.
fn parse_txt(text: &str) -> Result<SpectralDataset> {
    let first_line = text.lines().find(|l| !l.trim().is_empty()).unwrap_or("");
    let candidates = [b'\t', b';', b','];
    let best = candidates
        .iter()
        .map(|&d| (d, first_line.matches(d as char).count()))
        .max_by_key(|&(_, count)| count)
        .filter(|&(_, count)| count > 0)
        .map(|(d, _)| d);

    match best {
        Some(delimiter) => parse_delimited(text.as_bytes(), delimiter),
        None => {
            let normalized: String = text
                .lines()
                .map(|l| l.split_whitespace().collect::<Vec<_>>().join(","))
                .collect::<Vec<_>>()
                .join("\n");
            parse_delimited(normalized.as_bytes(), b',')
        }
    }
}

// ---------------------------------------------------------------------------
// Parquet loader
// ---------------------------------------------------------------------------

/// Load a Parquet file containing spectral data.
///
/// Expected schema:
/// - `x`: List<Float64> or LargeList<Float64> – wavelength arrays
/// - `y`: List<Float64> or LargeList<Float64> – reflectance arrays
/// - Any other columns are treated as metadata (strings, ints, floats, bools)
///
/// Works with files written by both **Pandas** (`df.to_parquet()`) and
/// **Polars** (`df.write_parquet()`).
fn load_parquet(path: &Path) -> Result<SpectralDataset> {
    let file = std::fs::File::open(path).context("opening parquet file")?;
    let builder =
        ParquetRecordBatchReaderBuilder::try_new(file).context("reading parquet metadata")?;
    let reader = builder.build().context("building parquet reader")?;

    let mut spectra = Vec::new();

    for batch_result in reader {
        let batch = batch_result.context("reading parquet record batch")?;
        let schema = batch.schema();
        let n_rows = batch.num_rows();

        let x_idx = schema
            .index_of("x")
            .map_err(|_| anyhow::anyhow!("Parquet file missing 'x' column"))?;
        let y_idx = schema
            .index_of("y")
            .map_err(|_| anyhow::anyhow!("Parquet file missing 'y' column"))?;

        let x_col = batch.column(x_idx);
        let y_col = batch.column(y_idx);

        // Collect metadata column indices (everything except x, y)
        let meta_cols: Vec<(usize, String)> = schema
            .fields()
            .iter()
            .enumerate()
            .filter(|(i, _)| *i != x_idx && *i != y_idx)
            .map(|(i, f)| (i, f.name().clone()))
            .collect();

        for row in 0..n_rows {
            let wavelength = extract_f64_list(x_col, row)
                .with_context(|| format!("Row {row}: failed to read 'x'"))?;
            let reflectance = extract_f64_list(y_col, row)
                .with_context(|| format!("Row {row}: failed to read 'y'"))?;

            let mut metadata = BTreeMap::new();
            for (col_idx, col_name) in &meta_cols {
                let col_array = batch.column(*col_idx);
                let value = extract_metadata_value(col_array, row);
                metadata.insert(col_name.clone(), value);
            }

            spectra.push(Spectrum {
                wavelength,
                reflectance,
                metadata,
            });
        }
    }

    Ok(SpectralDataset::from_spectra(spectra))
}

// -- Parquet / Arrow helpers --

/// Extract a `Vec<f64>` from a List or LargeList column at the given row.
fn extract_f64_list(col: &Arc<dyn Array>, row: usize) -> Result<Vec<f64>> {
    if col.is_null(row) {
        bail!("null value in list column");
    }

    let values_array = match col.data_type() {
        DataType::List(_) => {
            let list_arr = col
                .as_any()
                .downcast_ref::<ListArray>()
                .context("expected ListArray")?;
            list_arr.value(row)
        }
        DataType::LargeList(_) => {
            let list_arr = col
                .as_any()
                .downcast_ref::<LargeListArray>()
                .context("expected LargeListArray")?;
            list_arr.value(row)
        }
        other => bail!("Expected List or LargeList column, got {other:?}"),
    };

    // The inner array can be Float64 or Float32
    if let Some(f64_arr) = values_array.as_any().downcast_ref::<Float64Array>() {
        Ok(f64_arr.iter().map(|v| v.unwrap_or(f64::NAN)).collect())
    } else if let Some(f32_arr) = values_array.as_any().downcast_ref::<Float32Array>() {
        Ok(f32_arr.iter().map(|v| v.unwrap_or(f32::NAN) as f64).collect())
    } else {
        bail!(
            "List inner type is {:?}, expected Float64 or Float32",
            values_array.data_type()
        )
    }
}

/// Extract a single metadata value from an Arrow column at a given row.
fn extract_metadata_value(col: &Arc<dyn Array>, row: usize) -> MetadataValue {
    if col.is_null(row) {
        return MetadataValue::Null;
    }
    match col.data_type() {
        DataType::Utf8 | DataType::LargeUtf8 => {
            if let Some(s) = col.as_any().downcast_ref::<StringArray>() {
                MetadataValue::String(s.value(row).to_string())
            } else {
                // LargeStringArray
                let s = col.as_string::<i64>();
                MetadataValue::String(s.value(row).to_string())
            }
        }
        DataType::Int32 => {
            let arr = col.as_any().downcast_ref::<Int32Array>().unwrap();
            MetadataValue::Integer(arr.value(row) as i64)
        }
        DataType::Int64 => {
            let arr = col.as_any().downcast_ref::<Int64Array>().unwrap();
            MetadataValue::Integer(arr.value(row))
        }
        DataType::Float32 => {
            let arr = col.as_any().downcast_ref::<Float32Array>().unwrap();
            MetadataValue::Float(arr.value(row) as f64)
        }
        DataType::Float64 => {
            let arr = col.as_any().downcast_ref::<Float64Array>().unwrap();
            MetadataValue::Float(arr.value(row))
        }
        DataType::Boolean => {
            let arr = col.as_any().downcast_ref::<BooleanArray>().unwrap();
            MetadataValue::Bool(arr.value(row))
        }
        _ => MetadataValue::String(format!("{:?}", col.data_type())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_records_with_metadata() {
        let text = r#"[
            {"x": [1.0, 2.0], "y": [0.9, 0.8], "sample": "olivine", "grain_size": 45},
            {"x": [1.0, 2.0], "y": [0.7, 0.6], "sample": "pyroxene", "grain_size": 45}
        ]"#;
        let ds = parse_json(text).unwrap();
        assert_eq!(ds.len(), 2);
        assert_eq!(ds.spectra[0].wavelength, vec![1.0, 2.0]);
        assert_eq!(ds.spectra[1].reflectance, vec![0.7, 0.6]);
        assert_eq!(
            ds.spectra[0].metadata.get("sample"),
            Some(&MetadataValue::String("olivine".to_string()))
        );
        assert_eq!(ds.column_names, vec!["grain_size", "sample"]);
    }

    #[test]
    fn json_rejects_non_numeric_values() {
        let text = r#"[{"x": [1.0, "a"], "y": [0.9, 0.8]}]"#;
        assert!(parse_json(text).is_err());
    }

    #[test]
    fn nested_csv_layout() {
        let text = "sample,x,y\nolivine,1.0;2.0;3.0,0.9;0.8;0.85\n";
        let ds = parse_delimited(text.as_bytes(), b',').unwrap();
        assert_eq!(ds.len(), 1);
        assert_eq!(ds.spectra[0].wavelength, vec![1.0, 2.0, 3.0]);
        assert_eq!(ds.spectra[0].reflectance, vec![0.9, 0.8, 0.85]);
        assert_eq!(
            ds.spectra[0].metadata.get("sample"),
            Some(&MetadataValue::String("olivine".to_string()))
        );
    }

    #[test]
    fn wide_csv_with_series_names() {
        let text = "wavelength,basalt,gypsum\n1.0,0.9,0.8\n2.0,0.85,0.75\n3.0,0.8,0.7\n";
        let ds = parse_delimited(text.as_bytes(), b',').unwrap();
        assert_eq!(ds.len(), 2);
        assert_eq!(ds.spectra[0].wavelength, vec![1.0, 2.0, 3.0]);
        assert_eq!(ds.spectra[0].reflectance, vec![0.9, 0.85, 0.8]);
        assert_eq!(
            ds.spectra[1].metadata.get("series"),
            Some(&MetadataValue::String("gypsum".to_string()))
        );
    }

    #[test]
    fn wide_csv_without_header() {
        let text = "1.0,0.9\n2.0,0.85\n";
        let ds = parse_delimited(text.as_bytes(), b',').unwrap();
        assert_eq!(ds.len(), 1);
        assert_eq!(ds.spectra[0].wavelength, vec![1.0, 2.0]);
        assert_eq!(ds.spectra[0].reflectance, vec![0.9, 0.85]);
    }

    #[test]
    fn wide_table_rejects_non_numeric_data_cell() {
        let text = "wavelength,a\n1.0,0.9\n2.0,oops\n";
        assert!(parse_delimited(text.as_bytes(), b',').is_err());
    }

    #[test]
    fn txt_sniffs_tab_delimiter() {
        let text = "1.0\t0.9\t0.8\n2.0\t0.85\t0.75\n";
        let ds = parse_txt(text).unwrap();
        assert_eq!(ds.len(), 2);
        assert_eq!(ds.spectra[1].reflectance, vec![0.8, 0.75]);
    }

    #[test]
    fn txt_falls_back_to_whitespace() {
        let text = "1.0  0.9\n2.0  0.85\n";
        let ds = parse_txt(text).unwrap();
        assert_eq!(ds.len(), 1);
        assert_eq!(ds.spectra[0].wavelength, vec![1.0, 2.0]);
    }
}
