use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use arrow::array::{Array, ArrayRef, AsArray};
use arrow::compute::cast;
use arrow::datatypes::{
    DataType, Date32Type, Float32Type, Float64Type, Int16Type, Int32Type, Int64Type,
};
use arrow::error::ArrowError;
use arrow::util::display::array_value_to_string;
use chrono::{NaiveDate, NaiveDateTime};
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use parquet::errors::ParquetError;
use serde_json::Value as JsonValue;
use thiserror::Error;

use super::model::{CellValue, Dataset, Record};

// ---------------------------------------------------------------------------
// Errors and options
// ---------------------------------------------------------------------------

/// Why a dataset could not be loaded. The `Display` text is shown verbatim
/// in the dashboard's error state.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("file not found: {}", .0.display())]
    NotFound(PathBuf),
    #[error("unsupported file extension: .{0}")]
    Unsupported(String),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("CSV parse error: {0}")]
    Csv(#[from] csv::Error),
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Parquet error: {0}")]
    Parquet(#[from] ParquetError),
    #[error("Arrow error: {0}")]
    Arrow(#[from] ArrowError),
    #[error("missing required column '{0}'")]
    MissingColumn(String),
    #[error("row {row}: {message}")]
    Parse { row: usize, message: String },
}

/// Names of the columns with a fixed role in every record.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadOptions {
    pub date_column: String,
    pub region_column: String,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            date_column: "date".to_string(),
            region_column: "region".to_string(),
        }
    }
}

/// Fallback date source when the configured date column is absent.
const YEAR_COLUMN: &str = "year";

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Load the disease dataset from a file.  Dispatch by extension.
///
/// Supported formats:
/// * `.csv`     – header row, one observation per line (the published format)
/// * `.parquet` – flat columns, as written by `df.to_parquet()`
/// * `.json`    – `[{ "date": "...", "region": "...", ... }, ...]`
pub fn load_file(path: &Path, options: &LoadOptions) -> Result<Dataset, LoadError> {
    if !path.is_file() {
        return Err(LoadError::NotFound(path.to_path_buf()));
    }

    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    match ext.as_str() {
        "csv" => load_csv(path, options),
        "parquet" | "pq" => load_parquet(path, options),
        "json" => load_json(path, options),
        other => Err(LoadError::Unsupported(other.to_string())),
    }
}

// ---------------------------------------------------------------------------
// Row assembly shared by all formats
// ---------------------------------------------------------------------------

/// Resolved column roles for one file.
struct Roles {
    date: String,
    region: String,
}

impl Roles {
    fn resolve(headers: &[String], options: &LoadOptions) -> Result<Self, LoadError> {
        let has = |name: &str| headers.iter().any(|h| h == name);

        let date = if has(&options.date_column) {
            options.date_column.clone()
        } else if has(YEAR_COLUMN) {
            log::warn!(
                "no '{}' column, deriving dates from '{YEAR_COLUMN}'",
                options.date_column
            );
            YEAR_COLUMN.to_string()
        } else {
            return Err(LoadError::MissingColumn(options.date_column.clone()));
        };

        if !has(&options.region_column) {
            return Err(LoadError::MissingColumn(options.region_column.clone()));
        }

        Ok(Roles {
            date,
            region: options.region_column.clone(),
        })
    }
}

/// Turn one row of `(column, value)` cells into a [`Record`].
/// `row` is 1-based and only used in error messages.
fn build_record<I>(row: usize, cells: I, roles: &Roles) -> Result<Record, LoadError>
where
    I: IntoIterator<Item = (String, CellValue)>,
{
    let mut date = None;
    let mut region = None;
    let mut fields = BTreeMap::new();

    for (name, value) in cells {
        if name == roles.date {
            date = Some(parse_date(&value).ok_or_else(|| LoadError::Parse {
                row,
                message: format!("'{value}' in column '{name}' is not a date"),
            })?);
        } else if name == roles.region {
            region = match value {
                CellValue::Null => None,
                CellValue::Text(s) => Some(s),
                other => Some(other.to_string()),
            };
        } else {
            fields.insert(name, value);
        }
    }

    let date = date.ok_or_else(|| LoadError::Parse {
        row,
        message: format!("missing value in column '{}'", roles.date),
    })?;
    let region = region.ok_or_else(|| LoadError::Parse {
        row,
        message: format!("missing value in column '{}'", roles.region),
    })?;

    Ok(Record {
        date,
        region,
        fields,
    })
}

/// Parse a date cell. Accepts ISO dates (optionally with a time part),
/// `DD/MM/YYYY`, `YYYY/MM/DD`, `YYYY-MM` and bare years.
pub fn parse_date(value: &CellValue) -> Option<NaiveDate> {
    match value {
        CellValue::Date(d) => Some(*d),
        CellValue::Integer(y) if (1000..=9999).contains(y) => {
            NaiveDate::from_ymd_opt(*y as i32, 1, 1)
        }
        // Integer columns with a missing value come out of Pandas as floats.
        CellValue::Float(y) if y.fract() == 0.0 && (1000.0..=9999.0).contains(y) => {
            NaiveDate::from_ymd_opt(*y as i32, 1, 1)
        }
        CellValue::Text(s) => parse_date_text(s.trim()),
        _ => None,
    }
}

fn parse_date_text(s: &str) -> Option<NaiveDate> {
    const DATE_FORMATS: [&str; 3] = ["%Y-%m-%d", "%d/%m/%Y", "%Y/%m/%d"];
    const DATETIME_FORMATS: [&str; 3] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M"];

    DATE_FORMATS
        .iter()
        .find_map(|f| NaiveDate::parse_from_str(s, f).ok())
        .or_else(|| {
            DATETIME_FORMATS
                .iter()
                .find_map(|f| NaiveDateTime::parse_from_str(s, f).ok())
                .map(|dt| dt.date())
        })
        .or_else(|| NaiveDate::parse_from_str(&format!("{s}-01"), "%Y-%m-%d").ok())
        .or_else(|| match s.parse::<i64>() {
            Ok(y) => parse_date(&CellValue::Integer(y)),
            Err(_) => None,
        })
}

// ---------------------------------------------------------------------------
// CSV loader
// ---------------------------------------------------------------------------

/// CSV layout: header row with column names, one observation per line.
/// Every column other than the date and region is kept as a field.
fn load_csv(path: &Path, options: &LoadOptions) -> Result<Dataset, LoadError> {
    let mut reader = csv::Reader::from_path(path)?;
    let headers: Vec<String> = reader
        .headers()?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();
    let roles = Roles::resolve(&headers, options)?;

    let mut records = Vec::new();
    for (row_no, result) in reader.records().enumerate() {
        let row = result?;
        let cells = headers
            .iter()
            .zip(row.iter())
            .map(|(h, v)| (h.clone(), CellValue::guess(v)));
        records.push(build_record(row_no + 1, cells, &roles)?);
    }

    Ok(Dataset::from_records(headers, records))
}

// ---------------------------------------------------------------------------
// JSON loader
// ---------------------------------------------------------------------------

/// Records-oriented JSON, the default `df.to_json(orient='records')`.
fn load_json(path: &Path, options: &LoadOptions) -> Result<Dataset, LoadError> {
    let text = std::fs::read_to_string(path)?;
    let root: JsonValue = serde_json::from_str(&text)?;

    let rows = root.as_array().ok_or_else(|| LoadError::Parse {
        row: 0,
        message: "expected a top-level JSON array".to_string(),
    })?;

    let mut headers: Vec<String> = Vec::new();
    for obj in rows.iter().filter_map(JsonValue::as_object) {
        for key in obj.keys() {
            if !headers.contains(key) {
                headers.push(key.clone());
            }
        }
    }
    let roles = Roles::resolve(&headers, options)?;

    let mut records = Vec::with_capacity(rows.len());
    for (i, row) in rows.iter().enumerate() {
        let obj = row.as_object().ok_or_else(|| LoadError::Parse {
            row: i + 1,
            message: "not a JSON object".to_string(),
        })?;
        let cells = obj.iter().map(|(k, v)| (k.clone(), json_to_cell(v)));
        records.push(build_record(i + 1, cells, &roles)?);
    }

    Ok(Dataset::from_records(headers, records))
}

fn json_to_cell(val: &JsonValue) -> CellValue {
    match val {
        JsonValue::String(s) => CellValue::Text(s.clone()),
        JsonValue::Number(n) => {
            if let Some(i) = n.as_i64() {
                CellValue::Integer(i)
            } else if let Some(f) = n.as_f64() {
                CellValue::Float(f)
            } else {
                CellValue::Text(n.to_string())
            }
        }
        JsonValue::Bool(b) => CellValue::Bool(*b),
        JsonValue::Null => CellValue::Null,
        other => CellValue::Text(other.to_string()),
    }
}

// ---------------------------------------------------------------------------
// Parquet loader
// ---------------------------------------------------------------------------

/// Load a flat Parquet table. Columns are first narrowed to the handful of
/// Arrow types [`arrow_cell`] understands, see [`normalize_column`].
fn load_parquet(path: &Path, options: &LoadOptions) -> Result<Dataset, LoadError> {
    let file = std::fs::File::open(path)?;
    let builder = ParquetRecordBatchReaderBuilder::try_new(file)?;
    let headers: Vec<String> = builder
        .schema()
        .fields()
        .iter()
        .map(|f| f.name().clone())
        .collect();
    let roles = Roles::resolve(&headers, options)?;
    let reader = builder.build()?;

    let mut records = Vec::new();
    for batch_result in reader {
        let batch = batch_result?;

        let columns = batch
            .columns()
            .iter()
            .map(normalize_column)
            .collect::<Result<Vec<_>, ArrowError>>()?;

        for row in 0..batch.num_rows() {
            let cells = headers
                .iter()
                .zip(&columns)
                .map(|(name, col)| (name.clone(), arrow_cell(col, row)));
            records.push(build_record(records.len() + 1, cells, &roles)?);
        }
    }

    Ok(Dataset::from_records(headers, records))
}

/// Cast a column to a type [`arrow_cell`] reads directly:
/// * dictionaries (Pandas categoricals) are unpacked to their value type
/// * timestamps and `Date64` become `Date32`, so dates survive Pandas or Polars
/// * narrow and unsigned integers widen to `Int64`
/// * `UInt64`, `Float16` and decimals become `Float64`
fn normalize_column(col: &ArrayRef) -> Result<ArrayRef, ArrowError> {
    let target = match col.data_type() {
        DataType::Dictionary(_, value) => return normalize_column(&cast(col, value)?),
        DataType::Timestamp(_, _) | DataType::Date64 => DataType::Date32,
        DataType::Int8 | DataType::UInt8 | DataType::UInt16 | DataType::UInt32 => DataType::Int64,
        DataType::UInt64
        | DataType::Float16
        | DataType::Decimal128(_, _)
        | DataType::Decimal256(_, _) => DataType::Float64,
        DataType::Utf8View => DataType::Utf8,
        _ => return Ok(Arc::clone(col)),
    };
    cast(col, &target)
}

/// Extract a single cell from an Arrow column at a given row. Types not
/// covered by [`normalize_column`] keep their display text.
fn arrow_cell(col: &ArrayRef, row: usize) -> CellValue {
    if col.is_null(row) {
        return CellValue::Null;
    }
    let value = match col.data_type() {
        DataType::Utf8 => col
            .as_string_opt::<i32>()
            .map(|a| CellValue::Text(a.value(row).to_string())),
        DataType::LargeUtf8 => col
            .as_string_opt::<i64>()
            .map(|a| CellValue::Text(a.value(row).to_string())),
        DataType::Int16 => col
            .as_primitive_opt::<Int16Type>()
            .map(|a| CellValue::Integer(a.value(row) as i64)),
        DataType::Int32 => col
            .as_primitive_opt::<Int32Type>()
            .map(|a| CellValue::Integer(a.value(row) as i64)),
        DataType::Int64 => col
            .as_primitive_opt::<Int64Type>()
            .map(|a| CellValue::Integer(a.value(row))),
        DataType::Float32 => col
            .as_primitive_opt::<Float32Type>()
            .map(|a| CellValue::Float(a.value(row) as f64)),
        DataType::Float64 => col
            .as_primitive_opt::<Float64Type>()
            .map(|a| CellValue::Float(a.value(row))),
        DataType::Boolean => col.as_boolean_opt().map(|a| CellValue::Bool(a.value(row))),
        DataType::Date32 => col
            .as_primitive_opt::<Date32Type>()
            .and_then(|a| a.value_as_date(row))
            .map(CellValue::Date),
        _ => array_value_to_string(col, row).ok().map(CellValue::Text),
    };
    value.unwrap_or(CellValue::Null)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    use std::fs;

    use arrow::array::{Date32Array, DictionaryArray, Float64Array, Int8Array, StringArray, UInt16Array};
    use arrow::datatypes::{Field, Schema};
    use arrow::record_batch::RecordBatch;
    use parquet::arrow::ArrowWriter;

    /// Write `contents` to a unique file under the system temp dir.
    pub(crate) fn temp_file(name: &str, contents: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("gdd-{}-{name}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join(name);
        fs::write(&path, contents).unwrap();
        path
    }

    pub(crate) const SAMPLE_CSV: &str = "\
date,region,hiv_incidence,malaria_incidence,tb_incidence,urbanization_level
2019-01-01,Ashanti,1.2,210.5,44,0.61
2019-01-01,Volta,0.9,180.0,39,0.33
2020-01-01,Ashanti,1.4,205.1,41,0.63
2020-01-01,Volta,,175.2,37,0.34
";

    #[test]
    fn csv_rows_and_schema_match_file() {
        let path = temp_file("schema.csv", SAMPLE_CSV);
        let ds = load_file(&path, &LoadOptions::default()).unwrap();

        assert_eq!(ds.len(), 4);
        assert_eq!(
            ds.columns(),
            [
                "date",
                "region",
                "hiv_incidence",
                "malaria_incidence",
                "tb_incidence",
                "urbanization_level"
            ]
        );
        assert_eq!(
            ds.numeric_columns(),
            ["hiv_incidence", "malaria_incidence", "tb_incidence", "urbanization_level"]
        );
        let last = &ds.records()[3];
        assert_eq!(last.region, "Volta");
        assert_eq!(last.date, NaiveDate::from_ymd_opt(2020, 1, 1).unwrap());
        assert_eq!(last.number("hiv_incidence"), None);
        assert_eq!(last.number("tb_incidence"), Some(37.0));
    }

    #[test]
    fn loading_twice_yields_identical_datasets() {
        let path = temp_file("twice.csv", SAMPLE_CSV);
        let a = load_file(&path, &LoadOptions::default()).unwrap();
        let b = load_file(&path, &LoadOptions::default()).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn missing_file_is_reported_as_not_found() {
        let path = std::env::temp_dir().join("gdd-definitely-missing.csv");
        let err = load_file(&path, &LoadOptions::default()).unwrap_err();
        assert!(matches!(err, LoadError::NotFound(_)));
        assert!(err.to_string().contains("file not found"));
    }

    #[test]
    fn bad_date_is_a_parse_error_with_row() {
        let path = temp_file("baddate.csv", "date,region,x\n2020-01-01,Volta,1\nsoon,Volta,2\n");
        match load_file(&path, &LoadOptions::default()) {
            Err(LoadError::Parse { row, message }) => {
                assert_eq!(row, 2);
                assert!(message.contains("soon"));
            }
            other => panic!("expected parse error, got {other:?}"),
        }
    }

    #[test]
    fn ragged_csv_is_rejected() {
        let path = temp_file("ragged.csv", "date,region,x\n2020-01-01,Volta,1,9\n");
        assert!(matches!(
            load_file(&path, &LoadOptions::default()),
            Err(LoadError::Csv(_))
        ));
    }

    #[test]
    fn missing_region_column_is_reported() {
        let path = temp_file("noregion.csv", "date,x\n2020-01-01,1\n");
        assert!(matches!(
            load_file(&path, &LoadOptions::default()),
            Err(LoadError::MissingColumn(c)) if c == "region"
        ));
    }

    #[test]
    fn year_column_is_used_when_date_is_absent() {
        let path = temp_file("year.csv", "year,region,cases\n2018,Central,10\n2019,Central,12\n");
        let ds = load_file(&path, &LoadOptions::default()).unwrap();
        assert_eq!(
            ds.date_range(),
            Some((
                NaiveDate::from_ymd_opt(2018, 1, 1).unwrap(),
                NaiveDate::from_ymd_opt(2019, 1, 1).unwrap()
            ))
        );
        assert!(!ds.records()[0].fields.contains_key("year"));
    }

    #[test]
    fn unsupported_extension_is_rejected() {
        let path = temp_file("data.xlsx", "");
        assert!(matches!(
            load_file(&path, &LoadOptions::default()),
            Err(LoadError::Unsupported(e)) if e == "xlsx"
        ));
    }

    #[test]
    fn date_formats() {
        let d = NaiveDate::from_ymd_opt(2021, 3, 9).unwrap();
        for s in ["2021-03-09", "09/03/2021", "2021/03/09", "2021-03-09 00:00:00", "2021-03-09T12:30:00"] {
            assert_eq!(parse_date(&CellValue::Text(s.into())), Some(d), "{s}");
        }
        assert_eq!(
            parse_date(&CellValue::Text("2021-03".into())),
            NaiveDate::from_ymd_opt(2021, 3, 1)
        );
        assert_eq!(parse_date(&CellValue::Integer(12)), None);
    }

    #[test]
    fn json_records_load() {
        let path = temp_file(
            "records.json",
            r#"[{"date":"2020-01-01","region":"Oti","hiv_incidence":0.5},
                {"date":"2021-01-01","region":"Oti","hiv_incidence":null}]"#,
        );
        let ds = load_file(&path, &LoadOptions::default()).unwrap();
        assert_eq!(ds.len(), 2);
        assert_eq!(ds.records()[0].number("hiv_incidence"), Some(0.5));
        assert!(ds.is_numeric("hiv_incidence"));
    }

    #[test]
    fn json_columns_keep_file_order() {
        let path = temp_file(
            "order.json",
            r#"[{"region":"Oti","date":"2020-01-01","zeta":1,"alpha":2}]"#,
        );
        let ds = load_file(&path, &LoadOptions::default()).unwrap();
        assert_eq!(ds.columns(), ["region", "date", "zeta", "alpha"]);
        assert_eq!(ds.numeric_columns(), ["zeta", "alpha"]);
    }

    #[test]
    fn float_years_are_dates() {
        let path = temp_file("floatyear.csv", "year,region,cases\n2015.0,Oti,1\n,Oti,2\n");
        // The second row has no year at all.
        assert!(matches!(
            load_file(&path, &LoadOptions::default()),
            Err(LoadError::Parse { row: 2, .. })
        ));
        assert_eq!(parse_date(&CellValue::Float(2015.0)), NaiveDate::from_ymd_opt(2015, 1, 1));
        assert_eq!(parse_date(&CellValue::Float(2015.5)), None);
        assert_eq!(parse_date(&CellValue::Float(15.0)), None);

        let path = temp_file("floatyear_ok.csv", "year,region,cases\n2015.0,Oti,1\n2016.0,Oti,\n");
        let ds = load_file(&path, &LoadOptions::default()).unwrap();
        assert_eq!(ds.records()[1].date, NaiveDate::from_ymd_opt(2016, 1, 1).unwrap());
    }

    #[test]
    fn parquet_with_date32_column_loads() {
        let schema = Arc::new(Schema::new(vec![
            Field::new("date", DataType::Date32, false),
            Field::new("region", DataType::Utf8, false),
            Field::new("tb_incidence", DataType::Float64, true),
        ]));
        // 18262 days after the epoch is 2020-01-01.
        let batch = RecordBatch::try_new(
            schema.clone(),
            vec![
                Arc::new(Date32Array::from(vec![18262, 18263])),
                Arc::new(StringArray::from(vec!["Bono", "Bono East"])),
                Arc::new(Float64Array::from(vec![Some(3.5), None])),
            ],
        )
        .unwrap();

        let path = temp_file("table.parquet", "");
        let file = fs::File::create(&path).unwrap();
        let mut writer = ArrowWriter::try_new(file, schema, None).unwrap();
        writer.write(&batch).unwrap();
        writer.close().unwrap();

        let ds = load_file(&path, &LoadOptions::default()).unwrap();
        assert_eq!(ds.len(), 2);
        assert_eq!(ds.records()[0].date, NaiveDate::from_ymd_opt(2020, 1, 1).unwrap());
        assert_eq!(ds.records()[1].region, "Bono East");
        assert_eq!(ds.records()[1].number("tb_incidence"), None);
    }

    #[test]
    fn parquet_dictionary_region_loads() {
        let region_type = DataType::Dictionary(Box::new(DataType::Int32), Box::new(DataType::Utf8));
        let schema = Arc::new(Schema::new(vec![
            Field::new("date", DataType::Date32, false),
            Field::new("region", region_type, false),
            Field::new("tb_incidence", DataType::Int8, true),
            Field::new("cases", DataType::UInt16, true),
        ]));
        let regions: DictionaryArray<Int32Type> = ["Ashanti", "Volta", "Oti"].into_iter().collect();
        let batch = RecordBatch::try_new(
            schema.clone(),
            vec![
                Arc::new(Date32Array::from(vec![18262, 18262, 18263])),
                Arc::new(regions),
                Arc::new(Int8Array::from(vec![Some(40), None, Some(-3)])),
                Arc::new(UInt16Array::from(vec![7, 8, 9])),
            ],
        )
        .unwrap();

        let path = temp_file("categorical.parquet", "");
        let file = fs::File::create(&path).unwrap();
        let mut writer = ArrowWriter::try_new(file, schema, None).unwrap();
        writer.write(&batch).unwrap();
        writer.close().unwrap();

        let ds = load_file(&path, &LoadOptions::default()).unwrap();
        assert_eq!(
            ds.regions().iter().cloned().collect::<Vec<_>>(),
            vec!["Ashanti", "Oti", "Volta"]
        );
        assert_eq!(ds.numeric_columns(), ["tb_incidence", "cases"]);
        assert_eq!(ds.records()[0].number("tb_incidence"), Some(40.0));
        assert_eq!(ds.records()[1].number("tb_incidence"), None);
        assert_eq!(ds.records()[2].fields["tb_incidence"], CellValue::Integer(-3));
        assert_eq!(ds.records()[2].number("cases"), Some(9.0));
    }
}
