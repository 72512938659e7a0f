use std::path::Path;

use arrow::array::{Array, ArrayRef, AsArray};
use arrow::compute::{cast, concat_batches};
use arrow::datatypes::{DataType, Float64Type, Int64Type, UInt64Type};
use arrow::util::display::{ArrayFormatter, FormatOptions};
use bytes::Bytes;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use serde::Deserialize;
use serde_json::Value as JsonValue;

use super::error::LoadError;
use super::model::{CellValue, Column, ColumnKind, Table};

// ---------------------------------------------------------------------------
// Public entry-points
// ---------------------------------------------------------------------------

/// Supported on-disk formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFormat {
    Parquet,
    Csv,
    Json,
}

impl FileFormat {
    /// Pick the format from the file extension.
    pub fn from_path(path: &Path) -> Result<Self, LoadError> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_ascii_lowercase();

        match ext.as_str() {
            "parquet" | "pq" => Ok(FileFormat::Parquet),
            "csv" => Ok(FileFormat::Csv),
            "json" => Ok(FileFormat::Json),
            other => Err(LoadError::UnsupportedExtension(other.to_string())),
        }
    }
}

/// Load a table from a file.  Dispatch by extension.
///
/// Supported formats:
/// * `.parquet` / `.pq` – any flat Parquet file (recommended)
/// * `.csv`             – header row plus one record per row
/// * `.json`            – `[{ "col": value, ... }, ...]`
pub fn load_file(path: &Path) -> Result<Table, LoadError> {
    let format = FileFormat::from_path(path)?;
    let data = std::fs::read(path)?;
    load_bytes(data, format)
}

/// Load a table from raw uploaded bytes.
pub fn load_bytes(data: impl Into<Bytes>, format: FileFormat) -> Result<Table, LoadError> {
    let data = data.into();
    let table = match format {
        FileFormat::Parquet => load_parquet(data)?,
        FileFormat::Csv => load_csv(&data)?,
        FileFormat::Json => load_json(&data)?,
    };
    log::debug!("Loaded {format:?} table with shape {:?}", table.shape());
    Ok(table)
}

// ---------------------------------------------------------------------------
// Parquet loader
// ---------------------------------------------------------------------------

/// Load a Parquet file.  The schema comes from the file's own metadata.
///
/// Works with files written by both **Pandas** (`df.to_parquet()`) and
/// **Polars** (`df.write_parquet()`).  All record batches are concatenated
/// into a single table.  Columns Pandas stored for the DataFrame index are
/// not data and are left out.
fn load_parquet(data: Bytes) -> Result<Table, LoadError> {
    let builder = ParquetRecordBatchReaderBuilder::try_new(data)?;
    let schema = builder.schema().clone();
    let reader = builder.build()?;

    let batches = reader.collect::<Result<Vec<_>, _>>()?;
    let batch = concat_batches(&schema, &batches)?;

    let index_columns = pandas_index_columns(schema.metadata().get(PANDAS_METADATA_KEY));
    if !index_columns.is_empty() {
        log::debug!("Skipping Pandas index columns {index_columns:?}");
    }

    let columns = schema
        .fields()
        .iter()
        .zip(batch.columns())
        .filter(|(field, _)| !index_columns.contains(field.name()))
        .map(|(field, array)| {
            let kind = kind_of(field.data_type());
            let values = arrow_values(array, kind)?;
            Ok(Column::new(field.name().clone(), kind, values))
        })
        .collect::<Result<Vec<_>, LoadError>>()?;

    Ok(Table::new(columns)?)
}

// -- Pandas metadata --

/// Schema metadata key under which `df.to_parquet()` stores its own schema.
const PANDAS_METADATA_KEY: &str = "pandas";

#[derive(Debug, Default, Deserialize)]
struct PandasMetadata {
    /// Column names, or `{"kind": "range", ...}` objects for a RangeIndex
    /// that was not materialised as a column.
    #[serde(default)]
    index_columns: Vec<JsonValue>,
}

/// Names of the materialised index columns listed in the Pandas metadata.
///
/// Unreadable metadata is ignored and every column is kept.
fn pandas_index_columns(raw: Option<&String>) -> Vec<String> {
    let Some(raw) = raw else {
        return Vec::new();
    };
    match serde_json::from_str::<PandasMetadata>(raw) {
        Ok(meta) => meta
            .index_columns
            .into_iter()
            .filter_map(|c| c.as_str().map(str::to_string))
            .collect(),
        Err(e) => {
            log::warn!("Ignoring unreadable Pandas metadata: {e}");
            Vec::new()
        }
    }
}

// -- Arrow helpers --

fn is_string_type(dt: &DataType) -> bool {
    matches!(dt, DataType::Utf8 | DataType::LargeUtf8 | DataType::Utf8View)
}

/// Classify an Arrow type the way `select_dtypes` would.
fn kind_of(dt: &DataType) -> ColumnKind {
    match dt {
        d if d.is_integer() || d.is_floating() => ColumnKind::Numeric,
        DataType::Decimal128(..) | DataType::Decimal256(..) => ColumnKind::Numeric,
        d if is_string_type(d) => ColumnKind::Categorical,
        // Pandas `category` dtype, whatever the category values are
        DataType::Dictionary(..) => ColumnKind::Categorical,
        _ => ColumnKind::Other,
    }
}

/// Convert a whole Arrow column to cells.
fn arrow_values(array: &ArrayRef, kind: ColumnKind) -> Result<Vec<CellValue>, LoadError> {
    let dt = array.data_type();
    let values = match kind {
        ColumnKind::Numeric if *dt == DataType::UInt64 => array
            .as_primitive::<UInt64Type>()
            .iter()
            .map(|v| match v {
                Some(v) => i64::try_from(v)
                    .map(CellValue::Integer)
                    .unwrap_or(CellValue::Float(v as f64)),
                None => CellValue::Null,
            })
            .collect(),
        ColumnKind::Numeric if dt.is_integer() => cast(array, &DataType::Int64)?
            .as_primitive::<Int64Type>()
            .iter()
            .map(|v| v.map_or(CellValue::Null, CellValue::Integer))
            .collect(),
        ColumnKind::Numeric => cast(array, &DataType::Float64)?
            .as_primitive::<Float64Type>()
            .iter()
            .map(|v| v.map_or(CellValue::Null, CellValue::Float))
            .collect(),
        ColumnKind::Categorical => cast(array, &DataType::Utf8)?
            .as_string::<i32>()
            .iter()
            .map(|v| v.map_or(CellValue::Null, |s| CellValue::String(s.to_string())))
            .collect(),
        ColumnKind::Other if *dt == DataType::Boolean => array
            .as_boolean()
            .iter()
            .map(|v| v.map_or(CellValue::Null, CellValue::Bool))
            .collect(),
        ColumnKind::Other => {
            let temporal = dt.is_temporal();
            let formatter = ArrayFormatter::try_new(array.as_ref(), &FormatOptions::default())?;
            (0..array.len())
                .map(|row| {
                    if array.is_null(row) {
                        return CellValue::Null;
                    }
                    let text = formatter.value(row).to_string();
                    if temporal {
                        CellValue::Date(text)
                    } else {
                        CellValue::String(text)
                    }
                })
                .collect()
        }
    };
    Ok(values)
}

// ---------------------------------------------------------------------------
// CSV loader
// ---------------------------------------------------------------------------

/// CSV layout: header row with column names, one record per row.
/// Empty cells are nulls; each column's kind is inferred from its contents.
fn load_csv(data: &[u8]) -> Result<Table, LoadError> {
    let mut reader = csv::Reader::from_reader(data);
    let headers: Vec<String> = reader.headers()?.iter().map(|h| h.to_string()).collect();

    let mut raw: Vec<Vec<Option<String>>> = vec![Vec::new(); headers.len()];
    for result in reader.records() {
        let record = result?;
        if record.len() != headers.len() {
            return Err(LoadError::Malformed(format!(
                "CSV line {}: expected {} fields, found {}",
                record.position().map_or(0, |p| p.line()),
                headers.len(),
                record.len()
            )));
        }
        for (cells, value) in raw.iter_mut().zip(record.iter()) {
            cells.push((!value.is_empty()).then(|| value.to_string()));
        }
    }

    let columns = headers
        .into_iter()
        .zip(raw)
        .map(|(name, cells)| infer_text_column(name, cells))
        .collect();
    Ok(Table::new(columns)?)
}

/// Pick the narrowest kind that fits every non-null cell.
fn infer_text_column(name: String, cells: Vec<Option<String>>) -> Column {
    let present = || cells.iter().flatten();

    let (kind, values) = if present().next().is_none() {
        (ColumnKind::Other, vec![CellValue::Null; cells.len()])
    } else if present().all(|s| s.parse::<i64>().is_ok()) {
        (ColumnKind::Numeric, map_cells(&cells, |s| s.parse().map(CellValue::Integer).ok()))
    } else if present().all(|s| s.parse::<f64>().is_ok()) {
        (ColumnKind::Numeric, map_cells(&cells, |s| s.parse().map(CellValue::Float).ok()))
    } else if present().all(|s| s == "true" || s == "false") {
        (ColumnKind::Other, map_cells(&cells, |s| Some(CellValue::Bool(s == "true"))))
    } else {
        (
            ColumnKind::Categorical,
            map_cells(&cells, |s| Some(CellValue::String(s.to_string()))),
        )
    };
    Column::new(name, kind, values)
}

fn map_cells(cells: &[Option<String>], f: impl Fn(&str) -> Option<CellValue>) -> Vec<CellValue> {
    cells
        .iter()
        .map(|c| c.as_deref().and_then(&f).unwrap_or(CellValue::Null))
        .collect()
}

// ---------------------------------------------------------------------------
// JSON loader
// ---------------------------------------------------------------------------

/// Expected JSON schema (records-oriented, the default `df.to_json(orient='records')`):
///
/// ```json
/// [
///   { "sepal_length": 5.1, "species": "setosa" },
///   ...
/// ]
/// ```
///
/// Columns appear in first-seen key order; a missing key is a null.
fn load_json(data: &[u8]) -> Result<Table, LoadError> {
    let root: JsonValue = serde_json::from_slice(data)?;
    let records = root
        .as_array()
        .ok_or_else(|| LoadError::Malformed("expected top-level JSON array".to_string()))?;

    let mut names: Vec<String> = Vec::new();
    for (i, rec) in records.iter().enumerate() {
        let obj = rec
            .as_object()
            .ok_or_else(|| LoadError::Malformed(format!("row {i} is not a JSON object")))?;
        for key in obj.keys() {
            if !names.contains(key) {
                names.push(key.clone());
            }
        }
    }

    let columns = names
        .into_iter()
        .map(|name| {
            let cells: Vec<&JsonValue> = records
                .iter()
                .map(|rec| rec.get(&name).unwrap_or(&JsonValue::Null))
                .collect();
            infer_json_column(name, &cells)
        })
        .collect();
    Ok(Table::new(columns)?)
}

fn infer_json_column(name: String, cells: &[&JsonValue]) -> Column {
    let present = || cells.iter().filter(|v| !v.is_null());

    let kind = if present().next().is_none() {
        ColumnKind::Other
    } else if present().all(|v| v.is_number()) {
        ColumnKind::Numeric
    } else if present().all(|v| v.is_boolean()) {
        ColumnKind::Other
    } else {
        ColumnKind::Categorical
    };
    let all_ints = present().all(|v| v.is_i64());

    let values = cells
        .iter()
        .map(|v| match (kind, v) {
            (_, JsonValue::Null) => CellValue::Null,
            (ColumnKind::Numeric, JsonValue::Number(n)) if all_ints => {
                n.as_i64().map_or(CellValue::Null, CellValue::Integer)
            }
            (ColumnKind::Numeric, JsonValue::Number(n)) => {
                n.as_f64().map_or(CellValue::Null, CellValue::Float)
            }
            (_, JsonValue::Bool(b)) if kind == ColumnKind::Other => CellValue::Bool(*b),
            (_, JsonValue::String(s)) => CellValue::String(s.clone()),
            (_, other) => CellValue::String(other.to_string()),
        })
        .collect();
    Column::new(name, kind, values)
}

#[cfg(test)]
mod tests {
    use std::io::Write;
    use std::sync::Arc;

    use std::collections::HashMap;

    use arrow::array::{
        BooleanArray, Date32Array, Decimal128Array, DictionaryArray, Float32Array, Int32Array,
        Int64Array, Int8Array, LargeStringArray, StringArray, StringViewArray,
        TimestampMillisecondArray, UInt64Array, UInt8Array,
    };
    use arrow::datatypes::{Field, Int8Type, Schema};
    use arrow::record_batch::RecordBatch;
    use parquet::arrow::ArrowWriter;
    use parquet::file::properties::WriterProperties;

    use super::*;
    use crate::data::model::RowId;

    fn parquet_bytes(batches: &[RecordBatch], max_rows_per_group: Option<usize>) -> Vec<u8> {
        let props = max_rows_per_group.map(|n| {
            WriterProperties::builder()
                .set_max_row_group_size(n)
                .build()
        });
        let mut writer = ArrowWriter::try_new(Vec::new(), batches[0].schema(), props).unwrap();
        for batch in batches {
            writer.write(batch).unwrap();
        }
        writer.into_inner().unwrap()
    }

    fn mixed_batch() -> RecordBatch {
        let schema = Arc::new(Schema::new(vec![
            Field::new("count", DataType::Int32, true),
            Field::new("ratio", DataType::Float32, false),
            Field::new("small", DataType::UInt8, false),
            Field::new("label", DataType::Utf8, true),
            Field::new(
                "group",
                DataType::Dictionary(Box::new(DataType::Int8), Box::new(DataType::Utf8)),
                false,
            ),
            Field::new("flag", DataType::Boolean, false),
        ]));
        let group: DictionaryArray<Int8Type> = vec!["a", "b", "a"].into_iter().collect();
        RecordBatch::try_new(
            schema,
            vec![
                Arc::new(Int32Array::from(vec![Some(1), None, Some(3)])),
                Arc::new(Float32Array::from(vec![0.5, 1.5, 2.5])),
                Arc::new(UInt8Array::from(vec![7, 8, 9])),
                Arc::new(StringArray::from(vec![Some("x"), Some("y"), None])),
                Arc::new(group),
                Arc::new(BooleanArray::from(vec![true, false, true])),
            ],
        )
        .unwrap()
    }

    #[test]
    fn parquet_types_map_to_kinds() {
        let table = load_bytes(parquet_bytes(&[mixed_batch()], None), FileFormat::Parquet).unwrap();

        assert_eq!(table.shape(), (3, 6));
        assert_eq!(
            table.column_names(),
            vec!["count", "ratio", "small", "label", "group", "flag"]
        );

        let kinds: Vec<ColumnKind> = table.columns().iter().map(|c| c.kind).collect();
        assert_eq!(
            kinds,
            vec![
                ColumnKind::Numeric,
                ColumnKind::Numeric,
                ColumnKind::Numeric,
                ColumnKind::Categorical,
                ColumnKind::Categorical,
                ColumnKind::Other,
            ]
        );

        let count = &table.column("count").unwrap().values;
        assert_eq!(count[1], CellValue::Null);
        assert_eq!(count[2], CellValue::Integer(3));
        assert_eq!(table.column("ratio").unwrap().values[1], CellValue::Float(1.5));
        assert_eq!(table.column("small").unwrap().values[0], CellValue::Integer(7));
        assert_eq!(table.column("label").unwrap().values[2], CellValue::Null);
        assert_eq!(
            table.column("group").unwrap().values[1],
            CellValue::String("b".into())
        );
        assert_eq!(table.column("flag").unwrap().values[1], CellValue::Bool(false));
    }

    #[test]
    fn parquet_batches_are_concatenated_in_order() {
        let schema = Arc::new(Schema::new(vec![Field::new("v", DataType::Int32, false)]));
        let batch = |vals: Vec<i32>| {
            RecordBatch::try_new(schema.clone(), vec![Arc::new(Int32Array::from(vals))]).unwrap()
        };
        let data = parquet_bytes(&[batch(vec![0, 1, 2]), batch(vec![3, 4])], Some(2));

        let table = load_bytes(data, FileFormat::Parquet).unwrap();
        assert_eq!(table.num_rows(), 5);
        assert_eq!(table.row_ids()[4], RowId(4));
        assert_eq!(
            table.column("v").unwrap().values,
            (0..5).map(CellValue::Integer).collect::<Vec<_>>()
        );
    }

    fn single_column(name: &str, array: ArrayRef) -> RecordBatch {
        let schema = Arc::new(Schema::new(vec![Field::new(
            name,
            array.data_type().clone(),
            true,
        )]));
        RecordBatch::try_new(schema, vec![array]).unwrap()
    }

    fn load_single(name: &str, array: ArrayRef) -> Column {
        let data = parquet_bytes(&[single_column(name, array)], None);
        let table = load_bytes(data, FileFormat::Parquet).unwrap();
        table.column(name).unwrap().clone()
    }

    #[test]
    fn parquet_decimals_are_numeric_floats() {
        let decimals = Decimal128Array::from(vec![Some(1250), None, Some(-50)])
            .with_precision_and_scale(10, 2)
            .unwrap();
        let col = load_single("price", Arc::new(decimals));
        assert_eq!(col.kind, ColumnKind::Numeric);
        assert_eq!(
            col.values,
            vec![CellValue::Float(12.5), CellValue::Null, CellValue::Float(-0.5)]
        );
    }

    #[test]
    fn parquet_half_floats_are_numeric() {
        let halves = cast(
            &(Arc::new(Float32Array::from(vec![1.5, -2.0])) as ArrayRef),
            &DataType::Float16,
        )
        .unwrap();
        let col = load_single("h", halves);
        assert_eq!(col.kind, ColumnKind::Numeric);
        assert_eq!(col.values, vec![CellValue::Float(1.5), CellValue::Float(-2.0)]);
    }

    #[test]
    fn parquet_large_strings_are_categorical() {
        let col = load_single("s", Arc::new(LargeStringArray::from(vec![Some("p"), None])));
        assert_eq!(col.kind, ColumnKind::Categorical);
        assert_eq!(col.values, vec![CellValue::String("p".into()), CellValue::Null]);
    }

    #[test]
    fn parquet_string_views_are_categorical() {
        let col = load_single("v", Arc::new(StringViewArray::from(vec!["q", "r"])));
        assert_eq!(col.kind, ColumnKind::Categorical);
        assert_eq!(
            col.values,
            vec![CellValue::String("q".into()), CellValue::String("r".into())]
        );
    }

    #[test]
    fn parquet_dates_and_timestamps_are_other() {
        let date = load_single("day", Arc::new(Date32Array::from(vec![Some(0), None])));
        assert_eq!(date.kind, ColumnKind::Other);
        assert_eq!(date.values, vec![CellValue::Date("1970-01-01".into()), CellValue::Null]);

        let ts = load_single("at", Arc::new(TimestampMillisecondArray::from(vec![86_400_000])));
        assert_eq!(ts.kind, ColumnKind::Other);
        assert!(matches!(&ts.values[0], CellValue::Date(s) if s.starts_with("1970-01-02")));
    }

    #[test]
    fn parquet_huge_unsigned_values_fall_back_to_float() {
        let col = load_single("u", Arc::new(UInt64Array::from(vec![5, u64::MAX])));
        assert_eq!(col.kind, ColumnKind::Numeric);
        assert_eq!(
            col.values,
            vec![CellValue::Integer(5), CellValue::Float(u64::MAX as f64)]
        );
    }

    #[test]
    fn dictionaries_of_any_value_type_are_categorical() {
        let codes: DictionaryArray<Int8Type> = DictionaryArray::try_new(
            Int8Array::from(vec![0, 1, 0]),
            Arc::new(Int32Array::from(vec![10, 20])),
        )
        .unwrap();
        let array: ArrayRef = Arc::new(codes);

        let kind = kind_of(array.data_type());
        assert_eq!(kind, ColumnKind::Categorical);
        assert_eq!(
            arrow_values(&array, kind).unwrap(),
            vec![
                CellValue::String("10".into()),
                CellValue::String("20".into()),
                CellValue::String("10".into()),
            ]
        );
    }

    #[test]
    fn pandas_index_columns_are_dropped() {
        let metadata = HashMap::from([(
            PANDAS_METADATA_KEY.to_string(),
            r#"{"index_columns": ["__index_level_0__"], "columns": []}"#.to_string(),
        )]);
        let schema = Arc::new(
            Schema::new(vec![
                Field::new("x", DataType::Float32, false),
                Field::new("__index_level_0__", DataType::Int64, false),
            ])
            .with_metadata(metadata),
        );
        let batch = RecordBatch::try_new(
            schema,
            vec![
                Arc::new(Float32Array::from(vec![0.5, 1.5])),
                Arc::new(Int64Array::from(vec![7, 9])),
            ],
        )
        .unwrap();

        let table = load_bytes(parquet_bytes(&[batch], None), FileFormat::Parquet).unwrap();
        assert_eq!(table.column_names(), vec!["x"]);
        assert_eq!(table.row_ids(), &[RowId(0), RowId(1)]);
    }

    #[test]
    fn pandas_range_index_and_bad_metadata_keep_every_column() {
        let range = r#"{"index_columns": [{"kind": "range", "name": null, "start": 0, "stop": 2, "step": 1}]}"#;
        assert!(pandas_index_columns(Some(&range.to_string())).is_empty());
        assert!(pandas_index_columns(Some(&"not json".to_string())).is_empty());
        assert!(pandas_index_columns(None).is_empty());
    }

    #[test]
    fn garbage_bytes_are_a_load_error() {
        let err = load_bytes(b"definitely not parquet".to_vec(), FileFormat::Parquet).unwrap_err();
        assert!(matches!(err, LoadError::Parquet(_)));
    }

    #[test]
    fn csv_infers_kinds() {
        let data = b"a,b,c,d,e\n1,1.5,x,true,\n2,,y,false,\n3,2,,true,\n".to_vec();
        let table = load_bytes(data, FileFormat::Csv).unwrap();

        assert_eq!(table.shape(), (3, 5));
        let a = table.column("a").unwrap();
        assert_eq!(a.kind, ColumnKind::Numeric);
        assert_eq!(a.values[2], CellValue::Integer(3));

        let b = table.column("b").unwrap();
        assert_eq!(b.kind, ColumnKind::Numeric);
        assert_eq!(b.values, vec![CellValue::Float(1.5), CellValue::Null, CellValue::Float(2.0)]);

        let c = table.column("c").unwrap();
        assert_eq!(c.kind, ColumnKind::Categorical);
        assert_eq!(c.values[2], CellValue::Null);

        assert_eq!(table.column("d").unwrap().kind, ColumnKind::Other);
        assert_eq!(table.column("e").unwrap().kind, ColumnKind::Other);
    }

    #[test]
    fn csv_ragged_record_is_rejected() {
        let err = load_bytes(b"a,b\n1,2\n3\n".to_vec(), FileFormat::Csv).unwrap_err();
        assert!(matches!(err, LoadError::Csv(_) | LoadError::Malformed(_)));
    }

    #[test]
    fn json_records_keep_first_seen_order() {
        let data = br#"[{"z": 1, "a": "p"}, {"a": "q", "m": 2.5}]"#.to_vec();
        let table = load_bytes(data, FileFormat::Json).unwrap();

        assert_eq!(table.column_names(), vec!["z", "a", "m"]);
        let z = table.column("z").unwrap();
        assert_eq!(z.kind, ColumnKind::Numeric);
        assert_eq!(z.values, vec![CellValue::Integer(1), CellValue::Null]);
        assert_eq!(table.column("a").unwrap().kind, ColumnKind::Categorical);
        assert_eq!(table.column("m").unwrap().values[1], CellValue::Float(2.5));
    }

    #[test]
    fn json_must_be_an_array_of_objects() {
        assert!(matches!(
            load_bytes(br#"{"a": 1}"#.to_vec(), FileFormat::Json),
            Err(LoadError::Malformed(_))
        ));
        assert!(matches!(
            load_bytes(b"[1, 2]".to_vec(), FileFormat::Json),
            Err(LoadError::Malformed(_))
        ));
    }

    #[test]
    fn load_file_dispatches_on_extension() {
        let mut file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
        file.write_all(b"x\n1\n2\n").unwrap();
        file.flush().unwrap();

        let table = load_file(file.path()).unwrap();
        assert_eq!(table.shape(), (2, 1));

        let err = load_file(Path::new("data.xlsx")).unwrap_err();
        assert!(matches!(err, LoadError::UnsupportedExtension(ref e) if e == "xlsx"));
    }
}
