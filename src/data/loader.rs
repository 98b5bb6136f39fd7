use std::io::Read;
use std::path::{Path, PathBuf};

use arrow::array::{Array, ArrayRef, AsArray, Float64Array, StringArray};
use arrow::compute::{can_cast_types, cast};
use arrow::datatypes::{DataType, Float64Type};
use calamine::{open_workbook_auto, Data, Range, Reader};
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use serde_json::Value as JsonValue;
use thiserror::Error;

use super::model::{Record, RegionSales, SalesDataset, SALES_SCALE};

/// Columns every source must provide, in the order rows are assembled.
pub const REQUIRED_COLUMNS: [&str; 10] = [
    "Name",
    "Platform",
    "Year",
    "Genre",
    "Publisher",
    "NA_Sales",
    "EU_Sales",
    "JP_Sales",
    "Other_Sales",
    "Total_Sales",
];

const NAME: usize = 0;
const PLATFORM: usize = 1;
const YEAR: usize = 2;
const GENRE: usize = 3;
const PUBLISHER: usize = 4;
const NA: usize = 5;
const EU: usize = 6;
const JP: usize = 7;
const OTHER: usize = 8;
const TOTAL: usize = 9;

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("reading {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("CSV: {0}")]
    Csv(#[from] csv::Error),
    #[error("JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Parquet: {0}")]
    Parquet(#[from] parquet::errors::ParquetError),
    #[error("Arrow: {0}")]
    Arrow(#[from] arrow::error::ArrowError),
    #[error("spreadsheet: {0}")]
    Spreadsheet(#[from] calamine::Error),
    #[error("unsupported file extension: .{0}")]
    UnsupportedExtension(String),
    #[error("missing required column '{0}'")]
    MissingColumn(&'static str),
    #[error("row {row}: invalid {column} value '{value}'")]
    InvalidValue {
        row: usize,
        column: &'static str,
        value: String,
    },
    #[error("column '{column}' has unsupported type {data_type}")]
    UnsupportedColumnType {
        column: &'static str,
        data_type: String,
    },
    #[error("{0}")]
    NotATable(String),
}

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Load a sales table from a file.  Dispatch by extension.
///
/// Supported formats:
/// * `.csv`     – header row with the required column names
/// * `.json`    – `[{ "Name": ..., "Platform": ..., ... }, ...]`
/// * `.parquet` – flat columns, strings and numbers
/// * `.xlsx`, `.xlsm`, `.xlsb`, `.xls`, `.ods` – first sheet, header in the
///   first row
pub fn load_file(path: &Path) -> Result<SalesDataset, LoadError> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    let dataset = match ext.as_str() {
        "csv" => load_csv(open(path)?),
        "json" => load_json(open(path)?),
        "parquet" | "pq" => load_parquet(open(path)?),
        "xlsx" | "xlsm" | "xlsb" | "xls" | "ods" => load_spreadsheet(path),
        other => Err(LoadError::UnsupportedExtension(other.to_string())),
    }?;

    log::info!(
        "Loaded {} records from {} ({} dropped, years {:?})",
        dataset.len(),
        path.display(),
        dataset.dropped,
        dataset.year_bounds
    );
    Ok(dataset)
}

fn open(path: &Path) -> Result<std::fs::File, LoadError> {
    std::fs::File::open(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })
}

// ---------------------------------------------------------------------------
// Row cleaning shared by all formats
// ---------------------------------------------------------------------------

/// A raw cell before cleaning.
#[derive(Debug, Clone, PartialEq)]
enum Cell {
    Text(String),
    Number(f64),
    Null,
}

impl Cell {
    fn from_text(s: &str) -> Cell {
        let s = s.trim();
        if s.is_empty() {
            Cell::Null
        } else {
            Cell::Text(s.to_string())
        }
    }

    /// Text of a categorical field, `None` when missing.
    fn text(&self) -> Option<String> {
        match self {
            Cell::Text(s) if is_missing_marker(s) => None,
            Cell::Text(s) => Some(s.clone()),
            Cell::Number(n) if n.is_nan() => None,
            Cell::Number(n) if n.fract() == 0.0 => Some(format!("{}", *n as i64)),
            Cell::Number(n) => Some(n.to_string()),
            Cell::Null => None,
        }
    }

    fn raw(&self) -> String {
        match self {
            Cell::Text(s) => s.clone(),
            Cell::Number(n) => n.to_string(),
            Cell::Null => String::new(),
        }
    }
}

fn is_missing_marker(s: &str) -> bool {
    matches!(s, "N/A" | "NaN" | "nan" | "null")
}

fn parse_year(cell: &Cell, row: usize) -> Result<Option<i32>, LoadError> {
    let value = match cell {
        Cell::Null => return Ok(None),
        Cell::Text(s) if is_missing_marker(s) => return Ok(None),
        Cell::Number(n) if n.is_nan() => return Ok(None),
        Cell::Number(n) => Some(*n),
        Cell::Text(s) => s.parse::<f64>().ok(),
    };
    match value {
        Some(y) if y.fract() == 0.0 && y.abs() <= i32::MAX as f64 => Ok(Some(y as i32)),
        _ => Err(LoadError::InvalidValue {
            row,
            column: REQUIRED_COLUMNS[YEAR],
            value: cell.raw(),
        }),
    }
}

/// Parse a sales cell (millions of copies) into raw copies; missing is 0.
fn parse_sales(cell: &Cell, row: usize, col: usize) -> Result<f64, LoadError> {
    let millions = match cell {
        Cell::Null => 0.0,
        Cell::Text(s) if is_missing_marker(s) => 0.0,
        Cell::Number(n) if n.is_nan() => 0.0,
        Cell::Number(n) => *n,
        Cell::Text(s) => s.parse::<f64>().map_err(|_| LoadError::InvalidValue {
            row,
            column: REQUIRED_COLUMNS[col],
            value: s.clone(),
        })?,
    };
    Ok(millions * SALES_SCALE)
}

/// Turn one row of cells into a record, or `None` when a required
/// categorical field is missing.
fn clean_row(cells: &[Cell; 10], row: usize) -> Result<Option<Record>, LoadError> {
    let (Some(name), Some(platform), Some(genre), Some(publisher)) = (
        cells[NAME].text(),
        cells[PLATFORM].text(),
        cells[GENRE].text(),
        cells[PUBLISHER].text(),
    ) else {
        return Ok(None);
    };
    let Some(year) = parse_year(&cells[YEAR], row)? else {
        return Ok(None);
    };

    let sales = RegionSales {
        na: parse_sales(&cells[NA], row, NA)?,
        eu: parse_sales(&cells[EU], row, EU)?,
        jp: parse_sales(&cells[JP], row, JP)?,
        other: parse_sales(&cells[OTHER], row, OTHER)?,
        total: parse_sales(&cells[TOTAL], row, TOTAL)?,
    };

    Ok(Some(Record {
        name,
        platform,
        year,
        genre,
        publisher,
        sales,
    }))
}

/// Accumulates cleaned records and counts dropped rows.
#[derive(Default)]
struct Collector {
    records: Vec<Record>,
    dropped: usize,
}

impl Collector {
    fn push(&mut self, cells: &[Cell; 10], row: usize) -> Result<(), LoadError> {
        match clean_row(cells, row)? {
            Some(rec) => self.records.push(rec),
            None => {
                log::debug!("Dropping row {row}: missing required field");
                self.dropped += 1;
            }
        }
        Ok(())
    }

    fn finish(self) -> SalesDataset {
        SalesDataset::from_records(self.records, self.dropped)
    }
}

// ---------------------------------------------------------------------------
// CSV loader
// ---------------------------------------------------------------------------

/// CSV layout: header row naming at least [`REQUIRED_COLUMNS`]; extra
/// columns (e.g. `Rank`) are ignored.
pub fn load_csv<R: Read>(reader: R) -> Result<SalesDataset, LoadError> {
    let mut reader = csv::Reader::from_reader(reader);
    let headers: Vec<String> = reader
        .headers()?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    let mut indices = [0usize; 10];
    for (slot, col) in indices.iter_mut().zip(REQUIRED_COLUMNS) {
        *slot = headers
            .iter()
            .position(|h| h == col)
            .ok_or(LoadError::MissingColumn(col))?;
    }

    let mut collector = Collector::default();
    for (row_no, result) in reader.records().enumerate() {
        let record = result?;
        let cells = indices.map(|i| Cell::from_text(record.get(i).unwrap_or("")));
        collector.push(&cells, row_no)?;
    }

    Ok(collector.finish())
}

// ---------------------------------------------------------------------------
// JSON loader
// ---------------------------------------------------------------------------

/// Expected JSON schema (records-oriented, `df.to_json(orient='records')`):
///
/// ```json
/// [
///   { "Name": "Wii Sports", "Platform": "Wii", "Year": 2006, "Genre": "Sports",
///     "Publisher": "Nintendo", "NA_Sales": 41.49, "EU_Sales": 29.02,
///     "JP_Sales": 3.77, "Other_Sales": 8.46, "Total_Sales": 82.74 },
///   ...
/// ]
/// ```
pub fn load_json<R: Read>(reader: R) -> Result<SalesDataset, LoadError> {
    let root: JsonValue = serde_json::from_reader(reader)?;
    let rows = root
        .as_array()
        .ok_or_else(|| LoadError::NotATable("expected top-level JSON array".into()))?;

    let mut collector = Collector::default();
    for (i, row) in rows.iter().enumerate() {
        let obj = row
            .as_object()
            .ok_or_else(|| LoadError::NotATable(format!("row {i} is not a JSON object")))?;
        // Every row must carry every key; an absent key is not a null.
        if let Some(col) = REQUIRED_COLUMNS.iter().find(|c| !obj.contains_key(**c)) {
            return Err(LoadError::MissingColumn(col));
        }
        let cells = REQUIRED_COLUMNS.map(|col| json_to_cell(obj.get(col)));
        collector.push(&cells, i)?;
    }

    Ok(collector.finish())
}

fn json_to_cell(val: Option<&JsonValue>) -> Cell {
    match val {
        None | Some(JsonValue::Null) => Cell::Null,
        Some(JsonValue::String(s)) => Cell::from_text(s),
        Some(JsonValue::Number(n)) => n.as_f64().map(Cell::Number).unwrap_or(Cell::Null),
        Some(other) => Cell::Text(other.to_string()),
    }
}

// ---------------------------------------------------------------------------
// Parquet loader
// ---------------------------------------------------------------------------

/// Load a Parquet file with one flat column per required field.
///
/// Works with files written by both **Pandas** (`df.to_parquet()`) and
/// **Polars** (`df.write_parquet()`); Year may be stored as an integer or
/// a float column.
pub fn load_parquet(file: std::fs::File) -> Result<SalesDataset, LoadError> {
    let reader = ParquetRecordBatchReaderBuilder::try_new(file)?.build()?;

    let mut collector = Collector::default();
    let mut row_no = 0usize;

    for batch_result in reader {
        let batch = batch_result?;
        let schema = batch.schema();

        let mut columns = Vec::with_capacity(REQUIRED_COLUMNS.len());
        for col in REQUIRED_COLUMNS {
            let idx = schema
                .index_of(col)
                .map_err(|_| LoadError::MissingColumn(col))?;
            columns.push(ArrowColumn::normalise(batch.column(idx), col)?);
        }

        for row in 0..batch.num_rows() {
            let cells: [Cell; 10] = std::array::from_fn(|c| columns[c].cell(row));
            collector.push(&cells, row_no)?;
            row_no += 1;
        }
    }

    Ok(collector.finish())
}

/// A required column cast to one of the two layouts rows are read from.
/// Numeric types (any width, decimals) become `Float64`; everything else
/// castable (dictionary-encoded categoricals, views, large strings) becomes
/// `Utf8`.
enum ArrowColumn {
    Number(Float64Array),
    Text(StringArray),
}

impl ArrowColumn {
    fn normalise(array: &ArrayRef, column: &'static str) -> Result<ArrowColumn, LoadError> {
        let source = array.data_type();
        let unsupported = || LoadError::UnsupportedColumnType {
            column,
            data_type: source.to_string(),
        };

        let target = if source.is_numeric() {
            DataType::Float64
        } else {
            DataType::Utf8
        };
        if !can_cast_types(source, &target) {
            return Err(unsupported());
        }
        let converted = cast(array, &target)?;

        match target {
            DataType::Float64 => converted
                .as_primitive_opt::<Float64Type>()
                .map(|a| ArrowColumn::Number(a.clone()))
                .ok_or_else(unsupported),
            _ => converted
                .as_string_opt::<i32>()
                .map(|a| ArrowColumn::Text(a.clone()))
                .ok_or_else(unsupported),
        }
    }

    fn cell(&self, row: usize) -> Cell {
        match self {
            ArrowColumn::Number(a) if a.is_null(row) => Cell::Null,
            ArrowColumn::Number(a) => Cell::Number(a.value(row)),
            ArrowColumn::Text(a) if a.is_null(row) => Cell::Null,
            ArrowColumn::Text(a) => Cell::from_text(a.value(row)),
        }
    }
}

// ---------------------------------------------------------------------------
// Spreadsheet loader
// ---------------------------------------------------------------------------

/// Load the first sheet of a workbook; its first row is the header.
pub fn load_spreadsheet(path: &Path) -> Result<SalesDataset, LoadError> {
    let mut workbook = open_workbook_auto(path)?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| LoadError::NotATable("workbook has no sheets".into()))??;
    load_sheet(&range)
}

fn load_sheet(range: &Range<Data>) -> Result<SalesDataset, LoadError> {
    let mut rows = range.rows();
    let headers: Vec<String> = rows
        .next()
        .map(|header| header.iter().map(|h| h.to_string().trim().to_string()).collect())
        .unwrap_or_default();

    let mut indices = [0usize; 10];
    for (slot, col) in indices.iter_mut().zip(REQUIRED_COLUMNS) {
        *slot = headers
            .iter()
            .position(|h| h == col)
            .ok_or(LoadError::MissingColumn(col))?;
    }

    let mut collector = Collector::default();
    for (row_no, row) in rows.enumerate() {
        let cells = indices.map(|i| row.get(i).map(sheet_cell).unwrap_or(Cell::Null));
        collector.push(&cells, row_no)?;
    }

    Ok(collector.finish())
}

fn sheet_cell(data: &Data) -> Cell {
    match data {
        Data::Empty | Data::Error(_) => Cell::Null,
        Data::Int(i) => Cell::Number(*i as f64),
        Data::Float(f) => Cell::Number(*f),
        Data::String(s) => Cell::from_text(s),
        other => Cell::from_text(&other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use arrow::array::{
        DictionaryArray, Float32Array, Int16Array, Int32Array, Int64Array, StructArray, UInt8Array,
    };
    use arrow::datatypes::{Field, Int32Type};
    use arrow::record_batch::RecordBatch;
    use parquet::arrow::ArrowWriter;

    const HEADER: &str = "Rank,Name,Platform,Year,Genre,Publisher,NA_Sales,EU_Sales,JP_Sales,Other_Sales,Total_Sales\n";

    fn csv(rows: &str) -> Result<SalesDataset, LoadError> {
        load_csv(format!("{HEADER}{rows}").as_bytes())
    }

    #[test]
    fn test_csv_scales_sales_to_copies() {
        let ds = csv("1,Wii Sports,Wii,2006,Sports,Nintendo,41.49,29.02,3.77,8.46,82.74\n").unwrap();
        assert_eq!(ds.len(), 1);
        let rec = &ds.records[0];
        assert_eq!(rec.name, "Wii Sports");
        assert_eq!(rec.year, 2006);
        assert!((rec.sales.total - 82_740_000.0).abs() < 1e-3);
        assert!((rec.sales.na - 41_490_000.0).abs() < 1e-3);
        assert!((rec.sales.jp - 3_770_000.0).abs() < 1e-3);
    }

    #[test]
    fn test_csv_drops_rows_missing_required_fields() {
        let ds = csv(concat!(
            "1,Game A,PS2,2001,Action,Sony,1,0,0,0,1\n",
            "2,Game B,PS2,N/A,Action,Sony,1,0,0,0,1\n",
            "3,Game C,PS2,2003,Action,,1,0,0,0,1\n",
            "4,,PS2,2003,Action,Sony,1,0,0,0,1\n",
            "5,Game E,DS,2005.0,Puzzle,Nintendo,,,,,2\n",
        ))
        .unwrap();
        assert_eq!(ds.len(), 2);
        assert_eq!(ds.dropped, 3);
        assert_eq!(ds.records[1].year, 2005);
        assert_eq!(ds.records[1].sales.na, 0.0);
        assert_eq!(ds.year_bounds, Some((2001, 2005)));
    }

    #[test]
    fn test_csv_missing_column_rejected() {
        let err = load_csv("Name,Platform,Year,Genre,Publisher\nA,B,2000,C,D\n".as_bytes())
            .unwrap_err();
        assert!(matches!(err, LoadError::MissingColumn("NA_Sales")));
    }

    #[test]
    fn test_csv_invalid_numbers_rejected() {
        let err = csv("1,Game,PS2,soon,Action,Sony,1,0,0,0,1\n").unwrap_err();
        assert!(matches!(err, LoadError::InvalidValue { column: "Year", .. }));

        let err = csv("1,Game,PS2,2001,Action,Sony,lots,0,0,0,1\n").unwrap_err();
        assert!(matches!(err, LoadError::InvalidValue { row: 0, column: "NA_Sales", .. }));
    }

    #[test]
    fn test_json_records() {
        let json = r#"[
            {"Name": "Tetris", "Platform": "GB", "Year": 1989, "Genre": "Puzzle",
             "Publisher": "Nintendo", "NA_Sales": 23.2, "EU_Sales": 2.26,
             "JP_Sales": 4.22, "Other_Sales": 0.58, "Total_Sales": 30.26},
            {"Name": "Unknown", "Platform": "PC", "Year": null, "Genre": "Misc",
             "Publisher": "Indie", "NA_Sales": 0, "EU_Sales": 0,
             "JP_Sales": 0, "Other_Sales": 0, "Total_Sales": 0.01},
            {"Name": 1942, "Platform": "NES", "Year": 1985.0, "Genre": "Shooter",
             "Publisher": "Capcom", "NA_Sales": 0.65, "EU_Sales": null,
             "JP_Sales": 0.65, "Other_Sales": 0.0, "Total_Sales": 1.3}
        ]"#;
        let ds = load_json(json.as_bytes()).unwrap();
        assert_eq!(ds.len(), 2);
        assert_eq!(ds.dropped, 1);
        assert_eq!(ds.records[1].name, "1942");
        assert_eq!(ds.records[1].year, 1985);
        assert_eq!(ds.records[1].sales.eu, 0.0);
        assert_eq!(ds.platforms.len(), 2);
    }

    #[test]
    fn test_json_shape_errors() {
        assert!(matches!(
            load_json(r#"{"Name": "x"}"#.as_bytes()).unwrap_err(),
            LoadError::NotATable(_)
        ));
        assert!(matches!(
            load_json(r#"[{"Name": "x"}]"#.as_bytes()).unwrap_err(),
            LoadError::MissingColumn("Platform")
        ));
        assert!(matches!(load_json("[1,".as_bytes()).unwrap_err(), LoadError::Json(_)));
        assert!(load_json("[]".as_bytes()).unwrap().is_empty());
    }

    #[test]
    fn test_json_every_row_needs_every_column() {
        let json = r#"[
            {"Name": "Tetris", "Platform": "GB", "Year": 1989, "Genre": "Puzzle",
             "Publisher": "Nintendo", "NA_Sales": 23.2, "EU_Sales": 2.26,
             "JP_Sales": 4.22, "Other_Sales": 0.58, "Total_Sales": 30.26},
            {"Name": "Dr. Mario", "Platform": "NES", "Year": 1990, "Genre": "Puzzle",
             "Publisher": "Nintendo", "NA_Sales": 2.62, "EU_Sales": 0.45,
             "JP_Sales": 1.4, "Other_Sales": 0.01}
        ]"#;
        let err = load_json(json.as_bytes()).unwrap_err();
        assert!(matches!(err, LoadError::MissingColumn("Total_Sales")));
    }

    #[test]
    fn test_unsupported_extension() {
        let err = load_file(Path::new("vgsales.txt")).unwrap_err();
        assert!(matches!(err, LoadError::UnsupportedExtension(ref e) if e == "txt"));
    }

    // -- Parquet -----------------------------------------------------------

    fn sales_column(values: &[f64]) -> ArrayRef {
        Arc::new(Float64Array::from(values.to_vec()))
    }

    fn write_parquet(dir: &Path, columns: Vec<(&str, ArrayRef)>) -> PathBuf {
        let batch = RecordBatch::try_from_iter(columns).unwrap();
        let path = dir.join("sales.parquet");
        let file = std::fs::File::create(&path).unwrap();
        let mut writer = ArrowWriter::try_new(file, batch.schema(), None).unwrap();
        writer.write(&batch).unwrap();
        writer.close().unwrap();
        path
    }

    #[test]
    fn test_parquet_round_trip_with_nulls() {
        let dir = tempfile::tempdir().unwrap();
        let text = |v: Vec<Option<&str>>| -> ArrayRef { Arc::new(StringArray::from(v)) };
        let path = write_parquet(
            dir.path(),
            vec![
                ("Rank", Arc::new(Int64Array::from(vec![1, 2, 3])) as ArrayRef),
                ("Name", text(vec![Some("Wii Sports"), Some("Pong"), Some("Halo 3")])),
                ("Platform", text(vec![Some("Wii"), Some("2600"), Some("X360")])),
                ("Year", Arc::new(Float64Array::from(vec![Some(2006.0), None, Some(2007.0)]))),
                ("Genre", text(vec![Some("Sports"), Some("Sports"), Some("Shooter")])),
                ("Publisher", text(vec![Some("Nintendo"), Some("Atari"), None])),
                ("NA_Sales", sales_column(&[41.49, 1.0, 7.97])),
                ("EU_Sales", sales_column(&[29.02, 0.0, 2.81])),
                ("JP_Sales", sales_column(&[3.77, 0.0, 0.13])),
                ("Other_Sales", sales_column(&[8.46, 0.0, 1.21])),
                ("Total_Sales", sales_column(&[82.74, 1.0, 12.12])),
            ],
        );

        let ds = load_file(&path).unwrap();
        assert_eq!(ds.len(), 1);
        assert_eq!(ds.dropped, 2);
        let rec = &ds.records[0];
        assert_eq!(rec.year, 2006);
        assert_eq!(rec.platform, "Wii");
        assert!((rec.sales.total - 82_740_000.0).abs() < 1e-3);
    }

    #[test]
    fn test_parquet_dictionary_and_narrow_columns() {
        let dir = tempfile::tempdir().unwrap();
        let platforms: DictionaryArray<Int32Type> = vec!["Wii", "PS2", "DS"].into_iter().collect();
        let genres: DictionaryArray<Int32Type> = vec!["Sports", "Action", "Sports"].into_iter().collect();
        let path = write_parquet(
            dir.path(),
            vec![
                ("Name", Arc::new(StringArray::from(vec!["A", "B", "C"])) as ArrayRef),
                ("Platform", Arc::new(platforms)),
                ("Year", Arc::new(Int16Array::from(vec![2006, 2004, 2005]))),
                ("Genre", Arc::new(genres)),
                ("Publisher", Arc::new(StringArray::from(vec!["N", "S", "N"]))),
                ("NA_Sales", Arc::new(Float32Array::from(vec![1.0, 2.0, 0.5]))),
                ("EU_Sales", sales_column(&[0.0, 0.0, 0.0])),
                ("JP_Sales", sales_column(&[0.0, 0.0, 0.0])),
                ("Other_Sales", sales_column(&[0.0, 0.0, 0.0])),
                ("Total_Sales", Arc::new(UInt8Array::from(vec![1, 2, 3]))),
            ],
        );

        let ds = load_file(&path).unwrap();
        assert_eq!(ds.len(), 3);
        let platforms: Vec<&str> = ds.platforms.iter().map(String::as_str).collect();
        assert_eq!(platforms, vec!["DS", "PS2", "Wii"]);
        assert_eq!(ds.genres.len(), 2);
        assert_eq!(ds.year_bounds, Some((2004, 2006)));
        assert_eq!(ds.records[1].sales.na, 2_000_000.0);
        assert_eq!(ds.records[2].sales.total, 3_000_000.0);
    }

    #[test]
    fn test_parquet_missing_column() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_parquet(
            dir.path(),
            vec![("Name", Arc::new(StringArray::from(vec!["A"])) as ArrayRef)],
        );
        assert!(matches!(load_file(&path).unwrap_err(), LoadError::MissingColumn("Platform")));
    }

    #[test]
    fn test_nested_column_type_rejected() {
        let nested: ArrayRef = Arc::new(StructArray::from(vec![(
            Arc::new(Field::new("inner", DataType::Int32, false)),
            Arc::new(Int32Array::from(vec![1])) as ArrayRef,
        )]));
        let err = ArrowColumn::normalise(&nested, "Genre").err().unwrap();
        assert!(matches!(err, LoadError::UnsupportedColumnType { column: "Genre", .. }));
    }

    // -- Spreadsheets ------------------------------------------------------

    #[test]
    fn test_xlsx_first_sheet() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("vgsales.xlsx");

        let mut workbook = rust_xlsxwriter::Workbook::new();
        let sheet = workbook.add_worksheet();
        let header = HEADER.trim_end().split(',');
        for (c, name) in header.enumerate() {
            sheet.write_string(0, c as u16, name).unwrap();
        }
        let rows: [(&str, Option<f64>, [f64; 5]); 2] = [
            ("Wii Sports", Some(2006.0), [41.49, 29.02, 3.77, 8.46, 82.74]),
            ("Mystery", None, [1.0, 0.0, 0.0, 0.0, 1.0]),
        ];
        for (r, (name, year, sales)) in rows.iter().enumerate() {
            let r = r as u32 + 1;
            sheet.write_number(r, 0, r as f64).unwrap();
            sheet.write_string(r, 1, *name).unwrap();
            sheet.write_string(r, 2, "Wii").unwrap();
            if let Some(year) = year {
                sheet.write_number(r, 3, *year).unwrap();
            }
            sheet.write_string(r, 4, "Sports").unwrap();
            sheet.write_string(r, 5, "Nintendo").unwrap();
            for (i, v) in sales.iter().enumerate() {
                sheet.write_number(r, 6 + i as u16, *v).unwrap();
            }
        }
        workbook.save(&path).unwrap();

        let ds = load_file(&path).unwrap();
        assert_eq!(ds.len(), 1);
        assert_eq!(ds.dropped, 1);
        assert_eq!(ds.records[0].year, 2006);
        assert!((ds.records[0].sales.eu - 29_020_000.0).abs() < 1e-3);
    }

    #[test]
    fn test_sheet_missing_column() {
        let mut range = Range::new((0, 0), (1, 1));
        range.set_value((0, 0), Data::String("Name".into()));
        range.set_value((0, 1), Data::String("Year".into()));
        range.set_value((1, 0), Data::String("Tetris".into()));
        range.set_value((1, 1), Data::Int(1989));
        assert!(matches!(load_sheet(&range).unwrap_err(), LoadError::MissingColumn("Platform")));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = load_file(Path::new("/nonexistent/vgsales.csv")).unwrap_err();
        assert!(matches!(err, LoadError::Io { .. }));
    }
}
