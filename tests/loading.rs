use std::fs;
use std::io::Write;
use std::sync::Arc;

use rusty_dash::data::cache::TableCache;
use rusty_dash::data::loader::{self, LoadError};
use rust_xlsxwriter::{ExcelDateTime, Format, Workbook, XlsxError};
use rusty_dash::{ColumnKind, FilterEngine, FilterParams, FilterSet, Value};
use tempfile::TempDir;

const WORLD_CSV: &str = "\
country,region,HDI_XXI,survey_date
Senegal,Africa,0.51,2022/01/15 10:00:00
France,Europe,0.9,2022/02/01 08:30:00
Japan,Asia,0.92,2022/03/20 12:00:00
Chile,Americas,0.85,
";

fn write(dir: &TempDir, name: &str, contents: &str) -> std::path::PathBuf {
    let path = dir.path().join(name);
    let mut file = fs::File::create(&path).unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    path
}

#[test]
fn csv_file_loads_with_guessed_types() {
    let dir = TempDir::new().unwrap();
    let path = write(&dir, "world.csv", WORLD_CSV);

    let table = loader::load_file(&path).unwrap();
    assert_eq!(table.len(), 4);
    assert_eq!(
        table.column_names(),
        vec!["country", "region", "HDI_XXI", "survey_date"]
    );
    assert_eq!(table.column("HDI_XXI").unwrap().values[0], Value::Float(0.51));
    assert_eq!(table.column("survey_date").unwrap().values[3], Value::Null);
}

#[test]
fn loaded_dates_become_temporal_and_filter_by_range() {
    let dir = TempDir::new().unwrap();
    let path = write(&dir, "world.csv", WORLD_CSV);
    let table = loader::load_file(&path).unwrap();

    let engine = FilterEngine::default();
    let prepared = engine.prepare(&table);
    assert!(prepared.table.column("survey_date").unwrap().values[0].is_temporal());

    let start = chrono::NaiveDate::from_ymd_opt(2022, 1, 20)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap();
    let end = chrono::NaiveDate::from_ymd_opt(2022, 12, 31)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap();
    let set = FilterSet::new(true).with(
        "survey_date",
        FilterParams::Temporal {
            start: Some(start),
            end: Some(end),
        },
    );
    let out = engine.filter(&table, &set).unwrap();
    assert_eq!(
        out.table.column("country").unwrap().values,
        vec![Value::String("France".into()), Value::String("Japan".into())]
    );
}

#[test]
fn json_records_fill_missing_keys_with_null() {
    let dir = TempDir::new().unwrap();
    let path = write(
        &dir,
        "world.json",
        r#"[{"country": "Senegal", "HDI_XXI": 0.51}, {"country": "France"}]"#,
    );

    let table = loader::load_file(&path).unwrap();
    assert_eq!(table.len(), 2);
    assert_eq!(table.column("HDI_XXI").unwrap().values[1], Value::Null);
}

#[test]
fn unknown_extension_is_rejected() {
    let dir = TempDir::new().unwrap();
    let path = write(&dir, "world.xml", "<rows/>");
    assert!(matches!(
        loader::load_file(&path),
        Err(LoadError::UnsupportedFormat(ext)) if ext == "xml"
    ));
}

// ---------------------------------------------------------------------------
// Spreadsheets
// ---------------------------------------------------------------------------

fn write_workbook(path: &std::path::Path) -> Result<(), XlsxError> {
    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    let date = Format::new().set_num_format("yyyy-mm-dd hh:mm:ss");

    for (col, name) in ["country", "HDI_XXI", "member", "survey_date"].iter().enumerate() {
        sheet.write_string(0, col as u16, *name)?;
    }
    let rows = [
        ("Senegal", 0.51, true, (2022, 1, 15)),
        ("France", 0.9, false, (2022, 2, 1)),
        ("Japan", 0.92, true, (2022, 3, 20)),
    ];
    for (i, (country, hdi, member, (y, m, d))) in rows.into_iter().enumerate() {
        let row = i as u32 + 1;
        sheet.write_string(row, 0, country)?;
        sheet.write_number(row, 1, hdi)?;
        sheet.write_boolean(row, 2, member)?;
        let when = ExcelDateTime::from_ymd(y, m, d)?;
        sheet.write_datetime_with_format(row, 3, &when, &date)?;
    }
    // Chile has no HDI or survey date.
    sheet.write_string(4, 0, "Chile")?;
    sheet.write_boolean(4, 2, false)?;

    workbook.save(path)
}

#[test]
fn xlsx_first_sheet_loads_with_header_row() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("datavizII.xlsx");
    write_workbook(&path).unwrap();

    let table = loader::load_file(&path).unwrap();
    assert_eq!(
        table.column_names(),
        vec!["country", "HDI_XXI", "member", "survey_date"]
    );
    assert_eq!(table.len(), 4);
    assert_eq!(table.column("country").unwrap().values[3], Value::String("Chile".into()));
    assert_eq!(table.column("HDI_XXI").unwrap().values[0], Value::Float(0.51));
    assert_eq!(table.column("HDI_XXI").unwrap().values[3], Value::Null);
    assert_eq!(table.column("member").unwrap().values[1], Value::Bool(false));

    let jan_15 = chrono::NaiveDate::from_ymd_opt(2022, 1, 15)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap();
    let dates = &table.column("survey_date").unwrap().values;
    assert_eq!(dates[0], Value::Timestamp(jan_15));
    assert_eq!(dates[3], Value::Null);
}

#[test]
fn xlsx_dates_filter_by_range() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("world.xlsx");
    write_workbook(&path).unwrap();
    let table = loader::load_file(&path).unwrap();

    let start = chrono::NaiveDate::from_ymd_opt(2022, 1, 20)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap();
    let set = FilterSet::new(true).with(
        "survey_date",
        FilterParams::Temporal {
            start: Some(start),
            end: Some(start + chrono::Duration::days(365)),
        },
    );
    let out = FilterEngine::default().filter(&table, &set).unwrap();
    assert_eq!(
        out.table.column("country").unwrap().values,
        vec![Value::String("France".into()), Value::String("Japan".into())]
    );
}

#[test]
fn corrupt_workbook_is_a_spreadsheet_error() {
    let dir = TempDir::new().unwrap();
    let path = write(&dir, "world.xlsx", "not really a workbook");
    assert!(matches!(
        loader::load_file(&path),
        Err(LoadError::Spreadsheet(_))
    ));
}

#[test]
fn categorical_column_from_csv() {
    let dir = TempDir::new().unwrap();
    let path = write(&dir, "world.csv", WORLD_CSV);
    let table = loader::load_file(&path).unwrap();
    let prepared = FilterEngine::default().prepare(&table);
    assert_eq!(prepared.schema.kind("region"), Some(ColumnKind::Categorical));
}

// ---------------------------------------------------------------------------
// Cache
// ---------------------------------------------------------------------------

#[test]
fn cache_returns_same_table_until_file_changes() {
    let dir = TempDir::new().unwrap();
    let path = write(&dir, "world.csv", WORLD_CSV);
    let mut cache = TableCache::new();

    let first = cache.get_or_load(&path, loader::load_file).unwrap();
    let second = cache
        .get_or_load(&path, |_| panic!("should be served from cache"))
        .unwrap();
    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(cache.len(), 1);

    // A different size is enough to notice the change.
    write(&dir, "world.csv", "country,region\nPeru,Americas\n");
    let third = cache.get_or_load(&path, loader::load_file).unwrap();
    assert_eq!(third.len(), 1);
    assert_eq!(cache.len(), 1);
}

#[test]
fn invalidate_forces_a_reload() {
    let dir = TempDir::new().unwrap();
    let path = write(&dir, "world.csv", WORLD_CSV);
    let mut cache = TableCache::new();

    cache.get_or_load(&path, loader::load_file).unwrap();
    assert!(cache.invalidate(&path));
    assert!(cache.is_empty());
    assert!(!cache.invalidate(&path));

    let mut reloaded = false;
    cache
        .get_or_load(&path, |p| {
            reloaded = true;
            loader::load_file(p)
        })
        .unwrap();
    assert!(reloaded);
}

#[test]
fn missing_file_is_an_io_error_and_not_cached() {
    let dir = TempDir::new().unwrap();
    let mut cache = TableCache::new();
    let err = cache
        .get_or_load(&dir.path().join("absent.csv"), loader::load_file)
        .unwrap_err();
    assert!(matches!(err, LoadError::Io { .. }));
    assert!(cache.is_empty());
}

#[test]
fn failed_parse_is_not_cached() {
    let dir = TempDir::new().unwrap();
    let path = write(&dir, "broken.json", "{ not json");
    let mut cache = TableCache::new();
    assert!(matches!(
        cache.get_or_load(&path, loader::load_file),
        Err(LoadError::Json(_))
    ));
    assert!(cache.is_empty());
}

// ---------------------------------------------------------------------------
// Parquet
// ---------------------------------------------------------------------------

#[test]
fn parquet_offsets_are_dropped_to_local_time() {
    use arrow::array::{ArrayRef, Float64Array, StringArray, TimestampSecondArray};
    use arrow::datatypes::{DataType, Field, Schema, TimeUnit};
    use arrow::record_batch::RecordBatch;
    use parquet::arrow::ArrowWriter;

    let schema = Arc::new(Schema::new(vec![
        Field::new("country", DataType::Utf8, false),
        Field::new("HDI_XXI", DataType::Float64, true),
        Field::new(
            "last_update",
            DataType::Timestamp(TimeUnit::Second, Some("+01:00".into())),
            false,
        ),
    ]));
    let columns: Vec<ArrayRef> = vec![
        Arc::new(StringArray::from(vec!["Senegal", "France"])),
        Arc::new(Float64Array::from(vec![Some(0.51), None])),
        // 2022-01-01T00:00:00Z and a day later
        Arc::new(TimestampSecondArray::from(vec![1_640_995_200, 1_641_081_600]).with_timezone("+01:00")),
    ];
    let batch = RecordBatch::try_new(schema.clone(), columns).unwrap();

    let dir = TempDir::new().unwrap();
    let path = dir.path().join("world.parquet");
    let mut writer = ArrowWriter::try_new(fs::File::create(&path).unwrap(), schema, None).unwrap();
    writer.write(&batch).unwrap();
    writer.close().unwrap();

    let table = loader::load_file(&path).unwrap();
    assert_eq!(table.len(), 2);
    assert_eq!(table.column("HDI_XXI").unwrap().values[1], Value::Null);
    assert!(matches!(
        table.column("last_update").unwrap().values[0],
        Value::TimestampTz(_)
    ));

    let prepared = FilterEngine::default().prepare(&table);
    let local = chrono::NaiveDate::from_ymd_opt(2022, 1, 1)
        .unwrap()
        .and_hms_opt(1, 0, 0)
        .unwrap();
    assert_eq!(
        prepared.table.column("last_update").unwrap().values[0],
        Value::Timestamp(local)
    );
}
