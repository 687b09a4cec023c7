use std::fs;
use std::path::Path;

use polars::prelude::*;

use nsqip_model::{ColumnType, NsqipError};
use nsqip_query::{Mode, OpenOptions, open_dir, open_dir_with, open_with};

fn write_csv(dir: &Path, name: &str, contents: &str) {
    fs::write(dir.join(name), contents).expect("write csv");
}

fn write_parquet(dir: &Path, name: &str, mut df: DataFrame) {
    let file = fs::File::create(dir.join(name)).expect("create parquet");
    ParquetWriter::new(file).finish(&mut df).expect("write parquet");
}

/// Three adult year files with drifted layouts: a column gained mid-series,
/// a procedure column that switches from numeric-looking to text codes, and
/// blanks in a numeric column.
fn drifted_adult_dir() -> tempfile::TempDir {
    let dir = tempfile::tempdir().expect("tempdir");
    write_csv(
        dir.path(),
        "adult_2016.csv",
        "CASEID,AGE,CPT\n1,44,44970\n2,67,44950\n",
    );
    write_csv(
        dir.path(),
        "adult_2017.csv",
        "CASEID,AGE,CPT,BMI\n3,55,0213T,27.5\n",
    );
    write_csv(
        dir.path(),
        "adult_2018.csv",
        "CASEID,AGE,CPT,BMI\n4,63,44970,31.2\n5,,44950,28.0\n",
    );
    dir
}

#[test]
fn drifted_years_open_under_one_widened_schema() {
    let dir = drifted_adult_dir();
    let handle = open_dir(dir.path(), Mode::Eager).expect("open");

    assert_eq!(handle.mode(), Mode::Eager);
    assert_eq!(handle.kind(), nsqip_model::DatasetKind::Adult);

    let names: Vec<&str> = handle.schema().names().collect();
    assert_eq!(names, ["CASEID", "AGE", "CPT", "BMI"]);
    assert_eq!(
        handle.schema().get("CPT").map(|spec| spec.declared_type),
        Some(ColumnType::String)
    );
    assert!(handle.schema().get("BMI").is_some_and(|spec| spec.nullable));

    let df = handle.collect().expect("collect");
    assert_eq!(df.height(), 5);
    assert_eq!(df.get_column_names_str(), ["CASEID", "AGE", "CPT", "BMI"]);
    assert_eq!(df.column("AGE").expect("AGE").dtype(), &DataType::Int64);
    assert_eq!(df.column("CPT").expect("CPT").dtype(), &DataType::String);
    assert_eq!(df.column("BMI").expect("BMI").dtype(), &DataType::Float64);

    // The 2016 rows never had a BMI column; 2018 row 5 left AGE blank.
    assert_eq!(df.column("BMI").expect("BMI").null_count(), 2);
    assert_eq!(df.column("AGE").expect("AGE").null_count(), 1);

    // Numeric-looking codes from 2016 survive as text after widening.
    assert_eq!(
        df.column("CPT").expect("CPT").get(0).expect("value"),
        AnyValue::String("44970")
    );

    // Selecting every canonical column is a no-op on the column set.
    let full = handle
        .select(&names)
        .expect("select")
        .collect()
        .expect("collect");
    assert_eq!(full.get_column_names_str(), names);
}

#[test]
fn eager_and_lazy_modes_agree() {
    let dir = drifted_adult_dir();
    let eager = open_dir(dir.path(), Mode::Eager).expect("open eager");
    let lazy = open_dir(dir.path(), Mode::Lazy).expect("open lazy");

    assert_eq!(lazy.mode(), Mode::Lazy);
    assert_eq!(eager.schema(), lazy.schema());
    assert_eq!(eager.kind(), lazy.kind());

    let eager_df = eager.collect().expect("collect eager");
    let lazy_df = lazy.collect().expect("collect lazy");
    assert!(eager_df.equals_missing(&lazy_df));

    assert_eq!(eager.row_count().expect("count"), 5);
    assert_eq!(lazy.row_count().expect("count"), 5);
}

#[test]
fn conflicting_age_markers_fail_at_open() {
    let dir = tempfile::tempdir().expect("tempdir");
    write_csv(dir.path(), "mixed_2019.csv", "CASEID,AGE\n1,50\n");
    write_csv(dir.path(), "mixed_2020.csv", "CASEID,AGE_DAYS\n2,100\n");

    let err = open_dir(dir.path(), Mode::Lazy).unwrap_err();
    match err {
        NsqipError::AmbiguousSchema { matches } => {
            let kinds: Vec<_> = matches.iter().map(|(kind, _)| *kind).collect();
            assert_eq!(
                kinds,
                [
                    nsqip_model::DatasetKind::Adult,
                    nsqip_model::DatasetKind::Pediatric
                ]
            );
        }
        other => panic!("expected AmbiguousSchema, got {other:?}"),
    }
}

#[test]
fn files_without_markers_open_as_unknown() {
    let dir = tempfile::tempdir().expect("tempdir");
    write_csv(dir.path(), "generic_2019.csv", "CASEID,CPT\n1,44970\n");

    let handle = open_dir(dir.path(), Mode::Eager).expect("open");
    assert_eq!(handle.kind(), nsqip_model::DatasetKind::Unknown);
}

#[test]
fn numeric_override_fails_eagerly_on_unparsable_values() {
    let dir = tempfile::tempdir().expect("tempdir");
    write_csv(dir.path(), "adult_2012.csv", "CASEID,AGE\n1,65\n2,90+\n3, \n");

    let options = OpenOptions::default().with_numeric_override("AGE", ColumnType::Integer);
    let err = open_dir_with(dir.path(), Mode::Eager, &options).unwrap_err();
    match err {
        NsqipError::ValueConversion {
            column,
            source,
            value,
        } => {
            assert_eq!(column, "AGE");
            assert_eq!(source, "2012");
            assert_eq!(value, "90+");
        }
        other => panic!("expected ValueConversion, got {other:?}"),
    }
}

#[test]
fn numeric_override_defers_the_failure_in_lazy_mode() {
    let dir = tempfile::tempdir().expect("tempdir");
    write_csv(dir.path(), "adult_2012.csv", "CASEID,AGE\n1,65\n2,90+\n3, \n");

    let options = OpenOptions::default().with_numeric_override("AGE", ColumnType::Integer);
    let handle = open_dir_with(dir.path(), Mode::Lazy, &options).expect("open stays cheap");

    let err = handle.collect().unwrap_err();
    match err {
        NsqipError::ValueConversion { column, value, .. } => {
            assert_eq!(column, "AGE");
            assert_eq!(value, "90+");
        }
        other => panic!("expected ValueConversion, got {other:?}"),
    }
}

#[test]
fn numeric_override_parses_values_and_blanks_when_clean() {
    let dir = tempfile::tempdir().expect("tempdir");
    write_csv(dir.path(), "adult_2014.csv", "CASEID,AGE\n1,65\n2,\"   \"\n3,72\n");

    // Without the override the blank sentinel forces the column to text.
    let plain = open_dir(dir.path(), Mode::Eager).expect("open");
    assert_eq!(
        plain.schema().get("AGE").map(|spec| spec.declared_type),
        Some(ColumnType::String)
    );

    let options = OpenOptions::default().with_numeric_override("AGE", ColumnType::Integer);
    let handle = open_dir_with(dir.path(), Mode::Eager, &options).expect("open");
    assert_eq!(
        handle.schema().get("AGE").map(|spec| spec.declared_type),
        Some(ColumnType::Integer)
    );

    let df = handle.collect().expect("collect");
    let age = df.column("AGE").expect("AGE");
    assert_eq!(age.dtype(), &DataType::Int64);
    assert_eq!(age.null_count(), 1);
    assert_eq!(age.get(0).expect("value"), AnyValue::Int64(65));
    assert_eq!(age.get(2).expect("value"), AnyValue::Int64(72));
}

#[test]
fn overrides_must_name_known_columns_and_numeric_targets() {
    let dir = tempfile::tempdir().expect("tempdir");
    write_csv(dir.path(), "adult_2019.csv", "CASEID,AGE\n1,50\n");

    let absent = OpenOptions::default().with_numeric_override("BMI", ColumnType::Float64);
    let err = open_dir_with(dir.path(), Mode::Lazy, &absent).unwrap_err();
    assert!(matches!(
        err,
        NsqipError::UnknownColumn { ref column, .. } if column == "BMI"
    ));

    let non_numeric = OpenOptions::default().with_numeric_override("AGE", ColumnType::String);
    let err = open_dir_with(dir.path(), Mode::Lazy, &non_numeric).unwrap_err();
    assert!(err.to_string().contains("numeric override"));
}

#[test]
fn parquet_and_csv_sources_combine_into_one_table() {
    let dir = tempfile::tempdir().expect("tempdir");
    write_parquet(
        dir.path(),
        "peds_2020.parquet",
        df!("CASEID" => [1i64, 2], "AGE_DAYS" => [120i64, 400]).expect("frame"),
    );
    write_csv(dir.path(), "peds_2021.csv", "CASEID,AGE_DAYS\n3,250.5\n");

    let handle = open_dir(dir.path(), Mode::Lazy).expect("open");
    assert_eq!(handle.kind(), nsqip_model::DatasetKind::Pediatric);
    assert_eq!(
        handle.schema().get("AGE_DAYS").map(|spec| spec.declared_type),
        Some(ColumnType::Float64)
    );

    let df = handle.collect().expect("collect");
    assert_eq!(df.height(), 3);
    assert_eq!(
        df.column("AGE_DAYS").expect("AGE_DAYS").dtype(),
        &DataType::Float64
    );
}

#[test]
fn opening_no_sources_fails() {
    let err = open_with(&[], Mode::Eager, &OpenOptions::default()).unwrap_err();
    assert!(matches!(err, NsqipError::NoSources { dir: None }));
}
