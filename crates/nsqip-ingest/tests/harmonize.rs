use std::fs;
use std::path::Path;

use polars::prelude::*;

use nsqip_ingest::{
    SourceFormat, SourceSpec, discover_sources, read_file_schema, source_plan,
};
use nsqip_model::{CanonicalSchema, ColumnSpec, ColumnType, NsqipError};
use nsqip_schema::{cast_plan, unify};

fn write_csv(dir: &Path, name: &str, contents: &str) -> SourceSpec {
    let path = dir.join(name);
    fs::write(&path, contents).expect("write csv");
    SourceSpec::from_path(path).expect("source spec")
}

fn write_parquet(dir: &Path, name: &str, mut df: DataFrame) -> SourceSpec {
    let path = dir.join(name);
    let file = fs::File::create(&path).expect("create parquet");
    ParquetWriter::new(file).finish(&mut df).expect("write parquet");
    SourceSpec::from_path(path).expect("source spec")
}

#[test]
fn discovery_sorts_by_file_name_and_extracts_years() {
    let dir = tempfile::tempdir().expect("tempdir");
    fs::write(dir.path().join("puf_2019.csv"), "CASEID\n1\n").expect("write");
    fs::write(dir.path().join("puf_2017.csv"), "CASEID\n1\n").expect("write");
    fs::write(dir.path().join("notes.txt"), "ignored").expect("write");

    let sources = discover_sources(dir.path()).expect("discovery");
    let ids: Vec<&str> = sources.iter().map(|spec| spec.id.as_str()).collect();
    assert_eq!(ids, ["2017", "2019"]);
    assert!(sources.iter().all(|spec| spec.format == SourceFormat::Csv));
}

#[test]
fn discovery_of_an_empty_directory_fails() {
    let dir = tempfile::tempdir().expect("tempdir");
    let err = discover_sources(dir.path()).unwrap_err();
    match err {
        NsqipError::NoSources { dir: Some(path) } => assert_eq!(path, dir.path()),
        other => panic!("expected NoSources, got {other:?}"),
    }
}

#[test]
fn csv_schema_scan_maps_inferred_dtypes() {
    let dir = tempfile::tempdir().expect("tempdir");
    let spec = write_csv(
        dir.path(),
        "adult_2019.csv",
        "CASEID,CPT,BMI\n1,44970,27.5\n2,p44950,31.0\n",
    );

    let schema = read_file_schema(&spec).expect("schema");
    assert_eq!(schema.source.as_str(), "2019");
    assert_eq!(schema.column_type("CASEID"), Some(ColumnType::Integer));
    assert_eq!(schema.column_type("CPT"), Some(ColumnType::String));
    assert_eq!(schema.column_type("BMI"), Some(ColumnType::Float64));
}

#[test]
fn parquet_schema_scan_reads_declared_types() {
    let dir = tempfile::tempdir().expect("tempdir");
    let df = df!(
        "CASEID" => [10i64, 11],
        "AGE_DAYS" => [120.5f64, 400.0],
        "CPT" => ["44970", "44950"],
    )
    .expect("frame");
    let spec = write_parquet(dir.path(), "peds_2020.parquet", df);

    let schema = read_file_schema(&spec).expect("schema");
    assert_eq!(schema.source.as_str(), "2020");
    assert_eq!(schema.column_type("CASEID"), Some(ColumnType::Integer));
    assert_eq!(schema.column_type("AGE_DAYS"), Some(ColumnType::Float64));
    assert_eq!(schema.column_type("CPT"), Some(ColumnType::String));
}

#[test]
fn source_plans_widen_fill_and_order_columns_canonically() {
    let dir = tempfile::tempdir().expect("tempdir");
    let old = write_csv(dir.path(), "puf_2018.csv", "CASEID,BMI\n1,27\n2,31\n");
    let new = write_csv(
        dir.path(),
        "puf_2019.csv",
        "CASEID,BMI,PUFYEAR\n3,27.5,2019\n4,30.25,2019\n",
    );

    let schemas = vec![
        read_file_schema(&old).expect("old schema"),
        read_file_schema(&new).expect("new schema"),
    ];
    let canonical = unify(&schemas).expect("unify");

    let df = source_plan(&old, &cast_plan(&canonical, &schemas[0]))
        .expect("plan")
        .collect()
        .expect("collect");

    let names: Vec<String> = df
        .get_column_names()
        .iter()
        .map(|name| name.to_string())
        .collect();
    assert_eq!(names, ["CASEID", "BMI", "PUFYEAR"]);

    let bmi = df.column("BMI").expect("BMI");
    assert_eq!(bmi.dtype(), &DataType::Float64);

    let pufyear = df.column("PUFYEAR").expect("PUFYEAR");
    assert_eq!(pufyear.dtype(), &DataType::Int64);
    assert_eq!(pufyear.null_count(), df.height());
}

#[test]
fn blank_sentinels_become_missing_during_collect() {
    let dir = tempfile::tempdir().expect("tempdir");
    let spec = write_csv(
        dir.path(),
        "puf_2019.csv",
        "CASEID,PODIAG\n1,\"K35.80\"\n2,\"   \"\n3,\"\"\n",
    );

    let schema = read_file_schema(&spec).expect("schema");
    let canonical = unify(std::slice::from_ref(&schema)).expect("unify");
    let df = source_plan(&spec, &cast_plan(&canonical, &schema))
        .expect("plan")
        .collect()
        .expect("collect");

    let podiag = df.column("PODIAG").expect("PODIAG");
    assert_eq!(podiag.null_count(), 2);
    let first = podiag.get(0).expect("row 0");
    assert_eq!(first, AnyValue::String("K35.80"));
}

#[test]
fn strict_numeric_parse_surfaces_the_offending_value_at_collect() {
    let dir = tempfile::tempdir().expect("tempdir");
    let spec = write_csv(
        dir.path(),
        "puf_2012.csv",
        "CASEID,AGE\n1,65\n2,12.5\n3,N/A\n",
    );

    let file_schema = read_file_schema(&spec).expect("schema");
    assert_eq!(file_schema.column_type("AGE"), Some(ColumnType::String));

    // Re-typed the way a numeric override would: AGE must parse as integer.
    let canonical = CanonicalSchema::new(vec![
        ColumnSpec::new("CASEID", ColumnType::Integer, false),
        ColumnSpec::new("AGE", ColumnType::Integer, true),
    ]);

    let err = source_plan(&spec, &cast_plan(&canonical, &file_schema))
        .expect("plan")
        .collect()
        .map(|_| ())
        .map_err(|e| nsqip_ingest::decode_conversion_error(e, "collecting dataset"))
        .unwrap_err();

    match err {
        NsqipError::ValueConversion {
            column,
            source,
            value,
        } => {
            assert_eq!(column, "AGE");
            assert_eq!(source, "2012");
            assert_eq!(value, "12.5");
        }
        other => panic!("expected ValueConversion, got {other:?}"),
    }
}

#[test]
fn strict_float_parse_accepts_fractions_and_blanks() {
    let dir = tempfile::tempdir().expect("tempdir");
    let spec = write_csv(
        dir.path(),
        "puf_2012.csv",
        "CASEID,AGE\n1,65\n2,12.5\n3,\"  \"\n4,N/A\n",
    );

    let file_schema = read_file_schema(&spec).expect("schema");
    let canonical = CanonicalSchema::new(vec![
        ColumnSpec::new("CASEID", ColumnType::Integer, false),
        ColumnSpec::new("AGE", ColumnType::Float64, true),
    ]);

    let err = source_plan(&spec, &cast_plan(&canonical, &file_schema))
        .expect("plan")
        .collect()
        .map(|_| ())
        .map_err(|e| nsqip_ingest::decode_conversion_error(e, "collecting dataset"))
        .unwrap_err();

    // Rows 1-3 parse (65, 12.5, missing); N/A is the first failure.
    match err {
        NsqipError::ValueConversion { value, .. } => assert_eq!(value, "N/A"),
        other => panic!("expected ValueConversion, got {other:?}"),
    }
}

#[test]
fn text_and_float_declarations_widen_to_text_with_sentinels_applied() {
    let dir = tempfile::tempdir().expect("tempdir");
    let text = write_csv(
        dir.path(),
        "mixed_2018.csv",
        "CASEID,VALUE\n1,\"12.5\"\n2,\" \"\n",
    );
    let float = write_parquet(
        dir.path(),
        "mixed_2019.parquet",
        df!("CASEID" => [3i64, 4], "VALUE" => [12.5f64, 7.0]).expect("frame"),
    );

    let schemas = vec![
        read_file_schema(&text).expect("text schema"),
        read_file_schema(&float).expect("float schema"),
    ];
    let canonical = unify(&schemas).expect("unify");
    assert_eq!(
        canonical.get("VALUE").map(|spec| spec.declared_type),
        Some(ColumnType::String)
    );

    let mut frames = Vec::new();
    for (spec, file_schema) in [(&text, &schemas[0]), (&float, &schemas[1])] {
        frames.push(
            source_plan(spec, &cast_plan(&canonical, file_schema))
                .expect("plan")
                .collect()
                .expect("collect"),
        );
    }
    let combined = frames[0].vstack(&frames[1]).expect("vstack");

    let values: Vec<Option<&str>> = combined
        .column("VALUE")
        .expect("VALUE")
        .str()
        .expect("dtype")
        .into_iter()
        .collect();
    assert_eq!(values, [Some("12.5"), None, Some("12.5"), Some("7.0")]);
}

#[test]
fn parquet_and_csv_sources_unify_into_one_canonical_schema() {
    let dir = tempfile::tempdir().expect("tempdir");
    let csv = write_csv(dir.path(), "peds_2019.csv", "CASEID,AGE_DAYS\n1,120\n2,400\n");
    let parquet = write_parquet(
        dir.path(),
        "peds_2020.parquet",
        df!("CASEID" => [3i64, 4], "AGE_DAYS" => [250.5f64, 90.0]).expect("frame"),
    );

    let schemas = vec![
        read_file_schema(&csv).expect("csv schema"),
        read_file_schema(&parquet).expect("parquet schema"),
    ];
    let canonical = unify(&schemas).expect("unify");
    assert_eq!(
        canonical.get("AGE_DAYS").map(|spec| spec.declared_type),
        Some(ColumnType::Float64)
    );

    for (spec, file_schema) in [(&csv, &schemas[0]), (&parquet, &schemas[1])] {
        let df = source_plan(spec, &cast_plan(&canonical, file_schema))
            .expect("plan")
            .collect()
            .expect("collect");
        assert_eq!(
            df.column("AGE_DAYS").expect("AGE_DAYS").dtype(),
            &DataType::Float64
        );
    }
}
