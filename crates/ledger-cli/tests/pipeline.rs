//! End-to-end pipeline runs against local loaders.

use std::fs;
use std::path::{Path, PathBuf};

use ledger_cli::config::ConfigError;
use ledger_cli::pipeline::{PipelineError, PipelineOptions, run_ingest};
use ledger_common::RetryPolicy;
use ledger_ingest::{HeaderCollisionPolicy, IngestError, NormalizationError};
use ledger_model::Value;
use ledger_transform::BuildError;
use ledger_validate::SchemaError;
use ledger_warehouse::{LoadError, MemoryLoader, NdjsonFileLoader, TableRef};
use tempfile::TempDir;

const STOCK_CSV: &str = "\
Data,Produto,Qtd Usada (Unidades),Custo Unitário (BRL)
2024-01-05,Arroz,3,12.50
2024-01-06,Feijão,abc,8.90
06/01/2024,Óleo,,7
2024-01-08,Sal,-2,not-a-price
not-a-date,Açúcar,10,4.25
";

fn write_csv(dir: &TempDir, name: &str, content: &str) -> PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, content).unwrap();
    path
}

fn destination() -> TableRef {
    TableRef::new("acme", "finance", "stock_control")
}

fn options() -> PipelineOptions {
    PipelineOptions {
        retry: RetryPolicy::immediate(3),
        ..PipelineOptions::default()
    }
}

fn run(path: &Path, loader: &MemoryLoader) -> Result<u64, PipelineError> {
    run_ingest(path, "rest-42", &destination(), loader, &options()).map(|r| r.rows)
}

#[test]
fn five_rows_become_five_records() {
    let dir = TempDir::new().unwrap();
    let path = write_csv(&dir, "stock.csv", STOCK_CSV);
    let loader = MemoryLoader::new();

    assert_eq!(run(&path, &loader).unwrap(), 5);

    let appended = loader.appended();
    assert_eq!(appended.len(), 1);
    let (table, batch) = &appended[0];
    assert_eq!(table, &destination());
    assert_eq!(batch.len(), 5);

    let first_created = batch.records()[0].get("created_at").cloned();
    for record in batch.iter() {
        assert_eq!(record.get("restaurant_id"), Some(&Value::from("rest-42")));
        assert_eq!(record.get("created_at").cloned(), first_created);
        assert_eq!(record.get("updated_at").cloned(), first_created);

        let headers: serde_json::Value =
            serde_json::from_str(record.get("original_headers").unwrap().as_str().unwrap())
                .unwrap();
        assert_eq!(
            headers,
            serde_json::json!({
                "Data": "data",
                "Produto": "produto",
                "Qtd Usada (Unidades)": "qtd_usada_unidades",
                "Custo Unitário (BRL)": "custo_unitario_brl",
            })
        );
    }
}

#[test]
fn typed_columns_use_fallbacks() {
    let dir = TempDir::new().unwrap();
    let path = write_csv(&dir, "stock.csv", STOCK_CSV);
    let loader = MemoryLoader::new();
    run(&path, &loader).unwrap();

    let appended = loader.appended();
    let (_, batch) = &appended[0];
    let quantities: Vec<Option<i64>> = batch
        .iter()
        .map(|r| r.get("qtd_usada_unidades").and_then(Value::as_i64))
        .collect();
    assert_eq!(
        quantities,
        vec![Some(3), Some(0), Some(0), Some(-2), Some(10)]
    );

    let prices: Vec<Option<f64>> = batch
        .iter()
        .map(|r| r.get("custo_unitario_brl").and_then(Value::as_f64))
        .collect();
    assert_eq!(
        prices,
        vec![Some(12.5), Some(8.9), Some(7.0), Some(0.0), Some(4.25)]
    );

    assert!(batch.records()[4].get("data").unwrap().is_null());
    assert_eq!(
        batch.records()[0]
            .get("data")
            .and_then(Value::as_date)
            .map(|d| d.to_string()),
        Some("2024-01-05".to_string())
    );
}

#[test]
fn header_only_file_is_empty_input() {
    let dir = TempDir::new().unwrap();
    let path = write_csv(&dir, "empty.csv", "Data,Produto\n");
    let loader = MemoryLoader::new();

    let err = run(&path, &loader).unwrap_err();
    assert!(matches!(err, PipelineError::Build(BuildError::EmptyInput)));
    assert_eq!(loader.record_count(), 0);
}

#[test]
fn missing_file_is_reported_before_reading() {
    let dir = TempDir::new().unwrap();
    let loader = MemoryLoader::new();

    let err = run(&dir.path().join("missing.csv"), &loader).unwrap_err();
    assert!(matches!(
        err,
        PipelineError::Ingest(IngestError::FileNotFound { .. })
    ));
}

#[test]
fn colliding_headers_can_be_rejected() {
    let dir = TempDir::new().unwrap();
    let path = write_csv(&dir, "dup.csv", "Custo,custo!\n1,2\n");
    let loader = MemoryLoader::new();
    let options = PipelineOptions {
        collision_policy: HeaderCollisionPolicy::Reject,
        ..options()
    };

    let err = run_ingest(&path, "rest-42", &destination(), &loader, &options).unwrap_err();
    assert!(matches!(
        err,
        PipelineError::Normalization(NormalizationError::Collision { .. })
    ));
    assert_eq!(loader.record_count(), 0);
}

#[test]
fn header_cannot_overwrite_business_id() {
    let dir = TempDir::new().unwrap();
    let path = write_csv(&dir, "rid.csv", "Restaurant ID,Produto\nother,Arroz\n");
    let loader = MemoryLoader::new();
    run(&path, &loader).unwrap();

    let appended = loader.appended();
    let (_, batch) = &appended[0];
    let record = &batch.records()[0];
    assert_eq!(record.get("restaurant_id"), Some(&Value::from("rest-42")));
    assert_eq!(record.get("restaurant_id_2"), Some(&Value::from("other")));
}

#[test]
fn transient_load_failures_are_retried() {
    let dir = TempDir::new().unwrap();
    let path = write_csv(&dir, "stock.csv", STOCK_CSV);
    let loader = MemoryLoader::new().with_failures([
        LoadError::Network("connection reset".to_string()),
        LoadError::Network("connection reset".to_string()),
    ]);

    assert_eq!(run(&path, &loader).unwrap(), 5);
    assert_eq!(loader.appended().len(), 1);
}

#[test]
fn exhausted_retries_return_the_last_error() {
    let dir = TempDir::new().unwrap();
    let path = write_csv(&dir, "stock.csv", STOCK_CSV);
    let loader = MemoryLoader::new().with_failures([
        LoadError::Network("first".to_string()),
        LoadError::Network("second".to_string()),
        LoadError::Network("third".to_string()),
    ]);

    let err = run(&path, &loader).unwrap_err();
    assert_eq!(err.to_string(), "network error: third");
    assert!(loader.appended().is_empty());
}

#[test]
fn permanent_load_failure_is_not_retried() {
    let dir = TempDir::new().unwrap();
    let path = write_csv(&dir, "stock.csv", STOCK_CSV);
    let loader = MemoryLoader::new().with_failures([LoadError::Http {
        status: 404,
        reason: Some("notFound".to_string()),
        message: "Not found: Table acme:finance.stock_control".to_string(),
    }]);

    let err = run(&path, &loader).unwrap_err();
    assert!(matches!(err, PipelineError::Load(LoadError::Http { status: 404, .. })));
    // a second attempt would have succeeded
    assert!(loader.appended().is_empty());
}

#[test]
fn custom_business_id_column_is_required_by_schema() {
    let dir = TempDir::new().unwrap();
    let path = write_csv(&dir, "stock.csv", STOCK_CSV);
    let loader = MemoryLoader::new();
    let options = PipelineOptions {
        business_id_column: "store_id".to_string(),
        ..options()
    };

    run_ingest(&path, "store-7", &destination(), &loader, &options).unwrap();
    let appended = loader.appended();
    let (_, batch) = &appended[0];
    assert_eq!(batch.records()[0].get("store_id"), Some(&Value::from("store-7")));
    assert!(!batch.records()[0].contains("restaurant_id"));
}

#[test]
fn typed_column_cannot_hold_business_id() {
    let dir = TempDir::new().unwrap();
    let path = write_csv(&dir, "stock.csv", "Produto\nArroz\n");
    let loader = MemoryLoader::new();

    for column in ["data", "created_at"] {
        let options = PipelineOptions {
            business_id_column: column.to_string(),
            ..options()
        };
        let err = run_ingest(&path, "rest-42", &destination(), &loader, &options).unwrap_err();
        assert!(
            matches!(
                err,
                PipelineError::Config(ConfigError::InvalidBusinessIdColumn { .. })
            ),
            "{column}: {err}"
        );
    }
    assert_eq!(loader.record_count(), 0);
}

#[test]
fn ndjson_output_appends_lines() {
    let dir = TempDir::new().unwrap();
    let path = write_csv(&dir, "stock.csv", STOCK_CSV);
    let out = dir.path().join("out").join("stock.ndjson");
    let loader = NdjsonFileLoader::new(&out);

    run_ingest(&path, "rest-42", &destination(), &loader, &options()).unwrap();
    run_ingest(&path, "rest-42", &destination(), &loader, &options()).unwrap();

    let written = fs::read_to_string(&out).unwrap();
    assert_eq!(written.lines().count(), 10);
    let first: serde_json::Value = serde_json::from_str(written.lines().next().unwrap()).unwrap();
    assert_eq!(first["restaurant_id"], "rest-42");
    assert_eq!(first["qtd_usada_unidades"], 3);
}

#[test]
fn schema_error_is_permanent() {
    use ledger_common::Retryable;

    let err = PipelineError::from(SchemaError::MissingColumns {
        columns: vec!["restaurant_id".to_string()],
    });
    assert!(!err.is_retryable());
}
