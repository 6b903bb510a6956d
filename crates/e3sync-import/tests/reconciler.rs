//! Behavioural tests for `ImportReconciler` with in-memory destinations.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use e3sync_core::{CanonicalProduct, CreatedProduct, FailureKind, ImportResult};
use e3sync_import::{
    CancelSignal, ImportError, ImportReconciler, ProductDestination, TokenSource,
};
use e3sync_shopify::{DestinationError, UserError};
use e3sync_upstream::{AuthAttempt, AuthAttempts, UpstreamError, UpstreamProduct};
use serde_json::json;

/// Records every product it receives; fails the codes listed in `failures`.
#[derive(Default)]
struct RecordingDestination {
    received: Mutex<Vec<CanonicalProduct>>,
    failures: HashMap<&'static str, fn() -> DestinationError>,
    delays_ms: HashMap<&'static str, u64>,
    cancel_after: Option<(usize, CancelSignal)>,
}

impl RecordingDestination {
    fn codes(&self) -> Vec<String> {
        self.received
            .lock()
            .unwrap()
            .iter()
            .map(|p| p.code.clone())
            .collect()
    }
}

impl ProductDestination for RecordingDestination {
    async fn create_product(
        &self,
        product: &CanonicalProduct,
    ) -> Result<CreatedProduct, DestinationError> {
        let calls = {
            let mut received = self.received.lock().unwrap();
            received.push(product.clone());
            received.len()
        };
        if let Some((after, signal)) = &self.cancel_after {
            if calls >= *after {
                signal.cancel();
            }
        }
        if let Some(ms) = self.delays_ms.get(product.code.as_str()) {
            tokio::time::sleep(Duration::from_millis(*ms)).await;
        }
        if let Some(make_error) = self.failures.get(product.code.as_str()) {
            return Err(make_error());
        }
        Ok(CreatedProduct {
            id: format!("gid://shopify/Product/{}", product.code),
            title: product.title.clone(),
        })
    }
}

struct StaticToken;

impl TokenSource for StaticToken {
    async fn bearer_token(&self) -> Result<String, UpstreamError> {
        Ok("tok".to_owned())
    }
}

struct RejectingAuth;

impl TokenSource for RejectingAuth {
    async fn bearer_token(&self) -> Result<String, UpstreamError> {
        Err(UpstreamError::Authentication {
            attempts: AuthAttempts(vec![AuthAttempt {
                endpoint: "/oauth/token",
                outcome: "HTTP 401".to_owned(),
            }]),
        })
    }
}

fn raw(value: serde_json::Value) -> UpstreamProduct {
    serde_json::from_value(value).expect("valid upstream record")
}

fn coded(code: &str) -> UpstreamProduct {
    raw(json!({"codigo": code, "nombre": format!("Product {code}"), "precio": 1}))
}

fn validation_error() -> DestinationError {
    DestinationError::Validation {
        user_errors: vec![UserError {
            field: vec!["title".to_owned()],
            message: "can't be blank".to_owned(),
        }],
    }
}

fn unprocessable() -> DestinationError {
    DestinationError::Transport {
        status: 422,
        body: "{}".to_owned(),
    }
}

fn server_error() -> DestinationError {
    DestinationError::Transport {
        status: 500,
        body: "internal error".to_owned(),
    }
}

#[tokio::test]
async fn single_record_imports_successfully() {
    let destination = RecordingDestination::default();
    let items = vec![raw(json!({"codigo": "A1", "nombre": "Widget", "precio": 9.5, "stock": 3}))];

    let report = ImportReconciler::new()
        .import_batch(&items, &destination)
        .await;

    assert_eq!(report.total, 1);
    assert_eq!(report.success, 1);
    assert_eq!(report.failure, 0);
    assert_eq!(
        report.results,
        vec![ImportResult::Success {
            upstream_code: "A1".to_owned(),
            destination_id: "gid://shopify/Product/A1".to_owned(),
            title: "Widget".to_owned(),
        }]
    );

    let received = destination.received.lock().unwrap();
    assert_eq!(received[0].price, "9.5");
    assert_eq!(received[0].stock_quantity, 3);
}

#[tokio::test]
async fn failing_middle_item_does_not_stop_batch() {
    let mut destination = RecordingDestination::default();
    destination.failures.insert("A2", unprocessable);
    let items = vec![coded("A1"), coded("A2"), coded("A3")];

    let report = ImportReconciler::new()
        .import_batch(&items, &destination)
        .await;

    assert_eq!(report.total, 3);
    assert_eq!(report.success, 2);
    assert_eq!(report.failure, 1);
    assert_eq!(destination.codes(), vec!["A1", "A2", "A3"]);

    let codes: Vec<&str> = report.results.iter().map(ImportResult::upstream_code).collect();
    assert_eq!(codes, vec!["A1", "A2", "A3"]);
    assert!(matches!(
        &report.results[1],
        ImportResult::Failure { upstream_code, kind: FailureKind::Transport, .. } if upstream_code == "A2"
    ));
}

#[tokio::test]
async fn counts_always_add_up() {
    let mut destination = RecordingDestination::default();
    destination.failures.insert("B", validation_error);
    destination.failures.insert("D", server_error);
    let items = vec![
        coded("A"),
        coded("B"),
        raw(json!({"nombre": "no code"})),
        coded("D"),
        coded("E"),
    ];

    let report = ImportReconciler::new()
        .import_batch(&items, &destination)
        .await;

    assert_eq!(report.total, items.len());
    assert_eq!(report.success + report.failure, report.total);
    assert_eq!(report.success, 2);
    assert_eq!(report.results.len(), items.len());
}

#[tokio::test]
async fn record_without_code_is_reported_as_unidentified() {
    let destination = RecordingDestination::default();
    let items = vec![raw(json!({"nombre": "Mystery", "precio": 5}))];

    let report = ImportReconciler::new()
        .import_batch(&items, &destination)
        .await;

    assert!(destination.codes().is_empty(), "destination must not be called");
    match &report.results[0] {
        ImportResult::Failure {
            upstream_code,
            kind,
            ..
        } => {
            assert_eq!(upstream_code, "desconhecido");
            assert_eq!(*kind, FailureKind::Normalization);
        }
        other => panic!("expected failure, got {other:?}"),
    }
}

#[tokio::test]
async fn validation_rejection_is_classified() {
    let mut destination = RecordingDestination::default();
    destination.failures.insert("A1", validation_error);

    let report = ImportReconciler::new()
        .import_batch(&[coded("A1")], &destination)
        .await;

    match &report.results[0] {
        ImportResult::Failure {
            error_message,
            kind,
            ..
        } => {
            assert_eq!(*kind, FailureKind::Validation);
            assert!(error_message.contains("title: can't be blank"));
        }
        other => panic!("expected failure, got {other:?}"),
    }
    assert_eq!(report.retriable_codes().count(), 0);
}

#[tokio::test]
async fn empty_batch_produces_empty_report() {
    let destination = RecordingDestination::default();
    let report = ImportReconciler::new().import_batch(&[], &destination).await;
    assert_eq!(report.total, 0);
    assert_eq!(report.success, 0);
    assert_eq!(report.failure, 0);
    assert!(report.results.is_empty());
}

#[tokio::test]
async fn duplicate_codes_are_imported_twice() {
    let destination = RecordingDestination::default();
    let items = vec![coded("A1"), coded("A1")];

    let report = ImportReconciler::new()
        .import_batch(&items, &destination)
        .await;

    assert_eq!(report.success, 2);
    assert_eq!(destination.codes(), vec!["A1", "A1"]);
}

#[tokio::test]
async fn concurrent_batch_keeps_input_order() {
    let mut destination = RecordingDestination::default();
    destination.delays_ms.insert("A1", 40);
    destination.delays_ms.insert("A2", 20);
    destination.failures.insert("A3", server_error);
    let items = vec![coded("A1"), coded("A2"), coded("A3"), coded("A4")];

    let report = ImportReconciler::with_concurrency(4)
        .import_batch(&items, &destination)
        .await;

    let codes: Vec<&str> = report.results.iter().map(ImportResult::upstream_code).collect();
    assert_eq!(codes, vec!["A1", "A2", "A3", "A4"]);
    assert_eq!(report.success, 3);
    assert_eq!(report.failure, 1);
}

#[tokio::test]
async fn cancellation_skips_remaining_items() {
    let signal = CancelSignal::new();
    let destination = RecordingDestination {
        cancel_after: Some((2, signal.clone())),
        ..RecordingDestination::default()
    };
    let items = vec![coded("A1"), coded("A2"), coded("A3"), coded("A4"), coded("A5")];

    let report = ImportReconciler::new()
        .import_batch_with_cancel(&items, &destination, &signal)
        .await;

    assert!(report.cancelled);
    assert_eq!(report.total, 2);
    assert_eq!(report.skipped, 3);
    assert_eq!(report.total + report.skipped, items.len());
    assert_eq!(destination.codes(), vec!["A1", "A2"]);
}

#[tokio::test]
async fn already_cancelled_signal_attempts_nothing() {
    let signal = CancelSignal::new();
    signal.cancel();
    let destination = RecordingDestination::default();

    let report = ImportReconciler::new()
        .import_batch_with_cancel(&[coded("A1"), coded("A2")], &destination, &signal)
        .await;

    assert!(report.cancelled);
    assert_eq!(report.total, 0);
    assert_eq!(report.skipped, 2);
    assert!(destination.codes().is_empty());
}

#[tokio::test]
async fn run_fails_fast_when_authentication_fails() {
    let destination = RecordingDestination::default();
    let items = vec![coded("A1"), coded("A2")];

    let result = ImportReconciler::new()
        .run(&RejectingAuth, &items, &destination, &CancelSignal::new())
        .await;

    assert!(matches!(result, Err(ImportError::Authentication(_))));
    assert!(destination.codes().is_empty(), "no item may be attempted");
}

#[tokio::test]
async fn run_imports_after_token_is_obtained() {
    let destination = RecordingDestination::default();
    let items = vec![coded("A1")];

    let report = ImportReconciler::new()
        .run(&StaticToken, &items, &destination, &CancelSignal::new())
        .await
        .expect("authenticated run");

    assert_eq!(report.success, 1);
}

#[tokio::test]
async fn run_future_can_be_spawned() {
    let destination = Arc::new(RecordingDestination::default());
    let items = vec![coded("A1"), coded("A2"), coded("A3")];

    let handle = tokio::spawn({
        let destination = Arc::clone(&destination);
        async move {
            ImportReconciler::with_concurrency(2)
                .run(&StaticToken, &items, destination.as_ref(), &CancelSignal::new())
                .await
        }
    });

    let report = handle
        .await
        .expect("import task should not panic")
        .expect("authenticated run");
    assert_eq!(report.success, 3);
    let mut codes = destination.codes();
    codes.sort();
    assert_eq!(codes, vec!["A1", "A2", "A3"]);
}
