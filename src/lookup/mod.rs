//! Point lookups of shipping rates by package weight.

use serde::ser::{Serialize, SerializeMap, Serializer};
use serde_json::{json, Value};
use std::{sync::Arc, time::Duration};
use tokio::time::timeout;
use tracing::{debug, info, warn};

use crate::config::StoreConfig;
use crate::error::{ConfigError, LookupError, StoreError};

pub mod key;
pub mod store;

pub use key::LookupKey;
pub use store::{CellValue, DuckRateStore, RateRow, RateStore};

/// A stored row plus the caller's destination, echoed back untouched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateQuote {
    pub row: RateRow,
    pub destination_zip: String,
}

impl Serialize for RateQuote {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.row.fields.len() + 1))?;
        for (name, value) in &self.row.fields {
            map.serialize_entry(name, value)?;
        }
        map.serialize_entry("destination_zip", &self.destination_zip)?;
        map.end()
    }
}

/// Stateless lookup front end. Every call is one bounded trip to the store.
pub struct LookupService<S> {
    store: Arc<S>,
    query_timeout: Duration,
}

impl<S> Clone for LookupService<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            query_timeout: self.query_timeout,
        }
    }
}

impl LookupService<DuckRateStore> {
    pub fn from_config(config: &StoreConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let store = DuckRateStore::new(config.database.clone(), config.table_ident()?);
        Ok(Self::new(store, config.query_timeout))
    }
}

impl<S: RateStore> LookupService<S> {
    pub fn new(store: S, query_timeout: Duration) -> Self {
        Self {
            store: Arc::new(store),
            query_timeout,
        }
    }

    #[tracing::instrument(level = "info", skip(self))]
    pub async fn lookup(
        &self,
        weight: f64,
        destination_zip: &str,
    ) -> Result<RateQuote, LookupError> {
        let key = LookupKey::from_weight(weight)?;
        self.fetch(key, destination_zip).await
    }

    /// Same as [`Self::lookup`] for a weight that arrives as text.
    #[tracing::instrument(level = "info", skip(self))]
    pub async fn lookup_raw(
        &self,
        weight: &str,
        destination_zip: &str,
    ) -> Result<RateQuote, LookupError> {
        let key = LookupKey::parse(weight)?;
        self.fetch(key, destination_zip).await
    }

    /// JSON boundary: `{"weight": <number|string>, "destination_zip": <string>}`
    /// in, the quote or `{"error": "..."}` out.
    pub async fn handle_request(&self, request: &Value) -> Value {
        let outcome = match parse_request(request) {
            Ok((key, zip)) => self.fetch(key, &zip).await,
            Err(err) => Err(err),
        };
        match outcome {
            Ok(quote) => serde_json::to_value(&quote)
                .unwrap_or_else(|err| json!({ "error": format!("encoding response: {err}") })),
            Err(err) => error_body(&err),
        }
    }

    async fn fetch(
        &self,
        key: LookupKey,
        destination_zip: &str,
    ) -> Result<RateQuote, LookupError> {
        let store = Arc::clone(&self.store);
        let task_key = key.clone();
        let task = tokio::task::spawn_blocking(move || store.fetch_row(&task_key));

        let row = match timeout(self.query_timeout, task).await {
            Err(_) => {
                warn!(key = %key, timeout = ?self.query_timeout, "lookup timed out");
                return Err(StoreError::Timeout(self.query_timeout).into());
            }
            Ok(Err(join)) => return Err(StoreError::Worker(join.to_string()).into()),
            Ok(Ok(result)) => result.map_err(|err| {
                warn!(key = %key, error = %err, "store error");
                LookupError::Store(err)
            })?,
        };

        match row {
            Some(row) => {
                info!(key = %key, "found rate row");
                Ok(RateQuote {
                    row,
                    destination_zip: destination_zip.to_string(),
                })
            }
            None => {
                debug!(key = %key, "no rate row");
                Err(LookupError::NotFound {
                    weight: key.to_string(),
                })
            }
        }
    }
}

fn parse_request(request: &Value) -> Result<(LookupKey, String), LookupError> {
    let key = match request.get("weight") {
        Some(Value::Number(n)) => n
            .as_f64()
            .ok_or(LookupError::InvalidWeight)
            .and_then(LookupKey::from_weight)?,
        Some(Value::String(s)) => LookupKey::parse(s)?,
        _ => return Err(LookupError::InvalidWeight),
    };
    let zip = match request.get("destination_zip") {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        _ => return Err(LookupError::MissingDestination),
    };
    Ok((key, zip))
}

/// `{"error": "<reason>"}`
pub fn error_body(err: &LookupError) -> Value {
    json!({ "error": err.to_string() })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::Ingestor;
    use rust_decimal::Decimal;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use tempfile::tempdir;

    /// In-memory store that counts how often it is asked.
    #[derive(Default)]
    struct CountingStore {
        calls: AtomicUsize,
        keys: Mutex<Vec<String>>,
        rows: Vec<RateRow>,
        fail: bool,
    }

    impl RateStore for CountingStore {
        fn fetch_row(&self, key: &LookupKey) -> Result<Option<RateRow>, StoreError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.keys.lock().unwrap().push(key.to_string());
            if self.fail {
                return Err(StoreError::Worker("connection refused".into()));
            }
            Ok(self
                .rows
                .iter()
                .find(|r| {
                    r.fields.first().map(|(_, v)| v) == Some(&CellValue::Text(key.to_string()))
                })
                .cloned())
        }
    }

    struct SlowStore;

    impl RateStore for SlowStore {
        fn fetch_row(&self, _key: &LookupKey) -> Result<Option<RateRow>, StoreError> {
            std::thread::sleep(Duration::from_millis(300));
            Ok(None)
        }
    }

    fn rate_row(key: &str, a: i64) -> RateRow {
        RateRow {
            fields: vec![
                ("service_lbs".into(), CellValue::Text(key.into())),
                ("rate_a".into(), CellValue::Decimal(Decimal::new(a, 2))),
            ],
        }
    }

    fn service(store: CountingStore) -> LookupService<CountingStore> {
        LookupService::new(store, Duration::from_secs(1))
    }

    #[tokio::test]
    async fn invalid_weight_never_reaches_the_store() {
        let svc = service(CountingStore::default());

        for raw in ["abc", "", "-1", "NaN"] {
            let err = svc.lookup_raw(raw, "10001").await.unwrap_err();
            assert!(matches!(err, LookupError::InvalidWeight), "{raw:?}");
        }
        let err = svc.lookup(f64::INFINITY, "10001").await.unwrap_err();
        assert!(matches!(err, LookupError::InvalidWeight));

        let body = svc.handle_request(&json!({"weight": "abc", "destination_zip": "10001"})).await;
        assert_eq!(body, json!({"error": "invalid weight"}));
        let body = svc.handle_request(&json!({"weight": true, "destination_zip": "10001"})).await;
        assert_eq!(body, json!({"error": "invalid weight"}));

        assert_eq!(svc.store.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn rounds_before_querying() {
        let svc = service(CountingStore {
            rows: vec![rate_row("2", 1000)],
            ..Default::default()
        });

        for w in [0.5, 1.5, 2.5, 2.4] {
            let _ = svc.lookup(w, "10001").await;
        }
        assert_eq!(*svc.store.keys.lock().unwrap(), vec!["0", "2", "2", "2"]);
    }

    #[tokio::test]
    async fn not_found_is_distinct() {
        let svc = service(CountingStore {
            rows: vec![rate_row("1", 1000)],
            ..Default::default()
        });

        let err = svc.lookup(99999.0, "10001").await.unwrap_err();
        assert!(matches!(err, LookupError::NotFound { ref weight } if weight == "99999"));

        let body = svc.handle_request(&json!({"weight": 99999, "destination_zip": "10001"})).await;
        assert_eq!(body, json!({"error": "no rate found for weight 99999"}));
        assert_eq!(svc.store.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn store_failures_become_responses() {
        let svc = service(CountingStore {
            fail: true,
            ..Default::default()
        });
        let body = svc.handle_request(&json!({"weight": 1, "destination_zip": "10001"})).await;
        assert_eq!(
            body,
            json!({"error": "store error: store worker failed: connection refused"})
        );
    }

    #[tokio::test]
    async fn slow_store_times_out() {
        let svc = LookupService::new(SlowStore, Duration::from_millis(20));
        let err = svc.lookup(1.0, "10001").await.unwrap_err();
        assert!(matches!(err, LookupError::Store(StoreError::Timeout(_))));
    }

    #[tokio::test]
    async fn missing_destination() {
        let svc = service(CountingStore::default());
        let body = svc.handle_request(&json!({"weight": 1})).await;
        assert_eq!(body, json!({"error": "missing destination_zip"}));
    }

    #[tokio::test]
    async fn quote_serializes_in_column_order() {
        let svc = service(CountingStore {
            rows: vec![rate_row("1", 1000)],
            ..Default::default()
        });
        let quote = svc.lookup_raw("1.2", "10001").await.unwrap();
        assert_eq!(
            serde_json::to_string(&quote).unwrap(),
            r#"{"service_lbs":"1","rate_a":10.00,"destination_zip":"10001"}"#
        );

        let body = svc
            .handle_request(&json!({"weight": "1.2", "destination_zip": 10001}))
            .await;
        // the JSON body keeps the stored scale
        assert_eq!(
            body.to_string(),
            r#"{"destination_zip":"10001","rate_a":10.00,"service_lbs":"1"}"#
        );
    }

    // ─── end to end against DuckDB ──────────────────────────────────────

    #[tokio::test]
    async fn ingest_then_lookup() -> anyhow::Result<()> {
        let dir = tempdir()?;
        let config = StoreConfig::new(dir.path().join("rates.duckdb"), "shipping_rates");
        let report = Ingestor::new(config.clone())?
            .ingest_text("Service lbs,Rate A,Rate B\n1,10.00,20.00\n2,10.00\n")?;
        assert_eq!(report.inserted, 1);
        assert_eq!(report.skipped.len(), 1);

        let svc = LookupService::from_config(&config)?;
        let quote = svc.lookup(1.0, "10001").await?;
        assert_eq!(quote.row.get("service_lbs"), Some(&CellValue::Text("1".into())));
        assert_eq!(
            quote.row.get("rate_a"),
            Some(&CellValue::Decimal(Decimal::new(1000, 2)))
        );
        assert_eq!(
            quote.row.get("rate_b"),
            Some(&CellValue::Decimal(Decimal::new(2000, 2)))
        );
        assert_eq!(
            serde_json::to_string(&quote)?,
            r#"{"service_lbs":"1","rate_a":10.00,"rate_b":20.00,"destination_zip":"10001"}"#
        );

        let err = svc.lookup(2.0, "10001").await.unwrap_err();
        assert!(matches!(err, LookupError::NotFound { .. }));
        Ok(())
    }

    #[tokio::test]
    async fn every_weight_finds_its_own_row() -> anyhow::Result<()> {
        let dir = tempdir()?;
        let config = StoreConfig::new(dir.path().join("rates.duckdb"), "shipping_rates");

        let mut csv = String::from("Service lbs,Rate\nFedEx Envelope up to 8 oz.,5.00\n");
        for lbs in 1..=40 {
            csv.push_str(&format!("{lbs},{lbs}.25\n"));
        }
        Ingestor::new(config.clone())?.ingest_text(&csv)?;

        let svc = LookupService::from_config(&config)?;
        for lbs in 1..=40 {
            let quote = svc.lookup(lbs as f64, "94105").await?;
            assert_eq!(
                quote.row.get("service_lbs"),
                Some(&CellValue::Text(lbs.to_string()))
            );
            assert_eq!(
                quote.row.get("rate"),
                Some(&CellValue::Decimal(Decimal::new(lbs * 100 + 25, 2)))
            );
            assert_eq!(quote.destination_zip, "94105");
        }
        Ok(())
    }
}
