use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use settlement_engine::core::currency::{CurrencyCode, FxError, RateTable};
use settlement_engine::core::settlement::WarningCode;
use settlement_engine::core::supplier::SupplierId;
use settlement_engine::core::transaction::{Transaction, TransactionBatch, TransactionKind, TransactionStatus};
use settlement_engine::fx::provider::{RateProvider, SimulatedRateProvider};
use settlement_engine::ingest::csv::read_transactions;
use settlement_engine::ingest::error::IngestError;
use settlement_engine::ingest::validator::Validator;
use settlement_engine::report::csv_writer::{write_report, REPORT_HEADERS, SUMMARY_MARKER};
use settlement_engine::settlement::aggregator::SettlementError;
use settlement_engine::settlement::anomaly::rate_variance_pct;
use settlement_engine::settlement::engine::{EngineConfig, SettlementEngine};
use std::collections::HashMap;
use std::error::Error;

const BATCH_CSV: &str = "\
transaction_id,supplier_id,type,original_amount,currency,timestamp,status
tx001,SUP-A,capture,1000.00,BRL,2024-01-15T10:00:00Z,completed
tx002,SUP-A,refund,50.00,BRL,2024-01-16T09:30:00Z,completed
tx003,SUP-A,capture,999.99,BRL,2024-01-16T11:00:00Z,pending
tx004,SUP-B,capture,200.00,USD,2024-01-15T12:00:00Z,completed
tx005,SUP-B,refund,80.00,USD,2024-01-17T08:00:00Z,completed
tx006,SUP-B,authorization,300.00,MXN,2024-01-14T08:00:00Z,completed
tx007,SUP-C,authorization,10.00,USD,2024-01-14T08:00:00Z,completed
tx008,SUP-D,refund,15.00,COP,2024-01-18T08:00:00Z,completed
tx009,SUP-B,capture,400.00,USD,2024-01-18T08:00:00Z,failed
";

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap()
}

fn at(day: u32, hour: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, day, hour, 0, 0).unwrap()
}

fn tx(id: &str, supplier: &str, kind: TransactionKind, amount: Decimal, currency: &str, ts: DateTime<Utc>) -> Transaction {
    Transaction::new(id, SupplierId::new(supplier), kind, amount, CurrencyCode::new(currency), ts)
}

fn load(csv: &str) -> TransactionBatch {
    let records = read_transactions(csv.as_bytes()).unwrap();
    Validator::new(&RateTable::default())
        .validate_batch(records, now())
        .unwrap()
}

/// Rates fixed per (currency, date); anything missing is unavailable.
struct FixedRates {
    reference: CurrencyCode,
    rates: HashMap<(CurrencyCode, NaiveDate), Decimal>,
}

impl FixedRates {
    fn new() -> Self {
        Self {
            reference: CurrencyCode::new("USD"),
            rates: HashMap::new(),
        }
    }

    fn with(mut self, currency: &str, day: u32, rate: Decimal) -> Self {
        let date = NaiveDate::from_ymd_opt(2024, 1, day).unwrap();
        self.rates.insert((CurrencyCode::new(currency), date), rate);
        self
    }
}

impl RateProvider for FixedRates {
    fn reference(&self) -> &CurrencyCode {
        &self.reference
    }

    fn supports(&self, currency: &CurrencyCode) -> bool {
        *currency == self.reference || self.rates.keys().any(|(c, _)| c == currency)
    }

    fn rate(&self, currency: &CurrencyCode, date: NaiveDate) -> Result<Decimal, FxError> {
        if *currency == self.reference {
            return Ok(Decimal::ONE);
        }
        self.rates
            .get(&(currency.clone(), date))
            .copied()
            .ok_or_else(|| FxError::RateUnavailable {
                currency: currency.clone(),
                date,
            })
    }
}

/// Full pipeline: CSV → validation → settlement → CSV report.
#[test]
fn full_pipeline_csv_to_report() {
    let batch = load(BATCH_CSV);
    assert_eq!(batch.len(), 9);

    let provider = SimulatedRateProvider::default();
    let brl = CurrencyCode::new("BRL");
    let rate_15 = provider.rate(&brl, at(15, 0).date_naive()).unwrap();
    let rate_16 = provider.rate(&brl, at(16, 0).date_naive()).unwrap();

    let engine = SettlementEngine::new(provider);
    let run = engine.calculate(batch.transactions()).unwrap();

    // SUP-C has only an authorization, so it is not settled.
    let ids: Vec<&str> = run.settlements().iter().map(|s| s.supplier_id().as_str()).collect();
    assert_eq!(ids, vec!["SUP-A", "SUP-B", "SUP-D"]);

    let sup_a = &run.settlements()[0];
    assert_eq!(sup_a.transaction_count(), 2);
    assert_eq!(sup_a.total_captures(), dec!(1000.00) * rate_15);
    assert_eq!(sup_a.total_refunds(), dec!(50.00) * rate_16);
    assert_eq!(sup_a.net_amount(), sup_a.total_captures() - sup_a.total_refunds());
    assert!(sup_a.warnings().is_empty());

    let sup_b = &run.settlements()[1];
    assert_eq!(sup_b.net_amount(), dec!(120));
    assert_eq!(sup_b.refund_rate_pct(), Some(dec!(40)));
    assert!(sup_b.has_warning(WarningCode::HighRefundRate));
    assert_eq!(sup_b.authorizations().len(), 1);

    let sup_d = &run.settlements()[2];
    assert!(sup_d.net_amount() < Decimal::ZERO);
    assert!(sup_d.has_warning(WarningCode::NegativeNet));
    assert_eq!(sup_d.refund_rate_pct(), None);

    assert_eq!(run.batch().orphaned_refunds, vec!["tx008".to_string()]);
    assert!(run.batch().duplicate_ids.is_empty());
    assert!(run.settlements().iter().all(|s| s.is_consistent()));

    let mut buf = Vec::new();
    write_report(&mut buf, run.settlements()).unwrap();
    let report = String::from_utf8(buf).unwrap();
    let rows: Vec<&str> = report.lines().collect();

    assert_eq!(rows[0], REPORT_HEADERS.join(","));
    // 5 detail rows + 3 summaries + header
    assert_eq!(rows.len(), 9);
    assert_eq!(rows.iter().filter(|r| r.contains(SUMMARY_MARKER)).count(), 3);
    assert!(rows.contains(&"SUP-B,Supplier SUP-B,SUMMARY,,,,,,,200.00,80.00,120.00,2,40.00,HIGH_REFUND_RATE"));
    for excluded in ["tx003", "tx006", "tx007", "tx009"] {
        assert!(!report.contains(excluded), "{excluded} must not be reported");
    }
}

#[test]
fn high_refund_rate_boundary() {
    let engine = SettlementEngine::default();

    let at_threshold = vec![
        tx("c1", "S1", TransactionKind::Capture, dec!(100), "USD", at(15, 10)),
        tx("r1", "S1", TransactionKind::Refund, dec!(20), "USD", at(15, 11)),
    ];
    let run = engine.calculate(&at_threshold).unwrap();
    assert_eq!(run.settlements()[0].refund_rate_pct(), Some(dec!(20)));
    assert!(!run.settlements()[0].has_warning(WarningCode::HighRefundRate));

    let over = vec![
        tx("c1", "S1", TransactionKind::Capture, dec!(100), "USD", at(15, 10)),
        tx("r1", "S1", TransactionKind::Refund, dec!(30), "USD", at(15, 11)),
    ];
    let run = engine.calculate(&over).unwrap();
    let s = &run.settlements()[0];
    assert_eq!(s.net_amount(), dec!(70));
    assert_eq!(s.refund_rate_pct(), Some(dec!(30)));
    assert_eq!(s.warnings(), &[WarningCode::HighRefundRate]);
}

#[test]
fn volatility_between_authorization_and_capture() {
    let provider = FixedRates::new()
        .with("BRL", 14, dec!(0.20))
        .with("BRL", 15, dec!(0.22));
    let engine = SettlementEngine::new(provider);

    let batch = vec![
        tx("auth1", "S1", TransactionKind::Authorization, dec!(100), "BRL", at(14, 9)),
        tx("cap1", "S1", TransactionKind::Capture, dec!(100), "BRL", at(15, 9)),
    ];
    let run = engine.calculate(&batch).unwrap();
    let s = &run.settlements()[0];

    assert_eq!(s.net_amount(), dec!(22));
    assert!(s.volatility_flag());
    assert!(s.has_warning(WarningCode::Volatility));
    let found = s.volatility_match().unwrap();
    assert_eq!(found.intent_id, "auth1");
    assert_eq!(found.capture_id, "cap1");
    assert_eq!(found.variance_pct, dec!(10));
}

#[test]
fn volatility_flagged_once_when_many_pairs_exceed() {
    let provider = FixedRates::new()
        .with("BRL", 13, dec!(0.18))
        .with("BRL", 14, dec!(0.20))
        .with("BRL", 15, dec!(0.22))
        .with("BRL", 16, dec!(0.30));
    let engine = SettlementEngine::new(provider);

    // Every (authorization, capture) pair here moves more than 5%.
    let batch = vec![
        tx("auth1", "S1", TransactionKind::Authorization, dec!(100), "BRL", at(13, 9)),
        tx("auth2", "S1", TransactionKind::Authorization, dec!(100), "BRL", at(14, 9)),
        tx("cap1", "S1", TransactionKind::Capture, dec!(100), "BRL", at(15, 9)),
        tx("cap2", "S1", TransactionKind::Capture, dec!(100), "BRL", at(16, 9)),
    ];
    let run = engine.calculate(&batch).unwrap();
    let s = &run.settlements()[0];

    let flagged = s.warnings().iter().filter(|w| **w == WarningCode::Volatility).count();
    assert_eq!(flagged, 1);
    assert!(s.volatility_flag());

    let found = s.volatility_match().unwrap();
    assert_eq!(found.intent_id, "auth1");
    assert_eq!(found.capture_id, "cap1");

    let mut buf = Vec::new();
    write_report(&mut buf, run.settlements()).unwrap();
    let report = String::from_utf8(buf).unwrap();
    assert_eq!(report.matches("VOLATILITY_WARNING").count(), 1);
}

#[test]
fn volatility_ignores_later_and_cross_currency_authorizations() {
    let provider = FixedRates::new()
        .with("BRL", 15, dec!(0.20))
        .with("BRL", 16, dec!(0.30))
        .with("MXN", 14, dec!(0.05));
    let engine = SettlementEngine::new(provider);

    let batch = vec![
        // after the capture
        tx("auth-late", "S1", TransactionKind::Authorization, dec!(10), "BRL", at(16, 9)),
        // different currency
        tx("auth-mxn", "S1", TransactionKind::Authorization, dec!(10), "MXN", at(14, 9)),
        tx("cap1", "S1", TransactionKind::Capture, dec!(100), "BRL", at(15, 9)),
    ];
    let run = engine.calculate(&batch).unwrap();
    assert!(!run.settlements()[0].volatility_flag());
}

#[test]
fn simulated_volatility_matches_rate_variance() {
    let provider = SimulatedRateProvider::new(RateTable::default()).with_amplitude(0.5);
    let brl = CurrencyCode::new("BRL");
    let intent_rate = provider.rate(&brl, at(10, 0).date_naive()).unwrap();
    let capture_rate = provider.rate(&brl, at(20, 0).date_naive()).unwrap();
    let expected = rate_variance_pct(intent_rate, capture_rate).unwrap() > dec!(5);

    let engine = SettlementEngine::new(provider);
    let batch = vec![
        tx("auth1", "S1", TransactionKind::Authorization, dec!(100), "BRL", at(10, 12)),
        tx("cap1", "S1", TransactionKind::Capture, dec!(100), "BRL", at(20, 12)),
    ];
    let run = engine.calculate(&batch).unwrap();
    assert_eq!(run.settlements()[0].volatility_flag(), expected);
}

#[test]
fn unsupported_currency_aborts_the_run() {
    let engine = SettlementEngine::default();
    let batch = vec![
        tx("ok1", "S1", TransactionKind::Capture, dec!(100), "USD", at(15, 10)),
        tx("bad1", "S2", TransactionKind::Capture, dec!(100), "EUR", at(15, 10)),
    ];

    let err = engine.calculate(&batch).unwrap_err();
    match &err {
        SettlementError::Supplier { supplier_id, source } => {
            assert_eq!(supplier_id.as_str(), "S2");
            assert_eq!(source.transaction_id(), "bad1");
            assert!(matches!(source.fx_error(), Some(FxError::UnsupportedCurrency(_))));
        }
        other => panic!("unexpected error: {other}"),
    }

    let mut chain = err.to_string();
    let mut cause = err.source();
    while let Some(c) = cause {
        chain.push_str(": ");
        chain.push_str(&c.to_string());
        cause = c.source();
    }
    assert!(chain.contains("unsupported currency"));
}

#[test]
fn oversized_amounts_fail_instead_of_panicking() {
    let csv = "\
transaction_id,supplier_id,type,original_amount,currency,timestamp,status
big1,S1,capture,50000000000000000000000000000,USD,2024-01-15T10:00:00Z,completed
big2,S1,capture,50000000000000000000000000000,USD,2024-01-15T11:00:00Z,completed
";
    let batch = load(csv);
    let err = SettlementEngine::default().calculate(batch.transactions()).unwrap_err();

    match &err {
        SettlementError::Supplier { supplier_id, source } => {
            assert_eq!(supplier_id.as_str(), "S1");
            assert!(matches!(**source, SettlementError::Totals { ref transaction_id, .. } if transaction_id == "big2"));
            assert!(source.fx_error().is_none());
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(err.source().is_some());
}

#[test]
fn oversized_conversion_fails_instead_of_panicking() {
    let json = r#"{ "reference": "USD", "base_rates": { "USD": "1", "GBP": "1.25" } }"#;
    let table = RateTable::from_json(json).unwrap();
    let engine = SettlementEngine::new(SimulatedRateProvider::new(table).with_amplitude(0.0));

    let batch = vec![tx("big", "S1", TransactionKind::Capture, Decimal::MAX, "GBP", at(15, 10))];
    let err = engine.calculate(&batch).unwrap_err();
    assert_eq!(err.transaction_id(), "big");
    assert!(matches!(err.fx_error(), Some(FxError::Overflow { .. })));
}

#[test]
fn validator_rejects_before_the_engine_sees_anything() {
    let csv = "\
transaction_id,supplier_id,type,original_amount,currency,timestamp,status
tx001,SUP-A,capture,0,USD,2024-01-15T10:00:00Z,completed
";
    let records = read_transactions(csv.as_bytes()).unwrap();
    let err = Validator::new(&RateTable::default())
        .validate_batch(records, now())
        .unwrap_err();
    assert!(matches!(err, IngestError::Validation { index: 1, .. }));
}

#[test]
fn date_filter_is_inclusive() {
    let batch = load(BATCH_CSV);
    let start = NaiveDate::from_ymd_opt(2024, 1, 15);
    let end = NaiveDate::from_ymd_opt(2024, 1, 16);
    let filtered = batch.within_dates(start, end);

    let ids: Vec<&str> = filtered.transactions().iter().map(|t| t.id()).collect();
    assert_eq!(ids, vec!["tx001", "tx002", "tx003", "tx004"]);
}

#[test]
fn custom_rate_table_drives_conversion() {
    let json = r#"{ "reference": "USD", "base_rates": { "USD": "1", "BRL": "0.25" } }"#;
    let table = RateTable::from_json(json).unwrap();
    let engine = SettlementEngine::new(SimulatedRateProvider::new(table).with_amplitude(0.0));

    let batch = vec![tx("c1", "S1", TransactionKind::Capture, dec!(100), "BRL", at(15, 10))];
    let run = engine.calculate(&batch).unwrap();
    assert_eq!(run.settlements()[0].net_amount(), dec!(25));
    assert_eq!(run.settlements()[0].lines()[0].rate(), dec!(0.25));
}

#[test]
fn custom_thresholds_change_warnings() {
    let config = EngineConfig {
        refund_rate_threshold: dec!(50),
        ..Default::default()
    };
    let engine = SettlementEngine::default().with_config(config);
    let batch = vec![
        tx("c1", "S1", TransactionKind::Capture, dec!(100), "USD", at(15, 10)),
        tx("r1", "S1", TransactionKind::Refund, dec!(40), "USD", at(15, 11)),
    ];
    let run = engine.calculate(&batch).unwrap();
    assert!(run.settlements()[0].warnings().is_empty());
}

#[test]
fn run_serializes_to_json() {
    let engine = SettlementEngine::default();
    let batch = vec![
        tx("c1", "S1", TransactionKind::Capture, dec!(10), "USD", at(15, 10)),
        tx("r1", "S1", TransactionKind::Refund, dec!(30), "USD", at(15, 11)),
        tx("c1", "S1", TransactionKind::Capture, dec!(5), "USD", at(15, 12)).with_status(TransactionStatus::Failed),
    ];
    let run = engine.calculate(&batch).unwrap();
    let json = serde_json::to_string(&run).unwrap();

    assert!(json.contains("HIGH_REFUND_RATE"));
    assert!(json.contains("NEGATIVE_NET"));
    assert!(json.contains("\"duplicate_ids\":[\"c1\"]"));
}
