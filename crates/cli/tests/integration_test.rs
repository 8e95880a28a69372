use chrono::{DateTime, FixedOffset, NaiveDate, TimeZone, Utc};
use std::fs::File;
use std::sync::Arc;

use kite_bridge_core::{Broker, ConfigLoader, OptionRight, Segment, Side};
use kite_bridge_kite::{parse_instruments_csv, PaperBroker};
use kite_bridge_router::{OrderReport, OrderRouter, SignalOutcome};

const SAMPLE_CONFIG: &str = "../../config/Config.toml";
const SAMPLE_DUMP: &str = "tests/data/nfo_sample.csv";

fn ist(d: u32, h: u32, m: u32) -> DateTime<Utc> {
    FixedOffset::east_opt(330 * 60)
        .unwrap()
        .with_ymd_and_hms(2026, 10, d, h, m, 0)
        .unwrap()
        .with_timezone(&Utc)
}

fn paper_router() -> (Arc<PaperBroker>, OrderRouter) {
    let config = ConfigLoader::load(SAMPLE_CONFIG).expect("sample config should load");
    config.validate(false).expect("sample config should validate");

    let dump = File::open(SAMPLE_DUMP).expect("sample dump");
    let instruments = parse_instruments_csv(dump, Segment::NfoOpt).expect("sample dump parses");
    let broker = Arc::new(PaperBroker::with_instruments(instruments));
    let shared: Arc<dyn Broker> = broker.clone();
    let router = OrderRouter::new(shared, &config).expect("router");
    (broker, router)
}

#[tokio::test]
async fn dry_run_resolution_from_instrument_dump() {
    let (broker, router) = paper_router();
    let root = router.root_for("NSE:CNXFINANCE").unwrap().clone();

    let entry = router
        .resolve_entry(&root, Side::Long, "21034".parse().unwrap(), ist(19, 10, 0))
        .await
        .unwrap();

    assert_eq!(entry.target_strike, 21050);
    assert_eq!(entry.instrument.tradingsymbol, "FINNIFTY26OCT21100CE");
    assert_eq!(entry.expiry, NaiveDate::from_ymd_opt(2026, 10, 27).unwrap());
    assert_eq!(entry.quantity, 65);
    assert!(broker.orders().is_empty());
}

#[tokio::test]
async fn weekly_expiry_rolls_after_it_passes() {
    let (_broker, router) = paper_router();
    let root = router.root_for("NSE:NIFTY").unwrap().clone();

    let weekly = router
        .resolve_entry(&root, Side::Short, "24990".parse().unwrap(), ist(20, 10, 0))
        .await
        .unwrap();
    assert_eq!(weekly.instrument.tradingsymbol, "NIFTY26O2025000PE");

    let monthly = router
        .resolve_entry(&root, Side::Long, "24990".parse().unwrap(), ist(21, 10, 0))
        .await
        .unwrap();
    assert_eq!(monthly.right, OptionRight::Ce);
    assert_eq!(monthly.instrument.tradingsymbol, "NIFTY26OCT25000CE");
}

#[tokio::test]
async fn alert_to_paper_fill() {
    let (broker, router) = paper_router();
    let body = br#"{"id": "tv-1", "symbol": "NSE:CNXFINANCE", "side": "SHORT", "price": 21049.9}"#;

    let outcome = router.handle_signal_at(body, ist(19, 11, 0)).await.unwrap();
    assert!(matches!(
        outcome,
        SignalOutcome::Ok(OrderReport::Entry { strike: 21050, right: OptionRight::Pe, .. })
    ));

    let exit = br#"{"id": "tv-2", "symbol": "NSE:CNXFINANCE", "side": "EXIT"}"#;
    let outcome = router.handle_signal_at(exit, ist(19, 15, 45)).await.unwrap();
    assert_eq!(outcome.report().map(OrderReport::tradingsymbol), Some("FINNIFTY26OCT21050PE"));
    assert_eq!(broker.orders().len(), 2);
}
