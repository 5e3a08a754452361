//! Unhandled effect failures are reported once and do not stop the station.

mod common;

use common::{collect_until, counter, eventually, Counter, CounterAction, FaultCounter};
use dripper::Station;
use tracing_subscriber::layer::SubscriberExt;

/// Test that an unhandled effect failure is reported once and the station keeps working.
#[tokio::test]
async fn test_unhandled_failure_is_reported_exactly_once() {
    let faults = FaultCounter::default();
    let subscriber = tracing_subscriber::registry().with(faults.clone());
    let _guard = tracing::subscriber::set_default(subscriber);

    let station = Station::new(Counter::default(), counter());
    let mut stream = station.subscribe();

    station.pour(CounterAction::Fail);
    assert!(eventually(|| faults.count() == 1 && station.in_flight() == 0).await);

    station.pour(CounterAction::Increase(2));
    let seen = collect_until(&mut stream, |state| state.counter == 2).await;
    assert_eq!(seen.len(), 1);
    assert_eq!(faults.count(), 1);

    station.teardown().await;
    assert_eq!(faults.count(), 1);
}
