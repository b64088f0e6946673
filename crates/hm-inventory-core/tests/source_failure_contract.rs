//! Contract Test: Source Failures
//!
//! This test verifies which collaborator failures abort a run.
//!
//! Constraints verified:
//! - All catalogs failing aborts before reconciliation
//! - One catalog failing degrades the report and counts one error
//! - A missing interface list aborts the run
//! - A failed run emits RunFailed and produces no report
//!
//! If this test fails, someone has made the engine either swallow fatal
//! conditions or abort on recoverable ones.

mod common;

use common::*;
use hm_inventory_core::model::CatalogSource;
use hm_inventory_core::{
    Diagnostic, Error, InventoryEngine, InventoryEvent, StaticInstanceRegistry,
};
use std::sync::atomic::Ordering;

fn engine(service: MockBidcosService) -> (InventoryEngine, tokio::sync::mpsc::Receiver<InventoryEvent>) {
    InventoryEngine::new(
        Box::new(service),
        Box::new(StaticInstanceRegistry::new(vec![instance(
            5,
            "Front Door",
            "AAAA000000000001:1",
        )])),
        None,
        minimal_config(),
    )
    .expect("engine construction succeeds")
}

fn drain(events: &mut tokio::sync::mpsc::Receiver<InventoryEvent>) -> Vec<InventoryEvent> {
    let mut seen = Vec::new();
    while let Ok(event) = events.try_recv() {
        seen.push(event);
    }
    seen
}

#[tokio::test]
async fn all_catalogs_failing_is_fatal() {
    let service = MockBidcosService::new()
        .failing_catalog(CatalogSource::Rf)
        .failing_catalog(CatalogSource::Ip)
        .failing_catalog(CatalogSource::Wired)
        .with_interfaces(vec![interface("IF01", true, true)]);
    let calls = service.list_devices_counter();
    let (engine, mut events) = engine(service);

    let result = engine.run_once().await;

    assert!(matches!(result, Err(Error::TotalSourceFailure { failed: 3 })));
    assert_eq!(calls.load(Ordering::SeqCst), 3, "every catalog is asked once");

    let seen = drain(&mut events);
    assert!(seen.iter().any(|e| matches!(e, InventoryEvent::RunFailed { .. })));
    assert!(!seen.iter().any(|e| matches!(e, InventoryEvent::RunCompleted { .. })));
}

#[tokio::test]
async fn empty_catalogs_are_fatal_too() {
    let service = MockBidcosService::new().with_interfaces(vec![interface("IF01", true, true)]);
    let (engine, _events) = engine(service);

    let result = engine.run_once().await;

    assert!(matches!(result, Err(Error::TotalSourceFailure { failed: 0 })));
}

#[tokio::test]
async fn one_failing_catalog_counts_one_error() {
    let switch = device("BBBB000000000001", "HMW-IO-12-Sw7-DR");
    let service = MockBidcosService::new()
        .with_catalog(CatalogSource::Rf, door_contact_catalog())
        .failing_catalog(CatalogSource::Ip)
        .with_catalog(
            CatalogSource::Wired,
            vec![switch.clone(), channel("BBBB000000000001:13", "SWITCH", &switch)],
        )
        .with_interfaces(vec![interface("IF01", true, true)]);
    let (engine, mut events) = engine(service);

    let report = engine.run_once().await.unwrap();

    assert_eq!(report.summary.source_error_count, 1);
    assert_eq!(report.summary.total_channel_count, 2);
    assert!(report.entry("AAAA000000000001:1").unwrap().is_matched());
    assert!(report.entry("BBBB000000000001:13").is_some());
    assert!(report.diagnostics.iter().any(|d| matches!(
        d,
        Diagnostic::PartialSourceFailure {
            source: CatalogSource::Ip,
            ..
        }
    )));

    let seen = drain(&mut events);
    assert_eq!(seen.first(), Some(&InventoryEvent::RunStarted));
    assert!(seen.contains(&InventoryEvent::CatalogFetched {
        source: CatalogSource::Rf,
        devices: 2,
    }));
    assert!(seen.iter().any(|e| matches!(
        e,
        InventoryEvent::CatalogFailed {
            source: CatalogSource::Ip,
            ..
        }
    )));
    assert!(matches!(
        seen.last(),
        Some(InventoryEvent::RunCompleted { entries: 2, .. })
    ));
}

#[tokio::test]
async fn catalogs_merge_in_source_order() {
    // The same address in two catalogs resolves to the RF record
    let rf_parent = device("AAAA000000000001", "HM-Sec-SC");
    let mut wired_parent = device("AAAA000000000001", "HM-Sec-SC");
    wired_parent.firmware = "9.9".to_string();

    let service = MockBidcosService::new()
        .with_catalog(
            CatalogSource::Wired,
            vec![wired_parent.clone(), channel("AAAA000000000001:1", "SHUTTER_CONTACT", &wired_parent)],
        )
        .with_catalog(
            CatalogSource::Rf,
            vec![channel("AAAA000000000001:1", "SHUTTER_CONTACT", &rf_parent), rf_parent],
        )
        .with_interfaces(vec![interface("IF01", true, true)]);
    let (engine, _events) = engine(service);

    let report = engine.run_once().await.unwrap();

    assert_eq!(report.entries.len(), 1);
    assert_eq!(report.entries[0].firmware_version.as_deref(), Some("1.0"));
}

#[tokio::test]
async fn interface_list_failure_is_fatal() {
    let service = MockBidcosService::new()
        .with_catalog(CatalogSource::Rf, door_contact_catalog())
        .failing_interfaces();
    let (engine, _events) = engine(service);

    let result = engine.run_once().await;

    match result {
        Err(e @ Error::InterfaceList(_)) => assert!(e.is_fatal()),
        other => panic!("expected interface list error, got {:?}", other.map(|r| r.entries.len())),
    }
}
