//! Contract Test: Link Quality Correlation
//!
//! Verifies how RSSI data ends up on the entries.
//!
//! Constraints verified:
//! - Levels are index-aligned with the connected interfaces, default first
//! - Exactly one best level when any RX was measured, none otherwise
//! - The paramset of a radio root is read once, consecutive channels reuse it
//! - Failed link queries degrade the report, never abort it

mod common;

use common::*;
use hm_inventory_core::link_quality::mark_best;
use hm_inventory_core::model::{CatalogSource, LEVEL_SENTINEL, LinkLevel, RssiParamset, RssiTable};
use hm_inventory_core::{Diagnostic, InventoryEngine, InventoryReport, StaticInstanceRegistry};

const RADIO_ROOT: &str = "NEQ00000000001";

async fn run(service: MockBidcosService) -> InventoryReport {
    let (engine, _events) = InventoryEngine::new(
        Box::new(service),
        Box::new(StaticInstanceRegistry::default()),
        None,
        minimal_config(),
    )
    .expect("engine construction succeeds");

    engine.run_once().await.expect("run succeeds")
}

/// A radio thermostat bound to IF02 with three channels
fn thermostat_catalog() -> Vec<hm_inventory_core::model::HmDevice> {
    let mut parent = device(RADIO_ROOT, "HmIP-eTRV-2");
    parent.interface_address = Some("IF02".to_string());
    vec![
        parent.clone(),
        channel(&format!("{}:2", RADIO_ROOT), "HEATING_CLIMATECONTROL_TRANSCEIVER", &parent),
        channel(&format!("{}:0", RADIO_ROOT), "MAINTENANCE", &parent),
        channel(&format!("{}:1", RADIO_ROOT), "HEATING_CLIMATE_CONTROL_RECEIVER", &parent),
    ]
}

fn thermostat_rssi() -> RssiTable {
    let mut table = RssiTable::new();
    table.insert(RADIO_ROOT.to_string(), rssi_row(&[("IF02", -80, -75)]));
    table
}

#[tokio::test]
async fn levels_follow_connected_interface_order() {
    let mut table = RssiTable::new();
    table.insert(
        "AAAA000000000001".to_string(),
        rssi_row(&[("IF01", -60, -70), ("IF02", LEVEL_SENTINEL, LEVEL_SENTINEL)]),
    );
    let service = MockBidcosService::new()
        .with_catalog(CatalogSource::Rf, door_contact_catalog())
        .with_interfaces(vec![
            interface("IF02", true, false),
            interface("IF03", false, false),
            interface("IF01", true, true),
        ])
        .with_rssi(table);

    let report = run(service).await;

    let addresses: Vec<&str> = report.interfaces.iter().map(|i| i.address.as_str()).collect();
    assert_eq!(addresses, ["IF01", "IF02", "IF03"]);
    assert_eq!(report.summary.interface_count, 3);
    assert_eq!(report.summary.connected_interface_count, 2);

    let levels = report.entry("AAAA000000000001:1").unwrap().levels.clone().unwrap();
    assert_eq!(
        levels,
        vec![
            LinkLevel {
                rx: -60,
                tx: -70,
                is_associated_interface: false,
                is_best: true,
            },
            LinkLevel::missing(),
        ]
    );
}

#[tokio::test]
async fn devices_without_rssi_row_have_no_levels() {
    let service = MockBidcosService::new()
        .with_catalog(CatalogSource::Rf, door_contact_catalog())
        .with_interfaces(vec![interface("IF01", true, true)]);

    let report = run(service).await;

    assert!(report.entries.iter().all(|e| e.levels.is_none()));
}

#[test]
fn best_level_is_unique() {
    let cases: Vec<Vec<i32>> = vec![
        vec![-60, -60, -70],
        vec![LEVEL_SENTINEL, -90, -40],
        vec![LEVEL_SENTINEL, LEVEL_SENTINEL],
        vec![-100],
        vec![],
    ];

    for rx_values in cases {
        let mut levels: Vec<LinkLevel> = rx_values
            .iter()
            .map(|&rx| LinkLevel {
                rx,
                tx: rx,
                is_associated_interface: false,
                is_best: false,
            })
            .collect();
        mark_best(&mut levels);

        let best = levels.iter().filter(|l| l.is_best).count();
        let measured = rx_values.iter().any(|&rx| rx != LEVEL_SENTINEL);
        assert_eq!(best, usize::from(measured), "{:?}", rx_values);
    }

    // Ties go to the first interface
    let mut tied = vec![
        LinkLevel { rx: -60, tx: 0, is_associated_interface: false, is_best: false },
        LinkLevel { rx: -60, tx: 0, is_associated_interface: false, is_best: false },
    ];
    mark_best(&mut tied);
    assert!(tied[0].is_best);
    assert!(!tied[1].is_best);
}

#[tokio::test]
async fn radio_root_paramset_is_read_once_and_shared() {
    let service = MockBidcosService::new()
        .with_catalog(CatalogSource::Ip, thermostat_catalog())
        .with_catalog(CatalogSource::Rf, door_contact_catalog())
        .with_interfaces(vec![interface("IF02", true, false), interface("IF01", true, true)])
        .with_rssi(thermostat_rssi())
        .with_paramset(
            &format!("{}:0", RADIO_ROOT),
            RssiParamset {
                rssi_peer: Some(-50),
                rssi_device: Some(-55),
            },
        );
    let queries = service.paramset_log();

    let report = run(service).await;

    assert_eq!(*queries.lock().unwrap(), vec![format!("{}:0", RADIO_ROOT)]);

    let channels: Vec<_> = report
        .entries
        .iter()
        .filter(|e| e.address.starts_with(RADIO_ROOT))
        .collect();
    assert_eq!(channels.len(), 3);

    let expected = vec![
        LinkLevel {
            rx: -50,
            tx: -55,
            is_associated_interface: false,
            is_best: true,
        },
        LinkLevel {
            rx: -80,
            tx: -75,
            is_associated_interface: true,
            is_best: false,
        },
    ];
    for entry in channels {
        assert_eq!(entry.levels.as_ref(), Some(&expected), "{}", entry.address);
    }

    // The door contact root is not a radio root and is never queried
    assert!(report.entry("AAAA000000000001:1").unwrap().levels.is_none());
    assert!(report.diagnostics.is_empty());
}

#[tokio::test]
async fn paramset_without_rssi_row_creates_levels() {
    let service = MockBidcosService::new()
        .with_catalog(CatalogSource::Ip, thermostat_catalog())
        .with_interfaces(vec![interface("IF01", true, true), interface("IF02", true, false)])
        .with_paramset(
            &format!("{}:0", RADIO_ROOT),
            RssiParamset {
                rssi_peer: Some(-65),
                rssi_device: None,
            },
        );

    let report = run(service).await;

    let levels = report
        .entry(&format!("{}:1", RADIO_ROOT))
        .unwrap()
        .levels
        .clone()
        .unwrap();
    assert_eq!(levels.len(), 2);
    assert_eq!(levels[0].rx, -65);
    assert_eq!(levels[0].tx, LEVEL_SENTINEL);
    assert!(levels[0].is_best);
    assert_eq!(levels[1], LinkLevel::missing());
}

#[tokio::test]
async fn failed_paramset_keeps_table_levels() {
    let service = MockBidcosService::new()
        .with_catalog(CatalogSource::Ip, thermostat_catalog())
        .with_interfaces(vec![interface("IF01", true, true), interface("IF02", true, false)])
        .with_rssi(thermostat_rssi());
    let queries = service.paramset_log();

    let report = run(service).await;

    assert_eq!(queries.lock().unwrap().len(), 1);
    let levels = report
        .entry(&format!("{}:2", RADIO_ROOT))
        .unwrap()
        .levels
        .clone()
        .unwrap();
    assert_eq!(levels[0], LinkLevel::missing());
    assert_eq!(levels[1].rx, -80);
    assert!(levels[1].is_best);

    assert!(report.diagnostics.iter().any(|d| matches!(
        d,
        Diagnostic::LinkQueryFailure { target, .. } if *target == format!("{}:0", RADIO_ROOT)
    )));
}

#[tokio::test]
async fn no_override_when_default_interface_is_disconnected() {
    let service = MockBidcosService::new()
        .with_catalog(CatalogSource::Ip, thermostat_catalog())
        .with_interfaces(vec![interface("IF01", false, true), interface("IF02", true, false)])
        .with_rssi(thermostat_rssi());
    let queries = service.paramset_log();

    let report = run(service).await;

    assert!(queries.lock().unwrap().is_empty());
    let levels = report
        .entry(&format!("{}:0", RADIO_ROOT))
        .unwrap()
        .levels
        .clone()
        .unwrap();
    assert_eq!(levels.len(), 1);
    assert!(levels[0].is_associated_interface);
    assert!(levels[0].is_best);
}

#[tokio::test]
async fn rssi_table_failure_is_a_diagnostic() {
    let service = MockBidcosService::new()
        .with_catalog(CatalogSource::Rf, door_contact_catalog())
        .with_interfaces(vec![interface("IF01", true, true)])
        .failing_rssi();

    let report = run(service).await;

    assert!(report.is_degraded());
    assert!(report.diagnostics.iter().any(|d| matches!(
        d,
        Diagnostic::LinkQueryFailure { target, .. } if target == "rssiInfo"
    )));
    assert!(report.entries.iter().all(|e| e.levels.is_none()));
}
