//! Test doubles and common utilities for the inventory contract tests
//!
//! The doubles answer from canned data and count their calls, so tests can
//! assert both on the produced report and on how the engine talked to its
//! collaborators.

#![allow(dead_code)]

use hm_inventory_core::config::InventoryConfig;
use hm_inventory_core::error::{Error, Result};
use hm_inventory_core::model::{
    BidcosInterface, CatalogSource, HmDevice, RegisteredInstance, RssiParamset, RssiTable,
};
use hm_inventory_core::traits::{BidcosService, DeviceNameResolver};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// Gateway id used by all test configurations
pub const GATEWAY: &str = "ccu-test";

/// A BidcosService answering from canned data
pub struct MockBidcosService {
    catalogs: HashMap<CatalogSource, std::result::Result<Vec<HmDevice>, String>>,
    interfaces: std::result::Result<Vec<BidcosInterface>, String>,
    rssi: std::result::Result<RssiTable, String>,
    /// Paramsets by channel address; unknown addresses fail
    paramsets: HashMap<String, RssiParamset>,
    /// Call counter for list_devices()
    list_devices_count: Arc<AtomicUsize>,
    /// Addresses passed to get_paramset(), in call order
    paramset_queries: Arc<Mutex<Vec<String>>>,
}

impl MockBidcosService {
    /// All catalogs empty, no interfaces, empty RSSI table
    pub fn new() -> Self {
        Self {
            catalogs: CatalogSource::ALL
                .into_iter()
                .map(|source| (source, Ok(Vec::new())))
                .collect(),
            interfaces: Ok(Vec::new()),
            rssi: Ok(RssiTable::new()),
            paramsets: HashMap::new(),
            list_devices_count: Arc::new(AtomicUsize::new(0)),
            paramset_queries: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn with_catalog(mut self, source: CatalogSource, devices: Vec<HmDevice>) -> Self {
        self.catalogs.insert(source, Ok(devices));
        self
    }

    pub fn failing_catalog(mut self, source: CatalogSource) -> Self {
        self.catalogs
            .insert(source, Err(format!("{} unreachable", source)));
        self
    }

    pub fn with_interfaces(mut self, interfaces: Vec<BidcosInterface>) -> Self {
        self.interfaces = Ok(interfaces);
        self
    }

    pub fn failing_interfaces(mut self) -> Self {
        self.interfaces = Err("listBidcosInterfaces timed out".to_string());
        self
    }

    pub fn with_rssi(mut self, table: RssiTable) -> Self {
        self.rssi = Ok(table);
        self
    }

    pub fn failing_rssi(mut self) -> Self {
        self.rssi = Err("rssiInfo not supported".to_string());
        self
    }

    pub fn with_paramset(mut self, address: &str, paramset: RssiParamset) -> Self {
        self.paramsets.insert(address.to_string(), paramset);
        self
    }

    /// Get the number of times list_devices() was called
    pub fn list_devices_count(&self) -> usize {
        self.list_devices_count.load(Ordering::SeqCst)
    }

    /// Get the addresses queried through get_paramset()
    pub fn paramset_queries(&self) -> Vec<String> {
        self.paramset_queries.lock().unwrap().clone()
    }

    /// Handle to the paramset query log that outlives the boxed service
    pub fn paramset_log(&self) -> Arc<Mutex<Vec<String>>> {
        Arc::clone(&self.paramset_queries)
    }

    /// Handle to the list_devices() counter that outlives the boxed service
    pub fn list_devices_counter(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.list_devices_count)
    }
}

#[async_trait::async_trait]
impl BidcosService for MockBidcosService {
    async fn list_devices(&self, source: CatalogSource) -> Result<Vec<HmDevice>> {
        self.list_devices_count.fetch_add(1, Ordering::SeqCst);
        match self.catalogs.get(&source) {
            Some(Ok(devices)) => Ok(devices.clone()),
            Some(Err(message)) => Err(Error::rpc(source.service_name(), message.clone())),
            None => Ok(Vec::new()),
        }
    }

    async fn list_bidcos_interfaces(&self) -> Result<Vec<BidcosInterface>> {
        self.interfaces
            .clone()
            .map_err(|message| Error::rpc("BidCos-RF", message))
    }

    async fn rssi_info(&self) -> Result<RssiTable> {
        self.rssi
            .clone()
            .map_err(|message| Error::rpc("BidCos-RF", message))
    }

    async fn get_paramset(&self, address: &str, _paramset_key: &str) -> Result<RssiParamset> {
        self.paramset_queries
            .lock()
            .unwrap()
            .push(address.to_string());
        self.paramsets
            .get(address)
            .copied()
            .ok_or_else(|| Error::rpc("HmIP-RF", format!("Unknown parameter set for {}", address)))
    }

    fn service_name(&self) -> &'static str {
        "mock"
    }
}

/// A DeviceNameResolver answering from a fixed map
pub struct MockNameResolver {
    names: HashMap<String, String>,
    /// Call counter for channel_name()
    lookup_count: Arc<AtomicUsize>,
}

impl MockNameResolver {
    pub fn new(names: &[(&str, &str)]) -> Self {
        Self {
            names: names
                .iter()
                .map(|(address, name)| (address.to_string(), name.to_string()))
                .collect(),
            lookup_count: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn lookup_counter(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.lookup_count)
    }
}

#[async_trait::async_trait]
impl DeviceNameResolver for MockNameResolver {
    async fn channel_name(&self, address: &str) -> Result<Option<String>> {
        self.lookup_count.fetch_add(1, Ordering::SeqCst);
        match self.names.get(address) {
            Some(name) => Ok(Some(name.clone())),
            None => Err(Error::http(format!("no name for {}", address))),
        }
    }
}

/// Top-level catalog device
pub fn device(address: &str, device_type: &str) -> HmDevice {
    HmDevice {
        address: address.to_string(),
        device_type: device_type.to_string(),
        firmware: "1.0".to_string(),
        roaming: Some(false),
        ..Default::default()
    }
}

/// Catalog channel of `parent`
pub fn channel(address: &str, channel_type: &str, parent: &HmDevice) -> HmDevice {
    HmDevice {
        address: address.to_string(),
        device_type: channel_type.to_string(),
        parent_address: parent.address.clone(),
        parent_type: Some(parent.device_type.clone()),
        ..Default::default()
    }
}

pub fn interface(address: &str, connected: bool, is_default: bool) -> BidcosInterface {
    BidcosInterface {
        address: address.to_string(),
        connected,
        is_default,
        description: format!("{} gateway", address),
        ..Default::default()
    }
}

pub fn instance(id: u64, name: &str, address: &str) -> RegisteredInstance {
    RegisteredInstance::new(id, name, address, GATEWAY)
}

/// One row of an RSSI table
pub fn rssi_row(pairs: &[(&str, i32, i32)]) -> HashMap<String, (i32, i32)> {
    pairs
        .iter()
        .map(|(iface, rx, tx)| (iface.to_string(), (*rx, *tx)))
        .collect()
}

/// Helper to create a minimal InventoryConfig for testing
pub fn minimal_config() -> InventoryConfig {
    let mut config = InventoryConfig::new("ccu.local");
    config.gateway.gateway_id = GATEWAY.to_string();
    config.options.resolve_device_names = false;
    config
}

/// The two-record catalog of a door contact with one channel
pub fn door_contact_catalog() -> Vec<HmDevice> {
    let parent = device("AAAA000000000001", "HM-Sec-SC");
    vec![channel("AAAA000000000001:1", "SHUTTER_CONTACT", &parent), parent]
}
