//! Data model of the inventory
//!
//! Catalog records ([`HmDevice`], [`BidcosInterface`]) arrive already decoded
//! from the BidCos services. Optional keys of the wire records are explicit
//! `Option`s or defaulted fields here, never dynamic maps.
//!
//! All types serialize with camelCase field names. That shape is the
//! canonical schema of a persisted inventory.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Marker meaning "no measurement available" for RX/TX levels
pub const LEVEL_SENTINEL: i32 = 65536;

/// Catalog device type of virtual remote keys
pub const VIRTUAL_KEY_TYPE: &str = "VIRTUAL_KEY";

/// Catalog device type of maintenance channels
pub const MAINTENANCE_TYPE: &str = "MAINTENANCE";

/// Which BidCos sub-service a catalog was fetched from
///
/// The declaration order is the merge order of the catalogs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CatalogSource {
    /// BidCos-RF (port 2001)
    Rf,
    /// HmIP (port 2010)
    Ip,
    /// BidCos-Wired (port 2000)
    Wired,
}

impl CatalogSource {
    /// All sources in merge order
    pub const ALL: [CatalogSource; 3] = [CatalogSource::Rf, CatalogSource::Ip, CatalogSource::Wired];

    /// Human-readable service name
    pub fn service_name(self) -> &'static str {
        match self {
            CatalogSource::Rf => "BidCos-RF",
            CatalogSource::Ip => "BidCos-IP",
            CatalogSource::Wired => "BidCos-Wired",
        }
    }
}

impl std::fmt::Display for CatalogSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.service_name())
    }
}

/// Data direction of a channel
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Direction {
    #[default]
    None,
    Tx,
    Rx,
}

impl Direction {
    /// Map the numeric `DIRECTION` code (0/1/2); unknown codes are `None`
    pub fn from_code(code: i64) -> Self {
        match code {
            1 => Direction::Tx,
            2 => Direction::Rx,
            _ => Direction::None,
        }
    }
}

/// Roaming capability as derived from the parent device
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Roaming {
    /// No parent device resolved
    #[default]
    Unknown,
    Enabled,
    Disabled,
}

/// A device or channel as listed by a BidCos service
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HmDevice {
    /// `"ID"` for devices, `"ID:CHANNEL"` for channels
    pub address: String,

    /// Device or channel type (`TYPE`)
    #[serde(rename = "type")]
    pub device_type: String,

    /// Address of the parent device, empty for top-level devices
    #[serde(default)]
    pub parent_address: String,

    /// Type of the parent device (channels only)
    #[serde(default)]
    pub parent_type: Option<String>,

    /// Firmware version (devices only)
    #[serde(default)]
    pub firmware: String,

    /// Address of the interface the device is bound to
    #[serde(default)]
    pub interface_address: Option<String>,

    /// Roaming flag (devices only)
    #[serde(default)]
    pub roaming: Option<bool>,

    #[serde(default)]
    pub direction: Direction,

    #[serde(default)]
    pub aes_active: bool,
}

impl HmDevice {
    /// Whether this record is a channel rather than a top-level device
    pub fn is_channel(&self) -> bool {
        !self.parent_address.is_empty()
    }
}

/// A device instance registered locally against a catalog address
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisteredInstance {
    pub id: u64,
    pub display_name: String,
    pub address: String,
    /// Gateway the instance is bound to; only instances of the gateway under
    /// inventory take part in a run
    pub gateway_id: String,
}

impl RegisteredInstance {
    /// Create a new registered instance
    pub fn new(
        id: u64,
        display_name: impl Into<String>,
        address: impl Into<String>,
        gateway_id: impl Into<String>,
    ) -> Self {
        Self {
            id,
            display_name: display_name.into(),
            address: address.into(),
            gateway_id: gateway_id.into(),
        }
    }
}

/// A radio interface (LAN gateway or the controller's own transceiver)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BidcosInterface {
    pub address: String,
    pub connected: bool,
    pub is_default: bool,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub firmware_version: Option<String>,
    #[serde(default)]
    pub duty_cycle_percent: Option<f64>,
}

/// Reorder interfaces so that the default interface comes first
///
/// The relative order of all other interfaces is preserved. Only the first
/// interface flagged as default is moved.
pub fn normalize_interfaces(mut interfaces: Vec<BidcosInterface>) -> Vec<BidcosInterface> {
    if let Some(pos) = interfaces.iter().position(|i| i.is_default) {
        let default = interfaces.remove(pos);
        interfaces.insert(0, default);
    }
    interfaces
}

/// One RX/TX level pair as seen between a device and an interface
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkLevel {
    /// Level received by the device from the interface
    pub rx: i32,
    /// Level received by the interface from the device
    pub tx: i32,
    /// The interface is the one the device is bound to
    pub is_associated_interface: bool,
    /// The interface with the best level for this device
    pub is_best: bool,
}

impl LinkLevel {
    /// Level pair with no measurement
    pub const fn missing() -> Self {
        Self {
            rx: LEVEL_SENTINEL,
            tx: LEVEL_SENTINEL,
            is_associated_interface: false,
            is_best: false,
        }
    }

    /// Whether an RX value was measured
    pub fn has_rx(&self) -> bool {
        self.rx != LEVEL_SENTINEL
    }
}

/// RSSI table: root device id -> interface address -> (rx, tx)
pub type RssiTable = HashMap<String, HashMap<String, (i32, i32)>>;

/// RSSI values read from a device's `VALUES` paramset
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RssiParamset {
    pub rssi_peer: Option<i32>,
    pub rssi_device: Option<i32>,
}

impl RssiParamset {
    /// Whether the paramset carried any RSSI value
    pub fn is_empty(&self) -> bool {
        self.rssi_peer.is_none() && self.rssi_device.is_none()
    }
}

/// Sentinel for unresolved text fields when comparing or rendering
pub const UNSET: &str = "-";

/// The reconciled unit: one per distinct address
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryEntry {
    /// Discovery order, independent of the presentation order
    pub sequence_number: u32,
    /// `None` for unused channels
    pub instance_id: Option<u64>,
    /// `None` for unused channels
    pub instance_display_name: Option<String>,
    pub is_multiply_assigned: bool,
    pub address: String,
    /// Type of the parent device
    pub device_type: Option<String>,
    /// Name configured on the controller, looked up separately
    pub device_name: Option<String>,
    pub firmware_version: Option<String>,
    /// Type of this channel
    pub channel_type: Option<String>,
    pub direction: Direction,
    pub aes_active: bool,
    pub associated_interface_address: Option<String>,
    pub roaming: Roaming,
    /// Index-aligned with the connected interfaces; `None` when the device
    /// has no RSSI data at all
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub levels: Option<Vec<LinkLevel>>,
}

impl InventoryEntry {
    /// Whether the entry stems from a registered instance
    pub fn is_matched(&self) -> bool {
        self.instance_id.is_some()
    }

    /// Display name or the unset sentinel
    pub fn instance_display_name_or_unset(&self) -> &str {
        self.instance_display_name.as_deref().unwrap_or(UNSET)
    }

    /// Device type or the unset sentinel
    pub fn device_type_or_unset(&self) -> &str {
        self.device_type.as_deref().unwrap_or(UNSET)
    }

    /// Channel type or the unset sentinel
    pub fn channel_type_or_unset(&self) -> &str {
        self.channel_type.as_deref().unwrap_or(UNSET)
    }

    /// Device name or the unset sentinel
    pub fn device_name_or_unset(&self) -> &str {
        self.device_name.as_deref().unwrap_or(UNSET)
    }
}
