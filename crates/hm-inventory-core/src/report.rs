//! Result of a reconciliation run
//!
//! The report is what downstream consumers (renderers, persistence) see.
//! Field names follow the inventory schema in camelCase.

use crate::model::{BidcosInterface, CatalogSource, InventoryEntry};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Recoverable condition encountered during a run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Diagnostic {
    /// One catalog service failed; the run continued without it
    #[serde(rename_all = "camelCase")]
    PartialSourceFailure { source: CatalogSource, message: String },

    /// A registered instance had an address without a channel
    #[serde(rename_all = "camelCase")]
    InvalidAddress { instance_id: u64, address: String },

    /// The RSSI table or a per-root paramset could not be read
    #[serde(rename_all = "camelCase")]
    LinkQueryFailure { target: String, message: String },
}

/// Summary counters of a run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InventorySummary {
    pub interface_count: usize,
    pub connected_interface_count: usize,
    /// Registered instances bound to the gateway, including invalid ones
    pub instance_count: usize,
    /// Distinct channels with at least one registered instance
    pub assigned_channel_count: usize,
    /// Channels known to the BidCos services
    pub total_channel_count: usize,
    /// Catalog services that failed
    pub source_error_count: usize,
    pub invalid_instance_count: usize,
}

/// Sorted, correlated inventory plus its summary
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryReport {
    pub generated_at: DateTime<Utc>,
    /// Interfaces with the default interface first
    pub interfaces: Vec<BidcosInterface>,
    pub entries: Vec<InventoryEntry>,
    pub summary: InventorySummary,
    #[serde(default)]
    pub diagnostics: Vec<Diagnostic>,
}

impl InventoryReport {
    /// Connected interfaces in level-slot order
    pub fn connected_interfaces(&self) -> impl Iterator<Item = &BidcosInterface> {
        self.interfaces.iter().filter(|i| i.connected)
    }

    /// Entry with the given address
    pub fn entry(&self, address: &str) -> Option<&InventoryEntry> {
        self.entries.iter().find(|e| e.address == address)
    }

    /// Whether any recoverable problem was recorded
    pub fn is_degraded(&self) -> bool {
        !self.diagnostics.is_empty()
    }
}
