//! Link quality correlation
//!
//! Attaches RX/TX level pairs to inventory entries and marks the interface
//! with the best reception.
//!
//! Level data is kept per root device id: all channels of a device carry
//! the same levels. The correlation runs in two passes:
//!
//! 1. [`LinkQualityCorrelator::attach_levels`] builds the level vector of
//!    every entry from the bulk RSSI table, one slot per connected interface.
//! 2. The paramset override replaces the slot of the default interface with
//!    the `RSSI_PEER`/`RSSI_DEVICE` values read from the device itself. It
//!    walks the entries in address order, queries each root once
//!    ([`LinkQualityCorrelator::plan_paramset_queries`]) and lets consecutive
//!    channels of the same root reuse the previous entry's levels
//!    ([`LinkQualityCorrelator::apply_paramset_overrides`]).
//!
//! Failed queries are not errors here; the entry keeps whatever levels it
//! already had.

use crate::address::{is_radio_root, root_id};
use crate::model::{BidcosInterface, InventoryEntry, LEVEL_SENTINEL, LinkLevel, RssiParamset, RssiTable};
use std::collections::HashMap;
use tracing::debug;

/// Outcome of one per-root paramset query
pub type ParamsetResults = HashMap<String, Option<RssiParamset>>;

/// Correlates RSSI data with inventory entries
#[derive(Debug)]
pub struct LinkQualityCorrelator<'a> {
    /// Connected interfaces in slot order
    connected: Vec<&'a BidcosInterface>,
    /// Slot of the default interface, if it is connected
    default_slot: Option<usize>,
}

impl<'a> LinkQualityCorrelator<'a> {
    /// Create a correlator for an interface list already normalized so that
    /// the default interface comes first
    pub fn new(interfaces: &'a [BidcosInterface]) -> Self {
        let connected: Vec<&BidcosInterface> = interfaces.iter().filter(|i| i.connected).collect();
        let default_slot = connected.iter().position(|i| i.is_default);
        Self {
            connected,
            default_slot,
        }
    }

    /// Number of level slots per entry
    pub fn slot_count(&self) -> usize {
        self.connected.len()
    }

    /// Slot of the default interface among the connected interfaces
    pub fn default_slot(&self) -> Option<usize> {
        self.default_slot
    }

    /// Attach levels from the bulk RSSI table
    ///
    /// Entries whose root id has no table entry keep `levels == None`.
    pub fn attach_levels(&self, entries: &mut [InventoryEntry], table: &RssiTable) {
        for entry in entries.iter_mut() {
            let root = root_id(&entry.address);
            let Some(per_interface) = table.get(root) else {
                continue;
            };

            let mut levels: Vec<LinkLevel> = self
                .connected
                .iter()
                .map(|iface| match per_interface.get(&iface.address) {
                    Some(&(rx, tx)) => LinkLevel {
                        rx,
                        tx,
                        is_associated_interface: entry.associated_interface_address.as_deref()
                            == Some(iface.address.as_str()),
                        is_best: false,
                    },
                    None => LinkLevel::missing(),
                })
                .collect();

            mark_best(&mut levels);
            entry.levels = Some(levels);
        }
    }

    /// Roots to query for the paramset override, in query order
    ///
    /// `entries` must be sorted by address. A root is queried when it is
    /// radio-capable and differs from the root of the preceding entry.
    pub fn plan_paramset_queries(&self, entries: &[InventoryEntry]) -> Vec<String> {
        if self.default_slot.is_none() {
            return Vec::new();
        }

        let mut roots = Vec::new();
        let mut previous: Option<&str> = None;
        for entry in entries {
            let root = root_id(&entry.address);
            if !is_radio_root(root) {
                previous = None;
                continue;
            }
            if previous != Some(root) {
                roots.push(root.to_string());
            }
            previous = Some(root);
        }
        roots
    }

    /// Apply the paramset override to address-sorted entries
    ///
    /// `results` maps each planned root to the paramset read, or `None` when
    /// the query failed.
    pub fn apply_paramset_overrides(&self, entries: &mut [InventoryEntry], results: &ParamsetResults) {
        let Some(slot) = self.default_slot else {
            debug!("Default interface not connected, skipping paramset override");
            return;
        };

        let mut previous_root: Option<String> = None;
        let mut previous_levels: Option<Vec<LinkLevel>> = None;

        for entry in entries.iter_mut() {
            let root = root_id(&entry.address);
            if !is_radio_root(root) {
                previous_root = None;
                continue;
            }

            if previous_root.as_deref() == Some(root) {
                entry.levels = previous_levels.clone();
                continue;
            }

            if let Some(Some(paramset)) = results.get(root)
                && !paramset.is_empty()
            {
                let slots = self.slot_count();
                let levels = entry
                    .levels
                    .get_or_insert_with(|| vec![LinkLevel::missing(); slots]);
                if levels.len() < slots {
                    levels.resize(slots, LinkLevel::missing());
                }
                levels[slot] = LinkLevel {
                    rx: paramset.rssi_peer.unwrap_or(LEVEL_SENTINEL),
                    tx: paramset.rssi_device.unwrap_or(LEVEL_SENTINEL),
                    is_associated_interface: false,
                    is_best: false,
                };
                mark_best(levels);
            }

            previous_root = Some(root.to_string());
            previous_levels = entry.levels.clone();
        }
    }
}

/// Mark the level with the greatest measured RX as best
///
/// Exactly one level is marked when at least one RX value was measured;
/// ties go to the first interface. With no measured RX, none is marked.
pub fn mark_best(levels: &mut [LinkLevel]) {
    let mut best: Option<usize> = None;
    for (pos, level) in levels.iter().enumerate() {
        if !level.has_rx() {
            continue;
        }
        match best {
            Some(b) if levels[b].rx >= level.rx => {}
            _ => best = Some(pos),
        }
    }
    for (pos, level) in levels.iter_mut().enumerate() {
        level.is_best = Some(pos) == best;
    }
}
