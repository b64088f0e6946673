//! Inventory reconciliation
//!
//! Joins the registered instances with the merged device catalog and
//! appends catalog channels nobody registered ("unused channels").
//!
//! ## Field derivation
//!
//! | entry field | source |
//! |---|---|
//! | `device_type` | channel device `parent_type` |
//! | `firmware_version`, `associated_interface_address`, `roaming` | parent device |
//! | `channel_type`, `direction`, `aes_active` | channel device |
//!
//! Unresolved fields stay `None` (or the documented default), never abort.
//!
//! ## Duplicate assignment
//!
//! When a second instance points at an address that already has an entry,
//! the existing entry is flagged `is_multiply_assigned` and keeps the data of
//! the first instance. No second entry is created.

use crate::address::ChannelAddress;
use crate::config::ReconcileOptions;
use crate::index::DeviceIndex;
use crate::model::{
    HmDevice, InventoryEntry, MAINTENANCE_TYPE, RegisteredInstance, Roaming, VIRTUAL_KEY_TYPE,
};
use std::collections::HashMap;
use tracing::{debug, warn};

/// A registered instance that could not be reconciled
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedInstance {
    pub instance_id: u64,
    pub address: String,
}

/// Output of a reconciliation pass
#[derive(Debug, Clone, Default)]
pub struct Reconciliation {
    /// Entries in discovery order: instance entries first, unused channels after
    pub entries: Vec<InventoryEntry>,
    /// Instances taken into account, including skipped ones
    pub total_instances: usize,
    /// Distinct catalog addresses with at least one registered instance
    pub channels_assigned_at_least_once: usize,
    /// Instances with an unparsable address
    pub skipped: Vec<SkippedInstance>,
}

/// Joins registered instances with catalog devices
pub struct InventoryReconciler<'a> {
    index: &'a DeviceIndex<'a>,
    options: &'a ReconcileOptions,
}

impl<'a> InventoryReconciler<'a> {
    /// Create a reconciler over an indexed catalog
    pub fn new(index: &'a DeviceIndex<'a>, options: &'a ReconcileOptions) -> Self {
        Self { index, options }
    }

    /// Run the reconciliation
    ///
    /// `instances` must already be filtered to the gateway under inventory
    /// and be in discovery order.
    pub fn reconcile(&self, instances: &[RegisteredInstance]) -> Reconciliation {
        let mut result = Reconciliation {
            total_instances: instances.len(),
            ..Default::default()
        };
        let mut by_address: HashMap<String, usize> = HashMap::new();

        for instance in instances {
            let Some(parsed) = ChannelAddress::parse(&instance.address) else {
                warn!(
                    "HM address ({}) of instance {} is invalid, skipping",
                    instance.address, instance.id
                );
                result.skipped.push(SkippedInstance {
                    instance_id: instance.id,
                    address: instance.address.clone(),
                });
                continue;
            };

            if let Some(&pos) = by_address.get(&instance.address) {
                debug!(
                    "Instance {} shares address {} with instance {:?}",
                    instance.id, instance.address, result.entries[pos].instance_id
                );
                result.entries[pos].is_multiply_assigned = true;
                continue;
            }

            let (channel, parent) = self.index.resolve(&parsed, &instance.address);
            if channel.is_none() {
                debug!(
                    "Instance {} points at {} which no BidCos service knows",
                    instance.id, instance.address
                );
            }

            let mut entry = build_entry(next_sequence(&result.entries), &instance.address, channel, parent);
            entry.instance_id = Some(instance.id);
            entry.instance_display_name = Some(instance.display_name.clone());

            by_address.insert(instance.address.clone(), result.entries.len());
            result.entries.push(entry);
        }

        result.channels_assigned_at_least_once = result.entries.len();

        if self.options.include_unused_channels {
            self.append_unused_channels(&mut result.entries, &mut by_address);
        }

        result
    }

    /// Append catalog channels that have no entry yet
    fn append_unused_channels(
        &self,
        entries: &mut Vec<InventoryEntry>,
        by_address: &mut HashMap<String, usize>,
    ) {
        let before = entries.len();

        for device in self.index.devices() {
            if !device.is_channel() || by_address.contains_key(&device.address) {
                continue;
            }
            if device.device_type == VIRTUAL_KEY_TYPE && !self.options.include_virtual_keys {
                continue;
            }
            if device.device_type == MAINTENANCE_TYPE && !self.options.include_maintenance_channels {
                continue;
            }

            let parent = self.index.parent_of(device);
            let entry = build_entry(next_sequence(entries), &device.address, Some(device), parent);

            by_address.insert(device.address.clone(), entries.len());
            entries.push(entry);
        }

        debug!("Appended {} unused channel(s)", entries.len() - before);
    }
}

fn next_sequence(entries: &[InventoryEntry]) -> u32 {
    u32::try_from(entries.len() + 1).unwrap_or(u32::MAX)
}

/// Derive an entry from the resolved channel and parent devices
fn build_entry(
    sequence_number: u32,
    address: &str,
    channel: Option<&HmDevice>,
    parent: Option<&HmDevice>,
) -> InventoryEntry {
    let roaming = match parent {
        Some(p) if p.roaming == Some(true) => Roaming::Enabled,
        Some(_) => Roaming::Disabled,
        None => Roaming::Unknown,
    };

    InventoryEntry {
        sequence_number,
        instance_id: None,
        instance_display_name: None,
        is_multiply_assigned: false,
        address: address.to_string(),
        device_type: channel.and_then(|c| c.parent_type.clone()),
        device_name: None,
        firmware_version: parent.map(|p| p.firmware.clone()),
        channel_type: channel.map(|c| c.device_type.clone()),
        direction: channel.map(|c| c.direction).unwrap_or_default(),
        aes_active: channel.is_some_and(|c| c.aes_active),
        associated_interface_address: parent
            .and_then(|p| p.interface_address.clone())
            .filter(|a| !a.is_empty()),
        roaming,
        levels: None,
    }
}
