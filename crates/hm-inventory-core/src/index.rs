//! Address index over the merged device catalog
//!
//! The catalog is the concatenation of the RF, IP and Wired device lists.
//! It is not deduplicated; when an address appears more than once the first
//! occurrence wins, the same record a front-to-back scan would stop at.

use crate::address::ChannelAddress;
use crate::model::HmDevice;
use std::collections::HashMap;

/// Lookup structure for one reconciliation run
#[derive(Debug)]
pub struct DeviceIndex<'a> {
    devices: &'a [HmDevice],
    by_address: HashMap<&'a str, usize>,
}

impl<'a> DeviceIndex<'a> {
    /// Build the index over a merged catalog
    pub fn new(devices: &'a [HmDevice]) -> Self {
        let mut by_address = HashMap::with_capacity(devices.len());
        for (pos, device) in devices.iter().enumerate() {
            by_address.entry(device.address.as_str()).or_insert(pos);
        }
        Self { devices, by_address }
    }

    /// Device with exactly this address
    pub fn get(&self, address: &str) -> Option<&'a HmDevice> {
        self.by_address.get(address).map(|&pos| &self.devices[pos])
    }

    /// Resolve the channel device and its parent device for a channel address
    ///
    /// Returns `(channel, parent)`; either may be absent independently.
    pub fn resolve(&self, address: &ChannelAddress<'_>, full: &str) -> (Option<&'a HmDevice>, Option<&'a HmDevice>) {
        (self.get(full), self.get(address.parent_id))
    }

    /// Parent device of a catalog record, looked up by its address prefix
    pub fn parent_of(&self, device: &HmDevice) -> Option<&'a HmDevice> {
        ChannelAddress::parse(&device.address).and_then(|parsed| self.get(parsed.parent_id))
    }

    /// Catalog records in merge order
    pub fn devices(&self) -> &'a [HmDevice] {
        self.devices
    }

    /// Number of catalog records that are channels
    pub fn channel_count(&self) -> usize {
        self.devices.iter().filter(|d| d.is_channel()).count()
    }

    /// Number of catalog records
    pub fn len(&self) -> usize {
        self.devices.len()
    }

    /// Whether the catalog is empty
    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn device(address: &str, device_type: &str, parent: &str) -> HmDevice {
        HmDevice {
            address: address.to_string(),
            device_type: device_type.to_string(),
            parent_address: parent.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn resolves_channel_and_parent() {
        let catalog = vec![
            device("AAAA000000000001:1", "SHUTTER_CONTACT", "AAAA000000000001"),
            device("AAAA000000000001", "HM-Sec-SC", ""),
        ];
        let index = DeviceIndex::new(&catalog);

        let parsed = ChannelAddress::parse("AAAA000000000001:1").unwrap();
        let (channel, parent) = index.resolve(&parsed, "AAAA000000000001:1");
        assert_eq!(channel.unwrap().device_type, "SHUTTER_CONTACT");
        assert_eq!(parent.unwrap().device_type, "HM-Sec-SC");
        assert_eq!(index.channel_count(), 1);
    }

    #[test]
    fn first_duplicate_wins() {
        let catalog = vec![device("X:1", "FIRST", "X"), device("X:1", "SECOND", "X")];
        let index = DeviceIndex::new(&catalog);
        assert_eq!(index.get("X:1").unwrap().device_type, "FIRST");
        assert_eq!(index.len(), 2);
    }

    #[test]
    fn parent_lookup_of_top_level_device_is_none() {
        let catalog = vec![device("X", "DEV", "")];
        let index = DeviceIndex::new(&catalog);
        assert!(index.parent_of(&catalog[0]).is_none());
        assert!(index.get("Y").is_none());
    }
}
