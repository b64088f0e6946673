//! Presentation order of the inventory
//!
//! Every mode compares one text key case-insensitively and falls back to
//! the address order on ties. The address order itself compares channel
//! numbers numerically when two addresses share a root id, so `:9` sorts
//! before `:10`.
//!
//! Sorting is stable: an already sorted list does not move.

use crate::address::{ChannelAddress, cmp_ignore_ascii_case};
use crate::error::Error;
use crate::model::InventoryEntry;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

/// Sort key of the inventory
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum SortMode {
    #[default]
    ByAddress,
    ByDeviceType,
    ByChannelType,
    ByInstanceName,
    ByDeviceName,
}

impl SortMode {
    /// All modes with their configuration names
    pub const ALL: [(SortMode, &'static str); 5] = [
        (SortMode::ByAddress, "address"),
        (SortMode::ByDeviceType, "device_type"),
        (SortMode::ByChannelType, "channel_type"),
        (SortMode::ByInstanceName, "instance_name"),
        (SortMode::ByDeviceName, "device_name"),
    ];

    /// Configuration name of the mode
    pub fn name(self) -> &'static str {
        Self::ALL
            .iter()
            .find(|(mode, _)| *mode == self)
            .map_or("address", |(_, name)| name)
    }

    /// Compare two entries under this mode
    pub fn compare(self, a: &InventoryEntry, b: &InventoryEntry) -> Ordering {
        let primary = match self {
            SortMode::ByAddress => Ordering::Equal,
            SortMode::ByDeviceType => {
                cmp_ignore_ascii_case(a.device_type_or_unset(), b.device_type_or_unset())
            }
            SortMode::ByChannelType => {
                cmp_ignore_ascii_case(a.channel_type_or_unset(), b.channel_type_or_unset())
            }
            SortMode::ByInstanceName => cmp_ignore_ascii_case(
                a.instance_display_name_or_unset(),
                b.instance_display_name_or_unset(),
            ),
            SortMode::ByDeviceName => {
                cmp_ignore_ascii_case(a.device_name_or_unset(), b.device_name_or_unset())
            }
        };
        primary.then_with(|| compare_addresses(&a.address, &b.address))
    }
}

impl fmt::Display for SortMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for SortMode {
    type Err = Error;

    /// Accepts the configuration names and the legacy numeric codes
    /// (0 address, 1 device type, 2 channel type, 3 instance name, 4 device name)
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace('-', "_");
        if let Ok(code) = normalized.parse::<i64>() {
            return SortMode::try_from(code);
        }
        Self::ALL
            .iter()
            .find(|(_, name)| *name == normalized)
            .map(|(mode, _)| *mode)
            .ok_or_else(|| Error::UnknownSortMode(s.to_string()))
    }
}

impl TryFrom<i64> for SortMode {
    type Error = Error;

    fn try_from(code: i64) -> Result<Self, Self::Error> {
        match code {
            0 => Ok(SortMode::ByAddress),
            1 => Ok(SortMode::ByDeviceType),
            2 => Ok(SortMode::ByChannelType),
            3 => Ok(SortMode::ByInstanceName),
            4 => Ok(SortMode::ByDeviceName),
            other => Err(Error::UnknownSortMode(other.to_string())),
        }
    }
}

impl TryFrom<String> for SortMode {
    type Error = Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<SortMode> for String {
    fn from(mode: SortMode) -> Self {
        mode.name().to_string()
    }
}

/// Canonical address order
///
/// Addresses sharing a root id (compared case-insensitively) are ordered by
/// their numeric channel. Everything else, and numeric ties such as `01`
/// vs `1`, fall back to a case-insensitive comparison of the full address
/// and finally to a byte comparison so the order is total.
pub fn compare_addresses(a: &str, b: &str) -> Ordering {
    if let (Some(pa), Some(pb)) = (ChannelAddress::parse(a), ChannelAddress::parse(b))
        && cmp_ignore_ascii_case(pa.parent_id, pb.parent_id) == Ordering::Equal
    {
        let by_channel = pa.channel_number().cmp(&pb.channel_number());
        if by_channel != Ordering::Equal {
            return by_channel;
        }
    }
    cmp_ignore_ascii_case(a, b).then_with(|| a.cmp(b))
}

/// Sort entries in place under the given mode
pub fn sort_entries(entries: &mut [InventoryEntry], mode: SortMode) {
    entries.sort_by(|a, b| mode.compare(a, b));
}

/// Owned-list convenience over [`sort_entries`]
pub fn sort(mut entries: Vec<InventoryEntry>, mode: SortMode) -> Vec<InventoryEntry> {
    sort_entries(&mut entries, mode);
    entries
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Roaming;

    fn entry(address: &str, device_type: Option<&str>, name: Option<&str>) -> InventoryEntry {
        InventoryEntry {
            sequence_number: 0,
            instance_id: None,
            instance_display_name: name.map(str::to_string),
            is_multiply_assigned: false,
            address: address.to_string(),
            device_type: device_type.map(str::to_string),
            device_name: None,
            firmware_version: None,
            channel_type: None,
            direction: Default::default(),
            aes_active: false,
            associated_interface_address: None,
            roaming: Roaming::Unknown,
            levels: None,
        }
    }

    fn addresses(entries: &[InventoryEntry]) -> Vec<&str> {
        entries.iter().map(|e| e.address.as_str()).collect()
    }

    #[test]
    fn channels_sort_numerically() {
        let sorted = sort(
            vec![
                entry("ABCDEF1234567:10", None, None),
                entry("ABCDEF1234567:9", None, None),
                entry("ABCDEF1234567:1", None, None),
            ],
            SortMode::ByAddress,
        );
        assert_eq!(
            addresses(&sorted),
            ["ABCDEF1234567:1", "ABCDEF1234567:9", "ABCDEF1234567:10"]
        );
    }

    #[test]
    fn roots_compare_case_insensitively() {
        assert_eq!(compare_addresses("abc:2", "ABC:10"), Ordering::Less);
        assert_eq!(compare_addresses("ABD:1", "abc:9"), Ordering::Greater);
        assert_eq!(compare_addresses("ABC", "ABC:0"), Ordering::Less);
    }

    #[test]
    fn primary_key_then_address() {
        let sorted = sort(
            vec![
                entry("B:1", Some("hm-sec-sc"), None),
                entry("A:2", Some("HM-LC-Sw1"), None),
                entry("A:1", Some("HM-Sec-SC"), None),
            ],
            SortMode::ByDeviceType,
        );
        assert_eq!(addresses(&sorted), ["A:2", "A:1", "B:1"]);
    }

    #[test]
    fn unmatched_names_sort_as_sentinel() {
        let sorted = sort(
            vec![entry("A:1", None, Some("Kitchen")), entry("B:1", None, None)],
            SortMode::ByInstanceName,
        );
        assert_eq!(addresses(&sorted), ["B:1", "A:1"]);
    }

    #[test]
    fn sorting_twice_is_idempotent() {
        let once = sort(
            vec![
                entry("X:3", Some("T"), None),
                entry("X:1", Some("T"), None),
                entry("Y:1", Some("S"), None),
            ],
            SortMode::ByDeviceType,
        );
        let twice = sort(once.clone(), SortMode::ByDeviceType);
        assert_eq!(once, twice);
    }

    #[test]
    fn parses_names_and_legacy_codes() {
        assert_eq!("address".parse::<SortMode>().unwrap(), SortMode::ByAddress);
        assert_eq!("Device-Type".parse::<SortMode>().unwrap(), SortMode::ByDeviceType);
        assert_eq!("3".parse::<SortMode>().unwrap(), SortMode::ByInstanceName);
        assert_eq!(SortMode::try_from(4_i64).unwrap(), SortMode::ByDeviceName);
    }

    #[test]
    fn unknown_modes_are_errors() {
        assert!(matches!("color".parse::<SortMode>(), Err(Error::UnknownSortMode(_))));
        assert!(matches!(SortMode::try_from(5_i64), Err(Error::UnknownSortMode(_))));
        assert!(serde_json::from_str::<SortMode>("\"by_color\"").is_err());
    }

    #[test]
    fn serde_uses_configuration_names() {
        assert_eq!(serde_json::to_string(&SortMode::ByChannelType).unwrap(), "\"channel_type\"");
        let mode: SortMode = serde_json::from_str("\"instance_name\"").unwrap();
        assert_eq!(mode, SortMode::ByInstanceName);
    }
}
