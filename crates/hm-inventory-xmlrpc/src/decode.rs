//! Mapping of decoded XML-RPC values onto the inventory records
//!
//! The BidCos services omit keys freely. Absent optional keys become
//! `None` or the field default, while records without an address are
//! dropped with a debug log.

use crate::value::Value;
use hm_inventory_core::model::{BidcosInterface, Direction, HmDevice, RssiParamset, RssiTable};
use hm_inventory_core::{Error, Result};
use std::collections::HashMap;

fn text(record: &Value, key: &str) -> Option<String> {
    record.get(key).and_then(Value::as_str).map(str::to_string)
}

fn non_empty_text(record: &Value, key: &str) -> Option<String> {
    text(record, key).filter(|s| !s.is_empty())
}

fn flag(record: &Value, key: &str) -> Option<bool> {
    record.get(key).and_then(Value::as_bool)
}

fn level(value: &Value) -> Option<i32> {
    value.as_i64().and_then(|v| i32::try_from(v).ok())
}

/// Decode a `listDevices` reply
pub fn devices(service: &str, value: &Value) -> Result<Vec<HmDevice>> {
    let records = value
        .as_array()
        .ok_or_else(|| Error::rpc(service, "listDevices did not return an array"))?;

    let mut devices = Vec::with_capacity(records.len());
    for record in records {
        let Some(address) = non_empty_text(record, "ADDRESS") else {
            tracing::debug!("{}: skipping device record without ADDRESS", service);
            continue;
        };

        devices.push(HmDevice {
            address,
            device_type: text(record, "TYPE").unwrap_or_default(),
            parent_address: text(record, "PARENT").unwrap_or_default(),
            parent_type: non_empty_text(record, "PARENT_TYPE"),
            firmware: text(record, "FIRMWARE").unwrap_or_default(),
            interface_address: non_empty_text(record, "INTERFACE"),
            roaming: flag(record, "ROAMING"),
            direction: record
                .get("DIRECTION")
                .and_then(Value::as_i64)
                .map(Direction::from_code)
                .unwrap_or_default(),
            aes_active: flag(record, "AES_ACTIVE").unwrap_or(false),
        });
    }
    Ok(devices)
}

/// Decode a `listBidcosInterfaces` reply
pub fn interfaces(service: &str, value: &Value) -> Result<Vec<BidcosInterface>> {
    let records = value
        .as_array()
        .ok_or_else(|| Error::rpc(service, "listBidcosInterfaces did not return an array"))?;

    Ok(records
        .iter()
        .filter_map(|record| {
            let Some(address) = non_empty_text(record, "ADDRESS") else {
                tracing::debug!("{}: skipping interface record without ADDRESS", service);
                return None;
            };
            Some(BidcosInterface {
                address,
                connected: flag(record, "CONNECTED").unwrap_or(false),
                is_default: flag(record, "DEFAULT").unwrap_or(false),
                description: text(record, "DESCRIPTION").unwrap_or_default(),
                firmware_version: non_empty_text(record, "FIRMWARE_VERSION"),
                duty_cycle_percent: record.get("DUTY_CYCLE").and_then(Value::as_f64),
            })
        })
        .collect())
}

/// Decode an `rssiInfo` reply
///
/// The reply maps each root id to a struct of interface addresses, each
/// holding an `[rx, tx]` array. Pairs that are not two integers are dropped.
pub fn rssi_table(service: &str, value: &Value) -> Result<RssiTable> {
    let roots = value
        .as_struct()
        .ok_or_else(|| Error::rpc(service, "rssiInfo did not return a struct"))?;

    let mut table = RssiTable::with_capacity(roots.len());
    for (root, peers) in roots {
        let Some(peers) = peers.as_struct() else {
            tracing::debug!("{}: rssiInfo entry for {} is not a struct", service, root);
            continue;
        };

        let mut row = HashMap::with_capacity(peers.len());
        for (interface, pair) in peers {
            match pair.as_array() {
                Some([rx, tx, ..]) => match (level(rx), level(tx)) {
                    (Some(rx), Some(tx)) => {
                        row.insert(interface.clone(), (rx, tx));
                    }
                    _ => tracing::debug!("{}: non-integer levels for {}/{}", service, root, interface),
                },
                _ => tracing::debug!("{}: malformed level pair for {}/{}", service, root, interface),
            }
        }
        table.insert(root.clone(), row);
    }
    Ok(table)
}

/// Decode the RSSI keys of a `getParamset` reply
///
/// Paramsets without RSSI keys decode to an empty [`RssiParamset`]; an
/// empty reply (`Nil`) is treated the same.
pub fn rssi_paramset(service: &str, value: &Value) -> Result<RssiParamset> {
    match value {
        Value::Nil => Ok(RssiParamset::default()),
        Value::Struct(_) => Ok(RssiParamset {
            rssi_peer: value.get("RSSI_PEER").and_then(level),
            rssi_device: value.get("RSSI_DEVICE").and_then(level),
        }),
        _ => Err(Error::rpc(service, "getParamset did not return a struct")),
    }
}
