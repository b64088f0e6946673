//! HomeMatic address handling
//!
//! Channel addresses have the form `"<deviceId>:<channel>"`, device
//! addresses are the bare `"<deviceId>"`. Registered instances always point
//! at a channel, so an instance address without `:` is rejected here.
//!
//! No case or locale normalization happens in this module. Callers that
//! need case-insensitive comparison use [`cmp_ignore_ascii_case`].

use std::cmp::Ordering;

/// Length of a root device id that qualifies for the per-device RSSI override
pub const RADIO_ROOT_ID_LEN: usize = 14;

/// A parsed channel address borrowed from its source string
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChannelAddress<'a> {
    /// Everything before the first `:`
    pub parent_id: &'a str,
    /// Everything after the first `:`
    pub channel: &'a str,
}

impl<'a> ChannelAddress<'a> {
    /// Parse a channel address, splitting on the first `:`
    ///
    /// Returns `None` when there is no separator or when the parent id in
    /// front of it is empty.
    pub fn parse(address: &'a str) -> Option<Self> {
        let (parent_id, channel) = address.split_once(':')?;
        if parent_id.is_empty() {
            return None;
        }
        Some(Self { parent_id, channel })
    }

    /// Channel number, parsed leniently (non-numeric channels count as 0)
    pub fn channel_number(&self) -> u64 {
        leading_number(self.channel)
    }

    /// Whether the parent id qualifies for the per-device RSSI override
    pub fn is_radio_capable(&self) -> bool {
        is_radio_root(self.parent_id)
    }
}

/// Root device id of any address: the part before the first `:`, or the
/// whole string when there is no separator
pub fn root_id(address: &str) -> &str {
    address.split_once(':').map_or(address, |(root, _)| root)
}

/// Format-derived heuristic: radio device ids are exactly 14 characters long
pub fn is_radio_root(root: &str) -> bool {
    root.chars().count() == RADIO_ROOT_ID_LEN
}

/// Byte-wise ASCII case-insensitive comparison
pub fn cmp_ignore_ascii_case(a: &str, b: &str) -> Ordering {
    a.bytes()
        .map(|c| c.to_ascii_lowercase())
        .cmp(b.bytes().map(|c| c.to_ascii_lowercase()))
}

/// Parse the leading decimal digits of a string, ignoring leading whitespace.
/// Anything unparsable yields 0.
fn leading_number(s: &str) -> u64 {
    let digits: &str = {
        let trimmed = s.trim_start();
        let end = trimmed
            .find(|c: char| !c.is_ascii_digit())
            .unwrap_or(trimmed.len());
        &trimmed[..end]
    };
    digits.parse().unwrap_or(0)
}
