//! Configuration types for the HM inventory
//!
//! A run is fully described by one immutable [`InventoryConfig`] passed to
//! the engine. Nothing is read from global state.

use crate::sort::SortMode;
use serde::{Deserialize, Serialize};

/// Main inventory configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InventoryConfig {
    /// Controller connection
    pub gateway: GatewayConfig,

    /// Reconciliation toggles and sort order
    #[serde(default)]
    pub options: ReconcileOptions,

    /// Where finished reports go
    #[serde(default)]
    pub output: OutputConfig,

    /// Optional engine settings
    #[serde(default)]
    pub engine: EngineConfig,
}

impl InventoryConfig {
    /// Create a configuration for a controller host with defaults elsewhere
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            gateway: GatewayConfig::new(host),
            ..Default::default()
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        self.gateway.validate()?;
        self.output.validate()?;

        if self.engine.event_channel_capacity == 0 {
            return Err(crate::Error::config("Event channel capacity must be > 0"));
        }

        Ok(())
    }
}

/// Connection to the controller running the BidCos services
#[derive(Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    /// Registered service factory to use
    #[serde(default = "default_service")]
    pub service: String,

    /// Controller host name or IP address
    pub host: String,

    /// Identifier registered instances use to reference this gateway
    ///
    /// Defaults to the host when empty.
    #[serde(default)]
    pub gateway_id: String,

    #[serde(default = "default_rf_port")]
    pub rf_port: u16,

    #[serde(default = "default_ip_port")]
    pub ip_port: u16,

    #[serde(default = "default_wired_port")]
    pub wired_port: u16,

    /// Port of the script endpoint used for device name lookup
    #[serde(default = "default_script_port")]
    pub script_port: u16,

    /// Optional basic-auth user passed through to every call
    #[serde(default)]
    pub username: Option<String>,

    /// Optional basic-auth password
    /// ⚠️ NEVER log this value
    #[serde(default)]
    pub password: Option<String>,

    #[serde(default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,

    /// Total timeout per call
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

// Custom Debug implementation that hides the password
impl std::fmt::Debug for GatewayConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GatewayConfig")
            .field("service", &self.service)
            .field("host", &self.host)
            .field("gateway_id", &self.gateway_id)
            .field("rf_port", &self.rf_port)
            .field("ip_port", &self.ip_port)
            .field("wired_port", &self.wired_port)
            .field("script_port", &self.script_port)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "<REDACTED>"))
            .field("connect_timeout_ms", &self.connect_timeout_ms)
            .field("timeout_ms", &self.timeout_ms)
            .finish()
    }
}

impl GatewayConfig {
    /// Create a gateway configuration with default ports and timeouts
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            ..Default::default()
        }
    }

    /// Identifier used to filter registered instances
    pub fn effective_gateway_id(&self) -> &str {
        if self.gateway_id.is_empty() {
            &self.host
        } else {
            &self.gateway_id
        }
    }

    /// Validate the gateway configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.service.is_empty() {
            return Err(crate::Error::config("Gateway service type cannot be empty"));
        }
        if self.host.trim().is_empty() {
            return Err(crate::Error::config("Gateway host cannot be empty"));
        }
        if self.host.contains('/') || self.host.contains(' ') {
            return Err(crate::Error::config(format!(
                "Gateway host must be a host name or IP address, got: {}",
                self.host
            )));
        }
        for (name, port) in [
            ("rf_port", self.rf_port),
            ("ip_port", self.ip_port),
            ("wired_port", self.wired_port),
            ("script_port", self.script_port),
        ] {
            if port == 0 {
                return Err(crate::Error::config(format!("Gateway {} must be > 0", name)));
            }
        }
        if self.connect_timeout_ms == 0 || self.timeout_ms == 0 {
            return Err(crate::Error::config("Gateway timeouts must be > 0"));
        }
        if self.connect_timeout_ms > self.timeout_ms {
            return Err(crate::Error::config(
                "Gateway connect timeout cannot exceed the total timeout",
            ));
        }
        if self.password.is_some() && self.username.is_none() {
            return Err(crate::Error::config("Gateway password given without a username"));
        }
        Ok(())
    }
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            service: default_service(),
            host: String::new(),
            gateway_id: String::new(),
            rf_port: default_rf_port(),
            ip_port: default_ip_port(),
            wired_port: default_wired_port(),
            script_port: default_script_port(),
            username: None,
            password: None,
            connect_timeout_ms: default_connect_timeout_ms(),
            timeout_ms: default_timeout_ms(),
        }
    }
}

fn default_service() -> String {
    "xmlrpc".to_string()
}

fn default_rf_port() -> u16 {
    2001
}

fn default_ip_port() -> u16 {
    2010
}

fn default_wired_port() -> u16 {
    2000
}

fn default_script_port() -> u16 {
    8181
}

fn default_connect_timeout_ms() -> u64 {
    1000
}

fn default_timeout_ms() -> u64 {
    5000
}

/// Reconciliation toggles
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReconcileOptions {
    /// Append catalog channels without a registered instance
    #[serde(default = "default_true")]
    pub include_unused_channels: bool,

    /// Include unused `VIRTUAL_KEY` channels
    #[serde(default)]
    pub include_virtual_keys: bool,

    /// Include unused `MAINTENANCE` channels
    #[serde(default = "default_true")]
    pub include_maintenance_channels: bool,

    /// Look up the controller-side name of every entry
    #[serde(default = "default_true")]
    pub resolve_device_names: bool,

    /// Presentation order of the final list
    #[serde(default)]
    pub sort_mode: SortMode,
}

impl Default for ReconcileOptions {
    fn default() -> Self {
        Self {
            include_unused_channels: true,
            include_virtual_keys: false,
            include_maintenance_channels: true,
            resolve_device_names: true,
            sort_mode: SortMode::default(),
        }
    }
}

fn default_true() -> bool {
    true
}

/// Report output configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OutputConfig {
    /// JSON file
    File {
        /// Path to the report file
        path: String,
    },

    /// Keep the latest report in memory
    #[default]
    Memory,
}

impl OutputConfig {
    /// Validate the output configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        match self {
            OutputConfig::File { path } if path.is_empty() => {
                Err(crate::Error::config("Report file path cannot be empty"))
            }
            _ => Ok(()),
        }
    }

    /// Get the sink type name
    pub fn type_name(&self) -> &str {
        match self {
            OutputConfig::File { .. } => "file",
            OutputConfig::Memory => "memory",
        }
    }
}

/// Engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Capacity of the internal event channel
    ///
    /// When full, new events are dropped (with a warning log).
    ///
    /// Default: 100 events
    #[serde(default = "default_event_channel_capacity")]
    pub event_channel_capacity: usize,

    /// Seconds between periodic runs, 0 for a single run
    #[serde(default)]
    pub update_interval_secs: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            event_channel_capacity: default_event_channel_capacity(),
            update_interval_secs: 0,
        }
    }
}

fn default_event_channel_capacity() -> usize {
    100
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_controller_layout() {
        let config = InventoryConfig::new("192.168.1.10");
        assert_eq!(config.gateway.rf_port, 2001);
        assert_eq!(config.gateway.ip_port, 2010);
        assert_eq!(config.gateway.wired_port, 2000);
        assert_eq!(config.gateway.effective_gateway_id(), "192.168.1.10");
        assert!(config.options.include_unused_channels);
        assert!(!config.options.include_virtual_keys);
        assert!(config.options.include_maintenance_channels);
        assert_eq!(config.options.sort_mode, SortMode::ByAddress);
        config.validate().unwrap();
    }

    #[test]
    fn empty_host_is_rejected() {
        assert!(InventoryConfig::default().validate().is_err());
    }

    #[test]
    fn connect_timeout_must_not_exceed_total() {
        let mut config = InventoryConfig::new("ccu");
        config.gateway.connect_timeout_ms = 10_000;
        assert!(config.validate().is_err());
    }

    #[test]
    fn debug_redacts_password() {
        let mut gateway = GatewayConfig::new("ccu");
        gateway.username = Some("admin".to_string());
        gateway.password = Some("hunter2".to_string());
        let rendered = format!("{:?}", gateway);
        assert!(!rendered.contains("hunter2"));
        assert!(rendered.contains("<REDACTED>"));
    }

    #[test]
    fn deserializes_partial_json() {
        let config: InventoryConfig = serde_json::from_value(serde_json::json!({
            "gateway": { "host": "ccu3", "gateway_id": "12345" },
            "options": { "sort_mode": "channel_type", "include_virtual_keys": true },
            "output": { "type": "file", "path": "/tmp/hm_inventory.json" }
        }))
        .unwrap();

        assert_eq!(config.gateway.effective_gateway_id(), "12345");
        assert_eq!(config.gateway.timeout_ms, 5000);
        assert_eq!(config.options.sort_mode, SortMode::ByChannelType);
        assert!(config.options.include_virtual_keys);
        assert!(config.options.include_unused_channels);
        assert_eq!(config.output.type_name(), "file");
    }

    #[test]
    fn unknown_sort_mode_fails_deserialization() {
        let parsed: Result<ReconcileOptions, _> =
            serde_json::from_value(serde_json::json!({ "sort_mode": "by_mood" }));
        assert!(parsed.is_err());
    }
}
