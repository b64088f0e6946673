//! Error types for the HM inventory
//!
//! This module defines all error types used throughout the crate.
//!
//! Only the fatal conditions of a run surface as [`Error`]. Recoverable
//! conditions (a single catalog service down, an unparsable instance
//! address, a failed link-quality query) are recorded as
//! [`crate::report::Diagnostic`]s on the report instead.

use thiserror::Error;

/// Result type alias for inventory operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for the HM inventory
#[derive(Error, Debug)]
pub enum Error {
    /// None of the catalog services delivered a device
    #[error("Can't get any device information from the BidCos services ({failed} of 3 failed)")]
    TotalSourceFailure {
        /// Number of catalog services that returned an error
        failed: usize,
    },

    /// The interface list could not be fetched
    #[error("Can't get interface information from the BidCos service: {0}")]
    InterfaceList(String),

    /// A registered instance carries an address without a channel separator
    #[error("HM address ({address}) of instance {instance_id} is invalid")]
    InvalidAddress {
        /// Registry id of the offending instance
        instance_id: u64,
        /// The address as registered
        address: String,
    },

    /// A sort mode outside the defined set was requested
    #[error("Unknown sort order: {0}")]
    UnknownSortMode(String),

    /// Per-root RSSI or paramset query failed
    #[error("Link quality query failed: {0}")]
    LinkQuery(String),

    /// RPC call to a sub-service failed
    #[error("RPC error ({service}): {message}")]
    Rpc {
        /// Sub-service name
        service: String,
        /// Error message
        message: String,
    },

    /// Registered instance lookup failed
    #[error("Instance registry error: {0}")]
    Registry(String),

    /// Report sink failed to publish
    #[error("Report sink error: {0}")]
    Sink(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// HTTP transport errors
    #[error("HTTP error: {0}")]
    Http(String),

    /// Generic error with context
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create an interface list error
    pub fn interface_list(msg: impl Into<String>) -> Self {
        Self::InterfaceList(msg.into())
    }

    /// Create a link query error
    pub fn link_query(msg: impl Into<String>) -> Self {
        Self::LinkQuery(msg.into())
    }

    /// Create an RPC error for the given sub-service
    pub fn rpc(service: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Rpc {
            service: service.into(),
            message: message.into(),
        }
    }

    /// Create an instance registry error
    pub fn registry(msg: impl Into<String>) -> Self {
        Self::Registry(msg.into())
    }

    /// Create a report sink error
    pub fn sink(msg: impl Into<String>) -> Self {
        Self::Sink(msg.into())
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create an HTTP error
    pub fn http(msg: impl Into<String>) -> Self {
        Self::Http(msg.into())
    }

    /// Whether this error must abort the run before any report is produced
    pub fn is_fatal(&self) -> bool {
        !matches!(self, Self::InvalidAddress { .. } | Self::LinkQuery(_))
    }
}

/// Helper for converting anyhow::Error to our Error type
impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Self::Other(err.to_string())
    }
}
