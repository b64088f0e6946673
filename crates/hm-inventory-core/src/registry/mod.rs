//! Plugin-based service registry
//!
//! The registry maps service type names to factories, so the daemon picks
//! the BidCos transport and the report sink from configuration without
//! hard-coded match arms.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use hm_inventory_core::registry::ServiceRegistry;
//! use hm_inventory_core::config::InventoryConfig;
//!
//! let registry = ServiceRegistry::with_builtin_sinks();
//! hm_inventory_xmlrpc::register(&registry);
//!
//! let config = InventoryConfig::new("ccu3");
//! let service = registry.create_service(&config.gateway)?;
//! let sink = registry.create_sink(&config.output).await?;
//! ```
//!
//! ## Registration
//!
//! Transport crates register themselves during initialization:
//!
//! ```rust,ignore
//! pub fn register(registry: &ServiceRegistry) {
//!     registry.register_service("xmlrpc", Box::new(XmlRpcServiceFactory));
//! }
//! ```

use crate::config::{GatewayConfig, OutputConfig};
use crate::error::{Error, Result};
use crate::sink::{FileReportSinkFactory, MemoryReportSinkFactory};
use crate::traits::{BidcosService, BidcosServiceFactory, ReportSink, ReportSinkFactory};
use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Registry of BidCos service and report sink factories
///
/// ## Thread Safety
///
/// The registry uses interior mutability with RwLock, allowing concurrent
/// reads and exclusive writes.
#[derive(Default)]
pub struct ServiceRegistry {
    services: RwLock<HashMap<String, Box<dyn BidcosServiceFactory>>>,
    sinks: RwLock<HashMap<String, Arc<dyn ReportSinkFactory>>>,
}

impl ServiceRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry with the `file` and `memory` sinks registered
    pub fn with_builtin_sinks() -> Self {
        let registry = Self::new();
        registry.register_sink("file", Box::new(FileReportSinkFactory));
        registry.register_sink("memory", Box::new(MemoryReportSinkFactory));
        registry
    }

    /// Register a BidCos service factory
    ///
    /// # Parameters
    ///
    /// - `name`: Service type name as used in [`GatewayConfig::service`]
    /// - `factory`: Factory object for creating service instances
    pub fn register_service(&self, name: impl Into<String>, factory: Box<dyn BidcosServiceFactory>) {
        write(&self.services).insert(name.into(), factory);
    }

    /// Register a report sink factory
    pub fn register_sink(&self, name: impl Into<String>, factory: Box<dyn ReportSinkFactory>) {
        write(&self.sinks).insert(name.into(), Arc::from(factory));
    }

    /// Create a BidCos service from gateway configuration
    ///
    /// # Returns
    ///
    /// - `Ok(Box<dyn BidcosService>)`: Created service instance
    /// - `Err(Error)`: If the service type is not registered or creation fails
    pub fn create_service(&self, config: &GatewayConfig) -> Result<Box<dyn BidcosService>> {
        let services = read(&self.services);
        let factory = services
            .get(&config.service)
            .ok_or_else(|| Error::config(format!("Unknown service type: {}", config.service)))?;

        factory.create(config)
    }

    /// Create a report sink from output configuration
    pub async fn create_sink(&self, config: &OutputConfig) -> Result<Box<dyn ReportSink>> {
        let sink_type = config.type_name();

        // Release the lock before calling async create
        let factory = read(&self.sinks)
            .get(sink_type)
            .cloned()
            .ok_or_else(|| Error::config(format!("Unknown sink type: {}", sink_type)))?;

        factory.create(config).await
    }

    /// List all registered service types
    pub fn list_services(&self) -> Vec<String> {
        read(&self.services).keys().cloned().collect()
    }

    /// List all registered sink types
    pub fn list_sinks(&self) -> Vec<String> {
        read(&self.sinks).keys().cloned().collect()
    }

    /// Check if a service type is registered
    pub fn has_service(&self, name: &str) -> bool {
        read(&self.services).contains_key(name)
    }

    /// Check if a sink type is registered
    pub fn has_sink(&self, name: &str) -> bool {
        read(&self.sinks).contains_key(name)
    }
}

// A panic while holding the lock leaves the map itself intact.
fn read<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn write<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(|poisoned| poisoned.into_inner())
}
