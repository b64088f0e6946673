// # hm-inventory-core
//
// Core library of the HomeMatic device inventory.
//
// ## Architecture Overview
//
// A run joins three views of the same installation into one list:
// - **BidcosService**: device catalogs, radio interfaces and RSSI data of the controller
// - **InstanceRegistry**: device instances registered locally against controller addresses
// - **DeviceNameResolver**: names the channels carry on the controller
//
// The pure building blocks ([`address`], [`index`], [`reconcile`],
// [`link_quality`], [`sort`]) do no I/O. The [`InventoryEngine`] wires them
// to the collaborators and hands finished reports to a [`ReportSink`].
//
// ## Design Principles
//
// 1. **Separation of Concerns**: Reconciliation logic is separate from transports
// 2. **Plugin-Based**: Transports and sinks are registered by name in a [`ServiceRegistry`]
// 3. **Library-First**: Everything the daemon does is available as a library
// 4. **Degrade, don't abort**: Only a run without devices or interfaces fails

pub mod address;
pub mod config;
pub mod engine;
pub mod error;
pub mod index;
pub mod instances;
pub mod link_quality;
pub mod model;
pub mod reconcile;
pub mod registry;
pub mod report;
pub mod sink;
pub mod sort;
pub mod traits;

// Re-export core types for convenience
pub use config::{EngineConfig, GatewayConfig, InventoryConfig, OutputConfig, ReconcileOptions};
pub use engine::{InventoryEngine, InventoryEvent};
pub use error::{Error, Result};
pub use instances::{FileInstanceRegistry, StaticInstanceRegistry};
pub use registry::ServiceRegistry;
pub use report::{Diagnostic, InventoryReport, InventorySummary};
pub use sink::{FileReportSink, MemoryReportSink};
pub use sort::SortMode;
pub use traits::{BidcosService, DeviceNameResolver, InstanceRegistry, ReportSink};
