//! Core traits for the HM inventory
//!
//! This module defines the boundaries to the external collaborators of a run.
//!
//! - [`BidcosService`]: Device catalogs, interfaces and link levels from the controller
//! - [`InstanceRegistry`]: Locally registered device instances
//! - [`DeviceNameResolver`]: Controller-side names of channels
//! - [`ReportSink`]: Destination of finished reports

pub mod bidcos_service;
pub mod instance_registry;
pub mod name_resolver;
pub mod report_sink;

pub use bidcos_service::{BidcosService, BidcosServiceFactory, VALUES_PARAMSET};
pub use instance_registry::InstanceRegistry;
pub use name_resolver::DeviceNameResolver;
pub use report_sink::{ReportSink, ReportSinkFactory};
