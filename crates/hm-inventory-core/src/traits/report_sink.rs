// # Report Sink Trait
//
// Destination of finished inventory reports.
//
// ## Implementations
//
// - `FileReportSink`: JSON file with atomic replace
// - `MemoryReportSink`: latest report in memory

use crate::report::InventoryReport;
use async_trait::async_trait;

/// Trait for report destinations
///
/// A sink only stores what it is given. It never alters entries or order.
#[async_trait]
pub trait ReportSink: Send + Sync {
    /// Publish a finished report
    async fn publish(&self, report: &InventoryReport) -> Result<(), crate::Error>;

    /// Get the sink name (for logging/debugging)
    fn sink_name(&self) -> &'static str;
}

/// Helper trait for constructing report sinks from configuration
#[async_trait]
pub trait ReportSinkFactory: Send + Sync {
    /// Create a ReportSink from output configuration
    async fn create(
        &self,
        config: &crate::config::OutputConfig,
    ) -> Result<Box<dyn ReportSink>, crate::Error>;
}
