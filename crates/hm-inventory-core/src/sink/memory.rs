// # Memory Report Sink
//
// Keeps the most recent report in memory.
//
// Useful for tests and for embedding the engine in a process that renders
// the inventory itself.

use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::config::OutputConfig;
use crate::report::InventoryReport;
use crate::traits::report_sink::{ReportSink, ReportSinkFactory};
use crate::Error;

/// In-memory report sink
///
/// Clones share the same slot, so a clone handed to the engine can be read
/// back through the original.
#[derive(Debug, Clone, Default)]
pub struct MemoryReportSink {
    latest: Arc<RwLock<Option<InventoryReport>>>,
    published: Arc<std::sync::atomic::AtomicUsize>,
}

impl MemoryReportSink {
    /// Create an empty sink
    pub fn new() -> Self {
        Self::default()
    }

    /// The most recently published report
    pub async fn latest(&self) -> Option<InventoryReport> {
        self.latest.read().await.clone()
    }

    /// Number of reports published so far
    pub fn published_count(&self) -> usize {
        self.published.load(std::sync::atomic::Ordering::SeqCst)
    }
}

#[async_trait]
impl ReportSink for MemoryReportSink {
    async fn publish(&self, report: &InventoryReport) -> Result<(), Error> {
        *self.latest.write().await = Some(report.clone());
        self.published
            .fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        Ok(())
    }

    fn sink_name(&self) -> &'static str {
        "memory"
    }
}

/// Factory for in-memory sinks
pub struct MemoryReportSinkFactory;

#[async_trait]
impl ReportSinkFactory for MemoryReportSinkFactory {
    async fn create(&self, config: &OutputConfig) -> Result<Box<dyn ReportSink>, Error> {
        match config {
            OutputConfig::Memory => Ok(Box::new(MemoryReportSink::new())),
            other => Err(Error::config(format!(
                "Memory sink factory cannot handle output type {}",
                other.type_name()
            ))),
        }
    }
}
