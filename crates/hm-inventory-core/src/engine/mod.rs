//! Inventory engine
//!
//! The InventoryEngine is responsible for:
//! - Fetching the device catalogs and interfaces from the BidCos services
//! - Reconciling them with the registered instances
//! - Correlating link-quality data
//! - Handing finished reports to a ReportSink
//!
//! ## Architecture
//!
//! ```text
//! ┌───────────────┐   ┌──────────────────┐   ┌────────────────────┐
//! │ BidcosService │   │ InstanceRegistry │   │ DeviceNameResolver │
//! └───────────────┘   └──────────────────┘   └────────────────────┘
//!         │                    │                       │
//!         └────────────────────┼───────────────────────┘
//!                              ▼
//!                     ┌─────────────────┐
//!                     │ InventoryEngine │
//!                     └─────────────────┘
//!                              │
//!              ┌───────────────┴───────────────┐
//!              ▼                               ▼
//!      ┌──────────────┐                ┌─────────────┐
//!      │  ReportSink  │                │   Events    │
//!      │  (publish)   │                │  (notify)   │
//!      └──────────────┘                └─────────────┘
//! ```
//!
//! ## Run Flow
//!
//! 1. Fetch RF, IP and Wired catalogs concurrently and merge them
//! 2. Fetch and normalize the interface list
//! 3. Fetch the registered instances of the gateway
//! 4. Reconcile, then look up device names
//! 5. Attach RSSI levels, apply the per-root paramset override
//! 6. Sort and summarize

use crate::address::ChannelAddress;
use crate::config::{InventoryConfig, ReconcileOptions};
use crate::error::{Error, Result};
use crate::index::DeviceIndex;
use crate::link_quality::{LinkQualityCorrelator, ParamsetResults};
use crate::model::{CatalogSource, HmDevice, InventoryEntry, RssiTable, normalize_interfaces};
use crate::reconcile::InventoryReconciler;
use crate::report::{Diagnostic, InventoryReport, InventorySummary};
use crate::sort::{SortMode, sort_entries};
use crate::traits::{BidcosService, DeviceNameResolver, InstanceRegistry, ReportSink, VALUES_PARAMSET};
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tokio_stream::StreamExt;
use tokio_stream::wrappers::IntervalStream;
use tracing::{debug, error, info, warn};

/// Events emitted by the InventoryEngine
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InventoryEvent {
    /// A run started
    RunStarted,

    /// A catalog service answered
    CatalogFetched { source: CatalogSource, devices: usize },

    /// A catalog service failed; the run continues without it
    CatalogFailed { source: CatalogSource, error: String },

    /// A registered instance was skipped because of its address
    InstanceSkipped { instance_id: u64, address: String },

    /// A run produced a report
    RunCompleted { entries: usize, diagnostics: usize },

    /// A run aborted
    RunFailed { error: String },

    /// Engine stopped
    Stopped { reason: String },
}

/// Core inventory engine
///
/// ## Lifecycle
///
/// 1. Create with [`InventoryEngine::new()`]
/// 2. Either call [`InventoryEngine::run_once()`] for a single report, or
///    [`InventoryEngine::run()`] to publish reports periodically
/// 3. The periodic loop runs until a shutdown signal is received
///
/// ## Load Resistance
///
/// Events go through a bounded channel. When the channel is full, new
/// events are dropped with a warning instead of blocking the run.
pub struct InventoryEngine {
    service: Box<dyn BidcosService>,

    instances: Box<dyn InstanceRegistry>,

    /// Optional controller-side name lookup
    name_resolver: Option<Box<dyn DeviceNameResolver>>,

    /// Gateway id the registered instances are filtered by
    gateway_id: String,

    options: ReconcileOptions,

    /// Seconds between runs, 0 for a single run
    update_interval_secs: u64,

    /// Event sender for external monitoring
    event_tx: mpsc::Sender<InventoryEvent>,
}

/// Catalogs merged in source order plus the failures seen
struct MergedCatalog {
    devices: Vec<HmDevice>,
    diagnostics: Vec<Diagnostic>,
    failed: usize,
}

impl InventoryEngine {
    /// Create a new inventory engine
    ///
    /// # Returns
    ///
    /// A tuple of (engine, event_receiver) where event_receiver yields engine events
    pub fn new(
        service: Box<dyn BidcosService>,
        instances: Box<dyn InstanceRegistry>,
        name_resolver: Option<Box<dyn DeviceNameResolver>>,
        config: InventoryConfig,
    ) -> Result<(Self, mpsc::Receiver<InventoryEvent>)> {
        config.validate()?;

        let (tx, rx) = mpsc::channel(config.engine.event_channel_capacity);

        let engine = Self {
            service,
            instances,
            name_resolver,
            gateway_id: config.gateway.effective_gateway_id().to_string(),
            options: config.options,
            update_interval_secs: config.engine.update_interval_secs,
            event_tx: tx,
        };

        Ok((engine, rx))
    }

    /// Sort order applied to the final list
    pub fn sort_mode(&self) -> SortMode {
        self.options.sort_mode
    }

    /// Build one inventory report
    ///
    /// # Returns
    ///
    /// - `Ok(InventoryReport)`: The report, possibly with diagnostics
    /// - `Err(Error)`: All catalogs failed, or the interface list, or the
    ///   instance registry could not be read
    pub async fn run_once(&self) -> Result<InventoryReport> {
        self.emit_event(InventoryEvent::RunStarted);

        match self.build_report().await {
            Ok(report) => {
                info!(
                    "Inventory built: {} entries, {} diagnostic(s)",
                    report.entries.len(),
                    report.diagnostics.len()
                );
                self.emit_event(InventoryEvent::RunCompleted {
                    entries: report.entries.len(),
                    diagnostics: report.diagnostics.len(),
                });
                Ok(report)
            }
            Err(e) => {
                error!("Inventory run failed: {}", e);
                self.emit_event(InventoryEvent::RunFailed {
                    error: e.to_string(),
                });
                Err(e)
            }
        }
    }

    async fn build_report(&self) -> Result<InventoryReport> {
        let catalog = self.fetch_catalogs().await;
        if catalog.devices.is_empty() {
            return Err(Error::TotalSourceFailure {
                failed: catalog.failed,
            });
        }
        let mut diagnostics = catalog.diagnostics;

        let interfaces = self
            .service
            .list_bidcos_interfaces()
            .await
            .map_err(|e| Error::interface_list(e.to_string()))?;
        let interfaces = normalize_interfaces(interfaces);
        debug!("{} interface(s) listed", interfaces.len());

        let instances = self.instances.instances(&self.gateway_id).await?;
        debug!(
            "{} registered instance(s) for gateway {}",
            instances.len(),
            self.gateway_id
        );

        let index = DeviceIndex::new(&catalog.devices);
        let reconciliation = InventoryReconciler::new(&index, &self.options).reconcile(&instances);
        for skipped in &reconciliation.skipped {
            self.emit_event(InventoryEvent::InstanceSkipped {
                instance_id: skipped.instance_id,
                address: skipped.address.clone(),
            });
            diagnostics.push(Diagnostic::InvalidAddress {
                instance_id: skipped.instance_id,
                address: skipped.address.clone(),
            });
        }
        let mut entries = reconciliation.entries;

        if self.options.resolve_device_names {
            self.resolve_device_names(&mut entries).await;
        }

        let table = match self.service.rssi_info().await {
            Ok(table) => table,
            Err(e) => {
                warn!("Can't get RSSI information: {}", e);
                diagnostics.push(Diagnostic::LinkQueryFailure {
                    target: "rssiInfo".to_string(),
                    message: e.to_string(),
                });
                RssiTable::new()
            }
        };

        let correlator = LinkQualityCorrelator::new(&interfaces);
        correlator.attach_levels(&mut entries, &table);

        sort_entries(&mut entries, SortMode::ByAddress);
        let roots = correlator.plan_paramset_queries(&entries);
        let results = self.query_paramsets(&roots, &mut diagnostics).await;
        correlator.apply_paramset_overrides(&mut entries, &results);

        sort_entries(&mut entries, self.options.sort_mode);

        let summary = InventorySummary {
            interface_count: interfaces.len(),
            connected_interface_count: correlator.slot_count(),
            instance_count: reconciliation.total_instances,
            assigned_channel_count: reconciliation.channels_assigned_at_least_once,
            total_channel_count: index.channel_count(),
            source_error_count: catalog.failed,
            invalid_instance_count: reconciliation.skipped.len(),
        };

        Ok(InventoryReport {
            generated_at: chrono::Utc::now(),
            interfaces,
            entries,
            summary,
            diagnostics,
        })
    }

    /// Fetch all catalogs concurrently and merge them in source order
    async fn fetch_catalogs(&self) -> MergedCatalog {
        let [rf, ip, wired] = CatalogSource::ALL;
        let (rf_result, ip_result, wired_result) = tokio::join!(
            self.service.list_devices(rf),
            self.service.list_devices(ip),
            self.service.list_devices(wired),
        );

        let mut merged = MergedCatalog {
            devices: Vec::new(),
            diagnostics: Vec::new(),
            failed: 0,
        };

        for (source, result) in [(rf, rf_result), (ip, ip_result), (wired, wired_result)] {
            match result {
                Ok(devices) => {
                    debug!("{} listed {} device(s)", source, devices.len());
                    self.emit_event(InventoryEvent::CatalogFetched {
                        source,
                        devices: devices.len(),
                    });
                    merged.devices.extend(devices);
                }
                Err(e) => {
                    warn!("Can't get device information from {}: {}", source, e);
                    self.emit_event(InventoryEvent::CatalogFailed {
                        source,
                        error: e.to_string(),
                    });
                    merged.diagnostics.push(Diagnostic::PartialSourceFailure {
                        source,
                        message: e.to_string(),
                    });
                    merged.failed += 1;
                }
            }
        }

        merged
    }

    /// Fill `device_name` of every entry with a channel address
    async fn resolve_device_names(&self, entries: &mut [InventoryEntry]) {
        let Some(resolver) = &self.name_resolver else {
            return;
        };

        for entry in entries.iter_mut() {
            if ChannelAddress::parse(&entry.address).is_none() {
                continue;
            }
            match resolver.channel_name(&entry.address).await {
                Ok(name) => entry.device_name = name,
                Err(e) => debug!("No device name for {}: {}", entry.address, e),
            }
        }
    }

    /// Read the `VALUES` paramset of channel 0 for each planned root, one at a time
    async fn query_paramsets(
        &self,
        roots: &[String],
        diagnostics: &mut Vec<Diagnostic>,
    ) -> ParamsetResults {
        let mut results = ParamsetResults::with_capacity(roots.len());

        for root in roots {
            let address = format!("{}:0", root);
            let outcome = match self.service.get_paramset(&address, VALUES_PARAMSET).await {
                Ok(paramset) => Some(paramset),
                Err(e) => {
                    debug!("Can't read {} paramset of {}: {}", VALUES_PARAMSET, address, e);
                    diagnostics.push(Diagnostic::LinkQueryFailure {
                        target: address,
                        message: e.to_string(),
                    });
                    None
                }
            };
            results.insert(root.clone(), outcome);
        }

        results
    }

    /// Run the engine
    ///
    /// Publishes a report every `update_interval_secs` until SIGINT. With an
    /// interval of 0, a single report is built and published.
    ///
    /// # Returns
    ///
    /// - `Ok(())`: Clean shutdown
    /// - `Err(Error)`: The single run failed, or publishing it failed
    pub async fn run(&self, sink: &dyn ReportSink) -> Result<()> {
        self.run_internal(sink, None).await
    }

    /// Internal run implementation that accepts an optional shutdown signal
    ///
    /// # Parameters
    ///
    /// - `shutdown_rx`: Optional oneshot receiver to trigger shutdown (for testing)
    async fn run_internal(
        &self,
        sink: &dyn ReportSink,
        shutdown_rx: Option<oneshot::Receiver<()>>,
    ) -> Result<()> {
        if self.update_interval_secs == 0 {
            let result = self.run_and_publish(sink).await;
            self.emit_event(InventoryEvent::Stopped {
                reason: "Single run completed".to_string(),
            });
            return result;
        }

        info!(
            "Publishing inventory to {} sink every {}s",
            sink.sink_name(),
            self.update_interval_secs
        );

        let shutdown = async move {
            match shutdown_rx {
                Some(rx) => {
                    let _ = rx.await;
                }
                None => {
                    if let Err(e) = tokio::signal::ctrl_c().await {
                        error!("Failed to listen for shutdown signal: {}", e);
                    }
                }
            }
        };
        tokio::pin!(shutdown);

        let mut ticks = IntervalStream::new(tokio::time::interval(Duration::from_secs(
            self.update_interval_secs,
        )));

        loop {
            tokio::select! {
                Some(_) = ticks.next() => {
                    if let Err(e) = self.run_and_publish(sink).await {
                        error!("Inventory update failed: {}", e);
                        // Keep running; the next tick retries
                    }
                }

                _ = &mut shutdown => {
                    info!("Shutdown signal received");
                    self.emit_event(InventoryEvent::Stopped {
                        reason: "Shutdown signal".to_string(),
                    });
                    break;
                }
            }
        }

        Ok(())
    }

    async fn run_and_publish(&self, sink: &dyn ReportSink) -> Result<()> {
        let report = self.run_once().await?;
        sink.publish(&report).await?;
        debug!("Report published to {} sink", sink.sink_name());
        Ok(())
    }

    /// Emit an engine event
    fn emit_event(&self, event: InventoryEvent) {
        match self.event_tx.try_send(event) {
            Ok(()) => {}
            Err(mpsc::error::TrySendError::Full(_)) => {
                warn!("Event channel full, dropping event. Consider increasing event_channel_capacity.");
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                // Nobody is listening
            }
        }
    }

    /// Run with a controlled shutdown signal
    ///
    /// Intended for tests and embedders. The daemon uses `run()`, which
    /// stops on SIGINT.
    pub async fn run_with_shutdown(
        &self,
        sink: &dyn ReportSink,
        shutdown_rx: Option<oneshot::Receiver<()>>,
    ) -> Result<()> {
        self.run_internal(sink, shutdown_rx).await
    }
}
