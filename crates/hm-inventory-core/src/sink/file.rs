// # File Report Sink
//
// Writes each report as a JSON document.
//
// ## Durability
//
// - Atomic writes: the report is written to a `.tmp` file, then renamed
// - Backup: the previous report is kept as `.backup`
// - Recovery: `load_latest()` falls back to the backup if the main file is corrupted
//
// ## File Format
//
// ```json
// {
//   "version": "1.0",
//   "report": {
//     "generatedAt": "2026-01-09T12:00:00Z",
//     "interfaces": [ ... ],
//     "entries": [ ... ],
//     "summary": { ... },
//     "diagnostics": []
//   }
// }
// ```

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

use crate::config::OutputConfig;
use crate::report::InventoryReport;
use crate::traits::report_sink::{ReportSink, ReportSinkFactory};
use crate::Error;

/// Report file format version
const REPORT_FILE_VERSION: &str = "1.0";

/// File-based report sink
///
/// # Example
///
/// ```rust,no_run
/// use hm_inventory_core::sink::FileReportSink;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let sink = FileReportSink::new("/var/lib/hm-inventory/report.json").await?;
///     if let Some(report) = sink.load_latest().await? {
///         println!("{} entries", report.entries.len());
///     }
///     Ok(())
/// }
/// ```
#[derive(Debug)]
pub struct FileReportSink {
    path: PathBuf,
    /// Serializes concurrent publishes to the same file
    write_lock: Mutex<()>,
}

/// Serializable report file format
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
struct ReportFileFormat {
    version: String,
    report: InventoryReport,
}

impl FileReportSink {
    /// Create a file sink, creating parent directories if needed
    pub async fn new<P: AsRef<Path>>(path: P) -> Result<Self, Error> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            fs::create_dir_all(parent).await.map_err(|e| {
                Error::config(format!(
                    "Failed to create report directory {}: {}",
                    parent.display(),
                    e
                ))
            })?;
        }

        Ok(Self {
            path,
            write_lock: Mutex::new(()),
        })
    }

    /// Path of the report file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the last published report, recovering from the backup if needed
    ///
    /// Returns `Ok(None)` when nothing was published yet.
    pub async fn load_latest(&self) -> Result<Option<InventoryReport>, Error> {
        match Self::load_report(&self.path).await {
            Ok(report) => Ok(report),
            Err(Error::Json(e)) => {
                tracing::warn!(
                    "Report file appears corrupted: {}. Attempting recovery from backup.",
                    e
                );
                let backup_path = Self::backup_path(&self.path);
                match Self::load_report(&backup_path).await {
                    Ok(report) => {
                        tracing::info!("Recovered report from backup");
                        Ok(report)
                    }
                    Err(backup_err) => {
                        tracing::error!("Backup also unreadable: {}", backup_err);
                        Ok(None)
                    }
                }
            }
            Err(e) => Err(e),
        }
    }

    async fn load_report(path: &Path) -> Result<Option<InventoryReport>, Error> {
        if !path.exists() {
            tracing::debug!("Report file does not exist: {}", path.display());
            return Ok(None);
        }

        let content = fs::read_to_string(path).await.map_err(|e| {
            Error::sink(format!("Failed to read report file {}: {}", path.display(), e))
        })?;

        let file: ReportFileFormat = serde_json::from_str(&content)?;

        if file.version != REPORT_FILE_VERSION {
            tracing::warn!(
                "Report file version mismatch: expected {}, got {}. Attempting to load anyway.",
                REPORT_FILE_VERSION,
                file.version
            );
        }

        Ok(Some(file.report))
    }

    /// Write the report atomically
    async fn write_report(&self, report: &InventoryReport) -> Result<(), Error> {
        let _guard = self.write_lock.lock().await;

        let file = ReportFileFormat {
            version: REPORT_FILE_VERSION.to_string(),
            report: report.clone(),
        };
        let json = serde_json::to_string_pretty(&file)
            .map_err(|e| Error::sink(format!("Failed to serialize report: {}", e)))?;

        let temp_path = self.temp_path();
        {
            let mut out = fs::File::create(&temp_path).await.map_err(|e| {
                Error::sink(format!(
                    "Failed to create temp file {}: {}",
                    temp_path.display(),
                    e
                ))
            })?;

            out.write_all(json.as_bytes()).await.map_err(|e| {
                Error::sink(format!(
                    "Failed to write to temp file {}: {}",
                    temp_path.display(),
                    e
                ))
            })?;

            out.flush().await.map_err(|e| {
                Error::sink(format!(
                    "Failed to flush temp file {}: {}",
                    temp_path.display(),
                    e
                ))
            })?;
        }

        if self.path.exists() {
            let backup_path = Self::backup_path(&self.path);
            if let Err(e) = fs::copy(&self.path, &backup_path).await {
                tracing::warn!("Failed to create backup: {}", e);
            }
        }

        fs::rename(&temp_path, &self.path).await.map_err(|e| {
            Error::sink(format!(
                "Failed to rename {} to {}: {}",
                temp_path.display(),
                self.path.display(),
                e
            ))
        })?;

        tracing::debug!("Report written to {}", self.path.display());
        Ok(())
    }

    fn temp_path(&self) -> PathBuf {
        let mut temp = self.path.clone();
        temp.set_extension("tmp");
        temp
    }

    fn backup_path(path: &Path) -> PathBuf {
        let mut backup = path.to_path_buf();
        backup.set_extension("backup");
        backup
    }
}

#[async_trait]
impl ReportSink for FileReportSink {
    async fn publish(&self, report: &InventoryReport) -> Result<(), Error> {
        self.write_report(report).await
    }

    fn sink_name(&self) -> &'static str {
        "file"
    }
}

/// Factory for file sinks
pub struct FileReportSinkFactory;

#[async_trait]
impl ReportSinkFactory for FileReportSinkFactory {
    async fn create(&self, config: &OutputConfig) -> Result<Box<dyn ReportSink>, Error> {
        match config {
            OutputConfig::File { path } => Ok(Box::new(FileReportSink::new(path).await?)),
            other => Err(Error::config(format!(
                "File sink factory cannot handle output type {}",
                other.type_name()
            ))),
        }
    }
}
