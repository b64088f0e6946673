// # hm-inventoryd - HomeMatic Inventory Daemon
//
// Thin integration layer around `hm-inventory-core`:
// 1. Read configuration from environment variables
// 2. Initialize logging and the runtime
// 3. Register the BidCos transport and build the collaborators
// 4. Run the inventory engine until it finishes or a signal arrives
//
// ## Configuration
//
// ### Controller
// - `HMI_HOST`: Host name or IP address of the controller (required)
// - `HMI_GATEWAY_ID`: Gateway id the registered instances are filtered by (default: host)
// - `HMI_USERNAME` / `HMI_PASSWORD`: Basic auth credentials (optional)
// - `HMI_CONNECT_TIMEOUT_MS`: Connect timeout (default 1000)
// - `HMI_TIMEOUT_MS`: Total request timeout (default 5000)
//
// ### Inventory
// - `HMI_INSTANCES_PATH`: JSON file with the registered instances
// - `HMI_OUTPUT_PATH`: Report file; without it reports are only logged
// - `HMI_SORT_ORDER`: address, device_type, channel_type, instance_name, device_name (or 0-4)
// - `HMI_SHOW_UNUSED_CHANNELS`, `HMI_SHOW_VIRTUAL_KEYS`, `HMI_SHOW_MAINTENANCE`: true/false
// - `HMI_RESOLVE_NAMES`: Look up channel names on the controller (true/false)
//
// ### Engine
// - `HMI_UPDATE_INTERVAL_SECS`: Seconds between runs, 0 for a single run (default 0)
// - `HMI_LOG_LEVEL`: trace, debug, info, warn, error (default info)
//
// ## Example
//
// ```bash
// export HMI_HOST=192.168.1.10
// export HMI_INSTANCES_PATH=/var/lib/hm-inventory/instances.json
// export HMI_OUTPUT_PATH=/var/lib/hm-inventory/inventory.json
// export HMI_UPDATE_INTERVAL_SECS=900
//
// hm-inventoryd
// ```

use anyhow::{Context, Result};
use hm_inventory_core::{
    FileInstanceRegistry, InstanceRegistry, InventoryConfig, InventoryEngine, InventoryEvent,
    OutputConfig, ServiceRegistry, SortMode, StaticInstanceRegistry,
};
use std::env;
use std::process::ExitCode;
use tokio::sync::oneshot;
use tracing::{Level, error, info, warn};
use tracing_subscriber::FmtSubscriber;

#[cfg(unix)]
use tokio::signal::unix::{SignalKind, signal};

/// Exit codes for different termination scenarios
///
/// These codes follow systemd conventions:
/// - 0: Clean shutdown
/// - 1: Configuration or startup error
/// - 2: Runtime error
#[derive(Debug, Clone, Copy)]
enum InventoryExitCode {
    CleanShutdown = 0,
    ConfigError = 1,
    RuntimeError = 2,
}

impl From<InventoryExitCode> for ExitCode {
    fn from(code: InventoryExitCode) -> Self {
        ExitCode::from(code as u8)
    }
}

/// Application configuration
#[derive(Debug)]
struct Config {
    inventory: InventoryConfig,
    instances_path: Option<String>,
    log_level: String,
}

fn parse_bool(name: &str, value: &str) -> Result<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => anyhow::bail!("{} must be true or false. Got: {}", name, value),
    }
}

fn parse_number<T: std::str::FromStr>(name: &str, value: &str) -> Result<T> {
    value
        .trim()
        .parse()
        .map_err(|_| anyhow::anyhow!("{} must be a non-negative integer. Got: {}", name, value))
}

impl Config {
    /// Load configuration from environment variables
    fn from_env() -> Result<Self> {
        Self::from_lookup(|name| env::var(name).ok().filter(|v| !v.is_empty()))
    }

    /// Load configuration through a variable lookup
    fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let host = get("HMI_HOST").context(
            "HMI_HOST is required. Set it via: export HMI_HOST=192.168.1.10",
        )?;
        let mut inventory = InventoryConfig::new(host);

        let gateway = &mut inventory.gateway;
        if let Some(id) = get("HMI_GATEWAY_ID") {
            gateway.gateway_id = id;
        }
        gateway.username = get("HMI_USERNAME");
        gateway.password = get("HMI_PASSWORD");
        if let Some(v) = get("HMI_CONNECT_TIMEOUT_MS") {
            gateway.connect_timeout_ms = parse_number("HMI_CONNECT_TIMEOUT_MS", &v)?;
        }
        if let Some(v) = get("HMI_TIMEOUT_MS") {
            gateway.timeout_ms = parse_number("HMI_TIMEOUT_MS", &v)?;
        }

        let options = &mut inventory.options;
        if let Some(v) = get("HMI_SORT_ORDER") {
            options.sort_mode = v
                .parse::<SortMode>()
                .with_context(|| format!("HMI_SORT_ORDER '{}' is not valid", v))?;
        }
        if let Some(v) = get("HMI_SHOW_UNUSED_CHANNELS") {
            options.include_unused_channels = parse_bool("HMI_SHOW_UNUSED_CHANNELS", &v)?;
        }
        if let Some(v) = get("HMI_SHOW_VIRTUAL_KEYS") {
            options.include_virtual_keys = parse_bool("HMI_SHOW_VIRTUAL_KEYS", &v)?;
        }
        if let Some(v) = get("HMI_SHOW_MAINTENANCE") {
            options.include_maintenance_channels = parse_bool("HMI_SHOW_MAINTENANCE", &v)?;
        }
        if let Some(v) = get("HMI_RESOLVE_NAMES") {
            options.resolve_device_names = parse_bool("HMI_RESOLVE_NAMES", &v)?;
        }

        if let Some(path) = get("HMI_OUTPUT_PATH") {
            inventory.output = OutputConfig::File { path };
        }
        if let Some(v) = get("HMI_UPDATE_INTERVAL_SECS") {
            inventory.engine.update_interval_secs = parse_number("HMI_UPDATE_INTERVAL_SECS", &v)?;
        }

        Ok(Self {
            inventory,
            instances_path: get("HMI_INSTANCES_PATH"),
            log_level: get("HMI_LOG_LEVEL").unwrap_or_else(|| "info".to_string()),
        })
    }

    /// Validate the configuration
    fn validate(&self) -> Result<()> {
        self.inventory.validate()?;

        let interval = self.inventory.engine.update_interval_secs;
        if interval != 0 && !(60..=86_400).contains(&interval) {
            anyhow::bail!(
                "HMI_UPDATE_INTERVAL_SECS must be 0 or between 60 and 86400 seconds. Got: {}",
                interval
            );
        }

        if self.inventory.gateway.timeout_ms > 60_000 {
            anyhow::bail!(
                "HMI_TIMEOUT_MS must not exceed 60000. Got: {}",
                self.inventory.gateway.timeout_ms
            );
        }

        if let OutputConfig::File { path } = &self.inventory.output
            && let Some(parent) = std::path::Path::new(path).parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            anyhow::bail!(
                "HMI_OUTPUT_PATH parent directory does not exist: {}. \
                Create it first: sudo mkdir -p {}",
                parent.display(),
                parent.display()
            );
        }

        if let Some(path) = &self.instances_path
            && !std::path::Path::new(path).is_file()
        {
            anyhow::bail!("HMI_INSTANCES_PATH is not a readable file: {}", path);
        }

        self.level()?;
        Ok(())
    }

    fn level(&self) -> Result<Level> {
        Ok(match self.log_level.to_lowercase().as_str() {
            "trace" => Level::TRACE,
            "debug" => Level::DEBUG,
            "info" => Level::INFO,
            "warn" => Level::WARN,
            "error" => Level::ERROR,
            _ => anyhow::bail!(
                "HMI_LOG_LEVEL '{}' is not valid. \
                Valid levels: trace, debug, info, warn, error",
                self.log_level
            ),
        })
    }
}

fn main() -> ExitCode {
    let config = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Configuration error: {:#}", e);
            return InventoryExitCode::ConfigError.into();
        }
    };

    if let Err(e) = config.validate() {
        eprintln!("Configuration validation error: {:#}", e);
        return InventoryExitCode::ConfigError.into();
    }

    let log_level = config.level().unwrap_or(Level::INFO);
    let subscriber = FmtSubscriber::builder().with_max_level(log_level).finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
        return InventoryExitCode::ConfigError.into();
    }

    info!("Starting hm-inventoryd for {}", config.inventory.gateway.host);

    let rt = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to create tokio runtime: {}", e);
            return InventoryExitCode::RuntimeError.into();
        }
    };

    rt.block_on(async {
        match run_daemon(config).await {
            Ok(()) => InventoryExitCode::CleanShutdown,
            Err(DaemonError::Startup(e)) => {
                error!("Startup error: {:#}", e);
                InventoryExitCode::ConfigError
            }
            Err(DaemonError::Runtime(e)) => {
                error!("Inventory run failed: {:#}", e);
                InventoryExitCode::RuntimeError
            }
        }
    })
    .into()
}

/// Failure phase of the daemon, deciding the exit code
enum DaemonError {
    Startup(anyhow::Error),
    Runtime(anyhow::Error),
}

/// Run the daemon
async fn run_daemon(config: Config) -> std::result::Result<(), DaemonError> {
    let registry = ServiceRegistry::with_builtin_sinks();

    #[cfg(feature = "xmlrpc")]
    {
        info!("Registering XML-RPC BidCos service");
        hm_inventory_xmlrpc::register(&registry);
    }

    let inventory = config.inventory;
    let service = registry
        .create_service(&inventory.gateway)
        .map_err(|e| DaemonError::Startup(e.into()))?;
    let sink = registry
        .create_sink(&inventory.output)
        .await
        .map_err(|e| DaemonError::Startup(e.into()))?;

    let instances: Box<dyn InstanceRegistry> = match &config.instances_path {
        Some(path) => {
            info!("Reading registered instances from {}", path);
            Box::new(FileInstanceRegistry::new(path))
        }
        None => {
            warn!("HMI_INSTANCES_PATH not set, the inventory will only list unused channels");
            Box::new(StaticInstanceRegistry::default())
        }
    };

    let name_resolver = if inventory.options.resolve_device_names {
        name_resolver(&inventory).map_err(DaemonError::Startup)?
    } else {
        None
    };

    let (engine, events) = InventoryEngine::new(service, instances, name_resolver, inventory)
        .map_err(|e| DaemonError::Startup(e.into()))?;

    tokio::spawn(log_events(events));

    let (shutdown_tx, shutdown_rx) = oneshot::channel();
    tokio::spawn(async move {
        match wait_for_shutdown().await {
            Ok(signal) => info!("Received shutdown signal: {}", signal),
            Err(e) => error!("Shutdown handler error: {}", e),
        }
        let _ = shutdown_tx.send(());
    });

    engine
        .run_with_shutdown(sink.as_ref(), Some(shutdown_rx))
        .await
        .map_err(|e| DaemonError::Runtime(e.into()))?;

    info!("Daemon stopped");
    Ok(())
}

#[cfg(feature = "xmlrpc")]
fn name_resolver(
    inventory: &InventoryConfig,
) -> Result<Option<Box<dyn hm_inventory_core::DeviceNameResolver>>> {
    Ok(Some(hm_inventory_xmlrpc::name_resolver(&inventory.gateway)?))
}

#[cfg(not(feature = "xmlrpc"))]
fn name_resolver(
    _inventory: &InventoryConfig,
) -> Result<Option<Box<dyn hm_inventory_core::DeviceNameResolver>>> {
    warn!("Name lookup requested but no transport with a script endpoint is built in");
    Ok(None)
}

/// Log engine events until the engine drops its sender
async fn log_events(mut events: tokio::sync::mpsc::Receiver<InventoryEvent>) {
    while let Some(event) = events.recv().await {
        match event {
            InventoryEvent::RunStarted => info!("Inventory run started"),
            InventoryEvent::CatalogFetched { source, devices } => {
                info!("{}: {} devices and channels", source, devices)
            }
            InventoryEvent::CatalogFailed { source, error } => {
                warn!("{} unavailable: {}", source, error)
            }
            InventoryEvent::InstanceSkipped {
                instance_id,
                address,
            } => warn!("Instance {} has an invalid address: {}", instance_id, address),
            InventoryEvent::RunCompleted {
                entries,
                diagnostics,
            } => info!(
                "Inventory run completed: {} entries, {} diagnostics",
                entries, diagnostics
            ),
            InventoryEvent::RunFailed { error } => error!("Inventory run failed: {}", error),
            InventoryEvent::Stopped { reason } => info!("Engine stopped: {}", reason),
        }
    }
}

/// Wait for SIGTERM or SIGINT
#[cfg(unix)]
async fn wait_for_shutdown() -> Result<&'static str> {
    let mut sigterm = signal(SignalKind::terminate())
        .map_err(|e| anyhow::anyhow!("Failed to setup SIGTERM handler: {}", e))?;
    let mut sigint = signal(SignalKind::interrupt())
        .map_err(|e| anyhow::anyhow!("Failed to setup SIGINT handler: {}", e))?;

    Ok(tokio::select! {
        _ = sigterm.recv() => "SIGTERM",
        _ = sigint.recv() => "SIGINT",
    })
}

/// Wait for CTRL-C
#[cfg(not(unix))]
async fn wait_for_shutdown() -> Result<&'static str> {
    tokio::signal::ctrl_c()
        .await
        .map_err(|e| anyhow::anyhow!("Failed to wait for CTRL-C: {}", e))?;
    Ok("SIGINT")
}
