// # BidCos Service Trait
//
// Defines the interface to the controller's RF, IP and Wired sub-services.
//
// ## Implementations
//
// - XML-RPC: `hm-inventory-xmlrpc` crate
//
// ## Usage
//
// ```rust,ignore
// use hm_inventory_core::{BidcosService, model::CatalogSource};
//
// #[tokio::main]
// async fn main() -> anyhow::Result<()> {
//     let service = /* BidcosService implementation */;
//
//     let devices = service.list_devices(CatalogSource::Rf).await?;
//     let interfaces = service.list_bidcos_interfaces().await?;
//     println!("{} devices behind {} interfaces", devices.len(), interfaces.len());
//
//     Ok(())
// }
// ```

use crate::model::{BidcosInterface, CatalogSource, HmDevice, RssiParamset, RssiTable};
use async_trait::async_trait;

/// Paramset key holding the current values of a channel
pub const VALUES_PARAMSET: &str = "VALUES";

/// Trait for access to the BidCos sub-services
///
/// Every method is a single request/response call. Implementations return
/// decoded, typed records; wire encoding stays inside the implementation.
///
/// # Failure
///
/// Implementations do not retry. The engine decides whether a failure is
/// fatal (interface list, all catalogs) or recoverable (one catalog, link
/// levels).
#[async_trait]
pub trait BidcosService: Send + Sync {
    /// List all devices and channels known to one sub-service (`listDevices`)
    async fn list_devices(&self, source: CatalogSource) -> Result<Vec<HmDevice>, crate::Error>;

    /// List the radio interfaces (`listBidcosInterfaces`)
    async fn list_bidcos_interfaces(&self) -> Result<Vec<BidcosInterface>, crate::Error>;

    /// Fetch the bulk RSSI table (`rssiInfo`)
    async fn rssi_info(&self) -> Result<RssiTable, crate::Error>;

    /// Read the RSSI values of a paramset (`getParamset`)
    ///
    /// # Parameters
    ///
    /// - `address`: Channel address, e.g. `"0001D3C99C3C93:0"`
    /// - `paramset_key`: Usually [`VALUES_PARAMSET`]
    async fn get_paramset(
        &self,
        address: &str,
        paramset_key: &str,
    ) -> Result<RssiParamset, crate::Error>;

    /// Get the service name (for logging/debugging)
    fn service_name(&self) -> &'static str;
}

/// Helper trait for constructing BidCos services from configuration
pub trait BidcosServiceFactory: Send + Sync {
    /// Create a BidcosService instance from configuration
    ///
    /// # Parameters
    ///
    /// - `config`: Gateway connection settings
    ///
    /// # Returns
    ///
    /// A boxed BidcosService trait object
    fn create(
        &self,
        config: &crate::config::GatewayConfig,
    ) -> Result<Box<dyn BidcosService>, crate::Error>;
}
