// # XML-RPC BidCos Service
//
// This crate provides the XML-RPC implementation of the BidCos service
// boundary used by the inventory engine.
//
// ## Endpoints
//
// | Sub-service   | Default port | Used for                                     |
// |---------------|--------------|----------------------------------------------|
// | BidCos-RF     | 2001         | `listDevices`, `listBidcosInterfaces`, `rssiInfo` |
// | BidCos-IP     | 2010         | `listDevices`, `getParamset`                 |
// | BidCos-Wired  | 2000         | `listDevices`                                |
// | Script        | 8181         | channel names (`/Script.exe`)                |
//
// ## Behavior
//
// - One HTTP request per trait call, no retries (the engine decides what a
//   failure means)
// - Connect and total timeouts come from `GatewayConfig`
// - Basic auth when a username is configured; the password never appears in
//   logs or Debug output
//
// ## Usage
//
// ```rust,ignore
// let registry = ServiceRegistry::with_builtin_sinks();
// hm_inventory_xmlrpc::register(&registry);
// let service = registry.create_service(&config.gateway)?;
// ```

pub mod client;
pub mod codec;
pub mod decode;
pub mod script;
pub mod value;

pub use client::XmlRpcClient;
pub use script::ScriptNameResolver;
pub use value::Value;

use async_trait::async_trait;
use client::{Credentials, http_client};
use hm_inventory_core::config::GatewayConfig;
use hm_inventory_core::model::{BidcosInterface, CatalogSource, HmDevice, RssiParamset, RssiTable};
use hm_inventory_core::traits::{BidcosService, BidcosServiceFactory, DeviceNameResolver};
use hm_inventory_core::{Result, ServiceRegistry};

/// Name under which the factory registers
pub const SERVICE_TYPE: &str = "xmlrpc";

/// BidCos service talking XML-RPC to the RF, IP and Wired endpoints
#[derive(Debug, Clone)]
pub struct XmlRpcBidcosService {
    rf: XmlRpcClient,
    ip: XmlRpcClient,
    wired: XmlRpcClient,
}

impl XmlRpcBidcosService {
    /// Create the service for a gateway
    ///
    /// No connection is made until the first call.
    pub fn new(config: &GatewayConfig) -> Result<Self> {
        let http = http_client(config)?;
        let credentials = Credentials::from_config(config);
        let client = |source: CatalogSource, port: u16| {
            XmlRpcClient::new(
                source.service_name(),
                format!("http://{}:{}/", config.host, port),
                http.clone(),
                credentials.clone(),
            )
        };

        Ok(Self {
            rf: client(CatalogSource::Rf, config.rf_port),
            ip: client(CatalogSource::Ip, config.ip_port),
            wired: client(CatalogSource::Wired, config.wired_port),
        })
    }

    /// Client of one sub-service
    pub fn client(&self, source: CatalogSource) -> &XmlRpcClient {
        match source {
            CatalogSource::Rf => &self.rf,
            CatalogSource::Ip => &self.ip,
            CatalogSource::Wired => &self.wired,
        }
    }
}

#[async_trait]
impl BidcosService for XmlRpcBidcosService {
    async fn list_devices(&self, source: CatalogSource) -> Result<Vec<HmDevice>> {
        let client = self.client(source);
        let reply = client.call("listDevices", &[]).await?;
        let devices = decode::devices(client.service(), &reply)?;
        tracing::debug!("{}: {} device records", client.service(), devices.len());
        Ok(devices)
    }

    async fn list_bidcos_interfaces(&self) -> Result<Vec<BidcosInterface>> {
        let reply = self.rf.call("listBidcosInterfaces", &[]).await?;
        decode::interfaces(self.rf.service(), &reply)
    }

    async fn rssi_info(&self) -> Result<RssiTable> {
        let reply = self.rf.call("rssiInfo", &[]).await?;
        decode::rssi_table(self.rf.service(), &reply)
    }

    async fn get_paramset(&self, address: &str, paramset_key: &str) -> Result<RssiParamset> {
        let reply = self
            .ip
            .call("getParamset", &[Value::from(address), Value::from(paramset_key)])
            .await?;
        decode::rssi_paramset(self.ip.service(), &reply)
    }

    fn service_name(&self) -> &'static str {
        SERVICE_TYPE
    }
}

/// Factory for [`XmlRpcBidcosService`]
pub struct XmlRpcServiceFactory;

impl BidcosServiceFactory for XmlRpcServiceFactory {
    fn create(&self, config: &GatewayConfig) -> Result<Box<dyn BidcosService>> {
        config.validate()?;
        Ok(Box::new(XmlRpcBidcosService::new(config)?))
    }
}

/// Register the XML-RPC service with a registry
pub fn register(registry: &ServiceRegistry) {
    registry.register_service(SERVICE_TYPE, Box::new(XmlRpcServiceFactory));
}

/// Name resolver for the gateway's script endpoint
pub fn name_resolver(config: &GatewayConfig) -> Result<Box<dyn DeviceNameResolver>> {
    Ok(Box::new(ScriptNameResolver::new(config)?))
}
