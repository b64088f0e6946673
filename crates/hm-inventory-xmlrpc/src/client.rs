//! HTTP transport for one BidCos sub-service
//!
//! One [`XmlRpcClient`] talks to exactly one endpoint. It performs a single
//! POST per call and never retries.

use crate::codec::{self, CodecError};
use crate::value::Value;
use hm_inventory_core::config::GatewayConfig;
use hm_inventory_core::{Error, Result};
use std::time::Duration;

/// Basic auth credentials for the controller
#[derive(Clone)]
pub(crate) struct Credentials {
    pub(crate) username: String,
    pub(crate) password: Option<String>,
}

// Custom Debug implementation that hides the password
impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "<REDACTED>"))
            .finish()
    }
}

impl Credentials {
    pub(crate) fn from_config(config: &GatewayConfig) -> Option<Self> {
        config.username.as_ref().map(|username| Self {
            username: username.clone(),
            password: config.password.clone(),
        })
    }
}

/// Build the HTTP client shared by all endpoints of a gateway
pub(crate) fn http_client(config: &GatewayConfig) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .connect_timeout(Duration::from_millis(config.connect_timeout_ms))
        .timeout(Duration::from_millis(config.timeout_ms))
        .build()
        .map_err(|e| Error::http(format!("Failed to build HTTP client: {}", e)))
}

/// Map a non-success HTTP status onto an RPC error
pub(crate) fn status_error(service: &str, status: reqwest::StatusCode, body: &str) -> Error {
    match status.as_u16() {
        401 | 403 => Error::rpc(
            service,
            format!("Authentication failed: check username and password. Status: {}", status),
        ),
        404 => Error::rpc(service, format!("Endpoint not found. Status: {}", status)),
        500..=599 => Error::rpc(service, format!("Controller error: {} - {}", status, body)),
        _ => Error::rpc(service, format!("Request failed: {} - {}", status, body)),
    }
}

/// XML-RPC client for one sub-service endpoint
#[derive(Debug, Clone)]
pub struct XmlRpcClient {
    service: &'static str,
    url: String,
    http: reqwest::Client,
    credentials: Option<Credentials>,
}

impl XmlRpcClient {
    pub(crate) fn new(
        service: &'static str,
        url: String,
        http: reqwest::Client,
        credentials: Option<Credentials>,
    ) -> Self {
        Self {
            service,
            url,
            http,
            credentials,
        }
    }

    /// Endpoint URL, e.g. `http://ccu.local:2001/`
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Sub-service name used in errors and logs
    pub fn service(&self) -> &'static str {
        self.service
    }

    /// Perform one method call
    ///
    /// Transport failures, HTTP errors and XML-RPC faults all surface as
    /// [`Error::Rpc`] naming this client's sub-service.
    pub async fn call(&self, method: &str, params: &[Value]) -> Result<Value> {
        tracing::debug!("{}: calling {}", self.service, method);

        let mut request = self
            .http
            .post(&self.url)
            .header("Content-Type", "text/xml")
            .body(codec::encode_call(method, params));
        if let Some(credentials) = &self.credentials {
            request = request.basic_auth(&credentials.username, credentials.password.as_ref());
        }

        let response = request
            .send()
            .await
            .map_err(|e| Error::rpc(self.service, format!("{} request failed: {}", method, e)))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| Error::rpc(self.service, format!("Failed to read {} response: {}", method, e)))?;

        if !status.is_success() {
            return Err(status_error(self.service, status, &body));
        }

        codec::parse_response(&body).map_err(|e| match e {
            CodecError::Fault { code, message } => Error::rpc(
                self.service,
                format!("{} failed with fault {}: {}", method, code, message),
            ),
            CodecError::Malformed(_) => Error::rpc(self.service, format!("{}: {}", method, e)),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn credentials_debug_hides_password() {
        let mut config = GatewayConfig::new("ccu.local");
        config.username = Some("admin".to_string());
        config.password = Some("hunter2".to_string());

        let credentials = Credentials::from_config(&config).unwrap();
        let debug = format!("{:?}", credentials);
        assert!(debug.contains("admin"));
        assert!(!debug.contains("hunter2"));
    }

    #[test]
    fn no_username_means_no_credentials() {
        let config = GatewayConfig::new("ccu.local");
        assert!(Credentials::from_config(&config).is_none());
    }

    #[test]
    fn status_errors_name_the_service() {
        let err = status_error("BidCos-RF", reqwest::StatusCode::UNAUTHORIZED, "");
        assert!(err.to_string().contains("BidCos-RF"));
        assert!(err.to_string().contains("Authentication failed"));

        let err = status_error("BidCos-IP", reqwest::StatusCode::BAD_GATEWAY, "upstream");
        assert!(err.to_string().contains("upstream"));
    }

    #[tokio::test]
    async fn unreachable_endpoint_is_an_rpc_error() {
        let mut config = GatewayConfig::new("127.0.0.1");
        config.connect_timeout_ms = 200;
        config.timeout_ms = 500;

        // Port 9 (discard) is closed on test machines
        let client = XmlRpcClient::new(
            "BidCos-Wired",
            "http://127.0.0.1:9/".to_string(),
            http_client(&config).unwrap(),
            None,
        );

        match client.call("listDevices", &[]).await {
            Err(Error::Rpc { service, .. }) => assert_eq!(service, "BidCos-Wired"),
            other => panic!("expected rpc error, got {:?}", other),
        }
    }
}
