//! Channel name lookup through the controller's script endpoint
//!
//! The controller runs a one-line script per channel and answers with an
//! XML document whose `<Name>` element holds the result:
//!
//! ```text
//! <xml><exec>/Script.exe</exec><sessionId/><httpUserAgent/><Name>Haustür</Name></xml>
//! ```

use crate::client::{Credentials, http_client, status_error};
use crate::value::unescape;
use async_trait::async_trait;
use hm_inventory_core::config::GatewayConfig;
use hm_inventory_core::traits::DeviceNameResolver;
use hm_inventory_core::{Error, Result};

const SERVICE: &str = "Script";

/// Build the script that reads the name of the channel at `address`
pub fn name_script(address: &str) -> String {
    format!(
        "Name = (xmlrpc.GetObjectByHSSAddress(interfaces.GetAt(0), \"{}\")).Name();\n",
        address.replace(['"', '\\'], "")
    )
}

/// Extract the text of the first `<tag>` element of a script reply
///
/// Returns `None` when the element is missing or self-closing.
pub fn extract_element(xml: &str, tag: &str) -> Option<String> {
    let open = format!("<{}>", tag);
    let close = format!("</{}>", tag);
    let start = xml.find(&open)? + open.len();
    let end = xml[start..].find(&close)?;
    Some(unescape(xml[start..start + end].trim()))
}

/// [`DeviceNameResolver`] backed by the script endpoint
#[derive(Debug, Clone)]
pub struct ScriptNameResolver {
    url: String,
    http: reqwest::Client,
    credentials: Option<Credentials>,
}

impl ScriptNameResolver {
    /// Create a resolver for the gateway's script endpoint
    pub fn new(config: &GatewayConfig) -> Result<Self> {
        Ok(Self {
            url: format!("http://{}:{}/Script.exe", config.host, config.script_port),
            http: http_client(config)?,
            credentials: Credentials::from_config(config),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl DeviceNameResolver for ScriptNameResolver {
    async fn channel_name(&self, address: &str) -> Result<Option<String>> {
        let mut request = self
            .http
            .post(&self.url)
            .header("Content-Type", "text/plain;charset=\"UTF-8\"")
            .body(name_script(address));
        if let Some(credentials) = &self.credentials {
            request = request.basic_auth(&credentials.username, credentials.password.as_ref());
        }

        let response = request
            .send()
            .await
            .map_err(|e| Error::rpc(SERVICE, format!("Name lookup for {} failed: {}", address, e)))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| Error::rpc(SERVICE, format!("Failed to read script reply: {}", e)))?;

        if !status.is_success() {
            return Err(status_error(SERVICE, status, &body));
        }

        // The script leaves Name empty or "null" for unknown objects
        Ok(extract_element(&body, "Name").filter(|name| !name.is_empty() && name != "null"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn script_embeds_address() {
        assert_eq!(
            name_script("AAAA000000000001:1"),
            "Name = (xmlrpc.GetObjectByHSSAddress(interfaces.GetAt(0), \"AAAA000000000001:1\")).Name();\n"
        );
        assert!(!name_script("X\"); system.Exec(\"rm").contains("\"rm"));
    }

    #[test]
    fn extracts_name_element() {
        let reply = "<xml><exec>/Script.exe</exec><sessionId></sessionId>\
                     <httpUserAgent></httpUserAgent><Name>K&#252;che Licht</Name></xml>";
        assert_eq!(extract_element(reply, "Name").as_deref(), Some("Küche Licht"));
        assert_eq!(extract_element(reply, "Missing"), None);
        assert_eq!(extract_element("<xml><Name/></xml>", "Name"), None);
    }

    #[test]
    fn resolver_targets_script_port() {
        let mut config = GatewayConfig::new("192.168.1.10");
        config.script_port = 8282;
        let resolver = ScriptNameResolver::new(&config).unwrap();
        assert_eq!(resolver.url(), "http://192.168.1.10:8282/Script.exe");
    }
}
