// # IP Source Trait
//
// Defines the interface for resolving the caller's current public IP address.
//
// ## Implementations
//
// - HTTP GET against a plain-text endpoint: `aliddns-ip` crate
// - External command (e.g. `curl -s <endpoint>`): `aliddns-ip` crate
//
// ## Usage
//
// ```rust,ignore
// use aliddns_core::IpSource;
//
// #[tokio::main]
// async fn main() -> anyhow::Result<()> {
//     let source = /* IpSource implementation */;
//     let ip = source.current().await?;
//     println!("public IP: {}", ip);
//     Ok(())
// }
// ```

use async_trait::async_trait;
use std::net::IpAddr;

use crate::config::IpVersion;

/// Trait for public IP resolvers
///
/// Every call resolves the address afresh; implementations must not cache.
/// Failing to reach the endpoint, a non-success response or text that is not
/// an IP address are all errors (`Error::IpSource`).
#[async_trait]
pub trait IpSource: Send + Sync {
    /// Resolve the current public IP address
    async fn current(&self) -> Result<IpAddr, crate::Error>;

    /// Short name for logging (e.g. "http", "command")
    fn source_name(&self) -> &'static str;
}

/// Parse the text returned by an IP endpoint
///
/// Surrounding whitespace (including the trailing newline most endpoints
/// send) is trimmed, then the address is checked against `version`.
pub fn parse_ip_text(text: &str, version: IpVersion) -> Result<IpAddr, crate::Error> {
    let text = text.trim();

    if text.is_empty() {
        return Err(crate::Error::ip_source("empty response from IP endpoint"));
    }

    let ip: IpAddr = text
        .parse()
        .map_err(|_| crate::Error::ip_source(format!("Invalid IP address: {}", text)))?;

    if !version.accepts(&ip) {
        return Err(crate::Error::ip_source(format!(
            "Expected {} address, got: {}",
            version, ip
        )));
    }

    Ok(ip)
}

/// Helper trait for constructing IP sources from configuration
pub trait IpSourceFactory: Send + Sync {
    /// Create an IpSource instance from the loaded configuration
    fn create(
        &self,
        config: &crate::config::DdnsConfig,
    ) -> Result<Box<dyn IpSource>, crate::Error>;
}
