// # Public IP Resolvers
//
// IpSource implementations for aliddns:
//
// - `http`: GET a plain-text address from `curl_domain`
// - `command`: run `ip_command` with `curl_domain` appended and read stdout
//
// Neither resolver caches; each pass resolves afresh.

pub mod command;
pub mod http;

pub use command::{CommandFactory, CommandIpSource};
pub use http::{HttpFactory, HttpIpSource};

use aliddns_core::ProviderRegistry;

/// Register both resolvers with a registry under "http" and "command"
pub fn register(registry: &ProviderRegistry) {
    registry.register_ip_source("http", Box::new(HttpFactory));
    registry.register_ip_source("command", Box::new(CommandFactory));
}
