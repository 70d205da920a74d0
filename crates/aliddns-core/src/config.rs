//! Configuration types for aliddns
//!
//! The configuration is a flat YAML document (default `config.yml`). It is
//! loaded once at startup, validated, and then held read-only for the life
//! of the process.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::IpAddr;
use std::path::Path;

use crate::error::{Error, Result};
use crate::traits::RecordType;

/// Main aliddns configuration
#[derive(Clone, Serialize, Deserialize)]
pub struct DdnsConfig {
    /// AccessKey id used to sign API requests
    pub access_key_id: String,

    /// AccessKey secret (never logged)
    pub access_secret: String,

    /// Region used to pick the API endpoint
    #[serde(default = "default_region_id")]
    pub region_id: String,

    /// Host label (RR) of the managed record, "@" for the zone apex
    pub dns_domain: String,

    /// Zone the record lives in
    pub aliyun_domain: String,

    /// Endpoint returning the caller's public IP as plain text
    #[serde(default = "default_ip_endpoint")]
    pub curl_domain: String,

    /// How the public IP is resolved
    #[serde(default)]
    pub ip_resolver: IpResolverKind,

    /// Program and leading arguments for the command resolver
    ///
    /// The IP endpoint is appended as the last argument.
    #[serde(default = "default_ip_command")]
    pub ip_command: Vec<String>,

    /// Address family accepted from the resolver, derived from
    /// `record_type` when unset
    #[serde(default)]
    pub ip_version: Option<IpVersion>,

    /// Which record type to manage
    #[serde(default)]
    pub record_type: RecordTypePolicy,

    /// TTL for created/updated records
    #[serde(default = "default_ttl")]
    pub ttl: u32,

    /// Resolution line for created/updated records
    #[serde(default = "default_line")]
    pub line: String,

    /// Interval between passes in periodic mode
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,

    /// Override of the provider API endpoint (mostly for testing)
    #[serde(default)]
    pub endpoint: Option<String>,

    /// Look records up but never mutate them
    #[serde(default)]
    pub dry_run: bool,
}

impl fmt::Debug for DdnsConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DdnsConfig")
            .field("access_key_id", &self.access_key_id)
            .field("access_secret", &"<REDACTED>")
            .field("region_id", &self.region_id)
            .field("dns_domain", &self.dns_domain)
            .field("aliyun_domain", &self.aliyun_domain)
            .field("curl_domain", &self.curl_domain)
            .field("ip_resolver", &self.ip_resolver)
            .field("ip_command", &self.ip_command)
            .field("ip_version", &self.ip_version)
            .field("record_type", &self.record_type)
            .field("ttl", &self.ttl)
            .field("line", &self.line)
            .field("interval_secs", &self.interval_secs)
            .field("endpoint", &self.endpoint)
            .field("dry_run", &self.dry_run)
            .finish()
    }
}

impl DdnsConfig {
    /// Create a configuration with defaults for everything but the required fields
    pub fn new(
        access_key_id: impl Into<String>,
        access_secret: impl Into<String>,
        dns_domain: impl Into<String>,
        aliyun_domain: impl Into<String>,
    ) -> Self {
        Self {
            access_key_id: access_key_id.into(),
            access_secret: access_secret.into(),
            region_id: default_region_id(),
            dns_domain: dns_domain.into(),
            aliyun_domain: aliyun_domain.into(),
            curl_domain: default_ip_endpoint(),
            ip_resolver: IpResolverKind::default(),
            ip_command: default_ip_command(),
            ip_version: None,
            record_type: RecordTypePolicy::default(),
            ttl: default_ttl(),
            line: default_line(),
            interval_secs: default_interval_secs(),
            endpoint: None,
            dry_run: false,
        }
    }

    /// Parse a configuration from YAML text
    ///
    /// The result is not validated; call [`DdnsConfig::validate`].
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Load a configuration file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&text)
    }

    /// Manage `fqdn` instead of the configured `dns_domain`/`aliyun_domain`
    pub fn override_domain(&mut self, fqdn: &str) -> Result<()> {
        let target = RecordTarget::from_fqdn(fqdn, Some(&self.aliyun_domain))?;
        self.dns_domain = target.rr;
        self.aliyun_domain = target.zone;
        Ok(())
    }

    /// The record this configuration manages
    pub fn target(&self) -> RecordTarget {
        RecordTarget::new(self.dns_domain.clone(), self.aliyun_domain.clone())
    }

    /// The address family the IP resolver must return
    pub fn ip_version(&self) -> IpVersion {
        if let Some(version) = self.ip_version {
            return version;
        }
        match self.record_type {
            RecordTypePolicy::A => IpVersion::V4,
            RecordTypePolicy::Aaaa => IpVersion::V6,
            RecordTypePolicy::Auto => IpVersion::Any,
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        validate_credential("access_key_id", &self.access_key_id)?;
        validate_credential("access_secret", &self.access_secret)?;

        if self.region_id.trim().is_empty() {
            return Err(Error::config("region_id cannot be empty"));
        }

        validate_domain_name(&self.aliyun_domain)?;
        validate_rr(&self.dns_domain)?;

        validate_url("curl_domain", &self.curl_domain)?;
        if let Some(ref endpoint) = self.endpoint {
            validate_url("endpoint", endpoint)?;
        }

        if self.ip_resolver == IpResolverKind::Command && self.ip_command.is_empty() {
            return Err(Error::config(
                "ip_command must name a program when ip_resolver is 'command'",
            ));
        }

        match (self.record_type, self.ip_version) {
            (RecordTypePolicy::A, Some(IpVersion::V6))
            | (RecordTypePolicy::Aaaa, Some(IpVersion::V4)) => {
                return Err(Error::config(format!(
                    "ip_version {} contradicts record_type {:?}",
                    self.ip_version(),
                    self.record_type
                )));
            }
            _ => {}
        }

        if !(1..=86400).contains(&self.ttl) {
            return Err(Error::config(format!(
                "ttl must be between 1 and 86400 seconds. Got: {}",
                self.ttl
            )));
        }

        if self.line.trim().is_empty() {
            return Err(Error::config("line cannot be empty"));
        }

        if self.interval_secs < 60 {
            return Err(Error::config(format!(
                "interval_secs must be at least 60 seconds. Got: {}",
                self.interval_secs
            )));
        }

        Ok(())
    }
}

/// How the public IP address is resolved
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IpResolverKind {
    /// HTTP GET against `curl_domain`
    #[default]
    Http,
    /// Run `ip_command` with `curl_domain` appended
    #[serde(alias = "curl", alias = "shell")]
    Command,
}

impl IpResolverKind {
    /// Registry name of the resolver
    pub fn type_name(&self) -> &'static str {
        match self {
            IpResolverKind::Http => "http",
            IpResolverKind::Command => "command",
        }
    }
}

/// Which record type to manage
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum RecordTypePolicy {
    /// Always an A record; IPv6 addresses are rejected
    #[default]
    #[serde(alias = "a")]
    A,
    /// Always an AAAA record; IPv4 addresses are rejected
    #[serde(rename = "AAAA", alias = "aaaa")]
    Aaaa,
    /// A for IPv4, AAAA for IPv6
    #[serde(rename = "auto", alias = "Auto")]
    Auto,
}

impl RecordTypePolicy {
    /// The record type to use for `ip`
    pub fn record_type_for(&self, ip: &IpAddr) -> Result<RecordType> {
        let natural = RecordType::for_ip(ip);
        match (self, natural) {
            (RecordTypePolicy::Auto, ty) => Ok(ty),
            (RecordTypePolicy::A, RecordType::A) => Ok(RecordType::A),
            (RecordTypePolicy::Aaaa, RecordType::Aaaa) => Ok(RecordType::Aaaa),
            (policy, _) => Err(Error::invalid_input(format!(
                "{} cannot be stored in a {:?} record",
                ip, policy
            ))),
        }
    }
}

/// IP address family accepted from the resolver
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IpVersion {
    /// IPv4 only
    V4,
    /// IPv6 only
    V6,
    /// Either family
    Any,
}

impl IpVersion {
    /// Whether `ip` belongs to an accepted family
    pub fn accepts(&self, ip: &IpAddr) -> bool {
        match self {
            IpVersion::V4 => ip.is_ipv4(),
            IpVersion::V6 => ip.is_ipv6(),
            IpVersion::Any => true,
        }
    }
}

impl fmt::Display for IpVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IpVersion::V4 => f.write_str("IPv4"),
            IpVersion::V6 => f.write_str("IPv6"),
            IpVersion::Any => f.write_str("IPv4 or IPv6"),
        }
    }
}

/// The (RR, zone) pair identifying the managed record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordTarget {
    /// Host label, "@" for the apex
    pub rr: String,
    /// Zone name
    pub zone: String,
}

impl RecordTarget {
    /// Create a new target
    pub fn new(rr: impl Into<String>, zone: impl Into<String>) -> Self {
        Self {
            rr: rr.into(),
            zone: zone.into(),
        }
    }

    /// Split a fully-qualified name into RR and zone
    ///
    /// When `zone_hint` is a suffix of `fqdn` it is used as the zone (and an
    /// exact match yields the apex, "@"). Otherwise the last two labels form
    /// the zone.
    pub fn from_fqdn(fqdn: &str, zone_hint: Option<&str>) -> Result<Self> {
        let fqdn = fqdn.trim().trim_end_matches('.').to_ascii_lowercase();
        if fqdn.is_empty() {
            return Err(Error::config("domain cannot be empty"));
        }

        if let Some(zone) = zone_hint {
            let zone = zone.trim().trim_end_matches('.').to_ascii_lowercase();
            if !zone.is_empty() {
                if fqdn == zone {
                    return Ok(Self::new("@", zone));
                }
                if let Some(rr) = fqdn.strip_suffix(&format!(".{}", zone)) {
                    return Ok(Self::new(rr, zone));
                }
            }
        }

        let labels: Vec<&str> = fqdn.split('.').collect();
        if labels.len() < 2 {
            return Err(Error::config(format!(
                "domain '{}' has no zone part",
                fqdn
            )));
        }

        let split = labels.len() - 2;
        let zone = labels[split..].join(".");
        let rr = if split == 0 {
            "@".to_string()
        } else {
            labels[..split].join(".")
        };

        Ok(Self::new(rr, zone))
    }

    /// Whether this is the zone apex
    pub fn is_apex(&self) -> bool {
        self.rr == "@"
    }

    /// The name passed to subdomain lookups
    pub fn subdomain(&self) -> String {
        if self.is_apex() {
            self.zone.clone()
        } else {
            format!("{}.{}", self.rr, self.zone)
        }
    }
}

impl fmt::Display for RecordTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.subdomain())
    }
}

fn validate_credential(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(Error::config(format!("{} is required", field)));
    }

    let lower = value.to_lowercase();
    if lower.contains("your_") || lower.contains("replace_me") || lower.contains("changeme") {
        return Err(Error::config(format!(
            "{} appears to be a placeholder. Use the AccessKey from the RAM console.",
            field
        )));
    }

    Ok(())
}

fn validate_url(field: &str, url: &str) -> Result<()> {
    if url.starts_with("https://") || url.starts_with("http://") {
        Ok(())
    } else {
        Err(Error::config(format!(
            "{} must use HTTP or HTTPS scheme. Got: {}",
            field, url
        )))
    }
}

/// Validate a single DNS label (alphanumeric, hyphen, underscore; RFC 1035 lengths)
fn validate_label(label: &str, name: &str) -> Result<()> {
    if label.is_empty() {
        return Err(Error::config(format!("Domain name has empty label: '{}'", name)));
    }

    if label.len() > 63 {
        return Err(Error::config(format!(
            "Domain label too long: {} chars (max 63). Label: '{}'",
            label.len(),
            label
        )));
    }

    if !label.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_') {
        return Err(Error::config(format!(
            "Domain label contains invalid characters. Label: '{}'",
            label
        )));
    }

    if label.starts_with('-') || label.ends_with('-') {
        return Err(Error::config(format!(
            "Domain label cannot start or end with hyphen. Label: '{}'",
            label
        )));
    }

    Ok(())
}

/// Validate a zone name
pub fn validate_domain_name(domain: &str) -> Result<()> {
    if domain.is_empty() {
        return Err(Error::config("aliyun_domain cannot be empty"));
    }

    if domain.len() > 253 {
        return Err(Error::config(format!(
            "Domain name too long: {} chars (max 253). Got: {}",
            domain.len(),
            domain
        )));
    }

    if !domain.contains('.') {
        return Err(Error::config(format!(
            "Zone '{}' must contain at least two labels",
            domain
        )));
    }

    for label in domain.split('.') {
        validate_label(label, domain)?;
    }

    Ok(())
}

/// Validate a host label: "@", "*", or dotted labels with an optional leading "*"
pub fn validate_rr(rr: &str) -> Result<()> {
    if rr.is_empty() {
        return Err(Error::config("dns_domain cannot be empty (use '@' for the apex)"));
    }

    if rr == "@" {
        return Ok(());
    }

    for (i, label) in rr.split('.').enumerate() {
        if i == 0 && label == "*" {
            continue;
        }
        validate_label(label, rr)?;
    }

    Ok(())
}

fn default_region_id() -> String {
    "cn-hangzhou".to_string()
}

fn default_ip_endpoint() -> String {
    "https://api.ipify.org".to_string()
}

fn default_ip_command() -> Vec<String> {
    vec!["curl".to_string(), "-s".to_string()]
}

fn default_ttl() -> u32 {
    600
}

fn default_line() -> String {
    "default".to_string()
}

fn default_interval_secs() -> u64 {
    24 * 60 * 60
}
