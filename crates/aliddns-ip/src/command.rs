//! External command resolver
//!
//! Runs `ip_command` with the endpoint appended as the last argument, e.g.
//! `curl -s https://api.ipify.org`, and parses its standard output.

use aliddns_core::config::{DdnsConfig, IpVersion};
use aliddns_core::traits::{parse_ip_text, IpSource, IpSourceFactory};
use aliddns_core::{Error, Result};
use std::net::IpAddr;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;

/// Default limit on how long the command may run
const DEFAULT_COMMAND_TIMEOUT: Duration = Duration::from_secs(30);

/// Command-based IP source
#[derive(Debug, Clone)]
pub struct CommandIpSource {
    /// Program to run
    program: String,

    /// Arguments, endpoint included
    args: Vec<String>,

    /// Address family the command must print
    version: IpVersion,

    /// Kill the command after this long
    timeout: Duration,
}

impl CommandIpSource {
    /// Create a source running `command` (program followed by arguments)
    pub fn new(command: &[String], version: IpVersion) -> Result<Self> {
        let (program, args) = command
            .split_first()
            .ok_or_else(|| Error::config("ip_command must name a program"))?;

        Ok(Self {
            program: program.clone(),
            args: args.to_vec(),
            version,
            timeout: DEFAULT_COMMAND_TIMEOUT,
        })
    }

    /// Create a source running `command` with `endpoint` as the last argument
    pub fn with_endpoint(command: &[String], endpoint: &str, version: IpVersion) -> Result<Self> {
        let mut source = Self::new(command, version)?;
        if !endpoint.is_empty() {
            source.args.push(endpoint.to_string());
        }
        Ok(source)
    }

    /// Override the run timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// The full command line, for logging
    pub fn command_line(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

#[async_trait::async_trait]
impl IpSource for CommandIpSource {
    async fn current(&self) -> Result<IpAddr> {
        tracing::debug!("Running IP command: {}", self.command_line());

        let child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output();

        let output = tokio::time::timeout(self.timeout, child)
            .await
            .map_err(|_| {
                Error::ip_source(format!(
                    "'{}' did not finish within {:?}",
                    self.program, self.timeout
                ))
            })?
            .map_err(|e| Error::ip_source(format!("Failed to run '{}': {}", self.program, e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(Error::ip_source(format!(
                "'{}' exited with {}: {}",
                self.program,
                output.status,
                stderr.trim()
            )));
        }

        parse_ip_text(&String::from_utf8_lossy(&output.stdout), self.version)
    }

    fn source_name(&self) -> &'static str {
        "command"
    }
}

/// Factory for creating command IP sources from `ip_command` and `curl_domain`
pub struct CommandFactory;

impl IpSourceFactory for CommandFactory {
    fn create(&self, config: &DdnsConfig) -> Result<Box<dyn IpSource>> {
        Ok(Box::new(CommandIpSource::with_endpoint(
            &config.ip_command,
            &config.curl_domain,
            config.ip_version(),
        )?))
    }
}
