// # aliddns - Alibaba Cloud dynamic DNS updater
//
// Thin integration layer:
// 1. Parse flags and install logging
// 2. Load and validate the YAML configuration
// 3. Build the AliDNS provider and the configured IP resolver
// 4. Run one reconciliation pass, or keep running passes with `--daemon`
//
// All DDNS logic lives in aliddns-core.
//
// ## Example
//
// ```bash
// aliddns -f /etc/aliddns/config.yml
// aliddns -f config.yml -d home.example.com --dry-run
// aliddns -f config.yml --daemon --interval 600
// ```

use anyhow::{Context, Result};
use clap::Parser;
use std::net::IpAddr;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{Level, debug, error, info};
use tracing_subscriber::FmtSubscriber;

use aliddns_core::{DdnsConfig, DdnsContext, ProviderRegistry, Scheduler};

/// Exit codes for different termination scenarios
///
/// - 0: Pass succeeded or clean shutdown
/// - 1: Configuration or startup error
/// - 2: Runtime error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AliddnsExitCode {
    /// Pass succeeded (single-shot) or clean shutdown (daemon)
    Success = 0,
    /// Configuration error or startup failure
    ConfigError = 1,
    /// IP resolution or reconciliation failure
    RuntimeError = 2,
}

impl From<AliddnsExitCode> for ExitCode {
    fn from(code: AliddnsExitCode) -> Self {
        ExitCode::from(code as u8)
    }
}

/// Keep an Alibaba Cloud DNS A/AAAA record pointed at this host's public IP
#[derive(Debug, Parser)]
#[command(name = "aliddns", version, about)]
struct Args {
    /// Path to the YAML configuration file
    #[arg(short = 'f', long = "file", default_value = "config.yml")]
    file: PathBuf,

    /// Fully-qualified name to manage, overriding dns_domain/aliyun_domain
    #[arg(short = 'd', long = "domain")]
    domain: Option<String>,

    /// Use this address instead of resolving the public IP
    #[arg(long)]
    ip: Option<IpAddr>,

    /// Keep running, one pass per interval
    #[arg(long)]
    daemon: bool,

    /// Seconds between passes in daemon mode (overrides interval_secs)
    #[arg(long)]
    interval: Option<u64>,

    /// Look records up but only log the changes that would be made
    #[arg(long)]
    dry_run: bool,

    /// Log level: trace, debug, info, warn, error
    #[arg(long, env = "ALIDDNS_LOG_LEVEL", default_value = "info", value_parser = parse_level)]
    log_level: Level,
}

fn parse_level(s: &str) -> std::result::Result<Level, String> {
    match s.to_lowercase().as_str() {
        "trace" => Ok(Level::TRACE),
        "debug" => Ok(Level::DEBUG),
        "info" => Ok(Level::INFO),
        "warn" => Ok(Level::WARN),
        "error" => Ok(Level::ERROR),
        _ => Err(format!(
            "'{}' is not valid. Valid levels: trace, debug, info, warn, error",
            s
        )),
    }
}

/// Load the configuration file and apply command-line overrides
fn load_config(args: &Args) -> Result<DdnsConfig> {
    let mut config = DdnsConfig::from_file(&args.file)
        .with_context(|| format!("failed to load {}", args.file.display()))?;

    if let Some(ref domain) = args.domain {
        config
            .override_domain(domain)
            .with_context(|| format!("invalid --domain '{}'", domain))?;
    }

    if let Some(interval) = args.interval {
        config.interval_secs = interval;
    }

    if args.dry_run {
        config.dry_run = true;
    }

    config.validate().context("invalid configuration")?;
    Ok(config)
}

/// Build the run context from a validated configuration
fn build_context(config: DdnsConfig) -> Result<DdnsContext> {
    let registry = ProviderRegistry::new();
    aliddns_alidns::register(&registry);
    aliddns_ip::register(&registry);

    let provider = registry
        .create_provider("alidns", &config)
        .context("failed to create DNS provider")?;
    let ip_source = registry
        .create_ip_source(&config)
        .context("failed to create IP resolver")?;

    Ok(DdnsContext::new(config, ip_source, provider)?)
}

fn main() -> ExitCode {
    let args = Args::parse();

    let subscriber = FmtSubscriber::builder()
        .with_max_level(args.log_level)
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
        return AliddnsExitCode::ConfigError.into();
    }

    let config = match load_config(&args) {
        Ok(config) => config,
        Err(e) => {
            error!("Configuration error: {:#}", e);
            return AliddnsExitCode::ConfigError.into();
        }
    };

    info!(
        "Managing {}.{} (mode: {})",
        config.dns_domain,
        config.aliyun_domain,
        if config.dry_run { "DRY-RUN" } else { "LIVE" }
    );

    let ctx = match build_context(config) {
        Ok(ctx) => ctx,
        Err(e) => {
            error!("Startup error: {:#}", e);
            return AliddnsExitCode::ConfigError.into();
        }
    };

    let rt = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to create tokio runtime: {}", e);
            return AliddnsExitCode::RuntimeError.into();
        }
    };

    let code = rt.block_on(async {
        if args.daemon {
            run_daemon(&ctx, args.ip).await
        } else {
            run_once(&ctx, args.ip).await
        }
    });

    code.into()
}

/// Single pass; the exit code reflects its outcome
async fn run_once(ctx: &DdnsContext, ip: Option<IpAddr>) -> AliddnsExitCode {
    match ctx.run_once(ip).await {
        Ok(outcome) => {
            debug!("Pass finished: {:?}", outcome);
            AliddnsExitCode::Success
        }
        Err(e) => {
            error!("Update of {} failed: {}", ctx.target(), e);
            AliddnsExitCode::RuntimeError
        }
    }
}

/// Periodic passes until SIGINT/SIGTERM
async fn run_daemon(ctx: &DdnsContext, ip: Option<IpAddr>) -> AliddnsExitCode {
    let scheduler = Scheduler::from_context(ctx);

    match scheduler
        .run_until(ctx, ip, aliddns_core::scheduler::shutdown_signal())
        .await
    {
        Ok(stats) => {
            info!(
                "Shutting down: {} pass(es), {} update(s), {} failure(s)",
                stats.passes, stats.mutations, stats.failures
            );
            AliddnsExitCode::Success
        }
        Err(e) => {
            error!("Scheduler error: {}", e);
            AliddnsExitCode::RuntimeError
        }
    }
}
