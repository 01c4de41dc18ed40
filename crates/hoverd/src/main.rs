// # hoverd - hover-ddns daemon
//
// The hoverd daemon is a thin integration layer over the library crates:
//
// 1. Parse command-line flags and the YAML configuration file
// 2. Initialize tracing
// 3. Assemble the engine from the configured strategies
// 4. Run once immediately, then on a fixed interval until signalled
//
// All reconciliation logic lives in hover-core; this binary only wires
// components together and turns the run report into logs and an exit code.
//
// ## Configuration
//
// ```yaml
// username: alice
// password: secret
// force_update: false
// ipv4: true
// ipv6: false
// name_server: "8.8.8.8:53"
// poll_interval_secs: 300
// public_ip:
//   type: http_text
//   service: icanhazip
// domains:
//   - name: example.com
//     hosts: [home, vpn]
// ```

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{Level, error, info, warn};
use tracing_subscriber::FmtSubscriber;

#[cfg(unix)]
use tokio::signal::unix::{SignalKind, signal};

use hover_client::HoverClient;
use hover_core::config::PublicIpConfig;
use hover_core::report::{Outcome, RunReport};
use hover_core::traits::PublicIpResolver;
use hover_core::{
    AuthoritativeChecker, DdnsConfig, EngineSettings, ManualIpResolver, ReconcileEngine,
};
use hover_ip_http::HttpTextResolver;
use hover_ip_iface::InterfaceResolver;

/// Exit codes for different termination scenarios
#[derive(Debug, Clone, Copy)]
enum DaemonExitCode {
    /// Clean shutdown (normal exit)
    CleanShutdown = 0,
    /// Configuration error or startup failure
    ConfigError = 1,
    /// One-shot mode: the run reported at least one failure
    UpdateFailed = 2,
}

impl From<DaemonExitCode> for ExitCode {
    fn from(code: DaemonExitCode) -> Self {
        ExitCode::from(code as u8)
    }
}

/// Keeps Hover DNS records pointed at this machine's public IP
#[derive(Debug, Parser)]
#[command(name = "hoverd", version)]
struct Cli {
    /// Path to the YAML configuration file
    #[arg(long, short = 'c')]
    config: PathBuf,

    /// Log the update process, not only warnings and errors
    #[arg(long)]
    verbose: bool,

    /// Log debug details (implies --verbose)
    #[arg(long)]
    debug: bool,

    /// Decide and report what would change, but change nothing
    #[arg(long)]
    dry_run: bool,

    /// Run one pass and exit instead of staying resident
    #[arg(long)]
    once: bool,

    /// Use this IPv4 address instead of discovering it
    #[arg(long = "ipv4-address", value_name = "ADDR")]
    ipv4_address: Option<String>,

    /// Use this IPv6 address instead of discovering it
    #[arg(long = "ipv6-address", value_name = "ADDR")]
    ipv6_address: Option<String>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let mut config = match load_config(&cli.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("could not load config file: {e:#}");
            return DaemonExitCode::ConfigError.into();
        }
    };
    config.dry_run |= cli.dry_run;

    if let Err(e) = config.validate() {
        eprintln!("configuration error: {e}");
        return DaemonExitCode::ConfigError.into();
    }

    let level = if cli.debug {
        Level::DEBUG
    } else if cli.verbose {
        Level::INFO
    } else {
        Level::WARN
    };
    let subscriber = FmtSubscriber::builder().with_max_level(level).finish();
    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("failed to set tracing subscriber: {e}");
        return DaemonExitCode::ConfigError.into();
    }

    let rt = match tokio::runtime::Builder::new_multi_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("failed to create tokio runtime: {e}");
            return DaemonExitCode::ConfigError.into();
        }
    };

    let code = rt.block_on(async {
        match run_daemon(config, &cli).await {
            Ok(code) => code,
            Err(e) => {
                error!("daemon error: {e:#}");
                DaemonExitCode::ConfigError
            }
        }
    });

    code.into()
}

/// Assemble the engine and drive it according to the chosen mode
async fn run_daemon(config: DdnsConfig, cli: &Cli) -> Result<DaemonExitCode> {
    let resolver = build_resolver(&config.public_ip)?;
    let checker = AuthoritativeChecker::new(config.name_server_addr()?);
    let client = HoverClient::new(config.username.clone(), config.password.clone())?;

    let mut settings = EngineSettings::from_config(&config);
    settings.ipv4_override = cli.ipv4_address.clone();
    settings.ipv6_override = cli.ipv6_address.clone();

    let engine = ReconcileEngine::new(settings, resolver, Box::new(checker), Box::new(client));

    if cli.once {
        let report = engine.run_once().await;
        log_report(&report);
        return Ok(if report.has_failures() {
            DaemonExitCode::UpdateFailed
        } else {
            DaemonExitCode::CleanShutdown
        });
    }

    info!(
        "running every {}s, first pass immediately",
        config.poll_interval_secs
    );
    let mut interval = tokio::time::interval(Duration::from_secs(config.poll_interval_secs));
    interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    // A signal that arrives while a pass is executing is observed once the
    // pass completes: the select is only re-polled between runs, so a run
    // is never cut off in the middle of a host.
    #[cfg(unix)]
    {
        let mut sigterm = signal(SignalKind::terminate()).context("setting up SIGTERM handler")?;
        let mut sigint = signal(SignalKind::interrupt()).context("setting up SIGINT handler")?;

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    let report = engine.run_once().await;
                    log_report(&report);
                }
                _ = sigterm.recv() => {
                    info!("received SIGTERM, shutting down");
                    break;
                }
                _ = sigint.recv() => {
                    info!("received SIGINT, shutting down");
                    break;
                }
            }
        }
    }

    #[cfg(not(unix))]
    {
        loop {
            tokio::select! {
                _ = interval.tick() => {
                    let report = engine.run_once().await;
                    log_report(&report);
                }
                _ = tokio::signal::ctrl_c() => {
                    info!("received CTRL-C, shutting down");
                    break;
                }
            }
        }
    }

    Ok(DaemonExitCode::CleanShutdown)
}

/// Read and deserialize the YAML configuration file
fn load_config(path: &Path) -> Result<DdnsConfig> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("reading {}", path.display()))?;
    serde_yaml::from_str(&raw).with_context(|| format!("parsing {}", path.display()))
}

/// Build the configured public IP discovery strategy
fn build_resolver(config: &PublicIpConfig) -> Result<Box<dyn PublicIpResolver>> {
    Ok(match config {
        PublicIpConfig::HttpText {
            service,
            url,
            url_v6,
        } => match url {
            Some(url) => Box::new(HttpTextResolver::with_urls(url.clone(), url_v6.clone())?),
            None => Box::new(HttpTextResolver::for_service(*service)?),
        },
        PublicIpConfig::Interface { interface } => {
            Box::new(InterfaceResolver::new(interface.clone()))
        }
        PublicIpConfig::Manual { ipv4, ipv6 } => {
            Box::new(ManualIpResolver::new(ipv4.as_deref(), ipv6.as_deref()))
        }
    })
}

/// Turn a run report into log lines
fn log_report(report: &RunReport) {
    for record in &report.outcomes {
        match &record.outcome {
            Outcome::Skipped { current } => {
                info!("{} {}: up to date ({current})", record.fqdn, record.record_type);
            }
            Outcome::Updated { new, replaced } => {
                info!(
                    "{} {}: {} to {new}",
                    record.fqdn,
                    record.record_type,
                    if *replaced { "replaced" } else { "created" }
                );
            }
            Outcome::WouldUpdate { new } => {
                info!("{} {}: would update to {new}", record.fqdn, record.record_type);
            }
            Outcome::Failed { reason } => {
                warn!("{} {}: update failed: {reason}", record.fqdn, record.record_type);
            }
        }
    }

    if let Some(reason) = &report.aborted {
        error!("run aborted: {reason}");
    }

    let took = report.finished_at - report.started_at;
    info!(
        "pass finished in {}ms: {} updated, {} skipped, {} failed",
        took.num_milliseconds(),
        report.updated_count(),
        report.skipped_count(),
        report.failed_count()
    );
}
