//! rfsite poller (rfsited)
//!
//! Loads the site configuration, builds the read and write connections and
//! polls every site component at a fixed cadence until shut down.
//!
//! The agent is replayed from a JSON snapshot (address to value map). Without
//! a snapshot a fully nominal demo site is served.

mod poller;

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::Context;
use rfsite::{Connection, SimulatedAgent, Site, SiteConfig};
use tracing::{info, warn};

const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Command line options
#[derive(Debug, Default)]
struct Options {
    config: Option<PathBuf>,
    snapshot: Option<PathBuf>,
    once: bool,
}

fn print_help() {
    eprintln!("rfsited {} - RF site health poller", VERSION);
    eprintln!();
    eprintln!("USAGE:");
    eprintln!("    rfsited [OPTIONS]");
    eprintln!();
    eprintln!("OPTIONS:");
    eprintln!("    -c, --config PATH   Site configuration (default: $RFSITE_CONFIG or /etc/rfsite/site.json)");
    eprintln!("        --snapshot PATH Replay agent values from a JSON snapshot");
    eprintln!("        --once          Poll once, print the report as JSON and exit");
    eprintln!("    -v, --version       Print version");
    eprintln!("    -h, --help          Print this help");
    eprintln!();
    eprintln!("ENVIRONMENT:");
    eprintln!("    RFSITE_LOG          Log level (trace, debug, info, warn, error)");
    eprintln!("    RFSITE_CONFIG       Site configuration path");
}

fn print_version() {
    println!("rfsited {}", VERSION);
}

fn parse_args() -> Options {
    let args: Vec<String> = std::env::args().collect();
    let mut options = Options::default();

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "-h" | "--help" => {
                print_help();
                std::process::exit(0);
            }
            "-v" | "--version" => {
                print_version();
                std::process::exit(0);
            }
            "--once" => options.once = true,
            "-c" | "--config" | "--snapshot" => {
                let flag = args[i].clone();
                i += 1;
                if i >= args.len() {
                    eprintln!("Error: {} requires a path argument", flag);
                    std::process::exit(1);
                }
                let path = PathBuf::from(&args[i]);
                if flag == "--snapshot" {
                    options.snapshot = Some(path);
                } else {
                    options.config = Some(path);
                }
            }
            arg => {
                eprintln!("Unknown argument: {}", arg);
                print_help();
                std::process::exit(1);
            }
        }
        i += 1;
    }
    options
}

/// Journald when the journal socket exists, formatted stdout otherwise
fn init_logging() -> bool {
    let log_level = std::env::var("RFSITE_LOG").unwrap_or_else(|_| "info".to_string());

    if std::path::Path::new("/run/systemd/journal/socket").exists() {
        match tracing_journald::layer() {
            Ok(journald_layer) => {
                use tracing_subscriber::prelude::*;
                tracing_subscriber::registry()
                    .with(journald_layer)
                    .with(tracing_subscriber::EnvFilter::new(&log_level))
                    .init();
                return true;
            }
            Err(e) => {
                eprintln!("Failed to create journald layer: {}, falling back to stdout", e);
            }
        }
    }

    tracing_subscriber::fmt()
        .with_target(false)
        .with_level(true)
        .with_env_filter(&log_level)
        .init();
    false
}

fn load_agent(options: &Options, config: &SiteConfig) -> anyhow::Result<SimulatedAgent> {
    match &options.snapshot {
        Some(path) => SimulatedAgent::from_snapshot(path)
            .with_context(|| format!("loading agent snapshot {}", path.display())),
        None => {
            warn!("No snapshot given, serving a nominal demo site");
            SimulatedAgent::healthy_site(config).context("building demo site")
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let options = parse_args();
    let journald = init_logging();

    info!("STARTUP: rfsited {} starting", VERSION);
    info!("STARTUP: Logging to {}", if journald { "systemd journal" } else { "stdout" });

    let config_path = options.config.clone().unwrap_or_else(rfsite::config_path);
    let config = rfsite::load_or_default(&config_path)
        .with_context(|| format!("loading site configuration {}", config_path.display()))?;
    info!(
        "STARTUP: Agent {}:{} ({} ms timeout, {} retries)",
        config.agent.host, config.agent.port, config.agent.timeout_ms, config.agent.retries
    );

    let agent = load_agent(&options, &config)?;
    let read = Connection::shared("read", agent.clone());
    let write = Connection::shared("write", agent);
    let site = Arc::new(Site::new(&config, read, write).context("constructing site")?);

    if options.once {
        site.poll_once();
        println!("{}", serde_json::to_string_pretty(&site.report())?);
        return Ok(());
    }

    let shutdown = Arc::new(AtomicBool::new(false));
    let signal_flag = shutdown.clone();
    if let Err(e) = ctrlc::set_handler(move || {
        info!("SIGNAL: Received SIGINT/SIGTERM - initiating shutdown");
        signal_flag.store(true, Ordering::SeqCst);
    }) {
        warn!("Failed to set signal handler: {}. Shutdown via signals may not work cleanly.", e);
    }

    poller::run_poll_loop(site, config.poll_interval(), shutdown).await;

    info!("SHUTDOWN: rfsited terminated gracefully");
    Ok(())
}
