//! ping-exporter binary entry point.
//!
//! Loads configuration, starts the monitor and serves metrics until a
//! shutdown signal arrives.

use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use ping_exporter::{
    AppConfig, IcmpProber, Monitor, PingCollector, SystemResolver,
    config::{parse_duration, parse_listen_address},
    monitor::IpVersion,
    server::{AppState, create_router},
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Metric exporter for ICMP echo round-trip times and packet loss.
#[derive(Parser, Debug)]
#[command(name = "ping-exporter", version, about, long_about = None)]
struct Cli {
    /// Path to config file
    #[arg(long = "config.path", env = "PING_EXPORTER_CONFIG")]
    config: Option<String>,

    /// Address on which to expose metrics and web interface
    #[arg(long = "web.listen-address", env = "PING_EXPORTER_LISTEN_ADDRESS", value_parser = parse_listen_address)]
    listen_address: Option<(String, u16)>,

    /// Path under which to expose metrics
    #[arg(long = "web.telemetry-path", env = "PING_EXPORTER_TELEMETRY_PATH")]
    metrics_path: Option<String>,

    /// Interval for ICMP echo requests
    #[arg(long = "ping.interval", value_parser = parse_duration)]
    ping_interval: Option<Duration>,

    /// Timeout for ICMP echo request
    #[arg(long = "ping.timeout", value_parser = parse_duration)]
    ping_timeout: Option<Duration>,

    /// Payload size for ICMP echo requests
    #[arg(long = "ping.size")]
    ping_size: Option<u32>,

    /// Number of results to remember per target
    #[arg(long = "ping.history-size")]
    history_size: Option<usize>,

    /// Interval for refreshing DNS records, 0s to resolve only at startup
    #[arg(long = "dns.refresh", value_parser = parse_duration)]
    dns_refresh: Option<Duration>,

    /// Ignore IPv6 addresses of targets
    #[arg(long = "options.disable-ipv6")]
    disable_ipv6: bool,

    /// Only log messages with the given severity or above (used when RUST_LOG is unset)
    #[arg(long = "log.level", default_value = "info", env = "PING_EXPORTER_LOG_LEVEL")]
    log_level: String,

    /// A list of targets to ping
    targets: Vec<String>,
}

impl Cli {
    /// Apply command-line values on top of the file configuration.
    ///
    /// Flags override file values; positional targets are used only when
    /// the file lists none.
    fn apply(self, config: &mut AppConfig) {
        if config.targets.is_empty() {
            config.targets = self.targets;
        }
        if let Some((bind, port)) = self.listen_address {
            config.server.bind = bind;
            config.server.port = port;
        }
        if let Some(path) = self.metrics_path {
            config.server.metrics_path = path;
        }
        if let Some(interval) = self.ping_interval {
            config.ping.interval = interval;
        }
        if let Some(timeout) = self.ping_timeout {
            config.ping.timeout = timeout;
        }
        if let Some(size) = self.ping_size {
            config.ping.payload_size = size;
        }
        if let Some(history) = self.history_size {
            config.ping.history_size = history;
        }
        if let Some(refresh) = self.dns_refresh {
            config.dns.refresh = refresh;
        }
        if self.disable_ipv6 {
            config.options.disable_ipv6 = true;
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .or_else(|_| tracing_subscriber::EnvFilter::try_new(&cli.log_level))?,
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration from file, then apply CLI/env overrides
    let mut config = match cli.config.as_deref() {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path);
            AppConfig::load(path)?
        }
        None => AppConfig::default(),
    };
    cli.apply(&mut config);
    config.normalize();
    config.validate()?;

    let version = env!("CARGO_PKG_VERSION");
    tracing::info!(
        version,
        targets = config.targets.len(),
        interval = %humantime::format_duration(config.ping.interval),
        timeout = %humantime::format_duration(config.ping.timeout),
        history_size = config.ping.history_size,
        payload_size = config.ping.payload_size,
        "Starting ping exporter"
    );

    let prober = IcmpProber::new()?;
    if !prober.supports(IpVersion::V6) {
        tracing::warn!("IPv6 ICMP socket unavailable, IPv6 targets will report loss");
    }
    tracing::debug!(?prober, "ICMP prober ready");

    let monitor = Arc::new(Monitor::new(
        config.monitor_settings(),
        config.targets.iter().cloned(),
        Arc::new(prober),
        Arc::new(SystemResolver),
    ));
    monitor.start().await;

    let app_state = AppState {
        collector: Arc::new(PingCollector::new(Arc::clone(&monitor), version)),
        metrics_path: config.server.metrics_path.clone(),
    };
    let app = create_router(app_state);

    let addr = config.listen_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Listening for {} on http://{}", config.server.metrics_path, addr);
    tracing::info!("Press Ctrl+C to shutdown");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Shutting down monitor...");
    monitor.shutdown();

    tracing::info!("Shutdown complete");
    Ok(())
}

/// Wait for Ctrl+C or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install signal handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C signal");
        }
        _ = terminate => {
            tracing::info!("Received terminate signal");
        }
    }
}
