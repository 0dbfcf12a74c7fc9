//! BME280 Exporter
//!
//! Reads temperature, humidity and pressure from a BME280 on the I2C bus on
//! every scrape and serves them as Prometheus gauges.

mod config;
mod metrics;
mod sensors;
mod state;
mod web;

use anyhow::{anyhow, Context, Result};
use axum::Router;
use clap::Parser;
use std::future::Future;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::{mpsc, oneshot};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use config::{Config, ReadErrorPolicy};
use state::AppState;

#[derive(Parser)]
#[command(name = "bme280-exporter")]
#[command(about = "Prometheus exporter for BME280 temperature, humidity and pressure sensors")]
#[command(version)]
struct Cli {
    /// The address to listen on for HTTP requests
    #[arg(long)]
    listen_address: Option<String>,

    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// I2C bus device, or "auto" for the first available bus
    #[arg(long)]
    i2c_bus: Option<String>,

    /// I2C address of the sensor (e.g. 0x76, 0x77)
    #[arg(long)]
    i2c_address: Option<String>,

    /// What to do when a scrape can't read the sensor
    #[arg(long, value_enum)]
    on_read_error: Option<ReadErrorPolicy>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    /// Builds the effective configuration: flags override the file, which
    /// overrides defaults.
    fn load_config(&self) -> Result<Config> {
        let mut config = match &self.config {
            Some(path) => {
                let config = Config::load(path)
                    .with_context(|| format!("Failed to load {}", path.display()))?;
                info!("Loaded configuration from: {}", path.display());
                config
            }
            None => Config::default(),
        };

        if let Some(listen) = &self.listen_address {
            config.listen = listen.clone();
        }
        if let Some(bus) = &self.i2c_bus {
            config.sensor.bus = bus.clone();
        }
        if let Some(address) = &self.i2c_address {
            config.sensor.address = address.clone();
        }
        if let Some(policy) = self.on_read_error {
            config.on_read_error = policy;
        }
        Ok(config)
    }
}

/// Why the server stopped.
#[derive(Debug, PartialEq)]
enum Shutdown {
    /// SIGTERM or SIGINT.
    Signal,
    /// A read failed under the exit policy.
    Fatal(String),
}

/// Waits for a fatal read failure or for `stop` to resolve.
async fn wait_for_shutdown(
    mut fatal_rx: mpsc::Receiver<String>,
    stop: impl Future<Output = ()>,
) -> Shutdown {
    tokio::select! {
        Some(reason) = fatal_rx.recv() => Shutdown::Fatal(reason),
        _ = stop => Shutdown::Signal,
    }
}

/// Resolves on SIGTERM or SIGINT.
fn termination_signals() -> Result<impl Future<Output = ()>> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sigint = signal(SignalKind::interrupt())?;
    Ok(async move {
        tokio::select! {
            _ = sigterm.recv() => info!("Received SIGTERM, shutting down"),
            _ = sigint.recv() => info!("Received SIGINT, shutting down"),
        }
    })
}

/// Binds the listener. The IPv6 wildcard falls back to the IPv4 wildcard
/// on hosts without IPv6.
async fn bind(addr: SocketAddr) -> Result<TcpListener> {
    match TcpListener::bind(addr).await {
        Ok(listener) => Ok(listener),
        Err(e) if addr.ip() == IpAddr::V6(Ipv6Addr::UNSPECIFIED) => {
            let fallback = SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), addr.port());
            warn!("Failed to listen on {}: {}, trying {}", addr, e, fallback);
            TcpListener::bind(fallback)
                .await
                .with_context(|| format!("Failed to listen on {}", fallback))
        }
        Err(e) => Err(e).with_context(|| format!("Failed to listen on {}", addr)),
    }
}

/// Serves `app` until `shutdown` resolves. Requests already in flight,
/// including the one that triggered a fatal shutdown, are answered before
/// this returns.
async fn serve(
    listener: TcpListener,
    app: Router,
    shutdown: impl Future<Output = Shutdown> + Send + 'static,
) -> Result<Shutdown> {
    let (reason_tx, reason_rx) = oneshot::channel();
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            let _ = reason_tx.send(shutdown.await);
        })
        .await
        .context("HTTP server failed")?;

    reason_rx.await.context("Server stopped without a shutdown reason")
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup logging
    let level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(level.parse()?))
        .init();

    let config = cli.load_config()?;
    let addr = config.listen_addr()?;

    // Open the sensor before serving; any failure here is fatal
    let sensor = sensors::open(&config.sensor).context("Failed to initialize sensor")?;

    let (fatal_tx, fatal_rx) = mpsc::channel::<String>(1);
    let state = Arc::new(AppState::new(sensor, config.on_read_error, fatal_tx));
    let shutdown = wait_for_shutdown(fatal_rx, termination_signals()?);

    let app = web::create_router(state.clone());
    let listener = bind(addr).await?;
    info!("Listening on http://{}", listener.local_addr()?);

    let result = match serve(listener, app, shutdown).await? {
        Shutdown::Signal => Ok(()),
        Shutdown::Fatal(reason) => {
            error!("Shutting down after sensor read failure");
            Err(anyhow!(reason))
        }
    };

    info!("{} read errors during this run", state.read_errors());
    // Closes the bus once the last reference to the state is gone
    drop(state);
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sensors::fake::FakeSensor;
    use std::time::Duration;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpStream;

    #[test]
    fn test_cli_defaults() {
        let cli = Cli::try_parse_from(["bme280-exporter"]).unwrap();
        let config = cli.load_config().unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.listen, ":9529");
    }

    #[test]
    fn test_cli_overrides() {
        let cli = Cli::try_parse_from([
            "bme280-exporter",
            "--listen-address",
            "127.0.0.1:9000",
            "--i2c-bus",
            "/dev/i2c-1",
            "--i2c-address",
            "0x77",
            "--on-read-error",
            "exit",
            "-v",
        ])
        .unwrap();
        assert!(cli.verbose);

        let config = cli.load_config().unwrap();
        assert_eq!(config.listen, "127.0.0.1:9000");
        assert_eq!(config.sensor.bus, "/dev/i2c-1");
        assert_eq!(config.sensor.address().unwrap(), 0x77);
        assert_eq!(config.on_read_error, ReadErrorPolicy::Exit);
    }

    #[test]
    fn test_cli_overrides_file() {
        let path = std::env::temp_dir().join(format!("bme280-cli-{}.toml", std::process::id()));
        std::fs::write(&path, "listen = \":9600\"\n[sensor]\nbus = \"/dev/i2c-3\"\n").unwrap();

        let cli = Cli::try_parse_from([
            "bme280-exporter",
            "--config",
            path.to_str().unwrap(),
            "--listen-address",
            ":9700",
        ])
        .unwrap();
        let config = cli.load_config().unwrap();
        std::fs::remove_file(&path).unwrap();

        assert_eq!(config.listen, ":9700");
        assert_eq!(config.sensor.bus, "/dev/i2c-3");
    }

    #[test]
    fn test_cli_rejects_unknown_policy() {
        assert!(Cli::try_parse_from(["bme280-exporter", "--on-read-error", "retry"]).is_err());
    }

    #[tokio::test]
    async fn test_bind_wildcard() {
        let listener = bind("[::]:0".parse().unwrap()).await.unwrap();
        let local = listener.local_addr().unwrap();
        assert!(local.ip().is_unspecified());
        assert_ne!(local.port(), 0);
    }

    #[tokio::test]
    async fn test_bind_in_use() {
        let taken = TcpListener::bind("127.0.0.1:0").await.unwrap();
        assert!(bind(taken.local_addr().unwrap()).await.is_err());
    }

    #[tokio::test]
    async fn test_wait_for_shutdown() {
        let (_fatal_tx, fatal_rx) = mpsc::channel(1);
        assert_eq!(
            wait_for_shutdown(fatal_rx, async {}).await,
            Shutdown::Signal
        );

        let (fatal_tx, fatal_rx) = mpsc::channel(1);
        fatal_tx.send("bus gone".to_string()).await.unwrap();
        assert_eq!(
            wait_for_shutdown(fatal_rx, std::future::pending()).await,
            Shutdown::Fatal("bus gone".to_string())
        );
    }

    /// Sends one request over a fresh connection and returns the raw response.
    async fn get(addr: SocketAddr, path: &str) -> String {
        let mut stream = TcpStream::connect(addr).await.unwrap();
        let request = format!(
            "GET {} HTTP/1.1\r\nHost: {}\r\nConnection: close\r\n\r\n",
            path, addr
        );
        stream.write_all(request.as_bytes()).await.unwrap();
        let mut response = String::new();
        stream.read_to_string(&mut response).await.unwrap();
        response
    }

    #[tokio::test]
    async fn test_fatal_read_error_is_answered_before_exit() {
        let (fatal_tx, fatal_rx) = mpsc::channel(1);
        let state = Arc::new(AppState::new(
            Box::new(FakeSensor::failing()),
            ReadErrorPolicy::Exit,
            fatal_tx,
        ));
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let server = tokio::spawn(serve(
            listener,
            web::create_router(state),
            wait_for_shutdown(fatal_rx, std::future::pending()),
        ));

        let response = get(addr, "/metrics").await;
        assert!(response.starts_with("HTTP/1.1 503"), "{}", response);
        assert!(!response.contains("bme280_temperature"));

        let stopped = tokio::time::timeout(Duration::from_secs(5), server)
            .await
            .expect("server did not stop")
            .unwrap()
            .unwrap();
        assert!(matches!(stopped, Shutdown::Fatal(_)));
    }

    #[tokio::test]
    async fn test_signal_stops_server() {
        let (fatal_tx, fatal_rx) = mpsc::channel(1);
        let state = Arc::new(AppState::new(
            Box::new(FakeSensor::returning(Default::default())),
            ReadErrorPolicy::FailRequest,
            fatal_tx,
        ));
        let (stop_tx, stop_rx) = oneshot::channel::<()>();
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let server = tokio::spawn(serve(
            listener,
            web::create_router(state),
            wait_for_shutdown(fatal_rx, async {
                let _ = stop_rx.await;
            }),
        ));

        assert!(get(addr, "/metrics").await.starts_with("HTTP/1.1 200"));
        stop_tx.send(()).unwrap();

        let stopped = tokio::time::timeout(Duration::from_secs(5), server)
            .await
            .expect("server did not stop")
            .unwrap()
            .unwrap();
        assert_eq!(stopped, Shutdown::Signal);
    }

    #[test]
    fn test_missing_config_file() {
        let cli = Cli::try_parse_from(["bme280-exporter", "--config", "/nonexistent/bme280.toml"])
            .unwrap();
        assert!(cli.load_config().is_err());
    }
}
