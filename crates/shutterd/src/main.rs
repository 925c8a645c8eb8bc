// # shutterd - Roller Shutter Daemon
//
// Thin integration layer. All synchronization logic lives in shutter-core;
// this binary only:
// 1. Reads configuration from environment variables
// 2. Initializes logging and the runtime
// 3. Registers device drivers
// 4. Starts every shutter and waits for a shutdown signal
//
// ## Configuration
//
// - `SHUTTER_NAME`: Installation name (default: "shutter")
// - `SHUTTER_DEVICES`: Comma-separated `name=address` pairs, or a single bare
//   address for a one-device installation
// - `SHUTTER_REVERSE_DIRECTIONS`: `true` to invert the 0..100 scale
// - `SHUTTER_POLL_INTERVAL_MS`: Delay after a successful poll (default: 3030)
// - `SHUTTER_FAILURE_DELAY_MS`: Delay after a failed poll (default: 3000)
// - `SHUTTER_REQUEST_TIMEOUT_SECS`: Per-request timeout (default: 30)
// - `SHUTTER_LOG_LEVEL`: trace, debug, info, warn, error (default: info)
//
// ## Example
//
// ```bash
// export SHUTTER_NAME=living
// export SHUTTER_DEVICES=left=http://192.168.1.40,right=http://192.168.1.41
// export SHUTTER_REVERSE_DIRECTIONS=true
//
// shutterd
// ```

use anyhow::{Context, Result};
use shutter_core::{
    DeviceConfig, DriverRegistry, PollConfig, ShutterConfig, ShutterDirectory, TransportConfig,
    position_changes,
};
use std::env;
use std::process::ExitCode;
use tokio_stream::StreamExt;
use tracing::{Level, error, info};
use tracing_subscriber::FmtSubscriber;

#[cfg(unix)]
use tokio::signal::unix::{SignalKind, signal};

/// Exit codes for different termination scenarios
///
/// These codes follow systemd conventions:
/// - 0: Clean shutdown
/// - 1: Configuration or startup error
/// - 2: Runtime error (unexpected)
#[derive(Debug, Clone, Copy)]
enum ShutterExitCode {
    /// Clean shutdown (normal exit)
    CleanShutdown = 0,
    /// Configuration error or startup failure
    ConfigError = 1,
    /// Runtime error (unexpected failure)
    RuntimeError = 2,
}

impl From<ShutterExitCode> for ExitCode {
    fn from(code: ShutterExitCode) -> Self {
        ExitCode::from(code as u8)
    }
}

/// Daemon configuration as read from the environment
struct Config {
    shutter: ShutterConfig,
    log_level: String,
}

impl Config {
    /// Load configuration from environment variables
    fn from_env() -> Result<Self> {
        let name = env::var("SHUTTER_NAME").unwrap_or_else(|_| "shutter".to_string());
        let devices = parse_devices(&env::var("SHUTTER_DEVICES").unwrap_or_default())?;

        let reverse_directions = match env::var("SHUTTER_REVERSE_DIRECTIONS") {
            Ok(value) => parse_bool(&value)
                .with_context(|| format!("SHUTTER_REVERSE_DIRECTIONS '{value}' is not a boolean"))?,
            Err(_) => false,
        };

        let defaults = PollConfig::default();
        let poll = PollConfig {
            poll_interval_ms: env_number("SHUTTER_POLL_INTERVAL_MS", defaults.poll_interval_ms)?,
            failure_delay_ms: env_number("SHUTTER_FAILURE_DELAY_MS", defaults.failure_delay_ms)?,
        };

        let transport = TransportConfig {
            request_timeout_secs: env_number(
                "SHUTTER_REQUEST_TIMEOUT_SECS",
                TransportConfig::default().request_timeout_secs,
            )?,
        };

        Ok(Self {
            shutter: ShutterConfig {
                name,
                devices,
                reverse_directions,
                poll,
                transport,
            },
            log_level: env::var("SHUTTER_LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
        })
    }

    /// Validate the configuration
    fn validate(&self) -> Result<()> {
        if self.shutter.devices.is_empty() {
            anyhow::bail!(
                "SHUTTER_DEVICES must name at least one device. \
                Set it via: export SHUTTER_DEVICES=left=http://192.168.1.40"
            );
        }

        self.shutter.validate()?;

        match self.log_level.to_lowercase().as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            _ => anyhow::bail!(
                "SHUTTER_LOG_LEVEL '{}' is not valid. \
                Valid levels: trace, debug, info, warn, error",
                self.log_level
            ),
        }

        Ok(())
    }
}

/// Parse `name=address` pairs; a lone bare address becomes device "main"
fn parse_devices(raw: &str) -> Result<Vec<DeviceConfig>> {
    let entries: Vec<&str> = raw
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect();

    if let [single] = entries.as_slice()
        && !single.contains('=')
    {
        return Ok(vec![DeviceConfig::new("main", *single)]);
    }

    entries
        .into_iter()
        .map(|entry| match entry.split_once('=') {
            Some((name, address)) => Ok(DeviceConfig::new(name.trim(), address.trim())),
            None => anyhow::bail!(
                "SHUTTER_DEVICES entry '{}' must be name=address when several devices are listed",
                entry
            ),
        })
        .collect()
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

fn env_number(key: &str, default: u64) -> Result<u64> {
    match env::var(key) {
        Ok(value) => value
            .trim()
            .parse()
            .with_context(|| format!("{key} '{value}' is not a number")),
        Err(_) => Ok(default),
    }
}

fn main() -> ExitCode {
    let config = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Configuration error: {:#}", e);
            return ShutterExitCode::ConfigError.into();
        }
    };

    if let Err(e) = config.validate() {
        eprintln!("Configuration validation error: {:#}", e);
        return ShutterExitCode::ConfigError.into();
    }

    let log_level = match config.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder().with_max_level(log_level).finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
        return ShutterExitCode::ConfigError.into();
    }

    info!("Starting shutterd daemon");
    info!(
        "Configuration loaded: {} device(s), reverse_directions={}",
        config.shutter.devices.len(),
        config.shutter.reverse_directions
    );

    let rt = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to create tokio runtime: {}", e);
            return ShutterExitCode::RuntimeError.into();
        }
    };

    let result = rt.block_on(async {
        if let Err(e) = run_daemon(config).await {
            error!("Daemon error: {:#}", e);
            ShutterExitCode::RuntimeError
        } else {
            ShutterExitCode::CleanShutdown
        }
    });

    result.into()
}

/// Run the daemon until a shutdown signal arrives
async fn run_daemon(config: Config) -> Result<()> {
    let registry = DriverRegistry::new();

    #[cfg(feature = "shelly")]
    {
        info!("Registering Shelly drivers");
        shutter_shelly::register(&registry, &config.shutter.transport);
    }

    info!("Drivers available: {}", registry.list_drivers().join(", "));

    let directory = ShutterDirectory::from_config(&config.shutter, &registry)
        .context("Failed to build shutters")?;

    for shutter in directory.iter() {
        let name = shutter.name().to_string();
        let mut changes = position_changes(shutter);
        tokio::spawn(async move {
            while let Some(position) = changes.next().await {
                info!("{} is now at {}", name, position);
            }
        });
    }

    directory.start_all();
    info!("Daemon initialized successfully");

    let signal = wait_for_shutdown().await;
    directory.stop_all();

    let signal = signal?;
    info!("Received shutdown signal: {}", signal);
    info!("Shutting down daemon");

    Ok(())
}

/// Wait for shutdown signals (SIGTERM, SIGINT)
#[cfg(unix)]
async fn wait_for_shutdown() -> Result<&'static str> {
    let mut sigterm = signal(SignalKind::terminate())
        .map_err(|e| anyhow::anyhow!("Failed to setup SIGTERM handler: {}", e))?;
    let mut sigint = signal(SignalKind::interrupt())
        .map_err(|e| anyhow::anyhow!("Failed to setup SIGINT handler: {}", e))?;

    let name = tokio::select! {
        _ = sigterm.recv() => "SIGTERM",
        _ = sigint.recv() => "SIGINT",
    };
    Ok(name)
}

/// Wait for CTRL-C
///
/// Fallback implementation for non-Unix platforms.
#[cfg(not(unix))]
async fn wait_for_shutdown() -> Result<&'static str> {
    tokio::signal::ctrl_c()
        .await
        .map_err(|e| anyhow::anyhow!("Failed to wait for CTRL-C: {}", e))?;
    Ok("SIGINT")
}
