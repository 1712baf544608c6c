//! SEN5x Exporter Binary
//!
//! Polls a SEN5x air quality sensor and serves the readings to Prometheus.

use anyhow::{bail, Context};
use clap::{Args, Parser, Subcommand, ValueEnum};
use sen5x_exporter::{
    open_hardware_sensor, web::encode, MetricsServer, NoDataValue, Poller, Reading,
    SensorSource, ServerConfig, SharedSnapshot, SimulatedSensor, DEFAULT_I2C_BUS,
    DEFAULT_INTERVAL_MS, DEFAULT_PORT, DEFAULT_READ_TIMEOUT_MS,
};
use std::time::Duration;
use tracing::level_filters::LevelFilter;
use tracing::{debug, info};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// Attempts made by `snapshot` while the sensor warms up.
const SNAPSHOT_ATTEMPTS: u32 = 10;

#[derive(Parser)]
#[command(name = "sen5x_exporter")]
#[command(about = "SEN5x air quality exporter for Prometheus")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(author = "Austin Couch")]
#[command(long_about = "Samples a Sensirion SEN5x sensor and serves the latest reading in the Prometheus text format")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Metrics server bind address
    #[arg(long, default_value = "0.0.0.0")]
    host: String,

    /// Metrics server port
    #[arg(short, long, default_value_t = DEFAULT_PORT)]
    port: u16,

    /// Sensor sampling interval in milliseconds
    #[arg(short, long, default_value_t = DEFAULT_INTERVAL_MS)]
    interval: u64,

    /// Time a client has to send its request, in milliseconds
    #[arg(long, default_value_t = DEFAULT_READ_TIMEOUT_MS)]
    read_timeout: u64,

    /// Value reported for metrics without data
    #[arg(long, value_enum, default_value_t = NoDataValue::Zero)]
    no_data: NoDataValue,

    /// I2C bus the sensor is attached to
    #[arg(long, default_value_t = DEFAULT_I2C_BUS)]
    i2c_bus: u8,

    /// Use a simulated sensor instead of the I2C device
    #[arg(long)]
    simulate: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Poll the sensor and serve metrics (default)
    Serve,

    /// Take a single reading and exit
    Snapshot(SnapshotArgs),
}

#[derive(Args)]
struct SnapshotArgs {
    /// Output format
    #[arg(short, long, value_enum, default_value_t = SnapshotFormat::Pretty)]
    format: SnapshotFormat,
}

#[derive(Clone, Copy, ValueEnum)]
enum SnapshotFormat {
    Json,
    Pretty,
    Prometheus,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize tracing/logging
    init_logging(&cli)?;

    match &cli.command {
        Some(Commands::Snapshot(args)) => {
            snapshot_command(&cli, args).await?;
        }
        Some(Commands::Serve) | None => {
            print_banner();
            serve_command(&cli).await?;
        }
    }

    Ok(())
}

fn init_logging(cli: &Cli) -> anyhow::Result<()> {
    let level = if cli.debug {
        LevelFilter::DEBUG
    } else if cli.verbose {
        LevelFilter::INFO
    } else {
        LevelFilter::WARN
    };

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::builder()
                .with_default_directive(level.into())
                .from_env_lossy(),
        )
        .with_target(false)
        .compact()
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to install tracing subscriber")?;

    Ok(())
}

fn print_banner() {
    println!("SEN5x Exporter - Air Quality Metrics for Prometheus");
    println!("   Version: {}", env!("CARGO_PKG_VERSION"));
    println!();
}

fn server_config(cli: &Cli) -> ServerConfig {
    ServerConfig::new(&cli.host, cli.port)
        .with_io_timeout(Duration::from_millis(cli.read_timeout))
        .with_no_data(cli.no_data)
}

async fn serve_command(cli: &Cli) -> anyhow::Result<()> {
    info!("Starting SEN5x exporter...");

    let config = server_config(cli);
    let interval = Duration::from_millis(cli.interval);

    info!("Exporter configuration:");
    info!("  - Bind address: {}", config.bind_address());
    info!("  - Sampling interval: {}ms", cli.interval);
    info!("  - Read timeout: {}ms", cli.read_timeout);
    info!("  - No-data value: {:?}", cli.no_data);

    if cli.simulate {
        info!("Using simulated sensor");
        run_exporter(SimulatedSensor::new(), interval, config).await
    } else {
        info!("Using SEN5x on I2C bus {}", cli.i2c_bus);
        let sensor = open_hardware_sensor(cli.i2c_bus).context("Failed to open SEN5x sensor")?;
        run_exporter(sensor, interval, config).await
    }
}

async fn run_exporter<S>(source: S, interval: Duration, config: ServerConfig) -> anyhow::Result<()>
where
    S: SensorSource + Send + 'static,
{
    let poller = Poller::new(source, interval)?;
    let snapshot = SharedSnapshot::new();

    let server = MetricsServer::bind(config, snapshot.clone())
        .await
        .context("Failed to start metrics server")?;
    let poller_task = tokio::spawn(poller.run(snapshot));

    tokio::select! {
        _ = server.run() => {}
        result = tokio::signal::ctrl_c() => {
            result.context("Failed to listen for shutdown signal")?;
            info!("Shutting down");
        }
    }

    // Dropping the poller's source stops sensor measurement on the blocking pool.
    poller_task.abort();
    let _ = poller_task.await;

    Ok(())
}

async fn snapshot_command(cli: &Cli, args: &SnapshotArgs) -> anyhow::Result<()> {
    let reading = if cli.simulate {
        first_reading(SimulatedSensor::new()).await?
    } else {
        let sensor = open_hardware_sensor(cli.i2c_bus).context("Failed to open SEN5x sensor")?;
        first_reading(sensor).await?
    };

    match args.format {
        SnapshotFormat::Json => {
            let json = serde_json::to_string_pretty(&reading)?;
            println!("{}", json);
        }
        SnapshotFormat::Pretty => {
            print_pretty_reading(&reading);
        }
        SnapshotFormat::Prometheus => {
            print!("{}", encode(Some(&reading), cli.no_data));
        }
    }

    Ok(())
}

/// Wait for the sensor's first valid measurement.
async fn first_reading<S: SensorSource>(mut source: S) -> anyhow::Result<Reading> {
    for attempt in 1..=SNAPSHOT_ATTEMPTS {
        match source.read_reading().await {
            Ok(reading) => return Ok(reading),
            Err(e) => {
                debug!(attempt, "Reading not available yet: {}", e);
                tokio::time::sleep(Duration::from_secs(1)).await;
            }
        }
    }

    bail!("No reading from sensor after {} attempts", SNAPSHOT_ATTEMPTS)
}

fn print_optional(label: &str, value: Option<f32>, unit: &str) {
    match value {
        Some(value) => println!("  {}: {:.1}{}", label, value, unit),
        None => println!("  {}: n/a", label),
    }
}

fn print_pretty_reading(reading: &Reading) {
    println!(
        "SEN5x Reading ({})",
        chrono::DateTime::from_timestamp_millis(reading.timestamp as i64)
            .unwrap_or_default()
            .format("%Y-%m-%d %H:%M:%S UTC")
    );
    println!("==========================================");
    println!();

    println!("Particulate Matter:");
    println!("  PM1.0: {:.1} µg/m³", reading.pm1_0);
    println!("  PM2.5: {:.1} µg/m³", reading.pm2_5);
    println!("  PM4.0: {:.1} µg/m³", reading.pm4_0);
    println!("  PM10: {:.1} µg/m³", reading.pm10_0);
    println!();

    println!("Climate:");
    print_optional("Humidity", reading.humidity, " %RH");
    print_optional("Temperature", reading.temperature, " °C");
    println!();

    println!("Gas Indices:");
    println!("  VOC: {:.0}", reading.voc);
    print_optional("NOx", reading.nox, "");
}
