use clap::Parser;
use color_eyre::Result;
use system_monitor_agent::{
    config::{
        AgentConfig,
        DEFAULT_TOP_PROCESSES,
    },
    Assembler,
    DeliveryClient,
};
use tracing::{
    info,
    warn,
};

#[derive(Parser)]
#[command(name = "system-monitor-agent")]
#[command(about = "Samples host telemetry and ships it to the collector")]
#[command(version)]
struct Cli {
    /// Collector base URL
    #[arg(
        long,
        env = "SYSTEM_MONITOR_COLLECTOR_URL",
        default_value = "http://localhost:8080"
    )]
    collector_url: String,

    /// Sampling interval (e.g. "5s", "1m")
    #[arg(long, env = "SYSTEM_MONITOR_INTERVAL", default_value = "5s")]
    interval: String,

    /// How many processes a snapshot carries at most
    #[arg(long, default_value_t = DEFAULT_TOP_PROCESSES)]
    top_processes: usize,

    /// Monitoring service endpoint queried first for GPU load
    #[arg(
        long,
        env = "SYSTEM_MONITOR_GPU_SERVICE_URL",
        default_value = "http://localhost:8085/data.json"
    )]
    gpu_service_url: String,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(format!("system_monitor_agent={log_level}"))
        .init();

    color_eyre::install()?;

    let interval = humantime::parse_duration(&cli.interval)
        .map_err(|e| eyre::eyre!("Invalid interval '{}': {}", cli.interval, e))?;

    let config = AgentConfig::new(cli.collector_url, interval, cli.top_processes, cli.gpu_service_url)?;

    info!("Starting system monitor agent");
    info!("Collector URL: {}", config.collector_url);
    info!("Sampling interval: {:?}", config.interval);

    let mut assembler = Assembler::from_config(&config);
    let client = DeliveryClient::new(&config.collector_url)?;

    // One cycle at a time: collect, deliver, sleep. A slow source delays
    // the cycle but cycles never overlap.
    loop {
        let snapshot = assembler.assemble().await;
        info!(
            "Collected snapshot: CPU={:.1}%, GPU={:.1}%, processes={}",
            snapshot.cpu_load,
            snapshot.gpu_load,
            snapshot.top_processes.len()
        );

        if let Err(e) = client.deliver(&snapshot).await {
            warn!(error = %e, "delivery failed, dropping snapshot");
        }

        tokio::time::sleep(config.interval).await;
    }
}
