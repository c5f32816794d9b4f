//! GPU load resolution with tiered fallback.
//!
//! GPU monitoring backends are commonly unavailable (no monitoring daemon
//! running, no admin rights), so resolution tries an ordered chain of
//! strategies and short-circuits on the first success. Exhausting the chain
//! yields an aggregate error; the assembler treats that as "no GPU data".

use crate::sources::SourceError;
use serde::Deserialize;
use std::{
    future::Future,
    pin::Pin,
    time::Duration,
};
use tokio::process::Command;
use tracing::debug;

/// Request timeout for the local monitoring service probe.
const SERVICE_TIMEOUT: Duration = Duration::from_secs(2);

/// Hard ceiling on the performance-counter subprocess.
const COUNTER_TIMEOUT: Duration = Duration::from_secs(3);

const COUNTER_PROGRAM: &str = "powershell";
const COUNTER_QUERY: &str = "Get-Counter '\\GPU Engine(*)\\Utilization Percentage' \
     | Select-Object -ExpandProperty CounterSamples \
     | Where-Object { $_.InstanceName -like '*3D*' } \
     | Select-Object -First 1 -ExpandProperty CookedValue";

/// One way of obtaining a GPU load percentage.
pub trait GpuStrategy: Send + Sync {
    fn name(&self) -> &'static str;

    /// Attempt resolution. Failures stay internal to the resolver; only the
    /// exhausted chain surfaces to the caller.
    fn attempt(&self) -> Pin<Box<dyn Future<Output = Result<f64, SourceError>> + Send + '_>>;
}

/// A sensor reading as reported by the monitoring service.
#[derive(Debug, Deserialize)]
pub(crate) struct SensorReading {
    #[serde(rename = "Text", default)]
    text: String,
    #[serde(rename = "Value", default)]
    value: serde_json::Value,
}

/// Scan sensor readings for the GPU core load and coerce its value.
///
/// The match is a case-sensitive substring test for "GPU Core" and "Load",
/// mirroring OpenHardwareMonitor's English sensor labels. Known fragility
/// with localized or vendor-renamed sensors; kept as the established
/// matching policy. A matching sensor whose value cannot be coerced is
/// skipped in favor of later matches.
pub(crate) fn extract_gpu_load(sensors: &[SensorReading]) -> Option<f64> {
    sensors
        .iter()
        .filter(|s| s.text.contains("GPU Core") && s.text.contains("Load"))
        .find_map(|s| coerce_value(&s.value))
}

/// Sensor values arrive either as numbers or numeric strings.
fn coerce_value(value: &serde_json::Value) -> Option<f64> {
    match value {
        serde_json::Value::Number(n) => n.as_f64(),
        serde_json::Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Strategy 1: query the local hardware monitoring HTTP service.
pub struct MonitorServiceStrategy {
    client: reqwest::Client,
    url: String,
}

impl MonitorServiceStrategy {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            url: url.into(),
        }
    }

    async fn query(&self) -> Result<f64, SourceError> {
        let response = self
            .client
            .get(&self.url)
            .timeout(SERVICE_TIMEOUT)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(SourceError::ServiceStatus(status));
        }

        let sensors: Vec<SensorReading> = response.json().await?;
        extract_gpu_load(&sensors).ok_or(SourceError::SensorNotFound)
    }
}

impl GpuStrategy for MonitorServiceStrategy {
    fn name(&self) -> &'static str {
        "monitor-service"
    }

    fn attempt(&self) -> Pin<Box<dyn Future<Output = Result<f64, SourceError>> + Send + '_>> {
        Box::pin(self.query())
    }
}

/// Strategy 2: invoke the OS performance-counter query as a subprocess and
/// parse the first sampled value from stdout.
pub struct PerfCounterStrategy {
    program: String,
    args: Vec<String>,
    timeout: Duration,
}

impl PerfCounterStrategy {
    pub fn new() -> Self {
        Self {
            program: COUNTER_PROGRAM.to_string(),
            args: vec!["-Command".to_string(), COUNTER_QUERY.to_string()],
            timeout: COUNTER_TIMEOUT,
        }
    }

    /// Substitute the counter command, e.g. with a stub in tests.
    pub fn with_command(program: impl Into<String>, args: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
            timeout: COUNTER_TIMEOUT,
        }
    }

    async fn query(&self) -> Result<f64, SourceError> {
        let output = tokio::time::timeout(
            self.timeout,
            Command::new(&self.program)
                .args(&self.args)
                .kill_on_drop(true)
                .output(),
        )
        .await
        .map_err(|_| SourceError::CounterTimeout(self.timeout))??;

        if !output.status.success() {
            return Err(SourceError::CounterStatus(output.status));
        }

        let text = String::from_utf8_lossy(&output.stdout).trim().to_string();
        if text.is_empty() {
            return Err(SourceError::CounterEmptyOutput);
        }
        text.parse().map_err(|_| SourceError::CounterNotNumeric(text))
    }
}

impl Default for PerfCounterStrategy {
    fn default() -> Self {
        Self::new()
    }
}

impl GpuStrategy for PerfCounterStrategy {
    fn name(&self) -> &'static str {
        "perf-counter"
    }

    fn attempt(&self) -> Pin<Box<dyn Future<Output = Result<f64, SourceError>> + Send + '_>> {
        Box::pin(self.query())
    }
}

/// Tries each strategy in fixed priority order; first success wins.
pub struct GpuResolver {
    strategies: Vec<Box<dyn GpuStrategy>>,
}

impl GpuResolver {
    /// The standard chain: monitoring service first, performance counters
    /// as fallback.
    pub fn new(monitor_service_url: &str) -> Self {
        Self::from_strategies(vec![
            Box::new(MonitorServiceStrategy::new(monitor_service_url)),
            Box::new(PerfCounterStrategy::new()),
        ])
    }

    pub fn from_strategies(strategies: Vec<Box<dyn GpuStrategy>>) -> Self {
        Self { strategies }
    }

    /// Resolve a GPU load percentage, or an aggregate error naming every
    /// strategy's failure once the chain is exhausted.
    pub async fn resolve(&self) -> Result<f64, SourceError> {
        let mut failures = Vec::with_capacity(self.strategies.len());

        for strategy in &self.strategies {
            match strategy.attempt().await {
                Ok(load) => return Ok(load),
                Err(e) => {
                    debug!(strategy = strategy.name(), error = %e, "GPU strategy failed");
                    failures.push(format!("{}: {}", strategy.name(), e));
                }
            }
        }

        Err(SourceError::Exhausted(failures.join("; ")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        routing::get,
        Json,
        Router,
    };
    use pretty_assertions::assert_eq;

    fn sensor(text: &str, value: serde_json::Value) -> SensorReading {
        SensorReading {
            text: text.to_string(),
            value,
        }
    }

    #[test]
    fn sensor_match_requires_both_label_parts() {
        let sensors = vec![
            sensor("CPU Core #0 Load", serde_json::json!(99.0)),
            sensor("GPU Core #0 Clock", serde_json::json!(1200.0)),
            sensor("GPU Core #0 Load", serde_json::json!(42.5)),
        ];
        assert_eq!(extract_gpu_load(&sensors), Some(42.5));
    }

    #[test]
    fn numeric_string_values_are_coerced() {
        let sensors = vec![sensor("GPU Core Load", serde_json::json!("42.5"))];
        assert_eq!(extract_gpu_load(&sensors), Some(42.5));
    }

    #[test]
    fn uncoercible_match_is_skipped_for_a_later_one() {
        let sensors = vec![
            sensor("GPU Core #0 Load", serde_json::json!(null)),
            sensor("GPU Core #1 Load", serde_json::json!(7.0)),
        ];
        assert_eq!(extract_gpu_load(&sensors), Some(7.0));
    }

    #[test]
    fn no_matching_sensor_yields_none() {
        let sensors = vec![sensor("GPU Memory", serde_json::json!(55.0))];
        assert_eq!(extract_gpu_load(&sensors), None);
    }

    async fn spawn_stub(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{addr}")
    }

    /// An address nothing listens on; bound then immediately released.
    async fn dead_endpoint() -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);
        format!("http://{addr}/data.json")
    }

    #[tokio::test]
    async fn service_hit_short_circuits_the_chain() {
        let router = Router::new().route(
            "/data.json",
            get(|| async {
                Json(serde_json::json!([
                    { "Text": "GPU Core #0 Load", "Value": 42.5 }
                ]))
            }),
        );
        let base = spawn_stub(router).await;

        // The counter stub would report 99 if it were ever consulted.
        let resolver = GpuResolver::from_strategies(vec![
            Box::new(MonitorServiceStrategy::new(format!("{base}/data.json"))),
            Box::new(PerfCounterStrategy::with_command("echo", ["99"])),
        ]);

        assert_eq!(resolver.resolve().await.unwrap(), 42.5);
    }

    #[tokio::test]
    async fn unreachable_service_falls_back_to_the_counter() {
        let resolver = GpuResolver::from_strategies(vec![
            Box::new(MonitorServiceStrategy::new(dead_endpoint().await)),
            Box::new(PerfCounterStrategy::with_command("echo", ["17.3"])),
        ]);

        assert_eq!(resolver.resolve().await.unwrap(), 17.3);
    }

    #[tokio::test]
    async fn exhausted_chain_reports_every_failure() {
        let resolver = GpuResolver::from_strategies(vec![
            Box::new(MonitorServiceStrategy::new(dead_endpoint().await)),
            Box::new(PerfCounterStrategy::with_command("echo", Vec::<String>::new())),
        ]);

        let err = resolver.resolve().await.unwrap_err();
        match err {
            SourceError::Exhausted(detail) => {
                assert!(detail.contains("monitor-service"));
                assert!(detail.contains("perf-counter"));
            }
            other => panic!("expected Exhausted, got {other}"),
        }
    }

    #[tokio::test]
    async fn empty_counter_output_is_a_failure() {
        let strategy = PerfCounterStrategy::with_command("true", Vec::<String>::new());
        assert!(matches!(
            strategy.attempt().await,
            Err(SourceError::CounterEmptyOutput)
        ));
    }

    #[tokio::test]
    async fn non_numeric_counter_output_is_a_failure() {
        let strategy = PerfCounterStrategy::with_command("echo", ["not-a-number"]);
        assert!(matches!(
            strategy.attempt().await,
            Err(SourceError::CounterNotNumeric(_))
        ));
    }
}
