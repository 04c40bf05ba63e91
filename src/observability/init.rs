//! Tracing initialization and subscriber setup.

use super::exporter::{self, SCOPE_NAME};
use crate::infrastructure::get_data_dir;
use crate::Config;
use opentelemetry::trace::TracerProvider as _;
use opentelemetry::KeyValue;
use opentelemetry_sdk::resource::Resource;
use tracing_opentelemetry::OpenTelemetryLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// File name of the OTLP trace file inside the data directory.
pub const TRACE_FILE: &str = "gym-discovery-otlp.json";

/// Installs the global tracing subscriber.
///
/// Layers, in order: an [`EnvFilter`] (`RUST_LOG`, else `config.trace_level`,
/// else `info`), the OpenTelemetry file exporter, and an optional stderr `fmt`
/// layer. If the data directory cannot be created the file exporter is left
/// out; observability never stops the client from starting.
///
/// Only the first call in a process takes effect. Returns whether this call
/// installed the subscriber.
///
/// # Example
///
/// ```rust
/// use gym_discovery::observability::init_tracing;
/// use gym_discovery::Config;
///
/// let config = Config {
///     trace_level: Some("debug".to_string()),
///     data_dir: Some(std::env::temp_dir().join("gym-discovery-doc").display().to_string()),
///     ..Default::default()
/// };
/// init_tracing(&config);
/// tracing::debug!("tracing is now active");
/// ```
pub fn init_tracing(config: &Config) -> bool {
    let level = config.trace_level.as_deref().unwrap_or("info");
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let data_dir = get_data_dir(config.data_dir.as_deref());
    let otel_layer = std::fs::create_dir_all(&data_dir).ok().map(|()| {
        let resource = Resource::new(vec![
            KeyValue::new("service.name", SCOPE_NAME),
            KeyValue::new("service.version", env!("CARGO_PKG_VERSION")),
        ]);
        let provider = exporter::create_tracer_provider(data_dir.join(TRACE_FILE), resource);
        OpenTelemetryLayer::new(provider.tracer(SCOPE_NAME))
    });

    let stderr_layer = config
        .log_to_stderr
        .then(|| tracing_subscriber::fmt::layer().with_writer(std::io::stderr));

    tracing_subscriber::registry()
        .with(filter)
        .with(otel_layer)
        .with(stderr_layer)
        .try_init()
        .is_ok()
}
