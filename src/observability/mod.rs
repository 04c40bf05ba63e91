//! OpenTelemetry-based observability with file-based trace export.
//!
//! Spans from the `tracing` macros are bridged into OpenTelemetry and written
//! as OTLP JSON lines to a size-rotated file in the data directory:
//!
//! ```text
//! tracing → tracing-opentelemetry → OpenTelemetry SDK → OtlpFileExporter → gym-discovery-otlp.json
//! ```
//!
//! The filter level comes from `RUST_LOG` when set, otherwise from
//! [`Config::trace_level`](crate::Config::trace_level), defaulting to `info`.
//! With [`Config::log_to_stderr`](crate::Config::log_to_stderr) a plain `fmt`
//! layer also prints events to stderr.

mod exporter;
mod file_writer;
mod init;

pub use init::init_tracing;
