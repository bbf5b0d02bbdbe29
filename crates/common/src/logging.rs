use opentelemetry::trace::TracerProvider;
use opentelemetry_otlp::WithExportConfig;
use tracing::*;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, Layer};

use crate::env::get_env_nonempty;

pub const OTLP_URL_ENVVAR: &str = "CSWATCH_OTLP_URL";
pub const SVC_LABEL_ENVVAR: &str = "CSWATCH_SVC_LABEL";

/// Where log output goes and how the service names itself in it.
pub struct LoggerConfig {
    whoami: String,
    otel_url: Option<String>,
}

impl LoggerConfig {
    /// Builds the config for service `base` from `CSWATCH_SVC_LABEL` and
    /// `CSWATCH_OTLP_URL`.
    pub fn from_env(base: &str) -> Self {
        let label = get_env_nonempty(SVC_LABEL_ENVVAR);
        Self {
            whoami: whoami_string(base, label.as_deref()),
            otel_url: get_env_nonempty(OTLP_URL_ENVVAR),
        }
    }
}

/// Initializes the logging subsystem with the provided config.
///
/// When an OTLP url is set this must be called from inside a tokio runtime
/// context, the batch exporter spawns onto it.
pub fn init(config: LoggerConfig) {
    let filt = tracing_subscriber::EnvFilter::from_default_env();

    // Stdout logging.
    let stdout_sub = tracing_subscriber::fmt::layer().compact().with_filter(filt);

    // OpenTelemetry output.
    if let Some(otel_url) = &config.otel_url {
        let exporter = opentelemetry_otlp::new_exporter()
            .tonic()
            .with_endpoint(otel_url);

        let tp = opentelemetry_otlp::new_pipeline()
            .tracing()
            .with_exporter(exporter)
            .install_batch(opentelemetry_sdk::runtime::Tokio)
            .expect("init: opentelemetry");

        let tt = tp.tracer("cswatch-log");

        let otel_sub = tracing_opentelemetry::layer().with_tracer(tt);

        tracing_subscriber::registry()
            .with(stdout_sub)
            .with(otel_sub)
            .init();
    } else {
        tracing_subscriber::registry().with(stdout_sub).init();
    }

    info!(whoami = %config.whoami, "logging started");
    if let Some(url) = &config.otel_url {
        info!(%url, "using OpenTelemetry tracing output");
    }
}

/// Shuts down the logging subsystem, flushing any pending spans.
pub fn finalize() {
    info!("shutting down logging");
    opentelemetry::global::shutdown_tracer_provider();
}

fn whoami_string(base: &str, label: Option<&str>) -> String {
    match label {
        Some(label) => format!("{base}%{label}"),
        None => base.to_string(),
    }
}
