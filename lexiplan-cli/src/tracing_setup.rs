//! Logging for the lexiplan binary
//!
//! Console logs always go to stderr (`lexiplan tokenize` prints JSON on
//! stdout). With the `telemetry` feature and `--otel`, spans are also
//! exported over OTLP; the endpoint and service name come from
//! `OTEL_EXPORTER_OTLP_ENDPOINT` and `OTEL_SERVICE_NAME`.
//!
//! `RUST_LOG` overrides the built-in filter entirely.

use anyhow::{anyhow, Result};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// Log options taken from the global CLI flags
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingConfig {
    pub debug: bool,
    pub otel: bool,
}

impl TracingConfig {
    /// Filter used when `RUST_LOG` is unset.
    ///
    /// sqlx statement logging stays at warn unless `--debug` is given.
    fn default_directives(&self) -> &'static str {
        if self.debug {
            "debug,hyper=info,h2=info,tower=info"
        } else {
            "info,sqlx=warn"
        }
    }

    fn filter(&self) -> EnvFilter {
        EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(self.default_directives()))
    }
}

/// Flushes exported spans when dropped
#[must_use = "dropping the guard stops span export"]
pub struct TelemetryGuard {
    #[cfg(feature = "telemetry")]
    exporting: bool,
}

impl Drop for TelemetryGuard {
    fn drop(&mut self) {
        #[cfg(feature = "telemetry")]
        if self.exporting {
            opentelemetry::global::shutdown_tracer_provider();
        }
    }
}

/// Install the global subscriber.
pub fn init(config: TracingConfig) -> Result<TelemetryGuard> {
    let console = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(config.debug)
        .compact();
    let registry = tracing_subscriber::registry()
        .with(config.filter())
        .with(console);

    #[cfg(feature = "telemetry")]
    {
        let otel = if config.otel {
            Some(otel::layer()?)
        } else {
            None
        };
        let exporting = otel.is_some();
        registry.with(otel).try_init().map_err(|err| anyhow!(err))?;
        if exporting {
            tracing::info!(endpoint = %otel::endpoint(), "exporting spans over OTLP");
        }
        Ok(TelemetryGuard { exporting })
    }

    #[cfg(not(feature = "telemetry"))]
    {
        registry.try_init().map_err(|err| anyhow!(err))?;
        if config.otel {
            tracing::warn!("--otel ignored: built without the `telemetry` feature");
        }
        Ok(TelemetryGuard {})
    }
}

#[cfg(feature = "telemetry")]
mod otel {
    use anyhow::{anyhow, Result};
    use opentelemetry::trace::TracerProvider as _;
    use opentelemetry::KeyValue;
    use opentelemetry_otlp::WithExportConfig;
    use opentelemetry_sdk::trace::{Tracer, TracerProvider};
    use opentelemetry_sdk::{runtime, Resource};
    use tracing_opentelemetry::OpenTelemetryLayer;
    use tracing_subscriber::registry::LookupSpan;

    pub(super) fn endpoint() -> String {
        std::env::var("OTEL_EXPORTER_OTLP_ENDPOINT")
            .unwrap_or_else(|_| "http://localhost:4317".to_string())
    }

    fn service_name() -> String {
        std::env::var("OTEL_SERVICE_NAME").unwrap_or_else(|_| "lexiplan".to_string())
    }

    pub(super) fn layer<S>() -> Result<OpenTelemetryLayer<S, Tracer>>
    where
        S: tracing::Subscriber + for<'span> LookupSpan<'span>,
    {
        let exporter = opentelemetry_otlp::SpanExporter::builder()
            .with_tonic()
            .with_endpoint(endpoint())
            .build()
            .map_err(|e| anyhow!("failed to create OTLP exporter: {e}"))?;

        let provider = TracerProvider::builder()
            .with_batch_exporter(exporter, runtime::Tokio)
            .with_resource(Resource::new(vec![
                KeyValue::new("service.name", service_name()),
                KeyValue::new("service.version", env!("CARGO_PKG_VERSION")),
            ]))
            .build();
        let tracer = provider.tracer("lexiplan");
        // the global provider keeps the batch exporter alive
        let _ = opentelemetry::global::set_tracer_provider(provider);

        Ok(tracing_opentelemetry::layer().with_tracer(tracer))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quiet_sqlx_by_default() {
        let config = TracingConfig::default();
        assert_eq!(config.default_directives(), "info,sqlx=warn");
    }

    #[test]
    fn debug_keeps_http_stack_at_info() {
        let config = TracingConfig {
            debug: true,
            otel: false,
        };
        let directives = config.default_directives();
        assert!(directives.starts_with("debug,"));
        assert!(directives.contains("hyper=info"));
    }

    #[test]
    fn directives_parse() {
        for debug in [false, true] {
            let config = TracingConfig { debug, otel: false };
            assert!(config.default_directives().parse::<EnvFilter>().is_ok());
        }
    }
}
