use anyhow::Result;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Environment variable holding the log filter, e.g. `SV_LOG=debug`
pub const LOG_ENV: &str = "SV_LOG";

/// Initialize logging for the `sv` binary.
///
/// Logs always go to stderr; stdout carries command output and the `time`
/// pass-through stream. The filter comes from `SV_LOG` and defaults to `warn`.
/// With `json` set, events are emitted as structured JSON lines.
pub fn init_telemetry(json: bool) -> Result<()> {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    let registry = tracing_subscriber::registry().with(filter);

    if json {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_current_span(true)
                    .with_writer(std::io::stderr),
            )
            .try_init()?;
    } else {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(false)
                    .with_writer(std::io::stderr),
            )
            .try_init()?;
    }

    tracing::debug!(json, "Telemetry initialized");
    Ok(())
}
