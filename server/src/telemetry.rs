use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

/// Installs the global subscriber. `RUST_LOG` overrides the default `info`
/// filter. Records from the `log` facade are bridged into tracing.
pub fn init_tracing(json: bool) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);

    if json {
        tracing::subscriber::set_global_default(
            registry.with(tracing_subscriber::fmt::layer().json()),
        )?;
    } else {
        tracing::subscriber::set_global_default(registry.with(tracing_subscriber::fmt::layer()))?;
    }

    tracing_log::LogTracer::init()?;
    Ok(())
}
