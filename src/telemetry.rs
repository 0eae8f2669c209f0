use tracing_subscriber::EnvFilter;

use crate::Error;

/// Installs the process-wide `tracing` subscriber. `RUST_LOG` wins over
/// `default_level` when it is set.
pub fn init(default_level: &str) -> Result<(), Error> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(default_level)
            .map_err(|err| Error::Telemetry(err.to_string()))?,
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init()
        .map_err(|err| Error::Telemetry(err.to_string()))
}
