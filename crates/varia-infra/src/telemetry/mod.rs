//! Tracing subscriber initialization

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Filter used when neither `RUST_LOG` nor a caller default is set
pub const DEFAULT_FILTER: &str = "varia=debug";

/// Initialize tracing with an `EnvFilter` and a fmt layer.
///
/// `RUST_LOG` wins over `default_filter`. Returns `Ok(false)` when a global
/// subscriber was already installed, so calling this more than once is harmless.
pub fn init_telemetry(default_filter: Option<&str>) -> Result<bool, Box<dyn std::error::Error>> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(default_filter.unwrap_or(DEFAULT_FILTER))?,
    };

    let installed = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .try_init()
        .is_ok();

    if installed {
        tracing::debug!("Tracing initialized");
    }
    Ok(installed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_twice_is_harmless() {
        init_telemetry(Some("varia=info")).unwrap();
        assert!(!init_telemetry(None).unwrap());
    }

    #[test]
    fn test_invalid_default_filter() {
        if std::env::var("RUST_LOG").is_err() {
            assert!(init_telemetry(Some("varia=loud")).is_err());
        }
    }
}
