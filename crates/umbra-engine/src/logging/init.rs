use std::sync::Once;

/// Default filter when neither an explicit filter nor `RUST_LOG` is set.
///
/// wgpu internals are chatty at `info`; keep them at `warn`.
const DEFAULT_FILTER: &str = "info,wgpu_core=warn,wgpu_hal=warn,naga=warn";

/// Logger configuration.
///
/// `env_filter` follows the `env_logger` filter syntax (e.g. "info", "warn",
/// "umbra_engine=debug,wgpu=warn").
///
/// `write_style` controls ANSI coloring behavior.
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    pub env_filter: Option<String>,
    pub write_style: env_logger::WriteStyle,
}

impl LoggingConfig {
    /// Debug-level output for the engine crates, `warn` for the graphics stack.
    pub fn verbose() -> Self {
        Self {
            env_filter: Some("warn,umbra_engine=debug,umbra_demo=debug".to_string()),
            ..Self::default()
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            env_filter: None,
            write_style: env_logger::WriteStyle::Auto,
        }
    }
}

static INIT: Once = Once::new();

/// Initializes the global logger once.
///
/// Idempotent; later calls are ignored. Call early in `main`.
pub fn init_logging(config: LoggingConfig) {
    INIT.call_once(|| {
        let mut builder = env_logger::Builder::new();

        match config.env_filter {
            Some(filter) => {
                builder.parse_filters(&filter);
            }
            None => match std::env::var("RUST_LOG") {
                Ok(filter) => {
                    builder.parse_filters(&filter);
                }
                Err(_) => {
                    builder.parse_filters(DEFAULT_FILTER);
                }
            },
        }

        builder.write_style(config.write_style);
        builder.format_timestamp_millis();

        builder.init();

        log::debug!("logging initialized");
    });
}
