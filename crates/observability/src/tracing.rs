//! Tracing subscriber initialization.
//!
//! JSON lines by default; `RECLAIM_LOG_FORMAT=pretty` for local development.
//! Filtering follows `RUST_LOG`.

use tracing_subscriber::EnvFilter;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Json,
    Pretty,
}

impl LogFormat {
    /// `json` or `pretty`, case-insensitive.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "json" => Some(LogFormat::Json),
            "pretty" | "text" => Some(LogFormat::Pretty),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObservabilityConfig {
    pub format: LogFormat,
    /// Filter used when `RUST_LOG` is unset or invalid.
    pub default_filter: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            format: LogFormat::Json,
            default_filter: "info".to_string(),
        }
    }
}

impl ObservabilityConfig {
    /// Reads `RECLAIM_LOG_FORMAT`; unknown values keep JSON.
    pub fn from_env() -> Self {
        Self::from_format_var(std::env::var("RECLAIM_LOG_FORMAT").ok().as_deref())
    }

    fn from_format_var(value: Option<&str>) -> Self {
        Self {
            format: value.and_then(LogFormat::parse).unwrap_or_default(),
            ..Self::default()
        }
    }
}

pub fn init_with(config: &ObservabilityConfig) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.default_filter));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_timer(tracing_subscriber::fmt::time::SystemTime);

    // try_init: a second call finds a global subscriber and does nothing.
    let _ = match config.format {
        LogFormat::Json => builder.json().with_target(false).try_init(),
        LogFormat::Pretty => builder.pretty().try_init(),
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_parsing() {
        assert_eq!(LogFormat::parse("PRETTY"), Some(LogFormat::Pretty));
        assert_eq!(LogFormat::parse(" json "), Some(LogFormat::Json));
        assert_eq!(LogFormat::parse("xml"), None);
    }

    #[test]
    fn unknown_format_keeps_json() {
        assert_eq!(ObservabilityConfig::from_format_var(Some("xml")).format, LogFormat::Json);
        assert_eq!(ObservabilityConfig::from_format_var(None), ObservabilityConfig::default());
    }

    #[test]
    fn init_twice_is_harmless() {
        init_with(&ObservabilityConfig::default());
        init_with(&ObservabilityConfig {
            format: LogFormat::Pretty,
            ..ObservabilityConfig::default()
        });
    }
}
