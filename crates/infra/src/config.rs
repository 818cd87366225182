//! Engine configuration from environment variables.
//!
//! The binary loads `.env` first (dotenvy); this module only reads variables.

use reclaim_core::PostalAddress;
use tracing::warn;

pub const DEFAULT_HTTP_PORT: u16 = 8080;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum Environment {
    #[default]
    Development,
    Staging,
    Production,
}

impl Environment {
    pub fn as_str(self) -> &'static str {
        match self {
            Environment::Development => "development",
            Environment::Staging => "staging",
            Environment::Production => "production",
        }
    }

    fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "development" | "dev" => Some(Environment::Development),
            "staging" => Some(Environment::Staging),
            "production" | "prod" => Some(Environment::Production),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    pub http_port: u16,
    pub environment: Environment,
    /// Origin sent as `fromAddress` to the external tax service.
    pub ship_from: Option<PostalAddress>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            http_port: DEFAULT_HTTP_PORT,
            environment: Environment::Development,
            ship_from: None,
        }
    }
}

impl EngineConfig {
    /// `RECLAIM_HTTP_PORT`, `RECLAIM_ENVIRONMENT` and `RECLAIM_ORIGIN_*`.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`EngineConfig::from_env`] with an explicit variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(raw) = lookup("RECLAIM_HTTP_PORT") {
            match raw.trim().parse::<u16>() {
                Ok(port) => config.http_port = port,
                Err(_) => warn!(value = %raw, default = DEFAULT_HTTP_PORT, "invalid RECLAIM_HTTP_PORT; using default"),
            }
        }

        if let Some(raw) = lookup("RECLAIM_ENVIRONMENT") {
            match Environment::parse(&raw) {
                Some(env) => config.environment = env,
                None => warn!(value = %raw, "unknown RECLAIM_ENVIRONMENT; using development"),
            }
        }

        config.ship_from = ship_from(&lookup);
        config
    }
}

fn ship_from(lookup: &impl Fn(&str) -> Option<String>) -> Option<PostalAddress> {
    let field = |name: &str| {
        lookup(&format!("RECLAIM_ORIGIN_{name}"))
            .map(|v| v.trim().to_string())
            .unwrap_or_default()
    };

    let origin = PostalAddress {
        line1: field("LINE1"),
        city: field("CITY"),
        region: field("REGION"),
        postal_code: field("POSTAL_CODE"),
        country: field("COUNTRY"),
        ..PostalAddress::default()
    };

    if origin.missing_fields().len() == 5 {
        return None;
    }
    if !origin.is_complete() {
        warn!(missing = ?origin.missing_fields(), "incomplete RECLAIM_ORIGIN_* address; external tax requests carry no origin");
        return None;
    }
    Some(origin)
}
