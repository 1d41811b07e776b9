//! Value types for option resolution.
//!
//! [`Parameters`] is the caller-facing set of recognised options. It is
//! designed to be deserialised with figment so that parameters can come from
//! code and from TOML files alike; anything that can be invalid is kept as a
//! string and validated during resolution.

use crate::env::{CONTAINER, Environment, SITE_NAME};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::level_filters::LevelFilter;

/// OTLP export protocol.
///
/// Only HTTP with protobuf encoding is supported; the enum stays closed so
/// that adding a transport is a compile-time change for every match.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Protocol {
    /// HTTP with Protocol Buffers encoding (`http/protobuf`).
    #[default]
    #[serde(rename = "http/protobuf")]
    HttpProtobuf,
}

impl Protocol {
    /// Every supported protocol.
    pub const ALL: [Protocol; 1] = [Protocol::HttpProtobuf];

    /// Returns the wire name of the protocol.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Protocol::HttpProtobuf => "http/protobuf",
        }
    }

    /// Whether endpoints for this protocol carry a per-signal URL path.
    #[must_use]
    pub fn uses_signal_path(&self) -> bool {
        match self {
            Protocol::HttpProtobuf => true,
        }
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a string names no supported protocol.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unsupported OTLP exporter protocol {0:?}, must be one of [\"http/protobuf\"]")]
pub struct UnsupportedProtocol(pub String);

impl FromStr for Protocol {
    type Err = UnsupportedProtocol;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Protocol::ALL
            .into_iter()
            .find(|protocol| protocol.as_str() == s)
            .ok_or_else(|| UnsupportedProtocol(s.to_string()))
    }
}

/// Log level for the subscriber installed by the distro.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum LogLevel {
    /// Everything, including trace-level events.
    NotSet,
    /// Debug and above.
    Debug,
    /// Info and above.
    Info,
    /// Warnings and above.
    Warning,
    /// Errors only.
    #[default]
    Error,
    /// Critical errors; `tracing` has no level above error so this filters like [`LogLevel::Error`].
    Critical,
}

impl LogLevel {
    /// Returns the canonical upper-case name.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::NotSet => "NOTSET",
            LogLevel::Debug => "DEBUG",
            LogLevel::Info => "INFO",
            LogLevel::Warning => "WARNING",
            LogLevel::Error => "ERROR",
            LogLevel::Critical => "CRITICAL",
        }
    }

    /// Maps the level onto a `tracing` filter.
    #[must_use]
    pub fn level_filter(&self) -> LevelFilter {
        match self {
            LogLevel::NotSet => LevelFilter::TRACE,
            LogLevel::Debug => LevelFilter::DEBUG,
            LogLevel::Info => LevelFilter::INFO,
            LogLevel::Warning => LevelFilter::WARN,
            LogLevel::Error | LogLevel::Critical => LevelFilter::ERROR,
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a string names no recognised log level.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unrecognised log level {0:?}")]
pub struct UnknownLogLevel(pub String);

impl FromStr for LogLevel {
    type Err = UnknownLogLevel;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "NOTSET" => Ok(LogLevel::NotSet),
            "DEBUG" => Ok(LogLevel::Debug),
            "INFO" => Ok(LogLevel::Info),
            "WARNING" => Ok(LogLevel::Warning),
            "ERROR" => Ok(LogLevel::Error),
            "CRITICAL" => Ok(LogLevel::Critical),
            _ => Err(UnknownLogLevel(s.to_string())),
        }
    }
}

/// Coarse classification of where the process runs.
///
/// Only used to pick the default endpoint and insecure flag.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Deployment {
    /// Containerised platform, with a collector sidecar on localhost.
    Tap,
    /// Store hosts.
    Stores,
    /// Neither probe matched.
    #[default]
    Unknown,
}

/// Per-deployment defaults.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeploymentDefaults {
    /// Base endpoint before the signal path is appended.
    pub endpoint: &'static str,
    /// Whether exporters skip transport security by default.
    pub insecure: bool,
}

impl Deployment {
    /// Probes the container indicator first, then the site name.
    pub fn detect(env: &impl Environment) -> Self {
        if env.get_non_empty(CONTAINER).is_some() {
            Deployment::Tap
        } else if env.get_non_empty(SITE_NAME).is_some() {
            Deployment::Stores
        } else {
            Deployment::Unknown
        }
    }

    /// Looks up the defaults for this deployment.
    #[must_use]
    pub fn defaults(&self) -> DeploymentDefaults {
        match self {
            Deployment::Tap => DeploymentDefaults {
                endpoint: "http://127.0.0.1:4318",
                insecure: true,
            },
            Deployment::Stores => DeploymentDefaults {
                endpoint: "https://telemetry.storeapi.target.com",
                insecure: false,
            },
            Deployment::Unknown => DeploymentDefaults {
                endpoint: "https://telemetry.prod.target.com",
                insecure: false,
            },
        }
    }

    /// Returns the upper-case label used in logs and resource attributes.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Deployment::Tap => "TAP",
            Deployment::Stores => "STORES",
            Deployment::Unknown => "UNKNOWN",
        }
    }
}

impl fmt::Display for Deployment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A telemetry signal exported by the distro.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Signal {
    /// Distributed-tracing spans.
    Traces,
    /// Metrics.
    Metrics,
}

impl Signal {
    /// OTLP/HTTP path for the signal, without the leading slash.
    #[must_use]
    pub fn http_path(&self) -> &'static str {
        match self {
            Signal::Traces => "v1/traces",
            Signal::Metrics => "v1/metrics",
        }
    }

    /// Lower-case signal name.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Signal::Traces => "traces",
            Signal::Metrics => "metrics",
        }
    }
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Explicit options supplied by the caller.
///
/// Every field is optional. Environment variables outrank all of these; see
/// [`resolve`](crate::resolve) for the per-field order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Parameters {
    /// Service name.
    pub service_name: Option<String>,

    /// Service version.
    pub service_version: Option<String>,

    /// Endpoint for both signals; the signal path is appended.
    pub endpoint: Option<String>,

    /// Traces endpoint, used verbatim.
    pub traces_endpoint: Option<String>,

    /// Metrics endpoint, used verbatim.
    pub metrics_endpoint: Option<String>,

    /// Insecure transport for both signals.
    pub endpoint_insecure: Option<bool>,

    /// Insecure transport for traces.
    pub traces_endpoint_insecure: Option<bool>,

    /// Insecure transport for metrics.
    pub metrics_endpoint_insecure: Option<bool>,

    /// Console exporters and `DEBUG` logging.
    pub debug: Option<bool>,

    /// Log level name, matched case-insensitively.
    pub log_level: Option<String>,

    /// Protocol for both signals.
    pub exporter_protocol: Option<String>,

    /// Traces protocol.
    pub traces_exporter_protocol: Option<String>,

    /// Metrics protocol.
    pub metrics_exporter_protocol: Option<String>,

    /// Skip the tracer provider.
    pub traces_disabled: Option<bool>,

    /// Skip the meter provider.
    pub metrics_disabled: Option<bool>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_protocol_parses_wire_name_only() {
        assert_eq!(
            "http/protobuf".parse::<Protocol>(),
            Ok(Protocol::HttpProtobuf)
        );
        assert_eq!(
            "grpc".parse::<Protocol>(),
            Err(UnsupportedProtocol("grpc".to_string()))
        );
        assert!("".parse::<Protocol>().is_err());
    }

    #[test]
    fn test_protocol_display_round_trips() {
        let protocol = Protocol::default();
        assert_eq!(protocol.to_string().parse::<Protocol>(), Ok(protocol));
    }

    #[test]
    fn test_log_level_parse_is_case_insensitive() {
        assert_eq!("info".parse::<LogLevel>(), Ok(LogLevel::Info));
        assert_eq!("Warning".parse::<LogLevel>(), Ok(LogLevel::Warning));
        assert_eq!("CRITICAL".parse::<LogLevel>(), Ok(LogLevel::Critical));
        assert!("verbose".parse::<LogLevel>().is_err());
    }

    #[test]
    fn test_log_level_maps_onto_tracing_filters() {
        assert_eq!(LogLevel::NotSet.level_filter(), LevelFilter::TRACE);
        assert_eq!(LogLevel::Warning.level_filter(), LevelFilter::WARN);
        assert_eq!(LogLevel::Critical.level_filter(), LevelFilter::ERROR);
        assert_eq!(LogLevel::default(), LogLevel::Error);
    }

    #[test]
    fn test_deployment_detection_prefers_container_indicator() {
        let env = HashMap::from([("container", "oci"), ("SITE_NAME", "T0123")]);
        assert_eq!(Deployment::detect(&env), Deployment::Tap);

        let env = HashMap::from([("SITE_NAME", "T0123")]);
        assert_eq!(Deployment::detect(&env), Deployment::Stores);

        let env = HashMap::from([("container", "")]);
        assert_eq!(Deployment::detect(&env), Deployment::Unknown);
    }

    #[test]
    fn test_deployment_defaults_table() {
        assert_eq!(
            Deployment::Tap.defaults(),
            DeploymentDefaults {
                endpoint: "http://127.0.0.1:4318",
                insecure: true,
            }
        );
        assert!(!Deployment::Stores.defaults().insecure);
        assert!(!Deployment::Unknown.defaults().insecure);
        assert_eq!(
            Deployment::Unknown.defaults().endpoint,
            "https://telemetry.prod.target.com"
        );
    }

    #[test]
    fn test_signal_paths() {
        assert_eq!(Signal::Traces.http_path(), "v1/traces");
        assert_eq!(Signal::Metrics.http_path(), "v1/metrics");
    }

    #[test]
    fn test_parameters_default_to_unset() {
        let params = Parameters::default();
        assert!(params.service_name.is_none());
        assert!(params.debug.is_none());
        assert!(params.exporter_protocol.is_none());
    }
}
