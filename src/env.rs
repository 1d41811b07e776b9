//! Environment lookup used by option resolution.
//!
//! Resolution never reads `std::env` directly. It goes through the
//! [`Environment`] trait so callers can hand in a snapshot (a `HashMap`)
//! instead of mutating process-wide variables, which is racy under a
//! multi-threaded test runner.

use std::borrow::Borrow;
use std::collections::HashMap;
use std::hash::{BuildHasher, Hash};

/// Service name.
pub const OTEL_SERVICE_NAME: &str = "OTEL_SERVICE_NAME";
/// Service version.
pub const OTEL_SERVICE_VERSION: &str = "OTEL_SERVICE_VERSION";
/// Enables console exporters and forces the `DEBUG` log level.
pub const DEBUG: &str = "DEBUG";
/// Log level for the installed subscriber.
pub const OTEL_LOG_LEVEL: &str = "OTEL_LOG_LEVEL";
/// Disables the tracer provider.
pub const TRACES_DISABLED: &str = "TRACES_DISABLED";
/// Disables the meter provider.
pub const METRICS_DISABLED: &str = "METRICS_DISABLED";
/// Application name set by the hosting platform, used when no service name is given.
pub const CLOUD_APPLICATION: &str = "CLOUD_APPLICATION";

/// Endpoint shared by all signals.
pub const OTEL_EXPORTER_OTLP_ENDPOINT: &str = "OTEL_EXPORTER_OTLP_ENDPOINT";
/// Traces endpoint, used verbatim.
pub const OTEL_EXPORTER_OTLP_TRACES_ENDPOINT: &str = "OTEL_EXPORTER_OTLP_TRACES_ENDPOINT";
/// Metrics endpoint, used verbatim.
pub const OTEL_EXPORTER_OTLP_METRICS_ENDPOINT: &str = "OTEL_EXPORTER_OTLP_METRICS_ENDPOINT";
/// Protocol shared by all signals.
pub const OTEL_EXPORTER_OTLP_PROTOCOL: &str = "OTEL_EXPORTER_OTLP_PROTOCOL";
/// Traces protocol.
pub const OTEL_EXPORTER_OTLP_TRACES_PROTOCOL: &str = "OTEL_EXPORTER_OTLP_TRACES_PROTOCOL";
/// Metrics protocol.
pub const OTEL_EXPORTER_OTLP_METRICS_PROTOCOL: &str = "OTEL_EXPORTER_OTLP_METRICS_PROTOCOL";
/// Insecure transport flag shared by all signals.
pub const OTEL_EXPORTER_OTLP_INSECURE: &str = "OTEL_EXPORTER_OTLP_INSECURE";
/// Traces insecure transport flag.
pub const OTEL_EXPORTER_OTLP_TRACES_INSECURE: &str = "OTEL_EXPORTER_OTLP_TRACES_INSECURE";
/// Metrics insecure transport flag.
pub const OTEL_EXPORTER_OTLP_METRICS_INSECURE: &str = "OTEL_EXPORTER_OTLP_METRICS_INSECURE";

/// Set inside TAP containers.
pub const CONTAINER: &str = "container";
/// Set on store hosts.
pub const SITE_NAME: &str = "SITE_NAME";

/// Deployment labels copied onto the resource.
pub const CLOUD_REGION: &str = "CLOUD_REGION";
/// See [`CLOUD_REGION`].
pub const CLOUD_CLUSTER: &str = "CLOUD_CLUSTER";
/// See [`CLOUD_REGION`].
pub const CLOUD_STACK: &str = "CLOUD_STACK";
/// See [`CLOUD_REGION`].
pub const CLOUD_DETAIL: &str = "CLOUD_DETAIL";
/// See [`CLOUD_REGION`].
pub const CLOUD_SERVER_GROUP: &str = "CLOUD_SERVER_GROUP";

/// Read-only key/value lookup.
///
/// Implemented for [`ProcessEnv`] and for any `HashMap` keyed by strings.
///
/// # Example
///
/// ```
/// use std::collections::HashMap;
/// use tgt_opentelemetry::Environment;
///
/// let env = HashMap::from([("OTEL_SERVICE_NAME", "checkout")]);
/// assert_eq!(
///     Environment::get(&env, "OTEL_SERVICE_NAME").as_deref(),
///     Some("checkout")
/// );
/// assert_eq!(env.get_non_empty("DEBUG"), None);
/// ```
pub trait Environment {
    /// Returns the value of `key`, or `None` when it is not set.
    fn get(&self, key: &str) -> Option<String>;

    /// Returns the value of `key` unless it is unset or empty.
    fn get_non_empty(&self, key: &str) -> Option<String> {
        self.get(key).filter(|value| !value.is_empty())
    }
}

/// The live process environment.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnv;

impl Environment for ProcessEnv {
    fn get(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }
}

impl<K, V, S> Environment for HashMap<K, V, S>
where
    K: Borrow<str> + Hash + Eq,
    V: AsRef<str>,
    S: BuildHasher,
{
    fn get(&self, key: &str) -> Option<String> {
        HashMap::get(self, key).map(|value| value.as_ref().to_string())
    }
}

impl<E: Environment + ?Sized> Environment for &E {
    fn get(&self, key: &str) -> Option<String> {
        (**self).get(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_map_lookup_returns_owned_value() {
        let env = HashMap::from([("KEY".to_string(), "value".to_string())]);
        assert_eq!(Environment::get(&env, "KEY"), Some("value".to_string()));
        assert_eq!(Environment::get(&env, "MISSING"), None);
    }

    #[test]
    fn test_get_non_empty_treats_empty_as_unset() {
        let env = HashMap::from([("EMPTY", ""), ("SET", "x")]);
        assert_eq!(env.get_non_empty("EMPTY"), None);
        assert_eq!(env.get_non_empty("SET"), Some("x".to_string()));
    }

    #[test]
    fn test_process_env_reads_live_variables() {
        temp_env::with_var("TGT_OTEL_ENV_PROBE", Some("present"), || {
            assert_eq!(
                ProcessEnv.get("TGT_OTEL_ENV_PROBE"),
                Some("present".to_string())
            );
        });
        temp_env::with_var_unset("TGT_OTEL_ENV_PROBE", || {
            assert_eq!(ProcessEnv.get("TGT_OTEL_ENV_PROBE"), None);
        });
    }
}
