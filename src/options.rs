//! Option resolution.
//!
//! [`resolve`] merges caller [`Parameters`], an [`Environment`] and built-in
//! defaults into an immutable [`ResolvedOptions`]. Resolution never fails:
//! every unusable value is reported with a warning and the next source in the
//! field's precedence order is used instead.

use crate::config::{Deployment, LogLevel, Parameters, Protocol, Signal};
use crate::env::{self, Environment, ProcessEnv};
use crate::resolve::{
    Chain, Source, TARGET, env_bool, env_log_level, env_protocol, env_string, normalize_endpoint,
    param_log_level, param_protocol, param_string,
};

/// Service name used when no source provides one.
pub const DEFAULT_SERVICE_NAME: &str = "unknown_service:rust";

/// Fully resolved distro options.
///
/// Built once by [`resolve`] and never modified; resolve again to pick up a
/// different configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedOptions {
    service_name: String,
    service_version: Option<String>,
    traces_endpoint: String,
    metrics_endpoint: String,
    traces_insecure: bool,
    metrics_insecure: bool,
    traces_protocol: Protocol,
    metrics_protocol: Protocol,
    debug: bool,
    log_level: LogLevel,
    traces_disabled: bool,
    metrics_disabled: bool,
    deployment: Deployment,
}

impl ResolvedOptions {
    /// Resolves `params` against the live process environment.
    pub fn from_env(params: &Parameters) -> Self {
        resolve(params, &ProcessEnv)
    }

    /// Service name reported on the resource.
    pub fn service_name(&self) -> &str {
        &self.service_name
    }

    /// Service version reported on the resource, if any.
    pub fn service_version(&self) -> Option<&str> {
        self.service_version.as_deref()
    }

    /// Endpoint the span exporter sends to.
    pub fn traces_endpoint(&self) -> &str {
        &self.traces_endpoint
    }

    /// Endpoint the metric exporter sends to.
    pub fn metrics_endpoint(&self) -> &str {
        &self.metrics_endpoint
    }

    /// Endpoint for `signal`.
    pub fn endpoint(&self, signal: Signal) -> &str {
        match signal {
            Signal::Traces => &self.traces_endpoint,
            Signal::Metrics => &self.metrics_endpoint,
        }
    }

    /// Whether the traces exporter skips transport security.
    pub fn traces_insecure(&self) -> bool {
        self.traces_insecure
    }

    /// Whether the metrics exporter skips transport security.
    pub fn metrics_insecure(&self) -> bool {
        self.metrics_insecure
    }

    /// Protocol of the span exporter.
    pub fn traces_protocol(&self) -> Protocol {
        self.traces_protocol
    }

    /// Protocol of the metric exporter.
    pub fn metrics_protocol(&self) -> Protocol {
        self.metrics_protocol
    }

    /// Whether console exporters are attached.
    pub fn debug(&self) -> bool {
        self.debug
    }

    /// Level of the installed subscriber. Always [`LogLevel::Debug`] when [`debug`](Self::debug) is set.
    pub fn log_level(&self) -> LogLevel {
        self.log_level
    }

    /// Whether the tracer provider is skipped.
    pub fn traces_disabled(&self) -> bool {
        self.traces_disabled
    }

    /// Whether the meter provider is skipped.
    pub fn metrics_disabled(&self) -> bool {
        self.metrics_disabled
    }

    /// Deployment detected during resolution.
    pub fn deployment(&self) -> Deployment {
        self.deployment
    }
}

impl Default for ResolvedOptions {
    /// Options resolved from no parameters and an empty environment.
    fn default() -> Self {
        resolve(&Parameters::default(), &std::collections::HashMap::<String, String>::new())
    }
}

/// Per-signal variable and parameter names.
struct SignalKeys {
    signal: Signal,
    endpoint_var: &'static str,
    protocol_var: &'static str,
    insecure_var: &'static str,
    endpoint_param: &'static str,
    protocol_param: &'static str,
    insecure_param: &'static str,
}

impl SignalKeys {
    fn for_signal(signal: Signal) -> Self {
        match signal {
            Signal::Traces => Self {
                signal,
                endpoint_var: env::OTEL_EXPORTER_OTLP_TRACES_ENDPOINT,
                protocol_var: env::OTEL_EXPORTER_OTLP_TRACES_PROTOCOL,
                insecure_var: env::OTEL_EXPORTER_OTLP_TRACES_INSECURE,
                endpoint_param: "traces_endpoint",
                protocol_param: "traces_exporter_protocol",
                insecure_param: "traces_endpoint_insecure",
            },
            Signal::Metrics => Self {
                signal,
                endpoint_var: env::OTEL_EXPORTER_OTLP_METRICS_ENDPOINT,
                protocol_var: env::OTEL_EXPORTER_OTLP_METRICS_PROTOCOL,
                insecure_var: env::OTEL_EXPORTER_OTLP_METRICS_INSECURE,
                endpoint_param: "metrics_endpoint",
                protocol_param: "metrics_exporter_protocol",
                insecure_param: "metrics_endpoint_insecure",
            },
        }
    }
}

/// Exporter settings for one signal.
struct SignalExport {
    endpoint: String,
    protocol: Protocol,
    insecure: bool,
}

/// Resolves every option from `params`, `env` and the built-in defaults.
///
/// Environment variables outrank parameters. For endpoints the order is:
/// signal-specific variable (verbatim), generic variable (signal path
/// appended), signal-specific parameter (verbatim), generic parameter (signal
/// path appended), then the deployment's default endpoint (signal path
/// appended). Protocols and insecure flags check the signal-specific variable
/// and parameter before falling back to the generic value, which in turn comes
/// from the generic variable, the generic parameter, then the default.
///
/// `env` is only read.
///
/// # Example
///
/// ```
/// use std::collections::HashMap;
/// use tgt_opentelemetry::{LogLevel, Parameters, resolve};
///
/// let env = HashMap::from([("OTEL_EXPORTER_OTLP_ENDPOINT", "http://collector:4318")]);
/// let params = Parameters {
///     service_name: Some("checkout".into()),
///     debug: Some(true),
///     log_level: Some("INFO".into()),
///     ..Default::default()
/// };
///
/// let options = resolve(&params, &env);
/// assert_eq!(options.service_name(), "checkout");
/// assert_eq!(options.traces_endpoint(), "http://collector:4318/v1/traces");
/// assert_eq!(options.log_level(), LogLevel::Debug);
/// ```
pub fn resolve(params: &Parameters, env: &impl Environment) -> ResolvedOptions {
    let deployment = Deployment::detect(env);
    let defaults = deployment.defaults();
    tracing::debug!(target: TARGET, %deployment, "Detected deployment");

    let metrics_disabled = Chain::new("metrics_disabled")
        .then(Source::Env(env::METRICS_DISABLED), || {
            env_bool(env, env::METRICS_DISABLED)
        })
        .then(Source::Param("metrics_disabled"), || params.metrics_disabled)
        .resolve(false);

    let traces_disabled = Chain::new("traces_disabled")
        .then(Source::Env(env::TRACES_DISABLED), || {
            env_bool(env, env::TRACES_DISABLED)
        })
        .then(Source::Param("traces_disabled"), || params.traces_disabled)
        .resolve(false);

    let debug = Chain::new("debug")
        .then(Source::Env(env::DEBUG), || env_bool(env, env::DEBUG))
        .then(Source::Param("debug"), || params.debug)
        .resolve(false);

    let log_level = if debug {
        LogLevel::Debug
    } else {
        Chain::new("log_level")
            .then(Source::Env(env::OTEL_LOG_LEVEL), || {
                env_log_level(env, env::OTEL_LOG_LEVEL)
            })
            .then(Source::Param("log_level"), || {
                param_log_level("log_level", params.log_level.as_deref())
            })
            .resolve(LogLevel::default())
    };

    let service_name = resolve_service_name(params, env);

    let service_version = Chain::new("service_version")
        .then(Source::Env(env::OTEL_SERVICE_VERSION), || {
            env_string(env, env::OTEL_SERVICE_VERSION)
        })
        .then(Source::Param("service_version"), || {
            param_string(params.service_version.as_deref())
        })
        .first()
        .map(|(_, version)| version);

    let protocol = Chain::new("exporter_protocol")
        .then(Source::Env(env::OTEL_EXPORTER_OTLP_PROTOCOL), || {
            env_protocol(env, env::OTEL_EXPORTER_OTLP_PROTOCOL)
        })
        .then(Source::Param("exporter_protocol"), || {
            param_protocol("exporter_protocol", params.exporter_protocol.as_deref())
        })
        .resolve(Protocol::default());

    let insecure = Chain::new("endpoint_insecure")
        .then(Source::Env(env::OTEL_EXPORTER_OTLP_INSECURE), || {
            env_bool(env, env::OTEL_EXPORTER_OTLP_INSECURE)
        })
        .then(Source::Param("endpoint_insecure"), || params.endpoint_insecure)
        .resolve(defaults.insecure);

    let generic = GenericExport {
        endpoint_env: env_string(env, env::OTEL_EXPORTER_OTLP_ENDPOINT),
        endpoint_param: param_string(params.endpoint.as_deref()),
        default_endpoint: defaults.endpoint,
        protocol,
        insecure,
    };

    let traces = resolve_signal(
        &SignalKeys::for_signal(Signal::Traces),
        &generic,
        params.traces_endpoint.as_deref(),
        params.traces_exporter_protocol.as_deref(),
        params.traces_endpoint_insecure,
        env,
    );
    let metrics = resolve_signal(
        &SignalKeys::for_signal(Signal::Metrics),
        &generic,
        params.metrics_endpoint.as_deref(),
        params.metrics_exporter_protocol.as_deref(),
        params.metrics_endpoint_insecure,
        env,
    );

    ResolvedOptions {
        service_name,
        service_version,
        traces_endpoint: traces.endpoint,
        metrics_endpoint: metrics.endpoint,
        traces_insecure: traces.insecure,
        metrics_insecure: metrics.insecure,
        traces_protocol: traces.protocol,
        metrics_protocol: metrics.protocol,
        debug,
        log_level,
        traces_disabled,
        metrics_disabled,
        deployment,
    }
}

fn resolve_service_name(params: &Parameters, env: &impl Environment) -> String {
    let explicit = Chain::new("service_name")
        .then(Source::Env(env::OTEL_SERVICE_NAME), || {
            env_string(env, env::OTEL_SERVICE_NAME)
        })
        .then(Source::Param("service_name"), || {
            param_string(params.service_name.as_deref())
        })
        .first();

    if let Some((_, name)) = explicit {
        return name;
    }

    tracing::warn!(
        target: TARGET,
        "Missing service name. Set the {} environment variable or the service_name parameter, \
         otherwise the service shows up as {DEFAULT_SERVICE_NAME}",
        env::OTEL_SERVICE_NAME
    );

    Chain::new("service_name")
        .then(Source::Env(env::CLOUD_APPLICATION), || {
            env_string(env, env::CLOUD_APPLICATION)
        })
        .resolve(DEFAULT_SERVICE_NAME.to_string())
}

/// Values shared by both signals.
struct GenericExport {
    endpoint_env: Option<String>,
    endpoint_param: Option<String>,
    default_endpoint: &'static str,
    protocol: Protocol,
    insecure: bool,
}

fn resolve_signal(
    keys: &SignalKeys,
    generic: &GenericExport,
    endpoint_param: Option<&str>,
    protocol_param: Option<&str>,
    insecure_param: Option<bool>,
    env: &impl Environment,
) -> SignalExport {
    let signal = keys.signal;

    let protocol = Chain::new(keys.protocol_param)
        .then(Source::Env(keys.protocol_var), || {
            env_protocol(env, keys.protocol_var)
        })
        .then(Source::Param(keys.protocol_param), || {
            param_protocol(keys.protocol_param, protocol_param)
        })
        .resolve(generic.protocol);

    let endpoint = Chain::new(keys.endpoint_param)
        .then(Source::Env(keys.endpoint_var), || {
            env_string(env, keys.endpoint_var)
        })
        .then(Source::Env(env::OTEL_EXPORTER_OTLP_ENDPOINT), || {
            generic
                .endpoint_env
                .as_deref()
                .map(|endpoint| normalize_endpoint(endpoint, protocol, signal))
        })
        .then(Source::Param(keys.endpoint_param), || {
            param_string(endpoint_param)
        })
        .then(Source::Param("endpoint"), || {
            generic
                .endpoint_param
                .as_deref()
                .map(|endpoint| normalize_endpoint(endpoint, protocol, signal))
        })
        .resolve(normalize_endpoint(generic.default_endpoint, protocol, signal));

    let insecure = Chain::new(keys.insecure_param)
        .then(Source::Env(keys.insecure_var), || {
            env_bool(env, keys.insecure_var)
        })
        .then(Source::Param(keys.insecure_param), || insecure_param)
        .resolve(generic.insecure);

    SignalExport {
        endpoint,
        protocol,
        insecure,
    }
}
