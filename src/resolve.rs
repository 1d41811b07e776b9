//! Building blocks of option resolution.
//!
//! Each resolved field is expressed as a [`Chain`]: an ordered list of
//! sources, each paired with an accessor. The first accessor that produces a
//! value wins. Accessors run lazily, so a source below the winner is never
//! read and never warned about.

use crate::config::{LogLevel, Protocol, Signal};
use crate::env::Environment;
use std::fmt;

pub(crate) const TARGET: &str = "tgt_opentelemetry";

/// Where a resolved value came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Source {
    /// Named environment variable.
    Env(&'static str),
    /// Named caller parameter.
    Param(&'static str),
    /// Built-in default.
    Default,
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Source::Env(name) => write!(f, "environment variable {name}"),
            Source::Param(name) => write!(f, "parameter {name}"),
            Source::Default => f.write_str("default"),
        }
    }
}

type Accessor<'a, T> = Box<dyn FnOnce() -> Option<T> + 'a>;

/// Ordered precedence chain for a single field.
#[must_use = "a chain does nothing until resolved"]
pub(crate) struct Chain<'a, T> {
    field: &'static str,
    links: Vec<(Source, Accessor<'a, T>)>,
}

impl<'a, T: fmt::Debug> Chain<'a, T> {
    pub(crate) fn new(field: &'static str) -> Self {
        Self {
            field,
            links: Vec::new(),
        }
    }

    /// Appends a source below every source added so far.
    pub(crate) fn then(mut self, source: Source, accessor: impl FnOnce() -> Option<T> + 'a) -> Self {
        self.links.push((source, Box::new(accessor)));
        self
    }

    /// Returns the first value produced, with its source.
    pub(crate) fn first(self) -> Option<(Source, T)> {
        let field = self.field;
        let found = self
            .links
            .into_iter()
            .find_map(|(source, accessor)| accessor().map(|value| (source, value)));

        if let Some((source, value)) = &found {
            tracing::debug!(target: TARGET, field, %source, ?value, "Resolved option");
        }
        found
    }

    /// Returns the first value produced, or `default` when no source has one.
    pub(crate) fn resolve(self, default: T) -> T {
        let field = self.field;
        match self.first() {
            Some((_, value)) => value,
            None => {
                tracing::debug!(
                    target: TARGET,
                    field,
                    source = %Source::Default,
                    value = ?default,
                    "Resolved option"
                );
                default
            }
        }
    }
}

/// Parses `true`, `false`, `1` or `0`, ignoring case and surrounding whitespace.
#[must_use]
pub fn parse_bool(value: &str) -> Option<bool> {
    let value = value.trim();
    if value.eq_ignore_ascii_case("true") || value == "1" {
        Some(true)
    } else if value.eq_ignore_ascii_case("false") || value == "0" {
        Some(false)
    } else {
        None
    }
}

/// Non-empty string value of `variable`.
pub(crate) fn env_string(env: &impl Environment, variable: &'static str) -> Option<String> {
    env.get_non_empty(variable)
}

/// Boolean value of `variable`; an unparseable value is logged and ignored.
pub(crate) fn env_bool(env: &impl Environment, variable: &'static str) -> Option<bool> {
    let raw = env.get_non_empty(variable)?;
    let parsed = parse_bool(&raw);
    if parsed.is_none() {
        tracing::warn!(
            target: TARGET,
            variable,
            value = %raw,
            "Unable to parse {variable} as a boolean (expected true, false, 1 or 0), falling back to the next source"
        );
    }
    parsed
}

/// Protocol named by `variable`; an unsupported value is logged and ignored.
pub(crate) fn env_protocol(env: &impl Environment, variable: &'static str) -> Option<Protocol> {
    let raw = env.get_non_empty(variable)?;
    protocol_from(Source::Env(variable), &raw)
}

/// Protocol named by a parameter; an unsupported value is logged and ignored.
pub(crate) fn param_protocol(name: &'static str, raw: Option<&str>) -> Option<Protocol> {
    raw.filter(|raw| !raw.is_empty())
        .and_then(|raw| protocol_from(Source::Param(name), raw))
}

fn protocol_from(source: Source, raw: &str) -> Option<Protocol> {
    match raw.parse::<Protocol>() {
        Ok(protocol) => Some(protocol),
        Err(e) => {
            tracing::warn!(
                target: TARGET,
                %source,
                value = %raw,
                error = %e,
                "Invalid OTLP exporter protocol, falling back to the next source"
            );
            None
        }
    }
}

/// Log level named by `variable`; an unrecognised value is logged and ignored.
pub(crate) fn env_log_level(env: &impl Environment, variable: &'static str) -> Option<LogLevel> {
    let raw = env.get_non_empty(variable)?;
    log_level_from(Source::Env(variable), &raw)
}

/// Log level named by a parameter; an unrecognised value is logged and ignored.
pub(crate) fn param_log_level(name: &'static str, raw: Option<&str>) -> Option<LogLevel> {
    raw.filter(|raw| !raw.is_empty())
        .and_then(|raw| log_level_from(Source::Param(name), raw))
}

fn log_level_from(source: Source, raw: &str) -> Option<LogLevel> {
    match raw.parse::<LogLevel>() {
        Ok(level) => Some(level),
        Err(e) => {
            tracing::warn!(
                target: TARGET,
                %source,
                value = %raw,
                error = %e,
                "Ignoring log level, falling back to the next source"
            );
            None
        }
    }
}

/// Non-empty copy of a string parameter.
pub(crate) fn param_string(raw: Option<&str>) -> Option<String> {
    raw.filter(|raw| !raw.is_empty()).map(str::to_string)
}

/// Appends the signal's OTLP/HTTP path to `endpoint` unless it is already there.
///
/// Leading and trailing slashes are ignored when checking for the suffix.
/// Protocols without per-signal paths and empty endpoints are returned
/// unchanged. Applying the function twice yields the same string.
///
/// # Example
///
/// ```
/// use tgt_opentelemetry::{Protocol, Signal, normalize_endpoint};
///
/// let once = normalize_endpoint("http://host:4318/", Protocol::HttpProtobuf, Signal::Traces);
/// assert_eq!(once, "http://host:4318/v1/traces");
/// assert_eq!(normalize_endpoint(&once, Protocol::HttpProtobuf, Signal::Traces), once);
/// ```
#[must_use]
pub fn normalize_endpoint(endpoint: &str, protocol: Protocol, signal: Signal) -> String {
    if endpoint.is_empty() || !protocol.uses_signal_path() {
        return endpoint.to_string();
    }

    let trimmed = endpoint.trim_matches('/');
    if trimmed.ends_with(signal.http_path()) {
        endpoint.to_string()
    } else {
        format!("{trimmed}/{}", signal.http_path())
    }
}
