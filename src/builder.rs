//! Builder for distro parameters.
//!
//! Parameters are layered with figment:
//! 1. Unset (every parameter absent)
//! 2. Configuration files (TOML)
//! 3. Programmatic setters
//!
//! Later layers win. The merged [`Parameters`] are then resolved against the
//! environment, and every environment variable outranks every layer here.

use crate::SdkError;
use crate::config::{LogLevel, Parameters, Protocol};
use crate::env::{Environment, ProcessEnv};
use crate::guard::OtelGuard;
use crate::options::{ResolvedOptions, resolve};
use figment::Figment;
use figment::providers::{Format, Serialized, Toml};
use std::path::Path;

/// Builder for resolving options and initialising the SDK.
///
/// # Example
///
/// ```no_run
/// use tgt_opentelemetry::{OptionsBuilder, SdkError};
///
/// fn main() -> Result<(), SdkError> {
///     let _guard = OptionsBuilder::new()
///         .with_file("/etc/tgt/otel.toml")
///         .service_name("checkout")
///         .service_version(env!("CARGO_PKG_VERSION"))
///         .build()?;
///
///     tracing::info!("Application running");
///     Ok(())
/// }
/// ```
#[must_use = "builders do nothing unless .resolve() or .build() is called"]
pub struct OptionsBuilder {
    figment: Figment,
    init_tracing_subscriber: bool,
}

impl OptionsBuilder {
    /// Creates a builder with every parameter unset.
    pub fn new() -> Self {
        Self::from_figment(Figment::from(Serialized::defaults(Parameters::default())))
    }

    /// Creates a builder from an existing figment.
    ///
    /// The figment must extract into [`Parameters`].
    ///
    /// # Example
    ///
    /// ```no_run
    /// use figment::{Figment, providers::{Format, Toml}};
    /// use tgt_opentelemetry::{OptionsBuilder, SdkError};
    ///
    /// let figment = Figment::new()
    ///     .merge(Toml::file("/etc/tgt/otel-defaults.toml"))
    ///     .merge(Toml::file("./otel.toml"));
    ///
    /// let options = OptionsBuilder::from_figment(figment)
    ///     .service_name("checkout")
    ///     .resolve()?;
    /// # Ok::<(), SdkError>(())
    /// ```
    pub fn from_figment(figment: Figment) -> Self {
        Self {
            figment,
            init_tracing_subscriber: true,
        }
    }

    /// Merges parameters from a TOML file.
    ///
    /// If the file doesn't exist, it's silently skipped.
    ///
    /// ```toml
    /// service_name = "checkout"
    /// endpoint = "http://collector:4318"
    /// debug = false
    /// log_level = "info"
    /// ```
    pub fn with_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        let path = path.as_ref();
        if path.exists() {
            self.figment = self.figment.merge(Toml::file(path));
        }
        self
    }

    fn set<T: serde::Serialize>(mut self, key: &str, value: T) -> Self {
        self.figment = self.figment.merge(Serialized::default(key, value));
        self
    }

    /// Sets the service name.
    pub fn service_name(self, name: impl Into<String>) -> Self {
        self.set("service_name", name.into())
    }

    /// Sets the service version.
    pub fn service_version(self, version: impl Into<String>) -> Self {
        self.set("service_version", version.into())
    }

    /// Sets the endpoint for both signals. The signal path is appended.
    pub fn endpoint(self, url: impl Into<String>) -> Self {
        self.set("endpoint", url.into())
    }

    /// Sets the traces endpoint, used verbatim.
    pub fn traces_endpoint(self, url: impl Into<String>) -> Self {
        self.set("traces_endpoint", url.into())
    }

    /// Sets the metrics endpoint, used verbatim.
    pub fn metrics_endpoint(self, url: impl Into<String>) -> Self {
        self.set("metrics_endpoint", url.into())
    }

    /// Sets the insecure flag for both signals.
    pub fn endpoint_insecure(self, insecure: bool) -> Self {
        self.set("endpoint_insecure", insecure)
    }

    /// Sets the insecure flag for traces.
    pub fn traces_endpoint_insecure(self, insecure: bool) -> Self {
        self.set("traces_endpoint_insecure", insecure)
    }

    /// Sets the insecure flag for metrics.
    pub fn metrics_endpoint_insecure(self, insecure: bool) -> Self {
        self.set("metrics_endpoint_insecure", insecure)
    }

    /// Enables console exporters and `DEBUG` logging.
    pub fn debug(self, debug: bool) -> Self {
        self.set("debug", debug)
    }

    /// Sets the log level. Ignored when debug resolves to true.
    pub fn log_level(self, level: LogLevel) -> Self {
        self.set("log_level", level.as_str())
    }

    /// Sets the protocol for both signals.
    pub fn exporter_protocol(self, protocol: Protocol) -> Self {
        self.set("exporter_protocol", protocol.as_str())
    }

    /// Sets the traces protocol.
    pub fn traces_exporter_protocol(self, protocol: Protocol) -> Self {
        self.set("traces_exporter_protocol", protocol.as_str())
    }

    /// Sets the metrics protocol.
    pub fn metrics_exporter_protocol(self, protocol: Protocol) -> Self {
        self.set("metrics_exporter_protocol", protocol.as_str())
    }

    /// Disables or enables the tracer provider.
    ///
    /// Default: enabled
    pub fn traces_disabled(self, disabled: bool) -> Self {
        self.set("traces_disabled", disabled)
    }

    /// Disables or enables the meter provider.
    ///
    /// Default: enabled
    pub fn metrics_disabled(self, disabled: bool) -> Self {
        self.set("metrics_disabled", disabled)
    }

    /// Disables automatic tracing subscriber initialisation.
    ///
    /// By default [`build`](Self::build) installs a `tracing-subscriber`
    /// registry with a fmt layer and the `tracing-opentelemetry` layer.
    /// Disable this if you want to configure the subscriber yourself.
    pub fn without_tracing_subscriber(mut self) -> Self {
        self.init_tracing_subscriber = false;
        self
    }

    /// Extracts the merged parameters.
    ///
    /// # Errors
    ///
    /// Returns an error if a layer (typically a malformed file) cannot be
    /// extracted into [`Parameters`].
    pub fn extract_parameters(&self) -> Result<Parameters, SdkError> {
        self.figment
            .extract()
            .map_err(|e| SdkError::Config(Box::new(e)))
    }

    /// Resolves the parameters against the process environment.
    ///
    /// # Errors
    ///
    /// See [`extract_parameters`](Self::extract_parameters).
    pub fn resolve(&self) -> Result<ResolvedOptions, SdkError> {
        self.resolve_with(&ProcessEnv)
    }

    /// Resolves the parameters against `env`.
    ///
    /// # Errors
    ///
    /// See [`extract_parameters`](Self::extract_parameters).
    pub fn resolve_with(&self, env: &impl Environment) -> Result<ResolvedOptions, SdkError> {
        let params = self.extract_parameters()?;
        Ok(resolve(&params, env))
    }

    /// Resolves options from the process environment and initialises the SDK.
    ///
    /// Returns an [`OtelGuard`] that flushes and shuts down the providers when
    /// dropped.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Parameter extraction fails
    /// - An exporter cannot be built
    /// - A global tracing subscriber is already installed
    pub fn build(self) -> Result<OtelGuard, SdkError> {
        self.build_with(&ProcessEnv)
    }

    /// Like [`build`](Self::build), reading the environment from `env`.
    ///
    /// # Errors
    ///
    /// See [`build`](Self::build).
    pub fn build_with(self, env: &impl Environment) -> Result<OtelGuard, SdkError> {
        let options = self.resolve_with(env)?;
        OtelGuard::from_options(&options, env, self.init_tracing_subscriber)
    }
}

impl Default for OptionsBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn no_env() -> HashMap<String, String> {
        HashMap::new()
    }

    #[test]
    fn test_builder_default() {
        let params = OptionsBuilder::new().extract_parameters().unwrap();
        assert_eq!(params, Parameters::default());
    }

    #[test]
    fn test_builder_setters_populate_parameters() {
        let params = OptionsBuilder::new()
            .service_name("my-service")
            .service_version("1.0.0")
            .endpoint("http://collector:4318")
            .traces_endpoint("http://traces:4318/custom")
            .metrics_endpoint("http://metrics:4318/custom")
            .endpoint_insecure(true)
            .traces_endpoint_insecure(false)
            .metrics_endpoint_insecure(true)
            .debug(true)
            .log_level(LogLevel::Info)
            .exporter_protocol(Protocol::HttpProtobuf)
            .traces_exporter_protocol(Protocol::HttpProtobuf)
            .metrics_exporter_protocol(Protocol::HttpProtobuf)
            .traces_disabled(true)
            .metrics_disabled(false)
            .extract_parameters()
            .unwrap();

        assert_eq!(params.service_name.as_deref(), Some("my-service"));
        assert_eq!(params.service_version.as_deref(), Some("1.0.0"));
        assert_eq!(params.endpoint.as_deref(), Some("http://collector:4318"));
        assert_eq!(
            params.traces_endpoint.as_deref(),
            Some("http://traces:4318/custom")
        );
        assert_eq!(
            params.metrics_endpoint.as_deref(),
            Some("http://metrics:4318/custom")
        );
        assert_eq!(params.endpoint_insecure, Some(true));
        assert_eq!(params.traces_endpoint_insecure, Some(false));
        assert_eq!(params.metrics_endpoint_insecure, Some(true));
        assert_eq!(params.debug, Some(true));
        assert_eq!(params.log_level.as_deref(), Some("INFO"));
        assert_eq!(params.exporter_protocol.as_deref(), Some("http/protobuf"));
        assert_eq!(params.traces_disabled, Some(true));
        assert_eq!(params.metrics_disabled, Some(false));
    }

    #[test]
    fn test_builder_resolve_with_injected_env() {
        let env = HashMap::from([("OTEL_SERVICE_NAME", "env-service")]);
        let options = OptionsBuilder::new()
            .service_name("param-service")
            .endpoint("http://collector:4318")
            .resolve_with(&env)
            .unwrap();

        assert_eq!(options.service_name(), "env-service");
        assert_eq!(
            options.traces_endpoint(),
            "http://collector:4318/v1/traces"
        );
    }

    #[test]
    fn test_load_from_toml() {
        let toml_content = r#"
service_name = "file-service"
endpoint = "http://file-collector:4318"
metrics_disabled = true
log_level = "warning"
"#;

        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(toml_content.as_bytes()).unwrap();

        let options = OptionsBuilder::new()
            .with_file(temp_file.path())
            .resolve_with(&no_env())
            .unwrap();

        assert_eq!(options.service_name(), "file-service");
        assert_eq!(
            options.metrics_endpoint(),
            "http://file-collector:4318/v1/metrics"
        );
        assert!(options.metrics_disabled());
        assert_eq!(options.log_level(), LogLevel::Warning);
    }

    #[test]
    fn test_programmatic_overrides_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file
            .write_all(b"service_name = \"file-service\"\n")
            .unwrap();

        let options = OptionsBuilder::new()
            .with_file(temp_file.path())
            .service_name("programmatic-service")
            .resolve_with(&no_env())
            .unwrap();

        assert_eq!(options.service_name(), "programmatic-service");
    }

    #[test]
    fn test_invalid_protocol_in_file_degrades_to_default() {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file
            .write_all(b"exporter_protocol = \"grpc\"\n")
            .unwrap();

        let options = OptionsBuilder::new()
            .with_file(temp_file.path())
            .resolve_with(&no_env())
            .unwrap();

        assert_eq!(options.traces_protocol(), Protocol::HttpProtobuf);
    }

    #[test]
    fn test_load_nonexistent_file_is_skipped() {
        let params = OptionsBuilder::new()
            .with_file("/nonexistent/path/otel.toml")
            .extract_parameters()
            .unwrap();

        assert_eq!(params, Parameters::default());
    }

    #[test]
    fn test_mistyped_file_value_is_a_config_error() {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(b"debug = \"very\"\n").unwrap();

        let result = OptionsBuilder::new()
            .with_file(temp_file.path())
            .extract_parameters();

        assert!(
            matches!(result, Err(SdkError::Config(_))),
            "Expected Config error, got: {result:?}"
        );
    }

    #[test]
    fn test_builder_without_tracing_subscriber() {
        let builder = OptionsBuilder::new().without_tracing_subscriber();
        assert!(!builder.init_tracing_subscriber);
        assert!(OptionsBuilder::default().init_tracing_subscriber);
    }
}
