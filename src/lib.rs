//! Target's OpenTelemetry distro for Rust services.
//!
//! Resolves exporter options from explicit parameters, environment variables
//! and deployment-aware defaults, then wires the OpenTelemetry SDK, OTLP/HTTP
//! exporters and `tracing` together behind a single lifecycle guard.
//!
//! Environment variables outrank parameters. Endpoints are taken from the
//! signal-specific variable, the generic variable, the signal-specific
//! parameter, the generic parameter, then the deployment default. Protocols
//! and insecure flags check the signal-specific variable and parameter before
//! the generic variable, the generic parameter, then the default.
//! Deployment defaults depend on where the process runs: TAP containers
//! (`container` set), stores (`SITE_NAME` set) or anywhere else.
//!
//! # Example
//!
//! ```no_run
//! use tgt_opentelemetry::{OptionsBuilder, SdkError};
//!
//! fn main() -> Result<(), SdkError> {
//!     let _guard = OptionsBuilder::new()
//!         .service_name("my-service")
//!         .service_version("1.0.0")
//!         .build()?;
//!
//!     tracing::info!("Application running");
//!     Ok(())
//! }
//! ```
//!
//! Options can also be resolved without touching the SDK:
//!
//! ```
//! use std::collections::HashMap;
//! use tgt_opentelemetry::{Parameters, Signal, resolve};
//!
//! let env = HashMap::from([("SITE_NAME", "T1234")]);
//! let options = resolve(&Parameters::default(), &env);
//!
//! assert_eq!(
//!     options.endpoint(Signal::Traces),
//!     "https://telemetry.storeapi.target.com/v1/traces"
//! );
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod builder;
mod config;
pub mod env;
mod error;
mod guard;
mod options;
mod resolve;
mod resource;
mod sampler;

pub use builder::OptionsBuilder;
pub use config::{
    Deployment, DeploymentDefaults, LogLevel, Parameters, Protocol, Signal, UnknownLogLevel,
    UnsupportedProtocol,
};
pub use env::{Environment, ProcessEnv};
pub use error::SdkError;
pub use guard::OtelGuard;
pub use options::{DEFAULT_SERVICE_NAME, ResolvedOptions, resolve};
pub use resolve::{normalize_endpoint, parse_bool};
pub use resource::{DISTRO_VERSION, RUNTIME_VERSION, RuntimeResourceDetector, create_resource};
pub use sampler::configure_sampler;

/// Re-exported for version compatibility with this crate's dependencies.
pub use opentelemetry;
/// Re-exported for version compatibility with this crate's dependencies.
pub use opentelemetry_sdk;
/// Re-exported for version compatibility with this crate's dependencies.
pub use tracing;

/// Re-exported for users who want to construct custom parameter providers.
pub use figment;

/// Configures tracing and metrics from already resolved options.
///
/// Reads deployment labels from the process environment and installs the
/// global `tracing` subscriber. Keep the returned guard alive for the
/// lifetime of the program; dropping it flushes and shuts the providers down.
pub fn configure_opentelemetry(options: &ResolvedOptions) -> Result<OtelGuard, SdkError> {
    OtelGuard::from_options(options, &ProcessEnv, true)
}
