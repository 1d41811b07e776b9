//! Resource assembly.
//!
//! Combines the resolved service identity, distro metadata and deployment
//! labels read from the environment with host, OS, process and Rust runtime
//! detectors.

use crate::env::{
    CLOUD_CLUSTER, CLOUD_DETAIL, CLOUD_REGION, CLOUD_SERVER_GROUP, CLOUD_STACK, Environment,
};
use crate::options::ResolvedOptions;
use opentelemetry::KeyValue;
use opentelemetry_resource_detectors::{
    HostResourceDetector, OsResourceDetector, ProcessResourceDetector,
};
use opentelemetry_sdk::resource::{Resource, ResourceDetector};
use opentelemetry_semantic_conventions::resource::{
    CLOUD_REGION as CLOUD_REGION_KEY, K8S_CLUSTER_NAME, PROCESS_RUNTIME_NAME,
    PROCESS_RUNTIME_VERSION, SERVICE_NAME, SERVICE_VERSION,
};

/// Version of this crate.
pub const DISTRO_VERSION: &str = env!("CARGO_PKG_VERSION");

/// rustc version captured by the build script.
pub const RUNTIME_VERSION: &str = match option_env!("TGT_OTEL_RUSTC_VERSION") {
    Some(version) => version,
    None => "unknown",
};

const DEPLOYMENT_LABELS: [(&str, &str); 5] = [
    (CLOUD_REGION, CLOUD_REGION_KEY),
    (CLOUD_CLUSTER, K8S_CLUSTER_NAME),
    (CLOUD_STACK, "tgt.stack"),
    (CLOUD_DETAIL, "tgt.detail"),
    (CLOUD_SERVER_GROUP, "tgt.server_group"),
];

/// Detects Rust runtime resource attributes.
///
/// - `process.runtime.name` = "rust"
/// - `process.runtime.version` (when the build script captured it)
/// - `rust.target_os`, `rust.target_arch`
/// - `rust.debug` (true for debug builds)
pub struct RuntimeResourceDetector;

impl ResourceDetector for RuntimeResourceDetector {
    fn detect(&self) -> Resource {
        let mut attrs = vec![
            KeyValue::new(PROCESS_RUNTIME_NAME, "rust"),
            KeyValue::new("rust.target_os", std::env::consts::OS),
            KeyValue::new("rust.target_arch", std::env::consts::ARCH),
            KeyValue::new("rust.debug", cfg!(debug_assertions)),
        ];

        if RUNTIME_VERSION != "unknown" {
            attrs.push(KeyValue::new(PROCESS_RUNTIME_VERSION, RUNTIME_VERSION));
        }

        Resource::builder_empty().with_attributes(attrs).build()
    }
}

/// Builds the resource shared by the tracer and meter providers.
///
/// Explicit attributes are applied after the detectors, so the resolved
/// service name always wins over `OTEL_SERVICE_NAME`-style detection.
pub fn create_resource(options: &ResolvedOptions, env: &impl Environment) -> Resource {
    let mut attributes = vec![
        KeyValue::new(SERVICE_NAME, options.service_name().to_string()),
        KeyValue::new("tgt.distro.version", DISTRO_VERSION),
        KeyValue::new("tgt.distro.runtime_version", RUNTIME_VERSION),
        KeyValue::new("tgt.deployment", options.deployment().as_str()),
    ];

    if let Some(version) = options.service_version() {
        attributes.push(KeyValue::new(SERVICE_VERSION, version.to_string()));
    }

    for (variable, key) in DEPLOYMENT_LABELS {
        if let Some(value) = env.get_non_empty(variable) {
            attributes.push(KeyValue::new(key, value));
        }
    }

    Resource::builder()
        .with_detector(Box::new(HostResourceDetector::default()))
        .with_detector(Box::new(OsResourceDetector))
        .with_detector(Box::new(ProcessResourceDetector))
        .with_detector(Box::new(RuntimeResourceDetector))
        .with_attributes(attributes)
        .build()
}
