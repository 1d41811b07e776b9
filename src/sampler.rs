//! Sampler used by the distro's tracer provider.

use opentelemetry_sdk::trace::Sampler;

/// Returns the distro's sampler: follow the parent's decision, drop root spans.
///
/// Spans are only recorded when an upstream service propagated a sampled
/// trace context.
#[must_use]
pub fn configure_sampler() -> Sampler {
    Sampler::ParentBased(Box::new(Sampler::AlwaysOff))
}
