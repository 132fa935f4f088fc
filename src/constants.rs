//! Constants for gen-AI OTLP ingestion.
//!
//! This file centralizes the fixed property names and limits that make up
//! the wire contract with upstream instrumentation, to ensure consistency
//! across the codebase.

/// Marker properties identifying the instrumentation path of an event.
pub mod markers {
    /// Property recording which ingestion path produced the event.
    pub const INGESTION_SOURCE_KEY: &str = "$ai_ingestion_source";

    /// Marker value stamped on events produced by the OpenTelemetry path.
    pub const INGESTION_SOURCE_OTEL: &str = "otel";
}

/// Event names emitted by the OTLP intake.
pub mod event_names {
    /// Event carrying one full OTLP trace request as raw data.
    pub const RAW_DATA: &str = "$ai_raw_data";
}

/// Well-known property values.
pub mod formats {
    /// Format tag for raw OTLP trace payloads.
    pub const OTEL_TRACE: &str = "otel_trace";
}

/// Resource attribute keys consulted when extracting a distinct id.
pub mod resource_attributes {
    /// Product-specific distinct id attribute, checked first.
    pub const DISTINCT_ID: &str = "posthog.distinct_id";

    /// Generic user id attribute, used as fallback.
    pub const USER_ID: &str = "user.id";
}

/// Size limits applied to incoming payloads.
pub mod limits {
    /// Maximum accepted OTLP body size in bytes.
    pub const MAX_BODY_BYTES: usize = 4 * 1024 * 1024;
}
