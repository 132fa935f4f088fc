//! Converts OpenTelemetry gen-AI trace data into product analytics events.
//!
//! This crate is the transformation layer between OTLP instrumentation and
//! the analytics ingestion pipeline. It owns two jobs:
//!
//! - Decoding an OTLP trace request body (gzip or plain, protobuf or JSON)
//!   into a single `$ai_raw_data` analytics event with clean JSON payload.
//! - Renaming the vendor-neutral `gen_ai.*` span attributes on an event's
//!   property bag into the internal `$ai_*` property names, decoding the
//!   JSON-encoded message payloads along the way.
//!
//! Everything around these two jobs — HTTP routing, authentication, quota
//! checks, batching, and delivery — belongs to the caller.
//!
//! # Example
//!
//! ```rust
//! use otlp_genai_ingest::{map_otel_attributes, AnalyticsEvent};
//! use serde_json::json;
//!
//! let mut event = AnalyticsEvent::new("$ai_generation", "user-1");
//! let props = event.properties_mut();
//! props.insert("$ai_ingestion_source".to_string(), json!("otel"));
//! props.insert("gen_ai.request.model".to_string(), json!("gpt-4.1"));
//! props.insert(
//!     "gen_ai.input.messages".to_string(),
//!     json!(r#"[{"role":"user","content":"Hello"}]"#),
//! );
//!
//! map_otel_attributes(&mut event);
//!
//! let props = event.properties.unwrap();
//! assert_eq!(props["$ai_model"], json!("gpt-4.1"));
//! assert_eq!(
//!     props["$ai_input"],
//!     json!([{"role": "user", "content": "Hello"}])
//! );
//! ```

pub mod attributes;
pub mod constants;
pub mod error;
pub mod events;
pub mod otlp;
pub mod payload;

pub use attributes::map_otel_attributes;
pub use error::IngestError;
pub use events::{AnalyticsEvent, IngestedEvent};
pub use payload::ingest_trace_payload;
