//! Decoding of OTLP trace request bodies.
//!
//! Bodies arrive gzip-compressed or plain, as protobuf or JSON. The JSON
//! path patches empty `AnyValue` objects before deserializing, matching the
//! behavior of the upstream SDKs.

use std::io::Read;

use bytes::Bytes;
use flate2::read::GzDecoder;
use opentelemetry_proto::tonic::collector::trace::v1::ExportTraceServiceRequest;
use prost::Message;
use serde_json::Value;
use tracing::{debug, warn};

use crate::constants::limits;
use crate::error::IngestError;
use crate::events::AnalyticsEvent;
use crate::otlp;

const CONTENT_TYPE_PROTOBUF: &str = "application/x-protobuf";
const CONTENT_TYPE_JSON: &str = "application/json";

/// Decodes one OTLP trace request body into a `$ai_raw_data` event.
///
/// This is the whole intake path: size checks, optional gzip
/// decompression, protobuf or JSON parsing, and conversion to the
/// analytics event shape. Delivery of the result is the caller's concern.
pub fn ingest_trace_payload(
    body: Bytes,
    content_type: &str,
    content_encoding: Option<&str>,
) -> Result<AnalyticsEvent, IngestError> {
    let body = decode_body(body, content_encoding)?;
    let request = parse_trace_request(&body, content_type)?;
    debug!(
        spans = otlp::count_spans(&request),
        "decoded OTLP trace request"
    );
    Ok(otlp::to_raw_data_event(&request))
}

/// Checks size limits and reverses the content encoding, if any.
pub fn decode_body(body: Bytes, content_encoding: Option<&str>) -> Result<Bytes, IngestError> {
    if body.is_empty() {
        return Err(IngestError::EmptyPayload);
    }
    if body.len() > limits::MAX_BODY_BYTES {
        return Err(IngestError::PayloadTooLarge(body.len()));
    }
    match content_encoding {
        Some(encoding) if encoding.eq_ignore_ascii_case("gzip") => decompress_gzip(&body),
        _ => Ok(body),
    }
}

fn decompress_gzip(compressed: &Bytes) -> Result<Bytes, IngestError> {
    let mut decoder = GzDecoder::new(&compressed[..]);
    let mut decompressed = Vec::new();
    decoder
        .read_to_end(&mut decompressed)
        .map_err(|e| {
            warn!("failed to decompress gzip body: {}", e);
            IngestError::from(e)
        })?;
    if decompressed.len() > limits::MAX_BODY_BYTES {
        return Err(IngestError::PayloadTooLarge(decompressed.len()));
    }
    Ok(Bytes::from(decompressed))
}

/// Parses a decoded body as an OTLP trace request.
pub fn parse_trace_request(
    body: &[u8],
    content_type: &str,
) -> Result<ExportTraceServiceRequest, IngestError> {
    if content_type.starts_with(CONTENT_TYPE_PROTOBUF) {
        ExportTraceServiceRequest::decode(body).map_err(|e| {
            warn!("failed to decode OTLP protobuf: {}", e);
            IngestError::from(e)
        })
    } else if content_type.starts_with(CONTENT_TYPE_JSON) {
        let mut json: Value = serde_json::from_slice(body).map_err(|e| {
            warn!("failed to parse OTLP JSON: {}", e);
            IngestError::InvalidJson(e)
        })?;

        otlp::patch_empty_any_values(&mut json);

        serde_json::from_value(json).map_err(|e| {
            warn!("failed to parse OTLP trace request: {}", e);
            IngestError::InvalidTraceFormat(e)
        })
    } else {
        warn!("unsupported OTLP content type: {}", content_type);
        Err(IngestError::UnsupportedContentType(content_type.to_string()))
    }
}
