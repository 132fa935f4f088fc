use thiserror::Error;

/// Errors produced while decoding an OTLP trace payload.
///
/// Only the intake path (decompression and parsing) is fallible; the
/// attribute mapper never returns an error.
#[derive(Debug, Error)]
pub enum IngestError {
    #[error("empty payload")]
    EmptyPayload,

    #[error("payload of {0} bytes exceeds the ingestion limit")]
    PayloadTooLarge(usize),

    #[error("failed to decompress gzip body: {0}")]
    Decompression(#[from] std::io::Error),

    #[error("invalid protobuf: {0}")]
    InvalidProtobuf(#[from] prost::DecodeError),

    #[error("invalid JSON: {0}")]
    InvalidJson(serde_json::Error),

    #[error("invalid OTLP trace format: {0}")]
    InvalidTraceFormat(serde_json::Error),

    #[error("unsupported content type {0:?}, expected application/x-protobuf or application/json")]
    UnsupportedContentType(String),
}
