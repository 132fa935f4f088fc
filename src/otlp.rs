//! Conversion of OTLP trace requests into clean analytics JSON.
//!
//! The serde representation of the OTLP types keeps protobuf artifacts that
//! are useless to downstream consumers: `AnyValue` typed wrappers,
//! attributes as key-value arrays, and ids as byte arrays. This module
//! rewrites all of that into plain JSON and builds the `$ai_raw_data` event
//! carrying the result.

use opentelemetry_proto::tonic::collector::trace::v1::ExportTraceServiceRequest;
use opentelemetry_proto::tonic::common::v1::any_value;
use serde_json::{json, Map, Value};
use uuid::Uuid;

use crate::constants::{event_names, formats, markers, resource_attributes};
use crate::events::AnalyticsEvent;

/// Id fields serialized as byte arrays, hex-encoded per the OTLP spec.
const BYTE_ID_FIELDS: [&str; 3] = ["traceId", "spanId", "parentSpanId"];

/// `AnyValue` wrapper keys whose inner value can be taken as-is.
const SCALAR_WRAPPER_KEYS: [&str; 4] = ["stringValue", "boolValue", "intValue", "doubleValue"];

/// Builds the `$ai_raw_data` event for one decoded trace request.
///
/// The event carries the cleaned request JSON under `data` and is stamped
/// with the OTel ingestion-source marker so later property mapping can
/// recognize its provenance.
pub fn to_raw_data_event(request: &ExportTraceServiceRequest) -> AnalyticsEvent {
    let mut properties = Map::new();
    properties.insert("format".to_string(), json!(formats::OTEL_TRACE));
    properties.insert("data".to_string(), to_clean_json(request));
    properties.insert(
        markers::INGESTION_SOURCE_KEY.to_string(),
        json!(markers::INGESTION_SOURCE_OTEL),
    );

    let mut event = AnalyticsEvent::new(event_names::RAW_DATA, extract_distinct_id(request));
    event.properties = Some(properties);
    event
}

/// Serializes a trace request and normalizes the protobuf artifacts away.
pub fn to_clean_json(request: &ExportTraceServiceRequest) -> Value {
    let mut json = serde_json::to_value(request).expect("OTLP types are serializable");
    normalize(&mut json);
    json
}

/// Counts the spans in a trace request.
pub fn count_spans(request: &ExportTraceServiceRequest) -> usize {
    request
        .resource_spans
        .iter()
        .flat_map(|rs| &rs.scope_spans)
        .map(|ss| ss.spans.len())
        .sum()
}

/// Picks a distinct id from the resource attributes: the product-specific
/// attribute first, then `user.id`, then a random UUID.
pub fn extract_distinct_id(request: &ExportTraceServiceRequest) -> String {
    [resource_attributes::DISTINCT_ID, resource_attributes::USER_ID]
        .iter()
        .find_map(|key| resource_string_attribute(request, key))
        .unwrap_or_else(|| Uuid::new_v4().to_string())
}

fn resource_string_attribute(request: &ExportTraceServiceRequest, key: &str) -> Option<String> {
    request
        .resource_spans
        .iter()
        .filter_map(|rs| rs.resource.as_ref())
        .flat_map(|resource| &resource.attributes)
        .filter(|attr| attr.key == key)
        .find_map(|attr| match attr.value.as_ref()?.value.as_ref()? {
            any_value::Value::StringValue(s) if !s.is_empty() => Some(s.clone()),
            _ => None,
        })
}

/// Replaces empty `{}` `AnyValue` objects with `null` so the request
/// deserializes. Works around open-telemetry/opentelemetry-rust#1253.
pub fn patch_empty_any_values(value: &mut Value) {
    match value {
        Value::Object(map) => {
            if let Some(inner) = map.get_mut("value") {
                if inner.as_object().is_some_and(Map::is_empty) {
                    *inner = Value::Null;
                }
            }
            for (_, v) in map.iter_mut() {
                patch_empty_any_values(v);
            }
        }
        Value::Array(arr) => {
            for v in arr.iter_mut() {
                patch_empty_any_values(v);
            }
        }
        _ => {}
    }
}

/// Recursively unwraps `AnyValue` wrappers, flattens attribute arrays into
/// objects, and hex-encodes byte-array ids.
fn normalize(value: &mut Value) {
    match value {
        Value::Object(map) => {
            if let Some(inner) = unwrap_any_value(map) {
                *value = inner;
                return;
            }

            if let Some(attrs) = map.get("attributes") {
                if is_key_value_array(attrs) {
                    let flattened = flatten_key_values(attrs);
                    map.insert("attributes".to_string(), flattened);
                }
            }

            for key in BYTE_ID_FIELDS {
                if let Some(bytes) = map.get(key).and_then(as_byte_array) {
                    map.insert(key.to_string(), Value::String(hex::encode(&bytes)));
                }
            }

            for (_, v) in map.iter_mut() {
                normalize(v);
            }
        }
        Value::Array(arr) => {
            for v in arr.iter_mut() {
                normalize(v);
            }
        }
        _ => {}
    }
}

/// Extracts the inner value of a single-key `AnyValue` wrapper, if the map
/// is one.
fn unwrap_any_value(map: &Map<String, Value>) -> Option<Value> {
    if map.len() != 1 {
        return None;
    }
    let (key, inner) = map.iter().next()?;
    match key.as_str() {
        k if SCALAR_WRAPPER_KEYS.contains(&k) => Some(inner.clone()),
        "bytesValue" => as_byte_array(inner).map(|bytes| Value::String(hex::encode(&bytes))),
        "arrayValue" => inner.get("values").map(|values| {
            let mut clean = values.clone();
            normalize(&mut clean);
            clean
        }),
        "kvlistValue" => inner.get("values").map(flatten_key_values),
        _ => None,
    }
}

/// Checks for the OTel attributes shape: an array of `{key, value}` objects.
fn is_key_value_array(value: &Value) -> bool {
    matches!(value, Value::Array(arr) if arr.first()
        .and_then(Value::as_object)
        .is_some_and(|o| o.contains_key("key") && o.contains_key("value")))
}

/// Flattens a key-value array into a plain object with cleaned values.
fn flatten_key_values(value: &Value) -> Value {
    let mut map = Map::new();
    if let Value::Array(arr) = value {
        for item in arr {
            if let (Some(key), Some(inner)) =
                (item.get("key").and_then(Value::as_str), item.get("value"))
            {
                let mut clean = inner.clone();
                normalize(&mut clean);
                map.insert(key.to_string(), clean);
            }
        }
    }
    Value::Object(map)
}

fn as_byte_array(value: &Value) -> Option<Vec<u8>> {
    value.as_array().map(|arr| {
        arr.iter()
            .filter_map(|n| n.as_u64().map(|n| n as u8))
            .collect()
    })
}
