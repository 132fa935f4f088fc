//! Renaming of OpenTelemetry gen-AI span attributes to internal properties.
//!
//! Events arriving through the OpenTelemetry path carry vendor-neutral
//! `gen_ai.*` attribute names. Downstream aggregation keys on the internal
//! `$ai_*` property names, so eligible events get a single rename pass over
//! their property bag before anything else looks at them.

use serde_json::Value;

use crate::constants::markers;
use crate::events::AnalyticsEvent;

/// Fixed rename table from OTel gen-AI attribute names to internal
/// property names. Never mutated at runtime.
pub const OTEL_ATTRIBUTE_MAP: [(&str, &str); 6] = [
    ("gen_ai.system", "$ai_provider"),
    ("gen_ai.request.model", "$ai_model"),
    ("gen_ai.usage.input_tokens", "$ai_input_tokens"),
    ("gen_ai.usage.output_tokens", "$ai_output_tokens"),
    ("gen_ai.input.messages", "$ai_input"),
    ("gen_ai.output.messages", "$ai_output_choices"),
];

/// Destination properties whose values arrive JSON-encoded as strings.
const JSON_ENCODED_PROPERTIES: [&str; 2] = ["$ai_input", "$ai_output_choices"];

/// Renames OTel gen-AI attributes in place on an eligible event.
///
/// The pass only runs when the event has properties and its
/// `$ai_ingestion_source` property is exactly the string `"otel"`; any other
/// event is left untouched. For each table entry whose source key is present
/// the value moves to the destination key and the source key is removed.
/// Values for [`JSON_ENCODED_PROPERTIES`] destinations that are strings are
/// decoded as JSON when possible; malformed JSON keeps the literal string.
/// A pre-existing destination value is overwritten. Keys outside the table,
/// the marker included, are never touched.
pub fn map_otel_attributes(event: &mut AnalyticsEvent) {
    let Some(properties) = event.properties.as_mut() else {
        return;
    };
    if properties
        .get(markers::INGESTION_SOURCE_KEY)
        .and_then(Value::as_str)
        != Some(markers::INGESTION_SOURCE_OTEL)
    {
        return;
    }

    for (source_key, dest_key) in OTEL_ATTRIBUTE_MAP {
        let Some(mut value) = properties.remove(source_key) else {
            continue;
        };
        if JSON_ENCODED_PROPERTIES.contains(&dest_key) {
            if let Value::String(encoded) = &value {
                // Malformed JSON degrades to the literal string.
                if let Ok(decoded) = serde_json::from_str(encoded) {
                    value = decoded;
                }
            }
        }
        properties.insert(dest_key.to_string(), value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn otel_event() -> AnalyticsEvent {
        let mut event = AnalyticsEvent::new("$ai_generation", "user-1");
        event.properties_mut().insert(
            markers::INGESTION_SOURCE_KEY.to_string(),
            json!(markers::INGESTION_SOURCE_OTEL),
        );
        event
    }

    #[test]
    fn test_event_without_properties_is_untouched() {
        let mut event = AnalyticsEvent::new("$ai_generation", "user-1");
        let before = event.clone();
        map_otel_attributes(&mut event);
        assert_eq!(event, before);
    }

    #[test]
    fn test_non_otel_sources_are_untouched() {
        for marker in [json!("sdk"), json!(""), json!(42), json!(null)] {
            let mut event = AnalyticsEvent::new("$ai_generation", "user-1");
            let props = event.properties_mut();
            props.insert(markers::INGESTION_SOURCE_KEY.to_string(), marker);
            props.insert("gen_ai.request.model".to_string(), json!("gpt-4.1"));
            let before = event.clone();

            map_otel_attributes(&mut event);
            assert_eq!(event, before);
        }
    }

    #[test]
    fn test_missing_marker_is_untouched() {
        let mut event = AnalyticsEvent::new("$ai_generation", "user-1");
        event
            .properties_mut()
            .insert("gen_ai.request.model".to_string(), json!("gpt-4.1"));
        let before = event.clone();

        map_otel_attributes(&mut event);
        assert_eq!(event, before);
    }

    #[test]
    fn test_every_pair_is_renamed() {
        for (source_key, dest_key) in OTEL_ATTRIBUTE_MAP {
            let mut event = otel_event();
            event
                .properties_mut()
                .insert(source_key.to_string(), json!("test-value"));

            map_otel_attributes(&mut event);

            let props = event.properties.unwrap();
            assert_eq!(props[dest_key], json!("test-value"));
            assert!(!props.contains_key(source_key));
        }
    }

    #[test]
    fn test_json_encoded_messages_are_decoded() {
        let mut event = otel_event();
        event.properties_mut().insert(
            "gen_ai.input.messages".to_string(),
            json!(r#"[{"role":"user","content":"Hello"}]"#),
        );

        map_otel_attributes(&mut event);

        let props = event.properties.unwrap();
        assert_eq!(
            props["$ai_input"],
            json!([{"role": "user", "content": "Hello"}])
        );
    }

    #[test]
    fn test_malformed_json_keeps_the_string() {
        let mut event = otel_event();
        event
            .properties_mut()
            .insert("gen_ai.input.messages".to_string(), json!("not valid json"));

        map_otel_attributes(&mut event);

        let props = event.properties.unwrap();
        assert_eq!(props["$ai_input"], json!("not valid json"));
    }

    #[test]
    fn test_already_structured_messages_are_not_decoded() {
        let messages = json!([{"role": "user", "content": "Hello"}]);
        let mut event = otel_event();
        event
            .properties_mut()
            .insert("gen_ai.output.messages".to_string(), messages.clone());

        map_otel_attributes(&mut event);

        let props = event.properties.unwrap();
        assert_eq!(props["$ai_output_choices"], messages);
    }

    #[test]
    fn test_non_eligible_destinations_skip_decoding() {
        let mut event = otel_event();
        event
            .properties_mut()
            .insert("gen_ai.request.model".to_string(), json!("\"quoted\""));

        map_otel_attributes(&mut event);

        // Looks like JSON but the model property is not in the decode set.
        let props = event.properties.unwrap();
        assert_eq!(props["$ai_model"], json!("\"quoted\""));
    }

    #[test]
    fn test_unrelated_keys_and_marker_are_preserved() {
        let mut event = otel_event();
        let props = event.properties_mut();
        props.insert("custom.attribute".to_string(), json!("custom-value"));
        props.insert("gen_ai.system".to_string(), json!("anthropic"));

        map_otel_attributes(&mut event);

        let props = event.properties.unwrap();
        assert_eq!(props["custom.attribute"], json!("custom-value"));
        assert_eq!(
            props[markers::INGESTION_SOURCE_KEY],
            json!(markers::INGESTION_SOURCE_OTEL)
        );
        assert_eq!(props["$ai_provider"], json!("anthropic"));
    }

    #[test]
    fn test_pre_existing_destination_is_overwritten() {
        let mut event = otel_event();
        let props = event.properties_mut();
        props.insert("$ai_model".to_string(), json!("stale"));
        props.insert("gen_ai.request.model".to_string(), json!("gpt-4.1"));

        map_otel_attributes(&mut event);

        let props = event.properties.unwrap();
        assert_eq!(props["$ai_model"], json!("gpt-4.1"));
        assert!(!props.contains_key("gen_ai.request.model"));
    }

    #[test]
    fn test_second_pass_is_a_no_op() {
        let mut event = otel_event();
        let props = event.properties_mut();
        props.insert("gen_ai.request.model".to_string(), json!("gpt-4.1"));
        props.insert("gen_ai.usage.input_tokens".to_string(), json!(120));

        map_otel_attributes(&mut event);
        let once = event.clone();
        map_otel_attributes(&mut event);

        // Source keys were consumed on the first pass, so the second pass
        // has nothing to rename.
        assert_eq!(event, once);
    }
}
