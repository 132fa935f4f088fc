use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

/// A single product analytics event as the ingestion pipeline sees it:
/// an event name, a distinct id, and an optional flat property bag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyticsEvent {
    pub event: String,
    pub distinct_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub properties: Option<Map<String, Value>>,
}

impl AnalyticsEvent {
    /// Creates an event with no properties.
    pub fn new(event: impl Into<String>, distinct_id: impl Into<String>) -> Self {
        Self {
            event: event.into(),
            distinct_id: distinct_id.into(),
            properties: None,
        }
    }

    /// Returns the property bag, creating an empty one if absent.
    pub fn properties_mut(&mut self) -> &mut Map<String, Value> {
        self.properties.get_or_insert_with(Map::new)
    }
}

/// An event stamped with the metadata assigned when it was accepted
/// for ingestion. Delivery is the caller's concern.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestedEvent {
    pub uuid: Uuid,
    pub received_at: DateTime<Utc>,
    pub event: AnalyticsEvent,
}

impl IngestedEvent {
    /// Stamps an event with a fresh v7 UUID and the current time.
    pub fn accept(event: AnalyticsEvent) -> Self {
        Self {
            uuid: Uuid::now_v7(),
            received_at: Utc::now(),
            event,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_event_serialization_skips_absent_properties() {
        let event = AnalyticsEvent::new("$ai_generation", "user-1");
        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(
            value,
            json!({"event": "$ai_generation", "distinct_id": "user-1"})
        );
    }

    #[test]
    fn test_event_round_trip() {
        let mut event = AnalyticsEvent::new("$ai_generation", "user-1");
        event
            .properties_mut()
            .insert("$ai_model".to_string(), json!("gpt-4.1"));

        let encoded = serde_json::to_string(&event).unwrap();
        let decoded: AnalyticsEvent = serde_json::from_str(&encoded).unwrap();
        assert_eq!(decoded, event);
    }

    #[test]
    fn test_accept_stamps_uuid_and_time() {
        let ingested = IngestedEvent::accept(AnalyticsEvent::new("$ai_raw_data", "user-1"));
        assert_eq!(ingested.uuid.get_version_num(), 7);
        assert_eq!(ingested.event.event, "$ai_raw_data");
    }
}
