//! CloudEvents 1.0 envelope in JSON structured format.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const SPEC_VERSION: &str = "1.0";

/// Media type of a structured-mode CloudEvent.
pub const STRUCTURED_CONTENT_TYPE: &str = "application/cloudevents+json";

/// A CloudEvent as delivered by (and returned to) the invocation runtime.
///
/// The required attributes default to empty strings so a runtime that omits
/// them still gets its payload processed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CloudEvent {
    #[serde(default = "default_spec_version")]
    pub specversion: String,
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub source: String,
    #[serde(rename = "type", default)]
    pub event_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dataschema: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub datacontenttype: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    /// Base64 payload, carried opaque.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_base64: Option<String>,
    /// Extension attributes.
    #[serde(flatten)]
    pub extensions: BTreeMap<String, Value>,
}

fn default_spec_version() -> String {
    SPEC_VERSION.to_string()
}

impl CloudEvent {
    pub fn new(id: impl Into<String>, source: impl Into<String>, event_type: impl Into<String>) -> Self {
        Self {
            specversion: default_spec_version(),
            id: id.into(),
            source: source.into(),
            event_type: event_type.into(),
            subject: None,
            time: None,
            dataschema: None,
            datacontenttype: None,
            data: None,
            data_base64: None,
            extensions: BTreeMap::new(),
        }
    }

    /// Whether `datacontenttype` is absent or names a JSON media type.
    pub fn has_json_data(&self) -> bool {
        self.datacontenttype.as_deref().is_none_or(is_json_media_type)
    }
}

#[cfg(test)]
impl CloudEvent {
    pub fn with_data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }

    pub fn with_dataschema(mut self, schema: impl Into<String>) -> Self {
        self.dataschema = Some(schema.into());
        self
    }

    pub fn with_datacontenttype(mut self, content_type: impl Into<String>) -> Self {
        self.datacontenttype = Some(content_type.into());
        self
    }

    pub fn with_subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = Some(subject.into());
        self
    }
}

/// `application/json`, `text/json` and any `+json` suffix type.
pub fn is_json_media_type(content_type: &str) -> bool {
    let essence = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();
    essence == "application/json" || essence == "text/json" || essence.ends_with("+json")
}

/// Envelope attributes, addressable by wire name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EnvelopeField {
    SpecVersion,
    Id,
    Source,
    Type,
    Subject,
    Time,
    DataSchema,
    DataContentType,
    Data,
    DataBase64,
}

impl EnvelopeField {
    #[cfg(test)]
    pub const ALL: [EnvelopeField; 10] = [
        Self::SpecVersion,
        Self::Id,
        Self::Source,
        Self::Type,
        Self::Subject,
        Self::Time,
        Self::DataSchema,
        Self::DataContentType,
        Self::Data,
        Self::DataBase64,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::SpecVersion => "specversion",
            Self::Id => "id",
            Self::Source => "source",
            Self::Type => "type",
            Self::Subject => "subject",
            Self::Time => "time",
            Self::DataSchema => "dataschema",
            Self::DataContentType => "datacontenttype",
            Self::Data => "data",
            Self::DataBase64 => "data_base64",
        }
    }

    /// Copy this attribute from `from` into `to`. An absent optional
    /// attribute stays absent.
    pub fn copy(self, from: &CloudEvent, to: &mut CloudEvent) {
        match self {
            Self::SpecVersion => to.specversion.clone_from(&from.specversion),
            Self::Id => to.id.clone_from(&from.id),
            Self::Source => to.source.clone_from(&from.source),
            Self::Type => to.event_type.clone_from(&from.event_type),
            Self::Subject => to.subject.clone_from(&from.subject),
            Self::Time => to.time.clone_from(&from.time),
            Self::DataSchema => to.dataschema.clone_from(&from.dataschema),
            Self::DataContentType => to.datacontenttype.clone_from(&from.datacontenttype),
            Self::Data => to.data.clone_from(&from.data),
            Self::DataBase64 => to.data_base64.clone_from(&from.data_base64),
        }
    }

    /// Set this attribute to a text value.
    pub fn set_text(self, target: &mut CloudEvent, value: String) {
        match self {
            Self::SpecVersion => target.specversion = value,
            Self::Id => target.id = value,
            Self::Source => target.source = value,
            Self::Type => target.event_type = value,
            Self::Subject => target.subject = Some(value),
            Self::Time => target.time = Some(value),
            Self::DataSchema => target.dataschema = Some(value),
            Self::DataContentType => target.datacontenttype = Some(value),
            Self::Data => target.data = Some(Value::String(value)),
            Self::DataBase64 => target.data_base64 = Some(value),
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn deserializes_structured_event_with_extensions() {
        let raw = json!({
            "specversion": "1.0",
            "id": "evt-1",
            "source": "/shop/checkout",
            "type": "com.shop.products.order.completed",
            "dataschema": "https://shop.example/schemas/order.json",
            "datacontenttype": "application/json",
            "traceparent": "00-abc-def-01",
            "data": {"orderId": 42}
        });
        let event: CloudEvent = serde_json::from_value(raw).unwrap();
        assert_eq!(event.id, "evt-1");
        assert_eq!(event.event_type, "com.shop.products.order.completed");
        assert_eq!(event.data, Some(json!({"orderId": 42})));
        assert_eq!(event.extensions.get("traceparent"), Some(&json!("00-abc-def-01")));
    }

    #[test]
    fn missing_required_attributes_default() {
        let event: CloudEvent = serde_json::from_value(json!({"data": {}})).unwrap();
        assert_eq!(event.specversion, "1.0");
        assert!(event.id.is_empty());
        assert!(event.source.is_empty());
    }

    #[test]
    fn absent_optional_attributes_are_not_serialized() {
        let event = CloudEvent::new("1", "src", "t");
        let json = serde_json::to_value(&event).unwrap();
        let obj = json.as_object().unwrap();
        assert_eq!(obj.len(), 4);
        assert!(!obj.contains_key("dataschema"));
        assert!(!obj.contains_key("data"));
        assert_eq!(obj["type"], "t");
    }

    #[test]
    fn json_media_types() {
        assert!(is_json_media_type("application/json"));
        assert!(is_json_media_type("application/json; charset=utf-8"));
        assert!(is_json_media_type("application/vnd.shop.order+json"));
        assert!(is_json_media_type("Text/JSON"));
        assert!(!is_json_media_type("text/plain"));
        assert!(!is_json_media_type("application/octet-stream"));
    }

    #[test]
    fn copy_keeps_absent_fields_absent() {
        let from = CloudEvent::new("1", "a", "b").with_subject("order-7");
        let mut to = CloudEvent::new("2", "c", "d").with_dataschema("stale");
        EnvelopeField::Subject.copy(&from, &mut to);
        EnvelopeField::DataSchema.copy(&from, &mut to);
        assert_eq!(to.subject.as_deref(), Some("order-7"));
        assert_eq!(to.dataschema, None);
    }

    #[test]
    fn field_names_match_wire_names() {
        let mut event = CloudEvent::new("1", "a", "b")
            .with_subject("s")
            .with_dataschema("d")
            .with_datacontenttype("application/json")
            .with_data(json!(1));
        event.time = Some("2024-01-01T00:00:00Z".into());
        event.data_base64 = Some("AA==".into());
        let json = serde_json::to_value(&event).unwrap();
        for field in EnvelopeField::ALL {
            assert!(json.get(field.name()).is_some(), "missing {}", field.name());
        }
    }
}
