//! Event ingestion — pulls the order payload out of the inbound event.

use std::borrow::Cow;

use serde_json::Value;

use crate::error::ValidationError;
use crate::event::CloudEvent;

/// Fields strict ingestion requires, as dotted paths into the payload.
pub const REQUIRED_FIELDS: [&str; 4] = [
    "customer.name",
    "customer.email",
    "orderItems",
    "totalAmount",
];

/// Extract the candidate order payload from `event`.
///
/// A JSON payload delivered as a string is parsed. With `require_fields`
/// the payload must exist and contain every entry of [`REQUIRED_FIELDS`];
/// otherwise it is passed on as-is, possibly absent.
pub fn ingest(
    event: &CloudEvent,
    require_fields: bool,
) -> Result<Option<Cow<'_, Value>>, ValidationError> {
    let payload = extract_payload(event);

    if !require_fields {
        return Ok(payload);
    }

    let Some(data) = payload else {
        return Err(ValidationError::MissingData);
    };
    if !data.is_object() {
        return Err(ValidationError::NotAnObject);
    }

    let missing = missing_fields(&data);
    if !missing.is_empty() {
        return Err(ValidationError::MissingFields(missing));
    }

    Ok(Some(data))
}

fn extract_payload(event: &CloudEvent) -> Option<Cow<'_, Value>> {
    match event.data.as_ref()? {
        Value::Null => None,
        Value::String(text) if event.has_json_data() => match serde_json::from_str(text) {
            Ok(parsed) => Some(Cow::Owned(parsed)),
            Err(_) => event.data.as_ref().map(Cow::Borrowed),
        },
        data => Some(Cow::Borrowed(data)),
    }
}

/// Required paths that are absent or null in `data`.
pub fn missing_fields(data: &Value) -> Vec<String> {
    REQUIRED_FIELDS
        .iter()
        .filter(|path| lookup(data, path).is_none_or(Value::is_null))
        .map(|path| path.to_string())
        .collect()
}

fn lookup<'a>(data: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.').try_fold(data, |node, key| node.get(key))
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn event_with(data: Value) -> CloudEvent {
        CloudEvent::new("evt-1", "/shop", "order.completed").with_data(data)
    }

    fn complete_payload() -> Value {
        json!({
            "customer": {"name": "Ada", "email": "ada@example.com"},
            "orderItems": [],
            "totalAmount": 0
        })
    }

    #[test]
    fn strict_accepts_complete_payload() {
        let event = event_with(complete_payload());
        let payload = ingest(&event, true).unwrap().unwrap();
        assert_eq!(payload.as_ref(), &complete_payload());
        assert!(matches!(payload, Cow::Borrowed(_)));
    }

    #[test]
    fn strict_reports_every_missing_field() {
        let event = event_with(json!({"customer": {"name": "Ada"}}));
        let err = ingest(&event, true).unwrap_err();
        assert_eq!(
            err,
            ValidationError::MissingFields(vec![
                "customer.email".into(),
                "orderItems".into(),
                "totalAmount".into(),
            ])
        );
    }

    #[test]
    fn strict_treats_null_as_missing() {
        let mut payload = complete_payload();
        payload["totalAmount"] = Value::Null;
        let err = ingest(&event_with(payload), true).unwrap_err();
        assert_eq!(err, ValidationError::MissingFields(vec!["totalAmount".into()]));
    }

    #[test]
    fn strict_rejects_missing_data() {
        let event = CloudEvent::new("evt-1", "/shop", "order.completed");
        assert_eq!(ingest(&event, true).unwrap_err(), ValidationError::MissingData);
    }

    #[test]
    fn strict_rejects_non_object() {
        let event = event_with(json!([1, 2, 3]));
        assert_eq!(ingest(&event, true).unwrap_err(), ValidationError::NotAnObject);
    }

    #[test]
    fn permissive_passes_incomplete_payload() {
        let event = event_with(json!({"orderId": 7}));
        let payload = ingest(&event, false).unwrap().unwrap();
        assert_eq!(payload.as_ref(), &json!({"orderId": 7}));
    }

    #[test]
    fn permissive_allows_absent_data() {
        let event = CloudEvent::new("evt-1", "/shop", "order.completed");
        assert!(ingest(&event, false).unwrap().is_none());
    }

    #[test]
    fn json_string_payload_is_parsed() {
        let event = event_with(Value::String(complete_payload().to_string()))
            .with_datacontenttype("application/json");
        let payload = ingest(&event, true).unwrap().unwrap();
        assert_eq!(payload.as_ref(), &complete_payload());
    }

    #[test]
    fn text_payload_is_not_parsed() {
        let event = event_with(Value::String("{}".into())).with_datacontenttype("text/plain");
        let payload = ingest(&event, false).unwrap().unwrap();
        assert_eq!(payload.as_ref(), &Value::String("{}".into()));
    }

    #[test]
    fn ingest_leaves_event_untouched() {
        let event = event_with(Value::String(complete_payload().to_string()));
        let before = event.clone();
        let _ = ingest(&event, true);
        assert_eq!(event, before);
    }
}
