//! The [`Event`] struct and its content-addressed identity.
//!
//! # Identity
//!
//! ```text
//! id = hex(SHA-256( type_bytes || le_i64(unix_seconds) || canonical_json(extra_fields) ))
//! ```
//!
//! Only whole seconds enter the digest. Sub-second precision is kept on the
//! struct for display but two events that differ only below the second share
//! an ID.
//!
//! # Envelope
//!
//! On the wire an event is a single flat JSON object. `id`, `type` and `time`
//! sit next to every extra field rather than nesting them:
//!
//! ```json
//! {"id": "c685…", "type": "page_view", "time": "2023-11-14T22:13:20Z", "count": 42}
//! ```

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};

use crate::error::EventError;
use crate::ids::EventId;
use crate::value::{ExtraFields, FieldValue, is_reserved};

/// A single immutable stream event.
///
/// Fields are private so the ID can never drift from the content it was
/// computed over. Use [`Event::new`] for fresh events and
/// [`Event::from_stored`] for rows read back from a store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    id: EventId,
    event_type: String,
    time: DateTime<Utc>,
    extra_fields: ExtraFields,
}

impl Event {
    /// Build a new event and compute its ID.
    ///
    /// # Errors
    ///
    /// Returns [`EventError::EmptyType`] if `event_type` is empty,
    /// [`EventError::ReservedField`] if `extra_fields` contains `id`, `type`
    /// or `time`, and [`EventError::Serialization`] if the field payload
    /// cannot be encoded.
    pub fn new(
        event_type: impl Into<String>,
        time: DateTime<Utc>,
        extra_fields: ExtraFields,
    ) -> Result<Self, EventError> {
        let event_type = event_type.into();
        if event_type.is_empty() {
            return Err(EventError::EmptyType);
        }
        check_reserved(&extra_fields)?;

        let id = Self::compute_id(&event_type, time, &extra_fields)?;
        Ok(Self {
            id,
            event_type,
            time,
            extra_fields,
        })
    }

    /// Rebuild an event from persisted parts without recomputing the ID.
    ///
    /// # Errors
    ///
    /// Returns [`EventError::ReservedField`] if `extra_fields` contains `id`,
    /// `type` or `time`.
    pub fn from_stored(
        id: EventId,
        event_type: String,
        time: DateTime<Utc>,
        extra_fields: ExtraFields,
    ) -> Result<Self, EventError> {
        check_reserved(&extra_fields)?;
        Ok(Self {
            id,
            event_type,
            time,
            extra_fields,
        })
    }

    /// Compute the content digest for the given parts.
    ///
    /// # Errors
    ///
    /// Returns [`EventError::Serialization`] if the field payload cannot be
    /// encoded.
    pub fn compute_id(
        event_type: &str,
        time: DateTime<Utc>,
        extra_fields: &ExtraFields,
    ) -> Result<EventId, EventError> {
        let payload = serde_json::to_vec(extra_fields)?;

        let mut hasher = Sha256::new();
        hasher.update(event_type.as_bytes());
        hasher.update(time.timestamp().to_le_bytes());
        hasher.update(&payload);

        Ok(EventId::from_digest(&hasher.finalize()))
    }

    /// The content-addressed identifier.
    pub const fn id(&self) -> &EventId {
        &self.id
    }

    /// The schema entry this event belongs to.
    pub fn event_type(&self) -> &str {
        &self.event_type
    }

    /// When the event happened.
    pub const fn time(&self) -> DateTime<Utc> {
        self.time
    }

    /// The non-envelope payload.
    pub const fn extra_fields(&self) -> &ExtraFields {
        &self.extra_fields
    }

    /// Whether the stored ID still matches the content.
    pub fn is_consistent(&self) -> bool {
        Self::compute_id(&self.event_type, self.time, &self.extra_fields)
            .is_ok_and(|id| id == self.id)
    }

    // =========================================================================
    // Envelope encoding
    // =========================================================================

    /// Flatten the event into a single JSON object.
    ///
    /// # Errors
    ///
    /// Returns [`EventError::ReservedField`] if an extra field would replace
    /// one of the envelope keys.
    pub fn to_envelope(&self) -> Result<Map<String, Value>, EventError> {
        let mut map = Map::new();
        map.insert("id".to_owned(), Value::String(self.id.to_string()));
        map.insert("type".to_owned(), Value::String(self.event_type.clone()));
        map.insert(
            "time".to_owned(),
            Value::String(self.time.to_rfc3339_opts(SecondsFormat::AutoSi, true)),
        );

        for (key, value) in &self.extra_fields {
            if map.contains_key(key) {
                return Err(EventError::ReservedField(key.clone()));
            }
            map.insert(key.clone(), Value::from(value));
        }
        Ok(map)
    }

    /// Decode a flat envelope.
    ///
    /// `id`, `type` and `time` are lifted out. Every other key becomes an
    /// extra field.
    ///
    /// # Errors
    ///
    /// Returns [`EventError::MalformedEnvelope`] if `time` is missing or not
    /// an RFC 3339 string, if `type` or `id` is missing or not a string, or
    /// if an extra field is not an integer or a string.
    pub fn from_envelope(mut map: Map<String, Value>) -> Result<Self, EventError> {
        let raw_time = take_string(&mut map, "time")?;
        let time = DateTime::parse_from_rfc3339(&raw_time)
            .map_err(|e| {
                EventError::MalformedEnvelope(format!("invalid time {raw_time:?}: {e}"))
            })?
            .with_timezone(&Utc);
        let event_type = take_string(&mut map, "type")?;
        let id = take_string(&mut map, "id")?;

        let mut extra_fields = ExtraFields::new();
        for (key, value) in map {
            let Some(field) = FieldValue::from_json(&value) else {
                return Err(EventError::MalformedEnvelope(format!(
                    "field `{key}` has unsupported value {value}"
                )));
            };
            extra_fields.insert(key, field);
        }

        Self::from_stored(EventId::from(id), event_type, time, extra_fields)
    }

    /// Encode the envelope as a compact JSON string.
    ///
    /// # Errors
    ///
    /// Returns [`EventError::ReservedField`] as for [`Event::to_envelope`],
    /// or [`EventError::Serialization`] if encoding fails.
    pub fn to_json(&self) -> Result<String, EventError> {
        Ok(serde_json::to_string(&self.to_envelope()?)?)
    }

    /// Decode an envelope from a JSON string.
    ///
    /// # Errors
    ///
    /// Returns [`EventError::Serialization`] if the input is not a JSON
    /// object, or [`EventError::MalformedEnvelope`] as for
    /// [`Event::from_envelope`].
    pub fn from_json(json: &str) -> Result<Self, EventError> {
        let map: Map<String, Value> = serde_json::from_str(json)?;
        Self::from_envelope(map)
    }
}

/// Reject any extra field named after an envelope key.
fn check_reserved(extra_fields: &ExtraFields) -> Result<(), EventError> {
    match extra_fields.keys().find(|k| is_reserved(k)) {
        Some(key) => Err(EventError::ReservedField(key.clone())),
        None => Ok(()),
    }
}

/// Remove `key` from the envelope and require it to be a string.
fn take_string(map: &mut Map<String, Value>, key: &str) -> Result<String, EventError> {
    match map.remove(key) {
        Some(Value::String(s)) => Ok(s),
        Some(other) => Err(EventError::MalformedEnvelope(format!(
            "`{key}` must be a string, got {other}"
        ))),
        None => Err(EventError::MalformedEnvelope(format!("missing `{key}`"))),
    }
}

impl Serialize for Event {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_envelope()
            .map_err(serde::ser::Error::custom)?
            .serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Event {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let map = Map::<String, Value>::deserialize(deserializer)?;
        Self::from_envelope(map).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::{Duration, TimeZone};

    use super::*;

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).unwrap()
    }

    fn fields(pairs: &[(&str, FieldValue)]) -> ExtraFields {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_owned(), v.clone()))
            .collect()
    }

    #[test]
    fn id_layout_is_pinned() {
        let empty = Event::new("test_event", at(0), ExtraFields::new()).unwrap();
        assert_eq!(
            empty.id().as_str(),
            "cfa9b006cde9db2dd86f17c53f0adfcb9bee2333014ec43fd874b32bd1310a48"
        );

        let populated = Event::new(
            "page_view",
            at(1_700_000_000),
            fields(&[
                ("user", FieldValue::from("alice")),
                ("count", FieldValue::from(42_i64)),
            ]),
        )
        .unwrap();
        assert_eq!(
            populated.id().as_str(),
            "c685f03764569250bcc39a6d12a848f47b48e3e933263503c0d0d00d6f1dae9b"
        );
    }

    #[test]
    fn identical_inputs_share_an_id() {
        let f = fields(&[("count", FieldValue::from(1_i64))]);
        let a = Event::new("click", at(100), f.clone()).unwrap();
        let b = Event::new("click", at(100), f).unwrap();
        assert_eq!(a.id(), b.id());
        assert_eq!(a.id().as_str().len(), 64);
    }

    #[test]
    fn sub_second_precision_does_not_affect_id() {
        let base = at(100);
        let later = base + Duration::milliseconds(999);
        let a = Event::new("click", base, ExtraFields::new()).unwrap();
        let b = Event::new("click", later, ExtraFields::new()).unwrap();
        assert_eq!(a.id(), b.id());
        assert_ne!(a.time(), b.time());
    }

    #[test]
    fn any_differing_component_changes_id() {
        let f = fields(&[("count", FieldValue::from(1_i64))]);
        let base = Event::new("click", at(100), f.clone()).unwrap();

        let other_type = Event::new("view", at(100), f.clone()).unwrap();
        let other_second = Event::new("click", at(101), f).unwrap();
        let other_fields = Event::new(
            "click",
            at(100),
            fields(&[("count", FieldValue::from(2_i64))]),
        )
        .unwrap();
        let text_not_int = Event::new(
            "click",
            at(100),
            fields(&[("count", FieldValue::from("1"))]),
        )
        .unwrap();

        assert_ne!(base.id(), other_type.id());
        assert_ne!(base.id(), other_second.id());
        assert_ne!(base.id(), other_fields.id());
        assert_ne!(base.id(), text_not_int.id());
    }

    #[test]
    fn field_insertion_order_is_irrelevant() {
        let mut a = ExtraFields::new();
        a.insert("b".to_owned(), FieldValue::from(2_i64));
        a.insert("a".to_owned(), FieldValue::from(1_i64));
        let mut b = ExtraFields::new();
        b.insert("a".to_owned(), FieldValue::from(1_i64));
        b.insert("b".to_owned(), FieldValue::from(2_i64));

        let ea = Event::new("t", at(5), a).unwrap();
        let eb = Event::new("t", at(5), b).unwrap();
        assert_eq!(ea.id(), eb.id());
    }

    #[test]
    fn reserved_keys_are_rejected() {
        for key in ["id", "type", "time"] {
            let result = Event::new("t", at(0), fields(&[(key, FieldValue::from(1_i64))]));
            assert!(
                matches!(result, Err(EventError::ReservedField(ref k)) if k == key),
                "expected ReservedField for {key}"
            );
        }
    }

    #[test]
    fn empty_type_is_rejected() {
        let result = Event::new("", at(0), ExtraFields::new());
        assert!(matches!(result, Err(EventError::EmptyType)));
    }

    #[test]
    fn envelope_is_flat() {
        let event = Event::new(
            "page_view",
            at(1_700_000_000),
            fields(&[("count", FieldValue::from(42_i64))]),
        )
        .unwrap();
        let value = serde_json::to_value(&event).unwrap();

        assert_eq!(value["type"], "page_view");
        assert_eq!(value["time"], "2023-11-14T22:13:20Z");
        assert_eq!(value["id"], event.id().as_str());
        assert_eq!(value["count"], 42);
        assert_eq!(value.as_object().unwrap().len(), 4);
    }

    #[test]
    fn envelope_round_trip() {
        let time = at(1_700_000_000) + Duration::milliseconds(250);
        let original = Event::new(
            "purchase",
            time,
            fields(&[
                ("amount", FieldValue::from(1999_i64)),
                ("sku", FieldValue::from("A-1")),
            ]),
        )
        .unwrap();

        let json = original.to_json().unwrap();
        let restored = Event::from_json(&json).unwrap();

        assert_eq!(restored.id(), original.id());
        assert_eq!(restored.event_type(), original.event_type());
        assert_eq!(restored.time().timestamp(), original.time().timestamp());
        assert_eq!(restored.extra_fields(), original.extra_fields());
        assert!(restored.is_consistent());

        let via_serde: Event = serde_json::from_str(&json).unwrap();
        assert_eq!(via_serde, restored);
    }

    #[test]
    fn malformed_envelopes() {
        let cases = [
            r#"{"id": "x", "type": "t"}"#,
            r#"{"id": "x", "type": "t", "time": 12}"#,
            r#"{"id": "x", "type": "t", "time": "yesterday"}"#,
            r#"{"id": "x", "time": "2023-11-14T22:13:20Z"}"#,
            r#"{"id": "x", "type": 3, "time": "2023-11-14T22:13:20Z"}"#,
            r#"{"type": "t", "time": "2023-11-14T22:13:20Z"}"#,
            r#"{"id": 1, "type": "t", "time": "2023-11-14T22:13:20Z"}"#,
            r#"{"id": "x", "type": "t", "time": "2023-11-14T22:13:20Z", "ratio": 0.5}"#,
        ];
        for case in cases {
            let result = Event::from_json(case);
            assert!(
                matches!(result, Err(EventError::MalformedEnvelope(_))),
                "expected MalformedEnvelope for {case}"
            );
        }
    }

    #[test]
    fn non_object_input_is_a_serialization_error() {
        assert!(matches!(
            Event::from_json("[1, 2]"),
            Err(EventError::Serialization(_))
        ));
    }

    #[test]
    fn tampered_event_is_inconsistent() {
        let event = Event::from_stored(
            EventId::from("not-a-digest"),
            "t".to_owned(),
            at(0),
            ExtraFields::new(),
        )
        .unwrap();
        assert!(!event.is_consistent());
    }

    #[test]
    fn stored_events_reject_reserved_keys() {
        for key in ["id", "type", "time"] {
            let result = Event::from_stored(
                EventId::from("abc"),
                "click".to_owned(),
                at(0),
                fields(&[(key, FieldValue::from("evil"))]),
            );
            assert!(
                matches!(result, Err(EventError::ReservedField(ref k)) if k == key),
                "expected ReservedField for {key}"
            );
        }
    }

    #[test]
    fn envelope_never_drops_extra_fields() {
        let event = Event::from_stored(
            EventId::from("abc"),
            "click".to_owned(),
            at(0),
            fields(&[("id_hint", FieldValue::from(1_i64)), ("kind", FieldValue::from("evil"))]),
        )
        .unwrap();

        let envelope = event.to_envelope().unwrap();
        assert_eq!(envelope["id"], "abc");
        assert_eq!(envelope["type"], "click");
        assert_eq!(envelope["id_hint"], 1);
        assert_eq!(envelope["kind"], "evil");

        let restored = Event::from_json(&event.to_json().unwrap()).unwrap();
        assert_eq!(restored.extra_fields(), event.extra_fields());
    }
}
