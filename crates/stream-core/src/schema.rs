//! Event schema loading and validation.
//!
//! The schema file maps every event type to the fields the writer should
//! generate for it:
//!
//! ```json
//! {
//!   "page_view": { "type_mapping": { "time": "timestamp", "user_id": "bigint", "duration": "int" } },
//!   "purchase":  { "type_mapping": { "time": "timestamp", "amount": "int", "sku": "text" } }
//! }
//! ```
//!
//! JSON is the default. A `.yaml` or `.yml` extension selects YAML with the
//! same structure. Any structural problem is a fatal [`SchemaError`]; the
//! schema is loaded once at startup and never changes afterwards.

use std::collections::BTreeMap;
use std::path::Path;

use serde_json::Value;

/// Errors that can occur when loading a schema.
#[derive(Debug, thiserror::Error)]
pub enum SchemaError {
    /// Failed to read the schema file from disk.
    #[error("failed to read schema file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse JSON content.
    #[error("failed to parse schema JSON: {source}")]
    Json {
        /// The underlying JSON parse error.
        source: serde_json::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse schema YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },

    /// The document root or an event entry is not a mapping.
    #[error("schema entry `{0}` is not an object")]
    NotAnObject(String),

    /// An event entry has no `type_mapping` object.
    #[error("event type `{0}` is missing a `type_mapping` object")]
    MissingTypeMapping(String),

    /// A field's type tag is not a string.
    #[error("field `{field}` of event type `{event_type}` has a non-string type tag")]
    NonStringTag {
        /// Event type declaring the field.
        event_type: String,
        /// Offending field name.
        field: String,
    },

    /// A field uses a name reserved for the event envelope.
    #[error("field `{field}` of event type `{event_type}` uses a reserved name")]
    ReservedField {
        /// Event type declaring the field.
        event_type: String,
        /// Offending field name.
        field: String,
    },

    /// An event type name is empty.
    #[error("event type names must not be empty")]
    EmptyEventType,

    /// The schema declares no event types.
    #[error("schema declares no event types")]
    Empty,
}

impl From<serde_json::Error> for SchemaError {
    fn from(source: serde_json::Error) -> Self {
        Self::Json { source }
    }
}

impl From<serde_yml::Error> for SchemaError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Field that carries the event timestamp. It lives on the envelope, so the
/// generator never produces a value for it.
pub const TIME_FIELD: &str = "time";

/// Declared scalar type of a schema field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldType {
    /// 32-bit integer column; generated in `0..=i32::MAX`.
    Int,
    /// 64-bit integer column; generated in `0..=i64::MAX`.
    BigInt,
    /// Free text; generated as a short alphanumeric string.
    Text,
    /// Any other tag. Kept for diagnostics and skipped by the generator.
    Unsupported(String),
}

impl FieldType {
    /// Map a schema type tag to a [`FieldType`].
    pub fn from_tag(tag: &str) -> Self {
        match tag {
            "int" => Self::Int,
            "bigint" => Self::BigInt,
            "text" => Self::Text,
            other => Self::Unsupported(other.to_owned()),
        }
    }

    /// The raw tag of a [`FieldType::Unsupported`] field.
    pub fn unsupported_tag(&self) -> Option<&str> {
        match self {
            Self::Unsupported(tag) => Some(tag),
            _ => None,
        }
    }
}

/// Fields declared for a single event type.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventSchema {
    fields: BTreeMap<String, FieldType>,
}

impl EventSchema {
    /// Build from a field map.
    pub const fn new(fields: BTreeMap<String, FieldType>) -> Self {
        Self { fields }
    }

    /// Declared fields, including `time` if present.
    pub const fn fields(&self) -> &BTreeMap<String, FieldType> {
        &self.fields
    }

    /// Fields the generator fills in: every declared field except `time`.
    pub fn generated_fields(&self) -> impl Iterator<Item = (&str, &FieldType)> {
        self.fields
            .iter()
            .filter(|(name, _)| name.as_str() != TIME_FIELD)
            .map(|(name, ty)| (name.as_str(), ty))
    }
}

/// The full event schema: event type name to its declared fields.
///
/// Guaranteed non-empty, with no reserved field names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Schema {
    entries: BTreeMap<String, EventSchema>,
    /// Sorted type names, cached for uniform random choice.
    names: Vec<String>,
}

impl Schema {
    /// Build and validate a schema from already-parsed entries.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError::Empty`] when `entries` is empty,
    /// [`SchemaError::EmptyEventType`] for an empty type name, and
    /// [`SchemaError::ReservedField`] for a field named `id` or `type`.
    pub fn new(entries: BTreeMap<String, EventSchema>) -> Result<Self, SchemaError> {
        if entries.is_empty() {
            return Err(SchemaError::Empty);
        }
        for (event_type, entry) in &entries {
            if event_type.is_empty() {
                return Err(SchemaError::EmptyEventType);
            }
            for field in entry.fields.keys() {
                if field != TIME_FIELD && stream_types::is_reserved(field) {
                    return Err(SchemaError::ReservedField {
                        event_type: event_type.clone(),
                        field: field.clone(),
                    });
                }
            }
        }

        let names = entries.keys().cloned().collect();
        Ok(Self { entries, names })
    }

    /// Load a schema file, choosing the format from its extension.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError::Io`] if the file cannot be read, a parse error
    /// if it is not valid JSON/YAML, or a structural error as for
    /// [`Schema::from_value`].
    pub fn from_file(path: &Path) -> Result<Self, SchemaError> {
        let contents = std::fs::read_to_string(path)?;
        let is_yaml = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("yaml") || ext.eq_ignore_ascii_case("yml"));

        if is_yaml {
            Self::parse_yaml(&contents)
        } else {
            Self::parse_json(&contents)
        }
    }

    /// Parse a JSON schema document.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError::Json`] for invalid JSON, or a structural error.
    pub fn parse_json(json: &str) -> Result<Self, SchemaError> {
        let value: Value = serde_json::from_str(json)?;
        Self::from_value(&value)
    }

    /// Parse a YAML schema document.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError::Yaml`] for invalid YAML, or a structural error.
    pub fn parse_yaml(yaml: &str) -> Result<Self, SchemaError> {
        let value: Value = serde_yml::from_str(yaml)?;
        Self::from_value(&value)
    }

    /// Validate a decoded document.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError::NotAnObject`], [`SchemaError::MissingTypeMapping`]
    /// or [`SchemaError::NonStringTag`] for structural problems, plus the
    /// errors of [`Schema::new`].
    pub fn from_value(value: &Value) -> Result<Self, SchemaError> {
        let root = value
            .as_object()
            .ok_or_else(|| SchemaError::NotAnObject(String::from("<root>")))?;

        let mut entries = BTreeMap::new();
        for (event_type, entry) in root {
            let entry = entry
                .as_object()
                .ok_or_else(|| SchemaError::NotAnObject(event_type.clone()))?;
            let mapping = entry
                .get("type_mapping")
                .and_then(Value::as_object)
                .ok_or_else(|| SchemaError::MissingTypeMapping(event_type.clone()))?;

            let mut fields = BTreeMap::new();
            for (field, tag) in mapping {
                let tag = tag.as_str().ok_or_else(|| SchemaError::NonStringTag {
                    event_type: event_type.clone(),
                    field: field.clone(),
                })?;
                let field_type = FieldType::from_tag(tag);
                if let Some(tag) = field_type.unsupported_tag().filter(|_| field != TIME_FIELD) {
                    tracing::warn!(
                        event_type = event_type.as_str(),
                        field = field.as_str(),
                        tag,
                        "Unsupported field type, field will not be generated"
                    );
                }
                fields.insert(field.clone(), field_type);
            }
            entries.insert(event_type.clone(), EventSchema::new(fields));
        }

        Self::new(entries)
    }

    /// Sorted event type names.
    pub fn event_types(&self) -> &[String] {
        &self.names
    }

    /// Fields declared for `event_type`.
    pub fn get(&self, event_type: &str) -> Option<&EventSchema> {
        self.entries.get(event_type)
    }

    /// Number of event types.
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Always `false`; kept for API symmetry with [`Schema::len`].
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "page_view": {"type_mapping": {"time": "timestamp", "user_id": "bigint", "duration": "int"}},
        "purchase": {"type_mapping": {"time": "timestamp", "amount": "int", "sku": "text"}}
    }"#;

    #[test]
    fn parses_sample_schema() {
        let schema = Schema::parse_json(SAMPLE).unwrap();
        assert_eq!(schema.event_types(), ["page_view", "purchase"]);
        assert_eq!(schema.len(), 2);

        let page_view = schema.get("page_view").unwrap();
        assert_eq!(page_view.fields().get("user_id"), Some(&FieldType::BigInt));
        assert_eq!(page_view.fields().get("duration"), Some(&FieldType::Int));
        assert_eq!(
            page_view.fields().get("time"),
            Some(&FieldType::Unsupported(String::from("timestamp")))
        );

        let purchase = schema.get("purchase").unwrap();
        assert_eq!(purchase.fields().get("sku"), Some(&FieldType::Text));
        assert!(schema.get("refund").is_none());
    }

    #[test]
    fn generated_fields_skip_time() {
        let schema = Schema::parse_json(SAMPLE).unwrap();
        let names: Vec<&str> = schema
            .get("page_view")
            .unwrap()
            .generated_fields()
            .map(|(name, _)| name)
            .collect();
        assert_eq!(names, ["duration", "user_id"]);
    }

    #[test]
    fn parses_yaml() {
        let yaml = "
click:
  type_mapping:
    x: int
    y: int
";
        let schema = Schema::parse_yaml(yaml).unwrap();
        assert_eq!(schema.event_types(), ["click"]);
        assert_eq!(schema.get("click").unwrap().fields().len(), 2);
    }

    #[test]
    fn event_without_fields_is_allowed() {
        let schema = Schema::parse_json(r#"{"ping": {"type_mapping": {}}}"#).unwrap();
        assert_eq!(schema.get("ping").unwrap().generated_fields().count(), 0);
    }

    #[test]
    fn missing_type_mapping_is_fatal() {
        let result = Schema::parse_json(r#"{"ping": {"fields": {}}}"#);
        assert!(matches!(result, Err(SchemaError::MissingTypeMapping(ref t)) if t == "ping"));

        let result = Schema::parse_json(r#"{"ping": {"type_mapping": ["a"]}}"#);
        assert!(matches!(result, Err(SchemaError::MissingTypeMapping(_))));
    }

    #[test]
    fn non_string_tag_is_fatal() {
        let result = Schema::parse_json(r#"{"ping": {"type_mapping": {"n": 5}}}"#);
        assert!(matches!(
            result,
            Err(SchemaError::NonStringTag { ref event_type, ref field })
                if event_type == "ping" && field == "n"
        ));
    }

    #[test]
    fn non_object_entries_are_fatal() {
        assert!(matches!(
            Schema::parse_json(r#"["ping"]"#),
            Err(SchemaError::NotAnObject(_))
        ));
        assert!(matches!(
            Schema::parse_json(r#"{"ping": "int"}"#),
            Err(SchemaError::NotAnObject(ref t)) if t == "ping"
        ));
    }

    #[test]
    fn reserved_field_names_are_fatal() {
        for field in ["id", "type"] {
            let json = format!(r#"{{"ping": {{"type_mapping": {{"{field}": "int"}}}}}}"#);
            assert!(matches!(
                Schema::parse_json(&json),
                Err(SchemaError::ReservedField { .. })
            ));
        }
    }

    #[test]
    fn empty_schema_is_fatal() {
        assert!(matches!(Schema::parse_json("{}"), Err(SchemaError::Empty)));
        assert!(matches!(
            Schema::parse_json(r#"{"": {"type_mapping": {}}}"#),
            Err(SchemaError::EmptyEventType)
        ));
    }

    #[test]
    fn invalid_json_is_a_parse_error() {
        assert!(matches!(
            Schema::parse_json("{not json"),
            Err(SchemaError::Json { .. })
        ));
    }

    #[test]
    fn loads_from_file_by_extension() {
        let dir = std::env::temp_dir();
        let nanos = chrono::Utc::now().timestamp_nanos_opt().unwrap_or(0);

        let json_path = dir.join(format!("stream-schema-{nanos}.json"));
        std::fs::write(&json_path, SAMPLE).unwrap();
        let from_json = Schema::from_file(&json_path).unwrap();
        std::fs::remove_file(&json_path).unwrap();

        let yaml_path = dir.join(format!("stream-schema-{nanos}.yml"));
        std::fs::write(
            &yaml_path,
            "purchase:\n  type_mapping:\n    amount: int\n    sku: text\n",
        )
        .unwrap();
        let from_yaml = Schema::from_file(&yaml_path).unwrap();
        std::fs::remove_file(&yaml_path).unwrap();

        assert_eq!(from_json.len(), 2);
        assert_eq!(from_yaml.event_types(), ["purchase"]);
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let result = Schema::from_file(Path::new("/definitely/not/here.json"));
        assert!(matches!(result, Err(SchemaError::Io { .. })));
    }
}
