//! Synthetic event generation from a [`Schema`].

use std::sync::Arc;

use chrono::{DateTime, Utc};
use rand::Rng;
use rand::distr::{Alphanumeric, Distribution};
use rand::seq::IndexedRandom;
use stream_types::{Event, ExtraFields, FieldValue};

use crate::error::ServiceError;
use crate::schema::{FieldType, Schema};

/// Length of generated `text` values.
pub const TEXT_FIELD_LEN: usize = 16;

/// Builds random events that conform to the loaded schema.
#[derive(Debug, Clone)]
pub struct EventGenerator {
    schema: Arc<Schema>,
}

impl EventGenerator {
    /// Create a generator over `schema`.
    pub const fn new(schema: Arc<Schema>) -> Self {
        Self { schema }
    }

    /// The schema this generator draws from.
    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Choose an event type uniformly at random.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::EmptySchema`] if the schema has no types.
    pub fn pick_event_type<R: Rng>(&self, rng: &mut R) -> Result<&str, ServiceError> {
        self.schema
            .event_types()
            .choose(rng)
            .map(String::as_str)
            .ok_or(ServiceError::EmptySchema)
    }

    /// Generate a value for every supported field of `event_type`.
    ///
    /// `time` and fields with unsupported tags are left out.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::UnknownEventType`] if the type is not declared.
    pub fn generate_fields<R: Rng>(
        &self,
        event_type: &str,
        rng: &mut R,
    ) -> Result<ExtraFields, ServiceError> {
        let entry = self
            .schema
            .get(event_type)
            .ok_or_else(|| ServiceError::UnknownEventType(event_type.to_owned()))?;

        let mut fields = ExtraFields::new();
        for (name, field_type) in entry.generated_fields() {
            if let Some(value) = random_value(field_type, rng) {
                fields.insert(name.to_owned(), value);
            }
        }
        Ok(fields)
    }

    /// Generate one complete event stamped with `now`.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError`] if the schema is empty or the event cannot be
    /// constructed.
    pub fn generate<R: Rng>(
        &self,
        rng: &mut R,
        now: DateTime<Utc>,
    ) -> Result<Event, ServiceError> {
        let event_type = self.pick_event_type(rng)?;
        let fields = self.generate_fields(event_type, rng)?;
        Ok(Event::new(event_type, now, fields)?)
    }
}

/// A random value for `field_type`, or `None` if the type is unsupported.
pub fn random_value<R: Rng>(field_type: &FieldType, rng: &mut R) -> Option<FieldValue> {
    match field_type {
        FieldType::Int => Some(FieldValue::from(rng.random_range(0..=i32::MAX))),
        FieldType::BigInt => Some(FieldValue::from(rng.random_range(0..=i64::MAX))),
        FieldType::Text => {
            let text: String = (0..TEXT_FIELD_LEN)
                .map(|_| char::from(Alphanumeric.sample(rng)))
                .collect();
            Some(FieldValue::from(text))
        }
        FieldType::Unsupported(_) => None,
    }
}
