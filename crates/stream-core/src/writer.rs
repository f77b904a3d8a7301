//! Ticker-driven event producer.
//!
//! One tick produces one event: pick a random type from the schema, fill
//! its fields, stamp it with the current time and insert it. A failed
//! insert is logged and the loop moves on to the next tick.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use stream_db::Storage;
use stream_types::Event;
use tokio::time::{self, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::error::ServiceError;
use crate::generator::EventGenerator;
use crate::schema::Schema;

/// Generates and stores one event per interval.
#[derive(Clone)]
pub struct Writer {
    store: Arc<dyn Storage>,
    generator: EventGenerator,
}

impl Writer {
    /// Create a writer inserting into `store`.
    pub fn new(store: Arc<dyn Storage>, schema: Arc<Schema>) -> Self {
        Self {
            store,
            generator: EventGenerator::new(schema),
        }
    }

    /// Generate one event stamped with the current time.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError`] if the event cannot be built.
    pub fn next_event(&self) -> Result<Event, ServiceError> {
        let mut rng = rand::rng();
        self.generator.generate(&mut rng, Utc::now())
    }

    /// Generate and insert a single event. Insert failures are logged.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError`] only if generation fails.
    pub async fn write_once(&self) -> Result<(), ServiceError> {
        let event = self.next_event()?;
        match self.store.insert_event(&event).await {
            Ok(()) => debug!(
                id = %event.id(),
                event_type = event.event_type(),
                "Event written"
            ),
            Err(e) => warn!(
                id = %event.id(),
                event_type = event.event_type(),
                error = %e,
                "Failed to insert event"
            ),
        }
        Ok(())
    }

    /// Write one event per `interval` until `cancel` fires.
    ///
    /// The first event is written one full interval after start. An insert
    /// still in flight at cancellation is abandoned.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::ZeroInterval`] for a zero interval, or a
    /// generation error.
    pub async fn run(&self, cancel: CancellationToken, interval: Duration) -> Result<(), ServiceError> {
        if interval.is_zero() {
            return Err(ServiceError::ZeroInterval);
        }

        let mut ticker = time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        ticker.reset();

        info!(
            interval_ms = interval.as_millis(),
            event_types = self.generator.schema().len(),
            "Writer starting"
        );

        let mut written: u64 = 0;
        loop {
            tokio::select! {
                () = cancel.cancelled() => break,
                _ = ticker.tick() => {}
            }

            tokio::select! {
                () = cancel.cancelled() => break,
                result = self.write_once() => result?,
            }
            written = written.saturating_add(1);
        }

        info!(ticks = written, "Writer stopped");
        Ok(())
    }
}
