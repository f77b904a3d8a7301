//! Sampling reader: a coordinator and a fixed pool of workers.
//!
//! On every tick the coordinator pushes one [`WorkUnit`] per worker through
//! the [`gate`](crate::gate) and waits until each has been taken. A worker
//! that receives a unit samples one random event of a random type from a
//! random trailing window and logs what it found.
//!
//! Read failures are logged per unit and never stop the pool.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use rand::Rng;
use rand::seq::IndexedRandom;
use stream_db::Storage;
use stream_types::Event;
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::error::ServiceError;
use crate::gate::{GateReceiver, gate};
use crate::schema::Schema;

/// Upper bound (exclusive) in seconds for both the window's distance from
/// now and its length.
pub const MAX_LOOKBACK_SECS: i64 = 300;

/// One unit of read work handed to a worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkUnit {
    /// Coordinator tick that produced this unit, starting at 1.
    pub tick: u64,
}

/// Result of a single sampled read.
#[derive(Debug, Clone)]
pub enum ReadOutcome {
    /// An event matched the window.
    Found(Event),
    /// The window held no event of the chosen type.
    NotFound,
    /// The query failed; the error has been logged.
    Failed,
}

/// Samples random events from storage with a pool of workers.
#[derive(Clone)]
pub struct Reader {
    store: Arc<dyn Storage>,
    schema: Arc<Schema>,
}

impl Reader {
    /// Create a reader over `store`, choosing event types from `schema`.
    pub const fn new(store: Arc<dyn Storage>, schema: Arc<Schema>) -> Self {
        Self { store, schema }
    }

    /// Run `workers` workers, dispatching one read each per `interval`,
    /// until `cancel` fires.
    ///
    /// On cancellation the gate is closed and every worker is awaited.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::NoWorkers`] for an empty pool and
    /// [`ServiceError::ZeroInterval`] for a zero interval.
    pub async fn run(
        &self,
        cancel: CancellationToken,
        interval: Duration,
        workers: usize,
    ) -> Result<(), ServiceError> {
        if workers == 0 {
            return Err(ServiceError::NoWorkers);
        }
        if interval.is_zero() {
            return Err(ServiceError::ZeroInterval);
        }

        let (tx, rx) = gate::<WorkUnit>();
        let handles: Vec<JoinHandle<()>> = (0..workers)
            .map(|worker_id| {
                let reader = self.clone();
                let rx = rx.clone();
                tokio::spawn(async move { reader.worker(worker_id, rx).await })
            })
            .collect();
        drop(rx);

        let mut ticker = time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        ticker.reset();

        info!(
            interval_ms = interval.as_millis(),
            workers,
            "Reader starting"
        );

        let mut tick: u64 = 0;
        'ticks: loop {
            tokio::select! {
                () = cancel.cancelled() => break,
                _ = ticker.tick() => {}
            }
            tick = tick.saturating_add(1);

            for _ in 0..workers {
                tokio::select! {
                    () = cancel.cancelled() => break 'ticks,
                    sent = tx.send(WorkUnit { tick }) => {
                        if sent.is_err() {
                            warn!(tick, "All reader workers exited");
                            break 'ticks;
                        }
                    }
                }
            }
            debug!(tick, workers, "Reads dispatched");
        }

        // --- Shutdown ---
        tx.close();
        for handle in handles {
            if let Err(e) = handle.await {
                warn!(error = %e, "Reader worker did not exit cleanly");
            }
        }

        info!(ticks = tick, "Reader stopped");
        Ok(())
    }

    /// Take units from the gate until it closes.
    async fn worker(&self, worker_id: usize, gate: GateReceiver<WorkUnit>) {
        debug!(worker_id, "Reader worker started");
        while let Some(unit) = gate.recv().await {
            self.read_once(worker_id, unit.tick).await;
        }
        debug!(worker_id, "Reader worker stopped");
    }

    /// Sample one event using the current time.
    pub async fn read_once(&self, worker_id: usize, tick: u64) -> ReadOutcome {
        self.read_at(worker_id, tick, Utc::now()).await
    }

    /// Sample one event of a random type from a random window ending
    /// no later than `now`, and log the result.
    pub async fn read_at(&self, worker_id: usize, tick: u64, now: DateTime<Utc>) -> ReadOutcome {
        let picked = {
            let mut rng = rand::rng();
            self.schema
                .event_types()
                .choose(&mut rng)
                .cloned()
                .map(|event_type| (event_type, random_window(&mut rng, now)))
        };
        let Some((event_type, (start, end))) = picked else {
            warn!(worker_id, tick, "Schema has no event types to read");
            return ReadOutcome::Failed;
        };

        match self.store.get_event(&event_type, start, end).await {
            Ok(Some(event)) => {
                match event.to_json() {
                    Ok(json) => info!(worker_id, tick, event = %json, "Event read"),
                    Err(e) => warn!(worker_id, tick, error = %e, "Failed to serialize event"),
                }
                ReadOutcome::Found(event)
            }
            Ok(None) => {
                info!(
                    worker_id,
                    tick,
                    event_type = event_type.as_str(),
                    start = %start,
                    end = %end,
                    "No event found"
                );
                ReadOutcome::NotFound
            }
            Err(e) => {
                warn!(
                    worker_id,
                    tick,
                    event_type = event_type.as_str(),
                    error = %e,
                    "Failed to read event"
                );
                ReadOutcome::Failed
            }
        }
    }
}

/// A window with `start = now - U[0, 300)s` and `end = start + U[0, 300)s`.
pub fn random_window<R: Rng>(rng: &mut R, now: DateTime<Utc>) -> (DateTime<Utc>, DateTime<Utc>) {
    let lookback = TimeDelta::seconds(rng.random_range(0..MAX_LOOKBACK_SECS));
    let span = TimeDelta::seconds(rng.random_range(0..MAX_LOOKBACK_SECS));
    let start = now.checked_sub_signed(lookback).unwrap_or(now);
    let end = start.checked_add_signed(span).unwrap_or(start);
    (start, end)
}
