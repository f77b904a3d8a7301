//! [`StreamService`]: one writer and one reader over a shared store.

use std::sync::Arc;
use std::time::Duration;

use stream_db::Storage;
use tokio_util::sync::CancellationToken;

use crate::error::ServiceError;
use crate::reader::Reader;
use crate::schema::Schema;
use crate::writer::Writer;

/// Owns a [`Writer`] and a [`Reader`] built from the same store and schema.
///
/// The two halves share no mutable state and can run concurrently, in
/// separate processes, or alone.
#[derive(Clone)]
pub struct StreamService {
    writer: Writer,
    reader: Reader,
}

impl StreamService {
    /// Build both halves over `store` and `schema`.
    pub fn new(store: Arc<dyn Storage>, schema: Arc<Schema>) -> Self {
        Self {
            writer: Writer::new(Arc::clone(&store), Arc::clone(&schema)),
            reader: Reader::new(store, schema),
        }
    }

    /// Run the writer until `cancel` fires. See [`Writer::run`].
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError`] if the writer cannot start.
    pub async fn run_writer(
        &self,
        cancel: CancellationToken,
        interval: Duration,
    ) -> Result<(), ServiceError> {
        self.writer.run(cancel, interval).await
    }

    /// Run the reader pool until `cancel` fires. See [`Reader::run`].
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError`] if the pool cannot start.
    pub async fn run_reader(
        &self,
        cancel: CancellationToken,
        interval: Duration,
        workers: usize,
    ) -> Result<(), ServiceError> {
        self.reader.run(cancel, interval, workers).await
    }
}
