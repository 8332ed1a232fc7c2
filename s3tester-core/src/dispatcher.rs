//! A bounded worker pool that drains a queue of write jobs.
//!
//! The [`Dispatcher`] fills a queue with one [`WriteJob`] per object and closes it, then starts a
//! fixed number of workers. Each worker owns its own [`StorageClient`] and repeatedly takes the
//! next job off the queue until the queue is exhausted. The number of writes in flight is
//! therefore never larger than the number of workers.
//!
//! Failed writes are logged and counted, but never stop a worker. The dispatcher returns only
//! after every worker has exited, so no counter update can be in flight when the caller reads
//! the result.

use std::sync::Arc;

use bytes::Bytes;
use tokio::sync::{Mutex, mpsc};
use tracing::Instrument;

use crate::client::{ClientFactory, StorageClient};
use crate::counters::{Counters, TestResult};
use crate::error::{DispatchError, StorageError};
use crate::key::{KeyError, ObjectKey};
use crate::payload::Payload;

/// A single object write, identified by its 1-based position in the run.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WriteJob {
    /// Position of the job in the run, starting at `1`.
    pub sequence_index: u64,
}

/// The receiving end of the job queue, shared by all workers.
type JobQueue = Arc<Mutex<mpsc::UnboundedReceiver<WriteJob>>>;

/// Runs write jobs on a fixed-size pool of workers.
#[derive(Debug)]
pub struct Dispatcher<F> {
    factory: F,
    counters: Arc<Counters>,
    prefix_length: usize,
}

impl<F: ClientFactory> Dispatcher<F> {
    /// Creates a dispatcher that connects workers through `factory` and records into `counters`.
    ///
    /// Every object key gets `prefix_length` random characters.
    pub fn new(factory: F, counters: Arc<Counters>, prefix_length: usize) -> Self {
        Self {
            factory,
            counters,
            prefix_length,
        }
    }

    /// The counters this dispatcher records into.
    pub fn counters(&self) -> &Arc<Counters> {
        &self.counters
    }

    /// Writes `job_count` objects using `worker_count` concurrent workers.
    ///
    /// Returns once all jobs have either been written or recorded as failed, and all workers
    /// have exited. The counters are not reset; the returned [`TestResult`] is a snapshot of
    /// their state after the last worker exited.
    pub async fn run(
        &self,
        job_count: u64,
        worker_count: usize,
    ) -> Result<TestResult, DispatchError> {
        if worker_count == 0 {
            return Err(DispatchError::NoWorkers);
        }
        if self.prefix_length == 0 {
            return Err(KeyError::EmptyPrefix.into());
        }
        if job_count == 0 {
            tracing::debug!("no jobs to dispatch");
            return Ok(self.counters.snapshot());
        }

        let clients = (0..worker_count)
            .map(|worker| {
                self.factory
                    .connect()
                    .map_err(|cause| DispatchError::Connect { worker, cause })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let (sender, receiver) = mpsc::unbounded_channel();
        for sequence_index in 1..=job_count {
            // The receiver is alive until the end of this function, so sending cannot fail.
            sender.send(WriteJob { sequence_index }).ok();
        }
        drop(sender);
        let queue: JobQueue = Arc::new(Mutex::new(receiver));

        tracing::debug!(job_count, worker_count, "starting workers");
        let workers: Vec<_> = clients
            .into_iter()
            .enumerate()
            .map(|(id, client)| {
                let worker = Worker {
                    client,
                    queue: Arc::clone(&queue),
                    counters: Arc::clone(&self.counters),
                    prefix_length: self.prefix_length,
                };
                tokio::spawn(worker.run().instrument(tracing::debug_span!("worker", id)))
            })
            .collect();

        // Wait for *all* workers, even if one of them failed, before reporting anything.
        let mut failure = None;
        for joined in futures::future::join_all(workers).await {
            if let Err(error) = joined {
                tracing::error!(error = &error as &dyn std::error::Error, "worker task failed");
                if failure.is_none() {
                    failure = Some(error);
                }
            }
        }
        if let Some(error) = failure {
            return Err(error.into());
        }

        Ok(self.counters.snapshot())
    }
}

/// One task of the pool together with its private storage client.
struct Worker<C> {
    client: C,
    queue: JobQueue,
    counters: Arc<Counters>,
    prefix_length: usize,
}

impl<C: StorageClient> Worker<C> {
    async fn run(self) {
        let mut jobs = 0u64;
        while let Some(job) = self.next_job().await {
            self.execute(job).await;
            jobs += 1;
        }
        tracing::trace!(jobs, "queue drained, worker exiting");
    }

    async fn next_job(&self) -> Option<WriteJob> {
        self.queue.lock().await.recv().await
    }

    async fn execute(&self, job: WriteJob) {
        let key = match ObjectKey::generate(self.prefix_length, job.sequence_index) {
            Ok(key) => key,
            Err(error) => {
                tracing::warn!(error = &error as &dyn std::error::Error, ?job, "skipping job");
                self.counters.record_failure();
                return;
            }
        };

        let payload = Payload::random().into_bytes();
        let len = payload.len() as u64;

        match self.write(&key, payload).await {
            Ok(()) => self.counters.record_write(len),
            Err(error) => {
                tracing::warn!(
                    error = &error as &dyn std::error::Error,
                    key = %key,
                    bucket = self.client.bucket(),
                    "failed to write object"
                );
                self.counters.record_failure();
            }
        }
    }

    async fn write(&self, key: &ObjectKey, payload: Bytes) -> Result<(), StorageError> {
        tracing::trace!(key = %key, "writing object");
        self.client.put_object(key.as_str(), payload).await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex as SyncMutex;

    use super::*;

    #[derive(Debug, Default)]
    struct RecordingFactory {
        keys: Arc<SyncMutex<Vec<String>>>,
        connections: Arc<SyncMutex<usize>>,
    }

    #[derive(Debug)]
    struct RecordingClient {
        keys: Arc<SyncMutex<Vec<String>>>,
    }

    #[async_trait::async_trait]
    impl StorageClient for RecordingClient {
        fn bucket(&self) -> &str {
            "test"
        }

        async fn put_object(&self, key: &str, payload: Bytes) -> Result<(), StorageError> {
            assert_eq!(payload.len(), crate::PAYLOAD_SIZE);
            self.keys.lock().unwrap().push(key.to_owned());
            Ok(())
        }
    }

    impl ClientFactory for RecordingFactory {
        type Client = RecordingClient;

        fn connect(&self) -> Result<Self::Client, StorageError> {
            *self.connections.lock().unwrap() += 1;
            Ok(RecordingClient {
                keys: Arc::clone(&self.keys),
            })
        }
    }

    #[derive(Debug)]
    struct RefusingFactory;

    impl ClientFactory for RefusingFactory {
        type Client = RecordingClient;

        fn connect(&self) -> Result<Self::Client, StorageError> {
            Err(StorageError::msg("connection refused"))
        }
    }

    #[tokio::test]
    async fn one_connection_per_worker() {
        let factory = RecordingFactory::default();
        let connections = Arc::clone(&factory.connections);
        let keys = Arc::clone(&factory.keys);

        let dispatcher = Dispatcher::new(factory, Arc::new(Counters::new()), 8);
        let result = dispatcher.run(20, 3).await.unwrap();

        assert_eq!(result.objects_written, 20);
        assert_eq!(*connections.lock().unwrap(), 3);

        let mut indices: Vec<u64> = keys
            .lock()
            .unwrap()
            .iter()
            .map(|key| key.rsplit('-').next().unwrap().parse().unwrap())
            .collect();
        indices.sort_unstable();
        assert_eq!(indices, (1..=20).collect::<Vec<_>>());
    }

    #[tokio::test]
    async fn zero_workers_is_rejected() {
        let dispatcher = Dispatcher::new(RecordingFactory::default(), Arc::default(), 8);
        let result = dispatcher.run(5, 0).await;
        assert!(matches!(result, Err(DispatchError::NoWorkers)));
    }

    #[tokio::test]
    async fn zero_prefix_is_rejected() {
        let dispatcher = Dispatcher::new(RecordingFactory::default(), Arc::default(), 0);
        let result = dispatcher.run(5, 1).await;
        assert!(matches!(
            result,
            Err(DispatchError::Key(KeyError::EmptyPrefix))
        ));
    }

    #[tokio::test]
    async fn connect_failure_aborts_before_writing() {
        let counters = Arc::new(Counters::new());
        let dispatcher = Dispatcher::new(RefusingFactory, Arc::clone(&counters), 8);

        let result = dispatcher.run(5, 2).await;

        assert!(matches!(
            result,
            Err(DispatchError::Connect { worker: 0, .. })
        ));
        assert_eq!(counters.snapshot(), TestResult::default());
    }
}
