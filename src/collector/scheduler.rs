// src/collector/scheduler.rs

//! Drivers for the shared per-sample processing contract.
//!
//! Two entry points feed the same [`Collector::process`] call: a batch
//! runner that drains one ingestion result under a worker budget and
//! joins, and a perpetual queue consumer behind the live submission
//! endpoint. Samples are independent and order-insensitive; no ordering
//! is guaranteed between them.

use std::sync::Arc;

use futures::stream::{self, StreamExt};
use tokio::sync::{Mutex, mpsc};

use crate::collector::Collector;
use crate::models::Sample;

/// Sending half of the live submission queue.
pub type SampleSender = mpsc::UnboundedSender<Sample>;

/// Summary of one batch run.
#[derive(Debug, Default)]
pub struct BatchReport {
    /// Samples driven to a terminal record
    pub processed: usize,
}

/// Process one batch of samples, at most `workers` concurrently, and
/// return once every sample has reached its terminal record.
pub async fn run_batch(
    collector: Arc<Collector>,
    samples: Vec<Sample>,
    workers: usize,
) -> BatchReport {
    let processed = stream::iter(samples)
        .map(|sample| {
            let collector = Arc::clone(&collector);
            async move {
                collector.process(sample).await;
            }
        })
        .buffer_unordered(workers.max(1))
        .count()
        .await;

    BatchReport { processed }
}

/// Spawn `workers` long-lived tasks consuming the live queue and return
/// the sender the submission endpoint pushes into.
///
/// Workers run until every sender is dropped; there is no batch
/// boundary and nothing joins them.
pub fn spawn_workers(collector: Arc<Collector>, workers: usize) -> SampleSender {
    let (tx, rx) = mpsc::unbounded_channel::<Sample>();
    let rx = Arc::new(Mutex::new(rx));

    for worker in 0..workers.max(1) {
        let collector = Arc::clone(&collector);
        let rx = Arc::clone(&rx);
        tokio::spawn(async move {
            loop {
                // Hold the lock only for the pull so siblings can pick
                // up the next sample while this one is processed.
                let sample = { rx.lock().await.recv().await };
                let Some(sample) = sample else {
                    break;
                };
                log::info!("Worker {} processing sample {}", worker, sample.url);
                collector.process(sample).await;
            }
        });
    }

    tx
}
