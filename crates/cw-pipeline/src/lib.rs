// SPDX-License-Identifier: MIT OR Apache-2.0
#![doc = include_str!("../README.md")]
#![deny(unsafe_code)]
#![warn(missing_docs)]

//! Bounded-concurrency chunk pipeline.

use std::sync::Arc;

use futures::future::BoxFuture;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinSet;

use cw_core::{Chunk, Finding, ScanContext};
use cw_error::CwError;

/// Default bound on the source-to-worker channel (spec §5.2).
pub const DEFAULT_CHANNEL_CAPACITY: usize = 64;

/// A function that turns one chunk into zero or more findings,
/// including any live verification. Wraps the detector registry,
/// resolver, and verifier harness so this crate never depends on
/// `cw-detectors` or `cw-verify` directly. Takes the chunk by value and
/// a clone of the worker's [`ScanContext`] so the returned future can
/// race its own network waits against cancellation.
pub type ChunkHandler = Arc<dyn Fn(Chunk, ScanContext) -> BoxFuture<'static, Vec<Finding>> + Send + Sync>;

/// A function that consumes a finished finding (writes it to a report,
/// queues it for verification, etc).
pub type FindingSink = Arc<dyn Fn(Finding) + Send + Sync>;

/// Runs a fixed pool of workers pulling chunks from one bounded
/// channel fed by a source.
pub struct Pipeline {
    worker_count: usize,
    channel_capacity: usize,
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::new(num_workers_default(), DEFAULT_CHANNEL_CAPACITY)
    }
}

fn num_workers_default() -> usize {
    std::thread::available_parallelism().map_or(4, std::num::NonZeroUsize::get)
}

impl Pipeline {
    /// Construct a pipeline with an explicit worker count and channel
    /// capacity.
    #[must_use]
    pub fn new(worker_count: usize, channel_capacity: usize) -> Self {
        Self {
            worker_count: worker_count.max(1),
            channel_capacity: channel_capacity.max(1),
        }
    }

    /// Run the pipeline: spawn `worker_count` workers that each pull
    /// chunks from the shared channel, run `handler` on them, and push
    /// every resulting finding to `sink`. Returns once every chunk
    /// producer has finished, every worker has drained its queue, and
    /// `produce` has resolved.
    ///
    /// `produce` is given the sending half of the channel and is
    /// responsible for calling a source's `chunks`/`chunk_unit` methods
    /// and sending each chunk; the channel's bounded capacity applies
    /// backpressure against `produce` automatically.
    pub async fn run<P, Fut>(
        &self,
        ctx: ScanContext,
        handler: ChunkHandler,
        sink: FindingSink,
        produce: P,
    ) -> Result<(), CwError>
    where
        P: FnOnce(mpsc::Sender<Chunk>) -> Fut,
        Fut: std::future::Future<Output = Result<(), CwError>> + Send + 'static,
    {
        let (tx, rx) = mpsc::channel(self.channel_capacity);
        let rx = Arc::new(Mutex::new(rx));

        let mut workers = JoinSet::new();
        for _ in 0..self.worker_count {
            let rx = Arc::clone(&rx);
            let handler = Arc::clone(&handler);
            let sink = Arc::clone(&sink);
            let worker_ctx = ctx.child();
            workers.spawn(async move {
                loop {
                    let chunk = {
                        let mut guard = rx.lock().await;
                        tokio::select! {
                            biased;
                            () = worker_ctx.cancelled() => None,
                            chunk = guard.recv() => chunk,
                        }
                    };
                    let Some(chunk) = chunk else { break };
                    for finding in handler(chunk, worker_ctx.clone()).await {
                        sink(finding);
                    }
                }
            });
        }

        let produce_handle = tokio::spawn(produce(tx));

        let produce_result = produce_handle
            .await
            .map_err(|e| CwError::fatal(format!("chunk producer task panicked: {e}")))?;

        while workers.join_next().await.is_some() {}

        produce_result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cw_core::SourceType;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex as StdMutex;

    #[tokio::test]
    async fn processes_every_chunk_exactly_once() {
        let pipeline = Pipeline::new(3, 8);
        let ctx = ScanContext::new(1, 1);

        let handler: ChunkHandler = Arc::new(move |chunk, _ctx| {
            Box::pin(async move {
                vec![Finding {
                    detector_type: cw_core::DetectorType::new(1),
                    raw: String::from_utf8_lossy(&chunk.data).into_owned(),
                    raw_v2: None,
                    redacted: "***".into(),
                    verification: cw_core::VerificationStatus::Unverified,
                    meta: chunk.meta.clone(),
                    source_name: chunk.source_name.clone(),
                    source_id: chunk.source_id,
                    job_id: chunk.job_id,
                    extra_data: Default::default(),
                    structured_data: None,
                    analysis: Default::default(),
                }]
            })
        });

        let sink_count = Arc::new(AtomicUsize::new(0));
        let sink_count_clone = Arc::clone(&sink_count);
        let sink: FindingSink = Arc::new(move |_finding| {
            sink_count_clone.fetch_add(1, Ordering::SeqCst);
        });

        pipeline
            .run(ctx, handler, sink, |tx| async move {
                for i in 0..20 {
                    let chunk = Chunk::new(format!("chunk-{i}").into_bytes(), SourceType::Other, "t");
                    tx.send(chunk).await.ok();
                }
                Ok(())
            })
            .await
            .unwrap();

        assert_eq!(sink_count.load(Ordering::SeqCst), 20);
    }

    #[tokio::test]
    async fn cancelled_context_stops_workers_promptly() {
        let pipeline = Pipeline::new(2, 4);
        let ctx = ScanContext::new(1, 1);
        let order = Arc::new(StdMutex::new(Vec::new()));
        let order_clone = Arc::clone(&order);

        let handler: ChunkHandler = Arc::new(move |_chunk, _ctx| Box::pin(async { Vec::new() }));
        let sink: FindingSink = Arc::new(|_finding| {});

        let cancel_ctx = ctx.clone();
        pipeline
            .run(ctx, handler, sink, move |tx| async move {
                cancel_ctx.cancel();
                order_clone.lock().unwrap().push("cancelled");
                drop(tx);
                Ok(())
            })
            .await
            .unwrap();

        assert_eq!(order.lock().unwrap().as_slice(), ["cancelled"]);
    }
}
