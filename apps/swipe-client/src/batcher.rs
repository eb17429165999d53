use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use serde_json::Value;
use tokio::runtime::Handle;
use tracing::{debug, warn};

use crate::{ClientError, SwipeAction};

/// Queued passes are sent once this many have accumulated.
pub const DEFAULT_BATCH_THRESHOLD: usize = 5;

/// Where batches and immediate actions go. `GigswipeClient` is the HTTP
/// implementation.
#[async_trait]
pub trait BatchSink: Send + Sync + 'static {
    async fn send_batch(&self, actions: Vec<SwipeAction>) -> Result<(), ClientError>;

    async fn apply(&self, job_id: &str) -> Result<(), ClientError>;
}

/// Queues passes for one user and sends them in batches.
///
/// The queue is swapped for an empty one under the lock before anything is
/// sent, so every queued pass belongs to exactly one batch and passes made
/// during a send land in the next one.
pub struct SwipeBatcher<S: BatchSink> {
    sink: Arc<S>,
    pending: Mutex<Vec<SwipeAction>>,
    threshold: usize,
}

impl<S: BatchSink> SwipeBatcher<S> {
    pub fn new(sink: Arc<S>) -> Self {
        Self::with_threshold(sink, DEFAULT_BATCH_THRESHOLD)
    }

    pub fn with_threshold(sink: Arc<S>, threshold: usize) -> Self {
        Self {
            sink,
            pending: Mutex::new(Vec::new()),
            threshold: threshold.max(1),
        }
    }

    fn queue(&self) -> MutexGuard<'_, Vec<SwipeAction>> {
        // The queue is a plain Vec; a panic elsewhere cannot leave it half-written.
        self.pending.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn pending(&self) -> usize {
        self.queue().len()
    }

    /// Queues a pass, sending the whole queue once it reaches the threshold.
    pub async fn pass(&self, job_id: &str, job_data: Option<Value>) -> Result<(), ClientError> {
        let full = {
            let mut queue = self.queue();
            queue.push(SwipeAction::pass(job_id, job_data));
            if queue.len() >= self.threshold {
                Some(std::mem::take(&mut *queue))
            } else {
                None
            }
        };

        match full {
            Some(batch) => self.send(batch).await,
            None => Ok(()),
        }
    }

    /// Saves right away. A pass still queued for the same job is dropped so
    /// the later save is the only outcome sent.
    pub async fn save(&self, job_id: &str, job_data: Option<Value>) -> Result<(), ClientError> {
        self.queue().retain(|a| a.job_id != job_id);
        self.send(vec![SwipeAction::save(job_id, job_data)]).await
    }

    pub async fn apply(&self, job_id: &str) -> Result<(), ClientError> {
        self.sink.apply(job_id).await
    }

    /// Sends whatever is queued. Returns how many passes were sent.
    pub async fn flush(&self) -> Result<usize, ClientError> {
        let batch = std::mem::take(&mut *self.queue());
        if batch.is_empty() {
            return Ok(0);
        }
        let n = batch.len();
        self.send(batch).await?;
        Ok(n)
    }

    /// A failed batch is logged and dropped, not re-queued.
    async fn send(&self, batch: Vec<SwipeAction>) -> Result<(), ClientError> {
        let n = batch.len();
        match self.sink.send_batch(batch).await {
            Ok(()) => {
                debug!("Sent batch of {n} swipe actions");
                Ok(())
            }
            Err(e) => {
                warn!("Dropping batch of {n} swipe actions: {e}");
                Err(e)
            }
        }
    }
}

impl<S: BatchSink> Drop for SwipeBatcher<S> {
    fn drop(&mut self) {
        let batch = std::mem::take(&mut *self.queue());
        if batch.is_empty() {
            return;
        }
        let n = batch.len();
        match Handle::try_current() {
            Ok(handle) => {
                let sink = Arc::clone(&self.sink);
                handle.spawn(async move {
                    if let Err(e) = sink.send_batch(batch).await {
                        warn!("Final flush of {n} swipe actions failed: {e}");
                    }
                });
            }
            Err(_) => warn!("Discarding {n} queued swipe actions: no runtime to flush on"),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;
    use std::sync::atomic::{AtomicBool, Ordering};

    use super::*;
    use crate::ActionKind;

    #[derive(Default)]
    struct RecordingSink {
        batches: Mutex<Vec<Vec<SwipeAction>>>,
        applied: Mutex<Vec<String>>,
        fail: AtomicBool,
    }

    impl RecordingSink {
        fn batches(&self) -> Vec<Vec<SwipeAction>> {
            self.batches.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl BatchSink for RecordingSink {
        async fn send_batch(&self, actions: Vec<SwipeAction>) -> Result<(), ClientError> {
            if self.fail.load(Ordering::SeqCst) {
                return Err(ClientError::Api {
                    status: 500,
                    message: "boom".into(),
                });
            }
            self.batches.lock().unwrap().push(actions);
            Ok(())
        }

        async fn apply(&self, job_id: &str) -> Result<(), ClientError> {
            self.applied.lock().unwrap().push(job_id.to_string());
            Ok(())
        }
    }

    fn ids(batch: &[SwipeAction]) -> Vec<&str> {
        batch.iter().map(|a| a.job_id.as_str()).collect()
    }

    #[tokio::test]
    async fn test_fifth_pass_sends_the_batch() {
        let sink = Arc::new(RecordingSink::default());
        let batcher = SwipeBatcher::new(sink.clone());

        for i in 1..=4 {
            batcher.pass(&format!("j{i}"), None).await.unwrap();
        }
        assert!(sink.batches().is_empty());
        assert_eq!(batcher.pending(), 4);

        batcher.pass("j5", None).await.unwrap();
        let batches = sink.batches();
        assert_eq!(batches.len(), 1);
        assert_eq!(ids(&batches[0]), vec!["j1", "j2", "j3", "j4", "j5"]);
        assert!(batches[0].iter().all(|a| a.action == ActionKind::Pass));
        assert_eq!(batcher.pending(), 0);
    }

    #[tokio::test]
    async fn test_save_and_apply_bypass_the_queue() {
        let sink = Arc::new(RecordingSink::default());
        let batcher = SwipeBatcher::new(sink.clone());

        batcher.pass("j1", None).await.unwrap();
        batcher
            .save("j2", Some(serde_json::json!({"title": "Saved"})))
            .await
            .unwrap();
        batcher.apply("j3").await.unwrap();

        let batches = sink.batches();
        assert_eq!(batches.len(), 1);
        assert_eq!(batches[0][0].action, ActionKind::Save);
        assert_eq!(ids(&batches[0]), vec!["j2"]);
        assert_eq!(*sink.applied.lock().unwrap(), vec!["j3".to_string()]);
        assert_eq!(batcher.pending(), 1);
    }

    #[tokio::test]
    async fn test_save_drops_queued_pass_for_same_job() {
        let sink = Arc::new(RecordingSink::default());
        let batcher = SwipeBatcher::new(sink.clone());

        batcher.pass("j1", None).await.unwrap();
        batcher.pass("j2", None).await.unwrap();
        batcher.save("j1", None).await.unwrap();
        assert_eq!(batcher.pending(), 1);
        assert_eq!(batcher.flush().await.unwrap(), 1);

        let batches = sink.batches();
        assert_eq!(batches.len(), 2);
        assert_eq!(ids(&batches[0]), vec!["j1"]);
        assert_eq!(batches[0][0].action, ActionKind::Save);
        assert_eq!(ids(&batches[1]), vec!["j2"]);
    }

    #[tokio::test]
    async fn test_flush_sends_remainder_once() {
        let sink = Arc::new(RecordingSink::default());
        let batcher = SwipeBatcher::new(sink.clone());

        assert_eq!(batcher.flush().await.unwrap(), 0);
        batcher.pass("j1", None).await.unwrap();
        batcher.pass("j2", None).await.unwrap();
        assert_eq!(batcher.flush().await.unwrap(), 2);
        assert_eq!(batcher.flush().await.unwrap(), 0);
        assert_eq!(sink.batches().len(), 1);
    }

    #[tokio::test]
    async fn test_failed_batch_is_dropped() {
        let sink = Arc::new(RecordingSink::default());
        let batcher = SwipeBatcher::with_threshold(sink.clone(), 2);

        sink.fail.store(true, Ordering::SeqCst);
        batcher.pass("j1", None).await.unwrap();
        assert!(batcher.pass("j2", None).await.is_err());
        assert_eq!(batcher.pending(), 0);

        sink.fail.store(false, Ordering::SeqCst);
        batcher.pass("j3", None).await.unwrap();
        batcher.pass("j4", None).await.unwrap();
        let batches = sink.batches();
        assert_eq!(batches.len(), 1);
        assert_eq!(ids(&batches[0]), vec!["j3", "j4"]);
    }

    #[tokio::test]
    async fn test_drop_flushes_in_background() {
        let sink = Arc::new(RecordingSink::default());
        {
            let batcher = SwipeBatcher::new(sink.clone());
            batcher.pass("j1", None).await.unwrap();
            batcher.pass("j2", None).await.unwrap();
        }
        for _ in 0..10 {
            if !sink.batches().is_empty() {
                break;
            }
            tokio::task::yield_now().await;
        }
        let batches = sink.batches();
        assert_eq!(batches.len(), 1);
        assert_eq!(ids(&batches[0]), vec!["j1", "j2"]);
    }

    #[test]
    fn test_drop_without_runtime_does_not_panic() {
        let sink = Arc::new(RecordingSink::default());
        let batcher = SwipeBatcher::new(sink.clone());
        batcher.queue().push(SwipeAction::pass("j1", None));
        drop(batcher);
        assert!(sink.batches().is_empty());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_passes_each_sent_once() {
        let sink = Arc::new(RecordingSink::default());
        let batcher = Arc::new(SwipeBatcher::new(sink.clone()));

        let handles: Vec<_> = (0..23)
            .map(|i| {
                let batcher = Arc::clone(&batcher);
                tokio::spawn(async move { batcher.pass(&format!("j{i}"), None).await })
            })
            .collect();
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        let batches = sink.batches();
        assert_eq!(batches.len(), 4);
        assert!(batches.iter().all(|b| b.len() == DEFAULT_BATCH_THRESHOLD));

        let sent: Vec<&str> = batches.iter().flat_map(|b| ids(b)).collect();
        let unique: HashSet<&str> = sent.iter().copied().collect();
        assert_eq!(sent.len(), 20);
        assert_eq!(unique.len(), 20);
        assert_eq!(batcher.pending(), 3);
    }
}
