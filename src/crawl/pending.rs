// src/crawl/pending.rs
// =============================================================================
// Termination detection.
//
// The crawl has no fixed amount of work: every page can schedule more pages.
// So we count outstanding tasks instead. Scheduling a task takes a
// PendingGuard (count + 1); the guard is moved into the task and dropped when
// the task ends, however it ends (count - 1). When the count reaches zero
// nothing is running or queued, and nothing can schedule more work, so the
// coordinator can stop waiting.
// =============================================================================

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::Notify;

#[derive(Debug, Default)]
pub struct PendingCount {
    count: AtomicUsize,
    zero: Notify,
}

impl PendingCount {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Registers one more outstanding task
    pub fn acquire(self: &Arc<Self>) -> PendingGuard {
        self.count.fetch_add(1, Ordering::SeqCst);
        PendingGuard {
            pending: Arc::clone(self),
        }
    }

    pub fn get(&self) -> usize {
        self.count.load(Ordering::SeqCst)
    }

    /// Waits until every guard has been dropped
    ///
    /// Only one waiter is supported; the crawl coordinator is the only caller.
    pub async fn wait_for_zero(&self) {
        while self.count.load(Ordering::SeqCst) != 0 {
            self.zero.notified().await;
        }
    }

    fn release(&self) {
        if self.count.fetch_sub(1, Ordering::SeqCst) == 1 {
            // notify_one stores a permit if nobody is waiting yet, so the
            // wakeup can't be lost
            self.zero.notify_one();
        }
    }
}

/// One outstanding task. Dropping it marks the task finished.
#[derive(Debug)]
pub struct PendingGuard {
    pending: Arc<PendingCount>,
}

impl Drop for PendingGuard {
    fn drop(&mut self) {
        self.pending.release();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_guards_count_up_and_down() {
        let pending = PendingCount::new();
        let a = pending.acquire();
        let b = pending.acquire();
        assert_eq!(pending.get(), 2);
        drop(a);
        assert_eq!(pending.get(), 1);
        drop(b);
        assert_eq!(pending.get(), 0);
    }

    #[tokio::test]
    async fn test_wait_returns_immediately_when_idle() {
        let pending = PendingCount::new();
        tokio::time::timeout(Duration::from_secs(1), pending.wait_for_zero())
            .await
            .unwrap();
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_wait_for_nested_work() {
        let pending = PendingCount::new();
        let root = pending.acquire();

        // The root spawns children before finishing, like a crawl task
        let spawner = Arc::clone(&pending);
        tokio::spawn(async move {
            let _root = root;
            for _ in 0..10 {
                let child = spawner.acquire();
                tokio::spawn(async move {
                    tokio::time::sleep(Duration::from_millis(20)).await;
                    drop(child);
                });
            }
        });

        tokio::time::timeout(Duration::from_secs(5), pending.wait_for_zero())
            .await
            .unwrap();
        assert_eq!(pending.get(), 0);
    }

    #[tokio::test]
    async fn test_guard_released_on_panic() {
        let pending = PendingCount::new();
        let guard = pending.acquire();

        let result = tokio::spawn(async move {
            let _guard = guard;
            panic!("task blew up");
        })
        .await;

        assert!(result.is_err());
        assert_eq!(pending.get(), 0);
    }
}
