// src/crawl/visited.rs
// =============================================================================
// The visited set: which URLs has this crawl already claimed?
//
// It only ever grows. The important operation is `try_mark_visited`, which
// checks and inserts under ONE write lock. Checking under a read lock and
// inserting under a separate write lock would let two tasks both see "not
// visited" and both schedule the same page.
// =============================================================================

use std::collections::HashSet;
use tokio::sync::RwLock;

#[derive(Debug, Default)]
pub struct VisitedSet {
    urls: RwLock<HashSet<String>>,
}

impl VisitedSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claims `url`. Returns true if the caller is the first to see it and
    /// must now process it, false if someone else already did.
    pub async fn try_mark_visited(&self, url: &str) -> bool {
        let mut urls = self.urls.write().await;
        if urls.contains(url) {
            return false;
        }
        urls.insert(url.to_string())
    }

    /// Records `url` without caring whether it was already there
    pub async fn mark(&self, url: &str) {
        let mut urls = self.urls.write().await;
        if !urls.contains(url) {
            urls.insert(url.to_string());
        }
    }

    pub async fn contains(&self, url: &str) -> bool {
        self.urls.read().await.contains(url)
    }

    pub async fn len(&self) -> usize {
        self.urls.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.urls.read().await.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_mark_twice() {
        let visited = VisitedSet::new();
        assert!(visited.try_mark_visited("http://a/").await);
        assert!(!visited.try_mark_visited("http://a/").await);
        assert!(visited.contains("http://a/").await);
        assert_eq!(visited.len().await, 1);
    }

    #[tokio::test]
    async fn test_mark_then_try() {
        let visited = VisitedSet::new();
        visited.mark("#top").await;
        visited.mark("#top").await;
        assert!(!visited.try_mark_visited("#top").await);
        assert_eq!(visited.len().await, 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 8)]
    async fn test_only_one_claim_wins_under_contention() {
        let visited = Arc::new(VisitedSet::new());

        let handles: Vec<_> = (0..64)
            .map(|_| {
                let visited = Arc::clone(&visited);
                tokio::spawn(async move { visited.try_mark_visited("http://a/shared").await })
            })
            .collect();

        let mut winners = 0;
        for handle in handles {
            if handle.await.unwrap() {
                winners += 1;
            }
        }

        assert_eq!(winners, 1);
    }
}
