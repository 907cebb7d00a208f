// Routing Cache - read-optimized job category -> queue name map

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// In-process routing lookup table
///
/// Owned by exactly one routing repository. Reads take the shared lock only;
/// every write (single entry or wholesale replacement) happens under the
/// exclusive lock, so readers never observe a half-applied reload.
#[derive(Debug, Default)]
pub struct RoutingCache {
    entries: RwLock<HashMap<String, String>>,
}

impl RoutingCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue name cached for `job_category`
    pub fn get(&self, job_category: &str) -> Option<String> {
        self.read().get(job_category).cloned()
    }

    pub fn insert(&self, job_category: impl Into<String>, queue_name: impl Into<String>) {
        self.write().insert(job_category.into(), queue_name.into());
    }

    pub fn remove(&self, job_category: &str) -> Option<String> {
        self.write().remove(job_category)
    }

    /// Swap in a freshly scanned table, returning its size
    pub fn replace_all<I>(&self, entries: I) -> usize
    where
        I: IntoIterator<Item = (String, String)>,
    {
        // Build outside the lock; only the swap blocks readers
        let fresh: HashMap<String, String> = entries.into_iter().collect();
        let len = fresh.len();
        *self.write() = fresh;
        len
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    // A panicking writer cannot leave the map half-replaced (the swap is a
    // single assignment), so a poisoned lock is safe to keep using.
    fn read(&self) -> RwLockReadGuard<'_, HashMap<String, String>> {
        self.entries.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<String, String>> {
        self.entries.write().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_insert_get_remove() {
        let cache = RoutingCache::new();
        assert_eq!(cache.get("email"), None);

        cache.insert("email", "default");
        assert_eq!(cache.get("email").as_deref(), Some("default"));

        cache.insert("email", "bulk");
        assert_eq!(cache.get("email").as_deref(), Some("bulk"));

        assert_eq!(cache.remove("email").as_deref(), Some("bulk"));
        assert!(cache.is_empty());
    }

    #[test]
    fn test_replace_all_drops_stale_entries() {
        let cache = RoutingCache::new();
        cache.insert("stale", "old");

        let size = cache.replace_all(vec![
            ("a".to_string(), "q1".to_string()),
            ("b".to_string(), "q2".to_string()),
        ]);

        assert_eq!(size, 2);
        assert_eq!(cache.get("stale"), None);
        assert_eq!(cache.get("b").as_deref(), Some("q2"));
    }

    #[test]
    fn test_concurrent_readers_see_complete_tables() {
        let cache = Arc::new(RoutingCache::new());
        let table_a: Vec<_> = (0..50)
            .map(|i| (format!("cat-{}", i), "A".to_string()))
            .collect();
        let table_b: Vec<_> = (0..50)
            .map(|i| (format!("cat-{}", i), "B".to_string()))
            .collect();
        cache.replace_all(table_a.clone());

        let writer = {
            let cache = Arc::clone(&cache);
            std::thread::spawn(move || {
                for round in 0..200 {
                    if round % 2 == 0 {
                        cache.replace_all(table_b.clone());
                    } else {
                        cache.replace_all(table_a.clone());
                    }
                }
            })
        };

        let readers: Vec<_> = (0..4)
            .map(|_| {
                let cache = Arc::clone(&cache);
                std::thread::spawn(move || {
                    for _ in 0..500 {
                        // Every category is always present, whatever table is live
                        assert!(cache.get("cat-0").is_some());
                        assert_eq!(cache.len(), 50);
                    }
                })
            })
            .collect();

        writer.join().unwrap();
        for r in readers {
            r.join().unwrap();
        }
    }
}
