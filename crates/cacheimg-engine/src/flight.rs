use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use cacheimg_types::StoreKey;

/// In-process set of keys with a fetch under way.
#[derive(Clone, Debug, Default)]
pub struct SingleFlight {
    keys: Arc<Mutex<HashSet<String>>>,
}

impl SingleFlight {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim `key`. Returns `None` if another fill holds it.
    pub fn try_acquire(&self, key: &StoreKey) -> Option<FlightGuard> {
        let key = key.to_string();
        if !lock(&self.keys).insert(key.clone()) {
            return None;
        }
        Some(FlightGuard {
            keys: Arc::clone(&self.keys),
            key,
        })
    }

    pub fn is_in_flight(&self, key: &StoreKey) -> bool {
        lock(&self.keys).contains(&key.to_string())
    }
}

/// Releases its key on drop, including on panic or cancellation.
#[derive(Debug)]
pub struct FlightGuard {
    keys: Arc<Mutex<HashSet<String>>>,
    key: String,
}

impl Drop for FlightGuard {
    fn drop(&mut self) {
        lock(&self.keys).remove(&self.key);
    }
}

fn lock(keys: &Mutex<HashSet<String>>) -> MutexGuard<'_, HashSet<String>> {
    keys.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_acquire_is_refused() {
        let flights = SingleFlight::new();
        let key = StoreKey::new("cached", "http://ex.com/a.png");
        let guard = flights.try_acquire(&key).unwrap();
        assert!(flights.is_in_flight(&key));
        assert!(flights.try_acquire(&key).is_none());
        drop(guard);
        assert!(!flights.is_in_flight(&key));
        assert!(flights.try_acquire(&key).is_some());
    }

    #[test]
    fn keys_are_independent() {
        let flights = SingleFlight::new();
        let _a = flights.try_acquire(&StoreKey::new("cached", "a.png")).unwrap();
        assert!(flights.try_acquire(&StoreKey::new("cached", "b.png")).is_some());
        assert!(flights.try_acquire(&StoreKey::new("other", "a.png")).is_some());
    }

    #[test]
    fn clones_share_state() {
        let flights = SingleFlight::new();
        let other = flights.clone();
        let key = StoreKey::new("cached", "a.png");
        let _g = flights.try_acquire(&key).unwrap();
        assert!(other.is_in_flight(&key));
    }
}
