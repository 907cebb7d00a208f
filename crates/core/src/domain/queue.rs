// Queue Domain Model

use crate::domain::error::{DomainError, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Queue identifier
pub type QueueName = String;

/// Queue definition with its throttle overlay
///
/// Throttle fields default to zero, which means "unlimited".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Queue {
    pub name: QueueName,
    pub polling_interval: Duration,
    pub max_workers: u32,

    // Throttle (optional overlay, stored separately)
    pub max_dispatches_per_second: f64,
    pub max_burst_size: u32,
}

impl Queue {
    /// Create an unthrottled queue
    pub fn new(name: impl Into<String>, polling_interval: Duration, max_workers: u32) -> Self {
        Self {
            name: name.into(),
            polling_interval,
            max_workers,
            max_dispatches_per_second: 0.0,
            max_burst_size: 0,
        }
    }

    /// Overlay dispatch throttle settings
    pub fn with_throttle(mut self, max_dispatches_per_second: f64, max_burst_size: u32) -> Self {
        self.max_dispatches_per_second = max_dispatches_per_second;
        self.max_burst_size = max_burst_size;
        self
    }

    pub fn is_throttled(&self) -> bool {
        self.max_dispatches_per_second > 0.0
    }

    /// Polling interval in whole milliseconds (storage representation)
    pub fn polling_interval_ms(&self) -> u64 {
        u64::try_from(self.polling_interval.as_millis()).unwrap_or(u64::MAX)
    }

    /// Check the definition before it is written
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(self.invalid("name must not be empty"));
        }
        if self.max_workers == 0 {
            return Err(self.invalid("max_workers must be positive"));
        }
        if !self.max_dispatches_per_second.is_finite() || self.max_dispatches_per_second < 0.0 {
            return Err(self.invalid("max_dispatches_per_second must be a non-negative number"));
        }
        Ok(())
    }

    /// True when base attributes (queue row) match
    pub fn same_base(&self, other: &Queue) -> bool {
        self.name == other.name
            && self.polling_interval_ms() == other.polling_interval_ms()
            && self.max_workers == other.max_workers
    }

    /// True when throttle attributes (queue_throttle row) match
    pub fn same_throttle(&self, other: &Queue) -> bool {
        self.max_dispatches_per_second == other.max_dispatches_per_second
            && self.max_burst_size == other.max_burst_size
    }

    fn invalid(&self, reason: &str) -> DomainError {
        DomainError::InvalidQueue {
            name: self.name.clone(),
            reason: reason.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_queue_is_unthrottled() {
        let q = Queue::new("default", Duration::from_secs(1), 10);
        assert!(!q.is_throttled());
        assert_eq!(q.max_burst_size, 0);
        assert_eq!(q.polling_interval_ms(), 1000);
        assert!(q.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_definitions() {
        let zero_workers = Queue::new("q", Duration::from_millis(200), 0);
        assert!(zero_workers.validate().is_err());

        let blank = Queue::new("  ", Duration::from_millis(200), 1);
        assert!(blank.validate().is_err());

        let negative_rate = Queue::new("q", Duration::from_millis(200), 1).with_throttle(-1.0, 5);
        assert!(negative_rate.validate().is_err());

        let nan_rate = Queue::new("q", Duration::from_millis(200), 1).with_throttle(f64::NAN, 5);
        assert!(nan_rate.validate().is_err());
    }

    #[test]
    fn test_base_and_throttle_comparison() {
        let a = Queue::new("q", Duration::from_millis(500), 4).with_throttle(2.5, 10);
        let b = a.clone().with_throttle(3.0, 10);
        assert!(a.same_base(&b));
        assert!(!a.same_throttle(&b));

        let c = Queue {
            max_workers: 8,
            ..a.clone()
        };
        assert!(!a.same_base(&c));
        assert!(a.same_throttle(&c));
    }

    #[test]
    fn test_serde_shape() {
        let q = Queue::new("mail", Duration::from_secs(2), 3).with_throttle(1.5, 4);
        let json = serde_json::to_value(&q).unwrap();
        assert_eq!(json["name"], "mail");
        assert_eq!(json["max_workers"], 3);
        let back: Queue = serde_json::from_value(json).unwrap();
        assert_eq!(back, q);
    }
}
