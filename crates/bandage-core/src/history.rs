//! Bounded telemetry history.
//!
//! Each metric keeps the last N values in arrival order. Buffers start
//! pre-filled with N zeros so charts always have N points, even before the
//! first real reading arrives.
//!
//! The buffers are owned by the session loop (the single writer). Readers
//! get immutable copies through [`HistoryBuffer::snapshot`] or through the
//! published [`crate::SessionSnapshot`], so a push is never observable as a
//! torn read.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use bandage_types::{Metric, Reading};

use crate::error::{Error, Result};

/// Default number of values kept per metric.
pub const DEFAULT_HISTORY_CAPACITY: usize = 10;

/// Fixed-capacity FIFO of values for one metric.
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryBuffer {
    capacity: usize,
    values: VecDeque<f64>,
}

impl HistoryBuffer {
    /// Create a buffer holding `capacity` zero placeholders.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] if `capacity` is zero.
    pub fn new(capacity: usize) -> Result<Self> {
        if capacity == 0 {
            return Err(Error::invalid_config("history capacity must be > 0"));
        }
        let mut values = VecDeque::with_capacity(capacity + 1);
        values.resize(capacity, 0.0);
        Ok(Self { capacity, values })
    }

    /// Append a value, evicting the oldest one when full.
    pub fn push(&mut self, value: f64) {
        self.values.push_back(value);
        while self.values.len() > self.capacity {
            self.values.pop_front();
        }
    }

    /// Copy of the buffer contents, oldest first.
    pub fn snapshot(&self) -> Vec<f64> {
        self.values.iter().copied().collect()
    }

    /// Most recently pushed value (or the newest placeholder).
    pub fn latest(&self) -> Option<f64> {
        self.values.back().copied()
    }

    /// Maximum number of values kept.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Current number of values (always `capacity` with placeholder fill).
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether the buffer holds no values.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// History for both metrics, routed by [`Reading::metric`].
#[derive(Debug, Clone, PartialEq)]
pub struct TelemetryHistory {
    temperature: HistoryBuffer,
    humidity: HistoryBuffer,
}

impl TelemetryHistory {
    /// Create histories with the given per-metric capacity.
    pub fn new(capacity: usize) -> Result<Self> {
        Ok(Self {
            temperature: HistoryBuffer::new(capacity)?,
            humidity: HistoryBuffer::new(capacity)?,
        })
    }

    /// Push a reading into its metric's buffer.
    pub fn push(&mut self, reading: Reading) {
        self.buffer_mut(reading.metric()).push(reading.value());
    }

    /// Buffer for a metric.
    pub fn buffer(&self, metric: Metric) -> &HistoryBuffer {
        match metric {
            Metric::Temperature => &self.temperature,
            Metric::Humidity => &self.humidity,
        }
    }

    fn buffer_mut(&mut self, metric: Metric) -> &mut HistoryBuffer {
        match metric {
            Metric::Temperature => &mut self.temperature,
            Metric::Humidity => &mut self.humidity,
        }
    }

    /// Copy both buffers.
    pub fn snapshot(&self) -> HistorySnapshot {
        HistorySnapshot {
            temperature: self.temperature.snapshot(),
            humidity: self.humidity.snapshot(),
        }
    }
}

/// Immutable copy of both history buffers.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HistorySnapshot {
    /// Temperature values, oldest first.
    pub temperature: Vec<f64>,
    /// Humidity values, oldest first.
    pub humidity: Vec<f64>,
}

impl HistorySnapshot {
    /// Values for a metric.
    pub fn values(&self, metric: Metric) -> &[f64] {
        match metric {
            Metric::Temperature => &self.temperature,
            Metric::Humidity => &self.humidity,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_new_buffer_is_zero_filled() {
        let buffer = HistoryBuffer::new(DEFAULT_HISTORY_CAPACITY).unwrap();
        assert_eq!(buffer.len(), 10);
        assert_eq!(buffer.snapshot(), vec![0.0; 10]);
    }

    #[test]
    fn test_zero_capacity_rejected() {
        assert!(matches!(
            HistoryBuffer::new(0),
            Err(Error::InvalidConfig(_))
        ));
        assert!(TelemetryHistory::new(0).is_err());
    }

    #[test]
    fn test_push_evicts_oldest() {
        let mut buffer = HistoryBuffer::new(3).unwrap();
        buffer.push(1.0);
        assert_eq!(buffer.snapshot(), vec![0.0, 0.0, 1.0]);
        buffer.push(2.0);
        buffer.push(3.0);
        buffer.push(4.0);
        assert_eq!(buffer.snapshot(), vec![2.0, 3.0, 4.0]);
        assert_eq!(buffer.latest(), Some(4.0));
    }

    #[test]
    fn test_snapshot_is_a_copy() {
        let mut buffer = HistoryBuffer::new(2).unwrap();
        buffer.push(5.0);
        let snapshot = buffer.snapshot();
        buffer.push(6.0);
        assert_eq!(snapshot, vec![0.0, 5.0]);
        assert_eq!(buffer.snapshot(), vec![5.0, 6.0]);
    }

    #[test]
    fn test_telemetry_history_routes_by_metric() {
        let mut history = TelemetryHistory::new(3).unwrap();
        history.push(Reading::temperature(36.5));
        history.push(Reading::humidity(80.0));
        history.push(Reading::temperature(36.7));

        let snapshot = history.snapshot();
        assert_eq!(snapshot.temperature, vec![0.0, 36.5, 36.7]);
        assert_eq!(snapshot.humidity, vec![0.0, 0.0, 80.0]);
        assert_eq!(snapshot.values(Metric::Humidity), &[0.0, 0.0, 80.0]);
        assert_eq!(history.buffer(Metric::Temperature).latest(), Some(36.7));
    }

    proptest! {
        #[test]
        fn prop_buffer_keeps_most_recent_values(
            capacity in 1usize..20,
            values in proptest::collection::vec(-100.0f64..100.0, 0..60),
        ) {
            let mut buffer = HistoryBuffer::new(capacity).unwrap();
            for v in &values {
                buffer.push(*v);
            }
            let snapshot = buffer.snapshot();
            prop_assert_eq!(snapshot.len(), capacity);

            if values.len() >= capacity {
                prop_assert_eq!(&snapshot[..], &values[values.len() - capacity..]);
            } else {
                let pad = capacity - values.len();
                prop_assert!(snapshot[..pad].iter().all(|v| *v == 0.0));
                prop_assert_eq!(&snapshot[pad..], &values[..]);
            }
        }
    }
}
