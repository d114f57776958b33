//! Fixed-size trailing mean accumulator.
//!
//! Values are pushed in chronological order and the mean returned after
//! each push covers only values at or before that point, so a record's
//! rolling feature can never see its own future.

use std::collections::VecDeque;

/// Trailing mean over the last `size` pushed positions (`min_periods = 1`).
///
/// Every push occupies a slot, including absent values, so the window always
/// spans the last `size` games. The mean covers the defined values inside it.
#[derive(Debug, Clone)]
pub struct RollingMean {
    size: usize,
    slots: VecDeque<Option<f64>>,
    sum: f64,
    defined: usize,
}

impl RollingMean {
    /// Creates an accumulator over a window of `size` positions (at least 1).
    #[must_use]
    pub fn new(size: usize) -> Self {
        let size = size.max(1);
        Self {
            size,
            slots: VecDeque::with_capacity(size),
            sum: 0.0,
            defined: 0,
        }
    }

    /// Pushes the next value and returns the mean of the current window.
    ///
    /// `None` and non-finite values take a slot but are not averaged.
    /// Returns `None` when the window holds no defined value.
    pub fn push(&mut self, value: Option<f64>) -> Option<f64> {
        if self.slots.len() == self.size {
            if let Some(Some(evicted)) = self.slots.pop_front() {
                self.sum -= evicted;
                self.defined -= 1;
            }
        }
        let value = value.filter(|v| v.is_finite());
        if let Some(v) = value {
            self.sum += v;
            self.defined += 1;
        }
        self.slots.push_back(value);
        self.mean()
    }

    /// Mean of the defined values currently in the window.
    #[must_use]
    pub fn mean(&self) -> Option<f64> {
        (self.defined > 0).then(|| self.sum / self.defined as f64)
    }

    /// Positions currently in the window, defined or not.
    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_window_uses_available_values() {
        let mut acc = RollingMean::new(5);
        assert_eq!(acc.push(Some(10.0)), Some(10.0));
        assert_eq!(acc.push(Some(20.0)), Some(15.0));
        assert_eq!(acc.len(), 2);
    }

    #[test]
    fn test_window_evicts_oldest() {
        let mut acc = RollingMean::new(3);
        for v in [3.0, 6.0, 9.0] {
            acc.push(Some(v));
        }
        let mean = acc.push(Some(12.0)).unwrap();
        assert!((mean - 9.0).abs() < 1e-12);
        assert_eq!(acc.len(), 3);
    }

    #[test]
    fn test_absent_value_occupies_a_position() {
        let mut acc = RollingMean::new(3);
        assert_eq!(acc.push(None), None);
        acc.push(Some(8.0));
        assert_eq!(acc.push(Some(f64::NAN)), Some(8.0));
        assert_eq!(acc.len(), 3);
    }

    #[test]
    fn test_old_value_leaves_window_behind_gaps() {
        // window of 3: [10, gap, gap] then 40 evicts 10
        let mut acc = RollingMean::new(3);
        acc.push(Some(10.0));
        acc.push(None);
        assert_eq!(acc.push(None), Some(10.0));
        assert_eq!(acc.push(Some(40.0)), Some(40.0));
        // only gaps and 40 remain, then 40 ages out too
        acc.push(None);
        assert_eq!(acc.push(None), Some(40.0));
        assert_eq!(acc.push(None), None);
    }

    #[test]
    fn test_zero_size_is_clamped() {
        let mut acc = RollingMean::new(0);
        acc.push(Some(1.0));
        assert_eq!(acc.push(Some(4.0)), Some(4.0));
    }
}
