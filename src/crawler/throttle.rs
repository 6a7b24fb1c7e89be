//! Adaptive fetch delay driven by the loader's observed batch sizes

use crate::config::CrawlerConfig;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// Delay fetch workers wait before each request
///
/// The loader reports every drained batch. A batch at the cap means
/// producers outpace the loader and the delay grows by a fixed step; a batch
/// under the comfortable size shrinks it, never below the floor.
#[derive(Debug)]
pub struct Throttle {
    delay_ms: AtomicU64,
    min_ms: u64,
    increase_step_ms: u64,
    decrease_step_ms: u64,
    batch_cap: usize,
    comfortable_batch: usize,
}

impl Throttle {
    pub fn new(config: &CrawlerConfig) -> Self {
        Self {
            delay_ms: AtomicU64::new(config.initial_fetch_delay_ms),
            min_ms: config.min_fetch_delay_ms,
            increase_step_ms: config.delay_increase_step_ms,
            decrease_step_ms: config.delay_decrease_step_ms,
            batch_cap: config.batch_size,
            comfortable_batch: config.comfortable_batch_size,
        }
    }

    /// Current per-fetch delay
    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms.load(Ordering::Relaxed))
    }

    /// Adjusts the delay after the loader drained `batch_len` pages
    pub fn observe_batch(&self, batch_len: usize) {
        if batch_len >= self.batch_cap {
            let step = self.increase_step_ms;
            let previous = self.delay_ms.fetch_add(step, Ordering::Relaxed);
            tracing::debug!(
                "Loader saturated ({} pages), fetch delay {}ms -> {}ms",
                batch_len,
                previous,
                previous + step
            );
        } else if batch_len < self.comfortable_batch {
            let (min, step) = (self.min_ms, self.decrease_step_ms);
            let _ = self
                .delay_ms
                .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |current| {
                    Some(current.saturating_sub(step).max(min))
                });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn throttle() -> Throttle {
        Throttle::new(&CrawlerConfig::default())
    }

    #[test]
    fn test_initial_delay() {
        assert_eq!(throttle().delay(), Duration::from_millis(400));
    }

    #[test]
    fn test_saturated_batches_only_increase() {
        let throttle = throttle();
        let mut previous = throttle.delay();
        for _ in 0..20 {
            throttle.observe_batch(200);
            let current = throttle.delay();
            assert!(current > previous);
            previous = current;
        }
        assert_eq!(previous, Duration::from_millis(400 + 20 * 300));
    }

    #[test]
    fn test_small_batches_decrease_to_floor() {
        let throttle = throttle();
        throttle.observe_batch(200);
        throttle.observe_batch(200);

        let mut previous = throttle.delay();
        for _ in 0..50 {
            throttle.observe_batch(3);
            let current = throttle.delay();
            assert!(current <= previous);
            assert!(current >= Duration::from_millis(200));
            previous = current;
        }
        assert_eq!(previous, Duration::from_millis(200));
    }

    #[test]
    fn test_comfortable_batches_leave_delay_alone() {
        let throttle = throttle();
        throttle.observe_batch(50);
        throttle.observe_batch(120);
        assert_eq!(throttle.delay(), Duration::from_millis(400));
    }

    #[test]
    fn test_empty_buffer_relaxes() {
        let throttle = throttle();
        throttle.observe_batch(0);
        assert_eq!(throttle.delay(), Duration::from_millis(300));
    }
}
