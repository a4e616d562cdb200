//! Latency schedules for exercising completion orders that differ from
//! spawn order.

use std::time::Duration;

/// Delay inversely correlated with the element's position: position 0 gets
/// the longest delay and the last element the shortest, so completion order
/// is roughly the reverse of spawn order.
pub fn inverse_delay(position: usize, total: usize, step: Duration) -> Duration {
    step * total.saturating_sub(position) as u32
}

/// Uniformly random delay up to `max_millis`, inclusive.
pub fn jitter(max_millis: u64) -> Duration {
    Duration::from_millis(fastrand::u64(0..=max_millis))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inverse_delay_decreases_with_position() {
        let step = Duration::from_millis(5);
        let first = inverse_delay(0, 10, step);
        let last = inverse_delay(9, 10, step);
        assert_eq!(first, Duration::from_millis(50));
        assert_eq!(last, Duration::from_millis(5));
        assert!(first > last);
    }

    #[test]
    fn test_inverse_delay_saturates_past_total() {
        assert_eq!(
            inverse_delay(12, 10, Duration::from_millis(5)),
            Duration::ZERO
        );
    }

    #[test]
    fn test_jitter_stays_in_range() {
        for _ in 0..100 {
            assert!(jitter(10) <= Duration::from_millis(10));
        }
    }
}
