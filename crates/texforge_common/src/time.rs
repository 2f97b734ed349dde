//! Millisecond timestamps as stored in the build cache.

use std::time::{SystemTime, UNIX_EPOCH};

/// Converts a [`SystemTime`] to milliseconds since the Unix epoch.
///
/// Times before the epoch clamp to 0.
pub fn system_time_millis(time: SystemTime) -> u64 {
    time.duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

/// Returns the current wall-clock time in milliseconds since the Unix epoch.
pub fn now_millis() -> u64 {
    system_time_millis(SystemTime::now())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn epoch_is_zero() {
        assert_eq!(system_time_millis(UNIX_EPOCH), 0);
    }

    #[test]
    fn before_epoch_clamps() {
        let before = UNIX_EPOCH - Duration::from_secs(10);
        assert_eq!(system_time_millis(before), 0);
    }

    #[test]
    fn millis_precision() {
        let t = UNIX_EPOCH + Duration::from_millis(1_234_567);
        assert_eq!(system_time_millis(t), 1_234_567);
    }

    #[test]
    fn now_is_after_2020() {
        assert!(now_millis() > 1_577_836_800_000);
    }
}
