//! Time and duration conversion utilities.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Extension trait for safe Duration conversions.
pub trait DurationExt {
    /// Convert duration to milliseconds as i64, saturating at `i64::MAX`.
    ///
    /// Useful for database storage.
    fn as_millis_i64(&self) -> i64;

    /// Convert duration to seconds as u32, saturating at `u32::MAX`.
    ///
    /// In practice, this is always safe for audio tracks because
    /// `u32::MAX` seconds is approximately 136 years.
    fn as_secs_u32(&self) -> u32;
}

impl DurationExt for Duration {
    fn as_millis_i64(&self) -> i64 {
        i64::try_from(self.as_millis()).unwrap_or(i64::MAX)
    }

    fn as_secs_u32(&self) -> u32 {
        u32::try_from(self.as_secs()).unwrap_or(u32::MAX)
    }
}

/// Milliseconds since the Unix epoch for a file timestamp.
///
/// Timestamps before the epoch clamp to zero.
#[must_use]
pub fn system_time_millis(time: SystemTime) -> i64 {
    time.duration_since(UNIX_EPOCH)
        .unwrap_or(Duration::ZERO)
        .as_millis_i64()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_as_millis_i64() {
        let duration = Duration::from_millis(5000);
        assert_eq!(duration.as_millis_i64(), 5000);
    }

    #[test]
    fn test_as_secs_u32() {
        let duration = Duration::from_secs(300);
        assert_eq!(duration.as_secs_u32(), 300);
    }

    #[test]
    fn test_as_secs_u32_large() {
        // Duration larger than u32::MAX seconds
        let duration = Duration::from_secs(u64::from(u32::MAX) + 1);
        assert_eq!(duration.as_secs_u32(), u32::MAX);
    }

    #[test]
    fn test_system_time_millis_epoch() {
        assert_eq!(system_time_millis(UNIX_EPOCH), 0);
        assert_eq!(
            system_time_millis(UNIX_EPOCH + Duration::from_millis(1500)),
            1500
        );
    }

    #[test]
    fn test_system_time_millis_before_epoch_clamps() {
        let before = UNIX_EPOCH - Duration::from_secs(10);
        assert_eq!(system_time_millis(before), 0);
    }
}
