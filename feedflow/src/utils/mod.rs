//! Utility functions for timestamps and unique filename ticks.

pub mod timestamps;

pub use timestamps::{date_stamp, iso_timestamp, next_tick, Timestamp};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_iso_timestamp_format() {
        let ts = iso_timestamp();
        // Should be RFC3339 format: YYYY-MM-DDTHH:MM:SS.ssssss+00:00
        assert!(ts.contains('T'));
        assert!(ts.ends_with("+00:00"));
    }
}
