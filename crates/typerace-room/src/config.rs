//! Race configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// RaceConfig
// ---------------------------------------------------------------------------

/// Settings every room is created with.
///
/// Both values are fixed for a room's lifetime once it exists; changing
/// the registry's config only affects rooms created afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RaceConfig {
    /// Maximum participants per room.
    pub capacity: usize,

    /// How long a race runs before results are computed.
    pub duration: Duration,
}

impl Default for RaceConfig {
    fn default() -> Self {
        Self {
            capacity: 5,
            duration: Duration::from_secs(60),
        }
    }
}

impl RaceConfig {
    /// Shortest race the coordinator will run.
    pub const MIN_DURATION: Duration = Duration::from_secs(1);

    /// Clamp out-of-range values so the config is safe to use.
    ///
    /// - `capacity` is at least 1 (the creator needs a slot).
    /// - `duration` is at least [`Self::MIN_DURATION`] and a whole number
    ///   of seconds, since scoring divides by it.
    pub fn validated(mut self) -> Self {
        if self.capacity == 0 {
            tracing::warn!("room capacity of 0, clamping to 1");
            self.capacity = 1;
        }
        let secs = self.duration.as_secs().max(Self::MIN_DURATION.as_secs());
        if Duration::from_secs(secs) != self.duration {
            tracing::warn!(
                duration_ms = self.duration.as_millis() as u64,
                secs,
                "race duration must be whole seconds >= 1, adjusting"
            );
            self.duration = Duration::from_secs(secs);
        }
        self
    }

    /// Race length in whole seconds.
    pub fn duration_secs(&self) -> u64 {
        self.duration.as_secs()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_race_config_default() {
        let config = RaceConfig::default();
        assert_eq!(config.capacity, 5);
        assert_eq!(config.duration, Duration::from_secs(60));
        assert_eq!(config.duration_secs(), 60);
    }

    #[test]
    fn test_validated_clamps_zero_capacity() {
        let config = RaceConfig {
            capacity: 0,
            ..RaceConfig::default()
        }
        .validated();
        assert_eq!(config.capacity, 1);
    }

    #[test]
    fn test_validated_rounds_duration_to_whole_seconds() {
        let config = RaceConfig {
            duration: Duration::from_millis(2_500),
            ..RaceConfig::default()
        }
        .validated();
        assert_eq!(config.duration, Duration::from_secs(2));

        let config = RaceConfig {
            duration: Duration::ZERO,
            ..RaceConfig::default()
        }
        .validated();
        assert_eq!(config.duration, RaceConfig::MIN_DURATION);
    }

    #[test]
    fn test_validated_keeps_sane_values() {
        let config = RaceConfig::default().validated();
        assert_eq!(config, RaceConfig::default());
    }
}
