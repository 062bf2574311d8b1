//! Generator configuration.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use crate::id::MAX_TIMESTAMP;

/// 2024-01-01T00:00:00Z in milliseconds since the Unix epoch.
pub const DEFAULT_EPOCH_MS: u64 = 1_704_067_200_000;

/// Default width of the intra-tick counter, allowing up to 65,536 identifiers per tick.
pub const DEFAULT_COUNTER_BITS: u8 = 16;

/// Unit of the timestamp field.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Default)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "lowercase")
)]
pub enum Resolution {
    /// One tick per millisecond; the 48-bit field lasts roughly 8,900 years.
    #[default]
    Milliseconds,

    /// One tick per microsecond; the 48-bit field lasts roughly 8.9 years.
    Microseconds,
}

/// Error returned for a configuration the generator cannot honor.
#[derive(Clone, Eq, PartialEq, Debug, thiserror::Error)]
pub enum ConfigError {
    /// The counter width is outside `1..=32`.
    #[error("counter width must be between 1 and 32 bits, got {0}")]
    CounterBitsOutOfRange(u8),

    /// The epoch is earlier than 1970-01-01T00:00:00Z.
    #[error("epoch must not precede the Unix epoch")]
    EpochBeforeUnixEpoch,

    /// The current time, counted in ticks since the epoch, no longer fits in 48 bits.
    #[error("current time is {ticks} ticks past the epoch, beyond the 48-bit timestamp field")]
    TimestampOutOfRange { ticks: u64 },
}

/// Parameters that shape the identifiers produced by a generator.
///
/// # Examples
///
/// ```rust
/// use combguid::{Config, Resolution};
///
/// let config = Config::default()
///     .with_resolution(Resolution::Microseconds)?
///     .with_counter_bits(12)?;
/// assert_eq!(config.max_counter(), 0xfff);
/// # Ok::<(), combguid::ConfigError>(())
/// ```
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "camelCase", try_from = "serde_support::ConfigRepr")
)]
pub struct Config {
    /// Reference point in milliseconds since the Unix epoch.
    epoch: u64,
    resolution: Resolution,
    counter_bits: u8,
}

impl Config {
    /// Creates the default configuration: 2024-01-01 epoch, millisecond ticks, 16-bit counter.
    pub const fn new() -> Self {
        Self {
            epoch: DEFAULT_EPOCH_MS,
            resolution: Resolution::Milliseconds,
            counter_bits: DEFAULT_COUNTER_BITS,
        }
    }

    /// Sets the epoch in milliseconds since the Unix epoch.
    ///
    /// Fails if the current time is out of the timestamp range of the resulting configuration.
    pub fn with_epoch_ms(mut self, epoch_ms: u64) -> Result<Self, ConfigError> {
        self.epoch = epoch_ms;
        self.validate()?;
        Ok(self)
    }

    /// Sets the epoch from a point in time, truncated to milliseconds.
    pub fn with_epoch(self, epoch: SystemTime) -> Result<Self, ConfigError> {
        let since_unix = epoch
            .duration_since(UNIX_EPOCH)
            .map_err(|_| ConfigError::EpochBeforeUnixEpoch)?;
        self.with_epoch_ms(u64::try_from(since_unix.as_millis()).unwrap_or(u64::MAX))
    }

    /// Sets the unit of the timestamp field.
    ///
    /// Fails if the current time is out of the timestamp range of the resulting configuration.
    pub fn with_resolution(mut self, resolution: Resolution) -> Result<Self, ConfigError> {
        self.resolution = resolution;
        self.validate()?;
        Ok(self)
    }

    /// Sets the width of the intra-tick counter.
    pub const fn with_counter_bits(mut self, counter_bits: u8) -> Result<Self, ConfigError> {
        if counter_bits == 0 || counter_bits > 32 {
            return Err(ConfigError::CounterBitsOutOfRange(counter_bits));
        }
        self.counter_bits = counter_bits;
        Ok(self)
    }

    /// Returns the epoch in milliseconds since the Unix epoch.
    pub const fn epoch_ms(&self) -> u64 {
        self.epoch
    }

    /// Returns the unit of the timestamp field.
    pub const fn resolution(&self) -> Resolution {
        self.resolution
    }

    /// Returns the width of the intra-tick counter in bits.
    pub const fn counter_bits(&self) -> u8 {
        self.counter_bits
    }

    /// Returns the largest counter value within one tick.
    pub const fn max_counter(&self) -> u32 {
        ((1u64 << self.counter_bits) - 1) as u32
    }

    /// Converts a time since the Unix epoch into ticks since the configured epoch, saturating
    /// at zero for times before the epoch.
    pub fn ticks_since_epoch(&self, unix_time: Duration) -> u64 {
        let elapsed = unix_time.saturating_sub(Duration::from_millis(self.epoch));
        let ticks = match self.resolution {
            Resolution::Milliseconds => elapsed.as_millis(),
            Resolution::Microseconds => elapsed.as_micros(),
        };
        u64::try_from(ticks).unwrap_or(u64::MAX)
    }

    /// Checks that `unix_time`, a time since the Unix epoch, maps to a tick that fits in the
    /// 48-bit timestamp field.
    pub fn validate_at(&self, unix_time: Duration) -> Result<(), ConfigError> {
        match self.ticks_since_epoch(unix_time) {
            ticks if ticks > MAX_TIMESTAMP => Err(ConfigError::TimestampOutOfRange { ticks }),
            _ => Ok(()),
        }
    }

    /// Checks that the current system time fits in the 48-bit timestamp field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default();
        self.validate_at(now)
    }

    /// Converts ticks since the configured epoch back into a time since the Unix epoch.
    pub fn unix_time_of(&self, ticks: u64) -> Duration {
        let elapsed = match self.resolution {
            Resolution::Milliseconds => Duration::from_millis(ticks),
            Resolution::Microseconds => Duration::from_micros(ticks),
        };
        Duration::from_millis(self.epoch) + elapsed
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(feature = "serde")]
#[cfg_attr(docsrs, doc(cfg(feature = "serde")))]
mod serde_support {
    use super::{Config, ConfigError, Resolution};

    /// Unvalidated form of [`Config`] as it appears in serialized input.
    #[derive(serde::Deserialize)]
    #[serde(rename_all = "camelCase", default, deny_unknown_fields)]
    pub(super) struct ConfigRepr {
        epoch: u64,
        resolution: Resolution,
        counter_bits: u8,
    }

    impl Default for ConfigRepr {
        fn default() -> Self {
            let config = Config::new();
            Self {
                epoch: config.epoch,
                resolution: config.resolution,
                counter_bits: config.counter_bits,
            }
        }
    }

    impl TryFrom<ConfigRepr> for Config {
        type Error = ConfigError;

        fn try_from(src: ConfigRepr) -> Result<Self, Self::Error> {
            Config::new()
                .with_epoch_ms(src.epoch)?
                .with_resolution(src.resolution)?
                .with_counter_bits(src.counter_bits)
        }
    }

}
