//! COMB GUID generator and its clock and entropy seams.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use crate::id::MAX_TIMESTAMP;
use crate::{CombGuid, Config};

pub mod entropy;
pub use entropy::{Adapter, Entropy, FallbackRng, SecureRng};

#[cfg(test)]
mod tests;

/// A trait that defines the random number generator interface for [`CombGenerator`].
pub trait RandSource {
    /// Fills `dest` with random data.
    fn fill_bytes(&mut self, dest: &mut [u8]);
}

/// A trait that defines the clock interface for [`CombGenerator`].
pub trait TimeSource {
    /// Returns the current time as a duration since the Unix epoch.
    fn now(&mut self) -> Duration;
}

/// The default [`TimeSource`] that reads the system wall clock.
///
/// A wall clock set before the Unix epoch reads as the Unix epoch itself.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Default)]
pub struct StdSystemTime;

impl TimeSource for StdSystemTime {
    fn now(&mut self) -> Duration {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
    }
}

/// The `(timestamp, counter)` pair of the most recently generated identifier.
///
/// States compare lexicographically, and every state produced by [`GeneratorState::next`] is
/// strictly greater than the one it was derived from. The timestamp never exceeds the 48-bit
/// range of the identifier field.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug)]
pub struct GeneratorState {
    timestamp: u64,
    counter: u32,
}

impl GeneratorState {
    /// Creates a state from raw values, which the caller keeps within their field widths.
    pub(crate) const fn new(timestamp: u64, counter: u32) -> Self {
        Self { timestamp, counter }
    }

    /// Returns the timestamp in ticks since the configured epoch.
    pub const fn timestamp(&self) -> u64 {
        self.timestamp
    }

    /// Returns the counter value within the tick.
    pub const fn counter(&self) -> u32 {
        self.counter
    }

    /// Derives the state for a new identifier from the previous state and the current tick.
    ///
    /// - A tick beyond the 48-bit field is read as the last representable tick.
    /// - A later tick starts over at counter zero.
    /// - The same tick increments the counter; a counter already at `max_counter` moves the
    ///   timestamp one tick forward instead.
    /// - An earlier tick (clock rollback) is replaced by the tick after the previous one.
    /// - At the last representable tick the counter keeps incrementing in place of a timestamp
    ///   advance.
    ///
    /// Returns `None` once the previous state is the last tick with the counter at
    /// `max_counter`, because no greater pair fits in the identifier.
    pub fn next(prev: Option<Self>, now: u64, max_counter: u32) -> Option<Self> {
        use std::cmp::Ordering;

        let now = now.min(MAX_TIMESTAMP);
        let Some(prev) = prev else {
            return Some(Self::new(now, 0));
        };

        match now.cmp(&prev.timestamp) {
            Ordering::Greater => Some(Self::new(now, 0)),
            Ordering::Equal if prev.counter < max_counter => {
                Some(Self::new(prev.timestamp, prev.counter + 1))
            }
            Ordering::Equal => {
                tracing::trace!(timestamp = prev.timestamp, "counter overflow, advancing timestamp");
                prev.advance(max_counter)
            }
            Ordering::Less => {
                tracing::trace!(
                    now,
                    last = prev.timestamp,
                    "clock moved backwards, reusing last timestamp plus one"
                );
                prev.advance(max_counter)
            }
        }
    }

    /// Moves to the next tick, or to the next counter value if the timestamp field is full.
    fn advance(self, max_counter: u32) -> Option<Self> {
        match self.timestamp.checked_add(1).filter(|&t| t <= MAX_TIMESTAMP) {
            Some(timestamp) => Some(Self::new(timestamp, 0)),
            None if self.counter < max_counter => {
                Some(Self::new(self.timestamp, self.counter + 1))
            }
            None => None,
        }
    }
}

/// Represents a COMB GUID generator that encapsulates the last `(timestamp, counter)` pair and
/// guarantees the strictly increasing order of the identifiers it produces.
///
/// The generator is a plain owned value; share one across threads by wrapping it in a mutex so
/// that each generation is a single critical section.
///
/// # Examples
///
/// ```rust
/// use combguid::CombGenerator;
/// use std::{sync, thread};
///
/// let g = sync::Arc::new(sync::Mutex::new(CombGenerator::default()));
/// thread::scope(|s| {
///     for i in 0..4 {
///         let g = sync::Arc::clone(&g);
///         s.spawn(move || {
///             for _ in 0..8 {
///                 println!("{} by thread {}", g.lock().unwrap().generate(), i);
///                 thread::yield_now();
///             }
///         });
///     }
/// });
/// ```
#[derive(Debug)]
pub struct CombGenerator<R = Entropy, T = StdSystemTime> {
    state: Option<GeneratorState>,
    config: Config,

    /// The random number generator used by the generator.
    rng: R,

    /// The clock used by the generator.
    time: T,
}

impl CombGenerator {
    /// Creates a generator with the system clock and the best entropy source available.
    pub fn new(config: Config) -> Self {
        Self::with_sources(config, Entropy::detect(), StdSystemTime)
    }
}

impl Default for CombGenerator {
    fn default() -> Self {
        Self::new(Config::default())
    }
}

impl<R: RandSource, T: TimeSource> CombGenerator<R, T> {
    /// Creates a generator with the specified random number generator and clock.
    pub const fn with_sources(config: Config, rng: R, time: T) -> Self {
        Self {
            state: None,
            config,
            rng,
            time,
        }
    }

    /// Generates a new identifier from the current time.
    ///
    /// # Panics
    ///
    /// Panics if the 48-bit timestamp field is exhausted, i.e., the clock has passed the last
    /// tick the configured epoch and resolution can represent. See [`Config::validate_at`].
    pub fn generate(&mut self) -> CombGuid {
        let now = self.time.now();
        self.generate_core(self.config.ticks_since_epoch(now))
    }

    /// Generates a new identifier from the current time, or returns `None` if the 48-bit
    /// timestamp field is exhausted.
    pub fn generate_or_abort(&mut self) -> Option<CombGuid> {
        let now = self.time.now();
        self.generate_or_abort_core(self.config.ticks_since_epoch(now))
    }

    /// Generates the 8-4-4-4-12 string representation of a new identifier.
    ///
    /// # Panics
    ///
    /// Panics under the same condition as [`generate`](CombGenerator::generate).
    pub fn generate_string(&mut self) -> String {
        self.generate().into()
    }

    /// Generates a new identifier from `timestamp`, given in ticks since the configured epoch.
    ///
    /// The identifier is strictly greater than any identifier this generator produced before.
    ///
    /// # Panics
    ///
    /// Panics if the 48-bit timestamp field is exhausted.
    pub fn generate_core(&mut self, timestamp: u64) -> CombGuid {
        match self.generate_or_abort_core(timestamp) {
            Some(value) => value,
            None => panic!("combguid: 48-bit timestamp field exhausted"),
        }
    }

    /// Generates a new identifier from `timestamp`, given in ticks since the configured epoch,
    /// or returns `None` if no identifier greater than the previous one fits in 48 bits.
    ///
    /// A `timestamp` beyond the 48-bit field is read as the last representable tick. The
    /// generator state is left untouched when `None` is returned.
    pub fn generate_or_abort_core(&mut self, timestamp: u64) -> Option<CombGuid> {
        let state = GeneratorState::next(self.state, timestamp, self.config.max_counter())?;
        self.state = Some(state);

        let mut random = [0u8; 16];
        self.rng.fill_bytes(&mut random[..10]);
        Some(CombGuid::from_parts(
            state.timestamp(),
            state.counter(),
            self.config.counter_bits() as u32,
            u128::from_be_bytes(random) >> 48,
        ))
    }

    /// Returns the state of the most recent generation, or `None` before the first one.
    pub const fn state(&self) -> Option<GeneratorState> {
        self.state
    }

    /// Returns the configuration the generator was created with.
    pub const fn config(&self) -> &Config {
        &self.config
    }
}

/// Supports operations as an iterator that produces a new identifier for each call of `next()`
/// until the 48-bit timestamp field is exhausted.
///
/// # Examples
///
/// ```rust
/// use combguid::CombGenerator;
///
/// CombGenerator::default()
///     .enumerate()
///     .skip(4)
///     .take(4)
///     .for_each(|(i, e)| println!("[{}] {}", i, e));
/// ```
impl<R: RandSource, T: TimeSource> Iterator for CombGenerator<R, T> {
    type Item = CombGuid;

    fn next(&mut self) -> Option<Self::Item> {
        self.generate_or_abort()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, None)
    }
}

impl<R: RandSource, T: TimeSource> std::iter::FusedIterator for CombGenerator<R, T> {}
