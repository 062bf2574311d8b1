//! Random sources for the non-deterministic tail of identifiers.

use std::collections::hash_map::RandomState;
use std::hash::{BuildHasher, Hash, Hasher};
use std::time::{SystemTime, UNIX_EPOCH};

use rand::rngs::{adapter::ReseedingRng, OsRng, SmallRng};
use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha12Core;

use super::{CombGenerator, RandSource, StdSystemTime};
use crate::Config;

/// Number of bytes the secure generator produces before reseeding from the OS.
const RESEED_THRESHOLD: u64 = 1024 * 64;

/// Cryptographically strong generator: ChaCha12 seeded and periodically reseeded from the
/// operating system, mirroring the strategy of [`rand::rngs::ThreadRng`].
#[derive(Debug)]
pub struct SecureRng(ReseedingRng<ChaCha12Core, OsRng>);

impl SecureRng {
    /// Seeds a generator from the operating system, failing if the OS source is unavailable.
    pub fn from_os() -> Result<Self, rand::Error> {
        let core = ChaCha12Core::from_rng(OsRng)?;
        Ok(Self(ReseedingRng::new(core, RESEED_THRESHOLD, OsRng)))
    }
}

impl RandSource for SecureRng {
    fn fill_bytes(&mut self, dest: &mut [u8]) {
        self.0.fill_bytes(dest);
    }
}

/// General-purpose pseudo-random generator used when the OS source cannot be read.
#[derive(Clone, Debug)]
pub struct FallbackRng(SmallRng);

impl FallbackRng {
    /// Creates a generator seeded from the wall clock, the process and thread IDs, and the
    /// randomized hasher keys of the standard library.
    pub fn new() -> Self {
        Self::seed_from_u64(mixed_seed())
    }

    /// Creates a generator with a fixed seed, yielding a reproducible sequence.
    pub fn seed_from_u64(seed: u64) -> Self {
        Self(SmallRng::seed_from_u64(seed))
    }
}

impl Default for FallbackRng {
    fn default() -> Self {
        Self::new()
    }
}

impl RandSource for FallbackRng {
    fn fill_bytes(&mut self, dest: &mut [u8]) {
        self.0.fill_bytes(dest);
    }
}

fn mixed_seed() -> u64 {
    let mut hasher = RandomState::new().build_hasher();
    if let Ok(t) = SystemTime::now().duration_since(UNIX_EPOCH) {
        hasher.write_u128(t.as_nanos());
    }
    hasher.write_u32(std::process::id());
    std::thread::current().id().hash(&mut hasher);
    hasher.finish()
}

/// The entropy source of a generator, selected once at construction.
#[derive(Debug)]
pub enum Entropy {
    /// The OS-seeded ChaCha12 generator.
    Secure(SecureRng),

    /// The pseudo-random generator used when the OS source failed.
    Fallback(FallbackRng),
}

impl Entropy {
    /// Uses the OS-seeded generator if possible, or the pseudo-random fallback otherwise.
    pub fn detect() -> Self {
        Self::select(SecureRng::from_os())
    }

    pub(crate) fn select(secure: Result<SecureRng, rand::Error>) -> Self {
        match secure {
            Ok(rng) => Self::Secure(rng),
            Err(err) => {
                tracing::warn!(
                    error = %err,
                    "secure random source unavailable, falling back to pseudo-random generator"
                );
                Self::Fallback(FallbackRng::new())
            }
        }
    }

    /// Returns `true` if the OS-seeded generator is in use.
    pub const fn is_secure(&self) -> bool {
        matches!(self, Self::Secure(_))
    }
}

impl RandSource for Entropy {
    fn fill_bytes(&mut self, dest: &mut [u8]) {
        match self {
            Self::Secure(rng) => rng.fill_bytes(dest),
            Self::Fallback(rng) => rng.fill_bytes(dest),
        }
    }
}

/// An adapter that implements [`RandSource`] for [`RngCore`] types.
#[derive(Clone, Eq, PartialEq, Debug, Default)]
pub struct Adapter<T>(/** The wrapped [`RngCore`] type. */ pub T);

impl<T: RngCore> RandSource for Adapter<T> {
    fn fill_bytes(&mut self, dest: &mut [u8]) {
        self.0.fill_bytes(dest);
    }
}

impl<T: RngCore> CombGenerator<Adapter<T>> {
    /// Creates a generator object with a specified random number generator that implements
    /// [`RngCore`] from `rand` crate.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use combguid::{CombGenerator, Config};
    ///
    /// let mut g = CombGenerator::with_rng(Config::default(), rand::thread_rng());
    /// println!("{}", g.generate());
    /// ```
    pub const fn with_rng(config: Config, rng: T) -> Self {
        Self::with_sources(config, Adapter(rng), StdSystemTime)
    }
}
