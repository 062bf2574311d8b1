//! Sequential COMB GUIDs: sortable, RFC4122-shaped 128-bit identifiers
//!
//! ```rust
//! use combguid::{combguid, combguid_string};
//!
//! let id = combguid();
//! println!("{}", id); // e.g. "0004b2a1-03ef-4000-8e5d-1c0ffee1d2a7"
//! println!("{:?}", id.as_bytes()); // as 16-byte big-endian array
//!
//! println!("{}", combguid_string()); // e.g. "0004b2a1-03ef-4001-b3c2-77d90a14e6f0"
//! ```
//!
//! # Field and bit layout
//!
//! This library produces identifiers with the following bit layout:
//!
//! ```text
//!  0                   1                   2                   3
//!  0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! |                           timestamp                           |
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! |           timestamp           |  ver  |        counter        |
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! |var| counter |                      rand                       |
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! |                             rand                              |
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! ```
//!
//! Where:
//!
//! - The 48-bit `timestamp` field counts ticks (milliseconds by default) since a custom epoch,
//!   2024-01-01T00:00:00Z by default.
//! - The 4-bit `ver` field is set at `0100`.
//! - The `counter` field (16 bits by default) orders identifiers generated within the same
//!   tick. It starts at zero for every new tick and is incremented by one for each further
//!   identifier in that tick.
//! - The 2-bit `var` field is set at `10`.
//! - The remaining `rand` bits are filled with random numbers from an OS-seeded ChaCha12
//!   generator, or from a pseudo-random generator if the OS source is unavailable.
//!
//! When the counter reaches its maximum within a tick, the generator moves the timestamp one
//! tick forward. When the system clock moves back, the generator uses the previous timestamp
//! plus one. Either way every identifier is strictly greater than the one before, at the cost
//! of `timestamp` running ahead of the real-time clock for a while.
//!
//! # Custom generators
//!
//! ```rust
//! use combguid::{CombGenerator, Config, Resolution};
//!
//! let config = Config::default()
//!     .with_resolution(Resolution::Microseconds)?
//!     .with_counter_bits(12)?;
//! let mut g = CombGenerator::new(config);
//! println!("{}", g.generate());
//! # Ok::<(), combguid::ConfigError>(())
//! ```

#![cfg_attr(docsrs, feature(doc_cfg))]

mod id;
pub use id::{CombGuid, ParseError, Variant};

pub mod config;
pub use config::{Config, ConfigError, Resolution};

pub mod generator;
pub use generator::{CombGenerator, Entropy, GeneratorState, RandSource, StdSystemTime, TimeSource};

mod global_gen;
#[cfg(feature = "global_gen")]
pub use global_gen::{combguid, combguid_string};
