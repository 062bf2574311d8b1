//! Default generator and entry point functions.

#![cfg(feature = "global_gen")]
#![cfg_attr(docsrs, doc(cfg(feature = "global_gen")))]

use std::sync;

use crate::CombGuid;
use inner::GlobalGenInner;

/// Returns the lock handle of process-wide global generator, creating one if none exists.
fn lock_global_gen() -> sync::MutexGuard<'static, GlobalGenInner> {
    static G: sync::OnceLock<sync::Mutex<GlobalGenInner>> = sync::OnceLock::new();
    // the state is a plain value pair, consistent even if a holder panicked
    G.get_or_init(Default::default)
        .lock()
        .unwrap_or_else(sync::PoisonError::into_inner)
}

/// Generates a COMB GUID object.
///
/// This function employs a global generator and guarantees the process-wide monotonic order of
/// identifiers, including those generated within the same millisecond. On Unix, this function
/// resets the generator when the process ID changes (i.e., upon process forks).
///
/// # Examples
///
/// ```rust
/// let id = combguid::combguid();
/// println!("{}", id); // e.g., "0004b2a1-03ef-4000-8e5d-1c0ffee1d2a7"
/// println!("{:?}", id.as_bytes()); // as 16-byte big-endian array
/// ```
pub fn combguid() -> CombGuid {
    lock_global_gen().get_mut().generate()
}

/// Generates the 8-4-4-4-12 string representation of a new COMB GUID.
///
/// # Examples
///
/// ```rust
/// let id = combguid::combguid_string();
/// assert_eq!(id.len(), 36);
/// assert_eq!(&id[14..15], "4");
/// ```
pub fn combguid_string() -> String {
    combguid().into()
}

mod inner {
    use crate::CombGenerator;

    /// A thin wrapper to reset the state when the process ID changes (i.e., upon Unix forks).
    #[derive(Debug)]
    pub struct GlobalGenInner {
        #[cfg(unix)]
        pid: u32,
        generator: CombGenerator,
    }

    impl Default for GlobalGenInner {
        fn default() -> Self {
            Self {
                #[cfg(unix)]
                pid: std::process::id(),
                generator: CombGenerator::default(),
            }
        }
    }

    impl GlobalGenInner {
        /// Returns a mutable reference to the inner [`CombGenerator`] instance, reseting the
        /// generator state on Unix if the process ID has changed.
        pub fn get_mut(&mut self) -> &mut CombGenerator {
            #[cfg(unix)]
            if self.pid != std::process::id() {
                tracing::debug!(
                    old_pid = self.pid,
                    new_pid = std::process::id(),
                    "process ID changed, resetting global generator"
                );
                *self = Default::default();
            }
            &mut self.generator
        }
    }
}
