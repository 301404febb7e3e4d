use crate::{Error, Result};
use core::{fmt, str::FromStr};
use portable_atomic::{AtomicU64, Ordering};

/// Unique handle issued for every accepted submission.
///
/// Ids are positive, strictly increasing in allocation order, and never
/// reused for the lifetime of the process.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RequestId(u64);

impl RequestId {
    /// Wraps a raw id value.
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Returns the raw id value.
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for RequestId {
    type Err = Error;

    /// Parses a plain decimal id. Signs, whitespace, and anything outside
    /// `0-9` are rejected as [`Error::InvalidId`].
    fn from_str(raw: &str) -> Result<Self> {
        let invalid = || Error::InvalidId {
            raw: raw.to_string(),
        };

        if raw.is_empty() || !raw.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid());
        }

        raw.parse::<u64>().map(Self).map_err(|_| invalid())
    }
}

/// A lock-free allocator of [`RequestId`]s.
///
/// The allocator stores the last issued id in an [`AtomicU64`]. Every call to
/// [`Self::allocate`] performs exactly one atomic increment, so concurrent
/// callers always observe distinct values and the sequence never goes
/// backwards. The first id issued is `1`.
#[derive(Debug, Default)]
pub struct IdAllocator {
    last: AtomicU64,
}

impl IdAllocator {
    /// Creates an allocator whose first id will be `1`.
    pub const fn new() -> Self {
        Self {
            last: AtomicU64::new(0),
        }
    }

    /// Issues the next id. Infallible and safe to call from any thread.
    pub fn allocate(&self) -> RequestId {
        // Uniqueness only depends on the single read-modify-write, so relaxed
        // ordering is enough.
        RequestId(self.last.fetch_add(1, Ordering::Relaxed) + 1)
    }

    /// Number of ids issued so far.
    pub fn allocated(&self) -> u64 {
        self.last.load(Ordering::Relaxed)
    }
}
