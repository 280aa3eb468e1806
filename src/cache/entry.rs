//! Cache Entry Module
//!
//! Defines the value/expiration pair stored by every backend.

use std::fmt;

use serde::{Deserialize, Serialize};

// == Cache Entry ==
/// A cached value together with the instant it stops being fresh.
///
/// Entries are immutable; overwriting a key replaces the whole entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheEntry<V> {
    value: V,
    /// Expiration timestamp (Unix milliseconds)
    expiration_time: i64,
}

impl<V> CacheEntry<V> {
    // == Constructor ==
    /// Creates an entry that expires at `expiration_time`.
    pub fn new(value: V, expiration_time: i64) -> Self {
        Self {
            value,
            expiration_time,
        }
    }

    pub fn value(&self) -> &V {
        &self.value
    }

    pub fn into_value(self) -> V {
        self.value
    }

    pub fn expiration_time(&self) -> i64 {
        self.expiration_time
    }

    // == Is Expired ==
    /// Checks if the entry has expired at `now`.
    ///
    /// An entry is still fresh during the millisecond it expires in; it is
    /// expired only once `now` has moved past `expiration_time`.
    pub fn is_expired_at(&self, now: i64) -> bool {
        self.expiration_time < now
    }

    // == Remaining Lifetime ==
    /// Returns milliseconds until expiration, negative once expired.
    pub fn remaining_ms(&self, now: i64) -> i64 {
        self.expiration_time.saturating_sub(now)
    }

    /// Renders the entry with its remaining lifetime measured at `now`.
    pub fn report_at(&self, now: i64) -> EntryReport<'_, V> {
        EntryReport { entry: self, now }
    }
}

// == Expiration Arithmetic ==
/// Computes the expiration instant for an entry put at `now` with `lifetime_ms`.
///
/// A non-positive lifetime means "always revalidate": the entry is stamped
/// strictly before `now`, so plain reads never serve it while entry reads
/// still return it. A zero lifetime is pulled back one millisecond; a
/// negative one already lands in the past.
pub fn expiration_for(now: i64, lifetime_ms: i64) -> i64 {
    if lifetime_ms == 0 {
        now.saturating_sub(1)
    } else {
        now.saturating_add(lifetime_ms)
    }
}

/// Human-readable rendering relative to `now`.
pub struct EntryReport<'a, V> {
    entry: &'a CacheEntry<V>,
    now: i64,
}

impl<V: fmt::Debug> fmt::Display for EntryReport<'_, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "CacheEntry value: {:?}", self.entry.value)?;
        writeln!(
            f,
            "CacheEntry expiration time: {}",
            self.entry.expiration_time
        )?;
        write!(
            f,
            "Milliseconds until expiration: {}",
            self.entry.remaining_ms(self.now)
        )
    }
}
