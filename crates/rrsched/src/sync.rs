//! Platform abstraction for synchronization primitives.
//!
//! Provides unified `Mutex` and `Arc` types. With the default `std` feature
//! the lock is a `parking_lot::Mutex`; the `lock-free` feature swaps in
//! `spin::Mutex`. Neither flavour poisons, so `lock()` hands back the guard
//! directly.

#[cfg(not(any(feature = "std", feature = "lock-free")))]
compile_error!("rrsched needs either the `std` or the `lock-free` feature");

pub use std::sync::{Arc, Weak};

#[cfg(feature = "lock-free")]
pub type MutexGuard<'a, T> = spin::MutexGuard<'a, T>;
#[cfg(not(feature = "lock-free"))]
pub type MutexGuard<'a, T> = parking_lot::MutexGuard<'a, T>;

/// Platform-agnostic mutex wrapper.
pub struct Mutex<T> {
    #[cfg(feature = "lock-free")]
    inner: spin::Mutex<T>,
    #[cfg(not(feature = "lock-free"))]
    inner: parking_lot::Mutex<T>,
}

impl<T> Mutex<T> {
    /// Creates a new mutex protecting the given value.
    pub fn new(value: T) -> Self {
        Self {
            #[cfg(feature = "lock-free")]
            inner: spin::Mutex::new(value),
            #[cfg(not(feature = "lock-free"))]
            inner: parking_lot::Mutex::new(value),
        }
    }

    /// Acquires the mutex.
    ///
    /// The scheduler never holds one of these across a call into a
    /// collaborator, so re-entrant calls from collaborators cannot deadlock.
    pub fn lock(&self) -> MutexGuard<'_, T> {
        self.inner.lock()
    }
}

impl<T: Default> Default for Mutex<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}
