//! The contract shared by every storage policy.

use core::fmt;

/// The storage contract shared by every policy.
///
/// A storage is either empty or holds exactly one live value. [`Storage::data`] returns null iff
/// the storage is empty.
pub trait Storage: Default {
    /// Pointer to the stored value, or null if empty.
    fn data(&self) -> *const ();

    /// Mutable pointer to the stored value, or null if empty.
    fn data_mut(&mut self) -> *mut ();

    /// Drops the stored value, if any, and leaves the storage empty.
    fn reset(&mut self);

    /// Returns true if no value is stored.
    #[inline]
    fn is_empty(&self) -> bool {
        self.data().is_null()
    }

    /// Reinterprets the stored value as a `T`.
    ///
    /// Returns `None` if the storage is empty.
    ///
    /// # Safety
    ///
    /// The stored value must be a `T`.
    #[inline]
    unsafe fn downcast_ref<T>(&self) -> Option<&T> {
        self.data().cast::<T>().as_ref()
    }

    /// Reinterprets the stored value as a mutable `T`.
    ///
    /// Returns `None` if the storage is empty.
    ///
    /// # Safety
    ///
    /// The stored value must be a `T`.
    #[inline]
    unsafe fn downcast_mut<T>(&mut self) -> Option<&mut T> {
        self.data_mut().cast::<T>().as_mut()
    }
}

/// Storages that can construct a `T` in place.
///
/// `I` is an inference marker used by [`VariantStorage`](crate::VariantStorage) to locate `T` in
/// its type list; every other storage uses the default `()`.
pub trait Emplace<T, I = ()>: Storage {
    /// Drops the current value, then stores the value returned by `f`.
    ///
    /// On error the storage is left empty and nothing is leaked.
    fn try_emplace_with<F>(&mut self, f: F) -> Result<&mut T, AllocError>
    where
        F: FnOnce() -> T;

    /// Drops the current value, then stores `value`.
    #[inline]
    fn try_emplace(&mut self, value: T) -> Result<&mut T, AllocError> {
        self.try_emplace_with(|| value)
    }
}

/// The global allocator could not serve a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct AllocError;

impl fmt::Display for AllocError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("memory allocation failed")
    }
}

#[cfg(feature = "std")]
impl std::error::Error for AllocError {}
