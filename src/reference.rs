//! Non-owning storage.

use core::fmt;
use core::marker::PhantomData;
use core::ptr;

use crate::Storage;

/// A storage that borrows a value instead of owning it.
///
/// Holds a single pointer, never allocates and never drops the referent.
///
/// # Example
///
/// ```
/// use erased_storage::{RefStorage, Storage};
///
/// let mut value = 42u32;
/// let storage = RefStorage::new_mut(&mut value);
/// assert_eq!(unsafe { storage.downcast_ref::<u32>() }, Some(&42));
/// ```
#[derive(Clone, Copy)]
pub struct RefStorage<'a> {
    ptr: *mut (),
    _phantom: PhantomData<&'a mut ()>,
}

impl<'a> RefStorage<'a> {
    /// An empty reference.
    #[inline]
    pub const fn empty() -> Self {
        RefStorage {
            ptr: ptr::null_mut(),
            _phantom: PhantomData,
        }
    }

    /// Borrow `value` immutably.
    ///
    /// Writing through [`Storage::data_mut`] of the result is undefined behavior.
    #[inline]
    pub fn new<T>(value: &'a T) -> Self {
        RefStorage {
            ptr: ptr::from_ref(value).cast_mut().cast(),
            _phantom: PhantomData,
        }
    }

    /// Borrow `value` mutably.
    #[inline]
    pub fn new_mut<T>(value: &'a mut T) -> Self {
        RefStorage {
            ptr: ptr::from_mut(value).cast(),
            _phantom: PhantomData,
        }
    }

    /// Borrow whatever value `storage` currently holds.
    ///
    /// The result refers to the payload, not to `storage` itself, and is empty if `storage` is.
    /// Writing through [`Storage::data_mut`] of the result is undefined behavior.
    #[inline]
    pub fn borrow<S: Storage>(storage: &'a S) -> Self {
        RefStorage {
            ptr: storage.data().cast_mut(),
            _phantom: PhantomData,
        }
    }

    /// Mutably borrow whatever value `storage` currently holds.
    #[inline]
    pub fn borrow_mut<S: Storage>(storage: &'a mut S) -> Self {
        RefStorage {
            ptr: storage.data_mut(),
            _phantom: PhantomData,
        }
    }
}

impl Default for RefStorage<'_> {
    fn default() -> Self {
        RefStorage::empty()
    }
}

impl Storage for RefStorage<'_> {
    #[inline]
    fn data(&self) -> *const () {
        self.ptr
    }

    #[inline]
    fn data_mut(&mut self) -> *mut () {
        self.ptr
    }

    #[inline]
    fn reset(&mut self) {
        self.ptr = ptr::null_mut();
    }
}

impl fmt::Debug for RefStorage<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("RefStorage").field(&self.ptr).finish()
    }
}

impl<'a, T> From<&'a mut T> for RefStorage<'a> {
    fn from(value: &'a mut T) -> Self {
        RefStorage::new_mut(value)
    }
}
