//! Inline-only storage.

use core::alloc::Layout;
use core::fmt;
use core::marker::PhantomData;
use core::mem::{align_of, size_of, MaybeUninit};
use core::ptr;

use crate::space::S2;
use crate::table::{CopyPolicy, Copyable, Erasable, MoveOnly, ResourceTable};
use crate::{AllocError, Emplace, Storage};

/// A [`LocalStorage`] that accepts values which are not [`Clone`], and is not [`Clone`] itself.
///
/// ```compile_fail
/// use erased_storage::MoveOnlyLocalStorage;
///
/// fn assert_clone<T: Clone>() {}
/// assert_clone::<MoveOnlyLocalStorage>();
/// ```
pub type MoveOnlyLocalStorage<Space = S2> = LocalStorage<Space, MoveOnly>;

/// Inline-only storage.
///
/// The value always lives inside the storage's own `Space`. Emplacing a type that is larger or
/// more aligned than `Space` fails to compile.
///
/// # Examples
///
/// ```
/// use erased_storage::space::Space;
/// use erased_storage::{LocalStorage, Storage};
///
/// let mut storage: LocalStorage<Space<32, 8>> = LocalStorage::new();
/// storage.emplace([1u64, 2, 3]);
/// assert_eq!(unsafe { storage.downcast_ref::<[u64; 3]>() }, Some(&[1, 2, 3]));
/// ```
///
/// ```compile_fail
/// use erased_storage::space::S1;
/// use erased_storage::LocalStorage;
///
/// let mut storage: LocalStorage<S1> = LocalStorage::new();
/// storage.emplace([0usize; 2]);
/// ```
pub struct LocalStorage<Space = S2, P: CopyPolicy = Copyable> {
    space: MaybeUninit<Space>,
    table: Option<&'static ResourceTable<P>>,
    _phantom: PhantomData<*mut ()>,
}

impl<Space, P: CopyPolicy> LocalStorage<Space, P> {
    /// An empty storage.
    #[inline]
    pub const fn new() -> Self {
        LocalStorage {
            space: MaybeUninit::uninit(),
            table: None,
            _phantom: PhantomData,
        }
    }

    /// The size and alignment available to stored values.
    #[inline]
    pub const fn capacity() -> Layout {
        Layout::new::<Space>()
    }

    /// Returns true if a `T` fits this storage.
    #[inline]
    pub const fn fits<T>() -> bool {
        size_of::<T>() <= size_of::<Space>() && align_of::<T>() <= align_of::<Space>()
    }

    /// Drops the current value, then stores `value`.
    ///
    /// Fails to compile if `T` does not fit `Space`.
    #[inline]
    pub fn emplace<T: Erasable<P>>(&mut self, value: T) -> &mut T {
        self.emplace_with(|| value)
    }

    /// Drops the current value, then stores the value returned by `f`.
    ///
    /// Fails to compile if `T` does not fit `Space`.
    pub fn emplace_with<T: Erasable<P>, F: FnOnce() -> T>(&mut self, f: F) -> &mut T {
        const {
            assert!(
                size_of::<T>() <= size_of::<Space>() && align_of::<T>() <= align_of::<Space>(),
                "value does not fit the space of this LocalStorage"
            );
        }

        self.reset();
        let slot = self.space.as_mut_ptr().cast::<T>();
        unsafe {
            slot.write(f());
            self.table = Some(T::TABLE);
            &mut *slot
        }
    }

    /// Moves the value out of `src`, leaving it empty.
    ///
    /// Fails to compile if `Space` is declared smaller or less aligned than `Other`, whatever the
    /// value actually stored in `src`.
    ///
    /// ```compile_fail
    /// use erased_storage::space::{S2, S4};
    /// use erased_storage::LocalStorage;
    ///
    /// let mut small: LocalStorage<S2> = LocalStorage::new();
    /// let mut large: LocalStorage<S4> = LocalStorage::new();
    /// small.move_from(&mut large);
    /// ```
    pub fn move_from<Other>(&mut self, src: &mut LocalStorage<Other, P>) {
        const {
            assert!(
                size_of::<Other>() <= size_of::<Space>() && align_of::<Other>() <= align_of::<Space>(),
                "destination space is smaller than the source space"
            );
        }

        self.reset();
        if let Some(table) = src.table.take() {
            unsafe { (table.relocate)(src.space.as_mut_ptr().cast(), self.space.as_mut_ptr().cast()) };
            self.table = Some(table);
        }
    }

    /// Transforms into a storage with a different space.
    ///
    /// Fails to compile if `ToSpace` is declared smaller or less aligned than `Space`.
    ///
    /// # Example
    ///
    /// ```
    /// use erased_storage::space::{S2, S4};
    /// use erased_storage::{LocalStorage, Storage};
    ///
    /// let mut s: LocalStorage<S2> = LocalStorage::new();
    /// s.emplace(3u8);
    /// let m: LocalStorage<S4> = s.resize();
    /// assert_eq!(unsafe { m.downcast_ref::<u8>() }, Some(&3));
    /// ```
    ///
    /// ```compile_fail
    /// use erased_storage::space::{S1, S2};
    /// use erased_storage::LocalStorage;
    ///
    /// let s: LocalStorage<S2> = LocalStorage::new();
    /// let _xs: LocalStorage<S1> = s.resize();
    /// ```
    pub fn resize<ToSpace>(mut self) -> LocalStorage<ToSpace, P> {
        let mut result = LocalStorage::new();
        result.move_from(&mut self);
        result
    }

    /// Returns the resource table of the stored value.
    #[inline]
    pub fn table(&self) -> Option<&'static ResourceTable<P>> {
        self.table
    }
}

impl<Space> LocalStorage<Space, Copyable> {
    /// Drops the current value, then stores a clone of the value in `src`.
    ///
    /// Fails to compile if `Space` is declared smaller or less aligned than `Other`.
    ///
    /// ```compile_fail
    /// use erased_storage::space::Space;
    /// use erased_storage::LocalStorage;
    ///
    /// let src: LocalStorage<Space<16, 16>> = LocalStorage::new();
    /// let mut dst: LocalStorage<Space<64, 8>> = LocalStorage::new();
    /// dst.copy_from(&src);
    /// ```
    pub fn copy_from<Other>(&mut self, src: &LocalStorage<Other, Copyable>) {
        const {
            assert!(
                size_of::<Other>() <= size_of::<Space>() && align_of::<Other>() <= align_of::<Space>(),
                "destination space is smaller than the source space"
            );
        }

        self.reset();
        if let Some(table) = src.table {
            unsafe { (table.clone)(src.space.as_ptr().cast(), self.space.as_mut_ptr().cast()) };
            self.table = Some(table);
        }
    }
}

impl<Space, P: CopyPolicy> Storage for LocalStorage<Space, P> {
    #[inline]
    fn data(&self) -> *const () {
        match self.table {
            Some(_) => self.space.as_ptr().cast(),
            None => ptr::null(),
        }
    }

    #[inline]
    fn data_mut(&mut self) -> *mut () {
        match self.table {
            Some(_) => self.space.as_mut_ptr().cast(),
            None => ptr::null_mut(),
        }
    }

    fn reset(&mut self) {
        if let Some(table) = self.table.take() {
            unsafe { (table.drop)(self.space.as_mut_ptr().cast()) }
        }
    }
}

impl<Space, P: CopyPolicy, T: Erasable<P>> Emplace<T> for LocalStorage<Space, P> {
    #[inline]
    fn try_emplace_with<F>(&mut self, f: F) -> Result<&mut T, AllocError>
    where
        F: FnOnce() -> T,
    {
        Ok(self.emplace_with(f))
    }
}

impl<Space, P: CopyPolicy> Default for LocalStorage<Space, P> {
    fn default() -> Self {
        LocalStorage::new()
    }
}

impl<Space, P: CopyPolicy> Drop for LocalStorage<Space, P> {
    fn drop(&mut self) {
        self.reset()
    }
}

impl<Space> Clone for LocalStorage<Space, Copyable> {
    fn clone(&self) -> Self {
        let mut result = LocalStorage::new();
        result.copy_from(self);
        result
    }
}

impl<Space, P: CopyPolicy> fmt::Debug for LocalStorage<Space, P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LocalStorage")
            .field("capacity", &Self::capacity())
            .field("table", &self.table)
            .finish()
    }
}
