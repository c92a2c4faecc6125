//! Resource tables describing how to handle one erased type.
//!
//! A [`ResourceTable`] is a set of function pointers instantiated for one concrete type `T` and
//! one [`CopyPolicy`]. Tables are materialised as constants the first time a storage is used with
//! `T` and are never mutated afterwards, so every storage holding a `T` can share one.
//!
//! # Safety Invariant
//!
//! Tables can only be obtained through [`Erasable::TABLE`], which pairs every function pointer
//! with the same `T` at compile time. Callers must only ever pass pointers to a live `T` (or to
//! uninitialised memory laid out for `T`, where noted) into a table's functions.

use core::alloc::Layout;
use core::fmt;
use core::ptr::{self, NonNull};

use crate::heap;
use crate::raw_alloc;

pub(crate) type CloneFn = unsafe fn(*const u8, *mut u8);
pub(crate) type HeapCloneFn = unsafe fn(*const u8) -> Option<NonNull<u8>>;
pub(crate) type BlockCloneFn = unsafe fn(NonNull<u8>) -> Option<NonNull<u8>>;

mod sealed {
    pub trait Sealed {}
}

/// Whether storages using this policy can duplicate their value.
///
/// Implemented by [`Copyable`] and [`MoveOnly`] only.
pub trait CopyPolicy: sealed::Sealed + 'static {
    /// `F` for copyable policies, `()` for move-only ones.
    type CloneFn<F: Copy + 'static>: Copy + 'static;
}

/// Storages using this policy are [`Clone`], and only accept [`Clone`] values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Copyable;

/// Storages using this policy accept any value but cannot be cloned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct MoveOnly;

impl sealed::Sealed for Copyable {}
impl sealed::Sealed for MoveOnly {}

impl CopyPolicy for Copyable {
    type CloneFn<F: Copy + 'static> = F;
}

impl CopyPolicy for MoveOnly {
    type CloneFn<F: Copy + 'static> = ();
}

/// Function pointers and layout for one erased type under the copy policy `P`.
pub struct ResourceTable<P: CopyPolicy> {
    layout: Layout,
    pub(crate) relocate: unsafe fn(*mut u8, *mut u8),
    pub(crate) clone: P::CloneFn<CloneFn>,
    pub(crate) drop: unsafe fn(*mut u8),
    pub(crate) heap_relocate: unsafe fn(*mut u8) -> Option<NonNull<u8>>,
    pub(crate) heap_clone: P::CloneFn<HeapCloneFn>,
    pub(crate) heap_drop: unsafe fn(NonNull<u8>),
    pub(crate) block_drop: unsafe fn(NonNull<u8>),
    pub(crate) block_clone: P::CloneFn<BlockCloneFn>,
}

impl<P: CopyPolicy> ResourceTable<P> {
    /// The layout of the described type.
    #[inline]
    pub const fn layout(&self) -> Layout {
        self.layout
    }

    /// Returns true if the described type fits a space with the given layout.
    #[inline]
    pub const fn fits_in(&self, space: Layout) -> bool {
        self.layout.size() <= space.size() && self.layout.align() <= space.align()
    }
}

impl<P: CopyPolicy> fmt::Debug for ResourceTable<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResourceTable")
            .field("size", &self.layout.size())
            .field("align", &self.layout.align())
            .finish_non_exhaustive()
    }
}

/// Types that can be stored under the copy policy `P`.
///
/// Every `'static` type is erasable as [`MoveOnly`]; every `Clone + 'static` type is also
/// erasable as [`Copyable`].
///
/// ```
/// use erased_storage::{HeapStorage, MoveOnlyHeapStorage};
///
/// struct Unique;
///
/// let mut storage: MoveOnlyHeapStorage = HeapStorage::new();
/// storage.emplace(Unique).unwrap();
/// ```
///
/// ```compile_fail
/// use erased_storage::HeapStorage;
///
/// struct Unique;
///
/// let mut storage: HeapStorage = HeapStorage::new();
/// storage.emplace(Unique).unwrap();
/// ```
pub trait Erasable<P: CopyPolicy>: Sized + 'static {
    /// The resource table of `Self` under `P`.
    const TABLE: &'static ResourceTable<P>;
}

impl<T: 'static> Erasable<MoveOnly> for T {
    const TABLE: &'static ResourceTable<MoveOnly> = &ResourceTable {
        layout: Layout::new::<T>(),
        relocate: relocate::<T>,
        clone: (),
        drop: drop::<T>,
        heap_relocate: heap_relocate::<T>,
        heap_clone: (),
        heap_drop: heap_drop::<T>,
        block_drop: heap::drop_block::<T, MoveOnly>,
        block_clone: (),
    };
}

impl<T: Clone + 'static> Erasable<Copyable> for T {
    const TABLE: &'static ResourceTable<Copyable> = &ResourceTable {
        layout: Layout::new::<T>(),
        relocate: relocate::<T>,
        clone: clone::<T>,
        drop: drop::<T>,
        heap_relocate: heap_relocate::<T>,
        heap_clone: heap_clone::<T>,
        heap_drop: heap_drop::<T>,
        block_drop: heap::drop_block::<T, Copyable>,
        block_clone: heap::clone_block::<T>,
    };
}

/// Moves the `T` at `src` into the uninitialised slot at `dst`.
///
/// # Safety
///
/// `src` must point to a live `T`, which is logically moved out. `dst` must be valid for writing
/// a `T` and must not overlap `src`.
unsafe fn relocate<T>(src: *mut u8, dst: *mut u8) {
    ptr::copy_nonoverlapping(src.cast::<T>(), dst.cast::<T>(), 1);
}

/// Clones the `T` at `src` into the uninitialised slot at `dst`.
///
/// # Safety
///
/// `src` must point to a live `T`; `dst` must be valid for writing a `T`.
unsafe fn clone<T: Clone>(src: *const u8, dst: *mut u8) {
    let value = (*src.cast::<T>()).clone();
    dst.cast::<T>().write(value);
}

/// # Safety
///
/// `ptr` must point to a live `T` that is not used again.
unsafe fn drop<T>(ptr: *mut u8) {
    ptr::drop_in_place(ptr.cast::<T>());
}

/// Moves the `T` at `src` into a fresh allocation.
///
/// On allocation failure `src` is left untouched.
///
/// # Safety
///
/// `src` must point to a live `T`, which is logically moved out on success.
unsafe fn heap_relocate<T>(src: *mut u8) -> Option<NonNull<u8>> {
    let block = raw_alloc::allocate(Layout::new::<T>())?;
    relocate::<T>(src, block.as_ptr());
    Some(block)
}

/// Clones the `T` at `src` into a fresh allocation.
///
/// # Safety
///
/// `src` must point to a live `T`.
unsafe fn heap_clone<T: Clone>(src: *const u8) -> Option<NonNull<u8>> {
    let value = (*src.cast::<T>()).clone();
    let block = raw_alloc::allocate(Layout::new::<T>())?;
    block.as_ptr().cast::<T>().write(value);
    Some(block)
}

/// Drops the `T` in `block` and releases the allocation.
///
/// # Safety
///
/// `block` must come from [`heap_relocate`], [`heap_clone`] or an allocation of
/// `Layout::new::<T>()` holding a live `T`.
unsafe fn heap_drop<T>(block: NonNull<u8>) {
    ptr::drop_in_place(block.as_ptr().cast::<T>());
    raw_alloc::deallocate(block, Layout::new::<T>());
}
