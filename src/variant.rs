//! Closed-set storage over a compile-time list of types.
//!
//! Type lists are cons lists of tuples ending in `()`, usually written with [`type_list!`]:
//! `type_list![A, B, C]` is `(A, (B, (C, ())))`. The storage for a list is a nest of unions
//! mirroring it, and every operation walks the nest recursively, comparing the depth with the
//! stored tag. No resource table is involved: the set of types is known at every call site.

use core::fmt;
use core::marker::PhantomData;
use core::mem::{ManuallyDrop, MaybeUninit};
use core::ptr;

use crate::{AllocError, Emplace, Storage};

/// Builds a type list for [`VariantStorage`].
///
/// ```
/// use erased_storage::type_list;
///
/// let _: Option<type_list![u8, u16]> = None::<(u8, (u16, ()))>;
/// ```
#[macro_export]
macro_rules! type_list {
    () => { () };
    ($head:ty $(, $tail:ty)* $(,)?) => { ($head, $crate::type_list!($($tail),*)) };
}

/// Tag value of an empty [`VariantStorage`].
const EMPTY: u8 = u8::MAX;

/// Nested union holding one member of a type list.
///
/// All fields start at offset zero, so the address of the union is the address of whichever
/// member is live.
#[doc(hidden)]
#[repr(C)]
pub union Slots<H, Rest> {
    head: ManuallyDrop<H>,
    rest: ManuallyDrop<Rest>,
}

/// A closed list of types.
///
/// # Safety
///
/// `drop_at` must drop exactly the member at `index`, located by walking `Slots`.
pub unsafe trait TypeList: 'static {
    /// The union able to hold any member.
    type Slots;

    /// Number of members.
    const LEN: usize;

    /// Drops the member at `index` in place.
    ///
    /// # Safety
    ///
    /// The member at `index` must be live in `slots`, and `index < Self::LEN`.
    unsafe fn drop_at(slots: *mut Self::Slots, index: usize);
}

unsafe impl TypeList for () {
    type Slots = ();
    const LEN: usize = 0;

    unsafe fn drop_at(_slots: *mut (), _index: usize) {
        debug_assert!(false, "tag out of range for type list");
    }
}

unsafe impl<H: 'static, Rest: TypeList> TypeList for (H, Rest) {
    type Slots = Slots<H, Rest::Slots>;
    const LEN: usize = 1 + Rest::LEN;

    unsafe fn drop_at(slots: *mut Self::Slots, index: usize) {
        if index == 0 {
            ptr::drop_in_place(ptr::addr_of_mut!((*slots).head).cast::<H>());
        } else {
            Rest::drop_at(ptr::addr_of_mut!((*slots).rest).cast(), index - 1);
        }
    }
}

/// A type list whose members are all [`Clone`].
///
/// # Safety
///
/// `clone_at` must clone exactly the member at `index`.
pub unsafe trait CloneList: TypeList {
    /// Clones the member at `index` of `src` into `dst`.
    ///
    /// # Safety
    ///
    /// The member at `index` must be live in `src`, `dst` must be writable, and
    /// `index < Self::LEN`.
    unsafe fn clone_at(src: *const Self::Slots, dst: *mut Self::Slots, index: usize);
}

unsafe impl CloneList for () {
    unsafe fn clone_at(_src: *const (), _dst: *mut (), _index: usize) {
        debug_assert!(false, "tag out of range for type list");
    }
}

unsafe impl<H: Clone + 'static, Rest: CloneList> CloneList for (H, Rest) {
    unsafe fn clone_at(src: *const Self::Slots, dst: *mut Self::Slots, index: usize) {
        if index == 0 {
            let value = (*ptr::addr_of!((*src).head).cast::<H>()).clone();
            ptr::addr_of_mut!((*dst).head).cast::<H>().write(value);
        } else {
            Rest::clone_at(
                ptr::addr_of!((*src).rest).cast(),
                ptr::addr_of_mut!((*dst).rest).cast(),
                index - 1,
            );
        }
    }
}

/// Index marker: the type is the head of the list.
pub struct Here;

/// Index marker: the type is somewhere in the rest of the list.
pub struct There<I>(PhantomData<I>);

/// Proof that `T` is a member of a type list, at the position encoded by `I`.
///
/// `I` is always inferred.
///
/// # Safety
///
/// `INDEX` must be the position of `T`, and `slot` must return the slot of that position.
pub unsafe trait Member<T, I>: TypeList {
    /// Position of `T` in the list.
    const INDEX: usize;

    /// Locates the slot of `T`.
    ///
    /// # Safety
    ///
    /// `slots` must be valid for the whole union.
    unsafe fn slot(slots: *mut Self::Slots) -> *mut T;
}

unsafe impl<H: 'static, Rest: TypeList> Member<H, Here> for (H, Rest) {
    const INDEX: usize = 0;

    unsafe fn slot(slots: *mut Self::Slots) -> *mut H {
        ptr::addr_of_mut!((*slots).head).cast()
    }
}

unsafe impl<H: 'static, T, I, Rest: Member<T, I>> Member<T, There<I>> for (H, Rest) {
    const INDEX: usize = 1 + Rest::INDEX;

    unsafe fn slot(slots: *mut Self::Slots) -> *mut T {
        Rest::slot(ptr::addr_of_mut!((*slots).rest).cast())
    }
}

/// Storage for one value out of a closed list of types.
///
/// The tag is always a single `u8`, whatever the length of the list. `u8::MAX` marks the storage
/// as empty, which caps lists at 254 types; longer lists fail to compile when the storage is
/// created. The storage is [`Clone`] iff every member is.
///
/// # Example
///
/// ```
/// use erased_storage::{type_list, Storage, VariantStorage};
///
/// let mut storage: VariantStorage<type_list![u32, String]> = VariantStorage::new();
/// assert_eq!(storage.tag(), None);
///
/// storage.emplace(7u32);
/// assert_eq!(storage.get::<u32, _>(), Some(&7));
/// assert_eq!(storage.get::<String, _>(), None);
///
/// storage.emplace(String::from("seven"));
/// assert_eq!(storage.tag(), Some(1));
/// assert!(!storage.is_empty());
/// ```
///
/// Only members of the list can be stored:
///
/// ```compile_fail
/// use erased_storage::{type_list, VariantStorage};
///
/// let mut storage: VariantStorage<type_list![u8, u16]> = VariantStorage::new();
/// storage.emplace(1u32);
/// ```
///
/// A single member that is not [`Clone`] makes the storage move-only:
///
/// ```compile_fail
/// use erased_storage::{type_list, VariantStorage};
///
/// struct Unique;
///
/// fn assert_clone<T: Clone>() {}
/// assert_clone::<VariantStorage<type_list![u8, Unique]>>();
/// ```
pub struct VariantStorage<L: TypeList> {
    slots: MaybeUninit<L::Slots>,
    tag: u8,
}

impl<L: TypeList> VariantStorage<L> {
    const LEN_FITS_TAG: () = assert!(L::LEN < 255, "type list too long for a u8 tag");

    /// An empty storage.
    #[inline]
    pub const fn new() -> Self {
        let () = Self::LEN_FITS_TAG;
        VariantStorage {
            slots: MaybeUninit::uninit(),
            tag: EMPTY,
        }
    }

    /// Position of the stored type in `L`, or `None` if empty.
    #[inline]
    pub fn tag(&self) -> Option<usize> {
        match self.tag {
            EMPTY => None,
            tag => Some(usize::from(tag)),
        }
    }

    /// Returns true if the stored value is a `T`.
    #[inline]
    pub fn holds<T, I>(&self) -> bool
    where
        L: Member<T, I>,
    {
        self.tag() == Some(<L as Member<T, I>>::INDEX)
    }

    /// Drops the current value, then stores `value`.
    #[inline]
    pub fn emplace<T, I>(&mut self, value: T) -> &mut T
    where
        L: Member<T, I>,
    {
        self.emplace_with(|| value)
    }

    /// Drops the current value, then stores the value returned by `f`.
    pub fn emplace_with<T, I, F>(&mut self, f: F) -> &mut T
    where
        L: Member<T, I>,
        F: FnOnce() -> T,
    {
        self.reset();
        let tag = Self::tag_of(<L as Member<T, I>>::INDEX);
        unsafe {
            let slot = <L as Member<T, I>>::slot(self.slots.as_mut_ptr());
            slot.write(f());
            self.tag = tag;
            &mut *slot
        }
    }

    /// The stored value, if it is a `T`.
    #[inline]
    pub fn get<T, I>(&self) -> Option<&T>
    where
        L: Member<T, I>,
    {
        if self.holds::<T, I>() {
            // Member slots only read the address, the pointer is never written through.
            let slots = self.slots.as_ptr().cast_mut();
            unsafe { Some(&*<L as Member<T, I>>::slot(slots)) }
        } else {
            None
        }
    }

    /// The stored value, mutably, if it is a `T`.
    #[inline]
    pub fn get_mut<T, I>(&mut self) -> Option<&mut T>
    where
        L: Member<T, I>,
    {
        if self.holds::<T, I>() {
            unsafe { Some(&mut *<L as Member<T, I>>::slot(self.slots.as_mut_ptr())) }
        } else {
            None
        }
    }

    fn tag_of(index: usize) -> u8 {
        debug_assert!(index < L::LEN);
        u8::try_from(index).unwrap_or(EMPTY)
    }
}

impl<L: TypeList> Storage for VariantStorage<L> {
    #[inline]
    fn data(&self) -> *const () {
        match self.tag {
            EMPTY => ptr::null(),
            _ => self.slots.as_ptr().cast(),
        }
    }

    #[inline]
    fn data_mut(&mut self) -> *mut () {
        match self.tag {
            EMPTY => ptr::null_mut(),
            _ => self.slots.as_mut_ptr().cast(),
        }
    }

    fn reset(&mut self) {
        let tag = core::mem::replace(&mut self.tag, EMPTY);
        if tag != EMPTY {
            unsafe { L::drop_at(self.slots.as_mut_ptr(), usize::from(tag)) }
        }
    }
}

impl<L, T, I> Emplace<T, I> for VariantStorage<L>
where
    L: Member<T, I>,
{
    #[inline]
    fn try_emplace_with<F>(&mut self, f: F) -> Result<&mut T, AllocError>
    where
        F: FnOnce() -> T,
    {
        Ok(self.emplace_with(f))
    }
}

impl<L: TypeList> Default for VariantStorage<L> {
    fn default() -> Self {
        VariantStorage::new()
    }
}

impl<L: TypeList> Drop for VariantStorage<L> {
    fn drop(&mut self) {
        self.reset()
    }
}

impl<L: CloneList> Clone for VariantStorage<L> {
    fn clone(&self) -> Self {
        let mut result = VariantStorage::new();
        if self.tag != EMPTY {
            unsafe {
                L::clone_at(
                    self.slots.as_ptr(),
                    result.slots.as_mut_ptr(),
                    usize::from(self.tag),
                );
            }
            result.tag = self.tag;
        }
        result
    }
}

impl<L: TypeList> fmt::Debug for VariantStorage<L> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VariantStorage")
            .field("len", &L::LEN)
            .field("tag", &self.tag())
            .finish()
    }
}
