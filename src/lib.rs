//! # Erased Storage: Type-Erased Value Containers
//!
//! This crate provides a family of containers that hold one value of an arbitrary type behind a
//! uniform, pointer-based interface. Every container implements [`Storage`], so code that only
//! needs "somewhere to keep a value" can be written once and pick its ownership policy later.
//!
//! ## Policies
//!
//! - [`RefStorage`]: borrows a value it does not own. Never allocates.
//! - [`LocalStorage`]: stores the value inline. Types that do not fit fail to compile.
//! - [`SboStorage`]: stores the value inline when it fits and falls back to the heap otherwise.
//! - [`HeapStorage`]: always stores the value in a heap block.
//! - [`VariantStorage`]: stores one of a closed list of types in a tagged union.
//!
//! The owning policies come in a copyable and a move-only flavor, selected by the
//! [`Copyable`] and [`MoveOnly`] markers. Only copyable storages implement [`Clone`].
//!
//! ## Quick Start
//!
//! ```rust
//! use erased_storage::space::S2;
//! use erased_storage::{SboStorage, Storage};
//!
//! let mut storage: SboStorage<S2> = SboStorage::new();
//! assert!(storage.is_empty());
//!
//! // Fits two words, so it stays inline
//! storage.emplace([1usize, 2]).unwrap();
//! assert!(!storage.is_heap_allocated());
//!
//! // Does not fit, so it moves to the heap
//! storage.emplace([0usize; 8]).unwrap();
//! assert!(storage.is_heap_allocated());
//!
//! let value = unsafe { storage.downcast_ref::<[usize; 8]>() };
//! assert_eq!(value, Some(&[0usize; 8]));
//! ```
//!
//! ## Resource Tables
//!
//! Containers never store a type tag. Instead, emplacing a value records a pointer to a static
//! [`ResourceTable`] that knows how to relocate, clone and drop that one type, together with its
//! [`Layout`](core::alloc::Layout). Storages of different capacities can share the same table, which
//! is what allows moving a value between an [`SboStorage`] with a small space and one with a
//! larger space:
//!
//! ```rust
//! use erased_storage::space::{S1, S4};
//! use erased_storage::{SboStorage, Storage};
//!
//! let mut small: SboStorage<S1> = SboStorage::new();
//! small.emplace([7usize; 3]).unwrap();
//! assert!(small.is_heap_allocated());
//!
//! let mut large: SboStorage<S4> = SboStorage::new();
//! large.move_from(&mut small).unwrap();
//! assert!(small.is_empty());
//! assert!(!large.is_heap_allocated());
//! ```
//!
//! ## Closed Variants
//!
//! ```rust
//! use erased_storage::{type_list, VariantStorage};
//!
//! let mut storage: VariantStorage<type_list![u8, String, Vec<u32>]> = VariantStorage::new();
//! storage.emplace(String::from("hello"));
//! assert_eq!(storage.tag(), Some(1));
//! assert_eq!(storage.get::<String, _>().map(String::as_str), Some("hello"));
//! ```
//!
//! ## Feature Flags
//!
//! - **`std`** (enabled by default): links to the standard library and implements
//!   `std::error::Error` for [`AllocError`].
//! - **`nightly`**: uses the strict provenance APIs of the standard library.
//! - **`tracing`**: emits `tracing` events for heap fallbacks and allocation failures.

#![cfg_attr(feature = "nightly", feature(strict_provenance))]
#![cfg_attr(not(feature = "std"), no_std)]
#![allow(stable_features)]
#![deny(missing_docs)]
#![deny(clippy::as_conversions)]

extern crate alloc;

#[macro_use]
mod log;

mod heap;
mod local;
pub mod raw_alloc;
mod reference;
mod sbo;
pub mod space;
mod sptr;
mod storage;
mod table;
mod variant;

pub use crate::heap::{HeapStorage, MoveOnlyHeapStorage};
pub use crate::local::{LocalStorage, MoveOnlyLocalStorage};
pub use crate::reference::RefStorage;
pub use crate::sbo::{MoveOnlySboStorage, SboStorage};
pub use crate::storage::{AllocError, Emplace, Storage};
pub use crate::table::{CopyPolicy, Copyable, Erasable, MoveOnly, ResourceTable};
pub use crate::variant::{CloneList, Here, Member, Slots, There, TypeList, VariantStorage};
