#![allow(dead_code)]

use std::cell::Cell;

thread_local! {
    static LIVE: Cell<isize> = const { Cell::new(0) };
}

/// Number of `Counted` values alive on this thread.
pub fn live() -> isize {
    LIVE.with(Cell::get)
}

fn adjust(delta: isize) {
    LIVE.with(|live| live.set(live.get() + delta));
}

/// A payload that counts its constructions and destructions.
///
/// `Pad` controls size and alignment.
#[derive(Debug, PartialEq)]
pub struct Counted<Pad = ()> {
    pub id: u64,
    pub pad: Pad,
}

impl<Pad> Counted<Pad> {
    pub fn new(id: u64, pad: Pad) -> Self {
        adjust(1);
        Counted { id, pad }
    }
}

impl Counted {
    pub fn unit(id: u64) -> Self {
        Counted::new(id, ())
    }
}

impl<Pad: Clone> Clone for Counted<Pad> {
    fn clone(&self) -> Self {
        Counted::new(self.id, self.pad.clone())
    }
}

impl<Pad> Drop for Counted<Pad> {
    fn drop(&mut self) {
        adjust(-1);
    }
}

/// Runs `f` and checks that every `Counted` it created was dropped.
pub fn no_leaks<R>(f: impl FnOnce() -> R) -> R {
    let before = live();
    let result = f();
    assert_eq!(live(), before, "Counted values leaked or were dropped twice");
    result
}
