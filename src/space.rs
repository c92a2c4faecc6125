//! Space types that determine the inline capacity of a storage.
//!
//! A storage's capacity is `size_of::<Space>()` bytes aligned to `align_of::<Space>()`. The `S*`
//! aliases are measured in `usize` words; [`Space`] spells out an exact size and alignment.

use core::mem::MaybeUninit;

use elain::{Align, Alignment};

/// Space of one word.
pub type S1 = [usize; 1];
/// Space of two words.
pub type S2 = [usize; 2];
/// Space of four words.
pub type S4 = [usize; 4];
/// Space of eight words.
pub type S8 = [usize; 8];
/// Space of sixteen words.
pub type S16 = [usize; 16];
/// Space of thirty-two words.
pub type S32 = [usize; 32];
/// Space of sixty-four words.
pub type S64 = [usize; 64];

/// Space of `SIZE` bytes aligned to `ALIGN`.
///
/// The size is rounded up to a multiple of `ALIGN`, as for any Rust type.
///
/// ```
/// use core::mem::{align_of, size_of};
/// use erased_storage::space::Space;
///
/// assert_eq!(size_of::<Space<32, 8>>(), 32);
/// assert_eq!(align_of::<Space<32, 8>>(), 8);
/// assert_eq!(size_of::<Space<20, 16>>(), 32);
/// ```
#[repr(C)]
pub struct Space<const SIZE: usize, const ALIGN: usize>
where
    Align<ALIGN>: Alignment,
{
    _align: Align<ALIGN>,
    _bytes: [MaybeUninit<u8>; SIZE],
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::alloc::Layout;

    #[test]
    fn test_space_layout() {
        macro_rules! check {
            ($size:expr, $align:expr) => {{
                let layout = Layout::new::<Space<$size, $align>>();
                assert_eq!(layout.align(), $align);
                assert_eq!(layout.size(), ($size + $align - 1) / $align * $align);
            }};
        }

        check!(0, 1);
        check!(1, 1);
        check!(24, 8);
        check!(32, 8);
        check!(33, 8);
        check!(16, 16);
        check!(100, 64);
    }

    #[test]
    fn test_word_spaces() {
        assert_eq!(Layout::new::<S1>(), Layout::new::<usize>());
        assert_eq!(Layout::new::<S4>().size(), 4 * core::mem::size_of::<usize>());
        assert_eq!(Layout::new::<S64>().align(), core::mem::align_of::<usize>());
    }
}
