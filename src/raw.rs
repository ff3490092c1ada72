//! Byte reinterpretation.
//!
//! This is the only place where values are copied in and out of the backing
//! buffer through raw pointers. Both directions are unaligned: slots start at
//! `index * slot_size + 1`, which is rarely a multiple of the value's
//! alignment.

use core::mem;
use core::ptr;

use crate::error::Error;
use crate::layout::Plain;

/// Copies a `V` out of the first `size_of::<V>()` bytes of `src`.
///
/// Any initialized bytes are a valid `V` because `V: Plain`, so a mismatched
/// type yields garbage, never undefined behavior.
pub(crate) fn read<V: Plain>(src: &[u8]) -> Result<V, Error> {
    let size = mem::size_of::<V>();
    if src.len() < size {
        return Err(Error::VariantTooLarge {
            variant: V::LAYOUT.name,
            size,
            payload: src.len(),
        });
    }
    // SAFETY: `src` holds at least `size` initialized bytes and every bit
    // pattern is a valid `V`.
    Ok(unsafe { ptr::read_unaligned(src.as_ptr().cast::<V>()) })
}

/// Copies the bytes of `value` over the first `size_of::<V>()` bytes of
/// `dst`, leaving the rest of `dst` untouched.
pub(crate) fn write<V: Plain>(dst: &mut [u8], value: &V) -> Result<(), Error> {
    if let Some(violation) = V::LAYOUT.violation() {
        return Err(Error::NotPlain {
            variant: V::LAYOUT.name,
            violation,
        });
    }
    let size = mem::size_of::<V>();
    if dst.len() < size {
        return Err(Error::VariantTooLarge {
            variant: V::LAYOUT.name,
            size,
            payload: dst.len(),
        });
    }
    // SAFETY: `dst` has room for `size` bytes and `V` is dense, so no
    // uninitialized padding lands in the buffer.
    unsafe { ptr::write_unaligned(dst.as_mut_ptr().cast::<V>(), *value) };
    Ok(())
}
