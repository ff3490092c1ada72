//! Layout descriptors for plain value types.
//!
//! Every type that can live inside a [`StructArray`](crate::StructArray)
//! carries a [`Layout`] describing its byte span. The registry walks these
//! descriptors once, at construction, to reject types whose bytes are not
//! fully determined by their fields.

use core::fmt;
use core::mem;

/// A value type that is nothing but bytes.
///
/// # Safety
///
/// Implementors must guarantee that:
///
/// - every bit pattern of `size_of::<Self>()` bytes is a valid value of
///   `Self` (so `bool`, `char`, enums, references and pointers are excluded);
/// - [`Plain::LAYOUT`] describes the type truthfully: its size, alignment
///   and, for records, the name, offset and size of every field in
///   declaration order.
///
/// Padding is allowed by this trait but such types are refused by the
/// registry, see [`Layout::is_dense`]. Use the [`variant!`](crate::variant)
/// macro rather than implementing this by hand.
pub unsafe trait Plain: Copy + 'static {
    /// Byte layout of `Self`.
    const LAYOUT: Layout;
}

/// Byte layout of a [`Plain`] type.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Layout {
    /// Type name as written in its declaration.
    pub name: &'static str,
    /// `size_of::<T>()`.
    pub size: usize,
    /// `align_of::<T>()`.
    pub align: usize,
    /// What the bytes are made of.
    pub kind: LayoutKind,
}

/// Shape of a [`Layout`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LayoutKind {
    /// A primitive number.
    Scalar,
    /// A fixed-length array.
    Array {
        /// Whether the element layout is dense.
        element_dense: bool,
    },
    /// A `#[repr(C)]` struct, fields in declaration order.
    Record {
        /// The fields.
        fields: &'static [Field],
    },
}

/// One field of a record layout.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Field {
    /// Field name.
    pub name: &'static str,
    /// `offset_of!(T, field)`.
    pub offset: usize,
    /// Size of the field type.
    pub size: usize,
    /// Whether the field type is itself dense.
    pub dense: bool,
}

/// Why a layout is not dense.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LayoutViolation {
    /// A field starts before the end of the previous one.
    OutOfOrder {
        /// The misplaced field.
        field: &'static str,
    },
    /// Padding bytes in front of a field.
    Padding {
        /// The field following the gap.
        field: &'static str,
        /// Size of the gap.
        bytes: usize,
    },
    /// Padding bytes after the last field.
    TrailingPadding {
        /// Size of the tail.
        bytes: usize,
    },
    /// A field, or an array element, contains padding of its own.
    NestedPadding {
        /// The offending field, `"[element]"` for arrays.
        field: &'static str,
    },
}

impl fmt::Display for LayoutViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OutOfOrder { field } => {
                write!(f, "field `{field}` is not laid out in declaration order")
            }
            Self::Padding { field, bytes } => {
                write!(f, "{bytes} padding byte(s) before field `{field}`")
            }
            Self::TrailingPadding { bytes } => write!(f, "{bytes} trailing padding byte(s)"),
            Self::NestedPadding { field } => write!(f, "field `{field}` contains padding"),
        }
    }
}

impl Layout {
    /// Layout of a primitive number type.
    pub const fn scalar<T>(name: &'static str) -> Layout {
        Layout {
            name,
            size: mem::size_of::<T>(),
            align: mem::align_of::<T>(),
            kind: LayoutKind::Scalar,
        }
    }

    /// Returns the first reason these bytes are not fully covered by fields.
    pub const fn violation(&self) -> Option<LayoutViolation> {
        match self.kind {
            LayoutKind::Scalar => None,
            LayoutKind::Array { element_dense } => {
                if element_dense {
                    None
                } else {
                    Some(LayoutViolation::NestedPadding { field: "[element]" })
                }
            }
            LayoutKind::Record { fields } => {
                let mut cursor = 0;
                let mut i = 0;
                while i < fields.len() {
                    let field = &fields[i];
                    if field.offset < cursor {
                        return Some(LayoutViolation::OutOfOrder { field: field.name });
                    }
                    if field.offset > cursor {
                        return Some(LayoutViolation::Padding {
                            field: field.name,
                            bytes: field.offset - cursor,
                        });
                    }
                    if !field.dense {
                        return Some(LayoutViolation::NestedPadding { field: field.name });
                    }
                    cursor += field.size;
                    i += 1;
                }
                if cursor < self.size {
                    Some(LayoutViolation::TrailingPadding {
                        bytes: self.size - cursor,
                    })
                } else {
                    None
                }
            }
        }
    }

    /// `true` when every byte of the type belongs to some field.
    pub const fn is_dense(&self) -> bool {
        self.violation().is_none()
    }
}

macro_rules! impl_plain_scalar {
    ($($ty:ty),* $(,)?) => {
        $(
            unsafe impl Plain for $ty {
                const LAYOUT: Layout = Layout::scalar::<$ty>(stringify!($ty));
            }
        )*
    };
}

impl_plain_scalar!(u8, u16, u32, u64, u128, usize, i8, i16, i32, i64, i128, isize, f32, f64);

unsafe impl<T: Plain, const N: usize> Plain for [T; N] {
    const LAYOUT: Layout = Layout {
        name: "array",
        size: mem::size_of::<[T; N]>(),
        align: mem::align_of::<[T; N]>(),
        kind: LayoutKind::Array {
            element_dense: T::LAYOUT.is_dense(),
        },
    };
}
