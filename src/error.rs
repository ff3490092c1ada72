//! Error types.

use crate::layout::LayoutViolation;

/// Why a [`Registry`](crate::Registry) could not be built.
///
/// Raised once, when a container is constructed. No container is produced.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum RegistrationError {
    /// The capability is a data type (sized, a slice or `str`) rather than a
    /// trait object.
    #[error("capability `{capability}` is not a trait object")]
    NotBehavioral {
        /// Name of the capability type.
        capability: &'static str,
    },
    /// The discriminant enumeration has no enumerant with tag 0, so a fresh
    /// slot would not decode.
    #[error("discriminant `{discriminant}` has no enumerant with tag 0")]
    MissingDefaultDiscriminant {
        /// Name of the discriminant enumeration.
        discriminant: &'static str,
    },
    /// A variant contains padding or misordered fields.
    #[error("variant `{variant}` is not a plain value type: {violation}")]
    NotPlain {
        /// Name of the variant.
        variant: &'static str,
        /// First layout problem found.
        violation: LayoutViolation,
    },
    /// The same variant type was registered twice.
    #[error("variant `{variant}` is registered twice")]
    DuplicateVariant {
        /// Name of the variant.
        variant: &'static str,
    },
    /// No enumerant is named after the variant and no explicit mapping was
    /// given.
    #[error("variant `{variant}` has no matching enumerant in `{discriminant}`")]
    NoDiscriminant {
        /// Name of the variant.
        variant: &'static str,
        /// Name of the discriminant enumeration.
        discriminant: &'static str,
    },
    /// Two variants resolve to the same enumerant.
    #[error("variants `{other}` and `{variant}` both map to `{discriminant}`")]
    DuplicateDiscriminant {
        /// The variant registered last.
        variant: &'static str,
        /// The variant that already holds the enumerant.
        other: &'static str,
        /// The contested enumerant.
        discriminant: &'static str,
    },
}

/// Errors returned by [`StructArray`](crate::StructArray) operations.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// Building the registry failed.
    #[error(transparent)]
    Registration(#[from] RegistrationError),
    /// The variant type is not part of the registry.
    #[error("variant `{variant}` is not registered")]
    UnregisteredVariant {
        /// Name of the variant.
        variant: &'static str,
    },
    /// Index outside `0..capacity`.
    #[error("index {index} out of range for capacity {capacity}")]
    IndexOutOfRange {
        /// The requested index.
        index: usize,
        /// Number of slots.
        capacity: usize,
    },
    /// The slot holds a different variant than the one requested.
    #[error("expected variant `{expected}`, slot holds tag {found}")]
    VariantMismatch {
        /// Name of the requested variant.
        expected: &'static str,
        /// Tag byte stored in the slot.
        found: u8,
    },
    /// The variant does not fit in a slot payload.
    #[error("variant `{variant}` is {size} bytes, slot payload is {payload} bytes")]
    VariantTooLarge {
        /// Name of the variant.
        variant: &'static str,
        /// `size_of` the variant.
        size: usize,
        /// Payload bytes available.
        payload: usize,
    },
    /// The variant would write padding bytes into the buffer.
    #[error("variant `{variant}` is not a plain value type: {violation}")]
    NotPlain {
        /// Name of the variant.
        variant: &'static str,
        /// First layout problem found.
        violation: LayoutViolation,
    },
    /// The tag byte does not name any enumerant.
    #[error("slot {index} holds unknown tag {tag}")]
    UnknownDiscriminant {
        /// Slot index.
        index: usize,
        /// Raw tag byte.
        tag: u8,
    },
    /// `capacity * slot_size` does not fit in `usize`.
    #[error("capacity {capacity} with slot size {slot_size} overflows")]
    CapacityOverflow {
        /// Requested capacity.
        capacity: usize,
        /// Bytes per slot.
        slot_size: usize,
    },
}
