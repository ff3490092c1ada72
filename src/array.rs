use alloc::vec;
use alloc::vec::Vec;
use core::fmt;
use core::mem;

use crate::error::Error;
use crate::raw;
use crate::registry::{Discriminant, Family, Member, Registry};

/// Bytes in front of every slot payload.
pub const TAG_SIZE: usize = mem::size_of::<u8>();

/// A fixed-capacity array of heterogeneous variants packed into one byte
/// buffer.
///
/// Every slot is `1 + max_variant_size` bytes: a tag byte holding the
/// variant's [`Discriminant`], then the variant's bytes. The buffer is
/// allocated once, zeroed, and never resized.
///
/// # Example
///
/// ```
/// use structarray::{discriminant, family, variant, StructArray};
///
/// pub trait Shape {
///     fn volume(&self) -> i32;
/// }
///
/// variant! {
///     #[derive(Debug, PartialEq)]
///     pub struct Square {
///         pub side: i32,
///     }
/// }
///
/// variant! {
///     #[derive(Debug, PartialEq)]
///     pub struct Cuboid {
///         pub square: Square,
///         pub depth: i32,
///     }
/// }
///
/// impl Shape for Square {
///     fn volume(&self) -> i32 {
///         0
///     }
/// }
///
/// impl Shape for Cuboid {
///     fn volume(&self) -> i32 {
///         self.square.side * self.square.side * self.depth
///     }
/// }
///
/// discriminant! {
///     pub enum ShapeKind {
///         Square,
///         Cuboid,
///     }
/// }
///
/// family! {
///     pub struct Shapes: dyn Shape => ShapeKind {
///         Square,
///         Cuboid,
///     }
/// }
///
/// let mut shapes = StructArray::<Shapes>::new(3).unwrap();
/// shapes.set(0, Square { side: 5 }).unwrap();
/// shapes.set(1, Cuboid { square: Square { side: 2 }, depth: 9 }).unwrap();
///
/// for index in 0..shapes.capacity() {
///     match shapes.discriminant_at(index).unwrap() {
///         ShapeKind::Square => assert!(shapes.get::<Square>(index).unwrap().side >= 0),
///         ShapeKind::Cuboid => assert_eq!(shapes.get::<Cuboid>(index).unwrap().depth, 9),
///     }
/// }
///
/// assert_eq!(shapes.visit(1, |shape| shape.volume()).unwrap(), Some(36));
/// ```
pub struct StructArray<F: Family> {
    data: Vec<u8>,
    capacity: usize,
    slot_size: usize,
    registry: Registry<F>,
}

impl<F: Family> StructArray<F> {
    /// Registers the variants of `F` and allocates `capacity` zeroed slots.
    ///
    /// # Errors
    ///
    /// [`Error::Registration`] if the family does not validate,
    /// [`Error::CapacityOverflow`] if the buffer size overflows `usize`.
    pub fn new(capacity: usize) -> Result<StructArray<F>, Error> {
        Self::with_registry(capacity, Registry::new()?)
    }

    /// Allocates `capacity` zeroed slots sized for an existing registry.
    pub fn with_registry(capacity: usize, registry: Registry<F>) -> Result<StructArray<F>, Error> {
        let slot_size = registry.max_variant_size() + TAG_SIZE;
        let len = capacity
            .checked_mul(slot_size)
            .ok_or(Error::CapacityOverflow {
                capacity,
                slot_size,
            })?;

        Ok(StructArray {
            data: vec![0; len],
            capacity,
            slot_size,
            registry,
        })
    }

    /// Number of slots.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Returns true if the array has no slots.
    pub fn is_empty(&self) -> bool {
        self.capacity == 0
    }

    /// Bytes per slot, tag included.
    pub fn slot_size(&self) -> usize {
        self.slot_size
    }

    /// Payload bytes per slot.
    pub fn payload_size(&self) -> usize {
        self.slot_size - TAG_SIZE
    }

    /// The registry this array was built from.
    pub fn registry(&self) -> &Registry<F> {
        &self.registry
    }

    /// The whole backing buffer.
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Zeroes every slot.
    pub fn clear(&mut self) {
        self.data.fill(0);
    }

    /// Stores `value` at `index`.
    ///
    /// Only the tag and the first `size_of::<V>()` payload bytes are written.
    /// Bytes left over from a larger variant previously stored in the same
    /// slot stay in place; call [`clear`](Self::clear) if they matter.
    ///
    /// # Errors
    ///
    /// [`Error::UnregisteredVariant`] if `V` was not registered,
    /// [`Error::IndexOutOfRange`] if `index >= capacity`.
    pub fn set<V: Member<F>>(&mut self, index: usize, value: V) -> Result<(), Error> {
        let tag = self.registry.tag_of::<V>()?;
        let slot = self.slot_mut(index)?;
        raw::write(&mut slot[TAG_SIZE..], &value)?;
        slot[0] = tag;
        Ok(())
    }

    /// Raw tag byte of the slot at `index`.
    pub fn tag_at(&self, index: usize) -> Result<u8, Error> {
        self.slot(index).map(|slot| slot[0])
    }

    /// Discriminant of the slot at `index`.
    ///
    /// A slot that was never written reports the enumerant with tag 0.
    pub fn discriminant_at(&self, index: usize) -> Result<F::Discriminant, Error> {
        let tag = self.tag_at(index)?;
        <F::Discriminant as Discriminant>::from_tag(tag)
            .ok_or(Error::UnknownDiscriminant { index, tag })
    }

    /// Reads the payload of the slot at `index` as a `V`.
    ///
    /// The stored discriminant is **not** checked: reading a slot that holds
    /// another variant returns that variant's bytes reinterpreted as `V`.
    /// Dispatch on [`discriminant_at`](Self::discriminant_at) first, or use
    /// [`get_checked`](Self::get_checked).
    ///
    /// # Errors
    ///
    /// [`Error::IndexOutOfRange`] if `index >= capacity`,
    /// [`Error::VariantTooLarge`] if `V` does not fit in a payload.
    pub fn get<V: Member<F>>(&self, index: usize) -> Result<V, Error> {
        let slot = self.slot(index)?;
        raw::read(&slot[TAG_SIZE..])
    }

    /// Like [`get`](Self::get), but fails with [`Error::VariantMismatch`]
    /// unless the slot holds a `V`.
    pub fn get_checked<V: Member<F>>(&self, index: usize) -> Result<V, Error> {
        let expected = self.registry.tag_of::<V>()?;
        let found = self.tag_at(index)?;
        if found != expected {
            return Err(Error::VariantMismatch {
                expected: V::LAYOUT.name,
                found,
            });
        }
        self.get(index)
    }

    /// Reads the variant at `index` and hands it to `f` as the family
    /// capability.
    ///
    /// Returns `None` when the slot's tag belongs to no registered variant.
    pub fn visit<R>(
        &self,
        index: usize,
        f: impl FnOnce(&F::Capability) -> R,
    ) -> Result<Option<R>, Error> {
        let slot = self.slot(index)?;
        let Some(entry) = self.registry.entry_for_tag(slot[0]) else {
            return Ok(None);
        };

        let mut f = Some(f);
        let mut out = None;
        (entry.visit)(&slot[TAG_SIZE..], &mut |capability| {
            if let Some(f) = f.take() {
                out = Some(f(capability));
            }
        })?;
        Ok(out)
    }

    /// Reads the variant at `index`, hands it to `f` mutably, and stores the
    /// result back.
    ///
    /// Returns `None` when the slot's tag belongs to no registered variant.
    pub fn modify<R>(
        &mut self,
        index: usize,
        f: impl FnOnce(&mut F::Capability) -> R,
    ) -> Result<Option<R>, Error> {
        let tag = self.tag_at(index)?;
        let Some(entry) = self.registry.entry_for_tag(tag) else {
            return Ok(None);
        };
        let modify = entry.modify;

        let slot = self.slot_mut(index)?;
        let mut f = Some(f);
        let mut out = None;
        modify(&mut slot[TAG_SIZE..], &mut |capability| {
            if let Some(f) = f.take() {
                out = Some(f(capability));
            }
        })?;
        Ok(out)
    }

    fn range(&self, index: usize) -> Result<core::ops::Range<usize>, Error> {
        if index >= self.capacity {
            return Err(Error::IndexOutOfRange {
                index,
                capacity: self.capacity,
            });
        }
        let start = index * self.slot_size;
        Ok(start..start + self.slot_size)
    }

    fn slot(&self, index: usize) -> Result<&[u8], Error> {
        let range = self.range(index)?;
        Ok(&self.data[range])
    }

    fn slot_mut(&mut self, index: usize) -> Result<&mut [u8], Error> {
        let range = self.range(index)?;
        Ok(&mut self.data[range])
    }
}

impl<F: Family> Clone for StructArray<F> {
    fn clone(&self) -> Self {
        StructArray {
            data: self.data.clone(),
            capacity: self.capacity,
            slot_size: self.slot_size,
            registry: self.registry.clone(),
        }
    }
}

impl<F: Family> fmt::Debug for StructArray<F> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("StructArray")
            .field("capacity", &self.capacity)
            .field("slot_size", &self.slot_size)
            .field("registry", &self.registry)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    trait Counter {
        fn bump(&mut self);
        fn count(&self) -> u64;
    }

    crate::variant! {
        #[derive(Debug, PartialEq)]
        struct Small {
            n: u16,
        }
    }

    crate::variant! {
        #[derive(Debug, PartialEq)]
        struct Wide {
            n: u64,
            extra: [u8; 8],
        }
    }

    impl Counter for Small {
        fn bump(&mut self) {
            self.n += 1;
        }

        fn count(&self) -> u64 {
            u64::from(self.n)
        }
    }

    impl Counter for Wide {
        fn bump(&mut self) {
            self.n += 1;
        }

        fn count(&self) -> u64 {
            self.n
        }
    }

    crate::discriminant! {
        enum CounterKind {
            Empty,
            Small,
            Wide,
        }
    }

    crate::family! {
        struct Counters: dyn Counter => CounterKind {
            Small,
            Wide,
        }
    }

    #[test]
    fn test_geometry() {
        let array = StructArray::<Counters>::new(4).unwrap();
        assert_eq!(array.payload_size(), 16);
        assert_eq!(array.slot_size(), 17);
        assert_eq!(array.as_bytes().len(), 68);
        assert!(array.as_bytes().iter().all(|&b| b == 0));
        assert_eq!(array.capacity(), 4);
        assert!(!array.is_empty());
    }

    #[test]
    fn test_zero_capacity() {
        let array = StructArray::<Counters>::new(0).unwrap();
        assert!(array.is_empty());
        assert!(array.as_bytes().is_empty());
        assert_eq!(
            array.tag_at(0),
            Err(Error::IndexOutOfRange {
                index: 0,
                capacity: 0
            })
        );
    }

    #[test]
    fn test_overflow() {
        let err = StructArray::<Counters>::new(usize::MAX).unwrap_err();
        assert_eq!(
            err,
            Error::CapacityOverflow {
                capacity: usize::MAX,
                slot_size: 17
            }
        );
    }

    #[test]
    fn test_set_get() {
        let mut array = StructArray::<Counters>::new(2).unwrap();
        array.set(1, Small { n: 7 }).unwrap();
        assert_eq!(array.tag_at(1), Ok(1));
        assert_eq!(array.discriminant_at(1), Ok(CounterKind::Small));
        assert_eq!(array.get::<Small>(1), Ok(Small { n: 7 }));
        assert_eq!(array.discriminant_at(0), Ok(CounterKind::Empty));
    }

    #[test]
    fn test_checked() {
        let mut array = StructArray::<Counters>::new(1).unwrap();
        array.set(0, Small { n: 3 }).unwrap();
        assert_eq!(array.get_checked::<Small>(0), Ok(Small { n: 3 }));
        assert_eq!(
            array.get_checked::<Wide>(0),
            Err(Error::VariantMismatch {
                expected: "Wide",
                found: 1
            })
        );
        // unchecked read reinterprets the bytes
        let wide = array.get::<Wide>(0).unwrap();
        assert_eq!(&wide.n.to_ne_bytes()[..2], &3u16.to_ne_bytes()[..]);
    }

    #[test]
    fn test_visit_empty_slot() {
        let array = StructArray::<Counters>::new(1).unwrap();
        assert_eq!(array.visit(0, |c| c.count()), Ok(None));
    }

    #[test]
    fn test_modify_persists() {
        let mut array = StructArray::<Counters>::new(2).unwrap();
        array
            .set(
                0,
                Wide {
                    n: 41,
                    extra: [9; 8],
                },
            )
            .unwrap();
        assert_eq!(
            array.modify(0, |c| {
                c.bump();
                c.count()
            }),
            Ok(Some(42))
        );
        assert_eq!(
            array.get::<Wide>(0),
            Ok(Wide {
                n: 42,
                extra: [9; 8]
            })
        );
        assert_eq!(array.modify(1, |c| c.bump()), Ok(None));
        assert!(array.as_bytes()[17..].iter().all(|&b| b == 0));
    }

    #[test]
    fn test_clone_is_independent() {
        let mut array = StructArray::<Counters>::new(1).unwrap();
        let snapshot = array.clone();
        array.set(0, Small { n: 1 }).unwrap();
        assert_eq!(snapshot.discriminant_at(0), Ok(CounterKind::Empty));
        assert_eq!(array.discriminant_at(0), Ok(CounterKind::Small));
    }
}
