//! Variant registration.
//!
//! A [`Family`] names a capability (a trait object type), a [`Discriminant`]
//! enumeration, and the list of variants. [`Registry::new`] walks that list
//! once, validates every variant and fixes the slot size.

use alloc::collections::BTreeMap;
use alloc::vec::Vec;
use core::any::{type_name, TypeId};
use core::fmt;
use core::mem;

use crate::error::{Error, RegistrationError};
use crate::layout::{Layout, Plain};
use crate::raw;

/// A closed `#[repr(u8)]` enumeration tagging the variants of a
/// [`Family`].
///
/// Implemented by the [`discriminant!`](crate::discriminant) macro.
pub trait Discriminant: Copy + Eq + fmt::Debug + 'static {
    /// Name of the enumeration.
    const NAME: &'static str;

    /// Every enumerant.
    const VARIANTS: &'static [Self];

    /// Name of this enumerant.
    fn name(self) -> &'static str;

    /// Tag byte stored in a slot.
    fn to_tag(self) -> u8;

    /// The enumerant stored as `tag`, if any.
    fn from_tag(tag: u8) -> Option<Self> {
        Self::VARIANTS.iter().copied().find(|d| d.to_tag() == tag)
    }

    /// The enumerant called `name`, compared case-sensitively.
    fn from_name(name: &str) -> Option<Self> {
        Self::VARIANTS.iter().copied().find(|d| d.name() == name)
    }
}

/// The set of variants one container can hold.
///
/// Usually generated by the [`family!`](crate::family) macro.
pub trait Family: Sized + 'static {
    /// Capability every variant implements, e.g. `dyn Shape`.
    type Capability: ?Sized + 'static;

    /// Tag enumeration.
    type Discriminant: Discriminant;

    /// Lists the variants.
    fn register(registrar: &mut Registrar<Self>);
}

/// A variant of the family `F`.
pub trait Member<F: Family>: Plain {
    /// View `self` through the family capability.
    fn upcast(&self) -> &F::Capability;

    /// Mutable view of `self` through the family capability.
    fn upcast_mut(&mut self) -> &mut F::Capability;
}

type VisitFn<F> = fn(&[u8], &mut dyn FnMut(&<F as Family>::Capability)) -> Result<(), Error>;
type ModifyFn<F> =
    fn(&mut [u8], &mut dyn FnMut(&mut <F as Family>::Capability)) -> Result<(), Error>;

fn visit_as<F: Family, V: Member<F>>(
    payload: &[u8],
    f: &mut dyn FnMut(&F::Capability),
) -> Result<(), Error> {
    let value = raw::read::<V>(payload)?;
    f(value.upcast());
    Ok(())
}

fn modify_as<F: Family, V: Member<F>>(
    payload: &mut [u8],
    f: &mut dyn FnMut(&mut F::Capability),
) -> Result<(), Error> {
    let mut value = raw::read::<V>(payload)?;
    f(value.upcast_mut());
    raw::write(payload, &value)
}

struct Candidate<F: Family> {
    type_id: TypeId,
    layout: Layout,
    explicit: Option<F::Discriminant>,
    visit: VisitFn<F>,
    modify: ModifyFn<F>,
}

/// Collects the variants of a [`Family`] during [`Family::register`].
pub struct Registrar<F: Family> {
    candidates: Vec<Candidate<F>>,
}

impl<F: Family> Registrar<F> {
    /// Registers `V` under the enumerant named like the type.
    pub fn variant<V: Member<F>>(&mut self) -> &mut Self {
        self.push::<V>(None)
    }

    /// Registers `V` under an explicit enumerant.
    pub fn variant_as<V: Member<F>>(&mut self, discriminant: F::Discriminant) -> &mut Self {
        self.push::<V>(Some(discriminant))
    }

    fn push<V: Member<F>>(&mut self, explicit: Option<F::Discriminant>) -> &mut Self {
        self.candidates.push(Candidate {
            type_id: TypeId::of::<V>(),
            layout: V::LAYOUT,
            explicit,
            visit: visit_as::<F, V>,
            modify: modify_as::<F, V>,
        });
        self
    }
}

pub(crate) struct Entry<F: Family> {
    pub(crate) name: &'static str,
    pub(crate) size: usize,
    pub(crate) discriminant: F::Discriminant,
    pub(crate) visit: VisitFn<F>,
    pub(crate) modify: ModifyFn<F>,
}

impl<F: Family> Clone for Entry<F> {
    fn clone(&self) -> Self {
        Entry {
            name: self.name,
            size: self.size,
            discriminant: self.discriminant,
            visit: self.visit,
            modify: self.modify,
        }
    }
}

/// Immutable mapping from variant type to discriminant, plus the largest
/// variant size.
pub struct Registry<F: Family> {
    entries: Vec<Entry<F>>,
    by_type: BTreeMap<TypeId, usize>,
    by_tag: BTreeMap<u8, usize>,
    max_variant_size: usize,
}

impl<F: Family> Registry<F> {
    /// Runs [`Family::register`] and validates the result.
    ///
    /// # Errors
    ///
    /// Any [`RegistrationError`]: the capability is not a trait object, the
    /// discriminant has no tag 0, or a variant is padded, duplicated, or has
    /// no enumerant.
    pub fn new() -> Result<Self, RegistrationError> {
        let mut registrar = Registrar {
            candidates: Vec::new(),
        };
        F::register(&mut registrar);
        Self::build(registrar).inspect_err(|err| {
            log::debug!("registration of `{}` failed: {err}", type_name::<F>());
        })
    }

    fn build(registrar: Registrar<F>) -> Result<Self, RegistrationError> {
        let discriminant = <F::Discriminant as Discriminant>::NAME;

        // Sized types have thin pointers. Slices and `str` are fat but hold
        // data, so only `dyn` types pass.
        let capability = type_name::<F::Capability>();
        if mem::size_of::<&F::Capability>() == mem::size_of::<&u8>()
            || !capability.starts_with("dyn ")
        {
            return Err(RegistrationError::NotBehavioral { capability });
        }
        if <F::Discriminant as Discriminant>::from_tag(0).is_none() {
            return Err(RegistrationError::MissingDefaultDiscriminant { discriminant });
        }

        let mut registry = Registry {
            entries: Vec::with_capacity(registrar.candidates.len()),
            by_type: BTreeMap::new(),
            by_tag: BTreeMap::new(),
            max_variant_size: 0,
        };

        for candidate in registrar.candidates {
            let layout = candidate.layout;
            if let Some(violation) = layout.violation() {
                return Err(RegistrationError::NotPlain {
                    variant: layout.name,
                    violation,
                });
            }
            if registry.by_type.contains_key(&candidate.type_id) {
                return Err(RegistrationError::DuplicateVariant {
                    variant: layout.name,
                });
            }
            let resolved = match candidate.explicit {
                Some(resolved) => resolved,
                None => <F::Discriminant as Discriminant>::from_name(layout.name).ok_or(
                    RegistrationError::NoDiscriminant {
                        variant: layout.name,
                        discriminant,
                    },
                )?,
            };
            let tag = resolved.to_tag();
            if let Some(&other) = registry.by_tag.get(&tag) {
                return Err(RegistrationError::DuplicateDiscriminant {
                    variant: layout.name,
                    other: registry.entries[other].name,
                    discriminant: resolved.name(),
                });
            }

            log::debug!(
                "registered `{}` as {discriminant}::{} ({} bytes)",
                layout.name,
                resolved.name(),
                layout.size
            );

            let index = registry.entries.len();
            registry.by_type.insert(candidate.type_id, index);
            registry.by_tag.insert(tag, index);
            registry.max_variant_size = registry.max_variant_size.max(layout.size);
            registry.entries.push(Entry {
                name: layout.name,
                size: layout.size,
                discriminant: resolved,
                visit: candidate.visit,
                modify: candidate.modify,
            });
        }

        log::debug!(
            "registry for `{}`: {} variant(s), max variant size {} bytes",
            type_name::<F>(),
            registry.entries.len(),
            registry.max_variant_size
        );

        Ok(registry)
    }

    /// Size in bytes of the largest registered variant.
    pub fn max_variant_size(&self) -> usize {
        self.max_variant_size
    }

    /// Number of registered variants.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if no variant is registered.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns true if `V` is registered.
    pub fn contains<V: 'static>(&self) -> bool {
        self.by_type.contains_key(&TypeId::of::<V>())
    }

    /// Discriminant `V` is stored under.
    pub fn discriminant_of<V: 'static>(&self) -> Option<F::Discriminant> {
        self.entry_of::<V>().map(|entry| entry.discriminant)
    }

    /// Name of the variant stored under `tag`.
    pub fn variant_name(&self, tag: u8) -> Option<&'static str> {
        self.entry_for_tag(tag).map(|entry| entry.name)
    }

    /// Registered variants in registration order, with their sizes and
    /// discriminants.
    pub fn variants(&self) -> impl Iterator<Item = (&'static str, usize, F::Discriminant)> + '_ {
        self.entries
            .iter()
            .map(|entry| (entry.name, entry.size, entry.discriminant))
    }

    pub(crate) fn tag_of<V: Plain>(&self) -> Result<u8, Error> {
        self.entry_of::<V>()
            .map(|entry| entry.discriminant.to_tag())
            .ok_or(Error::UnregisteredVariant {
                variant: V::LAYOUT.name,
            })
    }

    pub(crate) fn entry_for_tag(&self, tag: u8) -> Option<&Entry<F>> {
        self.by_tag.get(&tag).map(|&index| &self.entries[index])
    }

    fn entry_of<V: 'static>(&self) -> Option<&Entry<F>> {
        self.by_type
            .get(&TypeId::of::<V>())
            .map(|&index| &self.entries[index])
    }
}

impl<F: Family> Clone for Registry<F> {
    fn clone(&self) -> Self {
        Registry {
            entries: self.entries.clone(),
            by_type: self.by_type.clone(),
            by_tag: self.by_tag.clone(),
            max_variant_size: self.max_variant_size,
        }
    }
}

impl<F: Family> fmt::Debug for Registry<F> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Registry")
            .field("family", &type_name::<F>())
            .field(
                "variants",
                &self
                    .entries
                    .iter()
                    .map(|entry| (entry.name, entry.discriminant))
                    .collect::<Vec<_>>(),
            )
            .field("max_variant_size", &self.max_variant_size)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::LayoutViolation;

    trait Shape {
        fn volume(&self) -> i32;
    }

    crate::variant! {
        #[derive(Debug, PartialEq)]
        struct Square {
            side: i32,
        }
    }

    crate::variant! {
        #[derive(Debug, PartialEq)]
        struct Cuboid {
            square: Square,
            depth: i32,
        }
    }

    crate::variant! {
        #[derive(Debug, PartialEq)]
        struct Circle {
            radius: u8,
        }
    }

    crate::variant! {
        #[derive(Debug, PartialEq)]
        struct Flagged {
            flag: u8,
            side: i32,
        }
    }

    impl Shape for Square {
        fn volume(&self) -> i32 {
            0
        }
    }

    impl Shape for Cuboid {
        fn volume(&self) -> i32 {
            self.square.side * self.square.side * self.depth
        }
    }

    impl Shape for Circle {
        fn volume(&self) -> i32 {
            0
        }
    }

    impl Shape for Flagged {
        fn volume(&self) -> i32 {
            i32::from(self.flag) * self.side
        }
    }

    crate::discriminant! {
        enum ShapeKind {
            Square,
            Cuboid,
        }
    }

    crate::discriminant! {
        enum Sparse {
            Square = 1,
            Cuboid = 2,
        }
    }

    crate::family! {
        struct Shapes: dyn Shape => ShapeKind {
            Square,
            Cuboid,
        }
    }

    crate::family! {
        struct WithCircle: dyn Shape => ShapeKind {
            Square,
            Circle,
        }
    }

    crate::family! {
        struct MappedCircle: dyn Shape => ShapeKind {
            Circle => ShapeKind::Cuboid,
            Square,
        }
    }

    crate::family! {
        struct WithFlagged: dyn Shape => ShapeKind {
            Square,
            Flagged => ShapeKind::Cuboid,
        }
    }

    crate::family! {
        struct Clashing: dyn Shape => ShapeKind {
            Square,
            Cuboid => ShapeKind::Square,
        }
    }

    crate::family! {
        struct NoDefault: dyn Shape => Sparse {
            Square,
            Cuboid,
        }
    }

    crate::family! {
        struct Concrete: Square => ShapeKind {
            Square,
        }
    }

    crate::discriminant! {
        enum ByteKind {
            Bytes,
        }
    }

    crate::family! {
        struct ByteSlices: [u8] => ByteKind {
            [u8; 4] => ByteKind::Bytes,
        }
    }

    struct Twice;

    impl Family for Twice {
        type Capability = dyn Shape;
        type Discriminant = ShapeKind;

        fn register(registrar: &mut Registrar<Self>) {
            registrar.variant::<Square>().variant::<Square>();
        }
    }

    impl Member<Twice> for Square {
        fn upcast(&self) -> &(dyn Shape + 'static) {
            self
        }

        fn upcast_mut(&mut self) -> &mut (dyn Shape + 'static) {
            self
        }
    }

    #[test]
    fn test_register() {
        let registry = Registry::<Shapes>::new().unwrap();
        assert_eq!(registry.len(), 2);
        assert_eq!(registry.max_variant_size(), 8);
        assert_eq!(registry.discriminant_of::<Square>(), Some(ShapeKind::Square));
        assert_eq!(registry.discriminant_of::<Cuboid>(), Some(ShapeKind::Cuboid));
        assert_eq!(registry.discriminant_of::<Circle>(), None);
        assert!(registry.contains::<Cuboid>());
        assert!(!registry.contains::<Circle>());
        assert_eq!(registry.variant_name(1), Some("Cuboid"));
        assert_eq!(registry.variant_name(2), None);
        assert_eq!(registry.tag_of::<Cuboid>(), Ok(1));
        assert_eq!(
            registry.tag_of::<Circle>(),
            Err(Error::UnregisteredVariant { variant: "Circle" })
        );

        let variants: Vec<_> = registry.variants().collect();
        assert_eq!(
            variants,
            [("Square", 4, ShapeKind::Square), ("Cuboid", 8, ShapeKind::Cuboid)]
        );
    }

    #[test]
    fn test_explicit_mapping() {
        let registry = Registry::<MappedCircle>::new().unwrap();
        assert_eq!(registry.discriminant_of::<Circle>(), Some(ShapeKind::Cuboid));
        assert_eq!(registry.max_variant_size(), 4);
    }

    #[test]
    fn test_no_discriminant() {
        assert_eq!(
            Registry::<WithCircle>::new().unwrap_err(),
            RegistrationError::NoDiscriminant {
                variant: "Circle",
                discriminant: "ShapeKind"
            }
        );
    }

    #[test]
    fn test_not_plain() {
        assert_eq!(
            Registry::<WithFlagged>::new().unwrap_err(),
            RegistrationError::NotPlain {
                variant: "Flagged",
                violation: LayoutViolation::Padding {
                    field: "side",
                    bytes: 3
                }
            }
        );
    }

    #[test]
    fn test_duplicate_discriminant() {
        assert_eq!(
            Registry::<Clashing>::new().unwrap_err(),
            RegistrationError::DuplicateDiscriminant {
                variant: "Cuboid",
                other: "Square",
                discriminant: "Square"
            }
        );
    }

    #[test]
    fn test_duplicate_variant() {
        assert_eq!(
            Registry::<Twice>::new().unwrap_err(),
            RegistrationError::DuplicateVariant { variant: "Square" }
        );
    }

    #[test]
    fn test_missing_default() {
        assert_eq!(
            Registry::<NoDefault>::new().unwrap_err(),
            RegistrationError::MissingDefaultDiscriminant {
                discriminant: "Sparse"
            }
        );
    }

    #[test]
    fn test_not_behavioral() {
        let err = Registry::<Concrete>::new().unwrap_err();
        assert!(matches!(err, RegistrationError::NotBehavioral { .. }));
    }

    #[test]
    fn test_slice_not_behavioral() {
        assert_eq!(
            Registry::<ByteSlices>::new().unwrap_err(),
            RegistrationError::NotBehavioral { capability: "[u8]" }
        );
    }

    #[test]
    fn test_dispatch() {
        let registry = Registry::<Shapes>::new().unwrap();
        let entry = registry.entry_for_tag(1).unwrap();

        let mut payload = [0u8; 8];
        payload[..4].copy_from_slice(&2i32.to_ne_bytes());
        payload[4..].copy_from_slice(&3i32.to_ne_bytes());

        let mut seen = 0;
        (entry.visit)(&payload, &mut |shape| seen = shape.volume()).unwrap();
        assert_eq!(seen, 12);

        (entry.modify)(&mut payload, &mut |_| {}).unwrap();
        assert_eq!(&payload[4..], &3i32.to_ne_bytes());
    }
}
