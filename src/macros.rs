/// Declare a variant struct that can be stored in a [`StructArray`].
///
/// The struct is emitted with `#[repr(C)]` and `#[derive(Clone, Copy)]`, and
/// gets a [`Plain`] impl whose [`Layout`] records every field's offset. All
/// field types must themselves be [`Plain`].
///
/// # Example
///
/// ```
/// use structarray::{variant, Plain};
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
/// assert_eq!(Cuboid::LAYOUT.size, 8);
/// assert!(Cuboid::LAYOUT.is_dense());
/// ```
///
/// [`StructArray`]: crate::StructArray
/// [`Plain`]: crate::Plain
/// [`Layout`]: crate::Layout
#[macro_export]
macro_rules! variant {
    (
        $(#[$meta:meta])*
        $vis:vis struct $name:ident {
            $(
                $(#[$field_meta:meta])*
                $field_vis:vis $field:ident : $ty:ty
            ),* $(,)?
        }
    ) => {
        $(#[$meta])*
        #[repr(C)]
        #[derive(Clone, Copy)]
        $vis struct $name {
            $(
                $(#[$field_meta])*
                $field_vis $field: $ty,
            )*
        }

        unsafe impl $crate::Plain for $name {
            const LAYOUT: $crate::Layout = $crate::Layout {
                name: ::core::stringify!($name),
                size: ::core::mem::size_of::<$name>(),
                align: ::core::mem::align_of::<$name>(),
                kind: $crate::LayoutKind::Record {
                    fields: &[
                        $(
                            $crate::Field {
                                name: ::core::stringify!($field),
                                offset: ::core::mem::offset_of!($name, $field),
                                size: <$ty as $crate::Plain>::LAYOUT.size,
                                dense: <$ty as $crate::Plain>::LAYOUT.is_dense(),
                            },
                        )*
                    ],
                },
            };
        }
    };
}

/// Declare a discriminant enumeration.
///
/// The enum is emitted with `#[repr(u8)]` and
/// `#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]`, so do not derive
/// those again. Enumerant names are matched against variant type names when
/// a [`Family`](crate::Family) is registered, and the enumerant with tag `0`
/// is what a fresh slot reports.
///
/// # Example
///
/// ```
/// use structarray::{discriminant, Discriminant};
///
/// discriminant! {
///     pub enum ShapeKind {
///         Square,
///         Cuboid = 7,
///     }
/// }
///
/// assert_eq!(ShapeKind::Cuboid.to_tag(), 7);
/// assert_eq!(ShapeKind::from_tag(0), Some(ShapeKind::Square));
/// assert_eq!(ShapeKind::from_tag(1), None);
/// ```
#[macro_export]
macro_rules! discriminant {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident {
            $(
                $(#[$variant_meta:meta])*
                $variant:ident $(= $value:expr)?
            ),* $(,)?
        }
    ) => {
        $(#[$meta])*
        #[repr(u8)]
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
        $vis enum $name {
            $(
                $(#[$variant_meta])*
                $variant $(= $value)?,
            )*
        }

        impl $crate::Discriminant for $name {
            const NAME: &'static str = ::core::stringify!($name);
            const VARIANTS: &'static [Self] = &[$($name::$variant),*];

            fn name(self) -> &'static str {
                match self {
                    $($name::$variant => ::core::stringify!($variant),)*
                }
            }

            #[allow(clippy::as_conversions)]
            fn to_tag(self) -> u8 {
                self as u8
            }
        }
    };
}

/// Declare a [`Family`](crate::Family): the capability shared by a set of
/// variants, the discriminant enumeration, and the variants themselves.
///
/// Each listed variant must be declared with [`variant!`] and must
/// implement the capability; the generated [`Member`](crate::Member) impl
/// upcasts it, so a variant missing the capability fails to compile. A
/// variant is mapped to the enumerant with the same name unless an explicit
/// `=> Kind::Enumerant` is given.
///
/// # Example
///
/// ```
/// use structarray::{discriminant, family, variant, StructArray};
///
/// pub trait Shape {
///     fn area(&self) -> i32;
/// }
///
/// variant! {
///     pub struct Square {
///         pub side: i32,
///     }
/// }
///
/// variant! {
///     pub struct Rect {
///         pub width: i32,
///         pub height: i32,
///     }
/// }
///
/// impl Shape for Square {
///     fn area(&self) -> i32 {
///         self.side * self.side
///     }
/// }
///
/// impl Shape for Rect {
///     fn area(&self) -> i32 {
///         self.width * self.height
///     }
/// }
///
/// discriminant! {
///     pub enum ShapeKind {
///         Square,
///         Rectangle,
///     }
/// }
///
/// family! {
///     pub struct Shapes: dyn Shape => ShapeKind {
///         Square,
///         Rect => ShapeKind::Rectangle,
///     }
/// }
///
/// let mut shapes = StructArray::<Shapes>::new(2).unwrap();
/// shapes.set(1, Rect { width: 2, height: 3 }).unwrap();
/// assert_eq!(shapes.discriminant_at(1).unwrap(), ShapeKind::Rectangle);
/// assert_eq!(shapes.visit(1, |shape| shape.area()).unwrap(), Some(6));
/// ```
#[macro_export]
macro_rules! family {
    (
        $(#[$meta:meta])*
        $vis:vis struct $name:ident : $capability:ty => $discriminant:ty {
            $($variant:ty $(=> $explicit:expr)?),* $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, Default)]
        $vis struct $name;

        impl $crate::Family for $name {
            type Capability = $capability;
            type Discriminant = $discriminant;

            fn register(registrar: &mut $crate::Registrar<Self>) {
                $(
                    $crate::family!(@register registrar, $variant $(, $explicit)?);
                )*
            }
        }

        $(
            impl $crate::Member<$name> for $variant {
                fn upcast(&self) -> &<$name as $crate::Family>::Capability {
                    self
                }

                fn upcast_mut(&mut self) -> &mut <$name as $crate::Family>::Capability {
                    self
                }
            }
        )*
    };
    (@register $registrar:ident, $variant:ty) => {
        $registrar.variant::<$variant>();
    };
    (@register $registrar:ident, $variant:ty, $explicit:expr) => {
        $registrar.variant_as::<$variant>($explicit);
    };
}
