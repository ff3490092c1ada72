//! # StructArray: Packed Arrays of Heterogeneous Variants
//!
//! [`StructArray`] stores values of several different types, all sharing one
//! capability (a trait), inside a single contiguous byte buffer. Each slot
//! carries a one-byte tag naming the concrete type, followed by the value's
//! raw bytes. There is no per-element allocation and no pointer chasing: a
//! `Vec<Box<dyn Trait>>` replaced by one flat `Vec<u8>`.
//!
//! ## Core Concept
//!
//! A *family* groups three things:
//!
//! - the capability, a trait object type such as `dyn Shape`;
//! - a discriminant enumeration with one enumerant per variant;
//! - the variant types, plain `#[repr(C)]` structs.
//!
//! When a [`StructArray`] is built, the family's variants are registered
//! once: each layout is checked for padding, each variant is mapped to the
//! enumerant with the same name, and the largest variant fixes the slot
//! size. Slots are `1 + max_variant_size` bytes wide whatever they hold.
//!
//! A padded struct such as `{ on: u8, since: u32 }` is refused; declare the
//! gap as a field (`_pad: [u8; 3]`) and it is accepted.
//!
//! ## Quick Start
//!
//! Add StructArray to your `Cargo.toml`:
//!
//! ```toml
//! [dependencies]
//! structarray = "0.1"
//! ```
//!
//! Basic usage:
//!
//! ```rust
//! use structarray::{discriminant, family, variant, StructArray};
//!
//! pub trait Shape {
//!     fn grow(&mut self);
//! }
//!
//! variant! {
//!     #[derive(Debug, PartialEq)]
//!     pub struct Square {
//!         pub side: i32,
//!     }
//! }
//!
//! variant! {
//!     #[derive(Debug, PartialEq)]
//!     pub struct Cuboid {
//!         pub square: Square,
//!         pub depth: i32,
//!     }
//! }
//!
//! impl Shape for Square {
//!     fn grow(&mut self) {
//!         self.side += 1;
//!     }
//! }
//!
//! impl Shape for Cuboid {
//!     fn grow(&mut self) {
//!         self.depth += 1;
//!     }
//! }
//!
//! discriminant! {
//!     pub enum ShapeKind {
//!         Square,
//!         Cuboid,
//!     }
//! }
//!
//! family! {
//!     pub struct Shapes: dyn Shape => ShapeKind {
//!         Square,
//!         Cuboid,
//!     }
//! }
//!
//! let mut shapes = StructArray::<Shapes>::new(3).unwrap();
//! shapes.set(0, Square { side: 5 }).unwrap();
//! shapes.set(1, Cuboid { square: Square { side: 2 }, depth: 9 }).unwrap();
//!
//! // Dispatch on the tag, then read a copy
//! match shapes.discriminant_at(1).unwrap() {
//!     ShapeKind::Square => unreachable!(),
//!     ShapeKind::Cuboid => assert_eq!(shapes.get::<Cuboid>(1).unwrap().depth, 9),
//! }
//!
//! // Or let the registry dispatch through the capability
//! shapes.modify(0, |shape| shape.grow()).unwrap();
//! assert_eq!(shapes.get::<Square>(0).unwrap(), Square { side: 6 });
//! ```
//!
//! ## Configuration
//!
//! ### Feature Flags
//!
//! - **`std`** (enabled by default)
//!   - Links to the standard library and implements `std::error::Error`
//!   - Disable for `#![no_std]` environments: `default-features = false`
//!
//! ### No-std Usage
//!
//! StructArray only needs `alloc`:
//!
//! ```toml
//! [dependencies]
//! structarray = { version = "0.1", default-features = false }
//! ```
//!
//! ## Reading Slots
//!
//! [`StructArray::get`] does not look at the tag. Reading a slot as the
//! wrong variant returns the stored bytes reinterpreted as the requested
//! type. That is never undefined behavior, because every variant accepts
//! any bit pattern, but the value is garbage. [`StructArray::get_checked`]
//! compares the tag first and fails with [`Error::VariantMismatch`].
//!
//! Writing a smaller variant over a larger one leaves the larger one's
//! trailing payload bytes in place.
//!
//! ## Logging
//!
//! Registration is reported at `debug` level through the [`log`] facade.
//! Slot operations do not log.

#![cfg_attr(not(feature = "std"), no_std)]
#![deny(missing_docs)]
#![deny(clippy::as_conversions)]

extern crate alloc;

#[macro_use]
mod macros;

mod array;
mod error;
mod layout;
mod raw;
mod registry;

pub use crate::array::{StructArray, TAG_SIZE};
pub use crate::error::{Error, RegistrationError};
pub use crate::layout::{Field, Layout, LayoutKind, LayoutViolation, Plain};
pub use crate::registry::{Discriminant, Family, Member, Registrar, Registry};
