// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! # RESQML-Lite Core
//!
//! Storage variants for the homogeneous arrays of the RESQML/EnergyML
//! earth-model exchange schema, the jagged-array adjacency primitive, and the
//! two collaborator contracts the rest of the stack depends on.
//!
//! ## Overview
//!
//! - **Value arrays**: closed enums per element kind ([`BooleanArray`],
//!   [`IntegerArray`], [`DoubleArray`], [`StringArray`]) over constant,
//!   lattice, inline, external and mask-derived encodings
//! - **Jagged arrays**: [`JaggedArray`], validated when built
//! - **References**: [`DataObjectReference`] resolved through an
//!   [`ObjectCatalog`]
//! - **External data**: [`ExternalDataArray`] locators resolved through an
//!   [`ExternalStore`]
//!
//! ## Quick Start
//!
//! ```rust
//! use resqml_lite_core::{ArrayAccess, IntegerArray, IntegerLatticeArray, JaggedArray, NoExternalStore};
//!
//! let lattice = IntegerArray::Lattice(IntegerLatticeArray::new(0, [(1, 10), (10, 3)]));
//! assert_eq!(lattice.get(23, &NoExternalStore).unwrap(), 23);
//!
//! let jagged = JaggedArray::try_new(vec![1, 2, 3, 4, 5, 6, 7], vec![3, 3, 7]).unwrap();
//! assert_eq!(jagged.sub_array(2), &[4, 5, 6, 7]);
//! ```
//!
//! ## Feature Flags
//!
//! - `serde`: Enable serialization support for records

pub mod arrays;
pub mod error;
pub mod jagged;
pub mod reference;
pub mod store;
pub mod value;

pub use arrays::{
    ArrayAccess, BooleanArray, BooleanArrayFromDiscretePropertyArray, BooleanArrayFromIndexArray,
    DoubleArray, DoubleLatticeArray, IntegerArray, IntegerArrayFromBooleanMaskArray,
    IntegerLatticeArray, LatticeArray, StringArray, ValueArray,
};
pub use error::{out_of_range, Error, Result};
pub use jagged::JaggedArray;
pub use reference::{ContentType, DataObjectReference, InMemoryCatalog, ObjectCatalog};
pub use store::{
    ExternalDataArray, ExternalDataArrayPart, ExternalStore, InMemoryStore, NoExternalStore,
    RawBuffer,
};
pub use uuid::Uuid;
pub use value::{Value, ValueKind};
