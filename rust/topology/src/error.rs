// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Error types for grid topology operations.
//!
//! Grids share the taxonomy of `resqml-lite-core`: an inconsistent overlay
//! or count is `StructuralInconsistency`, a layout the model does not support
//! is `UnsupportedVariant`, and a JSON snapshot that cannot be encoded or
//! decoded is `Serialization`.

pub use resqml_lite_core::error::{out_of_range, Error, Result};

/// Maps a `serde_json` failure into the shared taxonomy.
pub(crate) fn serialization(err: serde_json::Error) -> Error {
    Error::Serialization(err.to_string())
}
