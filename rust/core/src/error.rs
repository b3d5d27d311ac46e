// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Error types shared by every RESQML-Lite crate.
//!
//! Structural and unsupported-variant errors are raised while a record is
//! being constructed and abort that construction. Unresolved references are
//! raised lazily, when an external dataset or a data object is first needed,
//! and may be retried with a different store or catalog. Out-of-range access
//! is a caller defect and panics through [`out_of_range`].

/// Result type alias for RESQML-Lite operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while building or reading RESQML records.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum Error {
    /// Declared counts or offsets do not match the structure they describe.
    #[error("structural inconsistency in {context}: {detail}")]
    StructuralInconsistency {
        context: &'static str,
        detail: String,
    },

    /// A data object reference or external dataset could not be resolved.
    #[error("unresolved reference to {target}: {reason}")]
    UnresolvedReference { target: String, reason: String },

    /// A variant tag (array kind, line kind, cell shape, ...) is not known.
    #[error("unsupported {family} variant: {tag}")]
    UnsupportedVariant { family: &'static str, tag: String },

    /// Serialization/deserialization error.
    #[error("serialization error: {0}")]
    Serialization(String),
}

impl Error {
    /// Creates a [`Error::StructuralInconsistency`].
    pub fn structural(context: &'static str, detail: impl Into<String>) -> Self {
        Error::StructuralInconsistency {
            context,
            detail: detail.into(),
        }
    }

    /// Creates a [`Error::UnresolvedReference`].
    pub fn unresolved(target: impl Into<String>, reason: impl Into<String>) -> Self {
        Error::UnresolvedReference {
            target: target.into(),
            reason: reason.into(),
        }
    }

    /// Creates a [`Error::UnsupportedVariant`].
    pub fn unsupported(family: &'static str, tag: impl ToString) -> Self {
        Error::UnsupportedVariant {
            family,
            tag: tag.to_string(),
        }
    }

    /// Returns `true` for errors that depend on external collaborators and
    /// may succeed against a different store or catalog.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Error::UnresolvedReference { .. })
    }
}

/// Panics with an `OutOfRangeAccess` message.
#[cold]
#[track_caller]
pub fn out_of_range(index: usize, len: usize) -> ! {
    panic!("OutOfRangeAccess: index {index} is out of range for length {len}")
}

/// Converts a stored integer into an index, rejecting negatives.
pub fn to_index(value: i64, context: &'static str) -> Result<usize> {
    usize::try_from(value)
        .map_err(|_| Error::structural(context, format!("negative index {value}")))
}
