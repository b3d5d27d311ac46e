// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Split-element overlays.
//!
//! A split element duplicates an element of the unsplit enumeration (a node,
//! edge, face, coordinate line or column edge) for a subset of its users, its
//! owners. Split elements are appended after the base enumeration: split
//! element `s` has index `base_count + s`. The owners that are not listed
//! keep using the parent element.

use std::fmt;

use resqml_lite_core::{ExternalStore, IntegerArray, JaggedArray};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Which enumeration a split overlay extends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SplitKind {
    Node,
    Edge,
    Face,
    CoordinateLine,
    ColumnEdge,
}

impl SplitKind {
    fn context(self) -> &'static str {
        match self {
            SplitKind::Node => "split nodes",
            SplitKind::Edge => "split edges",
            SplitKind::Face => "split faces",
            SplitKind::CoordinateLine => "split coordinate lines",
            SplitKind::ColumnEdge => "split column edges",
        }
    }
}

impl fmt::Display for SplitKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.context())
    }
}

/// Split elements with their parents and owners.
#[derive(Debug, Clone)]
pub struct SplitElements {
    kind: SplitKind,
    parent_indices: Vec<usize>,
    owners: JaggedArray<usize>,
    /// `(parent, owner)` to split ordinal.
    by_owner: FxHashMap<(usize, usize), usize>,
}

impl SplitElements {
    /// Builds an overlay over `parent_count` base elements whose owners index
    /// into `0..owner_count`.
    ///
    /// Every split element needs at least one owner, and an owner may claim
    /// at most one split copy of a given parent.
    pub fn try_new(
        kind: SplitKind,
        parent_indices: Vec<usize>,
        owners: JaggedArray<usize>,
        parent_count: usize,
        owner_count: usize,
    ) -> Result<Self> {
        let context = kind.context();

        if owners.sub_array_count() != parent_indices.len() {
            return Err(Error::structural(
                context,
                format!(
                    "{} owner lists for {} split elements",
                    owners.sub_array_count(),
                    parent_indices.len()
                ),
            ));
        }
        if let Some(&bad) = parent_indices.iter().find(|&&p| p >= parent_count) {
            return Err(Error::structural(
                context,
                format!("parent index {bad} outside 0..{parent_count}"),
            ));
        }
        owners.check_bound(owner_count, context)?;

        let mut by_owner = FxHashMap::default();
        for (split, (&parent, split_owners)) in parent_indices.iter().zip(owners.iter()).enumerate() {
            if split_owners.is_empty() {
                return Err(Error::structural(
                    context,
                    format!("split element {split} has no owners"),
                ));
            }
            for &owner in split_owners {
                if let Some(previous) = by_owner.insert((parent, owner), split) {
                    return Err(Error::structural(
                        context,
                        format!(
                            "owner {owner} claims parent {parent} through split elements {previous} and {split}"
                        ),
                    ));
                }
            }
        }

        Ok(Self {
            kind,
            parent_indices,
            owners,
            by_owner,
        })
    }

    /// Builds an overlay from its schema arrays.
    pub fn from_arrays(
        kind: SplitKind,
        parent_indices: &IntegerArray,
        owner_elements: &IntegerArray,
        owner_cumulative_length: &IntegerArray,
        parent_count: usize,
        owner_count: usize,
        store: &dyn ExternalStore,
    ) -> Result<Self> {
        let parents = parent_indices.materialize_indices(store, kind.context())?;
        let owners = JaggedArray::resolve_indices(owner_elements, owner_cumulative_length, store)?;
        Self::try_new(kind, parents, owners, parent_count, owner_count)
    }

    pub fn kind(&self) -> SplitKind {
        self.kind
    }

    /// Number of split elements.
    pub fn len(&self) -> usize {
        self.parent_indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parent_indices.is_empty()
    }

    pub fn parent_indices(&self) -> &[usize] {
        &self.parent_indices
    }

    pub fn owners(&self) -> &JaggedArray<usize> {
        &self.owners
    }

    /// Parent of split element `split`.
    pub fn parent(&self, split: usize) -> usize {
        self.parent_indices[split]
    }

    /// Owners of split element `split`.
    pub fn owners_of(&self, split: usize) -> &[usize] {
        self.owners.sub_array(split)
    }

    /// Split element that `owner` uses in place of `parent`, if any.
    #[inline]
    pub fn split_for(&self, parent: usize, owner: usize) -> Option<usize> {
        self.by_owner.get(&(parent, owner)).copied()
    }

    /// Index seen by `owner` for `parent` in an enumeration of `base_count`
    /// elements followed by the split elements.
    #[inline]
    pub fn resolve(&self, parent: usize, owner: usize, base_count: usize) -> usize {
        self.split_for(parent, owner)
            .map_or(parent, |split| base_count + split)
    }

    /// `(parent, owners)` per split element.
    pub fn iter(&self) -> impl ExactSizeIterator<Item = (usize, &[usize])> + '_ {
        self.parent_indices.iter().copied().zip(self.owners.iter())
    }
}

impl PartialEq for SplitElements {
    fn eq(&self, other: &Self) -> bool {
        self.kind == other.kind
            && self.parent_indices == other.parent_indices
            && self.owners == other.owners
    }
}

/// Resolves `parent` for `owner` through an optional overlay.
#[inline]
pub(crate) fn resolve_optional(
    split: Option<&SplitElements>,
    parent: usize,
    owner: usize,
    base_count: usize,
) -> usize {
    split.map_or(parent, |s| s.resolve(parent, owner, base_count))
}
