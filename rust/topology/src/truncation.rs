// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Truncation cell patches.
//!
//! A truncated cell replaces its parent cell's polyhedron: it keeps a subset
//! of the parent's local faces and closes the cell with new truncation faces.
//! Truncation faces address nodes in the extended node indexing (base nodes,
//! then split nodes, then truncation nodes).

use resqml_lite_core::JaggedArray;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

const CONTEXT: &str = "truncation cell patch";

/// A face of a truncated cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TruncationCellFace {
    /// A local face retained from the parent cell.
    Local(usize),
    /// A truncation face of the patch.
    Truncation(usize),
}

/// Unvalidated content of a truncation cell patch, as stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TruncationCellPatchParts {
    pub truncation_node_count: usize,
    pub truncation_face_count: usize,
    pub truncation_cell_count: usize,
    pub nodes_per_truncation_face: JaggedArray<usize>,
    pub parent_cell_indices: Vec<usize>,
    pub local_faces_per_cell: JaggedArray<usize>,
    pub truncation_faces_per_cell: JaggedArray<usize>,
    /// Per truncated cell, local faces first, then truncation faces.
    pub truncation_cell_face_is_right_handed: Vec<bool>,
}

/// Counts of the grid a patch is attached to.
pub struct TruncationBounds<'a> {
    pub cell_count: usize,
    /// Base plus split nodes.
    pub node_count: usize,
    /// Local face count of a parent cell.
    pub local_face_count: &'a dyn Fn(usize) -> usize,
}

/// A validated truncation cell patch.
#[derive(Debug, Clone, PartialEq)]
pub struct TruncationCellPatch {
    parts: TruncationCellPatchParts,
    /// Offset of each truncated cell's first orientation flag.
    flag_offset: Vec<usize>,
    by_parent: FxHashMap<usize, usize>,
}

impl TruncationCellPatch {
    pub fn try_new(parts: TruncationCellPatchParts, bounds: &TruncationBounds<'_>) -> Result<Self> {
        let TruncationCellPatchParts {
            truncation_node_count,
            truncation_face_count,
            truncation_cell_count,
            ..
        } = parts;

        if parts.nodes_per_truncation_face.sub_array_count() != truncation_face_count {
            return Err(Error::structural(
                CONTEXT,
                format!(
                    "{} node lists for {truncation_face_count} truncation faces",
                    parts.nodes_per_truncation_face.sub_array_count()
                ),
            ));
        }
        let extended_node_count = bounds.node_count + truncation_node_count;
        parts
            .nodes_per_truncation_face
            .check_bound(extended_node_count, CONTEXT)?;
        if let Some(face) = parts
            .nodes_per_truncation_face
            .iter()
            .position(|nodes| nodes.len() < 3)
        {
            return Err(Error::structural(
                CONTEXT,
                format!("truncation face {face} has fewer than 3 nodes"),
            ));
        }

        for (name, count) in [
            ("parent cell indices", parts.parent_cell_indices.len()),
            ("local face lists", parts.local_faces_per_cell.sub_array_count()),
            ("truncation face lists", parts.truncation_faces_per_cell.sub_array_count()),
        ] {
            if count != truncation_cell_count {
                return Err(Error::structural(
                    CONTEXT,
                    format!("{count} {name} for {truncation_cell_count} truncation cells"),
                ));
            }
        }

        let mut by_parent = FxHashMap::default();
        for (cell, &parent) in parts.parent_cell_indices.iter().enumerate() {
            if parent >= bounds.cell_count {
                return Err(Error::structural(
                    CONTEXT,
                    format!("parent cell {parent} outside 0..{}", bounds.cell_count),
                ));
            }
            if by_parent.insert(parent, cell).is_some() {
                return Err(Error::structural(
                    CONTEXT,
                    format!("parent cell {parent} truncated twice"),
                ));
            }
            let local_face_count = (bounds.local_face_count)(parent);
            if let Some(&bad) = parts
                .local_faces_per_cell
                .sub_array(cell)
                .iter()
                .find(|&&f| f >= local_face_count)
            {
                return Err(Error::structural(
                    CONTEXT,
                    format!("local face {bad} outside the {local_face_count} faces of cell {parent}"),
                ));
            }
        }
        parts
            .truncation_faces_per_cell
            .check_bound(truncation_face_count, CONTEXT)?;

        let mut flag_offset = Vec::with_capacity(truncation_cell_count);
        let mut expected = 0;
        for cell in 0..truncation_cell_count {
            flag_offset.push(expected);
            let faces = parts.local_faces_per_cell.sub_array_len(cell)
                + parts.truncation_faces_per_cell.sub_array_len(cell);
            if faces == 0 {
                return Err(Error::structural(
                    CONTEXT,
                    format!("truncation cell {cell} has no faces"),
                ));
            }
            expected += faces;
        }
        if parts.truncation_cell_face_is_right_handed.len() != expected {
            return Err(Error::structural(
                CONTEXT,
                format!(
                    "{} orientation flags where local and truncation faces need {expected}",
                    parts.truncation_cell_face_is_right_handed.len()
                ),
            ));
        }

        Ok(Self {
            parts,
            flag_offset,
            by_parent,
        })
    }

    pub fn parts(&self) -> &TruncationCellPatchParts {
        &self.parts
    }

    pub fn truncation_node_count(&self) -> usize {
        self.parts.truncation_node_count
    }

    pub fn truncation_face_count(&self) -> usize {
        self.parts.truncation_face_count
    }

    pub fn truncation_cell_count(&self) -> usize {
        self.parts.truncation_cell_count
    }

    /// Truncation cell replacing `parent_cell`, if it is truncated.
    #[inline]
    pub fn truncation_cell_of(&self, parent_cell: usize) -> Option<usize> {
        self.by_parent.get(&parent_cell).copied()
    }

    pub fn parent_cell(&self, truncation_cell: usize) -> usize {
        self.parts.parent_cell_indices[truncation_cell]
    }

    /// Number of faces of a truncation cell.
    pub fn face_count(&self, truncation_cell: usize) -> usize {
        self.parts.local_faces_per_cell.sub_array_len(truncation_cell)
            + self.parts.truncation_faces_per_cell.sub_array_len(truncation_cell)
    }

    /// Face `face` of a truncation cell: local faces come first.
    pub fn face(&self, truncation_cell: usize, face: usize) -> TruncationCellFace {
        let local = self.parts.local_faces_per_cell.sub_array(truncation_cell);
        match local.get(face) {
            Some(&f) => TruncationCellFace::Local(f),
            None => {
                let truncation = self.parts.truncation_faces_per_cell.sub_array(truncation_cell);
                match truncation.get(face - local.len()) {
                    Some(&f) => TruncationCellFace::Truncation(f),
                    None => crate::error::out_of_range(face, local.len() + truncation.len()),
                }
            }
        }
    }

    pub fn face_is_right_handed(&self, truncation_cell: usize, face: usize) -> bool {
        let count = self.face_count(truncation_cell);
        if face >= count {
            crate::error::out_of_range(face, count);
        }
        self.parts.truncation_cell_face_is_right_handed[self.flag_offset[truncation_cell] + face]
    }

    /// Nodes of truncation face `face`, in extended node indexing.
    pub fn truncation_face_nodes(&self, face: usize) -> &[usize] {
        self.parts.nodes_per_truncation_face.sub_array(face)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hex_faces(_: usize) -> usize {
        6
    }

    fn bounds(local: &dyn Fn(usize) -> usize) -> TruncationBounds<'_> {
        TruncationBounds {
            cell_count: 2,
            node_count: 12,
            local_face_count: local,
        }
    }

    fn parts() -> TruncationCellPatchParts {
        TruncationCellPatchParts {
            truncation_node_count: 1,
            truncation_face_count: 1,
            truncation_cell_count: 1,
            nodes_per_truncation_face: JaggedArray::from_nested(vec![vec![0, 5, 12]]),
            parent_cell_indices: vec![1],
            local_faces_per_cell: JaggedArray::from_nested(vec![vec![0, 2]]),
            truncation_faces_per_cell: JaggedArray::from_nested(vec![vec![0]]),
            truncation_cell_face_is_right_handed: vec![true, true, false],
        }
    }

    #[test]
    fn faces_local_then_truncation() {
        let patch = TruncationCellPatch::try_new(parts(), &bounds(&hex_faces)).unwrap();
        assert_eq!(patch.truncation_cell_of(1), Some(0));
        assert_eq!(patch.truncation_cell_of(0), None);
        assert_eq!(patch.face_count(0), 3);
        assert_eq!(patch.face(0, 1), TruncationCellFace::Local(2));
        assert_eq!(patch.face(0, 2), TruncationCellFace::Truncation(0));
        assert!(!patch.face_is_right_handed(0, 2));
        assert_eq!(patch.truncation_face_nodes(0), &[0, 5, 12]);
    }

    #[test]
    fn flag_count_is_local_plus_truncation() {
        let mut bad = parts();
        bad.truncation_cell_face_is_right_handed.pop();
        let err = TruncationCellPatch::try_new(bad, &bounds(&hex_faces)).unwrap_err();
        assert!(matches!(err, Error::StructuralInconsistency { .. }));
    }

    #[test]
    fn rejects_out_of_range_references() {
        let mut node = parts();
        node.nodes_per_truncation_face = JaggedArray::from_nested(vec![vec![0, 5, 13]]);
        assert!(TruncationCellPatch::try_new(node, &bounds(&hex_faces)).is_err());

        let mut parent = parts();
        parent.parent_cell_indices = vec![2];
        assert!(TruncationCellPatch::try_new(parent, &bounds(&hex_faces)).is_err());

        let mut local = parts();
        local.local_faces_per_cell = JaggedArray::from_nested(vec![vec![0, 6]]);
        assert!(TruncationCellPatch::try_new(local, &bounds(&hex_faces)).is_err());

        let mut count = parts();
        count.truncation_face_count = 2;
        assert!(TruncationCellPatch::try_new(count, &bounds(&hex_faces)).is_err());
    }
}
