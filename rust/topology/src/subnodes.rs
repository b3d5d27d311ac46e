// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Subnode topology: extra nodes inside cells, faces or edges, placed as
//! weighted combinations of the object's parent nodes.
//!
//! Weights are laid out object by object and, within an object, subnode by
//! subnode with one weight per parent node.

use std::fmt;

use nalgebra::Point3;
use serde::{Deserialize, Serialize};

use crate::error::{out_of_range, Error, Result};

const CONTEXT: &str = "subnode patch";

/// Kind of object a subnode patch refines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubnodeObjectKind {
    Cell,
    Face,
    Edge,
}

impl fmt::Display for SubnodeObjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SubnodeObjectKind::Cell => "cell",
            SubnodeObjectKind::Face => "face",
            SubnodeObjectKind::Edge => "edge",
        })
    }
}

/// How many subnodes each object carries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubnodeCounts {
    /// Same count for every object.
    Uniform { per_object: usize },
    /// Counts for selected objects only; weights follow the order of
    /// `object_indices`.
    Variable {
        object_indices: Vec<usize>,
        per_object: Vec<usize>,
    },
    /// One count per column, shared by every cell of the column.
    Column { per_column: Vec<usize> },
}

impl SubnodeCounts {
    fn tag(&self) -> &'static str {
        match self {
            SubnodeCounts::Uniform { .. } => "uniform",
            SubnodeCounts::Variable { .. } => "variable",
            SubnodeCounts::Column { .. } => "column",
        }
    }
}

/// A validated subnode patch.
#[derive(Debug, Clone, PartialEq)]
pub struct SubnodePatch {
    kind: SubnodeObjectKind,
    counts: SubnodeCounts,
    node_weights: Vec<f64>,
    /// Subnode count per object.
    subnode_count: Vec<usize>,
    /// Offset of each object's first weight.
    weight_offset: Vec<usize>,
    /// Parent node count per object.
    parent_node_count: Vec<usize>,
}

impl SubnodePatch {
    /// Validates a patch against the objects it refines.
    ///
    /// `parent_node_counts` holds the parent node count of every object.
    /// Column patches apply to cells of a column-layer grid only, whose cell
    /// index is `k * column_count + column`.
    pub fn try_new(
        kind: SubnodeObjectKind,
        counts: SubnodeCounts,
        node_weights: Vec<f64>,
        parent_node_counts: Vec<usize>,
        column_count: Option<usize>,
    ) -> Result<Self> {
        let object_count = parent_node_counts.len();

        let subnode_count = match &counts {
            SubnodeCounts::Uniform { per_object } => vec![*per_object; object_count],
            SubnodeCounts::Variable {
                object_indices,
                per_object,
            } => {
                if object_indices.len() != per_object.len() {
                    return Err(Error::structural(
                        CONTEXT,
                        format!(
                            "{} subnode counts for {} selected objects",
                            per_object.len(),
                            object_indices.len()
                        ),
                    ));
                }
                let mut per = vec![0; object_count];
                let mut seen = vec![false; object_count];
                for (&object, &count) in object_indices.iter().zip(per_object) {
                    if object >= object_count {
                        return Err(Error::structural(
                            CONTEXT,
                            format!("{kind} {object} outside 0..{object_count}"),
                        ));
                    }
                    if std::mem::replace(&mut seen[object], true) {
                        return Err(Error::structural(
                            CONTEXT,
                            format!("{kind} {object} selected twice"),
                        ));
                    }
                    per[object] = count;
                }
                per
            }
            SubnodeCounts::Column { per_column } => {
                let Some(column_count) = column_count.filter(|_| kind == SubnodeObjectKind::Cell)
                else {
                    return Err(Error::unsupported(
                        "subnode patch",
                        format!("column patch for {kind} subnodes"),
                    ));
                };
                if per_column.len() != column_count {
                    return Err(Error::structural(
                        CONTEXT,
                        format!(
                            "{} column counts for {column_count} columns",
                            per_column.len()
                        ),
                    ));
                }
                (0..object_count)
                    .map(|cell| {
                        cell.checked_rem(column_count)
                            .and_then(|column| per_column.get(column).copied())
                            .ok_or_else(|| {
                                Error::structural(CONTEXT, format!("cell {cell} has no column"))
                            })
                    })
                    .collect::<Result<Vec<_>>>()?
            }
        };

        // Weight layout follows the selection order for variable patches.
        let order: Vec<usize> = match &counts {
            SubnodeCounts::Variable { object_indices, .. } => object_indices.clone(),
            _ => (0..object_count).collect(),
        };
        let mut weight_offset = vec![0; object_count];
        let mut expected = 0;
        for object in order {
            weight_offset[object] = expected;
            expected += subnode_count[object] * parent_node_counts[object];
        }

        if node_weights.len() != expected {
            return Err(Error::structural(
                CONTEXT,
                format!(
                    "{} node weights where subnode and parent node counts need {expected}",
                    node_weights.len()
                ),
            ));
        }
        if let Some(bad) = node_weights.iter().find(|w| !(w.is_finite() && **w >= 0.0)) {
            return Err(Error::structural(
                CONTEXT,
                format!("node weight {bad} is not a non-negative number"),
            ));
        }

        tracing::debug!(
            %kind,
            patch = counts.tag(),
            subnodes = subnode_count.iter().sum::<usize>(),
            "subnode patch built"
        );

        Ok(Self {
            kind,
            counts,
            node_weights,
            subnode_count,
            weight_offset,
            parent_node_count: parent_node_counts,
        })
    }

    pub fn kind(&self) -> SubnodeObjectKind {
        self.kind
    }

    pub fn counts(&self) -> &SubnodeCounts {
        &self.counts
    }

    pub fn node_weights(&self) -> &[f64] {
        &self.node_weights
    }

    pub fn object_count(&self) -> usize {
        self.subnode_count.len()
    }

    pub fn subnode_count(&self, object: usize) -> usize {
        match self.subnode_count.get(object) {
            Some(&count) => count,
            None => out_of_range(object, self.subnode_count.len()),
        }
    }

    pub fn total_subnode_count(&self) -> usize {
        self.subnode_count.iter().sum()
    }

    /// Weights of subnode `subnode` of `object`, one per parent node.
    pub fn weights(&self, object: usize, subnode: usize) -> &[f64] {
        let count = self.subnode_count(object);
        if subnode >= count {
            out_of_range(subnode, count);
        }
        let parents = self.parent_node_count[object];
        let start = self.weight_offset[object] + subnode * parents;
        &self.node_weights[start..start + parents]
    }

    /// Position of a subnode given the positions of the object's parent
    /// nodes, as the weight-normalized average. NaN when all weights are
    /// zero.
    pub fn subnode_position(
        &self,
        object: usize,
        subnode: usize,
        parent_nodes: &[Point3<f64>],
    ) -> Point3<f64> {
        let weights = self.weights(object, subnode);
        debug_assert_eq!(weights.len(), parent_nodes.len());
        let total: f64 = weights.iter().sum();
        if total <= 0.0 {
            return Point3::new(f64::NAN, f64::NAN, f64::NAN);
        }
        let sum = weights
            .iter()
            .zip(parent_nodes)
            .fold(nalgebra::Vector3::zeros(), |acc, (w, p)| acc + p.coords * *w);
        Point3::from(sum / total)
    }
}

/// Wire form of a subnode patch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubnodePatchSnapshot {
    pub kind: SubnodeObjectKind,
    pub counts: SubnodeCounts,
    pub node_weights: Vec<f64>,
}

impl From<&SubnodePatch> for SubnodePatchSnapshot {
    fn from(patch: &SubnodePatch) -> Self {
        Self {
            kind: patch.kind,
            counts: patch.counts.clone(),
            node_weights: patch.node_weights.clone(),
        }
    }
}

/// Checks that no two patches refine the same object kind.
pub(crate) fn check_exclusive(patches: &[SubnodePatch], kind: SubnodeObjectKind) -> Result<()> {
    if patches.iter().any(|p| p.kind == kind) {
        return Err(Error::structural(
            CONTEXT,
            format!("{kind} subnodes already defined by another patch"),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn uniform_edge_midpoints() {
        let patch = SubnodePatch::try_new(
            SubnodeObjectKind::Edge,
            SubnodeCounts::Uniform { per_object: 1 },
            vec![1.0, 1.0, 3.0, 1.0],
            vec![2, 2],
            None,
        )
        .unwrap();
        assert_eq!(patch.total_subnode_count(), 2);
        let ends = [Point3::new(0.0, 0.0, 0.0), Point3::new(4.0, 0.0, 0.0)];
        assert_relative_eq!(patch.subnode_position(0, 0, &ends), Point3::new(2.0, 0.0, 0.0));
        assert_relative_eq!(patch.subnode_position(1, 0, &ends), Point3::new(1.0, 0.0, 0.0));
    }

    #[test]
    fn weight_count_must_match() {
        let err = SubnodePatch::try_new(
            SubnodeObjectKind::Face,
            SubnodeCounts::Uniform { per_object: 2 },
            vec![0.25; 7],
            vec![4],
            None,
        )
        .unwrap_err();
        assert!(matches!(err, Error::StructuralInconsistency { .. }));
    }

    #[test]
    fn negative_weights_rejected() {
        let result = SubnodePatch::try_new(
            SubnodeObjectKind::Edge,
            SubnodeCounts::Uniform { per_object: 1 },
            vec![1.0, -1.0],
            vec![2],
            None,
        );
        assert!(result.is_err());
    }

    #[test]
    fn variable_patch_follows_selection_order() {
        let patch = SubnodePatch::try_new(
            SubnodeObjectKind::Edge,
            SubnodeCounts::Variable {
                object_indices: vec![2, 0],
                per_object: vec![1, 2],
            },
            vec![0.5, 0.5, 1.0, 0.0, 0.0, 1.0],
            vec![2, 2, 2],
            None,
        )
        .unwrap();
        assert_eq!(patch.subnode_count(1), 0);
        assert_eq!(patch.weights(2, 0), &[0.5, 0.5]);
        assert_eq!(patch.weights(0, 1), &[0.0, 1.0]);
    }

    #[test]
    fn column_patch_without_columns_is_rejected() {
        let err = SubnodePatch::try_new(
            SubnodeObjectKind::Cell,
            SubnodeCounts::Column {
                per_column: Vec::new(),
            },
            Vec::new(),
            vec![8],
            Some(0),
        )
        .unwrap_err();
        assert!(matches!(err, Error::StructuralInconsistency { .. }));
    }

    #[test]
    fn column_patch_counts_per_column() {
        // 2 columns, 2 layers, 8 parent nodes per cell.
        let patch = SubnodePatch::try_new(
            SubnodeObjectKind::Cell,
            SubnodeCounts::Column {
                per_column: vec![1, 0],
            },
            vec![0.125; 16],
            vec![8; 4],
            Some(2),
        )
        .unwrap();
        assert_eq!(patch.subnode_count(2), 1);
        assert_eq!(patch.subnode_count(3), 0);

        let not_cells = SubnodePatch::try_new(
            SubnodeObjectKind::Face,
            SubnodeCounts::Column { per_column: vec![1] },
            Vec::new(),
            Vec::new(),
            Some(1),
        );
        assert!(matches!(not_cells, Err(Error::UnsupportedVariant { .. })));
    }
}
