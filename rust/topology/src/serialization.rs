// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! JSON snapshots of grid topologies.
//!
//! A snapshot stores the base arrays and each overlay in its schema form.
//! Decoding replays the builders in overlay order, so every construction
//! check runs again on the decoded data.

use resqml_lite_core::JaggedArray;
use serde::{Deserialize, Serialize};

use crate::column_layer::{ColumnLayerTopology, ColumnLayout};
use crate::error::{serialization, Error, Result};
use crate::kgaps::KGaps;
use crate::split::SplitElements;
use crate::subnodes::{SubnodeObjectKind, SubnodePatchSnapshot};
use crate::truncation::TruncationCellPatchParts;
use crate::unstructured::{CellShape, UnstructuredGridTopology};

/// Parents and owners of a split overlay.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SplitSnapshot {
    pub parent_indices: Vec<usize>,
    pub owners: JaggedArray<usize>,
}

impl From<&SplitElements> for SplitSnapshot {
    fn from(split: &SplitElements) -> Self {
        Self {
            parent_indices: split.parent_indices().to_vec(),
            owners: split.owners().clone(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ColumnLayerSnapshot {
    pub layout: ColumnLayout,
    pub nk: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub k_gaps: Option<KGaps>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub split_coordinate_lines: Option<SplitSnapshot>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub split_nodes: Option<SplitSnapshot>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub split_column_edges: Option<SplitSnapshot>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub truncation: Option<TruncationCellPatchParts>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subnodes: Option<SubnodePatchSnapshot>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UnstructuredGridSnapshot {
    pub node_count: usize,
    pub nodes_per_face: JaggedArray<usize>,
    pub faces_per_cell: JaggedArray<usize>,
    pub cell_face_is_right_handed: Vec<bool>,
    pub cell_shape: CellShape,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub split_nodes: Option<SplitSnapshot>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub split_faces: Option<SplitSnapshot>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub split_edges: Option<SplitSnapshot>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub truncation: Option<TruncationCellPatchParts>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub subnodes: Vec<SubnodePatchSnapshot>,
}

impl ColumnLayerTopology {
    /// Serializes the topology to a JSON string.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(&self.to_snapshot()).map_err(serialization)
    }

    pub fn to_snapshot(&self) -> ColumnLayerSnapshot {
        ColumnLayerSnapshot {
            layout: self.layout().clone(),
            nk: self.nk(),
            k_gaps: self.k_gaps().cloned(),
            split_coordinate_lines: self.split_coordinate_lines().map(SplitSnapshot::from),
            split_nodes: self.split_nodes().map(SplitSnapshot::from),
            split_column_edges: self.split_column_edges().map(SplitSnapshot::from),
            truncation: self.truncation().map(|patch| patch.parts().clone()),
            subnodes: self.subnodes().map(SubnodePatchSnapshot::from),
        }
    }

    /// Deserializes a topology from a JSON string.
    pub fn from_json(json: &str) -> Result<Self> {
        let snapshot: ColumnLayerSnapshot = serde_json::from_str(json).map_err(serialization)?;
        Self::from_snapshot(snapshot)
    }

    /// Rebuilds a topology, replaying every overlay builder.
    pub fn from_snapshot(snap: ColumnLayerSnapshot) -> Result<Self> {
        let mut topology = ColumnLayerTopology::try_new(snap.layout, snap.nk, snap.k_gaps)?;
        if let Some(split) = snap.split_coordinate_lines {
            topology = topology.with_split_coordinate_lines(split.parent_indices, split.owners)?;
        }
        if let Some(split) = snap.split_nodes {
            topology = topology.with_split_nodes(split.parent_indices, split.owners)?;
        }
        if let Some(split) = snap.split_column_edges {
            topology = topology.with_split_column_edges(split.parent_indices, split.owners)?;
        }
        if let Some(parts) = snap.truncation {
            topology = topology.with_truncation(parts)?;
        }
        if let Some(patch) = snap.subnodes {
            if patch.kind != SubnodeObjectKind::Cell {
                return Err(Error::unsupported(
                    "column-layer subnode patch",
                    patch.kind,
                ));
            }
            topology = topology.with_subnodes(patch.counts, patch.node_weights)?;
        }
        Ok(topology)
    }
}

impl UnstructuredGridTopology {
    /// Serializes the topology to a JSON string.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(&self.to_snapshot()).map_err(serialization)
    }

    pub fn to_snapshot(&self) -> UnstructuredGridSnapshot {
        UnstructuredGridSnapshot {
            node_count: self.base_node_count(),
            nodes_per_face: self.nodes_per_face().clone(),
            faces_per_cell: self.faces_per_cell().clone(),
            cell_face_is_right_handed: self.cell_face_is_right_handed().to_vec(),
            cell_shape: self.cell_shape(),
            split_nodes: self.split_nodes().map(SplitSnapshot::from),
            split_faces: self.split_faces().map(SplitSnapshot::from),
            split_edges: self.split_edges().map(SplitSnapshot::from),
            truncation: self.truncation().map(|patch| patch.parts().clone()),
            subnodes: self
                .subnode_patches()
                .iter()
                .map(SubnodePatchSnapshot::from)
                .collect(),
        }
    }

    /// Deserializes a topology from a JSON string.
    pub fn from_json(json: &str) -> Result<Self> {
        let snapshot: UnstructuredGridSnapshot = serde_json::from_str(json).map_err(serialization)?;
        Self::from_snapshot(snapshot)
    }

    /// Rebuilds a topology, replaying every overlay builder.
    pub fn from_snapshot(snap: UnstructuredGridSnapshot) -> Result<Self> {
        let mut topology = UnstructuredGridTopology::try_new(
            snap.node_count,
            snap.nodes_per_face,
            snap.faces_per_cell,
            snap.cell_face_is_right_handed,
            snap.cell_shape,
        )?;
        if let Some(split) = snap.split_nodes {
            topology = topology.with_split_nodes(split.parent_indices, split.owners)?;
        }
        if let Some(split) = snap.split_faces {
            topology = topology.with_split_faces(split.parent_indices, split.owners)?;
        }
        if let Some(split) = snap.split_edges {
            topology = topology.with_split_edges(split.parent_indices, split.owners)?;
        }
        if let Some(parts) = snap.truncation {
            topology = topology.with_truncation(parts)?;
        }
        for patch in snap.subnodes {
            topology = topology.with_subnodes(patch.kind, patch.counts, patch.node_weights)?;
        }
        Ok(topology)
    }
}
