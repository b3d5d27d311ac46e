// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! # RESQML-Lite Topology
//!
//! Grid topology for RESQML representations: column-layer grids (IJK and
//! unstructured column-layer) and unstructured grids, with the overlays that
//! refine them.
//!
//! Every topology starts from a base enumeration of pillars, columns, cells,
//! faces and nodes. Overlays are attached afterwards and only append:
//!
//! - split elements duplicate a parent element for a set of owners
//!   ([`SplitElements`])
//! - K gaps insert an extra node interface between layers ([`KGaps`])
//! - subnodes place extra nodes inside cells, faces or edges
//!   ([`SubnodePatch`])
//! - truncation cells replace a parent cell's polyhedron
//!   ([`TruncationCellPatch`])
//!
//! Nodes use the extended indexing: base nodes, then split nodes, then
//! truncation nodes. [`GridTopology`] is the contract shared by both grid
//! families, and [`GridGeometry`] answers cell geometry queries once node
//! points are resolved.
//!
//! ```rust
//! use resqml_lite_topology::{ColumnLayerTopology, GridTopology};
//!
//! let grid = ColumnLayerTopology::ijk(2, 1, 1).unwrap();
//! assert_eq!(grid.cell_count(), 2);
//! assert_eq!(grid.node_count(), 12);
//! assert!(grid.is_cell_closed(1));
//! ```

pub mod column_grid;
pub mod column_layer;
pub mod error;
pub mod geometry;
pub mod grid;
pub mod kgaps;
pub mod serialization;
pub mod split;
pub mod subnodes;
pub mod truncation;
pub mod unstructured;

pub use column_grid::{ColumnLayerGrid, KDirection, PillarShape};
pub use column_layer::{ColumnLayerTopology, ColumnLayout, IjkFace, K_MINUS_FACE, K_PLUS_FACE};
pub use error::{Error, Result};
pub use grid::{FaceNodes, GridGeometry, GridTopology};
pub use kgaps::KGaps;
pub use serialization::{ColumnLayerSnapshot, SplitSnapshot, UnstructuredGridSnapshot};
pub use split::{SplitElements, SplitKind};
pub use subnodes::{SubnodeCounts, SubnodeObjectKind, SubnodePatch, SubnodePatchSnapshot};
pub use truncation::{
    TruncationBounds, TruncationCellFace, TruncationCellPatch, TruncationCellPatchParts,
};
pub use unstructured::{CellShape, UnstructuredGrid, UnstructuredGridTopology};
