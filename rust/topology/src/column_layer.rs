// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Column-layer grid topology (IJK and unstructured column-layer grids).
//!
//! ## Enumerations
//!
//! - Pillars, and columns as rings of pillars. IJK grids number pillar
//!   `(i, j)` as `j * (ni + 1) + i` and column `(i, j)` as `j * ni + i`, with
//!   the ring `(i, j), (i + 1, j), (i + 1, j + 1), (i, j + 1)`.
//! - Cells: `k * column_count + column`.
//! - Coordinate lines: pillars, then split coordinate lines.
//! - Nodes: `interface * coordinate_line_count + coordinate_line`, then split
//!   nodes, then truncation nodes. Layer `k` spans two node interfaces; a K
//!   gap after a layer adds one interface.
//! - Column edges: unique pillar pairs of the column rings in first-encounter
//!   order, then split column edges.
//!
//! ## Local faces
//!
//! Face 0 is the K− face (top ring, reversed), face 1 the K+ face (bottom
//! ring), then one side face per ring edge `e`: top `e`, top `e + 1`,
//! bottom `e + 1`, bottom `e`. For IJK columns the side faces are J−, I+, J+,
//! I−. These windings are outward right-handed for right-handed columns.

use resqml_lite_core::{ExternalStore, IntegerArray, JaggedArray};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use smallvec::smallvec;

use crate::error::{out_of_range, Error, Result};
use crate::grid::{check_cell, FaceNodes, GridTopology};
use crate::kgaps::{layer_interfaces, KGaps};
use crate::split::{resolve_optional, SplitElements, SplitKind};
use crate::subnodes::{SubnodeCounts, SubnodeObjectKind, SubnodePatch};
use crate::truncation::{
    TruncationBounds, TruncationCellFace, TruncationCellPatch, TruncationCellPatchParts,
};

const CONTEXT: &str = "column-layer topology";

/// Number of the K− local face.
pub const K_MINUS_FACE: usize = 0;
/// Number of the K+ local face.
pub const K_PLUS_FACE: usize = 1;

/// How columns are formed from pillars.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnLayout {
    /// Regular `ni × nj` columns. `is_right_handed` is the handedness of
    /// every column.
    Ijk {
        ni: usize,
        nj: usize,
        is_right_handed: bool,
    },
    /// Arbitrary polygonal columns.
    Unstructured {
        pillar_count: usize,
        pillars_per_column: JaggedArray<usize>,
        column_is_right_handed: Vec<bool>,
    },
}

/// Side faces of an IJK cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IjkFace {
    KMinus,
    KPlus,
    JMinus,
    IPlus,
    JPlus,
    IMinus,
}

impl IjkFace {
    /// Local face number.
    pub fn local_face(self) -> usize {
        match self {
            IjkFace::KMinus => 0,
            IjkFace::KPlus => 1,
            IjkFace::JMinus => 2,
            IjkFace::IPlus => 3,
            IjkFace::JPlus => 4,
            IjkFace::IMinus => 5,
        }
    }
}

/// Topology of a column-layer grid with its optional overlays.
#[derive(Debug, Clone)]
pub struct ColumnLayerTopology {
    layout: ColumnLayout,
    nk: usize,
    k_gaps: Option<KGaps>,

    pillar_count: usize,
    column_pillars: JaggedArray<usize>,
    layer_top: Vec<usize>,
    interface_count: usize,
    column_edges: Vec<[usize; 2]>,
    column_edge_index: FxHashMap<(usize, usize), usize>,

    split_coordinate_lines: Option<SplitElements>,
    split_nodes: Option<SplitElements>,
    split_column_edges: Option<SplitElements>,
    truncation: Option<TruncationCellPatch>,
    subnodes: Option<SubnodePatch>,
}

impl ColumnLayerTopology {
    /// Builds the base enumeration of a grid with `nk` layers.
    pub fn try_new(layout: ColumnLayout, nk: usize, k_gaps: Option<KGaps>) -> Result<Self> {
        if nk == 0 {
            return Err(Error::structural(CONTEXT, "grid has no layers"));
        }
        if let Some(gaps) = &k_gaps {
            // Re-check against this grid's layer count.
            KGaps::try_new(gaps.gap_after_layer().to_vec(), nk)?;
        }

        let (pillar_count, column_pillars) = match &layout {
            ColumnLayout::Ijk { ni, nj, .. } => {
                let (ni, nj) = (*ni, *nj);
                if ni == 0 || nj == 0 {
                    return Err(Error::structural(
                        CONTEXT,
                        format!("empty IJK column layout {ni} x {nj}"),
                    ));
                }
                let pillar = |i: usize, j: usize| j * (ni + 1) + i;
                let rings = (0..nj).flat_map(|j| {
                    (0..ni).map(move |i| {
                        [
                            pillar(i, j),
                            pillar(i + 1, j),
                            pillar(i + 1, j + 1),
                            pillar(i, j + 1),
                        ]
                    })
                });
                ((ni + 1) * (nj + 1), JaggedArray::from_nested(rings))
            }
            ColumnLayout::Unstructured {
                pillar_count,
                pillars_per_column,
                column_is_right_handed,
            } => {
                if pillars_per_column.sub_array_count() == 0 {
                    return Err(Error::structural(CONTEXT, "grid has no columns"));
                }
                pillars_per_column.check_bound(*pillar_count, CONTEXT)?;
                for (column, ring) in pillars_per_column.iter().enumerate() {
                    if ring.len() < 3 {
                        return Err(Error::structural(
                            CONTEXT,
                            format!("column {column} has fewer than 3 pillars"),
                        ));
                    }
                    if ring.iter().enumerate().any(|(i, p)| ring[..i].contains(p)) {
                        return Err(Error::structural(
                            CONTEXT,
                            format!("column {column} repeats a pillar"),
                        ));
                    }
                }
                if column_is_right_handed.len() != pillars_per_column.sub_array_count() {
                    return Err(Error::structural(
                        CONTEXT,
                        format!(
                            "{} handedness flags for {} columns",
                            column_is_right_handed.len(),
                            pillars_per_column.sub_array_count()
                        ),
                    ));
                }
                (*pillar_count, pillars_per_column.clone())
            }
        };

        let mut column_edges = Vec::new();
        let mut column_edge_index = FxHashMap::default();
        for ring in column_pillars.iter() {
            for e in 0..ring.len() {
                let (a, b) = (ring[e], ring[(e + 1) % ring.len()]);
                column_edge_index
                    .entry((a.min(b), a.max(b)))
                    .or_insert_with(|| {
                        column_edges.push([a, b]);
                        column_edges.len() - 1
                    });
            }
        }

        let (layer_top, interface_count) = layer_interfaces(nk, k_gaps.as_ref());

        let topology = Self {
            layout,
            nk,
            k_gaps,
            pillar_count,
            column_pillars,
            layer_top,
            interface_count,
            column_edges,
            column_edge_index,
            split_coordinate_lines: None,
            split_nodes: None,
            split_column_edges: None,
            truncation: None,
            subnodes: None,
        };
        tracing::debug!(
            cells = topology.cell_count(),
            columns = topology.column_count(),
            pillars = topology.pillar_count,
            nodes = topology.base_node_count(),
            "column-layer topology built"
        );
        Ok(topology)
    }

    /// IJK grid topology.
    pub fn ijk(ni: usize, nj: usize, nk: usize) -> Result<Self> {
        Self::try_new(
            ColumnLayout::Ijk {
                ni,
                nj,
                is_right_handed: true,
            },
            nk,
            None,
        )
    }

    // -- Overlays ---------------------------------------------------------

    fn reject_later_overlays(&self, overlay: &str, later: &[(bool, &str)]) -> Result<()> {
        if let Some((_, name)) = later.iter().find(|(present, _)| *present) {
            return Err(Error::structural(
                CONTEXT,
                format!("{overlay} must be attached before {name}"),
            ));
        }
        Ok(())
    }

    /// Attaches split coordinate lines: each duplicates a pillar for the
    /// listed columns, which must contain that pillar.
    pub fn with_split_coordinate_lines(
        mut self,
        parent_pillars: Vec<usize>,
        owner_columns: JaggedArray<usize>,
    ) -> Result<Self> {
        self.reject_later_overlays(
            "split coordinate lines",
            &[
                (self.split_coordinate_lines.is_some(), "another split coordinate line set"),
                (self.split_nodes.is_some(), "split nodes"),
                (self.split_column_edges.is_some(), "split column edges"),
                (self.truncation.is_some(), "a truncation patch"),
                (self.subnodes.is_some(), "subnodes"),
            ],
        )?;
        let split = SplitElements::try_new(
            SplitKind::CoordinateLine,
            parent_pillars,
            owner_columns,
            self.pillar_count,
            self.column_count(),
        )?;
        for (pillar, columns) in split.iter() {
            if let Some(&column) = columns
                .iter()
                .find(|&&c| !self.column_pillars.sub_array(c).contains(&pillar))
            {
                return Err(Error::structural(
                    "split coordinate lines",
                    format!("column {column} does not use pillar {pillar}"),
                ));
            }
        }
        tracing::debug!(count = split.len(), "split coordinate lines attached");
        self.split_coordinate_lines = Some(split);
        Ok(self)
    }

    /// Attaches split nodes: each duplicates a node for the listed cells,
    /// which must use that node.
    pub fn with_split_nodes(
        mut self,
        parent_nodes: Vec<usize>,
        owner_cells: JaggedArray<usize>,
    ) -> Result<Self> {
        self.reject_later_overlays(
            "split nodes",
            &[
                (self.split_nodes.is_some(), "another split node set"),
                (self.split_column_edges.is_some(), "split column edges"),
                (self.truncation.is_some(), "a truncation patch"),
                (self.subnodes.is_some(), "subnodes"),
            ],
        )?;
        let split = SplitElements::try_new(
            SplitKind::Node,
            parent_nodes,
            owner_cells,
            self.base_node_count(),
            self.cell_count(),
        )?;
        for (node, cells) in split.iter() {
            if let Some(&cell) = cells
                .iter()
                .find(|&&c| !self.unsplit_cell_nodes(c).contains(&node))
            {
                return Err(Error::structural(
                    "split nodes",
                    format!("cell {cell} does not use node {node}"),
                ));
            }
        }
        tracing::debug!(count = split.len(), "split nodes attached");
        self.split_nodes = Some(split);
        Ok(self)
    }

    /// Attaches split column edges: each duplicates a column edge for a
    /// single column that uses it.
    pub fn with_split_column_edges(
        mut self,
        parent_edges: Vec<usize>,
        owner_columns: JaggedArray<usize>,
    ) -> Result<Self> {
        self.reject_later_overlays(
            "split column edges",
            &[
                (self.split_column_edges.is_some(), "another split column edge set"),
                (self.truncation.is_some(), "a truncation patch"),
                (self.subnodes.is_some(), "subnodes"),
            ],
        )?;
        let split = SplitElements::try_new(
            SplitKind::ColumnEdge,
            parent_edges,
            owner_columns,
            self.column_edges.len(),
            self.column_count(),
        )?;
        for (edge, columns) in split.iter() {
            let &[column] = columns else {
                return Err(Error::structural(
                    "split column edges",
                    format!("column edge split {edge} has {} owners, expected one", columns.len()),
                ));
            };
            let ring_len = self.column_pillars.sub_array_len(column);
            if !(0..ring_len).any(|e| self.base_column_edge(column, e) == edge) {
                return Err(Error::structural(
                    "split column edges",
                    format!("column {column} does not use column edge {edge}"),
                ));
            }
        }
        tracing::debug!(count = split.len(), "split column edges attached");
        self.split_column_edges = Some(split);
        Ok(self)
    }

    /// Attaches a truncation cell patch.
    pub fn with_truncation(mut self, parts: TruncationCellPatchParts) -> Result<Self> {
        self.reject_later_overlays(
            "a truncation patch",
            &[
                (self.truncation.is_some(), "another truncation patch"),
                (self.subnodes.is_some(), "subnodes"),
            ],
        )?;
        let local_face_count = |cell: usize| 2 + self.column_pillars.sub_array_len(cell % self.column_count());
        let patch = TruncationCellPatch::try_new(
            parts,
            &TruncationBounds {
                cell_count: self.cell_count(),
                node_count: self.base_node_count() + self.split_node_count(),
                local_face_count: &local_face_count,
            },
        )?;
        tracing::debug!(
            cells = patch.truncation_cell_count(),
            faces = patch.truncation_face_count(),
            nodes = patch.truncation_node_count(),
            "truncation patch attached"
        );
        self.truncation = Some(patch);
        Ok(self)
    }

    /// Attaches cell subnodes. Column-layer grids refine cells only.
    pub fn with_subnodes(mut self, counts: SubnodeCounts, node_weights: Vec<f64>) -> Result<Self> {
        if self.subnodes.is_some() {
            return Err(Error::structural(
                "subnode patch",
                "cell subnodes already defined by another patch",
            ));
        }
        let parent_node_counts = (0..self.cell_count())
            .map(|cell| self.cell_nodes(cell).len())
            .collect();
        self.subnodes = Some(SubnodePatch::try_new(
            SubnodeObjectKind::Cell,
            counts,
            node_weights,
            parent_node_counts,
            Some(self.column_count()),
        )?);
        Ok(self)
    }

    /// Split coordinate lines from schema arrays.
    pub fn with_split_coordinate_line_arrays(
        self,
        parent_pillars: &IntegerArray,
        columns: &IntegerArray,
        columns_cumulative_length: &IntegerArray,
        store: &dyn ExternalStore,
    ) -> Result<Self> {
        let parents = parent_pillars.materialize_indices(store, "split coordinate lines")?;
        let owners = JaggedArray::resolve_indices(columns, columns_cumulative_length, store)?;
        self.with_split_coordinate_lines(parents, owners)
    }

    // -- Counts -----------------------------------------------------------

    pub fn layout(&self) -> &ColumnLayout {
        &self.layout
    }

    pub fn nk(&self) -> usize {
        self.nk
    }

    pub fn k_gaps(&self) -> Option<&KGaps> {
        self.k_gaps.as_ref()
    }

    pub fn pillar_count(&self) -> usize {
        self.pillar_count
    }

    pub fn column_count(&self) -> usize {
        self.column_pillars.sub_array_count()
    }

    pub fn interface_count(&self) -> usize {
        self.interface_count
    }

    pub fn coordinate_line_count(&self) -> usize {
        self.pillar_count + self.split_coordinate_lines.as_ref().map_or(0, SplitElements::len)
    }

    /// Nodes on coordinate lines, before split and truncation nodes.
    pub fn base_node_count(&self) -> usize {
        self.interface_count * self.coordinate_line_count()
    }

    pub fn split_node_count(&self) -> usize {
        self.split_nodes.as_ref().map_or(0, SplitElements::len)
    }

    pub fn truncation_node_count(&self) -> usize {
        self.truncation
            .as_ref()
            .map_or(0, TruncationCellPatch::truncation_node_count)
    }

    /// Number of column edges, split ones included.
    pub fn column_edge_count(&self) -> usize {
        self.column_edges.len() + self.split_column_edges.as_ref().map_or(0, SplitElements::len)
    }

    // -- Overlay access ---------------------------------------------------

    pub fn split_coordinate_lines(&self) -> Option<&SplitElements> {
        self.split_coordinate_lines.as_ref()
    }

    pub fn split_nodes(&self) -> Option<&SplitElements> {
        self.split_nodes.as_ref()
    }

    pub fn split_column_edges(&self) -> Option<&SplitElements> {
        self.split_column_edges.as_ref()
    }

    pub fn truncation(&self) -> Option<&TruncationCellPatch> {
        self.truncation.as_ref()
    }

    pub fn subnodes(&self) -> Option<&SubnodePatch> {
        self.subnodes.as_ref()
    }

    // -- Indexing ---------------------------------------------------------

    pub fn column_pillars(&self, column: usize) -> &[usize] {
        self.column_pillars.sub_array(column)
    }

    pub fn column_is_right_handed(&self, column: usize) -> bool {
        match &self.layout {
            ColumnLayout::Ijk { is_right_handed, .. } => {
                if column >= self.column_count() {
                    out_of_range(column, self.column_count());
                }
                *is_right_handed
            }
            ColumnLayout::Unstructured {
                column_is_right_handed,
                ..
            } => match column_is_right_handed.get(column) {
                Some(&flag) => flag,
                None => out_of_range(column, column_is_right_handed.len()),
            },
        }
    }

    pub fn cell_index(&self, k: usize, column: usize) -> usize {
        if k >= self.nk {
            out_of_range(k, self.nk);
        }
        if column >= self.column_count() {
            out_of_range(column, self.column_count());
        }
        k * self.column_count() + column
    }

    /// `(k, column)` of a cell.
    pub fn cell_layer_column(&self, cell: usize) -> (usize, usize) {
        check_cell(cell, self.cell_count());
        (cell / self.column_count(), cell % self.column_count())
    }

    /// Cell `(i, j, k)` of an IJK grid, `None` for other layouts.
    pub fn ijk_cell_index(&self, i: usize, j: usize, k: usize) -> Option<usize> {
        self.ijk_column_index(i, j).map(|column| self.cell_index(k, column))
    }

    /// Column `(i, j)` of an IJK grid, `None` for other layouts or outside
    /// the grid.
    pub fn ijk_column_index(&self, i: usize, j: usize) -> Option<usize> {
        match self.layout {
            ColumnLayout::Ijk { ni, nj, .. } if i < ni && j < nj => Some(j * ni + i),
            _ => None,
        }
    }

    /// Pillar `(i, j)` of an IJK grid, `None` for other layouts or outside
    /// the grid.
    pub fn ijk_pillar_index(&self, i: usize, j: usize) -> Option<usize> {
        match self.layout {
            ColumnLayout::Ijk { ni, nj, .. } if i <= ni && j <= nj => Some(j * (ni + 1) + i),
            _ => None,
        }
    }

    /// Top and bottom node interfaces of layer `k`.
    pub fn layer_interfaces(&self, k: usize) -> (usize, usize) {
        match self.layer_top.get(k) {
            Some(&top) => (top, top + 1),
            None => out_of_range(k, self.nk),
        }
    }

    /// Coordinate line used by `column` at ring position `position`.
    pub fn coordinate_line(&self, column: usize, position: usize) -> usize {
        let pillar = self.column_pillars.sub_array(column)[position];
        resolve_optional(
            self.split_coordinate_lines.as_ref(),
            pillar,
            column,
            self.pillar_count,
        )
    }

    /// Column edge between ring positions `edge` and `edge + 1`, before
    /// column edge splits.
    fn base_column_edge(&self, column: usize, edge: usize) -> usize {
        let ring = self.column_pillars.sub_array(column);
        let (a, b) = (ring[edge], ring[(edge + 1) % ring.len()]);
        self.column_edge_index[&(a.min(b), a.max(b))]
    }

    /// Column edge used by `column` between ring positions `edge` and
    /// `edge + 1`.
    pub fn column_edge(&self, column: usize, edge: usize) -> usize {
        let ring_len = self.column_pillars.sub_array_len(column);
        if edge >= ring_len {
            out_of_range(edge, ring_len);
        }
        resolve_optional(
            self.split_column_edges.as_ref(),
            self.base_column_edge(column, edge),
            column,
            self.column_edges.len(),
        )
    }

    /// Pillar pair of an unsplit column edge.
    pub fn column_edge_pillars(&self, edge: usize) -> [usize; 2] {
        match self.column_edges.get(edge) {
            Some(&pair) => pair,
            None => out_of_range(edge, self.column_edges.len()),
        }
    }

    /// Node of `cell` at ring position `position`, on the top interface or
    /// the bottom one, ignoring split nodes.
    fn unsplit_corner(&self, cell: usize, position: usize, bottom: bool) -> usize {
        let (k, column) = self.cell_layer_column(cell);
        let interface = self.layer_top[k] + usize::from(bottom);
        interface * self.coordinate_line_count() + self.coordinate_line(column, position)
    }

    fn unsplit_cell_nodes(&self, cell: usize) -> Vec<usize> {
        let ring_len = self.column_pillars.sub_array_len(cell % self.column_count());
        [false, true]
            .into_iter()
            .flat_map(|bottom| (0..ring_len).map(move |p| (p, bottom)))
            .map(|(p, bottom)| self.unsplit_corner(cell, p, bottom))
            .collect()
    }

    /// Node of `cell` at ring position `position` on its top or bottom
    /// interface.
    pub fn corner_node(&self, cell: usize, position: usize, bottom: bool) -> usize {
        let node = self.unsplit_corner(cell, position, bottom);
        resolve_optional(self.split_nodes.as_ref(), node, cell, self.base_node_count())
    }

    /// Nodes of the regular (untruncated) polyhedron of `cell`.
    fn regular_face_nodes(&self, cell: usize, local_face: usize) -> FaceNodes {
        let n = self.column_pillars.sub_array_len(cell % self.column_count());
        let top = |p: usize| self.corner_node(cell, p % n, false);
        let bottom = |p: usize| self.corner_node(cell, p % n, true);
        match local_face {
            K_MINUS_FACE => std::iter::once(0).chain((1..n).rev()).map(top).collect(),
            K_PLUS_FACE => (0..n).map(bottom).collect(),
            f if f < n + 2 => {
                let e = f - 2;
                smallvec![top(e), top(e + 1), bottom(e + 1), bottom(e)]
            }
            f => out_of_range(f, n + 2),
        }
    }

    fn truncation_cell(&self, cell: usize) -> Option<(&TruncationCellPatch, usize)> {
        let patch = self.truncation.as_ref()?;
        patch.truncation_cell_of(cell).map(|tc| (patch, tc))
    }

    /// Whether `cell` is replaced by a truncation cell.
    pub fn is_truncated(&self, cell: usize) -> bool {
        self.truncation_cell(cell).is_some()
    }
}

impl GridTopology for ColumnLayerTopology {
    fn cell_count(&self) -> usize {
        self.nk * self.column_count()
    }

    fn node_count(&self) -> usize {
        self.base_node_count() + self.split_node_count() + self.truncation_node_count()
    }

    fn cell_face_count(&self, cell: usize) -> usize {
        check_cell(cell, self.cell_count());
        match self.truncation_cell(cell) {
            Some((patch, tc)) => patch.face_count(tc),
            None => 2 + self.column_pillars.sub_array_len(cell % self.column_count()),
        }
    }

    fn cell_face_nodes(&self, cell: usize, local_face: usize) -> FaceNodes {
        check_cell(cell, self.cell_count());
        match self.truncation_cell(cell) {
            Some((patch, tc)) => match patch.face(tc, local_face) {
                TruncationCellFace::Local(f) => self.regular_face_nodes(cell, f),
                TruncationCellFace::Truncation(f) => {
                    patch.truncation_face_nodes(f).iter().copied().collect()
                }
            },
            None => self.regular_face_nodes(cell, local_face),
        }
    }

    fn is_face_outward_right_handed(&self, cell: usize, local_face: usize) -> bool {
        check_cell(cell, self.cell_count());
        match self.truncation_cell(cell) {
            Some((patch, tc)) => patch.face_is_right_handed(tc, local_face),
            None => {
                let column = cell % self.column_count();
                let faces = 2 + self.column_pillars.sub_array_len(column);
                if local_face >= faces {
                    out_of_range(local_face, faces);
                }
                self.column_is_right_handed(column)
            }
        }
    }

    /// Top ring then bottom ring for regular cells.
    fn cell_nodes(&self, cell: usize) -> Vec<usize> {
        if self.is_truncated(cell) {
            let mut nodes = Vec::new();
            for face in 0..self.cell_face_count(cell) {
                for node in self.cell_face_nodes(cell, face) {
                    if !nodes.contains(&node) {
                        nodes.push(node);
                    }
                }
            }
            return nodes;
        }
        let ring_len = self.column_pillars.sub_array_len(cell % self.column_count());
        [false, true]
            .into_iter()
            .flat_map(|bottom| (0..ring_len).map(move |p| (p, bottom)))
            .map(|(p, bottom)| self.corner_node(cell, p, bottom))
            .collect()
    }
}

impl PartialEq for ColumnLayerTopology {
    fn eq(&self, other: &Self) -> bool {
        self.layout == other.layout
            && self.nk == other.nk
            && self.k_gaps == other.k_gaps
            && self.split_coordinate_lines == other.split_coordinate_lines
            && self.split_nodes == other.split_nodes
            && self.split_column_edges == other.split_column_edges
            && self.truncation == other.truncation
            && self.subnodes == other.subnodes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ijk_counts() {
        let grid = ColumnLayerTopology::ijk(3, 2, 4).unwrap();
        assert_eq!(grid.pillar_count(), 12);
        assert_eq!(grid.column_count(), 6);
        assert_eq!(grid.cell_count(), 24);
        assert_eq!(grid.interface_count(), 5);
        assert_eq!(grid.node_count(), 60);
        // 3 * 3 I-edges + 4 * 2 J-edges
        assert_eq!(grid.column_edge_count(), 17);
        assert_eq!(grid.ijk_cell_index(2, 1, 3), Some(23));
        assert_eq!(grid.ijk_pillar_index(3, 2), Some(11));
        assert_eq!(grid.ijk_column_index(3, 0), None);
    }

    #[test]
    fn hex_face_orders() {
        let grid = ColumnLayerTopology::ijk(1, 1, 1).unwrap();
        // Node (di, dj, dk) = dk * 4 + dj * 2 + di for a single cell.
        let faces: Vec<Vec<usize>> = (0..6)
            .map(|f| grid.cell_face_nodes(0, f).to_vec())
            .collect();
        assert_eq!(faces[IjkFace::KMinus.local_face()], vec![0, 2, 3, 1]);
        assert_eq!(faces[IjkFace::KPlus.local_face()], vec![4, 5, 7, 6]);
        assert_eq!(faces[IjkFace::JMinus.local_face()], vec![0, 1, 5, 4]);
        assert_eq!(faces[IjkFace::IPlus.local_face()], vec![1, 3, 7, 5]);
        assert_eq!(faces[IjkFace::JPlus.local_face()], vec![3, 2, 6, 7]);
        assert_eq!(faces[IjkFace::IMinus.local_face()], vec![2, 0, 4, 6]);
        assert!(grid.is_cell_closed(0));
        assert!(grid.is_face_outward_right_handed(0, 3));
        assert_eq!(grid.cell_nodes(0), vec![0, 1, 3, 2, 4, 5, 7, 6]);
    }

    #[test]
    fn k_gap_separates_layers() {
        let grid = ColumnLayerTopology::try_new(
            ColumnLayout::Ijk {
                ni: 1,
                nj: 1,
                is_right_handed: true,
            },
            2,
            Some(KGaps::try_new(vec![true], 2).unwrap()),
        )
        .unwrap();
        assert_eq!(grid.interface_count(), 4);
        let upper_bottom = grid.cell_face_nodes(0, K_PLUS_FACE);
        let lower_top = grid.cell_face_nodes(1, K_MINUS_FACE);
        assert!(upper_bottom.iter().all(|n| !lower_top.contains(n)));
        assert_eq!(grid.layer_interfaces(1), (2, 3));
    }

    #[test]
    fn unstructured_columns() {
        // Two triangular columns sharing the pillar pair (1, 2).
        let grid = ColumnLayerTopology::try_new(
            ColumnLayout::Unstructured {
                pillar_count: 4,
                pillars_per_column: JaggedArray::from_nested(vec![vec![0, 1, 2], vec![1, 3, 2]]),
                column_is_right_handed: vec![true, false],
            },
            1,
            None,
        )
        .unwrap();
        assert_eq!(grid.column_edge_count(), 5);
        assert_eq!(grid.column_edge(0, 1), grid.column_edge(1, 2));
        assert_eq!(grid.cell_face_count(1), 5);
        assert!(!grid.is_face_outward_right_handed(1, 0));
        assert!(grid.is_cell_closed(0));

        let bad = ColumnLayerTopology::try_new(
            ColumnLayout::Unstructured {
                pillar_count: 3,
                pillars_per_column: JaggedArray::from_nested(vec![vec![0, 1]]),
                column_is_right_handed: vec![true],
            },
            1,
            None,
        );
        assert!(matches!(bad, Err(Error::StructuralInconsistency { .. })));
    }

    #[test]
    fn split_coordinate_line_separates_columns() {
        // 2 x 1 columns; the middle pillars 1 and 4 are split for column 1.
        let grid = ColumnLayerTopology::ijk(2, 1, 1)
            .unwrap()
            .with_split_coordinate_lines(
                vec![1, 4],
                JaggedArray::from_nested(vec![vec![1], vec![1]]),
            )
            .unwrap();
        assert_eq!(grid.coordinate_line_count(), 8);
        assert_eq!(grid.base_node_count(), 16);
        assert_eq!(grid.coordinate_line(0, 1), 1);
        assert_eq!(grid.coordinate_line(1, 0), 6);
        assert_eq!(grid.coordinate_line(1, 3), 7);
        // Column 0 side I+ and column 1 side I- no longer share nodes.
        let left = grid.cell_face_nodes(0, IjkFace::IPlus.local_face());
        let right = grid.cell_face_nodes(1, IjkFace::IMinus.local_face());
        assert!(left.iter().all(|n| !right.contains(n)));

        let not_owner = ColumnLayerTopology::ijk(2, 1, 1)
            .unwrap()
            .with_split_coordinate_lines(vec![0], JaggedArray::from_nested(vec![vec![1]]));
        assert!(not_owner.is_err());
    }

    #[test]
    fn split_coordinate_lines_from_schema_arrays() {
        let grid = ColumnLayerTopology::ijk(2, 1, 1)
            .unwrap()
            .with_split_coordinate_line_arrays(
                &IntegerArray::inline(vec![1, 4]),
                &IntegerArray::inline(vec![1, 1]),
                &IntegerArray::inline(vec![1, 2]),
                &resqml_lite_core::NoExternalStore,
            )
            .unwrap();
        assert_eq!(grid.split_coordinate_lines().unwrap().owners_of(1), &[1]);
        assert_eq!(grid.coordinate_line(1, 3), 7);
    }

    #[test]
    fn split_nodes_substitute_per_cell() {
        let grid = ColumnLayerTopology::ijk(2, 1, 1)
            .unwrap()
            .with_split_nodes(vec![1], JaggedArray::from_nested(vec![vec![1]]))
            .unwrap();
        assert_eq!(grid.node_count(), 13);
        assert_eq!(grid.corner_node(0, 1, false), 1);
        assert_eq!(grid.corner_node(1, 0, false), 12);
        assert!(grid.is_cell_closed(1));

        let order = ColumnLayerTopology::ijk(2, 1, 1)
            .unwrap()
            .with_split_nodes(vec![1], JaggedArray::from_nested(vec![vec![1]]))
            .unwrap()
            .with_split_coordinate_lines(vec![1], JaggedArray::from_nested(vec![vec![1]]));
        assert!(order.is_err());
    }

    #[test]
    fn split_column_edge_has_single_owner() {
        let grid = ColumnLayerTopology::ijk(2, 1, 1).unwrap();
        let shared = grid.column_edge(0, 1);
        let grid = grid
            .with_split_column_edges(vec![shared], JaggedArray::from_nested(vec![vec![1]]))
            .unwrap();
        assert_eq!(grid.column_edge(0, 1), shared);
        assert_eq!(grid.column_edge(1, 3), 7);

        let two_owners = ColumnLayerTopology::ijk(2, 1, 1)
            .unwrap()
            .with_split_column_edges(vec![shared], JaggedArray::from_nested(vec![vec![0, 1]]));
        assert!(two_owners.is_err());
    }

    #[test]
    fn split_column_edges_follow_overlay_order() {
        let after_subnodes = ColumnLayerTopology::ijk(2, 1, 1)
            .unwrap()
            .with_subnodes(SubnodeCounts::Uniform { per_object: 1 }, vec![0.125; 16])
            .unwrap()
            .with_split_column_edges(vec![1], JaggedArray::from_nested(vec![vec![1]]));
        assert!(matches!(
            after_subnodes,
            Err(Error::StructuralInconsistency { .. })
        ));

        let nodes_after_edges = ColumnLayerTopology::ijk(2, 1, 1)
            .unwrap()
            .with_split_column_edges(vec![1], JaggedArray::from_nested(vec![vec![1]]))
            .unwrap()
            .with_split_nodes(vec![1], JaggedArray::from_nested(vec![vec![1]]));
        assert!(nodes_after_edges.is_err());

        let twice = ColumnLayerTopology::ijk(2, 1, 1)
            .unwrap()
            .with_split_column_edges(vec![1], JaggedArray::from_nested(vec![vec![1]]))
            .unwrap()
            .with_split_column_edges(vec![1], JaggedArray::from_nested(vec![vec![0]]));
        assert!(twice.is_err());
    }

    #[test]
    #[should_panic(expected = "OutOfRangeAccess")]
    fn face_out_of_range() {
        ColumnLayerTopology::ijk(1, 1, 1).unwrap().cell_face_nodes(0, 6);
    }
}
