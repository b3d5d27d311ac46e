// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Unstructured grids: cells as arbitrary lists of polygonal faces.
//!
//! Faces are shared between cells and carry a node ring; each cell lists its
//! faces with one orientation flag per listed face. Edges are the unique node
//! pairs of the face rings, in first-encounter order.

use std::fmt;

use resqml_lite_core::{ArrayAccess, BooleanArray, ExternalStore, JaggedArray};
use resqml_lite_geometry::{Point3dArray, ResolveContext};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::error::{out_of_range, Error, Result};
use crate::grid::{check_cell, FaceNodes, GridGeometry, GridTopology};
use crate::split::{resolve_optional, SplitElements, SplitKind};
use crate::subnodes::{check_exclusive, SubnodeCounts, SubnodeObjectKind, SubnodePatch};
use crate::truncation::{
    TruncationBounds, TruncationCellFace, TruncationCellPatch, TruncationCellPatchParts,
};

const CONTEXT: &str = "unstructured grid topology";

/// Shape shared by every cell of a grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CellShape {
    Tetrahedral,
    Pyramidal,
    Prism,
    Hexahedral,
    Polyhedral,
}

impl CellShape {
    /// Parses a schema cell shape name.
    pub fn parse(name: &str) -> Result<Self> {
        match name {
            "tetrahedral" => Ok(CellShape::Tetrahedral),
            "pyramidal" => Ok(CellShape::Pyramidal),
            "prism" => Ok(CellShape::Prism),
            "hexahedral" => Ok(CellShape::Hexahedral),
            "polyhedral" => Ok(CellShape::Polyhedral),
            other => Err(Error::unsupported("cell shape", other)),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            CellShape::Tetrahedral => "tetrahedral",
            CellShape::Pyramidal => "pyramidal",
            CellShape::Prism => "prism",
            CellShape::Hexahedral => "hexahedral",
            CellShape::Polyhedral => "polyhedral",
        }
    }

    /// Whether a cell whose faces have these node counts has this shape.
    fn accepts(self, face_sizes: &[usize]) -> bool {
        let count = |n: usize| face_sizes.iter().filter(|&&s| s == n).count();
        match self {
            CellShape::Tetrahedral => face_sizes.len() == 4 && count(3) == 4,
            CellShape::Pyramidal => face_sizes.len() == 5 && count(3) == 4 && count(4) == 1,
            CellShape::Prism => face_sizes.len() == 5 && count(3) == 2 && count(4) == 3,
            CellShape::Hexahedral => face_sizes.len() == 6 && count(4) == 6,
            CellShape::Polyhedral => face_sizes.len() >= 4,
        }
    }
}

impl fmt::Display for CellShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Topology of an unstructured grid with its optional overlays.
#[derive(Debug, Clone)]
pub struct UnstructuredGridTopology {
    node_count: usize,
    nodes_per_face: JaggedArray<usize>,
    faces_per_cell: JaggedArray<usize>,
    cell_face_is_right_handed: Vec<bool>,
    cell_shape: CellShape,

    edges: Vec<[usize; 2]>,
    /// Edge of each ring position of each face.
    face_edges: JaggedArray<usize>,

    split_nodes: Option<SplitElements>,
    split_faces: Option<SplitElements>,
    split_edges: Option<SplitElements>,
    truncation: Option<TruncationCellPatch>,
    subnodes: Vec<SubnodePatch>,
}

impl UnstructuredGridTopology {
    /// Validates the face and cell lists and enumerates edges.
    ///
    /// `cell_face_is_right_handed` has one flag per entry of
    /// `faces_per_cell`.
    pub fn try_new(
        node_count: usize,
        nodes_per_face: JaggedArray<usize>,
        faces_per_cell: JaggedArray<usize>,
        cell_face_is_right_handed: Vec<bool>,
        cell_shape: CellShape,
    ) -> Result<Self> {
        nodes_per_face.check_bound(node_count, CONTEXT)?;
        faces_per_cell.check_bound(nodes_per_face.sub_array_count(), CONTEXT)?;
        if cell_face_is_right_handed.len() != faces_per_cell.elements().len() {
            return Err(Error::structural(
                CONTEXT,
                format!(
                    "{} orientation flags for {} cell faces",
                    cell_face_is_right_handed.len(),
                    faces_per_cell.elements().len()
                ),
            ));
        }
        if let Some(face) = nodes_per_face.iter().position(|nodes| nodes.len() < 3) {
            return Err(Error::structural(
                CONTEXT,
                format!("face {face} has fewer than 3 nodes"),
            ));
        }
        for (cell, faces) in faces_per_cell.iter().enumerate() {
            let sizes: Vec<usize> = faces
                .iter()
                .map(|&f| nodes_per_face.sub_array_len(f))
                .collect();
            if !cell_shape.accepts(&sizes) {
                return Err(Error::structural(
                    CONTEXT,
                    format!("cell {cell} with face sizes {sizes:?} is not {cell_shape}"),
                ));
            }
        }

        let mut edges = Vec::new();
        let mut edge_index: FxHashMap<(usize, usize), usize> = FxHashMap::default();
        let face_edges = JaggedArray::from_nested(nodes_per_face.iter().map(|ring| {
            (0..ring.len())
                .map(|i| {
                    let (a, b) = (ring[i], ring[(i + 1) % ring.len()]);
                    *edge_index.entry((a.min(b), a.max(b))).or_insert_with(|| {
                        edges.push([a, b]);
                        edges.len() - 1
                    })
                })
                .collect::<Vec<_>>()
        }));

        let topology = Self {
            node_count,
            nodes_per_face,
            faces_per_cell,
            cell_face_is_right_handed,
            cell_shape,
            edges,
            face_edges,
            split_nodes: None,
            split_faces: None,
            split_edges: None,
            truncation: None,
            subnodes: Vec::new(),
        };
        tracing::debug!(
            cells = topology.cell_count(),
            faces = topology.base_face_count(),
            edges = topology.edges.len(),
            nodes = node_count,
            shape = %cell_shape,
            "unstructured grid topology built"
        );
        Ok(topology)
    }

    fn reject_later_overlays(&self, overlay: &str, later: &[(bool, &str)]) -> Result<()> {
        if let Some((_, name)) = later.iter().find(|(present, _)| *present) {
            return Err(Error::structural(
                CONTEXT,
                format!("{overlay} must be attached before {name}"),
            ));
        }
        Ok(())
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
                (self.truncation.is_some(), "a truncation patch"),
                (!self.subnodes.is_empty(), "subnodes"),
            ],
        )?;
        let split = SplitElements::try_new(
            SplitKind::Node,
            parent_nodes,
            owner_cells,
            self.node_count,
            self.cell_count(),
        )?;
        for (node, cells) in split.iter() {
            if let Some(&cell) = cells.iter().find(|&&c| {
                !self
                    .faces_per_cell
                    .sub_array(c)
                    .iter()
                    .any(|&f| self.nodes_per_face.sub_array(f).contains(&node))
            }) {
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

    /// Attaches split faces: each duplicates a face for the listed cells,
    /// which must use that face.
    pub fn with_split_faces(
        mut self,
        parent_faces: Vec<usize>,
        owner_cells: JaggedArray<usize>,
    ) -> Result<Self> {
        self.reject_later_overlays(
            "split faces",
            &[
                (self.split_faces.is_some(), "another split face set"),
                (!self.subnodes.is_empty(), "subnodes"),
            ],
        )?;
        let split = SplitElements::try_new(
            SplitKind::Face,
            parent_faces,
            owner_cells,
            self.base_face_count(),
            self.cell_count(),
        )?;
        for (face, cells) in split.iter() {
            if let Some(&cell) = cells
                .iter()
                .find(|&&c| !self.faces_per_cell.sub_array(c).contains(&face))
            {
                return Err(Error::structural(
                    "split faces",
                    format!("cell {cell} does not use face {face}"),
                ));
            }
        }
        tracing::debug!(count = split.len(), "split faces attached");
        self.split_faces = Some(split);
        Ok(self)
    }

    /// Attaches split edges: each duplicates an edge for the listed faces,
    /// which must use that edge.
    pub fn with_split_edges(
        mut self,
        parent_edges: Vec<usize>,
        owner_faces: JaggedArray<usize>,
    ) -> Result<Self> {
        self.reject_later_overlays(
            "split edges",
            &[
                (self.split_edges.is_some(), "another split edge set"),
                (!self.subnodes.is_empty(), "subnodes"),
            ],
        )?;
        let split = SplitElements::try_new(
            SplitKind::Edge,
            parent_edges,
            owner_faces,
            self.edges.len(),
            self.base_face_count(),
        )?;
        for (edge, faces) in split.iter() {
            if let Some(&face) = faces
                .iter()
                .find(|&&f| !self.face_edges.sub_array(f).contains(&edge))
            {
                return Err(Error::structural(
                    "split edges",
                    format!("face {face} does not use edge {edge}"),
                ));
            }
        }
        self.split_edges = Some(split);
        Ok(self)
    }

    /// Attaches a truncation cell patch.
    pub fn with_truncation(mut self, parts: TruncationCellPatchParts) -> Result<Self> {
        self.reject_later_overlays(
            "a truncation patch",
            &[
                (self.truncation.is_some(), "another truncation patch"),
                (!self.subnodes.is_empty(), "subnodes"),
            ],
        )?;
        let local_face_count = |cell: usize| self.faces_per_cell.sub_array_len(cell);
        let patch = TruncationCellPatch::try_new(
            parts,
            &TruncationBounds {
                cell_count: self.cell_count(),
                node_count: self.node_count + self.split_node_count(),
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

    /// Attaches a subnode patch for cells, faces or edges. At most one patch
    /// per object kind; column patches are rejected.
    pub fn with_subnodes(
        mut self,
        kind: SubnodeObjectKind,
        counts: SubnodeCounts,
        node_weights: Vec<f64>,
    ) -> Result<Self> {
        check_exclusive(&self.subnodes, kind)?;
        let parent_node_counts = match kind {
            SubnodeObjectKind::Cell => (0..self.cell_count())
                .map(|cell| self.cell_nodes(cell).len())
                .collect(),
            SubnodeObjectKind::Face => (0..self.face_count())
                .map(|face| self.face_nodes(face).len())
                .collect(),
            SubnodeObjectKind::Edge => vec![2; self.edge_count()],
        };
        let patch = SubnodePatch::try_new(kind, counts, node_weights, parent_node_counts, None)?;
        self.subnodes.push(patch);
        Ok(self)
    }

    // -- Counts -----------------------------------------------------------

    pub fn cell_shape(&self) -> CellShape {
        self.cell_shape
    }

    /// Nodes before split and truncation nodes.
    pub fn base_node_count(&self) -> usize {
        self.node_count
    }

    pub fn split_node_count(&self) -> usize {
        self.split_nodes.as_ref().map_or(0, SplitElements::len)
    }

    pub fn truncation_node_count(&self) -> usize {
        self.truncation
            .as_ref()
            .map_or(0, TruncationCellPatch::truncation_node_count)
    }

    pub fn base_face_count(&self) -> usize {
        self.nodes_per_face.sub_array_count()
    }

    /// Number of faces, split ones included.
    pub fn face_count(&self) -> usize {
        self.base_face_count() + self.split_faces.as_ref().map_or(0, SplitElements::len)
    }

    /// Number of edges, split ones included.
    pub fn edge_count(&self) -> usize {
        self.edges.len() + self.split_edges.as_ref().map_or(0, SplitElements::len)
    }

    // -- Overlay access ---------------------------------------------------

    pub fn split_nodes(&self) -> Option<&SplitElements> {
        self.split_nodes.as_ref()
    }

    pub fn split_faces(&self) -> Option<&SplitElements> {
        self.split_faces.as_ref()
    }

    pub fn split_edges(&self) -> Option<&SplitElements> {
        self.split_edges.as_ref()
    }

    pub fn truncation(&self) -> Option<&TruncationCellPatch> {
        self.truncation.as_ref()
    }

    pub fn subnode_patches(&self) -> &[SubnodePatch] {
        &self.subnodes
    }

    pub fn subnode_patch(&self, kind: SubnodeObjectKind) -> Option<&SubnodePatch> {
        self.subnodes.iter().find(|p| p.kind() == kind)
    }

    // -- Raw arrays -------------------------------------------------------

    pub fn nodes_per_face(&self) -> &JaggedArray<usize> {
        &self.nodes_per_face
    }

    pub fn faces_per_cell(&self) -> &JaggedArray<usize> {
        &self.faces_per_cell
    }

    pub fn cell_face_is_right_handed(&self) -> &[bool] {
        &self.cell_face_is_right_handed
    }

    // -- Indexing ---------------------------------------------------------

    /// Base face a face index stands for: split faces map to their parent.
    fn base_face(&self, face: usize) -> usize {
        let base = self.base_face_count();
        if face < base {
            return face;
        }
        match &self.split_faces {
            Some(split) if face - base < split.len() => split.parent(face - base),
            _ => out_of_range(face, self.face_count()),
        }
    }

    /// Node ring of a face. Split faces share the ring of their parent.
    pub fn face_nodes(&self, face: usize) -> &[usize] {
        self.nodes_per_face.sub_array(self.base_face(face))
    }

    /// Face used by `cell` as its local face `local_face`, split faces
    /// substituted.
    pub fn cell_face_index(&self, cell: usize, local_face: usize) -> usize {
        check_cell(cell, self.cell_count());
        let faces = self.faces_per_cell.sub_array(cell);
        match faces.get(local_face) {
            Some(&face) => {
                resolve_optional(self.split_faces.as_ref(), face, cell, self.base_face_count())
            }
            None => out_of_range(local_face, faces.len()),
        }
    }

    /// Node pair of an edge. Split edges share the pair of their parent.
    pub fn edge_nodes(&self, edge: usize) -> [usize; 2] {
        let base = self.edges.len();
        if edge < base {
            return self.edges[edge];
        }
        match &self.split_edges {
            Some(split) if edge - base < split.len() => self.edges[split.parent(edge - base)],
            _ => out_of_range(edge, self.edge_count()),
        }
    }

    /// Edge used by `face` between ring positions `position` and
    /// `position + 1`, split edges substituted.
    pub fn face_edge(&self, face: usize, position: usize) -> usize {
        let face = self.base_face(face);
        let edges = self.face_edges.sub_array(face);
        match edges.get(position) {
            Some(&edge) => resolve_optional(self.split_edges.as_ref(), edge, face, self.edges.len()),
            None => out_of_range(position, edges.len()),
        }
    }

    fn regular_face_nodes(&self, cell: usize, local_face: usize) -> FaceNodes {
        let faces = self.faces_per_cell.sub_array(cell);
        let Some(&face) = faces.get(local_face) else {
            out_of_range(local_face, faces.len());
        };
        self.nodes_per_face
            .sub_array(face)
            .iter()
            .map(|&node| resolve_optional(self.split_nodes.as_ref(), node, cell, self.node_count))
            .collect()
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

impl GridTopology for UnstructuredGridTopology {
    fn cell_count(&self) -> usize {
        self.faces_per_cell.sub_array_count()
    }

    fn node_count(&self) -> usize {
        self.node_count + self.split_node_count() + self.truncation_node_count()
    }

    fn cell_face_count(&self, cell: usize) -> usize {
        check_cell(cell, self.cell_count());
        match self.truncation_cell(cell) {
            Some((patch, tc)) => patch.face_count(tc),
            None => self.faces_per_cell.sub_array_len(cell),
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
                let count = self.faces_per_cell.sub_array_len(cell);
                if local_face >= count {
                    out_of_range(local_face, count);
                }
                self.cell_face_is_right_handed[self.faces_per_cell.sub_array_offset(cell) + local_face]
            }
        }
    }
}

impl PartialEq for UnstructuredGridTopology {
    fn eq(&self, other: &Self) -> bool {
        self.node_count == other.node_count
            && self.nodes_per_face == other.nodes_per_face
            && self.faces_per_cell == other.faces_per_cell
            && self.cell_face_is_right_handed == other.cell_face_is_right_handed
            && self.cell_shape == other.cell_shape
            && self.split_nodes == other.split_nodes
            && self.split_faces == other.split_faces
            && self.split_edges == other.split_edges
            && self.truncation == other.truncation
            && self.subnodes == other.subnodes
    }
}

/// An unstructured topology with its node geometry.
#[derive(Debug, Clone, PartialEq)]
pub struct UnstructuredGrid {
    topology: UnstructuredGridTopology,
    /// Base and split nodes.
    points: Point3dArray,
    cell_geometry_is_defined: Option<BooleanArray>,
    truncation_points: Option<Point3dArray>,
}

impl UnstructuredGrid {
    pub fn try_new(topology: UnstructuredGridTopology, points: Point3dArray) -> Result<Self> {
        let expected = topology.base_node_count() + topology.split_node_count();
        if points.len() != expected {
            return Err(Error::structural(
                "unstructured grid geometry",
                format!("{} points for {expected} base and split nodes", points.len()),
            ));
        }
        Ok(Self {
            topology,
            points,
            cell_geometry_is_defined: None,
            truncation_points: None,
        })
    }

    pub fn with_cell_geometry_is_defined(mut self, flags: BooleanArray) -> Result<Self> {
        flags.expect_len(self.topology.cell_count(), "cell geometry flags")?;
        self.cell_geometry_is_defined = Some(flags);
        Ok(self)
    }

    pub fn with_truncation_points(mut self, points: Point3dArray) -> Result<Self> {
        let expected = self.topology.truncation_node_count();
        if self.topology.truncation().is_none() || points.len() != expected {
            return Err(Error::structural(
                "unstructured grid geometry",
                format!("{} truncation points for {expected} truncation nodes", points.len()),
            ));
        }
        self.truncation_points = Some(points);
        Ok(self)
    }

    pub fn topology(&self) -> &UnstructuredGridTopology {
        &self.topology
    }

    pub fn points(&self) -> &Point3dArray {
        &self.points
    }

    /// Whether a cell carries geometry; cells are defined unless flagged
    /// otherwise.
    pub fn cell_geometry_is_defined(&self, cell: usize, store: &dyn ExternalStore) -> Result<bool> {
        check_cell(cell, self.topology.cell_count());
        match &self.cell_geometry_is_defined {
            Some(flags) => flags.get(cell, store),
            None => Ok(true),
        }
    }

    /// Resolves node points and flags for geometry queries.
    pub fn resolve(
        &self,
        ctx: &ResolveContext<'_>,
    ) -> Result<GridGeometry<'_, UnstructuredGridTopology>> {
        let nodes = self.points.resolve(ctx)?;
        let truncation_nodes = self
            .truncation_points
            .as_ref()
            .map(|points| points.resolve(ctx))
            .transpose()?;
        let cell_defined = match &self.cell_geometry_is_defined {
            Some(flags) => flags.materialize(ctx.store)?,
            None => vec![true; self.topology.cell_count()],
        };
        Ok(GridGeometry::new(&self.topology, nodes, truncation_nodes, cell_defined))
    }
}
