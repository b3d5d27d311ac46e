// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The contract shared by every grid topology, and cell geometry queries on
//! top of it.

use nalgebra::{Point3, Vector3};
use resqml_lite_geometry::ResolvedPoints;
use rustc_hash::FxHashMap;
use smallvec::SmallVec;

use crate::error::out_of_range;
use crate::geometry;

/// Node indices of one face, in winding order.
pub type FaceNodes = SmallVec<[usize; 8]>;

/// Cell, face and node relations of a grid.
///
/// Node indices use the extended indexing: base nodes, then split nodes,
/// then truncation nodes. Cell and local face indices past the end panic
/// with `OutOfRangeAccess`.
pub trait GridTopology {
    fn cell_count(&self) -> usize;

    /// Number of nodes in the extended indexing.
    fn node_count(&self) -> usize;

    fn cell_face_count(&self, cell: usize) -> usize;

    /// Nodes of local face `local_face` of `cell`, as seen by that cell
    /// (split nodes substituted).
    fn cell_face_nodes(&self, cell: usize, local_face: usize) -> FaceNodes;

    /// Whether the node winding of the face is right-handed with respect to
    /// the outward normal of `cell`.
    fn is_face_outward_right_handed(&self, cell: usize, local_face: usize) -> bool;

    /// Distinct nodes of a cell, in first-encounter order over its faces.
    fn cell_nodes(&self, cell: usize) -> Vec<usize> {
        let mut nodes = Vec::new();
        for face in 0..self.cell_face_count(cell) {
            for node in self.cell_face_nodes(cell, face) {
                if !nodes.contains(&node) {
                    nodes.push(node);
                }
            }
        }
        nodes
    }

    /// Whether the faces of a cell form a closed surface: every undirected
    /// edge of every face is used by exactly two faces.
    fn is_cell_closed(&self, cell: usize) -> bool {
        let face_count = self.cell_face_count(cell);
        if face_count == 0 {
            return false;
        }
        let mut uses: FxHashMap<(usize, usize), u32> = FxHashMap::default();
        for face in 0..face_count {
            let nodes = self.cell_face_nodes(cell, face);
            let n = nodes.len();
            for i in 0..n {
                let (a, b) = (nodes[i], nodes[(i + 1) % n]);
                if a == b {
                    continue;
                }
                *uses.entry((a.min(b), a.max(b))).or_insert(0) += 1;
            }
        }
        !uses.is_empty() && uses.values().all(|&count| count == 2)
    }
}

/// Checks a cell index against a cell count.
#[inline]
pub(crate) fn check_cell(cell: usize, cell_count: usize) {
    if cell >= cell_count {
        out_of_range(cell, cell_count);
    }
}

/// A grid topology with resolved node positions.
///
/// Geometry queries return `None` for cells whose geometry is not defined
/// and for cells touching a NaN node.
#[derive(Debug)]
pub struct GridGeometry<'g, T: GridTopology + ?Sized> {
    topology: &'g T,
    /// Base and split nodes.
    nodes: ResolvedPoints,
    truncation_nodes: Option<ResolvedPoints>,
    cell_defined: Vec<bool>,
}

impl<'g, T: GridTopology + ?Sized> GridGeometry<'g, T> {
    pub(crate) fn new(
        topology: &'g T,
        nodes: ResolvedPoints,
        truncation_nodes: Option<ResolvedPoints>,
        cell_defined: Vec<bool>,
    ) -> Self {
        debug_assert_eq!(cell_defined.len(), topology.cell_count());
        Self {
            topology,
            nodes,
            truncation_nodes,
            cell_defined,
        }
    }

    pub fn topology(&self) -> &'g T {
        self.topology
    }

    /// Position of a node in the extended indexing.
    pub fn node_point(&self, node: usize) -> Point3<f64> {
        let base = self.nodes.len();
        if node < base {
            return self.nodes.point(node);
        }
        match &self.truncation_nodes {
            Some(truncation) if node - base < truncation.len() => truncation.point(node - base),
            Some(truncation) => out_of_range(node, base + truncation.len()),
            None => out_of_range(node, base),
        }
    }

    pub fn cell_geometry_is_defined(&self, cell: usize) -> bool {
        check_cell(cell, self.cell_defined.len());
        self.cell_defined[cell]
    }

    fn finite_points(&self, nodes: impl IntoIterator<Item = usize>) -> Option<Vec<Point3<f64>>> {
        nodes
            .into_iter()
            .map(|n| {
                let p = self.node_point(n);
                p.iter().all(|c| c.is_finite()).then_some(p)
            })
            .collect()
    }

    /// Positions of the cell's nodes, in [`GridTopology::cell_nodes`] order.
    pub fn cell_corner_points(&self, cell: usize) -> Option<Vec<Point3<f64>>> {
        if !self.cell_geometry_is_defined(cell) {
            return None;
        }
        self.finite_points(self.topology.cell_nodes(cell))
    }

    /// Positions of a face's nodes in winding order.
    pub fn face_points(&self, cell: usize, local_face: usize) -> Option<Vec<Point3<f64>>> {
        if !self.cell_geometry_is_defined(cell) {
            return None;
        }
        self.finite_points(self.topology.cell_face_nodes(cell, local_face))
    }

    /// Unit normal of a face pointing out of `cell`.
    pub fn face_outward_normal(&self, cell: usize, local_face: usize) -> Option<Vector3<f64>> {
        let normal = geometry::polygon_normal(&self.face_points(cell, local_face)?)?;
        Some(if self.topology.is_face_outward_right_handed(cell, local_face) {
            normal
        } else {
            -normal
        })
    }

    pub fn face_area(&self, cell: usize, local_face: usize) -> Option<f64> {
        Some(geometry::polygon_area(&self.face_points(cell, local_face)?))
    }

    /// Average of the cell's node positions.
    pub fn cell_centroid(&self, cell: usize) -> Option<Point3<f64>> {
        geometry::centroid(&self.cell_corner_points(cell)?)
    }

    /// Volume enclosed by the cell's faces.
    pub fn cell_volume(&self, cell: usize) -> Option<f64> {
        if !self.cell_geometry_is_defined(cell) {
            return None;
        }
        let faces = (0..self.topology.cell_face_count(cell))
            .map(|f| {
                let points = self.finite_points(self.topology.cell_face_nodes(cell, f))?;
                Some((points, self.topology.is_face_outward_right_handed(cell, f)))
            })
            .collect::<Option<Vec<_>>>()?;
        Some(geometry::polyhedron_volume(
            faces.iter().map(|(points, outward)| (points.as_slice(), *outward)),
        ))
    }
}
