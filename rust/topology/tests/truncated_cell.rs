// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use approx::assert_relative_eq;
use resqml_lite_core::JaggedArray;
use resqml_lite_geometry::{Point3, Point3dArray, ResolveContext};
use resqml_lite_topology::{
    ColumnLayerGrid, ColumnLayerTopology, Error, GridTopology, IjkFace, KDirection, PillarShape,
    TruncationCellPatchParts,
};

/// Unit cube cell with node (di, dj, dk) at index dk * 4 + dj * 2 + di.
fn unit_cube_points() -> Point3dArray {
    Point3dArray::Inline(
        (0..8)
            .map(|n| Point3::new((n & 1) as f64, ((n >> 1) & 1) as f64, ((n >> 2) & 1) as f64))
            .collect(),
    )
}

/// Cuts corner node 7 off the cell. Truncation nodes 8, 9 and 10 sit halfway
/// along the edges 3-7, 6-7 and 5-7. The K−, J− and I− faces are kept.
fn corner_cut() -> TruncationCellPatchParts {
    TruncationCellPatchParts {
        truncation_node_count: 3,
        truncation_face_count: 4,
        truncation_cell_count: 1,
        nodes_per_truncation_face: JaggedArray::from_nested(vec![
            vec![4, 5, 10, 9, 6],
            vec![1, 3, 8, 10, 5],
            vec![3, 2, 6, 9, 8],
            vec![8, 9, 10],
        ]),
        parent_cell_indices: vec![0],
        local_faces_per_cell: JaggedArray::from_nested(vec![vec![
            IjkFace::KMinus.local_face(),
            IjkFace::JMinus.local_face(),
            IjkFace::IMinus.local_face(),
        ]]),
        truncation_faces_per_cell: JaggedArray::from_nested(vec![vec![0, 1, 2, 3]]),
        truncation_cell_face_is_right_handed: vec![true; 7],
    }
}

#[test]
fn test_truncation_cell_is_closed() {
    let topology = ColumnLayerTopology::ijk(1, 1, 1)
        .unwrap()
        .with_truncation(corner_cut())
        .unwrap();
    assert!(topology.is_truncated(0));
    assert_eq!(topology.node_count(), 11);
    assert_eq!(topology.cell_face_count(0), 7);
    assert_eq!(topology.cell_face_nodes(0, 1).to_vec(), vec![0, 1, 5, 4]);
    assert_eq!(topology.cell_face_nodes(0, 6).to_vec(), vec![8, 9, 10]);
    assert!(topology.is_cell_closed(0));

    let nodes = topology.cell_nodes(0);
    assert_eq!(nodes.len(), 10);
    assert!(!nodes.contains(&7));
}

#[test]
fn test_truncation_cell_volume() {
    let topology = ColumnLayerTopology::ijk(1, 1, 1)
        .unwrap()
        .with_truncation(corner_cut())
        .unwrap();
    let grid = ColumnLayerGrid::try_new(
        topology,
        unit_cube_points(),
        PillarShape::Vertical,
        KDirection::Down,
    )
    .unwrap()
    .with_truncation_points(Point3dArray::Inline(vec![
        Point3::new(1.0, 1.0, 0.5),
        Point3::new(0.5, 1.0, 1.0),
        Point3::new(1.0, 0.5, 1.0),
    ]))
    .unwrap();

    let geometry = grid.resolve(&ResolveContext::detached()).unwrap();
    assert_relative_eq!(geometry.cell_volume(0).unwrap(), 47.0 / 48.0, epsilon = 1e-12);
    let cut = geometry.face_outward_normal(0, 6).unwrap();
    let diagonal = 1.0 / 3.0_f64.sqrt();
    assert_relative_eq!(cut.x, diagonal, epsilon = 1e-12);
    assert_relative_eq!(cut.z, diagonal, epsilon = 1e-12);
}

#[test]
fn test_open_truncation_cell_detected() {
    let mut parts = corner_cut();
    // Drop the cut triangle: the cell is no longer closed.
    parts.truncation_face_count = 3;
    parts.nodes_per_truncation_face = JaggedArray::from_nested(vec![
        vec![4, 5, 10, 9, 6],
        vec![1, 3, 8, 10, 5],
        vec![3, 2, 6, 9, 8],
    ]);
    parts.truncation_faces_per_cell = JaggedArray::from_nested(vec![vec![0, 1, 2]]);
    parts.truncation_cell_face_is_right_handed = vec![true; 6];
    let topology = ColumnLayerTopology::ijk(1, 1, 1)
        .unwrap()
        .with_truncation(parts)
        .unwrap();
    assert!(!topology.is_cell_closed(0));
}

#[test]
fn test_truncation_flag_count_checked() {
    let mut parts = corner_cut();
    parts.truncation_cell_face_is_right_handed.push(true);
    let err = ColumnLayerTopology::ijk(1, 1, 1)
        .unwrap()
        .with_truncation(parts)
        .unwrap_err();
    assert!(matches!(err, Error::StructuralInconsistency { .. }));
}
