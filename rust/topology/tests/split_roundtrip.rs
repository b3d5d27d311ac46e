// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use proptest::prelude::*;
use resqml_lite_core::JaggedArray;
use resqml_lite_topology::{ColumnLayerTopology, GridTopology, SplitElements};

/// Splits every selected pillar for all of its columns but the first, then
/// gives every selected cell its own copy of its first top corner.
fn faulted_grid(
    ni: usize,
    nj: usize,
    nk: usize,
    pillar_mask: &[bool],
    cell_mask: &[bool],
) -> ColumnLayerTopology {
    let base = ColumnLayerTopology::ijk(ni, nj, nk).unwrap();

    let mut parents = Vec::new();
    let mut owners = Vec::new();
    for pillar in (0..base.pillar_count()).filter(|&p| pillar_mask[p % pillar_mask.len()]) {
        let columns: Vec<usize> = (0..base.column_count())
            .filter(|&c| base.column_pillars(c).contains(&pillar))
            .skip(1)
            .collect();
        if !columns.is_empty() {
            parents.push(pillar);
            owners.push(columns);
        }
    }
    let grid = base
        .with_split_coordinate_lines(parents, JaggedArray::from_nested(owners))
        .unwrap();

    let cells: Vec<usize> = (0..grid.cell_count())
        .filter(|&c| cell_mask[c % cell_mask.len()])
        .collect();
    let nodes = cells.iter().map(|&c| grid.corner_node(c, 0, false)).collect();
    let owners = JaggedArray::from_nested(cells.iter().map(|&c| vec![c]));
    grid.with_split_nodes(nodes, owners).unwrap()
}

fn assert_same_split(a: Option<&SplitElements>, b: Option<&SplitElements>) {
    let (a, b) = (a.unwrap(), b.unwrap());
    assert_eq!(a.parent_indices(), b.parent_indices());
    for split in 0..a.len() {
        assert_eq!(a.owners_of(split), b.owners_of(split));
    }
}

#[test]
fn test_split_pillars_and_nodes_roundtrip() {
    let grid = faulted_grid(3, 2, 2, &[false, true], &[true, false, false]);
    let split_lines = grid.split_coordinate_lines().unwrap();
    assert!(!split_lines.is_empty());
    assert_eq!(
        grid.coordinate_line_count(),
        grid.pillar_count() + split_lines.len()
    );
    assert_eq!(grid.split_node_count(), 4);

    let restored = ColumnLayerTopology::from_json(&grid.to_json().unwrap()).unwrap();
    assert_eq!(restored, grid);
    assert_same_split(grid.split_coordinate_lines(), restored.split_coordinate_lines());
    assert_same_split(grid.split_nodes(), restored.split_nodes());
    for cell in 0..grid.cell_count() {
        assert_eq!(restored.cell_nodes(cell), grid.cell_nodes(cell));
        assert!(restored.is_cell_closed(cell));
    }
}

proptest! {
    #[test]
    fn prop_split_roundtrip_preserves_owners(
        ni in 1usize..4,
        nj in 1usize..4,
        nk in 1usize..3,
        pillar_mask in prop::collection::vec(any::<bool>(), 1..6),
        cell_mask in prop::collection::vec(any::<bool>(), 1..6),
    ) {
        let grid = faulted_grid(ni, nj, nk, &pillar_mask, &cell_mask);
        let restored = ColumnLayerTopology::from_json(&grid.to_json().unwrap()).unwrap();
        prop_assert_eq!(restored.node_count(), grid.node_count());
        prop_assert_eq!(restored.split_coordinate_lines(), grid.split_coordinate_lines());
        prop_assert_eq!(restored.split_nodes(), grid.split_nodes());
    }
}
