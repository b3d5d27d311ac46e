// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Column-layer grid geometry: node points, pillar shape and the flags that
//! say which pillars and cells carry geometry.

use resqml_lite_core::{ArrayAccess, BooleanArray, ExternalStore};
use resqml_lite_geometry::{Point3dArray, ResolveContext, ResolvedLineArray, SupportingRepresentation};
use serde::{Deserialize, Serialize};

use crate::column_layer::ColumnLayerTopology;
use crate::error::{out_of_range, Error, Result};
use crate::grid::{check_cell, GridGeometry, GridTopology};

const CONTEXT: &str = "column-layer grid geometry";

/// Shape of the pillars of a grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PillarShape {
    Vertical,
    #[default]
    Straight,
    Curved,
}

/// Direction in which K increases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KDirection {
    #[default]
    Down,
    Up,
    NotMonotonic,
}

/// A column-layer topology with its node geometry.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnLayerGrid {
    topology: ColumnLayerTopology,
    /// Base and split nodes.
    points: Point3dArray,
    pillar_shape: PillarShape,
    k_direction: KDirection,
    pillar_geometry_is_defined: Option<BooleanArray>,
    cell_geometry_is_defined: Option<BooleanArray>,
    truncation_points: Option<Point3dArray>,
}

impl ColumnLayerGrid {
    /// `points` holds one point per base and split node. Parametric points
    /// without line indices map node `n` to coordinate line
    /// `n % coordinate_line_count`.
    pub fn try_new(
        topology: ColumnLayerTopology,
        points: Point3dArray,
        pillar_shape: PillarShape,
        k_direction: KDirection,
    ) -> Result<Self> {
        let expected = topology.base_node_count() + topology.split_node_count();
        if points.len() != expected {
            return Err(Error::structural(
                CONTEXT,
                format!("{} points for {expected} base and split nodes", points.len()),
            ));
        }
        if let Some(count) = points.parametric_lines().and_then(|lines| lines.line_count()) {
            if count != topology.coordinate_line_count() {
                return Err(Error::structural(
                    CONTEXT,
                    format!(
                        "{count} parametric lines for {} coordinate lines",
                        topology.coordinate_line_count()
                    ),
                ));
            }
        }
        Ok(Self {
            topology,
            points,
            pillar_shape,
            k_direction,
            pillar_geometry_is_defined: None,
            cell_geometry_is_defined: None,
            truncation_points: None,
        })
    }

    /// Flags the pillars that carry geometry.
    pub fn with_pillar_geometry_is_defined(mut self, flags: BooleanArray) -> Result<Self> {
        flags.expect_len(self.topology.pillar_count(), "pillar geometry flags")?;
        self.pillar_geometry_is_defined = Some(flags);
        Ok(self)
    }

    /// Flags the cells that carry geometry.
    pub fn with_cell_geometry_is_defined(mut self, flags: BooleanArray) -> Result<Self> {
        flags.expect_len(self.topology.cell_count(), "cell geometry flags")?;
        self.cell_geometry_is_defined = Some(flags);
        Ok(self)
    }

    /// Points of the truncation nodes.
    pub fn with_truncation_points(mut self, points: Point3dArray) -> Result<Self> {
        let Some(patch) = self.topology.truncation() else {
            return Err(Error::structural(CONTEXT, "truncation points without a truncation patch"));
        };
        if points.len() != patch.truncation_node_count() {
            return Err(Error::structural(
                CONTEXT,
                format!(
                    "{} truncation points for {} truncation nodes",
                    points.len(),
                    patch.truncation_node_count()
                ),
            ));
        }
        self.truncation_points = Some(points);
        Ok(self)
    }

    pub fn topology(&self) -> &ColumnLayerTopology {
        &self.topology
    }

    pub fn points(&self) -> &Point3dArray {
        &self.points
    }

    pub fn pillar_shape(&self) -> PillarShape {
        self.pillar_shape
    }

    pub fn k_direction(&self) -> KDirection {
        self.k_direction
    }

    pub fn truncation_points(&self) -> Option<&Point3dArray> {
        self.truncation_points.as_ref()
    }

    /// Whether a pillar carries geometry. Pillars are defined unless flagged
    /// otherwise.
    pub fn pillar_geometry_is_defined(&self, pillar: usize, store: &dyn ExternalStore) -> Result<bool> {
        if pillar >= self.topology.pillar_count() {
            out_of_range(pillar, self.topology.pillar_count());
        }
        match &self.pillar_geometry_is_defined {
            Some(flags) => flags.get(pillar, store),
            None => Ok(true),
        }
    }

    /// Whether a cell carries geometry: its own flag and the flags of every
    /// pillar of its column must be set.
    pub fn cell_geometry_is_defined(&self, cell: usize, store: &dyn ExternalStore) -> Result<bool> {
        check_cell(cell, self.topology.cell_count());
        if let Some(flags) = &self.cell_geometry_is_defined {
            if !flags.get(cell, store)? {
                return Ok(false);
            }
        }
        let (_, column) = self.topology.cell_layer_column(cell);
        for &pillar in self.topology.column_pillars(column) {
            if !self.pillar_geometry_is_defined(pillar, store)? {
                return Ok(false);
            }
        }
        Ok(true)
    }

    fn cell_defined_flags(&self, store: &dyn ExternalStore) -> Result<Vec<bool>> {
        let mut defined = match &self.cell_geometry_is_defined {
            Some(flags) => flags.materialize(store)?,
            None => vec![true; self.topology.cell_count()],
        };
        if let Some(flags) = &self.pillar_geometry_is_defined {
            let pillars = flags.materialize(store)?;
            let column_count = self.topology.column_count();
            let column_defined: Vec<bool> = (0..column_count)
                .map(|c| self.topology.column_pillars(c).iter().all(|&p| pillars[p]))
                .collect();
            for (cell, flag) in defined.iter_mut().enumerate() {
                *flag &= column_defined[cell % column_count];
            }
        }
        Ok(defined)
    }

    /// Resolves node points and flags for geometry queries.
    pub fn resolve(&self, ctx: &ResolveContext<'_>) -> Result<GridGeometry<'_, ColumnLayerTopology>> {
        let nodes = self.points.resolve(ctx)?;
        let truncation_nodes = self
            .truncation_points
            .as_ref()
            .map(|points| points.resolve(ctx))
            .transpose()?;
        let cell_defined = self.cell_defined_flags(ctx.store)?;
        tracing::debug!(
            nodes = nodes.len(),
            undefined_cells = cell_defined.iter().filter(|&&d| !d).count(),
            "column-layer grid geometry resolved"
        );
        Ok(GridGeometry::new(&self.topology, nodes, truncation_nodes, cell_defined))
    }
}

impl SupportingRepresentation for ColumnLayerGrid {
    /// The coordinate lines of grids whose points lie on parametric lines.
    fn parametric_lines(&self, ctx: &ResolveContext<'_>) -> Result<ResolvedLineArray> {
        match self.points.parametric_lines() {
            Some(lines) => lines.resolve(ctx),
            None => Err(Error::unsupported(
                "supporting representation",
                "column-layer grid without parametric points",
            )),
        }
    }
}
