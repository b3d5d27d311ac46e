// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! RESQML-Lite Geometry
//!
//! Parametric lines (pillars, coordinate lines, trajectories), the line-array
//! variants that share them between representations, and Point3d arrays.
//! Uses nalgebra for points and vectors and rayon to evaluate large point
//! arrays.
//!
//! ```rust
//! use resqml_lite_geometry::{LineKind, ParametricLine, Point3};
//!
//! let line = ParametricLine::try_new(
//!     LineKind::NaturalCubic,
//!     vec![Point3::new(0.0, 0.0, 0.0), Point3::new(0.0, 0.0, 100.0)],
//!     None,
//!     None,
//! )
//! .unwrap();
//! assert_eq!(line.evaluate(0.25).z, 25.0);
//! ```

pub mod config;
pub mod context;
pub mod interpolation;
pub mod line;
pub mod line_array;
pub mod points;

// Re-export nalgebra types for convenience
pub use nalgebra::{Point3, Vector3};

pub use config::EvaluationConfig;
pub use context::{EmptyCatalog, RepresentationCatalog, ResolveContext, MAX_REFERENCE_DEPTH};
pub use line::{LineKind, ParametricLine};
pub use line_array::{
    ExplicitLineArray, ExplicitLineParts, ParametricLineArray, ResolvedLineArray,
    SupportingRepresentation,
};
pub use points::{
    ParametricPointsParts, Point3dArray, Point3dLatticeArray, Point3dOffset,
    Point3dParametricArray, Point3dZValueArray, ResolvedPoints,
};
pub use resqml_lite_core::{Error, Result};
