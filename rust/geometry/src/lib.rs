// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Bake-Lite Geometry
//!
//! Numeric side of baking: splitting arbitrary affine placements into a rigid
//! transform plus mirror flags, and turning scene shape payloads into
//! classified primitives (solids, surfaces, curves) with nalgebra.

pub mod convert;
pub mod error;
pub mod mesh;
pub mod normalize;
pub mod primitive;

// Re-export nalgebra types for convenience
pub use nalgebra::{Matrix3, Matrix4, Point3, Vector3};

pub use bake_lite_core::scale_factor;
pub use convert::{GeometryConverter, ShapeConverter};
pub use error::{Error, Result};
pub use mesh::TriMesh;
pub use normalize::{
    is_rigid, matrix_from_row_major, mirror_state, normalize_placement, strip_scale_and_skew,
    Axis, MirrorFlags, NormalizedPlacement, Plane, RigidTransform, RIGID_TOLERANCE,
};
pub use primitive::{partition, Partition, Polyline, Primitive, PrimitiveKind};
