// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Host-ready geometry primitives and solid/non-solid partitioning.

use nalgebra::Point3;

use crate::mesh::TriMesh;

/// Volumes at or below this are not solids.
pub const MIN_SOLID_VOLUME: f64 = 1e-9;

/// Open or closed polyline in host units.
#[derive(Debug, Clone, PartialEq)]
pub struct Polyline {
    pub points: Vec<Point3<f64>>,
    pub closed: bool,
}

impl Polyline {
    pub fn length(&self) -> f64 {
        let open: f64 = self
            .points
            .windows(2)
            .map(|w| (w[1] - w[0]).norm())
            .sum();
        match (self.closed, self.points.first(), self.points.last()) {
            (true, Some(first), Some(last)) => open + (first - last).norm(),
            _ => open,
        }
    }
}

/// One converted piece of native geometry.
#[derive(Debug, Clone, PartialEq)]
pub enum Primitive {
    /// Closed shell enclosing a volume.
    Solid(TriMesh),
    /// Open shell or free surface.
    Surface(TriMesh),
    Curve(Polyline),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimitiveKind {
    Solid,
    Surface,
    Curve,
}

impl Primitive {
    /// Classify a mesh: closed with a non-empty volume is a solid, anything else a surface.
    pub fn from_mesh(mesh: TriMesh) -> Option<Self> {
        if mesh.is_empty() {
            None
        } else if mesh.is_closed() && mesh.volume() > MIN_SOLID_VOLUME {
            Some(Primitive::Solid(mesh))
        } else {
            Some(Primitive::Surface(mesh))
        }
    }

    pub fn kind(&self) -> PrimitiveKind {
        match self {
            Primitive::Solid(_) => PrimitiveKind::Solid,
            Primitive::Surface(_) => PrimitiveKind::Surface,
            Primitive::Curve(_) => PrimitiveKind::Curve,
        }
    }

    /// A non-empty closed volume.
    pub fn is_solid(&self) -> bool {
        matches!(self, Primitive::Solid(mesh) if mesh.volume() > MIN_SOLID_VOLUME)
    }
}

/// Converter output split the way hosts want it: one element per solid,
/// everything else merged into one shape.
#[derive(Debug, Default)]
pub struct Partition {
    pub solids: Vec<TriMesh>,
    pub non_solids: Vec<Primitive>,
}

/// Split primitives into solids and non-solids.
///
/// A `Solid` whose volume collapsed is demoted to a surface.
pub fn partition(primitives: Vec<Primitive>) -> Partition {
    let mut out = Partition::default();
    for primitive in primitives {
        match primitive {
            Primitive::Solid(mesh) if mesh.volume() > MIN_SOLID_VOLUME => out.solids.push(mesh),
            Primitive::Solid(mesh) => out.non_solids.push(Primitive::Surface(mesh)),
            other => out.non_solids.push(other),
        }
    }
    out
}
