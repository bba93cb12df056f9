// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Shape payload conversion into host primitives.

use bake_lite_core::{GeometryObject, MeshData, Shape};
use nalgebra::Point3;

use crate::error::{Error, Result};
use crate::mesh::TriMesh;
use crate::primitive::{Polyline, Primitive};

/// Converts scene geometry into native primitives.
///
/// Implementations only convert the object's own shape payload; mesh and
/// display-value fallbacks are driven by the caller. An empty result means
/// "nothing convertible here", not an error.
pub trait GeometryConverter {
    /// Convert the object's shape payload. `scale` converts source lengths to host units.
    fn convert(&mut self, object: &GeometryObject, scale: f64) -> Result<Vec<Primitive>>;

    /// Convert an explicit mesh representation.
    fn convert_mesh(&mut self, mesh: &MeshData, scale: f64) -> Result<Vec<Primitive>> {
        Ok(Primitive::from_mesh(TriMesh::from_mesh_data(mesh, scale)?)
            .into_iter()
            .collect())
    }
}

/// Default converter for the payloads defined in `bake_lite_core::Shape`.
#[derive(Debug, Default, Clone, Copy)]
pub struct ShapeConverter;

impl ShapeConverter {
    pub fn new() -> Self {
        Self
    }
}

#[inline]
fn point(p: &[f64; 3], scale: f64) -> Point3<f64> {
    Point3::new(p[0] * scale, p[1] * scale, p[2] * scale)
}

impl GeometryConverter for ShapeConverter {
    fn convert(&mut self, object: &GeometryObject, scale: f64) -> Result<Vec<Primitive>> {
        match &object.shape {
            Shape::Brep { lumps } => {
                let mut out = Vec::with_capacity(lumps.len());
                for lump in lumps {
                    out.extend(self.convert_mesh(lump, scale)?);
                }
                Ok(out)
            }
            Shape::Mesh(mesh) => self.convert_mesh(mesh, scale),
            Shape::Polyline { points, closed } => {
                if points.len() < 2 {
                    return Err(Error::DegenerateCurve(format!(
                        "polyline {} has {} points",
                        object.id,
                        points.len()
                    )));
                }
                let polyline = Polyline {
                    points: points.iter().map(|p| point(p, scale)).collect(),
                    closed: *closed,
                };
                if polyline.length() <= 0.0 {
                    return Err(Error::DegenerateCurve(format!(
                        "polyline {} has zero length",
                        object.id
                    )));
                }
                Ok(vec![Primitive::Curve(polyline)])
            }
            Shape::Line { start, end } => {
                if start == end {
                    return Err(Error::DegenerateCurve(format!(
                        "line {} has zero length",
                        object.id
                    )));
                }
                Ok(vec![Primitive::Curve(Polyline {
                    points: vec![point(start, scale), point(end, scale)],
                    closed: false,
                })])
            }
            Shape::Unsupported { .. } => Ok(Vec::new()),
        }
    }
}
