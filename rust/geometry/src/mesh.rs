// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Triangle mesh with the analysis needed to tell solids from open shells

use bake_lite_core::MeshData;
use nalgebra::Point3;
use rustc_hash::FxHashMap;
use smallvec::SmallVec;

use crate::error::{Error, Result};

/// Positions closer than this are welded when checking closedness.
const WELD_TOLERANCE: f64 = 1e-9;

/// Indexed triangle mesh in host units
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TriMesh {
    pub positions: Vec<Point3<f64>>,
    pub triangles: Vec<[u32; 3]>,
}

impl TriMesh {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode count-prefixed polygon faces, fan triangulating n-gons.
    ///
    /// Coordinates are multiplied by `scale` on the way in.
    pub fn from_mesh_data(data: &MeshData, scale: f64) -> Result<Self> {
        if data.vertices.len() % 3 != 0 {
            return Err(Error::mesh(format!(
                "vertex buffer length {} is not a multiple of 3",
                data.vertices.len()
            )));
        }

        let positions: Vec<Point3<f64>> = data
            .vertices
            .chunks_exact(3)
            .map(|c| Point3::new(c[0] * scale, c[1] * scale, c[2] * scale))
            .collect();
        let vertex_count = positions.len() as u32;

        let mut triangles = Vec::with_capacity(data.faces.len() / 4);
        let mut i = 0;
        while i < data.faces.len() {
            let n = match data.faces[i] {
                0 => 3,
                1 => 4,
                n => n as usize,
            };
            if n < 3 {
                return Err(Error::mesh(format!("face at offset {} has {} vertices", i, n)));
            }
            let end = i + 1 + n;
            if end > data.faces.len() {
                return Err(Error::mesh(format!(
                    "face at offset {} runs past the end of the face list",
                    i
                )));
            }

            let polygon: SmallVec<[u32; 8]> = data.faces[i + 1..end].iter().copied().collect();
            if let Some(bad) = polygon.iter().find(|&&idx| idx >= vertex_count) {
                return Err(Error::mesh(format!(
                    "vertex index {} out of range ({} vertices)",
                    bad, vertex_count
                )));
            }

            for k in 1..n - 1 {
                let tri = [polygon[0], polygon[k], polygon[k + 1]];
                if tri[0] != tri[1] && tri[1] != tri[2] && tri[0] != tri[2] {
                    triangles.push(tri);
                }
            }
            i = end;
        }

        Ok(Self {
            positions,
            triangles,
        })
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.triangles.is_empty()
    }

    #[inline]
    pub fn triangle_count(&self) -> usize {
        self.triangles.len()
    }

    #[inline]
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    /// Signed volume via the divergence theorem. Positive for outward winding.
    pub fn signed_volume(&self) -> f64 {
        self.triangles
            .iter()
            .map(|&[a, b, c]| {
                let p0 = self.positions[a as usize].coords;
                let p1 = self.positions[b as usize].coords;
                let p2 = self.positions[c as usize].coords;
                p0.dot(&p1.cross(&p2))
            })
            .sum::<f64>()
            / 6.0
    }

    #[inline]
    pub fn volume(&self) -> f64 {
        self.signed_volume().abs()
    }

    /// Every edge shared by exactly two triangles, after welding coincident vertices.
    pub fn is_closed(&self) -> bool {
        if self.triangles.is_empty() {
            return false;
        }

        let canonical = self.welded_indices();
        let mut edge_uses: FxHashMap<(u32, u32), u32> = FxHashMap::default();
        for tri in &self.triangles {
            let [a, b, c] = tri.map(|i| canonical[i as usize]);
            for (u, v) in [(a, b), (b, c), (c, a)] {
                if u == v {
                    continue;
                }
                let key = if u < v { (u, v) } else { (v, u) };
                *edge_uses.entry(key).or_insert(0) += 1;
            }
        }

        edge_uses.values().all(|&uses| uses == 2)
    }

    /// Map each vertex to the first vertex at the same (quantized) position.
    fn welded_indices(&self) -> Vec<u32> {
        let mut first_at: FxHashMap<[i64; 3], u32> = FxHashMap::default();
        self.positions
            .iter()
            .enumerate()
            .map(|(i, p)| {
                let key = [
                    (p.x / WELD_TOLERANCE).round() as i64,
                    (p.y / WELD_TOLERANCE).round() as i64,
                    (p.z / WELD_TOLERANCE).round() as i64,
                ];
                *first_at.entry(key).or_insert(i as u32)
            })
            .collect()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use approx::assert_relative_eq;

    /// Closed unit cube, quads with outward winding.
    pub(crate) fn cube_data(size: f64) -> MeshData {
        let s = size;
        MeshData {
            vertices: vec![
                0.0, 0.0, 0.0, s, 0.0, 0.0, s, s, 0.0, 0.0, s, 0.0, //
                0.0, 0.0, s, s, 0.0, s, s, s, s, 0.0, s, s,
            ],
            faces: vec![
                4, 0, 3, 2, 1, // bottom
                4, 4, 5, 6, 7, // top
                4, 0, 1, 5, 4, // front
                4, 1, 2, 6, 5, // right
                4, 2, 3, 7, 6, // back
                4, 3, 0, 4, 7, // left
            ],
        }
    }

    #[test]
    fn cube_is_closed_with_unit_volume() {
        let mesh = TriMesh::from_mesh_data(&cube_data(1.0), 1.0).unwrap();
        assert_eq!(mesh.triangle_count(), 12);
        assert!(mesh.is_closed());
        assert_relative_eq!(mesh.signed_volume(), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn scale_applies_to_volume_cubically() {
        let mesh = TriMesh::from_mesh_data(&cube_data(1.0), 2.0).unwrap();
        assert_relative_eq!(mesh.volume(), 8.0, epsilon = 1e-12);
    }

    #[test]
    fn open_box_is_not_closed() {
        let mut data = cube_data(1.0);
        data.faces.truncate(25); // drop the left face
        let mesh = TriMesh::from_mesh_data(&data, 1.0).unwrap();
        assert!(!mesh.is_closed());
    }

    #[test]
    fn legacy_face_markers() {
        let data = MeshData {
            vertices: vec![0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 1.0, 1.0, 0.0, 0.0, 1.0, 0.0],
            faces: vec![0, 0, 1, 2, 1, 0, 1, 2, 3],
        };
        let mesh = TriMesh::from_mesh_data(&data, 1.0).unwrap();
        assert_eq!(mesh.triangle_count(), 3);
    }

    #[test]
    fn out_of_range_index_is_rejected() {
        let data = MeshData {
            vertices: vec![0.0; 9],
            faces: vec![3, 0, 1, 5],
        };
        assert!(matches!(
            TriMesh::from_mesh_data(&data, 1.0),
            Err(Error::InvalidMesh(_))
        ));
    }

    #[test]
    fn unwelded_cube_is_still_closed() {
        let welded = TriMesh::from_mesh_data(&cube_data(1.0), 1.0).unwrap();
        let mut split = TriMesh::new();
        for tri in &welded.triangles {
            let base = split.positions.len() as u32;
            split
                .positions
                .extend(tri.iter().map(|&i| welded.positions[i as usize]));
            split.triangles.push([base, base + 1, base + 2]);
        }
        assert!(split.is_closed());
    }
}
