// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Scene entities: definitions, instances, geometry payloads and material bindings.

use std::fmt;

/// Stable identifier of a scene item, as assigned by the source application.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(transparent)
)]
pub struct SourceId(pub String);

impl SourceId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SourceId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for SourceId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// One entry of a definition's ordered member list.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(tag = "kind", content = "id", rename_all = "snake_case")
)]
pub enum Member {
    /// Plain geometry, resolved through the scene's geometry table.
    Geometry(SourceId),
    /// A nested placement of another definition.
    Instance(SourceId),
}

/// A reusable, named template made of geometry and nested instances.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Definition {
    pub id: SourceId,
    pub name: String,
    /// Host category the template is created for. `None` uses the configured default.
    #[cfg_attr(feature = "serde", serde(default))]
    pub category: Option<String>,
    pub members: Vec<Member>,
    /// Maximum distance to any leaf geometry. Plain-geometry definitions have depth 0.
    #[cfg_attr(feature = "serde", serde(default))]
    pub depth: u32,
}

impl Definition {
    pub fn new(id: impl Into<SourceId>, name: impl Into<String>, members: Vec<Member>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            category: None,
            members,
            depth: 0,
        }
    }

    pub fn with_depth(mut self, depth: u32) -> Self {
        self.depth = depth;
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    /// Ids of nested instance members, in member order.
    pub fn nested_instance_ids(&self) -> impl Iterator<Item = &SourceId> {
        self.members.iter().filter_map(|m| match m {
            Member::Instance(id) => Some(id),
            Member::Geometry(_) => None,
        })
    }
}

/// A placement of one definition.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Instance {
    pub id: SourceId,
    pub definition_id: SourceId,
    /// Homogeneous 4x4 affine transform, row-major.
    pub transform: [f64; 16],
    /// Length unit of the transform's translation.
    #[cfg_attr(feature = "serde", serde(default = "default_units"))]
    pub units: String,
    #[cfg_attr(feature = "serde", serde(default))]
    pub depth: u32,
}

#[cfg(feature = "serde")]
fn default_units() -> String {
    "m".to_string()
}

impl Instance {
    /// Row-major identity transform.
    pub const IDENTITY: [f64; 16] = [
        1.0, 0.0, 0.0, 0.0, //
        0.0, 1.0, 0.0, 0.0, //
        0.0, 0.0, 1.0, 0.0, //
        0.0, 0.0, 0.0, 1.0,
    ];

    pub fn new(
        id: impl Into<SourceId>,
        definition_id: impl Into<SourceId>,
        transform: [f64; 16],
    ) -> Self {
        Self {
            id: id.into(),
            definition_id: definition_id.into(),
            transform,
            units: "m".to_string(),
            depth: 0,
        }
    }

    pub fn with_depth(mut self, depth: u32) -> Self {
        self.depth = depth;
        self
    }

    pub fn with_units(mut self, units: impl Into<String>) -> Self {
        self.units = units.into();
        self
    }
}

/// Flat triangle/polygon mesh.
///
/// `faces` uses count-prefixed polygons: each face starts with its vertex
/// count followed by that many vertex indices. The legacy markers `0` and `1`
/// stand for a triangle and a quad respectively.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MeshData {
    /// Packed vertex coordinates (x, y, z).
    pub vertices: Vec<f64>,
    pub faces: Vec<u32>,
}

impl MeshData {
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty() || self.faces.is_empty()
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len() / 3
    }
}

/// Shape payload of a geometry object.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(tag = "type", rename_all = "snake_case")
)]
pub enum Shape {
    /// Boundary representation, pre-tessellated one mesh per lump.
    Brep { lumps: Vec<MeshData> },
    Mesh(MeshData),
    Polyline {
        points: Vec<[f64; 3]>,
        #[cfg_attr(feature = "serde", serde(default))]
        closed: bool,
    },
    Line { start: [f64; 3], end: [f64; 3] },
    /// A payload kind the converter does not know; only fallbacks can bake it.
    Unsupported { kind: String },
}

/// Abstract shape payload plus the hints needed to bake it.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GeometryObject {
    pub id: SourceId,
    pub shape: Shape,
    /// Length unit of the coordinates. `None` uses the operation default.
    #[cfg_attr(feature = "serde", serde(default))]
    pub units: Option<String>,
    /// Explicit mesh representation, tried when direct conversion yields nothing.
    #[cfg_attr(feature = "serde", serde(default))]
    pub mesh: Option<MeshData>,
    /// Simpler display geometry, tried last.
    #[cfg_attr(feature = "serde", serde(default))]
    pub display_value: Vec<GeometryObject>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub subcategory: Option<String>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub material_id: Option<SourceId>,
}

impl GeometryObject {
    pub fn new(id: impl Into<SourceId>, shape: Shape) -> Self {
        Self {
            id: id.into(),
            shape,
            units: None,
            mesh: None,
            display_value: Vec::new(),
            subcategory: None,
            material_id: None,
        }
    }
}

/// A render material resolved by the upstream collector.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MaterialBinding {
    pub id: SourceId,
    pub name: String,
    /// Packed 0xRRGGBB diffuse color.
    #[cfg_attr(feature = "serde", serde(default))]
    pub color: Option<u32>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub opacity: Option<f64>,
}
