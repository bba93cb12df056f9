// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Scene container and lookups.
//!
//! The [`Scene`] owns every definition, instance, geometry object and material
//! binding of one bake operation, keyed by [`SourceId`]. Insertion order is
//! remembered so that processing stays deterministic when ordering keys tie.

use rustc_hash::{FxHashMap, FxHashSet};
use smallvec::SmallVec;

use crate::error::{Error, Result};
use crate::model::*;

/// Ordered list of collection (layer) names an object lives under.
pub type CollectionPath = SmallVec<[String; 4]>;

/// A top-level item handed to the ordering index.
#[derive(Debug, Clone, Copy)]
pub enum SceneItem<'a> {
    Definition(&'a Definition),
    Instance(&'a Instance),
}

impl<'a> SceneItem<'a> {
    pub fn id(&self) -> &'a SourceId {
        match self {
            SceneItem::Definition(d) => &d.id,
            SceneItem::Instance(i) => &i.id,
        }
    }

    pub fn depth(&self) -> u32 {
        match self {
            SceneItem::Definition(d) => d.depth,
            SceneItem::Instance(i) => i.depth,
        }
    }

    pub fn is_definition(&self) -> bool {
        matches!(self, SceneItem::Definition(_))
    }
}

#[derive(Debug, Clone)]
enum ItemRef {
    Definition(SourceId),
    Instance(SourceId),
}

/// Serializable flat form of a scene, as produced by an upstream collector.
#[derive(Debug, Clone, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SceneFile {
    #[cfg_attr(feature = "serde", serde(default))]
    pub definitions: Vec<Definition>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub instances: Vec<Instance>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub geometry: Vec<GeometryObject>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub materials: Vec<MaterialBinding>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub collections: Vec<CollectionAssignment>,
}

/// Collection path of one object.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CollectionAssignment {
    pub object_id: SourceId,
    pub path: CollectionPath,
}

/// All input data of one bake operation.
#[derive(Debug, Default)]
pub struct Scene {
    definitions: FxHashMap<SourceId, Definition>,
    instances: FxHashMap<SourceId, Instance>,
    geometry: FxHashMap<SourceId, GeometryObject>,
    materials: FxHashMap<SourceId, MaterialBinding>,
    collection_paths: FxHashMap<SourceId, CollectionPath>,
    /// Instance ids listed as members of some definition.
    nested: FxHashSet<SourceId>,
    order: Vec<ItemRef>,
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_definition(&mut self, definition: Definition) -> Result<()> {
        if self.is_taken(&definition.id) {
            return Err(Error::DuplicateId(definition.id));
        }
        for nested in definition.nested_instance_ids() {
            self.nested.insert(nested.clone());
        }
        self.order.push(ItemRef::Definition(definition.id.clone()));
        self.definitions.insert(definition.id.clone(), definition);
        Ok(())
    }

    pub fn add_instance(&mut self, instance: Instance) -> Result<()> {
        if self.is_taken(&instance.id) {
            return Err(Error::DuplicateId(instance.id));
        }
        self.order.push(ItemRef::Instance(instance.id.clone()));
        self.instances.insert(instance.id.clone(), instance);
        Ok(())
    }

    /// Definitions and instances share one id space.
    fn is_taken(&self, id: &SourceId) -> bool {
        self.definitions.contains_key(id) || self.instances.contains_key(id)
    }

    pub fn add_geometry(&mut self, object: GeometryObject) -> Result<()> {
        if self.geometry.contains_key(&object.id) {
            return Err(Error::DuplicateId(object.id));
        }
        self.geometry.insert(object.id.clone(), object);
        Ok(())
    }

    pub fn add_material(&mut self, material: MaterialBinding) {
        self.materials.insert(material.id.clone(), material);
    }

    pub fn set_collection_path<I, S>(&mut self, object_id: impl Into<SourceId>, path: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.collection_paths
            .insert(object_id.into(), path.into_iter().map(Into::into).collect());
    }

    /// Checks that every cross reference resolves.
    pub fn validate(&self) -> Result<()> {
        for def in self.definitions.values() {
            for nested in def.nested_instance_ids() {
                if !self.instances.contains_key(nested) {
                    return Err(Error::UnknownNestedInstance {
                        definition: def.id.clone(),
                        instance: nested.clone(),
                    });
                }
            }
        }
        for inst in self.instances.values() {
            if !self.definitions.contains_key(&inst.definition_id) {
                return Err(Error::UnknownDefinition {
                    instance: inst.id.clone(),
                    definition: inst.definition_id.clone(),
                });
            }
        }
        Ok(())
    }

    pub fn definition(&self, id: &SourceId) -> Option<&Definition> {
        self.definitions.get(id)
    }

    pub fn instance(&self, id: &SourceId) -> Option<&Instance> {
        self.instances.get(id)
    }

    pub fn geometry(&self, id: &SourceId) -> Option<&GeometryObject> {
        self.geometry.get(id)
    }

    /// Resolves the material binding of a geometry object, if any.
    pub fn material_for(&self, object: &GeometryObject) -> Option<&MaterialBinding> {
        object
            .material_id
            .as_ref()
            .and_then(|id| self.materials.get(id))
    }

    pub fn collection_path(&self, object_id: &SourceId) -> Option<&CollectionPath> {
        self.collection_paths.get(object_id)
    }

    /// Whether an instance is placed inside a definition rather than the document.
    pub fn is_nested(&self, instance_id: &SourceId) -> bool {
        self.nested.contains(instance_id)
    }

    pub fn definition_count(&self) -> usize {
        self.definitions.len()
    }

    pub fn instance_count(&self) -> usize {
        self.instances.len()
    }

    /// Definitions and document-level instances, in insertion order.
    ///
    /// Nested instances are left out: they are placed by the definition that owns them.
    pub fn top_level_items(&self) -> Vec<SceneItem<'_>> {
        self.order
            .iter()
            .filter_map(|item| match item {
                ItemRef::Definition(id) => self.definitions.get(id).map(SceneItem::Definition),
                ItemRef::Instance(id) if !self.is_nested(id) => {
                    self.instances.get(id).map(SceneItem::Instance)
                }
                ItemRef::Instance(_) => None,
            })
            .collect()
    }
}

impl TryFrom<SceneFile> for Scene {
    type Error = Error;

    fn try_from(file: SceneFile) -> Result<Self> {
        let mut scene = Scene::new();
        for def in file.definitions {
            scene.add_definition(def)?;
        }
        for inst in file.instances {
            scene.add_instance(inst)?;
        }
        for object in file.geometry {
            scene.add_geometry(object)?;
        }
        for material in file.materials {
            scene.add_material(material);
        }
        for assignment in file.collections {
            scene
                .collection_paths
                .insert(assignment.object_id, assignment.path);
        }
        scene.validate()?;
        Ok(scene)
    }
}
