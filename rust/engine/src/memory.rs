// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! In-memory host document.
//!
//! Implements [`HostDocument`] without a host application: templates,
//! elements, placements and groups are recorded in maps so a bake can be
//! dry-run and inspected. Host behaviour that matters to the engine is
//! modelled: missing blank resources, categories rejected for shape
//! elements, and objects that must be regenerated before they can be
//! mirrored.

use std::collections::BTreeMap;

use bake_lite_core::MaterialBinding;
use bake_lite_geometry::{Plane, Primitive, PrimitiveKind, RigidTransform, TriMesh};
use nalgebra::Matrix4;
use rustc_hash::{FxHashMap, FxHashSet};

use crate::grouping::sanitize_name;
use crate::host::{
    HostDocument, HostError, HostErrorKind, HostResult, LoadedTemplate, NativeId, PlacementTarget,
    TemplateDraft,
};

/// What a recorded element is.
#[derive(Debug, Clone, PartialEq)]
pub enum ElementKind {
    Solid {
        triangles: usize,
        volume: f64,
        subcategory: Option<String>,
        material: Option<NativeId>,
    },
    Shape {
        category: String,
        curves: usize,
        surfaces: usize,
    },
    Instance {
        template: NativeId,
        variant: NativeId,
        /// Placement followed by any mirrors applied since.
        transform: Matrix4<f64>,
        mirrors: usize,
    },
    Group {
        name: Option<String>,
        members: Vec<NativeId>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct MemoryElement {
    pub id: NativeId,
    pub owner: PlacementTarget,
    pub kind: ElementKind,
}

/// A template, from blank draft to published.
#[derive(Debug, Clone)]
pub struct MemoryTemplate {
    pub draft: NativeId,
    pub category: String,
    pub name: Option<String>,
    pub loaded: Option<LoadedTemplate>,
}

/// Number of calls per host operation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CallCounts {
    pub create_template: usize,
    pub publish_template: usize,
    pub add_solid: usize,
    pub add_shape: usize,
    pub place: usize,
    pub regenerate: usize,
    pub mirror: usize,
    pub create_group: usize,
    pub rename_group: usize,
}

#[derive(Debug, Default)]
pub struct MemoryDocument {
    next_id: u64,
    elements: BTreeMap<NativeId, MemoryElement>,
    templates: BTreeMap<NativeId, MemoryTemplate>,
    /// Loaded template id -> draft id.
    published: FxHashMap<NativeId, NativeId>,
    material_parameters: FxHashMap<(NativeId, String), NativeId>,
    /// Placed objects not yet regenerated.
    uncommitted: FxHashSet<NativeId>,
    calls: CallCounts,

    missing_resources: FxHashSet<String>,
    rejected_shape_categories: FxHashSet<String>,
    unresolvable_materials: FxHashSet<String>,
    failing_publish: FxHashSet<String>,
    /// 1-based `add_solid` attempts that fail.
    failing_solids: FxHashSet<usize>,
    solid_attempts: usize,
    fail_mirrors: bool,
    fail_regenerate: bool,
}

impl MemoryDocument {
    pub fn new() -> Self {
        Self::default()
    }

    /// No blank template resource exists for `category`.
    pub fn with_missing_resource(mut self, category: impl Into<String>) -> Self {
        self.missing_resources.insert(category.into());
        self
    }

    /// Shape elements may not use `category`.
    pub fn rejecting_shape_category(mut self, category: impl Into<String>) -> Self {
        self.rejected_shape_categories.insert(category.into());
        self
    }

    /// Material bindings with this name never resolve to a parameter.
    pub fn with_unresolvable_material(mut self, name: impl Into<String>) -> Self {
        self.unresolvable_materials.insert(name.into());
        self
    }

    /// Publishing a template with this name fails.
    pub fn with_failing_publish(mut self, name: impl Into<String>) -> Self {
        self.failing_publish.insert(name.into());
        self
    }

    /// The `attempt`-th call to `add_solid` (counting from 1) fails.
    pub fn with_failing_solid(mut self, attempt: usize) -> Self {
        self.failing_solids.insert(attempt);
        self
    }

    /// Every regenerate call fails.
    pub fn with_failing_regenerate(mut self) -> Self {
        self.fail_regenerate = true;
        self
    }

    /// Every mirror call fails.
    pub fn with_failing_mirrors(mut self) -> Self {
        self.fail_mirrors = true;
        self
    }

    pub fn calls(&self) -> CallCounts {
        self.calls
    }

    pub fn element(&self, id: NativeId) -> Option<&MemoryElement> {
        self.elements.get(&id)
    }

    /// Elements owned by a target, in creation order.
    pub fn elements_in(&self, owner: PlacementTarget) -> impl Iterator<Item = &MemoryElement> {
        self.elements.values().filter(move |e| e.owner == owner)
    }

    pub fn template_count(&self) -> usize {
        self.templates.len()
    }

    /// Template draft record for a published template id.
    pub fn template(&self, loaded: NativeId) -> Option<&MemoryTemplate> {
        self.published
            .get(&loaded)
            .and_then(|draft| self.templates.get(draft))
    }

    pub fn templates(&self) -> impl Iterator<Item = &MemoryTemplate> {
        self.templates.values()
    }

    pub fn groups(&self) -> impl Iterator<Item = &MemoryElement> {
        self.elements
            .values()
            .filter(|e| matches!(e.kind, ElementKind::Group { .. }))
    }

    fn allocate(&mut self) -> NativeId {
        self.next_id += 1;
        NativeId(self.next_id)
    }

    fn insert(&mut self, owner: PlacementTarget, kind: ElementKind) -> NativeId {
        let id = self.allocate();
        self.elements.insert(id, MemoryElement { id, owner, kind });
        id
    }

    fn open_draft(&self, draft: &TemplateDraft) -> HostResult<()> {
        match self.templates.get(&draft.id) {
            Some(t) if t.loaded.is_none() => Ok(()),
            Some(_) => Err(HostError::invalid_operation(format!(
                "template {} is already published",
                draft.id
            ))),
            None => Err(HostError::invalid_argument(format!("unknown template {}", draft.id))),
        }
    }

    fn check_target(&self, target: PlacementTarget) -> HostResult<()> {
        match target {
            PlacementTarget::Document => Ok(()),
            PlacementTarget::Template(draft) => match self.templates.get(&draft) {
                Some(t) if t.loaded.is_none() => Ok(()),
                _ => Err(HostError::invalid_argument(format!("{} is not an open template", draft))),
            },
        }
    }
}

impl HostDocument for MemoryDocument {
    fn create_template(&mut self, category: &str) -> HostResult<TemplateDraft> {
        if self.missing_resources.contains(category) {
            return Err(HostError::new(
                HostErrorKind::ResourceMissing,
                format!("no blank template for category '{}'", category),
            ));
        }
        self.calls.create_template += 1;
        let id = self.allocate();
        self.templates.insert(
            id,
            MemoryTemplate {
                draft: id,
                category: category.to_string(),
                name: None,
                loaded: None,
            },
        );
        Ok(TemplateDraft {
            id,
            category: category.to_string(),
        })
    }

    fn add_solid(
        &mut self,
        draft: &TemplateDraft,
        solid: &TriMesh,
        subcategory: Option<&str>,
    ) -> HostResult<NativeId> {
        self.open_draft(draft)?;
        if solid.is_empty() {
            return Err(HostError::invalid_argument("solid has no faces"));
        }
        self.solid_attempts += 1;
        if self.failing_solids.contains(&self.solid_attempts) {
            return Err(HostError::new(
                HostErrorKind::Other,
                "free-form element could not be created",
            ));
        }
        self.calls.add_solid += 1;
        Ok(self.insert(
            PlacementTarget::Template(draft.id),
            ElementKind::Solid {
                triangles: solid.triangle_count(),
                volume: solid.volume(),
                subcategory: subcategory.map(str::to_string),
                material: None,
            },
        ))
    }

    fn resolve_material(
        &mut self,
        draft: &TemplateDraft,
        material: &MaterialBinding,
    ) -> Option<NativeId> {
        if material.name.is_empty() || self.unresolvable_materials.contains(&material.name) {
            return None;
        }
        let key = (draft.id, material.name.clone());
        if let Some(&param) = self.material_parameters.get(&key) {
            return Some(param);
        }
        let param = self.allocate();
        self.material_parameters.insert(key, param);
        Some(param)
    }

    fn associate_material(&mut self, element: NativeId, parameter: NativeId) -> HostResult<()> {
        match self.elements.get_mut(&element) {
            Some(MemoryElement {
                kind: ElementKind::Solid { material, .. },
                ..
            }) => {
                *material = Some(parameter);
                Ok(())
            }
            _ => Err(HostError::invalid_argument(format!(
                "{} cannot carry a material",
                element
            ))),
        }
    }

    fn add_shape(
        &mut self,
        draft: &TemplateDraft,
        category: &str,
        primitives: &[Primitive],
    ) -> HostResult<NativeId> {
        self.open_draft(draft)?;
        if self.rejected_shape_categories.contains(category) {
            return Err(HostError::invalid_argument(format!(
                "category '{}' is not valid for shape elements",
                category
            )));
        }
        self.calls.add_shape += 1;
        let count = |kind: PrimitiveKind| primitives.iter().filter(|p| p.kind() == kind).count();
        let curves = count(PrimitiveKind::Curve);
        let surfaces = count(PrimitiveKind::Surface) + count(PrimitiveKind::Solid);
        Ok(self.insert(
            PlacementTarget::Template(draft.id),
            ElementKind::Shape {
                category: category.to_string(),
                curves,
                surfaces,
            },
        ))
    }

    fn publish_template(&mut self, draft: TemplateDraft, name: &str) -> HostResult<LoadedTemplate> {
        self.open_draft(&draft)?;
        if sanitize_name(name) != name {
            return Err(HostError::invalid_argument(format!("invalid template name '{}'", name)));
        }
        if self.failing_publish.contains(name) {
            self.templates.remove(&draft.id);
            return Err(HostError::new(
                HostErrorKind::Other,
                format!("could not save template '{}'", name),
            ));
        }
        self.calls.publish_template += 1;

        let loaded = LoadedTemplate {
            template: self.allocate(),
            variant: self.allocate(),
        };
        if let Some(t) = self.templates.get_mut(&draft.id) {
            t.name = Some(name.to_string());
            t.loaded = Some(loaded);
        }
        self.published.insert(loaded.template, draft.id);
        Ok(loaded)
    }

    fn place(
        &mut self,
        target: PlacementTarget,
        template: &LoadedTemplate,
        transform: &RigidTransform,
    ) -> HostResult<NativeId> {
        self.check_target(target)?;
        if !self.published.contains_key(&template.template) {
            return Err(HostError::invalid_argument(format!(
                "template {} is not loaded",
                template.template
            )));
        }
        if !bake_lite_geometry::is_rigid(&transform.to_matrix()) {
            return Err(HostError::invalid_argument("placement transform is not rigid"));
        }
        self.calls.place += 1;
        let id = self.insert(
            target,
            ElementKind::Instance {
                template: template.template,
                variant: template.variant,
                transform: transform.to_matrix(),
                mirrors: 0,
            },
        );
        self.uncommitted.insert(id);
        Ok(id)
    }

    fn regenerate(&mut self, target: PlacementTarget) -> HostResult<()> {
        self.check_target(target)?;
        if self.fail_regenerate {
            return Err(HostError::invalid_operation("document is read-only"));
        }
        self.calls.regenerate += 1;
        let elements = &self.elements;
        self.uncommitted
            .retain(|id| elements.get(id).map_or(false, |e| e.owner != target));
        Ok(())
    }

    fn mirror(
        &mut self,
        target: PlacementTarget,
        object: NativeId,
        plane: &Plane,
    ) -> HostResult<()> {
        if self.fail_mirrors {
            return Err(HostError::invalid_operation("mirror is not available"));
        }
        if self.uncommitted.contains(&object) {
            return Err(HostError::invalid_operation(format!(
                "{} must be regenerated before mirroring",
                object
            )));
        }
        self.calls.mirror += 1;
        match self.elements.get_mut(&object) {
            Some(MemoryElement {
                owner,
                kind: ElementKind::Instance {
                    transform, mirrors, ..
                },
                ..
            }) if *owner == target => {
                *transform = plane.reflection_matrix() * *transform;
                *mirrors += 1;
                Ok(())
            }
            _ => Err(HostError::invalid_argument(format!(
                "{} is not a placed instance",
                object
            ))),
        }
    }

    fn create_group(&mut self, members: &[NativeId]) -> HostResult<NativeId> {
        if members.is_empty() {
            return Err(HostError::invalid_argument("group needs at least one member"));
        }
        if let Some(missing) = members.iter().find(|m| !self.elements.contains_key(m)) {
            return Err(HostError::invalid_argument(format!("unknown element {}", missing)));
        }
        self.calls.create_group += 1;
        Ok(self.insert(
            PlacementTarget::Document,
            ElementKind::Group {
                name: None,
                members: members.to_vec(),
            },
        ))
    }

    fn rename_group(&mut self, group: NativeId, new_name: &str) -> HostResult<()> {
        if sanitize_name(new_name) != new_name {
            return Err(HostError::invalid_argument(format!("invalid group name '{}'", new_name)));
        }
        self.calls.rename_group += 1;
        match self.elements.get_mut(&group) {
            Some(MemoryElement {
                kind: ElementKind::Group { name, .. },
                ..
            }) => {
                *name = Some(new_name.to_string());
                Ok(())
            }
            _ => Err(HostError::invalid_argument(format!("{} is not a group", group))),
        }
    }
}
