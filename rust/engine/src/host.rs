// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Host document abstraction.
//!
//! The engine drives a geometry-authoring host (building-model or CAD
//! application) through [`HostDocument`]. Every call is blocking and happens
//! on the single thread that owns the document transaction.

use std::fmt;

use bake_lite_core::MaterialBinding;
use bake_lite_geometry::{Plane, Primitive, RigidTransform, TriMesh};
use serde::Serialize;

/// Opaque handle of a host-resident object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct NativeId(pub u64);

impl fmt::Display for NativeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A template opened for editing, not yet placeable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateDraft {
    pub id: NativeId,
    /// Category the blank resource was loaded for.
    pub category: String,
}

/// A template loaded into the active document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadedTemplate {
    pub template: NativeId,
    /// Default variant (symbol/type) used for placements; already activated.
    pub variant: NativeId,
}

/// Where a placement or mirror happens.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlacementTarget {
    /// The active document.
    Document,
    /// A template draft being populated (nested instances).
    Template(NativeId),
}

/// Closed set of host failure kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum HostErrorKind {
    /// The host rejected an argument (e.g. a category invalid for the element kind).
    InvalidArgument,
    /// The call is not valid in the document's current state.
    InvalidOperation,
    /// A required resource (blank template) is not installed.
    ResourceMissing,
    Other,
}

impl fmt::Display for HostErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            HostErrorKind::InvalidArgument => "invalid argument",
            HostErrorKind::InvalidOperation => "invalid operation",
            HostErrorKind::ResourceMissing => "resource missing",
            HostErrorKind::Other => "host error",
        })
    }
}

/// A failed host call.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind}: {message}")]
pub struct HostError {
    pub kind: HostErrorKind,
    pub message: String,
}

impl HostError {
    pub fn new(kind: HostErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::new(HostErrorKind::InvalidArgument, message)
    }

    pub fn invalid_operation(message: impl Into<String>) -> Self {
        Self::new(HostErrorKind::InvalidOperation, message)
    }
}

pub type HostResult<T> = std::result::Result<T, HostError>;

/// Native document API consumed by the engine.
pub trait HostDocument {
    /// Open an empty template from the host's blank resource for `category`.
    ///
    /// Fails with [`HostErrorKind::ResourceMissing`] when no such resource exists.
    fn create_template(&mut self, category: &str) -> HostResult<TemplateDraft>;

    /// Add one free-form solid element to a draft.
    fn add_solid(
        &mut self,
        draft: &TemplateDraft,
        solid: &TriMesh,
        subcategory: Option<&str>,
    ) -> HostResult<NativeId>;

    /// Resolve a material binding to a material parameter of the draft, if the host can.
    fn resolve_material(
        &mut self,
        draft: &TemplateDraft,
        material: &MaterialBinding,
    ) -> Option<NativeId>;

    /// Drive an element's material from a template parameter.
    fn associate_material(&mut self, element: NativeId, parameter: NativeId) -> HostResult<()>;

    /// Add one shape element holding all `primitives` under `category`.
    fn add_shape(
        &mut self,
        draft: &TemplateDraft,
        category: &str,
        primitives: &[Primitive],
    ) -> HostResult<NativeId>;

    /// Save the draft out and load it back as a placeable template.
    fn publish_template(&mut self, draft: TemplateDraft, name: &str) -> HostResult<LoadedTemplate>;

    /// Place a template variant with a rigid transform.
    fn place(
        &mut self,
        target: PlacementTarget,
        template: &LoadedTemplate,
        transform: &RigidTransform,
    ) -> HostResult<NativeId>;

    /// Commit pending changes so newly placed objects can be edited.
    fn regenerate(&mut self, target: PlacementTarget) -> HostResult<()>;

    /// Reflect an existing object across `plane`.
    fn mirror(
        &mut self,
        target: PlacementTarget,
        object: NativeId,
        plane: &Plane,
    ) -> HostResult<()>;

    /// Group existing objects (or groups) into a new group.
    fn create_group(&mut self, members: &[NativeId]) -> HostResult<NativeId>;

    fn rename_group(&mut self, group: NativeId, name: &str) -> HostResult<()>;
}
