// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Geometry member baking with a conversion fallback cascade.
//!
//! For one geometry object:
//!
//! 1. convert the shape payload directly;
//! 2. if that yields nothing, convert the explicit mesh representation;
//! 3. if still nothing, recurse into the display-value children.
//!
//! The collected primitives are split into solids, each baked as its own
//! element, and non-solids, merged into a single shape element.

use bake_lite_core::{scale_factor, GeometryObject, MaterialBinding};
use bake_lite_geometry::{partition, GeometryConverter, Primitive, TriMesh};

use crate::config::BakeConfig;
use crate::error::{BakeError, Result};
use crate::host::{HostDocument, HostErrorKind, NativeId, TemplateDraft};

/// Native elements produced for one geometry member.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct MemberOutcome {
    pub solids: Vec<NativeId>,
    pub shape: Option<NativeId>,
    /// Elements the host rejected.
    pub failed: usize,
}

impl MemberOutcome {
    pub fn element_count(&self) -> usize {
        self.solids.len() + usize::from(self.shape.is_some())
    }
}

/// Bakes geometry members into a template draft.
pub struct GeometryFallbackBaker<'c> {
    config: &'c BakeConfig,
}

impl<'c> GeometryFallbackBaker<'c> {
    pub fn new(config: &'c BakeConfig) -> Self {
        Self { config }
    }

    /// Bake one geometry object into `draft`.
    pub fn bake<H, C>(
        &self,
        host: &mut H,
        converter: &mut C,
        draft: &TemplateDraft,
        object: &GeometryObject,
        material: Option<&MaterialBinding>,
    ) -> Result<MemberOutcome>
    where
        H: HostDocument + ?Sized,
        C: GeometryConverter + ?Sized,
    {
        let primitives = self.collect(converter, object, 0)?;
        if primitives.is_empty() {
            return Err(BakeError::NoGeometry(object.id.clone()));
        }

        let split = partition(primitives);
        let mut outcome = MemberOutcome::default();
        let mut first_error = None;

        // Elements are independent: a rejected one does not drop its siblings
        for solid in &split.solids {
            match self.bake_solid(host, draft, object, solid, material) {
                Ok(element) => outcome.solids.push(element),
                Err(err) => {
                    tracing::warn!(object = %object.id, error = %err, "Failed to add solid");
                    outcome.failed += 1;
                    first_error.get_or_insert(err);
                }
            }
        }

        if !split.non_solids.is_empty() {
            match self.bake_shape(host, draft, &split.non_solids) {
                Ok(element) => outcome.shape = Some(element),
                Err(err) => {
                    tracing::warn!(object = %object.id, error = %err, "Failed to add shape");
                    outcome.failed += 1;
                    first_error.get_or_insert(err);
                }
            }
        }

        if outcome.element_count() == 0 {
            if let Some(err) = first_error {
                return Err(err);
            }
        }

        tracing::debug!(
            object = %object.id,
            solids = outcome.solids.len(),
            shape = outcome.shape.is_some(),
            failed = outcome.failed,
            "Baked geometry member"
        );
        Ok(outcome)
    }

    /// Run the conversion cascade for one object.
    fn collect<C>(
        &self,
        converter: &mut C,
        object: &GeometryObject,
        depth: usize,
    ) -> Result<Vec<Primitive>>
    where
        C: GeometryConverter + ?Sized,
    {
        let units = object
            .units
            .as_deref()
            .unwrap_or(&self.config.default_units);
        let scale = scale_factor(units);

        let mut first_error = None;
        match converter.convert(object, scale) {
            Ok(prims) if !prims.is_empty() => return Ok(prims),
            Ok(_) => {}
            Err(e) => {
                tracing::debug!(
                    object = %object.id,
                    error = %e,
                    "Direct conversion failed, trying fallbacks"
                );
                first_error = Some(e);
            }
        }

        if let Some(mesh) = &object.mesh {
            match converter.convert_mesh(mesh, scale) {
                Ok(prims) if !prims.is_empty() => return Ok(prims),
                Ok(_) => {}
                Err(e) => {
                    tracing::debug!(object = %object.id, error = %e, "Mesh fallback failed");
                    first_error.get_or_insert(e);
                }
            }
        }

        if !object.display_value.is_empty() {
            if depth >= self.config.max_display_depth {
                tracing::warn!(
                    object = %object.id,
                    depth,
                    "Display value nesting exceeds limit, skipping"
                );
            } else {
                let mut prims = Vec::new();
                for child in &object.display_value {
                    match self.collect(converter, child, depth + 1) {
                        Ok(child_prims) => prims.extend(child_prims),
                        Err(e) => {
                            tracing::warn!(
                                object = %object.id,
                                child = %child.id,
                                error = %e,
                                "Display value failed"
                            )
                        }
                    }
                }
                if !prims.is_empty() {
                    return Ok(prims);
                }
            }
        }

        match first_error {
            Some(e) => Err(e.into()),
            None => Ok(Vec::new()),
        }
    }

    fn bake_solid<H>(
        &self,
        host: &mut H,
        draft: &TemplateDraft,
        object: &GeometryObject,
        solid: &TriMesh,
        material: Option<&MaterialBinding>,
    ) -> Result<NativeId>
    where
        H: HostDocument + ?Sized,
    {
        let element = host.add_solid(draft, solid, object.subcategory.as_deref())?;

        // Unresolved bindings are skipped without error
        if let Some(binding) = material {
            if let Some(parameter) = host.resolve_material(draft, binding) {
                if let Err(e) = host.associate_material(element, parameter) {
                    tracing::warn!(
                        object = %object.id,
                        material = %binding.name,
                        error = %e,
                        "Failed to associate material"
                    );
                }
            }
        }
        Ok(element)
    }

    /// One shape element for all non-solids, in the template's category if the host allows it.
    fn bake_shape<H>(
        &self,
        host: &mut H,
        draft: &TemplateDraft,
        non_solids: &[Primitive],
    ) -> Result<NativeId>
    where
        H: HostDocument + ?Sized,
    {
        match host.add_shape(draft, &draft.category, non_solids) {
            Ok(id) => Ok(id),
            Err(e)
                if e.kind == HostErrorKind::InvalidArgument
                    && draft.category != self.config.generic_category =>
            {
                tracing::debug!(
                    category = %draft.category,
                    fallback = %self.config.generic_category,
                    "Category rejected for shape element"
                );
                Ok(host.add_shape(draft, &self.config.generic_category, non_solids)?)
            }
            Err(e) => Err(e.into()),
        }
    }
}
