// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Definition materialization.
//!
//! A definition becomes a host template: a blank template resource is opened,
//! every member is baked into it (geometry through the fallback baker, nested
//! instances through the instance materializer), and the result is published
//! back into the document. Nested definitions are resolved with an explicit
//! worklist instead of call-stack recursion, which also makes cyclic nesting
//! detectable.

use bake_lite_core::{Definition, Member, Scene, SourceId};
use bake_lite_geometry::GeometryConverter;

use crate::cache::{MaterializedTemplate, TemplateCache};
use crate::config::BakeConfig;
use crate::error::{BakeError, Result};
use crate::fallback::GeometryFallbackBaker;
use crate::grouping::sanitize_name;
use crate::host::{HostDocument, HostErrorKind, PlacementTarget};
use crate::instance::InstanceMaterializer;
use crate::report::{BakeResult, NativeKind};

/// Builds host templates for scene definitions.
pub struct DefinitionMaterializer<'s> {
    scene: &'s Scene,
    config: &'s BakeConfig,
}

impl<'s> DefinitionMaterializer<'s> {
    pub fn new(scene: &'s Scene, config: &'s BakeConfig) -> Self {
        Self { scene, config }
    }

    /// Return the cached template for `definition_id`, building it (and any
    /// nested definition it still needs) on a miss.
    ///
    /// Member failures are pushed to `results` and do not fail the definition.
    /// Only [`BakeError::TemplateResourceMissing`] is fatal.
    pub fn materialize<H, C>(
        &self,
        host: &mut H,
        converter: &mut C,
        cache: &mut TemplateCache,
        results: &mut Vec<BakeResult>,
        definition_id: &SourceId,
    ) -> Result<MaterializedTemplate>
    where
        H: HostDocument + ?Sized,
        C: GeometryConverter + ?Sized,
    {
        if let Some(hit) = cache.get(definition_id) {
            tracing::debug!(definition = %definition_id, "Template cache hit");
            return Ok(hit.clone());
        }
        if let Some(reason) = cache.failure(definition_id) {
            return Err(BakeError::DefinitionUnavailable {
                definition: definition_id.clone(),
                reason: reason.to_string(),
            });
        }

        let mut stack: Vec<SourceId> = vec![definition_id.clone()];
        while let Some(id) = stack.last().cloned() {
            if cache.contains(&id) || cache.failure(&id).is_some() {
                stack.pop();
                continue;
            }

            let Some(definition) = self.scene.definition(&id) else {
                let err = BakeError::MissingDefinition(id.clone());
                cache.mark_failed(id.clone(), err.to_string());
                if &id == definition_id {
                    return Err(err);
                }
                stack.pop();
                continue;
            };

            if let Some(dep) = self.pending_dependency(definition, cache) {
                if let Some(pos) = stack.iter().position(|s| *s == dep) {
                    let mut cycle = stack[pos..].to_vec();
                    cycle.push(dep);
                    let err = BakeError::CyclicDefinition(cycle);
                    tracing::error!(definition = %id, error = %err, "Cyclic definition nesting");
                    for member in &stack[pos..] {
                        cache.mark_failed(member.clone(), err.to_string());
                    }
                    if pos == 0 {
                        return Err(err);
                    }
                    // The definition below the cycle still builds, without the cyclic members
                    stack.truncate(pos);
                    continue;
                }
                tracing::debug!(
                    definition = %id,
                    dependency = %dep,
                    "Materializing nested definition first"
                );
                stack.push(dep);
                continue;
            }

            stack.pop();
            match self.build(host, converter, cache, results, definition) {
                Ok(template) => {
                    cache.insert(template.clone());
                    if &id == definition_id {
                        return Ok(template);
                    }
                }
                Err(err) if err.is_fatal() => return Err(err),
                Err(err) => {
                    tracing::error!(
                        definition = %id,
                        error = %err,
                        "Failed to materialize definition"
                    );
                    cache.mark_failed(id.clone(), err.to_string());
                    if &id == definition_id {
                        return Err(err);
                    }
                }
            }
        }

        // Only reachable if the root was resolved by a nested pass
        match cache.get(definition_id) {
            Some(template) => Ok(template.clone()),
            None => Err(BakeError::DefinitionUnavailable {
                definition: definition_id.clone(),
                reason: cache
                    .failure(definition_id)
                    .unwrap_or("not materialized")
                    .to_string(),
            }),
        }
    }

    /// First nested definition that is neither cached nor known to have failed.
    fn pending_dependency(
        &self,
        definition: &Definition,
        cache: &TemplateCache,
    ) -> Option<SourceId> {
        definition
            .nested_instance_ids()
            .filter_map(|iid| self.scene.instance(iid))
            .map(|inst| &inst.definition_id)
            .find(|dep| !cache.contains(dep) && cache.failure(dep).is_none())
            .cloned()
    }

    /// Populate and publish one template. All nested definitions are resolved already.
    fn build<H, C>(
        &self,
        host: &mut H,
        converter: &mut C,
        cache: &TemplateCache,
        results: &mut Vec<BakeResult>,
        definition: &Definition,
    ) -> Result<MaterializedTemplate>
    where
        H: HostDocument + ?Sized,
        C: GeometryConverter + ?Sized,
    {
        let category = definition
            .category
            .as_deref()
            .unwrap_or(&self.config.template_category);

        let draft = host.create_template(category).map_err(|e| match e.kind {
            HostErrorKind::ResourceMissing => BakeError::TemplateResourceMissing {
                category: category.to_string(),
            },
            _ => BakeError::Host(e),
        })?;
        tracing::debug!(definition = %definition.id, category, "Populating template");

        let baker = GeometryFallbackBaker::new(self.config);
        let placer = InstanceMaterializer::new();
        // Held back until the template is published
        let mut member_results = Vec::new();

        for member in &definition.members {
            match member {
                Member::Geometry(object_id) => {
                    let baked = match self.scene.geometry(object_id) {
                        Some(object) => baker.bake(
                            host,
                            converter,
                            &draft,
                            object,
                            self.scene.material_for(object),
                        ),
                        None => Err(BakeError::MissingGeometry(object_id.clone())),
                    };
                    if let Err(err) = baked {
                        tracing::error!(
                            definition = %definition.id,
                            object = %object_id,
                            error = %err,
                            "Failed to bake geometry member"
                        );
                        member_results.push(BakeResult::failure(
                            object_id.clone(),
                            NativeKind::Shape,
                            &err,
                        ));
                    }
                }
                Member::Instance(instance_id) => {
                    let placed = match self.scene.instance(instance_id) {
                        Some(nested) => {
                            placer.place(host, cache, nested, PlacementTarget::Template(draft.id))
                        }
                        None => Err(BakeError::MissingInstance(instance_id.clone())),
                    };
                    match placed {
                        Ok(placed) => member_results.push(
                            BakeResult::success(
                                instance_id.clone(),
                                placed.native,
                                NativeKind::Instance,
                            )
                            .with_warning(placed.mirror_warning),
                        ),
                        Err(err) => {
                            tracing::error!(
                                definition = %definition.id,
                                instance = %instance_id,
                                error = %err,
                                "Failed to place nested instance"
                            );
                            member_results.push(BakeResult::failure(
                                instance_id.clone(),
                                NativeKind::Instance,
                                &err,
                            ));
                        }
                    }
                }
            }
        }

        let loaded = match host.publish_template(draft, &sanitize_name(&definition.name)) {
            Ok(loaded) => loaded,
            Err(e) => {
                // Nested placements went down with the discarded template
                let err = BakeError::from(e);
                let lost = BakeError::DefinitionUnavailable {
                    definition: definition.id.clone(),
                    reason: err.to_string(),
                };
                results.extend(member_results.into_iter().map(|r| {
                    if r.is_success() {
                        BakeResult::failure(r.source_id, r.native_kind, &lost)
                    } else {
                        r
                    }
                }));
                return Err(err);
            }
        };
        results.extend(member_results);
        tracing::debug!(
            definition = %definition.id,
            template = %loaded.template,
            "Template published"
        );

        Ok(MaterializedTemplate {
            definition_id: definition.id.clone(),
            loaded,
        })
    }
}
