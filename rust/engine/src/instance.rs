// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Instance placement with post-placement mirroring.

use bake_lite_core::{scale_factor, Instance};
use bake_lite_geometry::{matrix_from_row_major, normalize_placement, MirrorFlags, RigidTransform};

use crate::cache::TemplateCache;
use crate::error::{BakeError, Result};
use crate::host::{HostDocument, NativeId, PlacementTarget};

/// A placed instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlacedInstance {
    pub native: NativeId,
    /// Set when the placement stands but a mirror it needed was not applied.
    pub mirror_warning: Option<String>,
}

/// Places instances of cached templates.
#[derive(Debug, Default, Clone, Copy)]
pub struct InstanceMaterializer;

impl InstanceMaterializer {
    pub fn new() -> Self {
        Self
    }

    /// Place `instance` into `target` and apply any mirror it carries.
    ///
    /// Fails with [`BakeError::MissingTemplate`] when the definition was never
    /// materialized. Mirror failures do not fail the placement; they are
    /// logged and returned in [`PlacedInstance::mirror_warning`].
    pub fn place<H>(
        &self,
        host: &mut H,
        cache: &TemplateCache,
        instance: &Instance,
        target: PlacementTarget,
    ) -> Result<PlacedInstance>
    where
        H: HostDocument + ?Sized,
    {
        let Some(template) = cache.get(&instance.definition_id) else {
            tracing::warn!(
                instance = %instance.id,
                definition = %instance.definition_id,
                "Definition not materialized, skipping instance"
            );
            return Err(match cache.failure(&instance.definition_id) {
                Some(reason) => BakeError::DefinitionUnavailable {
                    definition: instance.definition_id.clone(),
                    reason: reason.to_string(),
                },
                None => BakeError::MissingTemplate(instance.definition_id.clone()),
            });
        };

        let matrix = matrix_from_row_major(&instance.transform);
        let placement = normalize_placement(&matrix, scale_factor(&instance.units));
        if placement.stripped {
            tracing::debug!(
                instance = %instance.id,
                mirrored = placement.mirror.any(),
                "Removed scale/skew from placement"
            );
        }

        let native = host.place(target, &template.loaded, &placement.rigid)?;

        let mut mirror_warning = None;
        if placement.mirror.any() {
            // Mirroring needs the placed object committed first
            match host.regenerate(target) {
                Ok(()) => {
                    let wanted = placement.mirror.count();
                    let applied =
                        apply_mirror(host, target, native, &placement.rigid, placement.mirror);
                    if applied < wanted {
                        mirror_warning = Some(format!(
                            "{} of {} mirror(s) not applied",
                            wanted - applied,
                            wanted
                        ));
                    }
                }
                Err(e) => {
                    tracing::warn!(
                        instance = %instance.id,
                        error = %e,
                        "Regenerate failed, mirror not applied"
                    );
                    mirror_warning = Some(format!("mirror not applied, regenerate failed: {}", e));
                }
            }
        }

        Ok(PlacedInstance {
            native,
            mirror_warning,
        })
    }
}

/// Reflect a placed object once per set flag, across the plane spanned by the
/// other two axes of `reference`. Returns how many mirrors succeeded.
///
/// Each axis is attempted independently; failures are logged and never undo
/// the placement.
pub fn apply_mirror<H>(
    host: &mut H,
    target: PlacementTarget,
    object: NativeId,
    reference: &RigidTransform,
    flags: MirrorFlags,
) -> usize
where
    H: HostDocument + ?Sized,
{
    let mut applied = 0;
    for axis in flags.axes() {
        let plane = reference.mirror_plane(axis);
        match host.mirror(target, object, &plane) {
            Ok(()) => applied += 1,
            Err(e) => tracing::warn!(%object, %axis, error = %e, "Mirror failed"),
        }
    }
    applied
}
