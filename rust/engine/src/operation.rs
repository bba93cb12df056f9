// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! One bake operation, start to finish.
//!
//! All caches live inside [`BakeOperation::run`] and are dropped when it
//! returns, on success and on a fatal error alike.

use bake_lite_core::{Scene, SceneItem};
use bake_lite_geometry::GeometryConverter;

use crate::cache::TemplateCache;
use crate::config::BakeConfig;
use crate::definition::DefinitionMaterializer;
use crate::error::{BakeError, Result};
use crate::grouping::GroupingAccumulator;
use crate::host::{HostDocument, PlacementTarget};
use crate::index::InstanceGraphIndex;
use crate::instance::InstanceMaterializer;
use crate::report::{BakeReport, BakeResult, NativeKind};

/// Bakes a scene into a host document.
///
/// # Example
///
/// ```
/// use bake_lite_core::Scene;
/// use bake_lite_engine::{BakeConfig, BakeOperation, MemoryDocument};
/// use bake_lite_geometry::ShapeConverter;
///
/// let scene = Scene::new();
/// let mut host = MemoryDocument::new();
/// let mut converter = ShapeConverter::new();
///
/// let report = BakeOperation::new(&mut host, &mut converter, BakeConfig::default())
///     .run(&scene, |_, _| {})
///     .unwrap();
/// assert!(report.results.is_empty());
/// ```
pub struct BakeOperation<'a, H: ?Sized, C: ?Sized> {
    host: &'a mut H,
    converter: &'a mut C,
    config: BakeConfig,
}

impl<'a, H, C> BakeOperation<'a, H, C>
where
    H: HostDocument + ?Sized,
    C: GeometryConverter + ?Sized,
{
    pub fn new(host: &'a mut H, converter: &'a mut C, config: BakeConfig) -> Self {
        Self {
            host,
            converter,
            config,
        }
    }

    /// Process every top-level item in dependency order.
    ///
    /// `progress` is called once per item with a label and the completed fraction.
    /// Per-item failures end up in the report; a fatal error aborts and is returned.
    pub fn run<F>(self, scene: &Scene, mut progress: F) -> Result<BakeReport>
    where
        F: FnMut(&str, f64),
    {
        let Self {
            host,
            converter,
            config,
        } = self;

        let index = InstanceGraphIndex::from_scene(scene);
        let definitions = DefinitionMaterializer::new(scene, &config);
        let instances = InstanceMaterializer::new();

        let mut cache = TemplateCache::new();
        let mut groups = GroupingAccumulator::new(config.group_base_name.clone());
        let mut results: Vec<BakeResult> = Vec::with_capacity(index.len());

        tracing::info!(
            definitions = scene.definition_count(),
            instances = scene.instance_count(),
            items = index.len(),
            "Starting bake"
        );

        let total = index.len();
        for (i, item) in index.iter().enumerate() {
            let label = match item {
                SceneItem::Definition(def) => {
                    let materialized =
                        definitions.materialize(host, converter, &mut cache, &mut results, &def.id);
                    match materialized {
                        Ok(template) => results.push(BakeResult::success(
                            def.id.clone(),
                            template.loaded.template,
                            NativeKind::Template,
                        )),
                        Err(err) if err.is_fatal() => {
                            tracing::error!(definition = %def.id, error = %err, "Aborting bake");
                            return Err(err);
                        }
                        Err(err) => results.push(BakeResult::failure(
                            def.id.clone(),
                            NativeKind::Template,
                            &err,
                        )),
                    }
                    format!("Definition {}", def.name)
                }
                SceneItem::Instance(inst) => {
                    match instances.place(host, &cache, inst, PlacementTarget::Document) {
                        Ok(placed) => {
                            results.push(
                                BakeResult::success(
                                    inst.id.clone(),
                                    placed.native,
                                    NativeKind::Instance,
                                )
                                .with_warning(placed.mirror_warning),
                            );
                            let path = scene
                                .collection_path(&inst.id)
                                .map(|p| p.as_slice())
                                .unwrap_or(&[]);
                            groups.add(path, placed.native);
                        }
                        Err(err) => {
                            tracing::error!(
                                instance = %inst.id,
                                error = %err,
                                "Failed to place instance"
                            );
                            results.push(BakeResult::failure(
                                inst.id.clone(),
                                NativeKind::Instance,
                                &err,
                            ));
                        }
                    }
                    format!("Instance {}", inst.id)
                }
            };
            progress(&label, (i + 1) as f64 / total as f64);
        }

        let flushed = groups.flush(host);
        for failure in &flushed.failures {
            let err = BakeError::Host(failure.error.clone());
            results.push(BakeResult::failure(
                failure.path.as_str().into(),
                NativeKind::Group,
                &err,
            ));
        }

        let report = BakeReport {
            results,
            groups: flushed.roots,
        };
        tracing::info!(
            succeeded = report.succeeded(),
            failed = report.failed(),
            templates = cache.len(),
            groups = flushed.created,
            "Bake complete"
        );
        Ok(report)
    }
}
