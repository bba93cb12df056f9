// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Per-operation template cache.

use bake_lite_core::SourceId;
use rustc_hash::FxHashMap;

use crate::host::LoadedTemplate;

/// A definition materialized into the document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MaterializedTemplate {
    pub definition_id: SourceId,
    pub loaded: LoadedTemplate,
}

/// Definition id -> template, plus the definitions that already failed.
///
/// Entries are only inserted once a template is fully populated and
/// published; a failed definition is remembered so it is not rebuilt.
#[derive(Debug, Default)]
pub struct TemplateCache {
    templates: FxHashMap<SourceId, MaterializedTemplate>,
    failures: FxHashMap<SourceId, String>,
}

impl TemplateCache {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn get(&self, definition_id: &SourceId) -> Option<&MaterializedTemplate> {
        self.templates.get(definition_id)
    }

    #[inline]
    pub fn contains(&self, definition_id: &SourceId) -> bool {
        self.templates.contains_key(definition_id)
    }

    pub fn insert(&mut self, template: MaterializedTemplate) {
        debug_assert!(!self.templates.contains_key(&template.definition_id));
        self.failures.remove(&template.definition_id);
        self.templates
            .insert(template.definition_id.clone(), template);
    }

    pub fn mark_failed(&mut self, definition_id: SourceId, reason: String) {
        self.failures.insert(definition_id, reason);
    }

    pub fn failure(&self, definition_id: &SourceId) -> Option<&str> {
        self.failures.get(definition_id).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }
}
