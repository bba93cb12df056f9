// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Per-item bake results.

use bake_lite_core::SourceId;
use serde::Serialize;

use crate::error::BakeError;
use crate::host::NativeId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    Success,
    Error,
}

/// What kind of native object a result refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NativeKind {
    Template,
    Instance,
    Shape,
    Group,
}

/// Outcome for one source item.
#[derive(Debug, Clone, Serialize)]
pub struct BakeResult {
    pub status: Status,
    pub source_id: SourceId,
    pub native_id: Option<NativeId>,
    pub native_kind: NativeKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Something went wrong without failing the item.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

impl BakeResult {
    pub fn success(source_id: SourceId, native_id: NativeId, native_kind: NativeKind) -> Self {
        Self {
            status: Status::Success,
            source_id,
            native_id: Some(native_id),
            native_kind,
            error: None,
            warning: None,
        }
    }

    pub fn failure(source_id: SourceId, native_kind: NativeKind, error: &BakeError) -> Self {
        Self {
            status: Status::Error,
            source_id,
            native_id: None,
            native_kind,
            error: Some(error.to_string()),
            warning: None,
        }
    }

    pub fn with_warning(mut self, warning: Option<String>) -> Self {
        self.warning = warning;
        self
    }

    #[inline]
    pub fn is_success(&self) -> bool {
        self.status == Status::Success
    }
}

/// Everything one bake operation produced.
#[derive(Debug, Clone, Default, Serialize)]
pub struct BakeReport {
    /// Results in processing order.
    pub results: Vec<BakeResult>,
    /// Top-level native groups.
    pub groups: Vec<NativeId>,
}

impl BakeReport {
    pub fn succeeded(&self) -> usize {
        self.results.iter().filter(|r| r.is_success()).count()
    }

    pub fn failed(&self) -> usize {
        self.results.len() - self.succeeded()
    }

    /// First result recorded for a source id.
    pub fn result_for(&self, source_id: &SourceId) -> Option<&BakeResult> {
        self.results.iter().find(|r| &r.source_id == source_id)
    }

    pub fn failures(&self) -> impl Iterator<Item = &BakeResult> {
        self.results.iter().filter(|r| !r.is_success())
    }
}
