// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Error types for bake operations.

use bake_lite_core::SourceId;

use crate::host::HostError;

/// Result type alias for bake operations.
pub type Result<T> = std::result::Result<T, BakeError>;

/// Errors raised while baking.
///
/// Only [`BakeError::TemplateResourceMissing`] is fatal; everything else is
/// scoped to one definition, instance or geometry member.
#[derive(Debug, thiserror::Error)]
pub enum BakeError {
    /// No blank template resource is installed for the category.
    #[error("blank template resource missing for category '{category}'")]
    TemplateResourceMissing { category: String },

    #[error("host error: {0}")]
    Host(#[from] HostError),

    #[error("geometry error: {0}")]
    Geometry(#[from] bake_lite_geometry::Error),

    /// Definitions nest instances of each other.
    #[error("cyclic definition nesting: {}", format_cycle(.0))]
    CyclicDefinition(Vec<SourceId>),

    /// The instance's definition has no materialized template.
    #[error("no template for definition {0}")]
    MissingTemplate(SourceId),

    /// A definition failed earlier in this operation.
    #[error("definition {definition} unavailable: {reason}")]
    DefinitionUnavailable { definition: SourceId, reason: String },

    #[error("unknown definition {0}")]
    MissingDefinition(SourceId),

    #[error("unknown instance {0}")]
    MissingInstance(SourceId),

    #[error("unknown geometry {0}")]
    MissingGeometry(SourceId),

    /// Conversion, mesh and display fallbacks all produced nothing.
    #[error("no convertible geometry in {0}")]
    NoGeometry(SourceId),
}

impl BakeError {
    /// Fatal errors abort the whole operation.
    pub fn is_fatal(&self) -> bool {
        matches!(self, BakeError::TemplateResourceMissing { .. })
    }
}

fn format_cycle(cycle: &[SourceId]) -> String {
    cycle
        .iter()
        .map(SourceId::as_str)
        .collect::<Vec<_>>()
        .join(" -> ")
}
