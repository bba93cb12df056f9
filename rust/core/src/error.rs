// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Error types for scene graph assembly and lookup.

use crate::model::SourceId;

/// Result type alias for scene operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while assembling or querying a scene.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Two items in the scene share a stable id.
    #[error("duplicate scene id: {0}")]
    DuplicateId(SourceId),

    /// An instance references a definition that is not part of the scene.
    #[error("instance {instance} references unknown definition {definition}")]
    UnknownDefinition {
        instance: SourceId,
        definition: SourceId,
    },

    /// A definition lists a nested instance that is not part of the scene.
    #[error("definition {definition} lists unknown nested instance {instance}")]
    UnknownNestedInstance {
        definition: SourceId,
        instance: SourceId,
    },
}
