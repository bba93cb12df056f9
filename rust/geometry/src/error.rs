// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use thiserror::Error;

/// Result type for geometry operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur during geometry conversion
#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid mesh: {0}")]
    InvalidMesh(String),

    #[error("Degenerate curve: {0}")]
    DegenerateCurve(String),

    #[error("Empty geometry: {0}")]
    Empty(String),
}

impl Error {
    pub fn mesh(msg: impl Into<String>) -> Self {
        Error::InvalidMesh(msg.into())
    }
}
