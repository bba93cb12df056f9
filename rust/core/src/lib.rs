// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! # Bake-Lite Core
//!
//! Application-neutral scene graph consumed by the bake engine.
//!
//! A scene is a bag of reusable [`Definition`]s, placed [`Instance`]s of those
//! definitions, and the [`GeometryObject`] payloads that definitions are made
//! of. Everything here is immutable input: an upstream collector builds it,
//! the engine reads it, and nothing in this crate talks to a host document.
//!
//! ## Units
//!
//! Source coordinates carry a length-unit tag. [`scale_factor`] maps the
//! recognized unit names onto the host's internal unit (decimal feet).

pub mod error;
pub mod model;
pub mod scene;
pub mod units;

pub use error::{Error, Result};
pub use model::{
    Definition, GeometryObject, Instance, MaterialBinding, Member, MeshData, Shape, SourceId,
};
pub use scene::{CollectionAssignment, CollectionPath, Scene, SceneFile, SceneItem};
pub use units::scale_factor;
