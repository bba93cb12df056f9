// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Bake-Lite Engine
//!
//! Converts a scene of block definitions and their instances into native
//! host objects: one reusable template per definition, one placed object per
//! instance, and a group hierarchy mirroring the source collections.
//!
//! The host is abstracted behind [`HostDocument`]; [`MemoryDocument`] is an
//! in-memory implementation used for dry runs and tests.
//!
//! # Example
//!
//! ```rust
//! use bake_lite_core::{Definition, Instance, Member, Scene, SourceId};
//! use bake_lite_engine::{BakeConfig, BakeOperation, MemoryDocument};
//! use bake_lite_geometry::ShapeConverter;
//!
//! let mut scene = Scene::new();
//! scene
//!     .add_definition(Definition::new("def-1", "Chair", Vec::<Member>::new()))
//!     .unwrap();
//! scene
//!     .add_instance(Instance::new("inst-1", "def-1", Instance::IDENTITY))
//!     .unwrap();
//!
//! let mut host = MemoryDocument::new();
//! let mut converter = ShapeConverter::new();
//! let report = BakeOperation::new(&mut host, &mut converter, BakeConfig::default())
//!     .run(&scene, |_, _| {})
//!     .unwrap();
//!
//! assert!(report.result_for(&SourceId::from("inst-1")).is_some());
//! ```

pub mod cache;
pub mod config;
pub mod definition;
pub mod error;
pub mod fallback;
pub mod grouping;
pub mod host;
pub mod index;
pub mod instance;
pub mod memory;
pub mod operation;
pub mod report;

pub use cache::{MaterializedTemplate, TemplateCache};
pub use config::BakeConfig;
pub use definition::DefinitionMaterializer;
pub use error::{BakeError, Result};
pub use fallback::{GeometryFallbackBaker, MemberOutcome};
pub use grouping::{sanitize_name, FlushedGroups, GroupKey, GroupNode, GroupingAccumulator};
pub use host::{
    HostDocument, HostError, HostErrorKind, HostResult, LoadedTemplate, NativeId, PlacementTarget,
    TemplateDraft,
};
pub use index::InstanceGraphIndex;
pub use instance::{apply_mirror, InstanceMaterializer, PlacedInstance};
pub use memory::{CallCounts, ElementKind, MemoryDocument, MemoryElement, MemoryTemplate};
pub use operation::BakeOperation;
pub use report::{BakeReport, BakeResult, NativeKind, Status};
