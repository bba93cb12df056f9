// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Collection-path grouping of baked objects.
//!
//! Nodes live in a slot map arena and refer to their parent by key. Path
//! prefixes are memoized, so objects sharing a prefix share the intermediate
//! node. Flushing creates native groups deepest level first and hands each new
//! group id to its parent node as a member.

use rustc_hash::FxHashMap;
use slotmap::{new_key_type, SlotMap};

use crate::host::{HostDocument, HostError, NativeId};

new_key_type! {
    /// Key of a node in the group arena.
    pub struct GroupKey;
}

/// Characters hosts reject in element names.
const INVALID_NAME_CHARS: &[char] = &[
    '\\', ':', '{', '}', '[', ']', '|', ';', '<', '>', '?', '`', '~',
];

/// Replace characters hosts reject in names and trim the result.
pub fn sanitize_name(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| {
            if INVALID_NAME_CHARS.contains(&c) || c.is_control() {
                '_'
            } else {
                c
            }
        })
        .collect();
    let cleaned = cleaned.trim();
    if cleaned.is_empty() {
        "Unnamed".to_string()
    } else {
        cleaned.to_string()
    }
}

/// One level of a collection path.
#[derive(Debug, Clone)]
pub struct GroupNode {
    pub name: String,
    /// Zero for a root segment.
    pub depth: usize,
    pub parent: Option<GroupKey>,
    /// Baked objects, plus child groups once those are flushed.
    pub members: Vec<NativeId>,
}

/// A group that could not be created or named.
#[derive(Debug, Clone)]
pub struct GroupFailure {
    pub path: String,
    pub error: HostError,
}

/// Outcome of [`GroupingAccumulator::flush`].
#[derive(Debug, Default)]
pub struct FlushedGroups {
    /// Groups without a parent node.
    pub roots: Vec<NativeId>,
    pub created: usize,
    pub failures: Vec<GroupFailure>,
}

#[derive(Debug, Default)]
pub struct GroupingAccumulator {
    nodes: SlotMap<GroupKey, GroupNode>,
    by_prefix: FxHashMap<Vec<String>, GroupKey>,
    /// Creation order, used to keep flushing deterministic.
    order: Vec<GroupKey>,
    base: Option<String>,
}

impl GroupingAccumulator {
    /// `base` becomes the root of every path when set.
    pub fn new(base: Option<String>) -> Self {
        Self {
            base,
            ..Self::default()
        }
    }

    /// Record `object` under `path`, creating or reusing one node per prefix.
    ///
    /// Returns the leaf key, or `None` when the (base-prefixed) path is empty.
    pub fn add(&mut self, path: &[String], object: NativeId) -> Option<GroupKey> {
        let segments: Vec<String> = self
            .base
            .iter()
            .chain(path.iter())
            .cloned()
            .collect();

        let mut parent: Option<GroupKey> = None;
        for depth in 0..segments.len() {
            let prefix = &segments[..=depth];
            let key = match self.by_prefix.get(prefix) {
                Some(&key) => key,
                None => {
                    let key = self.nodes.insert(GroupNode {
                        name: segments[depth].clone(),
                        depth,
                        parent,
                        members: Vec::new(),
                    });
                    self.by_prefix.insert(prefix.to_vec(), key);
                    self.order.push(key);
                    key
                }
            };
            parent = Some(key);
        }

        let leaf = parent?;
        self.nodes[leaf].members.push(object);
        Some(leaf)
    }

    pub fn node(&self, key: GroupKey) -> Option<&GroupNode> {
        self.nodes.get(key)
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Full path of a node, `/`-joined.
    pub fn path_of(&self, key: GroupKey) -> String {
        let mut names = Vec::new();
        let mut cursor = Some(key);
        while let Some(k) = cursor {
            let Some(node) = self.nodes.get(k) else { break };
            names.push(node.name.as_str());
            cursor = node.parent;
        }
        names.reverse();
        names.join("/")
    }

    /// Create native groups, deepest level first.
    ///
    /// A node whose group cannot be created is reported and its members stay
    /// ungrouped; its parent simply receives nothing from it.
    pub fn flush<H: HostDocument + ?Sized>(mut self, host: &mut H) -> FlushedGroups {
        let mut keys = self.order.clone();
        keys.sort_by(|a, b| self.nodes[*b].depth.cmp(&self.nodes[*a].depth));

        let mut out = FlushedGroups::default();
        for key in keys {
            let members = std::mem::take(&mut self.nodes[key].members);
            if members.is_empty() {
                continue;
            }

            let group = match host.create_group(&members) {
                Ok(group) => group,
                Err(error) => {
                    let path = self.path_of(key);
                    tracing::error!(path = %path, %error, "Failed to create group");
                    out.failures.push(GroupFailure { path, error });
                    continue;
                }
            };
            out.created += 1;

            let name = sanitize_name(&self.nodes[key].name);
            if let Err(error) = host.rename_group(group, &name) {
                let path = self.path_of(key);
                tracing::warn!(path = %path, %error, "Failed to rename group");
                out.failures.push(GroupFailure { path, error });
            }

            match self.nodes[key].parent {
                Some(parent) => self.nodes[parent].members.push(group),
                None => out.roots.push(group),
            }
        }
        out
    }
}
