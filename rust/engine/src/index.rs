// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Dependency-safe processing order for definitions and instances.
//!
//! Items are sorted by nesting depth, deepest first, and definitions come
//! before instances of the same depth. A definition is therefore always
//! materialized before any shallower item can reference it. The sort is
//! stable, so remaining ties keep scene insertion order.

use bake_lite_core::{Scene, SceneItem};

/// Ordered view over a scene's top-level items.
#[derive(Debug)]
pub struct InstanceGraphIndex<'a> {
    order: Vec<SceneItem<'a>>,
}

impl<'a> InstanceGraphIndex<'a> {
    pub fn from_scene(scene: &'a Scene) -> Self {
        Self::from_items(scene.top_level_items())
    }

    pub fn from_items(mut items: Vec<SceneItem<'a>>) -> Self {
        items.sort_by(|a, b| {
            b.depth()
                .cmp(&a.depth())
                .then_with(|| b.is_definition().cmp(&a.is_definition()))
        });
        Self { order: items }
    }

    pub fn iter(&self) -> impl Iterator<Item = &SceneItem<'a>> {
        self.order.iter()
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bake_lite_core::{Definition, Instance};

    fn def(id: &str, depth: u32) -> Definition {
        Definition {
            id: id.into(),
            name: id.into(),
            category: None,
            members: vec![],
            depth,
        }
    }

    fn inst(id: &str, depth: u32) -> Instance {
        Instance {
            id: id.into(),
            definition_id: "x".into(),
            transform: Instance::IDENTITY,
            units: "m".into(),
            depth,
        }
    }

    #[test]
    fn deepest_first_definitions_before_instances() {
        let d0 = def("d0", 0);
        let d2 = def("d2", 2);
        let d1 = def("d1", 1);
        let i1 = inst("i1", 1);
        let i0 = inst("i0", 0);
        let i2 = inst("i2", 2);

        let index = InstanceGraphIndex::from_items(vec![
            SceneItem::Instance(&i0),
            SceneItem::Definition(&d0),
            SceneItem::Instance(&i1),
            SceneItem::Definition(&d2),
            SceneItem::Instance(&i2),
            SceneItem::Definition(&d1),
        ]);

        let ids: Vec<_> = index.iter().map(|i| i.id().as_str()).collect();
        assert_eq!(ids, vec!["d2", "i2", "d1", "i1", "d0", "i0"]);
    }

    #[test]
    fn ties_keep_insertion_order() {
        let a = def("a", 0);
        let b = def("b", 0);
        let c = def("c", 0);
        let index = InstanceGraphIndex::from_items(vec![
            SceneItem::Definition(&b),
            SceneItem::Definition(&a),
            SceneItem::Definition(&c),
        ]);
        let ids: Vec<_> = index.iter().map(|i| i.id().as_str()).collect();
        assert_eq!(ids, vec!["b", "a", "c"]);
    }
}
