// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! End-to-end bakes against the in-memory host document.

use approx::assert_relative_eq;
use bake_lite_core::{
    Definition, GeometryObject, Instance, MaterialBinding, Member, MeshData, Scene, Shape, SourceId,
};
use bake_lite_engine::{
    BakeConfig, BakeError, BakeOperation, BakeReport, ElementKind, MemoryDocument, MemoryTemplate,
    NativeKind, PlacementTarget, Status,
};
use bake_lite_geometry::{
    matrix_from_row_major, GeometryConverter, Point3, Polyline, Primitive, ShapeConverter, TriMesh,
};

fn cube(size: f64) -> MeshData {
    let s = size;
    MeshData {
        vertices: vec![
            0.0, 0.0, 0.0, s, 0.0, 0.0, s, s, 0.0, 0.0, s, 0.0, //
            0.0, 0.0, s, s, 0.0, s, s, s, s, 0.0, s, s,
        ],
        faces: vec![
            4, 0, 3, 2, 1, //
            4, 4, 5, 6, 7, //
            4, 0, 1, 5, 4, //
            4, 1, 2, 6, 5, //
            4, 2, 3, 7, 6, //
            4, 3, 0, 4, 7,
        ],
    }
}

fn cube_object(id: &str) -> GeometryObject {
    GeometryObject::new(id, Shape::Mesh(cube(1.0)))
}

fn line_object(id: &str) -> GeometryObject {
    GeometryObject::new(
        id,
        Shape::Line {
            start: [0.0, 0.0, 0.0],
            end: [1.0, 0.0, 0.0],
        },
    )
}

fn translation(x: f64, y: f64, z: f64) -> [f64; 16] {
    [
        1.0, 0.0, 0.0, x, //
        0.0, 1.0, 0.0, y, //
        0.0, 0.0, 1.0, z, //
        0.0, 0.0, 0.0, 1.0,
    ]
}

fn bake(scene: &Scene, host: &mut MemoryDocument) -> BakeReport {
    bake_with(scene, host, BakeConfig::default())
}

fn bake_with(scene: &Scene, host: &mut MemoryDocument, config: BakeConfig) -> BakeReport {
    let mut converter = ShapeConverter::new();
    BakeOperation::new(host, &mut converter, config)
        .run(scene, |_, _| {})
        .expect("bake should not abort")
}

fn template_named<'d>(host: &'d MemoryDocument, name: &str) -> &'d MemoryTemplate {
    host.templates()
        .find(|t| t.name.as_deref() == Some(name))
        .unwrap_or_else(|| panic!("no template named {name}"))
}

fn status(report: &BakeReport, id: &str) -> Status {
    report
        .result_for(&SourceId::from(id))
        .unwrap_or_else(|| panic!("no result for {id}"))
        .status
}

/// Box (depth 0) holding one cube, nested inside Shelf (depth 1), placed once.
fn nested_scene() -> Scene {
    let mut scene = Scene::new();
    // Outer items first so ordering cannot rely on insertion order
    scene
        .add_instance(Instance::new("shelf-1", "shelf", translation(5.0, 0.0, 0.0)).with_depth(1))
        .unwrap();
    scene
        .add_definition(
            Definition::new(
                "shelf",
                "Shelf",
                vec![Member::Instance("box-in-shelf".into()), Member::Geometry("board".into())],
            )
            .with_depth(1),
        )
        .unwrap();
    scene
        .add_definition(Definition::new("box", "Box", vec![Member::Geometry("cube".into())]))
        .unwrap();
    scene
        .add_instance(Instance::new("box-in-shelf", "box", translation(0.0, 0.0, 1.0)))
        .unwrap();
    scene.add_geometry(cube_object("cube")).unwrap();
    scene.add_geometry(line_object("board")).unwrap();
    scene.validate().unwrap();
    scene
}

#[test]
fn nested_definition_is_published_before_its_owner() {
    let scene = nested_scene();
    let mut host = MemoryDocument::new();
    let report = bake(&scene, &mut host);

    assert_eq!(report.failed(), 0, "{:?}", report.failures().collect::<Vec<_>>());
    let inner = template_named(&host, "Box");
    let outer = template_named(&host, "Shelf");
    assert!(inner.draft < outer.draft, "Box must be opened before Shelf");

    // The nested instance lives inside Shelf and refers to the Box template
    let inner_loaded = inner.loaded.expect("Box published");
    let nested: Vec<_> = host
        .elements_in(PlacementTarget::Template(outer.draft))
        .filter_map(|e| match &e.kind {
            ElementKind::Instance { template, .. } => Some(*template),
            _ => None,
        })
        .collect();
    assert_eq!(nested, vec![inner_loaded.template]);

    // Nested instance reported, never placed in the document
    assert_eq!(status(&report, "box-in-shelf"), Status::Success);
    let in_document = host
        .elements_in(PlacementTarget::Document)
        .filter(|e| matches!(e.kind, ElementKind::Instance { .. }))
        .count();
    assert_eq!(in_document, 1);
}

#[test]
fn definition_is_materialized_once_for_many_instances() {
    let mut scene = Scene::new();
    scene
        .add_definition(Definition::new("chair", "Chair", vec![Member::Geometry("seat".into())]))
        .unwrap();
    for i in 0..4 {
        scene
            .add_instance(Instance::new(
                format!("chair-{i}"),
                "chair",
                translation(i as f64, 0.0, 0.0),
            ))
            .unwrap();
    }
    scene.add_geometry(cube_object("seat")).unwrap();

    let mut host = MemoryDocument::new();
    let report = bake(&scene, &mut host);

    assert_eq!(report.succeeded(), 5);
    assert_eq!(host.calls().create_template, 1);
    assert_eq!(host.calls().publish_template, 1);
    assert_eq!(host.calls().place, 4);
}

/// Returns a fixed primitive list for every object.
struct ScriptedConverter {
    primitives: Vec<Primitive>,
}

impl GeometryConverter for ScriptedConverter {
    fn convert(
        &mut self,
        _object: &GeometryObject,
        _scale: f64,
    ) -> bake_lite_geometry::Result<Vec<Primitive>> {
        Ok(self.primitives.clone())
    }
}

#[test]
fn solids_become_elements_and_curves_share_one_shape() {
    let solid = || Primitive::Solid(TriMesh::from_mesh_data(&cube(1.0), 1.0).unwrap());
    let curve = || {
        Primitive::Curve(Polyline {
            points: vec![Point3::origin(), Point3::new(1.0, 1.0, 0.0)],
            closed: false,
        })
    };
    let mut converter = ScriptedConverter {
        primitives: vec![solid(), curve(), solid(), curve(), solid()],
    };

    let mut scene = Scene::new();
    scene
        .add_definition(Definition::new("d", "Mixed", vec![Member::Geometry("g".into())]))
        .unwrap();
    scene.add_geometry(line_object("g")).unwrap();

    let mut host = MemoryDocument::new();
    let report = BakeOperation::new(&mut host, &mut converter, BakeConfig::default())
        .run(&scene, |_, _| {})
        .unwrap();

    assert_eq!(status(&report, "d"), Status::Success);
    assert_eq!(host.calls().add_solid, 3);
    assert_eq!(host.calls().add_shape, 1);
    let template = template_named(&host, "Mixed");
    let shape = host
        .elements_in(PlacementTarget::Template(template.draft))
        .find_map(|e| match &e.kind {
            ElementKind::Shape { curves, .. } => Some(*curves),
            _ => None,
        });
    assert_eq!(shape, Some(2));
}

#[test]
fn missing_template_resource_aborts_the_bake() {
    let mut scene = Scene::new();
    scene
        .add_definition(Definition::new("d", "Door", vec![]).with_category("Doors"))
        .unwrap();
    scene
        .add_instance(Instance::new("i", "d", Instance::IDENTITY))
        .unwrap();

    let mut host = MemoryDocument::new().with_missing_resource("Doors");
    let mut converter = ShapeConverter::new();
    let err = BakeOperation::new(&mut host, &mut converter, BakeConfig::default())
        .run(&scene, |_, _| {})
        .unwrap_err();

    assert!(err.is_fatal());
    assert!(matches!(
        err,
        BakeError::TemplateResourceMissing { ref category } if category == "Doors"
    ));
    assert_eq!(host.calls().place, 0);
    assert_eq!(host.template_count(), 0);
}

#[test]
fn mesh_and_display_fallbacks_rescue_unsupported_payloads() {
    let unsupported = |id: &str| {
        GeometryObject::new(
            id,
            Shape::Unsupported {
                kind: "SubD".into(),
            },
        )
    };
    let mut with_mesh = unsupported("with-mesh");
    with_mesh.mesh = Some(cube(1.0));
    let mut with_display = unsupported("with-display");
    with_display.display_value = vec![cube_object("display-child")];
    let hopeless = unsupported("hopeless");

    let mut scene = Scene::new();
    scene
        .add_definition(Definition::new(
            "d",
            "Fallbacks",
            vec![
                Member::Geometry("with-mesh".into()),
                Member::Geometry("with-display".into()),
                Member::Geometry("hopeless".into()),
            ],
        ))
        .unwrap();
    scene.add_geometry(with_mesh).unwrap();
    scene.add_geometry(with_display).unwrap();
    scene.add_geometry(hopeless).unwrap();

    let mut host = MemoryDocument::new();
    let report = bake(&scene, &mut host);

    assert_eq!(host.calls().add_solid, 2);
    assert_eq!(status(&report, "d"), Status::Success);
    let hopeless = report.result_for(&SourceId::from("hopeless")).unwrap();
    assert_eq!(hopeless.status, Status::Error);
    assert_eq!(hopeless.native_kind, NativeKind::Shape);
}

#[test]
fn rejected_category_falls_back_to_generic_for_shapes() {
    let mut scene = Scene::new();
    scene
        .add_definition(
            Definition::new("d", "Frame", vec![Member::Geometry("edge".into())])
                .with_category("Doors"),
        )
        .unwrap();
    scene.add_geometry(line_object("edge")).unwrap();

    let mut host = MemoryDocument::new().rejecting_shape_category("Doors");
    let report = bake(&scene, &mut host);

    assert_eq!(report.failed(), 0);
    let template = template_named(&host, "Frame");
    assert_eq!(template.category, "Doors");
    let category = host
        .elements_in(PlacementTarget::Template(template.draft))
        .find_map(|e| match &e.kind {
            ElementKind::Shape { category, .. } => Some(category.clone()),
            _ => None,
        });
    assert_eq!(category.as_deref(), Some("Generic Models"));
}

#[test]
fn materials_are_associated_when_resolvable() {
    let mut scene = Scene::new();
    scene
        .add_definition(Definition::new(
            "d",
            "Painted",
            vec![Member::Geometry("a".into()), Member::Geometry("b".into())],
        ))
        .unwrap();
    let mut a = cube_object("a");
    a.material_id = Some("oak".into());
    let mut b = cube_object("b");
    b.material_id = Some("glass".into());
    scene.add_geometry(a).unwrap();
    scene.add_geometry(b).unwrap();
    for (id, name) in [("oak", "Oak"), ("glass", "Glass")] {
        scene.add_material(MaterialBinding {
            id: id.into(),
            name: name.into(),
            color: None,
            opacity: None,
        });
    }

    let mut host = MemoryDocument::new().with_unresolvable_material("Glass");
    let report = bake(&scene, &mut host);

    assert_eq!(report.failed(), 0);
    let template = template_named(&host, "Painted");
    let materials: Vec<bool> = host
        .elements_in(PlacementTarget::Template(template.draft))
        .filter_map(|e| match &e.kind {
            ElementKind::Solid { material, .. } => Some(material.is_some()),
            _ => None,
        })
        .collect();
    assert_eq!(materials, vec![true, false]);
}

fn mirrored_scene() -> (Scene, [f64; 16]) {
    // Mirror in X, translated; feet so no unit scaling applies
    let transform = [
        -1.0, 0.0, 0.0, 1.0, //
        0.0, 1.0, 0.0, 2.0, //
        0.0, 0.0, 1.0, 3.0, //
        0.0, 0.0, 0.0, 1.0,
    ];
    let mut scene = Scene::new();
    scene
        .add_definition(Definition::new("d", "Handle", vec![Member::Geometry("g".into())]))
        .unwrap();
    scene.add_geometry(cube_object("g")).unwrap();
    scene
        .add_instance(Instance::new("left", "d", transform).with_units("ft"))
        .unwrap();
    (scene, transform)
}

#[test]
fn mirrored_instance_reproduces_source_transform() {
    let (scene, transform) = mirrored_scene();
    let mut host = MemoryDocument::new();
    let report = bake(&scene, &mut host);

    let placed = report.result_for(&SourceId::from("left")).unwrap();
    assert_eq!(placed.status, Status::Success);
    let element = host.element(placed.native_id.unwrap()).unwrap();
    let ElementKind::Instance {
        transform: actual,
        mirrors,
        ..
    } = &element.kind
    else {
        panic!("expected an instance, got {:?}", element.kind);
    };

    assert_eq!(*mirrors, 1);
    assert_eq!(host.calls().regenerate, 1);
    assert_relative_eq!(*actual, matrix_from_row_major(&transform), epsilon = 1e-9);
}

#[test]
fn mirror_failure_keeps_the_placement() {
    let (scene, _) = mirrored_scene();
    let mut host = MemoryDocument::new().with_failing_mirrors();
    let report = bake(&scene, &mut host);

    let placed = report.result_for(&SourceId::from("left")).unwrap();
    assert_eq!(placed.status, Status::Success);
    assert_eq!(placed.warning.as_deref(), Some("1 of 1 mirror(s) not applied"));
    assert_eq!(host.calls().place, 1);
    assert_eq!(host.calls().mirror, 0);
}

#[test]
fn collection_paths_become_nested_groups() {
    let mut scene = Scene::new();
    scene
        .add_definition(Definition::new("d", "Post", vec![Member::Geometry("g".into())]))
        .unwrap();
    scene.add_geometry(cube_object("g")).unwrap();
    for (id, path) in [("p1", ["A", "B"]), ("p2", ["A", "B"]), ("p3", ["A", "C"])] {
        scene
            .add_instance(Instance::new(id, "d", Instance::IDENTITY))
            .unwrap();
        scene.set_collection_path(id, path);
    }
    scene
        .add_instance(Instance::new("loose", "d", Instance::IDENTITY))
        .unwrap();

    let mut host = MemoryDocument::new();
    let report = bake(&scene, &mut host);

    assert_eq!(host.calls().create_group, 3);
    assert_eq!(report.groups.len(), 1);

    let member_count = |name: &str| {
        host.groups()
            .find_map(|g| match &g.kind {
                ElementKind::Group {
                    name: Some(n),
                    members,
                } if n == name => Some(members.len()),
                _ => None,
            })
            .unwrap_or_else(|| panic!("no group {name}"))
    };
    assert_eq!(member_count("B"), 2);
    assert_eq!(member_count("C"), 1);
    assert_eq!(member_count("A"), 2);
}

#[test]
fn group_base_roots_every_collection() {
    let mut scene = Scene::new();
    scene
        .add_definition(Definition::new("d", "Post", vec![]))
        .unwrap();
    scene
        .add_instance(Instance::new("p", "d", Instance::IDENTITY))
        .unwrap();
    scene.set_collection_path("p", ["Level: 1"]);

    let mut host = MemoryDocument::new();
    let report = bake_with(&scene, &mut host, BakeConfig::default().with_group_base("Import"));

    assert_eq!(report.groups.len(), 1);
    let names: Vec<_> = host
        .groups()
        .filter_map(|g| match &g.kind {
            ElementKind::Group { name, .. } => name.clone(),
            _ => None,
        })
        .collect();
    assert_eq!(names, vec!["Level_ 1".to_string(), "Import".to_string()]);
}

#[test]
fn cyclic_definitions_fail_without_aborting() {
    let mut scene = Scene::new();
    for (id, name, nested) in [("x", "X", "x-holds-y"), ("y", "Y", "y-holds-x")] {
        scene
            .add_definition(
                Definition::new(id, name, vec![Member::Instance(nested.into())]).with_depth(1),
            )
            .unwrap();
    }
    scene
        .add_definition(Definition::new("z", "Z", vec![Member::Geometry("g".into())]))
        .unwrap();
    scene
        .add_instance(Instance::new("x-holds-y", "y", Instance::IDENTITY))
        .unwrap();
    scene
        .add_instance(Instance::new("y-holds-x", "x", Instance::IDENTITY))
        .unwrap();
    scene
        .add_instance(Instance::new("top-x", "x", Instance::IDENTITY).with_depth(1))
        .unwrap();
    scene.add_geometry(cube_object("g")).unwrap();

    let mut host = MemoryDocument::new();
    let report = bake(&scene, &mut host);

    let x = report.result_for(&SourceId::from("x")).unwrap();
    assert_eq!(x.status, Status::Error);
    assert!(x.error.as_deref().unwrap().contains("cyclic"));
    // Y is on the same cycle; its failure carries the cycle
    let y = report.result_for(&SourceId::from("y")).unwrap();
    assert_eq!(y.status, Status::Error);
    assert!(y.error.as_deref().unwrap().contains("x -> y -> x"));
    assert_eq!(status(&report, "top-x"), Status::Error);
    assert_eq!(status(&report, "z"), Status::Success);
    assert_eq!(host.calls().publish_template, 1);
}

#[test]
fn one_failing_item_does_not_stop_the_rest() {
    let mut scene = Scene::new();
    scene
        .add_definition(Definition::new("bad", "Broken", vec![Member::Geometry("g".into())]))
        .unwrap();
    scene
        .add_definition(Definition::new(
            "good",
            "Table",
            vec![Member::Geometry("g".into()), Member::Geometry("ghost".into())],
        ))
        .unwrap();
    scene
        .add_instance(Instance::new("bad-1", "bad", Instance::IDENTITY))
        .unwrap();
    scene
        .add_instance(Instance::new("good-1", "good", Instance::IDENTITY))
        .unwrap();
    scene.add_geometry(cube_object("g")).unwrap();

    let mut host = MemoryDocument::new().with_failing_publish("Broken");
    let report = bake(&scene, &mut host);

    assert_eq!(status(&report, "bad"), Status::Error);
    assert_eq!(status(&report, "bad-1"), Status::Error);
    assert_eq!(status(&report, "good"), Status::Success);
    assert_eq!(status(&report, "good-1"), Status::Success);
    assert_eq!(status(&report, "ghost"), Status::Error);
    assert_eq!(host.calls().place, 1);
}

#[test]
fn nested_placements_fail_with_an_unpublished_owner() {
    let mut scene = Scene::new();
    scene
        .add_definition(
            Definition::new("outer", "Broken", vec![Member::Instance("nested".into())])
                .with_depth(1),
        )
        .unwrap();
    scene
        .add_definition(Definition::new("inner", "Inner", vec![Member::Geometry("g".into())]))
        .unwrap();
    scene
        .add_instance(Instance::new("nested", "inner", Instance::IDENTITY))
        .unwrap();
    scene.add_geometry(cube_object("g")).unwrap();

    let mut host = MemoryDocument::new().with_failing_publish("Broken");
    let report = bake(&scene, &mut host);

    assert_eq!(status(&report, "outer"), Status::Error);
    assert_eq!(status(&report, "inner"), Status::Success);
    let nested = report.result_for(&SourceId::from("nested")).unwrap();
    assert_eq!(nested.status, Status::Error);
    assert_eq!(nested.native_id, None);
    assert!(nested.error.as_deref().unwrap().contains("outer"));
}

#[test]
fn skipped_mirror_is_reported_as_a_warning() {
    let (scene, _) = mirrored_scene();
    let mut host = MemoryDocument::new().with_failing_regenerate();
    let report = bake(&scene, &mut host);

    let placed = report.result_for(&SourceId::from("left")).unwrap();
    assert_eq!(placed.status, Status::Success);
    assert!(placed.native_id.is_some());
    assert!(placed.warning.as_deref().unwrap().contains("regenerate failed"));
    assert_eq!(host.calls().mirror, 0);

    let json = serde_json::to_value(&report).unwrap();
    let left = json["results"]
        .as_array()
        .unwrap()
        .iter()
        .find(|r| r["source_id"] == "left")
        .unwrap()
        .clone();
    assert!(left["warning"].is_string());
}

#[test]
fn progress_is_reported_per_item() {
    let scene = nested_scene();
    let mut host = MemoryDocument::new();
    let mut converter = ShapeConverter::new();
    let mut seen: Vec<(String, f64)> = Vec::new();

    BakeOperation::new(&mut host, &mut converter, BakeConfig::default())
        .run(&scene, |label, fraction| seen.push((label.to_string(), fraction)))
        .unwrap();

    // Shelf, its document instance and Box; the nested instance is not top level
    assert_eq!(seen.len(), 3);
    assert_eq!(seen[0].0, "Definition Shelf");
    assert_eq!(seen[1].0, "Instance shelf-1");
    assert_relative_eq!(seen[2].1, 1.0);
    assert!(seen.windows(2).all(|w| w[0].1 < w[1].1));
}

#[test]
fn report_serializes_to_json() {
    let scene = nested_scene();
    let mut host = MemoryDocument::new();
    let report = bake(&scene, &mut host);

    let json = serde_json::to_value(&report).unwrap();
    let results = json["results"].as_array().unwrap();
    assert_eq!(results.len(), report.results.len());

    let shelf = results
        .iter()
        .find(|r| r["source_id"] == "shelf")
        .expect("shelf result");
    assert_eq!(shelf["status"], "success");
    assert_eq!(shelf["native_kind"], "template");
    assert!(shelf["native_id"].is_u64());
    assert!(shelf.get("error").is_none());
    assert!(shelf.get("warning").is_none());
}
