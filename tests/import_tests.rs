//! Whole-Pipeline Tests
//!
//! Tests for:
//! - Root materialization order and scene-root parenting
//! - Mesh attachment to instancing nodes
//! - On-demand ancestor animation-node creation
//! - Per-node failure containment (siblings continue)

use glam::Vec3;

use collada_import::document::{
    AnimationElement, ChannelElement, Document, GeometryData, GeometryElement, InstanceGeometry,
    MeshElement, NodeElement, NodeKind, NodeTransform, PrimitiveKind, Primitives, SamplerElement,
    SharedInput, SourceElement, TransformOp, UnsharedInput, VerticesElement, VisualScene,
};
use collada_import::import::import_document;

fn triangle_geometry(id: &str) -> GeometryElement {
    GeometryElement {
        id: id.to_string(),
        name: id.to_string(),
        data: GeometryData::Mesh(MeshElement {
            sources: vec![SourceElement::floats(
                "pos",
                vec![0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0],
                3,
            )],
            vertices: VerticesElement {
                id: "verts".to_string(),
                inputs: vec![UnsharedInput::new("POSITION", "pos")],
            },
            primitives: vec![Primitives {
                kind: PrimitiveKind::Triangles,
                material: Some("mat".to_string()),
                count: 1,
                inputs: vec![SharedInput::new("VERTEX", "verts", 0)],
                indices: vec![0, 1, 2],
                vcounts: vec![],
            }],
        }),
    }
}

fn mesh_node(id: &str, geometry: &str) -> NodeElement {
    let mut node = NodeElement::new(id, NodeKind::Node);
    node.instance_geometries.push(InstanceGeometry {
        url: geometry.to_string(),
    });
    node
}

fn translate_animation(target: &str) -> AnimationElement {
    AnimationElement {
        id: "move".to_string(),
        sources: vec![
            SourceElement::floats("move-in", vec![0.0, 1.0], 1),
            SourceElement::floats("move-out", vec![0.0, 0.0, 0.0, 1.0, 0.0, 0.0], 3),
            SourceElement::names("move-interp", &["LINEAR", "LINEAR"]),
        ],
        samplers: vec![SamplerElement {
            id: "move-sampler".to_string(),
            inputs: vec![
                UnsharedInput::new("INPUT", "move-in"),
                UnsharedInput::new("OUTPUT", "move-out"),
                UnsharedInput::new("INTERPOLATION", "move-interp"),
            ],
        }],
        channels: vec![ChannelElement::new("move-sampler", target)],
        children: vec![],
    }
}

// ============================================================================
// Materialization
// ============================================================================

#[test]
fn roots_materialize_in_declaration_order_under_the_scene_root() {
    let doc = Document {
        geometries: vec![triangle_geometry("geo")],
        scene: Some(VisualScene {
            id: "scene".to_string(),
            name: None,
            nodes: vec![mesh_node("first", "geo"), NodeElement::new("second", NodeKind::Node)],
        }),
        ..Document::default()
    };

    let result = import_document(&doc).unwrap();
    assert_eq!(result.roots.len(), 2);
    assert_eq!(result.scene.node(result.roots[0]).unwrap().id, "first");
    assert_eq!(result.scene.node(result.roots[1]).unwrap().id, "second");
    for &root in &result.roots {
        assert_eq!(
            result.scene.node(root).unwrap().parent(),
            Some(result.scene.root())
        );
    }
}

#[test]
fn instanced_geometry_attaches_to_its_node() {
    let doc = Document {
        geometries: vec![triangle_geometry("geo")],
        scene: Some(VisualScene {
            id: "scene".to_string(),
            name: None,
            nodes: vec![mesh_node("holder", "geo")],
        }),
        ..Document::default()
    };

    let result = import_document(&doc).unwrap();
    let node = result.scene.node(result.roots[0]).unwrap();
    let mesh = &result.scene.meshes[node.mesh.unwrap()];
    assert_eq!(mesh.vertex_count(), 3);
    assert_eq!(mesh.groups.len(), 1);
    assert_eq!(mesh.groups[0].indices.len(), 3);
}

// ============================================================================
// Animation-node hierarchy
// ============================================================================

#[test]
fn animating_a_deep_child_creates_the_ancestor_chain() {
    // root -> a -> b; only b is animated. Materializing b must create
    // linked animation nodes for root and a on demand.
    let mut b = NodeElement::new("b", NodeKind::Node);
    b.transforms = vec![NodeTransform::new(
        "translate",
        TransformOp::Translate(Vec3::ZERO),
    )];
    let mut a = NodeElement::new("a", NodeKind::Node);
    a.children.push(b);
    let mut root = NodeElement::new("root", NodeKind::Node);
    root.children.push(a);

    let doc = Document {
        animations: vec![translate_animation("b/translate")],
        scene: Some(VisualScene {
            id: "scene".to_string(),
            name: None,
            nodes: vec![root],
        }),
        ..Document::default()
    };

    let result = import_document(&doc).unwrap();
    let graph = &result.animations;
    assert_eq!(graph.nodes.len(), 3);

    let root_key = graph.root().unwrap();
    let root_node = graph.node(root_key).unwrap();
    assert!(root_node.tracks.is_empty());
    assert_eq!(
        result.scene.node(root_node.scene_node.unwrap()).unwrap().id,
        "root"
    );

    let a_key = root_node.children()[0];
    let a_node = graph.node(a_key).unwrap();
    assert_eq!(a_node.parent(), Some(root_key));
    assert!(a_node.tracks.is_empty());

    let b_key = a_node.children()[0];
    let b_node = graph.node(b_key).unwrap();
    assert_eq!(b_node.parent(), Some(a_key));
    assert_eq!(b_node.tracks.len(), 1);
    assert_eq!(
        result.scene.node(b_node.scene_node.unwrap()).unwrap().id,
        "b"
    );
}

// ============================================================================
// Failure containment
// ============================================================================

#[test]
fn a_node_with_two_renderables_is_skipped_but_siblings_continue() {
    let mut bad = NodeElement::new("bad", NodeKind::Node);
    bad.instance_geometries.push(InstanceGeometry {
        url: "geo".to_string(),
    });
    bad.instance_geometries.push(InstanceGeometry {
        url: "geo".to_string(),
    });

    let doc = Document {
        geometries: vec![triangle_geometry("geo")],
        scene: Some(VisualScene {
            id: "scene".to_string(),
            name: None,
            nodes: vec![bad, mesh_node("good", "geo")],
        }),
        ..Document::default()
    };

    let result = import_document(&doc).unwrap();
    assert_eq!(result.roots.len(), 1);
    assert_eq!(result.scene.node(result.roots[0]).unwrap().id, "good");
}

#[test]
fn an_unsupported_geometry_skips_only_that_instance() {
    let mut lines = triangle_geometry("lines-geo");
    if let GeometryData::Mesh(mesh) = &mut lines.data {
        mesh.primitives[0].kind = PrimitiveKind::Lines;
    }

    let doc = Document {
        geometries: vec![lines, triangle_geometry("geo")],
        scene: Some(VisualScene {
            id: "scene".to_string(),
            name: None,
            nodes: vec![mesh_node("broken", "lines-geo"), mesh_node("fine", "geo")],
        }),
        ..Document::default()
    };

    let result = import_document(&doc).unwrap();
    assert_eq!(result.roots.len(), 2);

    // The failing instance is dropped; the node itself still exists.
    let broken = result.scene.node(result.roots[0]).unwrap();
    assert!(broken.mesh.is_none());
    let fine = result.scene.node(result.roots[1]).unwrap();
    assert!(fine.mesh.is_some());
}

#[test]
fn an_empty_document_imports_cleanly() {
    let result = import_document(&Document::default()).unwrap();
    assert!(result.roots.is_empty());
    assert!(result.animations.root().is_none());
    assert_eq!(result.scene.meshes.len(), 0);
}
