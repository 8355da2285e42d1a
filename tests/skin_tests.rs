//! Skin Binding Tests
//!
//! Tests for:
//! - Influence capping at 4 per vertex (order preserved, no renormalizing)
//! - Scatter onto assembled vertices with weight-0 / joint-id -1 padding
//! - Joint resolution by name vs IDREF (by node id)
//! - Skeleton root walk, bone-type check and root hints
//! - Shape-matrix pretransform of skinned positions

use glam::Mat4;

use collada_import::document::{
    ControllerElement, Document, GeometryData, GeometryElement, InstanceController, MeshElement,
    NodeElement, NodeKind, PrimitiveKind, Primitives, SharedInput, SkinElement, SourceElement,
    UnsharedInput, UpAxis, VertexWeightsElement, VerticesElement, VisualScene,
};
use collada_import::errors::ImportError;
use collada_import::import::{ControllerImport, import_document};

const EPSILON: f32 = 1e-5;

fn approx(a: f32, b: f32) -> bool {
    (a - b).abs() < EPSILON
}

/// Row-major identity, as a COLLADA float stream.
const IDENTITY_ROW_MAJOR: [f32; 16] = [
    1.0, 0.0, 0.0, 0.0, //
    0.0, 1.0, 0.0, 0.0, //
    0.0, 0.0, 1.0, 0.0, //
    0.0, 0.0, 0.0, 1.0,
];

/// Row-major translation by (1, 0, 0).
const TRANSLATE_X_ROW_MAJOR: [f32; 16] = [
    1.0, 0.0, 0.0, 1.0, //
    0.0, 1.0, 0.0, 0.0, //
    0.0, 0.0, 1.0, 0.0, //
    0.0, 0.0, 0.0, 1.0,
];

fn triangle_geometry() -> GeometryElement {
    GeometryElement {
        id: "geo".to_string(),
        name: "geo".to_string(),
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
                material: None,
                count: 1,
                inputs: vec![SharedInput::new("VERTEX", "verts", 0)],
                indices: vec![0, 1, 2],
                vcounts: vec![],
            }],
        }),
    }
}

/// Skin over the triangle: vertex 0 has two influences, vertex 1 one,
/// vertex 2 five (one past the cap).
fn skin_element(joints: SourceElement) -> SkinElement {
    let mut inv_data = Vec::new();
    inv_data.extend_from_slice(&TRANSLATE_X_ROW_MAJOR);
    inv_data.extend_from_slice(&IDENTITY_ROW_MAJOR);

    SkinElement {
        source: "geo".to_string(),
        bind_shape_matrix: Mat4::IDENTITY,
        sources: vec![
            joints,
            SourceElement::floats("inv", inv_data, 16),
            SourceElement::floats("weights", vec![0.3, 0.7, 0.5, 0.1, 0.05, 0.025], 1),
        ],
        joint_inputs: vec![
            UnsharedInput::new("JOINT", "joints"),
            UnsharedInput::new("INV_BIND_MATRIX", "inv"),
        ],
        vertex_weights: VertexWeightsElement {
            count: 3,
            inputs: vec![
                SharedInput::new("JOINT", "joints", 0),
                SharedInput::new("WEIGHT", "weights", 1),
            ],
            vcount: vec![2, 1, 5],
            v: vec![
                0, 0, 1, 1, // vertex 0: joints 0, 1
                0, 2, // vertex 1: joint 0
                0, 0, 1, 1, 0, 2, 1, 3, 0, 4, // vertex 2: five influences
            ],
        },
    }
}

fn controller(joints: SourceElement) -> ControllerElement {
    ControllerElement {
        id: "ctrl".to_string(),
        name: Some("skinned".to_string()),
        skin: skin_element(joints),
    }
}

fn joint_node(id: &str, name: &str) -> NodeElement {
    let mut node = NodeElement::new(id, NodeKind::Joint);
    node.name = Some(name.to_string());
    node
}

/// Document with a two-bone skeleton (root "jroot"/A, child "jchild"/B)
/// and a skinned node instancing the controller.
fn skinned_document(joints: SourceElement, hints: Vec<String>) -> Document {
    let mut jroot = joint_node("jroot", "A");
    jroot.children.push(joint_node("jchild", "B"));

    let mut skinned = NodeElement::new("skinned", NodeKind::Node);
    skinned.instance_controllers.push(InstanceController {
        url: "ctrl".to_string(),
        skeletons: hints,
    });

    Document {
        geometries: vec![triangle_geometry()],
        controllers: vec![controller(joints)],
        scene: Some(VisualScene {
            id: "scene".to_string(),
            name: None,
            nodes: vec![jroot, skinned],
        }),
        ..Document::default()
    }
}

// ============================================================================
// Influence capping and scatter
// ============================================================================

#[test]
fn influences_cap_at_four_without_renormalizing() {
    let doc = skinned_document(SourceElement::names("joints", &["A", "B"]), vec![]);
    let result = import_document(&doc).unwrap();

    let mesh = result.scene.meshes.values().next().unwrap();
    let skin = mesh.skin.as_ref().unwrap();
    assert_eq!(skin.joint_count, 2);

    // Vertex 2 declared five influences; exactly the first four survive,
    // declaration order, weights untouched.
    let base = 2 * 4;
    assert!(approx(skin.weights[base], 0.3));
    assert!(approx(skin.weights[base + 1], 0.7));
    assert!(approx(skin.weights[base + 2], 0.5));
    assert!(approx(skin.weights[base + 3], 0.1));
    assert_eq!(&skin.joint_ids[base..base + 4], &[0, 1, 0, 1]);

    let sum: f32 = skin.weights[base..base + 4].iter().sum();
    assert!(approx(sum, 1.6), "weights must not be renormalized");
}

#[test]
fn unused_slots_pad_with_zero_weight_and_sentinel_joint() {
    let doc = skinned_document(SourceElement::names("joints", &["A", "B"]), vec![]);
    let result = import_document(&doc).unwrap();

    let mesh = result.scene.meshes.values().next().unwrap();
    let skin = mesh.skin.as_ref().unwrap();
    assert_eq!(skin.weights.len(), mesh.vertex_count() * 4);
    assert_eq!(skin.joint_ids.len(), mesh.vertex_count() * 4);

    // Vertex 1 has a single influence; slots 1..4 stay empty.
    let base = 4;
    assert!(approx(skin.weights[base], 0.5));
    assert_eq!(skin.joint_ids[base], 0);
    for slot in 1..4 {
        assert!(approx(skin.weights[base + slot], 0.0));
        assert_eq!(skin.joint_ids[base + slot], -1);
    }
}

#[test]
fn influences_scatter_to_every_assembled_duplicate() {
    // Flat-shaded triangles force each original vertex into two assembled
    // copies; both must receive the vertex's influences.
    let mut doc = skinned_document(SourceElement::names("joints", &["A", "B"]), vec![]);
    let GeometryData::Mesh(mesh) = &mut doc.geometries[0].data else {
        unreachable!();
    };
    mesh.sources.push(SourceElement::floats(
        "nrm",
        vec![0.0, 0.0, 1.0, 0.0, 0.0, -1.0],
        3,
    ));
    let primitives = &mut mesh.primitives[0];
    primitives.count = 2;
    primitives.inputs.push(SharedInput::new("NORMAL", "nrm", 1));
    primitives.indices = vec![0, 0, 1, 0, 2, 0, 0, 1, 1, 1, 2, 1];

    let result = import_document(&doc).unwrap();
    let mesh = result.scene.meshes.values().next().unwrap();
    let skin = mesh.skin.as_ref().unwrap();

    assert_eq!(mesh.vertex_count(), 6);
    // Original vertex 0 landed at assembled 0 and 3.
    for assembled in [0usize, 3] {
        let base = assembled * 4;
        assert!(approx(skin.weights[base], 0.3));
        assert!(approx(skin.weights[base + 1], 0.7));
        assert_eq!(&skin.joint_ids[base..base + 2], &[0, 1]);
    }
}

// ============================================================================
// Skeleton binding
// ============================================================================

#[test]
fn joints_resolve_by_name_and_root_is_topmost_bone() {
    let doc = skinned_document(SourceElement::names("joints", &["A", "B"]), vec![]);
    let result = import_document(&doc).unwrap();

    let skeleton = result.scene.skeletons.values().next().unwrap();
    assert_eq!(skeleton.bones.len(), 2);
    assert_eq!(skeleton.bone(1), Some(skeleton.bones[1]));
    assert_eq!(skeleton.bone(5), None);

    let root = skeleton.root.unwrap();
    assert_eq!(root, skeleton.bones[0]);
    let root_node = result.scene.node(root).unwrap();
    assert!(root_node.is_bone());
    assert_eq!(root_node.id, "jroot");
    // Root bones hang free of the synthetic scene root.
    assert!(root_node.parent().is_none());
}

#[test]
fn bind_matrices_invert_the_declared_inverse() {
    let doc = skinned_document(SourceElement::names("joints", &["A", "B"]), vec![]);
    let result = import_document(&doc).unwrap();

    let mesh = result.scene.meshes.values().next().unwrap();
    let skin = mesh.skin.as_ref().unwrap();
    assert_eq!(skin.bind_matrices.len(), 2);
    // Joint 0 declared inverse-bind T(1,0,0); its bind matrix is T(-1,0,0).
    assert!(approx(skin.bind_matrices[0].w_axis.x, -1.0));
    assert!(approx(skin.bind_matrices[1].w_axis.x, 0.0));
}

#[test]
fn idref_joints_resolve_by_node_id() {
    // Node names differ from ids; only an id lookup can succeed.
    let mut doc = skinned_document(SourceElement::id_refs("joints", &["jroot", "jchild"]), vec![]);
    let scene = doc.scene.as_mut().unwrap();
    scene.nodes[0].name = Some("Alpha".to_string());
    scene.nodes[0].children[0].name = Some("Beta".to_string());

    let result = import_document(&doc).unwrap();
    let skeleton = result.scene.skeletons.values().next().unwrap();
    assert_eq!(skeleton.bones.len(), 2);
    assert_eq!(
        result.scene.node(skeleton.bones[0]).unwrap().id,
        "jroot"
    );
}

#[test]
fn idref_joint_source_sets_the_idref_flag() {
    let doc = skinned_document(SourceElement::id_refs("joints", &["jroot", "jchild"]), vec![]);
    let imported =
        ControllerImport::import(&doc, &doc.controllers[0], vec![], UpAxis::Y).unwrap();
    assert!(imported.find_joins_by_idref());

    let doc = skinned_document(SourceElement::names("joints", &["A", "B"]), vec![]);
    let imported =
        ControllerImport::import(&doc, &doc.controllers[0], vec![], UpAxis::Y).unwrap();
    assert!(!imported.find_joins_by_idref());
}

#[test]
fn unresolved_bone_name_is_a_parameter_error() {
    let doc = skinned_document(SourceElement::names("joints", &["A", "Missing"]), vec![]);
    assert!(matches!(
        import_document(&doc),
        Err(ImportError::InvalidParameter(_))
    ));
}

#[test]
fn non_bone_skeleton_root_is_a_parameter_error() {
    // The only declared joint hangs under a plain node, so the root walk
    // ends on a non-bone.
    let mut plain = NodeElement::new("plain", NodeKind::Node);
    plain.children.push(joint_node("jchild", "B"));

    let mut skinned = NodeElement::new("skinned", NodeKind::Node);
    skinned.instance_controllers.push(InstanceController {
        url: "ctrl".to_string(),
        skeletons: vec![],
    });

    let mut joints_data = Vec::new();
    joints_data.extend_from_slice(&IDENTITY_ROW_MAJOR);
    let skin = SkinElement {
        source: "geo".to_string(),
        bind_shape_matrix: Mat4::IDENTITY,
        sources: vec![
            SourceElement::names("joints", &["B"]),
            SourceElement::floats("inv", joints_data, 16),
            SourceElement::floats("weights", vec![1.0], 1),
        ],
        joint_inputs: vec![
            UnsharedInput::new("JOINT", "joints"),
            UnsharedInput::new("INV_BIND_MATRIX", "inv"),
        ],
        vertex_weights: VertexWeightsElement {
            count: 3,
            inputs: vec![
                SharedInput::new("JOINT", "joints", 0),
                SharedInput::new("WEIGHT", "weights", 1),
            ],
            vcount: vec![1, 1, 1],
            v: vec![0, 0, 0, 0, 0, 0],
        },
    };

    let doc = Document {
        geometries: vec![triangle_geometry()],
        controllers: vec![ControllerElement {
            id: "ctrl".to_string(),
            name: None,
            skin,
        }],
        scene: Some(VisualScene {
            id: "scene".to_string(),
            name: None,
            nodes: vec![plain, skinned],
        }),
        ..Document::default()
    };

    assert!(matches!(
        import_document(&doc),
        Err(ImportError::InvalidParameter(_))
    ));
}

#[test]
fn skeleton_hint_overrides_the_walked_root() {
    let doc = skinned_document(
        SourceElement::names("joints", &["A", "B"]),
        vec!["jchild".to_string()],
    );
    let result = import_document(&doc).unwrap();

    let skeleton = result.scene.skeletons.values().next().unwrap();
    let root = skeleton.root.unwrap();
    assert_eq!(result.scene.node(root).unwrap().id, "jchild");
}

// ============================================================================
// Shape matrix
// ============================================================================

#[test]
fn shape_matrix_pretransforms_skinned_positions() {
    let mut doc = skinned_document(SourceElement::names("joints", &["A", "B"]), vec![]);
    doc.controllers[0].skin.bind_shape_matrix =
        Mat4::from_translation(glam::Vec3::new(0.0, 0.0, 5.0));

    let result = import_document(&doc).unwrap();
    let mesh = result.scene.meshes.values().next().unwrap();

    for vertex in 0..mesh.vertex_count() {
        assert!(approx(mesh.positions[vertex * 3 + 2], 5.0));
    }
    let skin = mesh.skin.as_ref().unwrap();
    assert!(approx(skin.shape_matrix.w_axis.z, 5.0));
}
