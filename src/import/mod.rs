//! The import pipeline.
//!
//! Three explicit passes, each producing the input of the next:
//!
//! 1. **Import** ([`node::import_node`], [`AnimationImport::import`]):
//!    the whole document tree populates intermediate geometry, skin and
//!    animation models and the session registries. Nothing materializes
//!    yet: cross-references may point at nodes imported later.
//! 2. **To scene**: node-by-node in declaration order, intermediate
//!    models materialize into the [`SceneGraph`] and [`AnimationGraph`].
//!    Ancestor animation nodes are created on demand when a descendant is
//!    the first animated node on its branch.
//! 3. **Post-import** ([`ControllerImport::post_import_pass`]): skins
//!    bind to skeletons, after every node exists, because bones resolve by
//!    name/id across the whole hierarchy.
//!
//! Import is best-effort per unit: a failing geometry, controller,
//! animation or node logs a warning and its siblings continue. Unsupported
//! features and skeleton-binding failures abort the whole run.

pub mod animation;
pub mod controller;
pub mod geometry;
pub mod node;
pub mod session;

pub use animation::{AnimationImport, TargetKind};
pub use controller::{ControllerImport, Influence, Join, MAX_INFLUENCES};
pub use geometry::GeometryImport;
pub use node::ImportNode;
pub use session::ImportSession;

use glam::Mat4;

use crate::animation::AnimationGraph;
use crate::document::{Document, NodeKind};
use crate::errors::{ImportError, Result};
use crate::scene::{NodeHandle, SceneGraph, SceneNode, SceneNodeKind};

/// Reads 16 floats in COLLADA row-major order into a matrix.
#[must_use]
pub fn mat4_from_row_major(values: &[f32]) -> Mat4 {
    let mut array = [0.0f32; 16];
    array.copy_from_slice(&values[..16]);
    Mat4::from_cols_array(&array).transpose()
}

/// Per-unit error containment: format and parameter errors inside one
/// unit become warnings so siblings continue; unsupported-feature errors
/// propagate.
pub(crate) fn contain<T>(result: Result<T>, what: &str) -> Result<Option<T>> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(err @ ImportError::Unsupported(_)) => Err(err),
        Err(err) => {
            log::warn!("Skipping {what}: {err}");
            Ok(None)
        }
    }
}

/// The materialized result of one import run.
#[derive(Debug)]
pub struct ImportResult {
    pub scene: SceneGraph,
    pub animations: AnimationGraph,
    /// Scene handles of the document's root nodes, declaration order.
    pub roots: Vec<NodeHandle>,
}

/// Runs the whole pipeline over a parsed document.
pub fn import_document(document: &Document) -> Result<ImportResult> {
    let mut session = ImportSession::new(&document.asset);
    let mut nodes: Vec<ImportNode> = Vec::new();
    let mut root_indices = Vec::new();

    // Pass 1: intermediate models for the whole tree.
    if let Some(scene) = &document.scene {
        for element in &scene.nodes {
            let imported = contain(
                node::import_node(document, element, None, &mut nodes, &mut session),
                &format!("node {}", element.id),
            )?;
            if let Some(index) = imported {
                root_indices.push(index);
            }
        }
    }

    let mut animations: Vec<AnimationImport> = Vec::new();
    for element in &document.animations {
        contain(
            AnimationImport::import(document, element, &mut session, &mut nodes, &mut animations),
            &format!("animation {}", element.id),
        )?;
    }

    // Pass 2: materialize in declaration order.
    let mut scene = SceneGraph::new();
    let mut graph = AnimationGraph::new();
    graph.duration = session.animation_duration();

    let mut roots = Vec::new();
    for &index in &root_indices {
        // Root bones hang free of the scene root so the skeleton root
        // walk terminates on a bone.
        let parent = if nodes[index].kind == NodeKind::Joint {
            None
        } else {
            Some(scene.root())
        };
        contain(
            node_to_scene(
                index,
                parent,
                &mut nodes,
                &animations,
                &session,
                &mut scene,
                &mut graph,
            ),
            "node materialization",
        )?;
        if let Some(handle) = nodes[index].scene_node {
            roots.push(handle);
        }
    }

    // Pass 3: skeleton binding, after every node exists.
    for imported in &nodes {
        for controller in &imported.controllers {
            controller.post_import_pass(&mut scene, &session, &nodes)?;
        }
    }

    Ok(ImportResult {
        scene,
        animations: graph,
        roots,
    })
}

/// Materializes one import node and its subtree.
fn node_to_scene(
    index: usize,
    parent: Option<NodeHandle>,
    nodes: &mut Vec<ImportNode>,
    animations: &[AnimationImport],
    session: &ImportSession,
    scene: &mut SceneGraph,
    graph: &mut AnimationGraph,
) -> Result<()> {
    if nodes[index].geometries.len() + nodes[index].controllers.len() > 1 {
        return Err(ImportError::InvalidFormat(
            "Only one object by node is allowed".into(),
        ));
    }

    let kind = if nodes[index].kind == NodeKind::Joint {
        SceneNodeKind::Bone
    } else {
        SceneNodeKind::Node
    };
    let matrix = nodes[index].matrix;

    let mut scene_node = SceneNode::new(kind, &nodes[index].name);
    scene_node.id.clone_from(&nodes[index].id);
    scene_node.sid.clone_from(&nodes[index].sid);
    scene_node.local_matrix = matrix;
    let handle = scene.create_node(scene_node);
    if let Some(parent) = parent {
        scene.attach(handle, parent);
    }
    nodes[index].scene_node = Some(handle);

    for geometry in &nodes[index].geometries {
        let mesh = geometry.to_scene(scene, None);
        if let Some(node) = scene.node_mut(handle) {
            node.mesh = Some(mesh);
        }
    }
    for controller in &mut nodes[index].controllers {
        let mesh = controller.to_scene(scene)?;
        if let Some(node) = scene.node_mut(handle) {
            node.mesh = Some(mesh);
        }
    }

    if !nodes[index].animations.is_empty() {
        // Make sure the ancestor chain of animation nodes exists,
        // creating missing links topmost-first.
        let parent_index = nodes[index].parent;
        let parent_anim = match parent_index {
            Some(parent_index) => {
                if nodes[parent_index].anim_node.is_none() {
                    let mut missing = Vec::new();
                    let mut current = Some(parent_index);
                    while let Some(i) = current {
                        if nodes[i].anim_node.is_some() {
                            break;
                        }
                        missing.push(i);
                        current = nodes[i].parent;
                    }
                    for &i in missing.iter().rev() {
                        let parent_key = nodes[i].parent.and_then(|p| nodes[p].anim_node);
                        let key = graph.create_node(parent_key, nodes[i].scene_node);
                        nodes[i].anim_node = Some(key);
                    }
                }
                nodes[parent_index].anim_node
            }
            None => None,
        };

        let key = graph.create_node(parent_anim, Some(handle));
        nodes[index].anim_node = Some(key);

        let node_matrix_inv = matrix.inverse();
        let animation_indices = nodes[index].animations.clone();
        for animation_index in animation_indices {
            let Some(anim_node) = graph.node_mut(key) else {
                break;
            };
            contain(
                animations[animation_index].generate_keys(
                    session.animation_duration(),
                    node_matrix_inv,
                    anim_node,
                ),
                &format!("animation {}", animations[animation_index].id),
            )?;
        }
    }

    let child_indices = nodes[index].children.clone();
    for child in child_indices {
        contain(
            node_to_scene(child, Some(handle), nodes, animations, session, scene, graph),
            "node materialization",
        )?;
    }

    Ok(())
}
