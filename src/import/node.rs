//! Scene node import.
//!
//! First pass over the visual scene tree: fold each node's transform
//! elements into a local matrix, import instanced geometries and
//! controllers, recurse into children and register every node with the
//! session registries. Nodes live in a flat arena addressed by index;
//! parent and child links are indices.

use glam::{Mat4, Vec3};

use crate::animation::AnimNodeKey;
use crate::document::{Document, NodeElement, NodeKind, TransformOp};
use crate::errors::Result;
use crate::import::contain;
use crate::import::controller::ControllerImport;
use crate::import::geometry::GeometryImport;
use crate::import::session::ImportSession;
use crate::scene::NodeHandle;

/// One imported node: the intermediate model between the document element
/// and its materialized scene node.
#[derive(Debug)]
pub struct ImportNode {
    pub id: String,
    pub sid: Option<String>,
    pub name: String,
    pub kind: NodeKind,
    /// Local transform folded from the node's transform elements.
    pub matrix: Mat4,

    pub geometries: Vec<GeometryImport>,
    pub controllers: Vec<ControllerImport>,
    /// Indices into the import-time animation list.
    pub animations: Vec<usize>,

    pub parent: Option<usize>,
    pub children: Vec<usize>,

    /// Filled by the to-scene pass.
    pub scene_node: Option<NodeHandle>,
    pub anim_node: Option<AnimNodeKey>,
}

/// Folds a node's transform elements, in declaration order, into one
/// local matrix. A `<matrix>` element premultiplies; everything else
/// postmultiplies.
fn fold_transforms(transforms: &[crate::document::NodeTransform]) -> Mat4 {
    let mut matrix = Mat4::IDENTITY;
    for transform in transforms {
        match transform.op {
            TransformOp::Translate(v) => {
                matrix *= Mat4::from_translation(v);
            }
            TransformOp::Rotate(v) => {
                matrix *= Mat4::from_axis_angle(Vec3::new(v.x, v.y, v.z), v.w.to_radians());
            }
            TransformOp::Scale(v) => {
                matrix *= Mat4::from_scale(v);
            }
            TransformOp::Matrix(m) => {
                matrix = m * matrix;
            }
            TransformOp::LookAt(v) => {
                let eye = Vec3::new(v[0], v[1], v[2]);
                let target = Vec3::new(v[3], v[4], v[5]);
                let up = Vec3::new(v[6], v[7], v[8]);
                matrix *= Mat4::look_at_rh(eye, target, up).inverse();
            }
            TransformOp::Skew(v) => {
                let angle = v[0].to_radians();
                let rotation = Vec3::new(v[1], v[2], v[3]);
                let translation = Vec3::new(v[4], v[5], v[6]);
                let t = angle.tan();
                let mut m = Mat4::IDENTITY;
                // Shear along the rotation axis, driven by the
                // translation axis.
                m.x_axis.x += t * rotation.x * translation.x;
                m.x_axis.y += t * rotation.y * translation.x;
                m.x_axis.z += t * rotation.z * translation.x;
                m.y_axis.x += t * rotation.x * translation.y;
                m.y_axis.y += t * rotation.y * translation.y;
                m.y_axis.z += t * rotation.z * translation.y;
                m.z_axis.x += t * rotation.x * translation.z;
                m.z_axis.y += t * rotation.y * translation.z;
                m.z_axis.z += t * rotation.z * translation.z;
                matrix *= m;
            }
        }
    }
    matrix
}

/// Imports one node element and its subtree into the arena, returning the
/// node's index. Per-instance failures are contained: the offending
/// geometry/controller/child is skipped and siblings continue.
pub(crate) fn import_node(
    document: &Document,
    element: &NodeElement,
    parent: Option<usize>,
    nodes: &mut Vec<ImportNode>,
    session: &mut ImportSession,
) -> Result<usize> {
    let index = nodes.len();
    nodes.push(ImportNode {
        id: element.id.clone(),
        sid: element.sid.clone(),
        name: element.name.clone().unwrap_or_default(),
        kind: element.kind,
        matrix: fold_transforms(&element.transforms),
        geometries: Vec::new(),
        controllers: Vec::new(),
        animations: Vec::new(),
        parent,
        children: Vec::new(),
        scene_node: None,
        anim_node: None,
    });

    for instance in &element.instance_geometries {
        let Some(geometry_element) = document.geometry_by_id(&instance.url) else {
            log::warn!("Unknown geometry instance {}", instance.url);
            continue;
        };
        let imported = contain(
            GeometryImport::import(geometry_element, session.up_axis),
            &format!("geometry {}", instance.url),
        )?;
        if let Some(geometry) = imported {
            nodes[index].geometries.push(geometry);
        }
    }

    for instance in &element.instance_controllers {
        let Some(controller_element) = document.controller_by_id(&instance.url) else {
            log::warn!("Unknown controller instance {}", instance.url);
            continue;
        };
        let imported = contain(
            ControllerImport::import(
                document,
                controller_element,
                instance.skeletons.clone(),
                session.up_axis,
            ),
            &format!("controller {}", instance.url),
        )?;
        if let Some(controller) = imported {
            nodes[index].controllers.push(controller);
        }
    }

    for child in &element.children {
        let imported = contain(
            import_node(document, child, Some(index), nodes, session),
            &format!("node {}", child.id),
        )?;
        if let Some(child_index) = imported {
            nodes[index].children.push(child_index);
        }
    }

    session.register_node(
        index,
        &element.id,
        element.sid.as_deref(),
        element.name.as_deref(),
    );

    Ok(index)
}
