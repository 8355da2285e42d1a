//! Skin binding.
//!
//! A controller couples a geometry with a joint list and per-vertex
//! influence data. Import reads the joint sources and caps every vertex at
//! four influences; materialization scatters them onto the assembled
//! vertex buffers through the geometry's lookup table; the post-import
//! pass, once the whole scene exists, resolves joint names to bones and
//! determines the skeleton root.

use glam::Mat4;
use smallvec::SmallVec;

use crate::document::{ControllerElement, Document, SourceArray, UpAxis};
use crate::errors::{ImportError, Result};
use crate::import::geometry::GeometryImport;
use crate::import::mat4_from_row_major;
use crate::import::node::ImportNode;
use crate::import::session::ImportSession;
use crate::scene::{MeshKey, NodeHandle, SceneGraph, Skeleton, SkeletonKey, Skin};

/// Bounded influence count per vertex; influences past the fourth are
/// dropped without renormalizing the remaining weights.
pub const MAX_INFLUENCES: usize = 4;

/// One skeletal joint as declared by the skin: its name (or id reference)
/// and inverse bind matrix. Declaration order defines joint-id numbering.
#[derive(Debug, Clone)]
pub struct Join {
    pub name: String,
    pub inv_matrix: Mat4,
}

/// A (joint, weight) pair on one source vertex.
#[derive(Debug, Clone, Copy)]
pub struct Influence {
    pub joint_id: i32,
    pub weight: f32,
}

/// The intermediate skin model for one controller instance.
#[derive(Debug)]
pub struct ControllerImport {
    pub id: String,
    pub name: String,

    geometry: GeometryImport,
    shape_matrix: Mat4,

    joins: Vec<Join>,
    /// Joints were declared as IDREFs: resolve by node id instead of
    /// name/sid in the post-import pass.
    find_joins_by_idref: bool,
    /// Per source vertex, at most [`MAX_INFLUENCES`] influences in
    /// declaration order.
    influences: Vec<SmallVec<[Influence; MAX_INFLUENCES]>>,

    /// Skeleton-root hint node ids from the controller instance.
    skeleton_hints: Vec<String>,

    skeleton: Option<SkeletonKey>,
    mesh: Option<MeshKey>,
}

impl ControllerImport {
    /// Imports the skinned geometry, the joint list and the per-vertex
    /// influence lists.
    pub fn import(
        document: &Document,
        element: &ControllerElement,
        skeleton_hints: Vec<String>,
        up_axis: UpAxis,
    ) -> Result<Self> {
        let skin = &element.skin;

        let geometry_element = document.geometry_by_id(&skin.source).ok_or_else(|| {
            ImportError::InvalidParameter(format!("Unknown skin source geometry {}", skin.source))
        })?;
        let geometry = GeometryImport::import(geometry_element, up_axis)?;

        // Joint names define joint-id numbering; an IDREF array switches
        // the post-import lookup to node ids.
        let joint_source = skin.joint_input_source("JOINT").ok_or_else(|| {
            ImportError::InvalidFormat("Skin declares no JOINT input".into())
        })?;
        let (joint_names, find_joins_by_idref) = match &joint_source.array {
            SourceArray::Name(names) => (names, false),
            SourceArray::IdRef(refs) => (refs, true),
            SourceArray::Float(_) => {
                return Err(ImportError::InvalidFormat(
                    "Skin joint source must be a name or IDREF array".into(),
                ));
            }
        };
        let mut joins: Vec<Join> = joint_names
            .iter()
            .map(|name| Join {
                name: name.clone(),
                inv_matrix: Mat4::IDENTITY,
            })
            .collect();

        let inv_source = skin.joint_input_source("INV_BIND_MATRIX").ok_or_else(|| {
            ImportError::InvalidFormat("Skin declares no INV_BIND_MATRIX input".into())
        })?;
        let inv_data = inv_source.float_data().ok_or_else(|| {
            ImportError::InvalidFormat("Inverse bind matrices must be a float array".into())
        })?;
        for (join, chunk) in joins.iter_mut().zip(inv_data.chunks_exact(16)) {
            join.inv_matrix = mat4_from_row_major(chunk);
        }

        let weight_source = skin.weight_input_source("WEIGHT").ok_or_else(|| {
            ImportError::InvalidFormat("Skin declares no WEIGHT input".into())
        })?;
        let weight_data = weight_source.float_data().ok_or_else(|| {
            ImportError::InvalidFormat("Skin weights must be a float array".into())
        })?;

        // <vcount> gives the influence count per vertex; <v> holds
        // (joint id, weight index) pairs.
        let vertex_weights = &skin.vertex_weights;
        let mut influences = Vec::with_capacity(vertex_weights.vcount.len());
        let mut v_pos = 0usize;
        for &count in &vertex_weights.vcount {
            let mut vertex_influences: SmallVec<[Influence; MAX_INFLUENCES]> = SmallVec::new();
            for slot in 0..count as usize {
                let pair = vertex_weights.v.get(v_pos..v_pos + 2).ok_or_else(|| {
                    ImportError::InvalidFormat("Skin <v> stream is truncated".into())
                })?;
                v_pos += 2;

                let weight = *weight_data.get(pair[1] as usize).ok_or_else(|| {
                    ImportError::InvalidFormat("Skin weight index out of range".into())
                })?;

                // TODO a way to carry more than 4 influences per vertex
                if slot < MAX_INFLUENCES {
                    vertex_influences.push(Influence {
                        joint_id: pair[0],
                        weight,
                    });
                }
            }
            influences.push(vertex_influences);
        }

        Ok(Self {
            id: element.id.clone(),
            name: element
                .name
                .clone()
                .unwrap_or_else(|| element.id.clone()),
            geometry,
            shape_matrix: skin.bind_shape_matrix,
            joins,
            find_joins_by_idref,
            influences,
            skeleton_hints,
            skeleton: None,
            mesh: None,
        })
    }

    #[must_use]
    pub fn joint_count(&self) -> usize {
        self.joins.len()
    }

    #[must_use]
    pub fn find_joins_by_idref(&self) -> bool {
        self.find_joins_by_idref
    }

    #[must_use]
    pub fn influences(&self) -> &[SmallVec<[Influence; MAX_INFLUENCES]>] {
        &self.influences
    }

    /// Scatters the influence lists onto every assembled vertex and
    /// materializes the skinned mesh. Unused slots keep weight `0` and
    /// joint id `-1`.
    pub fn to_scene(&mut self, graph: &mut SceneGraph) -> Result<MeshKey> {
        let dup_count = self.geometry.vertex_count();
        let mut weights = vec![0.0f32; dup_count * MAX_INFLUENCES];
        let mut joint_ids = vec![-1i32; dup_count * MAX_INFLUENCES];

        for (original, vertex_influences) in self.influences.iter().enumerate() {
            let Some(matches) = self.geometry.lookup().get(original) else {
                continue;
            };
            for &assembled in matches {
                let base = assembled as usize * MAX_INFLUENCES;
                for (slot, influence) in vertex_influences.iter().enumerate() {
                    weights[base + slot] = influence.weight;
                    joint_ids[base + slot] = influence.joint_id;
                }
            }
        }

        let skeleton = graph.skeletons.insert(Skeleton::new(&self.name));
        let skin = Skin {
            skeleton,
            joint_count: self.joins.len(),
            weights,
            joint_ids,
            bind_matrices: Vec::new(),
            shape_matrix: self.shape_matrix,
        };

        let mesh = self.geometry.to_scene(graph, Some(skin));
        self.skeleton = Some(skeleton);
        self.mesh = Some(mesh);
        Ok(mesh)
    }

    /// Binds the skeleton once every node has materialized: resolves each
    /// joint to its scene bone, determines the skeleton root and installs
    /// the per-joint bind matrices.
    pub fn post_import_pass(
        &self,
        graph: &mut SceneGraph,
        session: &ImportSession,
        nodes: &[ImportNode],
    ) -> Result<()> {
        let Some(skeleton_key) = self.skeleton else {
            return Ok(());
        };

        let mut bones: Vec<NodeHandle> = Vec::with_capacity(self.joins.len());
        let mut bind_matrices = Vec::with_capacity(self.joins.len());
        let mut root: Option<NodeHandle> = None;

        for join in &self.joins {
            let index = if self.find_joins_by_idref {
                session.find_node_by_id(&join.name)
            } else {
                // Some exporters address joints by sid rather than name.
                session
                    .find_node_by_name(&join.name)
                    .or_else(|| session.find_node_by_sid(&join.name))
            };
            let bone = index
                .and_then(|i| nodes.get(i))
                .and_then(|n| n.scene_node)
                .ok_or_else(|| {
                    ImportError::InvalidParameter(format!(
                        "Unable to find the bones {}",
                        join.name
                    ))
                })?;

            // The skeleton root is the topmost ancestor of the first
            // resolved bone, and it must itself be a bone.
            if root.is_none() {
                let top = graph.topmost_ancestor(bone);
                let is_bone = graph.node(top).is_some_and(crate::scene::SceneNode::is_bone);
                if !is_bone {
                    return Err(ImportError::InvalidParameter(
                        "Root must be a bone".into(),
                    ));
                }

                let mut resolved = top;
                if let Some(hint) = self.skeleton_hints.first() {
                    match session
                        .find_node_by_id(hint)
                        .and_then(|i| nodes.get(i))
                        .and_then(|n| n.scene_node)
                    {
                        Some(hinted) => resolved = hinted,
                        None => log::warn!("Unresolved skeleton root hint {hint}"),
                    }
                }
                root = Some(resolved);
            }

            bones.push(bone);
            // Joint matrices arrive inverse; the engine binds the forward
            // bind matrix.
            bind_matrices.push(join.inv_matrix.inverse());
        }

        if let Some(skeleton) = graph.skeletons.get_mut(skeleton_key) {
            skeleton.bones = bones;
            skeleton.root = root;
        }
        if let Some(mesh) = self.mesh.and_then(|key| graph.meshes.get_mut(key)) {
            if let Some(skin) = &mut mesh.skin {
                skin.bind_matrices = bind_matrices;
            }
        }

        Ok(())
    }
}
