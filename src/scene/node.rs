use glam::Mat4;

use crate::scene::{MeshKey, NodeHandle};

/// Runtime node flavor. Bones participate in skeleton binding; plain
/// nodes do not.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SceneNodeKind {
    Node,
    Bone,
}

/// A materialized scene node.
///
/// Only the data every consumer needs lives here: identity (for bone
/// lookup), hierarchy links and the folded local transform. Renderables
/// are attached through the mesh pool.
#[derive(Debug, Clone)]
pub struct SceneNode {
    pub kind: SceneNodeKind,
    pub name: String,
    /// Document id of the source node; empty for synthetic nodes.
    pub id: String,
    /// Document scoped id, when declared.
    pub sid: Option<String>,
    /// Local transform folded from the source node's transform elements.
    pub local_matrix: Mat4,

    pub(crate) parent: Option<NodeHandle>,
    pub(crate) children: Vec<NodeHandle>,

    /// Attached renderable, if any.
    pub mesh: Option<MeshKey>,
}

impl SceneNode {
    #[must_use]
    pub fn new(kind: SceneNodeKind, name: &str) -> Self {
        Self {
            kind,
            name: name.to_string(),
            id: String::new(),
            sid: None,
            local_matrix: Mat4::IDENTITY,
            parent: None,
            children: Vec::new(),
            mesh: None,
        }
    }

    #[inline]
    #[must_use]
    pub fn parent(&self) -> Option<NodeHandle> {
        self.parent
    }

    #[inline]
    #[must_use]
    pub fn children(&self) -> &[NodeHandle] {
        &self.children
    }

    #[inline]
    #[must_use]
    pub fn is_bone(&self) -> bool {
        self.kind == SceneNodeKind::Bone
    }
}
