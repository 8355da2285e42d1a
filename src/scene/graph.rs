use slotmap::SlotMap;

use crate::scene::{
    Mesh, MeshKey, NodeHandle, SceneNode, SceneNodeKind, Skeleton, SkeletonKey,
};

/// The materialized scene: node arena plus mesh and skeleton pools.
///
/// A synthetic root node is created up front; imported root nodes attach
/// under it, except root-level bones, which stay unparented so a skeleton
/// root walk terminates on a bone.
#[derive(Debug)]
pub struct SceneGraph {
    pub nodes: SlotMap<NodeHandle, SceneNode>,
    pub meshes: SlotMap<MeshKey, Mesh>,
    pub skeletons: SlotMap<SkeletonKey, Skeleton>,
    root: NodeHandle,
}

impl SceneGraph {
    #[must_use]
    pub fn new() -> Self {
        let mut nodes = SlotMap::with_key();
        let root = nodes.insert(SceneNode::new(SceneNodeKind::Node, "scene_root"));
        Self {
            nodes,
            meshes: SlotMap::with_key(),
            skeletons: SlotMap::with_key(),
            root,
        }
    }

    /// The synthetic scene root.
    #[inline]
    #[must_use]
    pub fn root(&self) -> NodeHandle {
        self.root
    }

    pub fn create_node(&mut self, node: SceneNode) -> NodeHandle {
        self.nodes.insert(node)
    }

    /// Links `child` under `parent`, keeping both sides in sync.
    pub fn attach(&mut self, child: NodeHandle, parent: NodeHandle) {
        if let Some(node) = self.nodes.get_mut(child) {
            node.parent = Some(parent);
        }
        if let Some(node) = self.nodes.get_mut(parent) {
            node.children.push(child);
        }
    }

    #[inline]
    #[must_use]
    pub fn node(&self, handle: NodeHandle) -> Option<&SceneNode> {
        self.nodes.get(handle)
    }

    #[inline]
    pub fn node_mut(&mut self, handle: NodeHandle) -> Option<&mut SceneNode> {
        self.nodes.get_mut(handle)
    }

    /// Walks parent links to the topmost ancestor of `handle`, excluding
    /// the synthetic scene root.
    #[must_use]
    pub fn topmost_ancestor(&self, handle: NodeHandle) -> NodeHandle {
        let mut current = handle;
        while let Some(parent) = self.nodes.get(current).and_then(SceneNode::parent) {
            if parent == self.root {
                break;
            }
            current = parent;
        }
        current
    }
}

impl Default for SceneGraph {
    fn default() -> Self {
        Self::new()
    }
}
