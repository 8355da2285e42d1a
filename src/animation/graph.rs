use slotmap::{SlotMap, new_key_type};

use crate::animation::tracks::Track;
use crate::scene::NodeHandle;

new_key_type! {
    pub struct AnimNodeKey;
}

/// One node of the animation hierarchy: the tracks driving a single scene
/// node, linked into a tree mirroring the scene.
///
/// Nodes without tracks exist too: ancestors materialized on demand when
/// a descendant is the first animated node on its branch.
#[derive(Debug, Default)]
pub struct AnimationNode {
    pub(crate) parent: Option<AnimNodeKey>,
    pub(crate) children: Vec<AnimNodeKey>,
    pub tracks: Vec<Track>,
    /// The scene node this animation node drives.
    pub scene_node: Option<NodeHandle>,
}

impl AnimationNode {
    #[inline]
    #[must_use]
    pub fn parent(&self) -> Option<AnimNodeKey> {
        self.parent
    }

    #[inline]
    #[must_use]
    pub fn children(&self) -> &[AnimNodeKey] {
        &self.children
    }

    /// The combined rotation track of this node, if one exists.
    pub fn rotation_track_mut(&mut self) -> Option<&mut Track> {
        self.tracks.iter_mut().find(|t| t.is_rotation_target())
    }
}

/// The animation-node arena plus the document-wide duration.
///
/// `duration` is the maximum over every channel's raw input times; all key
/// times inside the tracks are normalized by it.
#[derive(Debug, Default)]
pub struct AnimationGraph {
    pub nodes: SlotMap<AnimNodeKey, AnimationNode>,
    /// Overall animation duration, in document time units.
    pub duration: f32,
}

impl AnimationGraph {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocates an animation node for `scene_node` under `parent`,
    /// linking both sides.
    pub fn create_node(
        &mut self,
        parent: Option<AnimNodeKey>,
        scene_node: Option<NodeHandle>,
    ) -> AnimNodeKey {
        let key = self.nodes.insert(AnimationNode {
            parent,
            children: Vec::new(),
            tracks: Vec::new(),
            scene_node,
        });
        if let Some(parent) = parent {
            if let Some(node) = self.nodes.get_mut(parent) {
                node.children.push(key);
            }
        }
        key
    }

    #[inline]
    #[must_use]
    pub fn node(&self, key: AnimNodeKey) -> Option<&AnimationNode> {
        self.nodes.get(key)
    }

    #[inline]
    pub fn node_mut(&mut self, key: AnimNodeKey) -> Option<&mut AnimationNode> {
        self.nodes.get_mut(key)
    }

    /// The animation root: the node with no parent animation node.
    #[must_use]
    pub fn root(&self) -> Option<AnimNodeKey> {
        self.nodes
            .iter()
            .find(|(_, node)| node.parent.is_none())
            .map(|(key, _)| key)
    }
}
