//! Output boundary: the engine-agnostic scene representation.
//!
//! Import produces a [`SceneGraph`]: an arena of nodes (plain nodes and
//! bones) plus pools for meshes and skeletons. Handles are stable slotmap
//! keys; parent/child links are handles, never references.

pub mod graph;
pub mod mesh;
pub mod node;
pub mod skeleton;

pub use graph::SceneGraph;
pub use mesh::{FaceGroup, Mesh, Skin};
pub use node::{SceneNode, SceneNodeKind};
pub use skeleton::Skeleton;

use slotmap::new_key_type;

new_key_type! {
    pub struct NodeHandle;
    pub struct MeshKey;
    pub struct SkeletonKey;
}
