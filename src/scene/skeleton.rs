use crate::scene::NodeHandle;

/// A skeleton: the ordered bone list one skin binds against.
///
/// `bones[i]` is the scene bone for joint id `i`; the order matches the
/// skin's joint declaration order and the joint-id values in the mesh's
/// skin buffers. Bones and root are resolved by the post-import pass.
#[derive(Debug, Clone, Default)]
pub struct Skeleton {
    pub name: String,
    pub bones: Vec<NodeHandle>,
    pub root: Option<NodeHandle>,
}

impl Skeleton {
    #[must_use]
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            bones: Vec::new(),
            root: None,
        }
    }

    #[inline]
    #[must_use]
    pub fn bone(&self, joint_id: usize) -> Option<NodeHandle> {
        self.bones.get(joint_id).copied()
    }
}
