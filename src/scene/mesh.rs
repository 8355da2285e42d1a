use glam::Mat4;

use crate::scene::SkeletonKey;

/// One triangulated index batch with its material name.
#[derive(Debug, Clone, Default)]
pub struct FaceGroup {
    pub material: Option<String>,
    /// Shared-index triangle list, three indices per face.
    pub indices: Vec<u32>,
}

/// Skin binding data attached to a mesh.
///
/// The weight/joint buffers hold four slots per assembled vertex; unused
/// slots carry weight `0.0` and joint id `-1`. `bind_matrices` stays empty
/// until the post-import pass resolves the skeleton.
#[derive(Debug, Clone)]
pub struct Skin {
    pub skeleton: SkeletonKey,
    pub joint_count: usize,
    /// `4 * vertex_count` weights, declaration order preserved.
    pub weights: Vec<f32>,
    /// `4 * vertex_count` joint ids, `-1` marking an empty slot.
    pub joint_ids: Vec<i32>,
    /// Per-joint bind matrix (inverse of the declared inverse bind
    /// matrix), joint-id order. Filled by the post-import pass.
    pub bind_matrices: Vec<Mat4>,
    /// Bind-time transform applied to the geometry before deformation.
    pub shape_matrix: Mat4,
}

/// A shared-index triangle mesh.
///
/// `positions` is always present; `normals` and `texcoords` are either
/// populated for every vertex or empty (attributes never vary per face).
#[derive(Debug, Clone, Default)]
pub struct Mesh {
    pub name: String,
    /// xyz per vertex.
    pub positions: Vec<f32>,
    /// xyz per vertex, or empty.
    pub normals: Vec<f32>,
    /// uv per vertex, or empty.
    pub texcoords: Vec<f32>,
    pub groups: Vec<FaceGroup>,
    pub skin: Option<Skin>,
}

impl Mesh {
    /// Number of deduplicated vertices.
    #[inline]
    #[must_use]
    pub fn vertex_count(&self) -> usize {
        self.positions.len() / 3
    }
}
