use glam::Mat4;

use crate::document::geometry::{SharedInput, UnsharedInput};
use crate::document::source::SourceElement;

/// The `<vertex_weights>` block of a skin: how many influences each
/// pre-dedup vertex carries, and the flat (joint, weight-index) pair
/// stream.
#[derive(Debug, Clone, Default)]
pub struct VertexWeightsElement {
    /// Number of vertices described (length of `vcount`).
    pub count: usize,
    pub inputs: Vec<SharedInput>,
    /// Influences per vertex.
    pub vcount: Vec<u32>,
    /// Pairs of (joint id, weight index), `vcount[i]` pairs per vertex.
    pub v: Vec<i32>,
}

/// The `<skin>` payload of a controller.
#[derive(Debug, Clone)]
pub struct SkinElement {
    /// Id of the skinned geometry.
    pub source: String,
    pub bind_shape_matrix: Mat4,
    pub sources: Vec<SourceElement>,
    /// `<joints>` inputs: JOINT and INV_BIND_MATRIX semantics.
    pub joint_inputs: Vec<UnsharedInput>,
    pub vertex_weights: VertexWeightsElement,
}

impl SkinElement {
    #[must_use]
    pub fn source_by_id(&self, id: &str) -> Option<&SourceElement> {
        self.sources.iter().find(|s| s.id == id)
    }

    /// The source behind a `<joints>` input with the given semantic.
    #[must_use]
    pub fn joint_input_source(&self, semantic: &str) -> Option<&SourceElement> {
        let input = self.joint_inputs.iter().find(|i| i.semantic == semantic)?;
        self.source_by_id(&input.source)
    }

    /// The source behind a `<vertex_weights>` input with the given semantic.
    #[must_use]
    pub fn weight_input_source(&self, semantic: &str) -> Option<&SourceElement> {
        let input = self
            .vertex_weights
            .inputs
            .iter()
            .find(|i| i.semantic == semantic)?;
        self.source_by_id(&input.source)
    }
}

/// A `<controller>` library entry. Morph controllers are not part of the
/// model; the parser only supplies skins.
#[derive(Debug, Clone)]
pub struct ControllerElement {
    pub id: String,
    pub name: Option<String>,
    pub skin: SkinElement,
}
