use crate::document::geometry::UnsharedInput;
use crate::document::source::SourceElement;

/// A `<sampler>`: maps semantic roles (INPUT, OUTPUT, INTERPOLATION,
/// IN_TANGENT, OUT_TANGENT) to source ids.
#[derive(Debug, Clone)]
pub struct SamplerElement {
    pub id: String,
    pub inputs: Vec<UnsharedInput>,
}

impl SamplerElement {
    #[must_use]
    pub fn source_id(&self, semantic: &str) -> Option<&str> {
        self.inputs
            .iter()
            .find(|i| i.semantic == semantic)
            .map(|i| i.source.as_str())
    }
}

/// A `<channel>`: binds one sampler's output curve to one target path.
#[derive(Debug, Clone)]
pub struct ChannelElement {
    /// Id of the driving sampler.
    pub sampler: String,
    /// Target path, e.g. `node/rotateX.ANGLE` or `node/matrix`.
    pub target: String,
}

impl ChannelElement {
    #[must_use]
    pub fn new(sampler: &str, target: &str) -> Self {
        Self {
            sampler: sampler.to_string(),
            target: target.to_string(),
        }
    }
}

/// An `<animation>` element: sources, samplers and channels, plus nested
/// sub-animations used for grouping.
#[derive(Debug, Clone, Default)]
pub struct AnimationElement {
    pub id: String,
    pub sources: Vec<SourceElement>,
    pub samplers: Vec<SamplerElement>,
    pub channels: Vec<ChannelElement>,
    pub children: Vec<AnimationElement>,
}

impl AnimationElement {
    /// Finds a source by id in this element or any descendant.
    #[must_use]
    pub fn find_source(&self, id: &str) -> Option<&SourceElement> {
        self.sources
            .iter()
            .find(|s| s.id == id)
            .or_else(|| self.children.iter().find_map(|c| c.find_source(id)))
    }
}
