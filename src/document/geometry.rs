use crate::document::source::SourceElement;

/// An input with an explicit index-stream offset (`<input offset="..">`
/// under a primitive batch).
#[derive(Debug, Clone)]
pub struct SharedInput {
    pub semantic: String,
    /// Id of the referenced `<source>` (or of the `<vertices>` element for
    /// the VERTEX semantic).
    pub source: String,
    pub offset: usize,
}

impl SharedInput {
    #[must_use]
    pub fn new(semantic: &str, source: &str, offset: usize) -> Self {
        Self {
            semantic: semantic.to_string(),
            source: source.to_string(),
            offset,
        }
    }
}

/// An input without an offset (`<input>` under `<vertices>` or `<joints>`).
#[derive(Debug, Clone)]
pub struct UnsharedInput {
    pub semantic: String,
    pub source: String,
}

impl UnsharedInput {
    #[must_use]
    pub fn new(semantic: &str, source: &str) -> Self {
        Self {
            semantic: semantic.to_string(),
            source: source.to_string(),
        }
    }
}

/// The `<vertices>` element: per-vertex inputs shared by every primitive
/// batch of the mesh.
#[derive(Debug, Clone, Default)]
pub struct VerticesElement {
    pub id: String,
    pub inputs: Vec<UnsharedInput>,
}

/// Primitive batch flavor. Only triangles and polygon lists assemble;
/// the rest are rejected with a format error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrimitiveKind {
    Triangles,
    Polylist,
    Polygons,
    TriFans,
    TriStrips,
    Lines,
    LineStrips,
}

impl PrimitiveKind {
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Triangles => "triangles",
            Self::Polylist => "polylist",
            Self::Polygons => "polygons",
            Self::TriFans => "trifans",
            Self::TriStrips => "tristrips",
            Self::Lines => "lines",
            Self::LineStrips => "linestrips",
        }
    }
}

/// One primitive batch: a material name, offset-tagged inputs and the flat
/// interleaved index stream.
#[derive(Debug, Clone)]
pub struct Primitives {
    pub kind: PrimitiveKind,
    pub material: Option<String>,
    /// Number of primitives (triangles or polygons) in the batch.
    pub count: usize,
    pub inputs: Vec<SharedInput>,
    /// The `<p>` index stream, `stride` indices per vertex where stride is
    /// `max(input offset) + 1`.
    pub indices: Vec<u32>,
    /// Per-polygon vertex counts; polylist batches only.
    pub vcounts: Vec<u32>,
}

/// The mesh payload of a geometry.
#[derive(Debug, Clone, Default)]
pub struct MeshElement {
    pub sources: Vec<SourceElement>,
    pub vertices: VerticesElement,
    pub primitives: Vec<Primitives>,
}

impl MeshElement {
    #[must_use]
    pub fn source_by_id(&self, id: &str) -> Option<&SourceElement> {
        self.sources.iter().find(|s| s.id == id)
    }
}

/// Geometry payload: a mesh, or a spline (declared but never assembled).
#[derive(Debug, Clone)]
pub enum GeometryData {
    Mesh(MeshElement),
    Spline,
}

/// A `<geometry>` library entry.
#[derive(Debug, Clone)]
pub struct GeometryElement {
    pub id: String,
    pub name: String,
    pub data: GeometryData,
}
