/// The payload of a `<source>` element.
///
/// Exactly one array kind is present per source: float control data,
/// interpolation-mode names, or joint id references.
#[derive(Debug, Clone)]
pub enum SourceArray {
    Float(Vec<f32>),
    Name(Vec<String>),
    IdRef(Vec<String>),
}

/// A named flat array of control data.
#[derive(Debug, Clone)]
pub struct SourceElement {
    pub id: String,
    pub array: SourceArray,
    /// Components per element, from the accessor. 1 when unspecified.
    pub stride: usize,
}

impl SourceElement {
    #[must_use]
    pub fn floats(id: &str, data: Vec<f32>, stride: usize) -> Self {
        Self {
            id: id.to_string(),
            array: SourceArray::Float(data),
            stride,
        }
    }

    #[must_use]
    pub fn names(id: &str, names: &[&str]) -> Self {
        Self {
            id: id.to_string(),
            array: SourceArray::Name(names.iter().map(ToString::to_string).collect()),
            stride: 1,
        }
    }

    #[must_use]
    pub fn id_refs(id: &str, refs: &[&str]) -> Self {
        Self {
            id: id.to_string(),
            array: SourceArray::IdRef(refs.iter().map(ToString::to_string).collect()),
            stride: 1,
        }
    }

    /// The float data, if this is a float source.
    #[must_use]
    pub fn float_data(&self) -> Option<&[f32]> {
        match &self.array {
            SourceArray::Float(data) => Some(data),
            _ => None,
        }
    }
}
