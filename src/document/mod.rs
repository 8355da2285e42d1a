//! Input boundary: the typed COLLADA element tree.
//!
//! The document parser is an external collaborator. This module defines the
//! owned, already-parsed element model it must supply:
//! - [`Asset`] metadata (up-axis, unit),
//! - library content ([`GeometryElement`], [`ControllerElement`],
//!   [`AnimationElement`]),
//! - the visual scene node tree ([`NodeElement`]),
//! - id lookup and animation-channel target resolution
//!   ([`Document::resolve_target`]).
//!
//! Everything here is plain data; no XML, URLs or file IO.

pub mod animation;
pub mod controller;
pub mod geometry;
pub mod node;
pub mod source;

pub use animation::{AnimationElement, ChannelElement, SamplerElement};
pub use controller::{ControllerElement, SkinElement, VertexWeightsElement};
pub use geometry::{
    GeometryData, GeometryElement, MeshElement, PrimitiveKind, Primitives, SharedInput,
    UnsharedInput, VerticesElement,
};
pub use node::{
    InstanceController, InstanceGeometry, NodeElement, NodeKind, NodeTransform, TransformOp,
    VisualScene,
};
pub use source::{SourceArray, SourceElement};

/// Document up axis, from `<asset><up_axis>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UpAxis {
    X,
    #[default]
    Y,
    Z,
}

/// Document-level metadata, from `<asset>`.
#[derive(Debug, Clone)]
pub struct Asset {
    pub up_axis: UpAxis,
    /// Length of one document unit in meters.
    pub unit_meter: f32,
    pub unit_name: Option<String>,
    pub author: Option<String>,
    pub created: Option<String>,
    pub modified: Option<String>,
}

impl Default for Asset {
    fn default() -> Self {
        Self {
            up_axis: UpAxis::Y,
            unit_meter: 1.0,
            unit_name: None,
            author: None,
            created: None,
            modified: None,
        }
    }
}

/// An element addressed by an animation-channel target path.
#[derive(Debug, Clone, Copy)]
pub enum AddressedElement<'a> {
    /// A transform op inside a scene node.
    Transform(&'a TransformOp),
    /// A plain source array (generic parameter animation).
    Source(&'a SourceElement),
    /// A node addressed without a member path.
    Node(&'a NodeElement),
}

/// A resolved channel target: the owning element id plus what the path
/// addressed inside it.
#[derive(Debug, Clone, Copy)]
pub struct ResolvedTarget<'a> {
    pub id: &'a str,
    pub element: AddressedElement<'a>,
}

/// A fully parsed COLLADA document.
#[derive(Debug, Clone, Default)]
pub struct Document {
    pub asset: Asset,
    pub geometries: Vec<GeometryElement>,
    pub controllers: Vec<ControllerElement>,
    pub animations: Vec<AnimationElement>,
    pub scene: Option<VisualScene>,
}

impl Document {
    #[must_use]
    pub fn geometry_by_id(&self, id: &str) -> Option<&GeometryElement> {
        self.geometries.iter().find(|g| g.id == id)
    }

    #[must_use]
    pub fn controller_by_id(&self, id: &str) -> Option<&ControllerElement> {
        self.controllers.iter().find(|c| c.id == id)
    }

    /// Looks up a scene node by document id, searching the whole tree.
    #[must_use]
    pub fn node_by_id(&self, id: &str) -> Option<&NodeElement> {
        let scene = self.scene.as_ref()?;
        scene.nodes.iter().find_map(|n| n.find_by_id(id))
    }

    /// Resolves an animation-channel target path against the document.
    ///
    /// The path has the form `id`, `id/sid`, `id/sid.MEMBER` or
    /// `id/sid(index)`; the head id names a scene node (whose transform op
    /// the sid selects) or a raw animation source. Returns `None` when
    /// nothing matches; callers treat that as a warning, not an error.
    #[must_use]
    pub fn resolve_target(&self, target: &str) -> Option<ResolvedTarget<'_>> {
        let head_end = target
            .find(['/', '(', '.'])
            .unwrap_or(target.len());
        let head = &target[..head_end];

        if let Some(node) = self.node_by_id(head) {
            let rest = &target[head_end..];
            if let Some(rest) = rest.strip_prefix('/') {
                let sid_end = rest.find(['.', '(']).unwrap_or(rest.len());
                let sid = &rest[..sid_end];
                let op = node
                    .transforms
                    .iter()
                    .find(|t| t.sid.as_deref() == Some(sid))?;
                return Some(ResolvedTarget {
                    id: &node.id,
                    element: AddressedElement::Transform(&op.op),
                });
            }
            return Some(ResolvedTarget {
                id: &node.id,
                element: AddressedElement::Node(node),
            });
        }

        // Not a node: a raw source can be animated as a generic parameter.
        self.animations
            .iter()
            .find_map(|a| a.find_source(head))
            .map(|src| ResolvedTarget {
                id: src.id.as_str(),
                element: AddressedElement::Source(src),
            })
    }
}
