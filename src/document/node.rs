use glam::{Mat4, Vec3, Vec4};

/// Scene node flavor: a plain node or a skeleton joint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NodeKind {
    #[default]
    Node,
    Joint,
}

/// One transform element inside a `<node>`, in declaration order.
#[derive(Debug, Clone, Copy)]
pub enum TransformOp {
    Translate(Vec3),
    /// Axis (xyz) + angle in degrees (w).
    Rotate(Vec4),
    Scale(Vec3),
    Matrix(Mat4),
    /// Eye, target, up.
    LookAt([f32; 9]),
    /// Angle in degrees, rotation axis, translation axis.
    Skew([f32; 7]),
}

/// A transform op with its optional scoped id, the anchor animation
/// channels address.
#[derive(Debug, Clone)]
pub struct NodeTransform {
    pub sid: Option<String>,
    pub op: TransformOp,
}

impl NodeTransform {
    #[must_use]
    pub fn new(sid: &str, op: TransformOp) -> Self {
        Self {
            sid: Some(sid.to_string()),
            op,
        }
    }

    #[must_use]
    pub fn anonymous(op: TransformOp) -> Self {
        Self { sid: None, op }
    }
}

/// An `<instance_geometry>` under a node.
#[derive(Debug, Clone)]
pub struct InstanceGeometry {
    /// Id of the instantiated geometry.
    pub url: String,
}

/// An `<instance_controller>` under a node.
#[derive(Debug, Clone)]
pub struct InstanceController {
    /// Id of the instantiated controller.
    pub url: String,
    /// Skeleton-root hint node ids, from `<skeleton>` children.
    pub skeletons: Vec<String>,
}

/// A `<node>` of the visual scene.
#[derive(Debug, Clone, Default)]
pub struct NodeElement {
    pub id: String,
    pub sid: Option<String>,
    pub name: Option<String>,
    pub kind: NodeKind,
    pub transforms: Vec<NodeTransform>,
    pub instance_geometries: Vec<InstanceGeometry>,
    pub instance_controllers: Vec<InstanceController>,
    pub children: Vec<NodeElement>,
}

impl NodeElement {
    #[must_use]
    pub fn new(id: &str, kind: NodeKind) -> Self {
        Self {
            id: id.to_string(),
            kind,
            ..Self::default()
        }
    }

    /// Depth-first id search over this node and its descendants.
    #[must_use]
    pub fn find_by_id(&self, id: &str) -> Option<&NodeElement> {
        if self.id == id {
            return Some(self);
        }
        self.children.iter().find_map(|c| c.find_by_id(id))
    }
}

/// The `<visual_scene>` entry the document's `<scene>` instantiates.
#[derive(Debug, Clone, Default)]
pub struct VisualScene {
    pub id: String,
    pub name: Option<String>,
    pub nodes: Vec<NodeElement>,
}
