// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! In-memory scene graph handed to the interchange writers.
//!
//! Nodes are stored in creation order and a parent is always created before
//! its children, so iterating [`SceneGraph::nodes`] is a valid top-down walk.

/// Index of a node in its [`SceneGraph`].
pub type NodeId = usize;

/// Translation axis of a curve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Axis {
    X,
    Y,
    Z,
}

impl Axis {
    /// All axes in X, Y, Z order.
    pub const ALL: [Self; 3] = [Self::X, Self::Y, Self::Z];
}

/// One key of an animation curve.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Keyframe {
    /// Time in seconds.
    pub time: f64,
    /// Curve value at `time`.
    pub value: f64,
}

/// A scalar curve, keys in insertion order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AnimCurve {
    keys: Vec<Keyframe>,
}

impl AnimCurve {
    /// Add a key at `time`.
    pub fn add_key(&mut self, time: f64, value: f64) {
        self.keys.push(Keyframe { time, value });
    }

    /// Keys in insertion order.
    #[must_use]
    pub fn keys(&self) -> &[Keyframe] {
        &self.keys
    }

    /// Number of keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// Whether the curve has no keys.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Value of the key at `index`.
    #[must_use]
    pub fn value(&self, index: usize) -> Option<f64> {
        self.keys.get(index).map(|k| k.value)
    }
}

/// Local translation curves of a node.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TranslationCurves {
    pub x: AnimCurve,
    pub y: AnimCurve,
    pub z: AnimCurve,
}

impl TranslationCurves {
    /// Curve for one axis.
    #[must_use]
    pub const fn curve(&self, axis: Axis) -> &AnimCurve {
        match axis {
            Axis::X => &self.x,
            Axis::Y => &self.y,
            Axis::Z => &self.z,
        }
    }

    /// Mutable curve for one axis.
    pub fn curve_mut(&mut self, axis: Axis) -> &mut AnimCurve {
        match axis {
            Axis::X => &mut self.x,
            Axis::Y => &mut self.y,
            Axis::Z => &mut self.z,
        }
    }

    /// Add the same key time on all three axes.
    pub fn add_key(&mut self, time: f64, value: [f64; 3]) {
        for (axis, v) in Axis::ALL.into_iter().zip(value) {
            self.curve_mut(axis).add_key(time, v);
        }
    }

    /// Translation at key `index`, if every axis has it.
    #[must_use]
    pub fn at(&self, index: usize) -> Option<[f64; 3]> {
        Some([self.x.value(index)?, self.y.value(index)?, self.z.value(index)?])
    }

    /// Whether no axis has keys.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.x.is_empty() && self.y.is_empty() && self.z.is_empty()
    }
}

/// What a node stands for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    /// Synthetic skeleton root.
    Root,
    /// Bone driven by one keypoint.
    Bone {
        /// Keypoint index.
        joint: usize,
    },
}

/// A named node with optional animated translation.
#[derive(Debug, Clone, PartialEq)]
pub struct SceneNode {
    pub name: String,
    pub kind: NodeKind,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
    pub translation: TranslationCurves,
}

/// Nodes plus the animation timing they share.
#[derive(Debug, Clone, PartialEq)]
pub struct SceneGraph {
    name: String,
    nodes: Vec<SceneNode>,
    frame_rate: f64,
    frame_count: usize,
}

impl SceneGraph {
    /// Create an empty scene.
    #[must_use]
    pub fn new(name: impl Into<String>, frame_rate: f64, frame_count: usize) -> Self {
        Self {
            name: name.into(),
            nodes: Vec::new(),
            frame_rate,
            frame_count,
        }
    }

    /// Add a node under `parent` (or at top level) and return its id.
    ///
    /// # Panics
    ///
    /// Panics if `parent` is not an existing node.
    pub fn add_node(&mut self, name: impl Into<String>, kind: NodeKind, parent: Option<NodeId>) -> NodeId {
        let id = self.nodes.len();
        if let Some(p) = parent {
            self.nodes[p].children.push(id);
        }
        self.nodes.push(SceneNode {
            name: name.into(),
            kind,
            parent,
            children: Vec::new(),
            translation: TranslationCurves::default(),
        });
        id
    }

    /// Scene name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// All nodes, parents before children.
    #[must_use]
    pub fn nodes(&self) -> &[SceneNode] {
        &self.nodes
    }

    /// Node by id.
    #[must_use]
    pub fn node(&self, id: NodeId) -> Option<&SceneNode> {
        self.nodes.get(id)
    }

    /// Mutable node by id.
    pub fn node_mut(&mut self, id: NodeId) -> Option<&mut SceneNode> {
        self.nodes.get_mut(id)
    }

    /// Nodes with no parent.
    pub fn top_level(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes
            .iter()
            .enumerate()
            .filter(|(_, n)| n.parent.is_none())
            .map(|(id, _)| id)
    }

    /// Bone node driven by keypoint `joint`.
    #[must_use]
    pub fn bone(&self, joint: usize) -> Option<&SceneNode> {
        self.nodes
            .iter()
            .find(|n| n.kind == NodeKind::Bone { joint })
    }

    /// Frames per second of the animation.
    #[must_use]
    pub const fn frame_rate(&self) -> f64 {
        self.frame_rate
    }

    /// Number of keyframes on every animated curve.
    #[must_use]
    pub const fn frame_count(&self) -> usize {
        self.frame_count
    }

    /// Key times shared by all curves.
    #[allow(clippy::cast_precision_loss)]
    pub fn key_times(&self) -> impl Iterator<Item = f64> + '_ {
        (0..self.frame_count).map(|f| f as f64 / self.frame_rate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parent_child_links() {
        let mut scene = SceneGraph::new("test", 30.0, 2);
        let root = scene.add_node("Root", NodeKind::Root, None);
        let a = scene.add_node("Bone_0", NodeKind::Bone { joint: 0 }, Some(root));
        let b = scene.add_node("Bone_1", NodeKind::Bone { joint: 1 }, Some(a));

        assert_eq!(scene.node(root).unwrap().children, vec![a]);
        assert_eq!(scene.node(b).unwrap().parent, Some(a));
        assert_eq!(scene.top_level().collect::<Vec<_>>(), vec![root]);
        assert_eq!(scene.bone(1).unwrap().name, "Bone_1");
    }

    #[test]
    fn test_translation_keys() {
        let mut curves = TranslationCurves::default();
        assert!(curves.is_empty());
        curves.add_key(0.0, [1.0, -2.0, 0.0]);
        curves.add_key(1.0 / 30.0, [3.0, -4.0, 0.0]);
        assert_eq!(curves.at(1), Some([3.0, -4.0, 0.0]));
        assert_eq!(curves.at(2), None);
        assert_eq!(curves.curve(Axis::Y).keys()[0].value, -2.0);
    }

    #[test]
    fn test_key_times() {
        let scene = SceneGraph::new("t", 30.0, 3);
        let times: Vec<f64> = scene.key_times().collect();
        assert_eq!(times, vec![0.0, 1.0 / 30.0, 2.0 / 30.0]);
    }
}
