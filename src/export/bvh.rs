// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! Biovision hierarchy (`.bvh`) writer.
//!
//! The root carries the usual six channels (all zero), every bone carries its
//! three position channels. Bone offsets are the first frame's translation.

use std::fmt::Write as _;

use super::SceneWriter;
use super::scene::{NodeId, SceneGraph};
use crate::error::{Result, RigError};

const ROOT_CHANNELS: &str = "CHANNELS 6 Xposition Yposition Zposition Zrotation Xrotation Yrotation";
const BONE_CHANNELS: &str = "CHANNELS 3 Xposition Yposition Zposition";

/// Writes `.bvh` files.
#[derive(Debug, Clone, Copy, Default)]
pub struct BvhWriter;

impl BvhWriter {
    fn write_node(
        scene: &SceneGraph,
        id: NodeId,
        depth: usize,
        is_root: bool,
        out: &mut String,
        order: &mut Vec<(NodeId, bool)>,
    ) {
        let Some(node) = scene.node(id) else {
            return;
        };
        let indent = "\t".repeat(depth);
        let offset = node.translation.at(0).unwrap_or([0.0; 3]);
        let keyword = if is_root { "ROOT" } else { "JOINT" };

        let _ = writeln!(out, "{indent}{keyword} {}", node.name);
        let _ = writeln!(out, "{indent}{{");
        let _ = writeln!(
            out,
            "{indent}\tOFFSET {} {} {}",
            fmt_value(offset[0]),
            fmt_value(offset[1]),
            fmt_value(offset[2])
        );
        let _ = writeln!(out, "{indent}\t{}", if is_root { ROOT_CHANNELS } else { BONE_CHANNELS });
        order.push((id, is_root));

        if node.children.is_empty() {
            let _ = writeln!(out, "{indent}\tEnd Site");
            let _ = writeln!(out, "{indent}\t{{");
            let _ = writeln!(out, "{indent}\t\tOFFSET 0.000000 0.000000 0.000000");
            let _ = writeln!(out, "{indent}\t}}");
        }
        for &child in &node.children {
            Self::write_node(scene, child, depth + 1, false, out, order);
        }
        let _ = writeln!(out, "{indent}}}");
    }
}

impl SceneWriter for BvhWriter {
    fn encode(&self, scene: &SceneGraph) -> Result<Vec<u8>> {
        let roots: Vec<NodeId> = scene.top_level().collect();
        let [root] = roots.as_slice() else {
            return Err(RigError::ExportIoError(format!(
                "BVH needs exactly one root node, scene has {}",
                roots.len()
            )));
        };

        let mut out = String::from("HIERARCHY\n");
        let mut order = Vec::new();
        Self::write_node(scene, *root, 0, true, &mut out, &mut order);

        let frames = scene.frame_count();
        out.push_str("MOTION\n");
        let _ = writeln!(out, "Frames: {frames}");
        let _ = writeln!(out, "Frame Time: {:.7}", 1.0 / scene.frame_rate());

        for f in 0..frames {
            let mut line: Vec<String> = Vec::with_capacity(order.len() * 3 + 3);
            for &(id, is_root) in &order {
                let node = &scene.nodes()[id];
                let t = if node.translation.is_empty() {
                    [0.0; 3]
                } else {
                    node.translation.at(f).ok_or_else(|| {
                        RigError::ExportIoError(format!(
                            "node '{}' is missing keyframe {f} of {frames}",
                            node.name
                        ))
                    })?
                };
                line.extend(t.iter().map(|&v| fmt_value(v)));
                if is_root {
                    line.extend(std::iter::repeat_n(fmt_value(0.0), 3));
                }
            }
            out.push_str(&line.join(" "));
            out.push('\n');
        }

        Ok(out.into_bytes())
    }
}

/// Fixed six decimals, without a sign on zero.
fn fmt_value(v: f64) -> String {
    format!("{:.6}", if v == 0.0 { 0.0 } else { v })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::export::scene::NodeKind;

    fn chain_scene(frames: usize) -> SceneGraph {
        let mut scene = SceneGraph::new("Scene", 30.0, frames);
        let root = scene.add_node("Root", NodeKind::Root, None);
        let b0 = scene.add_node("Bone_0", NodeKind::Bone { joint: 0 }, Some(root));
        let b1 = scene.add_node("Bone_1", NodeKind::Bone { joint: 1 }, Some(b0));
        for f in 0..frames {
            let t = f as f64 / 30.0;
            scene.node_mut(b0).unwrap().translation.add_key(t, [5.0, -5.0, 0.0]);
            scene.node_mut(b1).unwrap().translation.add_key(t, [f as f64, -0.0, 0.0]);
        }
        scene
    }

    #[test]
    fn test_bvh_hierarchy() {
        let text = String::from_utf8(BvhWriter.encode(&chain_scene(2)).unwrap()).unwrap();
        assert!(text.starts_with("HIERARCHY\nROOT Root\n{\n"));
        assert!(text.contains("\tJOINT Bone_0\n"));
        assert!(text.contains("\t\tJOINT Bone_1\n"));
        assert!(text.contains("\t\tOFFSET 5.000000 -5.000000 0.000000\n"));
        assert!(text.contains("End Site"));
        assert!(text.contains("Frames: 2\n"));
        assert!(text.contains("Frame Time: 0.0333333\n"));
    }

    #[test]
    fn test_bvh_motion_rows() {
        let text = String::from_utf8(BvhWriter.encode(&chain_scene(2)).unwrap()).unwrap();
        let rows: Vec<&str> = text.lines().skip_while(|l| !l.starts_with("Frame Time")).skip(1).collect();
        assert_eq!(rows.len(), 2);
        // root (6) + Bone_0 (3) + Bone_1 (3)
        assert_eq!(rows[1].split(' ').count(), 12);
        assert!(rows[1].ends_with("5.000000 -5.000000 0.000000 1.000000 0.000000 0.000000"));
    }

    #[test]
    fn test_bvh_requires_single_root() {
        let mut scene = SceneGraph::new("Scene", 30.0, 0);
        scene.add_node("A", NodeKind::Root, None);
        scene.add_node("B", NodeKind::Root, None);
        assert!(BvhWriter.encode(&scene).is_err());
    }
}
