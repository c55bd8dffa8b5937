// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! Binary glTF 2.0 (`.glb`) writer.
//!
//! Every scene node becomes a glTF node, bones are grouped in a skin, and each
//! animated node gets one `translation` channel sampled on a shared time
//! accessor. All binary data lives in the single GLB `BIN` chunk.

use serde::Serialize;

use super::SceneWriter;
use super::scene::{NodeKind, SceneGraph};
use crate::error::{Result, RigError};

const GLB_MAGIC: u32 = 0x4654_6C67; // "glTF"
const GLB_VERSION: u32 = 2;
const CHUNK_JSON: u32 = 0x4E4F_534A;
const CHUNK_BIN: u32 = 0x004E_4942;
const COMPONENT_FLOAT: u32 = 5126;

#[derive(Serialize)]
struct Root {
    asset: Asset,
    scene: usize,
    scenes: Vec<Scene>,
    nodes: Vec<Node>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    skins: Vec<Skin>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    animations: Vec<Animation>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    accessors: Vec<Accessor>,
    #[serde(rename = "bufferViews", skip_serializing_if = "Vec::is_empty")]
    buffer_views: Vec<BufferView>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    buffers: Vec<Buffer>,
}

#[derive(Serialize)]
struct Asset {
    version: &'static str,
    generator: String,
}

#[derive(Serialize)]
struct Scene {
    name: String,
    nodes: Vec<usize>,
}

#[derive(Serialize)]
struct Node {
    name: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    children: Vec<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    translation: Option<[f32; 3]>,
}

#[derive(Serialize)]
struct Skin {
    name: &'static str,
    skeleton: usize,
    joints: Vec<usize>,
}

#[derive(Serialize)]
struct Animation {
    name: &'static str,
    channels: Vec<Channel>,
    samplers: Vec<Sampler>,
}

#[derive(Serialize)]
struct Channel {
    sampler: usize,
    target: Target,
}

#[derive(Serialize)]
struct Target {
    node: usize,
    path: &'static str,
}

#[derive(Serialize)]
struct Sampler {
    input: usize,
    output: usize,
    interpolation: &'static str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Accessor {
    buffer_view: usize,
    component_type: u32,
    count: usize,
    #[serde(rename = "type")]
    kind: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    min: Option<Vec<f32>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max: Option<Vec<f32>>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct BufferView {
    buffer: usize,
    byte_offset: usize,
    byte_length: usize,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Buffer {
    byte_length: usize,
}

/// Writes `.glb` files.
#[derive(Debug, Clone, Copy, Default)]
pub struct GlbWriter;

impl GlbWriter {
    /// Append little-endian floats to `bin` and register a view + accessor for them.
    fn push_accessor(
        root: &mut Root,
        bin: &mut Vec<u8>,
        values: &[f32],
        kind: &'static str,
        bounds: Option<(Vec<f32>, Vec<f32>)>,
    ) -> usize {
        let components = if kind == "VEC3" { 3 } else { 1 };
        let offset = bin.len();
        for v in values {
            bin.extend_from_slice(&v.to_le_bytes());
        }
        root.buffer_views.push(BufferView {
            buffer: 0,
            byte_offset: offset,
            byte_length: bin.len() - offset,
        });
        let (min, max) = bounds.map_or((None, None), |(lo, hi)| (Some(lo), Some(hi)));
        root.accessors.push(Accessor {
            buffer_view: root.buffer_views.len() - 1,
            component_type: COMPONENT_FLOAT,
            count: values.len() / components,
            kind,
            min,
            max,
        });
        root.accessors.len() - 1
    }
}

impl SceneWriter for GlbWriter {
    #[allow(clippy::cast_possible_truncation)]
    fn encode(&self, scene: &SceneGraph) -> Result<Vec<u8>> {
        let frames = scene.frame_count();
        let mut root = Root {
            asset: Asset {
                version: "2.0",
                generator: format!("{} {}", crate::NAME, crate::VERSION),
            },
            scene: 0,
            scenes: vec![Scene {
                name: scene.name().to_string(),
                nodes: scene.top_level().collect(),
            }],
            nodes: Vec::with_capacity(scene.nodes().len()),
            skins: Vec::new(),
            animations: Vec::new(),
            accessors: Vec::new(),
            buffer_views: Vec::new(),
            buffers: Vec::new(),
        };
        let mut bin: Vec<u8> = Vec::new();

        for node in scene.nodes() {
            root.nodes.push(Node {
                name: node.name.clone(),
                children: node.children.clone(),
                translation: node
                    .translation
                    .at(0)
                    .map(|t| [t[0] as f32, t[1] as f32, t[2] as f32]),
            });
        }

        let animated: Vec<usize> = scene
            .nodes()
            .iter()
            .enumerate()
            .filter(|(_, n)| !n.translation.is_empty())
            .map(|(id, _)| id)
            .collect();

        if frames > 0 && !animated.is_empty() {
            let times: Vec<f32> = scene.key_times().map(|t| t as f32).collect();
            let (t_min, t_max) = (times[0], times[times.len() - 1]);
            let input = Self::push_accessor(
                &mut root,
                &mut bin,
                &times,
                "SCALAR",
                Some((vec![t_min], vec![t_max])),
            );

            let mut channels = Vec::with_capacity(animated.len());
            let mut samplers = Vec::with_capacity(animated.len());
            for &id in &animated {
                let node = &scene.nodes()[id];
                let mut values = Vec::with_capacity(frames * 3);
                for f in 0..frames {
                    let t = node.translation.at(f).ok_or_else(|| {
                        RigError::ExportIoError(format!(
                            "node '{}' is missing keyframe {f} of {frames}",
                            node.name
                        ))
                    })?;
                    values.extend(t.iter().map(|&v| v as f32));
                }
                let output = Self::push_accessor(&mut root, &mut bin, &values, "VEC3", None);
                samplers.push(Sampler {
                    input,
                    output,
                    interpolation: "LINEAR",
                });
                channels.push(Channel {
                    sampler: samplers.len() - 1,
                    target: Target {
                        node: id,
                        path: "translation",
                    },
                });
            }
            root.animations.push(Animation {
                name: "Take 001",
                channels,
                samplers,
            });
            root.buffers.push(Buffer {
                byte_length: bin.len(),
            });
        }

        let joints: Vec<usize> = scene
            .nodes()
            .iter()
            .enumerate()
            .filter(|(_, n)| matches!(n.kind, NodeKind::Bone { .. }))
            .map(|(id, _)| id)
            .collect();
        if !joints.is_empty() {
            let skeleton = scene
                .nodes()
                .iter()
                .position(|n| n.kind == NodeKind::Root)
                .unwrap_or(joints[0]);
            root.skins.push(Skin {
                name: "Armature",
                skeleton,
                joints,
            });
        }

        let mut json = serde_json::to_vec(&root)
            .map_err(|e| RigError::ExportIoError(format!("Failed to serialize glTF JSON: {e}")))?;
        pad_to_four(&mut json, b' ');
        pad_to_four(&mut bin, 0);

        let mut total = 12 + 8 + json.len();
        if !bin.is_empty() {
            total += 8 + bin.len();
        }

        let mut out = Vec::with_capacity(total);
        out.extend_from_slice(&GLB_MAGIC.to_le_bytes());
        out.extend_from_slice(&GLB_VERSION.to_le_bytes());
        out.extend_from_slice(&(total as u32).to_le_bytes());
        out.extend_from_slice(&(json.len() as u32).to_le_bytes());
        out.extend_from_slice(&CHUNK_JSON.to_le_bytes());
        out.extend_from_slice(&json);
        if !bin.is_empty() {
            out.extend_from_slice(&(bin.len() as u32).to_le_bytes());
            out.extend_from_slice(&CHUNK_BIN.to_le_bytes());
            out.extend_from_slice(&bin);
        }
        Ok(out)
    }
}

fn pad_to_four(bytes: &mut Vec<u8>, fill: u8) {
    while bytes.len() % 4 != 0 {
        bytes.push(fill);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::export::scene::NodeKind;

    fn read_u32(bytes: &[u8], at: usize) -> u32 {
        u32::from_le_bytes(bytes[at..at + 4].try_into().unwrap())
    }

    fn two_bone_scene() -> SceneGraph {
        let mut scene = SceneGraph::new("Scene", 30.0, 2);
        let root = scene.add_node("Root", NodeKind::Root, None);
        let b0 = scene.add_node("Bone_0", NodeKind::Bone { joint: 0 }, Some(root));
        let b1 = scene.add_node("Bone_1", NodeKind::Bone { joint: 1 }, Some(b0));
        for (id, base) in [(b0, 1.0), (b1, 2.0)] {
            let node = scene.node_mut(id).unwrap();
            node.translation.add_key(0.0, [base, -base, 0.0]);
            node.translation.add_key(1.0 / 30.0, [base + 1.0, -base, 0.0]);
        }
        scene
    }

    #[test]
    fn test_glb_layout() {
        let bytes = GlbWriter.encode(&two_bone_scene()).unwrap();
        assert_eq!(read_u32(&bytes, 0), GLB_MAGIC);
        assert_eq!(read_u32(&bytes, 4), 2);
        assert_eq!(read_u32(&bytes, 8) as usize, bytes.len());
        assert_eq!(bytes.len() % 4, 0);

        let json_len = read_u32(&bytes, 12) as usize;
        assert_eq!(read_u32(&bytes, 16), CHUNK_JSON);
        let json: serde_json::Value = serde_json::from_slice(&bytes[20..20 + json_len]).unwrap();

        assert_eq!(json["asset"]["version"], "2.0");
        assert_eq!(json["nodes"].as_array().unwrap().len(), 3);
        assert_eq!(json["nodes"][1]["name"], "Bone_0");
        assert_eq!(json["nodes"][1]["children"][0], 2);
        assert_eq!(json["animations"][0]["channels"].as_array().unwrap().len(), 2);
        assert_eq!(json["animations"][0]["channels"][1]["target"]["path"], "translation");
        assert_eq!(json["skins"][0]["joints"], serde_json::json!([1, 2]));

        // 2 times + 2 nodes * 2 frames * 3 floats
        let bin_at = 20 + json_len;
        assert_eq!(read_u32(&bytes, bin_at + 4), CHUNK_BIN);
        assert_eq!(read_u32(&bytes, bin_at) as usize, (2 + 12) * 4);
        assert_eq!(json["buffers"][0]["byteLength"], (2 + 12) * 4);
    }

    #[test]
    fn test_glb_translation_values() {
        let bytes = GlbWriter.encode(&two_bone_scene()).unwrap();
        let json_len = read_u32(&bytes, 12) as usize;
        let bin = &bytes[20 + json_len + 8..];
        let floats: Vec<f32> = bin
            .chunks_exact(4)
            .map(|c| f32::from_le_bytes(c.try_into().unwrap()))
            .collect();
        // time accessor first, then Bone_0 frames
        assert_eq!(floats[0], 0.0);
        assert_eq!(&floats[2..8], &[1.0, -1.0, 0.0, 2.0, -1.0, 0.0]);
    }

    #[test]
    fn test_missing_keyframe_is_error() {
        let mut scene = SceneGraph::new("Scene", 30.0, 3);
        let root = scene.add_node("Root", NodeKind::Root, None);
        let b0 = scene.add_node("Bone_0", NodeKind::Bone { joint: 0 }, Some(root));
        scene.node_mut(b0).unwrap().translation.add_key(0.0, [0.0; 3]);
        assert!(matches!(GlbWriter.encode(&scene), Err(RigError::ExportIoError(_))));
    }
}
