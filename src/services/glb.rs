use serde::Serialize;
use std::fs;
use std::path::Path;

/// GLB header magic, "glTF" in ASCII.
pub const GLB_MAGIC: u32 = 0x4654_6C67;
/// Container format version.
pub const GLB_VERSION: u32 = 2;
/// Chunk type tag for the structured JSON chunk ("JSON").
pub const CHUNK_JSON: u32 = 0x4E4F_534A;
/// Chunk type tag for the raw binary chunk ("BIN\0").
pub const CHUNK_BIN: u32 = 0x004E_4942;

/// glTF component types.
const COMPONENT_F32: u32 = 5126;
const COMPONENT_U16: u32 = 5123;
/// Primitive mode 4 = triangles.
const MODE_TRIANGLES: u32 = 4;

/// Placeholder box mesh: 8 corners, 12 triangles. Roughly human-sized
/// (0.4m x 1.6m x 0.2m) so downstream viewers frame it sensibly.
pub const PLACEHOLDER_POSITIONS: [[f32; 3]; 8] = [
    [-0.2, 0.0, -0.1],
    [0.2, 0.0, -0.1],
    [0.2, 0.0, 0.1],
    [-0.2, 0.0, 0.1],
    [-0.2, 1.6, -0.1],
    [0.2, 1.6, -0.1],
    [0.2, 1.6, 0.1],
    [-0.2, 1.6, 0.1],
];

#[rustfmt::skip]
pub const PLACEHOLDER_INDICES: [u16; 36] = [
    0, 1, 2, 0, 2, 3, 4, 6, 5, 4, 7, 6,
    0, 4, 5, 0, 5, 1, 2, 6, 7, 2, 7, 3,
    0, 3, 7, 0, 7, 4, 1, 5, 6, 1, 6, 2,
];

#[derive(Debug, thiserror::Error)]
pub enum GlbError {
    #[error("GLB write failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("glTF document encoding failed: {0}")]
    Encode(#[from] serde_json::Error),
}

// Minimal glTF 2.0 document, just enough for one indexed triangle mesh.

#[derive(Serialize)]
struct GltfDocument<'a> {
    asset: GltfAsset<'a>,
    scene: u32,
    scenes: [GltfScene; 1],
    nodes: [GltfNode; 1],
    meshes: [GltfMesh; 1],
    accessors: [GltfAccessor; 2],
    #[serde(rename = "bufferViews")]
    buffer_views: [GltfBufferView; 2],
    buffers: [GltfBuffer; 1],
}

#[derive(Serialize)]
struct GltfAsset<'a> {
    version: &'static str,
    generator: &'a str,
}

#[derive(Serialize)]
struct GltfScene {
    nodes: [u32; 1],
}

#[derive(Serialize)]
struct GltfNode {
    mesh: u32,
}

#[derive(Serialize)]
struct GltfMesh {
    primitives: [GltfPrimitive; 1],
}

#[derive(Serialize)]
struct GltfPrimitive {
    attributes: GltfAttributes,
    indices: u32,
    mode: u32,
}

#[derive(Serialize)]
struct GltfAttributes {
    #[serde(rename = "POSITION")]
    position: u32,
}

#[derive(Serialize)]
struct GltfAccessor {
    #[serde(rename = "bufferView")]
    buffer_view: u32,
    #[serde(rename = "componentType")]
    component_type: u32,
    count: u32,
    #[serde(rename = "type")]
    accessor_type: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    min: Option<[f32; 3]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max: Option<[f32; 3]>,
}

#[derive(Serialize)]
struct GltfBufferView {
    buffer: u32,
    #[serde(rename = "byteOffset")]
    byte_offset: u32,
    #[serde(rename = "byteLength")]
    byte_length: u32,
}

#[derive(Serialize)]
struct GltfBuffer {
    #[serde(rename = "byteLength")]
    byte_length: u32,
}

/// Component-wise bounds of the position buffer, required on the POSITION
/// accessor by the glTF spec. An empty buffer gets zeroed bounds so the
/// document stays numerically valid.
fn position_bounds(positions: &[[f32; 3]]) -> ([f32; 3], [f32; 3]) {
    let Some(first) = positions.first() else {
        return ([0.0; 3], [0.0; 3]);
    };
    let mut min = *first;
    let mut max = *first;
    for p in positions {
        for axis in 0..3 {
            min[axis] = min[axis].min(p[axis]);
            max[axis] = max[axis].max(p[axis]);
        }
    }
    (min, max)
}

/// Encode an indexed triangle mesh as a self-contained GLB (binary glTF 2.0)
/// buffer.
///
/// Layout: 12-byte header (magic, version, total length), a JSON chunk
/// space-padded to a 4-byte boundary, then a BIN chunk holding the position
/// floats immediately followed by the u16 indices, zero-padded to a 4-byte
/// boundary. The accessor/bufferView byte ranges in the JSON chunk describe
/// exactly those two sub-regions; the declared total length is backpatched
/// into the header last.
///
/// An empty mesh still encodes: the accessors declare count 0 with zeroed
/// POSITION bounds and the BIN chunk is empty.
pub fn encode_glb(
    positions: &[[f32; 3]],
    indices: &[u16],
    generator: &str,
) -> Result<Vec<u8>, GlbError> {
    // BIN chunk payload: positions then indices, zero-padded to 4 bytes.
    let pos_len = (positions.len() * 3 * 4) as u32;
    let idx_len = (indices.len() * 2) as u32;
    let bin_padded_len = (pos_len + idx_len).div_ceil(4) * 4;

    let mut bin = Vec::with_capacity(bin_padded_len as usize);
    for p in positions {
        for component in p {
            bin.extend_from_slice(&component.to_le_bytes());
        }
    }
    for i in indices {
        bin.extend_from_slice(&i.to_le_bytes());
    }
    bin.resize(bin_padded_len as usize, 0);

    let (min, max) = position_bounds(positions);
    let document = GltfDocument {
        asset: GltfAsset {
            version: "2.0",
            generator,
        },
        scene: 0,
        scenes: [GltfScene { nodes: [0] }],
        nodes: [GltfNode { mesh: 0 }],
        meshes: [GltfMesh {
            primitives: [GltfPrimitive {
                attributes: GltfAttributes { position: 0 },
                indices: 1,
                mode: MODE_TRIANGLES,
            }],
        }],
        accessors: [
            GltfAccessor {
                buffer_view: 0,
                component_type: COMPONENT_F32,
                count: positions.len() as u32,
                accessor_type: "VEC3",
                min: Some(min),
                max: Some(max),
            },
            GltfAccessor {
                buffer_view: 1,
                component_type: COMPONENT_U16,
                count: indices.len() as u32,
                accessor_type: "SCALAR",
                min: None,
                max: None,
            },
        ],
        buffer_views: [
            GltfBufferView {
                buffer: 0,
                byte_offset: 0,
                byte_length: pos_len,
            },
            GltfBufferView {
                buffer: 0,
                byte_offset: pos_len,
                byte_length: idx_len,
            },
        ],
        buffers: [GltfBuffer {
            byte_length: bin_padded_len,
        }],
    };

    // JSON chunk payload, space-padded to 4 bytes per the GLB spec.
    let mut json = serde_json::to_vec(&document)?;
    let json_padded_len = json.len().div_ceil(4) * 4;
    json.resize(json_padded_len, b' ');

    let total_len = 12 + 8 + json.len() as u32 + 8 + bin.len() as u32;

    let mut out = Vec::with_capacity(total_len as usize);
    out.extend_from_slice(&GLB_MAGIC.to_le_bytes());
    out.extend_from_slice(&GLB_VERSION.to_le_bytes());
    out.extend_from_slice(&total_len.to_le_bytes());

    out.extend_from_slice(&(json.len() as u32).to_le_bytes());
    out.extend_from_slice(&CHUNK_JSON.to_le_bytes());
    out.extend_from_slice(&json);

    out.extend_from_slice(&(bin.len() as u32).to_le_bytes());
    out.extend_from_slice(&CHUNK_BIN.to_le_bytes());
    out.extend_from_slice(&bin);

    Ok(out)
}

/// Encode a mesh and write it to `path`, creating parent directories as
/// needed. The file is written once and never mutated afterwards.
pub fn write_glb(
    path: &Path,
    positions: &[[f32; 3]],
    indices: &[u16],
    generator: &str,
) -> Result<(), GlbError> {
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir)?;
    }
    let glb = encode_glb(positions, indices, generator)?;
    fs::write(path, glb)?;
    Ok(())
}
