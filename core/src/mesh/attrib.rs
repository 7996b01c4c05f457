//! Vertex attribute descriptions.

/// Semantic meaning of a vertex attribute.
///
/// The declaration order is the canonical attribute order inside a vertex.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum VertexSemantic {
    /// Vertex position (float3).
    Position,
    /// Vertex normal (float3).
    Normal,
    /// Vertex color (unorm8x4 or float4).
    Color,
    /// Texture coordinates, one per UV layer (float2).
    TexCoord,
    /// Tangent, one per UV layer (float4, w = handedness).
    Tangent,
    /// Bone indices for skinning (uint16x4).
    BoneIndices,
    /// Bone weights for skinning (float4).
    BoneWeights,
    /// Data that is carried along but never uploaded.
    Padding,
}

/// Numeric format of a vertex attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AttribFormat {
    /// Two 32-bit floats.
    Float2,
    /// Three 32-bit floats.
    Float3,
    /// Four 32-bit floats.
    Float4,
    /// Two 16-bit floats.
    Half2,
    /// Two 32-bit unsigned integers.
    Uint2,
    /// Four 16-bit unsigned integers.
    Uint16x4,
    /// Four 16-bit unsigned integers (normalized to 0.0-1.0).
    Unorm16x4,
    /// Four 8-bit unsigned integers (normalized to 0.0-1.0).
    Unorm8x4,
    /// Three signed 10-bit and one signed 2-bit component, normalized.
    Snorm1010102,
}

impl AttribFormat {
    /// Size in bytes of one element of this format.
    pub fn size(&self) -> usize {
        match self {
            Self::Float2 => 8,
            Self::Float3 => 12,
            Self::Float4 => 16,
            Self::Half2 => 4,
            Self::Uint2 => 8,
            Self::Uint16x4 | Self::Unorm16x4 => 8,
            Self::Unorm8x4 => 4,
            Self::Snorm1010102 => 4,
        }
    }
}

/// Identifies an attribute within a vertex: its semantic and UV layer.
pub type AttribKey = (VertexSemantic, usize);

/// A single vertex attribute: semantic, layer and numeric format.
///
/// Attributes compare by `(semantic, layer)` first, so sorting a list of
/// them gives the canonical in-vertex order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize)]
pub struct VertexAttrib {
    /// Semantic meaning of this attribute.
    pub semantic: VertexSemantic,
    /// UV layer for texcoords and tangents, 0 for everything else.
    pub layer: usize,
    /// Numeric format.
    pub format: AttribFormat,
}

impl VertexAttrib {
    /// Create an attribute.
    pub fn new(semantic: VertexSemantic, layer: usize, format: AttribFormat) -> Self {
        Self {
            semantic,
            layer,
            format,
        }
    }

    /// The `(semantic, layer)` key of this attribute.
    pub fn key(&self) -> AttribKey {
        (self.semantic, self.layer)
    }

    /// Size in bytes.
    pub fn size(&self) -> usize {
        self.format.size()
    }
}

impl PartialOrd for VertexAttrib {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for VertexAttrib {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.key()
            .cmp(&other.key())
            .then_with(|| (self.format as u8).cmp(&(other.format as u8)))
    }
}
