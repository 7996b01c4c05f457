//! Vertex and index formats shared between meshes.
//!
//! Two meshes with equal [`VertexFormat`]s can be packed into the same
//! vertex array and drawn with the same pipeline.

use super::attrib::VertexAttrib;

/// Index data format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IndexFormat {
    /// 16-bit unsigned integers (fewer than 65536 vertices).
    #[default]
    Uint16,
    /// 32-bit unsigned integers.
    Uint32,
}

impl IndexFormat {
    /// Get the size in bytes of each index.
    pub fn size(&self) -> usize {
        match self {
            Self::Uint16 => 2,
            Self::Uint32 => 4,
        }
    }

    /// Smallest format able to address `vertex_count` vertices.
    pub fn for_vertex_count(vertex_count: usize) -> Self {
        if vertex_count < 1 << 16 {
            Self::Uint16
        } else {
            Self::Uint32
        }
    }
}

/// Ordered attribute list plus index format.
#[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize)]
pub struct VertexFormat {
    attributes: Vec<VertexAttrib>,
    index_format: Option<IndexFormat>,
}

impl VertexFormat {
    /// Create a format. Attributes are sorted by `(semantic, layer)`.
    pub fn new(
        mut attributes: Vec<VertexAttrib>,
        vertex_count: usize,
        has_indices: bool,
    ) -> Self {
        attributes.sort();
        Self {
            attributes,
            index_format: has_indices.then(|| IndexFormat::for_vertex_count(vertex_count)),
        }
    }

    /// Create a format with an explicit index format.
    pub fn with_index_format(
        mut attributes: Vec<VertexAttrib>,
        index_format: Option<IndexFormat>,
    ) -> Self {
        attributes.sort();
        Self {
            attributes,
            index_format,
        }
    }

    /// Attributes in vertex order.
    pub fn attributes(&self) -> &[VertexAttrib] {
        &self.attributes
    }

    /// Index format, `None` for unindexed meshes.
    pub fn index_format(&self) -> Option<IndexFormat> {
        self.index_format
    }

    /// Whether meshes of this format carry an element buffer.
    pub fn has_indices(&self) -> bool {
        self.index_format.is_some()
    }

    /// Bytes per vertex.
    pub fn stride(&self) -> usize {
        self.attributes.iter().map(VertexAttrib::size).sum()
    }

    /// Byte offset of each attribute within a vertex, in vertex order.
    pub fn offsets(&self) -> impl Iterator<Item = (VertexAttrib, usize)> + '_ {
        self.attributes.iter().scan(0usize, |offset, attrib| {
            let start = *offset;
            *offset += attrib.size();
            Some((*attrib, start))
        })
    }
}
