//! Parsed mesh data.
//!
//! This module provides:
//! - [`ElementBuffer`] - Triangle-list indices with their byte width
//! - [`VariableBones`] - Side arrays for variable-length bone lists
//! - [`Mesh`] - Vertex accessors, elements, textures and derived format

use std::sync::Arc;

use super::accessor::AccessorSet;
use super::attrib::VertexSemantic;
use super::format::VertexFormat;
use super::texture::TextureAssignment;
use super::variant::MeshVariant;

/// Triangle-list element data, 3 elements per triangle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementBuffer {
    data: Arc<[u8]>,
    width: usize,
    count: usize,
}

impl ElementBuffer {
    /// Create a 4-byte element buffer from `elements`.
    pub fn from_u32(elements: &[u32]) -> Self {
        Self {
            data: Arc::from(bytemuck::cast_slice::<u32, u8>(elements)),
            width: 4,
            count: elements.len(),
        }
    }

    /// Create a buffer from little-endian bytes of `width` bytes per element.
    ///
    /// Trailing bytes that do not form a whole element are ignored.
    pub fn from_bytes(data: Arc<[u8]>, width: usize) -> Self {
        let count = if width == 0 { 0 } else { data.len() / width };
        Self { data, width, count }
    }

    /// Element `index`, widened to `usize`.
    ///
    /// # Panics
    ///
    /// Panics if `index >= self.len()`.
    pub fn get(&self, index: usize) -> usize {
        let start = index * self.width;
        let raw = &self.data[start..start + self.width];
        let mut buf = [0u8; 8];
        let n = raw.len().min(8);
        buf[..n].copy_from_slice(&raw[..n]);
        u64::from_le_bytes(buf) as usize
    }

    /// Number of elements.
    pub fn len(&self) -> usize {
        self.count
    }

    /// Whether there are no elements.
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Bytes per element.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Raw little-endian bytes.
    pub fn bytes(&self) -> &[u8] {
        &self.data[..self.count * self.width]
    }

    /// Iterate over all elements.
    pub fn iter(&self) -> impl Iterator<Item = usize> + '_ {
        (0..self.count).map(|i| self.get(i))
    }
}

/// Bone indices and weights of a variable-layout mesh.
///
/// Each vertex's padding attribute holds `[offset, count]` into these arrays.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VariableBones {
    /// Bone indices of all vertices, back to back.
    pub indices: Arc<[u16]>,
    /// Weights matching `indices`, renormalized per vertex.
    pub weights: Arc<[f32]>,
}

/// One bone influencing a vertex.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoneInfluence {
    /// Bone index.
    pub bone: usize,
    /// Weight of that bone.
    pub weight: f32,
}

/// A mesh: shared vertex accessors plus optional triangle elements.
#[derive(Debug, Clone)]
pub struct Mesh {
    name: String,
    display_name: String,
    uv_layers: usize,
    vertex_count: usize,
    accessors: AccessorSet,
    elements: Option<ElementBuffer>,
    variant: MeshVariant,
    textures: Vec<TextureAssignment>,
    texture_files: Vec<String>,
    variable_bones: Option<VariableBones>,
    format: VertexFormat,
}

impl Mesh {
    /// Create an unindexed mesh over `accessors`.
    pub fn new(
        name: impl Into<String>,
        variant: MeshVariant,
        vertex_count: usize,
        accessors: AccessorSet,
    ) -> Self {
        let name = name.into();
        let format = accessors.derive_format(vertex_count, false);
        Self {
            display_name: name.clone(),
            name,
            uv_layers: 0,
            vertex_count,
            accessors,
            elements: None,
            variant,
            textures: Vec::new(),
            texture_files: Vec::new(),
            variable_bones: None,
            format,
        }
    }

    fn update_format(&mut self) {
        self.format = self
            .accessors
            .derive_format(self.vertex_count, self.elements.is_some());
    }

    /// Set the element buffer.
    pub fn with_elements(mut self, elements: ElementBuffer) -> Self {
        self.elements = Some(elements);
        self.update_format();
        self
    }

    /// Replace the accessor set.
    pub fn with_accessors(mut self, accessors: AccessorSet) -> Self {
        self.accessors = accessors;
        self.update_format();
        self
    }

    /// Set the number of UV layers.
    pub fn with_uv_layers(mut self, uv_layers: usize) -> Self {
        self.uv_layers = uv_layers;
        self
    }

    /// Set the name, keeping the display name in sync if it was the default.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        let name = name.into();
        if self.display_name == self.name {
            self.display_name = name.clone();
        }
        self.name = name;
        self
    }

    /// Set the display name.
    pub fn with_display_name(mut self, display_name: impl Into<String>) -> Self {
        self.display_name = display_name.into();
        self
    }

    /// Set the texture assignments.
    pub fn with_textures(mut self, textures: Vec<TextureAssignment>) -> Self {
        self.textures = textures;
        self
    }

    /// Set the texture file names listed in the file.
    pub fn with_texture_files(mut self, files: Vec<String>) -> Self {
        self.texture_files = files;
        self
    }

    /// Set the variable-length bone side arrays.
    pub fn with_variable_bones(mut self, bones: VariableBones) -> Self {
        self.variable_bones = Some(bones);
        self
    }

    /// Mesh name as stored in the file (or the split part name).
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Human-readable name from the model parameters, else the mesh name.
    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    /// Number of UV layers.
    pub fn uv_layers(&self) -> usize {
        self.uv_layers
    }

    /// Number of vertices.
    pub fn vertex_count(&self) -> usize {
        self.vertex_count
    }

    /// Vertex accessors.
    pub fn accessors(&self) -> &AccessorSet {
        &self.accessors
    }

    /// Element buffer, `None` for unindexed meshes.
    pub fn elements(&self) -> Option<&ElementBuffer> {
        self.elements.as_ref()
    }

    /// Layout switches this mesh was parsed with.
    pub fn variant(&self) -> MeshVariant {
        self.variant
    }

    /// Texture assignments.
    pub fn textures(&self) -> &[TextureAssignment] {
        &self.textures
    }

    /// Every texture file named in the file, percent-encoded, in file order.
    pub fn texture_files(&self) -> &[String] {
        &self.texture_files
    }

    /// Side arrays of a variable-layout mesh.
    pub fn variable_bones(&self) -> Option<&VariableBones> {
        self.variable_bones.as_ref()
    }

    /// Vertex format derived from the accessors.
    pub fn format(&self) -> &VertexFormat {
        &self.format
    }

    /// Number of elements to draw: element count if indexed, else vertex count.
    pub fn used_element_count(&self) -> usize {
        match &self.elements {
            Some(e) => e.len(),
            None => self.vertex_count,
        }
    }

    /// Number of triangles.
    pub fn triangle_count(&self) -> usize {
        self.used_element_count() / 3
    }

    /// Vertex index of element `index`; for unindexed meshes this is `index`.
    pub fn element(&self, index: usize) -> usize {
        match &self.elements {
            Some(e) => e.get(index),
            None => index,
        }
    }

    /// The three vertex indices of triangle `triangle`.
    pub fn triangle(&self, triangle: usize) -> [usize; 3] {
        let base = triangle * 3;
        [self.element(base), self.element(base + 1), self.element(base + 2)]
    }

    /// Bones influencing vertex `vertex`, whatever the layout.
    ///
    /// Fixed-layout slots with zero weight are skipped.
    pub fn bone_influences(&self, vertex: usize) -> Vec<BoneInfluence> {
        if let (Some(bones), Some(refs)) = (
            &self.variable_bones,
            self.accessors.get(VertexSemantic::Padding, 0),
        ) {
            let [offset, count] = refs.u32x2(vertex);
            let range = offset as usize..offset as usize + count as usize;
            return bones.indices[range.clone()]
                .iter()
                .zip(&bones.weights[range])
                .map(|(&bone, &weight)| BoneInfluence {
                    bone: bone as usize,
                    weight,
                })
                .collect();
        }

        match (
            self.accessors.get(VertexSemantic::BoneIndices, 0),
            self.accessors.get(VertexSemantic::BoneWeights, 0),
        ) {
            (Some(indices), Some(weights)) => {
                let indices = indices.u16x4(vertex);
                let weights = weights.vec4(vertex);
                indices
                    .iter()
                    .zip(weights.iter())
                    .filter(|(_, w)| **w != 0.0)
                    .map(|(&bone, &weight)| BoneInfluence {
                        bone: bone as usize,
                        weight,
                    })
                    .collect()
            }
            _ => Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::accessor::VertexAttribAccessor;
    use crate::mesh::attrib::{AttribFormat, VertexAttrib};

    fn positions(n: usize) -> AccessorSet {
        let values: Vec<[f32; 3]> = (0..n).map(|i| [i as f32, 0.0, 0.0]).collect();
        AccessorSet::new().with_accessor(VertexAttribAccessor::from_pod(
            VertexAttrib::new(VertexSemantic::Position, 0, AttribFormat::Float3),
            &values,
        ))
    }

    #[test]
    fn test_element_buffer_widths() {
        let buf = ElementBuffer::from_u32(&[1, 70000, 3]);
        assert_eq!(buf.width(), 4);
        assert_eq!(buf.iter().collect::<Vec<_>>(), vec![1, 70000, 3]);

        let narrow = ElementBuffer::from_bytes(Arc::from(&[1u8, 0, 2, 0, 9][..]), 2);
        assert_eq!(narrow.len(), 2);
        assert_eq!(narrow.get(1), 2);
        assert_eq!(narrow.bytes(), &[1, 0, 2, 0]);
    }

    #[test]
    fn test_unindexed_elements_are_identity() {
        let mesh = Mesh::new("m", MeshVariant::default(), 6, positions(6));
        assert_eq!(mesh.used_element_count(), 6);
        assert_eq!(mesh.triangle(1), [3, 4, 5]);
        assert_eq!(mesh.format().index_format(), None);
    }

    #[test]
    fn test_with_elements_updates_format() {
        let mesh = Mesh::new("m", MeshVariant::default(), 3, positions(3))
            .with_elements(ElementBuffer::from_u32(&[2, 1, 0]));
        assert!(mesh.format().has_indices());
        assert_eq!(mesh.triangle(0), [2, 1, 0]);
        assert_eq!(mesh.triangle_count(), 1);
    }

    #[test]
    fn test_rename_keeps_default_display_name() {
        let mesh = Mesh::new("a", MeshVariant::default(), 0, AccessorSet::new()).with_name("b");
        assert_eq!(mesh.display_name(), "b");
        let mesh = mesh.with_display_name("Body").with_name("c");
        assert_eq!(mesh.display_name(), "Body");
    }

    #[test]
    fn test_variable_bone_influences() {
        let refs = VertexAttribAccessor::from_pod(
            VertexAttrib::new(VertexSemantic::Padding, 0, AttribFormat::Uint2),
            &[[0u32, 1], [1, 2]],
        );
        let mesh = Mesh::new(
            "m",
            MeshVariant::binary(4),
            2,
            positions(2).with_accessor(refs),
        )
        .with_variable_bones(VariableBones {
            indices: Arc::from(vec![3u16, 0, 1]),
            weights: Arc::from(vec![1.0f32, 0.25, 0.75]),
        });
        let influences = mesh.bone_influences(1);
        assert_eq!(
            influences,
            vec![
                BoneInfluence { bone: 0, weight: 0.25 },
                BoneInfluence { bone: 1, weight: 0.75 },
            ]
        );
    }
}
