//! Storage-agnostic views onto vertex attribute data.
//!
//! A [`VertexAttribAccessor`] describes where one attribute lives inside a
//! shared byte buffer. Accessors never copy: meshes produced by splitting or
//! by tangent generation share the buffers of their source through `Arc`.

use std::collections::BTreeMap;
use std::sync::Arc;

use bytemuck::Pod;

use super::attrib::{AttribFormat, AttribKey, VertexAttrib, VertexSemantic};
use super::format::VertexFormat;
use crate::math::{Vec2, Vec3, Vec4};

/// One attribute inside a shared, strided byte buffer.
#[derive(Debug, Clone)]
pub struct VertexAttribAccessor {
    attrib: VertexAttrib,
    buffer: Arc<[u8]>,
    offset: usize,
    stride: usize,
}

impl VertexAttribAccessor {
    /// Create an accessor for `attrib` starting at `offset` in `buffer`.
    pub fn new(attrib: VertexAttrib, buffer: Arc<[u8]>, offset: usize, stride: usize) -> Self {
        Self {
            attrib,
            buffer,
            offset,
            stride,
        }
    }

    /// Create an accessor over tightly packed elements of `values`.
    pub fn from_pod<T: Pod>(attrib: VertexAttrib, values: &[T]) -> Self {
        let bytes: Arc<[u8]> = Arc::from(bytemuck::cast_slice::<T, u8>(values));
        Self::new(attrib, bytes, 0, std::mem::size_of::<T>())
    }

    /// The attribute this accessor reads.
    pub fn attrib(&self) -> VertexAttrib {
        self.attrib
    }

    /// The shared buffer.
    pub fn buffer(&self) -> &Arc<[u8]> {
        &self.buffer
    }

    /// Byte stride between elements.
    pub fn stride(&self) -> usize {
        self.stride
    }

    /// Byte offset of element `index` in the buffer.
    pub fn offset_of(&self, index: usize) -> usize {
        self.offset + index * self.stride
    }

    /// Number of whole elements the buffer holds.
    pub fn len(&self) -> usize {
        let size = self.attrib.size();
        if self.buffer.len() < self.offset + size {
            0
        } else if self.stride == 0 {
            1
        } else {
            (self.buffer.len() - self.offset - size) / self.stride + 1
        }
    }

    /// Whether the buffer holds no element.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The raw bytes of element `index`.
    ///
    /// # Panics
    ///
    /// Panics if the element lies outside the buffer.
    pub fn bytes(&self, index: usize) -> &[u8] {
        let start = self.offset_of(index);
        &self.buffer[start..start + self.attrib.size()]
    }

    fn read<T: Pod>(&self, index: usize, component: usize) -> T {
        let size = std::mem::size_of::<T>();
        let start = self.offset_of(index) + component * size;
        bytemuck::pod_read_unaligned(&self.buffer[start..start + size])
    }

    /// Read two floats.
    pub fn vec2(&self, index: usize) -> Vec2 {
        Vec2::new(self.read(index, 0), self.read(index, 1))
    }

    /// Read three floats.
    pub fn vec3(&self, index: usize) -> Vec3 {
        Vec3::new(self.read(index, 0), self.read(index, 1), self.read(index, 2))
    }

    /// Read four floats.
    pub fn vec4(&self, index: usize) -> Vec4 {
        Vec4::new(
            self.read(index, 0),
            self.read(index, 1),
            self.read(index, 2),
            self.read(index, 3),
        )
    }

    /// Read four 16-bit unsigned integers.
    pub fn u16x4(&self, index: usize) -> [u16; 4] {
        std::array::from_fn(|c| self.read(index, c))
    }

    /// Read two 32-bit unsigned integers.
    pub fn u32x2(&self, index: usize) -> [u32; 2] {
        [self.read(index, 0), self.read(index, 1)]
    }

    /// Read a color as normalized floats, whatever its stored format.
    pub fn color(&self, index: usize) -> Vec4 {
        match self.attrib.format {
            AttribFormat::Unorm8x4 => {
                let b = self.bytes(index);
                Vec4::new(b[0] as f32, b[1] as f32, b[2] as f32, b[3] as f32) / 255.0
            }
            _ => self.vec4(index),
        }
    }
}

/// Accessors keyed by `(semantic, layer)`.
#[derive(Debug, Clone, Default)]
pub struct AccessorSet {
    accessors: BTreeMap<AttribKey, VertexAttribAccessor>,
}

impl AccessorSet {
    /// Create an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `accessor`, replacing any accessor with the same key.
    pub fn insert(&mut self, accessor: VertexAttribAccessor) {
        self.accessors.insert(accessor.attrib().key(), accessor);
    }

    /// Builder form of [`AccessorSet::insert`].
    pub fn with_accessor(mut self, accessor: VertexAttribAccessor) -> Self {
        self.insert(accessor);
        self
    }

    /// Accessor for `semantic` at `layer`.
    pub fn get(&self, semantic: VertexSemantic, layer: usize) -> Option<&VertexAttribAccessor> {
        self.accessors.get(&(semantic, layer))
    }

    /// Union of both sets; on equal keys the accessor from `other` wins.
    pub fn combine(&self, other: &AccessorSet) -> AccessorSet {
        let mut accessors = self.accessors.clone();
        for (key, accessor) in &other.accessors {
            accessors.insert(*key, accessor.clone());
        }
        AccessorSet { accessors }
    }

    /// Number of accessors.
    pub fn len(&self) -> usize {
        self.accessors.len()
    }

    /// Whether the set holds no accessor.
    pub fn is_empty(&self) -> bool {
        self.accessors.is_empty()
    }

    /// Accessors in `(semantic, layer)` order.
    pub fn iter(&self) -> impl Iterator<Item = &VertexAttribAccessor> {
        self.accessors.values()
    }

    /// The vertex format these accessors describe.
    pub fn derive_format(&self, vertex_count: usize, has_indices: bool) -> VertexFormat {
        VertexFormat::new(
            self.accessors.values().map(VertexAttribAccessor::attrib).collect(),
            vertex_count,
            has_indices,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::format::IndexFormat;

    fn interleaved() -> Arc<[u8]> {
        // Two vertices: position (3 x f32) followed by color (4 x u8).
        let mut bytes = Vec::new();
        for (p, c) in [([1.0f32, 2.0, 3.0], [255u8, 0, 0, 255]), ([4.0, 5.0, 6.0], [0, 255, 0, 51])] {
            for v in p {
                bytes.extend_from_slice(&v.to_le_bytes());
            }
            bytes.extend_from_slice(&c);
        }
        Arc::from(bytes)
    }

    #[test]
    fn test_strided_reads() {
        let buffer = interleaved();
        let pos = VertexAttribAccessor::new(
            VertexAttrib::new(VertexSemantic::Position, 0, AttribFormat::Float3),
            buffer.clone(),
            0,
            16,
        );
        let color = VertexAttribAccessor::new(
            VertexAttrib::new(VertexSemantic::Color, 0, AttribFormat::Unorm8x4),
            buffer,
            12,
            16,
        );
        assert_eq!(pos.vec3(1), Vec3::new(4.0, 5.0, 6.0));
        assert_eq!(pos.offset_of(1), 16);
        assert_eq!(pos.len(), 2);
        assert_eq!(color.bytes(0), &[255, 0, 0, 255]);
        assert!((color.color(1).w - 0.2).abs() < 1e-6);
    }

    #[test]
    fn test_from_pod() {
        let values = [[1u16, 2, 3, 4], [5, 6, 7, 8]];
        let acc = VertexAttribAccessor::from_pod(
            VertexAttrib::new(VertexSemantic::BoneIndices, 0, AttribFormat::Uint16x4),
            &values,
        );
        assert_eq!(acc.stride(), 8);
        assert_eq!(acc.u16x4(1), [5, 6, 7, 8]);
    }

    #[test]
    fn test_combine_prefers_other() {
        let old = VertexAttribAccessor::from_pod(
            VertexAttrib::new(VertexSemantic::Tangent, 0, AttribFormat::Float4),
            &[[0.0f32; 4]],
        );
        let new = VertexAttribAccessor::from_pod(
            VertexAttrib::new(VertexSemantic::Tangent, 0, AttribFormat::Float4),
            &[[1.0f32, 0.0, 0.0, 1.0]],
        );
        let pos = VertexAttribAccessor::from_pod(
            VertexAttrib::new(VertexSemantic::Position, 0, AttribFormat::Float3),
            &[[0.0f32; 3]],
        );
        let base = AccessorSet::new().with_accessor(pos).with_accessor(old);
        let extra = AccessorSet::new().with_accessor(new);
        let combined = base.combine(&extra);
        assert_eq!(combined.len(), 2);
        let tangent = combined.get(VertexSemantic::Tangent, 0).unwrap();
        assert_eq!(tangent.vec4(0), Vec4::new(1.0, 0.0, 0.0, 1.0));
    }

    #[test]
    fn test_derive_format() {
        let set = AccessorSet::new()
            .with_accessor(VertexAttribAccessor::from_pod(
                VertexAttrib::new(VertexSemantic::Normal, 0, AttribFormat::Float3),
                &[[0.0f32; 3]],
            ))
            .with_accessor(VertexAttribAccessor::from_pod(
                VertexAttrib::new(VertexSemantic::Position, 0, AttribFormat::Float3),
                &[[0.0f32; 3]],
            ));
        let format = set.derive_format(1, true);
        assert_eq!(format.stride(), 24);
        assert_eq!(format.attributes()[0].semantic, VertexSemantic::Position);
        assert_eq!(format.index_format(), Some(IndexFormat::Uint16));
    }
}
