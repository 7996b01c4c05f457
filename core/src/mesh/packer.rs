//! Packing meshes of one vertex format into a shared, upload-ready buffer.
//!
//! A [`VertexArray`] owns one interleaved vertex buffer and one element
//! buffer. Meshes are appended with [`VertexArray::add`], which converts
//! every attribute to the destination layout and returns where the mesh
//! landed.
//!
//! # Quantization
//!
//! With [`PackOptions::quantize`] enabled, attributes are stored in smaller
//! formats:
//!
//! | Semantic     | Source   | Packed                               |
//! |--------------|----------|--------------------------------------|
//! | normal       | Float3   | 10-10-10-2 snorm                     |
//! | tangent      | Float4   | 10-10-10-2 snorm, 2-bit sign of `w`  |
//! | texcoord     | Float2   | 2 x f16                              |
//! | bone weights | Float4   | 4 x u16 unorm, renormalized          |
//!
//! Padding attributes are never packed.

use half::f16;
use serde::Deserialize;

use super::accessor::VertexAttribAccessor;
use super::attrib::{AttribFormat, VertexAttrib, VertexSemantic};
use super::data::Mesh;
use super::format::VertexFormat;
use crate::math::{Vec3, normalize_or_keep};

/// Packing configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct PackOptions {
    /// Store normals, tangents, texcoords and bone weights in compact formats.
    pub quantize: bool,
}

impl Default for PackOptions {
    fn default() -> Self {
        Self { quantize: true }
    }
}

impl PackOptions {
    /// Enable or disable quantization.
    pub fn with_quantization(mut self, quantize: bool) -> Self {
        self.quantize = quantize;
        self
    }
}

/// Where a mesh was placed inside a [`VertexArray`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Reservation {
    /// Index of the mesh's first vertex in the array.
    pub base_vertex: usize,
    /// Byte offset of the mesh's first element, if the array is indexed.
    pub element_offset: Option<usize>,
    /// Number of elements (or vertices, if unindexed) to draw.
    pub element_count: usize,
}

/// Pack `value` into a signed normalized integer of `bits` bits.
///
/// The result occupies the low `bits` bits. Non-finite input packs to zero.
pub fn pack_signed(value: f32, bits: u32) -> u32 {
    if !value.is_finite() {
        return 0;
    }
    let max = ((1i64 << (bits - 1)) - 1) as f32;
    let min = -((1i64 << (bits - 1)) as f32);
    let offset = 0.5 * (max + min);
    let factor = max - offset;
    let packed = (value * factor + offset).round().clamp(min, max) as i32;
    (packed as u32) & ((1u32 << bits) - 1)
}

/// Pack three components into the low 30 bits of a 10-10-10-2 word.
///
/// The 2-bit field stays zero.
pub fn pack_snorm_101010(xyz: Vec3) -> u32 {
    pack_signed(xyz.x, 10) | pack_signed(xyz.y, 10) << 10 | pack_signed(xyz.z, 10) << 20
}

/// Pack three components and a 2-bit fourth into 10-10-10-2 layout.
pub fn pack_snorm_1010102(xyz: Vec3, w: f32) -> u32 {
    pack_snorm_101010(xyz) | pack_signed(w, 2) << 30
}

/// Pack weights as 16-bit unorm after renormalizing them by their sum.
pub fn pack_weights_unorm16(weights: [f32; 4]) -> [u16; 4] {
    let sum: f32 = weights.iter().sum();
    if sum == 0.0 || !sum.is_finite() {
        return [u16::MAX, 0, 0, 0];
    }
    weights.map(|w| ((w / sum) * u16::MAX as f32).round().clamp(0.0, u16::MAX as f32) as u16)
}

/// The packed counterpart of `attrib`, or `None` if it is not packed at all.
fn packed_attrib(attrib: VertexAttrib, options: PackOptions) -> Option<VertexAttrib> {
    use AttribFormat::*;
    use VertexSemantic::*;

    if attrib.semantic == Padding {
        return None;
    }
    if !options.quantize {
        return Some(attrib);
    }
    let format = match (attrib.semantic, attrib.format) {
        (Normal, Float3) | (Tangent, Float4) => Snorm1010102,
        (TexCoord, Float2) => Half2,
        (BoneWeights, Float4) => Unorm16x4,
        (_, format) => format,
    };
    Some(VertexAttrib { format, ..attrib })
}

/// Write element `index` of `source` into `dest` in the format of `target`.
///
/// Returns `false` if no conversion exists between the two formats.
fn convert(source: &VertexAttribAccessor, index: usize, target: VertexAttrib, dest: &mut [u8]) -> bool {
    use AttribFormat::*;

    let from = source.attrib().format;
    if from == target.format {
        dest.copy_from_slice(source.bytes(index));
        return true;
    }
    match (from, target.format) {
        (Float3, Snorm1010102) => {
            let packed = pack_snorm_101010(source.vec3(index));
            dest.copy_from_slice(&packed.to_ne_bytes());
        }
        (Float4, Snorm1010102) => {
            let t = source.vec4(index);
            let packed = pack_snorm_1010102(normalize_or_keep(t.xyz()), t.w.signum());
            dest.copy_from_slice(&packed.to_ne_bytes());
        }
        (Float2, Half2) => {
            let uv = source.vec2(index);
            let packed = [f16::from_f32(uv.x), f16::from_f32(uv.y)];
            dest.copy_from_slice(bytemuck::cast_slice(&packed));
        }
        (Float4, Unorm16x4) => {
            let w = source.vec4(index);
            let packed = pack_weights_unorm16([w.x, w.y, w.z, w.w]);
            dest.copy_from_slice(bytemuck::cast_slice(&packed));
        }
        _ => return false,
    }
    true
}

/// Interleaved vertex and element storage for meshes of one format.
#[derive(Debug, Clone)]
pub struct VertexArray {
    format: VertexFormat,
    layout: Vec<(VertexAttrib, VertexAttrib, usize)>,
    stride: usize,
    vertex_data: Vec<u8>,
    element_data: Vec<u8>,
    vertex_count: usize,
    element_count: usize,
}

impl VertexArray {
    /// Create an empty array for meshes of `source` format.
    pub fn new(source: &VertexFormat, options: PackOptions) -> Self {
        let pairs: Vec<(VertexAttrib, VertexAttrib)> = source
            .attributes()
            .iter()
            .filter_map(|&a| packed_attrib(a, options).map(|p| (a, p)))
            .collect();
        let format = VertexFormat::with_index_format(
            pairs.iter().map(|(_, p)| *p).collect(),
            source.index_format(),
        );

        let mut layout = Vec::with_capacity(pairs.len());
        let mut offset = 0;
        for (src, dst) in pairs {
            layout.push((src, dst, offset));
            offset += dst.size();
        }

        Self {
            format,
            layout,
            stride: offset,
            vertex_data: Vec::new(),
            element_data: Vec::new(),
            vertex_count: 0,
            element_count: 0,
        }
    }

    /// Destination format of the packed data.
    pub fn format(&self) -> &VertexFormat {
        &self.format
    }

    /// Bytes per packed vertex.
    pub fn stride(&self) -> usize {
        self.stride
    }

    /// Packed vertex bytes.
    pub fn vertex_data(&self) -> &[u8] {
        &self.vertex_data
    }

    /// Packed element bytes, empty for unindexed arrays.
    pub fn element_data(&self) -> &[u8] {
        &self.element_data
    }

    /// Number of packed vertices.
    pub fn vertex_count(&self) -> usize {
        self.vertex_count
    }

    /// Number of packed elements.
    pub fn element_count(&self) -> usize {
        self.element_count
    }

    /// Append `mesh` and return where it was placed.
    ///
    /// Attributes the mesh does not provide are zero-filled.
    pub fn add(&mut self, mesh: &Mesh) -> Reservation {
        let base_vertex = self.vertex_count;
        let vertex_count = mesh.vertex_count();
        let start = self.vertex_data.len();
        self.vertex_data.resize(start + vertex_count * self.stride, 0);

        for &(source_attrib, target, offset) in &self.layout {
            let Some(source) = mesh.accessors().get(source_attrib.semantic, source_attrib.layer)
            else {
                log::warn!(
                    "Mesh {:?} has no {:?} layer {}; filling with zeros",
                    mesh.name(),
                    source_attrib.semantic,
                    source_attrib.layer
                );
                continue;
            };
            for vertex in 0..vertex_count {
                let at = start + vertex * self.stride + offset;
                let dest = &mut self.vertex_data[at..at + target.size()];
                if !convert(source, vertex, target, dest) {
                    log::warn!(
                        "Mesh {:?}: cannot convert {:?} from {:?} to {:?}; filling with zeros",
                        mesh.name(),
                        target.semantic,
                        source.attrib().format,
                        target.format
                    );
                    break;
                }
            }
        }
        self.vertex_count += vertex_count;

        let Some(index_format) = self.format.index_format() else {
            return Reservation {
                base_vertex,
                element_offset: None,
                element_count: vertex_count,
            };
        };

        let element_offset = self.element_data.len();
        let width = index_format.size();
        let count = mesh.used_element_count();
        match mesh.elements() {
            Some(elements) if elements.width() == width => {
                self.element_data.extend_from_slice(elements.bytes());
            }
            Some(elements) => {
                let keep = width.min(elements.width());
                for chunk in elements.bytes().chunks_exact(elements.width()) {
                    self.element_data.extend_from_slice(&chunk[..keep]);
                    self.element_data.extend(std::iter::repeat_n(0u8, width - keep));
                }
            }
            None => {
                for vertex in 0..count {
                    let bytes = (vertex as u64).to_le_bytes();
                    self.element_data.extend_from_slice(&bytes[..width]);
                }
            }
        }
        self.element_count += count;

        Reservation {
            base_vertex,
            element_offset: Some(element_offset),
            element_count: count,
        }
    }
}
