//! Reads one mesh from a model file.
//!
//! Vertices are decoded field by field into an in-memory buffer laid out as
//! described by [`MeshVariant::vertex_attributes`]. The result has not been
//! validated yet and carries no computed tangents.

use std::sync::Arc;

use super::accessor::{AccessorSet, VertexAttribAccessor};
use super::data::{ElementBuffer, Mesh, VariableBones};
use super::texture::{TextureAssignment, texture_file_name};
use super::variant::MeshVariant;
use crate::error::{ModelError, Section};
use crate::params::ModelParams;
use crate::reader::DataReader;

/// Smallest texture entry in a binary file: empty name plus UV hint.
const MIN_TEXTURE_ENTRY_SIZE: usize = 5;

/// Bytes per triangle in a binary file.
const TRIANGLE_SIZE: usize = 12;

/// Upper bound on speculative preallocation for sources of unknown length.
const MAX_PREALLOCATED_VERTICES: usize = 1 << 16;

/// Most UV layers a mesh may declare.
const MAX_UV_LAYERS: usize = 16;

/// Scale `weights` so they sum to one.
///
/// A zero sum gives the whole weight to the first slot.
pub fn normalize_weights(weights: &mut [f32]) {
    let sum: f32 = weights.iter().sum();
    if sum == 0.0 {
        if let Some((first, rest)) = weights.split_first_mut() {
            *first = 1.0;
            rest.fill(0.0);
        }
    } else {
        for w in weights.iter_mut() {
            *w /= sum;
        }
    }
}

fn push_f32(data: &mut Vec<u8>, reader: &mut impl DataReader, count: usize) {
    for _ in 0..count {
        data.extend_from_slice(&reader.read_f32().to_ne_bytes());
    }
}

/// Read a fixed four-slot bone list.
///
/// With `short_lists`, each list may end early at a line break; missing slots
/// are zero and the weights are renormalized.
fn read_fixed_bones(reader: &mut impl DataReader, short_lists: bool) -> ([u16; 4], [f32; 4]) {
    let mut indices = [0u16; 4];
    let mut weights = [0f32; 4];
    if short_lists {
        for slot in indices.iter_mut() {
            *slot = reader.read_u16();
            if reader.at_line_end() {
                break;
            }
        }
        for slot in weights.iter_mut() {
            *slot = reader.read_f32();
            if reader.at_line_end() {
                break;
            }
        }
        normalize_weights(&mut weights);
    } else {
        for slot in indices.iter_mut() {
            *slot = reader.read_u16();
        }
        for slot in weights.iter_mut() {
            *slot = reader.read_f32();
        }
    }
    (indices, weights)
}

/// Parse one mesh.
///
/// `bone_count` decides whether vertices carry bone data; `params` supplies
/// the texture identifiers and display name for the mesh.
pub fn parse_mesh(
    reader: &mut impl DataReader,
    variant: MeshVariant,
    bone_count: usize,
    params: &ModelParams,
) -> Result<Mesh, ModelError> {
    let has_bones = bone_count > 0;

    let name = reader.read_pascal_string();
    let uv_layers = reader.read_u32() as usize;
    reader.ensure_fits(uv_layers, 1, Section::Textures)?;
    reader.checkpoint(Section::Textures)?;
    if uv_layers > MAX_UV_LAYERS {
        return Err(ModelError::FileTypeNotSupported(format!(
            "mesh {name:?} declares {uv_layers} UV layers"
        )));
    }

    let texture_count = reader.read_u32() as usize;
    reader.ensure_fits(texture_count, MIN_TEXTURE_ENTRY_SIZE, Section::Textures)?;
    let identifiers = params.texture_identifiers(&name);
    let mut texture_files = Vec::new();
    let mut textures = Vec::new();
    for i in 0..texture_count {
        let stored = reader.read_pascal_string();
        // UV layer hint, fixed per texture slot by the shader anyway.
        reader.read_u32();
        if !reader.is_valid() {
            break;
        }
        let file = texture_file_name(&stored);
        if let Some(identifier) = identifiers.get(i) {
            textures.push(TextureAssignment::new(identifier.clone(), file.clone()));
        }
        texture_files.push(file);
    }
    reader.checkpoint(Section::Textures)?;

    let vertex_count = reader.read_u32() as usize;
    reader.ensure_fits(
        vertex_count,
        variant.min_file_vertex_size(uv_layers, has_bones),
        Section::Vertices,
    )?;

    let attribs = variant.vertex_attributes(uv_layers, has_bones);
    let stride: usize = attribs.iter().map(|a| a.size()).sum();
    let fixed_bones = variant.has_fixed_bones(has_bones);
    let variable = variant.has_variable_bones_per_vertex;

    let mut data = Vec::with_capacity(vertex_count.min(MAX_PREALLOCATED_VERTICES) * stride);
    let mut side_indices: Vec<u16> = Vec::new();
    let mut side_weights: Vec<f32> = Vec::new();

    for _ in 0..vertex_count {
        if !reader.is_valid() {
            break;
        }
        // Position and normal.
        push_f32(&mut data, reader, 6);
        if variant.colors_are_floats {
            push_f32(&mut data, reader, 4);
        } else {
            for _ in 0..4 {
                data.push(reader.read_u8());
            }
        }
        push_f32(&mut data, reader, 2 * uv_layers);

        let mut refs_at = None;
        if variant.has_tangents_in_file {
            push_f32(&mut data, reader, 4 * uv_layers);
        } else if variable {
            // Placeholder in the file; replaced by offset and count below.
            reader.read_u16();
            reader.read_u16();
            refs_at = Some(data.len());
            data.extend_from_slice(&[0u8; 8]);
        }

        if fixed_bones {
            let (indices, weights) = read_fixed_bones(reader, variant.short_bone_lists);
            data.extend_from_slice(bytemuck::cast_slice(&indices));
            data.extend_from_slice(bytemuck::cast_slice(&weights));
        }

        if let Some(at) = refs_at {
            let count = reader.read_u16() as usize;
            let offset = side_indices.len();
            for _ in 0..count {
                side_indices.push(reader.read_u16());
            }
            let mut weights: Vec<f32> = (0..count).map(|_| reader.read_f32()).collect();
            normalize_weights(&mut weights);
            side_weights.extend_from_slice(&weights);

            let refs = [offset as u32, count as u32];
            data[at..at + 8].copy_from_slice(bytemuck::cast_slice(&refs));
        }
    }
    reader.checkpoint(Section::Vertices)?;

    let triangle_count = reader.read_u32() as usize;
    reader.ensure_fits(triangle_count, TRIANGLE_SIZE, Section::Elements)?;
    let element_count =
        triangle_count
            .checked_mul(3)
            .ok_or(ModelError::PrematureEndOfFile {
                section: Section::Elements,
                offset: reader.position(),
            })?;
    let mut elements = Vec::with_capacity(element_count.min(3 * MAX_PREALLOCATED_VERTICES));
    for _ in 0..element_count {
        if !reader.is_valid() {
            break;
        }
        elements.push(reader.read_u32());
    }
    reader.checkpoint(Section::Elements)?;

    let buffer: Arc<[u8]> = Arc::from(data);
    let mut accessors = AccessorSet::new();
    let mut offset = 0;
    for attrib in attribs {
        accessors.insert(VertexAttribAccessor::new(attrib, buffer.clone(), offset, stride));
        offset += attrib.size();
    }

    let display_name = params.display_name(&name).unwrap_or(&name).to_string();
    let mut mesh = Mesh::new(name, variant, vertex_count, accessors)
        .with_display_name(display_name)
        .with_uv_layers(uv_layers)
        .with_elements(ElementBuffer::from_u32(&elements))
        .with_textures(textures)
        .with_texture_files(texture_files);
    if variable {
        mesh = mesh.with_variable_bones(VariableBones {
            indices: Arc::from(side_indices),
            weights: Arc::from(side_weights),
        });
    }
    Ok(mesh)
}
