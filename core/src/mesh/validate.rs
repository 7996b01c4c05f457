//! Cross-reference checks run on freshly parsed meshes.

use super::attrib::VertexSemantic;
use super::data::Mesh;
use crate::error::{IndexKind, ModelError};

/// Check every bone and element reference of `mesh`.
///
/// Must run before tangents are computed, since tangent generation indexes
/// vertices through the element buffer.
pub fn validate_mesh(mesh: &Mesh, bone_count: usize) -> Result<(), ModelError> {
    let bone_error = |index: usize| ModelError::IndexOutOfRange {
        kind: IndexKind::VertexBone,
        index,
        limit: bone_count,
    };

    if let Some(indices) = mesh.accessors().get(VertexSemantic::BoneIndices, 0) {
        for vertex in 0..mesh.vertex_count() {
            if let Some(&bad) = indices
                .u16x4(vertex)
                .iter()
                .find(|&&b| b as usize >= bone_count)
            {
                return Err(bone_error(bad as usize));
            }
        }
    }

    if let Some(bones) = mesh.variable_bones() {
        if let Some(&bad) = bones.indices.iter().find(|&&b| b as usize >= bone_count) {
            return Err(bone_error(bad as usize));
        }
    }

    if let Some(elements) = mesh.elements() {
        let vertex_count = mesh.vertex_count();
        if let Some(bad) = elements.iter().find(|&e| e >= vertex_count) {
            return Err(ModelError::IndexOutOfRange {
                kind: IndexKind::Element,
                index: bad,
                limit: vertex_count,
            });
        }
    }

    Ok(())
}
