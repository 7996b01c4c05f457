//! Per-vertex tangent generation.
//!
//! For every UV layer, the texture-space U and V directions of each triangle
//! are accumulated at its three corners. Per vertex, U is orthogonalized
//! against the normal to give the tangent, and the sign of V relative to
//! `cross(normal, U)` gives the handedness stored in `w`.

use super::accessor::{AccessorSet, VertexAttribAccessor};
use super::attrib::{AttribFormat, VertexAttrib, VertexSemantic};
use super::data::Mesh;
use crate::math::{Vec3, normalize_or_keep, sign_or_positive};

/// Compute one Float4 tangent accessor per UV layer of `mesh`.
///
/// Returns an empty set if the mesh lacks positions or normals. Layers
/// without texture coordinates are skipped.
pub fn compute_tangents(mesh: &Mesh) -> AccessorSet {
    let mut result = AccessorSet::new();
    let accessors = mesh.accessors();
    let (Some(positions), Some(normals)) = (
        accessors.get(VertexSemantic::Position, 0),
        accessors.get(VertexSemantic::Normal, 0),
    ) else {
        return result;
    };

    let vertex_count = mesh.vertex_count();
    for layer in 0..mesh.uv_layers() {
        let Some(texcoords) = accessors.get(VertexSemantic::TexCoord, layer) else {
            continue;
        };

        let mut sum_u = vec![Vec3::zeros(); vertex_count];
        let mut sum_v = vec![Vec3::zeros(); vertex_count];

        for triangle in 0..mesh.triangle_count() {
            let corners = mesh.triangle(triangle);
            let [p0, p1, p2] = corners.map(|i| positions.vec3(i));
            let [uv0, uv1, uv2] = corners.map(|i| texcoords.vec2(i));

            let q1 = p1 - p0;
            let q2 = p2 - p0;
            let (s1, t1) = (uv1.x - uv0.x, uv1.y - uv0.y);
            let (s2, t2) = (uv2.x - uv0.x, uv2.y - uv0.y);
            let d = s1 * t2 - s2 * t1;
            if d == 0.0 {
                continue;
            }

            let tangent_u = (q1 * t2 - q2 * t1) / d;
            let tangent_v = (q2 * s1 - q1 * s2) / d;
            for corner in corners {
                sum_u[corner] += tangent_u;
                sum_v[corner] += tangent_v;
            }
        }

        let tangents: Vec<[f32; 4]> = (0..vertex_count)
            .map(|vertex| {
                let n = normals.vec3(vertex);
                let u = normalize_or_keep(sum_u[vertex]);
                let v = normalize_or_keep(sum_v[vertex]);
                let t = normalize_or_keep(u - n * n.dot(&u));
                let w = sign_or_positive(v.dot(&n.cross(&u)));
                [t.x, t.y, t.z, w]
            })
            .collect();

        result.insert(VertexAttribAccessor::from_pod(
            VertexAttrib::new(VertexSemantic::Tangent, layer, AttribFormat::Float4),
            &tangents,
        ));
    }
    result
}
