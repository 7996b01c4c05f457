//! Splitting a mesh into parts by bounding box.

use serde::Deserialize;

use super::attrib::VertexSemantic;
use super::data::{ElementBuffer, Mesh};

/// Selects the triangles of a mesh that touch an axis-aligned box.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(from = "SplitterDef")]
pub struct MeshSplitter {
    /// Lower corner, inclusive. Unbounded axes are `-inf`.
    pub min: [f64; 3],
    /// Upper corner, inclusive. Unbounded axes are `+inf`.
    pub max: [f64; 3],
    /// Name of the resulting mesh.
    pub split_part_name: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SplitterDef {
    min_x: Option<f64>,
    min_y: Option<f64>,
    min_z: Option<f64>,
    max_x: Option<f64>,
    max_y: Option<f64>,
    max_z: Option<f64>,
    split_part_name: String,
}

impl From<SplitterDef> for MeshSplitter {
    fn from(def: SplitterDef) -> Self {
        let lo = f64::NEG_INFINITY;
        let hi = f64::INFINITY;
        Self {
            min: [
                def.min_x.unwrap_or(lo),
                def.min_y.unwrap_or(lo),
                def.min_z.unwrap_or(lo),
            ],
            max: [
                def.max_x.unwrap_or(hi),
                def.max_y.unwrap_or(hi),
                def.max_z.unwrap_or(hi),
            ],
            split_part_name: def.split_part_name,
        }
    }
}

impl MeshSplitter {
    /// Splitter with an unbounded box.
    pub fn new(split_part_name: impl Into<String>) -> Self {
        Self {
            min: [f64::NEG_INFINITY; 3],
            max: [f64::INFINITY; 3],
            split_part_name: split_part_name.into(),
        }
    }

    /// Set the lower corner.
    pub fn with_min(mut self, min: [f64; 3]) -> Self {
        self.min = min;
        self
    }

    /// Set the upper corner.
    pub fn with_max(mut self, max: [f64; 3]) -> Self {
        self.max = max;
        self
    }

    /// Whether `point` lies inside the box, bounds included.
    pub fn contains(&self, point: [f32; 3]) -> bool {
        (0..3).all(|axis| {
            let c = point[axis] as f64;
            c >= self.min[axis] && c <= self.max[axis]
        })
    }

    /// The part of `mesh` with at least one corner inside the box.
    ///
    /// Kept triangles retain their vertex indices and order; vertex data,
    /// bone data, textures and variant are shared with `mesh`. Returns
    /// `None` if no triangle qualifies.
    pub fn split(&self, mesh: &Mesh) -> Option<Mesh> {
        let positions = mesh.accessors().get(VertexSemantic::Position, 0)?;

        let mut kept = Vec::new();
        for triangle in 0..mesh.triangle_count() {
            let corners = mesh.triangle(triangle);
            let inside = corners.iter().any(|&i| {
                let p = positions.vec3(i);
                self.contains([p.x, p.y, p.z])
            });
            if inside {
                kept.extend(corners.iter().map(|&i| i as u32));
            }
        }

        if kept.is_empty() {
            return None;
        }
        Some(
            mesh.clone()
                .with_name(self.split_part_name.clone())
                .with_elements(ElementBuffer::from_u32(&kept)),
        )
    }
}
