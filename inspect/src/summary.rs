//! Serializable summaries of a loaded model.

use serde::Serialize;
use xnamesh_core::Model;
use xnamesh_core::math::mat4_to_cols_array_2d;
use xnamesh_core::mesh::{MeshVariant, PackOptions, TextureAssignment, VertexFormat};

#[derive(Debug, Serialize)]
pub struct ModelSummary {
    pub name: String,
    pub version: u32,
    pub parameters_found: bool,
    pub bones: Vec<BoneSummary>,
    pub meshes: Vec<MeshSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub packed: Option<Vec<PackedSummary>>,
}

#[derive(Debug, Serialize)]
pub struct BoneSummary {
    pub name: String,
    pub parent: Option<usize>,
    /// Index of the parent model's bone this bone defers to.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_model_bone: Option<usize>,
    pub position: [f32; 3],
    /// Column-major inverse bind matrix.
    pub inverse_bind: [[f32; 4]; 4],
}

#[derive(Debug, Serialize)]
pub struct MeshSummary {
    pub name: String,
    pub display_name: String,
    pub vertex_count: usize,
    pub triangle_count: usize,
    pub uv_layers: usize,
    pub variant: MeshVariant,
    pub format: VertexFormat,
    pub texture_files: Vec<String>,
    pub textures: Vec<TextureAssignment>,
}

#[derive(Debug, Serialize)]
pub struct PackedSummary {
    /// Indices into [`ModelSummary::meshes`].
    pub meshes: Vec<usize>,
    pub vertex_count: usize,
    pub element_count: usize,
    pub stride: usize,
    pub vertex_bytes: usize,
    pub element_bytes: usize,
    pub format: VertexFormat,
}

impl ModelSummary {
    pub fn new(model: &Model, pack: Option<PackOptions>) -> Self {
        let bones = model
            .bones()
            .iter()
            .map(|b| {
                let p = b.position();
                BoneSummary {
                    name: b.name().to_string(),
                    parent: b.parent(),
                    parent_model_bone: b.parent_model_bone(),
                    position: [p.x, p.y, p.z],
                    inverse_bind: mat4_to_cols_array_2d(b.inverse_position_matrix()),
                }
            })
            .collect();

        let meshes = model
            .meshes()
            .iter()
            .map(|m| MeshSummary {
                name: m.name().to_string(),
                display_name: m.display_name().to_string(),
                vertex_count: m.vertex_count(),
                triangle_count: m.triangle_count(),
                uv_layers: m.uv_layers(),
                variant: m.variant(),
                format: m.format().clone(),
                texture_files: m.texture_files().to_vec(),
                textures: m.textures().to_vec(),
            })
            .collect();

        let packed = pack.map(|options| {
            model
                .pack(options)
                .into_iter()
                .map(|group| PackedSummary {
                    meshes: group.meshes.iter().map(|(i, _)| *i).collect(),
                    vertex_count: group.array.vertex_count(),
                    element_count: group.array.element_count(),
                    stride: group.array.stride(),
                    vertex_bytes: group.array.vertex_data().len(),
                    element_bytes: group.array.element_data().len(),
                    format: group.array.format().clone(),
                })
                .collect()
        });

        Self {
            name: model.name().to_string(),
            version: model.version(),
            parameters_found: model.parameters_found(),
            bones,
            meshes,
            packed,
        }
    }

    /// Human-readable report.
    pub fn print(&self) {
        println!(
            "Model {:?} (version {}, parameters {})",
            self.name,
            self.version,
            if self.parameters_found { "found" } else { "missing" }
        );

        println!("{} bones", self.bones.len());
        for (i, bone) in self.bones.iter().enumerate() {
            let parent = bone
                .parent
                .map(|p| p.to_string())
                .unwrap_or_else(|| "-".to_string());
            println!(
                "  [{i:3}] {:<32} parent {parent:>4}  at ({:.3}, {:.3}, {:.3})",
                bone.name, bone.position[0], bone.position[1], bone.position[2]
            );
        }

        println!("{} meshes", self.meshes.len());
        for (i, mesh) in self.meshes.iter().enumerate() {
            println!(
                "  [{i:3}] {} ({}): {} vertices, {} triangles, {} UV layers, stride {}",
                mesh.display_name,
                mesh.name,
                mesh.vertex_count,
                mesh.triangle_count,
                mesh.uv_layers,
                mesh.format.stride()
            );
            for texture in &mesh.textures {
                println!("        {:<24} {}", texture.identifier, texture.file);
            }
        }

        if let Some(packed) = &self.packed {
            println!("{} packed vertex arrays", packed.len());
            for (i, group) in packed.iter().enumerate() {
                println!(
                    "  [{i:3}] meshes {:?}: {} vertices ({} bytes, stride {}), {} elements ({} bytes)",
                    group.meshes,
                    group.vertex_count,
                    group.vertex_bytes,
                    group.stride,
                    group.element_count,
                    group.element_bytes
                );
            }
        }
    }
}
