//! XNALara model loading.
//!
//! A [`Model`] is the immutable result of loading one `.mesh`, `.xps` or
//! `.mesh.ascii` file: its bone hierarchy and its meshes, with tangents
//! computed and splitters applied.
//!
//! # Loading pipeline
//!
//! 1. Container header (binary only) selects the format version.
//! 2. Bones are read and linked.
//! 3. Each mesh is parsed and validated.
//! 4. Tangents and vertex formats are computed, in parallel across meshes.
//! 5. Meshes with splitters are replaced by their parts.
//!
//! Any failure aborts the load; there are no partial models.
//!
//! # Example
//!
//! ```ignore
//! use xnamesh_core::model::ModelLoader;
//! use xnamesh_core::params::ParamsDirectory;
//!
//! let loader = ModelLoader::new(ParamsDirectory::new("params"));
//! let model = loader.load_path("hero/generic_item.mesh")?;
//! for mesh in model.meshes() {
//!     println!("{}: {} vertices", mesh.display_name(), mesh.vertex_count());
//! }
//! ```

mod cache;
mod header;
mod loader;
#[cfg(test)]
mod tests;

pub use cache::{CacheKey, ModelCache};
pub use header::{EXTENDED_HEADER_MARKER, Header, read_header};
pub use loader::{LoaderOptions, ModelLoader, SourceKind, model_name_from_path};

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::bone::Bones;
use crate::mesh::{Mesh, PackOptions, Reservation, VertexArray, VertexFormat};
use crate::params::ModelParams;

/// A loaded model.
#[derive(Debug, Clone)]
pub struct Model {
    name: String,
    source: Option<PathBuf>,
    parent_source: Option<PathBuf>,
    version: u32,
    bones: Bones,
    meshes: Vec<Mesh>,
    params: Arc<ModelParams>,
    parameters_found: bool,
}

/// Meshes of one vertex format packed into a shared [`VertexArray`].
#[derive(Debug, Clone)]
pub struct PackedGroup {
    /// The packed data.
    pub array: VertexArray,
    /// Index into [`Model::meshes`] and placement of every packed mesh.
    pub meshes: Vec<(usize, Reservation)>,
}

impl Model {
    /// A model without bones or meshes.
    pub fn empty(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            source: None,
            parent_source: None,
            version: 0,
            bones: Bones::default(),
            meshes: Vec::new(),
            params: Arc::new(ModelParams::default()),
            parameters_found: false,
        }
    }

    /// Name used to look up parameters.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// File the model was loaded from.
    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    /// File of the parent model this one was loaded against.
    pub fn parent_source(&self) -> Option<&Path> {
        self.parent_source.as_deref()
    }

    /// Key identifying this model in a [`ModelCache`], if it came from a file.
    pub fn cache_key(&self) -> Option<CacheKey> {
        let key = CacheKey::new(self.source.as_ref()?);
        Some(match &self.parent_source {
            Some(parent) => key.with_parent(parent),
            None => key,
        })
    }

    /// Format version (0 for files without extended header and text files).
    pub fn version(&self) -> u32 {
        self.version
    }

    /// Bone hierarchy.
    pub fn bones(&self) -> &Bones {
        &self.bones
    }

    /// Meshes in file order, split parts in place of their source.
    pub fn meshes(&self) -> &[Mesh] {
        &self.meshes
    }

    /// First mesh called `name`.
    pub fn mesh(&self, name: &str) -> Option<&Mesh> {
        self.meshes.iter().find(|m| m.name() == name)
    }

    /// Parameters the model was loaded with.
    pub fn params(&self) -> &ModelParams {
        &self.params
    }

    /// Whether the parameter provider knew this model.
    pub fn parameters_found(&self) -> bool {
        self.parameters_found
    }

    /// Pack all meshes, one [`VertexArray`] per distinct vertex format.
    ///
    /// Groups appear in order of the first mesh using each format.
    pub fn pack(&self, options: PackOptions) -> Vec<PackedGroup> {
        let mut groups: Vec<PackedGroup> = Vec::new();
        let mut by_format: HashMap<&VertexFormat, usize> = HashMap::new();
        for (index, mesh) in self.meshes.iter().enumerate() {
            let group = *by_format.entry(mesh.format()).or_insert_with(|| {
                groups.push(PackedGroup {
                    array: VertexArray::new(mesh.format(), options),
                    meshes: Vec::new(),
                });
                groups.len() - 1
            });
            let reservation = groups[group].array.add(mesh);
            groups[group].meshes.push((index, reservation));
        }
        groups
    }
}
