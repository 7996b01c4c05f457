//! Loader entry points: format dispatch and the per-file pipeline.

use std::path::Path;
use std::sync::Arc;

use rayon::prelude::*;
use serde::Deserialize;

use super::Model;
use super::header::read_header;
use crate::bone::Bones;
use crate::error::{ModelError, Section};
use crate::mesh::{Mesh, MeshVariant, compute_tangents, parse_mesh, validate_mesh};
use crate::params::{ModelParams, NoParameters, ParameterProvider};
use crate::reader::{BinaryReader, DataReader, TextReader};

/// Smallest mesh record in a binary file: empty name and four counts.
const MIN_MESH_RECORD_SIZE: usize = 1 + 4 * 4;

/// Loader configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct LoaderOptions {
    /// Compute tangents and vertex formats for all meshes in parallel.
    pub parallel_finalize: bool,
    /// Replace tangents stored in the file with computed ones.
    pub recompute_tangents: bool,
}

impl Default for LoaderOptions {
    fn default() -> Self {
        Self {
            parallel_finalize: true,
            recompute_tangents: false,
        }
    }
}

impl LoaderOptions {
    /// Enable or disable parallel finalization.
    pub fn with_parallel_finalize(mut self, parallel: bool) -> Self {
        self.parallel_finalize = parallel;
        self
    }

    /// Enable or disable recomputing tangents stored in the file.
    pub fn with_recompute_tangents(mut self, recompute: bool) -> Self {
        self.recompute_tangents = recompute;
        self
    }
}

/// Container format of a model file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    /// `.mesh` or `.xps`.
    Binary,
    /// `.mesh.ascii`.
    Ascii,
}

impl SourceKind {
    /// Format of the file at `path`, judged by its name.
    pub fn from_path(path: &Path) -> Result<Self, ModelError> {
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_lowercase())
            .unwrap_or_default();
        if file_name.ends_with(".mesh.ascii") {
            Ok(Self::Ascii)
        } else if file_name.ends_with(".mesh") || file_name.ends_with(".xps") {
            Ok(Self::Binary)
        } else {
            Err(ModelError::FileTypeNotSupported(path.display().to_string()))
        }
    }
}

/// Parameter lookup name for the file at `path`: the file name without up
/// to two extensions, lowercased.
pub fn model_name_from_path(path: &Path) -> String {
    let mut name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    for _ in 0..2 {
        match name.rsplit_once('.') {
            Some((stem, _)) if !stem.is_empty() => name = stem.to_string(),
            _ => break,
        }
    }
    name.to_lowercase()
}

/// Loads models using a parameter provider and [`LoaderOptions`].
#[derive(Clone)]
pub struct ModelLoader {
    provider: Arc<dyn ParameterProvider>,
    options: LoaderOptions,
}

impl Default for ModelLoader {
    fn default() -> Self {
        Self::new(NoParameters)
    }
}

impl ModelLoader {
    /// Create a loader that takes parameters from `provider`.
    pub fn new(provider: impl ParameterProvider + 'static) -> Self {
        Self {
            provider: Arc::new(provider),
            options: LoaderOptions::default(),
        }
    }

    /// Set the loader options.
    pub fn with_options(mut self, options: LoaderOptions) -> Self {
        self.options = options;
        self
    }

    /// Loader options in use.
    pub fn options(&self) -> LoaderOptions {
        self.options
    }

    /// Load the model file at `path`, choosing the format by file name.
    pub fn load_path(&self, path: impl AsRef<Path>) -> Result<Model, ModelError> {
        self.load_path_inner(path.as_ref(), None)
    }

    /// Load the model file at `path` as an item of `parent`.
    ///
    /// Text models defer bones named like one of the parent's bones to that
    /// bone. Binary models only record the parent.
    pub fn load_path_with_parent(
        &self,
        path: impl AsRef<Path>,
        parent: &Model,
    ) -> Result<Model, ModelError> {
        self.load_path_inner(path.as_ref(), Some(parent))
    }

    fn load_path_inner(&self, path: &Path, parent: Option<&Model>) -> Result<Model, ModelError> {
        let kind = SourceKind::from_path(path)?;
        let name = model_name_from_path(path);
        let bytes = std::fs::read(path).map_err(|e| ModelError::io(path, e))?;
        let mut model = match kind {
            SourceKind::Binary => self.load_binary(&bytes, &name)?,
            SourceKind::Ascii => {
                self.load_ascii_inner(&String::from_utf8_lossy(&bytes), &name, parent)?
            }
        };
        model.source = Some(path.to_path_buf());
        model.parent_source = parent.and_then(|p| p.source.clone());
        Ok(model)
    }

    /// Load a binary model from memory.
    pub fn load_binary(&self, bytes: &[u8], name: &str) -> Result<Model, ModelError> {
        let (params, found) = self.lookup_params(name)?;
        let mut reader = BinaryReader::new(bytes);
        let header = read_header(&mut reader)?;
        log::debug!(
            "Loading binary model {name:?}: version {}, {} bones",
            header.version,
            header.bone_count
        );
        let variant = MeshVariant::binary(header.version);
        let bones = Bones::read(&mut reader, header.bone_count)?;
        self.load_body(
            &mut reader,
            name,
            header.version,
            bones,
            variant,
            params,
            found,
        )
    }

    /// Load a `.mesh.ascii` model from its text.
    pub fn load_ascii(&self, text: &str, name: &str) -> Result<Model, ModelError> {
        self.load_ascii_inner(text, name, None)
    }

    /// Load a `.mesh.ascii` model whose bones may belong to `parent`.
    pub fn load_ascii_with_parent(
        &self,
        text: &str,
        name: &str,
        parent: &Model,
    ) -> Result<Model, ModelError> {
        let mut model = self.load_ascii_inner(text, name, Some(parent))?;
        model.parent_source = parent.source.clone();
        Ok(model)
    }

    fn load_ascii_inner(
        &self,
        text: &str,
        name: &str,
        parent: Option<&Model>,
    ) -> Result<Model, ModelError> {
        let (params, found) = self.lookup_params(name)?;
        let mut reader = TextReader::new(text);
        let bone_count = reader.read_u32() as usize;
        reader.checkpoint(Section::Header)?;
        log::debug!("Loading text model {name:?}: {bone_count} bones");

        let mut bones = Bones::read(&mut reader, bone_count)?;
        if let Some(parent) = parent {
            bones.share_with_parent(parent.bones());
            log::debug!(
                "Model {name:?} shares {} bones with {:?}",
                bones.iter().filter(|b| b.parent_model_bone().is_some()).count(),
                parent.name()
            );
        }
        self.load_body(
            &mut reader,
            name,
            0,
            bones,
            MeshVariant::ascii(),
            params,
            found,
        )
    }

    fn lookup_params(&self, name: &str) -> Result<(Arc<ModelParams>, bool), ModelError> {
        match self.provider.parameters(name) {
            Ok(params) => Ok((params, true)),
            Err(ModelError::ParametersNotFound(_)) => {
                log::warn!("No model parameters for {name:?}; using defaults");
                Ok((Arc::new(ModelParams::default()), false))
            }
            Err(e) => Err(e),
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn load_body(
        &self,
        reader: &mut impl DataReader,
        name: &str,
        version: u32,
        bones: Bones,
        variant: MeshVariant,
        params: Arc<ModelParams>,
        parameters_found: bool,
    ) -> Result<Model, ModelError> {
        let mesh_count = reader.read_u32() as usize;
        reader.checkpoint(Section::MeshCount)?;
        reader.ensure_fits(mesh_count, MIN_MESH_RECORD_SIZE, Section::MeshCount)?;

        let mut raw = Vec::with_capacity(mesh_count.min(1024));
        for _ in 0..mesh_count {
            let mesh = parse_mesh(reader, variant, bones.len(), &params)?;
            validate_mesh(&mesh, bones.len())?;
            raw.push(mesh);
        }

        let recompute = self.options.recompute_tangents;
        let finalized: Vec<Mesh> = if self.options.parallel_finalize {
            raw.into_par_iter().map(|m| finalize(m, recompute)).collect()
        } else {
            raw.into_iter().map(|m| finalize(m, recompute)).collect()
        };

        let meshes = apply_splitters(finalized, &params);
        log::info!(
            "Loaded model {name:?}: {} bones, {} meshes",
            bones.len(),
            meshes.len()
        );

        Ok(Model {
            name: name.to_string(),
            source: None,
            parent_source: None,
            version,
            bones,
            meshes,
            params,
            parameters_found,
        })
    }
}

/// Compute tangents where needed and re-derive the vertex format.
fn finalize(mesh: Mesh, recompute_tangents: bool) -> Mesh {
    if mesh.variant().has_tangents_in_file && !recompute_tangents {
        return mesh;
    }
    let combined = mesh.accessors().combine(&compute_tangents(&mesh));
    mesh.with_accessors(combined)
}

/// Replace every mesh that has splitters with its non-empty parts.
fn apply_splitters(meshes: Vec<Mesh>, params: &ModelParams) -> Vec<Mesh> {
    let mut result = Vec::with_capacity(meshes.len());
    for mesh in meshes {
        let splitters = params.splitters(mesh.name());
        if splitters.is_empty() {
            result.push(mesh);
            continue;
        }
        for splitter in splitters {
            match splitter.split(&mesh) {
                Some(part) => {
                    let display = params
                        .display_name(part.name())
                        .unwrap_or(part.name())
                        .to_string();
                    result.push(part.with_display_name(display));
                }
                None => log::debug!(
                    "Split part {:?} of mesh {:?} is empty",
                    splitter.split_part_name,
                    mesh.name()
                ),
            }
        }
    }
    result
}
