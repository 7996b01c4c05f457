//! Per-model parameters that are not stored in the model file.
//!
//! Parameters map mesh names to display names, texture slot identifiers and
//! splitters. They are read from `<name>.modelparams.json` files:
//!
//! ```json
//! {
//!     "base": "xnaLaraDefault",
//!     "displayNames": { "body": "Body" },
//!     "meshTextures": { "body": ["diffuseTexture", "bumpTexture"] },
//!     "defaultTextures": ["diffuseTexture"],
//!     "meshSplitters": {
//!         "body": [{ "maxY": 1.0, "splitPartName": "legs" }]
//!     }
//! }
//! ```
//!
//! A file may name a `base` parameter set; entries missing from the file are
//! taken from the base, recursively.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Deserialize;

use crate::error::ModelError;
use crate::mesh::MeshSplitter;

/// Extension of parameter files.
pub const PARAMS_EXTENSION: &str = "modelparams.json";

/// Parameters for one model.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ModelParams {
    /// Parameter set this one inherits from.
    pub base: Option<String>,
    /// Mesh name to display name.
    pub display_names: HashMap<String, String>,
    /// Mesh name to texture slot identifiers, in file texture order.
    pub mesh_textures: HashMap<String, Vec<String>>,
    /// Texture slot identifiers for meshes without an entry.
    pub default_textures: Vec<String>,
    /// Mesh name to the splitters that replace it.
    pub mesh_splitters: HashMap<String, Vec<MeshSplitter>>,
}

impl ModelParams {
    /// Parse parameters from JSON.
    pub fn from_json(json: &str) -> Result<Self, ModelError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Texture slot identifiers for `mesh`, in file texture order.
    pub fn texture_identifiers(&self, mesh: &str) -> &[String] {
        self.mesh_textures
            .get(mesh)
            .map(Vec::as_slice)
            .unwrap_or(&self.default_textures)
    }

    /// Display name configured for `mesh`.
    pub fn display_name(&self, mesh: &str) -> Option<&str> {
        self.display_names.get(mesh).map(String::as_str)
    }

    /// Splitters configured for `mesh`.
    pub fn splitters(&self, mesh: &str) -> &[MeshSplitter] {
        self.mesh_splitters
            .get(mesh)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Fill everything missing here from `base`.
    pub fn inherit(&mut self, base: &ModelParams) {
        for (k, v) in &base.display_names {
            self.display_names.entry(k.clone()).or_insert_with(|| v.clone());
        }
        for (k, v) in &base.mesh_textures {
            self.mesh_textures.entry(k.clone()).or_insert_with(|| v.clone());
        }
        for (k, v) in &base.mesh_splitters {
            self.mesh_splitters.entry(k.clone()).or_insert_with(|| v.clone());
        }
        if self.default_textures.is_empty() {
            self.default_textures = base.default_textures.clone();
        }
    }
}

/// Source of model parameters.
pub trait ParameterProvider: Send + Sync {
    /// Parameters for the model called `model_name`.
    ///
    /// Returns [`ModelError::ParametersNotFound`] if there are none.
    fn parameters(&self, model_name: &str) -> Result<Arc<ModelParams>, ModelError>;
}

/// Provider without any parameters.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoParameters;

impl ParameterProvider for NoParameters {
    fn parameters(&self, model_name: &str) -> Result<Arc<ModelParams>, ModelError> {
        Err(ModelError::ParametersNotFound(model_name.to_string()))
    }
}

/// Provider reading `<dir>/<name>.modelparams.json` files.
#[derive(Debug, Clone)]
pub struct ParamsDirectory {
    dir: PathBuf,
}

impl ParamsDirectory {
    /// Provider for the files in `dir`.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Directory searched for parameter files.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{name}.{PARAMS_EXTENSION}"))
    }

    fn read(&self, name: &str) -> Result<ModelParams, ModelError> {
        let path = self.path_for(name);
        let json = match std::fs::read_to_string(&path) {
            Ok(json) => json,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(ModelError::ParametersNotFound(name.to_string()));
            }
            Err(e) => return Err(ModelError::io(path, e)),
        };
        ModelParams::from_json(&json)
    }
}

impl ParameterProvider for ParamsDirectory {
    fn parameters(&self, model_name: &str) -> Result<Arc<ModelParams>, ModelError> {
        let mut params = self.read(model_name)?;
        let mut seen = HashSet::from([model_name.to_string()]);
        let mut next = params.base.clone();
        while let Some(base_name) = next {
            if !seen.insert(base_name.clone()) {
                log::warn!("Parameter set {base_name:?} inherits from itself; stopping");
                break;
            }
            let base = match self.read(&base_name) {
                Ok(base) => base,
                Err(ModelError::ParametersNotFound(_)) => {
                    log::warn!("Base parameter set {base_name:?} of {model_name:?} not found");
                    break;
                }
                Err(e) => return Err(e),
            };
            params.inherit(&base);
            next = base.base;
        }
        Ok(Arc::new(params))
    }
}
