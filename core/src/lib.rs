//! # xnamesh core
//!
//! Import of XNALara / XPS models (`.mesh`, `.xps`, `.mesh.ascii`) into
//! renderer-ready meshes: bone hierarchy, vertex accessors, computed
//! tangents, parameter-driven splitting and vertex packing.

pub mod bone;
pub mod error;
pub mod math;
pub mod mesh;
pub mod model;
pub mod params;
pub mod reader;

pub use error::ModelError;
pub use model::{LoaderOptions, Model, ModelCache, ModelLoader};

/// Core library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
