//! Mesh data and processing.
//!
//! This module provides:
//!
//! - [`VertexAttrib`], [`VertexAttribAccessor`], [`AccessorSet`] - Strided views onto vertex data
//! - [`VertexFormat`] - Ordered attribute list plus index format
//! - [`Mesh`] - Parsed mesh with shared buffers
//! - [`parse_mesh`], [`validate_mesh`], [`compute_tangents`] - The loading pipeline
//! - [`MeshSplitter`] - Bounding-box based mesh splitting
//! - [`VertexArray`] - Packing meshes of one format into a single buffer

mod accessor;
mod attrib;
mod data;
mod format;
mod packer;
mod parse;
mod splitter;
mod tangents;
mod texture;
mod validate;
mod variant;

pub use accessor::{AccessorSet, VertexAttribAccessor};
pub use attrib::{AttribFormat, AttribKey, VertexAttrib, VertexSemantic};
pub use data::{BoneInfluence, ElementBuffer, Mesh, VariableBones};
pub use format::{IndexFormat, VertexFormat};
pub use packer::{
    PackOptions, Reservation, VertexArray, pack_signed, pack_snorm_101010, pack_snorm_1010102,
    pack_weights_unorm16,
};
pub use parse::{normalize_weights, parse_mesh};
pub use splitter::MeshSplitter;
pub use tangents::compute_tangents;
pub use texture::{TextureAssignment, texture_file_name};
pub use validate::validate_mesh;
pub use variant::MeshVariant;
