//! Error types for model loading.

use std::fmt;
use std::path::PathBuf;

/// The part of a model file that was being read when data ran out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Section {
    /// The container header (marker, version, auxiliary strings).
    Header,
    /// The bone list.
    Bones,
    /// The mesh count following the bones.
    MeshCount,
    /// A mesh's name, UV layer count and texture list.
    Textures,
    /// A mesh's vertex block.
    Vertices,
    /// A mesh's triangle count and element block.
    Elements,
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Header => write!(f, "header"),
            Self::Bones => write!(f, "bones section"),
            Self::MeshCount => write!(f, "mesh count"),
            Self::Textures => write!(f, "mesh description"),
            Self::Vertices => write!(f, "vertex data"),
            Self::Elements => write!(f, "element data"),
        }
    }
}

/// What kind of reference an out-of-range index came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IndexKind {
    /// A bone's parent index.
    BoneParent,
    /// A bone index referenced by a vertex.
    VertexBone,
    /// An entry of a mesh's element buffer.
    Element,
}

impl fmt::Display for IndexKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BoneParent => write!(f, "bone parent"),
            Self::VertexBone => write!(f, "vertex bone"),
            Self::Element => write!(f, "element"),
        }
    }
}

/// Errors that can occur while loading a model.
///
/// Any of these aborts the whole load. The same input always produces the
/// same error, so none of them are worth retrying.
#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    /// A required field could not be read.
    #[error("the file is missing some data: premature end of {section} (first failed read at byte {offset})")]
    PrematureEndOfFile {
        /// Section whose checkpoint failed.
        section: Section,
        /// Byte offset of the first read that failed.
        offset: usize,
    },
    /// An index exceeds its declared bound.
    #[error("{kind} index {index} out of range (limit {limit})")]
    IndexOutOfRange {
        /// Where the index came from.
        kind: IndexKind,
        /// The offending value.
        index: usize,
        /// The exclusive upper bound it violated.
        limit: usize,
    },
    /// A bone is its own ancestor.
    #[error("bone {bone} ({name:?}) is its own ancestor")]
    CircularReference {
        /// Index of the bone whose ancestor walk looped.
        bone: usize,
        /// Name of that bone.
        name: String,
    },
    /// Unrecognized container marker, version or file extension.
    #[error("file type not supported: {0}")]
    FileTypeNotSupported(String),
    /// No parameter profile exists for this model.
    #[error("no model parameters found for {0:?}")]
    ParametersNotFound(String),
    /// Reading a file from disk failed.
    #[error("failed to read {}: {source}", path.display())]
    Io {
        /// The file being read.
        path: PathBuf,
        /// Underlying IO error.
        #[source]
        source: std::io::Error,
    },
    /// A parameter file exists but could not be decoded.
    #[error("invalid model parameters: {0}")]
    InvalidParameters(#[from] serde_json::Error),
}

impl ModelError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ModelError::PrematureEndOfFile {
            section: Section::Vertices,
            offset: 120,
        };
        assert_eq!(
            err.to_string(),
            "the file is missing some data: premature end of vertex data (first failed read at byte 120)"
        );

        let err = ModelError::IndexOutOfRange {
            kind: IndexKind::VertexBone,
            index: 5,
            limit: 4,
        };
        assert_eq!(err.to_string(), "vertex bone index 5 out of range (limit 4)");
    }

    #[test]
    fn test_circular_reference_names_bone() {
        let err = ModelError::CircularReference {
            bone: 3,
            name: "arm".to_string(),
        };
        assert_eq!(err.to_string(), "bone 3 (\"arm\") is its own ancestor");
    }
}
