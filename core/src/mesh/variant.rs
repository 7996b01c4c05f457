//! Per-file-version vertex layout switches.

use super::attrib::{AttribFormat, VertexAttrib, VertexSemantic};

/// How a mesh's vertices are laid out in its source file.
///
/// One parser handles every format version; the differences between them are
/// captured by these switches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, serde::Serialize)]
pub struct MeshVariant {
    /// Each vertex stores one Float4 tangent per UV layer.
    pub has_tangents_in_file: bool,
    /// Bone influences are stored as a variable-length list after each vertex.
    pub has_variable_bones_per_vertex: bool,
    /// Colors are four floats instead of four normalized bytes.
    pub colors_are_floats: bool,
    /// Fixed bone lists may end early and their weights get renormalized.
    pub short_bone_lists: bool,
}

impl MeshVariant {
    /// Layout of binary files of the given container version.
    pub fn binary(version: u32) -> Self {
        Self {
            has_tangents_in_file: version < 3,
            has_variable_bones_per_vertex: version >= 4,
            colors_are_floats: false,
            short_bone_lists: false,
        }
    }

    /// Layout of `.mesh.ascii` files.
    pub fn ascii() -> Self {
        Self {
            has_tangents_in_file: false,
            has_variable_bones_per_vertex: false,
            colors_are_floats: false,
            short_bone_lists: true,
        }
    }

    /// Builder: store colors as floats.
    pub fn with_float_colors(mut self) -> Self {
        self.colors_are_floats = true;
        self
    }

    /// Whether vertices carry a fixed four-slot bone list.
    pub fn has_fixed_bones(&self, model_has_bones: bool) -> bool {
        model_has_bones && !self.has_variable_bones_per_vertex
    }

    /// Attributes of one parsed vertex in the order they are stored in memory.
    ///
    /// This follows the file order, except that the variable-layout
    /// placeholder is widened to a `Uint2` (offset and count into the side
    /// arrays).
    pub fn vertex_attributes(&self, uv_layers: usize, model_has_bones: bool) -> Vec<VertexAttrib> {
        use VertexSemantic::*;

        let mut attribs = vec![
            VertexAttrib::new(Position, 0, AttribFormat::Float3),
            VertexAttrib::new(Normal, 0, AttribFormat::Float3),
            VertexAttrib::new(
                Color,
                0,
                if self.colors_are_floats {
                    AttribFormat::Float4
                } else {
                    AttribFormat::Unorm8x4
                },
            ),
        ];
        attribs.extend((0..uv_layers).map(|l| VertexAttrib::new(TexCoord, l, AttribFormat::Float2)));
        if self.has_tangents_in_file {
            attribs.extend((0..uv_layers).map(|l| VertexAttrib::new(Tangent, l, AttribFormat::Float4)));
        } else if self.has_variable_bones_per_vertex {
            attribs.push(VertexAttrib::new(Padding, 0, AttribFormat::Uint2));
        }
        if self.has_fixed_bones(model_has_bones) {
            attribs.push(VertexAttrib::new(BoneIndices, 0, AttribFormat::Uint16x4));
            attribs.push(VertexAttrib::new(BoneWeights, 0, AttribFormat::Float4));
        }
        attribs
    }

    /// Smallest number of bytes one vertex can occupy in a binary file.
    pub fn min_file_vertex_size(&self, uv_layers: usize, model_has_bones: bool) -> usize {
        let color = if self.colors_are_floats { 16 } else { 4 };
        let mut size = 12 + 12 + color + 8 * uv_layers;
        if self.has_tangents_in_file {
            size += 16 * uv_layers;
        } else if self.has_variable_bones_per_vertex {
            // Placeholder plus the influence count.
            size += 4 + 2;
        }
        if self.has_fixed_bones(model_has_bones) {
            size += 8 + 16;
        }
        size
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(0, true, false)]
    #[case(2, true, false)]
    #[case(3, false, false)]
    #[case(4, false, true)]
    fn test_binary_version_switches(
        #[case] version: u32,
        #[case] tangents: bool,
        #[case] variable: bool,
    ) {
        let v = MeshVariant::binary(version);
        assert_eq!(v.has_tangents_in_file, tangents);
        assert_eq!(v.has_variable_bones_per_vertex, variable);
        assert!(!v.colors_are_floats);
    }

    #[test]
    fn test_ascii_layout() {
        let attribs = MeshVariant::ascii().vertex_attributes(2, true);
        let semantics: Vec<_> = attribs.iter().map(|a| a.semantic).collect();
        assert_eq!(
            semantics,
            vec![
                VertexSemantic::Position,
                VertexSemantic::Normal,
                VertexSemantic::Color,
                VertexSemantic::TexCoord,
                VertexSemantic::TexCoord,
                VertexSemantic::BoneIndices,
                VertexSemantic::BoneWeights,
            ]
        );
    }

    #[test]
    fn test_variable_layout_has_padding_and_no_fixed_bones() {
        let attribs = MeshVariant::binary(4).vertex_attributes(1, true);
        assert_eq!(attribs.last().map(|a| a.format), Some(AttribFormat::Uint2));
        assert!(!attribs.iter().any(|a| a.semantic == VertexSemantic::BoneIndices));
    }

    #[test]
    fn test_min_file_vertex_size() {
        assert_eq!(MeshVariant::binary(0).min_file_vertex_size(1, true), 28 + 8 + 16 + 24);
        assert_eq!(MeshVariant::binary(3).min_file_vertex_size(1, false), 28 + 8);
        assert_eq!(MeshVariant::binary(4).min_file_vertex_size(1, true), 28 + 8 + 6);
        assert_eq!(
            MeshVariant::binary(3).with_float_colors().min_file_vertex_size(0, false),
            40
        );
    }
}
