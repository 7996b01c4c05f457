//! Texture references of a mesh.

/// A texture file bound to one of the shader's texture slots.
#[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize)]
pub struct TextureAssignment {
    /// Texture slot identifier supplied by the model parameters.
    pub identifier: String,
    /// Percent-encoded file name, relative to the model's directory.
    pub file: String,
}

impl TextureAssignment {
    /// Create an assignment.
    pub fn new(identifier: impl Into<String>, file: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            file: file.into(),
        }
    }
}

/// Reduce a stored texture path to its file name and percent-encode it.
///
/// Files written on Windows use `\` as separator, so both `\` and `/` are
/// treated as separators.
pub fn texture_file_name(stored: &str) -> String {
    let name = stored.rsplit(['\\', '/']).next().unwrap_or(stored);
    percent_encode_path(name)
}

/// Characters allowed unescaped in a URL path besides ASCII alphanumerics.
const PATH_SAFE: &[u8] = b"-._~!$&'()*+,;=:@/";

fn percent_encode_path(input: &str) -> String {
    const HEX: &[u8; 16] = b"0123456789ABCDEF";
    let mut out = String::with_capacity(input.len());
    for &b in input.as_bytes() {
        if b.is_ascii_alphanumeric() || PATH_SAFE.contains(&b) {
            out.push(b as char);
        } else {
            out.push('%');
            out.push(HEX[(b >> 4) as usize] as char);
            out.push(HEX[(b & 0x0f) as usize] as char);
        }
    }
    out
}
