//! Binary container header.

use crate::error::{ModelError, Section};
use crate::reader::{BinaryReader, DataReader};

/// Leading value that marks the extended header.
pub const EXTENDED_HEADER_MARKER: u32 = 323_232;

/// Tool author string written by XNALara itself.
const EXPECTED_TOOL_AUTHOR: &str = "XNAaraL";

/// What the header says about the rest of the file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header {
    /// Format version: 0 without the extended header, 2 to 4 with it.
    pub version: u32,
    /// Number of bone records that follow.
    pub bone_count: usize,
}

/// Map the extended header's major version to the format version.
fn version_for_major(major: u16) -> Option<u32> {
    match major {
        1 => Some(2),
        2 => Some(3),
        3 => Some(4),
        _ => None,
    }
}

/// Read the header up to and including the bone count.
pub fn read_header(reader: &mut BinaryReader<'_>) -> Result<Header, ModelError> {
    let first = reader.read_u32();
    reader.checkpoint(Section::Header)?;
    if first != EXTENDED_HEADER_MARKER {
        return Ok(Header {
            version: 0,
            bone_count: first as usize,
        });
    }

    let major = reader.read_u16();
    let minor = reader.read_u16();
    reader.checkpoint(Section::Header)?;
    log::debug!("Extended header version {major}.{minor}");
    let version = version_for_major(major).ok_or_else(|| {
        ModelError::FileTypeNotSupported(format!(
            "extended header with unknown major version {major}"
        ))
    })?;

    let tool_author = reader.read_pascal_string();
    if reader.is_valid() && tool_author != EXPECTED_TOOL_AUTHOR {
        log::warn!(
            "Unusual tool author string at byte {}: {tool_author:?}",
            reader.position()
        );
    }

    let skipped_count = reader.read_u32() as usize;
    let aux = [
        reader.read_pascal_string(),
        reader.read_pascal_string(),
        reader.read_pascal_string(),
    ];
    log::debug!("Auxiliary header strings: {aux:?}");
    reader.ensure_fits(skipped_count, 4, Section::Header)?;
    reader.skip(skipped_count * 4);

    let bone_count = reader.read_u32() as usize;
    reader.checkpoint(Section::Header)?;
    Ok(Header {
        version,
        bone_count,
    })
}
