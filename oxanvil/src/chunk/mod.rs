//! Chunk schemas and block decoding across Anvil revisions.
//!
//! [`Chunk::from_bytes`] classifies a chunk from its NBT tree alone:
//! palette sections mean a modern chunk (either the 1.13–1.17
//! `Level.Sections` layout or the 1.18+ `sections` layout), numeric
//! `Blocks` arrays mean a legacy chunk.

mod block;
mod iter;
mod legacy;
mod modern;

use std::ops::Range;

use once_cell::sync::Lazy;
use oxnbt::{Compound, Document, Value};

pub use block::BlockState;
pub use iter::{ChunkBlocks, WorldBlock};
pub use legacy::LegacyChunk;
pub use modern::ModernChunk;

use crate::{CCoord, Error, Result};

pub static AIR: Lazy<BlockState> = Lazy::new(|| BlockState::new("minecraft:air"));

/// A chunk in any of the supported on-disk layouts.
#[derive(Debug)]
pub enum Chunk {
    Modern(ModernChunk),
    Legacy(LegacyChunk),
}

impl Chunk {
    /// Build a chunk from its NBT payload, as handed out by
    /// [`crate::Region::read_chunk`].
    pub fn from_bytes(data: &[u8]) -> Result<Chunk> {
        let document = Document::from_bytes(data)?;
        Self::from_tree(document.root())
    }

    /// Build a chunk from an already-parsed tree.
    pub fn from_tree(root: &Compound) -> Result<Chunk> {
        let data_version = root
            .get("DataVersion")
            .and_then(|v| v.as_int().ok());

        // 1.18 flattened the chunk: sections live at the root
        if root.get("sections").is_some() {
            let data_version =
                data_version.ok_or(Error::UnsupportedDataVersion(0))?;
            return Ok(Chunk::Modern(ModernChunk::from_tree(root, data_version)?));
        }

        let level = root
            .get("Level")
            .and_then(|v| v.as_compound().ok())
            .ok_or_else(|| Error::InvalidChunk("no sections and no Level compound".to_owned()))?;

        let has_palette = level
            .get("Sections")
            .and_then(|v| v.as_list().ok())
            .map(|sections| {
                sections.iter().any(|section| {
                    section
                        .as_compound()
                        .map(|section| section.contains("Palette"))
                        .unwrap_or(false)
                })
            })
            .unwrap_or(false);

        if has_palette {
            let data_version =
                data_version.ok_or(Error::UnsupportedDataVersion(0))?;
            Ok(Chunk::Modern(ModernChunk::from_tree(root, data_version)?))
        } else {
            Ok(Chunk::Legacy(LegacyChunk::from_tree(root, data_version)?))
        }
    }

    /// The chunk's schema revision. Absent on old legacy chunks.
    pub fn data_version(&self) -> Option<i32> {
        match self {
            Chunk::Modern(chunk) => Some(chunk.data_version()),
            Chunk::Legacy(chunk) => chunk.data_version(),
        }
    }

    /// Chunk coordinates recorded inside the chunk itself, when present.
    pub fn position(&self) -> Option<(i32, i32)> {
        match self {
            Chunk::Modern(chunk) => chunk.position(),
            Chunk::Legacy(chunk) => chunk.position(),
        }
    }

    /// The block at chunk-local x/z (0..16) and world y. `None` when y
    /// falls outside the stored sections.
    pub fn block(&self, x: usize, y: isize, z: usize) -> Option<BlockState> {
        match self {
            Chunk::Modern(chunk) => chunk.block(x, y, z),
            Chunk::Legacy(chunk) => chunk.block(x, y, z),
        }
    }

    /// The world-y range covered by the stored sections.
    pub fn y_range(&self) -> Range<isize> {
        let ys = match self {
            Chunk::Modern(chunk) => chunk.section_ys(),
            Chunk::Legacy(chunk) => chunk.section_ys(),
        };
        match (ys.iter().min(), ys.iter().max()) {
            (Some(min), Some(max)) => (min * 16)..((max + 1) * 16),
            _ => 0..0,
        }
    }

    /// Iterate every block, ascending by section, then y, then z, then x,
    /// at world coordinates for the chunk position (cx, cz). Air is left
    /// out unless `include_air` is set; broken sections are yielded as
    /// errors and iteration moves to the next section.
    pub fn into_blocks(self, cx: CCoord, cz: CCoord, include_air: bool) -> ChunkBlocks {
        ChunkBlocks::new(self, cx, cz, include_air)
    }

    pub(crate) fn section_count(&self) -> usize {
        match self {
            Chunk::Modern(chunk) => chunk.sections().len(),
            Chunk::Legacy(chunk) => chunk.sections().len(),
        }
    }
}

/// NBT writers disagree on integer widths for small fields, eg a section's
/// Y can be a byte or an int.
pub(crate) fn int_like(value: &Value) -> Option<i64> {
    match value {
        Value::Byte(v) => Some(*v as i64),
        Value::Short(v) => Some(*v as i64),
        Value::Int(v) => Some(*v as i64),
        Value::Long(v) => Some(*v),
        _ => None,
    }
}

/// Position fields as recorded in the chunk: `xPos`/`zPos` at the root
/// (1.18+) or in `Level` (earlier).
pub(crate) fn position_of(root: &Compound) -> Option<(i32, i32)> {
    let holder = match root.get("Level").and_then(|v| v.as_compound().ok()) {
        Some(level) => level,
        None => root,
    };
    let x = holder.get("xPos").and_then(int_like)? as i32;
    let z = holder.get("zPos").and_then(int_like)? as i32;
    Some((x, z))
}

pub(crate) fn is_air(name: &str) -> bool {
    matches!(
        name,
        "minecraft:air" | "minecraft:cave_air" | "minecraft:void_air"
    )
}
