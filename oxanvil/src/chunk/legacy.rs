use indexmap::IndexMap;
use oxnbt::Compound;

use crate::bits::nibble;
use crate::chunk::{int_like, position_of, BlockState};
use crate::{Error, Result};

/// A pre-palette chunk: numeric block ids in `Level.Sections[].Blocks`,
/// optionally widened to 12 bits by the `Add` nibble array, with metadata
/// in `Data`.
#[derive(Debug)]
pub struct LegacyChunk {
    data_version: Option<i32>,
    position: Option<(i32, i32)>,
    sections: Vec<LegacySection>,
}

#[derive(Debug)]
pub(crate) struct LegacySection {
    pub(crate) y: isize,
    blocks: Vec<i8>,
    add: Option<Vec<i8>>,
    data: Option<Vec<i8>>,
}

impl LegacyChunk {
    pub(crate) fn from_tree(root: &Compound, data_version: Option<i32>) -> Result<LegacyChunk> {
        let level = root
            .get("Level")
            .and_then(|v| v.as_compound().ok())
            .ok_or_else(|| Error::InvalidChunk("legacy chunk without Level".to_owned()))?;

        let mut sections = Vec::new();
        if let Some(section_list) = level.get("Sections") {
            for section in section_list.as_list()? {
                let section = section.as_compound()?;

                // sections without block ids hold only light data
                let blocks = match section.get("Blocks") {
                    Some(blocks) => blocks.as_byte_array()?,
                    None => continue,
                };
                if blocks.len() != 4096 {
                    return Err(Error::InvalidChunk(format!(
                        "legacy Blocks array has {} entries, expected 4096",
                        blocks.len()
                    )));
                }

                let y = section
                    .get("Y")
                    .and_then(int_like)
                    .ok_or_else(|| Error::InvalidChunk("section without Y".to_owned()))?
                    as isize;

                sections.push(LegacySection {
                    y,
                    blocks: blocks.to_vec(),
                    add: nibble_array(section, "Add")?,
                    data: nibble_array(section, "Data")?,
                });
            }
        }
        sections.sort_by_key(|section| section.y);

        Ok(LegacyChunk {
            data_version,
            position: position_of(root),
            sections,
        })
    }

    pub fn data_version(&self) -> Option<i32> {
        self.data_version
    }

    pub fn position(&self) -> Option<(i32, i32)> {
        self.position
    }

    /// The block at chunk-local x/z and world y.
    pub fn block(&self, x: usize, y: isize, z: usize) -> Option<BlockState> {
        let section_y = y.div_euclid(16);
        let section = self
            .sections
            .iter()
            .find(|section| section.y == section_y)?;

        let sec_y = y.rem_euclid(16) as usize;
        Some(section.block_state(sec_y * 256 + z * 16 + x))
    }

    pub(crate) fn sections(&self) -> &[LegacySection] {
        &self.sections
    }

    pub(crate) fn section_ys(&self) -> Vec<isize> {
        self.sections.iter().map(|section| section.y).collect()
    }
}

impl LegacySection {
    /// The 12-bit numeric block id at the section-local index.
    pub(crate) fn id_at(&self, index: usize) -> u16 {
        let mut id = self.blocks[index] as u8 as u16;
        if let Some(add) = &self.add {
            id |= (nibble(add, index) as u16) << 8;
        }
        id
    }

    /// The 4-bit metadata value at the section-local index.
    pub(crate) fn data_at(&self, index: usize) -> u8 {
        self.data
            .as_ref()
            .map(|data| nibble(data, index))
            .unwrap_or(0)
    }

    /// A block state for the id: the decimal id as the name, with the
    /// metadata nibble as a `data` property when nonzero.
    pub(crate) fn block_state(&self, index: usize) -> BlockState {
        let mut properties = IndexMap::new();
        let data = self.data_at(index);
        if data != 0 {
            properties.insert("data".to_owned(), data.to_string());
        }
        BlockState::with_properties(self.id_at(index).to_string(), properties)
    }
}

fn nibble_array(section: &Compound, name: &str) -> Result<Option<Vec<i8>>> {
    let array = match section.get(name) {
        Some(array) => array.as_byte_array()?,
        None => return Ok(None),
    };
    if array.len() != 2048 {
        return Err(Error::InvalidChunk(format!(
            "legacy {name} array has {} entries, expected 2048",
            array.len()
        )));
    }
    Ok(Some(array.to_vec()))
}
