use indexmap::IndexMap;
use oxnbt::{Compound, Value};

use crate::bits::{bits_per_index, index_at};
use crate::chunk::{int_like, position_of, BlockState, AIR};
use crate::{Error, Result};

/// A palette chunk: per-section block state tables referenced by densely
/// packed indices. Covers the 1.13–1.17 `Level.Sections` layout and the
/// 1.18+ `sections` layout.
#[derive(Debug)]
pub struct ModernChunk {
    data_version: i32,
    position: Option<(i32, i32)>,
    sections: Vec<PaletteSection>,
}

/// A 16x16x16 cube of a palette chunk. `states` is `None` for sections the
/// game stored without block data, which are all air.
#[derive(Debug)]
pub(crate) struct PaletteSection {
    pub(crate) y: isize,
    pub(crate) palette: Vec<BlockState>,
    pub(crate) states: Option<Vec<i64>>,
}

impl ModernChunk {
    pub(crate) fn from_tree(root: &Compound, data_version: i32) -> Result<ModernChunk> {
        let (section_list, flattened) = if let Some(sections) = root.get("sections") {
            (Some(sections.as_list()?), true)
        } else {
            let level = root
                .get("Level")
                .and_then(|v| v.as_compound().ok())
                .ok_or_else(|| Error::InvalidChunk("palette chunk without Level".to_owned()))?;
            match level.get("Sections") {
                Some(sections) => (Some(sections.as_list()?), false),
                None => (None, false),
            }
        };

        let mut sections = Vec::new();
        for section in section_list.into_iter().flatten() {
            if let Some(section) = parse_section(section.as_compound()?, flattened)? {
                sections.push(section);
            }
        }
        sections.sort_by_key(|section| section.y);

        Ok(ModernChunk {
            data_version,
            position: position_of(root),
            sections,
        })
    }

    pub fn data_version(&self) -> i32 {
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

        let states = match &section.states {
            None => return Some(AIR.clone()),
            Some(states) => states,
        };

        let sec_y = y.rem_euclid(16) as usize;
        let index = sec_y * 256 + z * 16 + x;
        let bits = bits_per_index(section.palette.len());
        let palette_index = index_at(states, bits, index, self.data_version)?;
        section.palette.get(palette_index as usize).cloned()
    }

    pub(crate) fn sections(&self) -> &[PaletteSection] {
        &self.sections
    }

    pub(crate) fn section_ys(&self) -> Vec<isize> {
        self.sections.iter().map(|section| section.y).collect()
    }
}

/// One section from either layout. `None` for pre-1.18 terminator
/// sections, which carry no palette and no states.
fn parse_section(section: &Compound, flattened: bool) -> Result<Option<PaletteSection>> {
    let y = section
        .get("Y")
        .and_then(int_like)
        .ok_or_else(|| Error::InvalidChunk("section without Y".to_owned()))? as isize;

    if flattened {
        // 1.18+: palette and data nested under block_states; a section
        // without them was stored all air
        let (palette, states) = match section.get("block_states") {
            Some(block_states) => {
                let block_states = block_states.as_compound()?;
                let states = match block_states.get("data") {
                    Some(data) => Some(data.as_long_array()?.to_vec()),
                    None => None,
                };
                (parse_palette(block_states.get("palette"))?, states)
            }
            None => (Vec::new(), None),
        };
        return Ok(Some(PaletteSection { y, palette, states }));
    }

    // pre-1.18: Palette and BlockStates directly on the section
    let palette = parse_palette(section.get("Palette"))?;
    let states = match section.get("BlockStates") {
        Some(data) => Some(data.as_long_array()?.to_vec()),
        None => None,
    };

    if palette.is_empty() && states.is_none() {
        // the all-air terminator section
        return Ok(None);
    }

    Ok(Some(PaletteSection { y, palette, states }))
}

fn parse_palette(palette: Option<&Value>) -> Result<Vec<BlockState>> {
    let palette = match palette {
        Some(palette) => palette.as_list()?,
        None => return Ok(Vec::new()),
    };

    let mut out = Vec::with_capacity(palette.len());
    for entry in palette {
        let entry = entry.as_compound()?;
        let name = entry
            .get("Name")
            .ok_or_else(|| Error::InvalidChunk("palette entry without Name".to_owned()))?
            .as_str()?
            .to_owned();

        let mut properties = IndexMap::new();
        if let Some(props) = entry.get("Properties") {
            for (key, value) in props.as_compound()?.iter() {
                properties.insert(key.to_owned(), value.as_str()?.to_owned());
            }
        }

        out.push(BlockState::with_properties(name, properties));
    }
    Ok(out)
}
