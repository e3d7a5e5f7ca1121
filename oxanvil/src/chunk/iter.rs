use crate::bits::{bits_per_index, unpack_indices};
use crate::chunk::{is_air, Chunk, AIR};
use crate::{CCoord, Error, Result};

/// A decoded block at world-absolute coordinates.
#[derive(Debug, Clone, PartialEq)]
pub struct WorldBlock {
    pub x: isize,
    pub y: isize,
    pub z: isize,
    pub name: String,
}

const BLOCKS_PER_SECTION: usize = 4096;

/// Iterates a chunk's blocks in ascending section order, then y, then z,
/// then x within each section.
///
/// Sections stored without block states are all air and are skipped unless
/// air was requested. A section whose packed data is broken yields one
/// error and iteration continues with the next section.
pub struct ChunkBlocks {
    chunk: Chunk,
    base_x: isize,
    base_z: isize,
    include_air: bool,
    section: usize,
    cursor: usize,
    /// Unpacked palette indices for the current modern section; `None`
    /// while in a legacy or all-air section.
    indices: Option<Vec<u16>>,
    prepared: bool,
}

impl ChunkBlocks {
    pub(crate) fn new(chunk: Chunk, cx: CCoord, cz: CCoord, include_air: bool) -> Self {
        Self {
            chunk,
            base_x: cx.0 * 16,
            base_z: cz.0 * 16,
            include_air,
            section: 0,
            cursor: 0,
            indices: None,
            prepared: false,
        }
    }

    fn advance_section(&mut self) {
        self.section += 1;
        self.cursor = 0;
        self.indices = None;
        self.prepared = false;
    }

    /// Unpack and validate the current section's indices. For an all-air
    /// section with air excluded this fast-forwards the cursor instead.
    fn prepare(&mut self) -> Result<()> {
        self.indices = None;

        let chunk = match &self.chunk {
            Chunk::Modern(chunk) => chunk,
            Chunk::Legacy(_) => return Ok(()),
        };
        let section = &chunk.sections()[self.section];

        let states = match &section.states {
            Some(states) => states,
            None => {
                if !self.include_air {
                    self.cursor = BLOCKS_PER_SECTION;
                }
                return Ok(());
            }
        };

        let bits = bits_per_index(section.palette.len());
        let indices = unpack_indices(states, section.palette.len(), BLOCKS_PER_SECTION, chunk.data_version());

        if indices.len() < BLOCKS_PER_SECTION {
            return Err(Error::InvalidChunk(format!(
                "section y = {} holds {} packed indices, expected {}",
                section.y,
                indices.len(),
                BLOCKS_PER_SECTION
            )));
        }
        if let Some(bad) = indices.iter().find(|&&i| i as usize >= section.palette.len()) {
            return Err(Error::InvalidChunk(format!(
                "section y = {} has palette index {} outside its {}-entry palette ({bits} bits)",
                section.y,
                bad,
                section.palette.len()
            )));
        }

        self.indices = Some(indices);
        Ok(())
    }
}

impl Iterator for ChunkBlocks {
    type Item = Result<WorldBlock>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if self.section >= self.chunk.section_count() {
                return None;
            }

            if !self.prepared {
                self.prepared = true;
                if let Err(e) = self.prepare() {
                    self.advance_section();
                    return Some(Err(e));
                }
            }

            if self.cursor >= BLOCKS_PER_SECTION {
                self.advance_section();
                continue;
            }

            let index = self.cursor;
            self.cursor += 1;

            // i = y*256 + z*16 + x
            let x = (index & 0xf) as isize;
            let z = ((index >> 4) & 0xf) as isize;
            let y = (index >> 8) as isize;

            let (section_y, name) = match &self.chunk {
                Chunk::Modern(chunk) => {
                    let section = &chunk.sections()[self.section];
                    let name = match &self.indices {
                        Some(indices) => {
                            let state = &section.palette[indices[index] as usize];
                            if !self.include_air && is_air(state.name()) {
                                continue;
                            }
                            state.name().to_owned()
                        }
                        // only reachable with include_air set
                        None => AIR.name().to_owned(),
                    };
                    (section.y, name)
                }
                Chunk::Legacy(chunk) => {
                    let section = &chunk.sections()[self.section];
                    let id = section.id_at(index);
                    if id == 0 && !self.include_air {
                        continue;
                    }
                    (section.y, id.to_string())
                }
            };

            return Some(Ok(WorldBlock {
                x: self.base_x + x,
                y: section_y * 16 + y,
                z: self.base_z + z,
                name,
            }));
        }
    }
}
