
use std::io::Write;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};

use flate2::write::{GzEncoder, ZlibEncoder};
use oxnbt::{Tag, TagWriter};

use crate::SECTOR_SIZE;

/// A throwaway directory under the OS temp dir, unique per call.
pub(crate) fn temp_dir(name: &str) -> PathBuf {
    static COUNTER: AtomicUsize = AtomicUsize::new(0);
    let dir = std::env::temp_dir().join(format!(
        "oxanvil-test-{name}-{}-{}",
        std::process::id(),
        COUNTER.fetch_add(1, Ordering::SeqCst)
    ));
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

pub(crate) fn zlib(data: &[u8]) -> Vec<u8> {
    let mut enc = ZlibEncoder::new(Vec::new(), flate2::Compression::default());
    enc.write_all(data).unwrap();
    enc.finish().unwrap()
}

pub(crate) fn gzip(data: &[u8]) -> Vec<u8> {
    let mut enc = GzEncoder::new(Vec::new(), flate2::Compression::default());
    enc.write_all(data).unwrap();
    enc.finish().unwrap()
}

/// A tiny NBT document to use as a chunk payload where the content does
/// not matter.
pub(crate) fn simple_nbt(id: &str) -> Vec<u8> {
    let mut out = Vec::new();
    let mut writer = TagWriter::new(&mut out);
    writer.start("chunk").unwrap();
    writer.string(Some("id"), id).unwrap();
    writer.end_compound().unwrap();
    writer.end().unwrap();
    out
}

/// A chunk to place into a synthetic region file. `payload` must already
/// be compressed to match `scheme`.
pub(crate) struct RegionEntry {
    pub x: usize,
    pub z: usize,
    pub timestamp: u32,
    pub scheme: u8,
    pub payload: Vec<u8>,
}

/// Assemble a region file, allocating sectors sequentially from sector 2.
pub(crate) fn region_bytes(entries: &[RegionEntry]) -> Vec<u8> {
    let mut out = vec![0u8; 2 * SECTOR_SIZE];
    let mut next_sector = 2usize;

    for entry in entries {
        let index = 4 * (entry.x + entry.z * 32);
        let body_len = entry.payload.len() + 5;
        let sectors = body_len.div_ceil(SECTOR_SIZE);

        out[index] = ((next_sector >> 16) & 0xff) as u8;
        out[index + 1] = ((next_sector >> 8) & 0xff) as u8;
        out[index + 2] = (next_sector & 0xff) as u8;
        out[index + 3] = sectors as u8;
        out[SECTOR_SIZE + index..SECTOR_SIZE + index + 4]
            .copy_from_slice(&entry.timestamp.to_be_bytes());

        let begin = next_sector * SECTOR_SIZE;
        out.resize(begin + sectors * SECTOR_SIZE, 0);
        out[begin..begin + 4].copy_from_slice(&((entry.payload.len() as u32 + 1).to_be_bytes()));
        out[begin + 4] = entry.scheme;
        out[begin + 5..begin + 5 + entry.payload.len()].copy_from_slice(&entry.payload);

        next_sector += sectors;
    }

    out
}

/// Pack values in the padded 1.16+ layout: whole indices per word, high
/// bits unused.
pub(crate) fn pack_padded(values: &[u16], bits: usize) -> Vec<i64> {
    let per_word = 64 / bits;
    let mut words = vec![0u64; values.len().div_ceil(per_word)];
    for (i, v) in values.iter().enumerate() {
        words[i / per_word] |= (*v as u64) << ((i % per_word) * bits);
    }
    words.iter().map(|w| *w as i64).collect()
}

/// Pack values back to back in the pre-1.16 layout, straddling word
/// boundaries.
pub(crate) fn pack_straddling(values: &[u16], bits: usize) -> Vec<i64> {
    let mut words = vec![0u64; (values.len() * bits).div_ceil(64)];
    for (i, v) in values.iter().enumerate() {
        let begin = i * bits;
        let (word, bit) = (begin / 64, begin % 64);
        words[word] |= (*v as u64) << bit;
        if bit + bits > 64 {
            words[word + 1] |= (*v as u64) >> (64 - bit);
        }
    }
    words.iter().map(|w| *w as i64).collect()
}

/// Shape of one palette section for the chunk fixtures below.
pub(crate) struct SectionSpec {
    pub y: i8,
    pub palette: Vec<&'static str>,
    pub data: Option<Vec<i64>>,
}

/// A 1.18+ chunk: sections at the root, palette and data nested under
/// `block_states`.
pub(crate) fn modern_chunk_nbt(data_version: i32, sections: &[SectionSpec]) -> Vec<u8> {
    let mut out = Vec::new();
    let mut w = TagWriter::new(&mut out);
    w.start("").unwrap();
    w.int(Some("DataVersion"), data_version).unwrap();
    w.int(Some("xPos"), 0).unwrap();
    w.int(Some("zPos"), 0).unwrap();
    w.start_list(Some("sections"), Tag::Compound, sections.len() as i32)
        .unwrap();
    for section in sections {
        w.start_compound(None).unwrap();
        w.byte(Some("Y"), section.y).unwrap();
        if !section.palette.is_empty() || section.data.is_some() {
            w.start_compound(Some("block_states")).unwrap();
            w.start_list(Some("palette"), Tag::Compound, section.palette.len() as i32)
                .unwrap();
            for name in &section.palette {
                w.start_compound(None).unwrap();
                w.string(Some("Name"), name).unwrap();
                w.end_compound().unwrap();
            }
            w.end_list().unwrap();
            if let Some(data) = &section.data {
                w.long_array(Some("data"), data).unwrap();
            }
            w.end_compound().unwrap();
        }
        w.end_compound().unwrap();
    }
    w.end_list().unwrap();
    w.end_compound().unwrap();
    w.end().unwrap();
    out
}

/// A 1.13–1.17 chunk: `Level.Sections` with `Palette` and `BlockStates`
/// directly on each section.
pub(crate) fn pre18_chunk_nbt(data_version: i32, sections: &[SectionSpec]) -> Vec<u8> {
    let mut out = Vec::new();
    let mut w = TagWriter::new(&mut out);
    w.start("").unwrap();
    w.int(Some("DataVersion"), data_version).unwrap();
    w.start_compound(Some("Level")).unwrap();
    w.int(Some("xPos"), 0).unwrap();
    w.int(Some("zPos"), 0).unwrap();
    w.start_list(Some("Sections"), Tag::Compound, sections.len() as i32)
        .unwrap();
    for section in sections {
        w.start_compound(None).unwrap();
        w.byte(Some("Y"), section.y).unwrap();
        w.start_list(Some("Palette"), Tag::Compound, section.palette.len() as i32)
            .unwrap();
        for name in &section.palette {
            w.start_compound(None).unwrap();
            w.string(Some("Name"), name).unwrap();
            w.end_compound().unwrap();
        }
        w.end_list().unwrap();
        if let Some(data) = &section.data {
            w.long_array(Some("BlockStates"), data).unwrap();
        }
        w.end_compound().unwrap();
    }
    w.end_list().unwrap();
    w.end_compound().unwrap();
    w.end_compound().unwrap();
    w.end().unwrap();
    out
}

/// Shape of one legacy section: block ids plus optional Add/Data nibbles.
pub(crate) struct LegacySectionSpec {
    pub y: i8,
    pub blocks: Vec<i8>,
    pub add: Option<Vec<i8>>,
    pub data: Option<Vec<i8>>,
}

/// A pre-palette chunk with numeric block ids.
pub(crate) fn legacy_chunk_nbt(sections: &[LegacySectionSpec]) -> Vec<u8> {
    let mut out = Vec::new();
    let mut w = TagWriter::new(&mut out);
    w.start("").unwrap();
    w.start_compound(Some("Level")).unwrap();
    w.int(Some("xPos"), 0).unwrap();
    w.int(Some("zPos"), 0).unwrap();
    w.start_list(Some("Sections"), Tag::Compound, sections.len() as i32)
        .unwrap();
    for section in sections {
        w.start_compound(None).unwrap();
        w.byte(Some("Y"), section.y).unwrap();
        w.byte_array(Some("Blocks"), &section.blocks).unwrap();
        if let Some(add) = &section.add {
            w.byte_array(Some("Add"), add).unwrap();
        }
        if let Some(data) = &section.data {
            w.byte_array(Some("Data"), data).unwrap();
        }
        w.end_compound().unwrap();
    }
    w.end_list().unwrap();
    w.end_compound().unwrap();
    w.end_compound().unwrap();
    w.end().unwrap();
    out
}
