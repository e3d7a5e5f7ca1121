//! Bit manipulation for the densely packed arrays of the Anvil format.

use bit_field::BitField;

/// Chunks with this `DataVersion` or newer (20w17a) pack palette indices so
/// that none straddles a 64-bit word; older chunks pack with straddling.
/// Fixed by the game, never inferred from the data.
pub const NO_STRADDLE_DATA_VERSION: i32 = 2529;

/// Number of bits used per palette index for a palette of the given size,
/// `max(4, ceil(log2(len)))`.
pub fn bits_per_index(palette_len: usize) -> usize {
    if palette_len < 2 {
        return 4;
    }
    std::cmp::max((palette_len as f64).log2().ceil() as usize, 4)
}

/// Expand packed palette indices to one `u16` per entry, selecting the
/// packing variant from the chunk's `DataVersion`.
///
/// The output may be shorter than `count` if `data` does not hold that many
/// indices; callers treat that as a broken chunk.
pub fn unpack_indices(data: &[i64], palette_len: usize, count: usize, data_version: i32) -> Vec<u16> {
    let bits = bits_per_index(palette_len);
    if data_version >= NO_STRADDLE_DATA_VERSION {
        unpack_padded(data, bits, count)
    } else {
        unpack_straddling(data, bits, count)
    }
}

/// The 1.16+ layout: each 64-bit word holds `64 / bits` whole indices and
/// the leftover high bits are padding.
pub fn unpack_padded(data: &[i64], bits: usize, count: usize) -> Vec<u16> {
    let per_word = 64 / bits;
    let mut out = Vec::with_capacity(count);

    'words: for datum in data {
        let datum = *datum as u64;
        for i in 0..per_word {
            if out.len() == count {
                break 'words;
            }
            out.push(datum.get_bits(i * bits..(i + 1) * bits) as u16);
        }
    }

    out
}

/// The pre-1.16 layout: indices are packed back to back and may straddle a
/// word boundary.
pub fn unpack_straddling(data: &[i64], bits: usize, count: usize) -> Vec<u16> {
    let available = data.len() * 64;
    let mut out = Vec::with_capacity(count);

    for i in 0..count {
        let begin = i * bits;
        if begin + bits > available {
            break;
        }
        out.push(extract(data, begin, bits));
    }

    out
}

/// One packed index without expanding the whole array.
pub fn index_at(data: &[i64], bits: usize, index: usize, data_version: i32) -> Option<u16> {
    if data_version >= NO_STRADDLE_DATA_VERSION {
        let per_word = 64 / bits;
        let word = *data.get(index / per_word)? as u64;
        let bit = (index % per_word) * bits;
        Some(word.get_bits(bit..bit + bits) as u16)
    } else {
        let begin = index * bits;
        if begin + bits > data.len() * 64 {
            return None;
        }
        Some(extract(data, begin, bits))
    }
}

/// Bits `begin..begin + bits` of the array, LSB-first within each word,
/// possibly spanning two words.
fn extract(data: &[i64], begin: usize, bits: usize) -> u16 {
    let word = begin / 64;
    let bit = begin % 64;

    if bit + bits <= 64 {
        (data[word] as u64).get_bits(bit..bit + bits) as u16
    } else {
        let low_width = 64 - bit;
        let low = (data[word] as u64).get_bits(bit..64);
        let high = (data[word + 1] as u64).get_bits(0..bits - low_width);
        (low | high << low_width) as u16
    }
}

/// The 4-bit nibble arrays of legacy chunks: low nibble for even indices,
/// high nibble for odd.
pub fn nibble(data: &[i8], index: usize) -> u8 {
    let byte = data[index / 2] as u8;
    if index % 2 == 0 {
        byte & 0x0f
    } else {
        (byte >> 4) & 0x0f
    }
}
