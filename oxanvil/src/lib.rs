//! For handling Minecraft's region formats and the worlds built out of
//! them.
//!
//! [`Region`] can be given any `Read + Seek` source, eg a file, in order to
//! extract chunk data. [`World`] models a whole save directory, and
//! [`DimensionView::blocks`] iterates every block of a dimension across its
//! region files, decoding both legacy and palette chunk layouts.

mod bits;
mod chunk;
mod dimension;
mod files;
mod region;
mod world;

pub use bits::*;
pub use chunk::*;
pub use dimension::*;
pub use files::*;
pub use region::*;
pub use world::*;

#[cfg(test)]
mod test;

/// Errors from the region, world and block-decoding layers. Chunk
/// coordinates in variants are local to their region (0..32).
#[derive(Debug)]
pub enum Error {
    Io(std::io::Error),
    /// The chunk's NBT failed to parse.
    Nbt(oxnbt::error::Error),
    /// Chunk coordinates outside 0..32.
    InvalidCoords(isize, isize),
    /// The header has no entry for the chunk.
    NoSuchChunk(usize, usize),
    /// The header entry points outside the file.
    CorruptHeader(usize, usize),
    /// The chunk's payload ends before its declared length.
    TruncatedChunk(usize, usize),
    /// The compression scheme byte was not recognised.
    UnknownCompression(u8),
    /// The chunk lives in a `.mcc` sidecar but the region has no backing
    /// path to find it by.
    MissingSidecar(usize, usize),
    /// Two live header entries claim overlapping sectors.
    SectorOverlap {
        first: (usize, usize),
        second: (usize, usize),
    },
    /// A palette chunk whose packing variant cannot be classified.
    UnsupportedDataVersion(i32),
    /// The chunk's NBT parsed but did not match any known schema.
    InvalidChunk(String),
    /// The directory is not a readable world.
    InvalidWorld(String),
}

/// Convenience type for Result.
pub type Result<T> = std::result::Result<T, Error>;

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Error {
        Error::Io(e)
    }
}

impl From<oxnbt::error::Error> for Error {
    fn from(e: oxnbt::error::Error) -> Error {
        Error::Nbt(e)
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::Io(e) => f.write_fmt(format_args!("io error: {e}")),
            Error::Nbt(e) => f.write_fmt(format_args!("nbt error: {e}")),
            Error::InvalidCoords(x, z) => {
                f.write_fmt(format_args!("invalid chunk coords: x = {x}, z = {z}"))
            }
            Error::NoSuchChunk(x, z) => {
                f.write_fmt(format_args!("no chunk at x = {x}, z = {z}"))
            }
            Error::CorruptHeader(x, z) => f.write_fmt(format_args!(
                "header entry for chunk x = {x}, z = {z} points outside the file"
            )),
            Error::TruncatedChunk(x, z) => {
                f.write_fmt(format_args!("chunk x = {x}, z = {z} is truncated"))
            }
            Error::UnknownCompression(scheme) => f.write_fmt(format_args!(
                "compression scheme ({scheme}) was not recognised for chunk"
            )),
            Error::MissingSidecar(x, z) => f.write_fmt(format_args!(
                "chunk x = {x}, z = {z} is in a .mcc sidecar, but the region has no path"
            )),
            Error::SectorOverlap { first, second } => f.write_fmt(format_args!(
                "chunks ({}, {}) and ({}, {}) claim overlapping sectors",
                first.0, first.1, second.0, second.1
            )),
            Error::UnsupportedDataVersion(version) => {
                f.write_fmt(format_args!("unsupported DataVersion: {version}"))
            }
            Error::InvalidChunk(msg) => f.write_fmt(format_args!("invalid chunk: {msg}")),
            Error::InvalidWorld(msg) => f.write_fmt(format_args!("invalid world: {msg}")),
        }
    }
}

impl std::error::Error for Error {}
