//! A codec for Minecraft's NBT format.
//!
//! NBT can be processed in two styles that share one parser. The `stream`
//! module walks a byte source and pushes events into a [`stream::Handler`],
//! which lets you process large documents without holding them in memory, or
//! pick out a few values without caring about the rest of the structure.
//!
//! If you want the whole document, [`Document`] materializes the tree for
//! you, with ordered compounds, kind-checked lists and typed accessors. The
//! tree is built by registering a handler into the same streaming parser.
//!
//! Writing mirrors reading: [`TagWriter`] accepts the same events the parser
//! produces and validates structural well-formedness as tags are pushed,
//! while [`Document`] serializes a whole tree through it.
//!
//! Compressed files (gzip or zlib, as Minecraft writes them) are detected
//! from their magic bytes and handled transparently by the document layer.

use num_enum::TryFromPrimitive;

mod bytes;
mod document;
mod value;
mod writer;

pub mod error;
pub mod stream;

pub use bytes::Compression;
pub use document::Document;
pub use value::{Compound, List, Value};
pub use writer::TagWriter;

/// The NBT tag kind. This does not carry the value or the name.
#[derive(Debug, TryFromPrimitive, PartialEq, Eq, Clone, Copy, Hash)]
#[repr(u8)]
pub enum Tag {
    End = 0,
    Byte = 1,
    Short = 2,
    Int = 3,
    Long = 4,
    Float = 5,
    Double = 6,
    ByteArray = 7,
    String = 8,
    List = 9,
    Compound = 10,
    IntArray = 11,
    LongArray = 12,
}

impl Tag {
    /// True for the kinds that contain other tags.
    pub fn is_container(self) -> bool {
        matches!(self, Tag::List | Tag::Compound)
    }

    /// True for the primitive array kinds.
    pub fn is_array(self) -> bool {
        matches!(self, Tag::ByteArray | Tag::IntArray | Tag::LongArray)
    }
}

#[cfg(test)]
mod test;
