//! Event-driven parsing of NBT data without prior knowledge of the
//! structure.
//!
//! [`Parser`] walks one named-compound document top-down and pushes every
//! tag it encounters into a [`Handler`]. Handlers decide how parsing
//! proceeds by returning a [`Control`] token from each callback: keep
//! going, skip the remainder of the enclosing container, or abort the walk
//! entirely. The parser keeps the stream aligned in all three cases.
//!
//! # Examples
//!
//! Counting every string in a document:
//!
//! ```
//! use oxnbt::stream::{Control, Handler, Parser};
//!
//! struct Strings(usize);
//!
//! impl Handler for Strings {
//!     fn string(&mut self, _name: Option<&str>, _value: &str) -> Control {
//!         self.0 += 1;
//!         Control::Continue
//!     }
//! }
//!
//! # fn count(data: &[u8]) -> oxnbt::error::Result<usize> {
//! let mut handler = Strings(0);
//! Parser::new(data).parse(&mut handler)?;
//! # Ok(handler.0)
//! # }
//! ```

use std::io::Read;

use log::warn;

use crate::bytes::TagReader;
use crate::error::{Error, ErrorKind, Result};
use crate::Tag;

/// Flow-control token returned by [`Handler`] callbacks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Control {
    /// Keep parsing.
    Continue,

    /// Consume the remainder of the current container off the wire without
    /// emitting events for it. The container's closing event is still
    /// emitted, so `start`/`end` pairs stay balanced.
    Skip,

    /// Stop parsing. The parser unwinds and returns [`Outcome::Aborted`].
    Abort,
}

/// How a parse finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The whole document was consumed.
    Finished,
    /// The handler returned [`Control::Abort`].
    Aborted,
}

/// Receives parse events. Every callback has a default no-op implementation
/// returning [`Control::Continue`], so a handler implements only what it
/// cares about.
///
/// `name` is present only for tags appearing at compound scope; list
/// elements are unnamed on the wire and in these callbacks.
pub trait Handler {
    /// The document root was read; `root_name` is the root compound's name.
    fn start(&mut self, _root_name: &str) -> Control {
        Control::Continue
    }

    /// The document is complete. Always the final event.
    fn end(&mut self) {}

    fn byte(&mut self, _name: Option<&str>, _value: i8) -> Control {
        Control::Continue
    }

    fn short(&mut self, _name: Option<&str>, _value: i16) -> Control {
        Control::Continue
    }

    fn int(&mut self, _name: Option<&str>, _value: i32) -> Control {
        Control::Continue
    }

    fn long(&mut self, _name: Option<&str>, _value: i64) -> Control {
        Control::Continue
    }

    fn float(&mut self, _name: Option<&str>, _value: f32) -> Control {
        Control::Continue
    }

    fn double(&mut self, _name: Option<&str>, _value: f64) -> Control {
        Control::Continue
    }

    fn string(&mut self, _name: Option<&str>, _value: &str) -> Control {
        Control::Continue
    }

    fn byte_array(&mut self, _name: Option<&str>, _data: &[i8]) -> Control {
        Control::Continue
    }

    fn int_array(&mut self, _name: Option<&str>, _data: &[i32]) -> Control {
        Control::Continue
    }

    fn long_array(&mut self, _name: Option<&str>, _data: &[i64]) -> Control {
        Control::Continue
    }

    fn start_compound(&mut self, _name: Option<&str>) -> Control {
        Control::Continue
    }

    fn end_compound(&mut self) -> Control {
        Control::Continue
    }

    fn start_list(&mut self, _name: Option<&str>, _element: Tag, _len: i32) -> Control {
        Control::Continue
    }

    fn end_list(&mut self) -> Control {
        Control::Continue
    }
}

/// What a subtree told its enclosing container to do next.
enum Flow {
    Continue,
    /// Skip the rest of the parent container.
    SkipParent,
    Abort,
}

/// Parser can take any reader and parse it as NBT data. Does not do
/// decompression.
pub struct Parser<R> {
    reader: TagReader<R>,
}

impl<R: Read> Parser<R> {
    /// Create a new parser for the given reader.
    pub fn new(reader: R) -> Self {
        Self {
            reader: TagReader::new(reader),
        }
    }

    /// Byte offset of the next unread byte.
    pub fn offset(&self) -> u64 {
        self.reader.offset()
    }

    /// Gets a reference to the underlying reader.
    pub fn get_ref(&self) -> &R {
        self.reader.get_ref()
    }

    /// Gets a mutable reference to the underlying reader.
    pub fn get_mut(&mut self) -> &mut R {
        self.reader.get_mut()
    }

    /// Consumes the parser, returning the underlying reader.
    pub fn into_inner(self) -> R {
        self.reader.into_inner()
    }

    /// Parse exactly one named-compound document, driving `handler`.
    ///
    /// Fails with `InvalidRoot` if the input is empty or the root is not a
    /// compound.
    pub fn parse<H: Handler>(&mut self, handler: &mut H) -> Result<Outcome> {
        let kind = match self.read_kind() {
            Ok(kind) => kind,
            Err(e) if e.kind() == ErrorKind::UnexpectedEnd => {
                return Err(Error::invalid_root("empty input").at(0));
            }
            Err(e) => return Err(e),
        };

        if kind != Tag::Compound {
            return Err(Error::invalid_root(format!("root must be a compound, found {kind:?}")).at(0));
        }

        let name = self.reader.read_string()?;

        match handler.start(&name) {
            Control::Continue => {}
            Control::Skip => {
                self.consume_compound()?;
                if let Flow::Abort = close(handler.end_compound()) {
                    return Ok(Outcome::Aborted);
                }
                handler.end();
                return Ok(Outcome::Finished);
            }
            Control::Abort => return Ok(Outcome::Aborted),
        }

        match self.compound_body(handler)? {
            Flow::Abort => Ok(Outcome::Aborted),
            _ => {
                handler.end();
                Ok(Outcome::Finished)
            }
        }
    }

    /// Named tags until the terminating END, with the `end_compound` event.
    fn compound_body<H: Handler>(&mut self, handler: &mut H) -> Result<Flow> {
        loop {
            let kind = self.read_kind()?;
            if kind == Tag::End {
                return Ok(close(handler.end_compound()));
            }
            let name = self.reader.read_string()?;

            match self.payload(kind, Some(&name), handler)? {
                Flow::Continue => {}
                Flow::SkipParent => {
                    self.consume_compound()?;
                    return Ok(close(handler.end_compound()));
                }
                Flow::Abort => return Ok(Flow::Abort),
            }
        }
    }

    /// `len` unnamed payloads of `element`, with the `end_list` event.
    fn list_body<H: Handler>(&mut self, element: Tag, len: i32, handler: &mut H) -> Result<Flow> {
        let mut remaining = len;
        while remaining > 0 {
            remaining -= 1;
            match self.payload(element, None, handler)? {
                Flow::Continue => {}
                Flow::SkipParent => {
                    for _ in 0..remaining {
                        self.consume_payload(element)?;
                    }
                    break;
                }
                Flow::Abort => return Ok(Flow::Abort),
            }
        }
        Ok(close(handler.end_list()))
    }

    /// One payload of the given kind, emitting its event(s).
    fn payload<H: Handler>(&mut self, kind: Tag, name: Option<&str>, handler: &mut H) -> Result<Flow> {
        let control = match kind {
            Tag::End => {
                // Only reachable via a list declaring END elements, which
                // the list header already rewrote to an empty list.
                return Err(Error::invalid_kind(0).at(self.reader.offset()));
            }
            Tag::Byte => {
                let v = self.reader.read_i8()?;
                handler.byte(name, v)
            }
            Tag::Short => {
                let v = self.reader.read_i16()?;
                handler.short(name, v)
            }
            Tag::Int => {
                let v = self.reader.read_i32()?;
                handler.int(name, v)
            }
            Tag::Long => {
                let v = self.reader.read_i64()?;
                handler.long(name, v)
            }
            Tag::Float => {
                let v = self.reader.read_f32()?;
                handler.float(name, v)
            }
            Tag::Double => {
                let v = self.reader.read_f64()?;
                handler.double(name, v)
            }
            Tag::String => {
                let v = self.reader.read_string()?;
                handler.string(name, &v)
            }
            Tag::ByteArray => {
                let len = self.array_len()?;
                let raw = self.reader.read_bytes(len)?;
                let data: Vec<i8> = raw.iter().map(|&b| b as i8).collect();
                handler.byte_array(name, &data)
            }
            Tag::IntArray => {
                let len = self.array_len()?;
                let mut data = Vec::with_capacity(len.min(MAX_ARRAY_PREALLOC / 4));
                for _ in 0..len {
                    data.push(self.reader.read_i32()?);
                }
                handler.int_array(name, &data)
            }
            Tag::LongArray => {
                let len = self.array_len()?;
                let mut data = Vec::with_capacity(len.min(MAX_ARRAY_PREALLOC / 8));
                for _ in 0..len {
                    data.push(self.reader.read_i64()?);
                }
                handler.long_array(name, &data)
            }
            Tag::List => {
                let (element, len) = self.list_header()?;
                return match handler.start_list(name, element, len) {
                    Control::Continue => self.list_body(element, len, handler),
                    Control::Skip => {
                        for _ in 0..len {
                            self.consume_payload(element)?;
                        }
                        Ok(close(handler.end_list()))
                    }
                    Control::Abort => Ok(Flow::Abort),
                };
            }
            Tag::Compound => {
                return match handler.start_compound(name) {
                    Control::Continue => self.compound_body(handler),
                    Control::Skip => {
                        self.consume_compound()?;
                        Ok(close(handler.end_compound()))
                    }
                    Control::Abort => Ok(Flow::Abort),
                };
            }
        };

        Ok(match control {
            Control::Continue => Flow::Continue,
            Control::Skip => Flow::SkipParent,
            Control::Abort => Flow::Abort,
        })
    }

    fn read_kind(&mut self) -> Result<Tag> {
        let at = self.reader.offset();
        let byte = self.reader.read_u8()?;
        Tag::try_from(byte).map_err(|_| Error::invalid_kind(byte).at(at))
    }

    fn array_len(&mut self) -> Result<usize> {
        let at = self.reader.offset();
        let len = self.reader.read_i32()?;
        if len < 0 {
            return Err(Error::negative_length(len).at(at));
        }
        Ok(len as usize)
    }

    fn list_header(&mut self) -> Result<(Tag, i32)> {
        let element = self.read_kind()?;
        let at = self.reader.offset();
        let len = self.reader.read_i32()?;
        if len < 0 {
            return Err(Error::negative_length(len).at(at));
        }
        if element == Tag::End && len > 0 {
            // Some writers emit this malformation for empty lists. END
            // payloads occupy no bytes, so treating it as empty keeps the
            // stream aligned.
            warn!("list declares {len} elements of kind END at byte {at}; treating as empty");
            return Ok((Tag::End, 0));
        }
        Ok((element, len))
    }

    /// Consume one payload off the wire without emitting events.
    fn consume_payload(&mut self, kind: Tag) -> Result<()> {
        match kind {
            Tag::End => Ok(()),
            Tag::Byte => self.reader.skip(1),
            Tag::Short => self.reader.skip(2),
            Tag::Int | Tag::Float => self.reader.skip(4),
            Tag::Long | Tag::Double => self.reader.skip(8),
            Tag::String => {
                let len = self.reader.read_u16()?;
                self.reader.skip(len as u64)
            }
            Tag::ByteArray => {
                let len = self.array_len()?;
                self.reader.skip(len as u64)
            }
            Tag::IntArray => {
                let len = self.array_len()?;
                self.reader.skip(len as u64 * 4)
            }
            Tag::LongArray => {
                let len = self.array_len()?;
                self.reader.skip(len as u64 * 8)
            }
            Tag::List => {
                let (element, len) = self.list_header()?;
                for _ in 0..len {
                    self.consume_payload(element)?;
                }
                Ok(())
            }
            Tag::Compound => self.consume_compound(),
        }
    }

    /// Consume named tags up to and including the terminating END.
    fn consume_compound(&mut self) -> Result<()> {
        loop {
            let kind = self.read_kind()?;
            if kind == Tag::End {
                return Ok(());
            }
            let name_len = self.reader.read_u16()?;
            self.reader.skip(name_len as u64)?;
            self.consume_payload(kind)?;
        }
    }
}

const MAX_ARRAY_PREALLOC: usize = 64 * 1024;

/// A `Skip` returned from a closing event has nothing left to skip, so only
/// `Abort` is meaningful there.
fn close(control: Control) -> Flow {
    match control {
        Control::Abort => Flow::Abort,
        _ => Flow::Continue,
    }
}
