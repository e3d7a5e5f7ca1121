//! Producer-driven NBT emission with structural validation.

use std::io::Write;

use byteorder::{BigEndian, WriteBytesExt};

use crate::bytes::WriteNbt;
use crate::error::{Error, Result};
use crate::Tag;

/// An open container on the writer's stack.
enum Frame {
    Compound,
    List { element: Tag, remaining: i32 },
}

/// Emits an NBT document as events are pushed, mirroring the parser's event
/// set. Every event is validated against the current container before any
/// of its bytes go out, and bytes are written as soon as they are fully
/// determined; nothing is buffered.
///
/// The expected call sequence is `start`, the document's contents, an
/// `end_compound` closing the root, then `end`. Violations fail with a
/// `Structural` error describing the state that rejected the event.
pub struct TagWriter<W> {
    out: W,
    stack: Vec<Frame>,
    started: bool,
    finished: bool,
}

impl<W: Write> TagWriter<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            stack: Vec::new(),
            started: false,
            finished: false,
        }
    }

    /// Consumes the writer, returning the underlying sink.
    pub fn into_inner(self) -> W {
        self.out
    }

    /// Open the document: a compound root named `root_name`.
    pub fn start(&mut self, root_name: &str) -> Result<()> {
        if self.started {
            return Err(Error::structural("document already started"));
        }
        self.started = true;
        self.out.write_kind(Tag::Compound)?;
        self.out.write_size_prefixed_str(root_name)?;
        self.stack.push(Frame::Compound);
        Ok(())
    }

    /// Close the document. All containers, including the root compound,
    /// must already be closed.
    pub fn end(&mut self) -> Result<()> {
        if !self.started {
            return Err(Error::structural("document never started"));
        }
        if !self.stack.is_empty() {
            return Err(Error::structural(format!(
                "document ended with {} open container(s)",
                self.stack.len()
            )));
        }
        self.finished = true;
        Ok(())
    }

    pub fn byte(&mut self, name: Option<&str>, value: i8) -> Result<()> {
        self.header(Tag::Byte, name)?;
        self.out.write_i8(value)?;
        Ok(())
    }

    pub fn short(&mut self, name: Option<&str>, value: i16) -> Result<()> {
        self.header(Tag::Short, name)?;
        self.out.write_i16::<BigEndian>(value)?;
        Ok(())
    }

    pub fn int(&mut self, name: Option<&str>, value: i32) -> Result<()> {
        self.header(Tag::Int, name)?;
        self.out.write_i32::<BigEndian>(value)?;
        Ok(())
    }

    pub fn long(&mut self, name: Option<&str>, value: i64) -> Result<()> {
        self.header(Tag::Long, name)?;
        self.out.write_i64::<BigEndian>(value)?;
        Ok(())
    }

    pub fn float(&mut self, name: Option<&str>, value: f32) -> Result<()> {
        self.header(Tag::Float, name)?;
        self.out.write_f32::<BigEndian>(value)?;
        Ok(())
    }

    pub fn double(&mut self, name: Option<&str>, value: f64) -> Result<()> {
        self.header(Tag::Double, name)?;
        self.out.write_f64::<BigEndian>(value)?;
        Ok(())
    }

    pub fn string(&mut self, name: Option<&str>, value: &str) -> Result<()> {
        self.header(Tag::String, name)?;
        self.out.write_size_prefixed_str(value)?;
        Ok(())
    }

    pub fn byte_array(&mut self, name: Option<&str>, data: &[i8]) -> Result<()> {
        self.header(Tag::ByteArray, name)?;
        self.out.write_len(data.len())?;
        let raw: Vec<u8> = data.iter().map(|&b| b as u8).collect();
        self.out.write_all(&raw)?;
        Ok(())
    }

    pub fn int_array(&mut self, name: Option<&str>, data: &[i32]) -> Result<()> {
        self.header(Tag::IntArray, name)?;
        self.out.write_len(data.len())?;
        for v in data {
            self.out.write_i32::<BigEndian>(*v)?;
        }
        Ok(())
    }

    pub fn long_array(&mut self, name: Option<&str>, data: &[i64]) -> Result<()> {
        self.header(Tag::LongArray, name)?;
        self.out.write_len(data.len())?;
        for v in data {
            self.out.write_i64::<BigEndian>(*v)?;
        }
        Ok(())
    }

    pub fn start_compound(&mut self, name: Option<&str>) -> Result<()> {
        self.header(Tag::Compound, name)?;
        self.stack.push(Frame::Compound);
        Ok(())
    }

    /// Close the innermost compound, emitting its END terminator.
    pub fn end_compound(&mut self) -> Result<()> {
        match self.stack.last() {
            Some(Frame::Compound) => {
                self.stack.pop();
                self.out.write_kind(Tag::End)?;
                Ok(())
            }
            Some(Frame::List { .. }) => {
                Err(Error::structural("end_compound while a list is open"))
            }
            None => Err(Error::structural("end_compound with no open compound")),
        }
    }

    /// Open a list of `len` elements of kind `element`. An empty list may
    /// declare `Tag::End`; a non-empty one may not.
    pub fn start_list(&mut self, name: Option<&str>, element: Tag, len: i32) -> Result<()> {
        if len < 0 {
            return Err(Error::negative_length(len));
        }
        if element == Tag::End && len > 0 {
            return Err(Error::structural("non-empty list cannot have element kind END"));
        }
        self.header(Tag::List, name)?;
        self.out.write_kind(element)?;
        self.out.write_i32::<BigEndian>(len)?;
        self.stack.push(Frame::List {
            element,
            remaining: len,
        });
        Ok(())
    }

    /// Close the innermost list. All declared elements must have been
    /// written.
    pub fn end_list(&mut self) -> Result<()> {
        match self.stack.last() {
            Some(Frame::List { remaining: 0, .. }) => {
                self.stack.pop();
                Ok(())
            }
            Some(Frame::List { remaining, .. }) => Err(Error::structural(format!(
                "list still expects {remaining} element(s)"
            ))),
            Some(Frame::Compound) => Err(Error::structural("end_list while a compound is open")),
            None => Err(Error::structural("end_list with no open list")),
        }
    }

    /// Validate and emit the per-value header. At compound scope that is
    /// the kind byte and the name; at list scope nothing is emitted but the
    /// element kind and remaining count are checked.
    fn header(&mut self, kind: Tag, name: Option<&str>) -> Result<()> {
        if !self.started {
            return Err(Error::structural("document never started"));
        }
        if self.finished {
            return Err(Error::structural("document already ended"));
        }
        match self.stack.last_mut() {
            None => Err(Error::structural("no open container")),
            Some(Frame::Compound) => {
                let name =
                    name.ok_or_else(|| Error::structural("tags in a compound must be named"))?;
                self.out.write_kind(kind)?;
                self.out.write_size_prefixed_str(name)?;
                Ok(())
            }
            Some(Frame::List { element, remaining }) => {
                if name.is_some() {
                    return Err(Error::structural("list elements are unnamed"));
                }
                if *element != kind {
                    return Err(Error::structural(format!(
                        "list of {element:?} cannot accept {kind:?}"
                    )));
                }
                if *remaining == 0 {
                    return Err(Error::structural(
                        "list already holds all its declared elements",
                    ));
                }
                *remaining -= 1;
                Ok(())
            }
        }
    }
}
