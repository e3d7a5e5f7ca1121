//! Whole-document reading and writing.

use std::fs::File;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use crate::bytes::{self, Compression};
use crate::error::{Error, Result};
use crate::stream::{Control, Handler, Outcome, Parser};
use crate::value::{Compound, List, Value};
use crate::writer::TagWriter;
use crate::Tag;

/// A parsed NBT document: exactly one named compound root, plus where it
/// came from and how it was compressed.
///
/// Reading auto-detects gzip/zlib compression and remembers it so the
/// document writes back the way it was found. The root is an ordered
/// [`Compound`], so an unmodified document round-trips byte-for-byte.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    root_name: String,
    root: Compound,
    compression: Compression,
    source: Option<PathBuf>,
}

impl Document {
    /// An empty document with the given root name and no compression.
    pub fn new(root_name: impl Into<String>) -> Self {
        Self {
            root_name: root_name.into(),
            root: Compound::new(),
            compression: Compression::None,
            source: None,
        }
    }

    /// Parse a document, sniffing and undoing gzip/zlib compression first.
    pub fn from_bytes(data: &[u8]) -> Result<Document> {
        let compression = Compression::detect(data);
        let raw;
        let data = match compression {
            Compression::None => data,
            _ => {
                raw = bytes::decompress(data, compression)?;
                &raw
            }
        };

        let (root_name, root) = parse_tree(data)?;
        Ok(Document {
            root_name,
            root,
            compression,
            source: None,
        })
    }

    pub fn from_reader(mut reader: impl Read) -> Result<Document> {
        let mut data = Vec::new();
        reader.read_to_end(&mut data)?;
        Self::from_bytes(&data)
    }

    /// Read and parse a file, remembering it as the document's source.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Document> {
        let path = path.as_ref();
        let mut doc = Self::from_reader(File::open(path)?)?;
        doc.source = Some(path.to_path_buf());
        Ok(doc)
    }

    pub fn root_name(&self) -> &str {
        &self.root_name
    }

    pub fn set_root_name(&mut self, name: impl Into<String>) {
        self.root_name = name.into();
    }

    pub fn root(&self) -> &Compound {
        &self.root
    }

    pub fn root_mut(&mut self) -> &mut Compound {
        &mut self.root
    }

    /// The compression this document was read with and will be written with.
    pub fn compression(&self) -> Compression {
        self.compression
    }

    pub fn set_compression(&mut self, compression: Compression) {
        self.compression = compression;
    }

    /// The file this document was parsed from, if any.
    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    /// Serialize with the compression layer bypassed.
    pub fn to_uncompressed_bytes(&self) -> Result<Vec<u8>> {
        let mut out = Vec::new();
        let mut writer = TagWriter::new(&mut out);
        writer.start(&self.root_name)?;
        for (name, value) in self.root.iter() {
            write_value(&mut writer, Some(name), value)?;
        }
        writer.end_compound()?;
        writer.end()?;
        Ok(out)
    }

    /// Serialize, applying the document's compression hint.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        bytes::compress(&self.to_uncompressed_bytes()?, self.compression)
    }

    pub fn write_to(&self, writer: &mut impl Write) -> Result<()> {
        writer.write_all(&self.to_bytes()?)?;
        Ok(())
    }

    /// Write to a file, applying the compression hint.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let mut file = File::create(path)?;
        self.write_to(&mut file)
    }
}

/// Emit one value, recursing through containers in tree order.
fn write_value<W: Write>(writer: &mut TagWriter<W>, name: Option<&str>, value: &Value) -> Result<()> {
    match value {
        Value::Byte(v) => writer.byte(name, *v),
        Value::Short(v) => writer.short(name, *v),
        Value::Int(v) => writer.int(name, *v),
        Value::Long(v) => writer.long(name, *v),
        Value::Float(v) => writer.float(name, *v),
        Value::Double(v) => writer.double(name, *v),
        Value::String(v) => writer.string(name, v),
        Value::ByteArray(v) => writer.byte_array(name, v),
        Value::IntArray(v) => writer.int_array(name, v),
        Value::LongArray(v) => writer.long_array(name, v),
        Value::List(list) => {
            writer.start_list(name, list.element(), list.len() as i32)?;
            for item in list {
                write_value(writer, None, item)?;
            }
            writer.end_list()
        }
        Value::Compound(compound) => {
            writer.start_compound(name)?;
            for (child_name, child) in compound.iter() {
                write_value(writer, Some(child_name), child)?;
            }
            writer.end_compound()
        }
    }
}

/// Parse a raw (already decompressed) byte string into a named root.
pub(crate) fn parse_tree(data: &[u8]) -> Result<(String, Compound)> {
    let mut parser = Parser::new(data);
    let mut builder = TreeBuilder::new();
    match parser.parse(&mut builder)? {
        Outcome::Finished => builder.finish(),
        Outcome::Aborted => Err(builder
            .error
            .take()
            .unwrap_or_else(|| Error::structural("tree build aborted"))),
    }
}

/// A container still being built.
enum Node {
    Compound { name: Option<String>, map: Compound },
    List { name: Option<String>, list: List },
}

/// Materializes a tree by acting as the parser's handler. This is the
/// "materializing style" of the codec: one parser, two consumers.
struct TreeBuilder {
    root_name: Option<String>,
    root: Option<Compound>,
    stack: Vec<Node>,
    error: Option<Error>,
}

impl TreeBuilder {
    fn new() -> Self {
        Self {
            root_name: None,
            root: None,
            stack: Vec::new(),
            error: None,
        }
    }

    fn finish(self) -> Result<(String, Compound)> {
        if let Some(error) = self.error {
            return Err(error);
        }
        match (self.root_name, self.root) {
            (Some(name), Some(root)) => Ok((name, root)),
            _ => Err(Error::structural("tree build finished without a root")),
        }
    }

    /// Place a finished value into the container being built.
    fn put(&mut self, name: Option<&str>, value: Value) -> Control {
        match self.stack.last_mut() {
            Some(Node::Compound { map, .. }) => {
                map.insert(name.unwrap_or_default(), value);
                Control::Continue
            }
            Some(Node::List { list, .. }) => match list.push(value) {
                Ok(()) => Control::Continue,
                Err(e) => {
                    self.error = Some(e);
                    Control::Abort
                }
            },
            None => {
                self.error = Some(Error::structural("value outside any container"));
                Control::Abort
            }
        }
    }
}

impl Handler for TreeBuilder {
    fn start(&mut self, root_name: &str) -> Control {
        self.root_name = Some(root_name.to_owned());
        self.stack.push(Node::Compound {
            name: None,
            map: Compound::new(),
        });
        Control::Continue
    }

    fn byte(&mut self, name: Option<&str>, value: i8) -> Control {
        self.put(name, Value::Byte(value))
    }

    fn short(&mut self, name: Option<&str>, value: i16) -> Control {
        self.put(name, Value::Short(value))
    }

    fn int(&mut self, name: Option<&str>, value: i32) -> Control {
        self.put(name, Value::Int(value))
    }

    fn long(&mut self, name: Option<&str>, value: i64) -> Control {
        self.put(name, Value::Long(value))
    }

    fn float(&mut self, name: Option<&str>, value: f32) -> Control {
        self.put(name, Value::Float(value))
    }

    fn double(&mut self, name: Option<&str>, value: f64) -> Control {
        self.put(name, Value::Double(value))
    }

    fn string(&mut self, name: Option<&str>, value: &str) -> Control {
        self.put(name, Value::String(value.to_owned()))
    }

    fn byte_array(&mut self, name: Option<&str>, data: &[i8]) -> Control {
        self.put(name, Value::ByteArray(data.to_vec()))
    }

    fn int_array(&mut self, name: Option<&str>, data: &[i32]) -> Control {
        self.put(name, Value::IntArray(data.to_vec()))
    }

    fn long_array(&mut self, name: Option<&str>, data: &[i64]) -> Control {
        self.put(name, Value::LongArray(data.to_vec()))
    }

    fn start_compound(&mut self, name: Option<&str>) -> Control {
        self.stack.push(Node::Compound {
            name: name.map(str::to_owned),
            map: Compound::new(),
        });
        Control::Continue
    }

    fn end_compound(&mut self) -> Control {
        match self.stack.pop() {
            Some(Node::Compound { name, map }) => {
                if self.stack.is_empty() {
                    self.root = Some(map);
                    Control::Continue
                } else {
                    self.put(name.as_deref(), Value::Compound(map))
                }
            }
            _ => {
                self.error = Some(Error::structural("end_compound without an open compound"));
                Control::Abort
            }
        }
    }

    fn start_list(&mut self, name: Option<&str>, element: Tag, _len: i32) -> Control {
        self.stack.push(Node::List {
            name: name.map(str::to_owned),
            list: List::with_element(element),
        });
        Control::Continue
    }

    fn end_list(&mut self) -> Control {
        match self.stack.pop() {
            Some(Node::List { name, list }) => self.put(name.as_deref(), Value::List(list)),
            _ => {
                self.error = Some(Error::structural("end_list without an open list"));
                Control::Abort
            }
        }
    }
}
