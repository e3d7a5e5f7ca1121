use std::io::{Read, Write};

use flate2::read::GzDecoder;
use flate2::write::{GzEncoder, ZlibEncoder};

use super::Builder;
use crate::error::{ErrorKind, Result};
use crate::value::{Compound, List, Value};
use crate::{Compression, Document, Tag};

fn fixture() -> Vec<u8> {
    Builder::new()
        .start_compound("level")
        .int("version", 19133)
        .string("name", "world")
        .start_list("entities", Tag::Compound, 2)
        .start_anon_compound()
        .string("id", "minecraft:creeper")
        .double("health", 20.0)
        .end_compound()
        .start_anon_compound()
        .string("id", "minecraft:pig")
        .end_compound()
        .long_array("times", &[1, -1, i64::MAX])
        .end_compound()
        .build()
}

#[test]
fn parse_then_write_is_identity() -> Result<()> {
    let bytes = fixture();
    let doc = Document::from_bytes(&bytes)?;
    assert_eq!(bytes, doc.to_uncompressed_bytes()?);
    Ok(())
}

#[test]
fn write_then_parse_is_structural_identity() -> Result<()> {
    let mut doc = Document::new("root");
    doc.root_mut().insert("a", Value::Int(1));

    let mut list = List::with_element(Tag::String);
    list.push(Value::String("x".into()))?;
    doc.root_mut().insert("xs", Value::List(list));

    let mut inner = Compound::new();
    inner.insert("deep", Value::ByteArray(vec![1, 2, 3]));
    doc.root_mut().insert("inner", Value::Compound(inner));

    let reparsed = Document::from_bytes(&doc.to_uncompressed_bytes()?)?;
    assert_eq!(doc.root(), reparsed.root());
    assert_eq!(doc.root_name(), reparsed.root_name());
    Ok(())
}

#[test]
fn detects_and_reapplies_gzip() -> Result<()> {
    let raw = fixture();
    let mut enc = GzEncoder::new(Vec::new(), flate2::Compression::default());
    enc.write_all(&raw).unwrap();
    let compressed = enc.finish().unwrap();

    let doc = Document::from_bytes(&compressed)?;
    assert_eq!(Compression::Gzip, doc.compression());
    assert_eq!("world", doc.root().get("name").unwrap().as_str()?);

    // writes back gzipped, and the payload is unchanged
    let out = doc.to_bytes()?;
    assert_eq!(Compression::Gzip, Compression::detect(&out));
    let mut redecoded = Vec::new();
    GzDecoder::new(out.as_slice())
        .read_to_end(&mut redecoded)
        .unwrap();
    assert_eq!(raw, redecoded);
    Ok(())
}

#[test]
fn detects_zlib() -> Result<()> {
    let raw = fixture();
    let mut enc = ZlibEncoder::new(Vec::new(), flate2::Compression::default());
    enc.write_all(&raw).unwrap();
    let compressed = enc.finish().unwrap();

    let doc = Document::from_bytes(&compressed)?;
    assert_eq!(Compression::Zlib, doc.compression());
    assert_eq!(19133, doc.root().get("version").unwrap().as_int()?);
    Ok(())
}

#[test]
fn raw_input_has_no_compression() -> Result<()> {
    let doc = Document::from_bytes(&fixture())?;
    assert_eq!(Compression::None, doc.compression());
    assert_eq!(None, doc.source());
    Ok(())
}

#[test]
fn duplicate_names_last_wins() -> Result<()> {
    let bytes = Builder::new()
        .start_compound("root")
        .int("a", 1)
        .int("a", 2)
        .end_compound()
        .build();

    let doc = Document::from_bytes(&bytes)?;
    assert_eq!(1, doc.root().len());
    assert_eq!(2, doc.root().get("a").unwrap().as_int()?);
    Ok(())
}

#[test]
fn parsed_lists_are_homogeneous() -> Result<()> {
    let doc = Document::from_bytes(&fixture())?;
    let entities = doc.root().get("entities").unwrap().as_list()?;
    assert_eq!(Tag::Compound, entities.element());
    for entity in entities {
        assert_eq!(Tag::Compound, entity.tag());
    }
    Ok(())
}

#[test]
fn compressed_garbage_is_io_error() {
    // gzip magic followed by junk
    let err = Document::from_bytes(&[0x1f, 0x8b, 0xff, 0xff, 0xff]).unwrap_err();
    assert!(matches!(
        err.kind(),
        ErrorKind::Io | ErrorKind::UnexpectedEnd | ErrorKind::InvalidRoot
    ));
}

#[test]
fn mutated_tree_serializes_in_order() -> Result<()> {
    let mut doc = Document::from_bytes(&fixture())?;
    doc.root_mut().remove("version");
    doc.root_mut().insert("seed", Value::Long(42));

    let reparsed = Document::from_bytes(&doc.to_uncompressed_bytes()?)?;
    let names: Vec<&str> = reparsed.root().names().collect();
    assert_eq!(vec!["name", "entities", "times", "seed"], names);
    Ok(())
}
