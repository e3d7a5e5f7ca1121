//! Sector-indexed access to the chunks inside `.mca`/`.mcr` containers.

use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

use byteorder::{BigEndian, ReadBytesExt};
use flate2::read::{GzDecoder, ZlibDecoder};
use num_enum::TryFromPrimitive;

use crate::{Error, Result};

/// The size in bytes of a 'sector' in a region file. Sectors are
/// Minecraft's allocation unit for chunks; a chunk occupies a whole number
/// of them.
pub const SECTOR_SIZE: usize = 4096;

/// The size of the region file header: the location table followed by the
/// timestamp table.
pub const HEADER_SIZE: usize = 2 * SECTOR_SIZE;

/// Bit set on the scheme byte when an oversized chunk's payload lives in an
/// external `.mcc` sidecar instead of the region file.
const EXTERNAL_FLAG: u8 = 0x80;

/// Compression schemes chunk payloads are stored with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, TryFromPrimitive)]
#[repr(u8)]
pub enum CompressionScheme {
    Gzip = 1,
    Zlib = 2,
    Uncompressed = 3,
}

/// The location of chunk data within a region file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkLocation {
    pub begin_sector: usize,
    pub sector_count: usize,
    pub x: usize,
    pub z: usize,
}

/// A Minecraft region: up to 32x32 chunks of compressed NBT behind a
/// two-sector header.
pub struct Region<S> {
    stream: S,
    /// Total stream length, for bounds-checking header entries.
    len: u64,
    /// Where `.mcc` sidecars live, known only when opened from a path.
    sidecar_dir: Option<PathBuf>,
    /// This region's coordinates, parsed from its filename; sidecar names
    /// use absolute chunk coordinates so they need these.
    coords: Option<(isize, isize)>,
}

impl Region<File> {
    /// Open a region file. Chunks flagged as oversized can be followed into
    /// their `.mcc` sidecars, which live next to the region file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)?;
        let mut region = Region::from_stream(file)?;
        region.sidecar_dir = path.parent().map(Path::to_path_buf);
        region.coords = region_coords_from_name(path);
        Ok(region)
    }
}

impl<S: Read + Seek> Region<S> {
    /// Wrap an already-open stream. Sidecar chunks cannot be followed
    /// through this constructor; use [`Region::from_file`] for that.
    pub fn from_stream(mut stream: S) -> Result<Self> {
        let len = stream.seek(SeekFrom::End(0))?;
        Ok(Self {
            stream,
            len,
            sidecar_dir: None,
            coords: None,
        })
    }

    /// Consumes the region, returning the underlying stream.
    pub fn into_inner(self) -> S {
        self.stream
    }

    /// The header entry for the chunk at region-local (x, z), or `None`
    /// when the chunk is absent.
    pub fn chunk_location(&mut self, x: usize, z: usize) -> Result<Option<ChunkLocation>> {
        let pos = 4 * self.index(x, z)?;
        self.stream.seek(SeekFrom::Start(pos as u64))?;

        let mut buf = [0u8; 4];
        self.stream.read_exact(&mut buf)?;

        let begin_sector =
            usize::from(buf[0]) << 16 | usize::from(buf[1]) << 8 | usize::from(buf[2]);
        let sector_count = usize::from(buf[3]);

        if begin_sector == 0 || sector_count == 0 {
            return Ok(None);
        }

        Ok(Some(ChunkLocation {
            begin_sector,
            sector_count,
            x,
            z,
        }))
    }

    /// Last-modified time of the chunk in unix seconds, from the header's
    /// second table. Zero means never written.
    pub fn timestamp(&mut self, x: usize, z: usize) -> Result<u32> {
        let pos = SECTOR_SIZE + 4 * self.index(x, z)?;
        self.stream.seek(SeekFrom::Start(pos as u64))?;
        Ok(self.stream.read_u32::<BigEndian>()?)
    }

    /// The decompressed NBT payload of the chunk at region-local (x, z).
    pub fn read_chunk(&mut self, x: usize, z: usize) -> Result<Vec<u8>> {
        let location = self
            .chunk_location(x, z)?
            .ok_or(Error::NoSuchChunk(x, z))?;
        self.load(location)
    }

    /// Call `f` with each present chunk as (x, z, uncompressed NBT),
    /// ordered by position in the file so reads stay sequential.
    pub fn for_each_chunk(&mut self, mut f: impl FnMut(usize, usize, &[u8])) -> Result<()> {
        let mut locations = self.locations()?;
        locations.sort_by_key(|location| location.begin_sector);

        for location in locations {
            let data = self.load(location)?;
            f(location.x, location.z, &data);
        }
        Ok(())
    }

    /// Full integrity scan of the header. Every live entry must point at
    /// sectors inside the file and past the header, and no two entries may
    /// claim the same sector.
    pub fn scan(&mut self) -> Result<()> {
        let file_sectors = (self.len as usize) / SECTOR_SIZE;
        let mut locations = self.locations()?;

        for location in &locations {
            if location.begin_sector < 2
                || location.begin_sector + location.sector_count > file_sectors
            {
                return Err(Error::CorruptHeader(location.x, location.z));
            }
        }

        locations.sort_by_key(|location| location.begin_sector);
        for pair in locations.windows(2) {
            let (a, b) = (pair[0], pair[1]);
            if a.begin_sector + a.sector_count > b.begin_sector {
                return Err(Error::SectorOverlap {
                    first: (a.x, a.z),
                    second: (b.x, b.z),
                });
            }
        }

        Ok(())
    }

    fn index(&self, x: usize, z: usize) -> Result<usize> {
        if x >= 32 || z >= 32 {
            return Err(Error::InvalidCoords(x as isize, z as isize));
        }
        Ok(x + z * 32)
    }

    fn locations(&mut self) -> Result<Vec<ChunkLocation>> {
        let mut locations = Vec::new();
        for z in 0..32 {
            for x in 0..32 {
                if let Some(location) = self.chunk_location(x, z)? {
                    locations.push(location);
                }
            }
        }
        Ok(locations)
    }

    fn load(&mut self, location: ChunkLocation) -> Result<Vec<u8>> {
        let begin = location.begin_sector as u64 * SECTOR_SIZE as u64;
        let end = begin + (location.sector_count * SECTOR_SIZE) as u64;
        if location.begin_sector < 2 || end > self.len {
            return Err(Error::CorruptHeader(location.x, location.z));
        }

        self.stream.seek(SeekFrom::Start(begin))?;
        let declared = self.stream.read_u32::<BigEndian>()? as u64;
        if declared == 0 {
            return Err(Error::TruncatedChunk(location.x, location.z));
        }
        let scheme_byte = self.stream.read_u8()?;

        let scheme = CompressionScheme::try_from(scheme_byte & !EXTERNAL_FLAG)
            .map_err(|_| Error::UnknownCompression(scheme_byte))?;

        if scheme_byte & EXTERNAL_FLAG != 0 {
            return self.load_sidecar(location, scheme);
        }

        // the declared length counts the scheme byte
        let compressed_len = (declared - 1) as usize;
        if begin + 5 + compressed_len as u64 > self.len {
            return Err(Error::TruncatedChunk(location.x, location.z));
        }

        let mut data = vec![0u8; compressed_len];
        self.stream.read_exact(&mut data).map_err(|e| {
            if e.kind() == std::io::ErrorKind::UnexpectedEof {
                Error::TruncatedChunk(location.x, location.z)
            } else {
                Error::Io(e)
            }
        })?;

        decompress_payload(&data, scheme)
    }

    fn load_sidecar(&mut self, location: ChunkLocation, scheme: CompressionScheme) -> Result<Vec<u8>> {
        let (dir, (rx, rz)) = match (&self.sidecar_dir, self.coords) {
            (Some(dir), Some(coords)) => (dir, coords),
            _ => return Err(Error::MissingSidecar(location.x, location.z)),
        };

        let cx = rx * 32 + location.x as isize;
        let cz = rz * 32 + location.z as isize;
        let data = std::fs::read(dir.join(format!("c.{cx}.{cz}.mcc")))?;
        decompress_payload(&data, scheme)
    }
}

fn decompress_payload(data: &[u8], scheme: CompressionScheme) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    match scheme {
        CompressionScheme::Gzip => {
            GzDecoder::new(data).read_to_end(&mut out)?;
        }
        CompressionScheme::Zlib => {
            ZlibDecoder::new(data).read_to_end(&mut out)?;
        }
        CompressionScheme::Uncompressed => out.extend_from_slice(data),
    }
    Ok(out)
}

/// `r.<rx>.<rz>.mca` -> (rx, rz)
fn region_coords_from_name(path: &Path) -> Option<(isize, isize)> {
    let name = path.file_name()?.to_str()?;
    let mut parts = name.split('.').skip(1);
    let rx = parts.next()?.parse().ok()?;
    let rz = parts.next()?.parse().ok()?;
    Some((rx, rz))
}
