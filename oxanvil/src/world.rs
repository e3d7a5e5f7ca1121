//! The world directory layout: level data, players, dimensions.

use std::fs::File;
use std::path::{Path, PathBuf};

use log::warn;
use oxnbt::Document;

use crate::chunk::{Chunk, ChunkBlocks, WorldBlock};
use crate::files::RegionFileLoader;
use crate::{CCoord, Dimension, Error, RCoord, Region, Result};

/// A Minecraft world directory.
pub struct World {
    root: PathBuf,
}

impl World {
    /// Open a world directory. It must contain a `level.dat`.
    pub fn open(path: impl AsRef<Path>) -> Result<World> {
        let root = path.as_ref().to_path_buf();
        if !root.join("level.dat").is_file() {
            return Err(Error::InvalidWorld(format!(
                "no level.dat under {}",
                root.display()
            )));
        }
        Ok(World { root })
    }

    pub fn path(&self) -> &Path {
        &self.root
    }

    /// Parse `level.dat` into the world's metadata.
    pub fn level(&self) -> Result<LevelData> {
        let document = Document::from_file(self.root.join("level.dat"))?;
        LevelData::from_document(document)
    }

    /// Ids of players with a data file, sorted. Backup `.dat_old` files are
    /// ignored. Empty when the world has no `playerdata` directory.
    pub fn players(&self) -> Result<Vec<String>> {
        let dir = self.root.join("playerdata");
        if !dir.is_dir() {
            return Ok(Vec::new());
        }

        let mut ids: Vec<String> = std::fs::read_dir(dir)?
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| path.extension().and_then(|ext| ext.to_str()) == Some("dat"))
            .filter_map(|path| {
                path.file_stem()
                    .and_then(|stem| stem.to_str())
                    .map(str::to_owned)
            })
            .collect();
        ids.sort();
        Ok(ids)
    }

    /// Parse one player's gzip-compressed data file.
    pub fn player(&self, id: &str) -> Result<Document> {
        let path = self.root.join("playerdata").join(format!("{id}.dat"));
        Ok(Document::from_file(path)?)
    }

    /// The dimensions that have region data on disk.
    pub fn dimensions(&self) -> Result<Vec<Dimension>> {
        let mut dimensions = Vec::new();
        for known in [Dimension::Overworld, Dimension::Nether, Dimension::End] {
            if self.region_dir(&known).is_dir() {
                dimensions.push(known);
            }
        }

        for entry in std::fs::read_dir(&self.root)? {
            let entry = match entry {
                Ok(entry) => entry,
                Err(_) => continue,
            };
            let path = entry.path();
            if !path.is_dir() || !path.join("region").is_dir() {
                continue;
            }
            let name = match path.file_name().and_then(|name| name.to_str()) {
                Some(name) => name,
                None => continue,
            };
            match Dimension::from_directory(name) {
                Dimension::Custom(custom) => dimensions.push(Dimension::Custom(custom)),
                // the named ones were already picked up above
                _ => {}
            }
        }

        Ok(dimensions)
    }

    /// Read access to one dimension's regions and blocks.
    pub fn dimension(&self, dimension: Dimension) -> DimensionView {
        let loader = RegionFileLoader::new(self.region_dir(&dimension));
        DimensionView { dimension, loader }
    }

    fn region_dir(&self, dimension: &Dimension) -> PathBuf {
        let sub = dimension.directory();
        if sub.is_empty() {
            self.root.join("region")
        } else {
            self.root.join(sub).join("region")
        }
    }
}

/// World metadata from `level.dat`'s `Data` compound. The full tree stays
/// available for fields this view doesn't surface.
#[derive(Debug)]
pub struct LevelData {
    name: Option<String>,
    data_version: Option<i32>,
    spawn: (i32, i32, i32),
    last_played: Option<i64>,
    seed: Option<i64>,
    document: Document,
}

impl LevelData {
    fn from_document(document: Document) -> Result<LevelData> {
        let data = document
            .root()
            .get("Data")
            .ok_or_else(|| Error::InvalidWorld("level.dat has no Data compound".to_owned()))?
            .as_compound()?;

        let name = data
            .get("LevelName")
            .and_then(|v| v.as_str().ok())
            .map(str::to_owned);
        let data_version = data.get("DataVersion").and_then(|v| v.as_int().ok());
        let spawn = (
            data.get("SpawnX").and_then(|v| v.as_int().ok()).unwrap_or(0),
            data.get("SpawnY").and_then(|v| v.as_int().ok()).unwrap_or(0),
            data.get("SpawnZ").and_then(|v| v.as_int().ok()).unwrap_or(0),
        );
        let last_played = data.get("LastPlayed").and_then(|v| v.as_long().ok());

        // moved into WorldGenSettings in 1.16
        let seed = data
            .get("RandomSeed")
            .and_then(|v| v.as_long().ok())
            .or_else(|| {
                data.get("WorldGenSettings")
                    .and_then(|v| v.as_compound().ok())
                    .and_then(|settings| settings.get("seed"))
                    .and_then(|v| v.as_long().ok())
            });

        Ok(LevelData {
            name,
            data_version,
            spawn,
            last_played,
            seed,
            document,
        })
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn data_version(&self) -> Option<i32> {
        self.data_version
    }

    pub fn spawn(&self) -> (i32, i32, i32) {
        self.spawn
    }

    pub fn last_played(&self) -> Option<i64> {
        self.last_played
    }

    pub fn seed(&self) -> Option<i64> {
        self.seed
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn into_document(self) -> Document {
        self.document
    }
}

/// Read access to one dimension of a world.
pub struct DimensionView {
    dimension: Dimension,
    loader: RegionFileLoader,
}

impl DimensionView {
    pub fn dimension(&self) -> &Dimension {
        &self.dimension
    }

    /// The region coordinates present on disk, sorted.
    pub fn regions(&self) -> Result<Vec<(RCoord, RCoord)>> {
        self.loader.list()
    }

    pub fn region(&self, x: RCoord, z: RCoord) -> Result<Option<Region<File>>> {
        self.loader.region(x, z)
    }

    /// The chunk at world-absolute chunk coordinates, or `None` when its
    /// region or header entry is absent.
    pub fn chunk_at(&self, cx: CCoord, cz: CCoord) -> Result<Option<Chunk>> {
        let mut region = match self.loader.region(cx.region(), cz.region())? {
            Some(region) => region,
            None => return Ok(None),
        };

        match region.read_chunk(cx.local(), cz.local()) {
            Ok(data) => Ok(Some(Chunk::from_bytes(&data)?)),
            Err(Error::NoSuchChunk(..)) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Iterate every block of the dimension, region by region. A chunk
    /// that fails to read or decode is yielded as one error and the walk
    /// continues with the next chunk.
    pub fn blocks(&self, include_air: bool) -> Result<DimensionBlocks<'_>> {
        let regions = self.loader.list()?;
        Ok(DimensionBlocks {
            loader: &self.loader,
            regions: regions.into_iter(),
            current: None,
            blocks: None,
            include_air,
        })
    }
}

/// An open region and its remaining chunk queue.
struct RegionCursor {
    region: Region<File>,
    coords: (RCoord, RCoord),
    chunks: std::vec::IntoIter<(usize, usize)>,
}

/// Iterator over every block of a dimension. See
/// [`DimensionView::blocks`].
pub struct DimensionBlocks<'a> {
    loader: &'a RegionFileLoader,
    regions: std::vec::IntoIter<(RCoord, RCoord)>,
    current: Option<RegionCursor>,
    blocks: Option<ChunkBlocks>,
    include_air: bool,
}

impl Iterator for DimensionBlocks<'_> {
    type Item = Result<WorldBlock>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(blocks) = &mut self.blocks {
                match blocks.next() {
                    Some(item) => return Some(item),
                    None => self.blocks = None,
                }
            }

            if let Some(cursor) = &mut self.current {
                let (x, z) = match cursor.chunks.next() {
                    Some(chunk) => chunk,
                    None => {
                        self.current = None;
                        continue;
                    }
                };

                let cx = CCoord(cursor.coords.0 .0 * 32 + x as isize);
                let cz = CCoord(cursor.coords.1 .0 * 32 + z as isize);

                match cursor
                    .region
                    .read_chunk(x, z)
                    .and_then(|data| Chunk::from_bytes(&data))
                {
                    Ok(chunk) => {
                        self.blocks = Some(chunk.into_blocks(cx, cz, self.include_air));
                        continue;
                    }
                    Err(e) => {
                        warn!(
                            "skipping chunk ({x}, {z}) of region ({}, {}): {e}",
                            cursor.coords.0 .0, cursor.coords.1 .0
                        );
                        return Some(Err(e));
                    }
                }
            }

            let (rx, rz) = self.regions.next()?;
            match self.open_region(rx, rz) {
                Ok(Some(cursor)) => self.current = Some(cursor),
                Ok(None) => continue,
                Err(e) => return Some(Err(e)),
            }
        }
    }
}

impl DimensionBlocks<'_> {
    fn open_region(&self, rx: RCoord, rz: RCoord) -> Result<Option<RegionCursor>> {
        let mut region = match self.loader.region(rx, rz)? {
            Some(region) => region,
            None => return Ok(None),
        };

        let mut present = Vec::new();
        for z in 0..32 {
            for x in 0..32 {
                if region.chunk_location(x, z)?.is_some() {
                    present.push((x, z));
                }
            }
        }

        Ok(Some(RegionCursor {
            region,
            coords: (rx, rz),
            chunks: present.into_iter(),
        }))
    }
}
