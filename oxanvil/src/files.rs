use std::fs::File;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::{Error, RCoord, Region, Result};

/// Loads region files from a dimension's `region/` directory. Both Anvil
/// (`.mca`) and the older Region (`.mcr`) containers are recognised, with
/// Anvil preferred when both exist for the same coordinates.
pub struct RegionFileLoader {
    region_dir: PathBuf,
}

impl RegionFileLoader {
    pub fn new(region_dir: PathBuf) -> Self {
        Self { region_dir }
    }

    pub fn has_region(&self, x: RCoord, z: RCoord) -> bool {
        ["mca", "mcr"]
            .iter()
            .any(|ext| self.region_path(x, z, ext).exists())
    }

    /// Open the region at (x, z). `Ok(None)` when no container exists.
    pub fn region(&self, x: RCoord, z: RCoord) -> Result<Option<Region<File>>> {
        for ext in ["mca", "mcr"] {
            match Region::from_file(self.region_path(x, z, ext)) {
                Ok(region) => return Ok(Some(region)),
                Err(Error::Io(e)) if e.kind() == ErrorKind::NotFound => continue,
                Err(e) => return Err(e),
            }
        }
        Ok(None)
    }

    /// The region coordinates present in the directory, sorted. Zero-length
    /// files, which Minecraft sometimes leaves behind, are skipped.
    pub fn list(&self) -> Result<Vec<(RCoord, RCoord)>> {
        let entries = std::fs::read_dir(&self.region_dir)?;

        let mut coords: Vec<(RCoord, RCoord)> = entries
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| path.is_file())
            .filter(|path| {
                matches!(
                    path.extension().and_then(|ext| ext.to_str()),
                    Some("mca") | Some("mcr")
                )
            })
            .filter(|path| {
                std::fs::metadata(path)
                    .map(|meta| meta.len() > 0)
                    .unwrap_or(false)
            })
            .filter_map(|path| coords_from_region(&path))
            .collect();

        coords.sort();
        coords.dedup();
        Ok(coords)
    }

    fn region_path(&self, x: RCoord, z: RCoord, ext: &str) -> PathBuf {
        self.region_dir.join(format!("r.{}.{}.{ext}", x.0, z.0))
    }
}

fn coords_from_region(region: &Path) -> Option<(RCoord, RCoord)> {
    let filename = region.file_name()?.to_str()?;
    let mut parts = filename.split('.').skip(1);
    let x = parts.next()?.parse::<isize>().ok()?;
    let z = parts.next()?.parse::<isize>().ok()?;
    Some((RCoord(x), RCoord(z)))
}
