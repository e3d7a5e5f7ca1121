use std::fmt::Display;

/// A region coordinate. Region (1, 2) covers chunks (32..64, 64..96).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RCoord(pub isize);

/// A world-absolute chunk coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CCoord(pub isize);

impl CCoord {
    /// The region this chunk falls in. Euclidean division, so negative
    /// chunk coordinates map correctly: chunk -1 is in region -1.
    pub fn region(self) -> RCoord {
        RCoord(self.0.div_euclid(32))
    }

    /// Offset of this chunk within its region, always 0..32.
    pub fn local(self) -> usize {
        self.0.rem_euclid(32) as usize
    }
}

/// Identifies a dimension within a world directory.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Dimension {
    Overworld,
    Nether,
    End,
    /// A datapack dimension, addressed by its directory name.
    Custom(String),
}

impl Dimension {
    /// Subdirectory of the world root holding this dimension's data. Empty
    /// for the overworld, which lives at the root itself.
    pub fn directory(&self) -> &str {
        match self {
            Dimension::Overworld => "",
            Dimension::Nether => "DIM-1",
            Dimension::End => "DIM1",
            Dimension::Custom(name) => name,
        }
    }

    pub fn from_directory(dir: &str) -> Dimension {
        match dir {
            "" => Dimension::Overworld,
            "DIM-1" => Dimension::Nether,
            "DIM1" => Dimension::End,
            other => Dimension::Custom(other.to_owned()),
        }
    }
}

impl Display for Dimension {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Dimension::Overworld => f.write_str("overworld"),
            Dimension::Nether => f.write_str("nether"),
            Dimension::End => f.write_str("end"),
            Dimension::Custom(name) => f.write_str(name),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chunk_to_region_is_euclidean() {
        assert_eq!(RCoord(0), CCoord(0).region());
        assert_eq!(RCoord(0), CCoord(31).region());
        assert_eq!(RCoord(1), CCoord(32).region());
        assert_eq!(RCoord(-1), CCoord(-1).region());
        assert_eq!(RCoord(-1), CCoord(-32).region());
        assert_eq!(RCoord(-2), CCoord(-33).region());
    }

    #[test]
    fn chunk_local_offset_is_nonnegative() {
        assert_eq!(0, CCoord(0).local());
        assert_eq!(31, CCoord(31).local());
        assert_eq!(0, CCoord(32).local());
        assert_eq!(31, CCoord(-1).local());
        assert_eq!(0, CCoord(-32).local());
        assert_eq!(31, CCoord(-33).local());
    }

    #[test]
    fn dimension_directories() {
        assert_eq!("", Dimension::Overworld.directory());
        assert_eq!("DIM-1", Dimension::Nether.directory());
        assert_eq!("DIM1", Dimension::End.directory());
        assert_eq!(
            Dimension::Custom("floating_islands".into()),
            Dimension::from_directory("floating_islands")
        );
        assert_eq!(Dimension::Nether, Dimension::from_directory("DIM-1"));
    }
}
