//! 2×2 tile groups.

use std::collections::BTreeSet;

use crate::coord::{tiles_per_side, CoordError, TileCoord};

/// Four contiguous tiles at one zoom level, identified by the north-west
/// member (the anchor).
///
/// Groups built by [`TileGroup::containing`] are aligned to even x and y so
/// neighbouring groups never overlap and every member lies inside the grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TileGroup {
    anchor: TileCoord,
}

impl TileGroup {
    /// Creates the group anchored at `anchor`, checking all four members are
    /// inside the grid.
    pub fn new(anchor: TileCoord) -> Result<Self, CoordError> {
        let n = tiles_per_side(anchor.zoom);
        if anchor.x + 1 >= n || anchor.y + 1 >= n {
            return Err(CoordError::TileOutOfRange {
                x: anchor.x + 1,
                y: anchor.y + 1,
                zoom: anchor.zoom,
            });
        }
        Ok(Self { anchor })
    }

    /// The aligned group that contains `tile`.
    pub fn containing(tile: &TileCoord) -> Result<Self, CoordError> {
        Self::new(TileCoord {
            x: tile.x - tile.x % 2,
            y: tile.y - tile.y % 2,
            zoom: tile.zoom,
        })
    }

    pub fn anchor(&self) -> TileCoord {
        self.anchor
    }

    /// Members in raster order: top-left, top-right, bottom-left, bottom-right.
    pub fn members(&self) -> [TileCoord; 4] {
        let TileCoord { x, y, zoom } = self.anchor;
        [
            TileCoord { x, y, zoom },
            TileCoord { x: x + 1, y, zoom },
            TileCoord { x, y: y + 1, zoom },
            TileCoord {
                x: x + 1,
                y: y + 1,
                zoom,
            },
        ]
    }
}

/// Partitions a tile set into aligned groups covering every tile.
///
/// Tiles on the edge of the set are fetched together with whichever
/// neighbours complete their aligned group. Groups come back ordered by
/// anchor row, then column.
pub fn groups_for<'a, I>(tiles: I) -> Result<Vec<TileGroup>, CoordError>
where
    I: IntoIterator<Item = &'a TileCoord>,
{
    let mut groups = BTreeSet::new();
    for tile in tiles {
        groups.insert(TileGroup::containing(tile)?);
    }
    Ok(groups.into_iter().collect())
}
