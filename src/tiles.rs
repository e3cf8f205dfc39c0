// Copyright: Kyler Chin <kyler@catenarymaps.org>
// Catenary Transit Initiatives
// Removal of the attribution is not allowed, as covered under the AGPL license

use crate::viewport::{ViewportBounds, ZoomLevel};
use serde::{Deserialize, Serialize};
use slippy_map_tiles::BBox;

// kept just inside the grid edges once narrowed to f32, so no tile index
// lands one row or column past the last tile
const MAX_TILE_LATITUDE: f64 = 85.05;
const MAX_TILE_LONGITUDE: f64 = 179.9999;

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TileCoord {
    pub z: ZoomLevel,
    pub x: u32,
    pub y: u32,
}

/// Raster tile endpoint with `{x}`, `{y}` and `{z}` placeholders.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct TileSource {
    pub url_template: String,
}

impl TileSource {
    pub fn new(url_template: impl Into<String>) -> Self {
        Self {
            url_template: url_template.into(),
        }
    }

    pub fn tile_url(&self, tile: TileCoord) -> String {
        self.url_template
            .replace("{x}", &tile.x.to_string())
            .replace("{y}", &tile.y.to_string())
            .replace("{z}", &tile.z.to_string())
    }

    /// Tiles covering `bounds`. A viewport wider than the world, or one that
    /// runs past the antimeridian, is clamped to the single world copy.
    pub fn visible_tiles(&self, bounds: &ViewportBounds, zoom: ZoomLevel) -> Vec<TileCoord> {
        let north = bounds.north.clamp(-MAX_TILE_LATITUDE, MAX_TILE_LATITUDE);
        let south = bounds.south.clamp(-MAX_TILE_LATITUDE, MAX_TILE_LATITUDE);
        let west = bounds.west.clamp(-MAX_TILE_LONGITUDE, MAX_TILE_LONGITUDE);
        let east = bounds.east.clamp(-MAX_TILE_LONGITUDE, MAX_TILE_LONGITUDE);

        let Some(bbox) = BBox::new(north as f32, west as f32, south as f32, east as f32) else {
            tracing::warn!(?bounds, "viewport bounds do not form a tile bbox");
            return Vec::new();
        };

        let mut tiles: Vec<TileCoord> = bbox
            .tiles_for_zoom(zoom)
            .map(|tile| TileCoord {
                z: tile.zoom(),
                x: tile.x(),
                y: tile.y(),
            })
            .collect();
        tiles.sort();
        tiles.dedup();
        tiles
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DEFAULT_TILE_URL;
    use crate::mercator;
    use crate::models::LatLng;
    use crate::viewport::ScreenSize;

    #[test]
    fn test_tile_url_substitution() {
        let source = TileSource::new("https://tile.example.org/{z}/{x}/{y}.png");
        assert_eq!(
            source.tile_url(TileCoord { z: 7, x: 77, y: 48 }),
            "https://tile.example.org/7/77/48.png"
        );

        let google = TileSource::new(DEFAULT_TILE_URL);
        let url = google.tile_url(TileCoord { z: 3, x: 4, y: 2 });
        assert!(url.contains("x=4&y=2&z=3"));
    }

    #[test]
    fn test_visible_tiles_cover_the_viewport() {
        let source = TileSource::new("{z}/{x}/{y}");
        let bounds = ViewportBounds {
            south: 36.0,
            west: 35.0,
            north: 38.0,
            east: 39.0,
        };
        let tiles = source.visible_tiles(&bounds, 7);
        assert!(!tiles.is_empty());
        assert!(tiles.iter().all(|t| t.z == 7));

        let (nw_x, nw_y) = slippy_map_tiles::lat_lon_to_tile(38.0, 35.0, 7);
        let (se_x, se_y) = slippy_map_tiles::lat_lon_to_tile(36.0, 39.0, 7);
        assert!(tiles.contains(&TileCoord { z: 7, x: nw_x, y: nw_y }));
        assert!(tiles.contains(&TileCoord { z: 7, x: se_x, y: se_y }));
        let expected = ((se_x - nw_x + 1) * (se_y - nw_y + 1)) as usize;
        assert_eq!(tiles.len(), expected);
    }

    #[test]
    fn test_viewport_across_antimeridian_still_has_tiles() {
        let source = TileSource::new("{z}/{x}/{y}");
        let bounds =
            mercator::bounds_around(LatLng::new(0.0, 170.0), 1, ScreenSize::new(1024.0, 768.0));
        assert!(bounds.west < -180.0);
        assert!(bounds.east > 180.0);

        let tiles = source.visible_tiles(&bounds, 1);
        assert_eq!(
            tiles,
            vec![
                TileCoord { z: 1, x: 0, y: 0 },
                TileCoord { z: 1, x: 0, y: 1 },
                TileCoord { z: 1, x: 1, y: 0 },
                TileCoord { z: 1, x: 1, y: 1 },
            ]
        );
    }

    #[test]
    fn test_viewport_past_east_edge_is_clamped() {
        let source = TileSource::new("{z}/{x}/{y}");
        let bounds = ViewportBounds {
            south: 10.0,
            west: 170.0,
            north: 20.0,
            east: 195.0,
        };
        let tiles = source.visible_tiles(&bounds, 3);
        assert!(!tiles.is_empty());
        assert!(tiles.iter().all(|t| t.x == 7));
    }
}
