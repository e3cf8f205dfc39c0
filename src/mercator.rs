// Copyright: Kyler Chin <kyler@catenarymaps.org>
// Catenary Transit Initiatives
// Removal of the attribution is not allowed, as covered under the AGPL license

//! Spherical Web Mercator math in absolute pixel space, the same space raster
//! tile servers use: at zoom `z` the world is `256 * 2^z` pixels wide.

use crate::models::LatLng;
use crate::viewport::{ScreenSize, ViewportBounds, ZoomLevel};
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

pub const TILE_SIZE: f64 = 256.0;
pub const MAX_LATITUDE: f64 = 85.051_128_779_806_59;

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq)]
pub struct PixelPoint {
    pub x: f64,
    pub y: f64,
}

impl PixelPoint {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance(&self, other: &PixelPoint) -> f64 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2)).sqrt()
    }
}

pub fn world_size(zoom: ZoomLevel) -> f64 {
    TILE_SIZE * 2f64.powi(zoom as i32)
}

pub fn project(location: LatLng, zoom: ZoomLevel) -> PixelPoint {
    let size = world_size(zoom);
    let lat = location.lat.clamp(-MAX_LATITUDE, MAX_LATITUDE).to_radians();
    let x = (location.lng + 180.0) / 360.0 * size;
    let y = (1.0 - (lat.tan() + 1.0 / lat.cos()).ln() / PI) / 2.0 * size;
    PixelPoint::new(x, y)
}

pub fn unproject(point: PixelPoint, zoom: ZoomLevel) -> LatLng {
    let size = world_size(zoom);
    let lng = point.x / size * 360.0 - 180.0;
    let n = PI - 2.0 * PI * point.y / size;
    let lat = n.sinh().atan().to_degrees();
    LatLng::new(lat, lng)
}

/// Bounds of a screen of `size` pixels centred on `center`.
pub fn bounds_around(center: LatLng, zoom: ZoomLevel, size: ScreenSize) -> ViewportBounds {
    let c = project(center, zoom);
    let half_w = size.width / 2.0;
    let half_h = size.height / 2.0;
    let north_west = unproject(PixelPoint::new(c.x - half_w, c.y - half_h), zoom);
    let south_east = unproject(PixelPoint::new(c.x + half_w, c.y + half_h), zoom);
    ViewportBounds {
        south: south_east.lat,
        west: north_west.lng,
        north: north_west.lat,
        east: south_east.lng,
    }
}

/// Largest zoom in `min..=max` at which `bounds` fits inside `size`.
pub fn bounds_zoom(
    bounds: &ViewportBounds,
    size: ScreenSize,
    min_zoom: ZoomLevel,
    max_zoom: ZoomLevel,
) -> ZoomLevel {
    let mut fitting = min_zoom;
    for zoom in min_zoom..=max_zoom {
        let nw = project(LatLng::new(bounds.north, bounds.west), zoom);
        let se = project(LatLng::new(bounds.south, bounds.east), zoom);
        if (se.x - nw.x).abs() <= size.width && (se.y - nw.y).abs() <= size.height {
            fitting = zoom;
        } else {
            break;
        }
    }
    fitting
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_origin_is_world_centre() {
        let p = project(LatLng::new(0.0, 0.0), 0);
        assert!((p.x - 128.0).abs() < 1e-9);
        assert!((p.y - 128.0).abs() < 1e-9);
    }

    #[test]
    fn test_unproject_inverts_project() {
        let loc = LatLng::new(41.0, 29.0);
        for zoom in [0, 3, 10, 18] {
            let back = unproject(project(loc, zoom), zoom);
            assert!((back.lat - loc.lat).abs() < 1e-9);
            assert!((back.lng - loc.lng).abs() < 1e-9);
        }
    }

    #[test]
    fn test_pixel_distance_doubles_per_zoom() {
        let a = LatLng::new(41.0, 29.0);
        let b = LatLng::new(41.0001, 29.0001);
        let d10 = project(a, 10).distance(&project(b, 10));
        let d11 = project(a, 11).distance(&project(b, 11));
        assert!((d11 / d10 - 2.0).abs() < 1e-6);
    }

    #[test]
    fn test_bounds_zoom_fits_screen() {
        let size = ScreenSize::new(800.0, 600.0);
        let bounds = ViewportBounds {
            south: 36.0,
            west: 35.0,
            north: 38.0,
            east: 39.0,
        };
        let zoom = bounds_zoom(&bounds, size, 0, 18);
        assert_eq!(zoom, 8);

        let around = bounds_around(LatLng::new(37.0, 37.0), zoom, size);
        assert!(around.contains(LatLng::new(36.1, 35.1)));
        assert!(around.contains(LatLng::new(37.9, 38.9)));
    }
}
