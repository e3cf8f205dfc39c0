// Copyright: Kyler Chin <kyler@catenarymaps.org>
// Catenary Transit Initiatives
// Removal of the attribution is not allowed, as covered under the AGPL license

use crate::config::MapConfig;
use crate::mercator::{self, PixelPoint};
use crate::models::LatLng;
use crate::projection::GeoPoint;
use crate::viewport::{MapView, ViewportBounds};
use ahash::AHashMap;
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq)]
pub struct DensityCell {
    /// Weighted mean position of the points in the cell, in screen pixels.
    pub x: f64,
    pub y: f64,
    /// Normalised to the densest visible cell.
    pub weight: f64,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct DensitySurface {
    pub radius_px: f64,
    pub cell_size_px: f64,
    pub cells: Vec<DensityCell>,
}

impl DensitySurface {
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct HeatmapLayer {
    radius_px: f64,
    fit_bounds_on_load: bool,
    fit_bounds_on_update: bool,
    points: Vec<GeoPoint>,
    loaded: bool,
}

impl HeatmapLayer {
    pub fn new(radius_px: f64, fit_bounds_on_load: bool, fit_bounds_on_update: bool) -> Self {
        Self {
            radius_px,
            fit_bounds_on_load,
            fit_bounds_on_update,
            points: Vec::new(),
            loaded: false,
        }
    }

    pub fn from_config(config: &MapConfig) -> Self {
        Self::new(
            config.heat_radius_px,
            config.fit_bounds_on_load,
            config.fit_bounds_on_update,
        )
    }

    pub fn points(&self) -> &[GeoPoint] {
        &self.points
    }

    /// Replaces the point set. Returns the bounds the map should fit, if any.
    pub fn set_points(&mut self, points: Vec<GeoPoint>) -> Option<ViewportBounds> {
        if self.loaded && points == self.points {
            return None;
        }
        self.points = points;
        if self.points.is_empty() {
            return None;
        }

        let fit = if self.loaded {
            self.fit_bounds_on_update
        } else {
            self.fit_bounds_on_load
        };
        self.loaded = true;

        if !fit {
            return None;
        }
        ViewportBounds::enclosing(self.points.iter().map(GeoPoint::location))
    }

    /// Bins the visible points into screen cells half the heat radius wide.
    /// The radius is in pixels at every zoom, so points spread apart as the
    /// map zooms in.
    pub fn render(&self, map: &dyn MapView) -> DensitySurface {
        let cell_size_px = self.radius_px / 2.0;
        let mut surface = DensitySurface {
            radius_px: self.radius_px,
            cell_size_px,
            cells: Vec::new(),
        };
        if self.points.is_empty() || cell_size_px <= 0.0 {
            return surface;
        }

        let zoom = map.zoom();
        let size = map.size();
        let bounds = map.bounds();
        let origin = mercator::project(LatLng::new(bounds.north, bounds.west), zoom);
        let r = self.radius_px;

        // (x * w, y * w, w) per cell
        let mut grid: AHashMap<(i64, i64), (f64, f64, f64)> = AHashMap::new();
        for point in &self.points {
            let p = mercator::project(point.location(), zoom);
            let screen = PixelPoint::new(p.x - origin.x, p.y - origin.y);
            if screen.x < -r || screen.y < -r || screen.x > size.width + r || screen.y > size.height + r
            {
                continue;
            }
            let key = (
                (screen.x / cell_size_px).floor() as i64,
                (screen.y / cell_size_px).floor() as i64,
            );
            let cell = grid.entry(key).or_insert((0.0, 0.0, 0.0));
            cell.0 += screen.x * point.intensity;
            cell.1 += screen.y * point.intensity;
            cell.2 += point.intensity;
        }

        let max_weight = grid.values().map(|c| c.2).fold(0.0_f64, f64::max);
        if max_weight <= 0.0 {
            return surface;
        }

        let mut keyed: Vec<((i64, i64), (f64, f64, f64))> = grid.into_iter().collect();
        keyed.sort_by_key(|(key, _)| (key.1, key.0));
        surface.cells = keyed
            .into_iter()
            .map(|(_, (sx, sy, w))| DensityCell {
                x: sx / w,
                y: sy / w,
                weight: w / max_weight,
            })
            .collect();
        surface
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::viewport::{MapSnapshot, ScreenSize};

    fn point(lat: f64, lng: f64) -> GeoPoint {
        GeoPoint {
            lat,
            lng,
            intensity: 1.0,
        }
    }

    fn map(zoom: u8) -> MapSnapshot {
        MapSnapshot::new(LatLng::new(41.0, 29.0), zoom, ScreenSize::new(800.0, 600.0))
    }

    #[test]
    fn test_fit_on_load_and_on_update() {
        let mut layer = HeatmapLayer::new(15.0, true, true);
        let fit = layer
            .set_points(vec![point(41.0, 29.0), point(37.0, 36.0)])
            .unwrap();
        assert_eq!(
            fit,
            ViewportBounds {
                south: 37.0,
                west: 29.0,
                north: 41.0,
                east: 36.0
            }
        );

        // same points again is not an update
        assert!(layer.set_points(vec![point(41.0, 29.0), point(37.0, 36.0)]).is_none());

        let fit = layer.set_points(vec![point(38.0, 30.0)]).unwrap();
        assert!(fit.is_point());
    }

    #[test]
    fn test_fit_flags_can_be_disabled() {
        let mut layer = HeatmapLayer::new(15.0, false, true);
        assert!(layer.set_points(vec![point(41.0, 29.0)]).is_none());
        assert!(layer.set_points(vec![point(40.0, 29.0)]).is_some());

        let mut layer = HeatmapLayer::new(15.0, true, false);
        assert!(layer.set_points(vec![point(41.0, 29.0)]).is_some());
        assert!(layer.set_points(vec![point(40.0, 29.0)]).is_none());
    }

    #[test]
    fn test_empty_points_render_nothing() {
        let mut layer = HeatmapLayer::new(15.0, true, true);
        assert!(layer.set_points(Vec::new()).is_none());
        assert!(layer.render(&map(7)).is_empty());

        // the first non-empty set is still the initial load
        assert!(layer.set_points(vec![point(41.0, 29.0)]).is_some());
    }

    #[test]
    fn test_density_separates_with_zoom() {
        let mut layer = HeatmapLayer::new(15.0, true, true);
        layer.set_points(vec![point(40.99, 29.0), point(40.991, 29.001), point(40.992, 29.0)]);

        let far = layer.render(&map(6));
        assert_eq!(far.cells.len(), 1);
        assert_eq!(far.cells[0].weight, 1.0);
        assert_eq!(far.cell_size_px, 7.5);

        let close_up = MapSnapshot::new(
            LatLng::new(40.991, 29.0005),
            16,
            ScreenSize::new(800.0, 600.0),
        );
        let near = layer.render(&close_up);
        assert_eq!(near.cells.len(), 3);
        assert!(near.cells.iter().all(|c| c.weight == 1.0));
    }

    #[test]
    fn test_offscreen_points_are_skipped() {
        let mut layer = HeatmapLayer::new(15.0, true, true);
        layer.set_points(vec![point(41.0, 29.0), point(41.0, 29.0), point(-30.0, 120.0)]);
        let surface = layer.render(&map(10));
        assert_eq!(surface.cells.len(), 1);
        let cell = surface.cells[0];
        assert!((cell.x - 400.0).abs() < 1.0);
        assert!((cell.y - 300.0).abs() < 1.0);
    }
}
