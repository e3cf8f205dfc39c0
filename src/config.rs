// Copyright: Kyler Chin <kyler@catenarymaps.org>
// Catenary Transit Initiatives
// Removal of the attribution is not allowed, as covered under the AGPL license

use crate::models::LatLng;
use crate::viewport::ZoomLevel;
use anyhow::Context;
use serde::Deserialize;
use std::path::Path;

// Kahramanmaraş, the centre of the affected region
pub const DEFAULT_CENTER: LatLng = LatLng {
    lat: 37.5753,
    lng: 36.9228,
};
pub const DEFAULT_ZOOM: ZoomLevel = 7;
pub const DEFAULT_MIN_ZOOM: ZoomLevel = 4;
pub const DEFAULT_MAX_ZOOM: ZoomLevel = 18;
pub const DEFAULT_IMPORTANCY: f64 = 1.0;
pub const DEFAULT_CLUSTER_RADIUS_PX: f64 = 80.0;
pub const DEFAULT_HEAT_RADIUS_PX: f64 = 15.0;
pub const DEFAULT_TILE_URL: &str = "https://mt0.google.com/vt/lyrs=m&hl=en&x={x}&y={y}&z={z}&apistyle=s.e%3Al.i%7Cp.v%3Aoff%2Cs.t%3A3%7Cs.e%3Ag%7C";

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct MapConfig {
    pub center: LatLng,
    pub zoom: ZoomLevel,
    pub min_zoom: ZoomLevel,
    pub max_zoom: ZoomLevel,
    pub cluster_radius_px: f64,
    // at or above this zoom every marker is drawn on its own
    pub disable_clustering_at_zoom: Option<ZoomLevel>,
    pub spiderfy_distance_multiplier: f64,
    pub heat_radius_px: f64,
    pub heat_intensity: f64,
    pub fit_bounds_on_load: bool,
    pub fit_bounds_on_update: bool,
    pub tile_url: String,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            center: DEFAULT_CENTER,
            zoom: DEFAULT_ZOOM,
            min_zoom: DEFAULT_MIN_ZOOM,
            max_zoom: DEFAULT_MAX_ZOOM,
            cluster_radius_px: DEFAULT_CLUSTER_RADIUS_PX,
            disable_clustering_at_zoom: None,
            spiderfy_distance_multiplier: 1.0,
            heat_radius_px: DEFAULT_HEAT_RADIUS_PX,
            heat_intensity: DEFAULT_IMPORTANCY,
            fit_bounds_on_load: true,
            fit_bounds_on_update: true,
            tile_url: DEFAULT_TILE_URL.to_string(),
        }
    }
}

impl MapConfig {
    pub fn from_ron_str(text: &str) -> anyhow::Result<Self> {
        let config: MapConfig = ron::from_str(text).context("invalid map config")?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading map config {}", path.display()))?;
        Self::from_ron_str(&text).with_context(|| format!("parsing {}", path.display()))
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.min_zoom > self.max_zoom {
            anyhow::bail!(
                "min_zoom {} is above max_zoom {}",
                self.min_zoom,
                self.max_zoom
            );
        }
        if !(self.min_zoom..=self.max_zoom).contains(&self.zoom) {
            anyhow::bail!(
                "zoom {} outside {}..={}",
                self.zoom,
                self.min_zoom,
                self.max_zoom
            );
        }
        if !self.center.is_valid() {
            anyhow::bail!("center {:?} is not a valid coordinate", self.center);
        }
        if !(self.cluster_radius_px > 0.0) || !(self.heat_radius_px > 0.0) {
            anyhow::bail!("cluster and heat radii must be positive");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = MapConfig::default();
        config.validate().unwrap();
        assert!(config.fit_bounds_on_load);
        assert!(config.fit_bounds_on_update);
        assert_eq!(config.heat_radius_px, 15.0);
    }

    #[test]
    fn test_partial_ron_keeps_defaults() {
        let config = MapConfig::from_ron_str("(zoom: 9, cluster_radius_px: 40.0)").unwrap();
        assert_eq!(config.zoom, 9);
        assert_eq!(config.cluster_radius_px, 40.0);
        assert_eq!(config.min_zoom, DEFAULT_MIN_ZOOM);
        assert_eq!(config.tile_url, DEFAULT_TILE_URL);
    }

    #[test]
    fn test_rejects_zoom_outside_limits() {
        assert!(MapConfig::from_ron_str("(zoom: 2)").is_err());
        assert!(MapConfig::from_ron_str("(min_zoom: 12, max_zoom: 10)").is_err());
    }

    #[test]
    fn test_center_and_optional_fields() {
        let config = MapConfig::from_ron_str(
            "(center: (lat: 41.0, lng: 29.0), disable_clustering_at_zoom: Some(16))",
        )
        .unwrap();
        assert_eq!(config.center, LatLng::new(41.0, 29.0));
        assert_eq!(config.disable_clustering_at_zoom, Some(16));
    }
}
