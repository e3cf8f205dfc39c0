// Copyright: Kyler Chin <kyler@catenarymaps.org>
// Catenary Transit Initiatives
// Removal of the attribution is not allowed, as covered under the AGPL license

use crate::config::DEFAULT_IMPORTANCY;
use crate::models::{LatLng, MarkerRecord};
use serde::{Deserialize, Serialize};
use std::borrow::Borrow;

/// Weighted point fed to the density layer.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
    pub intensity: f64,
}

impl GeoPoint {
    pub fn location(&self) -> LatLng {
        LatLng::new(self.lat, self.lng)
    }
}

pub fn project<M: Borrow<MarkerRecord>>(markers: &[M]) -> Vec<GeoPoint> {
    project_with_intensity(markers, DEFAULT_IMPORTANCY)
}

/// Output keeps input order; records without a usable coordinate are skipped.
pub fn project_with_intensity<M: Borrow<MarkerRecord>>(
    markers: &[M],
    intensity: f64,
) -> Vec<GeoPoint> {
    markers
        .iter()
        .map(<M as Borrow<MarkerRecord>>::borrow)
        .filter(|marker| {
            let ok = marker.location.is_valid();
            if !ok {
                tracing::debug!(id = %marker.id, "skipping marker without usable coordinates");
            }
            ok
        })
        .map(|marker| GeoPoint {
            lat: marker.location.lat,
            lng: marker.location.lng,
            intensity,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::MarkerSource;
    use std::sync::Arc;

    fn marker(id: &str, lat: f64, lng: f64) -> MarkerRecord {
        MarkerRecord::new(
            id,
            LatLng::new(lat, lng),
            "",
            MarkerSource {
                tweet_id: String::new(),
                full_text: String::new(),
            },
        )
    }

    #[test]
    fn test_project_keeps_length_and_order() {
        let markers = vec![
            marker("a", 41.0, 29.0),
            marker("b", 37.57, 36.92),
            marker("c", 36.2, 36.16),
        ];
        let points = project(&markers);
        assert_eq!(points.len(), markers.len());
        for (point, marker) in points.iter().zip(&markers) {
            assert_eq!(point.lat, marker.location.lat);
            assert_eq!(point.lng, marker.location.lng);
            assert_eq!(point.intensity, DEFAULT_IMPORTANCY);
        }
    }

    #[test]
    fn test_project_empty() {
        let markers: Vec<MarkerRecord> = Vec::new();
        assert!(project(&markers).is_empty());
    }

    #[test]
    fn test_project_skips_bad_coordinates_without_failing() {
        let markers = vec![
            Arc::new(marker("a", 41.0, 29.0)),
            Arc::new(marker("bad", f64::NAN, 29.0)),
            Arc::new(marker("c", 36.2, 36.16)),
        ];
        let points = project_with_intensity(&markers, 3.0);
        assert_eq!(points.len(), 2);
        assert_eq!(points[0].location(), LatLng::new(41.0, 29.0));
        assert_eq!(points[1].location(), LatLng::new(36.2, 36.16));
        assert!(points.iter().all(|p| p.intensity == 3.0));
    }
}
