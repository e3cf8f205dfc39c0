// Copyright: Kyler Chin <kyler@catenarymaps.org>
// Catenary Transit Initiatives
// Removal of the attribution is not allowed, as covered under the AGPL license

use geo_types::Point;
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

impl LatLng {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// Finite and inside the WGS 84 ranges.
    pub fn is_valid(&self) -> bool {
        self.lat.is_finite()
            && self.lng.is_finite()
            && (-90.0..=90.0).contains(&self.lat)
            && (-180.0..=180.0).contains(&self.lng)
    }

    // geo uses (x, y) = (lon, lat)
    pub fn to_point(self) -> Point<f64> {
        Point::new(self.lng, self.lat)
    }

    pub fn from_point(point: Point<f64>) -> Self {
        Self {
            lat: point.y(),
            lng: point.x(),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct MarkerSource {
    pub tweet_id: String,
    pub full_text: String,
}

/// One incident report as handed to the map core.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct MarkerRecord {
    pub id: String,
    pub location: LatLng,
    pub formatted_address: String,
    pub source: MarkerSource,
}

impl MarkerRecord {
    pub fn new(
        id: impl Into<String>,
        location: LatLng,
        formatted_address: impl Into<String>,
        source: MarkerSource,
    ) -> Self {
        Self {
            id: id.into(),
            location,
            formatted_address: formatted_address.into(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_latlng_validity() {
        assert!(LatLng::new(41.0, 29.0).is_valid());
        assert!(LatLng::new(-90.0, 180.0).is_valid());
        assert!(!LatLng::new(91.0, 29.0).is_valid());
        assert!(!LatLng::new(41.0, f64::NAN).is_valid());
    }

    #[test]
    fn test_point_round_trip_keeps_axis_order() {
        let p = LatLng::new(37.5, 36.9).to_point();
        assert_eq!(p.x(), 36.9);
        assert_eq!(p.y(), 37.5);
        assert_eq!(LatLng::from_point(p), LatLng::new(37.5, 36.9));
    }
}
