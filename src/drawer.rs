// Copyright: Kyler Chin <kyler@catenarymaps.org>
// Catenary Transit Initiatives
// Removal of the attribution is not allowed, as covered under the AGPL license

use crate::models::{LatLng, MarkerRecord};
use serde::{Deserialize, Serialize};

const SECOND_DECIMALS: u64 = 100_000;

/// Everything the detail drawer shows for the selected marker.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct DrawerPayload {
    pub marker_id: String,
    pub formatted_address: String,
    pub location: LatLng,
    pub formatted_coordinates: String,
    pub google_maps_url: String,
    pub directions_url: String,
    pub tweet_url: String,
    pub text: String,
}

impl DrawerPayload {
    pub fn from_marker(marker: &MarkerRecord) -> Self {
        let location = marker.location;
        Self {
            marker_id: marker.id.clone(),
            formatted_address: marker.formatted_address.clone(),
            location,
            formatted_coordinates: format_coordinates(location),
            google_maps_url: google_maps_url(location),
            directions_url: directions_url(location),
            tweet_url: tweet_url(&marker.source.tweet_id),
            text: marker.source.full_text.clone(),
        }
    }
}

pub fn google_maps_url(location: LatLng) -> String {
    format!(
        "https://www.google.com/maps/@{},{},22z",
        location.lat, location.lng
    )
}

pub fn directions_url(location: LatLng) -> String {
    format!(
        "https://www.google.com/maps?saddr=My+Location&daddr={},{}",
        location.lat, location.lng
    )
}

pub fn tweet_url(tweet_id: &str) -> String {
    format!("https://twitter.com/anyuser/status/{}", tweet_id)
}

// degrees, minutes and seconds to five decimals, e.g. 41° 0′ 36.00000″ N
fn format_component(value: f64, positive: char, negative: char) -> String {
    let hemisphere = if value < 0.0 { negative } else { positive };
    let units = (value.abs() * 3600.0 * SECOND_DECIMALS as f64).round() as u64;
    let degrees = units / (3600 * SECOND_DECIMALS);
    let minutes = units % (3600 * SECOND_DECIMALS) / (60 * SECOND_DECIMALS);
    let second_units = units % (60 * SECOND_DECIMALS);
    format!(
        "{}° {}′ {}.{:05}″ {}",
        degrees,
        minutes,
        second_units / SECOND_DECIMALS,
        second_units % SECOND_DECIMALS,
        hemisphere
    )
}

pub fn format_coordinates(location: LatLng) -> String {
    format!(
        "{} {}",
        format_component(location.lat, 'N', 'S'),
        format_component(location.lng, 'E', 'W')
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::MarkerSource;

    #[test]
    fn test_payload_from_marker() {
        let marker = MarkerRecord::new(
            "x1",
            LatLng::new(41.0, 29.0),
            "Foo",
            MarkerSource {
                tweet_id: "123".to_string(),
                full_text: "bar".to_string(),
            },
        );
        let payload = DrawerPayload::from_marker(&marker);
        assert_eq!(payload.marker_id, "x1");
        assert_eq!(payload.formatted_address, "Foo");
        assert_eq!(payload.tweet_url, "https://twitter.com/anyuser/status/123");
        assert_eq!(payload.text, "bar");
        assert_eq!(payload.google_maps_url, "https://www.google.com/maps/@41,29,22z");
        assert_eq!(
            payload.directions_url,
            "https://www.google.com/maps?saddr=My+Location&daddr=41,29"
        );
    }

    #[test]
    fn test_format_coordinates() {
        assert_eq!(
            format_coordinates(LatLng::new(41.0, 29.0)),
            "41° 0′ 0.00000″ N 29° 0′ 0.00000″ E"
        );
        assert_eq!(
            format_coordinates(LatLng::new(40.76, -73.984)),
            "40° 45′ 36.00000″ N 73° 59′ 2.40000″ W"
        );
        assert_eq!(
            format_coordinates(LatLng::new(-33.5, 151.25)),
            "33° 30′ 0.00000″ S 151° 15′ 0.00000″ E"
        );
    }
}
