// Copyright: Kyler Chin <kyler@catenarymaps.org>
// Catenary Transit Initiatives
// Removal of the attribution is not allowed, as covered under the AGPL license

use crate::mercator;
use crate::models::LatLng;
use geo::BoundingRect;
use geo_types::{Coord, MultiPoint, Rect};
use serde::{Deserialize, Serialize};

pub type ZoomLevel = u8;

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq)]
pub struct ScreenSize {
    pub width: f64,
    pub height: f64,
}

impl ScreenSize {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq)]
pub struct ViewportBounds {
    pub south: f64,
    pub west: f64,
    pub north: f64,
    pub east: f64,
}

impl ViewportBounds {
    pub fn contains(&self, location: LatLng) -> bool {
        location.lat >= self.south
            && location.lat <= self.north
            && location.lng >= self.west
            && location.lng <= self.east
    }

    /// Smallest bounds holding every location, `None` for an empty input.
    pub fn enclosing<I>(locations: I) -> Option<Self>
    where
        I: IntoIterator<Item = LatLng>,
    {
        let points: MultiPoint<f64> = locations.into_iter().map(LatLng::to_point).collect();
        points.bounding_rect().map(Self::from)
    }

    pub fn to_rect(&self) -> Rect<f64> {
        Rect::new(
            Coord {
                x: self.west,
                y: self.south,
            },
            Coord {
                x: self.east,
                y: self.north,
            },
        )
    }

    pub fn is_point(&self) -> bool {
        self.south == self.north && self.west == self.east
    }

    pub fn center(&self) -> LatLng {
        LatLng::from_point(self.to_rect().center().into())
    }
}

impl From<Rect<f64>> for ViewportBounds {
    fn from(rect: Rect<f64>) -> Self {
        Self {
            south: rect.min().y,
            west: rect.min().x,
            north: rect.max().y,
            east: rect.max().x,
        }
    }
}

/// Read access to whatever map widget hosts the core.
pub trait MapView {
    fn bounds(&self) -> ViewportBounds;
    fn zoom(&self) -> ZoomLevel;
    fn size(&self) -> ScreenSize;
}

/// Owned copy of a map's state, for hosts that cannot lend the widget itself.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq)]
pub struct MapSnapshot {
    pub center: LatLng,
    pub zoom: ZoomLevel,
    pub size: ScreenSize,
}

impl MapSnapshot {
    pub fn new(center: LatLng, zoom: ZoomLevel, size: ScreenSize) -> Self {
        Self { center, zoom, size }
    }
}

impl MapView for MapSnapshot {
    fn bounds(&self) -> ViewportBounds {
        mercator::bounds_around(self.center, self.zoom, self.size)
    }

    fn zoom(&self) -> ZoomLevel {
        self.zoom
    }

    fn size(&self) -> ScreenSize {
        self.size
    }
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub enum MapEvent {
    MoveEnd,
    ZoomStart,
    ZoomEnd,
    Resize,
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq)]
pub struct ViewportUpdate {
    pub bounds: ViewportBounds,
    pub zoom: ZoomLevel,
    pub size: ScreenSize,
    pub zoomed_out: bool,
}

#[derive(Debug, Default)]
pub struct ViewportTracker {
    zoom_before_gesture: Option<ZoomLevel>,
    latest: Option<ViewportUpdate>,
}

impl ViewportTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn latest(&self) -> Option<&ViewportUpdate> {
        self.latest.as_ref()
    }

    pub fn on_event(
        &mut self,
        event: MapEvent,
        map: Option<&dyn MapView>,
    ) -> Option<ViewportUpdate> {
        let Some(map) = map else {
            tracing::debug!(?event, "map not mounted, ignoring event");
            return None;
        };

        let zoomed_out = match event {
            MapEvent::ZoomStart => {
                self.zoom_before_gesture = Some(map.zoom());
                return None;
            }
            // a zoom end with no recorded start is treated as not zooming out
            MapEvent::ZoomEnd => self
                .zoom_before_gesture
                .take()
                .is_some_and(|before| map.zoom() < before),
            MapEvent::MoveEnd | MapEvent::Resize => false,
        };

        let update = ViewportUpdate {
            bounds: map.bounds(),
            zoom: map.zoom(),
            size: map.size(),
            zoomed_out,
        };
        self.latest = Some(update);
        Some(update)
    }
}
