// Copyright: Kyler Chin <kyler@catenarymaps.org>
// Catenary Transit Initiatives
// Removal of the attribution is not allowed, as covered under the AGPL license

//! Single owner of the map core's state.
//!
//! Every user gesture and map lifecycle event goes through `&mut MapSession`,
//! so selection transitions and cluster recomputes are serialized by
//! construction. Hosts that deliver events from several threads wrap the
//! session in [`coordinator::MapCoordinator`].

pub mod coordinator;

use crate::clustering::{ClusterAggregator, ClusterClickOutcome, ClusterId, ClusterLayer};
use crate::config::MapConfig;
use crate::drawer::DrawerPayload;
use crate::feed::{FeedBatch, FeedError};
use crate::heatmap::{DensitySurface, HeatmapLayer};
use crate::models::MarkerRecord;
use crate::projection::{self, GeoPoint};
use crate::selection::{CloseReason, SelectionEvent, SelectionMachine, SelectionState, Transition};
use crate::tiles::{TileCoord, TileSource};
use crate::viewport::{MapEvent, MapView, ViewportBounds, ViewportTracker, ViewportUpdate, ZoomLevel};
use ahash::AHashMap;
use serde::{Deserialize, Serialize};
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;
use thiserror::Error;

/// Receives the core's outbound events. All methods default to no-ops.
pub trait MapObserver {
    fn on_marker_selected(&mut self, _marker: &MarkerRecord) {}
    fn on_selection_cleared(&mut self) {}
    fn on_viewport_changed(&mut self, _bounds: &ViewportBounds) {}
}

/// Instructions for the host map widget.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub enum MapCommand {
    FitBounds(ViewportBounds),
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SessionError {
    #[error("no marker with id {0}")]
    UnknownMarker(String),
    #[error("cluster {0:?} is not part of the current layer")]
    StaleCluster(ClusterId),
    #[error("map is not mounted")]
    MapNotMounted,
}

pub struct MapSession {
    config: MapConfig,
    markers: Vec<Arc<MarkerRecord>>,
    index: AHashMap<String, usize>,
    tracker: ViewportTracker,
    aggregator: ClusterAggregator,
    layer: ClusterLayer,
    layer_generation: u64,
    heatmap: HeatmapLayer,
    tiles: TileSource,
    selection: SelectionMachine,
    selected: Option<Arc<MarkerRecord>>,
    data_source_failed: bool,
    observers: Vec<Box<dyn MapObserver + Send>>,
}

impl MapSession {
    pub fn new(config: MapConfig) -> Self {
        Self {
            markers: Vec::new(),
            index: AHashMap::new(),
            tracker: ViewportTracker::new(),
            aggregator: ClusterAggregator::from_config(&config),
            layer: ClusterLayer::empty(config.zoom),
            layer_generation: 0,
            heatmap: HeatmapLayer::from_config(&config),
            tiles: TileSource::new(config.tile_url.clone()),
            selection: SelectionMachine::new(),
            selected: None,
            data_source_failed: false,
            observers: Vec::new(),
            config,
        }
    }

    pub fn config(&self) -> &MapConfig {
        &self.config
    }

    pub fn add_observer(&mut self, observer: impl MapObserver + Send + 'static) {
        self.observers.push(Box::new(observer));
    }

    /// Replaces the marker set. Returns the refit the heatmap asks for, if any.
    pub fn set_markers(&mut self, markers: Vec<MarkerRecord>) -> Vec<MapCommand> {
        let mut kept = Vec::with_capacity(markers.len());
        let mut index = AHashMap::with_capacity(markers.len());
        for marker in markers {
            if !marker.location.is_valid() {
                tracing::debug!(id = %marker.id, "dropping marker without usable coordinates");
                continue;
            }
            if index.contains_key(&marker.id) {
                tracing::warn!(id = %marker.id, "dropping duplicate marker id");
                continue;
            }
            index.insert(marker.id.clone(), kept.len());
            kept.push(Arc::new(marker));
        }

        self.markers = kept;
        self.index = index;
        self.data_source_failed = false;
        self.recluster(self.current_zoom());

        let points = projection::project_with_intensity(&self.markers, self.config.heat_intensity);
        tracing::info!(markers = self.markers.len(), "marker set replaced");

        self.heatmap
            .set_points(points)
            .map(MapCommand::FitBounds)
            .into_iter()
            .collect()
    }

    /// Feeds the outcome of a data fetch. A failed fetch leaves an empty map
    /// and raises [`MapSession::data_source_failed`]; retrying is up to the caller.
    pub fn set_feed_result(&mut self, result: Result<FeedBatch, FeedError>) -> Vec<MapCommand> {
        match result {
            Ok(batch) => self.set_markers(batch.markers),
            Err(err) => {
                tracing::warn!(%err, "incident feed unavailable");
                let commands = self.set_markers(Vec::new());
                self.data_source_failed = true;
                commands
            }
        }
    }

    #[tracing::instrument(skip(self, map))]
    pub fn handle_map_event(
        &mut self,
        event: MapEvent,
        map: Option<&dyn MapView>,
    ) -> Option<ViewportUpdate> {
        let update = self.tracker.on_event(event, map)?;

        if update.zoomed_out {
            self.apply_selection(SelectionEvent::ZoomedOut);
        }

        if matches!(event, MapEvent::ZoomEnd | MapEvent::Resize) || update.zoom != self.layer.zoom
        {
            self.recluster(update.zoom);
        }

        let bounds = update.bounds;
        self.notify(|observer| observer.on_viewport_changed(&bounds));
        Some(update)
    }

    /// Click on a standalone (or spiderfied) marker.
    pub fn click_marker(&mut self, marker_id: &str) -> Option<Transition> {
        self.try_click_marker(marker_id).unwrap_or_else(|err| {
            tracing::warn!(%err, "ignoring marker click");
            None
        })
    }

    #[tracing::instrument(skip(self))]
    pub fn try_click_marker(&mut self, marker_id: &str) -> Result<Option<Transition>, SessionError> {
        if !self.index.contains_key(marker_id) {
            return Err(SessionError::UnknownMarker(marker_id.to_string()));
        }
        Ok(self.apply_selection(SelectionEvent::MarkerClicked(marker_id.to_string())))
    }

    pub fn click_cluster(
        &mut self,
        id: ClusterId,
        map: Option<&dyn MapView>,
    ) -> Option<ClusterClickOutcome> {
        self.try_click_cluster(id, map)
            .map_err(|err| tracing::warn!(%err, "ignoring cluster click"))
            .ok()
    }

    /// Map navigation only: the selection is left as it is.
    #[tracing::instrument(skip(self, map))]
    pub fn try_click_cluster(
        &mut self,
        id: ClusterId,
        map: Option<&dyn MapView>,
    ) -> Result<ClusterClickOutcome, SessionError> {
        self.apply_selection(SelectionEvent::ClusterClicked);

        let screen = map
            .map(|m| m.size())
            .or_else(|| self.tracker.latest().map(|u| u.size))
            .ok_or(SessionError::MapNotMounted)?;

        self.aggregator
            .on_cluster_click(&self.layer, id, screen)
            .ok_or(SessionError::StaleCluster(id))
    }

    pub fn close_drawer(&mut self, reason: CloseReason) -> Option<Transition> {
        self.apply_selection(SelectionEvent::Closed(reason))
    }

    pub fn selection(&self) -> &SelectionState {
        self.selection.state()
    }

    pub fn drawer_open(&self) -> bool {
        self.selection.drawer_open()
    }

    pub fn selected_marker(&self) -> Option<&MarkerRecord> {
        self.selected.as_deref()
    }

    pub fn drawer(&self) -> Option<DrawerPayload> {
        self.selected_marker().map(DrawerPayload::from_marker)
    }

    pub fn markers(&self) -> &[Arc<MarkerRecord>] {
        &self.markers
    }

    pub fn marker(&self, id: &str) -> Option<&Arc<MarkerRecord>> {
        self.index.get(id).and_then(|&i| self.markers.get(i))
    }

    pub fn points(&self) -> &[GeoPoint] {
        self.heatmap.points()
    }

    pub fn cluster_layer(&self) -> &ClusterLayer {
        &self.layer
    }

    pub fn viewport(&self) -> Option<&ViewportUpdate> {
        self.tracker.latest()
    }

    pub fn data_source_failed(&self) -> bool {
        self.data_source_failed
    }

    pub fn heatmap_surface(&self, map: &dyn MapView) -> DensitySurface {
        self.heatmap.render(map)
    }

    pub fn visible_tiles(&self, map: &dyn MapView) -> Vec<(TileCoord, String)> {
        self.tiles
            .visible_tiles(&map.bounds(), map.zoom())
            .into_iter()
            .map(|tile| (tile, self.tiles.tile_url(tile)))
            .collect()
    }

    fn current_zoom(&self) -> ZoomLevel {
        self.tracker
            .latest()
            .map(|update| update.zoom)
            .unwrap_or(self.config.zoom)
    }

    // last write wins: a newer partition simply replaces the older one
    fn recluster(&mut self, zoom: ZoomLevel) {
        self.layer_generation += 1;
        self.layer = self
            .aggregator
            .partition(&self.markers, zoom)
            .with_generation(self.layer_generation);
    }

    fn apply_selection(&mut self, event: SelectionEvent) -> Option<Transition> {
        let transition = self.selection.apply(event)?;
        match &transition {
            Transition::Opened(id) | Transition::Swapped { current: id, .. } => {
                let marker = self.marker(id).cloned();
                self.selected = marker.clone();
                if let Some(marker) = marker {
                    tracing::info!(id = %marker.id, "marker selected");
                    self.notify(|observer| observer.on_marker_selected(&marker));
                }
            }
            Transition::Cleared { previous } => {
                tracing::info!(id = %previous, "selection cleared");
                self.selected = None;
                self.notify(|observer| observer.on_selection_cleared());
            }
        }
        Some(transition)
    }

    // a panicking observer must not stop later events from being handled
    fn notify(&mut self, mut deliver: impl FnMut(&mut dyn MapObserver)) {
        for observer in self.observers.iter_mut() {
            let observer: &mut dyn MapObserver = observer.as_mut();
            if catch_unwind(AssertUnwindSafe(|| deliver(observer))).is_err() {
                tracing::error!("map observer panicked while handling an event");
            }
        }
    }
}
