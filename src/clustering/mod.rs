// Copyright: Kyler Chin <kyler@catenarymaps.org>
// Catenary Transit Initiatives
// Removal of the attribution is not allowed, as covered under the AGPL license

pub mod spiderfy;

use crate::config::MapConfig;
use crate::mercator;
use crate::models::{LatLng, MarkerRecord};
use crate::viewport::{ScreenSize, ViewportBounds, ZoomLevel};
use geo::Centroid;
use geo_types::MultiPoint;
use rstar::RTree;
use rstar::primitives::GeomWithData;
use serde::{Deserialize, Serialize};
use spiderfy::SpiderLeg;
use std::borrow::Borrow;
use std::collections::BTreeSet;

/// Identifies a cluster within one computed layer. `generation` changes on
/// every recompute, so ids never carry over to a later layer at the same zoom.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct ClusterId {
    pub generation: u64,
    pub zoom: ZoomLevel,
    pub index: usize,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ClusterNode {
    pub id: ClusterId,
    pub bounds: ViewportBounds,
    pub center: LatLng,
    pub child_marker_ids: BTreeSet<String>,
}

impl ClusterNode {
    pub fn len(&self) -> usize {
        self.child_marker_ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.child_marker_ids.is_empty()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Placement {
    Standalone,
    Clustered(ClusterId),
}

/// Partition of the marker set at one zoom level.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ClusterLayer {
    pub generation: u64,
    pub zoom: ZoomLevel,
    pub clusters: Vec<ClusterNode>,
    pub standalone: Vec<String>,
}

impl ClusterLayer {
    pub fn empty(zoom: ZoomLevel) -> Self {
        Self {
            generation: 0,
            zoom,
            clusters: Vec::new(),
            standalone: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.clusters.is_empty() && self.standalone.is_empty()
    }

    /// Restamps the layer and every cluster id it hands out.
    pub fn with_generation(mut self, generation: u64) -> Self {
        self.generation = generation;
        for node in &mut self.clusters {
            node.id.generation = generation;
        }
        self
    }

    pub fn marker_count(&self) -> usize {
        self.standalone.len() + self.clusters.iter().map(ClusterNode::len).sum::<usize>()
    }

    /// `None` for ids handed out by any other layer.
    pub fn cluster(&self, id: ClusterId) -> Option<&ClusterNode> {
        if id.zoom != self.zoom || id.generation != self.generation {
            return None;
        }
        self.clusters.get(id.index).filter(|node| node.id == id)
    }

    pub fn placement(&self, marker_id: &str) -> Option<Placement> {
        if self.standalone.iter().any(|id| id == marker_id) {
            return Some(Placement::Standalone);
        }
        self.clusters
            .iter()
            .find(|node| node.child_marker_ids.contains(marker_id))
            .map(|node| Placement::Clustered(node.id))
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub enum ClusterClickOutcome {
    /// Move the map so the cluster's envelope fills the screen.
    ZoomToBounds {
        bounds: ViewportBounds,
        zoom: ZoomLevel,
    },
    /// Fan the children out around the cluster without changing zoom.
    Spiderfy {
        cluster: ClusterId,
        legs: Vec<SpiderLeg>,
    },
}

#[derive(Clone, Debug, PartialEq)]
pub struct ClusterAggregator {
    pub radius_px: f64,
    pub min_zoom: ZoomLevel,
    pub max_zoom: ZoomLevel,
    pub disable_clustering_at_zoom: Option<ZoomLevel>,
    pub spiderfy_distance_multiplier: f64,
}

impl ClusterAggregator {
    pub fn from_config(config: &MapConfig) -> Self {
        Self {
            radius_px: config.cluster_radius_px,
            min_zoom: config.min_zoom,
            max_zoom: config.max_zoom,
            disable_clustering_at_zoom: config.disable_clustering_at_zoom,
            spiderfy_distance_multiplier: config.spiderfy_distance_multiplier,
        }
    }

    fn clustering_enabled(&self, zoom: ZoomLevel) -> bool {
        self.radius_px > 0.0
            && self
                .disable_clustering_at_zoom
                .is_none_or(|disabled_from| zoom < disabled_from)
    }

    /// Greedy seed sweep: each unassigned marker, in input order, claims every
    /// other unassigned marker within `radius_px` of it at `zoom`.
    pub fn partition<M: Borrow<MarkerRecord>>(&self, markers: &[M], zoom: ZoomLevel) -> ClusterLayer {
        let markers: Vec<&MarkerRecord> = markers
            .iter()
            .map(<M as Borrow<MarkerRecord>>::borrow)
            .filter(|marker| marker.location.is_valid())
            .collect();

        let mut layer = ClusterLayer::empty(zoom);

        if !self.clustering_enabled(zoom) {
            layer.standalone = markers.iter().map(|m| m.id.clone()).collect();
            return layer;
        }

        let pixels: Vec<[f64; 2]> = markers
            .iter()
            .map(|marker| {
                let p = mercator::project(marker.location, zoom);
                [p.x, p.y]
            })
            .collect();

        let tree = RTree::bulk_load(
            pixels
                .iter()
                .enumerate()
                .map(|(i, p)| GeomWithData::new(*p, i))
                .collect(),
        );

        let max_squared_radius = self.radius_px * self.radius_px;
        let mut assigned = vec![false; markers.len()];

        for seed in 0..markers.len() {
            if assigned[seed] {
                continue;
            }
            assigned[seed] = true;

            let mut members = vec![seed];
            for neighbour in tree.locate_within_distance(pixels[seed], max_squared_radius) {
                let j = neighbour.data;
                if !assigned[j] {
                    assigned[j] = true;
                    members.push(j);
                }
            }

            if members.len() == 1 {
                layer.standalone.push(markers[seed].id.clone());
                continue;
            }

            members.sort_unstable();
            let locations: Vec<LatLng> = members.iter().map(|&i| markers[i].location).collect();
            let Some(bounds) = ViewportBounds::enclosing(locations.iter().copied()) else {
                continue;
            };
            let center = MultiPoint::from(
                locations
                    .iter()
                    .map(|l| l.to_point())
                    .collect::<Vec<_>>(),
            )
            .centroid()
            .map(LatLng::from_point)
            .unwrap_or_else(|| bounds.center());

            layer.clusters.push(ClusterNode {
                id: ClusterId {
                    generation: layer.generation,
                    zoom,
                    index: layer.clusters.len(),
                },
                bounds,
                center,
                child_marker_ids: members.iter().map(|&i| markers[i].id.clone()).collect(),
            });
        }

        tracing::debug!(
            zoom,
            clusters = layer.clusters.len(),
            standalone = layer.standalone.len(),
            "partitioned markers"
        );

        layer
    }

    /// Navigation response to a cluster click. Never touches selection.
    pub fn on_cluster_click(
        &self,
        layer: &ClusterLayer,
        id: ClusterId,
        screen: ScreenSize,
    ) -> Option<ClusterClickOutcome> {
        let Some(node) = layer.cluster(id) else {
            tracing::debug!(?id, layer_zoom = layer.zoom, "cluster is not in this layer");
            return None;
        };

        if layer.zoom >= self.max_zoom || node.bounds.is_point() {
            let ids: Vec<String> = node.child_marker_ids.iter().cloned().collect();
            return Some(ClusterClickOutcome::Spiderfy {
                cluster: id,
                legs: spiderfy::spiderfy(
                    &ids,
                    node.center,
                    layer.zoom,
                    self.spiderfy_distance_multiplier,
                ),
            });
        }

        let fitted = mercator::bounds_zoom(&node.bounds, screen, self.min_zoom, self.max_zoom);
        // always descend at least one level so repeated clicks make progress
        let zoom = fitted.max(layer.zoom + 1).min(self.max_zoom);

        Some(ClusterClickOutcome::ZoomToBounds {
            bounds: node.bounds,
            zoom,
        })
    }
}
