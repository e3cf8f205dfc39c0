// Copyright: Kyler Chin <kyler@catenarymaps.org>
// Catenary Transit Initiatives
// Removal of the attribution is not allowed, as covered under the AGPL license

#![deny(
    clippy::mutable_key_type,
    clippy::map_entry,
    clippy::boxed_local,
    clippy::let_unit_value,
    clippy::redundant_allocation,
    clippy::bool_comparison,
    clippy::bind_instead_of_map,
    clippy::vec_box,
    clippy::while_let_loop,
    clippy::useless_asref,
    clippy::repeat_once,
    clippy::deref_addrof,
    clippy::suspicious_map,
    clippy::arc_with_non_send_sync,
    clippy::single_char_pattern,
    clippy::for_kv_map,
    clippy::let_and_return,
    clippy::iter_nth,
    clippy::iter_cloned_collect,
    clippy::bytes_nth,
    clippy::deprecated_clippy_cfg_attr,
    clippy::match_result_ok,
    clippy::cmp_owned,
    clippy::cmp_null,
    clippy::op_ref
)]

//! Core of an incident map: marker projection, viewport tracking, clustering,
//! heatmap binning and the marker selection state that drives the detail drawer.

pub mod clustering;
pub mod config;
pub mod drawer;
pub mod feed;
pub mod heatmap;
pub mod mercator;
pub mod models;
pub mod projection;
pub mod selection;
pub mod session;
pub mod tiles;
pub mod viewport;

pub use clustering::{ClusterAggregator, ClusterClickOutcome, ClusterId, ClusterLayer, ClusterNode};
pub use config::MapConfig;
pub use models::{LatLng, MarkerRecord, MarkerSource};
pub use projection::GeoPoint;
pub use selection::{SelectionMachine, SelectionState};
pub use session::{MapCommand, MapObserver, MapSession, SessionError};
pub use viewport::{MapEvent, MapView, ViewportBounds, ViewportTracker, ZoomLevel};
