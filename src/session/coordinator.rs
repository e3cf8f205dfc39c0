// Copyright: Kyler Chin <kyler@catenarymaps.org>
// Catenary Transit Initiatives
// Removal of the attribution is not allowed, as covered under the AGPL license

use super::{MapCommand, MapObserver, MapSession};
use crate::clustering::{ClusterClickOutcome, ClusterId, ClusterLayer};
use crate::drawer::DrawerPayload;
use crate::feed::{FeedBatch, FeedError};
use crate::models::MarkerRecord;
use crate::selection::{CloseReason, SelectionState, Transition};
use crate::viewport::{MapEvent, MapSnapshot, MapView, ViewportBounds, ViewportUpdate};
use actix::prelude::*;
use std::sync::Arc;

// Messages

#[derive(Message, Clone, Debug)]
#[rtype(result = "()")]
pub enum MapNotification {
    MarkerSelected(Arc<MarkerRecord>),
    SelectionCleared,
    ViewportChanged(ViewportBounds),
}

#[derive(Message)]
#[rtype(result = "()")]
pub struct Subscribe {
    pub recipient: Recipient<MapNotification>,
}

#[derive(Message)]
#[rtype(result = "Vec<MapCommand>")]
pub struct SetMarkers(pub Vec<MarkerRecord>);

#[derive(Message)]
#[rtype(result = "Vec<MapCommand>")]
pub struct FeedLoaded(pub Result<FeedBatch, FeedError>);

#[derive(Message)]
#[rtype(result = "Option<ViewportUpdate>")]
pub struct MapEventMsg {
    pub event: MapEvent,
    pub map: Option<MapSnapshot>,
}

#[derive(Message)]
#[rtype(result = "Option<Transition>")]
pub struct MarkerClick(pub String);

#[derive(Message)]
#[rtype(result = "Option<ClusterClickOutcome>")]
pub struct ClusterClick {
    pub id: ClusterId,
    pub map: Option<MapSnapshot>,
}

#[derive(Message)]
#[rtype(result = "Option<Transition>")]
pub struct CloseDrawer(pub CloseReason);

#[derive(Message)]
#[rtype(result = "SelectionState")]
pub struct GetSelection;

#[derive(Message)]
#[rtype(result = "Option<DrawerPayload>")]
pub struct GetDrawer;

#[derive(Message)]
#[rtype(result = "ClusterLayer")]
pub struct GetClusterLayer;

struct RecipientObserver {
    recipient: Recipient<MapNotification>,
}

impl MapObserver for RecipientObserver {
    fn on_marker_selected(&mut self, marker: &MarkerRecord) {
        self.recipient
            .do_send(MapNotification::MarkerSelected(Arc::new(marker.clone())));
    }

    fn on_selection_cleared(&mut self) {
        self.recipient.do_send(MapNotification::SelectionCleared);
    }

    fn on_viewport_changed(&mut self, bounds: &ViewportBounds) {
        self.recipient.do_send(MapNotification::ViewportChanged(*bounds));
    }
}

// Coordinator Actor

/// Mailbox in front of a [`MapSession`]. Messages are handled one at a time,
/// so events from any number of senders reach the session in arrival order.
pub struct MapCoordinator {
    session: MapSession,
}

impl MapCoordinator {
    pub fn new(session: MapSession) -> Self {
        Self { session }
    }
}

fn as_view(map: &Option<MapSnapshot>) -> Option<&dyn MapView> {
    map.as_ref().map(|snapshot| snapshot as &dyn MapView)
}

impl Actor for MapCoordinator {
    type Context = Context<Self>;

    fn started(&mut self, _ctx: &mut Self::Context) {
        tracing::info!(
            markers = self.session.markers().len(),
            "map coordinator started"
        );
    }
}

impl Handler<Subscribe> for MapCoordinator {
    type Result = ();

    fn handle(&mut self, msg: Subscribe, _: &mut Self::Context) {
        let recipient = msg.recipient;

        // late subscribers see the current selection straight away
        if let Some(marker) = self.session.selected_marker() {
            recipient.do_send(MapNotification::MarkerSelected(Arc::new(marker.clone())));
        }
        self.session.add_observer(RecipientObserver { recipient });
    }
}

impl Handler<SetMarkers> for MapCoordinator {
    type Result = MessageResult<SetMarkers>;

    fn handle(&mut self, msg: SetMarkers, _: &mut Self::Context) -> Self::Result {
        MessageResult(self.session.set_markers(msg.0))
    }
}

impl Handler<FeedLoaded> for MapCoordinator {
    type Result = MessageResult<FeedLoaded>;

    fn handle(&mut self, msg: FeedLoaded, _: &mut Self::Context) -> Self::Result {
        MessageResult(self.session.set_feed_result(msg.0))
    }
}

impl Handler<MapEventMsg> for MapCoordinator {
    type Result = MessageResult<MapEventMsg>;

    fn handle(&mut self, msg: MapEventMsg, _: &mut Self::Context) -> Self::Result {
        MessageResult(self.session.handle_map_event(msg.event, as_view(&msg.map)))
    }
}

impl Handler<MarkerClick> for MapCoordinator {
    type Result = MessageResult<MarkerClick>;

    fn handle(&mut self, msg: MarkerClick, _: &mut Self::Context) -> Self::Result {
        MessageResult(self.session.click_marker(&msg.0))
    }
}

impl Handler<ClusterClick> for MapCoordinator {
    type Result = MessageResult<ClusterClick>;

    fn handle(&mut self, msg: ClusterClick, _: &mut Self::Context) -> Self::Result {
        MessageResult(self.session.click_cluster(msg.id, as_view(&msg.map)))
    }
}

impl Handler<CloseDrawer> for MapCoordinator {
    type Result = MessageResult<CloseDrawer>;

    fn handle(&mut self, msg: CloseDrawer, _: &mut Self::Context) -> Self::Result {
        MessageResult(self.session.close_drawer(msg.0))
    }
}

impl Handler<GetSelection> for MapCoordinator {
    type Result = MessageResult<GetSelection>;

    fn handle(&mut self, _: GetSelection, _: &mut Self::Context) -> Self::Result {
        MessageResult(self.session.selection().clone())
    }
}

impl Handler<GetDrawer> for MapCoordinator {
    type Result = MessageResult<GetDrawer>;

    fn handle(&mut self, _: GetDrawer, _: &mut Self::Context) -> Self::Result {
        MessageResult(self.session.drawer())
    }
}

impl Handler<GetClusterLayer> for MapCoordinator {
    type Result = MessageResult<GetClusterLayer>;

    fn handle(&mut self, _: GetClusterLayer, _: &mut Self::Context) -> Self::Result {
        MessageResult(self.session.cluster_layer().clone())
    }
}
