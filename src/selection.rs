// Copyright: Kyler Chin <kyler@catenarymaps.org>
// Catenary Transit Initiatives
// Removal of the attribution is not allowed, as covered under the AGPL license

//! Which marker, if any, the detail drawer is showing.
//!
//! | From        | Event             | To          | Transition        |
//! |-------------|-------------------|-------------|-------------------|
//! | Empty       | MarkerClicked(m)  | Selected(m) | `Opened(m)`       |
//! | Selected(x) | MarkerClicked(m)  | Selected(m) | `Swapped` if m≠x  |
//! | Selected(x) | Closed(_)         | Empty       | `Cleared`         |
//! | Selected(x) | ZoomedOut         | Empty       | `Cleared`         |
//! | Empty       | ZoomedOut/Closed  | Empty       | none              |
//! | any         | ClusterClicked    | unchanged   | none              |

use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum SelectionState {
    #[default]
    Empty,
    Selected(String),
}

impl SelectionState {
    pub fn marker_id(&self) -> Option<&str> {
        match self {
            SelectionState::Empty => None,
            SelectionState::Selected(id) => Some(id),
        }
    }
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum CloseReason {
    CloseIcon,
    Backdrop,
    Keyboard,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub enum SelectionEvent {
    MarkerClicked(String),
    ClusterClicked,
    ZoomedOut,
    Closed(CloseReason),
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub enum Transition {
    Opened(String),
    Swapped { previous: String, current: String },
    Cleared { previous: String },
}

#[derive(Debug, Default)]
pub struct SelectionMachine {
    state: SelectionState,
}

impl SelectionMachine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &SelectionState {
        &self.state
    }

    pub fn drawer_open(&self) -> bool {
        self.state != SelectionState::Empty
    }

    /// Applies one event; `None` means the state did not change.
    pub fn apply(&mut self, event: SelectionEvent) -> Option<Transition> {
        let previous = std::mem::take(&mut self.state);
        let (next, transition) = match (previous, event) {
            (SelectionState::Empty, SelectionEvent::MarkerClicked(id)) => (
                SelectionState::Selected(id.clone()),
                Some(Transition::Opened(id)),
            ),
            (SelectionState::Selected(current), SelectionEvent::MarkerClicked(id)) => {
                if current == id {
                    (SelectionState::Selected(current), None)
                } else {
                    (
                        SelectionState::Selected(id.clone()),
                        Some(Transition::Swapped {
                            previous: current,
                            current: id,
                        }),
                    )
                }
            }
            (
                SelectionState::Selected(current),
                SelectionEvent::ZoomedOut | SelectionEvent::Closed(_),
            ) => (
                SelectionState::Empty,
                Some(Transition::Cleared { previous: current }),
            ),
            (state, SelectionEvent::ClusterClicked)
            | (
                state @ SelectionState::Empty,
                SelectionEvent::ZoomedOut | SelectionEvent::Closed(_),
            ) => (state, None),
        };
        self.state = next;
        transition
    }
}
