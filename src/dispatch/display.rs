use std::sync::{Mutex, MutexGuard, PoisonError};

use serde::Serialize;
use uuid::Uuid;

use crate::utils::geo::Coordinate;

pub const USER_ICON_URL: &str = "https://www.svgrepo.com/show/127575/location-sign.svg";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "kind", content = "cab_id", rename_all = "snake_case")]
pub enum MarkerKey {
    User,
    Cab(Uuid),
    MovingCab(Uuid),
}

/// The map the rider is looking at
pub trait MapDisplay: Send + Sync {
    fn place_marker(&self, key: MarkerKey, at: Coordinate, icon_url: &str, popup: Option<String>);
    fn move_marker(&self, key: MarkerKey, at: Coordinate);
    fn remove_marker(&self, key: MarkerKey);
    /// Dashed line from the booked cab's starting point to the rider
    fn show_route(&self, from: Coordinate, to: Coordinate);
    fn clear_route(&self);
    /// Popup text bound to the rider's own marker
    fn show_status(&self, message: String);
}

#[derive(Debug, Clone, Serialize)]
pub struct MarkerView {
    pub key: MarkerKey,
    pub position: Coordinate,
    pub icon_url: String,
    pub popup: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RouteView {
    pub from: Coordinate,
    pub to: Coordinate,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct BoardSnapshot {
    pub markers: Vec<MarkerView>,
    pub route: Option<RouteView>,
    pub status: Option<String>,
}

/// In-memory map state for one rider, polled by the client
#[derive(Debug, Default)]
pub struct RideBoard {
    state: Mutex<BoardSnapshot>,
}

impl RideBoard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> BoardSnapshot {
        self.lock().clone()
    }

    fn lock(&self) -> MutexGuard<'_, BoardSnapshot> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl MapDisplay for RideBoard {
    fn place_marker(&self, key: MarkerKey, at: Coordinate, icon_url: &str, popup: Option<String>) {
        let mut board = self.lock();
        board.markers.retain(|m| m.key != key);
        board.markers.push(MarkerView {
            key,
            position: at,
            icon_url: icon_url.to_string(),
            popup,
        });
    }

    fn move_marker(&self, key: MarkerKey, at: Coordinate) {
        if let Some(marker) = self.lock().markers.iter_mut().find(|m| m.key == key) {
            marker.position = at;
        }
    }

    fn remove_marker(&self, key: MarkerKey) {
        self.lock().markers.retain(|m| m.key != key);
    }

    fn show_route(&self, from: Coordinate, to: Coordinate) {
        self.lock().route = Some(RouteView { from, to });
    }

    fn clear_route(&self) {
        self.lock().route = None;
    }

    fn show_status(&self, message: String) {
        self.lock().status = Some(message);
    }
}
