use std::collections::HashMap;
use std::sync::Arc;

use serde::Serialize;
use tokio::sync::{Mutex, RwLock};
use uuid::Uuid;

use crate::dispatch::cabs::Cab;
use crate::dispatch::display::{BoardSnapshot, RideBoard};
use crate::dispatch::error::DispatchError;
use crate::dispatch::session::{DispatchSettings, RideSession, SessionView};
use crate::utils::geo::Coordinate;

/// A rider's session together with the board it draws on
pub struct RiderSlot {
    pub session: RideSession,
    pub board: Arc<RideBoard>,
}

impl RiderSlot {
    pub fn open(location: Coordinate, settings: &DispatchSettings) -> Self {
        let board = Arc::new(RideBoard::new());
        let session = RideSession::open(location, settings, board.clone(), &mut rand::thread_rng());
        Self { session, board }
    }

    pub fn with_cabs(location: Coordinate, cabs: Vec<Cab>, settings: &DispatchSettings) -> Self {
        let board = Arc::new(RideBoard::new());
        let session = RideSession::with_cabs(location, cabs, settings, board.clone());
        Self { session, board }
    }

    pub fn view(&self) -> RideView {
        RideView {
            session: self.session.view(),
            board: self.board.snapshot(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RideView {
    #[serde(flatten)]
    pub session: SessionView,
    pub board: BoardSnapshot,
}

/// Live ride sessions keyed by rider. Each rider has their own lock, so one
/// rider's operations run one at a time without blocking anybody else.
pub struct RideRegistry {
    settings: DispatchSettings,
    riders: RwLock<HashMap<Uuid, Arc<Mutex<RiderSlot>>>>,
}

impl RideRegistry {
    pub fn new(settings: DispatchSettings) -> Self {
        Self {
            settings,
            riders: RwLock::new(HashMap::new()),
        }
    }

    /// Start a session for the rider, or move the existing one
    pub async fn open(&self, rider: Uuid, location: Coordinate) -> RideView {
        let existing = self.riders.read().await.get(&rider).cloned();

        if let Some(slot) = existing {
            let mut slot = slot.lock().await;
            slot.session.relocate(location, &mut rand::thread_rng());
            tracing::info!(%rider, lat = location.lat, lng = location.lng, "Ride session relocated");
            return slot.view();
        }

        let slot = RiderSlot::open(location, &self.settings);
        let view = slot.view();
        self.insert(rider, slot).await;
        tracing::info!(%rider, lat = location.lat, lng = location.lng, "Ride session opened");
        view
    }

    pub async fn insert(&self, rider: Uuid, slot: RiderSlot) {
        let previous = self
            .riders
            .write()
            .await
            .insert(rider, Arc::new(Mutex::new(slot)));

        if let Some(previous) = previous {
            previous.lock().await.session.close();
        }
    }

    pub async fn rider(&self, rider: Uuid) -> Result<Arc<Mutex<RiderSlot>>, DispatchError> {
        self.riders
            .read()
            .await
            .get(&rider)
            .cloned()
            .ok_or(DispatchError::NoActiveSession)
    }

    pub async fn view(&self, rider: Uuid) -> Result<RideView, DispatchError> {
        let slot = self.rider(rider).await?;
        let view = slot.lock().await.view();
        Ok(view)
    }

    pub async fn close(&self, rider: Uuid) -> Result<(), DispatchError> {
        let slot = self
            .riders
            .write()
            .await
            .remove(&rider)
            .ok_or(DispatchError::NoActiveSession)?;

        slot.lock().await.session.close();
        tracing::info!(%rider, "Ride session closed");
        Ok(())
    }
}
