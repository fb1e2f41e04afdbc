use std::sync::Arc;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::dispatch::animator::{AnimationSnapshot, AnimationTiming, BookingAnimator};
use crate::dispatch::cabs::{Cab, DEFAULT_CAB_COUNT, generate_cabs};
use crate::dispatch::display::{MapDisplay, MarkerKey, USER_ICON_URL};
use crate::dispatch::error::DispatchError;
use crate::dispatch::tier::CabTier;
use crate::utils::geo::Coordinate;

#[derive(Debug, Clone, Copy)]
pub struct DispatchSettings {
    pub cabs_per_session: usize,
    pub timing: AnimationTiming,
}

impl Default for DispatchSettings {
    fn default() -> Self {
        Self {
            cabs_per_session: DEFAULT_CAB_COUNT,
            timing: AnimationTiming::default(),
        }
    }
}

/// What the rider reported from their device
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GeolocationReport {
    pub coords: Option<Coordinate>,
    pub error: Option<String>,
}

impl GeolocationReport {
    pub fn into_location(self) -> Result<Coordinate, DispatchError> {
        if let Some(reason) = self.error {
            return Err(DispatchError::GeolocationUnavailable(reason));
        }

        let coords = self.coords.ok_or_else(|| {
            DispatchError::GeolocationUnavailable("no position reported".to_string())
        })?;

        Coordinate::checked(coords.lat, coords.lng).ok_or(DispatchError::InvalidCoordinate {
            lat: coords.lat,
            lng: coords.lng,
        })
    }
}

/// One rider's simulation: where they are, the cabs around them and the
/// cab currently on its way
pub struct RideSession {
    user_location: Coordinate,
    cabs: Vec<Cab>,
    cabs_per_session: usize,
    display: Arc<dyn MapDisplay>,
    animator: BookingAnimator,
}

#[derive(Debug, Clone, Serialize)]
pub struct SessionView {
    pub user_location: Coordinate,
    pub cabs: Vec<Cab>,
    pub animation: Option<AnimationSnapshot>,
}

impl RideSession {
    pub fn open<R: Rng + ?Sized>(
        location: Coordinate,
        settings: &DispatchSettings,
        display: Arc<dyn MapDisplay>,
        rng: &mut R,
    ) -> Self {
        let cabs = generate_cabs(location, settings.cabs_per_session, rng);
        Self::with_cabs(location, cabs, settings, display)
    }

    /// Open a session around an already chosen set of cabs
    pub fn with_cabs(
        location: Coordinate,
        cabs: Vec<Cab>,
        settings: &DispatchSettings,
        display: Arc<dyn MapDisplay>,
    ) -> Self {
        let animator = BookingAnimator::new(settings.timing, Arc::clone(&display));
        let session = Self {
            user_location: location,
            cabs,
            cabs_per_session: settings.cabs_per_session,
            display,
            animator,
        };

        session.show_user();
        session.show_cabs();
        session
    }

    /// The rider moved: tear down any running animation and scatter fresh cabs
    pub fn relocate<R: Rng + ?Sized>(&mut self, location: Coordinate, rng: &mut R) {
        self.animator.supersede();
        self.hide_cabs();

        self.user_location = location;
        self.cabs = generate_cabs(location, self.cabs_per_session, rng);

        self.show_user();
        self.show_cabs();
    }

    pub fn user_location(&self) -> Coordinate {
        self.user_location
    }

    /// First generated cab of the requested tier
    pub fn find_cab(&self, tier: CabTier) -> Result<Cab, DispatchError> {
        self.cabs()
            .into_iter()
            .find(|cab| cab.tier == tier)
            .ok_or(DispatchError::NoAvailableCab(tier))
    }

    /// Send `cab` toward the rider. While it is on its way the board shows
    /// it only as the moving marker.
    pub fn dispatch(&mut self, cab: Cab) -> AnimationSnapshot {
        self.park_booked_cab();
        self.display.remove_marker(MarkerKey::Cab(cab.id));
        self.animator.start(cab, self.user_location)
    }

    /// Write the previously booked cab back into the fleet where it
    /// currently is and give it its regular marker again
    fn park_booked_cab(&mut self) {
        let Some(live) = self.animator.current_cab() else {
            return;
        };

        if let Some(cab) = self.cabs.iter_mut().find(|cab| cab.id == live.id) {
            *cab = live;
            self.display.place_marker(
                MarkerKey::Cab(cab.id),
                cab.position,
                cab.tier.icon_url(),
                Some(cab.popup()),
            );
        }
    }

    /// Generated cabs, with the booked one at its live position
    pub fn cabs(&self) -> Vec<Cab> {
        let moving = self.animator.current_cab();
        self.cabs
            .iter()
            .map(|cab| match &moving {
                Some(live) if live.id == cab.id => live.clone(),
                _ => cab.clone(),
            })
            .collect()
    }

    pub fn animation(&self) -> Option<AnimationSnapshot> {
        self.animator.snapshot()
    }

    pub fn view(&self) -> SessionView {
        SessionView {
            user_location: self.user_location,
            cabs: self.cabs(),
            animation: self.animation(),
        }
    }

    /// Stop everything this session put on the map
    pub fn close(&mut self) {
        self.animator.supersede();
        self.hide_cabs();
        self.display.remove_marker(MarkerKey::User);
    }

    fn show_user(&self) {
        self.display.place_marker(
            MarkerKey::User,
            self.user_location,
            USER_ICON_URL,
            Some("You are here".to_string()),
        );
    }

    fn show_cabs(&self) {
        for cab in &self.cabs {
            self.display
                .place_marker(MarkerKey::Cab(cab.id), cab.position, cab.tier.icon_url(), Some(cab.popup()));
        }
    }

    fn hide_cabs(&self) {
        for cab in &self.cabs {
            self.display.remove_marker(MarkerKey::Cab(cab.id));
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::*;
    use crate::dispatch::animator::AnimationState;
    use crate::dispatch::display::RideBoard;

    fn point(lat: f64, lng: f64) -> Coordinate {
        Coordinate::checked(lat, lng).unwrap()
    }

    fn settings() -> DispatchSettings {
        DispatchSettings {
            cabs_per_session: 5,
            timing: AnimationTiming {
                tick: Duration::from_secs(1),
                max_arrival: Duration::from_secs(600),
                cab_speed_kmh: 36.0,
            },
        }
    }

    #[test]
    fn test_geolocation_errors_are_surfaced() {
        let denied = GeolocationReport {
            coords: None,
            error: Some("User denied Geolocation".to_string()),
        };
        assert!(matches!(
            denied.into_location(),
            Err(DispatchError::GeolocationUnavailable(_))
        ));

        assert!(matches!(
            GeolocationReport::default().into_location(),
            Err(DispatchError::GeolocationUnavailable(_))
        ));

        let bogus = GeolocationReport {
            coords: Some(Coordinate { lat: 120.0, lng: 0.0 }),
            error: None,
        };
        assert!(matches!(
            bogus.into_location(),
            Err(DispatchError::InvalidCoordinate { .. })
        ));
    }

    #[test]
    fn test_open_puts_rider_and_cabs_on_board() {
        let board = Arc::new(RideBoard::new());
        let mut rng = StdRng::seed_from_u64(1);

        let session = RideSession::open(point(19.07, 72.87), &settings(), board.clone(), &mut rng);

        let snapshot = board.snapshot();
        assert_eq!(session.cabs().len(), 5);
        assert_eq!(snapshot.markers.len(), 6);
        assert!(
            snapshot
                .markers
                .iter()
                .any(|m| m.key == MarkerKey::User && m.popup.as_deref() == Some("You are here"))
        );
    }

    #[test]
    fn test_find_cab_by_tier() {
        let board = Arc::new(RideBoard::new());
        let rider = point(0.0, 0.0);
        let cabs = vec![
            Cab::new(point(0.001, 0.0), CabTier::Standard),
            Cab::new(point(0.002, 0.0), CabTier::Premium),
            Cab::new(point(0.003, 0.0), CabTier::Premium),
        ];
        let expected = cabs[1].id;

        let session = RideSession::with_cabs(rider, cabs, &settings(), board);

        assert_eq!(session.find_cab(CabTier::Premium).unwrap().id, expected);
        assert!(matches!(
            session.find_cab(CabTier::Luxury),
            Err(DispatchError::NoAvailableCab(CabTier::Luxury))
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_dispatched_cab_moves_in_listing() {
        let board = Arc::new(RideBoard::new());
        let rider = point(0.0, 0.0);
        let cab = Cab::new(point(0.002, 0.0), CabTier::Standard);
        let start = cab.position;
        let mut session = RideSession::with_cabs(rider, vec![cab.clone()], &settings(), board);

        session.dispatch(cab);
        tokio::time::sleep(Duration::from_millis(1500)).await;

        let listed = &session.cabs()[0];
        assert!(listed.position.lat < start.lat);
        assert_eq!(session.animation().unwrap().state, AnimationState::Moving);
    }

    #[tokio::test(start_paused = true)]
    async fn test_board_never_shows_booked_cab_twice() {
        let board = Arc::new(RideBoard::new());
        let rider = point(0.0, 0.0);
        let first = Cab::new(point(0.004, 0.0), CabTier::Standard);
        let second = Cab::new(point(0.0, 0.004), CabTier::Premium);
        let mut session = RideSession::with_cabs(
            rider,
            vec![first.clone(), second.clone()],
            &settings(),
            board.clone(),
        );

        session.dispatch(first.clone());
        tokio::time::sleep(Duration::from_millis(2500)).await;

        let snapshot = board.snapshot();
        let listed = session.cabs()[0].clone();
        let moving = snapshot
            .markers
            .iter()
            .find(|m| m.key == MarkerKey::MovingCab(first.id))
            .unwrap();
        assert!(snapshot.markers.iter().all(|m| m.key != MarkerKey::Cab(first.id)));
        assert_eq!(moving.position, listed.position);
        assert_eq!(snapshot.route.unwrap().from, first.position);

        // the first cab stays where it was stopped once another is booked
        session.dispatch(second.clone());
        let snapshot = board.snapshot();
        let parked = snapshot
            .markers
            .iter()
            .find(|m| m.key == MarkerKey::Cab(first.id))
            .unwrap();
        assert_eq!(parked.position, listed.position);
        assert_eq!(session.cabs()[0].position, listed.position);
        assert!(snapshot.markers.iter().all(|m| m.key != MarkerKey::Cab(second.id)));
        assert!(snapshot.markers.iter().all(|m| m.key != MarkerKey::MovingCab(first.id)));
        assert_eq!(snapshot.route.unwrap().from, second.position);
    }

    #[tokio::test(start_paused = true)]
    async fn test_relocate_supersedes_animation_and_regenerates() {
        let board = Arc::new(RideBoard::new());
        let mut rng = StdRng::seed_from_u64(9);
        let mut session = RideSession::open(point(0.0, 0.0), &settings(), board.clone(), &mut rng);
        let old_ids: Vec<_> = session.cabs().iter().map(|c| c.id).collect();

        let cab = session.cabs()[0].clone();
        session.dispatch(cab);
        session.relocate(point(10.0, 10.0), &mut rng);

        assert!(session.animation().is_none());
        assert_eq!(session.user_location(), point(10.0, 10.0));
        assert!(session.cabs().iter().all(|c| !old_ids.contains(&c.id)));

        let snapshot = board.snapshot();
        // rider plus the new cabs, nothing left over from the old layout
        assert_eq!(snapshot.markers.len(), 6);
        assert!(
            snapshot
                .markers
                .iter()
                .all(|m| !matches!(m.key, MarkerKey::MovingCab(_)))
        );
        assert!(snapshot.route.is_none());
    }
}
