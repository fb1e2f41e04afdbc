use std::ops::ControlFlow;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use serde::Serialize;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};

use crate::dispatch::cabs::Cab;
use crate::dispatch::display::{MapDisplay, MarkerKey};
use crate::utils::geo::{Coordinate, haversine_distance};

pub const DEFAULT_TICK: Duration = Duration::from_millis(1000);
pub const DEFAULT_MAX_ARRIVAL: Duration = Duration::from_secs(10 * 60);
pub const DEFAULT_CAB_SPEED_KMH: f64 = 30.0;

const MIN_TICK: Duration = Duration::from_millis(1);

#[derive(Debug, Clone, Copy)]
pub struct AnimationTiming {
    pub tick: Duration,
    pub max_arrival: Duration,
    pub cab_speed_kmh: f64,
}

impl Default for AnimationTiming {
    fn default() -> Self {
        Self {
            tick: DEFAULT_TICK,
            max_arrival: DEFAULT_MAX_ARRIVAL,
            cab_speed_kmh: DEFAULT_CAB_SPEED_KMH,
        }
    }
}

impl AnimationTiming {
    /// Straight-line travel time at the configured cab speed
    pub fn derived_travel_time(&self, distance_km: f64) -> Duration {
        let seconds = distance_km / self.cab_speed_kmh * 3600.0;
        Duration::try_from_secs_f64(seconds).unwrap_or(self.max_arrival)
    }

    pub fn bounded_travel_time(&self, distance_km: f64) -> Duration {
        self.derived_travel_time(distance_km).min(self.max_arrival)
    }

    /// Number of ticks needed to cover `travel`, never less than one
    pub fn total_steps(&self, travel: Duration) -> u32 {
        let tick_ms = self.tick.max(MIN_TICK).as_millis();
        let steps = travel.as_millis().div_ceil(tick_ms);

        u32::try_from(steps).unwrap_or(u32::MAX).max(1)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AnimationState {
    Idle,
    Moving,
    Arrived,
    Superseded,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Tick {
    Moved(Coordinate),
    Arrived(Coordinate),
    Stopped,
}

/// Linear interpolation of one cab toward the rider
#[derive(Debug, Clone)]
pub struct AnimationSession {
    cab: Cab,
    origin: Coordinate,
    destination: Coordinate,
    total_steps: u32,
    current_step: u32,
    step_lat: f64,
    step_lng: f64,
    travel_time: Duration,
    state: AnimationState,
}

#[derive(Debug, Clone, Serialize)]
pub struct AnimationSnapshot {
    pub state: AnimationState,
    pub cab: Cab,
    pub origin: Coordinate,
    pub destination: Coordinate,
    pub current_step: u32,
    pub total_steps: u32,
    pub travel_time_ms: u64,
    pub eta_minutes: u64,
}

impl AnimationSession {
    pub fn plan(cab: Cab, destination: Coordinate, timing: &AnimationTiming) -> Self {
        let origin = cab.position;
        let travel_time = timing.bounded_travel_time(haversine_distance(origin, destination));
        let total_steps = timing.total_steps(travel_time);

        Self {
            cab,
            origin,
            destination,
            total_steps,
            current_step: 0,
            step_lat: (destination.lat - origin.lat) / f64::from(total_steps),
            step_lng: (destination.lng - origin.lng) / f64::from(total_steps),
            travel_time,
            state: AnimationState::Moving,
        }
    }

    pub fn advance(&mut self) -> Tick {
        if self.state != AnimationState::Moving {
            return Tick::Stopped;
        }

        self.current_step += 1;
        if self.current_step >= self.total_steps {
            // land exactly on the rider instead of accumulating float drift
            self.cab.position = self.destination;
            self.state = AnimationState::Arrived;
            return Tick::Arrived(self.destination);
        }

        self.cab.position = Coordinate {
            lat: self.cab.position.lat + self.step_lat,
            lng: self.cab.position.lng + self.step_lng,
        };
        Tick::Moved(self.cab.position)
    }

    pub fn state(&self) -> AnimationState {
        self.state
    }

    pub fn cab(&self) -> &Cab {
        &self.cab
    }

    pub fn eta_minutes(&self) -> u64 {
        let ms = u64::try_from(self.travel_time.as_millis()).unwrap_or(u64::MAX);
        ms.div_ceil(60_000)
    }

    pub fn snapshot(&self) -> AnimationSnapshot {
        AnimationSnapshot {
            state: self.state,
            cab: self.cab.clone(),
            origin: self.origin,
            destination: self.destination,
            current_step: self.current_step,
            total_steps: self.total_steps,
            travel_time_ms: u64::try_from(self.travel_time.as_millis()).unwrap_or(u64::MAX),
            eta_minutes: self.eta_minutes(),
        }
    }
}

/// Handle to a periodic task; dropping it is the only way the timer stops early
pub struct TickTask {
    handle: JoinHandle<()>,
}

impl TickTask {
    /// Run `on_tick` every `period`, first firing one period from now,
    /// until it breaks or the handle is cancelled
    pub fn spawn<F>(period: Duration, mut on_tick: F) -> Self
    where
        F: FnMut() -> ControlFlow<()> + Send + 'static,
    {
        let period = period.max(MIN_TICK);
        let handle = tokio::spawn(async move {
            let mut ticker = time::interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                ticker.tick().await;
                if on_tick().is_break() {
                    break;
                }
            }
        });

        Self { handle }
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    pub fn cancel(self) {
        drop(self);
    }
}

impl Drop for TickTask {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

struct ActiveAnimation {
    session: Arc<Mutex<AnimationSession>>,
    task: TickTask,
}

fn lock(session: &Mutex<AnimationSession>) -> MutexGuard<'_, AnimationSession> {
    session.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Moves the booked cab toward the rider; at most one animation is live
pub struct BookingAnimator {
    timing: AnimationTiming,
    display: Arc<dyn MapDisplay>,
    active: Option<ActiveAnimation>,
}

impl BookingAnimator {
    pub fn new(timing: AnimationTiming, display: Arc<dyn MapDisplay>) -> Self {
        Self {
            timing,
            display,
            active: None,
        }
    }

    /// Start moving `cab` toward `destination`, tearing down any running animation first
    pub fn start(&mut self, cab: Cab, destination: Coordinate) -> AnimationSnapshot {
        if self.supersede() {
            tracing::info!("Previous cab animation superseded");
        }

        let key = MarkerKey::MovingCab(cab.id);
        let icon_url = cab.tier.icon_url();
        let session = AnimationSession::plan(cab, destination, &self.timing);
        let snapshot = session.snapshot();

        self.display.place_marker(key, snapshot.cab.position, icon_url, None);
        self.display.show_route(snapshot.origin, snapshot.destination);
        self.display.show_status(format!(
            "Cab on the way! Estimated arrival time: {} minutes",
            snapshot.eta_minutes
        ));

        tracing::info!(
            cab_id = %snapshot.cab.id,
            tier = %snapshot.cab.tier,
            total_steps = snapshot.total_steps,
            eta_minutes = snapshot.eta_minutes,
            "Cab dispatched"
        );

        let session = Arc::new(Mutex::new(session));
        let task = {
            let session = Arc::clone(&session);
            let display = Arc::clone(&self.display);

            // display updates happen under the session lock so a
            // supersede can never interleave with a half-applied tick
            TickTask::spawn(self.timing.tick, move || {
                let mut session = lock(&session);
                match session.advance() {
                    Tick::Moved(at) => {
                        display.move_marker(key, at);
                        ControlFlow::Continue(())
                    }
                    Tick::Arrived(_) => {
                        display.clear_route();
                        display.remove_marker(key);
                        display.show_status("Cab arrived!".to_string());
                        tracing::info!(cab_id = %session.cab().id, "Cab arrived");
                        ControlFlow::Break(())
                    }
                    Tick::Stopped => ControlFlow::Break(()),
                }
            })
        };

        self.active = Some(ActiveAnimation { session, task });
        snapshot
    }

    /// Cancel the current animation, if any. Returns true when a moving
    /// cab was stopped.
    pub fn supersede(&mut self) -> bool {
        let Some(ActiveAnimation { session, task }) = self.active.take() else {
            return false;
        };

        let was_moving = {
            let mut session = lock(&session);
            let moving = session.state == AnimationState::Moving;
            if moving {
                session.state = AnimationState::Superseded;
                self.display.remove_marker(MarkerKey::MovingCab(session.cab.id));
                self.display.clear_route();
            }
            moving
        };

        task.cancel();
        was_moving
    }

    pub fn state(&self) -> AnimationState {
        self.active
            .as_ref()
            .map_or(AnimationState::Idle, |active| lock(&active.session).state())
    }

    pub fn snapshot(&self) -> Option<AnimationSnapshot> {
        self.active
            .as_ref()
            .map(|active| lock(&active.session).snapshot())
    }

    /// The booked cab as it is right now
    pub fn current_cab(&self) -> Option<Cab> {
        self.active
            .as_ref()
            .map(|active| lock(&active.session).cab().clone())
    }

    pub fn is_ticking(&self) -> bool {
        self.active
            .as_ref()
            .is_some_and(|active| !active.task.is_finished())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::tier::CabTier;

    #[derive(Debug, Clone, PartialEq)]
    enum Event {
        Placed(MarkerKey),
        Moved(MarkerKey, Coordinate),
        Removed(MarkerKey),
        Route(Coordinate, Coordinate),
        RouteCleared,
        Status(String),
    }

    #[derive(Default)]
    struct Recorder {
        events: Mutex<Vec<Event>>,
    }

    impl Recorder {
        fn events(&self) -> Vec<Event> {
            self.events.lock().unwrap().clone()
        }

        fn push(&self, event: Event) {
            self.events.lock().unwrap().push(event);
        }
    }

    impl MapDisplay for Recorder {
        fn place_marker(&self, key: MarkerKey, _at: Coordinate, _icon: &str, _popup: Option<String>) {
            self.push(Event::Placed(key));
        }

        fn move_marker(&self, key: MarkerKey, at: Coordinate) {
            self.push(Event::Moved(key, at));
        }

        fn remove_marker(&self, key: MarkerKey) {
            self.push(Event::Removed(key));
        }

        fn show_route(&self, from: Coordinate, to: Coordinate) {
            self.push(Event::Route(from, to));
        }

        fn clear_route(&self) {
            self.push(Event::RouteCleared);
        }

        fn show_status(&self, message: String) {
            self.push(Event::Status(message));
        }
    }

    fn point(lat: f64, lng: f64) -> Coordinate {
        Coordinate::checked(lat, lng).unwrap()
    }

    fn fast_timing() -> AnimationTiming {
        AnimationTiming {
            tick: Duration::from_secs(1),
            max_arrival: Duration::from_secs(600),
            cab_speed_kmh: 36.0,
        }
    }

    #[test]
    fn test_steps_never_drop_below_one() {
        let timing = AnimationTiming::default();
        assert_eq!(timing.total_steps(Duration::ZERO), 1);
        assert_eq!(timing.total_steps(Duration::from_millis(1)), 1);
        assert_eq!(timing.total_steps(Duration::from_millis(2500)), 3);
    }

    #[test]
    fn test_travel_time_is_capped() {
        let timing = AnimationTiming::default();

        // 1000 km at 30 km/h would take well over a day
        let bounded = timing.bounded_travel_time(1000.0);
        assert_eq!(bounded, DEFAULT_MAX_ARRIVAL);
        assert_eq!(timing.total_steps(bounded), 600);

        // one km at 30 km/h is two minutes
        assert_eq!(timing.bounded_travel_time(1.0), Duration::from_secs(120));
    }

    #[test]
    fn test_stalled_cab_speed_falls_back_to_cap() {
        let timing = AnimationTiming {
            cab_speed_kmh: 0.0,
            ..AnimationTiming::default()
        };
        assert_eq!(timing.bounded_travel_time(0.5), DEFAULT_MAX_ARRIVAL);
    }

    #[test]
    fn test_cab_already_at_rider_arrives_on_first_tick() {
        let rider = point(12.0, 77.0);
        let cab = Cab::new(rider, CabTier::Standard);

        let mut session = AnimationSession::plan(cab, rider, &AnimationTiming::default());
        assert_eq!(session.snapshot().total_steps, 1);
        assert_eq!(session.advance(), Tick::Arrived(rider));
        assert_eq!(session.advance(), Tick::Stopped);
    }

    #[test]
    fn test_session_walks_linearly_to_rider() {
        let rider = point(0.0, 0.0);
        let cab = Cab::new(point(0.003, -0.003), CabTier::Premium);
        let mut session = AnimationSession::plan(cab, rider, &fast_timing());
        let total = session.snapshot().total_steps;
        assert!(total > 1);

        let Tick::Moved(first) = session.advance() else {
            panic!("expected the cab to move");
        };
        assert!((first.lat - (0.003 - 0.003 / f64::from(total))).abs() < 1e-12);

        for _ in 1..total - 1 {
            assert!(matches!(session.advance(), Tick::Moved(_)));
        }
        assert_eq!(session.advance(), Tick::Arrived(rider));
        assert_eq!(session.state(), AnimationState::Arrived);
        assert_eq!(session.cab().position, rider);
    }

    #[tokio::test(start_paused = true)]
    async fn test_animation_arrives_and_stops_timer() {
        let recorder = Arc::new(Recorder::default());
        let mut animator = BookingAnimator::new(fast_timing(), recorder.clone());
        let rider = point(0.0, 0.0);
        let cab = Cab::new(point(0.0, 0.0009), CabTier::Standard);
        let key = MarkerKey::MovingCab(cab.id);

        let planned = animator.start(cab, rider);
        assert_eq!(planned.state, AnimationState::Moving);
        assert!(planned.total_steps > 1);

        time::sleep(fast_timing().tick * planned.total_steps + Duration::from_millis(500)).await;

        assert_eq!(animator.state(), AnimationState::Arrived);
        assert!(!animator.is_ticking());
        assert_eq!(animator.current_cab().unwrap().position, rider);

        let events = recorder.events();
        let moves = events.iter().filter(|e| matches!(e, Event::Moved(..))).count();
        assert_eq!(moves as u32, planned.total_steps - 1);
        assert_eq!(events[0], Event::Placed(key));
        assert_eq!(events[1], Event::Route(planned.origin, rider));
        assert_eq!(events[events.len() - 3], Event::RouteCleared);
        assert_eq!(events[events.len() - 2], Event::Removed(key));
        assert_eq!(events[events.len() - 1], Event::Status("Cab arrived!".to_string()));
    }

    #[tokio::test(start_paused = true)]
    async fn test_new_booking_cancels_previous_timer_once() {
        let recorder = Arc::new(Recorder::default());
        let timing = fast_timing();
        let mut animator = BookingAnimator::new(timing, recorder.clone());
        let rider = point(0.0, 0.0);

        let first = Cab::new(point(0.004, 0.0), CabTier::Premium);
        let first_key = MarkerKey::MovingCab(first.id);
        animator.start(first, rider);

        time::sleep(Duration::from_millis(2500)).await;

        let second = Cab::new(point(0.0, 0.0009), CabTier::Luxury);
        let second_key = MarkerKey::MovingCab(second.id);
        let planned = animator.start(second, rider);

        time::sleep(timing.tick * (planned.total_steps + 5)).await;

        let events = recorder.events();
        let removed_first: Vec<usize> = events
            .iter()
            .enumerate()
            .filter(|(_, e)| **e == Event::Removed(first_key))
            .map(|(i, _)| i)
            .collect();
        assert_eq!(removed_first.len(), 1);

        let first_moves: Vec<usize> = events
            .iter()
            .enumerate()
            .filter(|(_, e)| matches!(e, Event::Moved(k, _) if *k == first_key))
            .map(|(i, _)| i)
            .collect();
        assert_eq!(first_moves.len(), 2);
        assert!(first_moves.iter().all(|&i| i < removed_first[0]));

        let second_placed = events
            .iter()
            .position(|e| *e == Event::Placed(second_key))
            .unwrap();
        assert!(removed_first[0] < second_placed);

        assert_eq!(animator.state(), AnimationState::Arrived);
        assert!(events.contains(&Event::Removed(second_key)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_supersede_without_animation_is_noop() {
        let recorder = Arc::new(Recorder::default());
        let mut animator = BookingAnimator::new(fast_timing(), recorder.clone());

        assert!(!animator.supersede());
        assert_eq!(animator.state(), AnimationState::Idle);
        assert!(recorder.events().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_tick_task_cancel_stops_ticking() {
        let counter = Arc::new(Mutex::new(0u32));
        let task = {
            let counter = Arc::clone(&counter);
            TickTask::spawn(Duration::from_secs(1), move || {
                *counter.lock().unwrap() += 1;
                ControlFlow::Continue(())
            })
        };

        time::sleep(Duration::from_millis(3500)).await;
        task.cancel();
        time::sleep(Duration::from_secs(10)).await;

        assert_eq!(*counter.lock().unwrap(), 3);
    }
}
