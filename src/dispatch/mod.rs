//! Simulated cab dispatch: nearby cabs, fares, destination lookup and the
//! animated cab that drives to the rider after a booking.

pub mod animator;
pub mod booking;
pub mod cabs;
pub mod display;
pub mod error;
pub mod fare;
pub mod geocode;
pub mod registry;
pub mod session;
pub mod tier;

pub use error::DispatchError;
pub use tier::CabTier;
