use thiserror::Error;

use crate::dispatch::tier::CabTier;

/// Failures of the ride simulation, each recoverable with a message to the rider
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("Address not found: {0}. Please enter a valid location.")]
    AddressNotFound(String),

    #[error("Invalid cab type: {0}")]
    InvalidTier(String),

    #[error("No available cabs of type {0}")]
    NoAvailableCab(CabTier),

    #[error("Geolocation is not supported or permission denied: {0}")]
    GeolocationUnavailable(String),

    #[error("Invalid coordinate ({lat}, {lng})")]
    InvalidCoordinate { lat: f64, lng: f64 },

    #[error("Geocoding service unavailable: {0}")]
    GeocoderUnavailable(String),

    #[error("No ride session found, share your location first")]
    NoActiveSession,
}
