use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use crate::dispatch::error::DispatchError;
use crate::utils::geo::Coordinate;

/// Resolves free-text destinations to coordinates
#[async_trait]
pub trait Geocoder: Send + Sync {
    async fn resolve(&self, address: &str) -> Result<Coordinate, DispatchError>;
}

#[derive(Debug, Clone)]
pub struct GeocoderConfig {
    pub endpoint: String,
    pub user_agent: String,
    pub timeout: Duration,
}

/// Geocoder backed by an OpenStreetMap Nominatim text search endpoint
#[derive(Clone)]
pub struct NominatimGeocoder {
    client: Client,
    endpoint: String,
}

#[derive(Debug, Deserialize)]
struct Place {
    lat: String,
    lon: String,
}

impl NominatimGeocoder {
    pub fn new(config: &GeocoderConfig) -> Result<Self, DispatchError> {
        let client = Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(config.timeout)
            .build()
            .map_err(|e| DispatchError::GeocoderUnavailable(e.to_string()))?;

        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
        })
    }
}

#[async_trait]
impl Geocoder for NominatimGeocoder {
    #[tracing::instrument(skip(self))]
    async fn resolve(&self, address: &str) -> Result<Coordinate, DispatchError> {
        let places: Vec<Place> = self
            .client
            .get(&self.endpoint)
            .query(&[("format", "json"), ("q", address)])
            .send()
            .await
            .and_then(|response| response.error_for_status())
            .map_err(|e| DispatchError::GeocoderUnavailable(e.to_string()))?
            .json()
            .await
            .map_err(|e| DispatchError::GeocoderUnavailable(e.to_string()))?;

        tracing::debug!(results = places.len(), "Geocoder responded");
        first_place(address, &places)
    }
}

/// First-match policy: the top result wins, no ranking
fn first_place(address: &str, places: &[Place]) -> Result<Coordinate, DispatchError> {
    let place = places
        .first()
        .ok_or_else(|| DispatchError::AddressNotFound(address.to_string()))?;

    let lat: f64 = place
        .lat
        .parse()
        .map_err(|_| DispatchError::GeocoderUnavailable(format!("bad latitude {:?}", place.lat)))?;
    let lng: f64 = place
        .lon
        .parse()
        .map_err(|_| DispatchError::GeocoderUnavailable(format!("bad longitude {:?}", place.lon)))?;

    Coordinate::checked(lat, lng).ok_or(DispatchError::InvalidCoordinate { lat, lng })
}
