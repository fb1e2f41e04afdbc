pub mod config;
pub mod db;
pub mod dispatch;
pub mod entities;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod routes;
pub mod utils;

use std::sync::Arc;

use sea_orm::DatabaseConnection;

use crate::dispatch::booking::BookingStore;
use crate::dispatch::geocode::Geocoder;
use crate::dispatch::registry::RideRegistry;

pub use config::Config;
pub use error::{AppError, AppResult};

#[derive(Clone)]
pub struct AppState {
    pub db: DatabaseConnection,
    pub config: Config,
    pub rides: Arc<RideRegistry>,
    pub geocoder: Arc<dyn Geocoder>,
    pub bookings: Arc<dyn BookingStore>,
}
