use async_trait::async_trait;
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::dispatch::animator::AnimationSnapshot;
use crate::dispatch::fare::FareQuote;
use crate::dispatch::geocode::Geocoder;
use crate::dispatch::registry::RideRegistry;
use crate::dispatch::tier::CabTier;
use crate::entities::booking;
use crate::error::{AppError, AppResult};

/// Fields the rider supplies for a new booking record
#[derive(Debug, Clone)]
pub struct NewBooking {
    pub user_id: Uuid,
    pub user_email: String,
    pub destination: String,
    pub cab_type: CabTier,
}

/// Where booking records live
#[async_trait]
pub trait BookingStore: Send + Sync {
    async fn create(&self, booking: NewBooking) -> AppResult<booking::Model>;
    async fn list_for_user(&self, user_id: Uuid) -> AppResult<Vec<booking::Model>>;
}

#[derive(Clone)]
pub struct SeaOrmBookingStore {
    db: DatabaseConnection,
}

impl SeaOrmBookingStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl BookingStore for SeaOrmBookingStore {
    async fn create(&self, booking: NewBooking) -> AppResult<booking::Model> {
        let record = booking::ActiveModel {
            id: Set(Uuid::new_v4()),
            user_id: Set(booking.user_id),
            user_email: Set(booking.user_email),
            destination: Set(booking.destination),
            cab_type: Set(booking.cab_type),
            ..Default::default()
        };

        Ok(record.insert(&self.db).await?)
    }

    async fn list_for_user(&self, user_id: Uuid) -> AppResult<Vec<booking::Model>> {
        Ok(booking::Entity::find()
            .filter(booking::Column::UserId.eq(user_id))
            .order_by_desc(booking::Column::CreatedAt)
            .all(&self.db)
            .await?)
    }
}

/// The authenticated rider making the request
#[derive(Debug, Clone)]
pub struct Rider {
    pub id: Uuid,
    pub email: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RideRequest {
    #[serde(default)]
    pub destination: String,
    #[serde(default)]
    pub cab_type: String,
}

impl RideRequest {
    fn validate(&self) -> AppResult<(&str, CabTier)> {
        let destination = self.destination.trim();
        if destination.is_empty() || self.cab_type.trim().is_empty() {
            return Err(AppError::BadRequest("Please fill out all fields.".to_string()));
        }

        Ok((destination, self.cab_type.parse()?))
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct BookingConfirmation {
    pub message: &'static str,
    pub booking: booking::Model,
    pub fare: FareQuote,
    pub animation: AnimationSnapshot,
}

/// Estimate the fare from the rider's position to a free-text destination
pub async fn quote_fare(
    registry: &RideRegistry,
    geocoder: &dyn Geocoder,
    rider: &Rider,
    request: &RideRequest,
) -> AppResult<FareQuote> {
    let (destination, tier) = request.validate()?;
    let pickup = registry.rider(rider.id).await?.lock().await.session.user_location();

    let dropoff = geocoder.resolve(destination).await?;
    Ok(FareQuote::between(pickup, dropoff, tier))
}

/// Book a cab: resolve the destination, pick a cab of the requested tier,
/// record the booking and send the cab on its way. Nothing is recorded or
/// animated unless every earlier step succeeded.
///
/// The rider's session is only locked once the destination is known, so
/// polls and relocations keep going while the geocoder answers.
pub async fn book_ride(
    registry: &RideRegistry,
    geocoder: &dyn Geocoder,
    store: &dyn BookingStore,
    rider: &Rider,
    request: &RideRequest,
) -> AppResult<BookingConfirmation> {
    let (destination, tier) = request.validate()?;
    registry.rider(rider.id).await?;

    let dropoff = geocoder.resolve(destination).await?;

    // the session may have been closed or replaced while we were waiting
    let slot = registry.rider(rider.id).await?;
    let mut slot = slot.lock().await;
    let cab = slot.session.find_cab(tier)?;

    let record = store
        .create(NewBooking {
            user_id: rider.id,
            user_email: rider.email.clone(),
            destination: destination.to_string(),
            cab_type: tier,
        })
        .await?;

    let animation = slot.session.dispatch(cab);
    let fare = FareQuote::between(slot.session.user_location(), dropoff, tier);

    tracing::info!(
        booking_code = %record.booking_code,
        rider = %rider.id,
        cab_type = %tier,
        fare = fare.fare,
        "Booking created"
    );

    Ok(BookingConfirmation {
        message: "Booking successful",
        booking: record,
        fare,
        animation,
    })
}
