use axum::{extract::State, Extension, Json};

use crate::dispatch::booking::{book_ride, BookingConfirmation, RideRequest};
use crate::entities::booking;
use crate::error::AppResult;
use crate::utils::jwt::Claims;
use crate::AppState;

/// Book a cab to the given destination
pub async fn create_booking(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<RideRequest>,
) -> AppResult<Json<BookingConfirmation>> {
    let confirmation = book_ride(
        &state.rides,
        state.geocoder.as_ref(),
        state.bookings.as_ref(),
        &claims.rider(),
        &payload,
    )
    .await?;

    Ok(Json(confirmation))
}

/// List the rider's bookings, newest first
pub async fn my_bookings(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> AppResult<Json<Vec<booking::Model>>> {
    Ok(Json(state.bookings.list_for_user(claims.sub).await?))
}
