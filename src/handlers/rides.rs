use axum::{extract::State, Extension, Json};

use crate::dispatch::booking::{quote_fare, RideRequest};
use crate::dispatch::fare::FareQuote;
use crate::dispatch::registry::RideView;
use crate::dispatch::session::GeolocationReport;
use crate::error::AppResult;
use crate::utils::jwt::Claims;
use crate::AppState;

/// Open (or move) the rider's session from the position their device reported
pub async fn open_session(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(report): Json<GeolocationReport>,
) -> AppResult<Json<RideView>> {
    let location = report.into_location()?;
    Ok(Json(state.rides.open(claims.sub, location).await))
}

/// Cabs, markers and the moving cab, for the client to draw
pub async fn get_session(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> AppResult<Json<RideView>> {
    Ok(Json(state.rides.view(claims.sub).await?))
}

pub async fn close_session(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> AppResult<Json<serde_json::Value>> {
    state.rides.close(claims.sub).await?;
    Ok(Json(serde_json::json!({ "message": "Ride session closed" })))
}

/// Estimated fare to a destination, with every tier for comparison
pub async fn estimate_fare(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<RideRequest>,
) -> AppResult<Json<FareQuote>> {
    let quote = quote_fare(&state.rides, state.geocoder.as_ref(), &claims.rider(), &payload).await?;
    Ok(Json(quote))
}
