use axum::{
    middleware,
    routing::{get, post},
    Router,
};

use crate::handlers::{auth, bookings, rides};
use crate::middleware::auth::auth_middleware;
use crate::middleware::rate_limit::create_rider_governor;
use crate::AppState;

pub fn create_router(state: AppState) -> Router {
    // Public routes
    let auth_routes = Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login));

    // Everything below requires a valid token and is rate limited per rider
    let rider_routes = Router::new()
        .route("/profile", get(auth::profile).put(auth::update_profile))
        .route(
            "/rides/session",
            post(rides::open_session)
                .get(rides::get_session)
                .delete(rides::close_session),
        )
        .route("/rides/fare", post(rides::estimate_fare))
        .route(
            "/bookings",
            post(bookings::create_booking).get(bookings::my_bookings),
        )
        .layer(create_rider_governor())
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    Router::new()
        .nest("/api/auth", auth_routes)
        .nest("/api", rider_routes)
        .with_state(state)
}
