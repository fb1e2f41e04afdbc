use std::net::SocketAddr;
use std::sync::Arc;

use sea_orm_migration::MigratorTrait;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use cab_booking_backend::{
    config::Config,
    db,
    dispatch::{booking::SeaOrmBookingStore, geocode::NominatimGeocoder, registry::RideRegistry},
    middleware::rate_limit::{create_global_governor, log_request},
    routes, AppState,
};

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "cab_booking_backend=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Config::from_env();
    tracing::info!("Starting server at {}", config.server_addr());

    // Connect to database
    let db = db::connect(&config)
        .await
        .expect("Failed to connect to database");
    tracing::info!("Connected to database");

    // Run migrations
    migration::Migrator::up(&db, None)
        .await
        .expect("Failed to run migrations");
    tracing::info!("Migrations complete");

    let geocoder = NominatimGeocoder::new(&config.geocoder())
        .expect("Failed to build geocoding client");
    let dispatch = config.dispatch();
    tracing::info!(
        cabs_per_session = dispatch.cabs_per_session,
        cab_speed_kmh = dispatch.timing.cab_speed_kmh,
        max_arrival_secs = dispatch.timing.max_arrival.as_secs(),
        "Cab simulation configured"
    );

    // Create app state
    let state = AppState {
        db: db.clone(),
        config: config.clone(),
        rides: Arc::new(RideRegistry::new(dispatch)),
        geocoder: Arc::new(geocoder),
        bookings: Arc::new(SeaOrmBookingStore::new(db)),
    };

    // Create router with middleware
    let app = routes::create_router(state)
        .layer(axum::middleware::from_fn(log_request))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any))
        .layer(create_global_governor());

    // Start server with socket address for rate limiting
    let addr: SocketAddr = config.server_addr().parse().expect("Invalid address");
    let listener = TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    tracing::info!("Server listening on {}", addr);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
    .expect("Failed to start server");
}
