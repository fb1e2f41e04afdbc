use std::env;
use std::time::Duration;

use crate::dispatch::animator::{
    AnimationTiming, DEFAULT_CAB_SPEED_KMH, DEFAULT_MAX_ARRIVAL, DEFAULT_TICK,
};
use crate::dispatch::cabs::DEFAULT_CAB_COUNT;
use crate::dispatch::geocode::GeocoderConfig;
use crate::dispatch::session::DispatchSettings;

#[derive(Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub jwt_expiration_hours: i64,
    pub server_host: String,
    pub server_port: u16,
    pub geocoder_url: String,
    pub geocoder_user_agent: String,
    pub geocoder_timeout_secs: u64,
    pub cabs_per_session: usize,
    pub cab_speed_kmh: f64,
    pub max_arrival_secs: u64,
    pub animation_tick_ms: u64,
}

fn var_or(key: &str, default: impl ToString) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

impl Config {
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        Self {
            database_url: env::var("DATABASE_URL")
                .expect("DATABASE_URL must be set"),
            jwt_secret: env::var("JWT_SECRET")
                .expect("JWT_SECRET must be set"),
            jwt_expiration_hours: var_or("JWT_EXPIRATION_HOURS", 24)
                .parse()
                .expect("JWT_EXPIRATION_HOURS must be a number"),
            server_host: var_or("SERVER_HOST", "0.0.0.0"),
            server_port: var_or("SERVER_PORT", 3001)
                .parse()
                .expect("SERVER_PORT must be a number"),
            geocoder_url: var_or("GEOCODER_URL", "https://nominatim.openstreetmap.org/search"),
            geocoder_user_agent: var_or(
                "GEOCODER_USER_AGENT",
                concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")),
            ),
            geocoder_timeout_secs: var_or("GEOCODER_TIMEOUT_SECS", 10)
                .parse()
                .expect("GEOCODER_TIMEOUT_SECS must be a number"),
            cabs_per_session: var_or("CABS_PER_SESSION", DEFAULT_CAB_COUNT)
                .parse()
                .expect("CABS_PER_SESSION must be a number"),
            cab_speed_kmh: var_or("CAB_SPEED_KMH", DEFAULT_CAB_SPEED_KMH)
                .parse()
                .expect("CAB_SPEED_KMH must be a number"),
            max_arrival_secs: var_or("MAX_ARRIVAL_SECS", DEFAULT_MAX_ARRIVAL.as_secs())
                .parse()
                .expect("MAX_ARRIVAL_SECS must be a number"),
            animation_tick_ms: var_or("ANIMATION_TICK_MS", DEFAULT_TICK.as_millis())
                .parse()
                .expect("ANIMATION_TICK_MS must be a number"),
        }
    }

    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.server_host, self.server_port)
    }

    pub fn geocoder(&self) -> GeocoderConfig {
        GeocoderConfig {
            endpoint: self.geocoder_url.clone(),
            user_agent: self.geocoder_user_agent.clone(),
            timeout: Duration::from_secs(self.geocoder_timeout_secs),
        }
    }

    pub fn dispatch(&self) -> DispatchSettings {
        DispatchSettings {
            cabs_per_session: self.cabs_per_session,
            timing: AnimationTiming {
                tick: Duration::from_millis(self.animation_tick_ms.max(1)),
                max_arrival: Duration::from_secs(self.max_arrival_secs),
                cab_speed_kmh: self.cab_speed_kmh,
            },
        }
    }
}
