use std::collections::BTreeMap;

use serde::Serialize;

use crate::dispatch::error::DispatchError;
use crate::dispatch::tier::CabTier;
use crate::utils::geo::{Coordinate, haversine_distance};

pub const CURRENCY: &str = "INR";

pub fn estimate_fare(distance_km: f64, tier: CabTier) -> f64 {
    distance_km * tier.rate_per_km()
}

/// Like [`estimate_fare`], for a tier name coming from user input
pub fn estimate_fare_by_name(distance_km: f64, tier: &str) -> Result<f64, DispatchError> {
    Ok(estimate_fare(distance_km, tier.parse()?))
}

/// Fare for every tier, used for the comparison table
pub fn compare_all_tiers(distance_km: f64) -> BTreeMap<CabTier, f64> {
    CabTier::ALL
        .into_iter()
        .map(|tier| (tier, estimate_fare(distance_km, tier)))
        .collect()
}

fn round_to_paise(amount: f64) -> f64 {
    (amount * 100.0).round() / 100.0
}

#[derive(Debug, Clone, Serialize)]
pub struct FareQuote {
    pub distance_km: f64,
    pub cab_type: CabTier,
    pub fare: f64,
    pub currency: &'static str,
    pub comparison: BTreeMap<CabTier, f64>,
}

impl FareQuote {
    pub fn between(pickup: Coordinate, dropoff: Coordinate, tier: CabTier) -> Self {
        let distance_km = haversine_distance(pickup, dropoff);

        Self {
            distance_km: round_to_paise(distance_km),
            cab_type: tier,
            fare: round_to_paise(estimate_fare(distance_km, tier)),
            currency: CURRENCY,
            comparison: compare_all_tiers(distance_km)
                .into_iter()
                .map(|(tier, fare)| (tier, round_to_paise(fare)))
                .collect(),
        }
    }
}
