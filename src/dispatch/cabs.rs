use rand::Rng;
use serde::Serialize;
use uuid::Uuid;

use crate::dispatch::tier::CabTier;
use crate::utils::geo::Coordinate;

/// Cabs are scattered within half of this span, in degrees, on each axis
pub const SCATTER_SPAN_DEG: f64 = 0.01;

pub const DEFAULT_CAB_COUNT: usize = 5;

/// A simulated cab near the rider
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Cab {
    pub id: Uuid,
    pub position: Coordinate,
    pub tier: CabTier,
    pub rate_per_km: f64,
}

impl Cab {
    pub fn new(position: Coordinate, tier: CabTier) -> Self {
        Self {
            id: Uuid::new_v4(),
            position,
            tier,
            rate_per_km: tier.rate_per_km(),
        }
    }

    pub fn popup(&self) -> String {
        format!("Type: {} | Rate: {} INR/km", self.tier, self.rate_per_km)
    }
}

/// Synthesize `count` cabs at random offsets around `center`
pub fn generate_cabs<R: Rng + ?Sized>(center: Coordinate, count: usize, rng: &mut R) -> Vec<Cab> {
    (0..count)
        .map(|_| {
            let lat_offset = (rng.r#gen::<f64>() - 0.5) * SCATTER_SPAN_DEG;
            let lng_offset = (rng.r#gen::<f64>() - 0.5) * SCATTER_SPAN_DEG;
            let tier = CabTier::ALL[rng.gen_range(0..CabTier::ALL.len())];

            Cab::new(center.offset(lat_offset, lng_offset), tier)
        })
        .collect()
}
