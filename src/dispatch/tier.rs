use std::fmt;
use std::str::FromStr;

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use crate::dispatch::error::DispatchError;

/// Cab class offered to riders, persisted as the `cab_type` enum
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    EnumIter,
    DeriveActiveEnum,
    Serialize,
    Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "cab_type")]
#[serde(rename_all = "lowercase")]
pub enum CabTier {
    #[sea_orm(string_value = "standard")]
    Standard,
    #[sea_orm(string_value = "premium")]
    Premium,
    #[sea_orm(string_value = "luxury")]
    Luxury,
}

/// Everything that varies by tier, in one place
#[derive(Debug)]
pub struct TierProfile {
    pub name: &'static str,
    pub rate_per_km: f64,
    pub icon_url: &'static str,
}

const STANDARD: TierProfile = TierProfile {
    name: "standard",
    rate_per_km: 10.0,
    icon_url: "https://cdn-icons-png.flaticon.com/512/89/89131.png",
};

const PREMIUM: TierProfile = TierProfile {
    name: "premium",
    rate_per_km: 20.0,
    icon_url: "https://encrypted-tbn0.gstatic.com/images?q=tbn:ANd9GcRx9u4Aw6RNZJqyNR9gf-6lt2ZNHE6xVdzMBA&s",
};

const LUXURY: TierProfile = TierProfile {
    name: "luxury",
    rate_per_km: 30.0,
    icon_url: "https://as2.ftcdn.net/v2/jpg/03/57/86/17/1000_F_357861742_0ycq05AlTg01BImRlSQiKuMsOG7RgUKW.jpg",
};

impl CabTier {
    pub const ALL: [CabTier; 3] = [CabTier::Standard, CabTier::Premium, CabTier::Luxury];

    pub fn profile(self) -> &'static TierProfile {
        match self {
            CabTier::Standard => &STANDARD,
            CabTier::Premium => &PREMIUM,
            CabTier::Luxury => &LUXURY,
        }
    }

    pub fn rate_per_km(self) -> f64 {
        self.profile().rate_per_km
    }

    pub fn icon_url(self) -> &'static str {
        self.profile().icon_url
    }

    pub fn as_str(self) -> &'static str {
        self.profile().name
    }
}

impl fmt::Display for CabTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CabTier {
    type Err = DispatchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        CabTier::ALL
            .into_iter()
            .find(|tier| tier.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| DispatchError::InvalidTier(wanted.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rate_table() {
        assert_eq!(CabTier::Standard.rate_per_km(), 10.0);
        assert_eq!(CabTier::Premium.rate_per_km(), 20.0);
        assert_eq!(CabTier::Luxury.rate_per_km(), 30.0);
    }

    #[test]
    fn test_parse_known_tiers() {
        assert_eq!("standard".parse::<CabTier>().unwrap(), CabTier::Standard);
        assert_eq!(" Premium ".parse::<CabTier>().unwrap(), CabTier::Premium);
        assert_eq!("LUXURY".parse::<CabTier>().unwrap(), CabTier::Luxury);
    }

    #[test]
    fn test_parse_unknown_tier() {
        let err = "helicopter".parse::<CabTier>().unwrap_err();
        assert!(matches!(err, DispatchError::InvalidTier(name) if name == "helicopter"));
    }

    #[test]
    fn test_serde_uses_lowercase_names() {
        let json = serde_json::to_string(&CabTier::Premium).unwrap();
        assert_eq!(json, "\"premium\"");
    }
}
