use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Deployment region of the clickthrough service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RegionCode {
    In,
    Us,
    Eu,
    Me,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown region code '{0}' (expected one of IN, US, EU, ME)")]
pub struct UnknownRegion(pub String);

impl RegionCode {
    pub const ALL: [RegionCode; 4] = [
        RegionCode::In,
        RegionCode::Us,
        RegionCode::Eu,
        RegionCode::Me,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            RegionCode::In => "IN",
            RegionCode::Us => "US",
            RegionCode::Eu => "EU",
            RegionCode::Me => "ME",
        }
    }

    /// Per-region API root handed to the widget as `baseUrl`.
    pub fn base_url(self) -> &'static str {
        match self {
            RegionCode::In => "https://api.in.example-region.com/",
            RegionCode::Us => "https://api.us.example-region.com/",
            RegionCode::Eu => "https://api.eu.example-region.com/",
            RegionCode::Me => "https://api.me.example-region.com/",
        }
    }
}

impl FromStr for RegionCode {
    type Err = UnknownRegion;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let normalized = raw.trim().to_ascii_uppercase();
        RegionCode::ALL
            .into_iter()
            .find(|region| region.as_str() == normalized)
            .ok_or_else(|| UnknownRegion(raw.to_string()))
    }
}

impl fmt::Display for RegionCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::{RegionCode, UnknownRegion};

    #[test]
    fn every_region_maps_to_its_own_base_url() {
        let expected = [
            ("IN", "https://api.in.example-region.com/"),
            ("US", "https://api.us.example-region.com/"),
            ("EU", "https://api.eu.example-region.com/"),
            ("ME", "https://api.me.example-region.com/"),
        ];
        for (code, url) in expected {
            let region: RegionCode = code.parse().unwrap();
            assert_eq!(region.as_str(), code);
            assert_eq!(region.base_url(), url);
        }
    }

    #[test]
    fn parse_is_case_insensitive_and_rejects_unknown_codes() {
        assert_eq!(" eu ".parse::<RegionCode>(), Ok(RegionCode::Eu));
        assert_eq!(
            "APAC".parse::<RegionCode>(),
            Err(UnknownRegion("APAC".to_string()))
        );
        assert!("".parse::<RegionCode>().is_err());
    }

    #[test]
    fn serde_uses_uppercase_codes() {
        let encoded = serde_json::to_string(&RegionCode::Me).unwrap();
        assert_eq!(encoded, "\"ME\"");
        let decoded: RegionCode = serde_json::from_str("\"US\"").unwrap();
        assert_eq!(decoded, RegionCode::Us);
    }
}
