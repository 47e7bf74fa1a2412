//! GICS sectors and the names data providers use for them.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// GICS Level 1 sectors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum GicsSector {
    /// Energy
    Energy,
    /// Materials
    Materials,
    /// Industrials
    Industrials,
    /// Consumer Discretionary
    ConsumerDiscretionary,
    /// Consumer Staples
    ConsumerStaples,
    /// Health Care
    HealthCare,
    /// Financials
    Financials,
    /// Information Technology
    InformationTechnology,
    /// Communication Services
    CommunicationServices,
    /// Utilities
    Utilities,
    /// Real Estate
    RealEstate,
}

impl GicsSector {
    /// All sectors in code order.
    pub const ALL: [Self; 11] = [
        Self::Energy,
        Self::Materials,
        Self::Industrials,
        Self::ConsumerDiscretionary,
        Self::ConsumerStaples,
        Self::HealthCare,
        Self::Financials,
        Self::InformationTechnology,
        Self::CommunicationServices,
        Self::Utilities,
        Self::RealEstate,
    ];

    /// Two-digit sector code.
    pub const fn code(&self) -> u8 {
        match self {
            Self::Energy => 10,
            Self::Materials => 15,
            Self::Industrials => 20,
            Self::ConsumerDiscretionary => 25,
            Self::ConsumerStaples => 30,
            Self::HealthCare => 35,
            Self::Financials => 40,
            Self::InformationTechnology => 45,
            Self::CommunicationServices => 50,
            Self::Utilities => 55,
            Self::RealEstate => 60,
        }
    }

    /// Official sector name.
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Energy => "Energy",
            Self::Materials => "Materials",
            Self::Industrials => "Industrials",
            Self::ConsumerDiscretionary => "Consumer Discretionary",
            Self::ConsumerStaples => "Consumer Staples",
            Self::HealthCare => "Health Care",
            Self::Financials => "Financials",
            Self::InformationTechnology => "Information Technology",
            Self::CommunicationServices => "Communication Services",
            Self::Utilities => "Utilities",
            Self::RealEstate => "Real Estate",
        }
    }

    /// Map a sector name to its GICS sector.
    ///
    /// Accepts the official names, case-insensitively, and the sector names
    /// Yahoo Finance profiles use ("Financial Services", "Technology",
    /// "Consumer Cyclical", ...).
    pub fn from_name(name: &str) -> Option<Self> {
        let name = name.trim().to_lowercase().replace('&', "and");
        let sector = match name.as_str() {
            "energy" => Self::Energy,
            "materials" | "basic materials" => Self::Materials,
            "industrials" => Self::Industrials,
            "consumer discretionary" | "consumer cyclical" => Self::ConsumerDiscretionary,
            "consumer staples" | "consumer defensive" => Self::ConsumerStaples,
            "health care" | "healthcare" => Self::HealthCare,
            "financials" | "financial services" | "financial" => Self::Financials,
            "information technology" | "technology" => Self::InformationTechnology,
            "communication services" | "telecommunication services" | "communications" => {
                Self::CommunicationServices
            }
            "utilities" => Self::Utilities,
            "real estate" => Self::RealEstate,
            _ => return None,
        };
        Some(sector)
    }

    /// Parse a sector from its code.
    pub const fn from_code(code: u8) -> Option<Self> {
        match code {
            10 => Some(Self::Energy),
            15 => Some(Self::Materials),
            20 => Some(Self::Industrials),
            25 => Some(Self::ConsumerDiscretionary),
            30 => Some(Self::ConsumerStaples),
            35 => Some(Self::HealthCare),
            40 => Some(Self::Financials),
            45 => Some(Self::InformationTechnology),
            50 => Some(Self::CommunicationServices),
            55 => Some(Self::Utilities),
            60 => Some(Self::RealEstate),
            _ => None,
        }
    }
}

impl fmt::Display for GicsSector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for GicsSector {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_name(s).ok_or_else(|| format!("Unknown sector: {s}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("Financials", GicsSector::Financials)]
    #[case("financial services", GicsSector::Financials)]
    #[case(" Technology ", GicsSector::InformationTechnology)]
    #[case("Consumer Cyclical", GicsSector::ConsumerDiscretionary)]
    #[case("Consumer Defensive", GicsSector::ConsumerStaples)]
    #[case("Basic Materials", GicsSector::Materials)]
    #[case("Healthcare", GicsSector::HealthCare)]
    #[case("Telecommunication Services", GicsSector::CommunicationServices)]
    fn test_from_name(#[case] name: &str, #[case] expected: GicsSector) {
        assert_eq!(GicsSector::from_name(name), Some(expected));
    }

    #[test]
    fn test_official_names_round_trip() {
        for sector in GicsSector::ALL {
            assert_eq!(sector.name().parse::<GicsSector>(), Ok(sector));
            assert_eq!(GicsSector::from_code(sector.code()), Some(sector));
        }
        assert_eq!(GicsSector::from_name("Crypto"), None);
        assert_eq!(GicsSector::from_code(99), None);
    }

    #[test]
    fn test_display() {
        assert_eq!(GicsSector::RealEstate.to_string(), "Real Estate");
    }
}
