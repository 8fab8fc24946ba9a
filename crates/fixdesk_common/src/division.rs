//! Division catalog for complaint routing.

use serde::{Deserialize, Serialize};

/// Organizational unit a complaint is routed to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Division {
    Electrical,
    Civil,
    Computer,
    Mechanical,
    PlumbingAndWater,
    Electronics,
}

impl Division {
    /// Every routable division
    pub const ALL: [Division; 6] = [
        Division::Electrical,
        Division::Civil,
        Division::Computer,
        Division::Mechanical,
        Division::PlumbingAndWater,
        Division::Electronics,
    ];

    /// Canonical display/storage form
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Electrical => "Electrical",
            Self::Civil => "Civil",
            Self::Computer => "Computer",
            Self::Mechanical => "Mechanical",
            Self::PlumbingAndWater => "Plumbing and Water",
            Self::Electronics => "Electronics",
        }
    }

    /// Parse from string (case-insensitive)
    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|d| d.as_str().eq_ignore_ascii_case(s.trim()))
    }
}

impl std::fmt::Display for Division {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_division_round_trip() {
        for division in Division::ALL {
            assert_eq!(Division::parse(division.as_str()), Some(division));
        }
    }

    #[test]
    fn test_division_parse_case_insensitive() {
        assert_eq!(Division::parse("electrical"), Some(Division::Electrical));
        assert_eq!(
            Division::parse("plumbing and water"),
            Some(Division::PlumbingAndWater)
        );
        assert_eq!(Division::parse(" Civil "), Some(Division::Civil));
        assert_eq!(Division::parse("Janitorial"), None);
    }
}
