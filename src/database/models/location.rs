use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Province/district/sector triple shared by users, complaints, discussions,
/// groups and feedback. Stored as three columns on each owning table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Location {
    pub province: String,
    pub district: String,
    pub sector: String,
}

impl Location {
    pub fn new(
        province: impl Into<String>,
        district: impl Into<String>,
        sector: impl Into<String>,
    ) -> Self {
        Self {
            province: province.into(),
            district: district.into(),
            sector: sector.into(),
        }
    }

    /// Full province+district+sector equality.
    pub fn matches_exactly(&self, other: &Location) -> bool {
        self == other
    }

    /// Province+district equality, ignoring sector. District admins match
    /// group and complaint locations under this relaxed rule.
    pub fn matches_district(&self, other: &Location) -> bool {
        self.province == other.province && self.district == other.district
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn district_match_ignores_sector() {
        let a = Location::new("Kigali", "Gasabo", "Remera");
        let b = Location::new("Kigali", "Gasabo", "Kimironko");
        assert!(a.matches_district(&b));
        assert!(!a.matches_exactly(&b));
    }

    #[test]
    fn district_match_requires_province() {
        let a = Location::new("Kigali", "Gasabo", "Remera");
        let b = Location::new("Eastern", "Gasabo", "Remera");
        assert!(!a.matches_district(&b));
    }
}
